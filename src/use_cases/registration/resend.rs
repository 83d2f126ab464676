use sea_orm::{ConnectionTrait, TransactionTrait};
use tracing::{event, Level};
use uuid::Uuid;

use crate::{
    db_adapters::user_adapter::{UserAdapter, UserFilter, UserQuery},
    entities::{registration_profile, user},
    utils::emails::ActivationMailer,
};

use super::{
    error_500, profiles,
    types::{ActivationState, SiteContext},
    RegistrationError,
};

pub const ALREADY_ACTIVE_MESSAGE: &str =
    "There is nothing to be done, the user is already active.";

/// Identifies the user to (re)send an activation email to. Every given
/// identifier must match the same user.
#[derive(Debug, Clone, Default)]
pub struct UserLookup {
    pub user_id: Option<Uuid>,
    pub unit_id: Option<Uuid>,
    pub email: Option<String>,
}

impl UserLookup {
    fn is_empty(&self) -> bool {
        self.user_id.is_none() && self.unit_id.is_none() && self.email.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResendOutcome {
    AlreadyActive(user::Model),
    Sent {
        user: user::Model,
        profile: registration_profile::Model,
    },
}

async fn find_user<C: ConnectionTrait>(
    db: &C,
    lookup: &UserLookup,
) -> Result<user::Model, RegistrationError> {
    if lookup.is_empty() {
        return Err(RegistrationError::Usage(
            "Must provide --userid, --unitid or --email".to_string(),
        ));
    }
    let mut adapter = UserAdapter::init(db);
    if let Some(user_id) = lookup.user_id {
        adapter = adapter.filter_eq_id(user_id);
    }
    if let Some(unit_id) = lookup.unit_id {
        adapter = adapter.filter_eq_unit(unit_id);
    }
    if let Some(email) = &lookup.email {
        adapter = adapter.filter_eq_email(email);
    }

    let mut users = adapter.get_all().await.map_err(error_500)?;
    match users.len() {
        0 => Err(RegistrationError::NotFound(
            "There is no User matching the given identifiers.".to_string(),
        )),
        1 => Ok(users.remove(0)),
        n => Err(RegistrationError::Conflict(format!(
            "{} users match the given identifiers.",
            n
        ))),
    }
}

/// Sends the activation email again, issuing a fresh key when the current one
/// has expired. Already active users are left alone.
#[tracing::instrument(name = "Resending activation email", skip(db, mailer, site))]
pub async fn send_activation_email<C: ConnectionTrait + TransactionTrait>(
    db: &C,
    mailer: &dyn ActivationMailer,
    site: &SiteContext,
    lookup: &UserLookup,
) -> Result<ResendOutcome, RegistrationError> {
    let user = find_user(db, lookup).await?;
    let profile = match profiles::activation_state(db, &user, site.activation_days).await? {
        ActivationState::Activated => {
            event!(target: "backend", Level::INFO, user_id = %user.id, "{}", ALREADY_ACTIVE_MESSAGE);
            return Ok(ResendOutcome::AlreadyActive(user));
        }
        ActivationState::Unregistered => {
            event!(target: "backend", Level::INFO, user_id = %user.id, "No activation profile found, creating a new one");
            profiles::create_profile(db, &user).await?
        }
        ActivationState::Expired => {
            event!(target: "backend", Level::INFO, user_id = %user.id, "Activation key has expired, recreating activation profile");
            profiles::recreate_profile(db, &user).await?
        }
        ActivationState::Pending => match profiles::get_by_user(db, &user).await? {
            Some(profile) => profile,
            None => profiles::create_profile(db, &user).await?,
        },
    };

    mailer
        .send_activation_email(&user, &profile.activation_key, site)
        .await
        .map_err(error_500)?;
    event!(target: "backend", Level::INFO, user_id = %user.id, "Activation email sent");
    Ok(ResendOutcome::Sent { user, profile })
}
