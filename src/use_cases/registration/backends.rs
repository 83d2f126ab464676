use std::collections::BTreeMap;

use sea_orm::{ConnectionTrait, DbErr, SqlErr, TransactionTrait};
use serde::{Deserialize, Serialize};
use tracing::{event, Level};

use crate::{
    db_adapters::user_adapter::{CreateUserParams, UserAdapter, UserMutation, UserQuery},
    entities::{custom_methods::user::UserUrlTrait, user},
    settings::Settings,
    utils::{
        auth::{password, session::AuthSession},
        emails::ActivationMailer,
    },
};

use super::{
    activate, error_500,
    forms::{FormRule, FormSpec, RegistrationForm, SetPasswordForm, DUPLICATE_USERNAME_MESSAGE},
    profiles,
    redirect::resolve_next,
    types::{
        ActivationOutcome, FieldErrors, KeyVerification, RedirectTarget, RequestContext,
        SiteContext,
    },
    RegistrationError,
};

pub const REGISTRATION_COMPLETE_PATH: &str = "/registration/complete/";
pub const REGISTRATION_CLOSED_PATH: &str = "/registration/closed/";
pub const ACTIVATION_PATH: &str = "/registration/activate/";
pub const SET_PASSWORD_ACTIVATION_PATH: &str = "/registration/activate-password/";

/// Registration policy, chosen once from `registration.backend`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationBackend {
    /// Inactive user, activation profile and email.
    #[default]
    Default,
    /// Active user straight away; no profile, no email.
    Simple,
    /// Username must equal the email; the password is chosen again when
    /// activating and the user is logged in afterwards.
    Nameless,
}

impl RegistrationBackend {
    pub fn registration_allowed(&self, settings: &Settings) -> bool {
        settings.registration.open
    }

    pub fn form_spec(&self) -> FormSpec {
        match self {
            RegistrationBackend::Nameless => {
                FormSpec::registration().with_rule(FormRule::UsernameEmailMatch)
            }
            _ => FormSpec::registration(),
        }
    }

    pub fn site_context(&self, settings: &Settings) -> SiteContext {
        let activation_path = match self {
            RegistrationBackend::Nameless => SET_PASSWORD_ACTIVATION_PATH,
            _ => ACTIVATION_PATH,
        };
        SiteContext {
            name: settings.application.site_name.clone(),
            domain: settings.application.domain.clone(),
            protocol: settings.application.protocol.clone(),
            activation_path: activation_path.to_string(),
            activation_days: settings.registration.activation_days,
        }
    }

    #[tracing::instrument(
        name = "Registering user",
        skip(self, db, mailer, settings, form),
        fields(backend = ?self, username = %form.username)
    )]
    pub async fn register<C: ConnectionTrait + TransactionTrait>(
        &self,
        db: &C,
        mailer: &dyn ActivationMailer,
        settings: &Settings,
        form: &RegistrationForm,
    ) -> Result<user::Model, RegistrationError> {
        if !self.registration_allowed(settings) {
            return Err(RegistrationError::Closed);
        }
        self.form_spec()
            .validate(form)
            .map_err(RegistrationError::Validation)?;
        if UserAdapter::init(db)
            .get_by_username(&form.username)
            .await
            .map_err(error_500)?
            .is_some()
        {
            return Err(duplicate_username());
        }
        let hashed = password::hash(form.password1.as_bytes()).map_err(error_500)?;

        let txn = db.begin().await.map_err(error_500)?;
        let res = self.create_user_and_profile(&txn, form, hashed).await;
        let (user, profile) = match res {
            Ok(created) => {
                txn.commit().await.map_err(error_500)?;
                created
            }
            Err(e) => {
                txn.rollback().await.map_err(error_500)?;
                return Err(e);
            }
        };
        event!(target: "backend", Level::INFO, user_id = %user.id, "user_registered");

        if let Some(profile) = profile {
            let site = self.site_context(settings);
            if let Err(e) = mailer
                .send_activation_email(&user, &profile.activation_key, &site)
                .await
            {
                event!(
                    target: "backend",
                    Level::ERROR,
                    user_id = %user.id,
                    "Failed to send activation email: {}",
                    e
                );
            }
        }
        Ok(user)
    }

    async fn create_user_and_profile<C: ConnectionTrait>(
        &self,
        db: &C,
        form: &RegistrationForm,
        hashed_password: String,
    ) -> Result<(user::Model, Option<crate::entities::registration_profile::Model>), RegistrationError>
    {
        let user = UserAdapter::init(db)
            .create(CreateUserParams {
                username: form.username.clone(),
                email: form.email.clone(),
                password: hashed_password,
                is_active: *self == RegistrationBackend::Simple,
            })
            .await
            .map_err(map_create_user_error)?;
        match self {
            RegistrationBackend::Simple => Ok((user, None)),
            _ => {
                let profile = profiles::create_profile(db, &user).await?;
                Ok((user, Some(profile)))
            }
        }
    }

    pub async fn activate<C: ConnectionTrait + TransactionTrait>(
        &self,
        db: &C,
        settings: &Settings,
        activation_key: &str,
    ) -> Result<ActivationOutcome, RegistrationError> {
        activate::activate(db, activation_key, settings.registration.activation_days).await
    }

    /// First step of the set-password activation flow.
    pub async fn verify_key<C: ConnectionTrait>(
        &self,
        db: &C,
        settings: &Settings,
        activation_key: &str,
    ) -> Result<KeyVerification, RegistrationError> {
        self.ensure_sets_password()?;
        activate::verify_key(db, activation_key, settings.registration.activation_days).await
    }

    pub async fn activate_with_password<C: ConnectionTrait + TransactionTrait>(
        &self,
        db: &C,
        settings: &Settings,
        activation_key: &str,
        form: &SetPasswordForm,
    ) -> Result<ActivationOutcome, RegistrationError> {
        self.ensure_sets_password()?;
        activate::activate_with_password(
            db,
            activation_key,
            form,
            settings.registration.activation_days,
        )
        .await
    }

    pub fn sets_password_on_activation(&self) -> bool {
        *self == RegistrationBackend::Nameless
    }

    fn ensure_sets_password(&self) -> Result<(), RegistrationError> {
        match self.sets_password_on_activation() {
            true => Ok(()),
            false => Err(RegistrationError::NotFound(
                "Setting a password on activation is not available.".to_string(),
            )),
        }
    }

    pub fn post_registration_redirect(
        &self,
        _request: &RequestContext,
        user: &user::Model,
    ) -> RedirectTarget {
        match self {
            RegistrationBackend::Simple => RedirectTarget::to(user.get_absolute_url()),
            _ => RedirectTarget::to(REGISTRATION_COMPLETE_PATH),
        }
    }

    pub fn registration_closed_redirect(&self) -> RedirectTarget {
        RedirectTarget::to(REGISTRATION_CLOSED_PATH)
    }

    /// Resolves where an activated user goes next. Nameless logs the user
    /// in before redirecting.
    pub fn post_activation_redirect(
        &self,
        request: &RequestContext,
        user: &user::Model,
        session: &impl AuthSession,
    ) -> Result<RedirectTarget, RegistrationError> {
        if *self == RegistrationBackend::Nameless {
            session.establish(user).map_err(error_500)?;
        }
        Ok(resolve_next(
            request,
            RedirectTarget {
                location: user.get_absolute_url(),
                args: vec![],
                kwargs: BTreeMap::new(),
            },
        ))
    }
}

fn duplicate_username() -> RegistrationError {
    RegistrationError::Validation(FieldErrors::single(
        "username",
        DUPLICATE_USERNAME_MESSAGE,
    ))
}

fn map_create_user_error(e: DbErr) -> RegistrationError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => duplicate_username(),
        _ => error_500(e),
    }
}
