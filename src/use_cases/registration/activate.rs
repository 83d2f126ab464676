use chrono::Utc;
use sea_orm::{ConnectionTrait, TransactionTrait};
use tracing::{event, Level};

use crate::{
    db_adapters::user_adapter::{UserAdapter, UserMutation, UserQuery},
    entities::{registration_profile, user},
    utils::auth::password,
};

use super::{
    error_500,
    forms::SetPasswordForm,
    profiles, tokens,
    types::{ActivationFailure, ActivationFailureReason, ActivationOutcome, KeyVerification},
    RegistrationError,
};

fn precheck(activation_key: &str) -> Option<ActivationFailure> {
    if tokens::is_activated_sentinel(activation_key) {
        return Some(ActivationFailure::new(
            ActivationFailureReason::AlreadyActivated,
            activation_key,
        ));
    }
    if !tokens::is_well_formed(activation_key) {
        return Some(ActivationFailure::new(
            ActivationFailureReason::Malformed,
            activation_key,
        ));
    }
    None
}

/// The profile and its pending user, or why the key cannot activate anyone.
type ResolvedKey = Result<(registration_profile::Model, user::Model), ActivationFailureReason>;

async fn resolve_key<C: ConnectionTrait>(
    db: &C,
    activation_key: &str,
    activation_days: i64,
) -> Result<ResolvedKey, RegistrationError> {
    let profile = match profiles::get_by_key(db, activation_key).await {
        Ok(profile) => profile,
        Err(RegistrationError::NotFound(_)) => return Ok(Err(ActivationFailureReason::NotFound)),
        Err(e) => return Err(e),
    };
    if profiles::is_expired(&profile, activation_days, Utc::now()) {
        return Ok(Err(ActivationFailureReason::Expired));
    }
    match UserAdapter::init(db)
        .get_by_id(profile.user_id)
        .await
        .map_err(error_500)?
    {
        None => Ok(Err(ActivationFailureReason::NotFound)),
        Some(user) if user.is_active => Ok(Err(ActivationFailureReason::AlreadyActivated)),
        Some(user) => Ok(Ok((profile, user))),
    }
}

/// Checks a key without consuming it.
pub async fn verify_key<C: ConnectionTrait>(
    db: &C,
    activation_key: &str,
    activation_days: i64,
) -> Result<KeyVerification, RegistrationError> {
    if let Some(failure) = precheck(activation_key) {
        return Ok(KeyVerification::Invalid(failure));
    }
    let verification = match resolve_key(db, activation_key, activation_days).await? {
        Ok((_, user)) => KeyVerification::Valid(user),
        Err(reason) => KeyVerification::Invalid(ActivationFailure::new(reason, activation_key)),
    };
    Ok(verification)
}

#[tracing::instrument(name = "Activating user", skip(db, activation_key))]
pub async fn activate<C: ConnectionTrait + TransactionTrait>(
    db: &C,
    activation_key: &str,
    activation_days: i64,
) -> Result<ActivationOutcome, RegistrationError> {
    consume_key(db, activation_key, activation_days, None).await
}

/// Activates the account and stores the password chosen by its owner.
/// The key is checked before the form, so a dead link always shows the
/// activation failure.
#[tracing::instrument(
    name = "Activating user with a new password",
    skip(db, activation_key, form)
)]
pub async fn activate_with_password<C: ConnectionTrait + TransactionTrait>(
    db: &C,
    activation_key: &str,
    form: &SetPasswordForm,
    activation_days: i64,
) -> Result<ActivationOutcome, RegistrationError> {
    if let KeyVerification::Invalid(failure) =
        verify_key(db, activation_key, activation_days).await?
    {
        return Ok(ActivationOutcome::Failed(failure));
    }
    form.validate().map_err(RegistrationError::Validation)?;
    let hashed = password::hash(form.new_password1.as_bytes()).map_err(error_500)?;
    consume_key(db, activation_key, activation_days, Some(hashed)).await
}

async fn consume_key<C: ConnectionTrait + TransactionTrait>(
    db: &C,
    activation_key: &str,
    activation_days: i64,
    new_password: Option<String>,
) -> Result<ActivationOutcome, RegistrationError> {
    if let Some(failure) = precheck(activation_key) {
        return Ok(ActivationOutcome::Failed(failure));
    }
    let failed = |reason| {
        Ok::<_, RegistrationError>(ActivationOutcome::Failed(ActivationFailure::new(
            reason,
            activation_key,
        )))
    };

    let txn = db.begin().await.map_err(error_500)?;
    let res = async {
        let (profile, user) = match resolve_key(&txn, activation_key, activation_days).await? {
            Ok(found) => found,
            Err(reason) => return failed(reason),
        };
        // Losing a concurrent activation shows up as nothing left to delete.
        match profiles::delete_profile(&txn, &profile).await {
            Ok(()) => {}
            Err(RegistrationError::NotFound(_)) => {
                return failed(ActivationFailureReason::AlreadyActivated)
            }
            Err(e) => return Err(e),
        }
        let user = UserAdapter::init(&txn)
            .activate(user)
            .await
            .map_err(error_500)?;
        let user = match new_password {
            Some(hashed) => UserAdapter::init(&txn)
                .update_password(user, hashed)
                .await
                .map_err(error_500)?,
            None => user,
        };
        Ok(ActivationOutcome::Activated(user))
    }
    .await;

    match res {
        Ok(ActivationOutcome::Activated(user)) => {
            txn.commit().await.map_err(error_500)?;
            event!(
                target: "backend",
                Level::INFO,
                user_id = %user.id,
                username = %user.username,
                "user_activated"
            );
            Ok(ActivationOutcome::Activated(user))
        }
        Ok(failed) => {
            txn.rollback().await.map_err(error_500)?;
            Ok(failed)
        }
        Err(e) => {
            txn.rollback().await.map_err(error_500)?;
            Err(e)
        }
    }
}
