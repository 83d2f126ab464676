use chrono::{DateTime, TimeDelta, Utc};
use sea_orm::{ConnectionTrait, DbErr, SqlErr, TransactionTrait};

use crate::{
    db_adapters::registration_profile_adapter::{
        CreateRegistrationProfileParams, RegistrationProfileAdapter, RegistrationProfileFilter,
        RegistrationProfileMutation, RegistrationProfileQuery,
    },
    entities::{registration_profile, user},
};

use super::{error_500, tokens, types::ActivationState, RegistrationError};

fn map_create_error(e: DbErr) -> RegistrationError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            RegistrationError::Conflict("This user already has an activation profile.".to_string())
        }
        _ => error_500(e),
    }
}

/// Issues the user's activation profile. The activation clock starts at
/// the moment the user joined.
pub async fn create_profile<C: ConnectionTrait>(
    db: &C,
    user: &user::Model,
) -> Result<registration_profile::Model, RegistrationError> {
    let existing = RegistrationProfileAdapter::init(db)
        .filter_eq_user(user)
        .get_one()
        .await
        .map_err(error_500)?;
    if existing.is_some() {
        return Err(RegistrationError::Conflict(
            "This user already has an activation profile.".to_string(),
        ));
    }

    RegistrationProfileAdapter::init(db)
        .create(CreateRegistrationProfileParams {
            user_id: user.id,
            activation_key: tokens::generate_for(user),
            activation_started_at: user.date_joined,
        })
        .await
        .map_err(map_create_error)
}

pub async fn get_by_key<C: ConnectionTrait>(
    db: &C,
    activation_key: &str,
) -> Result<registration_profile::Model, RegistrationError> {
    RegistrationProfileAdapter::init(db)
        .get_by_key(activation_key)
        .await
        .map_err(error_500)?
        .ok_or_else(|| {
            RegistrationError::NotFound("No activation profile matches this key.".to_string())
        })
}

pub async fn get_by_user<C: ConnectionTrait>(
    db: &C,
    user: &user::Model,
) -> Result<Option<registration_profile::Model>, RegistrationError> {
    RegistrationProfileAdapter::init(db)
        .filter_eq_user(user)
        .get_one()
        .await
        .map_err(error_500)
}

/// True when the window has elapsed or the key has already been consumed.
/// A window too large to represent counts as elapsed.
pub fn is_expired(
    profile: &registration_profile::Model,
    activation_days: i64,
    now: DateTime<Utc>,
) -> bool {
    if tokens::is_activated_sentinel(&profile.activation_key) {
        return true;
    }
    let elapsed = now.signed_duration_since(profile.activation_started_at);
    TimeDelta::try_days(activation_days).map_or(true, |window| elapsed > window)
}

/// Replaces the user's profile with a fresh key whose window starts now.
pub async fn recreate_profile<C: ConnectionTrait + TransactionTrait>(
    db: &C,
    user: &user::Model,
) -> Result<registration_profile::Model, RegistrationError> {
    let txn = db.begin().await.map_err(error_500)?;

    let res = async {
        if let Some(profile) = RegistrationProfileAdapter::init(&txn)
            .filter_eq_user(user)
            .get_one()
            .await?
        {
            RegistrationProfileAdapter::init(&txn).delete(&profile).await?;
        }
        RegistrationProfileAdapter::init(&txn)
            .create(CreateRegistrationProfileParams {
                user_id: user.id,
                activation_key: tokens::generate_for(user),
                activation_started_at: Utc::now().into(),
            })
            .await
    }
    .await;

    match res {
        Ok(profile) => {
            txn.commit().await.map_err(error_500)?;
            Ok(profile)
        }
        Err(e) => {
            txn.rollback().await.map_err(error_500)?;
            Err(map_create_error(e))
        }
    }
}

pub async fn delete_profile<C: ConnectionTrait>(
    db: &C,
    profile: &registration_profile::Model,
) -> Result<(), RegistrationError> {
    match RegistrationProfileAdapter::init(db)
        .delete(profile)
        .await
        .map_err(error_500)?
    {
        0 => Err(RegistrationError::NotFound(
            "This activation profile no longer exists.".to_string(),
        )),
        _ => Ok(()),
    }
}

pub async fn activation_state<C: ConnectionTrait>(
    db: &C,
    user: &user::Model,
    activation_days: i64,
) -> Result<ActivationState, RegistrationError> {
    if user.is_active {
        return Ok(ActivationState::Activated);
    }
    let state = match get_by_user(db, user).await? {
        None => ActivationState::Unregistered,
        Some(profile) if is_expired(&profile, activation_days, Utc::now()) => {
            ActivationState::Expired
        }
        Some(_) => ActivationState::Pending,
    };
    Ok(state)
}
