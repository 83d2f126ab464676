use sea_orm::ConnectionTrait;
use tracing::{event, Level};

use crate::{
    db_adapters::user_adapter::{UserAdapter, UserFilter, UserQuery},
    entities::user,
    utils::auth::password,
};

use super::{
    error_500,
    forms::LoginForm,
    types::{FieldErrors, NON_FIELD_ERRORS},
    RegistrationError,
};

pub const INVALID_LOGIN_MESSAGE: &str =
    "Please enter a correct username and password. Note that both fields may be case-sensitive.";
pub const POST_ONLY_MESSAGE: &str = "Only the POST method is supported for this endpoint.";

/// The active user owning these credentials, if any. Inactive accounts
/// never authenticate.
pub async fn authenticate<C: ConnectionTrait>(
    db: &C,
    username: &str,
    raw_password: &str,
) -> Result<Option<user::Model>, RegistrationError> {
    let user = UserAdapter::init(db)
        .filter_eq_is_active(true)
        .get_by_username(username)
        .await
        .map_err(error_500)?;
    Ok(user.filter(|user| {
        password::verify_password(&user.password, raw_password.as_bytes()).is_ok()
    }))
}

#[tracing::instrument(
    name = "Logging a user in",
    skip(db, form),
    fields(username = %form.username)
)]
pub async fn login<C: ConnectionTrait>(
    db: &C,
    form: &LoginForm,
) -> Result<user::Model, RegistrationError> {
    form.validate().map_err(RegistrationError::Validation)?;
    match authenticate(db, &form.username, &form.password).await? {
        Some(user) => {
            event!(target: "backend", Level::INFO, user_id = %user.id, "User logged in successfully.");
            Ok(user)
        }
        None => Err(RegistrationError::Validation(FieldErrors::single(
            NON_FIELD_ERRORS,
            INVALID_LOGIN_MESSAGE,
        ))),
    }
}
