use std::fmt::Debug;

pub mod activate;
pub mod backends;
pub mod forms;
pub mod login;
pub mod profiles;
pub mod redirect;
pub mod resend;
pub mod tokens;
pub mod types;

use types::FieldErrors;

#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("The submitted registration data is invalid.")]
    Validation(FieldErrors),
    #[error("{0}")]
    Usage(String),
    #[error("Registration is closed.")]
    Closed,
    #[error("Internal error: {0}")]
    Internal(String),
}

pub(crate) fn error_500(e: impl Debug) -> RegistrationError {
    RegistrationError::Internal(format!("{:?}", e))
}
