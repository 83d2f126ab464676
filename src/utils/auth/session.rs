use actix_session::{Session, SessionInsertError};

use crate::entities::user;

pub const USER_ID_KEY: &str = "user_id";
pub const USER_USERNAME_KEY: &str = "user_username";

/// Something that can log a user in for the current request.
pub trait AuthSession {
    fn establish(&self, user: &user::Model) -> Result<(), SessionInsertError>;
}

impl AuthSession for Session {
    fn establish(&self, user: &user::Model) -> Result<(), SessionInsertError> {
        self.renew();
        self.insert(USER_ID_KEY, user.id)?;
        self.insert(USER_USERNAME_KEY, &user.username)?;
        Ok(())
    }
}
