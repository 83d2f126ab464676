use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::Set;
use uuid::Uuid;

use crate::entities::user;

/// Hash of "password".
pub const PASSWORD_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$r07vWFCaKrbNPrSgUrG/+Q$/2lBaeRWeox6ROMu6qAwOYmttdGXA3o4Uw2YHC/fvfY";

pub fn user(username: &str) -> user::ActiveModel {
    let now = Utc::now();
    user::ActiveModel {
        id: Set(Uuid::now_v7()),
        username: Set(username.to_string()),
        email: Set(format!("{}@example.com", username)),
        password: Set(PASSWORD_HASH.to_string()),
        is_active: Set(true),
        date_joined: Set(now.into()),
        updated_at: Set(now.into()),
    }
}

pub trait UserFactory {
    fn is_active(self, is_active: bool) -> user::ActiveModel;
    fn email(self, email: &str) -> user::ActiveModel;
    fn date_joined(self, date_joined: DateTime<FixedOffset>) -> user::ActiveModel;
}

impl UserFactory for user::ActiveModel {
    fn is_active(mut self, is_active: bool) -> user::ActiveModel {
        self.is_active = Set(is_active);
        self
    }

    fn email(mut self, email: &str) -> user::ActiveModel {
        self.email = Set(email.to_string());
        self
    }

    fn date_joined(mut self, date_joined: DateTime<FixedOffset>) -> user::ActiveModel {
        self.date_joined = Set(date_joined);
        self
    }
}
