use crate::entities::user;

pub trait UserUrlTrait {
    fn get_absolute_url(&self) -> String;
}

impl UserUrlTrait for user::Model {
    /// Canonical location of the user's profile page.
    fn get_absolute_url(&self) -> String {
        format!("/users/{}/", self.username)
    }
}
