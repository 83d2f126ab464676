pub mod user;

pub use registration_profile::*;
pub use unit::*;
pub use user::*;
