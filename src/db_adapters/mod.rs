pub mod registration_profile_adapter;
pub mod user_adapter;
