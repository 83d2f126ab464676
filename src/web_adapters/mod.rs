mod registration;
mod utils;

pub use registration::registration_routes;
