pub mod db_adapters;
pub mod entities;
pub mod settings;
pub mod startup;
pub mod telemetry;
pub mod use_cases;
pub mod utils;
pub mod web_adapters;


pub static ENV: once_cell::sync::Lazy<minijinja::Environment<'static>> =
    once_cell::sync::Lazy::new(|| {
        let mut env = minijinja::Environment::new();
        env.set_loader(minijinja::path_loader("templates"));
        env
    });
