use chrono::TimeDelta;
use serde::Deserialize;

use crate::use_cases::registration::backends::RegistrationBackend;

#[derive(Deserialize, Clone, Debug)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub database: DatabaseSettings,
    pub debug: bool,
    pub redis: RedisSettings,
    pub secret: SecretSettings,
    pub email: EmailSettings,
    pub registration: RegistrationSettings,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ApplicationSettings {
    pub port: u16,
    pub host: String,
    pub protocol: String,
    pub domain: String,
    pub site_name: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct DatabaseSettings {
    pub url: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct RedisSettings {
    pub url: String,
}

#[derive(Deserialize, Clone)]
pub struct SecretSettings {
    pub hmac_secret: String,
}

impl std::fmt::Debug for SecretSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretSettings")
            .field("hmac_secret", &"********")
            .finish()
    }
}

#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmailBackend {
    Smtp,
    Memory,
}

#[derive(Deserialize, Clone, Debug)]
pub struct EmailSettings {
    pub backend: EmailBackend,
    pub host: String,
    pub host_user: String,
    pub host_user_password: String,
    pub sender: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct RegistrationSettings {
    /// When false every registration attempt is refused.
    pub open: bool,
    /// Days an activation key stays valid after it is issued.
    pub activation_days: i64,
    pub backend: RegistrationBackend,
}

impl RegistrationSettings {
    fn validate(&self) -> Result<(), config::ConfigError> {
        match TimeDelta::try_days(self.activation_days) {
            Some(window) if window >= TimeDelta::zero() => Ok(()),
            _ => Err(config::ConfigError::Message(format!(
                "registration.activation_days must be a non-negative number of days, got {}",
                self.activation_days
            ))),
        }
    }
}

pub enum Environment {
    Testing,
    Development,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Testing => "testing",
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "testing" => Ok(Self::Testing),
            "development" => Ok(Self::Development),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. Use either 'testing', 'development' or 'production'.",
                other
            )),
        }
    }
}

pub fn get_settings() -> Result<Settings, config::ConfigError> {
    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "development".into())
        .try_into()
        .map_err(config::ConfigError::Message)?;
    build_settings(environment)
}

pub fn get_test_settings() -> Settings {
    build_settings(Environment::Testing).expect("Error on getting settings.")
}

fn build_settings(environment: Environment) -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir()
        .map_err(|e| config::ConfigError::Message(e.to_string()))?;
    let settings_directory = base_path.join("settings");

    let environment_filename = format!("{}.yaml", environment.as_str());
    let settings = config::Config::builder()
        .add_source(config::File::from(settings_directory.join("base.yaml")))
        .add_source(config::File::from(
            settings_directory.join(environment_filename),
        ))
        // Add in settings from environment variables (with a prefix of APP and '__' as separator)
        // E.g. 'APP_REGISTRATION__ACTIVATION_DAYS=3' would set 'Settings.registration.activation_days'
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    let settings = settings.try_deserialize::<Settings>()?;
    settings.registration.validate()?;
    Ok(settings)
}
