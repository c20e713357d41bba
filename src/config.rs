use config::{Config, ConfigError, File};
use secrecy::{ExposeSecret, Secret};
use serde_aux::field_attributes::deserialize_number_from_string;
use std::path::PathBuf;
use std::time;

use crate::domain::lead_email::LeadEmail;

#[derive(Debug)]
pub enum Environment {
    Development,
    Production,
}

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub email_client: EmailClientSettings,
    pub notification: NotificationSettings,
    pub audience: AudienceSettings,
    pub leads: LeadStoreSettings,
    #[serde(default)]
    pub export: ExportSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
    // Public URL of the marketing site, used for the sitemap
    pub site_url: String,
}

#[derive(serde::Deserialize, Clone)]
pub struct EmailClientSettings {
    pub base_url: String,
    pub sender: String,
    // secrecy protects secret information and prevents them to be exposed (eg: via logs)
    pub api_key: Option<Secret<String>>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,
}

#[derive(serde::Deserialize, Clone)]
pub struct NotificationSettings {
    pub recipient: Option<String>,
    pub subject: String,
}

#[derive(serde::Deserialize, Clone)]
pub struct AudienceSettings {
    pub enabled: bool,
    pub id: Option<String>,
    pub name: Option<String>,
    // When no id is configured, look the audience up by name and create it if missing
    pub resolve_by_name: bool,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub throttle_milliseconds: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub retry_delay_milliseconds: u64,
}

#[derive(serde::Deserialize, Clone)]
pub struct LeadStoreSettings {
    pub data_dir: PathBuf,
    pub file_name: String,
}

#[derive(serde::Deserialize, Clone, Default)]
pub struct ExportSettings {
    pub token: Option<Secret<String>>,
}

impl Settings {
    pub fn get_address(&self) -> String {
        format!(
            "{}:{}",
            self.application.get_host(),
            self.application.get_port()
        )
    }

    pub fn get_site_url(&self) -> String {
        self.application.get_site_url()
    }

    pub fn set_app_port(&mut self, port: u16) {
        self.application.port = port;
    }

    pub fn set_email_client_base_url(&mut self, new_base_url: String) {
        self.email_client.set_base_url(new_base_url)
    }

    pub fn set_leads_data_dir(&mut self, data_dir: PathBuf) {
        self.leads.data_dir = data_dir;
    }
}

impl ApplicationSettings {
    pub fn get_port(&self) -> u16 {
        self.port
    }

    pub fn get_host(&self) -> String {
        self.host.clone()
    }

    pub fn get_site_url(&self) -> String {
        self.site_url.trim_end_matches('/').to_string()
    }
}

impl EmailClientSettings {
    pub fn get_base_url(&self) -> String {
        self.base_url.clone()
    }

    /// Returns the API key only when it is set to a non-empty value.
    pub fn get_api_key(&self) -> Option<Secret<String>> {
        non_blank_secret(&self.api_key)
    }

    pub fn get_timeout(&self) -> time::Duration {
        time::Duration::from_millis(self.timeout_milliseconds)
    }

    pub fn set_base_url(&mut self, new_base_url: String) {
        self.base_url = new_base_url
    }
}

impl NotificationSettings {
    pub fn get_recipient(&self) -> Result<Option<LeadEmail>, String> {
        match non_blank(&self.recipient) {
            Some(recipient) => LeadEmail::parse(recipient).map(Some),
            None => Ok(None),
        }
    }
}

impl AudienceSettings {
    pub fn get_id(&self) -> Option<String> {
        non_blank(&self.id)
    }

    pub fn get_name(&self) -> Option<String> {
        non_blank(&self.name)
    }

    pub fn get_throttle(&self) -> time::Duration {
        time::Duration::from_millis(self.throttle_milliseconds)
    }

    pub fn get_retry_delay(&self) -> time::Duration {
        time::Duration::from_millis(self.retry_delay_milliseconds)
    }
}

impl ExportSettings {
    pub fn get_token(&self) -> Option<Secret<String>> {
        non_blank_secret(&self.token)
    }
}

// Only an empty string counts as unset; whitespace is a real value
fn non_blank(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|value| !value.is_empty()).cloned()
}

fn non_blank_secret(value: &Option<Secret<String>>) -> Option<Secret<String>> {
    value
        .as_ref()
        .filter(|secret| !secret.expose_secret().is_empty())
        .cloned()
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "development" => Ok(Self::Development),
            "production" => Ok(Self::Production),
            unknown_env => Err(format!(
                "{} is not supported environment. Use either 'development' or 'production'.",
                unknown_env
            )),
        }
    }
}

pub fn get_configuration() -> Result<Settings, ConfigError> {
    let root_path =
        std::env::current_dir().map_err(|err| ConfigError::Foreign(Box::new(err)))?;
    let config_directory = root_path.join("config");
    // Uses development environment by default
    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "development".into())
        .try_into()
        .map_err(ConfigError::Message)?;
    let config_base_filepath = config_directory.join("base");
    let config_env_filepath = config_directory.join(environment.as_str());

    // It merges the base configuration file with the one from the specific environment (development or production)
    let settings = Config::builder()
        .add_source(File::from(config_base_filepath).required(true))
        .add_source(File::from(config_env_filepath).required(true))
        .add_source(environment_variables())
        .build()?;

    tracing::info!("Application environment = {:?}", environment);

    // Try to convert the value from the configuration file into a Settings type
    settings.try_deserialize()
}

// Merge settings from environment variables with a prefix of APP, "_" after the prefix and "__" between keys
// E.g APP_EMAIL_CLIENT__API_KEY would set Settings.email_client.api_key
fn environment_variables() -> config::Environment {
    config::Environment::with_prefix("app")
        .prefix_separator("_")
        .separator("__")
}
