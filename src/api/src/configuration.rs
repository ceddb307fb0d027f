use crate::domain::subscriber_email::SubscriberEmail;
use chrono_tz::Tz;
use secrecy::Secret;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use telemetry::TelemetrySettings;

#[derive(Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub remote: RemoteSettings,
    pub registries: RegistrySettings,
    pub email_settings: EmailClientSettings,
    pub broadcast: BroadcastSettings,
    pub admin: AdminSettings,
    pub telemetry: TelemetrySettings,
}

#[derive(Deserialize, Clone)]
pub struct ApplicationSettings {
    pub application_port: u16,
    pub host_name: String,
    pub hmac_secret: Secret<String>,
    /// IANA name of the institution's time zone, e.g. `America/Mexico_City`.
    pub timezone: String,
    pub secure_cookies: bool,
}

impl ApplicationSettings {
    pub fn timezone(&self) -> Result<Tz, String> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| format!("{} is not a valid time zone: {}", self.timezone, e))
    }
}

/// The host holding the CSV registries and the announcement PDF.
#[derive(Deserialize, Clone)]
pub struct RemoteSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: Secret<String>,
    pub directory: String,
    /// Treat `directory` as a local folder instead of opening an SFTP session.
    pub use_local: bool,
    /// Hex SHA-256 of the server host key. Any key is accepted when absent.
    pub host_key_sha256: Option<String>,
    pub timeout_milliseconds: u64,
}

impl RemoteSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_milliseconds)
    }
}

#[derive(Deserialize, Clone)]
pub struct RegistryFileSettings {
    pub remote_file: String,
    pub local_file: PathBuf,
}

#[derive(Deserialize, Clone)]
pub struct RegistrySettings {
    pub convocatorias: RegistryFileSettings,
    pub correcciones: RegistryFileSettings,
    pub convocatoria_pdf: RegistryFileSettings,
    pub uploads_directory: PathBuf,
}

#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmailTransport {
    Smtp,
    Postmark,
}

#[derive(Deserialize, Clone)]
pub struct EmailClientSettings {
    pub transport: EmailTransport,
    pub sender_email: String,
    pub notification_email: String,
    pub timeout_milliseconds: u64,
    pub smtp_server: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: Secret<String>,
    pub base_url: String,
    pub authorization_token: Secret<String>,
}

impl EmailClientSettings {
    pub fn sender(&self) -> Result<SubscriberEmail, String> {
        SubscriberEmail::parse(self.sender_email.clone())
    }

    pub fn notification_recipient(&self) -> Result<SubscriberEmail, String> {
        SubscriberEmail::parse(self.notification_email.clone())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_milliseconds)
    }
}

#[derive(Deserialize, Clone)]
pub struct BroadcastSettings {
    pub pause_between_emails_milliseconds: u64,
    pub pause_between_groups_milliseconds: u64,
    pub group_size: usize,
    /// Row of the subscriber registry whose `Numero economico` counts broadcasts.
    pub counter_email: String,
}

impl BroadcastSettings {
    pub fn pause_between_emails(&self) -> Duration {
        Duration::from_millis(self.pause_between_emails_milliseconds)
    }

    pub fn pause_between_groups(&self) -> Duration {
        Duration::from_millis(self.pause_between_groups_milliseconds)
    }

    pub fn counter(&self) -> Result<SubscriberEmail, String> {
        SubscriberEmail::parse(self.counter_email.clone())
    }
}

#[derive(Deserialize, Clone)]
pub struct AdminSettings {
    pub username: String,
    /// Argon2 PHC string, see the `hash_password` binary.
    pub password_hash: Secret<String>,
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir().map_err(|e| {
        config::ConfigError::Message(format!("Failed to determine the current directory: {}", e))
    })?;

    let configuration_directory = base_path.join("configuration");

    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(config::ConfigError::Message)?;

    let environment_filename = format!("{}.yaml", environment.as_str());

    // Init configuration reader
    let settings = config::Config::builder()
        .add_source(config::File::from(
            configuration_directory.join("base.yaml"),
        ))
        .add_source(config::File::from(
            configuration_directory.join(environment_filename),
        ))
        // Add in settings from environment variables (with a prefix of APP and '__' as separator)
        // E.g. `APP_APPLICATION__APPLICATION_PORT=5001` would set `Settings.application.application_port`
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}

#[derive(Debug)]
pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a support environment. Use either local or production",
                other
            )),
        }
    }
}
