//! Configuration management for AutoInven
//!
//! Values are layered: built-in defaults, then an optional config file, then
//! environment variables prefixed with `AUTOINVEN` (sections separated by
//! `__`, e.g. `AUTOINVEN_SMTP__PASSWORD`).

use std::path::Path;
use std::time::Duration;

use lettre::message::Mailbox;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Environment variable prefix
pub const ENV_PREFIX: &str = "AUTOINVEN";

/// Main configuration struct
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Outbound mail configuration
    pub smtp: SmtpConfig,

    /// Alerting configuration
    pub alerting: AlertingConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from defaults, an optional file and the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder()
            .add_source(config::Config::try_from(&Config::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config: Config = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Check that everything needed to send alerts is present
    pub fn validate(&self) -> Result<()> {
        self.smtp.validate()?;
        self.alerting.validate()?;

        if self.database.url.trim().is_empty() {
            return Err(Error::config("database.url must be set"));
        }

        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// HTTP port
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database URL, normally from `AUTOINVEN_DATABASE__URL`
    pub url: String,
    /// Maximum connections
    pub max_connections: u32,
    /// Minimum connections
    pub min_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 10,
            min_connections: 1,
        }
    }
}

/// Outbound mail configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmtpConfig {
    /// SMTP relay host
    pub host: String,
    /// SMTP port
    pub port: u16,
    /// Upgrade the connection with STARTTLS
    pub starttls: bool,
    /// Login user
    pub username: String,
    /// Login password
    pub password: String,
    /// From address
    pub sender: String,
    /// Alert recipient
    pub recipient: String,
    /// Optional logo embedded inline as `cid:logo`
    pub logo_path: Option<String>,
    /// Connection timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 587,
            starttls: true,
            username: String::new(),
            password: String::new(),
            sender: String::new(),
            recipient: String::new(),
            logo_path: None,
            timeout_seconds: 20,
        }
    }
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("starttls", &self.starttls)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("sender", &self.sender)
            .field("recipient", &self.recipient)
            .field("logo_path", &self.logo_path)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

impl SmtpConfig {
    /// Connection timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    fn validate(&self) -> Result<()> {
        let required = [
            ("smtp.host", &self.host),
            ("smtp.username", &self.username),
            ("smtp.password", &self.password),
            ("smtp.sender", &self.sender),
            ("smtp.recipient", &self.recipient),
        ];

        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(Error::config(format!("{name} must be set")));
            }
        }

        for (name, value) in [("smtp.sender", &self.sender), ("smtp.recipient", &self.recipient)] {
            value
                .parse::<Mailbox>()
                .map_err(|e| Error::config(format!("{name} is not a valid address: {e}")))?;
        }

        Ok(())
    }
}

/// Alerting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertingConfig {
    /// Minimum time between two sends of the same alert kind
    pub cooldown_seconds: u64,
    /// Items with a quantity strictly below this are low on stock
    pub low_stock_threshold: i32,
    /// Upper bound on a single send attempt
    pub send_timeout_seconds: u64,
    /// Run both checks once after migrations
    pub check_on_startup: bool,
}

impl Default for AlertingConfig {
    fn default() -> Self {
        Self {
            cooldown_seconds: 3600,
            low_stock_threshold: 15,
            send_timeout_seconds: 30,
            check_on_startup: true,
        }
    }
}

impl AlertingConfig {
    /// Cooldown window as a chrono duration
    pub fn cooldown(&self) -> chrono::Duration {
        let seconds = i64::try_from(self.cooldown_seconds).unwrap_or(i64::MAX);
        chrono::Duration::seconds(seconds.min(i64::MAX / 1000))
    }

    /// Send timeout
    pub fn send_timeout(&self) -> Duration {
        Duration::from_secs(self.send_timeout_seconds)
    }

    fn validate(&self) -> Result<()> {
        if self.cooldown_seconds == 0 {
            return Err(Error::config("alerting.cooldown_seconds must be positive"));
        }
        if self.send_timeout_seconds == 0 {
            return Err(Error::config("alerting.send_timeout_seconds must be positive"));
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
    /// Log format (json or pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
