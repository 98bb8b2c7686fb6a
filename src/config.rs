//! Configuration management for the inquiry service
//!
//! Handles loading configuration from an optional TOML file and environment
//! variables, and provides validation for all configuration settings.

use crate::AppError;
use anyhow::{Context, Result};
use chrono_tz::Tz;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::{env, path::PathBuf, time::Duration};

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Outbound mail settings
    #[serde(default)]
    pub smtp: SmtpConfig,
    /// Email presentation settings
    #[serde(default)]
    pub email: EmailConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    /// Directory holding the built static site
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u32,
    #[serde(default = "default_body_limit")]
    pub body_limit_kb: u32,
}

/// SMTP transport settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    #[serde(default = "default_smtp_host")]
    pub host: String,
    /// 465 uses implicit TLS, anything else with `starttls = true` upgrades
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    #[serde(default)]
    pub starttls: bool,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Display name on the From header
    #[serde(default = "default_from_name")]
    pub from_name: String,
    /// Agency inbox that receives every notification
    #[serde(default)]
    pub operator_address: String,
    #[serde(default = "default_smtp_timeout")]
    pub timeout_seconds: u32,
    #[serde(default = "default_smtp_retries")]
    pub max_retries: u32,
}

/// Email presentation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    #[serde(default = "default_brand_name")]
    pub brand_name: String,
    /// IANA zone used for "received at" stamps
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_server_host() -> String {
    "0.0.0.0".to_string()
}

fn default_server_port() -> u16 {
    3000
}

fn default_static_dir() -> String {
    "public".to_string()
}

fn default_request_timeout() -> u32 {
    30
}

fn default_body_limit() -> u32 {
    64
}

fn default_smtp_host() -> String {
    "smtp.gmail.com".to_string()
}

fn default_smtp_port() -> u16 {
    465
}

fn default_from_name() -> String {
    "Wafud Al Haram".to_string()
}

fn default_smtp_timeout() -> u32 {
    10
}

fn default_smtp_retries() -> u32 {
    1
}

fn default_brand_name() -> String {
    "Wafud Al Haram".to_string()
}

fn default_timezone() -> String {
    "Asia/Jakarta".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            static_dir: default_static_dir(),
            request_timeout_seconds: default_request_timeout(),
            body_limit_kb: default_body_limit(),
        }
    }
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: default_smtp_host(),
            port: default_smtp_port(),
            starttls: false,
            username: String::new(),
            password: String::new(),
            from_name: default_from_name(),
            operator_address: String::new(),
            timeout_seconds: default_smtp_timeout(),
            max_retries: default_smtp_retries(),
        }
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            brand_name: default_brand_name(),
            timezone: default_timezone(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Environment variables used by earlier deployments, mapped onto config keys.
const LEGACY_ENV: [(&str, &str); 5] = [
    ("SMTP_HOST", "smtp.host"),
    ("SMTP_PORT", "smtp.port"),
    ("SMTP_USER", "smtp.username"),
    ("SMTP_PASS", "smtp.password"),
    ("TO_EMAIL", "smtp.operator_address"),
];

impl AppConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(env::var("WAFUD_CONFIG").ok().map(PathBuf::from))
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(|| PathBuf::from("config.toml"));

        let mut builder = Config::builder().add_source(
            File::from(config_file.clone())
                .required(false)
                .format(config::FileFormat::Toml),
        );

        // Add environment variable overrides with WAFUD_ prefix
        builder = builder.add_source(
            Environment::with_prefix("WAFUD")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        for (var, key) in LEGACY_ENV {
            builder = builder
                .set_override_option(key, env::var(var).ok())
                .with_context(|| format!("Failed to apply {var}"))?;
        }

        let settings = builder
            .build()
            .with_context(|| format!("Failed to build configuration from {}", config_file.display()))?;

        let mut config: AppConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Apply default values to blank configuration fields
    pub fn apply_defaults(&mut self) {
        if self.server.host.is_empty() {
            self.server.host = default_server_host();
        }
        if self.server.static_dir.is_empty() {
            self.server.static_dir = default_static_dir();
        }
        if self.server.request_timeout_seconds == 0 {
            self.server.request_timeout_seconds = default_request_timeout();
        }
        if self.server.body_limit_kb == 0 {
            self.server.body_limit_kb = default_body_limit();
        }
        if self.smtp.host.is_empty() {
            self.smtp.host = default_smtp_host();
        }
        if self.smtp.from_name.is_empty() {
            self.smtp.from_name = default_from_name();
        }
        if self.smtp.timeout_seconds == 0 {
            self.smtp.timeout_seconds = default_smtp_timeout();
        }
        if self.email.brand_name.is_empty() {
            self.email.brand_name = default_brand_name();
        }
        if self.email.timezone.is_empty() {
            self.email.timezone = default_timezone();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_smtp()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate mail delivery settings
    pub fn validate_smtp(&self) -> Result<()> {
        if self.smtp.operator_address.trim().is_empty() {
            return Err(AppError::config(
                "smtp.operator_address (or TO_EMAIL) must be set to the inbox receiving inquiries",
            )
            .into());
        }

        if !self.smtp.operator_address.contains('@') {
            return Err(AppError::config(format!(
                "Operator address '{}' is not an email address",
                self.smtp.operator_address
            ))
            .into());
        }

        if self.smtp.username.is_empty() != self.smtp.password.is_empty() {
            return Err(AppError::config(
                "SMTP username and password must be provided together",
            )
            .into());
        }

        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.smtp.timeout_seconds > 120 {
            return Err(AppError::config("SMTP timeout cannot exceed 120 seconds").into());
        }

        if self.smtp.max_retries > 5 {
            return Err(AppError::config("SMTP max retries cannot exceed 5").into());
        }

        if self.server.request_timeout_seconds > 300 {
            return Err(AppError::config("Request timeout cannot exceed 300 seconds").into());
        }

        if self.server.body_limit_kb > 10_240 {
            return Err(AppError::config("Request body limit cannot exceed 10240 KB").into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(AppError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(AppError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        self.email.timezone()?;

        Ok(())
    }
}

impl SmtpConfig {
    /// Upper bound for one delivery attempt
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(u64::from(self.timeout_seconds))
    }
}

impl EmailConfig {
    /// Parsed display timezone
    pub fn timezone(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| AppError::config(format!("Unknown timezone '{}'", self.timezone)).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.smtp.operator_address = "bookings@wafud.example".to_string();
        config
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.smtp.port, 465);
        assert_eq!(config.smtp.timeout_seconds, 10);
        assert_eq!(config.smtp.max_retries, 1);
        assert_eq!(config.email.brand_name, "Wafud Al Haram");
        assert_eq!(config.logging.level, "info");
        assert!(config.smtp.operator_address.is_empty());
    }

    #[test]
    fn test_missing_operator_address_rejected() {
        let config = AppConfig::default();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("operator_address"));
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_credentials_must_be_paired() {
        let mut config = valid_config();
        config.smtp.username = "mailer@wafud.example".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("together"));
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = valid_config();
        config.logging.level = "invalid".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_config_validation_numeric_ranges() {
        let mut config = valid_config();
        config.smtp.timeout_seconds = 500;
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("timeout cannot exceed"));
    }

    #[test]
    fn test_unknown_timezone_rejected() {
        let mut config = valid_config();
        config.email.timezone = "Mars/Olympus_Mons".to_string();
        assert!(config.validate().is_err());

        config.email.timezone = "Asia/Riyadh".to_string();
        assert_eq!(config.email.timezone().unwrap(), chrono_tz::Asia::Riyadh);
    }

    #[test]
    fn test_apply_defaults_fills_blanks() {
        let mut config = valid_config();
        config.logging.format = String::new();
        config.smtp.timeout_seconds = 0;
        config.apply_defaults();
        assert_eq!(config.logging.format, "pretty");
        assert_eq!(config.smtp.timeout_seconds, 10);
    }
}
