//! bhada-config - configuration loading
//!
//! Sources, later ones overriding earlier ones:
//! 1. `{config_dir}/default.toml`
//! 2. `{config_dir}/{APP_ENV}.toml`
//! 3. environment variables prefixed `BHADA_`, `__` separating nested keys
//!    (`BHADA_JWT__SECRET`, `BHADA_OTP__RESEND_COOLDOWN_SECS`)

use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use thiserror::Error;

/// Prefix of the JWT secret shipped in `default.toml`
pub const DEV_SECRET_PREFIX: &str = "dev-only-";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Load(Box::new(err))
    }
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Allowed CORS origins, empty means permissive
    #[serde(default)]
    pub cors_allowed_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Storage backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process-local, lost on restart
    #[default]
    Memory,
    Postgres,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: Secret<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_run_migrations")]
    pub run_migrations: bool,
}

fn default_max_connections() -> u32 {
    10
}

fn default_run_migrations() -> bool {
    true
}

/// JWT configuration
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: Secret<String>,
    #[serde(default = "default_expires_in")]
    pub expires_in: u64,
    #[serde(default = "default_refresh_expires_in")]
    pub refresh_expires_in: u64,
    #[serde(default = "default_issuer")]
    pub issuer: String,
    #[serde(default = "default_audience")]
    pub audience: String,
}

fn default_expires_in() -> u64 {
    3600
}

fn default_refresh_expires_in() -> u64 {
    604800
}

fn default_issuer() -> String {
    "bhada-identity".to_string()
}

fn default_audience() -> String {
    "bhada-web".to_string()
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// JSON log lines instead of the human-readable format
    #[serde(default)]
    pub json: bool,
    /// Expose Prometheus metrics at `/metrics`
    #[serde(default)]
    pub metrics_enabled: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json: false,
            metrics_enabled: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// SMTP configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub username: String,
    pub password: Secret<String>,
    pub from_email: String,
    pub from_name: String,
    #[serde(default)]
    pub use_tls: bool,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Directory holding `*.html` / `*.txt` email templates
    pub template_dir: Option<String>,
}

fn default_timeout_secs() -> u64 {
    30
}

/// OTP issuance policy
#[derive(Debug, Clone, Deserialize)]
pub struct OtpConfig {
    #[serde(default = "default_code_ttl_minutes")]
    pub code_ttl_minutes: i64,
    #[serde(default = "default_resend_cooldown_secs")]
    pub resend_cooldown_secs: i64,
    #[serde(default = "default_max_requests_per_hour")]
    pub max_requests_per_hour: u32,
    /// Verification attempts allowed per issued code
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            code_ttl_minutes: default_code_ttl_minutes(),
            resend_cooldown_secs: default_resend_cooldown_secs(),
            max_requests_per_hour: default_max_requests_per_hour(),
            max_attempts: default_max_attempts(),
        }
    }
}

fn default_code_ttl_minutes() -> i64 {
    10
}

fn default_resend_cooldown_secs() -> i64 {
    60
}

fn default_max_requests_per_hour() -> u32 {
    5
}

fn default_max_attempts() -> u32 {
    5
}

/// Coin wallet configuration
#[derive(Debug, Clone, Deserialize)]
pub struct WalletConfig {
    /// Coins credited when an account is created
    #[serde(default = "default_welcome_bonus")]
    pub welcome_bonus: i64,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            welcome_bonus: default_welcome_bonus(),
        }
    }
}

fn default_welcome_bonus() -> i64 {
    100
}

/// Expired OTP cleanup
#[derive(Debug, Clone, Deserialize)]
pub struct CleanupConfig {
    #[serde(default = "default_cleanup_interval_secs")]
    pub interval_secs: u64,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_cleanup_interval_secs(),
        }
    }
}

fn default_cleanup_interval_secs() -> u64 {
    300
}

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app_name: String,
    #[serde(default = "default_app_env")]
    pub app_env: String,
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    pub database: Option<DatabaseConfig>,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    /// Without SMTP settings codes are only written to the log
    pub email: Option<EmailConfig>,
    #[serde(default)]
    pub otp: OtpConfig,
    #[serde(default)]
    pub wallet: WalletConfig,
    #[serde(default)]
    pub cleanup: CleanupConfig,
}

fn default_app_env() -> String {
    "development".to_string()
}

impl AppConfig {
    /// Load configuration from files and environment variables
    pub fn load(config_dir: &str) -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| default_app_env());

        let config: Self = Figment::new()
            .merge(Toml::file(format!("{}/default.toml", config_dir)))
            .merge(Toml::file(format!("{}/{}.toml", config_dir, env)))
            .merge(Env::prefixed("BHADA_").split("__"))
            .extract()?;

        config.validate()?;
        Ok(config)
    }

    /// Cross-field checks figment cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt.secret.expose_secret().len() < 32 {
            return Err(ConfigError::Invalid(
                "jwt.secret must be at least 32 characters long".to_string(),
            ));
        }

        if self.is_production()
            && self.jwt.secret.expose_secret().starts_with(DEV_SECRET_PREFIX)
        {
            return Err(ConfigError::Invalid(
                "jwt.secret still holds the development default; set BHADA_JWT__SECRET"
                    .to_string(),
            ));
        }

        if self.storage.backend == StorageBackend::Postgres && self.database.is_none() {
            return Err(ConfigError::Invalid(
                "storage.backend = \"postgres\" requires a [database] section".to_string(),
            ));
        }

        if self.otp.code_ttl_minutes <= 0 || self.otp.resend_cooldown_secs < 0 {
            return Err(ConfigError::Invalid(
                "otp.code_ttl_minutes must be positive and otp.resend_cooldown_secs non-negative"
                    .to_string(),
            ));
        }

        if self.otp.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "otp.max_attempts must be at least 1".to_string(),
            ));
        }

        if self.wallet.welcome_bonus < 0 {
            return Err(ConfigError::Invalid(
                "wallet.welcome_bonus must not be negative".to_string(),
            ));
        }

        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.app_env == "production"
    }

    pub fn is_development(&self) -> bool {
        self.app_env == "development"
    }
}

#[cfg(test)]
mod tests;
