//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `BAZAAR_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `BAZAAR_BASE_URL` - Public URL of the site
//!
//! ## Optional
//! - `BAZAAR_HOST` - Bind address (default: 127.0.0.1)
//! - `BAZAAR_PORT` - Listen port (default: 3000)
//! - `BAZAAR_TAX_RATE` - Sales tax percentage (default: 8)
//! - `BAZAAR_SHIPPING_FEE` - Flat shipping fee (default: 5.00)
//! - `BAZAAR_FREE_SHIPPING_OVER` - Free shipping threshold (default: 50.00, empty disables)
//! - `BAZAAR_DEFAULT_VENDOR_COMMISSION` - Platform fee for new vendors, percent (default: 10)
//! - `BAZAAR_DEFAULT_SALES_COMMISSION` - Commission for new salespeople, percent (default: 5)
//! - `ANTHROPIC_API_KEY` - Enables AI suggestions when set
//! - `ANTHROPIC_MODEL` - Model name (default: claude-sonnet-4-20250514)
//! - `BAZAAR_AI_REQUESTS_PER_MINUTE` - AI request budget per 60 second window (default: 10)
//! - `BAZAAR_LOG_JSON` - Emit JSON logs (also enabled on Fly.io)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use bazaar_core::pricing::ShippingPolicy;
use bazaar_core::{Money, Percent};
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_AI_MODEL: &str = "claude-sonnet-4-20250514";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL of the site
    pub base_url: String,
    /// Tax, shipping and commission defaults
    pub commerce: CommerceConfig,
    /// Hosted LLM settings; `None` disables AI suggestions
    pub ai: Option<AiConfig>,
    /// Emit JSON logs instead of human-readable text
    pub log_json: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Money rules applied at checkout and to new accounts.
#[derive(Debug, Clone, Copy)]
pub struct CommerceConfig {
    pub tax_rate: Percent,
    pub shipping: ShippingPolicy,
    pub default_vendor_commission: Percent,
    pub default_sales_commission: Percent,
}

impl Default for CommerceConfig {
    fn default() -> Self {
        Self {
            tax_rate: Percent::whole(8),
            shipping: ShippingPolicy {
                flat_fee: Money::from_cents(500),
                free_over: Some(Money::from_cents(5000)),
            },
            default_vendor_commission: Percent::whole(10),
            default_sales_commission: Percent::whole(5),
        }
    }
}

/// Hosted LLM configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct AiConfig {
    /// Provider API key
    pub api_key: SecretString,
    /// Model name
    pub model: String,
    /// Requests allowed per 60 second window
    pub requests_per_minute: u32,
}

impl std::fmt::Debug for AiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiConfig")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("requests_per_minute", &self.requests_per_minute)
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("BAZAAR_DATABASE_URL")?;
        let host = parse_env_or_default("BAZAAR_HOST", "127.0.0.1")?;
        let port = parse_env_or_default("BAZAAR_PORT", "3000")?;
        let base_url = get_required_env("BAZAAR_BASE_URL")?;
        Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("BAZAAR_BASE_URL".to_string(), e.to_string())
        })?;

        let commerce = CommerceConfig::from_env()?;
        let ai = AiConfig::from_env()?;
        let log_json = get_optional_env("BAZAAR_LOG_JSON").is_some()
            || get_optional_env("FLY_APP_NAME").is_some();

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            commerce,
            ai,
            log_json,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` flag.
    #[must_use]
    pub fn is_https(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl CommerceConfig {
    /// Load pricing settings on their own (the CLI needs no server settings).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if a value doesn't parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let free_over = match get_optional_env("BAZAAR_FREE_SHIPPING_OVER") {
            Some(value) if value.trim().is_empty() => None,
            Some(value) => Some(parse_value::<Money>("BAZAAR_FREE_SHIPPING_OVER", &value)?),
            None => Some(Money::from_cents(5000)),
        };

        Ok(Self {
            tax_rate: parse_env_or_default("BAZAAR_TAX_RATE", "8")?,
            shipping: ShippingPolicy {
                flat_fee: parse_env_or_default("BAZAAR_SHIPPING_FEE", "5.00")?,
                free_over,
            },
            default_vendor_commission: parse_env_or_default(
                "BAZAAR_DEFAULT_VENDOR_COMMISSION",
                "10",
            )?,
            default_sales_commission: parse_env_or_default("BAZAAR_DEFAULT_SALES_COMMISSION", "5")?,
        })
    }
}

impl AiConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(api_key) = get_optional_env("ANTHROPIC_API_KEY") else {
            return Ok(None);
        };
        validate_secret_strength(&api_key, "ANTHROPIC_API_KEY")?;

        let requests_per_minute: u32 = parse_env_or_default("BAZAAR_AI_REQUESTS_PER_MINUTE", "10")?;
        if requests_per_minute == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "BAZAAR_AI_REQUESTS_PER_MINUTE".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        Ok(Some(Self {
            api_key: SecretString::from(api_key),
            model: get_env_or_default("ANTHROPIC_MODEL", DEFAULT_AI_MODEL),
            requests_per_minute,
        }))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL` (used by Fly.io postgres attach).
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable (or its default) into `T`.
fn parse_env_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    parse_value(key, &get_env_or_default(key, default))
}

fn parse_value<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a real API key."
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-api-key-here", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        let result = validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_parse_value_percent() {
        let rate: Percent = parse_value("BAZAAR_TAX_RATE", " 7.5 ").unwrap();
        assert_eq!(rate.to_string(), "7.5%");
        let err = parse_value::<Percent>("BAZAAR_TAX_RATE", "140").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "BAZAAR_TAX_RATE"));
    }

    #[test]
    fn test_parse_value_money() {
        let fee: Money = parse_value("BAZAAR_SHIPPING_FEE", "4.99").unwrap();
        assert_eq!(fee, Money::from_cents(499));
        assert!(parse_value::<Money>("BAZAAR_SHIPPING_FEE", "free").is_err());
    }

    #[test]
    fn test_default_commerce_config() {
        let commerce = CommerceConfig::default();
        assert_eq!(commerce.tax_rate, Percent::whole(8));
        assert_eq!(commerce.shipping.free_over, Some(Money::from_cents(5000)));
    }

    #[test]
    fn test_socket_addr() {
        let config = ServerConfig {
            database_url: SecretString::from("postgres://localhost/test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "https://bazaar.test".to_string(),
            commerce: CommerceConfig::default(),
            ai: None,
            log_json: false,
            sentry_dsn: None,
            sentry_environment: None,
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
        assert!(config.is_https());
    }

    #[test]
    fn test_ai_config_debug_redacts_key() {
        let config = AiConfig {
            api_key: SecretString::from("sk-super-hidden-value"),
            model: "claude-test".to_string(),
            requests_per_minute: 10,
        };
        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("claude-test"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("sk-super-hidden-value"));
    }
}
