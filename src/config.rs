// Application configuration
// Everything is read from the environment once at startup; a `.env` file is honoured for local runs

use regex::Regex;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::OnceLock;

/// Default access token lifetime (15 minutes)
pub const DEFAULT_ACCESS_TOKEN_TTL: &str = "15m";
/// Default refresh token lifetime (7 days)
pub const DEFAULT_REFRESH_TOKEN_TTL: &str = "7d";
/// Longest accepted token lifetime (365 days)
pub const MAX_TOKEN_TTL_SECONDS: i64 = 365 * 86_400;

/// Configuration loading failures. All of them are fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub jwt_access_secret: String,
    pub jwt_refresh_secret: String,
    /// Access token lifetime in seconds
    pub access_token_ttl: i64,
    /// Refresh token lifetime in seconds
    pub refresh_token_ttl: i64,
    pub client_url: String,
    pub auto_seed: bool,
    pub allow_import: bool,
    pub dataset_dir: PathBuf,
    /// Adds `Secure` to the refresh cookie
    pub secure_cookies: bool,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// The JWT secrets have no fallback value; a missing or blank secret is an error.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenv::dotenv().ok();
        }

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = std::env::var("PORT").unwrap_or_else(|_| "5001".to_string());
        let bind_address = format!("{}:{}", host, port)
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("HOST/PORT".to_string(), e.to_string()))?;

        let database_url = ["DATABASE_URL", "MONGODB_URI", "MONGO_URI"]
            .iter()
            .find_map(|key| std::env::var(key).ok())
            .unwrap_or_else(|| "postgres://localhost:5432/cultural_events".to_string());

        let jwt_access_secret = required_secret("JWT_ACCESS_SECRET")?;
        let jwt_refresh_secret = required_secret("JWT_REFRESH_SECRET")?;
        if jwt_access_secret == jwt_refresh_secret {
            tracing::warn!("JWT_ACCESS_SECRET and JWT_REFRESH_SECRET are identical");
        }

        let access_token_ttl = ttl_var("ACCESS_TOKEN_TTL", DEFAULT_ACCESS_TOKEN_TTL)?;
        let refresh_token_ttl = ttl_var("REFRESH_TOKEN_TTL", DEFAULT_REFRESH_TOKEN_TTL)?;

        let client_url =
            std::env::var("CLIENT_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());

        let auto_seed = bool_var("AUTO_SEED", true)?;
        let allow_import = bool_var("ALLOW_IMPORT", false)?;

        let dataset_dir = std::env::var("DATASET_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data"));

        let secure_cookies = std::env::var("APP_ENV")
            .map(|env| env.eq_ignore_ascii_case("production"))
            .unwrap_or(false);

        Ok(Self {
            bind_address,
            database_url,
            jwt_access_secret,
            jwt_refresh_secret,
            access_token_ttl,
            refresh_token_ttl,
            client_url,
            auto_seed,
            allow_import,
            dataset_dir,
            secure_cookies,
        })
    }
}

fn required_secret(key: &str) -> Result<String, ConfigError> {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::MissingVar(key.to_string())),
    }
}

fn ttl_var(key: &str, default: &str) -> Result<i64, ConfigError> {
    let raw = std::env::var(key).unwrap_or_else(|_| default.to_string());
    parse_ttl(&raw).ok_or_else(|| {
        ConfigError::InvalidValue(
            key.to_string(),
            format!(
                "'{}' is not a duration between 1s and 365d, like 900, 30s, 15m, 12h or 7d",
                raw
            ),
        )
    })
}

fn bool_var(key: &str, default: bool) -> Result<bool, ConfigError> {
    match std::env::var(key) {
        Err(_) => Ok(default),
        Ok(value) => match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" | "" => Ok(false),
            other => Err(ConfigError::InvalidValue(
                key.to_string(),
                format!("'{}' is not a boolean", other),
            )),
        },
    }
}

/// Parses a token lifetime into seconds.
///
/// Accepts a bare number of seconds or a number followed by one of
/// `s`, `m`, `h`, `d`. Zero and anything above [`MAX_TOKEN_TTL_SECONDS`] are rejected.
pub fn parse_ttl(raw: &str) -> Option<i64> {
    static TTL_PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = TTL_PATTERN
        .get_or_init(|| Regex::new(r"^\s*(\d+)\s*([smhd]?)\s*$").expect("valid TTL pattern"));

    let captures = pattern.captures(raw)?;
    let amount: i64 = captures.get(1)?.as_str().parse().ok()?;
    let unit = match captures.get(2).map(|m| m.as_str()).unwrap_or("") {
        "" | "s" => 1,
        "m" => 60,
        "h" => 3_600,
        "d" => 86_400,
        _ => return None,
    };

    match amount.checked_mul(unit) {
        Some(seconds) if seconds > 0 && seconds <= MAX_TOKEN_TTL_SECONDS => Some(seconds),
        _ => None,
    }
}
