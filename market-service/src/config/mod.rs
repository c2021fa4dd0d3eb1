use secrecy::Secret;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::time::Duration;

const DEV_JWT_SECRET: &str = "dev-only-fruit-market-secret";
const DEFAULT_UPLOAD_MAX_BYTES: usize = 10 * 1024 * 1024;
/// One year.
const MAX_TOKEN_EXPIRY_HOURS: i64 = 24 * 365;

#[derive(Debug, Clone)]
pub struct MarketConfig {
    pub common: core_config::Config,
    pub store: StoreConfig,
    pub uploads: UploadConfig,
    pub grading: GradingConfig,
    pub auth: AuthConfig,
    pub inventory: InventoryConfig,
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub mongodb: Option<MongoConfig>,
}

#[derive(Debug, Clone)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    MongoDb,
    Memory,
}

#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub dir: String,
    pub max_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct GradingConfig {
    pub url: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: Secret<String>,
    pub token_expiry_hours: i64,
}

#[derive(Debug, Clone)]
pub struct InventoryConfig {
    pub low_stock_threshold: i64,
}

impl std::str::FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mongodb" | "mongo" => Ok(StoreBackend::MongoDb),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(format!("Invalid store backend: {}", s)),
        }
    }
}

impl MarketConfig {
    pub fn load() -> Result<Self, AppError> {
        // Loads .env and APP__ prefixed settings
        let common = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        let backend: StoreBackend = get_env("STORE_BACKEND", Some("mongodb"), is_prod)?
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let mongodb = match backend {
            StoreBackend::MongoDb => Some(MongoConfig {
                uri: get_env("MONGODB_URI", None, is_prod)?,
                database: get_env("MONGODB_DATABASE", Some("fruit_market"), is_prod)?,
            }),
            StoreBackend::Memory => None,
        };

        Ok(MarketConfig {
            common,
            store: StoreConfig { backend, mongodb },
            uploads: UploadConfig {
                dir: get_env("UPLOAD_DIR", Some("uploads"), is_prod)?,
                max_bytes: parse_env("UPLOAD_MAX_BYTES", DEFAULT_UPLOAD_MAX_BYTES)?,
            },
            grading: GradingConfig {
                url: get_env(
                    "GRADING_SERVICE_URL",
                    Some("http://localhost:5001/api/grade-fruit"),
                    is_prod,
                )?,
                timeout: Duration::from_secs(parse_env("GRADING_TIMEOUT_SECS", 30u64)?),
            },
            auth: AuthConfig {
                jwt_secret: Secret::new(get_env("JWT_SECRET", Some(DEV_JWT_SECRET), is_prod)?),
                token_expiry_hours: token_expiry_hours(parse_env("JWT_EXPIRY_HOURS", 24i64)?)?,
            },
            inventory: InventoryConfig {
                low_stock_threshold: parse_env("LOW_STOCK_THRESHOLD", 50i64)?,
            },
        })
    }

    /// Configuration for running against the in-memory store, used by tests
    /// and local demos.
    pub fn in_memory(upload_dir: impl Into<String>, grading_url: impl Into<String>) -> Self {
        MarketConfig {
            common: core_config::Config {
                port: 0,
                ..Default::default()
            },
            store: StoreConfig {
                backend: StoreBackend::Memory,
                mongodb: None,
            },
            uploads: UploadConfig {
                dir: upload_dir.into(),
                max_bytes: DEFAULT_UPLOAD_MAX_BYTES,
            },
            grading: GradingConfig {
                url: grading_url.into(),
                timeout: Duration::from_secs(5),
            },
            auth: AuthConfig {
                jwt_secret: Secret::new(DEV_JWT_SECRET.to_string()),
                token_expiry_hours: 24,
            },
            inventory: InventoryConfig {
                low_stock_threshold: 50,
            },
        }
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

fn token_expiry_hours(hours: i64) -> Result<i64, AppError> {
    if (1..=MAX_TOKEN_EXPIRY_HOURS).contains(&hours) {
        Ok(hours)
    } else {
        Err(AppError::ConfigError(anyhow::anyhow!(
            "JWT_EXPIRY_HOURS must be between 1 and {}, got {}",
            MAX_TOKEN_EXPIRY_HOURS,
            hours
        )))
    }
}

/// Numeric settings always have a safe default, even in production.
fn parse_env<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(val) => val.parse().map_err(|e: T::Err| {
            AppError::ConfigError(anyhow::anyhow!("{} has an invalid value: {}", key, e))
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_backend_parses_case_insensitively() {
        assert_eq!("MongoDB".parse::<StoreBackend>(), Ok(StoreBackend::MongoDb));
        assert_eq!("memory".parse::<StoreBackend>(), Ok(StoreBackend::Memory));
        assert!("postgres".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn missing_required_value_is_a_config_error() {
        let err = get_env("MARKET_TEST_SURELY_UNSET_KEY", None, false).unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));
    }

    #[test]
    fn production_ignores_defaults() {
        let err = get_env("MARKET_TEST_SURELY_UNSET_KEY", Some("fallback"), true).unwrap_err();
        assert!(err.to_string().contains("required in production"));
    }

    #[test]
    fn token_expiry_must_be_within_a_year() {
        assert_eq!(token_expiry_hours(24).unwrap(), 24);
        assert_eq!(token_expiry_hours(8760).unwrap(), 8760);
        assert!(matches!(token_expiry_hours(0), Err(AppError::ConfigError(_))));
        assert!(matches!(token_expiry_hours(-5), Err(AppError::ConfigError(_))));
        assert!(matches!(
            token_expiry_hours(i64::MAX),
            Err(AppError::ConfigError(_))
        ));
    }

    #[test]
    fn in_memory_config_binds_random_port() {
        let config = MarketConfig::in_memory("target/uploads", "http://127.0.0.1:1/grade");
        assert_eq!(config.common.port, 0);
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert!(config.store.mongodb.is_none());
    }
}
