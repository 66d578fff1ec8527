use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct BlogConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub mongodb: MongoConfig,
    pub cors: CorsConfig,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
    pub connect_timeout: Duration,
    /// Upper bound for a single store operation.
    pub socket_timeout: Duration,
    pub server_selection_timeout: Duration,
    pub max_pool_size: u32,
    pub min_pool_size: u32,
    /// Delay before a failed connection attempt is retried in the background.
    pub retry_delay: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub allowed_origin: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityConfig {
    pub service_name: String,
    /// When unset, spans are only logged and not exported.
    pub otlp_endpoint: Option<String>,
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            uri: "mongodb://localhost:27017".to_string(),
            database: "educationblog".to_string(),
            connect_timeout: Duration::from_millis(30_000),
            socket_timeout: Duration::from_millis(45_000),
            server_selection_timeout: Duration::from_millis(60_000),
            max_pool_size: 10,
            min_pool_size: 5,
            retry_delay: Duration::from_secs(5),
        }
    }
}

impl MongoConfig {
    /// Rejects settings the connection manager cannot run with.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.min_pool_size > self.max_pool_size {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "MONGODB_MIN_POOL_SIZE ({}) must not exceed MONGODB_MAX_POOL_SIZE ({})",
                self.min_pool_size,
                self.max_pool_size
            )));
        }
        // A zero delay would turn background recovery into a busy loop.
        if self.retry_delay.is_zero() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "DB_RETRY_DELAY_SECS must be greater than zero"
            )));
        }
        Ok(())
    }
}

impl BlogConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";
        let defaults = MongoConfig::default();

        let mongodb = MongoConfig {
            uri: get_env("MONGODB_URI", Some(&defaults.uri), is_prod)?,
            database: get_env("MONGODB_DATABASE", Some(&defaults.database), is_prod)?,
            connect_timeout: Duration::from_millis(get_parsed(
                "MONGODB_CONNECT_TIMEOUT_MS",
                defaults.connect_timeout.as_millis() as u64,
            )?),
            socket_timeout: Duration::from_millis(get_parsed(
                "MONGODB_SOCKET_TIMEOUT_MS",
                defaults.socket_timeout.as_millis() as u64,
            )?),
            server_selection_timeout: Duration::from_millis(get_parsed(
                "MONGODB_SERVER_SELECTION_TIMEOUT_MS",
                defaults.server_selection_timeout.as_millis() as u64,
            )?),
            max_pool_size: get_parsed("MONGODB_MAX_POOL_SIZE", defaults.max_pool_size)?,
            min_pool_size: get_parsed("MONGODB_MIN_POOL_SIZE", defaults.min_pool_size)?,
            retry_delay: Duration::from_secs(get_parsed(
                "DB_RETRY_DELAY_SECS",
                defaults.retry_delay.as_secs(),
            )?),
        };

        mongodb.validate()?;

        Ok(BlogConfig {
            common: common_config,
            mongodb,
            cors: CorsConfig {
                allowed_origin: get_env("FRONTEND_URL", Some("http://localhost:5173"), is_prod)?,
            },
            observability: ObservabilityConfig {
                service_name: env::var("SERVICE_NAME")
                    .unwrap_or_else(|_| "blog-service".to_string()),
                otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|s| !s.is_empty()),
            },
        })
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

/// Reads an optional numeric setting; a present but unparsable value is an error.
fn get_parsed<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|e: T::Err| {
            AppError::ConfigError(anyhow::anyhow!("{} has invalid value '{}': {}", key, raw, e))
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mongo_defaults_follow_connection_policy() {
        let defaults = MongoConfig::default();

        assert_eq!(defaults.database, "educationblog");
        assert_eq!(defaults.connect_timeout, Duration::from_secs(30));
        assert_eq!(defaults.socket_timeout, Duration::from_secs(45));
        assert_eq!(defaults.server_selection_timeout, Duration::from_secs(60));
        assert_eq!(defaults.max_pool_size, 10);
        assert_eq!(defaults.min_pool_size, 5);
        assert_eq!(defaults.retry_delay, Duration::from_secs(5));
    }

    #[test]
    fn defaults_pass_validation() {
        assert!(MongoConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_retry_delay_is_rejected() {
        let config = MongoConfig {
            retry_delay: Duration::ZERO,
            ..MongoConfig::default()
        };

        match config.validate() {
            Err(AppError::ConfigError(e)) => {
                assert_eq!(e.to_string(), "DB_RETRY_DELAY_SECS must be greater than zero")
            }
            other => panic!("expected a config error, got {:?}", other),
        }
    }

    #[test]
    fn min_pool_above_max_is_rejected() {
        let config = MongoConfig {
            min_pool_size: 20,
            max_pool_size: 10,
            ..MongoConfig::default()
        };

        assert!(matches!(config.validate(), Err(AppError::ConfigError(_))));
    }

    #[test]
    fn get_parsed_falls_back_to_default() {
        let value: u32 = get_parsed("BLOG_TEST_UNSET_NUMERIC_SETTING", 7).unwrap();
        assert_eq!(value, 7);
    }

    #[test]
    fn get_parsed_rejects_garbage() {
        std::env::set_var("BLOG_TEST_GARBAGE_NUMERIC_SETTING", "ten");
        let result: Result<u32, AppError> = get_parsed("BLOG_TEST_GARBAGE_NUMERIC_SETTING", 7);
        assert!(matches!(result, Err(AppError::ConfigError(_))));
    }

    #[test]
    fn get_env_requires_value_in_prod() {
        let result = get_env("BLOG_TEST_UNSET_STRING_SETTING", Some("fallback"), true);
        assert!(matches!(result, Err(AppError::ConfigError(_))));
    }
}
