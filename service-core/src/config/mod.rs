use crate::error::AppError;
use config::{Config as Cfg, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Loads the shared settings.
    ///
    /// Sources, lowest precedence first: an optional `configuration` file,
    /// `APP__*` environment variables, then the bare `PORT` and `LOG_LEVEL`
    /// variables most hosting platforms set.
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let config = Cfg::builder()
            .add_source(File::with_name("configuration").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .set_override_option("port", std::env::var("PORT").ok())?
            .set_override_option("log_level", std::env::var("LOG_LEVEL").ok())?
            .build()?;

        Ok(config.try_deserialize()?)
    }
}
