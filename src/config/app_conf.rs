use std::env;
use tracing::warn;

use crate::config::ConfigError;

/// HTTP listener configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    /// Expected environment variables:
    /// - APP_HOST: Listen address (defaults to "127.0.0.1")
    /// - APP_PORT: Listen port (defaults to 8080)
    pub fn from_env() -> Self {
        let host = env::var("APP_HOST").unwrap_or_else(|_| {
            warn!("APP_HOST not set, using default: 127.0.0.1");
            "127.0.0.1".to_string()
        });
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_else(|| {
                warn!("APP_PORT not set or invalid, using default: 8080");
                8080
            });
        AppConfig { host, port }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.parse::<std::net::IpAddr>().is_err() {
            return Err(ConfigError::InvalidValue(format!(
                "APP_HOST is not a valid IP address: {}",
                self.host
            )));
        }
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}
