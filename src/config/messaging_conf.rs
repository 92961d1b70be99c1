use serde::{Deserialize, Serialize};
use std::env;
use tracing::{debug, error, info, warn};

use crate::config::ConfigError;

/// WhatsApp/SMS gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagingConfig {
    /// Gateway endpoint the dispatcher posts messages to
    pub gateway_url: String,
    /// Bearer token for the gateway
    pub auth_token: String,
    /// Sender identity registered with the gateway
    pub sender: String,
    /// Request timeout in seconds
    pub request_timeout_secs: u64,
}

impl MessagingConfig {
    /// Load messaging configuration from environment variables
    ///
    /// Expected environment variables:
    /// - MESSAGING_GATEWAY_URL: HTTP endpoint of the WhatsApp/SMS gateway (required)
    /// - MESSAGING_AUTH_TOKEN: Bearer token for the gateway (required)
    /// - MESSAGING_SENDER: Sender identity (required)
    /// - MESSAGING_TIMEOUT: Request timeout in seconds (defaults to 10)
    pub fn from_env() -> Result<Self, ConfigError> {
        info!("Loading messaging configuration from environment variables");

        let gateway_url = env::var("MESSAGING_GATEWAY_URL").map_err(|_| {
            error!("MESSAGING_GATEWAY_URL environment variable not found");
            ConfigError::EnvVarNotFound("MESSAGING_GATEWAY_URL".to_string())
        })?;
        debug!("Messaging gateway URL: {}", gateway_url);

        let auth_token = env::var("MESSAGING_AUTH_TOKEN").map_err(|_| {
            error!("MESSAGING_AUTH_TOKEN environment variable not found");
            ConfigError::EnvVarNotFound("MESSAGING_AUTH_TOKEN".to_string())
        })?;

        let sender = env::var("MESSAGING_SENDER").map_err(|_| {
            error!("MESSAGING_SENDER environment variable not found");
            ConfigError::EnvVarNotFound("MESSAGING_SENDER".to_string())
        })?;

        let request_timeout_secs = env::var("MESSAGING_TIMEOUT")
            .unwrap_or_else(|_| {
                warn!("MESSAGING_TIMEOUT not set, using default: 10 seconds");
                "10".to_string()
            })
            .parse::<u64>()
            .map_err(|e| {
                error!("Invalid MESSAGING_TIMEOUT value: {}", e);
                ConfigError::ParseError(format!("MESSAGING_TIMEOUT: {}", e))
            })?;

        let config = Self {
            gateway_url,
            auth_token,
            sender,
            request_timeout_secs,
        };
        config.validate()?;

        info!("Messaging configuration loaded successfully");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.gateway_url.starts_with("http://") && !self.gateway_url.starts_with("https://") {
            error!("Messaging gateway URL must be an http(s) URL");
            return Err(ConfigError::InvalidValue(
                "Gateway URL must start with http:// or https://".to_string(),
            ));
        }
        if self.sender.is_empty() {
            error!("Messaging sender is empty");
            return Err(ConfigError::InvalidValue(
                "Sender cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            gateway_url: "http://localhost:4010/messages".to_string(),
            auth_token: "test-token".to_string(),
            sender: "renders".to_string(),
            request_timeout_secs: 10,
        }
    }
}
