use std::env;
use tracing::error;

use crate::config::ConfigError;

/// First supervisor account seeded at startup when no user owns the phone yet
#[derive(Debug, Clone)]
pub struct SeedUserConfig {
    pub phone: String,
    pub name: String,
    pub email: Option<String>,
    pub password: String,
}

impl SeedUserConfig {
    /// Expected environment variables:
    /// - SEED_SUPERVISOR_PHONE (required, 10 digits)
    /// - SEED_SUPERVISOR_NAME (required)
    /// - SEED_SUPERVISOR_EMAIL (optional)
    /// - SEED_SUPERVISOR_PASSWORD (required)
    pub fn from_env() -> Result<Self, ConfigError> {
        let phone = env::var("SEED_SUPERVISOR_PHONE")
            .map_err(|_| ConfigError::EnvVarNotFound("SEED_SUPERVISOR_PHONE".to_string()))?;
        let name = env::var("SEED_SUPERVISOR_NAME")
            .map_err(|_| ConfigError::EnvVarNotFound("SEED_SUPERVISOR_NAME".to_string()))?;
        let email = env::var("SEED_SUPERVISOR_EMAIL").ok();
        let password = env::var("SEED_SUPERVISOR_PASSWORD")
            .map_err(|_| ConfigError::EnvVarNotFound("SEED_SUPERVISOR_PASSWORD".to_string()))?;

        if phone.len() != 10 || !phone.chars().all(|c| c.is_ascii_digit()) {
            error!("SEED_SUPERVISOR_PHONE must be a 10-digit number");
            return Err(ConfigError::InvalidValue(
                "SEED_SUPERVISOR_PHONE must be a 10-digit number".to_string(),
            ));
        }

        Ok(Self {
            phone,
            name,
            email,
            password,
        })
    }
}
