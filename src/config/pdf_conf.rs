use std::env;
use tracing::{error, info, warn};

use crate::config::ConfigError;

/// Headless-browser PDF rendering configuration
#[derive(Debug, Clone)]
pub struct PdfConfig {
    /// Path to the browser executable used for printing
    pub browser_path: String,
    /// Render timeout in seconds
    pub render_timeout_secs: u64,
}

impl PdfConfig {
    /// Load PDF rendering configuration from environment variables
    ///
    /// Expected environment variables:
    /// - PDF_BROWSER_PATH: Headless browser executable (defaults to "chromium")
    /// - PDF_RENDER_TIMEOUT: Render timeout in seconds (defaults to 30)
    pub fn from_env() -> Result<Self, ConfigError> {
        info!("Loading PDF rendering configuration from environment variables");

        let browser_path = env::var("PDF_BROWSER_PATH").unwrap_or_else(|_| {
            warn!("PDF_BROWSER_PATH not set, using default: chromium");
            "chromium".to_string()
        });

        let render_timeout_secs = env::var("PDF_RENDER_TIMEOUT")
            .unwrap_or_else(|_| "30".to_string())
            .parse::<u64>()
            .map_err(|e| {
                error!("Invalid PDF_RENDER_TIMEOUT value: {}", e);
                ConfigError::ParseError(format!("PDF_RENDER_TIMEOUT: {}", e))
            })?;

        let config = Self {
            browser_path,
            render_timeout_secs,
        };
        config.validate()?;

        info!("PDF rendering configuration loaded successfully");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.browser_path.is_empty() {
            error!("Browser path is empty");
            return Err(ConfigError::InvalidValue(
                "Browser path cannot be empty".to_string(),
            ));
        }
        if self.render_timeout_secs == 0 {
            error!("Render timeout must be greater than 0");
            return Err(ConfigError::InvalidValue(
                "Render timeout must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            browser_path: "chromium".to_string(),
            render_timeout_secs: 30,
        }
    }
}
