use async_trait::async_trait;
use serde_json::json;
use tracing::{error, info, instrument};

use crate::config::MessagingConfig;

/// Notification dispatch errors. Callers treat these as non-fatal: a failed
/// send never rolls back the transition that triggered it.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Gateway request failed: {0}")]
    RequestFailed(String),

    #[error("Gateway rejected message: {0}")]
    Rejected(String),
}

#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    /// Fire a templated WhatsApp/SMS message at a contact phone
    async fn send(&self, phone: &str, message: &str) -> Result<(), NotifyError>;
}

/// Dispatcher backed by an HTTP WhatsApp/SMS gateway
pub struct HttpNotificationDispatcher {
    client: reqwest::Client,
    config: MessagingConfig,
}

impl HttpNotificationDispatcher {
    pub fn new(config: MessagingConfig) -> Result<Self, NotifyError> {
        config
            .validate()
            .map_err(|e| NotifyError::ConfigError(e.to_string()))?;

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| NotifyError::ConfigError(e.to_string()))?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl NotificationDispatcher for HttpNotificationDispatcher {
    #[instrument(skip(self, message), fields(phone = %phone))]
    async fn send(&self, phone: &str, message: &str) -> Result<(), NotifyError> {
        info!("Dispatching notification");

        let payload = json!({
            "from": self.config.sender,
            "to": format!("+52{}", phone),
            "body": message,
        });

        let response = self
            .client
            .post(&self.config.gateway_url)
            .bearer_auth(&self.config.auth_token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                error!("Gateway request failed: {}", e);
                NotifyError::RequestFailed(e.to_string())
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("Gateway rejected message: {} {}", status, body);
            return Err(NotifyError::Rejected(format!("{}: {}", status, body)));
        }

        info!("Notification dispatched");
        Ok(())
    }
}

/// Message templates, one per lifecycle transition
pub mod templates {
    pub fn quote_created(project: &str, serial: &str) -> String {
        format!(
            "Tienes una nueva cotización pendiente de revisión: {} (serie {}).",
            project, serial
        )
    }

    pub fn quote_rejected(project: &str, comment: &str) -> String {
        format!(
            "La cotización del proyecto {} fue rechazada: \"{}\". Hay una nueva revisión por atender.",
            project, comment
        )
    }

    pub fn quote_accepted(project: &str) -> String {
        format!(
            "La cotización del proyecto {} fue aceptada y espera confirmación.",
            project
        )
    }

    pub fn quote_finalized(project: &str, serial: &str) -> String {
        format!(
            "La cotización del proyecto {} (serie {}) quedó cerrada.",
            project, serial
        )
    }

    pub fn provider_revision_submitted(project: &str) -> String {
        format!(
            "Un proveedor envió una propuesta para el proyecto {}.",
            project
        )
    }

    pub fn provider_selected(project: &str) -> String {
        format!(
            "Tu propuesta para el proyecto {} fue seleccionada.",
            project
        )
    }
}
