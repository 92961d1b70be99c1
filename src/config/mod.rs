pub mod app_conf;
pub mod mongo_conf;
pub mod jwt_conf;
pub mod minio_conf;
pub mod messaging_conf;
pub mod pdf_conf;
pub mod seed_user_conf;

pub use mongo_conf::MongoConfig;
pub use jwt_conf::JwtConfig;
pub use minio_conf::MinioConfig;
pub use messaging_conf::MessagingConfig;
pub use pdf_conf::PdfConfig;

/// Common configuration error type
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}
