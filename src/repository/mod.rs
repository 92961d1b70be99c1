pub mod provider_quote_repo;
pub mod quote_info_repo;
pub mod quote_revision_repo;
pub mod repository_error;
pub mod user_repo;

use mongodb::options::{ClientOptions, Credential};
use mongodb::Client;

use crate::config::mongo_conf::MongoConfig;

/// Build a Mongo client from configuration. Each repository derives its
/// database/collection handles from one of these.
pub async fn connect(config: &MongoConfig) -> Result<Client, mongodb::error::Error> {
    let mut client_options = ClientOptions::parse(&config.uri).await?;
    client_options.app_name = Some("RendersBackend".to_string());
    client_options.max_pool_size = Some(config.pool_size);
    client_options.connect_timeout = Some(std::time::Duration::from_secs(
        config.connection_timeout_secs,
    ));

    if let (Some(ref username), Some(ref password)) = (&config.username, &config.password) {
        client_options.credential = Some(
            Credential::builder()
                .username(username.clone())
                .password(password.clone())
                .build(),
        );
    }

    Client::with_options(client_options)
}
