use dotenv::dotenv;
use tracing::{info, warn};

use renders_backend::app::app::App;
use renders_backend::util::logger::Logger;

#[tokio::main]
async fn main() {
    let _logger = match Logger::new() {
        Ok(l) => Some(l),
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            None
        }
    };

    info!("Starting renders backend");

    // Load environment variables from .env file
    match dotenv() {
        Ok(_) => info!("Loaded .env file"),
        Err(e) => warn!("No .env file loaded: {} (using system env vars)", e),
    }

    let app = App::new().await;
    app.start().await;
}
