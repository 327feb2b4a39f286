pub mod catalog;
pub mod config;
pub mod error;
pub mod image_cache;
pub mod media;
pub mod s3_index;
pub mod selector;
pub mod server;
pub mod types;

use std::sync::Arc;

use log::{debug, info};

use config::Config;
use error::Result;
use selector::ImageService;

/// Build the catalog once, then serve invocations until shutdown.
///
/// # Errors
///
/// Returns an error if configuration is invalid, the HTTP client cannot be built,
/// or the listener fails.
pub async fn run() -> Result<()> {
    info!("Initializing image service");
    let config = Config::from_env()?;

    let service = Arc::new(ImageService::initialize(&config).await?);
    debug!("Building router");
    let router = server::build_router(service);

    server::serve(&config.bind_addr, router).await
}
