#[tokio::main]
async fn main() -> randpic::error::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("randpic=info"))
        .init();
    log::info!("Starting randpic");

    match randpic::run().await {
        Ok(()) => {
            log::info!("Service shut down successfully");
            Ok(())
        }
        Err(e) => {
            log::error!("Service encountered an error: {}", e);
            Err(e)
        }
    }
}
