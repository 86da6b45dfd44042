use b_route_meter::{platform, snapshot_reader, Config, HomeAssistantAPI, SnapshotReader};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    tracing::info!("Starting B-Route meter bridge");
    let config = Config::from_env();
    config.log_summary();

    // Snapshots arrive as JSON lines from the acquisition process on stdin
    let (sender, feed) = snapshot_reader::channel();
    let _reader = SnapshotReader::new(tokio::io::stdin(), sender).spawn();

    let api = HomeAssistantAPI::from_config(&config);
    platform::run(feed, api, config).await?;

    Ok(())
}
