use anyhow::Result;
use chess_duel::config::{PlayerArgs, PlayerConfig};
use chess_duel::player;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = PlayerConfig::from(PlayerArgs::parse());
    info!(depth = config.depth, "booting automated player");

    tokio::select! {
        result = player::run(config) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("shutting down");
            Ok(())
        }
    }
}
