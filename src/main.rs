use anyhow::Result;
use catalog_proxy::config::Config;
use catalog_proxy::server::Server;
use clap::Parser;
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Cached, rate-limit aware proxy in front of a GraphQL product catalog
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Overrides BIND_ADDR
    #[arg(long)]
    bind_addr: Option<SocketAddr>,

    /// Overrides LOG_LEVEL
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    let mut config = Config::from_env()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;
    if let Some(bind_addr) = cli.bind_addr {
        config.bind_addr = bind_addr;
    }
    if let Some(log_level) = cli.log_level {
        config.log_level = log_level;
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("catalog_proxy={},tower_http=debug", config.log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting catalog proxy");
    tracing::info!(
        "Configuration: bind_addr={}, redis_url={}, upstream={}",
        config.bind_addr,
        config.redis_url,
        config.graphql_endpoint()
    );

    let server = Server::build(config)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create server: {}", e))?;

    server
        .run()
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}
