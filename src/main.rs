mod config;
mod data;
mod server;
mod strategies;

use std::sync::Arc;

use anyhow::Result;
use config::{Config, EnvConfig};
use data::allora::{AlloraApi, AlloraClient};
use server::ApiState;
use strategies::yield_risk::YieldRiskStrategy;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    tracing::info!("🚀 Allora Strategy API starting...");

    // Load configuration
    tracing::info!("Loading configuration...");
    let config = Config::load("config.toml")?;
    let env_config = EnvConfig::load()?;

    tracing::info!("Chain: {}", env_config.allora_chain);
    tracing::info!("Allora endpoint: {}", config.allora.base_url);

    // The gateway client and credentials are built once and shared read-only
    let network: Arc<dyn AlloraApi> = Arc::new(AlloraClient::new(&config.allora, &env_config)?);
    let strategy = Arc::new(YieldRiskStrategy::new(network.clone()));

    let state = ApiState {
        strategy,
        network,
        chain: env_config.allora_chain.clone(),
    };

    tracing::info!("✅ Service initialized");

    let addr = format!("{}:{}", config.server.host, env_config.api_port);
    server::serve(addr, state).await
}
