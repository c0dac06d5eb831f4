use std::sync::Arc;

use anyhow::{Context, Result};
use coin_history_api::{telemetry, AppConfig, AppState, CoinGeckoClient, Database};

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::from_env().context("invalid configuration")?;
    telemetry::init_tracing(telemetry::DEFAULT_LOG_FILTER);

    let db = Database::new(&config.database_url)
        .await
        .with_context(|| format!("failed to open database at {}", config.database_url))?;
    tracing::info!("Connected to {}", config.database_url);
    let db = Arc::new(db);

    let market = CoinGeckoClient::from_config(&config).context("failed to build market data client")?;
    let state = AppState::new(db.clone(), Arc::new(market));

    let served = coin_history_api::start_server(state, config.port).await;
    db.close().await;
    served
}
