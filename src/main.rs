use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;

use crypto_price_tracker::app;
use crypto_price_tracker::config::AppConfig;
use crypto_price_tracker::db;
use crypto_price_tracker::external::coingecko::CoinGeckoProvider;
use crypto_price_tracker::logging::init_logging;
use crypto_price_tracker::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env().context("invalid configuration")?;

    // Logging comes up before anything that might want to log
    init_logging(&config.logging)
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e))?;

    let pool = db::connect(&config.database_url, config.db_max_connections)
        .await
        .context("failed to open database")?;

    let provider = CoinGeckoProvider::new(&config.coingecko_base_url, &config.user_agent)
        .context("failed to build CoinGecko client")?;
    tracing::info!("Using price provider: CoinGecko at {}", config.coingecko_base_url);

    let state = AppState::new(pool, Arc::new(provider), config.default_coin_count);
    let app = app::create_app(state);

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!("Crypto price tracker running at http://{}/", config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
