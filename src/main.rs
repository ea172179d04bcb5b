use anyhow::Result;
use arb_scanner::{
    config::AppConfig,
    server::{self, App},
    snapshot::SnapshotStore,
    utils,
    venue::{BinanceCompatClient, ExchangeClient, VenueRegistry},
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    utils::init_logging();

    let config = AppConfig::load();
    tracing::info!(
        min_profit = config.minimum_profit,
        max_profit = config.maximum_profit,
        settlement = %config.settlement_currency,
        "[INIT] arb-scanner starting"
    );

    let venues: VenueRegistry = vec![
        Arc::new(BinanceCompatClient::binance(&config.settlement_currency)?)
            as Arc<dyn ExchangeClient>,
        Arc::new(BinanceCompatClient::mexc(&config.settlement_currency)?),
    ];
    for venue in &venues {
        tracing::info!(venue = venue.name(), fee = venue.fee_rate(), "[INIT] venue registered");
    }

    let store = SnapshotStore::new(venues.clone(), &config.settlement_currency, config.chain_aliases.clone());

    // Warm the chain section once at startup; venues that fail are logged
    // and simply absent until the next fetch-currencies request.
    let failures = store.refresh_chains().await;
    for f in &failures {
        tracing::warn!(venue = %f.venue, error = %f.error, "[INIT] chain warm-up failed");
    }

    let app = Arc::new(App {
        config,
        venues,
        store,
    });
    server::run(app).await?;
    Ok(())
}
