//! Configuration loader and application settings.

use crate::chains::ChainAliases;

/// Fixed chain that is never eligible for transfers, regardless of what the
/// operator configures: its fee is high and volatile enough that routing an
/// opportunity over it is never worth surfacing.
pub const LEGACY_EXCLUDED_CHAIN: &str = "ERC20";

/// Consolidated scanner configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Address the WebSocket transport binds to.
    pub bind_addr: String,
    /// Quote currency scanned pairs must be denominated in.
    pub settlement_currency: String,
    /// Minimum acceptable fee-adjusted profit ratio.
    pub minimum_profit: f64,
    /// Maximum plausible profit ratio; anything above is treated as a
    /// stale or erroneous quote and dropped.
    pub maximum_profit: f64,
    /// Absolute ceiling on the withdrawal cost, in settlement-currency units.
    pub withdraw_cost_ceiling: f64,
    /// How many order-book levels to sample per side.
    pub depth_levels: usize,
    /// Currencies excluded from matching entirely.
    pub excluded_currencies: Vec<String>,
    /// Chains excluded from transfer resolution. Always contains
    /// [`LEGACY_EXCLUDED_CHAIN`].
    pub excluded_chains: Vec<String>,
    /// Alias table for chain-name normalization.
    pub chain_aliases: ChainAliases,
}

impl AppConfig {
    /// Load configuration from environment variables, falling back to the
    /// documented defaults for anything unset.
    pub fn load() -> Self {
        let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".into());
        let settlement_currency = std::env::var("SETTLEMENT_CURRENCY")
            .unwrap_or_else(|_| "USDT".into())
            .to_uppercase();
        let minimum_profit = env_f64("MIN_PROFIT", 0.005);
        let maximum_profit = env_f64("MAX_PROFIT", 0.02);
        let withdraw_cost_ceiling = env_f64("WITHDRAW_COST_CEILING", 0.4);
        let depth_levels = std::env::var("DEPTH_LEVELS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(5);

        let excluded_currencies = env_list("EXCLUDED_CURRENCIES");
        let mut excluded_chains = env_list("EXCLUDED_CHAINS");
        if !excluded_chains.iter().any(|c| c == LEGACY_EXCLUDED_CHAIN) {
            excluded_chains.push(LEGACY_EXCLUDED_CHAIN.to_string());
        }

        let chain_aliases = match std::env::var("CHAIN_ALIAS_FILE") {
            Ok(path) => match ChainAliases::from_file(&path) {
                Ok(aliases) => aliases,
                Err(e) => {
                    tracing::warn!(error = %e, path, "alias file unreadable, using built-in table");
                    ChainAliases::default()
                }
            },
            Err(_) => ChainAliases::default(),
        };

        Self {
            bind_addr,
            settlement_currency,
            minimum_profit,
            maximum_profit,
            withdraw_cost_ceiling,
            depth_levels,
            excluded_currencies,
            excluded_chains,
            chain_aliases,
        }
    }

    /// Trading fee rate for a venue, from `<VENUE>_FEE` (e.g. `BINANCE_FEE`).
    pub fn venue_fee(name: &str) -> f64 {
        env_f64(&format!("{}_FEE", name.to_uppercase()), 0.00075)
    }
}

fn env_f64(key: &str, default: f64) -> f64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_list(key: &str) -> Vec<String> {
    std::env::var(key)
        .map(|v| {
            v.split(',')
                .map(|s| s.trim().to_uppercase())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}
