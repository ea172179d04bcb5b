//! Market snapshot store.
//!
//! Holds the per-currency transfer-chain metadata and the per-pair quotes
//! the matcher operates over. Refreshes fan out one request per venue,
//! capture each venue's failure independently, and publish a freshly built
//! snapshot over a watch channel. Readers clone the current `Arc` and are
//! never exposed to a half-written refresh.

use crate::chains::ChainAliases;
use crate::models::{Quote, TransferChain, VenueFailure};
use crate::venue::{RawChain, VenueRegistry};
use futures::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{Mutex, watch};
use tracing::{info, warn};

/// Currency -> venue -> transferable networks.
pub type ChainMap = BTreeMap<String, BTreeMap<String, Vec<TransferChain>>>;
/// Pair symbol -> venue -> best bid/ask.
pub type QuoteMap = BTreeMap<String, BTreeMap<String, Quote>>;

/// Point-in-time view of the market across all venues.
#[derive(Debug, Clone, Default)]
pub struct MarketSnapshot {
    pub chains: ChainMap,
    pub quotes: QuoteMap,
}

pub struct SnapshotStore {
    venues: VenueRegistry,
    settlement: String,
    aliases: ChainAliases,
    tx: watch::Sender<Arc<MarketSnapshot>>,
    rx: watch::Receiver<Arc<MarketSnapshot>>,
    // Serializes refreshes so two concurrent rebuilds cannot publish
    // snapshots derived from the same stale base.
    refresh_lock: Mutex<()>,
}

impl SnapshotStore {
    pub fn new(venues: VenueRegistry, settlement: &str, aliases: ChainAliases) -> Self {
        let (tx, rx) = watch::channel(Arc::new(MarketSnapshot::default()));
        Self {
            venues,
            settlement: settlement.to_uppercase(),
            aliases,
            tx,
            rx,
            refresh_lock: Mutex::new(()),
        }
    }

    /// The most recently published snapshot.
    pub fn current(&self) -> Arc<MarketSnapshot> {
        self.rx.borrow().clone()
    }

    /// Rebuild the chain section from every venue's currency listing.
    ///
    /// A venue that fails contributes nothing; the rest contribute fully.
    pub async fn refresh_chains(&self) -> Vec<VenueFailure> {
        let _guard = self.refresh_lock.lock().await;

        let fetches = self.venues.iter().map(|venue| {
            let venue = venue.clone();
            async move {
                info!(venue = venue.name(), "fetching currencies");
                let res = venue.list_currencies().await;
                (venue.name().to_string(), res)
            }
        });

        let mut chains: ChainMap = BTreeMap::new();
        let mut failures = Vec::new();
        for (venue_name, res) in join_all(fetches).await {
            match res {
                Ok(currencies) => {
                    for (currency, raw_chains) in currencies {
                        let normalized = self.normalize_chains(raw_chains);
                        chains
                            .entry(currency)
                            .or_default()
                            .insert(venue_name.clone(), normalized);
                    }
                }
                Err(e) => {
                    warn!(venue = %venue_name, error = %e, "currency fetch failed");
                    failures.push(VenueFailure {
                        venue: venue_name,
                        error: e.to_string(),
                    });
                }
            }
        }

        let quotes = self.current().quotes.clone();
        self.tx.send_replace(Arc::new(MarketSnapshot { chains, quotes }));
        failures
    }

    /// Rebuild the quote section from every venue's ticker listing.
    ///
    /// Only pairs quoted against the settlement currency are retained, and
    /// venue-specific `:SETTLEMENT` suffixes are stripped so the same pair
    /// compares across venues.
    pub async fn refresh_quotes(&self) -> Vec<VenueFailure> {
        let _guard = self.refresh_lock.lock().await;

        let fetches = self.venues.iter().map(|venue| {
            let venue = venue.clone();
            async move {
                info!(venue = venue.name(), "fetching tickers");
                let res = venue.list_tickers().await;
                (venue.name().to_string(), res)
            }
        });

        let mut quotes: QuoteMap = BTreeMap::new();
        let mut failures = Vec::new();
        for (venue_name, res) in join_all(fetches).await {
            match res {
                Ok(tickers) => {
                    for (symbol, quote) in tickers {
                        let Some(pair) = self.settlement_pair(&symbol) else {
                            continue;
                        };
                        quotes.entry(pair).or_default().insert(venue_name.clone(), quote);
                    }
                }
                Err(e) => {
                    warn!(venue = %venue_name, error = %e, "ticker fetch failed");
                    failures.push(VenueFailure {
                        venue: venue_name,
                        error: e.to_string(),
                    });
                }
            }
        }

        let chains = self.current().chains.clone();
        self.tx.send_replace(Arc::new(MarketSnapshot { chains, quotes }));
        failures
    }

    fn normalize_chains(&self, raw: Vec<RawChain>) -> Vec<TransferChain> {
        raw.into_iter()
            .map(|c| TransferChain {
                chain_name: self.aliases.normalize(&c.network),
                deposit_enabled: c.deposit_enabled,
                withdraw_enabled: c.withdraw_enabled,
                withdraw_fee: c.withdraw_fee.max(0.0),
            })
            .collect()
    }

    /// Keep only settlement-market symbols, stripped of any trailing
    /// settlement marker (`BTC/USDT:USDT` -> `BTC/USDT`).
    fn settlement_pair(&self, symbol: &str) -> Option<String> {
        let marker = format!(":{}", self.settlement);
        let symbol = symbol.strip_suffix(marker.as_str()).unwrap_or(symbol);
        let quote_suffix = format!("/{}", self.settlement);
        symbol.ends_with(quote_suffix.as_str()).then(|| symbol.to_string())
    }
}
