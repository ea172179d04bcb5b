//! Exchange venue collaborators.
//!
//! Everything the scanner knows about a venue comes through the
//! [`ExchangeClient`] trait: currency/network listings, best bid/ask
//! tickers, and order-book depth. The matching core never talks to a venue
//! directly; it only reads the snapshot the store builds from these calls.

use crate::errors::Result;
use crate::models::{OrderBookDepth, Quote};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;

pub mod rest;

#[cfg(test)]
pub mod mock;

pub use rest::BinanceCompatClient;

/// A currency's network entry as a venue reports it, before chain-name
/// normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct RawChain {
    /// Venue-specific network label.
    pub network: String,
    pub deposit_enabled: bool,
    pub withdraw_enabled: bool,
    /// Withdrawal fee in source-currency units.
    pub withdraw_fee: f64,
}

/// One trading venue, identified by name and carrying its taker fee rate.
#[async_trait]
pub trait ExchangeClient: Send + Sync {
    fn name(&self) -> &str;

    /// Trading fee rate applied to both legs on this venue.
    fn fee_rate(&self) -> f64;

    /// Currency -> transferable networks, with raw venue labels.
    async fn list_currencies(&self) -> Result<BTreeMap<String, Vec<RawChain>>>;

    /// Unified pair symbol (`BASE/QUOTE`) -> best bid/ask quote.
    async fn list_tickers(&self) -> Result<BTreeMap<String, Quote>>;

    /// Order-book levels for a unified pair symbol, best-first.
    async fn fetch_order_book(&self, pair: &str) -> Result<OrderBookDepth>;
}

/// The set of venues a scan fans out over.
pub type VenueRegistry = Vec<Arc<dyn ExchangeClient>>;
