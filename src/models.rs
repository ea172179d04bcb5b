//! Shared data structures used throughout the application.

use serde::{Deserialize, Serialize};

/// One network over which a currency can be moved between venues.
///
/// Rebuilt wholesale from the venue's currency listing on every refresh;
/// never patched in place.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferChain {
    /// Canonical chain name (already passed through the normalizer).
    pub chain_name: String,
    pub deposit_enabled: bool,
    pub withdraw_enabled: bool,
    /// Withdrawal fee in source-currency units.
    pub withdraw_fee: f64,
}

/// Best bid/ask for a trading pair on one venue at snapshot time.
///
/// A side with zero volume carries no liquidity and is never matched.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Quote {
    pub bid: f64,
    pub bid_volume: f64,
    pub ask: f64,
    pub ask_volume: f64,
}

/// One price level of an order book.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepthLevel {
    pub price: f64,
    pub size: f64,
}

/// Order-book levels for a pair, best-first on both sides.
#[derive(Debug, Clone, Default)]
pub struct OrderBookDepth {
    pub asks: Vec<DepthLevel>,
    pub bids: Vec<DepthLevel>,
}

/// A venue whose fetch failed during a refresh. The venue simply does not
/// contribute to the snapshot; the scan proceeds with the rest.
#[derive(Debug, Clone, Serialize)]
pub struct VenueFailure {
    pub venue: String,
    pub error: String,
}
