//! Cross-exchange arbitrage scanner.
//!
//! Detects buy-here/sell-there opportunities for settlement-currency pairs
//! quoted on multiple venues, checking that the bought asset can actually
//! be transferred between them over a shared, non-excluded network.

pub mod arbitrage;
pub mod chains;
pub mod config;
pub mod errors;
pub mod models;
pub mod server;
pub mod snapshot;
pub mod utils;
pub mod venue;
