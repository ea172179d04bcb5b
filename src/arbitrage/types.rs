use crate::models::{DepthLevel, VenueFailure};
use serde::{Deserialize, Serialize};

/// Caller-supplied scan restrictions. `"all"` on a venue field means
/// unrestricted; matching is case-insensitive.
#[derive(Debug, Clone, Deserialize)]
pub struct ScanFilter {
    pub source_venue: String,
    pub dest_venue: String,
    /// Override of the configured minimum profit ratio.
    pub min_profit: Option<f64>,
    /// Override of the configured maximum profit ratio.
    pub max_profit: Option<f64>,
}

impl Default for ScanFilter {
    fn default() -> Self {
        Self {
            source_venue: "all".to_string(),
            dest_venue: "all".to_string(),
            min_profit: None,
            max_profit: None,
        }
    }
}

impl ScanFilter {
    pub fn accepts_source(&self, venue: &str) -> bool {
        self.source_venue == "all" || self.source_venue.eq_ignore_ascii_case(venue)
    }

    pub fn accepts_dest(&self, venue: &str) -> bool {
        self.dest_venue == "all" || self.dest_venue.eq_ignore_ascii_case(venue)
    }
}

/// One actionable cross-venue opportunity.
#[derive(Debug, Clone, Serialize)]
pub struct Opportunity {
    pub pair: String,
    pub buy_venue: String,
    pub sell_venue: String,
    pub buy_price: f64,
    pub sell_price: f64,
    /// Fee-adjusted profit ratio; the ranking key.
    pub profit_ratio: f64,
    /// Profit before trading fees, carried for diagnostics only.
    pub gross_ratio: f64,
    /// Withdrawal cost in settlement-currency units, rounded to 3 decimals.
    pub withdraw_cost: f64,
    /// Transfer network the funds would move over.
    pub chain_name: String,
    /// Top ask levels on the buy venue; empty when depth was unavailable.
    pub buy_depth: Vec<DepthLevel>,
    /// Top bid levels on the sell venue; empty when depth was unavailable.
    pub sell_depth: Vec<DepthLevel>,
}

/// Ranked scan result plus any venues whose data could not be fetched.
#[derive(Debug, Clone, Serialize, Default)]
pub struct ScanOutcome {
    pub opportunities: Vec<Opportunity>,
    pub failures: Vec<VenueFailure>,
}
