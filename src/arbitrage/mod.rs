//! The matching core: profit computation, transfer-chain resolution,
//! candidate matching, and ranking.

pub mod matcher;
pub mod profit;
pub mod resolver;
pub mod types;

pub use matcher::{match_candidates, rank, scan};
pub use types::{Opportunity, ScanFilter, ScanOutcome};
