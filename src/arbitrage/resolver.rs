//! Transfer-chain compatibility resolution.
//!
//! An opportunity is only actionable if the bought asset can actually move
//! from the buy venue to the sell venue: the buy (source) venue must permit
//! withdrawal and the sell (destination) venue must permit deposit over a
//! shared, non-excluded network.

use crate::models::TransferChain;

/// The chain selected for a transfer, with the source venue's fee.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedChain {
    pub chain_name: String,
    /// Withdrawal fee on the source venue, in source-currency units.
    pub withdraw_fee: f64,
}

/// Pick the cheapest chain over which the currency can leave the source
/// venue and arrive at the destination venue.
///
/// Chains on the excluded list are never eligible, even when they are the
/// only shared network. Missing metadata on either side means unknown
/// transferability, which is treated as non-transferable.
pub fn resolve(
    source_chains: &[TransferChain],
    dest_chains: &[TransferChain],
    excluded: &[String],
) -> Option<ResolvedChain> {
    if source_chains.is_empty() || dest_chains.is_empty() {
        return None;
    }

    source_chains
        .iter()
        .filter(|src| src.withdraw_enabled)
        .filter(|src| !excluded.iter().any(|x| *x == src.chain_name))
        .filter(|src| {
            dest_chains
                .iter()
                .any(|dst| dst.deposit_enabled && dst.chain_name == src.chain_name)
        })
        .min_by(|a, b| a.withdraw_fee.total_cmp(&b.withdraw_fee))
        .map(|chain| ResolvedChain {
            chain_name: chain.chain_name.clone(),
            withdraw_fee: chain.withdraw_fee,
        })
}
