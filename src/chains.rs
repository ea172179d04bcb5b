//! Chain-name normalization.
//!
//! Venues label the same transfer network in wildly different ways
//! ("TRX", "TRON", "TRC-20"). The alias table maps every known raw label to
//! one canonical name so that chain metadata from different venues is
//! comparable.

use crate::errors::Result;
use std::collections::BTreeMap;
use std::path::Path;

/// Canonical name -> known raw aliases (all stored upper-case).
#[derive(Debug, Clone)]
pub struct ChainAliases {
    table: BTreeMap<String, Vec<String>>,
}

impl ChainAliases {
    /// Load an alias table from a JSON file shaped like
    /// `{"TRC20": ["TRON", "TRX", "TRC-20"], ...}`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let table: BTreeMap<String, Vec<String>> = serde_json::from_str(&raw)?;
        Ok(Self::from_table(table))
    }

    pub fn from_table(table: BTreeMap<String, Vec<String>>) -> Self {
        let table = table
            .into_iter()
            .map(|(canonical, aliases)| {
                let aliases = aliases.into_iter().map(|a| a.to_uppercase()).collect();
                (canonical.to_uppercase(), aliases)
            })
            .collect();
        Self { table }
    }

    /// Map a venue-specific network label to its canonical name.
    ///
    /// Upper-cases the label, returns the first canonical key whose alias
    /// set contains it, and falls back to the upper-cased label itself when
    /// nothing matches (unknown labels are treated as already canonical).
    pub fn normalize(&self, raw_label: &str) -> String {
        let upper = raw_label.to_uppercase();
        for (canonical, aliases) in &self.table {
            if aliases.iter().any(|a| *a == upper) {
                return canonical.clone();
            }
        }
        upper
    }
}

impl Default for ChainAliases {
    /// Built-in table covering the networks the scanner most often sees.
    fn default() -> Self {
        let mut table = BTreeMap::new();
        let entries: &[(&str, &[&str])] = &[
            ("ERC20", &["ETH", "ETHEREUM", "ERC-20"]),
            ("TRC20", &["TRX", "TRON", "TRC-20"]),
            ("BEP20", &["BSC", "BNB", "BEP20(BSC)", "BNB SMART CHAIN (BEP20)"]),
            ("ARBITRUM", &["ARB", "ARBITRUM ONE", "ARBONE"]),
            ("OPTIMISM", &["OP", "OPTIMISMETH"]),
            ("POLYGON", &["MATIC", "POLYGON POS"]),
            ("AVAXC", &["AVAX", "AVALANCHE", "AVAX C-CHAIN", "CCHAIN"]),
            ("SOL", &["SOLANA", "SPL"]),
            ("BTC", &["BITCOIN"]),
        ];
        for (canonical, aliases) in entries {
            table.insert(
                canonical.to_string(),
                aliases.iter().map(|a| a.to_string()).collect(),
            );
        }
        Self::from_table(table)
    }
}
