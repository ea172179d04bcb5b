//! Opportunity matching, depth sampling, and ranking.
//!
//! Candidate selection is pure and synchronous over one `MarketSnapshot`:
//! given the same snapshot it produces the same ordered output. Only the
//! depth-sampling stage talks to the venues, and a depth failure never
//! drops a candidate.

use crate::arbitrage::types::{Opportunity, ScanFilter, ScanOutcome};
use crate::arbitrage::{profit, resolver};
use crate::config::AppConfig;
use crate::snapshot::{MarketSnapshot, SnapshotStore};
use crate::utils::round3;
use crate::venue::{ExchangeClient, VenueRegistry};
use futures::StreamExt;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::warn;

/// Concurrent order-book fetches during depth sampling.
const DEPTH_FETCH_CONCURRENCY: usize = 4;

/// A candidate that passed every snapshot-level filter and is waiting for
/// its depth sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub pair: String,
    pub buy_venue: String,
    pub sell_venue: String,
    pub buy_price: f64,
    pub sell_price: f64,
    pub gross_ratio: f64,
    pub net_ratio: f64,
    pub withdraw_cost: f64,
    pub chain_name: String,
}

/// Run the matching pipeline over a snapshot.
///
/// For every pair quoted on at least two venues, cross-joins the venues
/// with ask-side liquidity against those with bid-side liquidity, then
/// applies the currency, venue-scope, transferability, profit-band, and
/// withdrawal-cost filters in order.
pub fn match_candidates(
    snapshot: &MarketSnapshot,
    config: &AppConfig,
    filter: &ScanFilter,
    fees: &BTreeMap<String, f64>,
) -> Vec<Candidate> {
    let min_profit = filter.min_profit.unwrap_or(config.minimum_profit);
    let max_profit = filter.max_profit.unwrap_or(config.maximum_profit);

    let mut candidates = Vec::new();

    for (pair, venue_quotes) in &snapshot.quotes {
        let Some((base, quote_currency)) = pair.split_once('/') else {
            continue;
        };
        if config.excluded_currencies.iter().any(|c| c == base)
            || config.excluded_currencies.iter().any(|c| c == quote_currency)
        {
            continue;
        }

        let buy_sides: Vec<_> = venue_quotes
            .iter()
            .filter(|(_, q)| q.ask_volume > 0.0)
            .collect();
        let sell_sides: Vec<_> = venue_quotes
            .iter()
            .filter(|(_, q)| q.bid_volume > 0.0)
            .collect();

        for (buy_venue, buy_quote) in &buy_sides {
            if !filter.accepts_source(buy_venue) {
                continue;
            }
            for (sell_venue, sell_quote) in &sell_sides {
                if buy_venue == sell_venue || !filter.accepts_dest(sell_venue) {
                    continue;
                }

                // Unknown venues carry no fee schedule; never guess one.
                let (Some(&buy_fee), Some(&sell_fee)) =
                    (fees.get(*buy_venue), fees.get(*sell_venue))
                else {
                    continue;
                };

                // The base currency is what moves between venues; both
                // sides need chain metadata for it.
                let currency_chains = snapshot.chains.get(base);
                let (Some(buy_chains), Some(sell_chains)) = (
                    currency_chains.and_then(|c| c.get(*buy_venue)),
                    currency_chains.and_then(|c| c.get(*sell_venue)),
                ) else {
                    continue;
                };

                let Some(resolved) =
                    resolver::resolve(buy_chains, sell_chains, &config.excluded_chains)
                else {
                    continue;
                };

                if buy_quote.ask >= sell_quote.bid {
                    continue;
                }
                let Some(breakdown) =
                    profit::compute(buy_quote.ask, sell_quote.bid, buy_fee, sell_fee)
                else {
                    continue;
                };
                if breakdown.net_ratio < min_profit || breakdown.net_ratio > max_profit {
                    continue;
                }

                let withdraw_cost = round3(resolved.withdraw_fee * buy_quote.ask);
                if withdraw_cost > config.withdraw_cost_ceiling {
                    continue;
                }

                candidates.push(Candidate {
                    pair: pair.clone(),
                    buy_venue: (*buy_venue).clone(),
                    sell_venue: (*sell_venue).clone(),
                    buy_price: buy_quote.ask,
                    sell_price: sell_quote.bid,
                    gross_ratio: breakdown.gross_ratio,
                    net_ratio: breakdown.net_ratio,
                    withdraw_cost,
                    chain_name: resolved.chain_name,
                });
            }
        }
    }

    candidates
}

fn venue_by_name<'a>(
    venues: &'a VenueRegistry,
    name: &str,
) -> Option<&'a Arc<dyn ExchangeClient>> {
    venues.iter().find(|v| v.name().eq_ignore_ascii_case(name))
}

/// Sample top-of-book depth for each candidate and build the final records.
///
/// Depth retrieval is best-effort: a failed fetch is logged and the
/// candidate is emitted with that side empty. Candidate order is preserved.
pub async fn attach_depth(
    candidates: Vec<Candidate>,
    venues: &VenueRegistry,
    depth_levels: usize,
) -> Vec<Opportunity> {
    futures::stream::iter(candidates)
        .map(|c| async move {
            let buy_depth = match venue_by_name(venues, &c.buy_venue) {
                Some(venue) => match venue.fetch_order_book(&c.pair).await {
                    Ok(book) => book.asks.into_iter().take(depth_levels).collect(),
                    Err(e) => {
                        warn!(venue = %c.buy_venue, pair = %c.pair, error = %e, "depth unavailable");
                        Vec::new()
                    }
                },
                None => Vec::new(),
            };
            let sell_depth = match venue_by_name(venues, &c.sell_venue) {
                Some(venue) => match venue.fetch_order_book(&c.pair).await {
                    Ok(book) => book.bids.into_iter().take(depth_levels).collect(),
                    Err(e) => {
                        warn!(venue = %c.sell_venue, pair = %c.pair, error = %e, "depth unavailable");
                        Vec::new()
                    }
                },
                None => Vec::new(),
            };

            Opportunity {
                pair: c.pair,
                buy_venue: c.buy_venue,
                sell_venue: c.sell_venue,
                buy_price: c.buy_price,
                sell_price: c.sell_price,
                profit_ratio: c.net_ratio,
                gross_ratio: c.gross_ratio,
                withdraw_cost: c.withdraw_cost,
                chain_name: c.chain_name,
                buy_depth,
                sell_depth,
            }
        })
        .buffered(DEPTH_FETCH_CONCURRENCY)
        .collect()
        .await
}

/// Order opportunities by descending fee-adjusted profit. The sort is
/// stable, so equal ratios keep their matcher order.
pub fn rank(opportunities: &mut [Opportunity]) {
    opportunities.sort_by(|a, b| b.profit_ratio.total_cmp(&a.profit_ratio));
}

/// Full scan: refresh quotes, match against the published snapshot, sample
/// depth, rank. Venue fetch failures are carried in the outcome rather
/// than aborting the scan.
pub async fn scan(
    store: &SnapshotStore,
    venues: &VenueRegistry,
    config: &AppConfig,
    filter: &ScanFilter,
) -> ScanOutcome {
    let failures = store.refresh_quotes().await;
    let snapshot = store.current();
    if snapshot.quotes.is_empty() {
        return ScanOutcome {
            opportunities: Vec::new(),
            failures,
        };
    }

    let fees: BTreeMap<String, f64> = venues
        .iter()
        .map(|v| (v.name().to_string(), v.fee_rate()))
        .collect();

    let candidates = match_candidates(&snapshot, config, filter, &fees);
    let mut opportunities = attach_depth(candidates, venues, config.depth_levels).await;
    rank(&mut opportunities);

    ScanOutcome {
        opportunities,
        failures,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chains::ChainAliases;
    use crate::models::{DepthLevel, OrderBookDepth, Quote, TransferChain};
    use crate::venue::mock::{MockVenue, open_chain};

    fn test_config() -> AppConfig {
        AppConfig {
            bind_addr: String::new(),
            settlement_currency: "USDT".to_string(),
            minimum_profit: 0.005,
            maximum_profit: 0.02,
            withdraw_cost_ceiling: 0.4,
            depth_levels: 5,
            excluded_currencies: Vec::new(),
            excluded_chains: vec!["ERC20".to_string()],
            chain_aliases: ChainAliases::default(),
        }
    }

    fn transfer(name: &str, fee: f64) -> TransferChain {
        TransferChain {
            chain_name: name.to_string(),
            deposit_enabled: true,
            withdraw_enabled: true,
            withdraw_fee: fee,
        }
    }

    fn quote(bid: f64, bid_volume: f64, ask: f64, ask_volume: f64) -> Quote {
        Quote {
            bid,
            bid_volume,
            ask,
            ask_volume,
        }
    }

    /// Two venues quoting BTC/USDT with a 2% spread over a shared BTC chain;
    /// the worked example from the design discussion.
    fn two_venue_snapshot() -> MarketSnapshot {
        let mut snapshot = MarketSnapshot::default();
        let mut venue_quotes = BTreeMap::new();
        venue_quotes.insert("alpha".to_string(), quote(99.5, 1.0, 100.0, 1.0));
        venue_quotes.insert("beta".to_string(), quote(102.0, 1.0, 102.5, 1.0));
        snapshot.quotes.insert("BTC/USDT".to_string(), venue_quotes);

        let mut venue_chains = BTreeMap::new();
        venue_chains.insert("alpha".to_string(), vec![transfer("BTC", 0.0002)]);
        venue_chains.insert("beta".to_string(), vec![transfer("BTC", 0.0003)]);
        snapshot.chains.insert("BTC".to_string(), venue_chains);
        snapshot
    }

    fn default_fees() -> BTreeMap<String, f64> {
        let mut fees = BTreeMap::new();
        fees.insert("alpha".to_string(), 0.00075);
        fees.insert("beta".to_string(), 0.00075);
        fees
    }

    #[test]
    fn worked_example_matches_with_expected_numbers() {
        let candidates = match_candidates(
            &two_venue_snapshot(),
            &test_config(),
            &ScanFilter::default(),
            &default_fees(),
        );

        assert_eq!(candidates.len(), 1);
        let c = &candidates[0];
        assert_eq!(c.buy_venue, "alpha");
        assert_eq!(c.sell_venue, "beta");
        assert_eq!(c.buy_price, 100.0);
        assert_eq!(c.sell_price, 102.0);
        assert!((c.gross_ratio - 0.02).abs() < 1e-12);
        assert!((c.net_ratio - 0.018485).abs() < 1e-9);
        assert_eq!(c.withdraw_cost, 0.02);
        assert_eq!(c.chain_name, "BTC");
    }

    #[test]
    fn self_pairs_never_appear() {
        // crossed book on a single venue: its own ask is below its own bid
        let mut snapshot = MarketSnapshot::default();
        let mut venue_quotes = BTreeMap::new();
        venue_quotes.insert("alpha".to_string(), quote(102.0, 1.0, 100.0, 1.0));
        snapshot.quotes.insert("BTC/USDT".to_string(), venue_quotes);
        let mut venue_chains = BTreeMap::new();
        venue_chains.insert("alpha".to_string(), vec![transfer("BTC", 0.0002)]);
        snapshot.chains.insert("BTC".to_string(), venue_chains);

        let candidates = match_candidates(
            &snapshot,
            &test_config(),
            &ScanFilter::default(),
            &default_fees(),
        );
        assert!(candidates.is_empty());
    }

    #[test]
    fn zero_volume_sides_are_ineligible() {
        let mut snapshot = two_venue_snapshot();
        snapshot
            .quotes
            .get_mut("BTC/USDT")
            .unwrap()
            .insert("alpha".to_string(), quote(99.5, 1.0, 100.0, 0.0));

        let candidates = match_candidates(
            &snapshot,
            &test_config(),
            &ScanFilter::default(),
            &default_fees(),
        );
        assert!(candidates.is_empty());
    }

    #[test]
    fn profit_band_is_inclusive_and_bounded() {
        let mut config = test_config();
        // net ratio of the worked example is ~0.018485
        config.minimum_profit = 0.0184;
        config.maximum_profit = 0.02;
        let candidates = match_candidates(
            &two_venue_snapshot(),
            &config,
            &ScanFilter::default(),
            &default_fees(),
        );
        assert!(!candidates.is_empty());

        // implausibly wide band bound: spread now looks like a stale quote
        config.maximum_profit = 0.01;
        let candidates = match_candidates(
            &two_venue_snapshot(),
            &config,
            &ScanFilter::default(),
            &default_fees(),
        );
        assert!(candidates.is_empty());
    }

    #[test]
    fn venue_scope_filters_are_case_insensitive() {
        let filter = ScanFilter {
            source_venue: "ALPHA".to_string(),
            dest_venue: "Beta".to_string(),
            ..Default::default()
        };
        let candidates = match_candidates(
            &two_venue_snapshot(),
            &test_config(),
            &filter,
            &default_fees(),
        );
        assert_eq!(candidates.len(), 1);

        let filter = ScanFilter {
            source_venue: "beta".to_string(),
            ..Default::default()
        };
        let candidates = match_candidates(
            &two_venue_snapshot(),
            &test_config(),
            &filter,
            &default_fees(),
        );
        assert!(candidates.is_empty());
    }

    #[test]
    fn excluded_currency_skips_the_pair() {
        let mut config = test_config();
        config.excluded_currencies = vec!["BTC".to_string()];
        let candidates = match_candidates(
            &two_venue_snapshot(),
            &config,
            &ScanFilter::default(),
            &default_fees(),
        );
        assert!(candidates.is_empty());
    }

    #[test]
    fn missing_chain_data_skips_the_candidate() {
        let mut snapshot = two_venue_snapshot();
        snapshot.chains.get_mut("BTC").unwrap().remove("beta");
        let candidates = match_candidates(
            &snapshot,
            &test_config(),
            &ScanFilter::default(),
            &default_fees(),
        );
        assert!(candidates.is_empty());
    }

    #[test]
    fn excluded_only_chain_yields_nothing() {
        let mut snapshot = two_venue_snapshot();
        let chains = snapshot.chains.get_mut("BTC").unwrap();
        chains.insert("alpha".to_string(), vec![transfer("ERC20", 0.0002)]);
        chains.insert("beta".to_string(), vec![transfer("ERC20", 0.0002)]);

        let candidates = match_candidates(
            &snapshot,
            &test_config(),
            &ScanFilter::default(),
            &default_fees(),
        );
        assert!(candidates.is_empty());
    }

    #[test]
    fn withdraw_cost_ceiling_is_enforced() {
        let mut snapshot = two_venue_snapshot();
        // 0.0041 BTC * 100 USDT = 0.41 USDT, just over the 0.4 ceiling
        snapshot
            .chains
            .get_mut("BTC")
            .unwrap()
            .insert("alpha".to_string(), vec![transfer("BTC", 0.0041)]);

        let candidates = match_candidates(
            &snapshot,
            &test_config(),
            &ScanFilter::default(),
            &default_fees(),
        );
        assert!(candidates.is_empty());
    }

    #[test]
    fn matcher_is_idempotent_over_a_fixed_snapshot() {
        let snapshot = two_venue_snapshot();
        let config = test_config();
        let filter = ScanFilter::default();
        let fees = default_fees();
        let first = match_candidates(&snapshot, &config, &filter, &fees);
        let second = match_candidates(&snapshot, &config, &filter, &fees);
        assert_eq!(first, second);
    }

    #[test]
    fn ranking_is_descending_and_stable() {
        let opp = |pair: &str, ratio: f64| Opportunity {
            pair: pair.to_string(),
            buy_venue: "alpha".to_string(),
            sell_venue: "beta".to_string(),
            buy_price: 100.0,
            sell_price: 101.0,
            profit_ratio: ratio,
            gross_ratio: ratio,
            withdraw_cost: 0.0,
            chain_name: "BTC".to_string(),
            buy_depth: Vec::new(),
            sell_depth: Vec::new(),
        };
        let mut opportunities = vec![
            opp("A/USDT", 0.006),
            opp("B/USDT", 0.012),
            opp("C/USDT", 0.012),
            opp("D/USDT", 0.009),
        ];
        rank(&mut opportunities);
        let pairs: Vec<&str> = opportunities.iter().map(|o| o.pair.as_str()).collect();
        assert_eq!(pairs, vec!["B/USDT", "C/USDT", "D/USDT", "A/USDT"]);
    }

    fn scan_venues(fail_books: bool) -> VenueRegistry {
        let book = OrderBookDepth {
            asks: vec![
                DepthLevel { price: 100.0, size: 1.0 },
                DepthLevel { price: 100.1, size: 2.0 },
            ],
            bids: vec![
                DepthLevel { price: 102.0, size: 1.0 },
                DepthLevel { price: 101.9, size: 3.0 },
            ],
        };
        let mut alpha = MockVenue::new("alpha")
            .with_ticker("BTC/USDT", quote(99.5, 1.0, 100.0, 1.0))
            .with_chains("BTC", vec![open_chain("BTC", 0.0002)])
            .with_book("BTC/USDT", book.clone());
        let mut beta = MockVenue::new("beta")
            .with_ticker("BTC/USDT", quote(102.0, 1.0, 102.5, 1.0))
            .with_chains("BTC", vec![open_chain("BTC", 0.0003)])
            .with_book("BTC/USDT", book);
        alpha.fail_books = fail_books;
        beta.fail_books = fail_books;
        vec![Arc::new(alpha), Arc::new(beta)]
    }

    #[tokio::test]
    async fn end_to_end_scan_emits_opportunity_with_depth() {
        let venues = scan_venues(false);
        let config = test_config();
        let store = SnapshotStore::new(venues.clone(), "USDT", ChainAliases::default());
        store.refresh_chains().await;

        let outcome = scan(&store, &venues, &config, &ScanFilter::default()).await;
        assert!(outcome.failures.is_empty());
        assert_eq!(outcome.opportunities.len(), 1);
        let opp = &outcome.opportunities[0];
        assert_eq!(opp.buy_venue, "alpha");
        assert_eq!(opp.sell_venue, "beta");
        assert_eq!(opp.withdraw_cost, 0.02);
        assert_eq!(opp.buy_depth.len(), 2);
        assert_eq!(opp.sell_depth[0].price, 102.0);
    }

    #[tokio::test]
    async fn depth_failure_is_non_fatal() {
        let venues = scan_venues(true);
        let config = test_config();
        let store = SnapshotStore::new(venues.clone(), "USDT", ChainAliases::default());
        store.refresh_chains().await;

        let outcome = scan(&store, &venues, &config, &ScanFilter::default()).await;
        assert_eq!(outcome.opportunities.len(), 1);
        assert!(outcome.opportunities[0].buy_depth.is_empty());
        assert!(outcome.opportunities[0].sell_depth.is_empty());
    }

    #[tokio::test]
    async fn failed_venue_still_yields_results_from_the_rest() {
        let book = OrderBookDepth::default();
        let mut alpha = MockVenue::new("alpha")
            .with_ticker("BTC/USDT", quote(99.5, 1.0, 100.0, 1.0))
            .with_chains("BTC", vec![open_chain("BTC", 0.0002)])
            .with_book("BTC/USDT", book.clone());
        alpha.fail_books = true;
        let mut beta = MockVenue::new("beta")
            .with_ticker("BTC/USDT", quote(102.0, 1.0, 102.5, 1.0))
            .with_chains("BTC", vec![open_chain("BTC", 0.0003)])
            .with_book("BTC/USDT", book.clone());
        beta.fail_books = true;
        let mut gamma = MockVenue::new("gamma")
            .with_ticker("BTC/USDT", quote(150.0, 1.0, 151.0, 1.0))
            .with_chains("BTC", vec![open_chain("BTC", 0.0002)]);
        gamma.fail_tickers = true;
        gamma.fail_books = true;

        let venues: VenueRegistry = vec![Arc::new(alpha), Arc::new(beta), Arc::new(gamma)];
        let config = test_config();
        let store = SnapshotStore::new(venues.clone(), "USDT", ChainAliases::default());
        store.refresh_chains().await;

        let outcome = scan(&store, &venues, &config, &ScanFilter::default()).await;
        // gamma's absurd quote never enters the snapshot
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].venue, "gamma");
        assert_eq!(outcome.opportunities.len(), 1);
        assert_eq!(outcome.opportunities[0].buy_venue, "alpha");
    }
}
