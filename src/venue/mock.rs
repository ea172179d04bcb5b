//! Scripted venue used by unit tests.

use crate::errors::{AppError, Result};
use crate::models::{OrderBookDepth, Quote};
use crate::venue::{ExchangeClient, RawChain};
use async_trait::async_trait;
use std::collections::BTreeMap;

#[derive(Default)]
pub struct MockVenue {
    pub name: String,
    pub fee_rate: f64,
    pub currencies: BTreeMap<String, Vec<RawChain>>,
    pub tickers: BTreeMap<String, Quote>,
    pub books: BTreeMap<String, OrderBookDepth>,
    pub fail_currencies: bool,
    pub fail_tickers: bool,
    pub fail_books: bool,
}

impl MockVenue {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            fee_rate: 0.00075,
            ..Default::default()
        }
    }

    pub fn with_ticker(mut self, pair: &str, quote: Quote) -> Self {
        self.tickers.insert(pair.to_string(), quote);
        self
    }

    pub fn with_chains(mut self, currency: &str, chains: Vec<RawChain>) -> Self {
        self.currencies.insert(currency.to_string(), chains);
        self
    }

    pub fn with_book(mut self, pair: &str, book: OrderBookDepth) -> Self {
        self.books.insert(pair.to_string(), book);
        self
    }
}

#[async_trait]
impl ExchangeClient for MockVenue {
    fn name(&self) -> &str {
        &self.name
    }

    fn fee_rate(&self) -> f64 {
        self.fee_rate
    }

    async fn list_currencies(&self) -> Result<BTreeMap<String, Vec<RawChain>>> {
        if self.fail_currencies {
            return Err(AppError::Venue(format!("{}: connection refused", self.name)));
        }
        Ok(self.currencies.clone())
    }

    async fn list_tickers(&self) -> Result<BTreeMap<String, Quote>> {
        if self.fail_tickers {
            return Err(AppError::Venue(format!("{}: connection refused", self.name)));
        }
        Ok(self.tickers.clone())
    }

    async fn fetch_order_book(&self, pair: &str) -> Result<OrderBookDepth> {
        if self.fail_books {
            return Err(AppError::Venue(format!("{}: connection refused", self.name)));
        }
        self.books
            .get(pair)
            .cloned()
            .ok_or_else(|| AppError::Venue(format!("{}: no book for {pair}", self.name)))
    }
}

/// A chain entry with both directions open, the common case in tests.
pub fn open_chain(name: &str, withdraw_fee: f64) -> RawChain {
    RawChain {
        network: name.to_string(),
        deposit_enabled: true,
        withdraw_enabled: true,
        withdraw_fee,
    }
}
