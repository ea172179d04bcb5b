//! REST client for Binance-compatible venues.
//!
//! Binance and MEXC expose the same market-data and capital-config surface,
//! so one client covers both. The capital-config endpoint is the only one
//! that needs credentials; market data is public.

use crate::config::AppConfig;
use crate::errors::{AppError, Result};
use crate::models::{DepthLevel, OrderBookDepth, Quote};
use crate::venue::{ExchangeClient, RawChain};
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};
use url::Url;

type HmacSha256 = Hmac<Sha256>;

const BINANCE_ENDPOINT: &str = "https://api.binance.com";
const MEXC_ENDPOINT: &str = "https://api.mexc.com";

/// Depth levels requested from the venue; the matcher samples a prefix.
const BOOK_LIMIT: usize = 20;

pub struct BinanceCompatClient {
    name: String,
    base_url: Url,
    api_key: Option<String>,
    api_secret: Option<String>,
    fee_rate: f64,
    settlement: String,
    http: reqwest::Client,
}

impl BinanceCompatClient {
    pub fn new(name: &str, endpoint: &str, settlement: &str) -> Result<Self> {
        let upper = name.to_uppercase();
        let api_key = std::env::var(format!("{upper}_API_KEY")).ok();
        let api_secret = std::env::var(format!("{upper}_API_SECRET")).ok();
        Ok(Self {
            name: name.to_string(),
            base_url: Url::parse(endpoint)?,
            api_key,
            api_secret,
            fee_rate: AppConfig::venue_fee(name),
            settlement: settlement.to_uppercase(),
            http: reqwest::Client::new(),
        })
    }

    pub fn binance(settlement: &str) -> Result<Self> {
        Self::new("binance", BINANCE_ENDPOINT, settlement)
    }

    pub fn mexc(settlement: &str) -> Result<Self> {
        Self::new("mexc", MEXC_ENDPOINT, settlement)
    }

    /// Signed query string for the authenticated capital-config call.
    fn signed_query(&self) -> Result<(String, String)> {
        let (Some(key), Some(secret)) = (&self.api_key, &self.api_secret) else {
            return Err(AppError::Venue(format!(
                "{}: no API credentials for currency listing",
                self.name
            )));
        };
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| AppError::Other(e.to_string()))?
            .as_millis();
        let query = format!("timestamp={timestamp}");
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|e| AppError::Other(e.to_string()))?;
        mac.update(query.as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());
        Ok((key.clone(), format!("{query}&signature={signature}")))
    }
}

#[derive(Debug, Deserialize)]
struct CoinInfo {
    coin: String,
    #[serde(rename = "networkList", default)]
    network_list: Vec<NetworkInfo>,
}

#[derive(Debug, Deserialize)]
struct NetworkInfo {
    network: String,
    #[serde(rename = "depositEnable", default)]
    deposit_enable: bool,
    #[serde(rename = "withdrawEnable", default)]
    withdraw_enable: bool,
    #[serde(rename = "withdrawFee", default)]
    withdraw_fee: String,
}

#[derive(Debug, Deserialize)]
struct BookTicker {
    symbol: String,
    #[serde(rename = "bidPrice")]
    bid_price: String,
    #[serde(rename = "bidQty")]
    bid_qty: String,
    #[serde(rename = "askPrice")]
    ask_price: String,
    #[serde(rename = "askQty")]
    ask_qty: String,
}

#[derive(Debug, Deserialize)]
struct DepthResponse {
    bids: Vec<[String; 2]>,
    asks: Vec<[String; 2]>,
}

fn parse_levels(raw: &[[String; 2]]) -> Vec<DepthLevel> {
    raw.iter()
        .filter_map(|lvl| {
            Some(DepthLevel {
                price: lvl[0].parse().ok()?,
                size: lvl[1].parse().ok()?,
            })
        })
        .collect()
}

#[async_trait]
impl ExchangeClient for BinanceCompatClient {
    fn name(&self) -> &str {
        &self.name
    }

    fn fee_rate(&self) -> f64 {
        self.fee_rate
    }

    async fn list_currencies(&self) -> Result<BTreeMap<String, Vec<RawChain>>> {
        let (api_key, query) = self.signed_query()?;
        let mut url = self.base_url.join("/sapi/v1/capital/config/getall")?;
        url.set_query(Some(&query));

        let coins: Vec<CoinInfo> = self
            .http
            .get(url)
            .header("X-MBX-APIKEY", api_key)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let mut out = BTreeMap::new();
        for coin in coins {
            let chains = coin
                .network_list
                .into_iter()
                .map(|net| RawChain {
                    network: net.network,
                    deposit_enabled: net.deposit_enable,
                    withdraw_enabled: net.withdraw_enable,
                    withdraw_fee: net.withdraw_fee.parse().unwrap_or(0.0),
                })
                .collect();
            out.insert(coin.coin.to_uppercase(), chains);
        }
        Ok(out)
    }

    async fn list_tickers(&self) -> Result<BTreeMap<String, Quote>> {
        let url = self.base_url.join("/api/v3/ticker/bookTicker")?;
        let tickers: Vec<BookTicker> = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let mut out = BTreeMap::new();
        for t in tickers {
            // Only the settlement market is scanned; rewrite the venue's
            // concatenated symbol to the unified BASE/QUOTE form.
            let Some(base) = t.symbol.strip_suffix(self.settlement.as_str()) else {
                continue;
            };
            if base.is_empty() {
                continue;
            }
            let quote = Quote {
                bid: t.bid_price.parse().unwrap_or(0.0),
                bid_volume: t.bid_qty.parse().unwrap_or(0.0),
                ask: t.ask_price.parse().unwrap_or(0.0),
                ask_volume: t.ask_qty.parse().unwrap_or(0.0),
            };
            out.insert(format!("{base}/{}", self.settlement), quote);
        }
        Ok(out)
    }

    async fn fetch_order_book(&self, pair: &str) -> Result<OrderBookDepth> {
        let symbol: String = pair.split('/').collect();
        let mut url = self.base_url.join("/api/v3/depth")?;
        url.set_query(Some(&format!("symbol={symbol}&limit={BOOK_LIMIT}")));

        let depth: DepthResponse = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(OrderBookDepth {
            asks: parse_levels(&depth.asks),
            bids: parse_levels(&depth.bids),
        })
    }
}
