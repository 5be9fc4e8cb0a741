//! Binance public REST client
//!
//! 24h ticker, order book depth and paginated K-lines. Also provides the
//! live feed the agent polls.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{Result, VolbotError};
use crate::rl::core::Observation;
use crate::rl::integration::{LiveFeed, LiveObservation};

pub const BINANCE_API_URL: &str = "https://api.binance.com/api/v3";

/// Maximum K-lines Binance returns per request
pub const KLINES_PAGE_LIMIT: u32 = 1000;

/// Depth limits accepted by the `depth` endpoint
pub const VALID_DEPTH_LIMITS: [u32; 8] = [5, 10, 20, 50, 100, 500, 1000, 5000];

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const PAGE_PAUSE: Duration = Duration::from_millis(300);

/// Deserialize a number that Binance may send as a string
fn deserialize_optional_number<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    match value {
        Some(serde_json::Value::Number(n)) => Ok(n.as_f64()),
        Some(serde_json::Value::String(s)) => Ok(s.parse::<f64>().ok()),
        _ => Ok(None),
    }
}

/// Subset of `GET /ticker/24hr`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticker24h {
    pub symbol: String,
    #[serde(default, deserialize_with = "deserialize_optional_number")]
    pub last_price: Option<f64>,
    /// Quantity of the last trade
    #[serde(default, deserialize_with = "deserialize_optional_number")]
    pub last_qty: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_optional_number")]
    pub bid_price: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_optional_number")]
    pub ask_price: Option<f64>,
    /// Base-asset volume over 24h
    #[serde(default, deserialize_with = "deserialize_optional_number")]
    pub volume: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BookLevel {
    pub price: f64,
    pub quantity: f64,
}

/// Top of the order book, best level first on each side
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderBook {
    pub last_update_id: u64,
    pub bids: Vec<BookLevel>,
    pub asks: Vec<BookLevel>,
}

#[derive(Deserialize)]
struct RawOrderBook {
    #[serde(rename = "lastUpdateId")]
    last_update_id: u64,
    bids: Vec<[String; 2]>,
    asks: Vec<[String; 2]>,
}

impl OrderBook {
    fn from_raw(raw: RawOrderBook) -> Result<Self> {
        Ok(Self {
            last_update_id: raw.last_update_id,
            bids: parse_levels(&raw.bids)?,
            asks: parse_levels(&raw.asks)?,
        })
    }

    pub fn best_bid(&self) -> Option<f64> {
        self.bids.first().map(|l| l.price)
    }

    pub fn best_ask(&self) -> Option<f64> {
        self.asks.first().map(|l| l.price)
    }

    pub fn spread(&self) -> Option<f64> {
        Some(self.best_ask()? - self.best_bid()?)
    }
}

fn parse_levels(raw: &[[String; 2]]) -> Result<Vec<BookLevel>> {
    raw.iter()
        .map(|[price, quantity]| {
            let parse = |s: &str| {
                s.parse::<f64>().map_err(|_| {
                    VolbotError::InvalidMarketData(format!("order book level {price:?}/{quantity:?}"))
                })
            };
            Ok(BookLevel {
                price: parse(price.as_str())?,
                quantity: parse(quantity.as_str())?,
            })
        })
        .collect()
}

/// One candlestick, reduced to what the datasets keep
#[derive(Debug, Clone, PartialEq)]
pub struct Kline {
    pub open_time: DateTime<Utc>,
    pub close: f64,
    pub volume: f64,
}

impl Kline {
    /// Parse a row of the `klines` array response
    pub fn from_row(row: &[serde_json::Value]) -> Option<Self> {
        let open_ms = row.first()?.as_i64()?;
        let number = |v: &serde_json::Value| match v {
            serde_json::Value::String(s) => s.parse::<f64>().ok(),
            other => other.as_f64(),
        };
        Some(Self {
            open_time: Utc.timestamp_millis_opt(open_ms).single()?,
            close: number(row.get(4)?)?,
            volume: number(row.get(5)?)?,
        })
    }

    pub fn to_observation(&self) -> Observation {
        Observation::new(self.volume, self.close)
            .with_timestamp(self.open_time.format("%Y-%m-%d %H:%M:%S").to_string())
    }
}

/// Binance public REST API client
#[derive(Debug, Clone)]
pub struct BinanceClient {
    client: reqwest::Client,
    base_url: String,
}

impl BinanceClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str, query: &[(&str, String)]) -> Result<T> {
        let url = format!("{}/{}", self.base_url, endpoint);
        debug!("GET {} {:?}", url, query);

        let response = self.client.get(&url).query(query).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VolbotError::ExchangeApi {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json().await?)
    }

    pub async fn ticker_24h(&self, symbol: &str) -> Result<Ticker24h> {
        self.get_json("ticker/24hr", &[("symbol", symbol.to_string())])
            .await
    }

    pub async fn order_book(&self, symbol: &str, limit: u32) -> Result<OrderBook> {
        if !VALID_DEPTH_LIMITS.contains(&limit) {
            return Err(VolbotError::Validation(format!(
                "order book limit {limit} not in {VALID_DEPTH_LIMITS:?}"
            )));
        }
        let raw: RawOrderBook = self
            .get_json(
                "depth",
                &[("symbol", symbol.to_string()), ("limit", limit.to_string())],
            )
            .await?;
        OrderBook::from_raw(raw)
    }

    /// One page of K-lines in `[start_ms, end_ms]`
    pub async fn klines(
        &self,
        symbol: &str,
        interval: &str,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<Vec<Kline>> {
        let rows: Vec<Vec<serde_json::Value>> = self
            .get_json(
                "klines",
                &[
                    ("symbol", symbol.to_string()),
                    ("interval", interval.to_string()),
                    ("startTime", start_ms.to_string()),
                    ("endTime", end_ms.to_string()),
                    ("limit", KLINES_PAGE_LIMIT.to_string()),
                ],
            )
            .await?;
        Ok(rows.iter().filter_map(|row| Kline::from_row(row)).collect())
    }

    /// All K-lines opening in `[start, end)`, paging forward by open time
    pub async fn klines_range(
        &self,
        symbol: &str,
        interval: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Kline>> {
        let mut out = Vec::new();
        let mut start_ms = start.timestamp_millis();
        let end_ms = end.timestamp_millis();

        while start_ms < end_ms {
            let page = self.klines(symbol, interval, start_ms, end_ms - 1).await?;
            let Some(last) = page.last() else {
                break;
            };
            start_ms = last.open_time.timestamp_millis() + 1;
            out.extend(page);
            debug!("Fetched {} K-lines so far for {}", out.len(), symbol);
            tokio::time::sleep(PAGE_PAUSE).await;
        }

        info!("Fetched {} {} K-lines for {}", out.len(), interval, symbol);
        Ok(out)
    }
}

/// Combine a ticker and a book snapshot into one agent observation.
///
/// Best bid/ask come from the book, falling back to the ticker.
pub fn live_observation(ticker: &Ticker24h, book: &OrderBook) -> Result<LiveObservation> {
    let price = ticker
        .last_price
        .filter(|p| *p > 0.0 && p.is_finite())
        .ok_or_else(|| {
            VolbotError::InvalidMarketData(format!("no last price for {}", ticker.symbol))
        })?;

    Ok(LiveObservation {
        volume: ticker.last_qty.unwrap_or(0.0),
        price,
        best_bid: book.best_bid().or(ticker.bid_price).unwrap_or(0.0),
        best_ask: book.best_ask().or(ticker.ask_price).unwrap_or(0.0),
    })
}

/// Live feed polling ticker and depth for one symbol
pub struct BinanceLiveFeed {
    client: BinanceClient,
    symbol: String,
    depth: u32,
}

impl BinanceLiveFeed {
    pub fn new(client: BinanceClient, symbol: impl Into<String>, depth: u32) -> Self {
        Self {
            client,
            symbol: symbol.into(),
            depth,
        }
    }
}

#[async_trait]
impl LiveFeed for BinanceLiveFeed {
    async fn poll(&self) -> Result<LiveObservation> {
        let book = self.client.order_book(&self.symbol, self.depth).await?;
        let ticker = self.client.ticker_24h(&self.symbol).await?;
        live_observation(&ticker, &book)
    }
}
