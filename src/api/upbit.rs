use crate::data::{MarketFeed, RawMarketData};
use crate::models::{Candle, Timeframe};
use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use governor::{Quota, RateLimiter};
use reqwest::Client;
use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::Arc;

const UPBIT_API_BASE: &str = "https://api.upbit.com/v1";
const RATE_LIMIT_RPS: u32 = 10; // Public quotation endpoints: 10 requests per second
const REQUEST_TIMEOUT_SECS: u64 = 10;

// Type alias for the rate limiter to simplify signatures
type UpbitRateLimiter = RateLimiter<
    governor::state::direct::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Ticker entry from /ticker
#[derive(Debug, serde::Deserialize)]
struct TickerEntry {
    trade_price: f64,
}

/// Candle entry from /candles/{days,minutes}
#[derive(Debug, serde::Deserialize)]
struct CandleEntry {
    candle_date_time_utc: String,
    opening_price: f64,
    high_price: f64,
    low_price: f64,
    trade_price: f64,
    candle_acc_trade_volume: f64,
}

/// Upbit public market-data client with rate limiting
///
/// Only quotation endpoints are used; account and order endpoints are the
/// concern of the execution collaborator. Cloneable, all clones share the
/// same rate limiter.
#[derive(Clone)]
pub struct UpbitClient {
    client: Client,
    base_url: String,
    market: String,
    daily_count: u32,
    hourly_count: u32,
    rate_limiter: Arc<UpbitRateLimiter>,
}

impl UpbitClient {
    pub fn new(market: impl Into<String>, daily_count: u32, hourly_count: u32) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build HTTP client")?;

        let quota = Quota::per_second(NonZeroU32::new(RATE_LIMIT_RPS).unwrap());
        let rate_limiter = Arc::new(RateLimiter::direct(quota));

        Ok(Self {
            client,
            base_url: UPBIT_API_BASE.to_string(),
            market: market.into(),
            daily_count,
            hourly_count,
            rate_limiter,
        })
    }

    /// Latest trade price for the configured market
    pub async fn current_price(&self) -> Result<f64> {
        self.rate_limiter.until_ready().await;

        let url = format!("{}/ticker?markets={}", self.base_url, self.market);
        let entries: Vec<TickerEntry> = self
            .client
            .get(&url)
            .send()
            .await
            .context("Ticker request failed")?
            .error_for_status()
            .context("Ticker request rejected")?
            .json()
            .await
            .context("Ticker response malformed")?;

        entries
            .first()
            .map(|entry| entry.trade_price)
            .context("Empty ticker response")
    }

    /// Daily candles, oldest first
    pub async fn daily_candles(&self) -> Result<Vec<Candle>> {
        self.candles("days", self.daily_count).await
    }

    /// 60-minute candles, oldest first
    pub async fn hourly_candles(&self) -> Result<Vec<Candle>> {
        self.candles("minutes/60", self.hourly_count).await
    }

    async fn candles(&self, path: &str, count: u32) -> Result<Vec<Candle>> {
        self.rate_limiter.until_ready().await;

        let url = format!(
            "{}/candles/{}?market={}&count={}",
            self.base_url, path, self.market, count
        );

        let entries: Vec<CandleEntry> = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Candle request failed for {}", path))?
            .error_for_status()
            .with_context(|| format!("Candle request rejected for {}", path))?
            .json()
            .await
            .with_context(|| format!("Candle response malformed for {}", path))?;

        // Upbit returns newest first
        let mut candles = entries
            .iter()
            .map(parse_candle)
            .collect::<Result<Vec<_>>>()?;
        candles.reverse();

        Ok(candles)
    }
}

fn parse_candle(entry: &CandleEntry) -> Result<Candle> {
    let timestamp = NaiveDateTime::parse_from_str(&entry.candle_date_time_utc, "%Y-%m-%dT%H:%M:%S")
        .with_context(|| format!("Bad candle timestamp {}", entry.candle_date_time_utc))?
        .and_utc();

    Ok(Candle::new(
        timestamp,
        entry.opening_price,
        entry.high_price,
        entry.low_price,
        entry.trade_price,
        entry.candle_acc_trade_volume,
    ))
}

impl MarketFeed for UpbitClient {
    async fn fetch(&self) -> crate::Result<RawMarketData> {
        let daily = self.daily_candles().await?;
        let hourly = self.hourly_candles().await?;

        // A failed ticker is not fatal here; snapshot building falls back
        // to the last hourly close
        let current_price = match self.current_price().await {
            Ok(price) => Some(price),
            Err(e) => {
                tracing::warn!("Ticker fetch failed: {}", e);
                None
            }
        };

        let mut series = HashMap::new();
        series.insert(Timeframe::Daily, daily);
        series.insert(Timeframe::Hourly, hourly);

        Ok(RawMarketData {
            current_price,
            series,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_candle_timestamp() {
        let entry = CandleEntry {
            candle_date_time_utc: "2024-06-01T09:00:00".to_string(),
            opening_price: 100.0,
            high_price: 110.0,
            low_price: 95.0,
            trade_price: 105.0,
            candle_acc_trade_volume: 1234.5,
        };

        let candle = parse_candle(&entry).unwrap();
        assert_eq!(candle.close, 105.0);
        assert_eq!(candle.timestamp.to_rfc3339(), "2024-06-01T09:00:00+00:00");
    }

    #[test]
    fn test_parse_candle_rejects_bad_timestamp() {
        let entry = CandleEntry {
            candle_date_time_utc: "June 1st".to_string(),
            opening_price: 100.0,
            high_price: 110.0,
            low_price: 95.0,
            trade_price: 105.0,
            candle_acc_trade_volume: 1234.5,
        };

        assert!(parse_candle(&entry).is_err());
    }
}
