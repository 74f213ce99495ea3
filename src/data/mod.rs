// Market data processing
// Turns raw exchange data into the immutable per-cycle snapshot

use crate::indicators::{rsi_series, sma_series};
use crate::models::{Candle, MarketSnapshot, Timeframe};
use std::collections::HashMap;
use thiserror::Error;

/// Raw market data as delivered by the exchange feed, before enrichment
#[derive(Debug, Clone, Default)]
pub struct RawMarketData {
    pub current_price: Option<f64>,
    pub series: HashMap<Timeframe, Vec<Candle>>,
}

/// Failures that make a snapshot unusable for the cycle
#[derive(Debug, Error)]
pub enum DataError {
    #[error("no candle series in market data")]
    MissingSeries,
    #[error("current price unavailable")]
    MissingPrice,
}

/// Injected market-data port
#[allow(async_fn_in_trait)]
pub trait MarketFeed: Send + Sync {
    async fn fetch(&self) -> crate::Result<RawMarketData>;
}

/// Build an indicator-enriched snapshot from raw market data
///
/// Adds SMA-5, SMA-20 and RSI-14 series to every timeframe. A missing
/// current price falls back to the last hourly close; if neither is
/// available the cycle cannot proceed.
pub fn build_snapshot(raw: RawMarketData) -> Result<MarketSnapshot, DataError> {
    if raw.series.is_empty() {
        return Err(DataError::MissingSeries);
    }

    let mut series = raw.series;
    for candles in series.values_mut() {
        add_indicators(candles);
    }

    let current_price = match raw.current_price {
        Some(price) if price > 0.0 => price,
        _ => {
            let last_hourly_close = series
                .get(&Timeframe::Hourly)
                .and_then(|candles| candles.last())
                .map(|candle| candle.close);

            match last_hourly_close {
                Some(close) => {
                    tracing::warn!("Current price missing, using last hourly close {:.0}", close);
                    close
                }
                None => return Err(DataError::MissingPrice),
            }
        }
    };

    Ok(MarketSnapshot {
        current_price,
        series,
    })
}

fn add_indicators(candles: &mut [Candle]) {
    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();

    let sma_5 = sma_series(&closes, 5);
    let sma_20 = sma_series(&closes, 20);
    let rsi_14 = rsi_series(&closes, 14);

    for (i, candle) in candles.iter_mut().enumerate() {
        candle.sma_5 = sma_5[i];
        candle.sma_20 = sma_20[i];
        candle.rsi_14 = rsi_14[i];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn candles(closes: &[f64]) -> Vec<Candle> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| {
                Candle::new(
                    Utc::now() - chrono::Duration::hours((closes.len() - i) as i64),
                    close,
                    close * 1.01,
                    close * 0.99,
                    close,
                    1000.0,
                )
            })
            .collect()
    }

    #[test]
    fn test_build_snapshot_enriches_indicators() {
        let closes: Vec<f64> = (0..24).map(|i| 100.0 + i as f64).collect();
        let mut series = HashMap::new();
        series.insert(Timeframe::Hourly, candles(&closes));

        let snapshot = build_snapshot(RawMarketData {
            current_price: Some(125.0),
            series,
        })
        .unwrap();

        let hourly = snapshot.series(Timeframe::Hourly).unwrap();
        let last = hourly.last().unwrap();
        assert!(last.sma_5.is_some());
        assert!(last.sma_20.is_some());
        assert!(last.rsi_14.is_some());

        // Early candles have no 20-period SMA yet
        assert!(hourly[0].sma_20.is_none());
    }

    #[test]
    fn test_build_snapshot_falls_back_to_hourly_close() {
        let mut series = HashMap::new();
        series.insert(Timeframe::Hourly, candles(&[100.0, 101.0, 102.0]));

        let snapshot = build_snapshot(RawMarketData {
            current_price: None,
            series,
        })
        .unwrap();

        assert_eq!(snapshot.current_price, 102.0);
    }

    #[test]
    fn test_build_snapshot_rejects_empty_data() {
        let result = build_snapshot(RawMarketData::default());
        assert!(matches!(result, Err(DataError::MissingSeries)));
    }

    #[test]
    fn test_build_snapshot_rejects_missing_price_without_hourly() {
        let mut series = HashMap::new();
        series.insert(Timeframe::Daily, candles(&[100.0, 101.0]));

        let result = build_snapshot(RawMarketData {
            current_price: None,
            series,
        });
        assert!(matches!(result, Err(DataError::MissingPrice)));
    }
}
