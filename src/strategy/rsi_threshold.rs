use super::Strategy;
use crate::models::{MarketSnapshot, Signal, Timeframe};
use crate::Result;

/// RSI threshold strategy
///
/// Buys oversold (RSI-14 below 30), sells overbought (above 70).
#[derive(Debug, Clone)]
pub struct RsiThreshold {
    timeframe: Timeframe,
    oversold: f64,
    overbought: f64,
}

impl RsiThreshold {
    pub fn new(timeframe: Timeframe, oversold: f64, overbought: f64) -> Self {
        Self {
            timeframe,
            oversold,
            overbought,
        }
    }
}

impl Default for RsiThreshold {
    fn default() -> Self {
        Self::new(Timeframe::Hourly, 30.0, 70.0)
    }
}

impl Strategy for RsiThreshold {
    fn generate_signal(&self, snapshot: &MarketSnapshot) -> Result<Signal> {
        let rsi = snapshot
            .series(self.timeframe)
            .and_then(|candles| candles.last())
            .and_then(|candle| candle.rsi_14);

        let rsi = match rsi {
            Some(value) => value,
            None => return Ok(Signal::Hold),
        };

        if rsi < self.oversold {
            Ok(Signal::Buy)
        } else if rsi > self.overbought {
            Ok(Signal::Sell)
        } else {
            Ok(Signal::Hold)
        }
    }

    fn name(&self) -> &str {
        "RsiThreshold"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Candle;
    use chrono::Utc;
    use std::collections::HashMap;

    fn snapshot_with_rsi(rsi: Option<f64>) -> MarketSnapshot {
        let mut candle = Candle::new(Utc::now(), 100.0, 101.0, 99.0, 100.0, 1000.0);
        candle.rsi_14 = rsi;

        let mut series = HashMap::new();
        series.insert(Timeframe::Hourly, vec![candle]);
        MarketSnapshot {
            current_price: 100.0,
            series,
        }
    }

    #[test]
    fn test_oversold_signals_buy() {
        let signal = RsiThreshold::default()
            .generate_signal(&snapshot_with_rsi(Some(25.0)))
            .unwrap();
        assert_eq!(signal, Signal::Buy);
    }

    #[test]
    fn test_overbought_signals_sell() {
        let signal = RsiThreshold::default()
            .generate_signal(&snapshot_with_rsi(Some(75.0)))
            .unwrap();
        assert_eq!(signal, Signal::Sell);
    }

    #[test]
    fn test_neutral_holds() {
        let signal = RsiThreshold::default()
            .generate_signal(&snapshot_with_rsi(Some(50.0)))
            .unwrap();
        assert_eq!(signal, Signal::Hold);
    }

    #[test]
    fn test_missing_rsi_holds() {
        let signal = RsiThreshold::default()
            .generate_signal(&snapshot_with_rsi(None))
            .unwrap();
        assert_eq!(signal, Signal::Hold);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        // Exactly at the boundary is neutral
        let signal = RsiThreshold::default()
            .generate_signal(&snapshot_with_rsi(Some(30.0)))
            .unwrap();
        assert_eq!(signal, Signal::Hold);

        let signal = RsiThreshold::default()
            .generate_signal(&snapshot_with_rsi(Some(70.0)))
            .unwrap();
        assert_eq!(signal, Signal::Hold);
    }
}
