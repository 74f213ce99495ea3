use super::Strategy;
use crate::models::{MarketSnapshot, Signal, Timeframe};
use crate::Result;

/// Moving average crossover strategy
///
/// Signals buy when the 5-period SMA crosses above the 20-period SMA,
/// sell on the downward cross. Needs the last two candles of the chosen
/// timeframe to carry both SMA values, otherwise holds.
#[derive(Debug, Clone)]
pub struct MovingAverageCrossover {
    timeframe: Timeframe,
}

impl MovingAverageCrossover {
    pub fn new(timeframe: Timeframe) -> Self {
        Self { timeframe }
    }
}

impl Default for MovingAverageCrossover {
    fn default() -> Self {
        Self::new(Timeframe::Hourly)
    }
}

impl Strategy for MovingAverageCrossover {
    fn generate_signal(&self, snapshot: &MarketSnapshot) -> Result<Signal> {
        let candles = match snapshot.series(self.timeframe) {
            Some(candles) if candles.len() >= 2 => candles,
            _ => return Ok(Signal::Hold),
        };

        let last = &candles[candles.len() - 1];
        let prev = &candles[candles.len() - 2];

        let (short, long, prev_short, prev_long) =
            match (last.sma_5, last.sma_20, prev.sma_5, prev.sma_20) {
                (Some(a), Some(b), Some(c), Some(d)) => (a, b, c, d),
                _ => return Ok(Signal::Hold),
            };

        if short > long && prev_short <= prev_long {
            Ok(Signal::Buy)
        } else if short < long && prev_short >= prev_long {
            Ok(Signal::Sell)
        } else {
            Ok(Signal::Hold)
        }
    }

    fn name(&self) -> &str {
        "MovingAverageCrossover"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Candle;
    use chrono::Utc;
    use std::collections::HashMap;

    fn snapshot_with_smas(smas: &[(f64, f64)]) -> MarketSnapshot {
        let candles: Vec<Candle> = smas
            .iter()
            .enumerate()
            .map(|(i, &(sma_5, sma_20))| {
                let mut candle = Candle::new(
                    Utc::now() - chrono::Duration::hours((smas.len() - i) as i64),
                    100.0,
                    101.0,
                    99.0,
                    100.0,
                    1000.0,
                );
                candle.sma_5 = Some(sma_5);
                candle.sma_20 = Some(sma_20);
                candle
            })
            .collect();

        let mut series = HashMap::new();
        series.insert(Timeframe::Hourly, candles);
        MarketSnapshot {
            current_price: 100.0,
            series,
        }
    }

    #[test]
    fn test_upward_cross_signals_buy() {
        let snapshot = snapshot_with_smas(&[(98.0, 100.0), (101.0, 100.0)]);
        let signal = MovingAverageCrossover::default()
            .generate_signal(&snapshot)
            .unwrap();
        assert_eq!(signal, Signal::Buy);
    }

    #[test]
    fn test_downward_cross_signals_sell() {
        let snapshot = snapshot_with_smas(&[(102.0, 100.0), (99.0, 100.0)]);
        let signal = MovingAverageCrossover::default()
            .generate_signal(&snapshot)
            .unwrap();
        assert_eq!(signal, Signal::Sell);
    }

    #[test]
    fn test_no_cross_holds() {
        let snapshot = snapshot_with_smas(&[(102.0, 100.0), (103.0, 100.0)]);
        let signal = MovingAverageCrossover::default()
            .generate_signal(&snapshot)
            .unwrap();
        assert_eq!(signal, Signal::Hold);
    }

    #[test]
    fn test_missing_indicators_hold() {
        let mut snapshot = snapshot_with_smas(&[(98.0, 100.0), (101.0, 100.0)]);
        snapshot
            .series
            .get_mut(&Timeframe::Hourly)
            .unwrap()
            .last_mut()
            .unwrap()
            .sma_20 = None;

        let signal = MovingAverageCrossover::default()
            .generate_signal(&snapshot)
            .unwrap();
        assert_eq!(signal, Signal::Hold);
    }

    #[test]
    fn test_missing_series_holds() {
        let snapshot = MarketSnapshot {
            current_price: 100.0,
            series: HashMap::new(),
        };
        let signal = MovingAverageCrossover::default()
            .generate_signal(&snapshot)
            .unwrap();
        assert_eq!(signal, Signal::Hold);
    }
}
