// Rule-based trading strategies
//
// Signals are informational only: they are evaluated and logged each cycle
// but never gate the decision engine.

pub mod ma_crossover;
pub mod rsi_threshold;

pub use ma_crossover::MovingAverageCrossover;
pub use rsi_threshold::RsiThreshold;

use crate::models::{MarketSnapshot, Signal};
use crate::Result;

/// Base trait for all trading strategies
pub trait Strategy: Send + Sync {
    /// Generate a trading signal based on the market snapshot
    ///
    /// Missing series or indicators yield `Hold`; errors are reserved for
    /// genuinely unexpected conditions.
    fn generate_signal(&self, snapshot: &MarketSnapshot) -> Result<Signal>;

    /// Get strategy name
    fn name(&self) -> &str;
}

/// Evaluate every registered strategy against the snapshot
///
/// A failing strategy is contained: its signal degrades to `Hold` and the
/// rest of the cycle proceeds.
pub fn evaluate_all(
    strategies: &[Box<dyn Strategy>],
    snapshot: &MarketSnapshot,
) -> Vec<(String, Signal)> {
    strategies
        .iter()
        .map(|strategy| {
            let signal = match strategy.generate_signal(snapshot) {
                Ok(signal) => signal,
                Err(e) => {
                    tracing::warn!("Strategy {} failed: {}", strategy.name(), e);
                    Signal::Hold
                }
            };
            tracing::info!("Strategy {} signal: {:?}", strategy.name(), signal);
            (strategy.name().to_string(), signal)
        })
        .collect()
}
