// Risk limits and the stop-loss guard

use crate::models::{Decision, Portfolio, TradeAction};
use serde::{Deserialize, Serialize};

/// Risk limits applied to every trading decision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskLimits {
    /// Maximum position size as a fraction of the tradable balance
    pub max_position_size: f64,
    /// Stop-loss trigger as a fraction below the average buy price
    pub stop_loss_pct: f64,
    /// Exchange minimum order value in quote currency
    pub min_order_value: f64,
}

impl Default for RiskLimits {
    fn default() -> Self {
        Self {
            max_position_size: 0.10, // 10% of tradable balance per position
            stop_loss_pct: 0.05,     // sell everything at -5% from avg buy price
            min_order_value: 5_000.0, // KRW
        }
    }
}

/// Stop-loss guard, evaluated before the advisory path in every cycle
///
/// Fires when the current price has fallen more than `stop_loss_pct` below
/// the average buy price, and returns a full liquidation of the base
/// balance. No recommendation can override it.
pub fn check_stop_loss(
    current_price: f64,
    portfolio: &Portfolio,
    limits: &RiskLimits,
) -> Option<Decision> {
    // Nothing to protect without a position
    if portfolio.base_balance <= 0.0 || portfolio.base_avg_buy_price <= 0.0 {
        return None;
    }

    let threshold = portfolio.base_avg_buy_price * (1.0 - limits.stop_loss_pct);
    if current_price < threshold {
        return Some(Decision {
            action: TradeAction::Sell,
            percentage: 100.0,
            reason: "stop loss triggered".to_string(),
        });
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn portfolio(base_balance: f64, avg_buy_price: f64) -> Portfolio {
        Portfolio {
            quote_balance: 1_000_000.0,
            base_balance,
            base_avg_buy_price: avg_buy_price,
        }
    }

    #[test]
    fn test_fires_below_threshold() {
        // avg 5,000,000 with 5% stop -> threshold 4,750,000
        let limits = RiskLimits::default();
        let decision = check_stop_loss(4_000_000.0, &portfolio(0.5, 5_000_000.0), &limits);

        let decision = decision.expect("stop loss should fire");
        assert_eq!(decision.action, TradeAction::Sell);
        assert_eq!(decision.percentage, 100.0);
        assert_eq!(decision.reason, "stop loss triggered");
    }

    #[test]
    fn test_quiet_above_threshold() {
        let limits = RiskLimits::default();
        assert!(check_stop_loss(4_800_000.0, &portfolio(0.5, 5_000_000.0), &limits).is_none());
    }

    #[test]
    fn test_quiet_exactly_at_threshold() {
        let limits = RiskLimits::default();
        // Strictly-below comparison: equality does not fire
        assert!(check_stop_loss(4_750_000.0, &portfolio(0.5, 5_000_000.0), &limits).is_none());
    }

    #[test]
    fn test_fires_just_below_threshold() {
        let limits = RiskLimits::default();
        assert!(check_stop_loss(4_749_999.0, &portfolio(0.5, 5_000_000.0), &limits).is_some());
    }

    #[test]
    fn test_quiet_without_holdings() {
        let limits = RiskLimits::default();
        assert!(check_stop_loss(1.0, &portfolio(0.0, 5_000_000.0), &limits).is_none());
        assert!(check_stop_loss(1.0, &portfolio(0.5, 0.0), &limits).is_none());
    }
}
