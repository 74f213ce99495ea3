// Risk-sized decision engine
//
// Pure function from (recommendation, price, portfolio) to a final order
// instruction. The position-size cap is applied before confidence scaling,
// so confidence can only shrink exposure, never grow it past the cap.

use crate::models::{Decision, Portfolio, Recommendation, TradeAction};
use crate::risk::RiskLimits;

/// Convert a recommendation into a concrete, risk-bounded order instruction
pub fn decide(
    recommendation: &Recommendation,
    current_price: f64,
    portfolio: &Portfolio,
    limits: &RiskLimits,
) -> Decision {
    match recommendation.action {
        TradeAction::Hold => Decision::hold(recommendation.reason.clone()),
        TradeAction::Buy => decide_buy(recommendation, portfolio, limits),
        TradeAction::Sell => decide_sell(recommendation, current_price, portfolio, limits),
    }
}

fn decide_buy(
    recommendation: &Recommendation,
    portfolio: &Portfolio,
    limits: &RiskLimits,
) -> Decision {
    let size_fraction = limits
        .max_position_size
        .min(recommendation.suggested_position_size / 100.0);
    let tradable_cap = portfolio.quote_balance * size_fraction;
    let buy_amount = tradable_cap * (recommendation.confidence / 100.0);

    if buy_amount < limits.min_order_value {
        return Decision::hold("buy amount too small");
    }

    let percentage = (buy_amount / portfolio.quote_balance * 100.0).clamp(0.0, 100.0);

    Decision {
        action: TradeAction::Buy,
        percentage,
        reason: format!(
            "buy signal with {:.0}% confidence",
            recommendation.confidence
        ),
    }
}

fn decide_sell(
    recommendation: &Recommendation,
    current_price: f64,
    portfolio: &Portfolio,
    limits: &RiskLimits,
) -> Decision {
    let size_fraction = limits
        .max_position_size
        .min(recommendation.suggested_position_size / 100.0);
    let tradable_cap = portfolio.base_balance * size_fraction;
    let sell_amount = tradable_cap * (recommendation.confidence / 100.0);

    // Minimum-order check is valued at the live price, in quote terms
    if sell_amount * current_price < limits.min_order_value {
        return Decision::hold("sell amount too small");
    }

    let percentage = (sell_amount / portfolio.base_balance * 100.0).clamp(0.0, 100.0);

    Decision {
        action: TradeAction::Sell,
        percentage,
        reason: format!(
            "sell signal with {:.0}% confidence",
            recommendation.confidence
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recommendation(action: TradeAction, confidence: f64, size: f64) -> Recommendation {
        Recommendation {
            action,
            confidence,
            suggested_position_size: size,
            reason: "test".to_string(),
        }
    }

    fn portfolio(quote: f64, base: f64) -> Portfolio {
        Portfolio {
            quote_balance: quote,
            base_balance: base,
            base_avg_buy_price: 50_000_000.0,
        }
    }

    #[test]
    fn test_hold_passes_through() {
        let limits = RiskLimits::default();
        let decision = decide(
            &recommendation(TradeAction::Hold, 90.0, 50.0),
            50_000_000.0,
            &portfolio(1_000_000.0, 0.5),
            &limits,
        );

        assert_eq!(decision.action, TradeAction::Hold);
        assert_eq!(decision.percentage, 0.0);
        assert_eq!(decision.reason, "test");
    }

    #[test]
    fn test_full_confidence_buy_hits_position_cap() {
        // 1,000,000 quote, cap 10%, confidence 100, suggested 100 -> 100,000 = 10%
        let limits = RiskLimits::default();
        let decision = decide(
            &recommendation(TradeAction::Buy, 100.0, 100.0),
            50_000_000.0,
            &portfolio(1_000_000.0, 0.0),
            &limits,
        );

        assert_eq!(decision.action, TradeAction::Buy);
        assert!((decision.percentage - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_buy_exposure_never_exceeds_cap() {
        let limits = RiskLimits::default();
        let quote_balance = 1_000_000.0;

        for confidence in [1.0, 25.0, 60.0, 100.0] {
            for size in [1.0, 10.0, 55.0, 100.0] {
                let decision = decide(
                    &recommendation(TradeAction::Buy, confidence, size),
                    50_000_000.0,
                    &portfolio(quote_balance, 0.0),
                    &limits,
                );

                let exposure = quote_balance * decision.percentage / 100.0;
                assert!(
                    exposure <= limits.max_position_size * quote_balance + 1e-9,
                    "exposure {} exceeds cap for confidence={} size={}",
                    exposure,
                    confidence,
                    size
                );
            }
        }
    }

    #[test]
    fn test_confidence_scales_buy_down() {
        let limits = RiskLimits::default();
        let decision = decide(
            &recommendation(TradeAction::Buy, 50.0, 100.0),
            50_000_000.0,
            &portfolio(1_000_000.0, 0.0),
            &limits,
        );

        // 10% cap scaled by 50% confidence -> 5%
        assert_eq!(decision.action, TradeAction::Buy);
        assert!((decision.percentage - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_small_buy_degrades_to_hold() {
        // 10% of 40,000 at full confidence = 4,000 < 5,000 minimum
        let limits = RiskLimits::default();
        let decision = decide(
            &recommendation(TradeAction::Buy, 100.0, 100.0),
            50_000_000.0,
            &portfolio(40_000.0, 0.0),
            &limits,
        );

        assert_eq!(decision.action, TradeAction::Hold);
        assert_eq!(decision.percentage, 0.0);
        assert_eq!(decision.reason, "buy amount too small");
    }

    #[test]
    fn test_zero_quote_balance_buy_holds() {
        let limits = RiskLimits::default();
        let decision = decide(
            &recommendation(TradeAction::Buy, 100.0, 100.0),
            50_000_000.0,
            &portfolio(0.0, 0.5),
            &limits,
        );

        assert_eq!(decision.action, TradeAction::Hold);
    }

    #[test]
    fn test_sell_sized_against_base_balance() {
        let limits = RiskLimits::default();
        let decision = decide(
            &recommendation(TradeAction::Sell, 100.0, 100.0),
            50_000_000.0,
            &portfolio(0.0, 1.0),
            &limits,
        );

        // Cap 10% of 1 BTC at full confidence -> 10% of base balance
        assert_eq!(decision.action, TradeAction::Sell);
        assert!((decision.percentage - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_sell_minimum_valued_at_live_price() {
        let limits = RiskLimits::default();
        // 10% of 0.001 BTC = 0.0001 BTC; at 40,000,000 that is 4,000 < 5,000
        let decision = decide(
            &recommendation(TradeAction::Sell, 100.0, 100.0),
            40_000_000.0,
            &portfolio(0.0, 0.001),
            &limits,
        );
        assert_eq!(decision.action, TradeAction::Hold);
        assert_eq!(decision.reason, "sell amount too small");

        // Same holdings at a higher live price clears the minimum
        let decision = decide(
            &recommendation(TradeAction::Sell, 100.0, 100.0),
            60_000_000.0,
            &portfolio(0.0, 0.001),
            &limits,
        );
        assert_eq!(decision.action, TradeAction::Sell);
    }

    #[test]
    fn test_decide_is_idempotent() {
        let limits = RiskLimits::default();
        let rec = recommendation(TradeAction::Buy, 80.0, 50.0);
        let pf = portfolio(1_000_000.0, 0.5);

        let first = decide(&rec, 50_000_000.0, &pf, &limits);
        let second = decide(&rec, 50_000_000.0, &pf, &limits);

        assert_eq!(first, second);
    }
}
