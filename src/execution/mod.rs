// Trade execution port and the paper (simulated) executor

use crate::models::{Decision, Portfolio, TradeAction};
use std::sync::Mutex;

/// Outcome of dispatching a decision to the exchange
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub success: bool,
    pub error: Option<String>,
}

impl ExecutionResult {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Execution collaborator: places market orders and reports balances
#[allow(async_fn_in_trait)]
pub trait TradeExecutor: Send + Sync {
    /// Execute a decision as a market order at the observed price
    async fn execute(&self, decision: &Decision, current_price: f64) -> ExecutionResult;

    /// Current account balances
    async fn portfolio(&self) -> crate::Result<Portfolio>;
}

/// Simulated market-order executor
///
/// Fills every order instantly at the observed price against an in-memory
/// portfolio. Stands in for the live exchange executor; fees and slippage
/// are not modeled.
pub struct PaperExecutor {
    state: Mutex<Portfolio>,
}

impl PaperExecutor {
    pub fn new(initial: Portfolio) -> Self {
        Self {
            state: Mutex::new(initial),
        }
    }

    fn apply(&self, decision: &Decision, current_price: f64) -> Result<(), String> {
        if current_price <= 0.0 {
            return Err(format!("invalid fill price {}", current_price));
        }
        if !(0.0..=100.0).contains(&decision.percentage) {
            return Err(format!("invalid percentage {}", decision.percentage));
        }

        let mut portfolio = self.state.lock().unwrap();

        match decision.action {
            TradeAction::Buy => {
                let spend = portfolio.quote_balance * decision.percentage / 100.0;
                let bought = spend / current_price;
                let new_base = portfolio.base_balance + bought;

                if new_base > 0.0 {
                    // Volume-weighted average acquisition price
                    portfolio.base_avg_buy_price = (portfolio.base_balance
                        * portfolio.base_avg_buy_price
                        + spend)
                        / new_base;
                }
                portfolio.quote_balance -= spend;
                portfolio.base_balance = new_base;

                tracing::info!(
                    "Paper BUY {:.8} BTC @ {:.0} ({:.0} KRW)",
                    bought,
                    current_price,
                    spend
                );
            }
            TradeAction::Sell => {
                let quantity = portfolio.base_balance * decision.percentage / 100.0;
                let proceeds = quantity * current_price;

                portfolio.base_balance -= quantity;
                portfolio.quote_balance += proceeds;
                if portfolio.base_balance <= 0.0 {
                    portfolio.base_balance = 0.0;
                    portfolio.base_avg_buy_price = 0.0;
                }

                tracing::info!(
                    "Paper SELL {:.8} BTC @ {:.0} ({:.0} KRW)",
                    quantity,
                    current_price,
                    proceeds
                );
            }
            TradeAction::Hold => {}
        }

        Ok(())
    }
}

impl TradeExecutor for PaperExecutor {
    async fn execute(&self, decision: &Decision, current_price: f64) -> ExecutionResult {
        match self.apply(decision, current_price) {
            Ok(()) => ExecutionResult::ok(),
            Err(e) => ExecutionResult::failed(e),
        }
    }

    async fn portfolio(&self) -> crate::Result<Portfolio> {
        Ok(self.state.lock().unwrap().clone())
    }
}
