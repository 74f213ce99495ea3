// Decision cycle orchestrator
//
// Drives one trading cycle through an explicit state machine. Any missing
// precondition aborts the cycle without dispatching an order; the scheduler
// simply tries again next tick.

use crate::advisor::{AdvisoryBackend, AdvisoryGateway};
use crate::alert::Alerter;
use crate::data::{self, MarketFeed};
use crate::db::{DecisionStore, LastResultStore};
use crate::engine;
use crate::execution::TradeExecutor;
use crate::models::{Decision, TradeAction};
use crate::risk::{self, RiskLimits};
use crate::strategy::{self, Strategy};
use std::fmt;
use std::sync::Arc;

/// States of one trading cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    Fetching,
    Processing,
    StopLossCheck,
    Advising,
    Deciding,
    ShortCircuit,
    Dispatching,
    Persisting,
    Done,
    Aborted,
}

impl fmt::Display for CycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CycleState::Fetching => "fetching",
            CycleState::Processing => "processing",
            CycleState::StopLossCheck => "stop_loss_check",
            CycleState::Advising => "advising",
            CycleState::Deciding => "deciding",
            CycleState::ShortCircuit => "short_circuit",
            CycleState::Dispatching => "dispatching",
            CycleState::Persisting => "persisting",
            CycleState::Done => "done",
            CycleState::Aborted => "aborted",
        };
        write!(f, "{}", name)
    }
}

/// Terminal result of one cycle
#[derive(Debug)]
pub struct CycleOutcome {
    pub state: CycleState,
    pub decision: Option<Decision>,
}

pub struct TradingCycle<F, B, S, E, A>
where
    F: MarketFeed,
    B: AdvisoryBackend,
    S: LastResultStore + DecisionStore,
    E: TradeExecutor,
    A: Alerter,
{
    feed: F,
    gateway: AdvisoryGateway<B, Arc<S>>,
    strategies: Vec<Box<dyn Strategy>>,
    limits: RiskLimits,
    executor: E,
    store: Arc<S>,
    alerter: A,
}

impl<F, B, S, E, A> TradingCycle<F, B, S, E, A>
where
    F: MarketFeed,
    B: AdvisoryBackend,
    S: LastResultStore + DecisionStore,
    E: TradeExecutor,
    A: Alerter,
{
    pub fn new(
        feed: F,
        gateway: AdvisoryGateway<B, Arc<S>>,
        strategies: Vec<Box<dyn Strategy>>,
        limits: RiskLimits,
        executor: E,
        store: Arc<S>,
        alerter: A,
    ) -> Self {
        Self {
            feed,
            gateway,
            strategies,
            limits,
            executor,
            store,
            alerter,
        }
    }

    /// Run one cycle to completion or abort
    pub async fn run_once(&self) -> CycleOutcome {
        tracing::info!("Starting trading cycle");

        self.enter(CycleState::Fetching);
        let raw = match self.feed.fetch().await {
            Ok(raw) => raw,
            Err(e) => return self.abort(format!("market data fetch failed: {}", e)).await,
        };
        let portfolio = match self.executor.portfolio().await {
            Ok(portfolio) => portfolio,
            Err(e) => return self.abort(format!("portfolio fetch failed: {}", e)).await,
        };
        if !portfolio.is_valid() {
            return self
                .abort(format!("invalid portfolio balances: {:?}", portfolio))
                .await;
        }

        self.enter(CycleState::Processing);
        let snapshot = match data::build_snapshot(raw) {
            Ok(snapshot) => snapshot,
            Err(e) => return self.abort(format!("snapshot build failed: {}", e)).await,
        };

        tracing::info!(
            "Current price: {:.0}, quote balance: {:.0}, base balance: {:.8}",
            snapshot.current_price,
            portfolio.quote_balance,
            portfolio.base_balance
        );

        // Rule-based signals are informational; they never gate the decision
        strategy::evaluate_all(&self.strategies, &snapshot);

        self.enter(CycleState::StopLossCheck);
        let decision =
            match risk::check_stop_loss(snapshot.current_price, &portfolio, &self.limits) {
                Some(decision) => {
                    // Capital protection preempts the advisory path entirely
                    self.enter(CycleState::ShortCircuit);
                    tracing::warn!(
                        "Stop loss fired at {:.0} (avg buy price {:.0})",
                        snapshot.current_price,
                        portfolio.base_avg_buy_price
                    );
                    self.alerter
                        .send(&format!(
                            "Stop loss triggered at {:.0}",
                            snapshot.current_price
                        ))
                        .await;
                    decision
                }
                None => {
                    self.enter(CycleState::Advising);
                    let recommendation = self
                        .gateway
                        .get_recommendation(&snapshot, &portfolio, None)
                        .await;

                    self.enter(CycleState::Deciding);
                    engine::decide(
                        &recommendation,
                        snapshot.current_price,
                        &portfolio,
                        &self.limits,
                    )
                }
            };

        tracing::info!(
            "Final decision: {} {:.2}% ({})",
            decision.action,
            decision.percentage,
            decision.reason
        );

        self.enter(CycleState::Dispatching);
        if decision.action != TradeAction::Hold {
            let result = self.executor.execute(&decision, snapshot.current_price).await;
            if result.success {
                tracing::info!("Trade executed: {} {:.2}%", decision.action, decision.percentage);
                self.alerter
                    .send(&format!(
                        "Trade executed: {} {:.2}% ({})",
                        decision.action, decision.percentage, decision.reason
                    ))
                    .await;
            } else {
                let error = result.error.unwrap_or_else(|| "unknown error".to_string());
                tracing::error!("Trade failed: {}", error);
                self.alerter.send(&format!("Trade failed: {}", error)).await;
            }
        } else {
            tracing::info!("Holding position, no trade executed");
        }

        self.enter(CycleState::Persisting);
        if let Err(e) = self.store.save_decision(&decision, &portfolio).await {
            tracing::warn!("Failed to persist decision: {}", e);
        }

        self.enter(CycleState::Done);
        CycleOutcome {
            state: CycleState::Done,
            decision: Some(decision),
        }
    }

    fn enter(&self, state: CycleState) {
        tracing::debug!("Cycle state: {}", state);
    }

    async fn abort(&self, message: String) -> CycleOutcome {
        tracing::error!("Cycle aborted: {}", message);
        self.alerter
            .send(&format!("Trading cycle aborted: {}", message))
            .await;

        CycleOutcome {
            state: CycleState::Aborted,
            decision: None,
        }
    }
}
