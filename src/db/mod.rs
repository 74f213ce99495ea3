// Decision and recommendation persistence
//
// The gateway reads (and writes) the most recent recommendation for its
// fallback chain; the orchestrator appends one decision per completed
// cycle. History is append-only from the core's perspective.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

use crate::models::{Decision, Portfolio, Recommendation};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// A previously persisted recommendation with its creation time
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecommendation {
    pub timestamp: DateTime<Utc>,
    pub recommendation: Recommendation,
}

/// Read/write port for the advisory fallback lookup
#[allow(async_fn_in_trait)]
pub trait LastResultStore: Send + Sync {
    async fn save_recommendation(&self, recommendation: &Recommendation) -> crate::Result<()>;

    /// Most recently persisted recommendation, if any
    async fn last_recommendation(&self) -> crate::Result<Option<StoredRecommendation>>;
}

/// Write port for the per-cycle decision history
#[allow(async_fn_in_trait)]
pub trait DecisionStore: Send + Sync {
    async fn save_decision(&self, decision: &Decision, portfolio: &Portfolio) -> crate::Result<()>;
}

impl<T: LastResultStore> LastResultStore for Arc<T> {
    async fn save_recommendation(&self, recommendation: &Recommendation) -> crate::Result<()> {
        (**self).save_recommendation(recommendation).await
    }

    async fn last_recommendation(&self) -> crate::Result<Option<StoredRecommendation>> {
        (**self).last_recommendation().await
    }
}

impl<T: DecisionStore> DecisionStore for Arc<T> {
    async fn save_decision(&self, decision: &Decision, portfolio: &Portfolio) -> crate::Result<()> {
        (**self).save_decision(decision, portfolio).await
    }
}

/// Runtime-selected store backend
///
/// Postgres when a database is reachable, in-memory otherwise; the bot
/// keeps trading either way.
pub enum Store {
    Postgres(PostgresStore),
    Memory(MemoryStore),
}

impl LastResultStore for Store {
    async fn save_recommendation(&self, recommendation: &Recommendation) -> crate::Result<()> {
        match self {
            Store::Postgres(store) => store.save_recommendation(recommendation).await,
            Store::Memory(store) => store.save_recommendation(recommendation).await,
        }
    }

    async fn last_recommendation(&self) -> crate::Result<Option<StoredRecommendation>> {
        match self {
            Store::Postgres(store) => store.last_recommendation().await,
            Store::Memory(store) => store.last_recommendation().await,
        }
    }
}

impl DecisionStore for Store {
    async fn save_decision(&self, decision: &Decision, portfolio: &Portfolio) -> crate::Result<()> {
        match self {
            Store::Postgres(store) => store.save_decision(decision, portfolio).await,
            Store::Memory(store) => store.save_decision(decision, portfolio).await,
        }
    }
}
