use super::{DecisionStore, LastResultStore, StoredRecommendation};
use crate::models::{Decision, Portfolio, Recommendation};
use chrono::{DateTime, Utc};
use std::sync::Mutex;

/// In-memory store used when no database is configured
///
/// Keeps the same append-only semantics as the Postgres store, but the
/// history is lost on restart (so the fallback freshness window restarts
/// empty too).
#[derive(Default)]
pub struct MemoryStore {
    recommendations: Mutex<Vec<StoredRecommendation>>,
    decisions: Mutex<Vec<(DateTime<Utc>, Decision, Portfolio)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a recommendation with an explicit timestamp (for tests)
    pub fn push_recommendation_at(
        &self,
        timestamp: DateTime<Utc>,
        recommendation: Recommendation,
    ) {
        self.recommendations
            .lock()
            .unwrap()
            .push(StoredRecommendation {
                timestamp,
                recommendation,
            });
    }

    pub fn decision_count(&self) -> usize {
        self.decisions.lock().unwrap().len()
    }

    pub fn last_decision(&self) -> Option<Decision> {
        self.decisions
            .lock()
            .unwrap()
            .last()
            .map(|(_, decision, _)| decision.clone())
    }
}

impl LastResultStore for MemoryStore {
    async fn save_recommendation(&self, recommendation: &Recommendation) -> crate::Result<()> {
        self.push_recommendation_at(Utc::now(), recommendation.clone());
        Ok(())
    }

    async fn last_recommendation(&self) -> crate::Result<Option<StoredRecommendation>> {
        Ok(self.recommendations.lock().unwrap().last().cloned())
    }
}

impl DecisionStore for MemoryStore {
    async fn save_decision(&self, decision: &Decision, portfolio: &Portfolio) -> crate::Result<()> {
        self.decisions
            .lock()
            .unwrap()
            .push((Utc::now(), decision.clone(), portfolio.clone()));
        Ok(())
    }
}
