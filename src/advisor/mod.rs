// Advisory gateway
//
// Wraps the external LLM advisory call behind a bounded retry policy and a
// fallback chain (retry -> last-known-good -> default-by-error-kind). The
// gateway always returns a usable recommendation; no advisory failure ever
// reaches the orchestrator.

pub mod anthropic;

pub use anthropic::AnthropicClient;

use crate::db::LastResultStore;
use crate::models::{MarketSnapshot, Portfolio, Recommendation, TradeAction};
use chrono::Utc;
use serde::Deserialize;
use thiserror::Error;
use tokio::time::Duration;

/// Advisory failure classes
///
/// Only transient failures are retried; a malformed response falls back
/// immediately.
#[derive(Debug, Error)]
pub enum AdvisorError {
    #[error("transient upstream failure: {0}")]
    Transient(String),
    #[error("invalid advisory response: {0}")]
    Validation(String),
}

/// Payload sent to the advisory backend
#[derive(Debug, Clone)]
pub struct AdvisoryRequest {
    pub system: String,
    pub market_json: String,
    /// Optional base64-encoded PNG chart image
    pub chart_image: Option<String>,
}

/// External advisory call, one attempt per invocation
#[allow(async_fn_in_trait)]
pub trait AdvisoryBackend: Send + Sync {
    async fn complete(&self, request: &AdvisoryRequest) -> Result<String, AdvisorError>;
}

/// Bounded retry policy for the advisory call
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(2),
        }
    }
}

const SYSTEM_INSTRUCTIONS: &str = "You are a cryptocurrency trading advisor analyzing the KRW-BTC market. \
Evaluate the provided market snapshot (price, candles, SMA-5/SMA-20/RSI-14 indicators) and portfolio. \
Respond with exactly one JSON object, no markdown, with keys: \
\"decision\" (one of \"buy\", \"sell\", \"hold\"), \"reason\" (short explanation), \
\"confidence\" (0-100), \"suggested_position_size\" (0-100, percent of tradable balance).";

pub struct AdvisoryGateway<B, S> {
    backend: B,
    store: S,
    retry: RetryPolicy,
    freshness: chrono::Duration,
}

impl<B: AdvisoryBackend, S: LastResultStore> AdvisoryGateway<B, S> {
    pub fn new(backend: B, store: S, retry: RetryPolicy, freshness: chrono::Duration) -> Self {
        Self {
            backend,
            store,
            retry,
            freshness,
        }
    }

    /// Produce the cycle's recommendation
    ///
    /// Never fails: on retry exhaustion or a malformed response this falls
    /// back to the last persisted recommendation (if younger than the
    /// freshness window) or a static default for the error kind.
    pub async fn get_recommendation(
        &self,
        snapshot: &MarketSnapshot,
        portfolio: &Portfolio,
        chart_image: Option<String>,
    ) -> Recommendation {
        let request = match self.build_request(snapshot, portfolio, chart_image) {
            Ok(request) => request,
            Err(e) => {
                tracing::error!("Failed to serialize advisory request: {}", e);
                return self
                    .fallback(&AdvisorError::Validation(e.to_string()))
                    .await;
            }
        };

        match self.call_with_retry(&request).await {
            Ok(recommendation) => {
                tracing::info!(
                    "Advisory recommendation: {} (confidence {:.0}, size {:.0}%)",
                    recommendation.action,
                    recommendation.confidence,
                    recommendation.suggested_position_size
                );

                if let Err(e) = self.store.save_recommendation(&recommendation).await {
                    tracing::warn!("Failed to persist recommendation: {}", e);
                }

                recommendation
            }
            Err(e) => self.fallback(&e).await,
        }
    }

    fn build_request(
        &self,
        snapshot: &MarketSnapshot,
        portfolio: &Portfolio,
        chart_image: Option<String>,
    ) -> serde_json::Result<AdvisoryRequest> {
        let market_json = serde_json::to_string(&serde_json::json!({
            "snapshot": snapshot,
            "portfolio": portfolio,
        }))?;

        Ok(AdvisoryRequest {
            system: SYSTEM_INSTRUCTIONS.to_string(),
            market_json,
            chart_image,
        })
    }

    async fn call_with_retry(
        &self,
        request: &AdvisoryRequest,
    ) -> Result<Recommendation, AdvisorError> {
        let mut attempt = 0;

        loop {
            attempt += 1;

            match self.backend.complete(request).await {
                // A response that fails validation is not retried
                Ok(text) => return parse_recommendation(&text),
                Err(AdvisorError::Transient(e)) => {
                    tracing::warn!(
                        "Advisory attempt {}/{} failed: {}",
                        attempt,
                        self.retry.max_attempts,
                        e
                    );

                    if attempt >= self.retry.max_attempts {
                        return Err(AdvisorError::Transient(e));
                    }

                    tokio::time::sleep(self.retry.delay).await;
                }
                Err(e) => {
                    tracing::warn!("Advisory attempt {} rejected: {}", attempt, e);
                    return Err(e);
                }
            }
        }
    }

    async fn fallback(&self, error: &AdvisorError) -> Recommendation {
        match self.store.last_recommendation().await {
            Ok(Some(stored)) if Utc::now() - stored.timestamp < self.freshness => {
                tracing::info!(
                    "Advisory failed ({}), reusing recommendation from {}",
                    error,
                    stored.timestamp
                );
                stored.recommendation
            }
            Ok(_) => {
                tracing::warn!("Advisory failed ({}), no fresh prior result, using default", error);
                default_recommendation(error)
            }
            Err(e) => {
                tracing::warn!("Fallback lookup failed: {}, using default", e);
                default_recommendation(error)
            }
        }
    }
}

/// Static fallback recommendation for an advisory error kind
pub fn default_recommendation(error: &AdvisorError) -> Recommendation {
    match error {
        AdvisorError::Transient(_) => Recommendation {
            action: TradeAction::Hold,
            confidence: 0.0,
            suggested_position_size: 0.0,
            reason: "advisory service unavailable".to_string(),
        },
        AdvisorError::Validation(_) => Recommendation {
            action: TradeAction::Hold,
            confidence: 5.0,
            suggested_position_size: 0.0,
            reason: "advisory response invalid".to_string(),
        },
    }
}

/// Extract the first balanced `{...}` object from free-form text
///
/// String- and escape-aware, so braces inside JSON strings do not break
/// the balance count.
pub fn extract_json(text: &str) -> Option<&str> {
    let mut search_from = 0;

    while let Some(offset) = text[search_from..].find('{') {
        let start = search_from + offset;
        if let Some(len) = balanced_object_len(&text[start..]) {
            return Some(&text[start..start + len]);
        }
        search_from = start + 1;
    }

    None
}

fn balanced_object_len(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in s.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i + c.len_utf8());
                }
            }
            _ => {}
        }
    }

    None
}

#[derive(Debug, Deserialize)]
struct RawRecommendation {
    decision: Option<String>,
    action: Option<String>,
    reason: String,
    confidence: f64,
    suggested_position_size: f64,
}

/// Parse and validate a recommendation out of raw advisory text
pub fn parse_recommendation(text: &str) -> Result<Recommendation, AdvisorError> {
    let object = extract_json(text)
        .ok_or_else(|| AdvisorError::Validation("no JSON object in response".to_string()))?;

    let raw: RawRecommendation = serde_json::from_str(object)
        .map_err(|e| AdvisorError::Validation(format!("unparsable recommendation: {}", e)))?;

    // "decision" is the documented key, "action" accepted as an alias
    let action_str = raw
        .decision
        .or(raw.action)
        .ok_or_else(|| AdvisorError::Validation("missing decision field".to_string()))?;

    let action = TradeAction::parse(&action_str)
        .ok_or_else(|| AdvisorError::Validation(format!("unknown action: {}", action_str)))?;

    Ok(Recommendation {
        action,
        confidence: raw.confidence.clamp(0.0, 100.0),
        suggested_position_size: raw.suggested_position_size.clamp(0.0, 100.0),
        reason: raw.reason,
    })
}
