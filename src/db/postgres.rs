use super::{DecisionStore, LastResultStore, StoredRecommendation};
use crate::models::{Decision, Portfolio, Recommendation, TradeAction};
use crate::Result;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, PgPool, Row};
use uuid::Uuid;

/// Postgres persistence for decisions and recommendations
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect to Postgres and ensure the schema exists
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS recommendations (
                id UUID PRIMARY KEY,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                action TEXT NOT NULL,
                confidence DOUBLE PRECISION NOT NULL,
                suggested_position_size DOUBLE PRECISION NOT NULL,
                reason TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS decisions (
                id UUID PRIMARY KEY,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                action TEXT NOT NULL,
                percentage DOUBLE PRECISION NOT NULL,
                reason TEXT NOT NULL,
                quote_balance DOUBLE PRECISION NOT NULL,
                base_balance DOUBLE PRECISION NOT NULL,
                base_avg_buy_price DOUBLE PRECISION NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await?;

        tracing::info!("Connected to Postgres");

        Ok(Self { pool })
    }
}

impl LastResultStore for PostgresStore {
    async fn save_recommendation(&self, recommendation: &Recommendation) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO recommendations (id, action, confidence, suggested_position_size, reason)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(recommendation.action.as_str())
        .bind(recommendation.confidence)
        .bind(recommendation.suggested_position_size)
        .bind(&recommendation.reason)
        .execute(&self.pool)
        .await?;

        tracing::debug!("Saved {} recommendation to Postgres", recommendation.action);

        Ok(())
    }

    async fn last_recommendation(&self) -> Result<Option<StoredRecommendation>> {
        let row = sqlx::query(
            r#"
            SELECT created_at, action, confidence, suggested_position_size, reason
            FROM recommendations
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        let row = match row {
            Some(row) => row,
            None => return Ok(None),
        };

        let timestamp: DateTime<Utc> = row.get("created_at");
        let action_str: String = row.get("action");
        let action = TradeAction::parse(&action_str)
            .ok_or_else(|| format!("Invalid persisted action: {}", action_str))?;

        Ok(Some(StoredRecommendation {
            timestamp,
            recommendation: Recommendation {
                action,
                confidence: row.get("confidence"),
                suggested_position_size: row.get("suggested_position_size"),
                reason: row.get("reason"),
            },
        }))
    }
}

impl DecisionStore for PostgresStore {
    async fn save_decision(&self, decision: &Decision, portfolio: &Portfolio) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO decisions (
                id, action, percentage, reason,
                quote_balance, base_balance, base_avg_buy_price
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(decision.action.as_str())
        .bind(decision.percentage)
        .bind(&decision.reason)
        .bind(portfolio.quote_balance)
        .bind(portfolio.base_balance)
        .bind(portfolio.base_avg_buy_price)
        .execute(&self.pool)
        .await?;

        tracing::debug!(
            "Saved {} decision ({:.2}%) to Postgres",
            decision.action,
            decision.percentage
        );

        Ok(())
    }
}
