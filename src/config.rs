// Environment-driven configuration
//
// Read once at startup; a bad value is fatal rather than silently defaulted.

use crate::risk::RiskLimits;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Upbit market code, e.g. "KRW-BTC"
    pub market: String,
    pub anthropic_api_key: String,
    pub advisory_model: String,
    pub database_url: Option<String>,
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,
    /// Minutes between trading cycles
    pub interval_minutes: u64,
    pub max_position_size: f64,
    pub stop_loss_pct: f64,
    pub min_order_value: f64,
    pub advisory_max_attempts: u32,
    pub advisory_retry_delay_secs: u64,
    pub advisory_timeout_secs: u64,
    /// Age limit for reusing a prior recommendation as fallback
    pub fallback_freshness_minutes: i64,
    /// Starting KRW balance for the paper executor
    pub initial_quote_balance: f64,
    pub daily_candle_count: u32,
    pub hourly_candle_count: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with(|name| std::env::var(name).ok())
    }

    fn from_env_with(get: impl Fn(&'static str) -> Option<String>) -> Result<Self, ConfigError> {
        let limits = RiskLimits::default();

        let interval_minutes: u64 = parse_or(&get, "TRADING_INTERVAL_MINUTES", 60)?;
        // The scheduler cannot tick on a zero period
        if interval_minutes == 0 {
            return Err(ConfigError::Invalid {
                name: "TRADING_INTERVAL_MINUTES",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            market: get("TRADING_PAIR").unwrap_or_else(|| "KRW-BTC".to_string()),
            anthropic_api_key: get("ANTHROPIC_API_KEY")
                .ok_or(ConfigError::Missing("ANTHROPIC_API_KEY"))?,
            advisory_model: get("ADVISORY_MODEL")
                .unwrap_or_else(|| crate::advisor::anthropic::DEFAULT_MODEL.to_string()),
            database_url: get("DATABASE_URL"),
            telegram_bot_token: get("TELEGRAM_BOT_TOKEN"),
            telegram_chat_id: get("TELEGRAM_CHAT_ID"),
            interval_minutes,
            max_position_size: parse_or(&get, "MAX_POSITION_SIZE", limits.max_position_size)?,
            stop_loss_pct: parse_or(&get, "STOP_LOSS_PERCENTAGE", limits.stop_loss_pct)?,
            min_order_value: parse_or(&get, "MIN_ORDER_VALUE", limits.min_order_value)?,
            advisory_max_attempts: parse_or(&get, "ADVISORY_MAX_ATTEMPTS", 3)?,
            advisory_retry_delay_secs: parse_or(&get, "ADVISORY_RETRY_DELAY_SECS", 2)?,
            advisory_timeout_secs: parse_or(&get, "ADVISORY_TIMEOUT_SECS", 30)?,
            fallback_freshness_minutes: parse_or(&get, "FALLBACK_FRESHNESS_MINUTES", 60)?,
            initial_quote_balance: parse_or(&get, "INITIAL_QUOTE_BALANCE", 1_000_000.0)?,
            daily_candle_count: parse_or(&get, "DAILY_CANDLE_COUNT", 30)?,
            hourly_candle_count: parse_or(&get, "HOURLY_CANDLE_COUNT", 24)?,
        })
    }

    pub fn risk_limits(&self) -> RiskLimits {
        RiskLimits {
            max_position_size: self.max_position_size,
            stop_loss_pct: self.stop_loss_pct,
            min_order_value: self.min_order_value,
        }
    }
}

fn parse_or<T: std::str::FromStr>(
    get: &impl Fn(&'static str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match get(name) {
        Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
            name,
            value,
        }),
        None => Ok(default),
    }
}
