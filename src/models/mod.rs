use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Candle timeframes tracked per market snapshot
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    Daily,
    Hourly,
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timeframe::Daily => write!(f, "daily"),
            Timeframe::Hourly => write!(f, "hourly"),
        }
    }
}

/// OHLCV candlestick data, optionally enriched with indicator values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sma_5: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sma_20: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rsi_14: Option<f64>,
}

impl Candle {
    pub fn new(timestamp: DateTime<Utc>, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
            sma_5: None,
            sma_20: None,
            rsi_14: None,
        }
    }
}

/// Processed market data for one trading cycle
///
/// Immutable once built; the decision pipeline only reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub current_price: f64,
    pub series: HashMap<Timeframe, Vec<Candle>>,
}

impl MarketSnapshot {
    /// Get the candle series for a timeframe, if present
    pub fn series(&self, timeframe: Timeframe) -> Option<&[Candle]> {
        self.series.get(&timeframe).map(|s| s.as_slice())
    }
}

/// Account balances at the start of a trading cycle
///
/// Treated as an immutable snapshot for the duration of one cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    /// Quote currency balance (KRW)
    pub quote_balance: f64,
    /// Base currency balance (BTC)
    pub base_balance: f64,
    /// Average acquisition price of the base currency, in quote terms
    pub base_avg_buy_price: f64,
}

impl Portfolio {
    /// All balances must be non-negative
    pub fn is_valid(&self) -> bool {
        self.quote_balance >= 0.0 && self.base_balance >= 0.0 && self.base_avg_buy_price >= 0.0
    }
}

/// Trading signal from a rule-based strategy (informational only)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

/// Action requested by a recommendation or decision
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TradeAction {
    Buy,
    Sell,
    Hold,
}

impl TradeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeAction::Buy => "buy",
            TradeAction::Sell => "sell",
            TradeAction::Hold => "hold",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "buy" => Some(TradeAction::Buy),
            "sell" => Some(TradeAction::Sell),
            "hold" => Some(TradeAction::Hold),
            _ => None,
        }
    }
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Validated advisory output, produced once per cycle by the gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub action: TradeAction,
    /// Confidence in the recommendation, 0-100
    pub confidence: f64,
    /// Suggested position size as percent of tradable balance, 0-100
    pub suggested_position_size: f64,
    pub reason: String,
}

/// Final order instruction for one cycle
///
/// `percentage` is the fraction of the relevant balance to trade
/// (quote balance for buys, base balance for sells).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub action: TradeAction,
    pub percentage: f64,
    pub reason: String,
}

impl Decision {
    pub fn hold(reason: impl Into<String>) -> Self {
        Self {
            action: TradeAction::Hold,
            percentage: 0.0,
            reason: reason.into(),
        }
    }
}
