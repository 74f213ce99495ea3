// Technical indicators module
// Implements rolling SMA and RSI over closing-price series

pub mod moving_average;
pub mod rsi;

pub use moving_average::sma_series;
pub use rsi::rsi_series;
