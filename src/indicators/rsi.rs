/// Rolling Relative Strength Index (RSI) for every point in the series
///
/// RSI measures the magnitude of recent price changes to evaluate
/// overbought (above 70) or oversold (below 30) conditions. Positions
/// without `period` trailing price changes are `None`; the output lines up
/// index-for-index with the input series.
pub fn rsi_series(prices: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; prices.len()];
    if prices.len() < period + 1 || period == 0 {
        return out;
    }

    let changes: Vec<f64> = prices.windows(2).map(|w| w[1] - w[0]).collect();

    for i in period..prices.len() {
        // The change ending at price i is changes[i - 1]
        out[i] = Some(rsi_from_changes(&changes[i - period..i]));
    }

    out
}

fn rsi_from_changes(changes: &[f64]) -> f64 {
    let period = changes.len() as f64;
    let avg_gain: f64 = changes.iter().filter(|c| **c > 0.0).sum::<f64>() / period;
    let avg_loss: f64 = changes.iter().filter(|c| **c < 0.0).map(|c| c.abs()).sum::<f64>() / period;

    if avg_loss == 0.0 {
        return 100.0;
    }

    let rs = avg_gain / avg_loss;
    100.0 - (100.0 / (1.0 + rs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rsi_series_known_values() {
        let prices = vec![
            44.0, 44.25, 44.5, 43.75, 44.0, 44.5, 45.0, 45.5, 45.25, 45.5,
            46.0, 46.5, 46.25, 46.0, 46.5,
        ];

        let series = rsi_series(&prices, 14);
        let last = series.last().copied().flatten().unwrap();
        assert!(last > 0.0 && last < 100.0);
    }

    #[test]
    fn test_rsi_series_insufficient_data() {
        let series = rsi_series(&[100.0, 102.0, 101.0], 14);
        assert!(series.iter().all(Option::is_none));
    }

    #[test]
    fn test_rsi_series_all_gains() {
        let prices = vec![100.0, 101.0, 102.0, 103.0, 104.0, 105.0];
        let series = rsi_series(&prices, 5);

        // All gains = RSI 100
        assert_eq!(series.last().copied().flatten(), Some(100.0));
    }

    #[test]
    fn test_rsi_series_alignment() {
        let prices = vec![100.0, 101.0, 99.0, 102.0, 103.0, 101.0, 104.0];
        let series = rsi_series(&prices, 5);

        assert_eq!(series.len(), prices.len());
        for slot in &series[..5] {
            assert!(slot.is_none());
        }
        assert!(series[5].is_some());
        assert!(series[6].is_some());
    }
}
