/// Rolling SMA for every point in the series
///
/// Positions with fewer than `period` trailing prices are `None`, so the
/// output lines up index-for-index with the input. The crossover strategy
/// needs at least the last two populated values.
pub fn sma_series(prices: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; prices.len()];
    if period == 0 {
        return out;
    }

    for i in (period - 1)..prices.len() {
        let window = &prices[i + 1 - period..=i];
        out[i] = Some(window.iter().sum::<f64>() / period as f64);
    }

    out
}
