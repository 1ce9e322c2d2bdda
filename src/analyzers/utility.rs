/// Computes the arithmetic mean of a slice of values. Returns 0.0 for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Rounds to two decimals using the exact decimal expansion of `value`.
/// Negative zero comes back as zero.
pub fn round2(value: f64) -> f64 {
    let rounded: f64 = format!("{value:.2}").parse().unwrap_or(value);
    if rounded == 0.0 { 0.0 } else { rounded }
}
