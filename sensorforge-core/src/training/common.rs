/// Round to `decimals` places, ties to even
#[must_use]
pub fn round_to_decimals(value: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    (value * scale).round_ties_even() / scale
}

/// Divide every value by the largest absolute value.
///
/// Returns the divisor, or `None` (leaving the values untouched) when every
/// value is zero or the slice is empty.
pub fn normalize_by_max_abs(values: &mut [f64]) -> Option<f64> {
    let max_abs = values.iter().fold(0.0f64, |max, value| max.max(value.abs()));
    if max_abs == 0.0 {
        return None;
    }

    for value in values.iter_mut() {
        *value /= max_abs;
    }
    Some(max_abs)
}

/// Logistic function
#[must_use]
pub fn logistic(score: f64) -> f64 {
    1.0 / (1.0 + (-score).exp())
}
