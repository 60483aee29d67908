use crate::constants::THRESHOLD_DECIMALS;
use crate::training::common::round_to_decimals;
use crate::types::SensorError;

/// Score threshold at which `target_sensitivity` of the positives pass.
///
/// Sorts the raw scores of the training positives and takes the one at rank
/// `floor(N * (1 - target_sensitivity))`, rounded to 3 decimals. At most a
/// `1 - target_sensitivity` fraction of the positives score below it.
///
/// # Errors
///
/// - [`SensorError::DegenerateInput`] for an empty score list
/// - [`SensorError::InvalidConfig`] for a target outside `(0, 1]`
/// - [`SensorError::MalformedInput`] if a score is NaN
///
/// # Examples
///
/// ```rust
/// use sensorforge_core::training::calibration::calibrate_threshold;
///
/// let scores: Vec<f64> = (1..=10).map(f64::from).collect();
/// assert_eq!(calibrate_threshold(&scores, 0.8)?, 3.0);
/// # Ok::<(), sensorforge_core::types::SensorError>(())
/// ```
pub fn calibrate_threshold(scores: &[f64], target_sensitivity: f64) -> Result<f64, SensorError> {
    if scores.is_empty() {
        return Err(SensorError::DegenerateInput(
            "no positive scores to calibrate a threshold".to_string(),
        ));
    }
    if !(target_sensitivity > 0.0 && target_sensitivity <= 1.0) {
        return Err(SensorError::InvalidConfig(format!(
            "target sensitivity {} is outside (0, 1]",
            target_sensitivity
        )));
    }
    if scores.iter().any(|score| score.is_nan()) {
        return Err(SensorError::MalformedInput(
            "positive scores contain NaN".to_string(),
        ));
    }

    let mut sorted = scores.to_vec();
    sorted.sort_by(f64::total_cmp);

    let rank = threshold_rank(sorted.len(), target_sensitivity);
    Ok(round_to_decimals(sorted[rank], THRESHOLD_DECIMALS))
}

// Relative slack for the representation error of `1 - target`
// (10 * (1 - 0.9) is just below 1).
const RANK_EPSILON: f64 = 1e-9;

// floor(n * (1 - target)), clamped to a valid index
fn threshold_rank(n: usize, target_sensitivity: f64) -> usize {
    let scaled = n as f64 * (1.0 - target_sensitivity);
    let rank = (scaled + RANK_EPSILON * n as f64).floor() as usize;
    rank.min(n - 1)
}

/// Fraction of `scores` at or above `threshold`
#[must_use]
pub fn empirical_sensitivity(scores: &[f64], threshold: f64) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    let passing = scores.iter().filter(|&&score| score >= threshold).count();
    passing as f64 / scores.len() as f64
}
