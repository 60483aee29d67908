use crate::constants::{
    COEFFICIENT_DECIMALS, DEFAULT_KMER_LENGTH, DEFAULT_TARGET_SENSITIVITY, MIN_SEQUENCE_LENGTH,
};
use crate::kmer::counter::FrameFilter;
use crate::types::SensorError;

/// Which windows to count for sequences that carry a `frame` attribute.
///
/// Sequences without a frame attribute are always counted unrestricted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameMode {
    /// Ignore the frame attribute and count every window.
    Unrestricted,

    /// Count only windows where the frame counter is 0.
    InFrame,

    /// Count only windows where the frame counter is 1 or 2.
    #[default]
    OutOfFrame,
}

impl FrameMode {
    /// Counting filter for a sequence whose first base is in `frame`.
    #[must_use]
    pub const fn filter_for(self, frame: Option<u8>) -> FrameFilter {
        match (self, frame) {
            (Self::InFrame, Some(frame)) => FrameFilter::InFrame { frame },
            (Self::OutOfFrame, Some(frame)) => FrameFilter::OutOfFrame { frame },
            _ => FrameFilter::Unrestricted,
        }
    }
}

/// Configuration settings for feature extraction and model construction.
///
/// # Examples
///
/// ```rust
/// use sensorforge_core::config::{FrameMode, SensorConfig};
///
/// let config = SensorConfig {
///     frame_mode: FrameMode::InFrame,
///     target_sensitivity: 0.95,
///     ..Default::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct SensorConfig {
    /// k-mer length for composition features.
    ///
    /// **Default**: 6 (hexamers)
    pub kmer_length: usize,

    /// Sequences shorter than this are skipped when building composition rows.
    ///
    /// **Default**: 50
    pub min_sequence_length: usize,

    /// Frame handling for sequences with a `frame` attribute.
    ///
    /// **Default**: [`FrameMode::OutOfFrame`]
    pub frame_mode: FrameMode,

    /// Fraction of training positives that must score at or above the
    /// calibrated threshold.
    ///
    /// **Default**: 0.99
    pub target_sensitivity: f64,

    /// Leading lines to skip in coefficient files.
    ///
    /// The R solver prints two lines of matrix description before the
    /// coefficients.
    ///
    /// **Default**: 0
    pub coefficient_header_lines: usize,

    /// Round positional coefficients to this many decimals after loading.
    ///
    /// **Default**: `Some(3)`
    pub coefficient_decimals: Option<u32>,

    /// Divide composition weights by the largest absolute weight before
    /// writing an IMM.
    ///
    /// **Default**: `true`
    pub normalize_composition_weights: bool,

    /// Suppress the pipeline's `info` milestones (table sizes, fitted
    /// coefficients, calibrated threshold). Warnings are still logged.
    ///
    /// **Default**: `false`
    pub quiet: bool,

    /// Number of threads for building composition rows.
    ///
    /// **Default**: `None` (use all available cores)
    pub num_threads: Option<usize>,
}

impl SensorConfig {
    /// Check the configuration before any input is processed.
    ///
    /// # Errors
    ///
    /// Returns [`SensorError::InvalidConfig`] for a zero k-mer length, a
    /// target sensitivity outside `(0, 1]`, or zero threads.
    pub fn validate(&self) -> Result<(), SensorError> {
        if self.kmer_length == 0 {
            return Err(SensorError::InvalidConfig(
                "k-mer length must be positive".to_string(),
            ));
        }
        if !(self.target_sensitivity > 0.0 && self.target_sensitivity <= 1.0) {
            return Err(SensorError::InvalidConfig(format!(
                "target sensitivity {} is outside (0, 1]",
                self.target_sensitivity
            )));
        }
        if self.num_threads == Some(0) {
            return Err(SensorError::InvalidConfig(
                "thread count must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            kmer_length: DEFAULT_KMER_LENGTH,
            min_sequence_length: MIN_SEQUENCE_LENGTH,
            frame_mode: FrameMode::default(),
            target_sensitivity: DEFAULT_TARGET_SENSITIVITY,
            coefficient_header_lines: 0,
            coefficient_decimals: Some(COEFFICIENT_DECIMALS),
            normalize_composition_weights: true,
            quiet: false,
            num_threads: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = SensorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.kmer_length, 6);
        assert_eq!(config.min_sequence_length, 50);
        assert_eq!(config.frame_mode, FrameMode::OutOfFrame);
    }

    #[test]
    fn test_validate_rejects_bad_sensitivity() {
        for target in [0.0, -0.5, 1.5, f64::NAN] {
            let config = SensorConfig {
                target_sensitivity: target,
                ..Default::default()
            };
            assert!(config.validate().is_err(), "accepted {}", target);
        }
    }

    #[test]
    fn test_validate_rejects_zero_kmer_length() {
        let config = SensorConfig {
            kmer_length: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(SensorError::InvalidConfig(_))));
    }

    #[test]
    fn test_frame_mode_filter_for() {
        assert_eq!(
            FrameMode::OutOfFrame.filter_for(Some(1)),
            FrameFilter::OutOfFrame { frame: 1 }
        );
        assert_eq!(
            FrameMode::InFrame.filter_for(Some(0)),
            FrameFilter::InFrame { frame: 0 }
        );
        assert_eq!(FrameMode::InFrame.filter_for(None), FrameFilter::Unrestricted);
        assert_eq!(
            FrameMode::Unrestricted.filter_for(Some(2)),
            FrameFilter::Unrestricted
        );
    }
}
