//! Calibrated sensor models.

use crate::training::coefficients::CoefficientSet;
use crate::types::{SignalType, WindowGeometry};

/// A fitted positional model with its calibrated score threshold.
///
/// Built once by [`crate::engine::FittedSensor::calibrate`] (or directly from
/// precomputed parts) and written with
/// [`crate::output::write_logistic_sensor`].
#[derive(Debug, Clone, PartialEq)]
pub struct CalibratedModel {
    /// Fitted weights in solver order, intercept included
    pub coefficients: CoefficientSet,
    /// Raw-score threshold, rounded to 3 decimals
    pub threshold: f64,
    /// Signal the model detects
    pub signal_type: SignalType,
    /// Window the weights are positioned in
    pub geometry: WindowGeometry,
}

impl CalibratedModel {
    /// Assemble a model from its parts
    #[must_use]
    pub const fn new(
        coefficients: CoefficientSet,
        threshold: f64,
        signal_type: SignalType,
        geometry: WindowGeometry,
    ) -> Self {
        Self {
            coefficients,
            threshold,
            signal_type,
            geometry,
        }
    }
}
