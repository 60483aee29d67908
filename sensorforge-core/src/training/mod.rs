//! Model fitting and calibration.
//!
//! Turns labelled feature tables into calibrated sensor weights:
//!
//! 1. **Fitting**: a [`fit::RegressionFitter`] maps a feature table to named
//!    coefficients. [`fit::ExternalFitter`] hands the table to an external
//!    solver process; [`fit::Precomputed`] reuses weights fitted earlier.
//! 2. **Loading**: [`coefficients::CoefficientSet`] reads the solver's
//!    `name value` listing and [`coefficients::parse_feature_name`] splits
//!    positional names into offset and symbol.
//! 3. **Scoring**: [`scoring::LogisticModel`] computes raw window scores.
//! 4. **Calibration**: [`calibration::calibrate_threshold`] picks the raw
//!    score at which the target fraction of positives pass.

pub mod calibration;
pub mod coefficients;
pub mod common;
pub mod fit;
pub mod scoring;

pub use calibration::calibrate_threshold;
pub use coefficients::{Coefficient, CoefficientSet, ParsedFeature, parse_feature_name};
pub use fit::{ExternalFitter, Precomputed, RegressionFitter};
pub use scoring::LogisticModel;
