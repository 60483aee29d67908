//! Writers for training tables and sensor model files.
//!
//! Every writer renders its whole artifact in memory and hands it to the
//! writer in one call, so a malformed coefficient never leaves a half-written
//! model behind.
//!
//! ## Supported Formats
//!
//! - **LogisticSensor**: positional signal model, forward and reverse blocks
//! - **IMM**: composition model for exon/intron content sensors
//! - **Markov chains**: k-mer log-odds tables from an external trainer,
//!   converted to IMM
//! - **Feature tables**: labelled rows handed to the regression solver
//! - **Weight tables**: `exp(±weight)` k-mer weights for sequence weighting
//! - **Score dumps**: raw scores and `score\tlabel` ROC input
//!
//! ## Examples
//!
//! ```rust
//! use sensorforge_core::output::write_logistic_sensor;
//! use sensorforge_core::results::CalibratedModel;
//! use sensorforge_core::training::coefficients::CoefficientSet;
//! use sensorforge_core::types::{SignalType, WindowGeometry};
//!
//! let mut coefficients = CoefficientSet::new();
//! coefficients.push("(Intercept)", -1.0);
//! coefficients.push("0G", 2.0);
//! let model = CalibratedModel::new(
//!     coefficients,
//!     0.5,
//!     SignalType::Donor,
//!     WindowGeometry::splice_site(0, 0),
//! );
//!
//! let mut buffer = Vec::new();
//! write_logistic_sensor(&mut buffer, &model)?;
//! let text = String::from_utf8(buffer)?;
//! assert!(text.starts_with("LogisticSensor\nGT\t0.5\t2\t5\t2\t0\t2\t+\n2\n"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::constants::{DNA_ALPHABET, MAX_IMM_KMER_LENGTH, WEIGHT_DIVISOR};
use crate::training::coefficients::CoefficientSet;
use crate::training::common::normalize_by_max_abs;
use crate::types::SensorError;

use log::warn;

mod formats {
    pub mod imm;
    pub mod logistic;
    pub mod markov;
    pub mod scores;
    pub mod table;
    pub mod weights;
}

pub use formats::{
    imm::{ImmBlock, ImmTable, read_imm, write_imm},
    logistic::write_logistic_sensor,
    markov::{MarkovChain, read_markov_chain, write_markov_imm},
    scores::{write_roc, write_scores},
    table::write_feature_table,
    weights::write_weight_tables,
};

/// Format a float the way the downstream tools read it back.
///
/// Shortest round-trip digits, integral values keep a trailing `.0`, and
/// exponents carry a sign and at least two digits (`1e-05`, `1e+16`).
///
/// # Examples
///
/// ```rust
/// use sensorforge_core::output::format_float;
///
/// assert_eq!(format_float(1.0), "1.0");
/// assert_eq!(format_float(-0.5), "-0.5");
/// assert_eq!(format_float(0.1667), "0.1667");
/// assert_eq!(format_float(0.00001), "1e-05");
/// ```
#[must_use]
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    let repr = format!("{:?}", value);
    match repr.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{}e{}{:0>2}", mantissa, sign, digits)
        }
        None => repr,
    }
}

/// Composition weights keyed by k-mer, ready for export.
///
/// Drops the intercept, divides each weight by `divisor`, and optionally
/// scales by the largest absolute weight. Returns the common k-mer length
/// and the weights in input order.
///
/// # Errors
///
/// - [`SensorError::DegenerateInput`] if there are no k-mer weights
/// - [`SensorError::MalformedInput`] if the k-mer names differ in length,
///   are longer than [`MAX_IMM_KMER_LENGTH`], or contain a non-ACGT symbol
pub(crate) fn composition_weights(
    coefficients: &CoefficientSet,
    divisor: f64,
    normalize: bool,
) -> Result<(usize, Vec<(String, f64)>), SensorError> {
    let mut names = Vec::new();
    let mut weights = Vec::new();
    for coefficient in coefficients.features() {
        names.push(coefficient.name.clone());
        weights.push(coefficient.weight / divisor);
    }

    let kmer_length = match names.first() {
        Some(first) => first.len(),
        None => {
            return Err(SensorError::DegenerateInput(
                "no k-mer weights to export".to_string(),
            ));
        }
    };
    if let Some(odd) = names.iter().find(|name| name.len() != kmer_length) {
        return Err(SensorError::MalformedInput(format!(
            "k-mer {} does not have length {}",
            odd, kmer_length
        )));
    }
    if kmer_length > MAX_IMM_KMER_LENGTH {
        return Err(SensorError::MalformedInput(format!(
            "k-mer length {} exceeds the supported maximum of {}",
            kmer_length, MAX_IMM_KMER_LENGTH
        )));
    }
    if let Some(foreign) = names
        .iter()
        .find(|name| !name.bytes().all(|base| DNA_ALPHABET.contains(&base)))
    {
        return Err(SensorError::MalformedInput(format!(
            "{} is not a k-mer over ACGT",
            foreign
        )));
    }

    if normalize && normalize_by_max_abs(&mut weights).is_none() {
        warn!("All k-mer weights are zero; writing them unnormalized");
    }
    Ok((kmer_length, names.into_iter().zip(weights).collect()))
}

/// [`composition_weights`] with the sensor's weight-halving convention
pub(crate) fn halved_composition_weights(
    coefficients: &CoefficientSet,
    normalize: bool,
) -> Result<(usize, Vec<(String, f64)>), SensorError> {
    composition_weights(coefficients, WEIGHT_DIVISOR, normalize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_float_plain() {
        assert_eq!(format_float(0.0), "0.0");
        assert_eq!(format_float(-0.0), "-0.0");
        assert_eq!(format_float(3.0), "3.0");
        assert_eq!(format_float(-1.25), "-1.25");
        assert_eq!(format_float(0.0001), "0.0001");
        assert_eq!(format_float(1.0 / 3.0), "0.3333333333333333");
    }

    #[test]
    fn test_format_float_exponents() {
        assert_eq!(format_float(1.5e-7), "1.5e-07");
        assert_eq!(format_float(2e20), "2e+20");
        assert_eq!(format_float(1e-123), "1e-123");
        assert_eq!(format_float(f64::INFINITY), "inf");
        assert_eq!(format_float(f64::NAN), "nan");
    }

    #[test]
    fn test_composition_weights_normalized() {
        let mut coefficients = CoefficientSet::new();
        coefficients.push("(Intercept)", 9.0);
        coefficients.push("AC", 1.0);
        coefficients.push("GT", -4.0);
        let (k, weights) = halved_composition_weights(&coefficients, true).unwrap();
        assert_eq!(k, 2);
        assert_eq!(
            weights,
            vec![("AC".to_string(), 0.25), ("GT".to_string(), -1.0)]
        );

        let (_, raw) = halved_composition_weights(&coefficients, false).unwrap();
        assert_eq!(raw, vec![("AC".to_string(), 0.5), ("GT".to_string(), -2.0)]);
    }

    #[test]
    fn test_composition_weights_all_zero() {
        let mut coefficients = CoefficientSet::new();
        coefficients.push("AC", 0.0);
        let (_, weights) = composition_weights(&coefficients, 1.0, true).unwrap();
        assert_eq!(weights, vec![("AC".to_string(), 0.0)]);
    }

    #[test]
    fn test_composition_weights_errors() {
        let mut mixed = CoefficientSet::new();
        mixed.push("AC", 1.0);
        mixed.push("ACG", 1.0);
        assert!(matches!(
            composition_weights(&mixed, 1.0, true),
            Err(SensorError::MalformedInput(_))
        ));

        let mut intercept_only = CoefficientSet::new();
        intercept_only.push("(Intercept)", 1.0);
        assert!(matches!(
            composition_weights(&intercept_only, 1.0, true),
            Err(SensorError::DegenerateInput(_))
        ));
    }

    #[test]
    fn test_composition_weights_reject_positional_names() {
        let mut positional = CoefficientSet::new();
        positional.push("0A", 1.0);
        positional.push("0C", -1.0);
        match composition_weights(&positional, 1.0, true) {
            Err(SensorError::MalformedInput(message)) => assert!(message.contains("0A")),
            other => panic!("expected MalformedInput, got {:?}", other),
        }
    }

    #[test]
    fn test_composition_weights_bound_kmer_length() {
        let mut long = CoefficientSet::new();
        long.push(&"A".repeat(40), 1.0);
        assert!(matches!(
            composition_weights(&long, 1.0, true),
            Err(SensorError::MalformedInput(_))
        ));

        let mut longest = CoefficientSet::new();
        longest.push(&"A".repeat(MAX_IMM_KMER_LENGTH), 1.0);
        assert!(composition_weights(&longest, 1.0, true).is_ok());
    }
}
