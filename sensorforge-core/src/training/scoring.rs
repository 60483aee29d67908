use std::collections::HashMap;

use crate::training::coefficients::{CoefficientSet, ParsedFeature};
use crate::training::common::logistic;
use crate::types::SensorError;

/// Positional logistic model: one weight per window offset and symbol.
///
/// Window scores are the intercept plus the weight of the symbol observed at
/// each offset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogisticModel {
    weights: HashMap<(usize, u8), f64>,
    intercept: f64,
}

impl LogisticModel {
    /// Build a model from positional coefficients.
    ///
    /// # Errors
    ///
    /// Returns [`SensorError::FeatureNameParse`] if a non-intercept name is
    /// not `<position><symbol>`, and [`SensorError::MalformedInput`] if the
    /// symbol is longer than one base.
    pub fn from_coefficients(coefficients: &CoefficientSet) -> Result<Self, SensorError> {
        let mut model = Self::default();
        for coefficient in coefficients.iter() {
            match coefficient.parse()? {
                ParsedFeature::Intercept => model.intercept = coefficient.weight,
                ParsedFeature::Position { position, symbol } => {
                    let &[base] = symbol.as_bytes() else {
                        return Err(SensorError::MalformedInput(format!(
                            "feature {} does not name a single base",
                            coefficient.name
                        )));
                    };
                    model.weights.insert((position, base), coefficient.weight);
                }
            }
        }
        Ok(model)
    }

    /// Build a model from log-frequencies keyed like one-hot column names
    ///
    /// # Errors
    ///
    /// See [`LogisticModel::from_coefficients`].
    pub fn from_named_weights(weights: &HashMap<String, f64>) -> Result<Self, SensorError> {
        let mut coefficients = CoefficientSet::new();
        let mut names: Vec<&String> = weights.keys().collect();
        names.sort();
        for name in names {
            coefficients.push(name, weights[name]);
        }
        Self::from_coefficients(&coefficients)
    }

    /// Intercept weight (0 when the fit had none)
    #[must_use]
    pub const fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Pre-logistic score of a model window.
    ///
    /// # Errors
    ///
    /// Returns [`SensorError::MalformedInput`] if the model has no weight for
    /// the symbol at some offset.
    pub fn raw_score(&self, window: &[u8]) -> Result<f64, SensorError> {
        window
            .iter()
            .enumerate()
            .try_fold(self.intercept, |score, (offset, &base)| {
                self.weights
                    .get(&(offset, base))
                    .map(|weight| score + weight)
                    .ok_or_else(|| {
                        SensorError::MalformedInput(format!(
                            "no weight for '{}' at window offset {}",
                            char::from(base),
                            offset
                        ))
                    })
            })
    }

    /// Logistic probability of a model window
    ///
    /// # Errors
    ///
    /// See [`LogisticModel::raw_score`].
    pub fn probability(&self, window: &[u8]) -> Result<f64, SensorError> {
        self.raw_score(window).map(logistic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example_model() -> LogisticModel {
        let mut coefficients = CoefficientSet::new();
        coefficients.push("(Intercept)", -1.0);
        for (name, weight) in [
            ("0A", 0.5),
            ("0C", -0.5),
            ("0G", 0.0),
            ("0T", 0.25),
            ("1A", 2.0),
            ("1C", 0.0),
            ("1G", 1.0),
            ("1T", -2.0),
        ] {
            coefficients.push(name, weight);
        }
        LogisticModel::from_coefficients(&coefficients).unwrap()
    }

    #[test]
    fn test_raw_score_sums_weights() {
        let model = example_model();
        assert_eq!(model.intercept(), -1.0);
        assert_eq!(model.raw_score(b"AA").unwrap(), 1.5);
        assert_eq!(model.raw_score(b"CT").unwrap(), -3.5);
        assert_eq!(model.raw_score(b"").unwrap(), -1.0);
    }

    #[test]
    fn test_probability() {
        let model = example_model();
        // raw score of GG is 0
        assert!((model.probability(b"GG").unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_missing_weight_is_malformed() {
        let model = example_model();
        assert!(matches!(
            model.raw_score(b"AN"),
            Err(SensorError::MalformedInput(_))
        ));
        assert!(model.raw_score(b"AAA").is_err());
    }

    #[test]
    fn test_rejects_kmer_features() {
        let mut coefficients = CoefficientSet::new();
        coefficients.push("ACGTAC", 1.0);
        assert!(matches!(
            LogisticModel::from_coefficients(&coefficients),
            Err(SensorError::FeatureNameParse(_))
        ));

        let mut coefficients = CoefficientSet::new();
        coefficients.push("3GT", 1.0);
        assert!(matches!(
            LogisticModel::from_coefficients(&coefficients),
            Err(SensorError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_from_named_weights() {
        let weights: HashMap<String, f64> = [("0A", -0.1), ("0C", -2.0), ("1A", -0.3)]
            .into_iter()
            .map(|(name, weight)| (name.to_string(), weight))
            .collect();
        let model = LogisticModel::from_named_weights(&weights).unwrap();
        assert_eq!(model.intercept(), 0.0);
        assert!((model.raw_score(b"AA").unwrap() - -0.4).abs() < 1e-12);
    }
}
