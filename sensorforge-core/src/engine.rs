use std::marker::PhantomData;

use log::{debug, info, warn};
use rayon::prelude::*;

use crate::config::SensorConfig;
use crate::constants::DNA_ALPHABET;
use crate::encoding::{
    has_accepted_consensus, one_hot_header, one_hot_row, positional_log_frequencies,
};
use crate::kmer::{composition_vector, count_kmers, enumerate_ngrams};
use crate::results::CalibratedModel;
use crate::training::calibration::{calibrate_threshold, empirical_sensitivity};
use crate::training::coefficients::CoefficientSet;
use crate::training::fit::RegressionFitter;
use crate::training::scoring::LogisticModel;
use crate::types::{
    FeatureRow, FeatureTable, FeatureValues, NEGATIVE_LABEL, POSITIVE_LABEL, SensorError,
    SignalType, TrainingRecord, WindowGeometry,
};

/// Marker trait for sensor training state.
///
/// Used in the type-state pattern so that a model can only be calibrated
/// after it has been fitted. Implemented by [`Untrained`] and [`Fitted`].
pub trait TrainingState {}

/// Marker type for a trainer that has no fitted weights yet
#[derive(Debug, Clone)]
pub struct Untrained;

/// Marker type for a trainer holding fitted weights
#[derive(Debug, Clone)]
pub struct Fitted;

impl TrainingState for Untrained {}
impl TrainingState for Fitted {}

/// Positional signal sensor trainer.
///
/// An [`UntrainedSensor`] builds one-hot feature tables and fits them with a
/// [`RegressionFitter`]; the resulting [`FittedSensor`] scores windows and
/// calibrates its threshold into a [`CalibratedModel`].
///
/// # Examples
///
/// ```rust
/// use sensorforge_core::engine::UntrainedSensor;
/// use sensorforge_core::training::coefficients::CoefficientSet;
/// use sensorforge_core::training::fit::Precomputed;
/// use sensorforge_core::types::{SignalType, TrainingRecord, WindowGeometry};
///
/// let geometry = WindowGeometry {
///     consensus_position: 1,
///     consensus_length: 2,
///     left_margin: 1,
///     right_margin: 0,
/// };
/// let positives = vec![TrainingRecord::new("p1", "AGT"), TrainingRecord::new("p2", "CGT")];
/// let negatives = vec![TrainingRecord::new("n1", "TGT")];
///
/// let mut weights = CoefficientSet::new();
/// for (name, weight) in [("0A", 1.0), ("0C", 0.5), ("0G", 0.0), ("0T", -1.0)] {
///     weights.push(name, weight);
/// }
/// for position in 1..3 {
///     for base in ["A", "C", "G", "T"] {
///         weights.push(&format!("{}{}", position, base), 0.0);
///     }
/// }
///
/// let trainer = UntrainedSensor::new(SignalType::Donor, geometry)?
///     .with_consensuses(vec!["GT".to_string()]);
/// let fitted = trainer.fit(&Precomputed(weights), &positives, &negatives)?;
/// let model = fitted.calibrate(&positives)?;
/// assert_eq!(model.threshold, 0.5);
/// # Ok::<(), sensorforge_core::types::SensorError>(())
/// ```
#[derive(Debug, Clone)]
pub struct SensorTrainer<S: TrainingState> {
    /// Configuration options
    pub config: SensorConfig,
    signal_type: SignalType,
    geometry: WindowGeometry,
    consensuses: Vec<String>,
    /// Fitted weights (empty until fitted)
    coefficients: CoefficientSet,
    _state: PhantomData<S>,
}

/// Trainer that has not been fitted yet
pub type UntrainedSensor = SensorTrainer<Untrained>;

/// Trainer holding fitted weights, ready to calibrate
pub type FittedSensor = SensorTrainer<Fitted>;

impl UntrainedSensor {
    /// Creates a trainer with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SensorError::InvalidConfig`] if the geometry is invalid.
    pub fn new(signal_type: SignalType, geometry: WindowGeometry) -> Result<Self, SensorError> {
        geometry.validate()?;
        Ok(Self {
            config: SensorConfig::default(),
            signal_type,
            geometry,
            consensuses: Vec::new(),
            coefficients: CoefficientSet::new(),
            _state: PhantomData,
        })
    }

    /// Creates a trainer with a custom configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SensorError::InvalidConfig`] if the configuration or the
    /// geometry is invalid, or if the thread pool can't be configured.
    pub fn with_config(
        config: SensorConfig,
        signal_type: SignalType,
        geometry: WindowGeometry,
    ) -> Result<Self, SensorError> {
        config.validate()?;
        configure_thread_pool(config.num_threads)?;
        let mut trainer = Self::new(signal_type, geometry)?;
        trainer.config = config;
        Ok(trainer)
    }

    /// Restrict training examples to these consensus strings.
    ///
    /// An empty list (the default) accepts every example.
    #[must_use]
    pub fn with_consensuses(mut self, consensuses: Vec<String>) -> Self {
        self.consensuses = consensuses;
        self
    }

    /// One-hot feature table of the accepted examples, positives first.
    ///
    /// # Errors
    ///
    /// - [`SensorError::DegenerateInput`] if no positive example is accepted
    /// - [`SensorError::MalformedInput`] if an accepted example is too short
    ///   for the window or has a non-ACGT base inside it
    pub fn feature_table(
        &self,
        positives: &[TrainingRecord],
        negatives: &[TrainingRecord],
    ) -> Result<FeatureTable, SensorError> {
        let (begin, end) = (self.geometry.begin(), self.geometry.end());
        let mut table = FeatureTable::new(one_hot_header(begin, end, DNA_ALPHABET));

        for (examples, label) in [(positives, POSITIVE_LABEL), (negatives, NEGATIVE_LABEL)] {
            for example in examples {
                if !has_accepted_consensus(&example.sequence, &self.geometry, &self.consensuses) {
                    debug!("Skipping {}: consensus not accepted", example.identifier);
                    continue;
                }
                let values = one_hot_row(&example.sequence, begin, end, DNA_ALPHABET)
                    .map_err(|e| match e {
                        SensorError::MalformedInput(message) => SensorError::MalformedInput(
                            format!("{}: {}", example.identifier, message),
                        ),
                        other => other,
                    })?;
                table.push(FeatureRow {
                    label,
                    values: FeatureValues::Indicators(values),
                })?;
            }
        }

        let accepted_positives = table.count_label(POSITIVE_LABEL);
        if accepted_positives == 0 {
            return Err(SensorError::DegenerateInput(
                "no positive example carries an accepted consensus".to_string(),
            ));
        }
        if !self.config.quiet {
            info!(
                "Built {} x {} feature table ({} positives, {} negatives)",
                table.rows().len(),
                table.columns().len(),
                accepted_positives,
                table.count_label(NEGATIVE_LABEL)
            );
        }
        Ok(table)
    }

    /// Fit the feature table of the given examples.
    ///
    /// Weights are rounded to [`SensorConfig::coefficient_decimals`] places.
    ///
    /// # Errors
    ///
    /// Any error from [`UntrainedSensor::feature_table`] or the fitter.
    pub fn fit(
        self,
        fitter: &dyn RegressionFitter,
        positives: &[TrainingRecord],
        negatives: &[TrainingRecord],
    ) -> Result<FittedSensor, SensorError> {
        let table = self.feature_table(positives, negatives)?;
        let mut coefficients = fitter.fit(&table)?;
        if let Some(decimals) = self.config.coefficient_decimals {
            coefficients = coefficients.rounded(decimals);
        }
        if !self.config.quiet {
            info!("Fitted {} coefficients", coefficients.len());
        }

        Ok(SensorTrainer {
            config: self.config,
            signal_type: self.signal_type,
            geometry: self.geometry,
            consensuses: self.consensuses,
            coefficients,
            _state: PhantomData,
        })
    }
}

impl FittedSensor {
    /// Fitted weights, in solver order
    #[must_use]
    pub const fn coefficients(&self) -> &CoefficientSet {
        &self.coefficients
    }

    /// Scoring model for the fitted weights
    ///
    /// # Errors
    ///
    /// Returns an error if a weight is not a single-base positional feature.
    pub fn model(&self) -> Result<LogisticModel, SensorError> {
        LogisticModel::from_coefficients(&self.coefficients)
    }

    /// Raw scores of the model window of each example.
    ///
    /// Examples with a non-ACGT base in the window are skipped with a
    /// warning.
    ///
    /// # Errors
    ///
    /// Returns [`SensorError::MalformedInput`] if an example is too short
    /// for the window.
    pub fn raw_scores(&self, examples: &[TrainingRecord]) -> Result<Vec<f64>, SensorError> {
        window_scores(&self.model()?, &self.geometry, examples)
    }

    /// Calibrate the threshold on the training positives and finish the model.
    ///
    /// # Errors
    ///
    /// Returns [`SensorError::DegenerateInput`] if no positive can be scored,
    /// or any error from [`FittedSensor::raw_scores`].
    pub fn calibrate(self, positives: &[TrainingRecord]) -> Result<CalibratedModel, SensorError> {
        let scores = self.raw_scores(positives)?;
        let threshold = calibrate_threshold(&scores, self.config.target_sensitivity)?;
        if !self.config.quiet {
            info!(
                "Threshold {} passes {:.4} of {} positives (target {})",
                threshold,
                empirical_sensitivity(&scores, threshold),
                scores.len(),
                self.config.target_sensitivity
            );
        }
        Ok(self.with_threshold(threshold))
    }

    /// Finish the model with a threshold chosen elsewhere
    #[must_use]
    pub fn with_threshold(self, threshold: f64) -> CalibratedModel {
        CalibratedModel::new(
            self.coefficients,
            threshold,
            self.signal_type,
            self.geometry,
        )
    }
}

impl<S: TrainingState> SensorTrainer<S> {
    /// Signal the trainer builds a model for
    #[must_use]
    pub const fn signal_type(&self) -> SignalType {
        self.signal_type
    }

    /// Model window geometry
    #[must_use]
    pub const fn geometry(&self) -> &WindowGeometry {
        &self.geometry
    }

    /// Accepted consensus strings
    #[must_use]
    pub fn consensuses(&self) -> &[String] {
        &self.consensuses
    }

    /// Pseudocounted positional log-frequency model of the accepted positives
    ///
    /// # Errors
    ///
    /// See [`positional_log_frequencies`].
    pub fn frequency_model(
        &self,
        positives: &[TrainingRecord],
    ) -> Result<LogisticModel, SensorError> {
        let frequencies =
            positional_log_frequencies(positives, &self.geometry, &self.consensuses, DNA_ALPHABET)?;
        LogisticModel::from_named_weights(&frequencies)
    }

    /// Threshold calibrated on the log-frequency model instead of the fit
    ///
    /// # Errors
    ///
    /// See [`SensorTrainer::frequency_model`] and [`calibrate_threshold`].
    pub fn frequency_threshold(&self, positives: &[TrainingRecord]) -> Result<f64, SensorError> {
        let model = self.frequency_model(positives)?;
        let scores = window_scores(&model, &self.geometry, positives)?;
        calibrate_threshold(&scores, self.config.target_sensitivity)
    }
}

// Raw scores of each example's model window, skipping windows with non-ACGT bases
fn window_scores(
    model: &LogisticModel,
    geometry: &WindowGeometry,
    examples: &[TrainingRecord],
) -> Result<Vec<f64>, SensorError> {
    let (begin, end) = (geometry.begin(), geometry.end());

    let mut scores = Vec::with_capacity(examples.len());
    for example in examples {
        let window = example.sequence.get(begin..end).ok_or_else(|| {
            SensorError::MalformedInput(format!(
                "{}: sequence of length {} is too short for window {}..{}",
                example.identifier,
                example.sequence.len(),
                begin,
                end
            ))
        })?;
        if !window.iter().all(|base| DNA_ALPHABET.contains(base)) {
            warn!("Skipping {}: non-ACGT base in window", example.identifier);
            continue;
        }
        scores.push(model.raw_score(window)?);
    }
    Ok(scores)
}

/// Configure the global rayon pool.
///
/// # Errors
///
/// Returns [`SensorError::InvalidConfig`] if the pool was already built.
pub fn configure_thread_pool(num_threads: Option<usize>) -> Result<(), SensorError> {
    if let Some(num_threads) = num_threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
            .map_err(|e| {
                SensorError::InvalidConfig(format!("Failed to configure thread pool: {}", e))
            })?;
    }
    Ok(())
}

/// Composition vector of one record, or `None` if it is too short.
///
/// The frame filter comes from the record's `frame` attribute and
/// [`SensorConfig::frame_mode`].
///
/// # Errors
///
/// - [`SensorError::MalformedInput`] for a non-integer frame attribute
/// - [`SensorError::DivisionUndefined`] if no enumerated k-mer was counted
pub fn composition_row(
    record: &TrainingRecord,
    enumeration: &[String],
    config: &SensorConfig,
) -> Result<Option<Vec<f64>>, SensorError> {
    if record.sequence.len() < config.min_sequence_length {
        debug!(
            "Skipping {}: length {} is below {}",
            record.identifier,
            record.sequence.len(),
            config.min_sequence_length
        );
        return Ok(None);
    }
    let filter = config.frame_mode.filter_for(record.frame()?);
    let counts = count_kmers(&record.sequence, config.kmer_length, filter);
    composition_vector(&counts, enumeration).map(Some)
}

/// Labelled composition table for exon (label 1) and intron (label 0) records.
///
/// Rows are computed in parallel and kept in input order, exons first.
///
/// # Errors
///
/// - [`SensorError::InvalidConfig`] if the configuration is invalid
/// - any error from [`composition_row`]
///
/// # Examples
///
/// ```rust
/// use sensorforge_core::config::SensorConfig;
/// use sensorforge_core::engine::composition_table;
/// use sensorforge_core::types::TrainingRecord;
///
/// let config = SensorConfig { kmer_length: 2, min_sequence_length: 3, ..Default::default() };
/// let exons = vec![TrainingRecord::new("e1", "AAAA")];
/// let introns = vec![TrainingRecord::new("i1", "AC"), TrainingRecord::new("i2", "ACGT")];
///
/// let table = composition_table(&exons, &introns, &config)?;
/// assert_eq!(table.columns().len(), 16);
/// assert_eq!(table.rows().len(), 2);
/// # Ok::<(), sensorforge_core::types::SensorError>(())
/// ```
pub fn composition_table(
    exons: &[TrainingRecord],
    introns: &[TrainingRecord],
    config: &SensorConfig,
) -> Result<FeatureTable, SensorError> {
    config.validate()?;
    let enumeration = enumerate_ngrams(DNA_ALPHABET, config.kmer_length);
    let mut table = FeatureTable::new(enumeration.clone());

    for (records, label) in [(exons, POSITIVE_LABEL), (introns, NEGATIVE_LABEL)] {
        let rows = composition_rows(records, &enumeration, config)?;
        for values in rows {
            table.push(FeatureRow {
                label,
                values: FeatureValues::Fractions(values),
            })?;
        }
    }

    if !config.quiet {
        info!(
            "Built composition table: {} exon rows, {} intron rows, {} columns",
            table.count_label(POSITIVE_LABEL),
            table.count_label(NEGATIVE_LABEL),
            table.columns().len()
        );
    }
    Ok(table)
}

fn composition_rows(
    records: &[TrainingRecord],
    enumeration: &[String],
    config: &SensorConfig,
) -> Result<Vec<Vec<f64>>, SensorError> {
    let rows = records
        .par_iter()
        .map(|record| composition_row(record, enumeration, config))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FrameMode;
    use crate::training::fit::Precomputed;
    use crate::types::Label;

    fn tiny_geometry() -> WindowGeometry {
        WindowGeometry {
            consensus_position: 2,
            consensus_length: 2,
            left_margin: 1,
            right_margin: 1,
        }
    }

    fn window_weights() -> CoefficientSet {
        let mut coefficients = CoefficientSet::new();
        coefficients.push("(Intercept)", 0.1234);
        for position in 0..4 {
            for (base, weight) in [("A", 1.0), ("C", 0.5), ("G", 0.0), ("T", -1.0)] {
                coefficients.push(&format!("X{}{}", position, base), weight);
            }
        }
        coefficients
    }

    fn trainer() -> UntrainedSensor {
        UntrainedSensor::new(SignalType::Donor, tiny_geometry())
            .unwrap()
            .with_consensuses(vec!["GT".to_string()])
    }

    #[test]
    fn test_feature_table_filters_and_orders_rows() {
        let positives = vec![
            TrainingRecord::new("p1", "CAGTAC"),
            TrainingRecord::new("p2", "CAAGTC"),
        ];
        let negatives = vec![TrainingRecord::new("n1", "TTGTTT")];
        let table = trainer().feature_table(&positives, &negatives).unwrap();

        assert_eq!(table.columns().len(), 16);
        assert_eq!(table.columns()[0], "0A");
        let labels: Vec<Label> = table.rows().iter().map(|row| row.label).collect();
        assert_eq!(labels, vec![1, 0]);
        assert_eq!(
            table.rows()[0].values,
            FeatureValues::Indicators(vec![1, 0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 1, 1, 0, 0, 0])
        );
    }

    #[test]
    fn test_feature_table_without_positives_is_degenerate() {
        let positives = vec![TrainingRecord::new("p1", "CAAGAC")];
        assert!(matches!(
            trainer().feature_table(&positives, &[]),
            Err(SensorError::DegenerateInput(_))
        ));
    }

    #[test]
    fn test_feature_table_rejects_short_example() {
        // consensus fits, window end does not
        let positives = vec![TrainingRecord::new("p1", "CAGT")];
        assert!(matches!(
            trainer().feature_table(&positives, &[]),
            Err(SensorError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_fit_rounds_and_calibrate_builds_model() {
        let positives = vec![
            TrainingRecord::new("p1", "CAGTAC"), // A G T A -> 1 + 0 - 1 + 1
            TrainingRecord::new("p2", "CCGTCC"), // C G T C -> 0.5 + 0 - 1 + 0.5
            TrainingRecord::new("p3", "CTGTNC"), // N in window
        ];
        let mut untrained = trainer();
        untrained.config = SensorConfig {
            target_sensitivity: 1.0,
            ..Default::default()
        };

        let fitted = untrained
            .fit(&Precomputed(window_weights()), &positives[..2], &[])
            .unwrap();
        assert_eq!(fitted.coefficients().intercept(), Some(0.123));

        let scores = fitted.raw_scores(&positives).unwrap();
        assert_eq!(scores.len(), 2);
        assert!((scores[0] - 1.123).abs() < 1e-9);
        assert!((scores[1] - 0.123).abs() < 1e-9);

        let model = fitted.calibrate(&positives).unwrap();
        assert_eq!(model.threshold, 0.123);
        assert_eq!(model.signal_type, SignalType::Donor);
        assert_eq!(model.geometry, tiny_geometry());
        assert_eq!(model.coefficients.len(), 17);
    }

    #[test]
    fn test_quiet_pipeline() {
        let positives = vec![TrainingRecord::new("p1", "CAGTAC")];
        let mut untrained = trainer();
        untrained.config = SensorConfig {
            quiet: true,
            target_sensitivity: 1.0,
            ..Default::default()
        };

        let fitted = untrained
            .fit(&Precomputed(window_weights()), &positives, &[])
            .unwrap();
        assert!(fitted.config.quiet);
        let model = fitted.calibrate(&positives).unwrap();
        assert_eq!(model.threshold, 1.123);

        let config = SensorConfig {
            quiet: true,
            kmer_length: 2,
            min_sequence_length: 2,
            ..Default::default()
        };
        let exons = vec![TrainingRecord::new("e1", "AAAA")];
        let table = composition_table(&exons, &[], &config).unwrap();
        assert_eq!(table.rows().len(), 1);
    }

    #[test]
    fn test_frequency_model() {
        let positives = vec![TrainingRecord::new("p1", "CAGTAC")];
        let model = trainer().frequency_model(&positives).unwrap();
        let seen = (1.0f64 / 1.3).ln();
        assert!((model.raw_score(b"AGTA").unwrap() - 4.0 * seen).abs() < 1e-9);
    }

    #[test]
    fn test_frequency_threshold() {
        let positives = vec![
            TrainingRecord::new("p1", "CAGTAC"),
            TrainingRecord::new("p2", "CAGTAC"),
        ];
        let threshold = trainer().frequency_threshold(&positives).unwrap();
        // Every position sees its base twice: 4 * ln(2 / 2.3)
        let expected = (4.0 * (2.0f64 / 2.3).ln() * 1000.0).round() / 1000.0;
        assert_eq!(threshold, expected);
    }

    #[test]
    fn test_with_threshold() {
        let positives = vec![TrainingRecord::new("p1", "CAGTAC")];
        let fitted = trainer()
            .fit(&Precomputed(window_weights()), &positives, &[])
            .unwrap();
        let model = fitted.with_threshold(-2.5);
        assert_eq!(model.threshold, -2.5);
        assert_eq!(model.signal_type, SignalType::Donor);
    }

    #[test]
    fn test_invalid_geometry_is_rejected() {
        let geometry = WindowGeometry {
            consensus_position: 1,
            consensus_length: 2,
            left_margin: 5,
            right_margin: 0,
        };
        assert!(matches!(
            UntrainedSensor::new(SignalType::Acceptor, geometry),
            Err(SensorError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_composition_row_skips_short_records() {
        let config = SensorConfig::default();
        let enumeration = enumerate_ngrams(DNA_ALPHABET, config.kmer_length);
        let record = TrainingRecord::new("short", "ACGTACGT");
        assert_eq!(composition_row(&record, &enumeration, &config).unwrap(), None);
    }

    #[test]
    fn test_composition_row_uses_frame_attribute() {
        let config = SensorConfig {
            kmer_length: 1,
            min_sequence_length: 1,
            frame_mode: FrameMode::InFrame,
            ..Default::default()
        };
        let enumeration = enumerate_ngrams(DNA_ALPHABET, 1);

        // In frame from 0: positions 0 and 3 (A, T)
        let framed = TrainingRecord::new("e1", "ACGTCG").with_attribute("frame", "0");
        assert_eq!(
            composition_row(&framed, &enumeration, &config).unwrap(),
            Some(vec![0.5, 0.0, 0.0, 0.5])
        );

        // No frame attribute: every position
        let unframed = TrainingRecord::new("e2", "ACGTCG");
        assert_eq!(
            composition_row(&unframed, &enumeration, &config).unwrap(),
            Some(vec![0.1667, 0.3333, 0.3333, 0.1667])
        );

        let bad = TrainingRecord::new("e3", "ACGT").with_attribute("frame", "x");
        assert!(composition_row(&bad, &enumeration, &config).is_err());
    }

    #[test]
    fn test_composition_table_keeps_order() {
        let config = SensorConfig {
            kmer_length: 1,
            min_sequence_length: 2,
            ..Default::default()
        };
        let exons: Vec<TrainingRecord> = (0..20)
            .map(|i| TrainingRecord::new(format!("e{}", i), "A".repeat(i + 2)))
            .collect();
        let introns = vec![TrainingRecord::new("i0", "CCCC"), TrainingRecord::new("i1", "G")];

        let table = composition_table(&exons, &introns, &config).unwrap();
        assert_eq!(table.columns(), &["A", "C", "G", "T"]);
        assert_eq!(table.count_label(POSITIVE_LABEL), 20);
        assert_eq!(table.count_label(NEGATIVE_LABEL), 1);
        assert_eq!(
            table.rows().last().map(|row| &row.values),
            Some(&FeatureValues::Fractions(vec![0.0, 1.0, 0.0, 0.0]))
        );
    }

    #[test]
    fn test_composition_vectors_sum_to_one() {
        let config = SensorConfig {
            kmer_length: 3,
            min_sequence_length: 3,
            frame_mode: FrameMode::Unrestricted,
            ..Default::default()
        };
        let sequence: String = (0..500)
            .map(|i| char::from(DNA_ALPHABET[(i * 7 + i / 3) % 4]))
            .collect();
        let table =
            composition_table(&[TrainingRecord::new("e", sequence)], &[], &config).unwrap();
        let FeatureValues::Fractions(values) = &table.rows()[0].values else {
            panic!("expected fractions");
        };
        let total: f64 = values.iter().sum();
        assert!((total - 1.0).abs() <= 0.0005 * 64.0);
    }
}
