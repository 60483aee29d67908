//! # sensorforge
//!
//! Training inputs and model files for gene-structure sensors: splice-site
//! signal models and exon/intron content models consumed by a downstream
//! gene finder.
//!
//! ## Overview
//!
//! Sensors are trained from extracted sequence windows. Signal sensors
//! (donor, acceptor, start, stop, ...) use positional one-hot features fitted
//! by logistic regression and calibrated to a target sensitivity. Content
//! sensors (exon, intron) use k-mer composition features whose fitted weights
//! are exported as an interpolated Markov model.
//!
//! ## Features
//!
//! - **k-mer counting**: canonical enumeration order, frame-aware counting
//! - **Composition vectors**: rounded k-mer fractions, built in parallel
//! - **One-hot windows**: feature rows and their lockstep column header
//! - **Threshold calibration**: rank-based, at a target sensitivity
//! - **Model files**: `LogisticSensor` and `IMM`, each with its
//!   reverse-strand mirror
//!
//! ## Quick Start
//!
//! ```rust
//! use sensorforge_core::output::write_imm;
//! use sensorforge_core::training::CoefficientSet;
//! use sensorforge_core::types::SignalType;
//!
//! let mut weights = CoefficientSet::new();
//! weights.push("AC", 1.0);
//! weights.push("GT", -2.0);
//!
//! let mut model = Vec::new();
//! write_imm(&mut model, &weights, SignalType::Exon, true)?;
//! assert!(String::from_utf8(model)?.starts_with("IMM\nSINGLE-EXON\n1\t-1\n2\n"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! Positional sensors go through a type-state trainer, so a model can't be
//! calibrated before it is fitted:
//!
//! ```rust,no_run
//! use sensorforge_core::engine::UntrainedSensor;
//! use sensorforge_core::sequence::read_training_records;
//! use sensorforge_core::training::ExternalFitter;
//! use sensorforge_core::types::{SignalType, WindowGeometry};
//!
//! let positives = read_training_records("donors.fasta")?;
//! let negatives = read_training_records("decoys.fasta")?;
//!
//! let trainer = UntrainedSensor::new(SignalType::Donor, WindowGeometry::splice_site(20, 6))?
//!     .with_consensuses(vec!["GT".to_string(), "GC".to_string()]);
//! let fitter = ExternalFitter::new("logistic-regression.R").header_lines(2);
//!
//! let fitted = trainer.fit(&fitter, &positives, &negatives)?;
//! let model = fitted.calibrate(&positives)?;
//! println!("threshold {}", model.threshold);
//! # Ok::<(), sensorforge_core::types::SensorError>(())
//! ```
//!
//! ## Module Organization
//!
//! - [`config`]: Configuration options
//! - [`constants`]: Alphabet, defaults and file-format constants
//! - [`engine`]: Type-state sensor trainer and the composition pipeline
//! - [`types`]: Core data types and the error type
//! - [`results`]: Calibrated models
//! - [`kmer`]: k-mer enumeration, counting and composition vectors
//! - [`encoding`]: Positional one-hot encoding
//! - [`sequence`]: FASTA input and defline attributes
//! - [`training`]: Fitting, coefficient loading, scoring and calibration
//! - [`output`]: Model, table and score writers
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T, SensorError>`](types::SensorError),
//! covering:
//!
//! - Malformed input (coefficient lines, feature names, sequence windows)
//! - Degenerate input (no positives, no counted k-mers)
//! - Unknown signal types and invalid configuration
//! - I/O, FASTA and external solver failures

pub mod config;
pub mod constants;
pub mod encoding;
pub mod engine;
pub mod kmer;
pub mod output;
pub mod results;
pub mod sequence;
pub mod training;
pub mod types;

pub use engine::{FittedSensor, UntrainedSensor, composition_table};
pub use types::SensorError;
