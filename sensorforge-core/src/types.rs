use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use bio::bio_types::strand::Strand;
use thiserror::Error;

use crate::constants::{DEFAULT_CONSENSUS_LENGTH, DEFAULT_CONSENSUS_POSITION};

/// Per-sequence attributes parsed from a FASTA defline (`/key=value` pairs).
pub type Attributes = HashMap<String, String>;

/// Class label for a training example: 1 for positives, 0 for negatives.
pub type Label = u8;

/// Label written for positive examples (true sites, exons).
pub const POSITIVE_LABEL: Label = 1;

/// Label written for negative examples (decoys, introns).
pub const NEGATIVE_LABEL: Label = 0;

/// Signal or content type a sensor model is built for.
///
/// Each type has a forward-strand tag and a negative-strand tag, which are
/// the strings the downstream sensor loader expects in a model header.
///
/// # Examples
///
/// ```rust
/// use sensorforge_core::types::SignalType;
///
/// let exon: SignalType = "EXON".parse()?;
/// assert_eq!(exon.forward_tag(), "SINGLE-EXON");
/// assert_eq!(exon.reverse_tag(), "NEG-SINGLE-EXON");
///
/// let donor: SignalType = "donor".parse()?;
/// assert_eq!(donor.reverse_tag(), "-GT");
/// # Ok::<(), sensorforge_core::types::SensorError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalType {
    /// Splice donor (GT)
    Donor,
    /// Splice acceptor (AG)
    Acceptor,
    /// Start codon (ATG)
    StartCodon,
    /// Stop codon (TAG, TAA, TGA)
    StopCodon,
    /// Transcription start site
    Tss,
    /// Transcription end site
    Tes,
    /// Exon content (written as single-exon content)
    Exon,
    /// Intron content
    Intron,
    /// Intergenic content (strand-symmetric, one tag for both strands)
    Intergenic,
}

impl SignalType {
    /// Tag written in forward-strand model headers
    #[must_use]
    pub const fn forward_tag(self) -> &'static str {
        match self {
            Self::Donor => "GT",
            Self::Acceptor => "AG",
            Self::StartCodon => "ATG",
            Self::StopCodon => "TAG",
            Self::Tss => "TSS",
            Self::Tes => "TES",
            Self::Exon => "SINGLE-EXON",
            Self::Intron => "INTRON",
            Self::Intergenic => "INTERGENIC",
        }
    }

    /// Tag written in reverse-complement model headers
    #[must_use]
    pub const fn reverse_tag(self) -> &'static str {
        match self {
            Self::Donor => "-GT",
            Self::Acceptor => "-AG",
            Self::StartCodon => "-ATG",
            Self::StopCodon => "-TAG",
            Self::Tss => "-TSS",
            Self::Tes => "-TES",
            Self::Exon => "NEG-SINGLE-EXON",
            Self::Intron => "NEG-INTRON",
            Self::Intergenic => "INTERGENIC",
        }
    }

    /// Header tag for the given strand.
    ///
    /// Anything other than [`Strand::Reverse`] gets the forward tag.
    #[must_use]
    pub const fn tag_for(self, strand: Strand) -> &'static str {
        match strand {
            Strand::Reverse => self.reverse_tag(),
            _ => self.forward_tag(),
        }
    }

    /// Whether this is a content type (usable for IMM export)
    #[must_use]
    pub const fn is_content(self) -> bool {
        matches!(self, Self::Exon | Self::Intron | Self::Intergenic)
    }

    /// Sign applied to composition weights when exporting an IMM.
    ///
    /// Exon weights are written as-is, intron weights are negated. Signal
    /// types and intergenic content (not a fitted class) have no
    /// composition sign.
    #[must_use]
    pub const fn composition_sign(self) -> Option<f64> {
        match self {
            Self::Exon => Some(1.0),
            Self::Intron => Some(-1.0),
            _ => None,
        }
    }
}

impl FromStr for SignalType {
    type Err = SensorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GT" | "donor" => Ok(Self::Donor),
            "AG" | "acceptor" => Ok(Self::Acceptor),
            "ATG" | "start-codon" => Ok(Self::StartCodon),
            "TAG" | "stop-codon" => Ok(Self::StopCodon),
            "TSS" | "transcription-start-site" => Ok(Self::Tss),
            "TES" | "transcription-end-site" => Ok(Self::Tes),
            "EXON" | "SINGLE-EXON" | "exon" => Ok(Self::Exon),
            "INTRON" | "intron" => Ok(Self::Intron),
            "INTERGENIC" | "intergenic" => Ok(Self::Intergenic),
            other => Err(SensorError::UnknownSignalType(other.to_string())),
        }
    }
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.forward_tag())
    }
}

/// Geometry of an extracted signal window.
///
/// Training windows are extracted with the consensus (e.g. the `GT` of a
/// donor) at a fixed position. The model covers `left_margin` bases before
/// the consensus, the consensus itself, and `right_margin` bases after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowGeometry {
    /// Index of the first consensus base in each extracted sequence
    pub consensus_position: usize,
    /// Length of the consensus (2 for splice sites)
    pub consensus_length: usize,
    /// Bases modelled upstream of the consensus
    pub left_margin: usize,
    /// Bases modelled downstream of the consensus
    pub right_margin: usize,
}

impl WindowGeometry {
    /// Splice-site geometry: consensus of length 2 at position 80.
    #[must_use]
    pub const fn splice_site(left_margin: usize, right_margin: usize) -> Self {
        Self {
            consensus_position: DEFAULT_CONSENSUS_POSITION,
            consensus_length: DEFAULT_CONSENSUS_LENGTH,
            left_margin,
            right_margin,
        }
    }

    /// First sequence index covered by the model window
    #[must_use]
    pub const fn begin(&self) -> usize {
        self.consensus_position - self.left_margin
    }

    /// One past the last sequence index covered by the model window
    #[must_use]
    pub const fn end(&self) -> usize {
        self.consensus_position + self.consensus_length + self.right_margin
    }

    /// Total number of positions in the model window
    #[must_use]
    pub const fn window_length(&self) -> usize {
        self.left_margin + self.consensus_length + self.right_margin
    }

    /// Offset of the consensus within the model window
    #[must_use]
    pub const fn consensus_offset(&self) -> usize {
        self.left_margin
    }

    /// Consensus string of a training sequence, if the sequence is long enough
    #[must_use]
    pub fn consensus_of<'a>(&self, sequence: &'a [u8]) -> Option<&'a [u8]> {
        sequence.get(self.consensus_position..self.consensus_position + self.consensus_length)
    }

    /// Check that the window does not start before the sequence does.
    ///
    /// # Errors
    ///
    /// Returns [`SensorError::InvalidConfig`] if the left margin reaches past
    /// the start of the extracted sequence or the consensus is empty.
    pub fn validate(&self) -> Result<(), SensorError> {
        if self.left_margin > self.consensus_position {
            return Err(SensorError::InvalidConfig(format!(
                "left margin {} exceeds consensus position {}",
                self.left_margin, self.consensus_position
            )));
        }
        if self.consensus_length == 0 {
            return Err(SensorError::InvalidConfig(
                "consensus length must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for WindowGeometry {
    fn default() -> Self {
        Self::splice_site(0, 0)
    }
}

/// A training example as handed over by the sequence reader
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrainingRecord {
    /// Sequence identifier from the defline
    pub identifier: String,
    /// Defline attributes (`frame`, `strand`, gene/transcript ids, ...)
    pub attributes: Attributes,
    /// Raw sequence bytes
    pub sequence: Vec<u8>,
}

impl TrainingRecord {
    /// Create a record without attributes
    #[must_use]
    pub fn new(identifier: impl Into<String>, sequence: impl Into<Vec<u8>>) -> Self {
        Self {
            identifier: identifier.into(),
            attributes: Attributes::new(),
            sequence: sequence.into(),
        }
    }

    /// Add a defline attribute
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Reading frame of the first base, if the defline carries one.
    ///
    /// # Errors
    ///
    /// Returns [`SensorError::MalformedInput`] if the `frame` attribute is
    /// not an integer.
    pub fn frame(&self) -> Result<Option<u8>, SensorError> {
        self.attributes
            .get("frame")
            .map(|value| {
                value
                    .trim()
                    .parse::<i64>()
                    .map(|frame| frame.rem_euclid(3) as u8)
                    .map_err(|_| {
                        SensorError::MalformedInput(format!(
                            "{}: frame attribute \"{}\" is not an integer",
                            self.identifier, value
                        ))
                    })
            })
            .transpose()
    }
}

/// Values of one feature row
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureValues {
    /// One-hot indicators (written as `0`/`1`)
    Indicators(Vec<u8>),
    /// Composition fractions
    Fractions(Vec<f64>),
}

impl FeatureValues {
    /// Number of feature columns in the row
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Indicators(values) => values.len(),
            Self::Fractions(values) => values.len(),
        }
    }

    /// Whether the row has no feature columns
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A labelled feature row
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    /// Class label
    pub label: Label,
    /// Feature values in column order
    pub values: FeatureValues,
}

/// Feature table handed to the regression solver.
///
/// The column names and every row share the same width and order; rows that
/// do not match the header are rejected on insertion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureTable {
    columns: Vec<String>,
    rows: Vec<FeatureRow>,
}

impl FeatureTable {
    /// Create an empty table with the given column names
    #[must_use]
    pub const fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row.
    ///
    /// # Errors
    ///
    /// Returns [`SensorError::MalformedInput`] if the row width differs from
    /// the header width.
    pub fn push(&mut self, row: FeatureRow) -> Result<(), SensorError> {
        if row.values.len() != self.columns.len() {
            return Err(SensorError::MalformedInput(format!(
                "feature row has {} values but the header has {} columns",
                row.values.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Column names, without the leading `category` column
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows in insertion order
    #[must_use]
    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    /// Number of rows with the given label
    #[must_use]
    pub fn count_label(&self, label: Label) -> usize {
        self.rows.iter().filter(|row| row.label == label).count()
    }
}

/// Error types raised while building sensor training data and models
#[derive(Error, Debug)]
pub enum SensorError {
    /// Unparsable input (coefficient line, score, sequence window)
    #[error("Malformed input: {0}")]
    MalformedInput(String),
    /// Feature name that is neither `<int><symbol>` nor the intercept
    #[error("Can't parse feature name: {0}")]
    FeatureNameParse(String),
    /// Composition vector requested for a table with no enumerated k-mers
    #[error("Division undefined: no k-mers were counted")]
    DivisionUndefined,
    /// Input that must be filtered upstream (e.g. no positive examples)
    #[error("Degenerate input: {0}")]
    DegenerateInput(String),
    /// Unknown signal or content type argument
    #[error("Unknown signal type: {0} (expected GT, AG, ATG, TAG, TSS, TES, EXON, INTRON or INTERGENIC)")]
    UnknownSignalType(String),
    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    /// Error reading FASTA input
    #[error("FASTA error: {0}")]
    Fasta(String),
    /// External regression solver failed
    #[error("Regression solver failed: {0}")]
    SolverFailed(String),
    /// File I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
