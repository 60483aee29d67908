use std::fs::File;
use std::io::Read;
use std::path::Path;

use bio::io::fasta;

use crate::types::{Attributes, SensorError, TrainingRecord};

/// Read every record of a FASTA file as a training example.
///
/// Defline attributes (`>id /frame=1 /strand=+`) are parsed into the
/// record's attribute map.
///
/// # Errors
///
/// Returns [`SensorError::Io`] if the file can't be opened and
/// [`SensorError::Fasta`] if a record can't be parsed.
pub fn read_training_records<P: AsRef<Path>>(path: P) -> Result<Vec<TrainingRecord>, SensorError> {
    let file = File::open(path)?;
    read_training_records_from(file)
}

/// Read training examples from any FASTA source
///
/// # Errors
///
/// See [`read_training_records`].
pub fn read_training_records_from<R: Read>(source: R) -> Result<Vec<TrainingRecord>, SensorError> {
    let reader = fasta::Reader::new(source);
    let mut records = Vec::new();

    for result in reader.records() {
        let record = result.map_err(|e| SensorError::Fasta(e.to_string()))?;
        records.push(TrainingRecord {
            identifier: record.id().to_string(),
            attributes: record.desc().map(parse_defline_attributes).unwrap_or_default(),
            sequence: record.seq().to_vec(),
        });
    }

    Ok(records)
}

/// Parse the `/key=value` pairs of a defline description.
///
/// Tokens that are not of that form are ignored. A repeated key keeps its
/// last value.
///
/// # Examples
///
/// ```rust
/// use sensorforge_core::sequence::io::parse_defline_attributes;
///
/// let attributes = parse_defline_attributes("/frame=2 partial /gene=ENSG01");
/// assert_eq!(attributes["frame"], "2");
/// assert_eq!(attributes["gene"], "ENSG01");
/// assert_eq!(attributes.len(), 2);
/// ```
#[must_use]
pub fn parse_defline_attributes(description: &str) -> Attributes {
    description
        .split_whitespace()
        .filter_map(|token| token.strip_prefix('/')?.split_once('='))
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}
