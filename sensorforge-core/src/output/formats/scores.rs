use std::io::Write;

use crate::output::format_float;
use crate::types::{NEGATIVE_LABEL, POSITIVE_LABEL, SensorError};

/// Write one score per line
///
/// # Errors
///
/// Returns [`SensorError::Io`] if writing fails.
pub fn write_scores<W: Write>(writer: &mut W, scores: &[f64]) -> Result<(), SensorError> {
    let mut buffer = Vec::new();
    for &score in scores {
        writeln!(buffer, "{}", format_float(score))?;
    }
    writer.write_all(&buffer)?;
    Ok(())
}

/// Write `score\tlabel` lines, positives first, for ROC analysis
///
/// # Errors
///
/// Returns [`SensorError::Io`] if writing fails.
pub fn write_roc<W: Write>(
    writer: &mut W,
    positive_scores: &[f64],
    negative_scores: &[f64],
) -> Result<(), SensorError> {
    let mut buffer = Vec::new();
    for (scores, label) in [
        (positive_scores, POSITIVE_LABEL),
        (negative_scores, NEGATIVE_LABEL),
    ] {
        for &score in scores {
            writeln!(buffer, "{}\t{}", format_float(score), label)?;
        }
    }
    writer.write_all(&buffer)?;
    Ok(())
}
