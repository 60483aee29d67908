use std::io::Write;

use crate::output::format_float;
use crate::types::{FeatureTable, FeatureValues, SensorError};

/// Write a feature table in the solver's tab-separated layout.
///
/// A `category` header followed by the column names, then one line per row
/// with the label first. Indicators are written as `0`/`1`, fractions in
/// shortest float form.
///
/// # Errors
///
/// Returns [`SensorError::Io`] if writing fails.
pub fn write_feature_table<W: Write>(
    table: &FeatureTable,
    writer: &mut W,
) -> Result<(), SensorError> {
    let mut buffer = Vec::new();
    write!(buffer, "category")?;
    for column in table.columns() {
        write!(buffer, "\t{}", column)?;
    }
    writeln!(buffer)?;

    for row in table.rows() {
        write!(buffer, "{}", row.label)?;
        match &row.values {
            FeatureValues::Indicators(values) => {
                for value in values {
                    write!(buffer, "\t{}", value)?;
                }
            }
            FeatureValues::Fractions(values) => {
                for &value in values {
                    write!(buffer, "\t{}", format_float(value))?;
                }
            }
        }
        writeln!(buffer)?;
    }

    writer.write_all(&buffer)?;
    Ok(())
}
