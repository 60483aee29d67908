use std::io::Write;

use bio::alphabets::dna;
use bio::bio_types::strand::Strand;

use crate::constants::{LOGISTIC_SENSOR_KIND, SENSOR_ALPHABET_SIZE, WEIGHT_DIVISOR};
use crate::output::format_float;
use crate::results::CalibratedModel;
use crate::training::coefficients::ParsedFeature;
use crate::types::SensorError;

/// Write a calibrated model as a forward and a reverse-strand `LogisticSensor`.
///
/// The reverse block carries the negative-strand tag and complements every
/// feature symbol; positions and weights are shared. Weights are halved once
/// per record.
///
/// # Errors
///
/// Returns [`SensorError::FeatureNameParse`] if a coefficient is not a
/// positional feature, or [`SensorError::Io`] if writing fails. Nothing is
/// written on error.
pub fn write_logistic_sensor<W: Write>(
    writer: &mut W,
    model: &CalibratedModel,
) -> Result<(), SensorError> {
    let mut buffer = Vec::new();
    render_block(&mut buffer, model, Strand::Forward)?;
    render_block(&mut buffer, model, Strand::Reverse)?;
    writer.write_all(&buffer)?;
    Ok(())
}

fn render_block(
    out: &mut Vec<u8>,
    model: &CalibratedModel,
    strand: Strand,
) -> Result<(), SensorError> {
    let geometry = &model.geometry;
    let window_length = geometry.window_length();
    let strand_marker = match strand {
        Strand::Reverse => '-',
        _ => '+',
    };

    writeln!(out, "{}", LOGISTIC_SENSOR_KIND)?;
    writeln!(
        out,
        "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
        model.signal_type.tag_for(strand),
        format_float(model.threshold),
        window_length,
        SENSOR_ALPHABET_SIZE,
        window_length,
        geometry.consensus_offset(),
        geometry.consensus_length,
        strand_marker
    )?;
    writeln!(out, "{}", model.coefficients.len())?;

    for coefficient in model.coefficients.iter() {
        let weight = format_float(coefficient.weight / WEIGHT_DIVISOR);
        match coefficient.parse()? {
            ParsedFeature::Intercept => {
                writeln!(out, "{}\t{}", coefficient.name, weight)?;
            }
            ParsedFeature::Position { position, symbol } => {
                let symbol = match strand {
                    Strand::Reverse => mirror_symbol(symbol)?,
                    _ => symbol.to_string(),
                };
                writeln!(out, "{}\t{}\t{}", position, symbol, weight)?;
            }
        }
    }
    writeln!(out)?;
    Ok(())
}

// Reverse complement; for a single base this is the plain complement.
fn mirror_symbol(symbol: &str) -> Result<String, SensorError> {
    String::from_utf8(dna::revcomp(symbol.as_bytes()))
        .map_err(|_| SensorError::MalformedInput(format!("can't complement symbol {}", symbol)))
}
