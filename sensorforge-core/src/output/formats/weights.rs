use std::io::Write;

use crate::output::{composition_weights, format_float};
use crate::training::coefficients::CoefficientSet;
use crate::types::SensorError;

/// Write positive and negative k-mer weight tables.
///
/// Weights are optionally scaled by the largest absolute weight, then
/// written as `kmer\texp(weight)` to `positive` and `kmer\texp(-weight)` to
/// `negative`, in input order. The intercept is skipped.
///
/// # Errors
///
/// - [`SensorError::DegenerateInput`] if there are no k-mer weights
/// - [`SensorError::MalformedInput`] if the k-mers differ in length
/// - [`SensorError::Io`] if writing fails
pub fn write_weight_tables<P: Write, N: Write>(
    coefficients: &CoefficientSet,
    normalize: bool,
    positive: &mut P,
    negative: &mut N,
) -> Result<(), SensorError> {
    let (_, weights) = composition_weights(coefficients, 1.0, normalize)?;

    let mut positive_table = Vec::new();
    let mut negative_table = Vec::new();
    for (kmer, weight) in &weights {
        writeln!(positive_table, "{}\t{}", kmer, format_float(weight.exp()))?;
        writeln!(negative_table, "{}\t{}", kmer, format_float((-weight).exp()))?;
    }

    positive.write_all(&positive_table)?;
    negative.write_all(&negative_table)?;
    Ok(())
}
