use std::collections::HashMap;

use crate::constants::COMPOSITION_DECIMALS;
use crate::kmer::counter::KmerCountTable;
use crate::training::common::round_to_decimals;
use crate::types::SensorError;

/// Convert k-mer counts into a probability vector over `enumeration`.
///
/// The sample size is the total count over the enumerated k-mers only, so
/// frame-filtered tables and windows with ambiguous bases are normalized by
/// what was actually counted. Each fraction is rounded to 4 decimals, ties
/// to even.
///
/// # Errors
///
/// Returns [`SensorError::DivisionUndefined`] when none of the enumerated
/// k-mers was counted. Callers skip short sequences before this point.
///
/// # Examples
///
/// ```rust
/// use sensorforge_core::kmer::{counter::{FrameFilter, count_kmers}, ngram::enumerate_ngrams};
/// use sensorforge_core::kmer::composition::composition_vector;
///
/// let enumeration = enumerate_ngrams(b"ACGT", 1);
/// let counts = count_kmers(b"AACG", 1, FrameFilter::Unrestricted);
/// let vector = composition_vector(&counts, &enumeration)?;
/// assert_eq!(vector, vec![0.5, 0.25, 0.25, 0.0]);
/// # Ok::<(), sensorforge_core::types::SensorError>(())
/// ```
pub fn composition_vector(
    counts: &KmerCountTable,
    enumeration: &[String],
) -> Result<Vec<f64>, SensorError> {
    let sample_size: u64 = enumeration
        .iter()
        .map(|kmer| u64::from(counts.get(kmer)))
        .sum();
    if sample_size == 0 {
        return Err(SensorError::DivisionUndefined);
    }

    Ok(enumeration
        .iter()
        .map(|kmer| {
            let fraction = f64::from(counts.get(kmer)) / sample_size as f64;
            round_to_decimals(fraction, COMPOSITION_DECIMALS)
        })
        .collect())
}

/// Average weight of the k-mers in `sequence`.
///
/// Scores windows starting at `0..len - k`; the final window is not scored,
/// matching the weighting used for existing training sets.
///
/// # Errors
///
/// Returns [`SensorError::DegenerateInput`] if the sequence has no scored
/// window and [`SensorError::MalformedInput`] for a k-mer missing from
/// `weights`.
pub fn mean_kmer_score(
    sequence: &[u8],
    weights: &HashMap<String, f64>,
    k: usize,
) -> Result<f64, SensorError> {
    let scored = sequence.len().saturating_sub(k);
    if k == 0 || scored == 0 {
        return Err(SensorError::DegenerateInput(format!(
            "sequence of length {} has no {}-mers to score",
            sequence.len(),
            k
        )));
    }

    let mut sum = 0.0;
    for window in sequence.windows(k).take(scored) {
        let kmer = String::from_utf8_lossy(window);
        let weight = weights.get(kmer.as_ref()).ok_or_else(|| {
            SensorError::MalformedInput(format!("k-mer {} is not in the weight table", kmer))
        })?;
        sum += weight;
    }
    Ok(sum / scored as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DNA_ALPHABET;
    use crate::kmer::counter::{FrameFilter, count_kmers};
    use crate::kmer::ngram::enumerate_ngrams;

    const SEQUENCE: &[u8] = b"ATGGCGTACGTTAGCATCGATCGGATCAAGCTTGCATGCCAGTAGCTAGGATCCAT";

    #[test]
    fn test_vector_is_in_enumeration_order() {
        let enumeration = enumerate_ngrams(DNA_ALPHABET, 2);
        let counts = count_kmers(b"ACAC", 2, FrameFilter::Unrestricted);
        let vector = composition_vector(&counts, &enumeration).unwrap();

        assert_eq!(vector.len(), 16);
        // AC at index 1, CA at index 4
        assert_eq!(vector[1], 0.6667);
        assert_eq!(vector[4], 0.3333);
        assert_eq!(vector.iter().filter(|&&v| v > 0.0).count(), 2);
    }

    #[test]
    fn test_unrestricted_vector_sums_to_one() {
        let enumeration = enumerate_ngrams(DNA_ALPHABET, 6);
        let counts = count_kmers(SEQUENCE, 6, FrameFilter::Unrestricted);
        let vector = composition_vector(&counts, &enumeration).unwrap();

        let sum: f64 = vector.iter().sum();
        let tolerance = 0.0005 * enumeration.len() as f64;
        assert!((sum - 1.0).abs() <= tolerance, "sum was {}", sum);
    }

    #[test]
    fn test_sample_size_uses_filtered_counts() {
        let enumeration = enumerate_ngrams(DNA_ALPHABET, 1);
        // Out of frame from frame 0: positions 1, 2, 4, 5 -> C, G, A, C
        let counts = count_kmers(b"ACGTAC", 1, FrameFilter::OutOfFrame { frame: 0 });
        let vector = composition_vector(&counts, &enumeration).unwrap();
        assert_eq!(vector, vec![0.25, 0.5, 0.25, 0.0]);
    }

    #[test]
    fn test_ambiguous_kmers_do_not_count_toward_sample_size() {
        let enumeration = enumerate_ngrams(DNA_ALPHABET, 1);
        let counts = count_kmers(b"ANNC", 1, FrameFilter::Unrestricted);
        let vector = composition_vector(&counts, &enumeration).unwrap();
        assert_eq!(vector, vec![0.5, 0.5, 0.0, 0.0]);
    }

    #[test]
    fn test_rounding_to_four_decimals() {
        let enumeration = enumerate_ngrams(DNA_ALPHABET, 1);
        let counts = count_kmers(b"AAAAAAC", 1, FrameFilter::Unrestricted);
        let vector = composition_vector(&counts, &enumeration).unwrap();
        // 6/7 = 0.857142..., 1/7 = 0.142857...
        assert_eq!(vector[0], 0.8571);
        assert_eq!(vector[1], 0.1429);
    }

    #[test]
    fn test_empty_counts_are_undefined() {
        let enumeration = enumerate_ngrams(DNA_ALPHABET, 6);
        let counts = count_kmers(b"ACG", 6, FrameFilter::Unrestricted);
        assert!(matches!(
            composition_vector(&counts, &enumeration),
            Err(SensorError::DivisionUndefined)
        ));
    }

    #[test]
    fn test_mean_kmer_score_skips_last_window() {
        let weights: HashMap<String, f64> = enumerate_ngrams(DNA_ALPHABET, 2)
            .into_iter()
            .map(|kmer| {
                let weight = if kmer == "AC" { 1.0 } else { 0.0 };
                (kmer, weight)
            })
            .collect();
        // Windows AC, CA, AC (last one not scored): (1 + 0) / 2
        let score = mean_kmer_score(b"ACAC", &weights, 2).unwrap();
        assert!((score - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_mean_kmer_score_errors() {
        let weights: HashMap<String, f64> = HashMap::new();
        assert!(matches!(
            mean_kmer_score(b"AC", &weights, 2),
            Err(SensorError::DegenerateInput(_))
        ));
        assert!(matches!(
            mean_kmer_score(b"ACGT", &weights, 2),
            Err(SensorError::MalformedInput(_))
        ));
    }
}
