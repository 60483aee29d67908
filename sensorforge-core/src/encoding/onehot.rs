use std::collections::HashMap;

use crate::constants::POSITIONAL_PSEUDOCOUNT;
use crate::types::{SensorError, TrainingRecord, WindowGeometry};

/// Column names for a one-hot window.
///
/// One name per position and symbol, `<offset><symbol>` with the offset
/// relative to `begin`; outer loop over positions, inner loop over the
/// alphabet. [`one_hot_row`] emits values in the same order.
///
/// # Examples
///
/// ```rust
/// use sensorforge_core::encoding::onehot::one_hot_header;
///
/// assert_eq!(one_hot_header(10, 12, b"AC"), vec!["0A", "0C", "1A", "1C"]);
/// ```
#[must_use]
pub fn one_hot_header(begin: usize, end: usize, alphabet: &[u8]) -> Vec<String> {
    (begin..end)
        .flat_map(|position| {
            alphabet
                .iter()
                .map(move |&symbol| format!("{}{}", position - begin, char::from(symbol)))
        })
        .collect()
}

/// One-hot indicators for `sequence[begin..end]`.
///
/// Each position contributes `alphabet.len()` values, exactly one of which
/// is 1.
///
/// # Errors
///
/// Returns [`SensorError::MalformedInput`] if the window runs past the end
/// of the sequence or covers a symbol outside the alphabet.
pub fn one_hot_row(
    sequence: &[u8],
    begin: usize,
    end: usize,
    alphabet: &[u8],
) -> Result<Vec<u8>, SensorError> {
    let window = sequence.get(begin..end).ok_or_else(|| {
        SensorError::MalformedInput(format!(
            "window {}..{} does not fit a sequence of length {}",
            begin,
            end,
            sequence.len()
        ))
    })?;

    let mut row = Vec::with_capacity(window.len() * alphabet.len());
    for (offset, &nucleotide) in window.iter().enumerate() {
        if !alphabet.contains(&nucleotide) {
            return Err(SensorError::MalformedInput(format!(
                "symbol '{}' at window offset {} is not in the alphabet",
                char::from(nucleotide),
                offset
            )));
        }
        row.extend(alphabet.iter().map(|&symbol| u8::from(symbol == nucleotide)));
    }
    Ok(row)
}

/// Whether a training sequence carries one of the accepted consensus strings.
///
/// An empty list accepts every sequence long enough to hold a consensus.
#[must_use]
pub fn has_accepted_consensus(
    sequence: &[u8],
    geometry: &WindowGeometry,
    consensuses: &[String],
) -> bool {
    match geometry.consensus_of(sequence) {
        Some(consensus) => {
            consensuses.is_empty()
                || consensuses
                    .iter()
                    .any(|accepted| accepted.as_bytes() == consensus)
        }
        None => false,
    }
}

/// Per-position log nucleotide frequencies of the accepted examples.
///
/// Keys follow the one-hot header names. Position/symbol pairs that never
/// occur get a pseudocount of 0.1 before normalizing each position.
///
/// # Errors
///
/// Returns [`SensorError::MalformedInput`] if an accepted example is too
/// short for the window.
pub fn positional_log_frequencies(
    examples: &[TrainingRecord],
    geometry: &WindowGeometry,
    consensuses: &[String],
    alphabet: &[u8],
) -> Result<HashMap<String, f64>, SensorError> {
    let (begin, end) = (geometry.begin(), geometry.end());
    let mut counts: HashMap<(usize, u8), f64> = HashMap::new();

    for example in examples
        .iter()
        .filter(|example| has_accepted_consensus(&example.sequence, geometry, consensuses))
    {
        let window = example.sequence.get(begin..end).ok_or_else(|| {
            SensorError::MalformedInput(format!(
                "{}: sequence of length {} is too short for window {}..{}",
                example.identifier,
                example.sequence.len(),
                begin,
                end
            ))
        })?;
        for (offset, &nucleotide) in window.iter().enumerate() {
            *counts.entry((offset, nucleotide)).or_insert(0.0) += 1.0;
        }
    }

    let count_of = |offset: usize, symbol: u8| {
        counts
            .get(&(offset, symbol))
            .copied()
            .unwrap_or(POSITIONAL_PSEUDOCOUNT)
    };

    let mut frequencies = HashMap::new();
    for offset in 0..geometry.window_length() {
        let total: f64 = alphabet.iter().map(|&symbol| count_of(offset, symbol)).sum();
        for &symbol in alphabet {
            let key = format!("{}{}", offset, char::from(symbol));
            frequencies.insert(key, (count_of(offset, symbol) / total).ln());
        }
    }
    Ok(frequencies)
}
