use std::collections::HashMap;

use crate::constants::READING_FRAMES;

/// Which scan positions contribute to a k-mer count.
///
/// The frame filters keep a counter that starts at `frame` and advances by
/// one (mod 3) for every scanned position, independent of k. For k > 1 this
/// is not the frame of the k-mer's first codon; models trained downstream
/// depend on exactly this behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameFilter {
    /// Count every window
    #[default]
    Unrestricted,
    /// Count windows where the frame counter is 0
    InFrame {
        /// Frame of the first scanned position
        frame: u8,
    },
    /// Count windows where the frame counter is 1 or 2
    OutOfFrame {
        /// Frame of the first scanned position
        frame: u8,
    },
}

impl FrameFilter {
    fn initial_frame(self) -> u8 {
        match self {
            Self::Unrestricted => 0,
            Self::InFrame { frame } | Self::OutOfFrame { frame } => frame % READING_FRAMES,
        }
    }

    fn accepts(self, frame: u8) -> bool {
        match self {
            Self::Unrestricted => true,
            Self::InFrame { .. } => frame == 0,
            Self::OutOfFrame { .. } => frame != 0,
        }
    }
}

/// Counts of k-mers observed in one sequence.
///
/// Windows containing symbols outside the alphabet are recorded like any
/// other window; they simply never match an enumerated k-mer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KmerCountTable {
    counts: HashMap<String, u32>,
}

impl KmerCountTable {
    /// Count for a k-mer (0 if never seen)
    #[must_use]
    pub fn get(&self, kmer: &str) -> u32 {
        self.counts.get(kmer).copied().unwrap_or(0)
    }

    /// Number of distinct k-mers seen
    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Whether no k-mer was counted
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts, including k-mers outside the alphabet
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.values().map(|&count| u64::from(count)).sum()
    }

    /// Iterate over `(kmer, count)` pairs in arbitrary order
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.counts.iter().map(|(kmer, &count)| (kmer.as_str(), count))
    }

    fn increment(&mut self, kmer: &[u8]) {
        let key = String::from_utf8_lossy(kmer).into_owned();
        *self.counts.entry(key).or_insert(0) += 1;
    }
}

/// Count length-`k` substrings of `sequence`.
///
/// Scans every start position `0..=len - k`, so the last window counted is
/// `sequence[len - k..]`. Sequences shorter than `k` (and `k == 0`) give an
/// empty table.
///
/// # Examples
///
/// ```rust
/// use sensorforge_core::kmer::counter::{FrameFilter, count_kmers};
///
/// let table = count_kmers(b"ACGTACGT", 6, FrameFilter::Unrestricted);
/// assert_eq!(table.len(), 3);
/// assert_eq!(table.get("CGTACG"), 1);
///
/// // Frame counter 1, 2, 0: only the third window is in frame.
/// let in_frame = count_kmers(b"ACGTACGT", 6, FrameFilter::InFrame { frame: 1 });
/// assert_eq!(in_frame.get("GTACGT"), 1);
/// assert_eq!(in_frame.total(), 1);
/// ```
#[must_use]
pub fn count_kmers(sequence: &[u8], k: usize, filter: FrameFilter) -> KmerCountTable {
    let mut table = KmerCountTable::default();
    if k == 0 || sequence.len() < k {
        return table;
    }

    let mut frame = filter.initial_frame();
    for window in sequence.windows(k) {
        if filter.accepts(frame) {
            table.increment(window);
        }
        frame = (frame + 1) % READING_FRAMES;
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unrestricted_counts() {
        let table = count_kmers(b"ACGTACGT", 6, FrameFilter::Unrestricted);
        assert_eq!(table.len(), 3);
        assert_eq!(table.get("ACGTAC"), 1);
        assert_eq!(table.get("CGTACG"), 1);
        assert_eq!(table.get("GTACGT"), 1);
        assert_eq!(table.total(), 3);
    }

    #[test]
    fn test_last_window_is_counted() {
        let table = count_kmers(b"AAAAC", 2, FrameFilter::Unrestricted);
        assert_eq!(table.get("AA"), 3);
        assert_eq!(table.get("AC"), 1);
    }

    #[test]
    fn test_repeated_kmers() {
        let table = count_kmers(b"AAAAAAAA", 6, FrameFilter::Unrestricted);
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("AAAAAA"), 3);
    }

    #[test]
    fn test_short_sequence_is_empty() {
        for sequence in [&b""[..], &b"A"[..], &b"ACGTA"[..]] {
            let table = count_kmers(sequence, 6, FrameFilter::Unrestricted);
            assert!(table.is_empty());
            let table = count_kmers(sequence, 6, FrameFilter::OutOfFrame { frame: 0 });
            assert!(table.is_empty());
        }
    }

    #[test]
    fn test_zero_length_kmer_is_empty() {
        assert!(count_kmers(b"ACGT", 0, FrameFilter::Unrestricted).is_empty());
    }

    #[test]
    fn test_in_frame_from_zero() {
        // Positions 0, 3, 6 are in frame
        let table = count_kmers(b"ACGTTGCAA", 1, FrameFilter::InFrame { frame: 0 });
        assert_eq!(table.total(), 3);
        assert_eq!(table.get("A"), 1);
        assert_eq!(table.get("T"), 1);
        assert_eq!(table.get("C"), 1);
        assert_eq!(table.get("G"), 0);
    }

    #[test]
    fn test_out_of_frame_from_zero() {
        let table = count_kmers(b"ACGTTGCAA", 1, FrameFilter::OutOfFrame { frame: 0 });
        assert_eq!(table.total(), 6);
        assert_eq!(table.get("C"), 1);
        assert_eq!(table.get("G"), 2);
        assert_eq!(table.get("A"), 2);
    }

    #[test]
    fn test_frame_advances_per_position_regardless_of_k() {
        // 12 windows of length 3 from a 14-mer; in frame at scan index 1, 4, 7, 10
        let sequence = b"AACGTTTGCAGGCA";
        let table = count_kmers(sequence, 3, FrameFilter::InFrame { frame: 2 });
        assert_eq!(table.total(), 4);
        assert_eq!(table.get("ACG"), 1);
        assert_eq!(table.get("TTT"), 1);
        assert_eq!(table.get("GCA"), 1);
        assert_eq!(table.get("GGC"), 1);
    }

    #[test]
    fn test_in_and_out_of_frame_partition_the_windows() {
        let sequence = b"ATGGCGTACGTTAGCATCGATCGGATCAAGCT";
        for frame in 0..3 {
            let all = count_kmers(sequence, 6, FrameFilter::Unrestricted);
            let in_frame = count_kmers(sequence, 6, FrameFilter::InFrame { frame });
            let out_of_frame = count_kmers(sequence, 6, FrameFilter::OutOfFrame { frame });
            assert_eq!(all.total(), in_frame.total() + out_of_frame.total());
            for (kmer, count) in all.iter() {
                assert_eq!(count, in_frame.get(kmer) + out_of_frame.get(kmer));
            }
        }
    }

    #[test]
    fn test_frame_is_reduced_modulo_three() {
        let a = count_kmers(b"ACGTACGTAC", 2, FrameFilter::InFrame { frame: 4 });
        let b = count_kmers(b"ACGTACGTAC", 2, FrameFilter::InFrame { frame: 1 });
        assert_eq!(a, b);
    }

    #[test]
    fn test_non_alphabet_windows_are_recorded() {
        let table = count_kmers(b"ACNGT", 2, FrameFilter::Unrestricted);
        assert_eq!(table.get("CN"), 1);
        assert_eq!(table.get("NG"), 1);
        assert_eq!(table.total(), 4);
    }
}
