/// Enumerates every string of a fixed length over an alphabet.
///
/// Strings come out in odometer order: the rightmost position changes
/// fastest and carries into the position to its left on overflow, so the
/// sequence is increasing when each position is read as a base-`|alphabet|`
/// digit. This order is the column order of every composition vector and
/// model table.
///
/// # Examples
///
/// ```rust
/// use sensorforge_core::kmer::ngram::NgramIterator;
///
/// let mut iter = NgramIterator::new(b"AC", 2);
/// assert_eq!(iter.next_string().as_deref(), Some("AA"));
/// assert_eq!(iter.next_string().as_deref(), Some("AC"));
/// assert_eq!(iter.next_string().as_deref(), Some("CA"));
/// assert_eq!(iter.next_string().as_deref(), Some("CC"));
/// assert_eq!(iter.next_string(), None);
/// ```
#[derive(Debug, Clone)]
pub struct NgramIterator<'a> {
    alphabet: &'a [u8],
    digits: Vec<usize>,
    done: bool,
}

impl<'a> NgramIterator<'a> {
    /// Start a new enumeration of length-`length` strings over `alphabet`
    #[must_use]
    pub fn new(alphabet: &'a [u8], length: usize) -> Self {
        Self {
            alphabet,
            digits: vec![0; length],
            done: alphabet.is_empty() && length > 0,
        }
    }

    /// Restart from the first string
    pub fn reset(&mut self) {
        self.digits.fill(0);
        self.done = self.alphabet.is_empty() && !self.digits.is_empty();
    }

    /// Number of strings a full enumeration produces (`|alphabet|^length`)
    #[must_use]
    pub fn total(&self) -> usize {
        self.alphabet.len().pow(self.digits.len() as u32)
    }

    /// Next string, or `None` once every string has been produced
    pub fn next_string(&mut self) -> Option<String> {
        if self.done {
            return None;
        }
        let current = self
            .digits
            .iter()
            .map(|&digit| char::from(self.alphabet[digit]))
            .collect();

        self.done = !self.increment();
        Some(current)
    }

    // Advance the odometer; false once it wraps past the last string.
    fn increment(&mut self) -> bool {
        for digit in self.digits.iter_mut().rev() {
            *digit += 1;
            if *digit < self.alphabet.len() {
                return true;
            }
            *digit = 0;
        }
        false
    }
}

impl Iterator for NgramIterator<'_> {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_string()
    }
}

/// Collect a full enumeration into a vector
#[must_use]
pub fn enumerate_ngrams(alphabet: &[u8], length: usize) -> Vec<String> {
    NgramIterator::new(alphabet, length).collect()
}
