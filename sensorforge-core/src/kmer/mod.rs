//! K-mer enumeration, counting, and composition vectors.
//!
//! ## Modules
//!
//! - [`ngram`]: every string of length k over an alphabet, in canonical order
//! - [`counter`]: k-mer counts with optional reading-frame filtering
//! - [`composition`]: normalized composition vectors and mean k-mer scores
//!
//! ## Examples
//!
//! ```rust
//! use sensorforge_core::constants::DNA_ALPHABET;
//! use sensorforge_core::kmer::{composition_vector, count_kmers, enumerate_ngrams, FrameFilter};
//!
//! let enumeration = enumerate_ngrams(DNA_ALPHABET, 2);
//! let counts = count_kmers(b"ACGTACGT", 2, FrameFilter::OutOfFrame { frame: 0 });
//! let vector = composition_vector(&counts, &enumeration)?;
//! assert_eq!(vector.len(), 16);
//! # Ok::<(), sensorforge_core::types::SensorError>(())
//! ```

pub mod composition;
pub mod counter;
pub mod ngram;

pub use composition::{composition_vector, mean_kmer_score};
pub use counter::{FrameFilter, KmerCountTable, count_kmers};
pub use ngram::{NgramIterator, enumerate_ngrams};
