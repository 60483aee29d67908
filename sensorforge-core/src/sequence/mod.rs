//! Training sequence input.
//!
//! Training examples arrive as FASTA files of already-extracted windows
//! (signal sites centred on their consensus, or whole exons and introns).
//! Reading is delegated to `bio::io::fasta`; this module turns records into
//! [`TrainingRecord`](crate::types::TrainingRecord)s and parses the
//! `/key=value` attributes on their deflines.
//!
//! ## Modules
//!
//! - [`io`]: FASTA reading and defline attribute parsing

pub mod io;

pub use io::{parse_defline_attributes, read_training_records, read_training_records_from};
