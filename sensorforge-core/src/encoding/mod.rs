//! Positional encodings of signal windows.
//!
//! - [`onehot`]: one-hot feature rows and their column header, the consensus
//!   filter, and pseudocounted positional log-frequencies

pub mod onehot;

pub use onehot::{has_accepted_consensus, one_hot_header, one_hot_row, positional_log_frequencies};
