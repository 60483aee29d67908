// =============================================================================
// Alphabet
// =============================================================================

/// Nucleotide alphabet, in canonical enumeration order
pub const DNA_ALPHABET: &[u8; 4] = b"ACGT";

/// Alphabet size advertised in `LogisticSensor` headers (`ACGNT`)
pub const SENSOR_ALPHABET_SIZE: usize = 5;

// =============================================================================
// Composition features
// =============================================================================

/// k-mer length used for composition features (hexamers)
pub const DEFAULT_KMER_LENGTH: usize = 6;

/// Sequences shorter than this are skipped when building composition rows
pub const MIN_SEQUENCE_LENGTH: usize = 50;

/// Decimal places kept in composition fractions
pub const COMPOSITION_DECIMALS: u32 = 4;

/// Number of reading frames
pub const READING_FRAMES: u8 = 3;

// =============================================================================
// Signal windows
// =============================================================================

/// Index of the consensus in extracted splice-site windows
pub const DEFAULT_CONSENSUS_POSITION: usize = 80;

/// Consensus length for splice sites (GT / AG)
pub const DEFAULT_CONSENSUS_LENGTH: usize = 2;

/// Pseudocount for unseen position/symbol pairs in positional frequencies
pub const POSITIONAL_PSEUDOCOUNT: f64 = 0.1;

// =============================================================================
// Calibration and serialization
// =============================================================================

/// Default fraction of training positives that must score at or above threshold
pub const DEFAULT_TARGET_SENSITIVITY: f64 = 0.99;

/// Decimal places kept in calibrated thresholds
pub const THRESHOLD_DECIMALS: u32 = 3;

/// Decimal places kept in positional coefficients after loading
pub const COEFFICIENT_DECIMALS: u32 = 3;

/// Header lines printed by the R solver before its coefficient listing
pub const SOLVER_HEADER_LINES: usize = 2;

/// Divisor applied to every weight written to a sensor file
pub const WEIGHT_DIVISOR: f64 = 2.0;

/// Feature name the solver uses for the intercept
pub const SOLVER_INTERCEPT_NAME: &str = "(Intercept)";

/// Feature name for the intercept in sensor files
pub const INTERCEPT_NAME: &str = "intercept";

/// First line of a logistic signal sensor file
pub const LOGISTIC_SENSOR_KIND: &str = "LogisticSensor";

/// First line of an interpolated Markov model file
pub const IMM_KIND: &str = "IMM";

/// Longest k-mer accepted for IMM export (4^12 entries in the top table)
pub const MAX_IMM_KMER_LENGTH: usize = 12;

/// Phase written in IMM headers (non-periodic model)
pub const IMM_PHASE: i32 = -1;
