use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::constants::{INTERCEPT_NAME, SOLVER_INTERCEPT_NAME};
use crate::training::common::round_to_decimals;
use crate::types::SensorError;

/// A feature name split into its parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedFeature<'a> {
    /// `<position><symbol>`, e.g. `12G`
    Position {
        /// Offset within the model window
        position: usize,
        /// Symbol at that offset
        symbol: &'a str,
    },
    /// The regression intercept
    Intercept,
}

/// Split a feature name of the form `<digits><symbol>`.
///
/// Matches `^\d+\S+$` the way a backtracking regex would, so an all-digit
/// name like `123` splits into position 12 and symbol `3`.
///
/// # Errors
///
/// Returns [`SensorError::FeatureNameParse`] for any other name.
///
/// # Examples
///
/// ```rust
/// use sensorforge_core::training::coefficients::{ParsedFeature, parse_feature_name};
///
/// assert_eq!(
///     parse_feature_name("12G")?,
///     ParsedFeature::Position { position: 12, symbol: "G" }
/// );
/// assert_eq!(parse_feature_name("intercept")?, ParsedFeature::Intercept);
/// assert!(parse_feature_name("G12").is_err());
/// # Ok::<(), sensorforge_core::types::SensorError>(())
/// ```
pub fn parse_feature_name(name: &str) -> Result<ParsedFeature<'_>, SensorError> {
    if name == INTERCEPT_NAME {
        return Ok(ParsedFeature::Intercept);
    }
    let parse_error = || SensorError::FeatureNameParse(name.to_string());

    if name.chars().any(char::is_whitespace) {
        return Err(parse_error());
    }
    let digits = name.bytes().take_while(u8::is_ascii_digit).count();
    let split = match (digits, name.len()) {
        (0, _) => return Err(parse_error()),
        (d, len) if d == len => {
            if len < 2 {
                return Err(parse_error());
            }
            len - 1
        }
        (d, _) => d,
    };

    let (position, symbol) = name.split_at(split);
    let position = position.parse::<usize>().map_err(|_| parse_error())?;
    Ok(ParsedFeature::Position { position, symbol })
}

/// One named regression weight
#[derive(Debug, Clone, PartialEq)]
pub struct Coefficient {
    /// Feature name (`intercept` for the intercept)
    pub name: String,
    /// Fitted weight
    pub weight: f64,
}

impl Coefficient {
    /// Whether this is the intercept
    #[must_use]
    pub fn is_intercept(&self) -> bool {
        self.name == INTERCEPT_NAME
    }

    /// Parse the feature name into position and symbol.
    ///
    /// # Errors
    ///
    /// See [`parse_feature_name`].
    pub fn parse(&self) -> Result<ParsedFeature<'_>, SensorError> {
        parse_feature_name(&self.name)
    }
}

/// Fitted regression weights, in the order the solver listed them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoefficientSet {
    entries: Vec<Coefficient>,
}

impl CoefficientSet {
    /// Create an empty set
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append a weight, normalizing solver naming conventions.
    ///
    /// `(Intercept)` becomes `intercept`, and the `X` that R prepends to
    /// column names starting with a digit is dropped (`X12G` -> `12G`).
    pub fn push(&mut self, name: &str, weight: f64) {
        self.entries.push(Coefficient {
            name: normalize_feature_name(name),
            weight,
        });
    }

    /// Read a whitespace-separated `name value` listing.
    ///
    /// Skips `header_lines` leading lines and any blank line. A value of `.`
    /// (a coefficient shrunk to zero) reads as 0.
    ///
    /// # Errors
    ///
    /// Returns [`SensorError::MalformedInput`] for a line without exactly two
    /// fields or with a non-numeric value, and [`SensorError::Io`] if reading
    /// fails.
    pub fn read<R: BufRead>(reader: R, header_lines: usize) -> Result<Self, SensorError> {
        let mut coefficients = Self::new();
        for (index, line) in reader.lines().enumerate().skip(header_lines) {
            let line = line?;
            let fields: Vec<&str> = line.split_whitespace().collect();
            match fields.as_slice() {
                [] => continue,
                [name, value] => {
                    let weight = parse_weight(value).ok_or_else(|| {
                        SensorError::MalformedInput(format!(
                            "line {}: can't parse weight \"{}\"",
                            index + 1,
                            value
                        ))
                    })?;
                    coefficients.push(name, weight);
                }
                _ => {
                    return Err(SensorError::MalformedInput(format!(
                        "line {}: expected 2 fields, found {}: {}",
                        index + 1,
                        fields.len(),
                        line
                    )));
                }
            }
        }
        Ok(coefficients)
    }

    /// Read a coefficient file from disk.
    ///
    /// # Errors
    ///
    /// See [`CoefficientSet::read`].
    pub fn from_path<P: AsRef<Path>>(path: P, header_lines: usize) -> Result<Self, SensorError> {
        let file = File::open(path)?;
        Self::read(BufReader::new(file), header_lines)
    }

    /// Round every weight to `decimals` places
    #[must_use]
    pub fn rounded(mut self, decimals: u32) -> Self {
        for entry in &mut self.entries {
            entry.weight = round_to_decimals(entry.weight, decimals);
        }
        self
    }

    /// All coefficients, intercept included, in input order
    pub fn iter(&self) -> impl Iterator<Item = &Coefficient> {
        self.entries.iter()
    }

    /// Coefficients other than the intercept
    pub fn features(&self) -> impl Iterator<Item = &Coefficient> {
        self.entries.iter().filter(|entry| !entry.is_intercept())
    }

    /// Intercept weight, if the solver fitted one
    #[must_use]
    pub fn intercept(&self) -> Option<f64> {
        self.entries
            .iter()
            .find(|entry| entry.is_intercept())
            .map(|entry| entry.weight)
    }

    /// Number of coefficients, intercept included
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Non-intercept weights keyed by feature name
    #[must_use]
    pub fn feature_map(&self) -> HashMap<String, f64> {
        self.features()
            .map(|entry| (entry.name.clone(), entry.weight))
            .collect()
    }
}

fn normalize_feature_name(name: &str) -> String {
    if name == SOLVER_INTERCEPT_NAME {
        return INTERCEPT_NAME.to_string();
    }
    match name.strip_prefix('X') {
        Some(rest) if rest.starts_with(|c: char| c.is_ascii_digit()) => rest.to_string(),
        _ => name.to_string(),
    }
}

fn parse_weight(value: &str) -> Option<f64> {
    if value == "." {
        return Some(0.0);
    }
    value.parse::<f64>().ok().filter(|weight| !weight.is_nan())
}
