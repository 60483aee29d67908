use std::collections::HashMap;
use std::io::{BufRead, Write};

use bio::alphabets::dna;

use crate::constants::{DNA_ALPHABET, IMM_KIND, IMM_PHASE};
use crate::kmer::NgramIterator;
use crate::output::{format_float, halved_composition_weights};
use crate::training::coefficients::CoefficientSet;
use crate::types::{SensorError, SignalType};

/// Write k-mer regression weights as a forward and a reverse-strand IMM.
///
/// Lower orders are written as all-zero tables (log 1); the top order holds
/// the fitted weights, halved, optionally scaled by the largest absolute
/// weight, and signed by the content type (exon +1, intron -1). The reverse
/// block reverse-complements every key and keeps its weight. K-mers without
/// a weight are written as 0. The intercept is not used.
///
/// # Errors
///
/// - [`SensorError::UnknownSignalType`] if `content` is not exon or intron
/// - [`SensorError::DegenerateInput`] if there are no k-mer weights
/// - [`SensorError::MalformedInput`] if the k-mers differ in length, are
///   not over ACGT, or are longer than
///   [`MAX_IMM_KMER_LENGTH`](crate::constants::MAX_IMM_KMER_LENGTH)
/// - [`SensorError::Io`] if writing fails
pub fn write_imm<W: Write>(
    writer: &mut W,
    coefficients: &CoefficientSet,
    content: SignalType,
    normalize: bool,
) -> Result<(), SensorError> {
    let sign = content
        .composition_sign()
        .ok_or_else(|| SensorError::UnknownSignalType(content.to_string()))?;
    let (kmer_length, weights) = halved_composition_weights(coefficients, normalize)?;
    let weights: HashMap<String, f64> = weights.into_iter().collect();

    let mut tables: Vec<ImmTable> = (1..kmer_length)
        .map(|length| {
            NgramIterator::new(DNA_ALPHABET, length)
                .map(|ngram| (ngram, 0.0))
                .collect()
        })
        .collect();
    tables.push(
        NgramIterator::new(DNA_ALPHABET, kmer_length)
            .map(|kmer| {
                let score = sign * weights.get(&kmer).copied().unwrap_or(0.0);
                (kmer, score)
            })
            .collect(),
    );

    let mut buffer = Vec::new();
    render_block(&mut buffer, content.forward_tag(), &tables, false)?;
    render_block(&mut buffer, content.reverse_tag(), &tables, true)?;
    writer.write_all(&buffer)?;
    Ok(())
}

/// `(key, value)` entries of one Markov order, in file order
pub type ImmTable = Vec<(String, f64)>;

/// Render one IMM block with a table per order, lowest order first.
///
/// The reverse block reverse-complements every key and keeps its value.
pub(crate) fn render_block(
    out: &mut Vec<u8>,
    tag: &str,
    tables: &[ImmTable],
    reverse: bool,
) -> Result<(), SensorError> {
    let Some(order) = tables.len().checked_sub(1) else {
        return Err(SensorError::DegenerateInput(format!("IMM {} has no tables", tag)));
    };
    writeln!(out, "{}", IMM_KIND)?;
    writeln!(out, "{}", tag)?;
    writeln!(out, "{}\t{}", order, IMM_PHASE)?;
    writeln!(out, "{}", tables.len())?;

    for table in tables {
        writeln!(out, "{}", table.len())?;
        for (key, value) in table {
            if reverse {
                let mirrored = dna::revcomp(key.as_bytes());
                writeln!(out, "{}", String::from_utf8_lossy(&mirrored))?;
            } else {
                writeln!(out, "{}", key)?;
            }
            writeln!(out, "{}", format_float(*value))?;
        }
    }
    Ok(())
}

/// One IMM block read back from a model file
#[derive(Debug, Clone, PartialEq)]
pub struct ImmBlock {
    /// Content tag (e.g. `SINGLE-EXON`)
    pub tag: String,
    /// Highest Markov order
    pub order: usize,
    /// Phase (-1 for unphased content)
    pub phase: i32,
    /// One `(key, value)` table per order, lowest first
    pub tables: Vec<ImmTable>,
}

impl ImmBlock {
    /// Value of a key in the highest-order table
    #[must_use]
    pub fn weight(&self, key: &str) -> Option<f64> {
        self.tables
            .last()?
            .iter()
            .find(|(candidate, _)| candidate == key)
            .map(|&(_, value)| value)
    }
}

/// Read every IMM block from a model file.
///
/// # Errors
///
/// Returns [`SensorError::MalformedInput`] for a truncated block, a
/// non-numeric count or value, or a block that does not start with `IMM`.
pub fn read_imm<R: BufRead>(reader: R) -> Result<Vec<ImmBlock>, SensorError> {
    let mut lines = ImmLines {
        inner: reader.lines(),
        number: 0,
    };
    let mut blocks = Vec::new();

    while let Some(kind) = lines.next_nonblank()? {
        if kind != IMM_KIND {
            return Err(lines.error(&format!("expected {}, found \"{}\"", IMM_KIND, kind)));
        }
        let tag = lines.expect("content tag")?;

        let order_line = lines.expect("order and phase")?;
        let (order, phase) = match order_line.split_whitespace().collect::<Vec<_>>()[..] {
            [order, phase] => (lines.parse(order)?, lines.parse(phase)?),
            _ => return Err(lines.error(&format!("bad order line \"{}\"", order_line))),
        };

        let table_count: usize = lines.parse_next("table count")?;
        let mut tables = Vec::with_capacity(table_count);
        for _ in 0..table_count {
            let entries: usize = lines.parse_next("table size")?;
            let mut table = Vec::with_capacity(entries);
            for _ in 0..entries {
                let key = lines.expect("table key")?;
                let value: f64 = lines.parse_next("table value")?;
                table.push((key, value));
            }
            tables.push(table);
        }

        blocks.push(ImmBlock {
            tag,
            order,
            phase,
            tables,
        });
    }
    Ok(blocks)
}

struct ImmLines<R: BufRead> {
    inner: std::io::Lines<R>,
    number: usize,
}

impl<R: BufRead> ImmLines<R> {
    fn next_line(&mut self) -> Result<Option<String>, SensorError> {
        match self.inner.next() {
            Some(line) => {
                self.number += 1;
                Ok(Some(line?.trim().to_string()))
            }
            None => Ok(None),
        }
    }

    fn next_nonblank(&mut self) -> Result<Option<String>, SensorError> {
        while let Some(line) = self.next_line()? {
            if !line.is_empty() {
                return Ok(Some(line));
            }
        }
        Ok(None)
    }

    fn expect(&mut self, what: &str) -> Result<String, SensorError> {
        self.next_line()?
            .ok_or_else(|| self.error(&format!("file ends before {}", what)))
    }

    fn parse<T: std::str::FromStr>(&self, field: &str) -> Result<T, SensorError> {
        field
            .parse()
            .map_err(|_| self.error(&format!("can't parse \"{}\"", field)))
    }

    fn parse_next<T: std::str::FromStr>(&mut self, what: &str) -> Result<T, SensorError> {
        let line = self.expect(what)?;
        self.parse(&line)
    }

    fn error(&self, message: &str) -> SensorError {
        SensorError::MalformedInput(format!("IMM line {}: {}", self.number, message))
    }
}
