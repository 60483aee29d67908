use std::collections::HashMap;
use std::io::{BufRead, Write};

use log::debug;

use crate::constants::{DNA_ALPHABET, MAX_IMM_KMER_LENGTH};
use crate::output::formats::imm::{ImmTable, render_block};
use crate::types::{SensorError, SignalType};

/// Fixed-order Markov chain of k-mer log-odds, one table per order.
///
/// Read from the text dump of an external content-model trainer:
///
/// ```text
/// Markov chain
/// 1 order
/// alphabet:
/// ACGT
/// A -1.2
/// AC 0.4
/// ```
///
/// A k-mer of length `n` belongs to order `n - 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkovChain {
    /// Highest order declared in the header
    pub order: usize,
    /// Entries per order, lowest first, in file order
    pub tables: Vec<ImmTable>,
}

impl MarkovChain {
    /// Log-odds of `kmer`, if the chain has an entry for it
    #[must_use]
    pub fn score(&self, kmer: &str) -> Option<f64> {
        let order = kmer.len().checked_sub(1)?;
        self.tables
            .get(order)?
            .iter()
            .find(|(key, _)| key == kmer)
            .map(|&(_, score)| score)
    }
}

/// Read a Markov chain dump.
///
/// Lines before the `<N> order` header are ignored. The two lines after it
/// (the alphabet label and the alphabet) are skipped, then `kmer score`
/// records are read until a blank line or the end of the file. A repeated
/// k-mer keeps its first position and takes the later score.
///
/// # Errors
///
/// Returns [`SensorError::MalformedInput`] if the header is missing, the
/// order exceeds [`MAX_IMM_KMER_LENGTH`]` - 1`, or a record does not have
/// exactly two fields, has a non-numeric score, or holds a k-mer that is not
/// over ACGT or is longer than the declared order allows.
pub fn read_markov_chain<R: BufRead>(reader: R) -> Result<MarkovChain, SensorError> {
    let mut lines = reader.lines().enumerate();

    let order = loop {
        let Some((_, line)) = lines.next() else {
            return Err(SensorError::MalformedInput(
                "Markov chain has no \"<N> order\" header".to_string(),
            ));
        };
        if let Some(order) = declared_order(&line?) {
            break order;
        }
    };
    if order >= MAX_IMM_KMER_LENGTH {
        return Err(SensorError::MalformedInput(format!(
            "Markov order {} exceeds the supported maximum of {}",
            order,
            MAX_IMM_KMER_LENGTH - 1
        )));
    }
    for label in ["alphabet label", "alphabet"] {
        let Some((_, line)) = lines.next() else {
            return Err(SensorError::MalformedInput(format!(
                "Markov chain ends before the {}",
                label
            )));
        };
        line?;
    }

    let mut tables: Vec<ImmTable> = vec![Vec::new(); order + 1];
    let mut positions: Vec<HashMap<String, usize>> = vec![HashMap::new(); order + 1];
    for (index, line) in lines {
        let line = line?;
        let fields: Vec<&str> = line.split_whitespace().collect();
        let (kmer, score) = match fields.as_slice() {
            [] => break,
            [kmer, score] => (*kmer, *score),
            _ => {
                return Err(SensorError::MalformedInput(format!(
                    "Markov chain line {}: expected 2 fields, found {}: {}",
                    index + 1,
                    fields.len(),
                    line
                )));
            }
        };

        let record_error = |message: String| {
            SensorError::MalformedInput(format!("Markov chain line {}: {}", index + 1, message))
        };
        let score: f64 = score
            .parse()
            .map_err(|_| record_error(format!("can't parse score \"{}\"", score)))?;
        if !kmer.bytes().all(|base| DNA_ALPHABET.contains(&base)) {
            return Err(record_error(format!("{} is not a k-mer over ACGT", kmer)));
        }
        let kmer_order = kmer.len() - 1;
        if kmer_order > order {
            return Err(record_error(format!(
                "{} is longer than order {} allows",
                kmer, order
            )));
        }

        let table = &mut tables[kmer_order];
        match positions[kmer_order].get(kmer) {
            Some(&position) => table[position].1 = score,
            None => {
                positions[kmer_order].insert(kmer.to_string(), table.len());
                table.push((kmer.to_string(), score));
            }
        }
    }

    debug!(
        "Read order-{} Markov chain with {} entries",
        order,
        tables.iter().map(Vec::len).sum::<usize>()
    );
    Ok(MarkovChain { order, tables })
}

// Trailing digits of the token before `order`, as in "5 order" or "chain5 order"
fn declared_order(line: &str) -> Option<usize> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    tokens.windows(2).find_map(|pair| {
        if !pair[1].starts_with("order") {
            return None;
        }
        let digits_from = pair[0]
            .rfind(|c: char| !c.is_ascii_digit())
            .map_or(0, |index| index + 1);
        pair[0][digits_from..].parse().ok()
    })
}

/// Write a Markov chain as a forward and a reverse-strand IMM.
///
/// Tables are written as read, with no halving or normalization. The
/// reverse block reverse-complements every key. Intergenic content uses
/// the same tag on both strands.
///
/// # Errors
///
/// Returns [`SensorError::UnknownSignalType`] if `content` is not a content
/// type, or [`SensorError::Io`] if writing fails. Nothing is written on error.
pub fn write_markov_imm<W: Write>(
    writer: &mut W,
    chain: &MarkovChain,
    content: SignalType,
) -> Result<(), SensorError> {
    if !content.is_content() {
        return Err(SensorError::UnknownSignalType(content.to_string()));
    }
    let mut buffer = Vec::new();
    render_block(&mut buffer, content.forward_tag(), &chain.tables, false)?;
    render_block(&mut buffer, content.reverse_tag(), &chain.tables, true)?;
    writer.write_all(&buffer)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::read_imm;
    use std::io::Cursor;

    const FIRST_ORDER: &str = "\
Markov chain
1 order
alphabet:
ACGT
A -1.2
C 0.5
AC 0.4
GG -2
";

    #[test]
    fn test_read_groups_by_order() {
        let chain = read_markov_chain(Cursor::new(FIRST_ORDER)).unwrap();
        assert_eq!(chain.order, 1);
        assert_eq!(
            chain.tables,
            vec![
                vec![("A".to_string(), -1.2), ("C".to_string(), 0.5)],
                vec![("AC".to_string(), 0.4), ("GG".to_string(), -2.0)],
            ]
        );
        assert_eq!(chain.score("GG"), Some(-2.0));
        assert_eq!(chain.score("T"), None);
    }

    #[test]
    fn test_read_stops_at_blank_line() {
        let input = format!("{}\nthis trailer is not a record\n", FIRST_ORDER);
        let chain = read_markov_chain(Cursor::new(input)).unwrap();
        assert_eq!(chain.tables[1].len(), 2);
    }

    #[test]
    fn test_repeated_kmer_keeps_position() {
        let input = "0 order\nalphabet:\nACGT\nA 1\nC 2\nA 3\n";
        let chain = read_markov_chain(Cursor::new(input)).unwrap();
        assert_eq!(
            chain.tables[0],
            vec![("A".to_string(), 3.0), ("C".to_string(), 2.0)]
        );
    }

    #[test]
    fn test_read_rejects_bad_records() {
        for input in [
            "1 order\nalphabet:\nACGT\nA -1.2 extra\n",
            "1 order\nalphabet:\nACGT\nAC\n",
            "1 order\nalphabet:\nACGT\nAC high\n",
            "1 order\nalphabet:\nACGT\nACG 0.1\n",
            "1 order\nalphabet:\nACGT\nAN 0.1\n",
        ] {
            assert!(
                matches!(
                    read_markov_chain(Cursor::new(input)),
                    Err(SensorError::MalformedInput(_))
                ),
                "accepted {:?}",
                input
            );
        }
    }

    #[test]
    fn test_read_rejects_missing_or_huge_header() {
        assert!(matches!(
            read_markov_chain(Cursor::new("A 1.0\n")),
            Err(SensorError::MalformedInput(_))
        ));
        assert!(matches!(
            read_markov_chain(Cursor::new("999999999 order\nalphabet:\nACGT\n")),
            Err(SensorError::MalformedInput(_))
        ));
        assert!(matches!(
            read_markov_chain(Cursor::new("1 order\nalphabet:\n")),
            Err(SensorError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_declared_order() {
        assert_eq!(declared_order("5 order Markov chain"), Some(5));
        assert_eq!(declared_order("chain12 orders"), Some(12));
        assert_eq!(declared_order("order 5"), None);
        assert_eq!(declared_order("alphabet:"), None);
    }

    #[test]
    fn test_write_forward_and_reverse_blocks() {
        let chain = read_markov_chain(Cursor::new(FIRST_ORDER)).unwrap();
        let mut buffer = Vec::new();
        write_markov_imm(&mut buffer, &chain, SignalType::Intron).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            &lines[..13],
            &[
                "IMM", "INTRON", "1\t-1", "2", "2", "A", "-1.2", "C", "0.5", "2", "AC", "0.4",
                "GG"
            ]
        );

        let blocks = read_imm(Cursor::new(text)).unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1].tag, "NEG-INTRON");
        assert_eq!(blocks[1].tables[0][0], ("T".to_string(), -1.2));
        assert_eq!(blocks[1].weight("GT"), Some(0.4));
        assert_eq!(blocks[1].weight("CC"), Some(-2.0));
    }

    #[test]
    fn test_intergenic_keeps_its_tag() {
        let chain = read_markov_chain(Cursor::new(FIRST_ORDER)).unwrap();
        let mut buffer = Vec::new();
        write_markov_imm(&mut buffer, &chain, SignalType::Intergenic).unwrap();
        let blocks = read_imm(Cursor::new(buffer)).unwrap();
        let tags: Vec<&str> = blocks.iter().map(|block| block.tag.as_str()).collect();
        assert_eq!(tags, vec!["INTERGENIC", "INTERGENIC"]);
    }

    #[test]
    fn test_signal_types_are_rejected() {
        let chain = read_markov_chain(Cursor::new(FIRST_ORDER)).unwrap();
        let mut buffer = Vec::new();
        assert!(matches!(
            write_markov_imm(&mut buffer, &chain, SignalType::Donor),
            Err(SensorError::UnknownSignalType(_))
        ));
        assert!(buffer.is_empty());
    }
}
