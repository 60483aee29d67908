#![allow(dead_code)]

use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};

/// The sensorforge binary, quiet so stderr only carries errors
pub fn sensorforge() -> Command {
    let mut cmd = Command::cargo_bin("sensorforge").unwrap();
    cmd.arg("--quiet");
    cmd
}

/// Writes `(id, sequence)` records as FASTA into `dir/name`
pub fn write_fasta(dir: &Path, name: &str, records: &[(&str, &str)]) -> PathBuf {
    let text: String = records
        .iter()
        .map(|(id, sequence)| format!(">{}\n{}\n", id, sequence))
        .collect();
    write_file(dir, name, &text)
}

pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

/// A donor-style window: 80 bases of context, then `consensus`, then 10 more
pub fn signal_window(consensus: &str, fill: char) -> String {
    let mut sequence: String = std::iter::repeat_n(fill, 80).collect();
    sequence.push_str(consensus);
    sequence.extend(std::iter::repeat_n(fill, 10));
    sequence
}
