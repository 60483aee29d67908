//! # sensorforge - Sensor Model Training Tools
//!
//! Command-line tools for building training tables and model files for
//! splice-site and exon/intron sensors.
//!
//! ## Usage
//!
//! ```bash
//! # Hexamer composition table for the regression solver
//! sensorforge hexamer-table exons.fasta introns.fasta -o hexamers.tsv
//!
//! # Train and calibrate a donor sensor with the external solver
//! sensorforge splice-sensor donors.fasta decoys.fasta 20 6 1 GT,GC GT -o donor.model
//!
//! # Export fitted hexamer weights as exon and intron IMMs
//! sensorforge install-imm exon-betas.txt EXON exon.model
//! sensorforge install-imm intron-betas.txt INTRON intron.model
//!
//! # Convert a trained Markov chain into an IMM
//! sensorforge import-imm intergenic.mummie intergenic intergenic.model
//!
//! # Weight training sequences by their mean hexamer score
//! sensorforge weight-tables betas.txt pos-weights.txt neg-weights.txt
//! sensorforge score-sequences exons.fasta pos-weights.txt exon-weights.txt
//! ```
//!
//! ## Global Options
//!
//! - `-q, --quiet`: Only log warnings and errors
//! - `-t, --threads <N>`: Worker threads for composition tables (default: all cores)

use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use log::{Level, info};
use sensorforge_core::config::{FrameMode, SensorConfig};
use sensorforge_core::engine::{UntrainedSensor, composition_table, configure_thread_pool};
use sensorforge_core::kmer::mean_kmer_score;
use sensorforge_core::output::{
    format_float, read_markov_chain, write_feature_table, write_imm, write_logistic_sensor,
    write_markov_imm, write_roc, write_scores, write_weight_tables,
};
use sensorforge_core::sequence::read_training_records;
use sensorforge_core::training::common::logistic;
use sensorforge_core::training::{CoefficientSet, ExternalFitter, Precomputed, RegressionFitter};
use sensorforge_core::types::{SignalType, WindowGeometry};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Main entry point for the sensorforge CLI.
///
/// Parses the subcommand, sets up logging, and runs the selected tool.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let matches = cli().get_matches();

    let level = if matches.get_flag("quiet") {
        Level::Warn
    } else {
        Level::Info
    };
    simple_logger::init_with_level(level)?;

    let config = SensorConfig {
        quiet: matches.get_flag("quiet"),
        num_threads: matches.get_one::<usize>("threads").copied(),
        ..Default::default()
    };

    let result = match matches.subcommand() {
        Some(("hexamer-table", sub)) => hexamer_table(sub, config),
        Some(("splice-sensor", sub)) => splice_sensor(sub, config),
        Some(("install-imm", sub)) => install_imm(sub, config),
        Some(("import-imm", sub)) => import_imm(sub),
        Some(("weight-tables", sub)) => weight_tables(sub, config),
        Some(("score-sequences", sub)) => score_sequences(sub, config),
        _ => Err("No subcommand given (see --help)".into()),
    };
    // Report the message rather than the variant name
    result.map_err(|e| e.to_string().into())
}

fn cli() -> Command {
    Command::new("sensorforge")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Build training data and model files for gene-structure sensors")
        .subcommand_required(true)
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Only log warnings and errors"),
        )
        .arg(
            Arg::new("threads")
                .short('t')
                .long("threads")
                .global(true)
                .value_name("N")
                .value_parser(value_parser!(usize))
                .help("Worker threads for composition tables"),
        )
        .subcommand(
            Command::new("hexamer-table")
                .about("Write a k-mer composition table for exons (1) and introns (0)")
                .arg(Arg::new("exons").required(true).value_name("EXONS.FASTA"))
                .arg(Arg::new("introns").required(true).value_name("INTRONS.FASTA"))
                .arg(output_arg())
                .arg(
                    Arg::new("kmer-length")
                        .short('k')
                        .long("kmer-length")
                        .value_name("K")
                        .value_parser(value_parser!(usize))
                        .default_value("6")
                        .help("k-mer length"),
                )
                .arg(
                    Arg::new("min-length")
                        .long("min-length")
                        .value_name("N")
                        .value_parser(value_parser!(usize))
                        .default_value("50")
                        .help("Skip sequences shorter than this"),
                )
                .arg(
                    Arg::new("frame-mode")
                        .long("frame-mode")
                        .value_name("MODE")
                        .value_parser(["out-of-frame", "in-frame", "unrestricted"])
                        .default_value("out-of-frame")
                        .help("Windows to count in sequences with a frame attribute"),
                ),
        )
        .subcommand(
            Command::new("splice-sensor")
                .about("Fit and calibrate a positional LogisticSensor")
                .arg(Arg::new("positives").required(true).value_name("POS.FASTA"))
                .arg(Arg::new("negatives").required(true).value_name("NEG.FASTA"))
                .arg(
                    Arg::new("left")
                        .required(true)
                        .value_name("LEFT-CONTEXT")
                        .value_parser(value_parser!(usize)),
                )
                .arg(
                    Arg::new("right")
                        .required(true)
                        .value_name("RIGHT-CONTEXT")
                        .value_parser(value_parser!(usize)),
                )
                .arg(
                    Arg::new("alpha")
                        .required(true)
                        .value_name("ALPHA")
                        .value_parser(value_parser!(f64)),
                )
                .arg(
                    Arg::new("consensuses")
                        .required(true)
                        .value_name("CONSENSUS-LIST")
                        .help("Comma-separated accepted consensus strings, e.g. GT,GC"),
                )
                .arg(
                    Arg::new("signal-type")
                        .required(true)
                        .value_name("TYPE")
                        .help("GT, AG, ATG, TAG, TSS, TES, EXON or INTRON"),
                )
                .arg(output_arg())
                .arg(
                    Arg::new("solver")
                        .long("solver")
                        .value_name("PROGRAM")
                        .default_value("logistic-regression.R")
                        .help("Regression program, run as PROGRAM FEATURES ALPHA BETAS"),
                )
                .arg(
                    Arg::new("solver-arg")
                        .long("solver-arg")
                        .value_name("ARG")
                        .action(ArgAction::Append)
                        .allow_hyphen_values(true)
                        .help("Argument passed to the solver before the file arguments"),
                )
                .arg(
                    Arg::new("betas")
                        .long("betas")
                        .value_name("FILE")
                        .conflicts_with("solver")
                        .help("Use coefficients fitted earlier instead of running the solver"),
                )
                .arg(header_lines_arg("2"))
                .arg(
                    Arg::new("sensitivity")
                        .long("sensitivity")
                        .value_name("FRACTION")
                        .value_parser(value_parser!(f64))
                        .default_value("0.99")
                        .help("Fraction of positives scoring at or above the threshold"),
                )
                .arg(
                    Arg::new("threshold")
                        .long("threshold")
                        .value_name("SCORE")
                        .value_parser(value_parser!(f64))
                        .allow_negative_numbers(true)
                        .conflicts_with("frequency-threshold")
                        .help("Use this threshold instead of calibrating one"),
                )
                .arg(
                    Arg::new("frequency-threshold")
                        .long("frequency-threshold")
                        .action(ArgAction::SetTrue)
                        .help("Calibrate on the positional log-frequency model"),
                )
                .arg(
                    Arg::new("features")
                        .long("features")
                        .value_name("FILE")
                        .help("Also write the one-hot feature table"),
                )
                .arg(
                    Arg::new("scores-dir")
                        .long("scores-dir")
                        .value_name("DIR")
                        .help("Write training-set scores and ROC input to DIR"),
                ),
        )
        .subcommand(
            Command::new("install-imm")
                .about("Write fitted k-mer weights as forward and reverse IMMs")
                .arg(Arg::new("betas").required(true).value_name("BETAS.TXT"))
                .arg(Arg::new("content-type").required(true).value_name("EXON|INTRON"))
                .arg(Arg::new("output").required(true).value_name("OUT.MODEL"))
                .arg(header_lines_arg("0"))
                .arg(no_normalize_arg()),
        )
        .subcommand(
            Command::new("import-imm")
                .about("Convert a k-mer log-odds Markov chain into forward and reverse IMMs")
                .arg(Arg::new("chain").required(true).value_name("IN.MUMMIE"))
                .arg(
                    Arg::new("content-type")
                        .required(true)
                        .value_name("EXON|INTRON|INTERGENIC"),
                )
                .arg(Arg::new("output").required(true).value_name("OUT.MODEL")),
        )
        .subcommand(
            Command::new("weight-tables")
                .about("Write exp(+weight) and exp(-weight) k-mer tables")
                .arg(Arg::new("betas").required(true).value_name("BETAS.TXT"))
                .arg(Arg::new("positive").required(true).value_name("POS-WEIGHTS.TXT"))
                .arg(Arg::new("negative").required(true).value_name("NEG-WEIGHTS.TXT"))
                .arg(header_lines_arg("0"))
                .arg(no_normalize_arg()),
        )
        .subcommand(
            Command::new("score-sequences")
                .about("Score each sequence by its mean k-mer weight")
                .arg(Arg::new("sequences").required(true).value_name("IN.FASTA"))
                .arg(Arg::new("weights").required(true).value_name("WEIGHTS.TXT"))
                .arg(Arg::new("output").required(true).value_name("OUT.TXT"))
                .arg(
                    Arg::new("kmer-length")
                        .short('k')
                        .long("kmer-length")
                        .value_name("K")
                        .value_parser(value_parser!(usize))
                        .default_value("6")
                        .help("k-mer length"),
                ),
        )
}

fn output_arg() -> Arg {
    Arg::new("output")
        .short('o')
        .long("output")
        .value_name("FILE")
        .help("Output file (default: stdout)")
}

fn header_lines_arg(default: &'static str) -> Arg {
    Arg::new("header-lines")
        .long("header-lines")
        .value_name("N")
        .value_parser(value_parser!(usize))
        .default_value(default)
        .help("Leading lines of the coefficient file to skip")
}

fn no_normalize_arg() -> Arg {
    Arg::new("no-normalize")
        .long("no-normalize")
        .action(ArgAction::SetTrue)
        .help("Don't divide weights by the largest absolute weight")
}

fn open_output(path: Option<&String>) -> io::Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout())),
    })
}

fn required<'a>(
    matches: &'a ArgMatches,
    id: &str,
) -> Result<&'a String, Box<dyn std::error::Error>> {
    matches
        .get_one::<String>(id)
        .ok_or_else(|| format!("missing argument {}", id).into())
}

fn value<T: Clone + Send + Sync + 'static>(
    matches: &ArgMatches,
    id: &str,
) -> Result<T, Box<dyn std::error::Error>> {
    matches
        .get_one::<T>(id)
        .cloned()
        .ok_or_else(|| format!("missing argument {}", id).into())
}

fn hexamer_table(
    matches: &ArgMatches,
    config: SensorConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = SensorConfig {
        kmer_length: value(matches, "kmer-length")?,
        min_sequence_length: value(matches, "min-length")?,
        frame_mode: match required(matches, "frame-mode")?.as_str() {
            "in-frame" => FrameMode::InFrame,
            "unrestricted" => FrameMode::Unrestricted,
            _ => FrameMode::OutOfFrame,
        },
        ..config
    };
    config.validate()?;
    configure_thread_pool(config.num_threads)?;

    let exons = read_training_records(required(matches, "exons")?)?;
    let introns = read_training_records(required(matches, "introns")?)?;
    info!("Read {} exons and {} introns", exons.len(), introns.len());

    let table = composition_table(&exons, &introns, &config)?;
    let mut writer = open_output(matches.get_one::<String>("output"))?;
    write_feature_table(&table, &mut writer)?;
    writer.flush()?;
    Ok(())
}

fn splice_sensor(
    matches: &ArgMatches,
    config: SensorConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let signal_type: SignalType = required(matches, "signal-type")?.parse()?;
    let header_lines: usize = value(matches, "header-lines")?;
    let config = SensorConfig {
        target_sensitivity: value(matches, "sensitivity")?,
        coefficient_header_lines: header_lines,
        ..config
    };
    let geometry = WindowGeometry::splice_site(value(matches, "left")?, value(matches, "right")?);
    let consensuses: Vec<String> = required(matches, "consensuses")?
        .split(',')
        .filter(|consensus| !consensus.is_empty())
        .map(String::from)
        .collect();

    let trainer = UntrainedSensor::with_config(config, signal_type, geometry)?
        .with_consensuses(consensuses);

    let positives = read_training_records(required(matches, "positives")?)?;
    let negatives = read_training_records(required(matches, "negatives")?)?;
    info!("Read {} positives and {} negatives", positives.len(), negatives.len());

    if let Some(path) = matches.get_one::<String>("features") {
        let table = trainer.feature_table(&positives, &negatives)?;
        let mut writer = open_output(Some(path))?;
        write_feature_table(&table, &mut writer)?;
        writer.flush()?;
    }

    let fitter: Box<dyn RegressionFitter> = match matches.get_one::<String>("betas") {
        Some(path) => Box::new(Precomputed(CoefficientSet::from_path(path, header_lines)?)),
        None => {
            let mut fitter = ExternalFitter::new(required(matches, "solver")?)
                .alpha(value(matches, "alpha")?)
                .header_lines(header_lines);
            for arg in matches.get_many::<String>("solver-arg").into_iter().flatten() {
                fitter = fitter.arg(arg);
            }
            Box::new(fitter)
        }
    };

    let frequency_threshold = if matches.get_flag("frequency-threshold") {
        Some(trainer.frequency_threshold(&positives)?)
    } else {
        None
    };
    let fitted = trainer.fit(&*fitter, &positives, &negatives)?;

    if let Some(dir) = matches.get_one::<String>("scores-dir") {
        let positive_scores = fitted.raw_scores(&positives)?;
        let negative_scores = fitted.raw_scores(&negatives)?;
        write_score_dumps(Path::new(dir), &positive_scores, &negative_scores)?;
    }

    let threshold = matches
        .get_one::<f64>("threshold")
        .copied()
        .or(frequency_threshold);
    let model = match threshold {
        Some(threshold) => fitted.with_threshold(threshold),
        None => fitted.calibrate(&positives)?,
    };

    let mut writer = open_output(matches.get_one::<String>("output"))?;
    write_logistic_sensor(&mut writer, &model)?;
    writer.flush()?;
    Ok(())
}

fn write_score_dumps(
    dir: &Path,
    positive_scores: &[f64],
    negative_scores: &[f64],
) -> Result<(), Box<dyn std::error::Error>> {
    fs::create_dir_all(dir)?;
    let positive_probabilities: Vec<f64> = positive_scores.iter().map(|&s| logistic(s)).collect();
    let negative_probabilities: Vec<f64> = negative_scores.iter().map(|&s| logistic(s)).collect();

    let outputs: [(&str, &[f64]); 4] = [
        ("test.pos", &positive_probabilities),
        ("test.neg", &negative_probabilities),
        ("raw.pos", positive_scores),
        ("raw.neg", negative_scores),
    ];
    for (name, scores) in outputs {
        let mut writer = BufWriter::new(File::create(dir.join(name))?);
        write_scores(&mut writer, scores)?;
        writer.flush()?;
    }

    let mut writer = BufWriter::new(File::create(dir.join("test.roc"))?);
    write_roc(&mut writer, &positive_probabilities, &negative_probabilities)?;
    writer.flush()?;
    info!("Wrote training-set scores to {}", dir.display());
    Ok(())
}

fn install_imm(
    matches: &ArgMatches,
    config: SensorConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let content_type: SignalType = required(matches, "content-type")?.parse()?;
    if content_type.composition_sign().is_none() {
        return Err(format!("{} must be EXON or INTRON", content_type).into());
    }
    let normalize = config.normalize_composition_weights && !matches.get_flag("no-normalize");

    let coefficients =
        CoefficientSet::from_path(required(matches, "betas")?, value(matches, "header-lines")?)?;
    let mut model = Vec::new();
    write_imm(&mut model, &coefficients, content_type, normalize)?;
    fs::write(PathBuf::from(required(matches, "output")?), model)?;
    info!("Wrote {} IMM with {} weights", content_type, coefficients.features().count());
    Ok(())
}

fn import_imm(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let content_type: SignalType = required(matches, "content-type")?.parse()?;
    if !content_type.is_content() {
        return Err(format!("{} must be EXON, INTRON or INTERGENIC", content_type).into());
    }

    let chain = read_markov_chain(BufReader::new(File::open(required(matches, "chain")?)?))?;
    let mut model = Vec::new();
    write_markov_imm(&mut model, &chain, content_type)?;
    fs::write(required(matches, "output")?, model)?;
    info!("Wrote order-{} {} IMM", chain.order, content_type);
    Ok(())
}

fn weight_tables(
    matches: &ArgMatches,
    config: SensorConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let normalize = config.normalize_composition_weights && !matches.get_flag("no-normalize");
    let coefficients =
        CoefficientSet::from_path(required(matches, "betas")?, value(matches, "header-lines")?)?;

    let mut positive = Vec::new();
    let mut negative = Vec::new();
    write_weight_tables(&coefficients, normalize, &mut positive, &mut negative)?;
    fs::write(required(matches, "positive")?, positive)?;
    fs::write(required(matches, "negative")?, negative)?;
    Ok(())
}

fn score_sequences(
    matches: &ArgMatches,
    config: SensorConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let kmer_length: usize = value(matches, "kmer-length")?;
    let config = SensorConfig {
        kmer_length,
        ..config
    };
    config.validate()?;

    let weights = CoefficientSet::from_path(required(matches, "weights")?, 0)?.feature_map();
    let records = read_training_records(required(matches, "sequences")?)?;

    let mut text = Vec::new();
    for record in &records {
        let score = mean_kmer_score(&record.sequence, &weights, config.kmer_length)?;
        writeln!(text, "{}\t{}", record.identifier, format_float(score))?;
    }
    fs::write(required(matches, "output")?, text)?;
    info!("Scored {} sequences", records.len());
    Ok(())
}
