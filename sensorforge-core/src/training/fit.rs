use std::ffi::OsString;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::process::Command;

use log::{debug, info};

use crate::constants::SOLVER_HEADER_LINES;
use crate::output::write_feature_table;
use crate::training::coefficients::CoefficientSet;
use crate::types::{FeatureTable, SensorError};

/// Fits regression weights to a labelled feature table.
pub trait RegressionFitter {
    /// Fit the table and return the named coefficients.
    ///
    /// # Errors
    ///
    /// Implementations return [`SensorError::SolverFailed`] when fitting
    /// fails, or any error raised while loading the fitted weights.
    fn fit(&self, table: &FeatureTable) -> Result<CoefficientSet, SensorError>;
}

/// Coefficients fitted ahead of time, returned as-is for any table
#[derive(Debug, Clone)]
pub struct Precomputed(pub CoefficientSet);

impl RegressionFitter for Precomputed {
    fn fit(&self, _table: &FeatureTable) -> Result<CoefficientSet, SensorError> {
        Ok(self.0.clone())
    }
}

/// Runs an external regression program over a feature file.
///
/// The program is invoked as
/// `<program> [leading args...] <features.tsv> <alpha> <betas.txt>`: it reads
/// the feature table and must write its `name value` coefficient listing to
/// the betas path. Both files live in a temporary directory that is removed
/// when fitting returns.
///
/// # Examples
///
/// ```rust
/// use sensorforge_core::training::fit::ExternalFitter;
///
/// let fitter = ExternalFitter::new("Rscript")
///     .arg("logistic-regression.R")
///     .alpha(0.5)
///     .header_lines(2);
/// # let _ = fitter;
/// ```
#[derive(Debug, Clone)]
pub struct ExternalFitter {
    program: PathBuf,
    leading_args: Vec<OsString>,
    alpha: f64,
    header_lines: usize,
}

impl ExternalFitter {
    /// Fitter for `program`, with alpha 1 (lasso) and the R solver's header
    /// lines skipped
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
            alpha: 1.0,
            header_lines: SOLVER_HEADER_LINES,
        }
    }

    /// Pass an extra argument ahead of the file arguments
    #[must_use]
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.leading_args.push(arg.into());
        self
    }

    /// Elastic-net mixing parameter handed to the solver
    #[must_use]
    pub const fn alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Leading lines of solver output to skip
    #[must_use]
    pub const fn header_lines(mut self, header_lines: usize) -> Self {
        self.header_lines = header_lines;
        self
    }
}

impl RegressionFitter for ExternalFitter {
    fn fit(&self, table: &FeatureTable) -> Result<CoefficientSet, SensorError> {
        let workdir = tempfile::tempdir()?;
        let features_path = workdir.path().join("features.tsv");
        let betas_path = workdir.path().join("betas.txt");

        let mut writer = BufWriter::new(File::create(&features_path)?);
        write_feature_table(table, &mut writer)?;
        writer.flush()?;
        drop(writer);

        info!(
            "Fitting {} rows x {} features with {}",
            table.rows().len(),
            table.columns().len(),
            self.program.display()
        );
        let output = Command::new(&self.program)
            .args(&self.leading_args)
            .arg(&features_path)
            .arg(self.alpha.to_string())
            .arg(&betas_path)
            .output()
            .map_err(|e| {
                SensorError::SolverFailed(format!(
                    "can't run {}: {}",
                    self.program.display(),
                    e
                ))
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            return Err(SensorError::SolverFailed(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                stderr.trim()
            )));
        }
        for line in stderr.lines() {
            debug!("solver: {}", line);
        }

        if !betas_path.exists() {
            return Err(SensorError::SolverFailed(format!(
                "{} did not write any coefficients",
                self.program.display()
            )));
        }
        CoefficientSet::from_path(&betas_path, self.header_lines)
    }
}
