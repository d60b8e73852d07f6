// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Records the per-epoch training loss and accuracy to a CSV
// file when --metrics-csv is given.
//
// Output:
//   epoch,loss,accuracy
//   1,1.098612,0.444444
//   2,1.097301,0.444444
//   ...
//
// Accuracy is measured on the training corpus itself; there is
// no held-out set.

use anyhow::{Context, Result};
use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};
use serde::{Deserialize, Serialize};

/// One row of metrics data for a single training epoch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// The epoch number (starts at 1)
    pub epoch: usize,

    /// Mean cross-entropy over the corpus.
    /// An untrained 3-class model starts near ln(3) ≈ 1.0986
    pub loss: f64,

    /// Fraction of corpus messages whose top tier is the label
    pub accuracy: f64,
}

impl EpochMetrics {
    pub fn new(epoch: usize, loss: f64, accuracy: f64) -> Self {
        Self { epoch, loss, accuracy }
    }
}

/// Writes epoch metrics to a CSV file.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    pub fn new(csv_path: impl Into<PathBuf>) -> Self {
        Self { csv_path: csv_path.into() }
    }

    /// Write the header and every epoch, replacing any previous file.
    pub fn write_all(&self, history: &[EpochMetrics]) -> Result<()> {
        if let Some(parent) = self.csv_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Cannot create '{}'", parent.display()))?;
        }

        let file = File::create(&self.csv_path)
            .with_context(|| format!("Cannot create metrics CSV '{}'", self.csv_path.display()))?;
        let mut out = BufWriter::new(file);

        writeln!(out, "epoch,loss,accuracy")?;
        for m in history {
            writeln!(out, "{},{:.6},{:.6}", m.epoch, m.loss, m.accuracy)?;
        }
        out.flush()?;

        tracing::debug!("Wrote {} epochs to '{}'", history.len(), self.csv_path.display());
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_header_and_rows() {
        let dir    = tempfile::tempdir().unwrap();
        let logger = MetricsLogger::new(dir.path().join("runs/metrics.csv"));
        logger
            .write_all(&[EpochMetrics::new(1, 1.1, 0.5), EpochMetrics::new(2, 0.9, 0.75)])
            .unwrap();

        let csv = fs::read_to_string(logger.csv_path()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines, vec!["epoch,loss,accuracy", "1,1.100000,0.500000", "2,0.900000,0.750000"]);
    }

    #[test]
    fn test_rewrite_replaces_previous_run() {
        let dir    = tempfile::tempdir().unwrap();
        let logger = MetricsLogger::new(dir.path().join("metrics.csv"));
        logger.write_all(&[EpochMetrics::new(1, 1.0, 0.0), EpochMetrics::new(2, 1.0, 0.0)]).unwrap();
        logger.write_all(&[EpochMetrics::new(1, 0.5, 1.0)]).unwrap();

        let csv = fs::read_to_string(logger.csv_path()).unwrap();
        assert_eq!(csv.lines().count(), 2);
    }
}
