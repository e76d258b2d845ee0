// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Appends one CSV row per evaluation step, next to the
// checkpoints of the run.
//
// Output file: <checkpoint_dir>/metrics.csv
//
//   epoch,train_loss,val_loss
//   0,2.772112,2.771840
//   500,1.902300,1.988400
//   ...
//
// Losses are the combined binary + classification loss averaged
// over eval_iters batches of each split. A val_loss that climbs
// while train_loss keeps falling means the encoder overfits.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

const METRICS_FILE: &str = "metrics.csv";
const HEADER: &str = "epoch,train_loss,val_loss";

/// Loss estimates taken at one evaluation epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvalMetrics {
    /// Epoch counter, starting at 0
    pub epoch: usize,
    pub train_loss: f64,
    pub val_loss: f64,
}

impl EvalMetrics {
    pub fn new(epoch: usize, train_loss: f64, val_loss: f64) -> Self {
        Self {
            epoch,
            train_loss,
            val_loss,
        }
    }

    /// True when `val_loss` beats the best seen so far.
    pub fn is_improvement(&self, best_val_loss: f64) -> bool {
        self.val_loss < best_val_loss
    }
}

/// Append-only CSV of `EvalMetrics` rows.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Open `<dir>/metrics.csv`, writing the header if the file is new.
    ///
    /// An existing file is appended to, so a resumed run continues the
    /// same log.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create metrics directory '{}'", dir.display()))?;

        let csv_path = dir.join(METRICS_FILE);
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)?;
            writeln!(f, "{HEADER}")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    pub fn log(&self, m: &EvalMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot append to '{}'", self.csv_path.display()))?;

        writeln!(f, "{},{:.6},{:.6}", m.epoch, m.train_loss, m.val_loss)?;

        tracing::debug!(
            "Logged epoch {} metrics: train_loss={:.4}, val_loss={:.4}",
            m.epoch,
            m.train_loss,
            m.val_loss,
        );
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}
