// ============================================================
// Layer 6 — Hyperparameter Store
// ============================================================
// The architecture and batch size of a run live in one JSON file
// inside the data directory:
//
//   <data_dir>/hyperparameters.json
//   {
//     "vocab_size": 30000,
//     "group_num": 8,
//     "n_blocks": 4,
//     "n_embd": 64,
//     "n_head": 4,
//     "dropout": 0.2,
//     "batch_size": 16
//   }
//
// When the file is missing, the defaults (a user-supplied file or
// the bundled copy) are loaded and written back into the data
// directory, so the next run reads the same values.
//
// The optional block_size pins the sequence length every
// application must have; seed makes the sampling and the weight
// initialisation reproducible.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::data::batcher::BatchLimits;
use crate::ml::model::{EncoderConfig, ModelError};

pub const HYPERPARAMETERS_FILE: &str = "hyperparameters.json";

/// Bundled fallback used when neither the run nor the user provides a file.
const BUNDLED_DEFAULTS: &str = include_str!("../../hyperparameters.json");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hyperparameters {
    pub vocab_size: usize,
    pub group_num: usize,
    pub n_blocks: usize,
    pub n_embd: usize,
    pub n_head: usize,
    pub dropout: f64,
    pub batch_size: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_size: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Hyperparameters {
    pub fn from_json(json: &str) -> Result<Self> {
        let params: Self = serde_json::from_str(json).context("Malformed hyperparameters")?;
        params.validate()?;
        Ok(params)
    }

    pub fn read_from(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Cannot read hyperparameters '{}'", path.display()))?;
        Self::from_json(&json).with_context(|| format!("In '{}'", path.display()))
    }

    /// Write as pretty-printed JSON.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
            .with_context(|| format!("Cannot write hyperparameters '{}'", path.display()))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        self.encoder_config().validate()?;
        if self.batch_size == 0 {
            return Err(ModelError::InvalidHyperparameter {
                name: "batch_size",
                reason: "must be greater than 0".into(),
            });
        }
        if self.block_size == Some(0) {
            return Err(ModelError::InvalidHyperparameter {
                name: "block_size",
                reason: "must be greater than 0 when set".into(),
            });
        }
        Ok(())
    }

    pub fn encoder_config(&self) -> EncoderConfig {
        EncoderConfig::new(
            self.vocab_size,
            self.group_num,
            self.n_blocks,
            self.n_embd,
            self.n_head,
        )
        .with_dropout(self.dropout)
    }

    pub fn batch_limits(&self) -> BatchLimits {
        BatchLimits {
            vocab_size: self.vocab_size,
            group_num: self.group_num,
            block_size: self.block_size,
        }
    }
}

/// Resolves the hyperparameters of a run from its data directory.
pub struct HyperparamStore {
    run_dir: PathBuf,
    /// Defaults file to copy in when the run has none
    fallback: Option<PathBuf>,
}

impl HyperparamStore {
    pub fn new(run_dir: impl Into<PathBuf>, fallback: Option<PathBuf>) -> Self {
        Self {
            run_dir: run_dir.into(),
            fallback,
        }
    }

    pub fn path(&self) -> PathBuf {
        self.run_dir.join(HYPERPARAMETERS_FILE)
    }

    /// Read the run's file, or seed it from the defaults first.
    pub fn load_or_default(&self) -> Result<Hyperparameters> {
        let path = self.path();
        if path.is_file() {
            let params = Hyperparameters::read_from(&path)?;
            tracing::info!("Loaded hyperparameters from '{}'", path.display());
            return Ok(params);
        }

        tracing::warn!(
            "No hyperparameters at '{}', falling back to defaults",
            path.display()
        );
        let params = match &self.fallback {
            Some(defaults) => Hyperparameters::read_from(defaults)?,
            None => Hyperparameters::from_json(BUNDLED_DEFAULTS)?,
        };

        fs::create_dir_all(&self.run_dir)
            .with_context(|| format!("Cannot create '{}'", self.run_dir.display()))?;
        params.write_to(&path)?;
        tracing::info!("Wrote default hyperparameters to '{}'", path.display());
        Ok(params)
    }
}
