// ============================================================
// Layer 2 — EvalUseCase
// ============================================================
// Restores one checkpoint and estimates its loss on both splits:
//
//   Step 1: Hyperparameters: the copy saved next to the
//           checkpoints, else the data directory's file
//   Step 2: Build the encoder and load checkpoint_<id>
//   Step 3: estimate_loss in eval mode
//
// Runs on a plain Backend: nothing here needs gradients.

use anyhow::{Context, Result};
use burn::prelude::*;
use std::path::PathBuf;

use crate::data::{loader::DirSource, sampler::BatchSampler, splitter::TRAIN_FRACTION};
use crate::infra::{checkpoint::CheckpointManager, hyperparams::HyperparamStore};
use crate::ml::trainer::{estimate_loss, SplitLosses};

#[derive(Debug, Clone)]
pub struct EvalConfig {
    pub data_dir: PathBuf,
    pub checkpoint_dir: PathBuf,
    pub defaults: Option<PathBuf>,
    /// Id of the checkpoint to restore, e.g. "1500"
    pub checkpoint: String,
    pub eval_iters: usize,
    pub train_fraction: f64,
}

impl EvalConfig {
    pub fn new(data_dir: PathBuf, checkpoint_dir: PathBuf, checkpoint: String) -> Self {
        Self {
            data_dir,
            checkpoint_dir,
            defaults: None,
            checkpoint,
            eval_iters: 10,
            train_fraction: TRAIN_FRACTION,
        }
    }
}

pub struct EvalUseCase {
    config: EvalConfig,
}

impl EvalUseCase {
    pub fn new(config: EvalConfig) -> Self {
        Self { config }
    }

    pub fn execute<B: Backend>(&self, device: B::Device) -> Result<SplitLosses> {
        let cfg = &self.config;
        let checkpoints = CheckpointManager::new(&cfg.checkpoint_dir)?;

        // ── Step 1: Hyperparameters ──────────────────────────────────────────
        let params = match checkpoints.load_hyperparameters()? {
            Some(params) => params,
            None => {
                tracing::warn!(
                    "No hyperparameters saved in '{}', using the data directory's",
                    cfg.checkpoint_dir.display()
                );
                HyperparamStore::new(&cfg.data_dir, cfg.defaults.clone()).load_or_default()?
            }
        };

        // ── Step 2: Restore the encoder ──────────────────────────────────────
        let model = params
            .encoder_config()
            .init::<B>(&device)
            .context("Cannot build the encoder")?;
        let model = checkpoints.load_model(model, &cfg.checkpoint, &device)?;

        // ── Step 3: Estimate ─────────────────────────────────────────────────
        let mut sampler = BatchSampler::new(
            DirSource::new(&cfg.data_dir),
            params.batch_size,
            cfg.train_fraction,
            params.batch_limits(),
            params.seed,
        );
        let losses = estimate_loss(&model, &mut sampler, cfg.eval_iters, &device)?;
        tracing::info!(
            "Checkpoint {}: train loss {:.4}, val loss {:.4}",
            cfg.checkpoint,
            losses.train,
            losses.val
        );
        Ok(losses)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::train_use_case::{TrainConfig, TrainUseCase};
    use crate::data::testing::{small_hyperparameters, write_data_dir};
    use burn::backend::{Autodiff, NdArray};

    #[test]
    fn test_eval_restores_trained_checkpoint() {
        let tmp = tempfile::tempdir().unwrap();
        let data_dir = tmp.path().join("data");
        let checkpoint_dir = tmp.path().join("ckpt");
        write_data_dir(&data_dir, 5, &small_hyperparameters());

        TrainUseCase::new(TrainConfig {
            data_dir: data_dir.clone(),
            checkpoint_dir: checkpoint_dir.clone(),
            epochs: 2,
            eval_interval: 1,
            eval_iters: 1,
            prompt: false,
            ..TrainConfig::default()
        })
        .execute::<Autodiff<NdArray>>(Default::default())
        .unwrap();

        let mut cfg = EvalConfig::new(data_dir, checkpoint_dir, "1".into());
        cfg.eval_iters = 2;
        let losses = EvalUseCase::new(cfg)
            .execute::<NdArray>(Default::default())
            .unwrap();
        assert!(losses.train.is_finite() && losses.train > 0.0);
        assert!(losses.val.is_finite() && losses.val > 0.0);
    }

    #[test]
    fn test_eval_without_checkpoint_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let data_dir = tmp.path().join("data");
        write_data_dir(&data_dir, 3, &small_hyperparameters());

        let cfg = EvalConfig::new(data_dir, tmp.path().join("ckpt"), "0".into());
        assert!(EvalUseCase::new(cfg).execute::<NdArray>(Default::default()).is_err());
    }
}
