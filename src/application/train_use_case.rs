// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates one training run in order:
//
//   Step 1: Resolve hyperparameters      (Layer 6 - infra)
//   Step 2: List applications, split     (Layer 4 - data)
//   Step 3: Decide which checkpoint      (Layer 6 - infra)
//   Step 4: Build / restore the encoder  (Layer 5 - ml)
//   Step 5: Save hyperparameters copy    (Layer 6 - infra)
//   Step 6: Run the epoch loop           (Layer 5 - ml)
//
// Reference: Burn Book §5 (Training)

use anyhow::{Context, Result};
use burn::{prelude::*, tensor::backend::AutodiffBackend};
use serde::{Deserialize, Serialize};
use std::{io, path::PathBuf};

use crate::data::{
    loader::DirSource,
    sampler::BatchSampler,
    splitter::{split_train_val, TRAIN_FRACTION},
};
use crate::domain::{error::DataError, traits::AppSource};
use crate::infra::{
    checkpoint::CheckpointManager,
    hyperparams::HyperparamStore,
    metrics::MetricsLogger,
    prompt::prompt_checkpoint,
};
use crate::ml::{
    model::Encoder,
    trainer::{run_training, TrainerSettings},
};

// ─── Training Configuration ──────────────────────────────────────────────────
// Everything about a run that is not architecture. The architecture
// comes from hyperparameters.json in the data directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub data_dir: PathBuf,
    pub checkpoint_dir: PathBuf,
    /// Defaults copied into the data dir when it has no hyperparameters
    pub defaults: Option<PathBuf>,
    pub epochs: usize,
    pub eval_interval: usize,
    pub eval_iters: usize,
    pub learning_rate: f64,
    pub train_fraction: f64,
    /// Checkpoint id to start from, e.g. "1500"
    pub resume: Option<String>,
    /// Ask on stdin when `resume` is not set
    pub prompt: bool,
    /// Off by default: a run computes gradients without moving the weights
    pub apply_optimizer_step: bool,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            checkpoint_dir: PathBuf::from("checkpoints"),
            defaults: None,
            epochs: 100,
            eval_interval: 500,
            eval_iters: 10,
            learning_rate: 1e-3,
            train_fraction: TRAIN_FRACTION,
            resume: None,
            prompt: true,
            apply_optimizer_step: false,
        }
    }
}

impl TrainConfig {
    fn trainer_settings(&self) -> TrainerSettings {
        TrainerSettings {
            epochs: self.epochs,
            eval_interval: self.eval_interval,
            eval_iters: self.eval_iters,
            learning_rate: self.learning_rate,
            apply_optimizer_step: self.apply_optimizer_step,
        }
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Run training end to end on `device` and return the final model.
    pub fn execute<B: AutodiffBackend>(&self, device: B::Device) -> Result<Encoder<B>> {
        let cfg = &self.config;

        // ── Step 1: Hyperparameters ──────────────────────────────────────────
        let store = HyperparamStore::new(&cfg.data_dir, cfg.defaults.clone());
        let params = store.load_or_default()?;
        if let Some(seed) = params.seed {
            B::seed(seed);
        }
        tracing::info!(
            "Encoder: {} blocks, n_embd {}, {} heads, vocab {}, {} groups",
            params.n_blocks,
            params.n_embd,
            params.n_head,
            params.vocab_size,
            params.group_num,
        );

        // ── Step 2: Listing and split ────────────────────────────────────────
        let source = DirSource::new(&cfg.data_dir);
        let listing = source.list()?;
        if listing.is_empty() {
            return Err(DataError::EmptyListing {
                dir: source.dir().display().to_string(),
            }
            .into());
        }
        let (train, val) = split_train_val(listing, cfg.train_fraction);
        tracing::info!("Split: {} train, {} validation", train.len(), val.len());

        // ── Step 3: Checkpoint to resume from ────────────────────────────────
        let resume = self.resolve_resume()?;

        // ── Step 4: Build / restore the encoder ──────────────────────────────
        let checkpoints = CheckpointManager::new(&cfg.checkpoint_dir)?;
        let mut model = params
            .encoder_config()
            .init::<B>(&device)
            .context("Cannot build the encoder")?;
        match &resume {
            Some(id) => model = checkpoints.load_model(model, id, &device)?,
            None => tracing::info!("Starting from freshly initialised weights"),
        }

        // ── Step 5: Persist the architecture next to the checkpoints ─────────
        checkpoints.save_hyperparameters(&params)?;

        // ── Step 6: Epoch loop ───────────────────────────────────────────────
        let mut sampler = BatchSampler::new(
            source,
            params.batch_size,
            cfg.train_fraction,
            params.batch_limits(),
            params.seed,
        );
        let metrics = MetricsLogger::new(checkpoints.dir())?;

        run_training(
            &cfg.trainer_settings(),
            model,
            &mut sampler,
            &checkpoints,
            &metrics,
            &device,
        )
    }

    /// `--resume` wins; otherwise ask the operator unless prompting is off.
    fn resolve_resume(&self) -> Result<Option<String>> {
        if let Some(id) = &self.config.resume {
            return Ok(Some(id.clone()));
        }
        if !self.config.prompt {
            return Ok(None);
        }
        prompt_checkpoint(io::stdin().lock(), io::stdout())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::testing::{small_hyperparameters, write_data_dir};
    use crate::infra::hyperparams::Hyperparameters;
    use burn::backend::{Autodiff, NdArray};
    use std::path::Path;

    type TrainBackend = Autodiff<NdArray>;

    fn config(root: &Path) -> TrainConfig {
        let data_dir = root.join("data");
        write_data_dir(&data_dir, 5, &small_hyperparameters());
        TrainConfig {
            data_dir,
            checkpoint_dir: root.join("ckpt"),
            epochs: 3,
            eval_interval: 2,
            eval_iters: 1,
            prompt: false,
            ..TrainConfig::default()
        }
    }

    #[test]
    fn test_run_writes_checkpoints_and_hyperparameters() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = config(tmp.path());
        let ckpt = cfg.checkpoint_dir.clone();

        TrainUseCase::new(cfg)
            .execute::<TrainBackend>(Default::default())
            .unwrap();

        assert!(ckpt.join("checkpoint_0.mpk").is_file());
        assert!(ckpt.join("checkpoint_2.mpk").is_file());
        assert!(!ckpt.join("checkpoint_1.mpk").exists());
        let saved = Hyperparameters::read_from(&ckpt.join("hyperparameters.json")).unwrap();
        assert_eq!(saved, small_hyperparameters());
    }

    #[test]
    fn test_default_run_never_moves_the_weights() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = config(tmp.path());
        assert!(!cfg.apply_optimizer_step);
        let checkpoints = CheckpointManager::new(&cfg.checkpoint_dir).unwrap();

        TrainUseCase::new(cfg)
            .execute::<TrainBackend>(Default::default())
            .unwrap();

        // Two training steps ran between checkpoint 0 and checkpoint 2.
        let device = Default::default();
        let restore = |id: &str| {
            let model = small_hyperparameters()
                .encoder_config()
                .init::<NdArray>(&device)
                .unwrap();
            checkpoints.load_model(model, id, &device).unwrap()
        };
        let first = restore("0");
        let last = restore("2");
        first
            .embedding
            .weight
            .val()
            .into_data()
            .assert_eq(&last.embedding.weight.val().into_data(), true);
        first
            .group_head
            .fc
            .weight
            .val()
            .into_data()
            .assert_eq(&last.group_head.fc.weight.val().into_data(), true);
    }

    #[test]
    fn test_update_flag_moves_the_weights() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = TrainConfig {
            apply_optimizer_step: true,
            learning_rate: 1e-2,
            ..config(tmp.path())
        };
        let checkpoints = CheckpointManager::new(&cfg.checkpoint_dir).unwrap();

        TrainUseCase::new(cfg)
            .execute::<TrainBackend>(Default::default())
            .unwrap();

        let device = Default::default();
        let restore = |id: &str| {
            let model = small_hyperparameters()
                .encoder_config()
                .init::<NdArray>(&device)
                .unwrap();
            checkpoints.load_model(model, id, &device).unwrap()
        };
        let first = restore("0").group_head.fc.weight.val().into_data();
        let last = restore("2").group_head.fc.weight.val().into_data();
        assert_ne!(first.to_vec::<f32>().unwrap(), last.to_vec::<f32>().unwrap());
    }

    #[test]
    fn test_resume_from_saved_checkpoint() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = config(tmp.path());
        TrainUseCase::new(cfg.clone())
            .execute::<TrainBackend>(Default::default())
            .unwrap();

        let resumed = TrainConfig {
            resume: Some("2".into()),
            epochs: 1,
            ..cfg
        };
        TrainUseCase::new(resumed)
            .execute::<TrainBackend>(Default::default())
            .unwrap();
    }

    #[test]
    fn test_unknown_resume_id_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = TrainConfig {
            resume: Some("999".into()),
            ..config(tmp.path())
        };
        let err = TrainUseCase::new(cfg)
            .execute::<TrainBackend>(Default::default())
            .unwrap_err();
        assert!(err.to_string().contains("checkpoint_999"));
    }

    #[test]
    fn test_empty_data_dir_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = TrainConfig {
            data_dir: tmp.path().to_path_buf(),
            checkpoint_dir: tmp.path().join("ckpt"),
            prompt: false,
            ..TrainConfig::default()
        };
        let err = TrainUseCase::new(cfg)
            .execute::<TrainBackend>(Default::default())
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DataError>(),
            Some(DataError::EmptyListing { .. })
        ));
        // The bundled defaults were seeded into the data dir on the way.
        assert!(tmp.path().join("hyperparameters.json").is_file());
    }
}
