// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores encoder weights with Burn's named
// MessagePack recorder at full precision, so a restored model
// reproduces the saved one bit for bit.
//
// File naming convention:
//   checkpoints/
//     checkpoint_0.mpk              ← weights at epoch 0
//     checkpoint_0.shapes.json      ← parameter shapes of that file
//     checkpoint_500.mpk            ← weights at epoch 500
//     ...
//     hyperparameters.json    ← architecture of the run
//     metrics.csv
//
// Checkpoints are never rotated or pruned, and there is no lock:
// two runs over the same directory overwrite each other.
//
// Burn's load_record swaps tensors in without looking at their
// shapes, so loading compares every parameter shape against the
// freshly built model (from the manifest before loading, and on
// the loaded tensors after) and refuses a mismatch. A checkpoint
// without its manifest is refused outright: the recorder itself
// panics on a record with fewer layers than the model.

use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};
use burn::{
    module::{ModuleVisitor, ParamId},
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkFileRecorder, Recorder},
};

use crate::infra::hyperparams::{Hyperparameters, HYPERPARAMETERS_FILE};
use crate::ml::model::{Encoder, ModelError};

type CheckpointRecorder = NamedMpkFileRecorder<FullPrecisionSettings>;

/// Extension the recorder appends to every checkpoint path.
const CHECKPOINT_EXTENSION: &str = "mpk";

/// Manages saving and loading of model checkpoints.
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Create the manager, creating `dir` if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create checkpoint directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of checkpoint `id` without the recorder's extension.
    fn stem_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("checkpoint_{id}"))
    }

    /// Full on-disk path of checkpoint `id`.
    pub fn path_for(&self, id: &str) -> PathBuf {
        self.stem_for(id).with_extension(CHECKPOINT_EXTENSION)
    }

    /// Sidecar listing the parameter shapes of checkpoint `id`.
    fn shapes_path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("checkpoint_{id}.shapes.json"))
    }

    pub fn checkpoint_exists(&self, id: &str) -> bool {
        self.path_for(id).is_file()
    }

    /// Write every parameter of `model` to `checkpoint_<epoch>.mpk`.
    pub fn save_model<B: Backend>(&self, model: &Encoder<B>, epoch: usize) -> Result<PathBuf> {
        let stem = self.stem_for(&epoch.to_string());

        CheckpointRecorder::new()
            .record(model.clone().into_record(), stem.clone())
            .with_context(|| format!("Failed to save checkpoint to '{}'", stem.display()))?;

        let shapes = serde_json::to_string(&parameter_shapes(model))?;
        fs::write(self.shapes_path_for(&epoch.to_string()), shapes)
            .with_context(|| format!("Failed to write shape manifest for epoch {epoch}"))?;

        tracing::debug!("Saved checkpoint: epoch {}", epoch);
        Ok(self.path_for(&epoch.to_string()))
    }

    /// Restore checkpoint `id` into `model`, which must have been built with
    /// the same configuration the checkpoint was trained with.
    pub fn load_model<B: Backend>(
        &self,
        model: Encoder<B>,
        id: &str,
        device: &B::Device,
    ) -> Result<Encoder<B>> {
        let path = self.path_for(id);
        if !self.checkpoint_exists(id) {
            anyhow::bail!("Checkpoint '{}' does not exist", path.display());
        }
        tracing::info!("Loading checkpoint '{}'", path.display());

        let expected = parameter_shapes(&model);

        // Refuse before touching the model when the manifest already disagrees.
        let manifest = self.shapes_path_for(id);
        if !manifest.is_file() {
            anyhow::bail!(
                "Checkpoint '{}' has no shape manifest '{}'",
                path.display(),
                manifest.display()
            );
        }
        let saved: Vec<Vec<usize>> = serde_json::from_str(&fs::read_to_string(&manifest)?)
            .with_context(|| format!("Corrupt shape manifest '{}'", manifest.display()))?;
        ensure_same_shapes(&expected, &saved)
            .with_context(|| format!("Cannot restore '{}'", path.display()))?;

        let record = CheckpointRecorder::new()
            .load(self.stem_for(id), device)
            .with_context(|| format!("Cannot load checkpoint '{}'", path.display()))?;
        let model = model.load_record(record);

        ensure_same_shapes(&expected, &parameter_shapes(&model))
            .with_context(|| format!("Cannot restore '{}'", path.display()))?;

        Ok(model)
    }

    /// Keep a copy of the run's hyperparameters next to its checkpoints.
    pub fn save_hyperparameters(&self, params: &Hyperparameters) -> Result<()> {
        let path = self.dir.join(HYPERPARAMETERS_FILE);
        params.write_to(&path)?;
        tracing::debug!("Saved hyperparameters to '{}'", path.display());
        Ok(())
    }

    /// The hyperparameters saved by `save_hyperparameters`, if any.
    pub fn load_hyperparameters(&self) -> Result<Option<Hyperparameters>> {
        let path = self.dir.join(HYPERPARAMETERS_FILE);
        if !path.is_file() {
            return Ok(None);
        }
        Hyperparameters::read_from(&path).map(Some)
    }
}

/// Collects the shape of every float parameter in visiting order.
struct ShapeCollector {
    shapes: Vec<Vec<usize>>,
}

impl<B: Backend> ModuleVisitor<B> for ShapeCollector {
    fn visit_float<const D: usize>(&mut self, _id: ParamId, tensor: &Tensor<B, D>) {
        self.shapes.push(tensor.dims().to_vec());
    }
}

fn parameter_shapes<B: Backend>(model: &Encoder<B>) -> Vec<Vec<usize>> {
    let mut collector = ShapeCollector { shapes: Vec::new() };
    model.visit(&mut collector);
    collector.shapes
}

fn ensure_same_shapes(expected: &[Vec<usize>], found: &[Vec<usize>]) -> Result<(), ModelError> {
    if expected.len() != found.len() {
        return Err(ModelError::ArchitectureMismatch {
            detail: format!(
                "model has {} parameter tensors, checkpoint has {}",
                expected.len(),
                found.len()
            ),
        });
    }
    match expected.iter().zip(found).enumerate().find(|(_, (e, f))| e != f) {
        Some((i, (e, f))) => Err(ModelError::ArchitectureMismatch {
            detail: format!("parameter #{i} expects shape {e:?}, checkpoint has {f:?}"),
        }),
        None => Ok(()),
    }
}
