// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands, `train` and `eval`, and their
// flags. Architecture settings are not flags: they come from
// hyperparameters.json in the data directory.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::application::{eval_use_case::EvalConfig, train_use_case::TrainConfig};
use crate::data::splitter::TRAIN_FRACTION;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the encoder on tokenized applications
    Train(TrainArgs),

    /// Estimate train and validation loss of a saved checkpoint
    Eval(EvalArgs),
}

/// Where tensors live.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceKind {
    /// NdArray on the CPU
    #[default]
    Cpu,
    /// WebGPU through wgpu
    Wgpu,
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Directory holding one sub-directory per application
    #[arg(long, default_value = "data")]
    pub data_dir: PathBuf,

    /// Directory for checkpoints, metrics.csv and the hyperparameters copy
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: PathBuf,

    /// Hyperparameters file to copy into the data directory when it has none
    #[arg(long)]
    pub defaults: Option<PathBuf>,

    #[arg(long, default_value_t = 100)]
    pub epochs: usize,

    /// Evaluate and checkpoint every N epochs (and on the last one)
    #[arg(long, default_value_t = 500)]
    pub eval_interval: usize,

    /// Batches per split averaged by each loss estimate
    #[arg(long, default_value_t = 10)]
    pub eval_iters: usize,

    /// Adam learning rate
    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    /// Checkpoint id to start from; skips the prompt
    #[arg(long)]
    pub resume: Option<String>,

    /// Start fresh without asking for a checkpoint
    #[arg(long)]
    pub no_prompt: bool,

    /// Apply an Adam step after each backward pass; without it the
    /// gradients are computed and the weights stay fixed
    #[arg(long)]
    pub update: bool,

    #[arg(long, value_enum, default_value_t = DeviceKind::Cpu)]
    pub device: DeviceKind,
}

impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            data_dir: a.data_dir,
            checkpoint_dir: a.checkpoint_dir,
            defaults: a.defaults,
            epochs: a.epochs,
            eval_interval: a.eval_interval,
            eval_iters: a.eval_iters,
            learning_rate: a.lr,
            train_fraction: TRAIN_FRACTION,
            resume: a.resume,
            prompt: !a.no_prompt,
            apply_optimizer_step: a.update,
        }
    }
}

#[derive(Args, Debug)]
pub struct EvalArgs {
    /// Checkpoint id to evaluate, e.g. 1500
    #[arg(long)]
    pub checkpoint: String,

    #[arg(long, default_value = "data")]
    pub data_dir: PathBuf,

    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: PathBuf,

    #[arg(long)]
    pub defaults: Option<PathBuf>,

    #[arg(long, default_value_t = 10)]
    pub eval_iters: usize,

    #[arg(long, value_enum, default_value_t = DeviceKind::Cpu)]
    pub device: DeviceKind,
}

impl From<EvalArgs> for EvalConfig {
    fn from(a: EvalArgs) -> Self {
        let mut cfg = EvalConfig::new(a.data_dir, a.checkpoint_dir, a.checkpoint);
        cfg.defaults = a.defaults;
        cfg.eval_iters = a.eval_iters;
        cfg
    }
}
