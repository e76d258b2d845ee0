// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses the command line with clap and hands off to Layer 2.
//
//   1. `train` trains the encoder, checkpointing as it goes
//   2. `eval`  restores a checkpoint and estimates its loss
//
// The backend is picked here, once: NdArray on the CPU or
// wgpu on the GPU, wrapped in Autodiff for training.
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use burn::backend::{
    ndarray::NdArrayDevice,
    wgpu::WgpuDevice,
    Autodiff, NdArray, Wgpu,
};
use clap::Parser;
use commands::{Commands, DeviceKind, EvalArgs, TrainArgs};

use crate::application::{
    eval_use_case::EvalUseCase,
    train_use_case::TrainUseCase,
};

#[derive(Parser, Debug)]
#[command(
    name = "rough-classifier",
    version,
    about = "Train a transformer encoder that classifies Android API-call sequences."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args) => run_train(args),
            Commands::Eval(args) => run_eval(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    tracing::info!("Training on applications in '{}'", args.data_dir.display());

    let device = args.device;
    let use_case = TrainUseCase::new(args.into());
    match device {
        DeviceKind::Cpu => {
            use_case.execute::<Autodiff<NdArray>>(NdArrayDevice::default())?;
        }
        DeviceKind::Wgpu => {
            use_case.execute::<Autodiff<Wgpu>>(WgpuDevice::default())?;
        }
    }

    println!("Training complete.");
    Ok(())
}

fn run_eval(args: EvalArgs) -> Result<()> {
    let device = args.device;
    let id = args.checkpoint.clone();
    let use_case = EvalUseCase::new(args.into());

    let losses = match device {
        DeviceKind::Cpu => use_case.execute::<NdArray>(NdArrayDevice::default())?,
        DeviceKind::Wgpu => use_case.execute::<Wgpu>(WgpuDevice::default())?,
    };

    println!(
        "checkpoint {id}: train loss {:.4}, val loss {:.4}",
        losses.train, losses.val
    );
    Ok(())
}
