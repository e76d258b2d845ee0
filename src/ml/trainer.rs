// ============================================================
// Layer 5 — Training Loop
// ============================================================
// One process, one thread, epochs counted from 0:
//
//   for epoch in 0..epochs:
//       if epoch % eval_interval == 0 or epoch is the last one:
//           estimate_loss on both splits (eval mode, no autodiff)
//           append metrics, save checkpoint_<epoch>
//       sample a training batch
//       forward → binary + classification → backward
//       Adam step, only when apply_optimizer_step is set
//
// Key Burn points:
//   - Training runs on an AutodiffBackend
//   - model.valid() gives the same weights on the inner backend,
//     which is how loss estimation runs without gradient tracking
//   - gradients are fresh per backward() call, nothing accumulates
//
// Reference: Burn Book §5 (Custom Training Loop), Kingma & Ba (2015) Adam

use anyhow::Result;
use burn::{
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::data::{batcher::AppBatch, sampler::BatchSampler, splitter::Split};
use crate::domain::traits::AppSource;
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::{EvalMetrics, MetricsLogger},
};
use crate::ml::{mode::Mode, model::Encoder};

/// Loop schedule and optimiser settings.
#[derive(Debug, Clone)]
pub struct TrainerSettings {
    pub epochs: usize,
    /// Evaluate and checkpoint every this many epochs
    pub eval_interval: usize,
    /// Batches averaged per split when estimating the loss
    pub eval_iters: usize,
    pub learning_rate: f64,
    /// When false, gradients are computed but the weights never move
    pub apply_optimizer_step: bool,
}

/// Mean combined loss per split.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitLosses {
    pub train: f64,
    pub val: f64,
}

/// Epochs at which the loss is estimated and a checkpoint written.
pub fn is_eval_epoch(epoch: usize, eval_interval: usize, epochs: usize) -> bool {
    epoch % eval_interval.max(1) == 0 || epoch + 1 == epochs
}

/// Average the combined loss over `eval_iters` fresh batches of each split.
///
/// Always runs in `Mode::Eval`; pass `model.valid()` from a training model
/// so no autodiff graph is built.
pub fn estimate_loss<B: Backend, S: AppSource>(
    model: &Encoder<B>,
    sampler: &mut BatchSampler<S>,
    eval_iters: usize,
    device: &B::Device,
) -> Result<SplitLosses> {
    let mut means = [0.0f64; 2];

    for (slot, split) in Split::ALL.into_iter().enumerate() {
        let mut sum = 0.0;
        for _ in 0..eval_iters {
            let batch = sampler.sample::<B>(split, device)?;
            let losses = model.forward(
                batch.tokens,
                Some(batch.binary),
                Some(batch.classification),
                Mode::Eval,
            )?;
            sum += losses.combined().into_scalar().elem::<f64>();
        }
        means[slot] = sum / eval_iters.max(1) as f64;
    }

    Ok(SplitLosses {
        train: means[0],
        val: means[1],
    })
}

/// One optimisation step on `batch`; returns the updated model and its loss.
pub fn train_step<B, O>(
    model: Encoder<B>,
    optim: &mut O,
    batch: AppBatch<B>,
    learning_rate: f64,
    apply_optimizer_step: bool,
) -> Result<(Encoder<B>, f64)>
where
    B: AutodiffBackend,
    O: Optimizer<Encoder<B>, B>,
{
    let losses = model.forward(
        batch.tokens,
        Some(batch.binary),
        Some(batch.classification),
        Mode::Train,
    )?;
    let loss = losses.combined();
    let loss_value = loss.clone().into_scalar().elem::<f64>();

    let grads = loss.backward();
    if !apply_optimizer_step {
        return Ok((model, loss_value));
    }

    let grads = GradientsParams::from_grads(grads, &model);
    let model = optim.step(learning_rate, model, grads);
    Ok((model, loss_value))
}

/// Run the full epoch loop and return the final model.
pub fn run_training<B: AutodiffBackend, S: AppSource>(
    settings: &TrainerSettings,
    mut model: Encoder<B>,
    sampler: &mut BatchSampler<S>,
    checkpoints: &CheckpointManager,
    metrics: &MetricsLogger,
    device: &B::Device,
) -> Result<Encoder<B>> {
    let mut optim = AdamConfig::new().init();
    let mut best_val = f64::INFINITY;

    if settings.apply_optimizer_step {
        tracing::info!("Adam step enabled, lr {}", settings.learning_rate);
    } else {
        tracing::warn!("No optimizer step: gradients are computed but weights stay fixed (pass --update to train)");
    }

    for epoch in 0..settings.epochs {
        if is_eval_epoch(epoch, settings.eval_interval, settings.epochs) {
            let losses = estimate_loss(&model.valid(), sampler, settings.eval_iters, device)?;
            println!(
                "step {epoch}: train loss {:.4}, val loss {:.4}",
                losses.train, losses.val
            );

            let row = EvalMetrics::new(epoch, losses.train, losses.val);
            if row.is_improvement(best_val) {
                tracing::info!("Validation loss improved to {:.4}", losses.val);
                best_val = losses.val;
            }
            metrics.log(&row)?;

            let path = checkpoints.save_model(&model, epoch)?;
            tracing::info!("Checkpoint saved to '{}'", path.display());
        }

        let batch = sampler.sample::<B>(Split::Train, device)?;
        let (next, loss) = train_step(
            model,
            &mut optim,
            batch,
            settings.learning_rate,
            settings.apply_optimizer_step,
        )?;
        model = next;
        tracing::debug!("epoch {epoch}: batch loss {loss:.4}");
    }

    tracing::info!("Training complete after {} epochs", settings.epochs);
    tracing::info!("Metrics written to '{}'", metrics.csv_path().display());
    Ok(model)
}
