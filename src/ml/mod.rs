// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// The encoder, its losses and the training loop.
//
//   mode.rs      Train / Eval switch threaded through dropout
//   init.rs      N(0, 0.02) weights, zero biases
//   attention.rs bidirectional multi-head self-attention
//   block.rs     feed-forward + pre-norm residual block
//   heads.rs     binary (sigmoid) and group (softmax) heads,
//                with their losses
//   model.rs     EncoderConfig and the full Encoder
//   trainer.rs   estimate_loss, train_step, epoch loop
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)
//            Vaswani et al. (2017) Attention Is All You Need

pub mod mode;

/// Parameter initialisation
pub mod init;

pub mod attention;

pub mod block;

/// Output heads and loss functions
pub mod heads;

/// Encoder architecture
pub mod model;

/// Training loop with periodic evaluation and checkpointing
pub mod trainer;
