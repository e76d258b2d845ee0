// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Everything that touches the filesystem or the terminal on
// behalf of a run:
//
//   checkpoint.rs  encoder weights per evaluation epoch, plus a
//                  copy of the run's hyperparameters
//   hyperparams.rs hyperparameters.json, with defaults seeded
//                  into the data directory when missing
//   metrics.rs     metrics.csv, one row per evaluation
//   prompt.rs      the interactive "which checkpoint?" question
//
// Reference: Burn Book §5 (Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// hyperparameters.json reading, validation and defaults
pub mod hyperparams;

/// Evaluation metrics CSV logger
pub mod metrics;

/// Checkpoint selection prompt
pub mod prompt;
