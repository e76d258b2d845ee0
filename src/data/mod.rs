// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between the tokenizer's output files and the
// tensors of one training step.
//
//   <data_dir>/<app>/{api,classification}.txt
//       │
//       ▼
//   DirSource         → lists apps, parses integer files
//       │
//       ▼
//   split (80/20)     → positional train / validation subsets
//       │
//       ▼
//   BatchSampler      → random picks with replacement
//       │
//       ▼
//   AppBatcher        → validated, stacked Int tensors
//
// Reference: Burn Book §4 (Datasets and Batching)

/// Reads application directories from disk
pub mod loader;

/// Positional train/validation split
pub mod splitter;

/// Stacks records into tensor batches
pub mod batcher;

/// Draws random batches for a split
pub mod sampler;

#[cfg(test)]
pub mod testing;
