// ============================================================
// Layer 4 — Application Batcher
// ============================================================
// Stacks a Vec<AppRecord> into tensors for one training step.
//
// How batching works here:
//   Input:  N records, each with T tokens and 2 + L labels
//   Output: AppBatch with
//             tokens          [N, T]
//             binary          [N, 2]
//             classification  [N, L]
//
//   Every record is validated first (id and label ranges), then
//   all rows are flattened and reshaped:
//   [a1_t1, ..., a1_tT, a2_t1, ..., aN_tT] → [N, T]
//
// Records are never padded or truncated: a record whose length
// differs from the first one fails the whole batch.

use burn::prelude::*;

use crate::domain::app_record::{AppRecord, BINARY_LABELS};
use crate::domain::error::DataError;

// ─── AppBatch ─────────────────────────────────────────────────────────────────
/// A batch of applications ready for the encoder forward pass.
#[derive(Debug, Clone)]
pub struct AppBatch<B: Backend> {
    /// Token ids, shape: [batch_size, seq_len]
    pub tokens: Tensor<B, 2, Int>,

    /// Binary indicator pair per application, shape: [batch_size, 2]
    pub binary: Tensor<B, 2, Int>,

    /// Group label per aligned position, shape: [batch_size, group_labels]
    pub classification: Tensor<B, 2, Int>,
}

/// Value ranges every record must respect before it reaches the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchLimits {
    pub vocab_size: usize,
    pub group_num: usize,
    /// Required sequence length, when the run fixes one
    pub block_size: Option<usize>,
}

// ─── AppBatcher ───────────────────────────────────────────────────────────────
/// Holds the target device so tensors are created on the right GPU/CPU.
#[derive(Clone, Debug)]
pub struct AppBatcher<B: Backend> {
    pub device: B::Device,
    pub limits: BatchLimits,
}

impl<B: Backend> AppBatcher<B> {
    pub fn new(device: B::Device, limits: BatchLimits) -> Self {
        Self { device, limits }
    }

    /// Validate and stack `items` into one batch.
    pub fn batch(&self, items: Vec<AppRecord>) -> Result<AppBatch<B>, DataError> {
        let first = items.first().ok_or(DataError::EmptyBatch)?;
        let seq_len = first.seq_len();
        let group_len = first.labels.groups.len();

        for item in &items {
            item.validate(self.limits.vocab_size, self.limits.group_num)?;

            if let Some(block_size) = self.limits.block_size {
                if item.seq_len() != block_size {
                    return Err(DataError::BlockSizeMismatch {
                        app: item.name.clone(),
                        block_size,
                        found: item.seq_len(),
                    });
                }
            }
            if item.seq_len() != seq_len {
                return Err(DataError::RaggedBatch {
                    app: item.name.clone(),
                    what: "tokens",
                    expected: seq_len,
                    found: item.seq_len(),
                });
            }
            if item.labels.groups.len() != group_len {
                return Err(DataError::RaggedBatch {
                    app: item.name.clone(),
                    what: "group labels",
                    expected: group_len,
                    found: item.labels.groups.len(),
                });
            }
        }

        let batch_size = items.len();

        // ── Flatten every row in sample order ─────────────────────────────────
        let tokens_flat: Vec<i64> = items.iter().flat_map(|r| r.tokens.iter().copied()).collect();
        let binary_flat: Vec<i64> = items.iter().flat_map(|r| r.labels.binary).collect();
        let groups_flat: Vec<i64> = items
            .iter()
            .flat_map(|r| r.labels.groups.iter().copied())
            .collect();

        let tokens = Tensor::<B, 2, Int>::from_data(
            TensorData::new(tokens_flat, [batch_size, seq_len]),
            &self.device,
        );
        let binary = Tensor::<B, 2, Int>::from_data(
            TensorData::new(binary_flat, [batch_size, BINARY_LABELS]),
            &self.device,
        );
        let classification = Tensor::<B, 2, Int>::from_data(
            TensorData::new(groups_flat, [batch_size, group_len]),
            &self.device,
        );

        Ok(AppBatch {
            tokens,
            binary,
            classification,
        })
    }
}
