// ============================================================
// Layer 5 — Classification Heads and Losses
// ============================================================
// Both heads read the same normalised encoder output [B, T, E]
// and predict per position.
//
// BinaryHead: E → 2, then an elementwise sigmoid on EACH logit.
//   The two outputs are independent probabilities, not a
//   2-way distribution; they do not sum to 1.
//
// GroupHead: E → group_num, softmax over the group axis.
//
// Losses:
//   binary         BCE between the [B·T, 2] sigmoid output and
//                  the app's binary pair repeated at every position
//   classification cross-entropy between the first L positions'
//                  group logits [B·L, G] and the L group labels

use burn::{
    nn::{
        loss::{BinaryCrossEntropyLossConfig, CrossEntropyLossConfig},
        Linear,
    },
    prelude::*,
    tensor::activation::{sigmoid, softmax},
};

use crate::domain::app_record::BINARY_LABELS;
use crate::ml::init;

#[derive(Module, Debug)]
pub struct BinaryHead<B: Backend> {
    pub fc: Linear<B>,
}

impl<B: Backend> BinaryHead<B> {
    pub fn new(n_embd: usize, device: &B::Device) -> Self {
        Self {
            fc: init::linear(n_embd, BINARY_LABELS, true, device),
        }
    }

    /// [B, T, E] → [B, T, 2], every value in [0, 1]
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        sigmoid(self.fc.forward(x))
    }
}

#[derive(Module, Debug)]
pub struct GroupHead<B: Backend> {
    pub fc: Linear<B>,
}

impl<B: Backend> GroupHead<B> {
    pub fn new(n_embd: usize, group_num: usize, device: &B::Device) -> Self {
        Self {
            fc: init::linear(n_embd, group_num, true, device),
        }
    }

    /// Unnormalised scores, [B, T, G]
    pub fn logits(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        self.fc.forward(x)
    }

    /// [B, T, G], each row a distribution over groups.
    ///
    /// Probability view for inspecting predictions. Training never calls
    /// it: the classification loss takes `logits` and normalises inside
    /// the cross-entropy.
    #[allow(dead_code)]
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        softmax(self.logits(x), 2)
    }
}

/// BCE of per-position sigmoid outputs against per-application labels.
///
/// `probs`: [B, T, 2], `labels`: [B, 2] holding 0 or 1.
pub fn binary_loss<B: Backend>(probs: Tensor<B, 3>, labels: Tensor<B, 2, Int>) -> Tensor<B, 1> {
    let [batch, seq_len, width] = probs.dims();

    let targets = labels
        .unsqueeze_dim::<3>(1)
        .expand([batch, seq_len, width])
        .reshape([batch * seq_len, width]);
    let probs = probs.reshape([batch * seq_len, width]);

    BinaryCrossEntropyLossConfig::new()
        .init(&probs.device())
        .forward(probs, targets)
}

/// Cross-entropy of group logits at positions `0..L` against `labels` [B, L].
///
/// Callers guarantee `L <= T`.
pub fn classification_loss<B: Backend>(logits: Tensor<B, 3>, labels: Tensor<B, 2, Int>) -> Tensor<B, 1> {
    let [batch, _, group_num] = logits.dims();
    let [_, n_labels] = labels.dims();

    let logits = logits
        .slice([0..batch, 0..n_labels, 0..group_num])
        .reshape([batch * n_labels, group_num]);
    let targets = labels.reshape([batch * n_labels]);

    CrossEntropyLossConfig::new()
        .init(&logits.device())
        .forward(logits, targets)
}
