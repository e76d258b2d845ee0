// ============================================================
// Layer 5 — Self-Attention
// ============================================================
// AttentionHead: one scaled dot-product self-attention unit.
//
//   q, k, v = x·Wq, x·Wk, x·Wv          (no bias, [B, T, H])
//   w       = softmax(q·kᵀ / √H)         ([B, T, T], over keys)
//   out     = dropout(w) · v             ([B, T, H])
//
// No causal mask: every API call attends to every other call
// of the same application.
//
// MultiHeadAttention runs n_head heads side by side, concatenates
// them back to width n_head·H = E, then projects E → E.

use burn::{
    nn::{Dropout, DropoutConfig, Linear},
    prelude::*,
    tensor::activation::softmax,
};

use crate::ml::{init, mode::Mode};

#[derive(Module, Debug)]
pub struct AttentionHead<B: Backend> {
    pub query: Linear<B>,
    pub key: Linear<B>,
    pub value: Linear<B>,
    pub dropout: Dropout,
    pub head_size: usize,
}

impl<B: Backend> AttentionHead<B> {
    pub fn new(n_embd: usize, head_size: usize, dropout: f64, device: &B::Device) -> Self {
        Self {
            query: init::linear(n_embd, head_size, false, device),
            key: init::linear(n_embd, head_size, false, device),
            value: init::linear(n_embd, head_size, false, device),
            dropout: DropoutConfig::new(dropout).init(),
            head_size,
        }
    }

    /// [batch, T, E] → [batch, T, head_size]
    pub fn forward(&self, x: Tensor<B, 3>, mode: Mode) -> Tensor<B, 3> {
        let q = self.query.forward(x.clone());
        let k = self.key.forward(x.clone());
        let v = self.value.forward(x);

        // [batch, T, T]
        let scores = q
            .matmul(k.swap_dims(1, 2))
            .div_scalar((self.head_size as f64).sqrt());
        let weights = softmax(scores, 2);
        let weights = mode.dropout(&self.dropout, weights);

        weights.matmul(v)
    }
}

#[derive(Module, Debug)]
pub struct MultiHeadAttention<B: Backend> {
    pub heads: Vec<AttentionHead<B>>,
    pub proj: Linear<B>,
    pub dropout: Dropout,
}

impl<B: Backend> MultiHeadAttention<B> {
    /// Caller guarantees `n_head * head_size == n_embd`.
    pub fn new(n_embd: usize, n_head: usize, head_size: usize, dropout: f64, device: &B::Device) -> Self {
        let heads = (0..n_head)
            .map(|_| AttentionHead::new(n_embd, head_size, dropout, device))
            .collect();
        Self {
            heads,
            proj: init::linear(n_head * head_size, n_embd, true, device),
            dropout: DropoutConfig::new(dropout).init(),
        }
    }

    /// [batch, T, E] → [batch, T, E]
    pub fn forward(&self, x: Tensor<B, 3>, mode: Mode) -> Tensor<B, 3> {
        let per_head = self
            .heads
            .iter()
            .map(|head| head.forward(x.clone(), mode))
            .collect();
        let out = self.proj.forward(Tensor::cat(per_head, 2));
        mode.dropout(&self.dropout, out)
    }
}
