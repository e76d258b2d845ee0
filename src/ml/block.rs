use burn::{
    nn::{Dropout, DropoutConfig, LayerNorm, LayerNormConfig, Linear},
    prelude::*,
    tensor::activation::relu,
};

use crate::ml::{attention::MultiHeadAttention, init, mode::Mode};

/// Position-wise MLP: E → 4E → ReLU → E → dropout.
#[derive(Module, Debug)]
pub struct FeedForward<B: Backend> {
    pub expand: Linear<B>,
    pub contract: Linear<B>,
    pub dropout: Dropout,
}

impl<B: Backend> FeedForward<B> {
    pub fn new(n_embd: usize, dropout: f64, device: &B::Device) -> Self {
        Self {
            expand: init::linear(n_embd, 4 * n_embd, true, device),
            contract: init::linear(4 * n_embd, n_embd, true, device),
            dropout: DropoutConfig::new(dropout).init(),
        }
    }

    pub fn forward(&self, x: Tensor<B, 3>, mode: Mode) -> Tensor<B, 3> {
        let x = relu(self.expand.forward(x));
        mode.dropout(&self.dropout, self.contract.forward(x))
    }
}

/// Pre-norm residual block:
///
/// ```text
/// x = x + attention(ln1(x))
/// x = x + feed_forward(ln2(x))
/// ```
#[derive(Module, Debug)]
pub struct TransformerBlock<B: Backend> {
    pub attention: MultiHeadAttention<B>,
    pub feed_forward: FeedForward<B>,
    pub ln1: LayerNorm<B>,
    pub ln2: LayerNorm<B>,
}

impl<B: Backend> TransformerBlock<B> {
    pub fn new(
        n_embd: usize,
        n_head: usize,
        head_size: usize,
        dropout: f64,
        device: &B::Device,
    ) -> Self {
        Self {
            attention: MultiHeadAttention::new(n_embd, n_head, head_size, dropout, device),
            feed_forward: FeedForward::new(n_embd, dropout, device),
            ln1: LayerNormConfig::new(n_embd).init(device),
            ln2: LayerNormConfig::new(n_embd).init(device),
        }
    }

    pub fn forward(&self, x: Tensor<B, 3>, mode: Mode) -> Tensor<B, 3> {
        let x = x.clone() + self.attention.forward(self.ln1.forward(x), mode);
        x.clone() + self.feed_forward.forward(self.ln2.forward(x), mode)
    }
}
