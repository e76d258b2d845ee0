use burn::{nn::Dropout, prelude::*};

/// Whether a forward pass is a training pass.
///
/// Passed explicitly into every layer that owns a dropout; nothing in the
/// module tree stores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Train,
    Eval,
}

impl Mode {
    /// Apply `dropout` in `Train`, identity in `Eval`.
    pub fn dropout<B: Backend, const D: usize>(self, dropout: &Dropout, x: Tensor<B, D>) -> Tensor<B, D> {
        match self {
            Mode::Train => dropout.forward(x),
            Mode::Eval => x,
        }
    }
}
