// ============================================================
// Layer 5 — Weight Initialisation
// ============================================================
// The encoder has exactly two kinds of parameterised layer that
// draw random weights: token embeddings and linear projections.
// Both are built here and nowhere else:
//
//   weights ~ N(0, 0.02)
//   biases  = 0            (linear layers that carry one)
//
// LayerNorm keeps Burn's own gamma = 1, beta = 0.
//
// Randomness comes from the backend RNG; seed it with
// `B::seed(..)` before construction for reproducible weights.

use burn::{
    nn::{Embedding, EmbeddingConfig, Initializer, Linear, LinearConfig},
    prelude::*,
};

/// Standard deviation of every initial weight.
pub const INIT_STD: f64 = 0.02;

fn normal() -> Initializer {
    Initializer::Normal {
        mean: 0.0,
        std: INIT_STD,
    }
}

/// Embedding table of `n_embedding` rows of width `d_model`.
pub fn embedding<B: Backend>(n_embedding: usize, d_model: usize, device: &B::Device) -> Embedding<B> {
    EmbeddingConfig::new(n_embedding, d_model)
        .with_initializer(normal())
        .init(device)
}

/// Linear map `d_input → d_output`, optionally with a zeroed bias.
pub fn linear<B: Backend>(d_input: usize, d_output: usize, bias: bool, device: &B::Device) -> Linear<B> {
    let mut layer = LinearConfig::new(d_input, d_output)
        .with_bias(bias)
        .with_initializer(normal())
        .init(device);

    // The config initializer would draw the bias from N(0, 0.02) too.
    layer.bias = layer
        .bias
        .map(|_| Initializer::Zeros.init([d_output], device));
    layer
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn mean_std(values: &[f32]) -> (f64, f64) {
        let n = values.len() as f64;
        let mean = values.iter().map(|&v| v as f64).sum::<f64>() / n;
        let var = values.iter().map(|&v| (v as f64 - mean).powi(2)).sum::<f64>() / n;
        (mean, var.sqrt())
    }

    #[test]
    fn test_embedding_weights_are_small_normal() {
        let device = Default::default();
        let table = embedding::<TestBackend>(200, 32, &device);
        let values = table.weight.val().into_data().to_vec::<f32>().unwrap();

        let (mean, std) = mean_std(&values);
        assert!(mean.abs() < 0.005, "mean {mean}");
        assert!((std - INIT_STD).abs() < 0.004, "std {std}");
    }

    #[test]
    fn test_linear_bias_starts_at_zero() {
        let device = Default::default();
        let layer = linear::<TestBackend>(64, 128, true, &device);

        let bias = layer.bias.as_ref().unwrap().val().into_data().to_vec::<f32>().unwrap();
        assert_eq!(bias.len(), 128);
        assert!(bias.iter().all(|&b| b == 0.0));

        let weights = layer.weight.val().into_data().to_vec::<f32>().unwrap();
        let (_, std) = mean_std(&weights);
        assert!((std - INIT_STD).abs() < 0.004, "std {std}");
    }

    #[test]
    fn test_linear_without_bias() {
        let device = Default::default();
        let layer = linear::<TestBackend>(16, 4, false, &device);
        assert!(layer.bias.is_none());
        assert_eq!(layer.weight.val().dims(), [16, 4]);
    }
}
