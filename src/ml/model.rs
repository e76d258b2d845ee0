use burn::{
    nn::{Embedding, LayerNorm, LayerNormConfig},
    prelude::*,
};
use thiserror::Error;

use crate::domain::app_record::BINARY_LABELS;
use crate::ml::{
    block::TransformerBlock,
    heads::{binary_loss, classification_loss, BinaryHead, GroupHead},
    init,
    mode::Mode,
};

/// Construction and forward-pass failures of the encoder.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("n_embd ({n_embd}) must be divisible by n_head ({n_head})")]
    HeadsDoNotDivide { n_embd: usize, n_head: usize },

    #[error("invalid hyperparameter {name}: {reason}")]
    InvalidHyperparameter { name: &'static str, reason: String },

    /// Embedding lookup outside the table.
    #[error("token id {token} is outside the embedding table [0, {vocab_size})")]
    TokenOutOfRange { token: i64, vocab_size: usize },

    #[error("{what} has shape {found:?}, expected {expected}")]
    LabelShape {
        what: &'static str,
        expected: String,
        found: Vec<usize>,
    },

    #[error("checkpoint does not match the model architecture: {detail}")]
    ArchitectureMismatch { detail: String },
}

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize.
#[derive(Config, Debug)]
pub struct EncoderConfig {
    pub vocab_size: usize,
    pub group_num: usize,
    pub n_blocks: usize,
    pub n_embd: usize,
    /// Must divide `n_embd`
    pub n_head: usize,
    #[config(default = 0.0)]
    pub dropout: f64,
}

impl EncoderConfig {
    /// Reject configurations the encoder cannot be built from.
    pub fn validate(&self) -> Result<(), ModelError> {
        let positive = [
            ("vocab_size", self.vocab_size),
            ("group_num", self.group_num),
            ("n_embd", self.n_embd),
            ("n_head", self.n_head),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(ModelError::InvalidHyperparameter {
                    name,
                    reason: "must be greater than 0".into(),
                });
            }
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(ModelError::InvalidHyperparameter {
                name: "dropout",
                reason: format!("{} is outside [0, 1)", self.dropout),
            });
        }
        if self.n_embd % self.n_head != 0 {
            return Err(ModelError::HeadsDoNotDivide {
                n_embd: self.n_embd,
                n_head: self.n_head,
            });
        }
        Ok(())
    }

    /// Width of one attention head.
    pub fn head_size(&self) -> usize {
        self.n_embd / self.n_head
    }

    /// Build a freshly initialised encoder on `device`.
    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<Encoder<B>, ModelError> {
        self.validate()?;

        let blocks = (0..self.n_blocks)
            .map(|_| TransformerBlock::new(self.n_embd, self.n_head, self.head_size(), self.dropout, device))
            .collect();

        Ok(Encoder {
            embedding: init::embedding(self.vocab_size, self.n_embd, device),
            blocks,
            norm: LayerNormConfig::new(self.n_embd).init(device),
            binary_head: BinaryHead::new(self.n_embd, device),
            group_head: GroupHead::new(self.n_embd, self.group_num, device),
            vocab_size: self.vocab_size,
        })
    }
}

/// Token embedding → n_blocks pre-norm blocks → LayerNorm → binary and group heads.
///
/// No positional embedding: positions only matter through the label alignment.
#[derive(Module, Debug)]
pub struct Encoder<B: Backend> {
    pub embedding: Embedding<B>,
    pub blocks: Vec<TransformerBlock<B>>,
    pub norm: LayerNorm<B>,
    pub binary_head: BinaryHead<B>,
    pub group_head: GroupHead<B>,
    pub vocab_size: usize,
}

/// The two losses of one forward pass, each a one-element tensor.
#[derive(Debug, Clone)]
pub struct EncoderLosses<B: Backend> {
    pub binary: Tensor<B, 1>,
    pub classification: Tensor<B, 1>,
}

impl<B: Backend> EncoderLosses<B> {
    pub fn zero(device: &B::Device) -> Self {
        Self {
            binary: Tensor::zeros([1], device),
            classification: Tensor::zeros([1], device),
        }
    }

    /// binary + classification, the scalar that gets backpropagated.
    pub fn combined(self) -> Tensor<B, 1> {
        self.binary + self.classification
    }
}

impl<B: Backend> Encoder<B> {
    /// Run the encoder and score it against the labels.
    ///
    /// Both label tensors are needed for a loss; if either is missing the two
    /// losses come back as exact zeros.
    ///
    /// tokens: [B, T], binary: [B, 2], classification: [B, L] with L <= T
    pub fn forward(
        &self,
        tokens: Tensor<B, 2, Int>,
        binary: Option<Tensor<B, 2, Int>>,
        classification: Option<Tensor<B, 2, Int>>,
        mode: Mode,
    ) -> Result<EncoderLosses<B>, ModelError> {
        let device = tokens.device();
        let [batch, seq_len] = tokens.dims();
        self.check_tokens(&tokens)?;

        let (binary, classification) = match (binary, classification) {
            (Some(binary), Some(classification)) => (binary, classification),
            _ => return Ok(EncoderLosses::zero(&device)),
        };

        if binary.dims() != [batch, BINARY_LABELS] {
            return Err(ModelError::LabelShape {
                what: "binary labels",
                expected: format!("[{batch}, {BINARY_LABELS}]"),
                found: binary.dims().to_vec(),
            });
        }
        let [label_batch, n_labels] = classification.dims();
        if label_batch != batch || n_labels == 0 || n_labels > seq_len {
            return Err(ModelError::LabelShape {
                what: "classification labels",
                expected: format!("[{batch}, 1..={seq_len}]"),
                found: classification.dims().to_vec(),
            });
        }

        let x = self.encode(tokens, mode);
        Ok(EncoderLosses {
            binary: binary_loss(self.binary_head.forward(x.clone()), binary),
            classification: classification_loss(self.group_head.logits(x), classification),
        })
    }

    /// Normalised representation, [B, T, E].
    pub(crate) fn encode(&self, tokens: Tensor<B, 2, Int>, mode: Mode) -> Tensor<B, 3> {
        let mut x = self.embedding.forward(tokens);
        for block in &self.blocks {
            x = block.forward(x, mode);
        }
        self.norm.forward(x)
    }

    fn check_tokens(&self, tokens: &Tensor<B, 2, Int>) -> Result<(), ModelError> {
        if tokens.dims().iter().product::<usize>() == 0 {
            return Ok(());
        }

        let min = tokens.clone().min().into_scalar().elem::<i64>();
        let max = tokens.clone().max().into_scalar().elem::<i64>();
        let bad = if min < 0 {
            Some(min)
        } else if max as usize >= self.vocab_size {
            Some(max)
        } else {
            None
        };

        match bad {
            Some(token) => Err(ModelError::TokenOutOfRange {
                token,
                vocab_size: self.vocab_size,
            }),
            None => Ok(()),
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn scenario_config() -> EncoderConfig {
        EncoderConfig::new(50, 4, 2, 16, 4).with_dropout(0.0)
    }

    fn int_tensor(values: Vec<i64>, shape: [usize; 2]) -> Tensor<TestBackend, 2, Int> {
        Tensor::from_data(TensorData::new(values, shape), &Default::default())
    }

    fn scenario_inputs() -> (
        Tensor<TestBackend, 2, Int>,
        Tensor<TestBackend, 2, Int>,
        Tensor<TestBackend, 2, Int>,
    ) {
        let tokens = int_tensor((0..16).map(|i| (i * 3) % 50).collect(), [2, 8]);
        let binary = int_tensor(vec![1, 0, 0, 1], [2, 2]);
        let groups = int_tensor((0..12).map(|i| i % 4).collect(), [2, 6]);
        (tokens, binary, groups)
    }

    #[test]
    fn test_scenario_forward_gives_finite_losses() {
        let model = scenario_config().init::<TestBackend>(&Default::default()).unwrap();
        let (tokens, binary, groups) = scenario_inputs();

        let losses = model
            .forward(tokens, Some(binary), Some(groups), Mode::Train)
            .unwrap();
        let b = losses.binary.clone().into_scalar();
        let c = losses.classification.clone().into_scalar();
        let total = losses.combined().into_scalar();

        assert!(b.is_finite() && b >= 0.0, "binary loss {b}");
        assert!(c.is_finite() && c >= 0.0, "classification loss {c}");
        assert!(total.is_finite() && total >= 0.0);
    }

    #[test]
    fn test_fresh_model_losses_are_near_chance() {
        // Small init keeps both heads close to uniform.
        let model = scenario_config().init::<TestBackend>(&Default::default()).unwrap();
        let (tokens, binary, groups) = scenario_inputs();
        let losses = model
            .forward(tokens, Some(binary), Some(groups), Mode::Eval)
            .unwrap();

        let b = losses.binary.into_scalar();
        let c = losses.classification.into_scalar();
        assert!((b - std::f32::consts::LN_2).abs() < 0.1, "binary loss {b}");
        assert!((c - 4f32.ln()).abs() < 0.2, "classification loss {c}");
    }

    #[test]
    fn test_missing_labels_give_zero_loss() {
        let model = scenario_config().init::<TestBackend>(&Default::default()).unwrap();
        let (tokens, binary, _) = scenario_inputs();

        let losses = model.forward(tokens.clone(), None, None, Mode::Eval).unwrap();
        assert_eq!(losses.combined().into_scalar(), 0.0);

        let losses = model.forward(tokens, Some(binary), None, Mode::Eval).unwrap();
        assert_eq!(losses.binary.into_scalar(), 0.0);
        assert_eq!(losses.classification.into_scalar(), 0.0);
    }

    #[test]
    fn test_heads_must_divide_width() {
        let err = EncoderConfig::new(50, 4, 2, 18, 4)
            .init::<TestBackend>(&Default::default())
            .unwrap_err();
        assert!(matches!(err, ModelError::HeadsDoNotDivide { n_embd: 18, n_head: 4 }));
    }

    #[test]
    fn test_invalid_dropout_rejected() {
        let err = EncoderConfig::new(50, 4, 2, 16, 4)
            .with_dropout(1.0)
            .validate()
            .unwrap_err();
        assert!(matches!(err, ModelError::InvalidHyperparameter { name: "dropout", .. }));
    }

    #[test]
    fn test_out_of_range_token_is_an_error() {
        let model = scenario_config().init::<TestBackend>(&Default::default()).unwrap();
        let tokens = int_tensor(vec![1, 2, 50, 3], [1, 4]);
        let err = model.forward(tokens, None, None, Mode::Eval).unwrap_err();
        assert!(matches!(err, ModelError::TokenOutOfRange { token: 50, vocab_size: 50 }));

        let tokens = int_tensor(vec![1, -1, 2, 3], [1, 4]);
        let err = model.forward(tokens, None, None, Mode::Eval).unwrap_err();
        assert!(matches!(err, ModelError::TokenOutOfRange { token: -1, .. }));
    }

    #[test]
    fn test_label_shapes_are_checked() {
        let model = scenario_config().init::<TestBackend>(&Default::default()).unwrap();
        let (tokens, binary, _) = scenario_inputs();
        let too_many = int_tensor(vec![0; 18], [2, 9]);

        let err = model
            .forward(tokens, Some(binary), Some(too_many), Mode::Eval)
            .unwrap_err();
        assert!(matches!(err, ModelError::LabelShape { what: "classification labels", .. }));
    }

    #[test]
    fn test_dropout_fires_in_train_mode_only() {
        // NdArray alone never drops; the autodiff wrapper does.
        type DropoutBackend = burn::backend::Autodiff<NdArray>;
        let device = Default::default();
        let model = scenario_config()
            .with_dropout(0.5)
            .init::<DropoutBackend>(&device)
            .unwrap();
        let tokens = Tensor::<DropoutBackend, 2, Int>::from_data(
            TensorData::new((0..16).map(|i| (i * 3) % 50).collect::<Vec<i64>>(), [2, 8]),
            &device,
        );

        let run = |mode| {
            model
                .encode(tokens.clone(), mode)
                .into_data()
                .to_vec::<f32>()
                .unwrap()
        };
        assert_ne!(run(Mode::Train), run(Mode::Train));
        assert_eq!(run(Mode::Eval), run(Mode::Eval));
    }

    #[test]
    fn test_block_count() {
        let model = scenario_config().init::<TestBackend>(&Default::default()).unwrap();
        assert_eq!(model.blocks.len(), 2);
        assert_eq!(model.blocks[0].attention.heads.len(), 4);
        assert_eq!(model.blocks[0].attention.heads[0].head_size, 4);
    }
}
