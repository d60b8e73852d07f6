use anyhow::{anyhow, Result};
use burn::{
    module::Param,
    nn::{
        loss::CrossEntropyLossConfig,
        Embedding, EmbeddingConfig,
        Initializer,
        Linear, LinearConfig,
    },
    prelude::*,
    tensor::activation::relu,
};

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally — do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct ScamClassifierConfig {
    pub vocab_size:    usize,
    #[config(default = 16)]
    pub embedding_dim: usize,
    #[config(default = 24)]
    pub hidden_units:  usize,
    #[config(default = 3)]
    pub num_classes:   usize,
}

impl ScamClassifierConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> ScamClassifier<B> {
        let embedding = EmbeddingConfig::new(self.vocab_size, self.embedding_dim)
            .with_initializer(Initializer::Uniform { min: -0.05, max: 0.05 })
            .init(device);
        let mut hidden = LinearConfig::new(self.embedding_dim, self.hidden_units)
            .with_initializer(Initializer::XavierUniform { gain: 1.0 })
            .init(device);
        let mut output = LinearConfig::new(self.hidden_units, self.num_classes)
            .with_initializer(Initializer::XavierUniform { gain: 1.0 })
            .init(device);

        // The initializer covers the bias too; dense biases start at zero.
        hidden.bias = Some(Param::from_tensor(Tensor::zeros([self.hidden_units], device)));
        output.bias = Some(Param::from_tensor(Tensor::zeros([self.num_classes], device)));

        ScamClassifier { embedding, hidden, output }
    }
}

/// embedding → mean over the sequence → dense(ReLU) → dense
///
/// The mean includes padding positions; the exported graph
/// pools the same way, so both produce identical scores.
#[derive(Module, Debug)]
pub struct ScamClassifier<B: Backend> {
    pub embedding: Embedding<B>,
    pub hidden:    Linear<B>,
    pub output:    Linear<B>,
}

impl<B: Backend> ScamClassifier<B> {
    /// input_ids: [batch, seq_len] → logits: [batch, num_classes]
    pub fn forward(&self, input_ids: Tensor<B, 2, Int>) -> Tensor<B, 2> {
        let [batch_size, _seq_len] = input_ids.dims();

        let embedded = self.embedding.forward(input_ids); // [batch, seq_len, dim]
        let [_, _, dim] = embedded.dims();
        let pooled = embedded.mean_dim(1).reshape([batch_size, dim]);

        let hidden = relu(self.hidden.forward(pooled));
        self.output.forward(hidden)
    }

    /// Softmax probabilities, one row per input sequence
    #[cfg(test)]
    pub fn predict_proba(&self, input_ids: Tensor<B, 2, Int>) -> Tensor<B, 2> {
        burn::tensor::activation::softmax(self.forward(input_ids), 1)
    }

    /// Sparse categorical cross-entropy against integer labels.
    pub fn forward_classification(
        &self,
        input_ids: Tensor<B, 2, Int>,
        labels:    Tensor<B, 1, Int>,
    ) -> (Tensor<B, 1>, Tensor<B, 2>) {
        let logits = self.forward(input_ids);
        let loss = CrossEntropyLossConfig::new()
            .init(&logits.device())
            .forward(logits.clone(), labels);
        (loss, logits)
    }

    /// Copy every trained parameter out of the backend.
    pub fn weights(&self) -> Result<ModelWeights> {
        let [vocab_size, embedding_dim] = self.embedding.weight.dims();
        let [_, hidden_units]           = self.hidden.weight.dims();
        let [_, num_classes]            = self.output.weight.dims();

        Ok(ModelWeights {
            vocab_size,
            embedding_dim,
            hidden_units,
            num_classes,
            embedding:     tensor_to_vec(self.embedding.weight.val())?,
            hidden_weight: tensor_to_vec(self.hidden.weight.val())?,
            hidden_bias:   bias_to_vec(&self.hidden, hidden_units)?,
            output_weight: tensor_to_vec(self.output.weight.val())?,
            output_bias:   bias_to_vec(&self.output, num_classes)?,
        })
    }
}

fn tensor_to_vec<B: Backend, const D: usize>(tensor: Tensor<B, D>) -> Result<Vec<f32>> {
    tensor
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| anyhow!("Cannot read tensor data: {e:?}"))
}

fn bias_to_vec<B: Backend>(layer: &Linear<B>, units: usize) -> Result<Vec<f32>> {
    match &layer.bias {
        Some(bias) => tensor_to_vec(bias.val()),
        None       => Ok(vec![0.0; units]),
    }
}

/// Backend-free copy of the trained parameters, row-major.
///
/// Dense weights keep Burn's layout: [d_input, d_output].
#[derive(Debug, Clone, PartialEq)]
pub struct ModelWeights {
    pub vocab_size:    usize,
    pub embedding_dim: usize,
    pub hidden_units:  usize,
    pub num_classes:   usize,
    /// [vocab_size, embedding_dim]
    pub embedding:     Vec<f32>,
    /// [embedding_dim, hidden_units]
    pub hidden_weight: Vec<f32>,
    pub hidden_bias:   Vec<f32>,
    /// [hidden_units, num_classes]
    pub output_weight: Vec<f32>,
    pub output_bias:   Vec<f32>,
}

impl ModelWeights {
    pub fn parameter_count(&self) -> usize {
        self.embedding.len()
            + self.hidden_weight.len()
            + self.hidden_bias.len()
            + self.output_weight.len()
            + self.output_bias.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn small_model() -> ScamClassifier<TestBackend> {
        ScamClassifierConfig::new(50).init(&Default::default())
    }

    fn ids(rows: &[[i32; 4]]) -> Tensor<TestBackend, 2, Int> {
        let flat: Vec<i32> = rows.iter().flatten().copied().collect();
        Tensor::<TestBackend, 1, Int>::from_ints(flat.as_slice(), &Default::default())
            .reshape([rows.len(), 4])
    }

    #[test]
    fn test_default_architecture() {
        let cfg = ScamClassifierConfig::new(1000);
        assert_eq!(cfg.embedding_dim, 16);
        assert_eq!(cfg.hidden_units, 24);
        assert_eq!(cfg.num_classes, 3);
    }

    #[test]
    fn test_forward_shape() {
        let logits = small_model().forward(ids(&[[2, 3, 0, 0], [4, 5, 6, 0]]));
        assert_eq!(logits.dims(), [2, 3]);
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let probs: Vec<f32> = small_model()
            .predict_proba(ids(&[[2, 3, 0, 0], [7, 1, 1, 9]]))
            .into_data()
            .convert::<f32>()
            .to_vec()
            .unwrap();

        for row in probs.chunks(3) {
            assert!(row.iter().all(|&p| p >= 0.0));
            assert!((row.iter().sum::<f32>() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_embedding_init_range() {
        let w = small_model().weights().unwrap();
        assert!(w.embedding.iter().all(|v| v.abs() <= 0.05));
    }

    #[test]
    fn test_dense_biases_start_at_zero() {
        let w = small_model().weights().unwrap();
        assert!(w.hidden_bias.iter().all(|&b| b == 0.0));
        assert!(w.output_bias.iter().all(|&b| b == 0.0));
        assert!(w.hidden_weight.iter().any(|&v| v != 0.0));
    }

    #[test]
    fn test_weights_layout() {
        let w = small_model().weights().unwrap();
        assert_eq!(w.embedding.len(), 50 * 16);
        assert_eq!(w.hidden_weight.len(), 16 * 24);
        assert_eq!(w.hidden_bias.len(), 24);
        assert_eq!(w.output_weight.len(), 24 * 3);
        assert_eq!(w.output_bias.len(), 3);
        assert_eq!(w.parameter_count(), 50 * 16 + 16 * 24 + 24 + 24 * 3 + 3);
    }
}
