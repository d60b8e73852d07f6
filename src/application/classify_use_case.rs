// ============================================================
// Layer 2 — Classify Use Case
// ============================================================
// Scores a single message with the exported artifacts only,
// exactly as the app does on the phone:
//
//   vocab.txt ──► tokenizer ──► ids [1, L] ──► .tflite ──► TierScores
//
// The sequence length is read from the model's input tensor.

use anyhow::{bail, Context, Result};
use std::path::PathBuf;

use crate::domain::risk::TierScores;
use crate::infra::{
    artifacts::ArtifactPaths,
    tflite::Interpreter,
    tokenizer_store::{SequenceEncoder, TokenizerStore},
};

#[derive(Debug, Clone)]
pub struct Classification {
    /// Padded ids fed to the model
    pub input_ids:    Vec<u32>,
    /// Ids that were not <OOV> or padding
    pub known_tokens: usize,
    pub scores:       TierScores,
}

pub struct ClassifyUseCase {
    encoder:     SequenceEncoder,
    oov_id:      u32,
    interpreter: Interpreter,
}

impl ClassifyUseCase {
    pub fn new(project_root: impl Into<PathBuf>, oov_token: &str) -> Result<Self> {
        let paths = ArtifactPaths::new(project_root);
        let vocab = TokenizerStore::new(paths.vocab_file()).load_vocab(oov_token)?;

        let model_path = paths.model_file();
        let mut interpreter = Interpreter::from_file(&model_path)
            .with_context(|| format!("Cannot load model '{}'. Have you run 'train' first?", model_path.display()))?;
        interpreter.allocate_tensors()?;

        let max_length = match interpreter.input_details().first().map(|d| d.shape.as_slice()) {
            Some([1, len]) => *len,
            other => bail!("unexpected model input shape {:?}", other),
        };
        tracing::debug!("Model expects {} tokens per message", max_length);

        Ok(Self {
            encoder: SequenceEncoder::new(&vocab, max_length)?,
            oov_id: vocab.oov_id(),
            interpreter,
        })
    }

    pub fn classify(&mut self, message: &str) -> Result<Classification> {
        let input_ids = self.encoder.encode(message)?;
        let as_i32: Vec<i32> = input_ids.iter().map(|&id| id as i32).collect();

        self.interpreter.set_input_i32(0, &as_i32)?;
        self.interpreter.invoke()?;
        let probs  = self.interpreter.output_f32(0)?;
        let scores = TierScores::from_probabilities(probs)
            .with_context(|| format!("model returned {} scores, expected 3", probs.len()))?;

        let known_tokens = input_ids
            .iter()
            .filter(|&&id| id != 0 && id != self.oov_id)
            .count();

        Ok(Classification { input_ids, known_tokens, scores })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{
        corpus::embedded_corpus,
        vocabulary::{Vocabulary, VocabularyConfig},
    };
    use crate::infra::tflite::{Quantization, TfliteWriter};
    use crate::ml::model::ModelWeights;

    /// Untrained but well-formed artifacts for the embedded corpus
    fn write_artifacts(root: &std::path::Path) {
        let texts: Vec<String> = embedded_corpus().unwrap().into_iter().map(|m| m.text).collect();
        let vocab = Vocabulary::fit(&texts, VocabularyConfig::default()).unwrap();
        let paths = ArtifactPaths::new(root);
        TokenizerStore::new(paths.vocab_file()).save_vocab(&vocab).unwrap();

        let (v, d, h, c) = (1000, 4, 6, 3);
        let weights = ModelWeights {
            vocab_size:    v,
            embedding_dim: d,
            hidden_units:  h,
            num_classes:   c,
            embedding:     (0..v * d).map(|i| ((i % 17) as f32 - 8.0) * 0.01).collect(),
            hidden_weight: (0..d * h).map(|i| ((i % 5) as f32 - 2.0) * 0.1).collect(),
            hidden_bias:   vec![0.01; h],
            output_weight: (0..h * c).map(|i| ((i % 7) as f32 - 3.0) * 0.1).collect(),
            output_bias:   vec![0.0; c],
        };
        TfliteWriter::new(20, Quantization::Int8).write(&paths.model_file(), &weights).unwrap();
    }

    #[test]
    fn test_classify_returns_distribution() {
        let dir = tempfile::tempdir().unwrap();
        write_artifacts(dir.path());

        let mut classifier = ClassifyUseCase::new(dir.path(), "<OOV>").unwrap();
        let result = classifier.classify("Your account balance is Rs. 500").unwrap();

        assert_eq!(result.input_ids.len(), 20);
        assert_eq!(result.known_tokens, 5);
        let total: f32 = result.scores.to_array().iter().sum();
        assert!((total - 1.0).abs() < 1e-5);
        assert!(result.scores.to_array().iter().all(|&p| p >= 0.0));
    }

    #[test]
    fn test_unknown_words_still_classify() {
        let dir = tempfile::tempdir().unwrap();
        write_artifacts(dir.path());

        let mut classifier = ClassifyUseCase::new(dir.path(), "<OOV>").unwrap();
        let result = classifier.classify("zxqv wubble").unwrap();
        assert_eq!(result.known_tokens, 0);
        assert_eq!(&result.input_ids[..2], &[1, 1]);
    }

    #[test]
    fn test_missing_artifacts_fail() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ClassifyUseCase::new(dir.path(), "<OOV>").is_err());
    }
}
