// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Load the labelled corpus      (Layer 4 - data)
//   Step 2: Fit the vocabulary            (Layer 4 - data)
//   Step 3: Export vocab.txt              (Layer 6 - infra)
//   Step 4: Encode + pad every message    (Layer 6 - infra)
//   Step 5: Build the Burn dataset        (Layer 4 - data)
//   Step 6: Run the training loop         (Layer 5 - ml)
//   Step 7: Write metrics CSV (optional)  (Layer 6 - infra)
//   Step 8: Export the .tflite model      (Layer 6 - infra)
//   Step 9: Read it back and check shapes (Layer 2 - inspect)
//
// Reference: Burn Book §5 (Training)

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::application::inspect_use_case::{verify_model, ModelShapes};
use crate::data::{
    corpus::{CorpusSummary, EmbeddedCorpus, JsonCorpus},
    dataset::{EncodedSample, SmsDataset},
    vocabulary::{Vocabulary, VocabularyConfig},
};
use crate::domain::{risk::RiskTier, traits::ExampleSource};
use crate::infra::{
    artifacts::ArtifactPaths,
    metrics::{EpochMetrics, MetricsLogger},
    tflite::{Quantization, TfliteWriter},
    tokenizer_store::{SequenceEncoder, TokenizerStore},
};
use crate::ml::trainer::run_training;

// ─── Training Configuration ──────────────────────────────────────────────────
// Every knob of a training run. Defaults reproduce the model
// the mobile app was built against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    /// Artifacts go to <project_root>/assets/models/
    pub project_root:  String,
    /// JSON corpus to train on; the embedded corpus when absent
    pub dataset:       Option<String>,
    pub vocab_size:    usize,
    pub oov_token:     String,
    pub embedding_dim: usize,
    pub hidden_units:  usize,
    pub max_length:    usize,
    pub epochs:        usize,
    pub lr:            f64,
    pub seed:          u64,
    pub quantization:  Quantization,
    pub metrics_csv:   Option<String>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            project_root:  ".".to_string(),
            dataset:       None,
            vocab_size:    1000,
            oov_token:     "<OOV>".to_string(),
            embedding_dim: 16,
            hidden_units:  24,
            max_length:    20,
            epochs:        50,
            lr:            1e-3,
            seed:          42,
            quantization:  Quantization::Int8,
            metrics_csv:   None,
        }
    }
}

impl TrainConfig {
    pub fn vocabulary_config(&self) -> VocabularyConfig {
        VocabularyConfig {
            vocab_size: self.vocab_size,
            oov_token:  self.oov_token.clone(),
        }
    }

    pub fn artifact_paths(&self) -> ArtifactPaths {
        ArtifactPaths::new(&self.project_root)
    }

    /// Reject shapes the model or the export cannot represent.
    pub fn validate(&self) -> Result<()> {
        if self.max_length == 0 {
            bail!("max_length must be at least 1");
        }
        if self.vocab_size < 2 {
            bail!("vocab_size must be at least 2 (padding and {}), got {}", self.oov_token, self.vocab_size);
        }
        if self.embedding_dim == 0 || self.hidden_units == 0 {
            bail!(
                "embedding_dim and hidden_units must be at least 1, got {} and {}",
                self.embedding_dim, self.hidden_units
            );
        }
        if !(self.lr.is_finite() && self.lr > 0.0) {
            bail!("lr must be a positive number, got {}", self.lr);
        }
        Ok(())
    }
}

/// What a finished run produced
#[derive(Debug, Clone)]
pub struct TrainReport {
    pub corpus:      CorpusSummary,
    pub vocab_path:  PathBuf,
    pub model_path:  PathBuf,
    pub model_bytes: usize,
    pub shapes:      ModelShapes,
    pub first_epoch: Option<EpochMetrics>,
    pub final_epoch: Option<EpochMetrics>,
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<TrainReport> {
        let cfg   = &self.config;
        cfg.validate()?;
        let paths = cfg.artifact_paths();

        // ── Step 1: Load corpus ───────────────────────────────────────────────
        let source: Box<dyn ExampleSource> = match &cfg.dataset {
            Some(path) => Box::new(JsonCorpus::new(path)),
            None       => Box::new(EmbeddedCorpus),
        };
        tracing::info!("Loading messages from {}", source.describe());
        let messages = source.load_all()?;
        let summary  = CorpusSummary::of(&messages);
        tracing::info!(
            "Loaded {} messages ({} safe, {} suspicious, {} scam)",
            summary.total(),
            summary.count(RiskTier::Safe),
            summary.count(RiskTier::Suspicious),
            summary.count(RiskTier::Scam),
        );

        // ── Step 2: Fit vocabulary ────────────────────────────────────────────
        let texts: Vec<&str> = messages.iter().map(|m| m.text.as_str()).collect();
        let vocab = Vocabulary::fit(&texts, cfg.vocabulary_config())?;
        tracing::info!("Vocabulary: {} distinct words, {} slots", vocab.ranked_len(), vocab.vocab_size());

        // ── Step 3: Export vocab.txt ──────────────────────────────────────────
        let store = TokenizerStore::new(paths.vocab_file());
        store.save_vocab(&vocab)?;
        tracing::info!("Vocabulary written to '{}'", store.vocab_path().display());

        // ── Step 4: Encode every message ──────────────────────────────────────
        let encoder = SequenceEncoder::new(&vocab, cfg.max_length)?;
        let samples = messages
            .iter()
            .map(|m| {
                Ok(EncodedSample {
                    input_ids: encoder.encode(&m.text)?,
                    label:     m.label(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        // ── Step 5: Build dataset ─────────────────────────────────────────────
        let dataset = SmsDataset::new(samples);

        // ── Step 6: Train ─────────────────────────────────────────────────────
        let trained = run_training(cfg, &dataset)?;
        let first_epoch = trained.history.first().cloned();
        let final_epoch = trained.final_metrics().cloned();
        match &final_epoch {
            Some(m) => tracing::info!(
                "Training finished after {} epochs: loss={:.4} accuracy={:.1}%",
                m.epoch, m.loss, m.accuracy * 100.0
            ),
            None => tracing::warn!("Training ran zero epochs; exporting the initial weights"),
        }

        // ── Step 7: Metrics CSV ───────────────────────────────────────────────
        if let Some(csv) = &cfg.metrics_csv {
            let logger = MetricsLogger::new(csv);
            logger.write_all(&trained.history)?;
            tracing::info!("Metrics written to '{}'", logger.csv_path().display());
        }

        // ── Step 8: Export model ──────────────────────────────────────────────
        let weights    = trained.model.weights()?;
        let model_path = paths.model_file();
        let model_bytes = TfliteWriter::new(cfg.max_length, cfg.quantization)
            .write(&model_path, &weights)
            .with_context(|| format!("Cannot export model to '{}'", model_path.display()))?;
        tracing::info!(
            "Model written to '{}' ({} bytes, {} parameters, {} weights)",
            model_path.display(), model_bytes, weights.parameter_count(), cfg.quantization,
        );

        // ── Step 9: Verify the export ─────────────────────────────────────────
        let shapes = verify_model(&model_path, cfg.max_length)?;

        Ok(TrainReport {
            corpus: summary,
            vocab_path: store.vocab_path().to_path_buf(),
            model_path,
            model_bytes,
            shapes,
            first_epoch,
            final_epoch,
        })
    }
}
