// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Full-batch Adam over the whole corpus for a fixed number of
// epochs:
//
//   uninitialised ──(seed, init)──► epoch 1 ► ... ► epoch N ──► trained
//
// There is no shuffling, no validation split and no early
// stopping. With 18 messages every epoch is exactly one
// optimiser step on one batch.
//
// Reference: Kingma & Ba (2015) Adam

use anyhow::{bail, Result};
use burn::{
    data::{dataloader::batcher::Batcher, dataset::Dataset},
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::{backend::AutodiffBackend, ElementConversion},
};

use crate::application::train_use_case::TrainConfig;
use crate::data::{batcher::SmsBatcher, dataset::SmsDataset};
use crate::infra::metrics::EpochMetrics;
use crate::ml::model::{ScamClassifier, ScamClassifierConfig};

pub type TrainBackend = burn::backend::Autodiff<burn::backend::NdArray>;

/// Adam epsilon; matches the optimiser the mobile model was first built with
const ADAM_EPSILON: f32 = 1e-7;

pub struct TrainedModel<B: Backend> {
    pub model:   ScamClassifier<B>,
    pub history: Vec<EpochMetrics>,
}

impl<B: Backend> TrainedModel<B> {
    /// Metrics of the last epoch, if any epoch ran
    pub fn final_metrics(&self) -> Option<&EpochMetrics> {
        self.history.last()
    }
}

pub fn run_training(cfg: &TrainConfig, dataset: &SmsDataset) -> Result<TrainedModel<TrainBackend>> {
    let device = burn::backend::ndarray::NdArrayDevice::default();
    tracing::info!("Using NdArray device: {:?}", device);
    train_loop::<TrainBackend>(cfg, dataset, &device)
}

pub fn train_loop<B: AutodiffBackend>(
    cfg:     &TrainConfig,
    dataset: &SmsDataset,
    device:  &B::Device,
) -> Result<TrainedModel<B>> {
    if dataset.is_empty() {
        bail!("cannot train on an empty dataset");
    }

    // ── Build model ───────────────────────────────────────────────────────────
    B::seed(cfg.seed);
    let model_cfg = ScamClassifierConfig::new(cfg.vocab_size)
        .with_embedding_dim(cfg.embedding_dim)
        .with_hidden_units(cfg.hidden_units);
    let mut model: ScamClassifier<B> = model_cfg.init(device);
    tracing::info!(
        "Model ready: vocab={} embedding_dim={} hidden={} seed={}",
        cfg.vocab_size, cfg.embedding_dim, cfg.hidden_units, cfg.seed,
    );

    // ── Adam optimiser ────────────────────────────────────────────────────────
    // m = β1*m + (1-β1)*g        (mean)
    // v = β2*v + (1-β2)*g²       (variance)
    // θ = θ - lr * m / (√v + ε)  (update)
    let mut optim = AdamConfig::new()
        .with_epsilon(ADAM_EPSILON)
        .init::<B, ScamClassifier<B>>();

    // ── One full batch, built once ────────────────────────────────────────────
    let batcher = SmsBatcher::<B>::new(device.clone());
    let batch   = batcher.batch(dataset.iter().collect());
    let total   = dataset.len();

    let mut history = Vec::with_capacity(cfg.epochs);

    for epoch in 1..=cfg.epochs {
        let (loss, logits) = model.forward_classification(
            batch.input_ids.clone(),
            batch.labels.clone(),
        );

        let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();
        if !loss_val.is_finite() {
            tracing::warn!("Epoch {}: loss is not finite ({})", epoch, loss_val);
        }

        // argmax(1) returns [batch, 1] — flatten before comparing with labels
        let correct: i64 = logits
            .argmax(1)
            .flatten::<1>(0, 1)
            .equal(batch.labels.clone())
            .int()
            .sum()
            .into_scalar()
            .elem::<i64>();
        let accuracy = correct as f64 / total as f64;

        // Backward pass + Adam update
        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &model);
        model = optim.step(cfg.lr, model, grads);

        tracing::debug!("Epoch {:>3}/{} | loss={:.4} | accuracy={:.1}%", epoch, cfg.epochs, loss_val, accuracy * 100.0);
        history.push(EpochMetrics::new(epoch, loss_val, accuracy));
    }

    Ok(TrainedModel { model, history })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dataset::EncodedSample;

    fn toy_dataset() -> SmsDataset {
        // two clearly separable "words" per tier
        SmsDataset::new(vec![
            EncodedSample { input_ids: vec![2, 2, 0, 0], label: 0 },
            EncodedSample { input_ids: vec![3, 3, 0, 0], label: 1 },
            EncodedSample { input_ids: vec![4, 4, 0, 0], label: 2 },
        ])
    }

    fn toy_config(epochs: usize) -> TrainConfig {
        TrainConfig {
            vocab_size: 10,
            max_length: 4,
            epochs,
            lr: 0.05,
            ..TrainConfig::default()
        }
    }

    #[test]
    fn test_history_has_one_entry_per_epoch() {
        let trained = run_training(&toy_config(5), &toy_dataset()).unwrap();
        assert_eq!(trained.history.len(), 5);
        assert_eq!(trained.history[0].epoch, 1);
        assert_eq!(trained.final_metrics().unwrap().epoch, 5);
    }

    #[test]
    fn test_loss_decreases_on_separable_data() {
        let trained = run_training(&toy_config(60), &toy_dataset()).unwrap();
        let first = trained.history.first().unwrap().loss;
        let last  = trained.final_metrics().unwrap().loss;
        assert!(last < first, "loss went from {first} to {last}");
        assert!((trained.final_metrics().unwrap().accuracy - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_dataset_is_rejected() {
        let res = run_training(&toy_config(1), &SmsDataset::new(Vec::new()));
        assert!(res.is_err());
    }
}
