// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the three subcommands: `train`, `classify` and
// `inspect`, and all their configurable flags.
//
// Every `train` default reproduces the model the mobile app
// ships with, so a bare `scam-detector train` rebuilds it.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand, ValueEnum};
use crate::application::train_use_case::TrainConfig;
use crate::infra::tflite::Quantization;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train on the labelled SMS corpus and export vocab.txt + scam_detector.tflite
    Train(TrainArgs),

    /// Score one message with the exported artifacts
    Classify(ClassifyArgs),

    /// Verify an exported .tflite file and list its tensors
    Inspect(InspectArgs),
}

/// How the exported weights are stored
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuantizationArg {
    /// int8 weights with DEQUANTIZE ops (smallest file)
    Int8,
    /// plain float32 weights
    None,
}

impl From<QuantizationArg> for Quantization {
    fn from(q: QuantizationArg) -> Self {
        match q {
            QuantizationArg::Int8 => Quantization::Int8,
            QuantizationArg::None => Quantization::None,
        }
    }
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Artifacts are written to <project-root>/assets/models/
    #[arg(long, default_value = ".")]
    pub project_root: String,

    /// JSON corpus ({"version":1,"messages":[{"text":..,"label":0|1|2}]});
    /// the built-in 18-message corpus when omitted
    #[arg(long)]
    pub dataset: Option<String>,

    /// Number of vocabulary slots, padding and <OOV> included
    #[arg(long, default_value_t = 1000)]
    pub vocab_size: usize,

    /// Width of each word vector
    #[arg(long, default_value_t = 16)]
    pub embedding_dim: usize,

    /// Units in the ReLU hidden layer
    #[arg(long, default_value_t = 24)]
    pub hidden_units: usize,

    /// Tokens per message after padding / truncation
    #[arg(long, default_value_t = 20)]
    pub max_length: usize,

    /// Full passes over the corpus (one Adam step each)
    #[arg(long, default_value_t = 50)]
    pub epochs: usize,

    /// Adam learning rate
    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    /// Seed for weight initialisation
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    #[arg(long, value_enum, default_value_t = QuantizationArg::Int8)]
    pub quantization: QuantizationArg,

    /// Write per-epoch loss and accuracy to this CSV file
    #[arg(long)]
    pub metrics_csv: Option<String>,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            project_root:  a.project_root,
            dataset:       a.dataset,
            vocab_size:    a.vocab_size,
            embedding_dim: a.embedding_dim,
            hidden_units:  a.hidden_units,
            max_length:    a.max_length,
            epochs:        a.epochs,
            lr:            a.lr,
            seed:          a.seed,
            quantization:  a.quantization.into(),
            metrics_csv:   a.metrics_csv,
            ..TrainConfig::default()
        }
    }
}

#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// The SMS text to score
    #[arg(long)]
    pub message: String,

    /// Directory containing assets/models/
    #[arg(long, default_value = ".")]
    pub project_root: String,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Directory containing assets/models/
    #[arg(long, default_value = ".")]
    pub project_root: String,

    /// Model file to inspect instead of the project's scam_detector.tflite
    #[arg(long)]
    pub model: Option<String>,
}
