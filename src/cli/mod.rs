// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Three commands are supported:
//   1. `train`    — trains on the SMS corpus, exports the model
//   2. `classify` — scores one message with the exported model
//   3. `inspect`  — verifies an exported model file
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use commands::{ClassifyArgs, Commands, InspectArgs, TrainArgs};

use crate::domain::risk::RiskTier;
use crate::infra::artifacts::ArtifactPaths;

#[derive(Parser, Debug)]
#[command(
    name = "scam-detector",
    version,
    about = "Train a small SMS scam classifier and export it as a TFLite model."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Dispatch to the matching use case. Routing only.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)    => run_train(args),
            Commands::Classify(args) => run_classify(args),
            Commands::Inspect(args)  => run_inspect(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training, artifacts go to '{}'", args.project_root);

    let report = TrainUseCase::new(args.into()).execute()?;

    println!(
        "Trained on {} messages: {} safe, {} suspicious, {} scam",
        report.corpus.total(),
        report.corpus.count(RiskTier::Safe),
        report.corpus.count(RiskTier::Suspicious),
        report.corpus.count(RiskTier::Scam),
    );
    println!("Vocabulary saved to {}", report.vocab_path.display());
    println!("Model saved to {} ({} bytes)", report.model_path.display(), report.model_bytes);
    println!("Input shape: {:?}", report.shapes.input);
    println!("Output shape: {:?}", report.shapes.output);
    if let (Some(first), Some(last)) = (&report.first_epoch, &report.final_epoch) {
        println!(
            "Loss {:.4} → {:.4} over {} epochs, final accuracy {:.1}%",
            first.loss, last.loss, last.epoch, last.accuracy * 100.0
        );
    }
    Ok(())
}

fn run_classify(args: ClassifyArgs) -> Result<()> {
    use crate::application::classify_use_case::ClassifyUseCase;

    let mut use_case = ClassifyUseCase::new(&args.project_root, "<OOV>")?;
    let result = use_case.classify(&args.message)?;

    tracing::debug!("Input ids: {:?}", result.input_ids);

    println!("\nMessage: {}", args.message);
    for tier in RiskTier::ALL {
        println!("  {:<10} {:>6.2}%", tier.name(), result.scores.get(tier) * 100.0);
    }
    println!("Prediction: {}", result.scores.predicted());
    println!(
        "Uncertainty: {:.2} ({} of the words are known)",
        result.scores.entropy(),
        result.known_tokens,
    );
    Ok(())
}

fn run_inspect(args: InspectArgs) -> Result<()> {
    use crate::application::inspect_use_case::InspectUseCase;

    let path: PathBuf = match args.model {
        Some(model) => model.into(),
        None        => ArtifactPaths::new(&args.project_root).model_file(),
    };
    let report = InspectUseCase::new(path).execute()?;

    println!("Model: {}", report.path.display());
    if !report.description.is_empty() {
        println!("Description: {}", report.description);
    }
    println!("Input shape: {:?}", report.shapes.input);
    println!("Output shape: {:?}", report.shapes.output);
    let ops: Vec<&str> = report.operators.iter().map(|op| op.name()).collect();
    println!("Operators: {}", ops.join(" → "));
    println!("Tensors:");
    for t in &report.tensors {
        println!("  #{:<3} {:<20} {:<8} {:?}", t.index, t.name, t.dtype.name(), t.shape);
    }
    Ok(())
}
