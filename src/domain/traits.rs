// ============================================================
// Layer 3 — Core Traits
// ============================================================
// The application layer asks for training examples through
// this trait, so the embedded corpus and a JSON file on disk
// are interchangeable.

use anyhow::Result;

use crate::domain::message::LabeledMessage;

// ─── ExampleSource ────────────────────────────────────────────────────────────
/// Any component that can provide labelled training messages.
///
/// Implementations:
///   - EmbeddedCorpus → the corpus compiled into the binary
///   - JsonCorpus     → a corpus file passed with --dataset
pub trait ExampleSource {
    /// Load every example from this source, in authoring order.
    fn load_all(&self) -> Result<Vec<LabeledMessage>>;

    /// Human readable origin, used in log lines
    fn describe(&self) -> String;
}
