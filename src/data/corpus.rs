// ============================================================
// Layer 4 — Corpus
// ============================================================
// The labelled SMS corpus lives in data/sms_corpus.json and is
// compiled into the binary, so `train` works with no input
// files. A corpus with the same JSON shape can be passed with
// --dataset instead.
//
// File format:
//   {
//     "version": 1,
//     "messages": [ { "text": "...", "label": 0 }, ... ]
//   }

use std::{fs, path::PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::{
    message::LabeledMessage,
    risk::{RiskTier, NUM_TIERS},
    traits::ExampleSource,
};

const EMBEDDED_CORPUS: &str = include_str!("../../data/sms_corpus.json");

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CorpusFile {
    version:  u32,
    messages: Vec<LabeledMessage>,
}

fn parse_corpus(json: &str, origin: &str) -> Result<Vec<LabeledMessage>> {
    let file: CorpusFile = serde_json::from_str(json)
        .with_context(|| format!("Cannot parse corpus from {origin}"))?;

    if file.messages.is_empty() {
        bail!("corpus is empty: {origin} contains no messages");
    }

    tracing::debug!("Corpus {} (version {}) has {} messages", origin, file.version, file.messages.len());
    Ok(file.messages)
}

// ─── EmbeddedCorpus ───────────────────────────────────────────────────────────
/// The 18 hand-written messages shipped with the binary.
pub struct EmbeddedCorpus;

impl ExampleSource for EmbeddedCorpus {
    fn load_all(&self) -> Result<Vec<LabeledMessage>> {
        parse_corpus(EMBEDDED_CORPUS, "embedded corpus")
    }

    fn describe(&self) -> String {
        "embedded corpus".to_string()
    }
}

/// Shorthand for `EmbeddedCorpus.load_all()`
#[cfg(test)]
pub fn embedded_corpus() -> Result<Vec<LabeledMessage>> {
    EmbeddedCorpus.load_all()
}

// ─── JsonCorpus ───────────────────────────────────────────────────────────────
/// A corpus file on disk.
pub struct JsonCorpus {
    path: PathBuf,
}

impl JsonCorpus {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ExampleSource for JsonCorpus {
    fn load_all(&self) -> Result<Vec<LabeledMessage>> {
        let json = fs::read_to_string(&self.path)
            .with_context(|| format!("Cannot read corpus '{}'", self.path.display()))?;
        parse_corpus(&json, &self.describe())
    }

    fn describe(&self) -> String {
        format!("'{}'", self.path.display())
    }
}

// ─── CorpusSummary ────────────────────────────────────────────────────────────
/// Number of messages per tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorpusSummary {
    pub counts: [usize; NUM_TIERS],
}

impl CorpusSummary {
    pub fn of(messages: &[LabeledMessage]) -> Self {
        let mut counts = [0usize; NUM_TIERS];
        for m in messages {
            counts[m.label()] += 1;
        }
        Self { counts }
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    pub fn count(&self, tier: RiskTier) -> usize {
        self.counts[tier.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_embedded_corpus_shape() {
        let messages = embedded_corpus().unwrap();
        let summary  = CorpusSummary::of(&messages);
        assert_eq!(summary.total(), 18);
        assert_eq!(summary.count(RiskTier::Safe), 8);
        assert_eq!(summary.count(RiskTier::Suspicious), 5);
        assert_eq!(summary.count(RiskTier::Scam), 5);
    }

    #[test]
    fn test_embedded_corpus_keeps_authoring_order() {
        let messages = embedded_corpus().unwrap();
        assert!(messages[0].text.starts_with("Your account XXXXX1234"));
        assert_eq!(
            messages[8].text,
            "Congratulations! You won a lottery of Rs. 1 Lakh. Call now to claim."
        );
        assert_eq!(messages[17].tier, RiskTier::Scam);
    }

    #[test]
    fn test_json_corpus_from_disk() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, r#"{{ "version": 2, "messages": [ {{ "text": "Pay now", "label": 2 }} ] }}"#).unwrap();

        let messages = JsonCorpus::new(f.path()).load_all().unwrap();
        assert_eq!(messages, vec![LabeledMessage { text: "Pay now".into(), tier: RiskTier::Scam }]);
    }

    #[test]
    fn test_empty_corpus_is_rejected() {
        let err = parse_corpus(r#"{ "version": 1, "messages": [] }"#, "test").unwrap_err();
        assert!(err.to_string().contains("corpus is empty"));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(JsonCorpus::new(dir.path().join("nope.json")).load_all().is_err());
    }
}
