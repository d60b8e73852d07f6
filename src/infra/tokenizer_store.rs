// ============================================================
// Layer 6 — Tokenizer Store
// ============================================================
// Persists the vocabulary and turns it into a tokenizer.
//
// vocab.txt is what the mobile app ships with: line i is the
// word with id i, an empty line means "no word" (id 0 is the
// padding slot). The file always has exactly vocab_size lines.
//
// For encoding, the frozen vocabulary is rendered as a
// HuggingFace WordLevel tokenizer that applies the same
// preprocessing rules:
//
//   normalizer    → Lowercase, then Replace(filter chars → " ")
//   pre_tokenizer → Split on " " (delimiter removed)
//   model         → WordLevel, unknown words → <OOV>
//
// Only ids below vocab_size are placed in the WordLevel vocab,
// so words past the cap fall back to <OOV> automatically.

use anyhow::{anyhow, Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use tokenizers::Tokenizer;

use crate::data::{sequence::pad_sequence, vocabulary::Vocabulary};

pub struct TokenizerStore {
    vocab_path: PathBuf,
}

impl TokenizerStore {
    pub fn new(vocab_path: impl Into<PathBuf>) -> Self {
        Self { vocab_path: vocab_path.into() }
    }

    pub fn vocab_path(&self) -> &Path {
        &self.vocab_path
    }

    /// Write every vocabulary slot as one line, overwriting any existing file.
    pub fn save_vocab(&self, vocab: &Vocabulary) -> Result<()> {
        write_vocab_file(&self.vocab_path, vocab)?;
        tracing::debug!("Saved {} vocabulary slots", vocab.vocab_size());
        Ok(())
    }

    /// Load a vocabulary previously written by `save_vocab`.
    pub fn load_vocab(&self, oov_token: &str) -> Result<Vocabulary> {
        let content = fs::read_to_string(&self.vocab_path).with_context(|| {
            format!(
                "Cannot read vocabulary '{}'. Have you run 'train' first?",
                self.vocab_path.display()
            )
        })?;
        let slots: Vec<&str> = content.lines().collect();
        Vocabulary::from_slots(&slots, oov_token)
            .with_context(|| format!("Invalid vocabulary file '{}'", self.vocab_path.display()))
    }
}

/// `vocab_size` lines in id order, each slot followed by "\n".
pub fn write_vocab_file(path: &Path, vocab: &Vocabulary) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Cannot create '{}'", parent.display()))?;
    }

    let mut out = String::new();
    for slot in vocab.slots() {
        out.push_str(&slot);
        out.push('\n');
    }

    fs::write(path, out)
        .with_context(|| format!("Cannot write vocabulary to '{}'", path.display()))
}

/// Render a frozen vocabulary as a HuggingFace tokenizer.
pub fn build_tokenizer(vocab: &Vocabulary) -> Result<Tokenizer> {
    let mut word_ids = serde_json::Map::new();
    for (word, id) in vocab.entries() {
        word_ids.insert(word.to_string(), serde_json::json!(id));
    }

    let tokenizer_json = serde_json::json!({
        "version": "1.0",
        "truncation": null,
        "padding": null,
        "added_tokens": [],
        "normalizer": {
            "type": "Sequence",
            "normalizers": [
                { "type": "Lowercase" },
                {
                    "type": "Replace",
                    "pattern": { "Regex": vocab.preprocessor().filter_pattern() },
                    "content": " "
                }
            ]
        },
        "pre_tokenizer": {
            "type": "Split",
            "pattern": { "String": " " },
            "behavior": "Removed",
            "invert": false
        },
        "post_processor": null,
        "decoder": null,
        "model": {
            "type": "WordLevel",
            "vocab": word_ids,
            "unk_token": vocab.oov_token()
        }
    });

    Tokenizer::from_str(&tokenizer_json.to_string())
        .map_err(|e| anyhow!("Cannot build tokenizer: {e}"))
}

// ─── SequenceEncoder ──────────────────────────────────────────────────────────
/// Text → fixed-length id sequence, the exact input the model expects.
pub struct SequenceEncoder {
    tokenizer:  Tokenizer,
    max_length: usize,
}

impl SequenceEncoder {
    pub fn new(vocab: &Vocabulary, max_length: usize) -> Result<Self> {
        Ok(Self {
            tokenizer: build_tokenizer(vocab)?,
            max_length,
        })
    }

    /// Variable-length ids, before padding
    pub fn token_ids(&self, text: &str) -> Result<Vec<u32>> {
        let enc = self
            .tokenizer
            .encode(text, false)
            .map_err(|e| anyhow!("Tokenisation error: {e}"))?;
        Ok(enc.get_ids().to_vec())
    }

    pub fn encode(&self, text: &str) -> Result<Vec<u32>> {
        Ok(pad_sequence(&self.token_ids(text)?, self.max_length))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{
        corpus::embedded_corpus,
        vocabulary::VocabularyConfig,
    };

    fn corpus_texts() -> Vec<String> {
        embedded_corpus().unwrap().into_iter().map(|m| m.text).collect()
    }

    fn fitted() -> Vocabulary {
        Vocabulary::fit(&corpus_texts(), VocabularyConfig::default()).unwrap()
    }

    #[test]
    fn test_vocab_file_has_vocab_size_lines() {
        let dir   = tempfile::tempdir().unwrap();
        let store = TokenizerStore::new(dir.path().join("assets/models/vocab.txt"));
        store.save_vocab(&fitted()).unwrap();

        let content = fs::read_to_string(store.vocab_path()).unwrap();
        assert_eq!(content.lines().count(), 1000);
        assert!(content.ends_with('\n'));
    }

    #[test]
    fn test_vocab_file_slots_match_ranks() {
        let dir   = tempfile::tempdir().unwrap();
        let store = TokenizerStore::new(dir.path().join("vocab.txt"));
        let vocab = fitted();
        store.save_vocab(&vocab).unwrap();

        let content = fs::read_to_string(store.vocab_path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "");
        assert_eq!(lines[1], "<OOV>");
        for (word, id) in vocab.entries() {
            assert_eq!(lines[id as usize], word);
        }
        // slots past the ranked words stay empty
        assert!(lines[vocab.ranked_len() + 2..].iter().all(|l| l.is_empty()));
    }

    #[test]
    fn test_vocab_file_is_byte_identical_across_runs() {
        let dir = tempfile::tempdir().unwrap();
        let a   = TokenizerStore::new(dir.path().join("a.txt"));
        let b   = TokenizerStore::new(dir.path().join("b.txt"));
        a.save_vocab(&fitted()).unwrap();
        b.save_vocab(&fitted()).unwrap();
        assert_eq!(fs::read(a.vocab_path()).unwrap(), fs::read(b.vocab_path()).unwrap());
    }

    #[test]
    fn test_save_overwrites_existing_file() {
        let dir   = tempfile::tempdir().unwrap();
        let store = TokenizerStore::new(dir.path().join("vocab.txt"));
        fs::write(store.vocab_path(), "stale\ncontent\n").unwrap();
        store.save_vocab(&fitted()).unwrap();
        let content = fs::read_to_string(store.vocab_path()).unwrap();
        assert!(!content.contains("stale"));
    }

    #[test]
    fn test_load_vocab_roundtrip() {
        let dir   = tempfile::tempdir().unwrap();
        let store = TokenizerStore::new(dir.path().join("vocab.txt"));
        let vocab = fitted();
        store.save_vocab(&vocab).unwrap();

        let loaded = store.load_vocab("<OOV>").unwrap();
        assert_eq!(loaded.slots(), vocab.slots());
    }

    #[test]
    fn test_load_missing_vocab_fails() {
        let dir   = tempfile::tempdir().unwrap();
        let store = TokenizerStore::new(dir.path().join("missing.txt"));
        assert!(store.load_vocab("<OOV>").is_err());
    }

    #[test]
    fn test_tokenizer_agrees_with_vocabulary() {
        let texts   = corpus_texts();
        let vocab   = fitted();
        let encoder = SequenceEncoder::new(&vocab, 20).unwrap();

        for text in &texts {
            assert_eq!(
                encoder.token_ids(text).unwrap(),
                vocab.text_to_sequence(text),
                "mismatch on {text:?}"
            );
        }
    }

    #[test]
    fn test_encoder_handles_unseen_words_and_padding() {
        let vocab   = fitted();
        let encoder = SequenceEncoder::new(&vocab, 20).unwrap();
        let ids     = encoder.encode("Your zebra!").unwrap();
        assert_eq!(ids.len(), 20);
        assert_eq!(ids[0], vocab.lookup("your"));
        assert_eq!(ids[1], vocab.oov_id());
        assert!(ids[2..].iter().all(|&id| id == 0));
    }
}
