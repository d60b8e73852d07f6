// ============================================================
// Layer 4 — Vocabulary
// ============================================================
// Maps words to the integer ids the embedding layer indexes.
//
// Index layout:
//   0          → padding, never assigned to a word
//   1          → the out-of-vocabulary token "<OOV>"
//   2, 3, ...  → corpus words, most frequent first
//
// Words with equal counts keep the order in which they first
// appear in the corpus, so fitting is fully deterministic.
//
// Only ids below vocab_size are usable. A word ranked past the
// cap, or a word never seen during fitting, encodes to <OOV>.

use std::collections::HashMap;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::data::preprocessor::Preprocessor;

/// Id reserved for padding
pub const PAD_ID: u32 = 0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyConfig {
    /// Number of usable ids, padding and <OOV> included
    pub vocab_size: usize,

    /// Token standing in for unknown words
    pub oov_token: String,
}

impl Default for VocabularyConfig {
    fn default() -> Self {
        Self {
            vocab_size: 1000,
            oov_token:  "<OOV>".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Vocabulary {
    config:       VocabularyConfig,
    oov_id:       u32,
    /// index_word[id] is the word for id, including ids past the
    /// vocab_size cap; index_word[0] is empty
    index_word:   Vec<String>,
    preprocessor: Preprocessor,
}

impl Vocabulary {
    /// Count words across the corpus and rank them by frequency.
    pub fn fit<S: AsRef<str>>(texts: &[S], config: VocabularyConfig) -> Result<Self> {
        if config.vocab_size < 2 {
            bail!(
                "vocab_size must leave room for padding and {} (got {})",
                config.oov_token,
                config.vocab_size
            );
        }

        let preprocessor = Preprocessor::new();

        // ── Step 1: count in first-seen order ─────────────────────────────────
        let mut word_counts: Vec<(String, usize)> = Vec::new();
        let mut position:    HashMap<String, usize> = HashMap::new();

        for text in texts {
            for word in preprocessor.words(text.as_ref()) {
                match position.get(&word) {
                    Some(&i) => word_counts[i].1 += 1,
                    None => {
                        position.insert(word.clone(), word_counts.len());
                        word_counts.push((word, 1));
                    }
                }
            }
        }

        // ── Step 2: rank — sort_by is stable, ties keep first-seen order ─────
        let mut ranked: Vec<&(String, usize)> = word_counts.iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));

        // ── Step 3: assign ids, <OOV> first ──────────────────────────────────
        let mut index_word = vec![String::new(), config.oov_token.clone()];
        for (word, _) in ranked {
            if *word != config.oov_token {
                index_word.push(word.clone());
            }
        }

        tracing::debug!(
            "Fitted vocabulary: {} distinct words, {} usable ids",
            word_counts.len(),
            config.vocab_size
        );

        Ok(Self {
            config,
            oov_id: 1,
            index_word,
            preprocessor,
        })
    }

    /// Rebuild a frozen vocabulary from exported slots (one string per id).
    pub fn from_slots<S: AsRef<str>>(slots: &[S], oov_token: &str) -> Result<Self> {
        let index_word: Vec<String> = slots.iter().map(|s| s.as_ref().to_string()).collect();

        let Some(oov_pos) = index_word.iter().position(|w| w == oov_token) else {
            bail!("vocabulary has no '{oov_token}' slot");
        };
        if oov_pos == PAD_ID as usize {
            bail!("'{oov_token}' cannot occupy the padding slot");
        }

        Ok(Self {
            config: VocabularyConfig {
                vocab_size: index_word.len(),
                oov_token:  oov_token.to_string(),
            },
            oov_id: oov_pos as u32,
            index_word,
            preprocessor: Preprocessor::new(),
        })
    }

    pub fn vocab_size(&self) -> usize {
        self.config.vocab_size
    }

    pub fn oov_id(&self) -> u32 {
        self.oov_id
    }

    pub fn oov_token(&self) -> &str {
        &self.config.oov_token
    }

    pub fn preprocessor(&self) -> &Preprocessor {
        &self.preprocessor
    }

    /// Number of distinct words ranked during fitting (cap not applied)
    pub fn ranked_len(&self) -> usize {
        self.index_word.len().saturating_sub(2)
    }

    /// Usable (word, id) pairs: every id in 1..vocab_size that holds a word.
    pub fn entries(&self) -> impl Iterator<Item = (&str, u32)> + '_ {
        self.index_word
            .iter()
            .enumerate()
            .take(self.config.vocab_size)
            .skip(1)
            .filter(|(_, w)| !w.is_empty())
            .map(|(i, w)| (w.as_str(), i as u32))
    }

    /// Exactly vocab_size strings in id order, empty where no word is assigned.
    pub fn slots(&self) -> Vec<String> {
        (0..self.config.vocab_size)
            .map(|i| self.index_word.get(i).cloned().unwrap_or_default())
            .collect()
    }
}

// Word-level encoding without the HF tokenizer, used as an
// oracle for SequenceEncoder.
#[cfg(test)]
impl Vocabulary {
    /// The raw rank id of a word, ignoring the vocab_size cap
    pub fn rank_of(&self, word: &str) -> Option<u32> {
        self.index_word
            .iter()
            .position(|w| !w.is_empty() && w == word)
            .map(|i| i as u32)
    }

    /// Encoded id of a single (already preprocessed) word
    pub fn lookup(&self, word: &str) -> u32 {
        match self.rank_of(word) {
            Some(id) if (id as usize) < self.config.vocab_size => id,
            _ => self.oov_id,
        }
    }

    pub fn text_to_sequence(&self, text: &str) -> Vec<u32> {
        self.preprocessor
            .words(text)
            .iter()
            .map(|w| self.lookup(w))
            .collect()
    }

    pub fn texts_to_sequences<S: AsRef<str>>(&self, texts: &[S]) -> Vec<Vec<u32>> {
        texts.iter().map(|t| self.text_to_sequence(t.as_ref())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::corpus::embedded_corpus;

    fn corpus_texts() -> Vec<String> {
        embedded_corpus().unwrap().into_iter().map(|m| m.text).collect()
    }

    fn corpus_count(word: &str) -> usize {
        let pre = Preprocessor::new();
        corpus_texts().iter().flat_map(|t| pre.words(t)).filter(|w| w == word).count()
    }

    #[test]
    fn test_reserved_ids() {
        let v = Vocabulary::fit(&["a b"], VocabularyConfig::default()).unwrap();
        let slots = v.slots();
        assert_eq!(slots[0], "");
        assert_eq!(slots[1], "<OOV>");
        assert_eq!(v.oov_id(), 1);
    }

    #[test]
    fn test_frequency_ranking_with_stable_ties() {
        let v = Vocabulary::fit(&["b a c", "c a", "a"], VocabularyConfig::default()).unwrap();
        // a:3, c:2, b:1
        assert_eq!(v.lookup("a"), 2);
        assert_eq!(v.lookup("c"), 3);
        assert_eq!(v.lookup("b"), 4);

        let tie = Vocabulary::fit(&["y x", "x y"], VocabularyConfig::default()).unwrap();
        // both counted twice, y seen first
        assert_eq!(tie.lookup("y"), 2);
        assert_eq!(tie.lookup("x"), 3);
    }

    #[test]
    fn test_unknown_word_maps_to_oov() {
        let v = Vocabulary::fit(&["hello world"], VocabularyConfig::default()).unwrap();
        assert_eq!(v.text_to_sequence("hello stranger"), vec![2, 1]);
    }

    #[test]
    fn test_cap_sends_low_ranked_words_to_oov() {
        let cfg = VocabularyConfig { vocab_size: 4, ..Default::default() };
        let v   = Vocabulary::fit(&["a a a b b c"], cfg).unwrap();
        assert_eq!(v.lookup("a"), 2);
        assert_eq!(v.lookup("b"), 3);
        // c is ranked at id 4, outside [0, 4)
        assert_eq!(v.rank_of("c"), Some(4));
        assert_eq!(v.lookup("c"), 1);
        assert_eq!(v.slots(), vec!["", "<OOV>", "a", "b"]);
    }

    #[test]
    fn test_too_small_vocab_size_is_rejected() {
        let cfg = VocabularyConfig { vocab_size: 1, ..Default::default() };
        assert!(Vocabulary::fit(&["a"], cfg).is_err());
    }

    #[test]
    fn test_empty_corpus_yields_only_reserved_slots() {
        let texts: Vec<String> = Vec::new();
        let v = Vocabulary::fit(&texts, VocabularyConfig::default()).unwrap();
        assert_eq!(v.ranked_len(), 0);
        assert_eq!(v.entries().count(), 1); // only <OOV>
    }

    #[test]
    fn test_corpus_ranking() {
        let v = Vocabulary::fit(&corpus_texts(), VocabularyConfig::default()).unwrap();
        // "your" is the most frequent word in the corpus
        assert_eq!(v.lookup("your"), 2);
        assert_eq!(corpus_count("your"), 12);
        assert_eq!(v.lookup("rs"), 3);
        // every id is below the cap for this tiny corpus
        assert!(v.ranked_len() + 2 <= v.vocab_size());
        for (word, id) in v.entries().skip(1) {
            assert_eq!(v.rank_of(word), Some(id));
        }
    }

    #[test]
    fn test_counts_never_increase_with_rank() {
        let v = Vocabulary::fit(&corpus_texts(), VocabularyConfig::default()).unwrap();
        let counts: Vec<usize> = v
            .entries()
            .skip(1)
            .map(|(w, _)| corpus_count(w))
            .collect();
        assert!(counts.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_fit_is_deterministic() {
        let a = Vocabulary::fit(&corpus_texts(), VocabularyConfig::default()).unwrap();
        let b = Vocabulary::fit(&corpus_texts(), VocabularyConfig::default()).unwrap();
        assert_eq!(a.slots(), b.slots());
    }

    #[test]
    fn test_from_slots_matches_fitted_lookup() {
        let texts  = corpus_texts();
        let fitted = Vocabulary::fit(&texts, VocabularyConfig::default()).unwrap();
        let loaded = Vocabulary::from_slots(&fitted.slots(), "<OOV>").unwrap();
        assert_eq!(loaded.vocab_size(), 1000);
        assert_eq!(loaded.texts_to_sequences(&texts), fitted.texts_to_sequences(&texts));
        assert_eq!(loaded.text_to_sequence("totally unseen"), vec![1, 1]);
    }

    #[test]
    fn test_from_slots_requires_oov() {
        assert!(Vocabulary::from_slots(&["", "a", "b"], "<OOV>").is_err());
        assert!(Vocabulary::from_slots(&["<OOV>", "a"], "<OOV>").is_err());
    }
}
