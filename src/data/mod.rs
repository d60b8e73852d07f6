// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between the labelled corpus and Burn tensors.
//
//   sms_corpus.json
//       │
//       ▼
//   corpus          → labelled messages (embedded or from disk)
//       │
//       ▼
//   preprocessor    → lower-case, strip punctuation, split words
//       │
//       ▼
//   vocabulary      → frequency-ranked word index with <OOV>
//       │
//       ▼
//   sequence        → fixed-length id sequences (post pad/truncate)
//       │
//       ▼
//   SmsDataset      → implements Burn's Dataset trait
//       │
//       ▼
//   SmsBatcher      → stacks samples into [N, max_length] tensors
//
// Each module is one step and can be tested without a backend.

/// Built-in corpus and JSON corpus loader
pub mod corpus;

/// Word splitting shared by vocabulary fitting and the tokenizer
pub mod preprocessor;

/// Frequency-ranked word index
pub mod vocabulary;

/// Post-truncation and post-padding to a fixed length
pub mod sequence;

/// Implements Burn's Dataset trait for encoded messages
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;
