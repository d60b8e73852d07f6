// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Everything that touches the filesystem or a file format:
//
//   artifacts.rs       — Where the exported files live
//                        (assets/models/ under the project root)
//
//   tokenizer_store.rs — vocab.txt export and reload, plus the
//                        HuggingFace tokenizer built from a frozen
//                        vocabulary for encoding messages
//
//   tflite/            — TensorFlow Lite flatbuffer writer, int8
//                        weight quantization, and a reference
//                        interpreter used to verify the export
//
//   metrics.rs         — Training metrics logging
//                        Writes epoch-level metrics (loss,
//                        accuracy) to a CSV file for later
//                        analysis and plotting.
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling with anyhow)

/// Output file locations
pub mod artifacts;

/// Vocabulary persistence and tokenizer construction
pub mod tokenizer_store;

/// TFLite export and verification
pub mod tflite;

/// Training metrics CSV logger
pub mod metrics;
