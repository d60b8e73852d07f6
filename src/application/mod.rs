// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates all the other layers to accomplish
// one goal per CLI command.
//
// Rules for this layer:
//   - No ML math or model code here
//   - No file-format code here (that's Layer 6)
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// Corpus → vocab.txt + scam_detector.tflite
pub mod train_use_case;

// Score one message with the exported artifacts
pub mod classify_use_case;

// Verify an exported model and list its graph
pub mod inspect_use_case;
