// ============================================================
// Layer 6 — TensorFlow Lite Export
// ============================================================
// Everything needed to ship the classifier to a phone and to
// check the shipped file afterwards:
//
//   schema.rs      — owned model description (tensors, ops,
//                    buffers) and the schema.fbs enum codes
//   codec.rs       — flatbuffer encoding and verified decoding
//   quantize.rs    — symmetric per-tensor int8 weights
//   writer.rs      — ModelWeights → operator graph → .tflite
//   interpreter.rs — CPU reference runtime for the same graph
//   error.rs       — TfliteError
//
// Reference: tensorflow/lite/schema/schema.fbs
//            Jacob et al. (2018) Quantization and Training of
//            Neural Networks for Efficient Integer-Arithmetic-Only
//            Inference

pub mod codec;
pub mod error;
pub mod interpreter;
pub mod quantize;
pub mod schema;
pub mod writer;

pub use interpreter::{Interpreter, TensorDetails};
pub use quantize::Quantization;
pub use writer::TfliteWriter;
