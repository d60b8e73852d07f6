// ============================================================
// Layer 2 — Inspect Use Case
// ============================================================
// Reads an exported .tflite file back the way the phone will:
// verify the flatbuffer, allocate tensors, check the declared
// input and output shapes.
//
// Used standalone by `inspect` and as the last step of `train`.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};

use crate::domain::risk::NUM_TIERS;
use crate::infra::tflite::{schema::BuiltinOp, Interpreter, TensorDetails};

/// Declared shapes of the graph input and output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelShapes {
    pub input:  Vec<usize>,
    pub output: Vec<usize>,
}

#[derive(Debug, Clone)]
pub struct ModelReport {
    pub path:        PathBuf,
    pub description: String,
    pub shapes:      ModelShapes,
    pub operators:   Vec<BuiltinOp>,
    pub tensors:     Vec<TensorDetails>,
}

/// Load, allocate and return the io shapes of a single-input,
/// single-output classifier graph.
fn open_checked(path: &Path) -> Result<(Interpreter, ModelShapes)> {
    let mut interpreter = Interpreter::from_file(path)
        .with_context(|| format!("Cannot load model '{}'", path.display()))?;
    interpreter
        .allocate_tensors()
        .with_context(|| format!("Cannot allocate tensors for '{}'", path.display()))?;

    let inputs  = interpreter.input_details();
    let outputs = interpreter.output_details();
    let (input, output) = match (inputs.as_slice(), outputs.as_slice()) {
        ([input], [output]) => (input.shape.clone(), output.shape.clone()),
        _ => bail!(
            "expected one input and one output tensor, found {} and {}",
            inputs.len(),
            outputs.len()
        ),
    };

    if input.len() != 2 || input[0] != 1 {
        bail!("input shape {:?} is not [1, sequence_length]", input);
    }
    if output != [1, NUM_TIERS] {
        bail!("output shape {:?} is not [1, {}]", output, NUM_TIERS);
    }
    Ok((interpreter, ModelShapes { input, output }))
}

/// Post-export check used by `train`: the model must take exactly
/// `max_length` token ids.
pub fn verify_model(path: &Path, max_length: usize) -> Result<ModelShapes> {
    let (_, shapes) = open_checked(path)?;
    if shapes.input[1] != max_length {
        bail!("input shape {:?} does not match max_length {}", shapes.input, max_length);
    }
    tracing::info!("Verified '{}': input {:?}, output {:?}", path.display(), shapes.input, shapes.output);
    Ok(shapes)
}

pub struct InspectUseCase {
    model_path: PathBuf,
}

impl InspectUseCase {
    pub fn new(model_path: impl Into<PathBuf>) -> Self {
        Self { model_path: model_path.into() }
    }

    pub fn execute(&self) -> Result<ModelReport> {
        let (interpreter, shapes) = open_checked(&self.model_path)?;
        tracing::info!(
            "'{}' is valid: {} operators, {} tensors",
            self.model_path.display(),
            interpreter.operators().len(),
            interpreter.tensors().len(),
        );
        Ok(ModelReport {
            path:        self.model_path.clone(),
            description: interpreter.description().to_string(),
            shapes,
            operators:   interpreter.operators().to_vec(),
            tensors:     interpreter.tensors(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::tflite::{
        writer::{tests::sample_weights, TfliteWriter},
        Quantization,
    };

    fn export(dir: &Path, len: usize) -> PathBuf {
        let path = dir.join("model.tflite");
        TfliteWriter::new(len, Quantization::Int8).write(&path, &sample_weights()).unwrap();
        path
    }

    #[test]
    fn test_verify_reports_shapes() {
        let dir    = tempfile::tempdir().unwrap();
        let shapes = verify_model(&export(dir.path(), 20), 20).unwrap();
        assert_eq!(shapes.input, vec![1, 20]);
        assert_eq!(shapes.output, vec![1, 3]);
    }

    #[test]
    fn test_verify_rejects_length_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        assert!(verify_model(&export(dir.path(), 12), 20).is_err());
    }

    #[test]
    fn test_inspect_lists_graph() {
        let dir    = tempfile::tempdir().unwrap();
        let report = InspectUseCase::new(export(dir.path(), 20)).execute().unwrap();
        assert_eq!(report.operators.first(), Some(&BuiltinOp::Dequantize));
        assert_eq!(report.operators.last(), Some(&BuiltinOp::Softmax));
        assert!(report.tensors.iter().any(|t| t.name == "input_ids"));
    }

    #[test]
    fn test_inspect_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(InspectUseCase::new(dir.path().join("none.tflite")).execute().is_err());
    }
}
