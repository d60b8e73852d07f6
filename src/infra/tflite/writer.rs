// ============================================================
// Layer 6 — TFLite Writer
// ============================================================
// Turns the trained parameters into a TFLite graph and writes
// it to disk.
//
//   input_ids  int32 [1, L]
//       │
//   GATHER(embedding)          [1, L, D]
//       │
//   MEAN(axis = 1)             [1, D]
//       │
//   FULLY_CONNECTED + RELU     [1, H]
//       │
//   FULLY_CONNECTED            [1, C]
//       │
//   SOFTMAX(beta = 1)          probabilities float32 [1, C]
//
// TFLite stores dense weights as [out, in], Burn as [in, out],
// so both matrices are transposed on the way out.
//
// With Quantization::Int8 each weight table is stored as int8
// and a DEQUANTIZE op in front of its consumer restores float32.

use std::{fs, path::Path};

use crate::infra::tflite::{
    codec::encode_model,
    error::TfliteError,
    quantize::{quantize_symmetric, Quantization},
    schema::{
        Activation, BuiltinOp, ModelDef, OperatorCodeDef, OperatorDef, OperatorOptions,
        QuantizationDef, SubGraphDef, TensorDef, TensorType, SCHEMA_VERSION,
    },
};
use crate::ml::model::ModelWeights;

pub const INPUT_TENSOR_NAME: &str  = "input_ids";
pub const OUTPUT_TENSOR_NAME: &str = "probabilities";

const MODEL_DESCRIPTION: &str = "scam-detector sms risk classifier";

// ─── GraphBuilder ─────────────────────────────────────────────────────────────
/// Accumulates tensors, buffers and operators of a single subgraph.
struct GraphBuilder {
    tensors:        Vec<TensorDef>,
    buffers:        Vec<Vec<u8>>,
    operator_codes: Vec<OperatorCodeDef>,
    operators:      Vec<OperatorDef>,
}

impl GraphBuilder {
    fn new() -> Self {
        Self {
            tensors:        Vec::new(),
            // buffer 0: shared empty buffer of every activation tensor
            buffers:        vec![Vec::new()],
            operator_codes: Vec::new(),
            operators:      Vec::new(),
        }
    }

    fn push_tensor(
        &mut self,
        name:         &str,
        shape:        &[usize],
        dtype:        TensorType,
        data:         Option<Vec<u8>>,
        quantization: Option<QuantizationDef>,
    ) -> i32 {
        let buffer = match data {
            Some(bytes) => {
                self.buffers.push(bytes);
                (self.buffers.len() - 1) as u32
            }
            None => 0,
        };
        self.tensors.push(TensorDef {
            name: name.to_string(),
            shape: shape.iter().map(|&d| d as i32).collect(),
            dtype,
            buffer,
            quantization,
        });
        (self.tensors.len() - 1) as i32
    }

    fn activation(&mut self, name: &str, shape: &[usize]) -> i32 {
        self.push_tensor(name, shape, TensorType::Float32, None, None)
    }

    fn constant_f32(&mut self, name: &str, shape: &[usize], values: &[f32]) -> i32 {
        let bytes = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.push_tensor(name, shape, TensorType::Float32, Some(bytes), None)
    }

    fn constant_i32(&mut self, name: &str, shape: &[usize], values: &[i32]) -> i32 {
        let bytes = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.push_tensor(name, shape, TensorType::Int32, Some(bytes), None)
    }

    /// A float32 weight table, stored as float32 or as int8 + DEQUANTIZE.
    fn weight(&mut self, name: &str, shape: &[usize], values: &[f32], mode: Quantization) -> i32 {
        match mode {
            Quantization::None => self.constant_f32(name, shape, values),
            Quantization::Int8 => {
                let q = quantize_symmetric(values);
                let stored = self.push_tensor(
                    &format!("{name}_int8"),
                    shape,
                    TensorType::Int8,
                    Some(q.to_bytes()),
                    Some(QuantizationDef { scale: vec![q.scale], zero_point: vec![q.zero_point] }),
                );
                let restored = self.activation(name, shape);
                self.push_op(BuiltinOp::Dequantize, &[stored], &[restored], OperatorOptions::Dequantize);
                restored
            }
        }
    }

    fn opcode_index(&mut self, op: BuiltinOp) -> u32 {
        let found = self.operator_codes.iter().position(|c| c.op == op);
        let index = found.unwrap_or_else(|| {
            self.operator_codes.push(OperatorCodeDef { op, version: op.version() });
            self.operator_codes.len() - 1
        });
        index as u32
    }

    fn push_op(&mut self, op: BuiltinOp, inputs: &[i32], outputs: &[i32], options: OperatorOptions) {
        let opcode_index = self.opcode_index(op);
        self.operators.push(OperatorDef {
            opcode_index,
            inputs: inputs.to_vec(),
            outputs: outputs.to_vec(),
            options,
        });
    }

    fn finish(self, inputs: Vec<i32>, outputs: Vec<i32>) -> ModelDef {
        ModelDef {
            version:        SCHEMA_VERSION,
            description:    MODEL_DESCRIPTION.to_string(),
            operator_codes: self.operator_codes,
            subgraph: SubGraphDef {
                name: "main".to_string(),
                tensors: self.tensors,
                inputs,
                outputs,
                operators: self.operators,
            },
            buffers: self.buffers,
        }
    }
}

/// [rows, cols] row-major → [cols, rows] row-major
fn transpose(values: &[f32], rows: usize, cols: usize) -> Vec<f32> {
    let mut out = vec![0.0; values.len()];
    for r in 0..rows {
        for c in 0..cols {
            out[c * rows + r] = values[r * cols + c];
        }
    }
    out
}

fn check_len(name: &str, values: &[f32], expected: usize) -> Result<(), TfliteError> {
    if values.len() == expected {
        Ok(())
    } else {
        Err(TfliteError::Unsupported(format!(
            "{name} has {} values, expected {expected}",
            values.len()
        )))
    }
}

// ─── TfliteWriter ─────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy)]
pub struct TfliteWriter {
    max_length:   usize,
    quantization: Quantization,
}

impl TfliteWriter {
    pub fn new(max_length: usize, quantization: Quantization) -> Self {
        Self { max_length, quantization }
    }

    /// Build the in-memory graph for the given weights.
    pub fn build(&self, w: &ModelWeights) -> Result<ModelDef, TfliteError> {
        let (v, d, h, c) = (w.vocab_size, w.embedding_dim, w.hidden_units, w.num_classes);
        check_len("embedding", &w.embedding, v * d)?;
        check_len("hidden weight", &w.hidden_weight, d * h)?;
        check_len("hidden bias", &w.hidden_bias, h)?;
        check_len("output weight", &w.output_weight, h * c)?;
        check_len("output bias", &w.output_bias, c)?;
        if self.max_length == 0 {
            return Err(TfliteError::Unsupported("max_length must be at least 1".into()));
        }

        let mode  = self.quantization;
        let len   = self.max_length;
        let mut g = GraphBuilder::new();

        let input = g.push_tensor(INPUT_TENSOR_NAME, &[1, len], TensorType::Int32, None, None);

        let embedding = g.weight("embedding", &[v, d], &w.embedding, mode);
        let gathered  = g.activation("embedded", &[1, len, d]);
        g.push_op(
            BuiltinOp::Gather,
            &[embedding, input],
            &[gathered],
            OperatorOptions::Gather { axis: 0, batch_dims: 0 },
        );

        let axis   = g.constant_i32("mean_axis", &[1], &[1]);
        let pooled = g.activation("pooled", &[1, d]);
        g.push_op(BuiltinOp::Mean, &[gathered, axis], &[pooled], OperatorOptions::Reducer { keep_dims: false });

        let hidden_w = g.weight("hidden_kernel", &[h, d], &transpose(&w.hidden_weight, d, h), mode);
        let hidden_b = g.constant_f32("hidden_bias", &[h], &w.hidden_bias);
        let hidden   = g.activation("hidden", &[1, h]);
        g.push_op(
            BuiltinOp::FullyConnected,
            &[pooled, hidden_w, hidden_b],
            &[hidden],
            OperatorOptions::FullyConnected { activation: Activation::Relu, keep_num_dims: false },
        );

        let output_w = g.weight("output_kernel", &[c, h], &transpose(&w.output_weight, h, c), mode);
        let output_b = g.constant_f32("output_bias", &[c], &w.output_bias);
        let logits   = g.activation("logits", &[1, c]);
        g.push_op(
            BuiltinOp::FullyConnected,
            &[hidden, output_w, output_b],
            &[logits],
            OperatorOptions::FullyConnected { activation: Activation::None, keep_num_dims: false },
        );

        let probabilities = g.activation(OUTPUT_TENSOR_NAME, &[1, c]);
        g.push_op(BuiltinOp::Softmax, &[logits], &[probabilities], OperatorOptions::Softmax { beta: 1.0 });

        Ok(g.finish(vec![input], vec![probabilities]))
    }

    pub fn to_bytes(&self, weights: &ModelWeights) -> Result<Vec<u8>, TfliteError> {
        Ok(encode_model(&self.build(weights)?))
    }

    /// Serialize and write to `path`, replacing any existing file.
    /// Returns the number of bytes written.
    pub fn write(&self, path: &Path, weights: &ModelWeights) -> Result<usize, TfliteError> {
        let bytes = self.to_bytes(weights)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, &bytes)?;
        tracing::debug!("Wrote {} bytes ({} weights) to '{}'", bytes.len(), self.quantization, path.display());
        Ok(bytes.len())
    }
}
