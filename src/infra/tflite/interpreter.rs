// ============================================================
// Layer 6 — Reference Interpreter
// ============================================================
// Loads a .tflite file and runs it on the CPU, one operator at
// a time in file order. Supports exactly the kernels the
// writer emits:
//
//   DEQUANTIZE       int8 → float32 (per-tensor scale)
//   GATHER           axis 0, batch_dims 0
//   MEAN             one reduction axis
//   FULLY_CONNECTED  fused NONE / RELU, optional bias
//   SOFTMAX          over the last axis, with beta
//
// Usage mirrors the TFLite Python interpreter:
//
//   let mut it = Interpreter::from_file(path)?;
//   it.allocate_tensors()?;
//   it.set_input_i32(0, &ids)?;
//   it.invoke()?;
//   let probs = it.output_f32(0)?;

use std::{fs, path::Path};

use crate::infra::tflite::{
    codec::decode_model,
    error::TfliteError,
    quantize::dequantize_values,
    schema::{BuiltinOp, ModelDef, OperatorDef, OperatorOptions, TensorDef, TensorType},
};

/// Public view of one graph tensor
#[derive(Debug, Clone, PartialEq)]
pub struct TensorDetails {
    pub index: usize,
    pub name:  String,
    pub shape: Vec<usize>,
    pub dtype: TensorType,
}

#[derive(Debug, Clone)]
enum TensorData {
    F32(Vec<f32>),
    I32(Vec<i32>),
    I8(Vec<i8>),
}

pub struct Interpreter {
    model:   ModelDef,
    ops:     Vec<BuiltinOp>,
    /// Empty until allocate_tensors is called
    values:  Vec<TensorData>,
}

impl Interpreter {
    pub fn from_file(path: &Path) -> Result<Self, TfliteError> {
        let bytes = fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TfliteError> {
        let model = decode_model(bytes)?;
        let ops   = validate(&model)?;
        Ok(Self { model, ops, values: Vec::new() })
    }

    /// Materialise every tensor: constants from their buffers,
    /// everything else zero-filled.
    pub fn allocate_tensors(&mut self) -> Result<(), TfliteError> {
        let mut values = Vec::with_capacity(self.model.subgraph.tensors.len());
        for (index, tensor) in self.model.subgraph.tensors.iter().enumerate() {
            let data  = &self.model.buffers[tensor.buffer as usize];
            let count = tensor.element_count();
            let value = if data.is_empty() {
                match tensor.dtype {
                    TensorType::Float32 => TensorData::F32(vec![0.0; count]),
                    TensorType::Int32   => TensorData::I32(vec![0; count]),
                    TensorType::Int8    => TensorData::I8(vec![0; count]),
                }
            } else {
                decode_constant(index, tensor, data)?
            };
            values.push(value);
        }
        self.values = values;
        tracing::debug!("Allocated {} tensors", self.values.len());
        Ok(())
    }

    pub fn is_allocated(&self) -> bool {
        !self.values.is_empty()
    }

    pub fn description(&self) -> &str {
        &self.model.description
    }

    pub fn tensors(&self) -> Vec<TensorDetails> {
        self.model
            .subgraph
            .tensors
            .iter()
            .enumerate()
            .map(|(index, t)| details(index, t))
            .collect()
    }

    /// Operators in execution order
    pub fn operators(&self) -> &[BuiltinOp] {
        &self.ops
    }

    pub fn input_details(&self) -> Vec<TensorDetails> {
        self.io_details(&self.model.subgraph.inputs)
    }

    pub fn output_details(&self) -> Vec<TensorDetails> {
        self.io_details(&self.model.subgraph.outputs)
    }

    fn io_details(&self, indices: &[i32]) -> Vec<TensorDetails> {
        indices
            .iter()
            .map(|&i| details(i as usize, &self.model.subgraph.tensors[i as usize]))
            .collect()
    }

    /// Copy `ids` into graph input number `input`.
    pub fn set_input_i32(&mut self, input: usize, ids: &[i32]) -> Result<(), TfliteError> {
        if !self.is_allocated() {
            return Err(TfliteError::NotAllocated);
        }
        let index = self.graph_io(&self.model.subgraph.inputs, input, "input")?;
        let expected = self.model.subgraph.tensors[index].element_count();
        if ids.len() != expected {
            return Err(self.invalid(index, format!("expected {expected} values, got {}", ids.len())));
        }
        if let TensorData::I32(slot) = &mut self.values[index] {
            slot.copy_from_slice(ids);
            return Ok(());
        }
        Err(self.invalid(index, "input is not int32".into()))
    }

    pub fn output_f32(&self, output: usize) -> Result<&[f32], TfliteError> {
        if !self.is_allocated() {
            return Err(TfliteError::NotAllocated);
        }
        let index = self.graph_io(&self.model.subgraph.outputs, output, "output")?;
        self.f32_at(index)
    }

    /// Run every operator once.
    pub fn invoke(&mut self) -> Result<(), TfliteError> {
        if !self.is_allocated() {
            return Err(TfliteError::NotAllocated);
        }
        for position in 0..self.model.subgraph.operators.len() {
            let op    = self.ops[position];
            let def   = self.model.subgraph.operators[position].clone();
            let out   = self.tensor_index(def.outputs.first().copied().unwrap_or(-1))?;
            let value = match op {
                BuiltinOp::Dequantize     => self.run_dequantize(&def)?,
                BuiltinOp::Gather         => self.run_gather(&def)?,
                BuiltinOp::Mean           => self.run_mean(&def)?,
                BuiltinOp::FullyConnected => self.run_fully_connected(&def)?,
                BuiltinOp::Softmax        => self.run_softmax(&def, out)?,
            };
            let expected = self.model.subgraph.tensors[out].element_count();
            if value.len() != expected {
                return Err(self.invalid(
                    out,
                    format!("{} produced {} values, shape holds {expected}", op.name(), value.len()),
                ));
            }
            self.values[out] = TensorData::F32(value);
        }
        Ok(())
    }

    // ── Kernels ───────────────────────────────────────────────────────────────

    fn run_dequantize(&self, def: &OperatorDef) -> Result<Vec<f32>, TfliteError> {
        let index  = self.input(def, 0)?;
        let tensor = &self.model.subgraph.tensors[index];
        let q = tensor
            .quantization
            .as_ref()
            .ok_or_else(|| self.invalid(index, "int8 tensor without quantization".into()))?;
        match &self.values[index] {
            TensorData::I8(values) => Ok(dequantize_values(values, q.scale[0], q.zero_point[0])),
            _ => Err(self.invalid(index, "DEQUANTIZE input is not int8".into())),
        }
    }

    fn run_gather(&self, def: &OperatorDef) -> Result<Vec<f32>, TfliteError> {
        if let OperatorOptions::Gather { axis, batch_dims } = def.options {
            if axis != 0 || batch_dims != 0 {
                return Err(TfliteError::Unsupported(format!(
                    "GATHER axis={axis} batch_dims={batch_dims}"
                )));
            }
        }
        let params_index = self.input(def, 0)?;
        let params  = self.f32_at(params_index)?;
        let indices = self.i32_at(self.input(def, 1)?)?;

        let shape = &self.model.subgraph.tensors[params_index].shape;
        let rows  = shape.first().copied().unwrap_or(0).max(0) as usize;
        if rows == 0 {
            return Err(self.invalid(params_index, "GATHER params have no rows".into()));
        }
        let width = params.len() / rows;

        let mut out = Vec::with_capacity(indices.len() * width);
        for &index in indices {
            if index < 0 || index as usize >= rows {
                return Err(TfliteError::GatherIndexOutOfRange { index, limit: rows });
            }
            let start = index as usize * width;
            out.extend_from_slice(&params[start..start + width]);
        }
        Ok(out)
    }

    fn run_mean(&self, def: &OperatorDef) -> Result<Vec<f32>, TfliteError> {
        let input_index = self.input(def, 0)?;
        let input = self.f32_at(input_index)?;
        let axes  = self.i32_at(self.input(def, 1)?)?;
        let shape: Vec<usize> = self.model.subgraph.tensors[input_index]
            .shape
            .iter()
            .map(|&d| d.max(0) as usize)
            .collect();

        let [axis] = axes else {
            return Err(TfliteError::Unsupported(format!("MEAN over {} axes", axes.len())));
        };
        let rank = shape.len() as i32;
        let axis = if *axis < 0 { axis + rank } else { *axis };
        if axis < 0 || axis >= rank {
            return Err(self.invalid(input_index, format!("MEAN axis {axis} out of range")));
        }

        let axis  = axis as usize;
        let outer: usize = shape[..axis].iter().product();
        let size  = shape[axis];
        let inner: usize = shape[axis + 1..].iter().product();

        let mut out = vec![0.0f32; outer * inner];
        for o in 0..outer {
            for s in 0..size {
                let base = (o * size + s) * inner;
                for i in 0..inner {
                    out[o * inner + i] += input[base + i];
                }
            }
        }
        let n = size.max(1) as f32;
        out.iter_mut().for_each(|v| *v /= n);
        Ok(out)
    }

    fn run_fully_connected(&self, def: &OperatorDef) -> Result<Vec<f32>, TfliteError> {
        let OperatorOptions::FullyConnected { activation, .. } = def.options else {
            return Err(TfliteError::MissingField("FullyConnectedOptions"));
        };
        let input = self.f32_at(self.input(def, 0)?)?;
        let weight_index = self.input(def, 1)?;
        let weights = self.f32_at(weight_index)?;

        let shape = &self.model.subgraph.tensors[weight_index].shape;
        let (units, depth) = match shape.as_slice() {
            [u, d] if *u > 0 && *d > 0 => (*u as usize, *d as usize),
            _ => return Err(self.invalid(weight_index, format!("weights must be 2-D, got {shape:?}"))),
        };
        if input.len() % depth != 0 {
            return Err(self.invalid(weight_index, format!("input of {} values is not a multiple of {depth}", input.len())));
        }

        let bias = match def.inputs.get(2).copied().filter(|&i| i >= 0) {
            Some(i) => {
                let index = self.tensor_index(i)?;
                let bias  = self.f32_at(index)?;
                if bias.len() != units {
                    return Err(self.invalid(index, format!("bias has {} values for {units} units", bias.len())));
                }
                Some(bias)
            }
            None => None,
        };

        let batches = input.len() / depth;
        let mut out = Vec::with_capacity(batches * units);
        for b in 0..batches {
            let row = &input[b * depth..(b + 1) * depth];
            for u in 0..units {
                let w = &weights[u * depth..(u + 1) * depth];
                let dot: f32 = row.iter().zip(w).map(|(x, w)| x * w).sum();
                let z = dot + bias.map_or(0.0, |bias| bias[u]);
                out.push(activation.apply(z));
            }
        }
        Ok(out)
    }

    fn run_softmax(&self, def: &OperatorDef, out_index: usize) -> Result<Vec<f32>, TfliteError> {
        let beta = match def.options {
            OperatorOptions::Softmax { beta } => beta,
            _ => 1.0,
        };
        let logits = self.f32_at(self.input(def, 0)?)?;
        let width  = self.model.subgraph.tensors[out_index]
            .shape
            .last()
            .copied()
            .unwrap_or(0)
            .max(1) as usize;

        let mut out = Vec::with_capacity(logits.len());
        for row in logits.chunks(width) {
            let max = row.iter().copied().fold(f32::NEG_INFINITY, f32::max);
            let exp: Vec<f32> = row.iter().map(|&z| ((z - max) * beta).exp()).collect();
            let sum: f32 = exp.iter().sum();
            out.extend(exp.iter().map(|e| e / sum));
        }
        Ok(out)
    }

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn tensor_index(&self, raw: i32) -> Result<usize, TfliteError> {
        let count = self.model.subgraph.tensors.len();
        if raw < 0 || raw as usize >= count {
            return Err(TfliteError::Unsupported(format!("tensor index {raw} (graph has {count})")));
        }
        Ok(raw as usize)
    }

    fn input(&self, def: &OperatorDef, position: usize) -> Result<usize, TfliteError> {
        let raw = def
            .inputs
            .get(position)
            .copied()
            .ok_or(TfliteError::MissingField("operator input"))?;
        self.tensor_index(raw)
    }

    fn graph_io(&self, list: &[i32], position: usize, kind: &str) -> Result<usize, TfliteError> {
        let raw = list
            .get(position)
            .copied()
            .ok_or_else(|| TfliteError::Unsupported(format!("graph has no {kind} #{position}")))?;
        self.tensor_index(raw)
    }

    fn f32_at(&self, index: usize) -> Result<&[f32], TfliteError> {
        match &self.values[index] {
            TensorData::F32(v) => Ok(v),
            _ => Err(self.invalid(index, "expected float32 data".into())),
        }
    }

    fn i32_at(&self, index: usize) -> Result<&[i32], TfliteError> {
        match &self.values[index] {
            TensorData::I32(v) => Ok(v),
            _ => Err(self.invalid(index, "expected int32 data".into())),
        }
    }

    fn invalid(&self, index: usize, reason: String) -> TfliteError {
        let name = self
            .model
            .subgraph
            .tensors
            .get(index)
            .map(|t| t.name.clone())
            .unwrap_or_default();
        TfliteError::InvalidTensor { index, name, reason }
    }
}

fn details(index: usize, tensor: &TensorDef) -> TensorDetails {
    TensorDetails {
        index,
        name:  tensor.name.clone(),
        shape: tensor.shape.iter().map(|&d| d.max(0) as usize).collect(),
        dtype: tensor.dtype,
    }
}

fn decode_constant(index: usize, tensor: &TensorDef, data: &[u8]) -> Result<TensorData, TfliteError> {
    let expected = tensor.element_count() * tensor.dtype.size();
    if data.len() != expected {
        return Err(TfliteError::InvalidTensor {
            index,
            name:   tensor.name.clone(),
            reason: format!("buffer holds {} bytes, shape needs {expected}", data.len()),
        });
    }
    let words = || data.chunks_exact(4).map(|c| [c[0], c[1], c[2], c[3]]);
    Ok(match tensor.dtype {
        TensorType::Float32 => TensorData::F32(words().map(f32::from_le_bytes).collect()),
        TensorType::Int32   => TensorData::I32(words().map(i32::from_le_bytes).collect()),
        TensorType::Int8    => TensorData::I8(data.iter().map(|&b| b as i8).collect()),
    })
}

/// Structural checks that make `invoke` index-safe.
fn validate(model: &ModelDef) -> Result<Vec<BuiltinOp>, TfliteError> {
    let graph = &model.subgraph;
    let count = graph.tensors.len() as i32;

    for (index, tensor) in graph.tensors.iter().enumerate() {
        if tensor.buffer as usize >= model.buffers.len() {
            return Err(TfliteError::InvalidTensor {
                index,
                name:   tensor.name.clone(),
                reason: format!("buffer {} does not exist", tensor.buffer),
            });
        }
        if let Some(q) = &tensor.quantization {
            if q.scale.len() != 1 || q.zero_point.len() != 1 {
                return Err(TfliteError::Unsupported(format!(
                    "per-channel quantization on tensor '{}'",
                    tensor.name
                )));
            }
        }
    }

    for &i in graph.inputs.iter().chain(&graph.outputs) {
        if i < 0 || i >= count {
            return Err(TfliteError::Unsupported(format!("graph i/o tensor index {i}")));
        }
    }

    let mut ops = Vec::with_capacity(graph.operators.len());
    for op in &graph.operators {
        let code = model
            .operator_codes
            .get(op.opcode_index as usize)
            .ok_or_else(|| TfliteError::Unsupported(format!("opcode index {}", op.opcode_index)))?;
        let outputs_ok = op.outputs.len() == 1 && (0..count).contains(&op.outputs[0]);
        if !outputs_ok {
            return Err(TfliteError::Unsupported(format!(
                "{} must have exactly one output tensor",
                code.op.name()
            )));
        }
        if let Some(&bad) = op.inputs.iter().find(|&&i| i < -1 || i >= count) {
            return Err(TfliteError::Unsupported(format!("{} input tensor {bad}", code.op.name())));
        }
        ops.push(code.op);
    }
    Ok(ops)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::tflite::{
        codec::encode_model,
        quantize::Quantization,
        writer::{tests::sample_weights, TfliteWriter},
    };
    use crate::ml::model::ModelWeights;

    fn interpreter(mode: Quantization, len: usize) -> Interpreter {
        let bytes = TfliteWriter::new(len, mode).to_bytes(&sample_weights()).unwrap();
        let mut it = Interpreter::from_bytes(&bytes).unwrap();
        it.allocate_tensors().unwrap();
        it
    }

    /// Straight-line float forward pass over the Burn-layout weights
    fn reference_forward(w: &ModelWeights, ids: &[i32]) -> Vec<f32> {
        let (d, h, c) = (w.embedding_dim, w.hidden_units, w.num_classes);
        let mut pooled = vec![0.0f32; d];
        for &id in ids {
            for k in 0..d {
                pooled[k] += w.embedding[id as usize * d + k];
            }
        }
        pooled.iter_mut().for_each(|p| *p /= ids.len() as f32);

        let hidden: Vec<f32> = (0..h)
            .map(|j| {
                let z: f32 = (0..d).map(|k| pooled[k] * w.hidden_weight[k * h + j]).sum();
                (z + w.hidden_bias[j]).max(0.0)
            })
            .collect();
        let logits: Vec<f32> = (0..c)
            .map(|j| (0..h).map(|k| hidden[k] * w.output_weight[k * c + j]).sum::<f32>() + w.output_bias[j])
            .collect();
        let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let exp: Vec<f32> = logits.iter().map(|z| (z - max).exp()).collect();
        let sum: f32 = exp.iter().sum();
        exp.iter().map(|e| e / sum).collect()
    }

    #[test]
    fn test_io_details() {
        let it = interpreter(Quantization::Int8, 6);
        let input  = &it.input_details()[0];
        let output = &it.output_details()[0];
        assert_eq!(input.name, "input_ids");
        assert_eq!(input.shape, vec![1, 6]);
        assert_eq!(input.dtype, TensorType::Int32);
        assert_eq!(output.name, "probabilities");
        assert_eq!(output.shape, vec![1, 3]);
        assert_eq!(output.dtype, TensorType::Float32);
    }

    #[test]
    fn test_float_model_matches_reference_forward() {
        let ids = [3, 7, 1, 0, 0, 0];
        let mut it = interpreter(Quantization::None, 6);
        it.set_input_i32(0, &ids).unwrap();
        it.invoke().unwrap();

        let expected = reference_forward(&sample_weights(), &ids);
        let got      = it.output_f32(0).unwrap();
        for (g, e) in got.iter().zip(&expected) {
            assert!((g - e).abs() < 1e-5, "{got:?} vs {expected:?}");
        }
    }

    #[test]
    fn test_int8_model_is_close_to_float() {
        let ids = [2, 11, 5, 9, 0, 0];
        let mut float = interpreter(Quantization::None, 6);
        let mut quant = interpreter(Quantization::Int8, 6);
        for it in [&mut float, &mut quant] {
            it.set_input_i32(0, &ids).unwrap();
            it.invoke().unwrap();
        }
        let f = float.output_f32(0).unwrap();
        let q = quant.output_f32(0).unwrap();
        for (a, b) in f.iter().zip(q) {
            assert!((a - b).abs() < 0.02, "{f:?} vs {q:?}");
        }
    }

    #[test]
    fn test_outputs_are_probabilities() {
        let mut it = interpreter(Quantization::Int8, 6);
        it.set_input_i32(0, &[1, 2, 3, 4, 5, 6]).unwrap();
        it.invoke().unwrap();
        let probs = it.output_f32(0).unwrap();
        assert!(probs.iter().all(|&p| p >= 0.0));
        assert!((probs.iter().sum::<f32>() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_out_of_range_token_is_rejected() {
        let mut it = interpreter(Quantization::None, 6);
        it.set_input_i32(0, &[1, 12, 0, 0, 0, 0]).unwrap();
        assert!(matches!(
            it.invoke(),
            Err(TfliteError::GatherIndexOutOfRange { index: 12, limit: 12 })
        ));
    }

    #[test]
    fn test_requires_allocation() {
        let bytes  = TfliteWriter::new(6, Quantization::None).to_bytes(&sample_weights()).unwrap();
        let mut it = Interpreter::from_bytes(&bytes).unwrap();
        assert!(matches!(it.invoke(), Err(TfliteError::NotAllocated)));
        assert!(matches!(it.set_input_i32(0, &[0; 6]), Err(TfliteError::NotAllocated)));
    }

    #[test]
    fn test_wrong_input_length_is_rejected() {
        let mut it = interpreter(Quantization::None, 6);
        assert!(it.set_input_i32(0, &[1, 2, 3]).is_err());
    }

    #[test]
    fn test_rejects_non_tflite_file() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.tflite");
        fs::write(&path, b"definitely not a flatbuffer").unwrap();
        assert!(Interpreter::from_file(&path).is_err());
        assert!(matches!(
            Interpreter::from_file(&dir.path().join("missing.tflite")),
            Err(TfliteError::Io(_))
        ));
    }

    #[test]
    fn test_rejects_truncated_weight_buffer() {
        let mut model = TfliteWriter::new(6, Quantization::None).build(&sample_weights()).unwrap();
        let buffer    = model.subgraph.tensors.iter().find(|t| t.name == "embedding").unwrap().buffer;
        model.buffers[buffer as usize].truncate(8);

        let mut it = Interpreter::from_bytes(&encode_model(&model)).unwrap();
        assert!(matches!(it.allocate_tensors(), Err(TfliteError::InvalidTensor { .. })));
    }

    #[test]
    fn test_float_export_matches_burn_probabilities() {
        use burn::backend::NdArray;
        use burn::prelude::*;
        use crate::ml::model::ScamClassifierConfig;

        type B = NdArray;
        let device = Default::default();
        B::seed(7);
        let model = ScamClassifierConfig::new(30).init::<B>(&device);

        let ids: Vec<i32> = vec![4, 17, 29, 2, 0, 0, 0, 0];
        let burn_probs = model
            .predict_proba(Tensor::<B, 1, Int>::from_ints(ids.as_slice(), &device).reshape([1, 8]))
            .into_data()
            .to_vec::<f32>()
            .unwrap();

        let bytes  = TfliteWriter::new(8, Quantization::None).to_bytes(&model.weights().unwrap()).unwrap();
        let mut it = Interpreter::from_bytes(&bytes).unwrap();
        it.allocate_tensors().unwrap();
        it.set_input_i32(0, &ids).unwrap();
        it.invoke().unwrap();

        for (a, b) in it.output_f32(0).unwrap().iter().zip(&burn_probs) {
            assert!((a - b).abs() < 1e-4, "{a} vs {b}");
        }
    }
}
