// ============================================================
// Layer 6 — TFLite Schema Types
// ============================================================
// Owned, backend-free description of a TFLite model: the part
// of schema.fbs (version 3) this project writes and reads.
//
//   ModelDef
//     ├── operator_codes: [OperatorCodeDef]
//     ├── subgraph:       SubGraphDef (exactly one)
//     │     ├── tensors:   [TensorDef]
//     │     ├── inputs / outputs: tensor indices
//     │     └── operators: [OperatorDef]
//     └── buffers: [bytes]   (buffer 0 is always empty)
//
// Enum codes below are the values fixed by schema.fbs.
//
// Reference: tensorflow/lite/schema/schema.fbs

use crate::infra::tflite::error::TfliteError;

/// Flatbuffer file identifier of every TFLite model
pub const FILE_IDENTIFIER: &str = "TFL3";

/// Schema version written into Model.version
pub const SCHEMA_VERSION: u32 = 3;

// ─── TensorType ───────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TensorType {
    Float32,
    Int32,
    Int8,
}

impl TensorType {
    pub fn code(self) -> i8 {
        match self {
            TensorType::Float32 => 0,
            TensorType::Int32   => 2,
            TensorType::Int8    => 9,
        }
    }

    pub fn from_code(code: i8) -> Result<Self, TfliteError> {
        match code {
            0 => Ok(TensorType::Float32),
            2 => Ok(TensorType::Int32),
            9 => Ok(TensorType::Int8),
            other => Err(TfliteError::Unsupported(format!("tensor type code {other}"))),
        }
    }

    /// Bytes per element
    pub fn size(self) -> usize {
        match self {
            TensorType::Float32 | TensorType::Int32 => 4,
            TensorType::Int8 => 1,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TensorType::Float32 => "float32",
            TensorType::Int32   => "int32",
            TensorType::Int8    => "int8",
        }
    }
}

// ─── BuiltinOp ────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinOp {
    Dequantize,
    FullyConnected,
    Softmax,
    Gather,
    Mean,
}

impl BuiltinOp {
    pub fn code(self) -> i32 {
        match self {
            BuiltinOp::Dequantize     => 6,
            BuiltinOp::FullyConnected => 9,
            BuiltinOp::Softmax        => 25,
            BuiltinOp::Gather         => 36,
            BuiltinOp::Mean           => 40,
        }
    }

    pub fn from_code(code: i32) -> Result<Self, TfliteError> {
        match code {
            6  => Ok(BuiltinOp::Dequantize),
            9  => Ok(BuiltinOp::FullyConnected),
            25 => Ok(BuiltinOp::Softmax),
            36 => Ok(BuiltinOp::Gather),
            40 => Ok(BuiltinOp::Mean),
            other => Err(TfliteError::Unsupported(format!("builtin operator code {other}"))),
        }
    }

    /// Operator version the runtime must support for the kernels we emit.
    /// DEQUANTIZE needs version 2 to accept int8 input.
    pub fn version(self) -> i32 {
        match self {
            BuiltinOp::Dequantize => 2,
            _ => 1,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BuiltinOp::Dequantize     => "DEQUANTIZE",
            BuiltinOp::FullyConnected => "FULLY_CONNECTED",
            BuiltinOp::Softmax        => "SOFTMAX",
            BuiltinOp::Gather         => "GATHER",
            BuiltinOp::Mean           => "MEAN",
        }
    }
}

// ─── Fused activation ─────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Activation {
    #[default]
    None,
    Relu,
}

impl Activation {
    pub fn code(self) -> i8 {
        match self {
            Activation::None => 0,
            Activation::Relu => 1,
        }
    }

    pub fn from_code(code: i8) -> Result<Self, TfliteError> {
        match code {
            0 => Ok(Activation::None),
            1 => Ok(Activation::Relu),
            other => Err(TfliteError::Unsupported(format!("fused activation code {other}"))),
        }
    }

    pub fn apply(self, x: f32) -> f32 {
        match self {
            Activation::None => x,
            Activation::Relu => x.max(0.0),
        }
    }
}

// ─── BuiltinOptions union ─────────────────────────────────────────────────────
/// Union discriminants of the BuiltinOptions table union
pub mod options_type {
    pub const NONE:            u8 = 0;
    pub const FULLY_CONNECTED: u8 = 8;
    pub const SOFTMAX:         u8 = 9;
    pub const GATHER:          u8 = 23;
    pub const REDUCER:         u8 = 27;
    pub const DEQUANTIZE:      u8 = 38;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OperatorOptions {
    None,
    FullyConnected { activation: Activation, keep_num_dims: bool },
    Softmax { beta: f32 },
    Gather { axis: i32, batch_dims: i32 },
    Reducer { keep_dims: bool },
    Dequantize,
}

impl OperatorOptions {
    pub fn type_code(&self) -> u8 {
        match self {
            OperatorOptions::None                 => options_type::NONE,
            OperatorOptions::FullyConnected { .. } => options_type::FULLY_CONNECTED,
            OperatorOptions::Softmax { .. }        => options_type::SOFTMAX,
            OperatorOptions::Gather { .. }         => options_type::GATHER,
            OperatorOptions::Reducer { .. }        => options_type::REDUCER,
            OperatorOptions::Dequantize            => options_type::DEQUANTIZE,
        }
    }
}

// ─── Model structure ──────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq)]
pub struct QuantizationDef {
    pub scale:      Vec<f32>,
    pub zero_point: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TensorDef {
    pub name:         String,
    pub shape:        Vec<i32>,
    pub dtype:        TensorType,
    /// Index into ModelDef::buffers; 0 for tensors computed at run time
    pub buffer:       u32,
    pub quantization: Option<QuantizationDef>,
}

impl TensorDef {
    /// Number of elements described by the shape
    pub fn element_count(&self) -> usize {
        self.shape.iter().map(|&d| d.max(0) as usize).product()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatorCodeDef {
    pub op:      BuiltinOp,
    pub version: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OperatorDef {
    pub opcode_index: u32,
    /// Tensor indices; -1 marks an omitted optional input
    pub inputs:       Vec<i32>,
    pub outputs:      Vec<i32>,
    pub options:      OperatorOptions,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubGraphDef {
    pub name:      String,
    pub tensors:   Vec<TensorDef>,
    pub inputs:    Vec<i32>,
    pub outputs:   Vec<i32>,
    pub operators: Vec<OperatorDef>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelDef {
    pub version:        u32,
    pub description:    String,
    pub operator_codes: Vec<OperatorCodeDef>,
    pub subgraph:       SubGraphDef,
    pub buffers:        Vec<Vec<u8>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_op_codes_roundtrip() {
        for op in [
            BuiltinOp::Dequantize,
            BuiltinOp::FullyConnected,
            BuiltinOp::Softmax,
            BuiltinOp::Gather,
            BuiltinOp::Mean,
        ] {
            assert_eq!(BuiltinOp::from_code(op.code()).unwrap(), op);
        }
        assert!(BuiltinOp::from_code(3).is_err()); // CONV_2D
    }

    #[test]
    fn test_tensor_type_codes() {
        assert_eq!(TensorType::from_code(9).unwrap(), TensorType::Int8);
        assert_eq!(TensorType::Int32.size(), 4);
        assert!(TensorType::from_code(1).is_err()); // FLOAT16
    }

    #[test]
    fn test_relu_activation() {
        assert_eq!(Activation::Relu.apply(-2.0), 0.0);
        assert_eq!(Activation::Relu.apply(1.5), 1.5);
        assert_eq!(Activation::None.apply(-2.0), -2.0);
    }

    #[test]
    fn test_element_count() {
        let t = TensorDef {
            name:         "x".into(),
            shape:        vec![1, 20, 16],
            dtype:        TensorType::Float32,
            buffer:       0,
            quantization: None,
        };
        assert_eq!(t.element_count(), 320);
    }
}
