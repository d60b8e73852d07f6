// ============================================================
// Layer 6 — Weight Quantization
// ============================================================
// Symmetric per-tensor int8:
//
//   scale = max|w| / 127        zero_point = 0
//   q     = clamp(round(w / scale), -127, 127)
//   w'    = q * scale
//
// The range is kept symmetric (-127..=127) so that -w and w
// quantize to the same magnitude. An all-zero tensor gets
// scale 1.0 so dequantization never divides by zero.

use serde::{Deserialize, Serialize};

const INT8_LIMIT: f32 = 127.0;

/// How weight tensors are stored in the exported model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quantization {
    /// float32 weights, no DEQUANTIZE ops
    None,
    /// int8 weights + DEQUANTIZE; biases stay float32
    #[default]
    Int8,
}

impl std::fmt::Display for Quantization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Quantization::None => write!(f, "none"),
            Quantization::Int8 => write!(f, "int8"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuantizedTensor {
    pub values:     Vec<i8>,
    pub scale:      f32,
    pub zero_point: i64,
}

impl QuantizedTensor {
    pub fn to_bytes(&self) -> Vec<u8> {
        self.values.iter().map(|&v| v as u8).collect()
    }
}

pub fn quantize_symmetric(weights: &[f32]) -> QuantizedTensor {
    let max_abs = weights
        .iter()
        .filter(|w| w.is_finite())
        .fold(0.0f32, |acc, w| acc.max(w.abs()));
    let scale = if max_abs > 0.0 { max_abs / INT8_LIMIT } else { 1.0 };

    let values = weights
        .iter()
        .map(|&w| (w / scale).round().clamp(-INT8_LIMIT, INT8_LIMIT) as i8)
        .collect();

    QuantizedTensor { values, scale, zero_point: 0 }
}

pub fn dequantize_values(values: &[i8], scale: f32, zero_point: i64) -> Vec<f32> {
    values
        .iter()
        .map(|&q| (q as i64 - zero_point) as f32 * scale)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_largest_weight_maps_to_127() {
        let q = quantize_symmetric(&[0.5, -1.0, 0.25]);
        assert_eq!(q.values[1], -127);
        assert!((q.scale - 1.0 / 127.0).abs() < 1e-9);
        assert_eq!(q.zero_point, 0);
    }

    #[test]
    fn test_dequantize_error_is_bounded_by_half_a_step() {
        let weights: Vec<f32> = (0..50).map(|i| (i as f32 - 25.0) * 0.013).collect();
        let q       = quantize_symmetric(&weights);
        let back    = dequantize_values(&q.values, q.scale, q.zero_point);
        for (w, d) in weights.iter().zip(&back) {
            assert!((w - d).abs() <= q.scale / 2.0 + 1e-6, "{w} vs {d}");
        }
    }

    #[test]
    fn test_all_zero_tensor() {
        let q = quantize_symmetric(&[0.0; 4]);
        assert_eq!(q.scale, 1.0);
        assert!(q.values.iter().all(|&v| v == 0));
    }

    #[test]
    fn test_bytes_are_twos_complement() {
        let q = QuantizedTensor { values: vec![-1, 127, -127], scale: 1.0, zero_point: 0 };
        assert_eq!(q.to_bytes(), vec![0xff, 0x7f, 0x81]);
    }

    #[test]
    fn test_quantization_serde_names() {
        assert_eq!(serde_json::to_string(&Quantization::Int8).unwrap(), "\"int8\"");
        let q: Quantization = serde_json::from_str("\"none\"").unwrap();
        assert_eq!(q, Quantization::None);
    }
}
