// ============================================================
// Layer 4 — Sequence Encoder
// ============================================================
// The exported model takes a fixed [1, max_length] input, so
// every id sequence is cut or padded to exactly max_length:
//
//   longer  → keep the first max_length ids (truncate at the end)
//   shorter → append PAD_ID until long enough (pad at the end)
//
// PAD_ID is 0 and no word is ever assigned id 0, so zeros in an
// encoded sequence can only be trailing padding.

use crate::data::vocabulary::PAD_ID;

/// Truncate or pad `ids` at the end to exactly `max_length`.
pub fn pad_sequence(ids: &[u32], max_length: usize) -> Vec<u32> {
    let mut out: Vec<u32> = ids.iter().copied().take(max_length).collect();
    out.resize(max_length, PAD_ID);
    out
}
