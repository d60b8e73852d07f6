// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types describing what the system is about:
// short financial SMS messages and the risk tier they carry.
//
// Rules for this layer:
//   - NO Burn framework types
//   - NO file I/O
//   - Only structs, enums and traits
//
// The trainer, the exporter and the classify command all speak
// in these types, so they stay testable without a backend.

// A message text paired with its risk tier
pub mod message;

// The three risk tiers and per-tier probability scores
pub mod risk;

// Core abstractions (traits) that other layers implement
pub mod traits;
