// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs and traits describing what the system
// works on: one analysed application = a token sequence plus
// a label record.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, traits and errors
//
// The upstream tokenizer produces the integers; this layer
// only knows their shape and the invariants they must hold.

// One application's token sequence and labels
pub mod app_record;

// Typed failures for malformed input data
pub mod error;

// Core abstractions (traits) that other layers implement
pub mod traits;
