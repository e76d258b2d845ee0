// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Wires the other layers together for one command. No model
// math and no argument parsing lives here, only the order in
// which things happen.
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// The training workflow
pub mod train_use_case;

// Checkpoint evaluation
pub mod eval_use_case;
