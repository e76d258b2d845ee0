// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The batch sampler only needs two things from wherever the
// applications live: the ordered listing, and a way to load
// one application by name. The directory-backed loader is the
// production implementation; tests use an in-memory one.

use anyhow::Result;

use crate::domain::app_record::AppRecord;

// ─── AppSource ────────────────────────────────────────────────────────────────
/// Any component that can enumerate and load analysed applications.
///
/// Implementations:
///   - DirSource    → one sub-directory per application on disk
///   - MemorySource → fixed records, test-only
pub trait AppSource {
    /// Names of all available applications.
    ///
    /// The order must be stable for an unchanged source: the
    /// train/validation split is taken positionally from it.
    fn list(&self) -> Result<Vec<String>>;

    /// Load one application's tokens and labels in full.
    fn load(&self, name: &str) -> Result<AppRecord>;
}
