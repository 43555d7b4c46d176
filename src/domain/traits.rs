// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// By programming against traits instead of concrete types,
// the use cases do not care where pairs come from. Today the
// only implementation is the tab-separated file reader.

use anyhow::Result;

use crate::domain::example::TextExample;

// ─── ExampleSource ────────────────────────────────────────────────────────────
/// Any component that can produce text pair examples.
///
/// Implementations:
///   - TsvLoader → reads tab-separated pair files
pub trait ExampleSource {
    /// Load every well-formed example, in source order.
    fn load_all(&self) -> Result<Vec<TextExample>>;
}
