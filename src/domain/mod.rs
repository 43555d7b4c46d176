// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types that describe what a similarity task is,
// independent of Burn, files, or the command line.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits

// Pairwise (ranking) vs pointwise (classification) task modes
pub mod task;

// One accepted line of a labelled or unlabelled pair file
pub mod example;

// Core abstractions (traits) that other layers implement
pub mod traits;
