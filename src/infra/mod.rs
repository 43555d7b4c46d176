// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting concerns used by several other layers:
//
//   conf.rs        — JSON net configuration (net, loss, optimizer)
//   vocab_store.rs — vocabulary file → WordLevel tokenizer
//   checkpoint.rs  — model weights and config on disk
//   metrics.rs     — AUC, accuracy and the training metrics CSV

/// Net / loss / optimizer configuration file
pub mod conf;

/// Vocabulary loading and text encoding
pub mod vocab_store;

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Evaluation metrics and training metrics CSV logger
pub mod metrics;
