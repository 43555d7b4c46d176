// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between a tab-separated pair file and a batch of
// padded tensors:
//
//   pair file (.tsv)
//       │
//       ▼
//   TsvLoader         → validates lines, yields TextExamples
//       │
//       ▼
//   Vocab             → words to ids, OOV words dropped (infra)
//       │
//       ▼
//   SimNetDataset     → implements Burn's Dataset trait
//       │
//       ▼
//   SimNetBatcher     → pads each side, builds masks
//       │
//       ▼
//   DataLoader        → shuffled training batches

/// Reads tab-separated pair files
pub mod loader;

/// Implements Burn's Dataset trait for tokenised pairs
pub mod dataset;

/// Implements Burn's Batcher trait to create padded tensor batches
pub mod batcher;
