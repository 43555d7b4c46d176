// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// The model, its losses, the training loop and batched
// prediction. Apart from the data batcher and checkpoints,
// this is the only layer that builds Burn tensors.
//
//   model.rs     — SimNet: shared embedding, bow / cnn / lstm / gru
//                  encoder, pairwise cosine or pointwise classifier
//   loss.rs      — hinge, log and softmax cross-entropy losses
//   trainer.rs   — step-based training loop with periodic
//                  validation and checkpointing
//   predictor.rs — ordered batched prediction, AUC / accuracy

/// SimNet architecture
pub mod model;

/// Pairwise and pointwise losses
pub mod loss;

/// Training loop with validation and checkpointing
pub mod trainer;

/// Batched prediction and evaluation
pub mod predictor;

/// CPU backend unless the `wgpu` feature is enabled.
#[cfg(not(feature = "wgpu"))]
pub type InferBackend = burn::backend::NdArray;
#[cfg(feature = "wgpu")]
pub type InferBackend = burn::backend::Wgpu;

pub type TrainBackend = burn::backend::Autodiff<InferBackend>;

pub fn default_device() -> <InferBackend as burn::tensor::backend::Backend>::Device {
    Default::default()
}
