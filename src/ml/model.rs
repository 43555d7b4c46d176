// ============================================================
// Layer 5 — SimNet Model
// ============================================================
// Both sides of a pair go through the SAME encoder (shared
// weights). What happens after encoding depends on the task:
//
//   pairwise   left  ─ encode ─ dense ─┐
//                                      ├─ cosine ─► score [b, 1]
//              right ─ encode ─ dense ─┘
//
//   pointwise  left  ─ encode ─┐
//                              ├─ concat ─ dense ─ dense(2) ─► softmax [b, 2]
//              right ─ encode ─┘
//
// Encoders:
//   bow   masked SUM of embeddings, then softsign
//   cnn   1-D convolution (tanh), masked max pooling
//   lstm  LSTM over the sequence, masked max pooling
//   gru   GRU over the sequence, masked max pooling
//
// Only one of conv / lstm / gru is Some; all None means bow.
// The pointwise classifier doubles as the task-mode marker.

use burn::{
    nn::{
        conv::{Conv1d, Conv1dConfig},
        Embedding, EmbeddingConfig,
        gru::{Gru, GruConfig},
        Linear, LinearConfig,
        Lstm, LstmConfig,
        PaddingConfig1d,
    },
    prelude::*,
    tensor::activation,
};

use crate::data::batcher::PaddedSeq;
use crate::domain::task::TaskMode;
use crate::infra::conf::NetConf;

/// Added to padded positions before max pooling
const MASK_PENALTY: f64 = -1e9;
const COSINE_EPS: f64 = 1e-8;

#[derive(Config, Debug)]
pub struct SimNetModelConfig {
    pub vocab_size: usize,
    pub task_mode:  TaskMode,
    pub net:        NetConf,
}

impl SimNetModelConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> SimNetModel<B> {
        let emb_dim     = self.net.emb_dim();
        let encoded_dim = self.net.encoded_dim();
        let hidden_dim  = self.net.hidden_dim();

        let embedding = EmbeddingConfig::new(self.vocab_size, emb_dim).init(device);

        let (mut conv, mut lstm, mut gru) = (None, None, None);
        match self.net {
            NetConf::Bow { .. } => {}
            NetConf::Cnn { filter_size, num_filters, .. } => {
                conv = Some(
                    Conv1dConfig::new(emb_dim, num_filters, filter_size)
                        .with_padding(PaddingConfig1d::Explicit((filter_size - 1) / 2))
                        .init(device),
                );
            }
            NetConf::Lstm { lstm_dim, .. } => {
                lstm = Some(LstmConfig::new(emb_dim, lstm_dim, true).init(device));
            }
            NetConf::Gru { gru_dim, .. } => {
                gru = Some(GruConfig::new(emb_dim, gru_dim, true).init(device));
            }
        }

        let (projection, classifier) = match self.task_mode {
            TaskMode::Pairwise => (
                LinearConfig::new(encoded_dim, hidden_dim).init(device),
                None,
            ),
            TaskMode::Pointwise => (
                LinearConfig::new(2 * encoded_dim, hidden_dim).init(device),
                Some(LinearConfig::new(hidden_dim, 2).init(device)),
            ),
        };

        SimNetModel { embedding, conv, lstm, gru, projection, classifier }
    }
}

#[derive(Module, Debug)]
pub struct SimNetModel<B: Backend> {
    pub embedding:  Embedding<B>,
    pub conv:       Option<Conv1d<B>>,
    pub lstm:       Option<Lstm<B>>,
    pub gru:        Option<Gru<B>>,
    pub projection: Linear<B>,
    pub classifier: Option<Linear<B>>,
}

impl<B: Backend> SimNetModel<B> {
    pub fn task_mode(&self) -> TaskMode {
        if self.classifier.is_some() { TaskMode::Pointwise } else { TaskMode::Pairwise }
    }

    /// Encode one padded side: [batch, len] → [batch, encoded_dim]
    pub fn encode(&self, seq: PaddedSeq<B>) -> Tensor<B, 2> {
        let emb = self.embedding.forward(seq.ids); // [batch, len, emb_dim]

        if let Some(conv) = &self.conv {
            // Conv1d wants channels first: [batch, emb_dim, len]
            let x = activation::tanh(conv.forward(emb.swap_dims(1, 2)));
            return masked_max(x.swap_dims(1, 2), seq.mask);
        }
        if let Some(lstm) = &self.lstm {
            let (out, _state) = lstm.forward(emb, None);
            return masked_max(out, seq.mask);
        }
        if let Some(gru) = &self.gru {
            return masked_max(gru.forward(emb, None), seq.mask);
        }

        let [batch, _len, emb_dim] = emb.dims();
        let summed = (emb * seq.mask.unsqueeze_dim::<3>(2))
            .sum_dim(1)
            .reshape([batch, emb_dim]);
        softsign(summed)
    }

    /// Pointwise logits before softmax — shape: [batch, 2]
    pub fn logits(&self, left: PaddedSeq<B>, right: PaddedSeq<B>) -> Tensor<B, 2> {
        let concat = Tensor::cat(vec![self.encode(left), self.encode(right)], 1);
        let hidden = self.projection.forward(concat);
        match &self.classifier {
            Some(classifier) => classifier.forward(hidden),
            None => hidden,
        }
    }

    /// Pairwise cosine similarity — shape: [batch, 1]
    pub fn cosine(&self, left: PaddedSeq<B>, right: PaddedSeq<B>) -> Tensor<B, 2> {
        let left  = self.projection.forward(self.encode(left));
        let right = self.projection.forward(self.encode(right));
        cosine_similarity(left, right)
    }

    /// Pairwise: cosine in [-1, 1], shape [batch, 1].
    /// Pointwise: class probabilities, shape [batch, 2].
    pub fn forward(&self, left: PaddedSeq<B>, right: PaddedSeq<B>) -> Tensor<B, 2> {
        match self.task_mode() {
            TaskMode::Pairwise  => self.cosine(left, right),
            TaskMode::Pointwise => activation::softmax(self.logits(left, right), 1),
        }
    }
}

/// x / (1 + |x|)
fn softsign<B: Backend>(x: Tensor<B, 2>) -> Tensor<B, 2> {
    x.clone() / x.abs().add_scalar(1.0)
}

/// Max over the sequence axis, ignoring padded positions.
/// x: [batch, len, dim], mask: [batch, len] → [batch, dim]
fn masked_max<B: Backend>(x: Tensor<B, 3>, mask: Tensor<B, 2>) -> Tensor<B, 2> {
    let [batch, _len, dim] = x.dims();
    let penalty = mask
        .unsqueeze_dim::<3>(1)
        .neg()
        .add_scalar(1.0)
        .mul_scalar(MASK_PENALTY);
    // reduce over the last axis: [batch, dim, len] → [batch, dim, 1]
    (x.swap_dims(1, 2) + penalty).max_dim(2).reshape([batch, dim])
}

/// Row-wise cosine: [batch, dim] x [batch, dim] → [batch, 1]
fn cosine_similarity<B: Backend>(a: Tensor<B, 2>, b: Tensor<B, 2>) -> Tensor<B, 2> {
    let dot    = (a.clone() * b.clone()).sum_dim(1);
    let norm_a = (a.clone() * a).sum_dim(1).sqrt();
    let norm_b = (b.clone() * b).sum_dim(1).sqrt();
    dot / (norm_a * norm_b).clamp_min(COSINE_EPS)
}
