// ============================================================
// Layer 4 — Pair Batcher
// ============================================================
// Implements Burn's Batcher trait to turn a Vec<PairSample>
// into padded tensors.
//
// Sequences in a pair file have different lengths, so every
// side of the pair is padded on its own:
//
//   query lengths  [3, 5, 2]  → left  [3, 5] padded with id 0
//   title lengths  [4, 1, 2]  → right [3, 4]
//
// A float mask (1.0 = real token, 0.0 = padding) travels with
// each side so pooling layers can ignore the padding.

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::PairSample;

/// Padding id. Also the fallback id of an all-OOV sequence.
pub const PAD_ID: u32 = 0;

/// One padded side of a pair.
#[derive(Debug, Clone)]
pub struct PaddedSeq<B: Backend> {
    /// Token ids — shape: [batch_size, max_len]
    pub ids: Tensor<B, 2, Int>,

    /// Mask — shape: [batch_size, max_len]
    pub mask: Tensor<B, 2>,
}

#[derive(Debug, Clone)]
pub struct SimNetBatch<B: Backend> {
    pub left:  PaddedSeq<B>,
    pub right: PaddedSeq<B>,

    /// Negative titles, present for pairwise training batches
    pub negative: Option<PaddedSeq<B>>,

    /// Labels — shape: [batch_size], present for labelled batches
    pub labels: Option<Tensor<B, 1, Int>>,
}

#[derive(Clone, Debug)]
pub struct SimNetBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> SimNetBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }

    fn pad<'a>(&self, seqs: impl Iterator<Item = &'a Vec<u32>> + Clone) -> PaddedSeq<B> {
        let batch_size = seqs.clone().count();
        let max_len    = seqs.clone().map(Vec::len).max().unwrap_or(0).max(1);

        let mut ids  = Vec::with_capacity(batch_size * max_len);
        let mut mask = Vec::with_capacity(batch_size * max_len);
        for seq in seqs {
            for pos in 0..max_len {
                match seq.get(pos) {
                    Some(&id) => { ids.push(id as i32); mask.push(1.0f32); }
                    None      => { ids.push(PAD_ID as i32); mask.push(0.0f32); }
                }
            }
        }

        PaddedSeq {
            ids:  Tensor::<B, 1, Int>::from_ints(ids.as_slice(), &self.device)
                .reshape([batch_size, max_len]),
            mask: Tensor::<B, 1>::from_floats(mask.as_slice(), &self.device)
                .reshape([batch_size, max_len]),
        }
    }
}

impl<B: Backend> Batcher<PairSample, SimNetBatch<B>> for SimNetBatcher<B> {
    fn batch(&self, items: Vec<PairSample>) -> SimNetBatch<B> {
        let left  = self.pad(items.iter().map(|s| &s.query));
        let right = self.pad(items.iter().map(|s| &s.title));

        // A batch only carries negatives / labels when every sample has them
        let negative = if items.iter().all(PairSample::is_triple) {
            Some(self.pad(items.iter().filter_map(|s| s.negative.as_ref())))
        } else {
            None
        };

        let labels = items
            .iter()
            .map(|s| s.label.map(i32::from))
            .collect::<Option<Vec<i32>>>()
            .map(|l| Tensor::<B, 1, Int>::from_ints(l.as_slice(), &self.device));

        SimNetBatch { left, right, negative, labels }
    }
}
