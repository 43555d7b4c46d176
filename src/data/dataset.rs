use burn::data::dataset::Dataset;
use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::domain::example::TextExample;
use crate::infra::vocab_store::Vocab;

/// One tokenised pair. Sequences are unpadded; the batcher pads them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairSample {
    pub query:    Vec<u32>,
    pub title:    Vec<u32>,
    pub negative: Option<Vec<u32>>,
    pub label:    Option<u8>,
}

impl PairSample {
    pub fn is_triple(&self) -> bool {
        self.negative.is_some()
    }
}

pub struct SimNetDataset {
    samples: Vec<PairSample>,
}

impl SimNetDataset {
    pub fn new(samples: Vec<PairSample>) -> Self { Self { samples } }

    pub fn samples(&self) -> &[PairSample] { &self.samples }

    /// Labels in sample order; unlabelled samples are skipped.
    pub fn labels(&self) -> Vec<u8> {
        self.samples.iter().filter_map(|s| s.label).collect()
    }
}

impl Dataset<PairSample> for SimNetDataset {
    fn get(&self, index: usize) -> Option<PairSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

/// Tokenise examples with the vocabulary, preserving order.
pub fn encode_examples(examples: &[TextExample], vocab: &Vocab) -> Result<Vec<PairSample>> {
    examples
        .iter()
        .map(|ex| {
            Ok(PairSample {
                query:    vocab.encode(&ex.query)?,
                title:    vocab.encode(&ex.title)?,
                negative: ex.negative.as_deref().map(|n| vocab.encode(n)).transpose()?,
                label:    ex.label,
            })
        })
        .collect()
}
