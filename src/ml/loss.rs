// ============================================================
// Layer 5 — Losses
// ============================================================
// Pairwise losses compare the score of the positive title with
// the score of the negative title for the same query:
//
//   hinge  mean(max(0, margin - pos + neg))
//   log    mean(log(1 + exp(neg - pos)))
//
// The pointwise loss is cross-entropy over the two classes.

use anyhow::{anyhow, Result};
use burn::{
    nn::loss::CrossEntropyLossConfig,
    prelude::*,
    tensor::activation,
};

use crate::data::batcher::SimNetBatch;
use crate::infra::conf::LossConf;
use crate::ml::model::SimNetModel;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SimNetLoss {
    Hinge { margin: f64 },
    Log,
    SoftmaxCrossEntropy,
}

impl From<&LossConf> for SimNetLoss {
    fn from(conf: &LossConf) -> Self {
        match conf {
            LossConf::HingeLoss { margin }       => SimNetLoss::Hinge { margin: *margin },
            LossConf::LogLoss {}                 => SimNetLoss::Log,
            LossConf::SoftmaxCrossEntropyLoss {} => SimNetLoss::SoftmaxCrossEntropy,
        }
    }
}

impl SimNetLoss {
    /// Forward one training batch and return the mean loss.
    pub fn compute<B: Backend>(&self, model: &SimNetModel<B>, batch: SimNetBatch<B>) -> Result<Tensor<B, 1>> {
        match self {
            SimNetLoss::Hinge { .. } | SimNetLoss::Log => {
                let negative = batch
                    .negative
                    .ok_or_else(|| anyhow!("pairwise loss needs (query, positive, negative) triples"))?;
                let pos = model.cosine(batch.left.clone(), batch.right);
                let neg = model.cosine(batch.left, negative);
                Ok(self.pairwise(pos, neg))
            }
            SimNetLoss::SoftmaxCrossEntropy => {
                let labels = batch
                    .labels
                    .ok_or_else(|| anyhow!("pointwise loss needs labelled pairs"))?;
                let logits = model.logits(batch.left, batch.right);
                let ce = CrossEntropyLossConfig::new().init(&logits.device());
                Ok(ce.forward(logits, labels))
            }
        }
    }

    /// Ranking loss over positive / negative scores — shape: [batch, 1]
    pub fn pairwise<B: Backend>(&self, pos: Tensor<B, 2>, neg: Tensor<B, 2>) -> Tensor<B, 1> {
        match self {
            SimNetLoss::Hinge { margin } => activation::relu((neg - pos).add_scalar(*margin)).mean(),
            _ => (neg - pos).exp().add_scalar(1.0).log().mean(),
        }
    }
}
