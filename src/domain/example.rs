// ============================================================
// Layer 3 — TextExample Domain Type
// ============================================================
// One accepted line of a tab-separated pair file, before
// tokenisation. Which optional fields are present depends on
// the file kind:
//
//   pairwise train   query  pos_title  neg_title   → negative = Some
//   labelled pairs   query  title      label       → label    = Some
//   inference pairs  query  title                  → both None
//
// The raw line is kept so that prediction files can echo the
// input next to each score.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextExample {
    /// The input line without its trailing newline
    pub raw: String,

    /// Anchor text (left side of the network)
    pub query: String,

    /// Candidate text (right side); the positive title in pairwise training
    pub title: String,

    /// Negative title, only for pairwise training triples
    pub negative: Option<String>,

    /// 0 = dissimilar, 1 = similar
    pub label: Option<u8>,
}

impl TextExample {
    pub fn pair(raw: impl Into<String>, query: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            raw:      raw.into(),
            query:    query.into(),
            title:    title.into(),
            negative: None,
            label:    None,
        }
    }

    pub fn with_negative(mut self, negative: impl Into<String>) -> Self {
        self.negative = Some(negative.into());
        self
    }

    pub fn with_label(mut self, label: u8) -> Self {
        self.label = Some(label);
        self
    }
}
