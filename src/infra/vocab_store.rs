// ============================================================
// Layer 6 — Vocabulary Store
// ============================================================
// Loads the word → id vocabulary file and wraps it in a
// HuggingFace WordLevel tokenizer.
//
// Vocab file format, one entry per line:
//   word \t id
//
// The first occurrence of a word wins. "<unk>" is always id 0.
//
// Encoding rules:
//   - text is already segmented, words are split on whitespace
//   - words missing from the vocabulary are DROPPED, not mapped
//     to <unk>
//   - a text with no known word becomes the single id 0
//
// The tokenizer is built from an in-memory JSON document in
// the format Tokenizer::from_str() expects.

use anyhow::{bail, Context, Result};
use std::{collections::HashMap, fs, path::Path, str::FromStr};
use tokenizers::Tokenizer;

pub const UNK_TOKEN: &str = "<unk>";
pub const UNK_ID: u32 = 0;

pub struct Vocab {
    tokenizer: Tokenizer,
    /// Number of embedding rows needed to cover every id
    size: usize,
}

impl Vocab {
    /// Load a vocabulary file from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("Cannot read vocabulary from '{}'", path.display()))?;
        let vocab = Self::parse(&text)?;
        tracing::info!("Loaded vocabulary from '{}' ({} ids)", path.display(), vocab.size);
        Ok(vocab)
    }

    /// Build a vocabulary from the text of a vocab file.
    pub fn parse(text: &str) -> Result<Self> {
        let mut words: HashMap<String, u32> = HashMap::new();

        for (line_no, line) in text.lines().enumerate() {
            let mut items = line.split('\t');
            let (Some(word), Some(id)) = (items.next(), items.next()) else {
                if !line.trim().is_empty() {
                    tracing::warn!("vocab line {} has no id column, skipped", line_no + 1);
                }
                continue;
            };
            match id.trim().parse::<u32>() {
                Ok(id) => { words.entry(word.to_string()).or_insert(id); }
                Err(_) => tracing::warn!("vocab line {} has a bad id '{}', skipped", line_no + 1, id),
            }
        }

        if words.is_empty() {
            bail!("Vocabulary is empty");
        }
        words.insert(UNK_TOKEN.to_string(), UNK_ID);

        let max_id = words.values().copied().max().unwrap_or(UNK_ID) as usize;
        let size   = words.len().max(max_id + 1);

        let tokenizer_json = serde_json::json!({
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": [],
            "normalizer": null,
            "pre_tokenizer": { "type": "WhitespaceSplit" },
            "post_processor": null,
            "decoder": null,
            "model": {
                "type": "WordLevel",
                "vocab": words,
                "unk_token": UNK_TOKEN
            }
        });

        let tokenizer = Tokenizer::from_str(&tokenizer_json.to_string())
            .map_err(|e| anyhow::anyhow!("Cannot build tokenizer from vocabulary: {e}"))?;

        Ok(Self { tokenizer, size })
    }

    /// Embedding table size for this vocabulary.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Convert segmented text into ids, dropping unknown words.
    pub fn encode(&self, text: &str) -> Result<Vec<u32>> {
        let enc = self
            .tokenizer
            .encode(text, false)
            .map_err(|e| anyhow::anyhow!("Tokenisation error: {e}"))?;

        // an unknown word comes back as <unk>; keep only words that are in the map
        let ids: Vec<u32> = enc
            .get_ids()
            .iter()
            .zip(enc.get_offsets())
            .filter(|(_, &(start, end))| {
                text.get(start..end)
                    .is_some_and(|word| self.tokenizer.token_to_id(word).is_some())
            })
            .map(|(&id, _)| id)
            .collect();

        if ids.is_empty() {
            return Ok(vec![UNK_ID]);
        }
        Ok(ids)
    }
}
