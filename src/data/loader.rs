// ============================================================
// Layer 4 — Pair File Loader
// ============================================================
// Reads tab-separated pair files into TextExamples.
//
// Three layouts exist, one per file role:
//
//   PairwiseTrain  query \t pos_title \t neg_title
//   Labelled       query \t title     \t label      (label 0 or 1)
//   Unlabelled     query \t title
//
// A line with the wrong number of columns, an empty column or a
// label outside {0, 1} is skipped with a warning. Labels are read
// from the same accepted lines as the texts, so predictions and
// labels always stay aligned.

use anyhow::{bail, Context, Result};
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::PathBuf,
};

use crate::domain::example::TextExample;
use crate::domain::traits::ExampleSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairFileKind {
    PairwiseTrain,
    Labelled,
    Unlabelled,
}

impl PairFileKind {
    fn columns(self) -> usize {
        match self {
            PairFileKind::PairwiseTrain | PairFileKind::Labelled => 3,
            PairFileKind::Unlabelled => 2,
        }
    }
}

/// Loads one pair file. Implements the ExampleSource trait from Layer 3.
pub struct TsvLoader {
    path: PathBuf,
    kind: PairFileKind,
}

impl TsvLoader {
    pub fn new(path: impl Into<PathBuf>, kind: PairFileKind) -> Self {
        Self { path: path.into(), kind }
    }
}

impl ExampleSource for TsvLoader {
    fn load_all(&self) -> Result<Vec<TextExample>> {
        let file = File::open(&self.path)
            .with_context(|| format!("Cannot open data file '{}'", self.path.display()))?;

        let mut examples = Vec::new();
        let mut skipped  = 0usize;

        for (line_no, line) in BufReader::new(file).lines().enumerate() {
            let line = line.with_context(|| {
                format!("Cannot read line {} of '{}'", line_no + 1, self.path.display())
            })?;
            if line.trim().is_empty() {
                continue;
            }
            match parse_line(&line, self.kind) {
                Some(example) => examples.push(example),
                None => {
                    skipped += 1;
                    tracing::warn!(
                        "line {} of '{}' does not match the {:?} format, skipped",
                        line_no + 1,
                        self.path.display(),
                        self.kind
                    );
                }
            }
        }

        if examples.is_empty() {
            bail!("No usable examples in '{}'", self.path.display());
        }

        tracing::info!(
            "Loaded {} examples from '{}' ({} skipped)",
            examples.len(),
            self.path.display(),
            skipped
        );
        Ok(examples)
    }
}

/// Parse one line. Returns None when the line is malformed.
pub fn parse_line(line: &str, kind: PairFileKind) -> Option<TextExample> {
    // only the line ending is stripped; raw is echoed back into result files
    let raw = line.trim_end_matches(['\r', '\n']);
    let cols: Vec<&str> = raw.split('\t').collect();
    if cols.len() != kind.columns() || cols.iter().any(|c| c.trim().is_empty()) {
        return None;
    }

    let example = TextExample::pair(raw, cols[0], cols[1]);
    match kind {
        PairFileKind::Unlabelled    => Some(example),
        PairFileKind::PairwiseTrain => Some(example.with_negative(cols[2])),
        PairFileKind::Labelled      => match cols[2].trim() {
            "0" => Some(example.with_label(0)),
            "1" => Some(example.with_label(1)),
            _   => None,
        },
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_pairwise_triple() {
        let ex = parse_line("a b\tc d\te f\n", PairFileKind::PairwiseTrain).unwrap();
        assert_eq!(ex.query, "a b");
        assert_eq!(ex.title, "c d");
        assert_eq!(ex.negative.as_deref(), Some("e f"));
        assert_eq!(ex.label, None);
        assert_eq!(ex.raw, "a b\tc d\te f");
    }

    #[test]
    fn test_raw_keeps_surrounding_spaces() {
        let ex = parse_line(" a b\tc \r\n", PairFileKind::Unlabelled).unwrap();
        assert_eq!(ex.raw, " a b\tc ");
    }

    #[test]
    fn test_parse_labelled_rejects_bad_labels() {
        assert_eq!(parse_line("q\tt\t1", PairFileKind::Labelled).unwrap().label, Some(1));
        assert!(parse_line("q\tt\t2", PairFileKind::Labelled).is_none());
        assert!(parse_line("q\tt\tyes", PairFileKind::Labelled).is_none());
    }

    #[test]
    fn test_parse_rejects_wrong_column_count_and_empty_columns() {
        assert!(parse_line("q\tt", PairFileKind::Labelled).is_none());
        assert!(parse_line("q\tt\t1\textra", PairFileKind::Labelled).is_none());
        assert!(parse_line("q\t \t1", PairFileKind::Labelled).is_none());
        assert!(parse_line("q\tt\t0", PairFileKind::Unlabelled).is_none());
    }

    #[test]
    fn test_loader_skips_malformed_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "q1\tt1\t1").unwrap();
        writeln!(file, "broken line").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "q2\tt2\t0").unwrap();

        let examples = TsvLoader::new(file.path(), PairFileKind::Labelled)
            .load_all()
            .unwrap();
        let labels: Vec<u8> = examples.iter().filter_map(|e| e.label).collect();
        assert_eq!(labels, vec![1, 0]);
    }

    #[test]
    fn test_loader_fails_on_missing_file() {
        let loader = TsvLoader::new("/definitely/not/here.tsv", PairFileKind::Unlabelled);
        assert!(loader.load_all().is_err());
    }
}
