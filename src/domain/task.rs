// ============================================================
// Layer 3 — Task Mode
// ============================================================
// SimNet trains in one of two modes:
//
//   pairwise  — (query, positive title, negative title) triples.
//               The model learns to score the positive title
//               above the negative one. Output is a cosine
//               similarity in [-1, 1], reported as (cos + 1) / 2.
//
//   pointwise — (query, title, label) triples with label 0 or 1.
//               The model is a two-way classifier.

use std::{fmt, str::FromStr};

use anyhow::bail;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskMode {
    Pairwise,
    Pointwise,
}

impl FromStr for TaskMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pairwise"  => Ok(TaskMode::Pairwise),
            "pointwise" => Ok(TaskMode::Pointwise),
            other       => bail!("unknown task mode '{other}', expected 'pairwise' or 'pointwise'"),
        }
    }
}

impl fmt::Display for TaskMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskMode::Pairwise  => write!(f, "pairwise"),
            TaskMode::Pointwise => write!(f, "pointwise"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("Pairwise".parse::<TaskMode>().unwrap(), TaskMode::Pairwise);
        assert_eq!(" pointwise ".parse::<TaskMode>().unwrap(), TaskMode::Pointwise);
    }

    #[test]
    fn test_unknown_mode_is_rejected() {
        assert!("listwise".parse::<TaskMode>().is_err());
    }

    #[test]
    fn test_display_round_trips_through_json() {
        let json = serde_json::to_string(&TaskMode::Pointwise).unwrap();
        assert_eq!(json, "\"pointwise\"");
        assert_eq!(TaskMode::Pairwise.to_string(), "pairwise");
    }
}
