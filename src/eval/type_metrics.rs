//! Type-assertion metrics for one aligned pair.
//!
//! # Set-based (V1)
//!
//! Plain precision/recall/F1 between the expanded gold set `Tg` and the
//! expanded system set `Ts`:
//!
//! ```text
//! P = |Tg ∩ Ts| / |Ts|      R = |Tg ∩ Ts| / |Tg|      F1 = 2PR / (P + R)
//! ```
//!
//! # Ranked (V2, V3)
//!
//! The system's expanded types are ranked by weight, descending (mention count
//! for V2, confidence mass for V3), and scored with Average Precision against
//! `Tg`:
//!
//! ```text
//! AP = (1 / |Tg|) · Σ_{k : type_k ∈ Tg} precision@k
//! ```
//!
//! Every empty denominator yields 0.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// =============================================================================
// V1
// =============================================================================

/// Precision, recall and F1 of one comparison.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeScores {
    /// Precision
    pub precision: f64,
    /// Recall
    pub recall: f64,
    /// F1 score
    pub f1: f64,
}

impl TypeScores {
    /// Create scores, deriving F1 (0 when `P + R = 0`).
    #[must_use]
    pub fn new(precision: f64, recall: f64) -> Self {
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        Self {
            precision,
            recall,
            f1,
        }
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Set-based precision/recall/F1 of `system` against `gold`.
#[must_use]
pub fn set_scores(gold: &BTreeSet<String>, system: &BTreeSet<String>) -> TypeScores {
    let overlap = gold.intersection(system).count();
    TypeScores::new(ratio(overlap, system.len()), ratio(overlap, gold.len()))
}

// =============================================================================
// V2 / V3
// =============================================================================

/// Ordering of equal-weight types in a ranking.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum TieBreak {
    /// Lexicographically smaller label first
    #[default]
    LabelAscending,
    /// Lexicographically larger label first
    LabelDescending,
}

impl TieBreak {
    fn order(self, a: &str, b: &str) -> Ordering {
        match self {
            Self::LabelAscending => a.cmp(b),
            Self::LabelDescending => b.cmp(a),
        }
    }
}

impl fmt::Display for TieBreak {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::LabelAscending => "label-ascending",
            Self::LabelDescending => "label-descending",
        })
    }
}

impl FromStr for TieBreak {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "label-ascending" | "ascending" | "asc" => Ok(Self::LabelAscending),
            "label-descending" | "descending" | "desc" => Ok(Self::LabelDescending),
            other => Err(format!("unknown tie-break policy '{}'", other)),
        }
    }
}

/// One step of an Average Precision computation.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedType {
    /// 1-based rank
    pub rank: usize,
    /// Type label
    pub label: String,
    /// Ranking weight
    pub weight: f64,
    /// Whether the label is a gold type
    pub correct: bool,
    /// Correct labels at ranks `1..=rank`
    pub num_correct: usize,
    /// Sum of precision@k over correct ranks so far
    pub sum_precision: f64,
}

/// Average Precision with the ranking that produced it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AveragePrecision {
    /// AP in `[0, 1]`
    pub value: f64,
    /// The system ranking, one entry per type
    pub ranking: Vec<RankedType>,
}

/// Rank `weights` and score them against `gold`.
///
/// Weights sort descending; equal weights fall back to `tie_break` on labels.
#[must_use]
pub fn average_precision(
    gold: &BTreeSet<String>,
    weights: &[(&str, f64)],
    tie_break: TieBreak,
) -> AveragePrecision {
    let mut ordered: Vec<(&str, f64)> = weights.to_vec();
    ordered.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| tie_break.order(a.0, b.0)));

    let mut num_correct = 0usize;
    let mut sum_precision = 0.0f64;
    let ranking: Vec<RankedType> = ordered
        .into_iter()
        .enumerate()
        .map(|(idx, (label, weight))| {
            let rank = idx + 1;
            let correct = gold.contains(label);
            if correct {
                num_correct += 1;
                sum_precision += num_correct as f64 / rank as f64;
            }
            RankedType {
                rank,
                label: label.to_string(),
                weight,
                correct,
                num_correct,
                sum_precision,
            }
        })
        .collect();

    let value = if gold.is_empty() {
        0.0
    } else {
        sum_precision / gold.len() as f64
    };
    AveragePrecision { value, ranking }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(labels: &[&str]) -> BTreeSet<String> {
        labels.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_set_scores_basic() {
        let scores = set_scores(&set(&["PER", "PER.Pol"]), &set(&["PER", "PER.Pol", "PER.Ath"]));
        assert!((scores.precision - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(scores.recall, 1.0);
        assert!((scores.f1 - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_set_scores_empty_sides() {
        assert_eq!(set_scores(&set(&[]), &set(&["A"])), TypeScores::default());
        assert_eq!(set_scores(&set(&["A"]), &set(&[])), TypeScores::default());
        assert_eq!(set_scores(&set(&[]), &set(&[])), TypeScores::default());
    }

    #[test]
    fn test_set_scores_perfect() {
        let scores = set_scores(&set(&["A", "A.B"]), &set(&["A", "A.B"]));
        assert_eq!(scores.f1, 1.0);
    }

    #[test]
    fn test_ap_perfect_ranking() {
        let ap = average_precision(&set(&["A", "A.B"]), &[("A", 3.0), ("A.B", 2.0), ("C", 1.0)], TieBreak::default());
        assert_eq!(ap.value, 1.0);
        assert_eq!(ap.ranking.len(), 3);
        assert!(!ap.ranking[2].correct);
    }

    #[test]
    fn test_ap_intervening_wrong_type() {
        let ap = average_precision(&set(&["A", "B"]), &[("A", 3.0), ("X", 2.0), ("B", 1.0)], TieBreak::default());
        // (1/1 + 2/3) / 2
        assert!((ap.value - 5.0 / 6.0).abs() < 1e-9);
        assert_eq!(ap.ranking[2].num_correct, 2);
    }

    #[test]
    fn test_ap_zero_cases() {
        assert_eq!(average_precision(&set(&[]), &[("A", 1.0)], TieBreak::default()).value, 0.0);
        assert_eq!(average_precision(&set(&["B"]), &[("A", 1.0)], TieBreak::default()).value, 0.0);
        assert_eq!(average_precision(&set(&["B"]), &[], TieBreak::default()).value, 0.0);
    }

    #[test]
    fn test_ap_missing_gold_types_lower_score() {
        // gold has two types, system finds one at the top
        let ap = average_precision(&set(&["A", "B"]), &[("A", 1.0)], TieBreak::default());
        assert_eq!(ap.value, 0.5);
    }

    #[test]
    fn test_tie_break_policies() {
        let gold = set(&["b"]);
        let weights = [("a", 1.0), ("b", 1.0)];
        let asc = average_precision(&gold, &weights, TieBreak::LabelAscending);
        let desc = average_precision(&gold, &weights, TieBreak::LabelDescending);
        assert_eq!(asc.ranking[0].label, "a");
        assert_eq!(asc.value, 0.5);
        assert_eq!(desc.ranking[0].label, "b");
        assert_eq!(desc.value, 1.0);
    }

    #[test]
    fn test_tie_break_from_str() {
        assert_eq!("asc".parse::<TieBreak>(), Ok(TieBreak::LabelAscending));
        assert_eq!("label-descending".parse::<TieBreak>(), Ok(TieBreak::LabelDescending));
        assert!("random".parse::<TieBreak>().is_err());
    }
}
