//! Per-document scoring of all six metric variants.
//!
//! | Metric | Unit | Formula | Ranking weight |
//! |--------|------|---------|----------------|
//! | `cluster_v1` | aligned cluster pair | set P/R/F1 | - |
//! | `cluster_v2` | aligned cluster pair | Average Precision | mention count |
//! | `cluster_v3` | aligned cluster pair | Average Precision | confidence sum |
//! | `mention_v1` | aligned mention pair | set P/R/F1 | - |
//! | `mention_v2` | aligned mention pair | Average Precision | mention count |
//! | `mention_v3` | aligned mention pair | Average Precision | confidence sum |
//!
//! A row whose gold or system side is NULL scores 0 on every metric.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::alignment::DocumentAlignment;
use super::config::ScoringConfig;
use super::type_metrics::{average_precision, set_scores, TypeScores};
use crate::cluster::DocumentClusters;
use crate::events::{Event, EventLog};
use crate::mention::Side;
use crate::types::{TypeProfile, TypeWeighting};

// =============================================================================
// Metric
// =============================================================================

/// What a score row is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Level {
    /// Entity clusters
    Cluster,
    /// Mentions inside aligned clusters
    Mention,
}

/// The six metric variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Metric {
    /// Cluster-level set P/R/F1
    ClusterV1,
    /// Cluster-level AP, count-weighted
    ClusterV2,
    /// Cluster-level AP, confidence-weighted
    ClusterV3,
    /// Mention-level set P/R/F1
    MentionV1,
    /// Mention-level AP, count-weighted
    MentionV2,
    /// Mention-level AP, confidence-weighted
    MentionV3,
}

impl Metric {
    /// All variants in output order.
    pub const ALL: [Metric; 6] = [
        Self::ClusterV1,
        Self::ClusterV2,
        Self::ClusterV3,
        Self::MentionV1,
        Self::MentionV2,
        Self::MentionV3,
    ];

    /// Stable code, also the score file stem.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::ClusterV1 => "cluster_v1",
            Self::ClusterV2 => "cluster_v2",
            Self::ClusterV3 => "cluster_v3",
            Self::MentionV1 => "mention_v1",
            Self::MentionV2 => "mention_v2",
            Self::MentionV3 => "mention_v3",
        }
    }

    /// Cluster or mention level.
    #[must_use]
    pub fn level(self) -> Level {
        match self {
            Self::ClusterV1 | Self::ClusterV2 | Self::ClusterV3 => Level::Cluster,
            Self::MentionV1 | Self::MentionV2 | Self::MentionV3 => Level::Mention,
        }
    }

    /// Ranking weight for AP variants, `None` for set-based ones.
    #[must_use]
    pub fn weighting(self) -> Option<TypeWeighting> {
        match self {
            Self::ClusterV1 | Self::MentionV1 => None,
            Self::ClusterV2 | Self::MentionV2 => Some(TypeWeighting::Count),
            Self::ClusterV3 | Self::MentionV3 => Some(TypeWeighting::Confidence),
        }
    }

    /// Zero score of the right shape.
    #[must_use]
    pub fn zero(self) -> ScoreValue {
        match self.weighting() {
            None => ScoreValue::Set(TypeScores::default()),
            Some(_) => ScoreValue::AveragePrecision(0.0),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.code() == s.trim())
            .ok_or_else(|| format!("unknown metric '{}'", s))
    }
}

// =============================================================================
// Score records
// =============================================================================

/// Value of one score row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ScoreValue {
    /// V1 precision/recall/F1
    Set(TypeScores),
    /// V2/V3 Average Precision
    AveragePrecision(f64),
}

impl ScoreValue {
    /// F1 for set scores, AP for ranked ones.
    #[must_use]
    pub fn headline(&self) -> f64 {
        match self {
            Self::Set(scores) => scores.f1,
            Self::AveragePrecision(ap) => *ap,
        }
    }
}

/// One score row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    /// Document ID
    pub document_id: String,
    /// Run ID
    pub run_id: String,
    /// Gold entity or mention ID, `None` when NULL
    pub gold_id: Option<String>,
    /// System entity or mention ID, `None` when NULL
    pub system_id: Option<String>,
    /// Metric variant
    pub metric: Metric,
    /// Score
    pub value: ScoreValue,
}

// =============================================================================
// DocumentScorer
// =============================================================================

#[derive(Clone, Copy)]
struct Participant<'p> {
    id: &'p str,
    profile: &'p TypeProfile,
}

/// Scores one aligned document under every metric.
#[derive(Debug)]
pub struct DocumentScorer<'a> {
    config: &'a ScoringConfig,
    events: &'a EventLog,
}

impl<'a> DocumentScorer<'a> {
    /// Create a scorer.
    #[must_use]
    pub fn new(config: &'a ScoringConfig, events: &'a EventLog) -> Self {
        Self { config, events }
    }

    /// All score rows of the document, metric by metric.
    #[must_use]
    pub fn score(
        &self,
        document: &DocumentClusters,
        alignment: &DocumentAlignment,
    ) -> Vec<ScoreRecord> {
        let mut records = Vec::new();
        let mention_pairs = alignment.mention_pairs(document);

        for metric in Metric::ALL {
            match metric.level() {
                Level::Cluster => {
                    for pair in &alignment.pairs {
                        let gold = pair.gold.resolve(&document.gold).map(|c| Participant {
                            id: c.id(),
                            profile: c.profile(),
                        });
                        let system = pair.system.resolve(&document.system).map(|c| Participant {
                            id: c.id(),
                            profile: c.profile(),
                        });
                        let similarity = pair.is_aligned().then_some(pair.similarity);
                        records.push(self.score_pair(metric, document, gold, system, similarity));
                    }
                }
                Level::Mention => {
                    for pair in &mention_pairs {
                        let gold = pair.gold.map(|u| Participant {
                            id: u.id(),
                            profile: u.profile(),
                        });
                        let system = pair.system.map(|u| Participant {
                            id: u.id(),
                            profile: u.profile(),
                        });
                        let similarity = (gold.is_some() && system.is_some()).then_some(1);
                        records.push(self.score_pair(metric, document, gold, system, similarity));
                    }
                }
            }
        }
        records
    }

    fn score_pair(
        &self,
        metric: Metric,
        document: &DocumentClusters,
        gold: Option<Participant<'_>>,
        system: Option<Participant<'_>>,
        similarity: Option<usize>,
    ) -> ScoreRecord {
        let audit = self.events.audit_enabled();
        let document_id = document.document_id.as_str();
        if audit {
            self.events.record(&Event::Alignment {
                metric: metric.code().to_string(),
                document: document_id.to_string(),
                gold: gold.map(|g| g.id.to_string()),
                system: system.map(|s| s.id.to_string()),
                similarity,
            });
        }

        let value = match (gold, system) {
            (Some(g), Some(s)) => match metric.weighting() {
                None => {
                    if audit {
                        self.record_types(metric, document_id, Side::Gold, g);
                        self.record_types(metric, document_id, Side::System, s);
                    }
                    ScoreValue::Set(set_scores(g.profile.expanded(), s.profile.expanded()))
                }
                Some(weighting) => {
                    let weights = s.profile.weights(weighting);
                    let ap = average_precision(g.profile.expanded(), &weights, self.config.tie_break);
                    if audit {
                        for step in &ap.ranking {
                            self.events.record(&Event::AveragePrecisionStep {
                                metric: metric.code().to_string(),
                                document: document_id.to_string(),
                                gold: g.id.to_string(),
                                system: s.id.to_string(),
                                rank: step.rank,
                                type_label: step.label.clone(),
                                correct: step.correct,
                                weight: step.weight,
                                num_correct: step.num_correct,
                                sum_precision: step.sum_precision,
                            });
                        }
                    }
                    ScoreValue::AveragePrecision(ap.value)
                }
            },
            _ => metric.zero(),
        };

        ScoreRecord {
            document_id: document_id.to_string(),
            run_id: self.config.run_id.clone(),
            gold_id: gold.map(|g| g.id.to_string()),
            system_id: system.map(|s| s.id.to_string()),
            metric,
            value,
        }
    }

    fn record_types(&self, metric: Metric, document: &str, side: Side, who: Participant<'_>) {
        self.events.record(&Event::EntityTypes {
            metric: metric.code().to_string(),
            side,
            document: document.to_string(),
            entity: who.id.to_string(),
            raw: who.profile.raw().iter().cloned().collect(),
            expanded: who.profile.expanded().iter().cloned().collect(),
        });
    }
}
