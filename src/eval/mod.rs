//! Alignment and scoring engine.
//!
//! # Pipeline
//!
//! ```text
//! DocumentClusters ──► AlignmentEngine ──► DocumentAlignment
//!                                              │
//!                        DocumentScorer ◄──────┘
//!                              │ (6 metrics × cluster/mention rows)
//!                              ▼
//!                       ScoreAggregator ──► ScoreTables
//! ```
//!
//! # Metrics
//!
//! **Cluster level** (one row per gold or system entity, NULL-padded):
//! - `cluster_v1`: set precision/recall/F1 of expanded types
//! - `cluster_v2`: Average Precision, types ranked by mention count
//! - `cluster_v3`: Average Precision, types ranked by confidence mass
//!
//! **Mention level** (one row per mention unit, paired by span inside
//! aligned clusters): `mention_v1`, `mention_v2`, `mention_v3`, same formulas.
//!
//! # Example
//!
//! ```rust
//! use typealign::eval::{Evaluator, Metric, ScoringConfig};
//! use typealign::events::EventLog;
//! use typealign::mention::{Mention, MentionKey};
//! use typealign::types::Ontology;
//!
//! let gold = vec![
//!     Mention::new("m1", "E1", MentionKey::new("D1", 0, 5)).with_types(["PER.Politician"]),
//! ];
//! let system = vec![
//!     Mention::new("x1", "S1", MentionKey::new("D1", 0, 5)).with_types(["PER"]),
//! ];
//!
//! let evaluator = Evaluator::new(ScoringConfig::default());
//! let tables = evaluator
//!     .evaluate(gold, system, &Ontology::default(), &EventLog::default())
//!     .unwrap();
//!
//! let v1 = tables.get(Metric::ClusterV1).unwrap();
//! assert_eq!(v1.len(), 1);
//! // gold {PER, PER.Politician} vs system {PER}: P = 1, R = 0.5
//! assert!((v1.mean() - 2.0 / 3.0).abs() < 1e-9);
//! ```

pub mod aggregate;
pub mod alignment;
pub mod assignment;
pub mod config;
pub mod evaluator;
pub mod scorer;
pub mod type_metrics;

pub use aggregate::{ScoreAggregator, ScoreTable, ScoreTables};
pub use alignment::{AlignedPair, AlignmentEngine, DocumentAlignment, Endpoint, MentionPair};
pub use assignment::{AssignmentSolver, CostMatrix, GreedyAssignment, Hungarian};
pub use config::{ScoringConfig, SolverKind, DEFAULT_RUN_ID};
pub use evaluator::Evaluator;
pub use scorer::{DocumentScorer, Level, Metric, ScoreRecord, ScoreValue};
pub use type_metrics::{average_precision, set_scores, AveragePrecision, RankedType, TieBreak, TypeScores};
