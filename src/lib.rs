//! # typealign
//!
//! Scoring of entity clustering and fine-grained typing output.
//!
//! Gold and system mentions are grouped into entity clusters per document.
//! Clusters are aligned one-to-one by the number of mention spans they share
//! (maximum-similarity assignment), and each aligned pair is scored on its
//! hierarchical type assertions, compared after ancestor expansion
//! (`PER.Politician` asserts `PER` too).
//!
//! | Metric | Ranking | Unit |
//! |--------|---------|------|
//! | `cluster_v1` | none: set P/R/F1 | entity |
//! | `cluster_v2` | mention count | entity |
//! | `cluster_v3` | summed confidence | entity |
//! | `mention_v1` | none: set P/R/F1 | mention |
//! | `mention_v2` | mention count | mention |
//! | `mention_v3` | summed confidence | mention |
//!
//! Entities without a counterpart are kept as NULL-aligned rows scoring 0,
//! so every gold and every system entity appears exactly once per table.
//!
//! ## Quick Start
//!
//! ```rust
//! use typealign::eval::{Evaluator, Metric, ScoringConfig};
//! use typealign::events::EventLog;
//! use typealign::loader::AnnotationLoader;
//! use typealign::types::Ontology;
//!
//! let events = EventLog::default();
//! let loader = AnnotationLoader::new(&events);
//! let gold = loader
//!     .parse_content("gold", "r\tm1\tObama\tD1:0-4\tE1\tPER.Politician\tNAM\t1.0\n")
//!     .unwrap();
//! let system = loader
//!     .parse_content("system", "r\tx1\tObama\tD1:0-4\tS1\tPER.Politician\tNAM\t0.9\n")
//!     .unwrap();
//!
//! let tables = Evaluator::new(ScoringConfig::default())
//!     .evaluate(gold, system, &Ontology::default(), &events)
//!     .unwrap();
//! assert_eq!(tables.get(Metric::ClusterV1).unwrap().mean(), 1.0);
//! ```
//!
//! ## Feature Flags
//!
//! - `parallel`: score documents on the rayon thread pool. Output order is
//!   unchanged.
//!
//! ## Logging
//!
//! Audit events (alignments, similarities, type sets, AP steps) are emitted
//! through the `log` facade under the [`events::AUDIT_TARGET`] target, so a
//! logger filter decides whether they are built at all.

#![warn(missing_docs)]

pub mod cli;
pub mod cluster;
mod error;
pub mod eval;
pub mod events;
pub mod loader;
pub mod mention;
pub mod report;
pub mod types;
pub mod validate;

pub use cluster::{DocumentClusters, EntityCluster, MentionUnit};
pub use error::{Error, Result};
pub use eval::{Evaluator, Metric, ScoreTables, ScoringConfig};
pub use events::{Event, EventCatalog, EventLog};
pub use mention::{Mention, MentionKey, Side};
pub use types::{Ontology, TypeExpander, TypeProfile};
pub use validate::{Severity, ValidationIssue};
