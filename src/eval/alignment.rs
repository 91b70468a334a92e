//! Per-document alignment of gold and system entity clusters.
//!
//! Similarity between a gold and a system cluster is the number of mention
//! keys they share. The engine picks the one-to-one pairing with maximum total
//! similarity by solving a minimum-cost assignment on `cost = max_sim - sim`,
//! padded to a square matrix with virtual NULL entities.
//!
//! A pairing with zero similarity is not an alignment: both entities are
//! reported against NULL instead. Every real entity therefore appears in
//! exactly one [`AlignedPair`].
//!
//! # Example
//!
//! ```rust
//! use typealign::cluster::group_documents;
//! use typealign::eval::alignment::{AlignmentEngine, Endpoint};
//! use typealign::events::EventLog;
//! use typealign::mention::{Mention, MentionKey};
//! use typealign::types::Ontology;
//!
//! let gold = vec![Mention::new("m1", "E1", MentionKey::new("D1", 0, 5))];
//! let system = vec![Mention::new("x9", "S1", MentionKey::new("D1", 0, 5))];
//! let docs = group_documents(gold, system, &Ontology::default()).unwrap();
//!
//! let alignment = AlignmentEngine::default().align(&docs[0], &EventLog::default());
//! assert_eq!(alignment.pairs.len(), 1);
//! assert_eq!(alignment.pairs[0].gold, Endpoint::Entity(0));
//! assert_eq!(alignment.pairs[0].system, Endpoint::Entity(0));
//! assert_eq!(alignment.pairs[0].similarity, 1);
//! ```

use crate::cluster::{DocumentClusters, EntityCluster, MentionUnit};
use crate::events::{Event, EventLog};
use crate::mention::MentionKey;

use super::assignment::{AssignmentSolver, CostMatrix, Hungarian};

/// Stage name used in similarity events.
pub const ALIGNMENT_STAGE: &str = "alignment";

// =============================================================================
// Alignment types
// =============================================================================

/// One side of an aligned pair: a real cluster (by index) or NULL padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Index into the document's gold or system cluster list
    Entity(usize),
    /// Virtual entity with no mentions and no types
    Null,
}

impl Endpoint {
    /// Cluster index, if real.
    #[must_use]
    pub fn index(self) -> Option<usize> {
        match self {
            Self::Entity(idx) => Some(idx),
            Self::Null => None,
        }
    }

    /// Whether this is NULL padding.
    #[must_use]
    pub fn is_null(self) -> bool {
        matches!(self, Self::Null)
    }

    /// Resolve against a cluster list.
    #[must_use]
    pub fn resolve<'a>(self, clusters: &'a [EntityCluster]) -> Option<&'a EntityCluster> {
        self.index().and_then(|idx| clusters.get(idx))
    }
}

/// One alignment row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignedPair {
    /// Gold side
    pub gold: Endpoint,
    /// System side
    pub system: Endpoint,
    /// Shared mention keys (0 when either side is NULL)
    pub similarity: usize,
    /// The shared keys themselves, in key order
    pub common_mentions: Vec<MentionKey>,
}

impl AlignedPair {
    fn null_gold(system: usize) -> Self {
        Self {
            gold: Endpoint::Null,
            system: Endpoint::Entity(system),
            similarity: 0,
            common_mentions: Vec::new(),
        }
    }

    fn null_system(gold: usize) -> Self {
        Self {
            gold: Endpoint::Entity(gold),
            system: Endpoint::Null,
            similarity: 0,
            common_mentions: Vec::new(),
        }
    }

    /// Whether both sides are real entities.
    #[must_use]
    pub fn is_aligned(&self) -> bool {
        !self.gold.is_null() && !self.system.is_null()
    }
}

/// A pair of mention units inside an alignment row, either side may be NULL.
#[derive(Debug, Clone, Copy)]
pub struct MentionPair<'a> {
    /// Gold unit
    pub gold: Option<&'a MentionUnit>,
    /// System unit
    pub system: Option<&'a MentionUnit>,
}

/// Alignment of one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentAlignment {
    /// Document ID
    pub document_id: String,
    /// Rows: aligned gold clusters in gold order, then NULL-aligned system clusters
    pub pairs: Vec<AlignedPair>,
    similarities: Vec<Vec<usize>>,
}

impl DocumentAlignment {
    /// Sum of similarities over all rows.
    #[must_use]
    pub fn total_similarity(&self) -> usize {
        self.pairs.iter().map(|p| p.similarity).sum()
    }

    /// Similarity between gold cluster `gold` and system cluster `system`.
    #[must_use]
    pub fn similarity(&self, gold: usize, system: usize) -> usize {
        self.similarities
            .get(gold)
            .and_then(|row| row.get(system))
            .copied()
            .unwrap_or(0)
    }

    /// Number of rows aligning two real entities.
    #[must_use]
    pub fn aligned_count(&self) -> usize {
        self.pairs.iter().filter(|p| p.is_aligned()).count()
    }

    /// Mention-unit pairs implied by the cluster alignment.
    ///
    /// Inside an aligned row, each common key pairs the gold and system units
    /// at that key; the remaining units of either cluster, and every unit of a
    /// NULL-aligned cluster, are paired with NULL. Every unit of every cluster
    /// appears exactly once.
    #[must_use]
    pub fn mention_pairs<'a>(&self, document: &'a DocumentClusters) -> Vec<MentionPair<'a>> {
        let mut out = Vec::new();
        for pair in &self.pairs {
            let gold = pair.gold.resolve(&document.gold);
            let system = pair.system.resolve(&document.system);
            match (gold, system) {
                (Some(g), Some(s)) => {
                    for key in &pair.common_mentions {
                        out.push(MentionPair {
                            gold: g.unit(key),
                            system: s.unit(key),
                        });
                    }
                    let common = |unit: &&MentionUnit| pair.common_mentions.binary_search(unit.key()).is_ok();
                    out.extend(g.units().filter(|u| !common(u)).map(|u| MentionPair {
                        gold: Some(u),
                        system: None,
                    }));
                    out.extend(s.units().filter(|u| !common(u)).map(|u| MentionPair {
                        gold: None,
                        system: Some(u),
                    }));
                }
                (Some(g), None) => out.extend(g.units().map(|u| MentionPair {
                    gold: Some(u),
                    system: None,
                })),
                (None, Some(s)) => out.extend(s.units().map(|u| MentionPair {
                    gold: None,
                    system: Some(u),
                })),
                (None, None) => {}
            }
        }
        out
    }
}

// =============================================================================
// AlignmentEngine
// =============================================================================

/// Computes [`DocumentAlignment`]s with a pluggable assignment solver.
#[derive(Debug)]
pub struct AlignmentEngine {
    solver: Box<dyn AssignmentSolver>,
}

impl Default for AlignmentEngine {
    fn default() -> Self {
        Self::new(Box::new(Hungarian))
    }
}

impl AlignmentEngine {
    /// Create an engine using `solver`.
    #[must_use]
    pub fn new(solver: Box<dyn AssignmentSolver>) -> Self {
        Self { solver }
    }

    /// The solver in use.
    #[must_use]
    pub fn solver(&self) -> &dyn AssignmentSolver {
        self.solver.as_ref()
    }

    /// Align the clusters of one document.
    ///
    /// Logs `SIMILARITY_INFO` for every gold/system pair sharing a mention.
    #[must_use]
    pub fn align(&self, document: &DocumentClusters, events: &EventLog) -> DocumentAlignment {
        let (gold, system) = (&document.gold, &document.system);
        let audit = events.audit_enabled();

        let mut similarities = vec![vec![0usize; system.len()]; gold.len()];
        let mut max_similarity = 0usize;
        for (i, g) in gold.iter().enumerate() {
            for (j, s) in system.iter().enumerate() {
                let similarity = g.similarity(s);
                similarities[i][j] = similarity;
                max_similarity = max_similarity.max(similarity);
                if audit && similarity > 0 {
                    events.record(&Event::Similarity {
                        metric: ALIGNMENT_STAGE.to_string(),
                        document: document.document_id.clone(),
                        gold: g.id().to_string(),
                        system: s.id().to_string(),
                        similarity,
                        common_mentions: g.common_keys(s).iter().map(ToString::to_string).collect(),
                    });
                }
            }
        }

        let mut gold_to_system: Vec<Option<usize>> = vec![None; gold.len()];
        let mut system_matched = vec![false; system.len()];
        if max_similarity > 0 {
            let n = gold.len().max(system.len());
            let ceiling = max_similarity as i64;
            // Padded cells cost as much as a zero-similarity pairing
            let mut costs = CostMatrix::filled(n, ceiling);
            for (i, row) in similarities.iter().enumerate() {
                for (j, &similarity) in row.iter().enumerate() {
                    costs.set(i, j, ceiling - similarity as i64);
                }
            }
            let assignment = self.solver.solve(&costs);
            for (i, &j) in assignment.iter().enumerate().take(gold.len()) {
                if j < system.len() && similarities[i][j] > 0 {
                    gold_to_system[i] = Some(j);
                    system_matched[j] = true;
                }
            }
        }

        let mut pairs = Vec::with_capacity(gold.len() + system.len());
        for (i, partner) in gold_to_system.iter().enumerate() {
            pairs.push(match *partner {
                Some(j) => AlignedPair {
                    gold: Endpoint::Entity(i),
                    system: Endpoint::Entity(j),
                    similarity: similarities[i][j],
                    common_mentions: gold[i].common_keys(&system[j]),
                },
                None => AlignedPair::null_system(i),
            });
        }
        pairs.extend(
            system_matched
                .iter()
                .enumerate()
                .filter(|(_, matched)| !**matched)
                .map(|(j, _)| AlignedPair::null_gold(j)),
        );

        log::debug!(
            "{}: aligned {} of {} gold / {} system cluster(s) with {}",
            document.document_id,
            gold_to_system.iter().filter(|p| p.is_some()).count(),
            gold.len(),
            system.len(),
            self.solver.name()
        );

        DocumentAlignment {
            document_id: document.document_id.clone(),
            pairs,
            similarities,
        }
    }
}
