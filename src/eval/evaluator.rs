//! End-to-end scoring: group, align, score, aggregate.
//!
//! Documents are independent, so with the `parallel` feature they are scored
//! on the rayon pool. `par_iter().map().collect()` keeps document order, and
//! the aggregator sorts rows anyway, so output does not depend on scheduling.

use super::aggregate::{ScoreAggregator, ScoreTables};
use super::alignment::AlignmentEngine;
use super::config::ScoringConfig;
use super::scorer::{DocumentScorer, ScoreRecord};
use crate::cluster::{group_documents, DocumentClusters};
use crate::events::EventLog;
use crate::mention::Mention;
use crate::types::Ontology;
use crate::Result;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Scores a whole gold/system pair of annotation sets.
#[derive(Debug)]
pub struct Evaluator {
    config: ScoringConfig,
    engine: AlignmentEngine,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new(ScoringConfig::default())
    }
}

impl Evaluator {
    /// Create an evaluator; the solver comes from `config.solver`.
    #[must_use]
    pub fn new(config: ScoringConfig) -> Self {
        let engine = AlignmentEngine::new(config.solver.build());
        Self { config, engine }
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Align and score one document.
    #[must_use]
    pub fn score_document(&self, document: &DocumentClusters, events: &EventLog) -> Vec<ScoreRecord> {
        let alignment = self.engine.align(document, events);
        DocumentScorer::new(&self.config, events).score(document, &alignment)
    }

    /// Score grouped documents into the six tables.
    #[must_use]
    pub fn evaluate_documents(&self, documents: &[DocumentClusters], events: &EventLog) -> ScoreTables {
        #[cfg(feature = "parallel")]
        let per_document: Vec<Vec<ScoreRecord>> = documents
            .par_iter()
            .map(|doc| self.score_document(doc, events))
            .collect();

        #[cfg(not(feature = "parallel"))]
        let per_document: Vec<Vec<ScoreRecord>> = documents
            .iter()
            .map(|doc| self.score_document(doc, events))
            .collect();

        let mut aggregator = ScoreAggregator::new();
        for records in per_document {
            aggregator.extend(records);
        }
        let tables = aggregator.finish();
        log::info!(
            "scored {} document(s) into {} row(s)",
            documents.len(),
            tables.total_rows()
        );
        tables
    }

    /// Group mentions into clusters under `ontology`, then score.
    ///
    /// # Errors
    ///
    /// Configuration error when a closed ontology meets an unknown type.
    pub fn evaluate(
        &self,
        gold: Vec<Mention>,
        system: Vec<Mention>,
        ontology: &Ontology,
        events: &EventLog,
    ) -> Result<ScoreTables> {
        let documents = group_documents(gold, system, ontology)?;
        Ok(self.evaluate_documents(&documents, events))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::scorer::Metric;
    use crate::mention::MentionKey;
    use crate::types::TypeExpander;

    fn m(id: &str, cluster: &str, doc: &str, begin: u64, types: &[&str]) -> Mention {
        Mention::new(id, cluster, MentionKey::new(doc, begin, begin + 3)).with_types(types.iter().copied())
    }

    #[test]
    fn test_system_only_document_is_scored() {
        let tables = Evaluator::default()
            .evaluate(
                vec![m("g1", "E1", "D1", 0, &["PER"])],
                vec![m("s1", "S1", "D1", 0, &["PER"]), m("s2", "S7", "D2", 0, &["ORG"])],
                &Ontology::default(),
                &EventLog::default(),
            )
            .unwrap();
        let rows = tables.get(Metric::ClusterV1).unwrap().rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].document_id, "D2");
        assert_eq!(rows[1].gold_id, None);
    }

    #[test]
    fn test_closed_ontology_unknown_type_aborts() {
        let ontology = Ontology::parse(TypeExpander::default(), "PER\n").unwrap();
        let err = Evaluator::default()
            .evaluate(
                vec![m("g1", "E1", "D1", 0, &["PER"])],
                vec![m("s1", "S1", "D1", 0, &["LOC"])],
                &ontology,
                &EventLog::default(),
            )
            .unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_run_id_on_every_row() {
        let evaluator = Evaluator::new(ScoringConfig::default().with_run_id("sysA"));
        let tables = evaluator
            .evaluate(
                vec![m("g1", "E1", "D1", 0, &["PER"])],
                vec![m("s1", "S1", "D1", 0, &["PER"])],
                &Ontology::default(),
                &EventLog::default(),
            )
            .unwrap();
        assert!(tables.iter().flat_map(|t| t.rows()).all(|r| r.run_id == "sysA"));
        assert_eq!(tables.total_rows(), 6);
    }
}
