//! Collecting score rows into per-metric tables.
//!
//! Rows stay per document and per pair; the only cross-row statistic here is
//! [`ScoreTable::mean`], used by presentation layers for a summary line.

use std::collections::BTreeMap;

use serde::Serialize;

use super::scorer::{Metric, ScoreRecord};
use crate::events::NONE;
use crate::Result;

/// Rows of one metric variant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreTable {
    metric: Metric,
    rows: Vec<ScoreRecord>,
}

impl ScoreTable {
    /// Empty table for `metric`.
    #[must_use]
    pub fn new(metric: Metric) -> Self {
        Self {
            metric,
            rows: Vec::new(),
        }
    }

    /// Metric variant.
    #[must_use]
    pub fn metric(&self) -> Metric {
        self.metric
    }

    /// Rows in current order.
    #[must_use]
    pub fn rows(&self) -> &[ScoreRecord] {
        &self.rows
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Mean of the headline value (F1 or AP); 0 for an empty table.
    #[must_use]
    pub fn mean(&self) -> f64 {
        if self.rows.is_empty() {
            return 0.0;
        }
        self.rows.iter().map(|r| r.value.headline()).sum::<f64>() / self.rows.len() as f64
    }

    /// Sort by document, then gold ID, then system ID, NULL printed as `None`.
    pub fn sort(&mut self) {
        fn shown(id: &Option<String>) -> &str {
            id.as_deref().unwrap_or(NONE)
        }
        self.rows.sort_by(|a, b| {
            a.document_id
                .cmp(&b.document_id)
                .then_with(|| shown(&a.gold_id).cmp(shown(&b.gold_id)))
                .then_with(|| shown(&a.system_id).cmp(shown(&b.system_id)))
        });
    }
}

/// The six tables of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreTables {
    tables: BTreeMap<Metric, ScoreTable>,
}

impl ScoreTables {
    /// Table of `metric`.
    #[must_use]
    pub fn get(&self, metric: Metric) -> Option<&ScoreTable> {
        self.tables.get(&metric)
    }

    /// Tables in metric order.
    pub fn iter(&self) -> impl Iterator<Item = &ScoreTable> {
        self.tables.values()
    }

    /// Total rows across tables.
    #[must_use]
    pub fn total_rows(&self) -> usize {
        self.tables.values().map(ScoreTable::len).sum()
    }

    /// All tables as a JSON array, in metric order.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        let tables: Vec<&ScoreTable> = self.tables.values().collect();
        serde_json::to_string_pretty(&tables)
            .map_err(|e| crate::Error::parse(format!("cannot serialize scores: {}", e)))
    }
}

/// Routes score rows to their metric's table.
#[derive(Debug, Clone)]
pub struct ScoreAggregator {
    tables: BTreeMap<Metric, ScoreTable>,
}

impl Default for ScoreAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoreAggregator {
    /// Aggregator with an empty table for every metric.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tables: Metric::ALL
                .into_iter()
                .map(|metric| (metric, ScoreTable::new(metric)))
                .collect(),
        }
    }

    /// Add rows, in any order.
    pub fn extend<I: IntoIterator<Item = ScoreRecord>>(&mut self, records: I) {
        for record in records {
            self.tables
                .entry(record.metric)
                .or_insert_with(|| ScoreTable::new(record.metric))
                .rows
                .push(record);
        }
    }

    /// Sort every table and hand them over.
    #[must_use]
    pub fn finish(mut self) -> ScoreTables {
        for table in self.tables.values_mut() {
            table.sort();
        }
        ScoreTables {
            tables: self.tables,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::scorer::ScoreValue;
    use crate::eval::type_metrics::TypeScores;

    fn record(doc: &str, gold: Option<&str>, system: Option<&str>, metric: Metric, value: f64) -> ScoreRecord {
        ScoreRecord {
            document_id: doc.to_string(),
            run_id: "runID".to_string(),
            gold_id: gold.map(str::to_string),
            system_id: system.map(str::to_string),
            metric,
            value: match metric.weighting() {
                None => ScoreValue::Set(TypeScores::new(value, value)),
                Some(_) => ScoreValue::AveragePrecision(value),
            },
        }
    }

    #[test]
    fn test_rows_sorted_by_printed_ids() {
        let mut aggregator = ScoreAggregator::new();
        aggregator.extend(vec![
            record("D2", Some("E1"), Some("S1"), Metric::ClusterV2, 1.0),
            record("D1", None, Some("S4"), Metric::ClusterV2, 0.0),
            record("D1", Some("E9"), None, Metric::ClusterV2, 0.0),
            record("D1", Some("E1"), Some("S2"), Metric::ClusterV2, 0.5),
        ]);
        let tables = aggregator.finish();
        let table = tables.get(Metric::ClusterV2).unwrap();
        let order: Vec<(&str, Option<&str>)> = table
            .rows()
            .iter()
            .map(|r| (r.document_id.as_str(), r.gold_id.as_deref()))
            .collect();
        // "E1" < "E9" < "None"
        assert_eq!(
            order,
            vec![("D1", Some("E1")), ("D1", Some("E9")), ("D1", None), ("D2", Some("E1"))]
        );
        assert_eq!(table.mean(), 0.375);
    }

    #[test]
    fn test_all_metrics_present_even_when_empty() {
        let tables = ScoreAggregator::new().finish();
        assert_eq!(tables.iter().count(), 6);
        assert_eq!(tables.total_rows(), 0);
        assert_eq!(tables.get(Metric::MentionV3).unwrap().mean(), 0.0);
    }

    #[test]
    fn test_json_lists_tables_in_metric_order() {
        let mut aggregator = ScoreAggregator::new();
        aggregator.extend(vec![record("D1", Some("E1"), None, Metric::MentionV1, 0.0)]);
        let json = aggregator.finish().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let tables = value.as_array().unwrap();
        assert_eq!(tables.len(), 6);
        assert_eq!(tables[0]["metric"], "ClusterV1");
        assert_eq!(tables[3]["rows"][0]["gold_id"], "E1");
        assert!(tables[3]["rows"][0]["system_id"].is_null());
    }
}
