//! Scoring configuration.

use serde::{Deserialize, Serialize};

use super::assignment::{AssignmentSolver, GreedyAssignment, Hungarian};
use super::type_metrics::TieBreak;
use crate::types::{TypeExpander, DEFAULT_HIERARCHY_SEPARATOR};

/// Run ID printed when none is given.
pub const DEFAULT_RUN_ID: &str = "runID";

/// Which assignment solver aligns clusters.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum SolverKind {
    /// Optimal Kuhn–Munkres matching
    #[default]
    Hungarian,
    /// Cheapest-cell-first matching (not optimal)
    Greedy,
}

impl SolverKind {
    /// Instantiate the solver.
    #[must_use]
    pub fn build(self) -> Box<dyn AssignmentSolver> {
        match self {
            Self::Hungarian => Box::new(Hungarian),
            Self::Greedy => Box::new(GreedyAssignment),
        }
    }
}

/// Configuration for a scoring run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Run ID written to every score row
    pub run_id: String,
    /// Ordering of equal-weight types in ranked metrics
    pub tie_break: TieBreak,
    /// Separator between levels of a type label
    pub hierarchy_separator: char,
    /// Separator between labels in the entity-types column
    pub type_list_separator: char,
    /// Mention types to keep (empty keeps all)
    pub mention_types: Vec<String>,
    /// Assignment solver
    pub solver: SolverKind,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            run_id: DEFAULT_RUN_ID.to_string(),
            tie_break: TieBreak::default(),
            hierarchy_separator: DEFAULT_HIERARCHY_SEPARATOR,
            type_list_separator: ';',
            mention_types: Vec::new(),
            solver: SolverKind::default(),
        }
    }
}

impl ScoringConfig {
    /// Set the run ID.
    #[must_use]
    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = run_id.into();
        self
    }

    /// Set the tie-break policy.
    #[must_use]
    pub fn with_tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }

    /// Set the hierarchy separator.
    #[must_use]
    pub fn with_hierarchy_separator(mut self, separator: char) -> Self {
        self.hierarchy_separator = separator;
        self
    }

    /// Set the type-list separator.
    #[must_use]
    pub fn with_type_list_separator(mut self, separator: char) -> Self {
        self.type_list_separator = separator;
        self
    }

    /// Keep only the given mention types.
    #[must_use]
    pub fn with_mention_types<I, S>(mut self, mention_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mention_types = mention_types.into_iter().map(Into::into).collect();
        self
    }

    /// Choose the assignment solver.
    #[must_use]
    pub fn with_solver(mut self, solver: SolverKind) -> Self {
        self.solver = solver;
        self
    }

    /// Expander for the configured separator.
    #[must_use]
    pub fn expander(&self) -> TypeExpander {
        TypeExpander::new(self.hierarchy_separator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ScoringConfig::default();
        assert_eq!(config.run_id, "runID");
        assert_eq!(config.tie_break, TieBreak::LabelAscending);
        assert_eq!(config.expander().separator(), '.');
        assert!(config.mention_types.is_empty());
        assert_eq!(config.solver.build().name(), "hungarian");
    }

    #[test]
    fn test_builders() {
        let config = ScoringConfig::default()
            .with_run_id("sys-3")
            .with_tie_break(TieBreak::LabelDescending)
            .with_mention_types(["NAM"])
            .with_solver(SolverKind::Greedy);
        assert_eq!(config.run_id, "sys-3");
        assert_eq!(config.mention_types, vec!["NAM".to_string()]);
        assert_eq!(config.solver.build().name(), "greedy");
    }
}
