//! Score file rendering.
//!
//! One table per metric. The `pretty` separator pads every column to its
//! widest cell (text left-justified, numbers right-justified); `tab` and
//! `space` join unpadded cells. Each table ends with a `Summary` row holding
//! the mean F1 (V1) or mean Average Precision (V2/V3).
//!
//! ```text
//! DocID   RunID GoldEntityID SystemEntityID   Prec Recall     F1
//! D1      runID E1           S1             0.6667 1.0000 0.8000
//! Summary runID                                           0.8000
//! ```

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::eval::{Level, ScoreTable, ScoreTables, ScoreValue};
use crate::events::NONE;
use crate::{Error, Result};

/// Column separator of score files.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Separator {
    /// Space-padded aligned columns
    #[default]
    Pretty,
    /// Tab between cells
    Tab,
    /// Single space between cells
    Space,
}

impl Separator {
    fn joiner(self) -> &'static str {
        match self {
            Self::Pretty | Self::Space => " ",
            Self::Tab => "\t",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Justify {
    Left,
    Right,
}

struct Column {
    header: &'static str,
    justify: Justify,
}

const fn text(header: &'static str) -> Column {
    Column {
        header,
        justify: Justify::Left,
    }
}

const fn number(header: &'static str) -> Column {
    Column {
        header,
        justify: Justify::Right,
    }
}

const CLUSTER_V1: &[Column] = &[
    text("DocID"),
    text("RunID"),
    text("GoldEntityID"),
    text("SystemEntityID"),
    number("Prec"),
    number("Recall"),
    number("F1"),
];

const CLUSTER_AP: &[Column] = &[
    text("DocID"),
    text("RunID"),
    text("GoldEntityID"),
    text("SystemEntityID"),
    number("AveragePrecision"),
];

const MENTION_V1: &[Column] = &[
    text("DocID"),
    text("RunID"),
    text("GoldMentionID"),
    text("SystemMentionID"),
    number("Prec"),
    number("Recall"),
    number("F1"),
];

const MENTION_AP: &[Column] = &[
    text("DocID"),
    text("RunID"),
    text("GoldMentionID"),
    text("SystemMentionID"),
    number("AveragePrecision"),
];

fn score(value: f64) -> String {
    format!("{:6.4}", value)
}

/// Renders score tables as text.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScorePrinter {
    separator: Separator,
}

impl ScorePrinter {
    /// Printer using `separator`.
    #[must_use]
    pub fn new(separator: Separator) -> Self {
        Self { separator }
    }

    /// Header, rows and summary of one table, newline-terminated lines.
    #[must_use]
    pub fn render(&self, table: &ScoreTable, run_id: &str) -> String {
        let metric = table.metric();
        let ranked = metric.weighting().is_some();
        let columns = match (metric.level(), ranked) {
            (Level::Cluster, false) => CLUSTER_V1,
            (Level::Cluster, true) => CLUSTER_AP,
            (Level::Mention, false) => MENTION_V1,
            (Level::Mention, true) => MENTION_AP,
        };

        let mut lines: Vec<Vec<String>> = Vec::with_capacity(table.len() + 2);
        lines.push(columns.iter().map(|c| c.header.to_string()).collect());
        for row in table.rows() {
            let mut cells = vec![
                row.document_id.clone(),
                row.run_id.clone(),
                row.gold_id.as_deref().unwrap_or(NONE).to_string(),
                row.system_id.as_deref().unwrap_or(NONE).to_string(),
            ];
            match row.value {
                ScoreValue::Set(s) => {
                    cells.extend([score(s.precision), score(s.recall), score(s.f1)]);
                }
                ScoreValue::AveragePrecision(ap) => cells.push(score(ap)),
            }
            lines.push(cells);
        }

        let mut summary = vec![
            "Summary".to_string(),
            run_id.to_string(),
            String::new(),
            String::new(),
        ];
        if !ranked {
            summary.extend([String::new(), String::new()]);
        }
        summary.push(score(table.mean()));
        lines.push(summary);

        let widths: Vec<usize> = (0..columns.len())
            .map(|col| lines.iter().map(|l| l[col].chars().count()).max().unwrap_or(0))
            .collect();

        let mut out = String::new();
        for line in &lines {
            let cells: Vec<String> = line
                .iter()
                .zip(columns)
                .zip(&widths)
                .map(|((cell, column), &width)| match (self.separator, column.justify) {
                    (Separator::Pretty, Justify::Left) => format!("{:<width$}", cell, width = width),
                    (Separator::Pretty, Justify::Right) => format!("{:>width$}", cell, width = width),
                    _ => cell.clone(),
                })
                .collect();
            out.push_str(&cells.join(self.separator.joiner()));
            out.push('\n');
        }
        out
    }

    /// Write every table to `<dir>/<metric>-scores.txt`.
    ///
    /// `dir` must not exist; it is created here.
    ///
    /// # Errors
    ///
    /// Invalid input if `dir` exists, IO errors otherwise.
    pub fn write_all(&self, tables: &ScoreTables, run_id: &str, dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        if dir.exists() {
            return Err(Error::invalid_input(format!(
                "output directory {} already exists",
                dir.display()
            )));
        }
        fs::create_dir_all(dir)?;

        let mut written = Vec::new();
        for table in tables.iter() {
            let path = dir.join(score_file_name(table));
            fs::write(&path, self.render(table, run_id))?;
            log::info!("wrote {} row(s) to {}", table.len(), path.display());
            written.push(path);
        }
        Ok(written)
    }
}

/// File name of a table: `<metric>-scores.txt`.
#[must_use]
pub fn score_file_name(table: &ScoreTable) -> String {
    format!("{}-scores.txt", table.metric().code())
}

impl fmt::Display for Separator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pretty => "pretty",
            Self::Tab => "tab",
            Self::Space => "space",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::{Metric, ScoreAggregator, ScoreRecord, TypeScores};

    fn tables() -> ScoreTables {
        let mut aggregator = ScoreAggregator::new();
        aggregator.extend(vec![
            ScoreRecord {
                document_id: "D1".into(),
                run_id: "runID".into(),
                gold_id: Some("E1".into()),
                system_id: Some("S1".into()),
                metric: Metric::ClusterV1,
                value: ScoreValue::Set(TypeScores::new(2.0 / 3.0, 1.0)),
            },
            ScoreRecord {
                document_id: "D1".into(),
                run_id: "runID".into(),
                gold_id: Some("E2".into()),
                system_id: None,
                metric: Metric::ClusterV1,
                value: ScoreValue::Set(TypeScores::default()),
            },
            ScoreRecord {
                document_id: "D1".into(),
                run_id: "runID".into(),
                gold_id: Some("m1".into()),
                system_id: Some("x1".into()),
                metric: Metric::MentionV2,
                value: ScoreValue::AveragePrecision(0.5),
            },
        ]);
        aggregator.finish()
    }

    #[test]
    fn test_pretty_layout() {
        let tables = tables();
        let text = ScorePrinter::new(Separator::Pretty).render(tables.get(Metric::ClusterV1).unwrap(), "runID");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "DocID   RunID GoldEntityID SystemEntityID   Prec Recall     F1");
        assert_eq!(lines[1], "D1      runID E1           S1             0.6667 1.0000 0.8000");
        assert_eq!(lines[2], "D1      runID E2           None           0.0000 0.0000 0.0000");
        assert_eq!(lines[3], "Summary runID                                           0.4000");
    }

    #[test]
    fn test_tab_layout() {
        let tables = tables();
        let text = ScorePrinter::new(Separator::Tab).render(tables.get(Metric::MentionV2).unwrap(), "runID");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "DocID\tRunID\tGoldMentionID\tSystemMentionID\tAveragePrecision");
        assert_eq!(lines[1], "D1\trunID\tm1\tx1\t0.5000");
        assert_eq!(lines[2], "Summary\trunID\t\t\t0.5000");
    }

    #[test]
    fn test_write_all_refuses_existing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let err = ScorePrinter::default().write_all(&tables(), "runID", dir.path()).unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn test_write_all_creates_six_files() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("scores");
        let written = ScorePrinter::default().write_all(&tables(), "runID", &out).unwrap();
        assert_eq!(written.len(), 6);
        assert!(out.join("cluster_v1-scores.txt").exists());
        assert!(out.join("mention_v3-scores.txt").exists());
    }
}
