//! Annotation validation.
//!
//! Checks raw annotation lines against segment boundaries, an ontology type
//! list and the enumerated mention types, and writes the lines that pass.
//! Issues follow a fixed taxonomy ([`ValidationIssue`]); each has a
//! [`Severity`]. Warnings rewrite the line (an invalid confidence becomes
//! `1.0`), errors reject it.
//!
//! Every check of a line runs, so one pass reports every problem of the line.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use thiserror::Error as ThisError;

use crate::events::{Event, EventLog};
use crate::loader::{parse_span, RawSpan, COLUMNS};
use crate::mention::normalize_confidence;
use crate::types::Ontology;
use crate::{Error, Result};

/// Mention types accepted by the validator.
pub const ALLOWED_MENTION_TYPES: [&str; 3] = ["NAM", "NOM", "PRO"];

// =============================================================================
// Issues
// =============================================================================

/// How serious a validation issue is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// The line is kept, possibly rewritten
    Warning,
    /// The line is rejected
    Error,
}

/// A problem found in one annotation line.
#[derive(ThisError, Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    /// The span column is not `DOCID:BEGIN-END`.
    #[error("malformed mention span '{span}'")]
    MalformedSpan {
        /// Span as written
        span: String,
    },

    /// A span offset is below zero.
    #[error("negative {which} offset in span '{span}'")]
    NegativeOffset {
        /// `begin` or `end`
        which: &'static str,
        /// Span as written
        span: String,
    },

    /// The begin offset is past the end offset.
    #[error("improper offset order in span '{span}'")]
    ImproperOffsetOrder {
        /// Span as written
        span: String,
    },

    /// The span lies outside its document's boundary.
    #[error("span '{span}' lies outside document boundary {boundary}")]
    SpanOffBoundary {
        /// Span as written
        span: String,
        /// Boundary as `start-end`
        boundary: String,
    },

    /// No boundary is known for the document.
    #[error("unknown document '{document_id}'")]
    UnknownDocument {
        /// Document ID
        document_id: String,
    },

    /// A confidence outside `(0, 1]`, or missing; replaced by `1.0`.
    #[error("invalid confidence '{value}', using 1.0")]
    InvalidConfidence {
        /// Confidence as written
        value: String,
    },

    /// A confidence that is not a number.
    #[error("confidence '{value}' is not a number")]
    MalformedConfidence {
        /// Confidence as written
        value: String,
    },

    /// A value outside its enumeration.
    #[error("unknown {field} '{value}' (allowed: {allowed})")]
    UnknownValue {
        /// Column the value came from
        field: &'static str,
        /// Offending value
        value: String,
        /// Allowed values, comma-separated
        allowed: String,
    },
}

impl ValidationIssue {
    /// Severity of the issue.
    #[must_use]
    pub fn severity(&self) -> Severity {
        match self {
            Self::InvalidConfidence { .. } => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// Event code used when logging the issue.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::MalformedSpan { .. } => "MALFORMED_SPAN",
            Self::NegativeOffset { .. } => "NEGATIVE_OFFSET",
            Self::ImproperOffsetOrder { .. } => "IMPROPER_OFFSET_ORDER",
            Self::SpanOffBoundary { .. } => "SPAN_OFF_BOUNDARY",
            Self::UnknownDocument { .. } => "UNKNOWN_DOCUMENT",
            Self::InvalidConfidence { .. } => "INVALID_CONFIDENCE",
            Self::MalformedConfidence { .. } => "INVALID_CONFIDENCE_ERROR",
            Self::UnknownValue { .. } => "UNKNOWN_VALUE",
        }
    }
}

// =============================================================================
// Document boundaries
// =============================================================================

/// Character extent of a document: min segment start to max segment end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentBoundary {
    /// First character offset
    pub start: u64,
    /// Last character offset
    pub end: u64,
}

impl DocumentBoundary {
    /// Whether both offsets of a span lie inside the boundary.
    #[must_use]
    pub fn contains(&self, begin: i64, end: i64) -> bool {
        let inside = |offset: i64| {
            u64::try_from(offset).map_or(false, |o| self.start <= o && o <= self.end)
        };
        inside(begin) && inside(end)
    }
}

impl fmt::Display for DocumentBoundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Per-document boundaries read from a segment-boundary file.
#[derive(Debug, Clone, Default)]
pub struct DocumentBoundaries {
    bounds: BTreeMap<String, DocumentBoundary>,
}

impl DocumentBoundaries {
    /// Parse a tab-separated segment-boundary file.
    ///
    /// The header must name `document_id`, `start_char` and `end_char`; other
    /// columns are ignored.
    ///
    /// # Errors
    ///
    /// Configuration error on a missing header column, parse error on a bad row.
    pub fn parse(content: &str) -> Result<Self> {
        let mut lines = content.lines().enumerate();
        let header: Vec<&str> = match lines.next() {
            Some((_, line)) => line.split('\t').map(str::trim).collect(),
            None => return Err(Error::config("segment boundary file is empty")),
        };
        let column = |name: &str| {
            header
                .iter()
                .position(|h| *h == name)
                .ok_or_else(|| Error::config(format!("segment boundary header lacks '{}'", name)))
        };
        let doc_col = column("document_id")?;
        let start_col = column("start_char")?;
        let end_col = column("end_char")?;

        let mut bounds: BTreeMap<String, DocumentBoundary> = BTreeMap::new();
        for (idx, line) in lines {
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            let get = |col: usize| {
                fields.get(col).map(|f| f.trim()).ok_or_else(|| {
                    Error::parse(format!(
                        "segment boundary line {}: expected {} columns, found {}",
                        idx + 1,
                        header.len(),
                        fields.len()
                    ))
                })
            };
            let offset = |col: usize| -> Result<u64> {
                let raw = get(col)?;
                raw.parse().map_err(|_| {
                    Error::parse(format!(
                        "segment boundary line {}: '{}' is not an offset",
                        idx + 1,
                        raw
                    ))
                })
            };
            let document_id = get(doc_col)?.to_string();
            let (start, end) = (offset(start_col)?, offset(end_col)?);

            bounds
                .entry(document_id)
                .and_modify(|b| {
                    b.start = b.start.min(start);
                    b.end = b.end.max(end);
                })
                .or_insert(DocumentBoundary { start, end });
        }
        Ok(Self { bounds })
    }

    /// Load a segment-boundary file.
    ///
    /// # Errors
    ///
    /// Configuration error if the file cannot be read; see [`Self::parse`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "cannot read segment boundaries {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::parse(&content)
    }

    /// Boundary of `document_id`.
    #[must_use]
    pub fn get(&self, document_id: &str) -> Option<&DocumentBoundary> {
        self.bounds.get(document_id)
    }

    /// Number of documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bounds.len()
    }

    /// Whether no document is known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }
}

// =============================================================================
// Validator
// =============================================================================

/// Result of checking one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineCheck {
    /// The line to write (confidence possibly rewritten), `None` if rejected
    pub output: Option<String>,
    /// Issues found, in check order
    pub issues: Vec<ValidationIssue>,
}

/// Counts from one validation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Non-blank input lines
    pub lines_read: usize,
    /// Lines written to the output
    pub lines_written: usize,
    /// Warning-level issues
    pub warnings: usize,
    /// Error-level issues, including column-count mismatches
    pub errors: usize,
}

impl ValidationReport {
    /// Whether every line passed.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors == 0
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} line(s) read, {} written, {} warning(s), {} error(s)",
            self.lines_read, self.lines_written, self.warnings, self.errors
        )
    }
}

/// Checks annotation lines against boundaries, ontology and enumerations.
#[derive(Debug)]
pub struct Validator<'a> {
    boundaries: &'a DocumentBoundaries,
    ontology: &'a Ontology,
    events: &'a EventLog,
    type_separator: char,
}

impl<'a> Validator<'a> {
    /// Create a validator.
    #[must_use]
    pub fn new(
        boundaries: &'a DocumentBoundaries,
        ontology: &'a Ontology,
        events: &'a EventLog,
    ) -> Self {
        Self {
            boundaries,
            ontology,
            events,
            type_separator: ';',
        }
    }

    /// Separator between entity types in the types column.
    #[must_use]
    pub fn with_type_separator(mut self, separator: char) -> Self {
        self.type_separator = separator;
        self
    }

    fn check_span(&self, raw: &str, issues: &mut Vec<ValidationIssue>) {
        let Some(RawSpan {
            document_id,
            begin,
            end,
        }) = parse_span(raw)
        else {
            issues.push(ValidationIssue::MalformedSpan { span: raw.to_string() });
            return;
        };
        let Some(boundary) = self.boundaries.get(&document_id) else {
            issues.push(ValidationIssue::UnknownDocument { document_id });
            return;
        };
        if begin > end {
            issues.push(ValidationIssue::ImproperOffsetOrder { span: raw.to_string() });
            return;
        }
        for (which, offset) in [("begin", begin), ("end", end)] {
            if offset < 0 {
                issues.push(ValidationIssue::NegativeOffset {
                    which,
                    span: raw.to_string(),
                });
                return;
            }
        }
        if !boundary.contains(begin, end) {
            issues.push(ValidationIssue::SpanOffBoundary {
                span: raw.to_string(),
                boundary: boundary.to_string(),
            });
        }
    }

    fn check_types(&self, raw: &str, issues: &mut Vec<ValidationIssue>) {
        let mut labels: Vec<&str> = raw.split(self.type_separator).map(str::trim).collect();
        labels.sort_unstable();
        if let Some(unknown) = labels.iter().find(|label| !self.ontology.contains(label)) {
            issues.push(ValidationIssue::UnknownValue {
                field: "entity_type",
                value: (*unknown).to_string(),
                allowed: format!("{} ontology types", self.ontology.len()),
            });
        }
    }

    /// Check one line without logging.
    ///
    /// Returns `None` when the column count is wrong.
    #[must_use]
    pub fn check_line(&self, line: &str) -> Option<LineCheck> {
        let mut fields: Vec<String> = line.split('\t').map(str::to_string).collect();
        if fields.len() != COLUMNS {
            return None;
        }
        let mut issues = Vec::new();

        self.check_span(&fields[3], &mut issues);
        self.check_types(&fields[5], &mut issues);

        let mention_type = fields[6].trim();
        if !ALLOWED_MENTION_TYPES.contains(&mention_type) {
            issues.push(ValidationIssue::UnknownValue {
                field: "mention_type",
                value: mention_type.to_string(),
                allowed: ALLOWED_MENTION_TYPES.join(", "),
            });
        }

        let confidence = fields[7].trim().to_string();
        match confidence.parse::<f64>() {
            Ok(value) if normalize_confidence(value).is_some() => {}
            Ok(_) => {
                issues.push(ValidationIssue::InvalidConfidence { value: confidence });
                fields[7] = "1.0".to_string();
            }
            Err(_) => issues.push(ValidationIssue::MalformedConfidence { value: confidence }),
        }

        let rejected = issues.iter().any(|i| i.severity() == Severity::Error);
        Some(LineCheck {
            output: (!rejected).then(|| fields.join("\t")),
            issues,
        })
    }

    /// Validate `content`, logging every issue, and return the accepted lines.
    ///
    /// `source` names the input in event locations (`source:line`).
    pub fn validate_str(&self, source: &str, content: &str) -> (String, ValidationReport) {
        let mut report = ValidationReport::default();
        let mut output = String::with_capacity(content.len());

        for (idx, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            report.lines_read += 1;
            let location = format!("{}:{}", source, idx + 1);

            let Some(check) = self.check_line(line) else {
                report.errors += 1;
                self.events.record(&Event::UnexpectedColumns {
                    expected: COLUMNS,
                    found: line.split('\t').count(),
                    location,
                });
                continue;
            };
            for issue in check.issues {
                match issue.severity() {
                    Severity::Warning => report.warnings += 1,
                    Severity::Error => report.errors += 1,
                }
                self.events.record(&Event::Validation {
                    issue,
                    location: location.clone(),
                });
            }
            if let Some(line) = check.output {
                report.lines_written += 1;
                output.push_str(&line);
                output.push('\n');
            }
        }
        (output, report)
    }

    /// Validate `input` and write accepted lines to `output`.
    ///
    /// # Errors
    ///
    /// Invalid input if `output` already exists; IO errors otherwise.
    pub fn validate_file(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
    ) -> Result<ValidationReport> {
        let (input, output) = (input.as_ref(), output.as_ref());
        if output.exists() {
            return Err(Error::invalid_input(format!(
                "output path {} already exists",
                output.display()
            )));
        }
        let content = fs::read_to_string(input)?;
        let (accepted, report) = self.validate_str(&input.display().to_string(), &content);
        fs::write(output, accepted)?;
        log::info!("validated {}: {}", input.display(), report);
        Ok(report)
    }
}
