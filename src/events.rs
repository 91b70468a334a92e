//! Structured audit and loader events.
//!
//! Every event has a stable code (`ALIGNMENT_INFO`, `AP_INFO`, …) and an
//! ordered list of fields. An [`EventCatalog`] maps codes to a log level and a
//! message template; [`EventLog`] renders events through the catalog and hands
//! them to the `log` facade under [`AUDIT_TARGET`].
//!
//! # Event specification files
//!
//! ```text
//! type     code               message
//! INFO     ALIGNMENT_INFO     {} aligned {} gold={} system={} similarity={}
//! WARNING  INVALID_CONFIDENCE invalid confidence {} at {}; using 1.0
//! ```
//!
//! The first line is a header. Each further line splits on whitespace into at
//! most three fields; `{}` in the template is replaced by the next field and
//! `{N}` by field `N`.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use log::Level;

use crate::mention::Side;
use crate::validate::ValidationIssue;
use crate::{Error, Result};

/// `log` target for all events.
pub const AUDIT_TARGET: &str = "typealign::audit";

/// Printed in place of an absent entity or value.
pub const NONE: &str = "None";

// =============================================================================
// Event
// =============================================================================

/// One auditable occurrence.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A gold or system entity and its counterpart for one metric.
    Alignment {
        /// Metric code
        metric: String,
        /// Document ID
        document: String,
        /// Gold entity, `None` when NULL-aligned
        gold: Option<String>,
        /// System entity, `None` when NULL-aligned
        system: Option<String>,
        /// Alignment similarity, `None` when NULL-aligned
        similarity: Option<usize>,
    },
    /// One rank of an Average Precision computation.
    AveragePrecisionStep {
        /// Metric code
        metric: String,
        /// Document ID
        document: String,
        /// Gold entity or mention
        gold: String,
        /// System entity or mention
        system: String,
        /// 1-based rank
        rank: usize,
        /// Type at this rank
        type_label: String,
        /// Whether the type is in the gold set
        correct: bool,
        /// Ranking weight
        weight: f64,
        /// Correct types up to and including this rank
        num_correct: usize,
        /// Running sum of precision at correct ranks
        sum_precision: f64,
    },
    /// A gold/system pair sharing at least one mention.
    Similarity {
        /// Metric (or stage) code
        metric: String,
        /// Document ID
        document: String,
        /// Gold entity
        gold: String,
        /// System entity
        system: String,
        /// Number of shared mention keys
        similarity: usize,
        /// Shared mention keys, rendered
        common_mentions: Vec<String>,
    },
    /// Raw and expanded types of one entity or mention.
    EntityTypes {
        /// Metric code
        metric: String,
        /// Gold or system
        side: Side,
        /// Document ID
        document: String,
        /// Entity or mention
        entity: String,
        /// Raw asserted labels
        raw: Vec<String>,
        /// Expanded labels
        expanded: Vec<String>,
    },
    /// A line whose column count does not match the schema.
    UnexpectedColumns {
        /// Expected column count
        expected: usize,
        /// Actual column count
        found: usize,
        /// `file:line`
        location: String,
    },
    /// A validation issue found while loading or validating.
    Validation {
        /// The issue
        issue: ValidationIssue,
        /// `file:line`
        location: String,
    },
}

fn opt<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map_or_else(|| NONE.to_string(), ToString::to_string)
}

impl Event {
    /// Stable event code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Alignment { .. } => "ALIGNMENT_INFO",
            Self::AveragePrecisionStep { .. } => "AP_INFO",
            Self::Similarity { .. } => "SIMILARITY_INFO",
            Self::EntityTypes { .. } => "ENTITY_TYPES_INFO",
            Self::UnexpectedColumns { .. } => "UNEXPECTED_NUM_COLUMNS",
            Self::Validation { issue, .. } => issue.code(),
        }
    }

    /// Ordered message fields.
    #[must_use]
    pub fn fields(&self) -> Vec<String> {
        match self {
            Self::Alignment {
                metric,
                document,
                gold,
                system,
                similarity,
            } => vec![
                metric.clone(),
                document.clone(),
                opt(gold),
                opt(system),
                opt(similarity),
            ],
            Self::AveragePrecisionStep {
                metric,
                document,
                gold,
                system,
                rank,
                type_label,
                correct,
                weight,
                num_correct,
                sum_precision,
            } => vec![
                metric.clone(),
                document.clone(),
                gold.clone(),
                system.clone(),
                rank.to_string(),
                type_label.clone(),
                if *correct { "RIGHT" } else { "WRONG" }.to_string(),
                format!("{}", weight),
                num_correct.to_string(),
                format!("{:.4}", sum_precision),
            ],
            Self::Similarity {
                metric,
                document,
                gold,
                system,
                similarity,
                common_mentions,
            } => vec![
                metric.clone(),
                document.clone(),
                gold.clone(),
                system.clone(),
                similarity.to_string(),
                common_mentions.join(";"),
            ],
            Self::EntityTypes {
                metric,
                side,
                document,
                entity,
                raw,
                expanded,
            } => vec![
                metric.clone(),
                side.label().to_string(),
                document.clone(),
                entity.clone(),
                raw.join(";"),
                expanded.join(";"),
            ],
            Self::UnexpectedColumns {
                expected,
                found,
                location,
            } => vec![expected.to_string(), found.to_string(), location.clone()],
            Self::Validation { issue, location } => vec![issue.to_string(), location.clone()],
        }
    }
}

// =============================================================================
// EventCatalog
// =============================================================================

/// Level and message template for one event code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSpec {
    /// Log level
    pub level: Level,
    /// Message template with `{}` / `{N}` placeholders
    pub template: String,
}

/// Codes every catalog must define.
pub const REQUIRED_CODES: &[&str] = &[
    "ALIGNMENT_INFO",
    "AP_INFO",
    "SIMILARITY_INFO",
    "ENTITY_TYPES_INFO",
];

const BUILTIN: &[(Level, &str, &str)] = &[
    (
        Level::Info,
        "ALIGNMENT_INFO",
        "{} in document {}: gold entity {} aligned to system entity {} (similarity: {})",
    ),
    (
        Level::Info,
        "AP_INFO",
        "{} in document {}: gold {} system {} rank={} type={} label={} weight={} num_correct={} sum_precision={}",
    ),
    (
        Level::Info,
        "SIMILARITY_INFO",
        "{} in document {}: gold entity {} and system entity {} share {} mention(s): {}",
    ),
    (
        Level::Info,
        "ENTITY_TYPES_INFO",
        "{} {} document {} entity {}: types={} expanded_types={}",
    ),
    (
        Level::Warn,
        "UNEXPECTED_NUM_COLUMNS",
        "expected {} columns, found {} at {}",
    ),
    (Level::Error, "NEGATIVE_OFFSET", "{} at {}"),
    (Level::Error, "IMPROPER_OFFSET_ORDER", "{} at {}"),
    (Level::Error, "SPAN_OFF_BOUNDARY", "{} at {}"),
    (Level::Error, "UNKNOWN_DOCUMENT", "{} at {}"),
    (Level::Error, "MALFORMED_SPAN", "{} at {}"),
    (Level::Warn, "INVALID_CONFIDENCE", "{} at {}"),
    (Level::Error, "INVALID_CONFIDENCE_ERROR", "{} at {}"),
    (Level::Error, "UNKNOWN_VALUE", "{} at {}"),
];

/// Maps event codes to levels and message templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventCatalog {
    specs: HashMap<String, EventSpec>,
}

impl Default for EventCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn parse_level(raw: &str) -> Option<Level> {
    match raw.to_ascii_uppercase().as_str() {
        "CRITICAL" | "ERROR" => Some(Level::Error),
        "WARNING" | "WARN" => Some(Level::Warn),
        "INFO" => Some(Level::Info),
        "DEBUG" => Some(Level::Debug),
        "TRACE" => Some(Level::Trace),
        _ => None,
    }
}

impl EventCatalog {
    /// The built-in specification.
    #[must_use]
    pub fn builtin() -> Self {
        let specs = BUILTIN
            .iter()
            .map(|&(level, code, template)| {
                (
                    code.to_string(),
                    EventSpec {
                        level,
                        template: template.to_string(),
                    },
                )
            })
            .collect();
        Self { specs }
    }

    /// Parse an event specification file.
    ///
    /// Codes missing from the file keep their built-in specification, except
    /// that the file must define every code in [`REQUIRED_CODES`].
    ///
    /// # Errors
    ///
    /// Configuration error on an empty file, an unknown level, a line with
    /// fewer than two fields, or a missing required code.
    pub fn parse(content: &str) -> Result<Self> {
        let mut lines = content.lines().enumerate();
        if lines.next().is_none() {
            return Err(Error::config("event specification is empty"));
        }

        let mut catalog = Self::builtin();
        let mut defined = Vec::new();
        for (idx, line) in lines {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let (level, rest) = line.split_once(char::is_whitespace).ok_or_else(|| {
                Error::config(format!(
                    "event specification line {}: expected 'type code message'",
                    idx + 1
                ))
            })?;
            let rest = rest.trim_start();
            let (code, template) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
            let level = parse_level(level).ok_or_else(|| {
                Error::config(format!(
                    "event specification line {}: unknown event type '{}' for {}",
                    idx + 1,
                    level,
                    code
                ))
            })?;
            let template = template.trim().to_string();
            defined.push(code.to_string());
            catalog
                .specs
                .insert(code.to_string(), EventSpec { level, template });
        }

        if let Some(missing) = REQUIRED_CODES
            .iter()
            .find(|code| !defined.iter().any(|d| d == *code))
        {
            return Err(Error::config(format!(
                "event specification does not define {}",
                missing
            )));
        }
        Ok(catalog)
    }

    /// Load an event specification file.
    ///
    /// # Errors
    ///
    /// Configuration error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "cannot read event specification {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::parse(&content)
    }

    /// Specification for `code`.
    #[must_use]
    pub fn spec(&self, code: &str) -> Option<&EventSpec> {
        self.specs.get(code)
    }

    /// Level and rendered `CODE - message` line for `event`.
    #[must_use]
    pub fn render(&self, event: &Event) -> (Level, String) {
        let code = event.code();
        let fields = event.fields();
        match self.specs.get(code) {
            Some(spec) => (
                spec.level,
                format!("{} - {}", code, fill_template(&spec.template, &fields)),
            ),
            None => (Level::Info, format!("{} - {}", code, fields.join(" "))),
        }
    }
}

/// Substitute `{}` (next field) and `{N}` (field N) placeholders.
fn fill_template(template: &str, fields: &[String]) -> String {
    let mut out = String::with_capacity(template.len() + 16 * fields.len());
    let mut next = 0usize;
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                let inner = &after[..close];
                let index = if inner.is_empty() {
                    let i = next;
                    next += 1;
                    Some(i)
                } else {
                    inner.parse::<usize>().ok()
                };
                match index.and_then(|i| fields.get(i)) {
                    Some(field) => out.push_str(field),
                    None => {
                        out.push('{');
                        out.push_str(inner);
                        out.push('}');
                    }
                }
                rest = &after[close + 1..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

// =============================================================================
// EventLog
// =============================================================================

/// Renders events through a catalog and counts warnings and errors.
///
/// Shareable across worker threads.
#[derive(Debug, Default)]
pub struct EventLog {
    catalog: EventCatalog,
    warnings: AtomicUsize,
    errors: AtomicUsize,
}

/// Warning and error counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventStats {
    /// Events recorded at warning level
    pub warnings: usize,
    /// Events recorded at error level
    pub errors: usize,
}

impl fmt::Display for EventStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} warning(s), {} error(s)", self.warnings, self.errors)
    }
}

impl EventLog {
    /// Create a log over `catalog`.
    #[must_use]
    pub fn new(catalog: EventCatalog) -> Self {
        Self {
            catalog,
            warnings: AtomicUsize::new(0),
            errors: AtomicUsize::new(0),
        }
    }

    /// The catalog in use.
    #[must_use]
    pub fn catalog(&self) -> &EventCatalog {
        &self.catalog
    }

    /// Whether an info-level audit event would reach a logger.
    ///
    /// Callers use this to skip building verbose events nobody will see.
    #[must_use]
    pub fn audit_enabled(&self) -> bool {
        log::log_enabled!(target: AUDIT_TARGET, Level::Info)
    }

    /// Record an event.
    pub fn record(&self, event: &Event) {
        let (level, message) = self.catalog.render(event);
        match level {
            Level::Error => {
                self.errors.fetch_add(1, Ordering::Relaxed);
            }
            Level::Warn => {
                self.warnings.fetch_add(1, Ordering::Relaxed);
            }
            _ => {}
        }
        log::log!(target: AUDIT_TARGET, level, "{}", message);
    }

    /// Counts so far.
    #[must_use]
    pub fn stats(&self) -> EventStats {
        EventStats {
            warnings: self.warnings.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_template() {
        let fields = vec!["a".to_string(), "b".to_string()];
        assert_eq!(fill_template("{} then {}", &fields), "a then b");
        assert_eq!(fill_template("{1} before {0}", &fields), "b before a");
        assert_eq!(fill_template("{} {} {}", &fields), "a b {}");
        assert_eq!(fill_template("open { brace", &fields), "open { brace");
    }

    #[test]
    fn test_alignment_event_prints_none() {
        let event = Event::Alignment {
            metric: "cluster_v1".into(),
            document: "D1".into(),
            gold: Some("E1".into()),
            system: None,
            similarity: None,
        };
        let (level, line) = EventCatalog::builtin().render(&event);
        assert_eq!(level, Level::Info);
        assert!(line.starts_with("ALIGNMENT_INFO - cluster_v1 in document D1"));
        assert!(line.contains("system entity None"));
    }

    #[test]
    fn test_parse_catalog_overrides_builtin() {
        let content = "type code message\n\
            INFO ALIGNMENT_INFO {0}|{1}|{2}|{3}|{4}\n\
            DEBUG AP_INFO ap\n\
            INFO SIMILARITY_INFO sim\n\
            INFO ENTITY_TYPES_INFO types\n";
        let catalog = EventCatalog::parse(content).unwrap();
        assert_eq!(catalog.spec("AP_INFO").unwrap().level, Level::Debug);
        // not in the file, kept from the built-in spec
        assert_eq!(catalog.spec("INVALID_CONFIDENCE").unwrap().level, Level::Warn);

        let event = Event::Alignment {
            metric: "m".into(),
            document: "d".into(),
            gold: Some("g".into()),
            system: Some("s".into()),
            similarity: Some(2),
        };
        assert_eq!(catalog.render(&event).1, "ALIGNMENT_INFO - m|d|g|s|2");
    }

    #[test]
    fn test_parse_catalog_rejects_unknown_level() {
        let err = EventCatalog::parse("type code message\nLOUD ALIGNMENT_INFO x\n").unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_parse_catalog_requires_audit_codes() {
        let err = EventCatalog::parse("type code message\nINFO ALIGNMENT_INFO x\n").unwrap_err();
        assert!(err.to_string().contains("AP_INFO"));
        assert!(EventCatalog::parse("").unwrap_err().is_config());
    }

    #[test]
    fn test_event_log_counts_levels() {
        let log = EventLog::default();
        log.record(&Event::UnexpectedColumns {
            expected: 8,
            found: 3,
            location: "gold.tab:4".into(),
        });
        log.record(&Event::Validation {
            issue: ValidationIssue::UnknownDocument {
                document_id: "D9".into(),
            },
            location: "gold.tab:5".into(),
        });
        assert_eq!(log.stats(), EventStats { warnings: 1, errors: 1 });
    }
}
