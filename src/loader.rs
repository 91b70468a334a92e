//! Annotation file loading.
//!
//! Gold annotations and system responses share one header-less,
//! tab-separated layout:
//!
//! | # | Column | Example |
//! |---|--------|---------|
//! | 1 | run ID | `runA` |
//! | 2 | mention ID | `m1` |
//! | 3 | mention string | `Obama` |
//! | 4 | mention span | `D1:10-15` |
//! | 5 | entity ID | `E1` |
//! | 6 | entity types | `PER.Politician;PER` |
//! | 7 | mention type | `NAM` |
//! | 8 | confidence | `0.9` |
//!
//! The loader trusts that the file passed validation but still refuses to
//! build a [`Mention`] from an inverted or negative span.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::events::{Event, EventLog};
use crate::mention::{parse_confidence, Mention, MentionKey, DEFAULT_CONFIDENCE};
use crate::validate::ValidationIssue;
use crate::{Error, Result};

/// Number of columns in an annotation line.
pub const COLUMNS: usize = 8;

static SPAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.*?):(-?\d+)-(-?\d+)$").expect("span pattern compiles"));

/// A span as written, before offset checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSpan {
    /// Everything before the offsets
    pub document_id: String,
    /// Begin offset, possibly negative
    pub begin: i64,
    /// End offset, possibly negative
    pub end: i64,
}

impl RawSpan {
    /// Turn into a mention key, checking order before sign.
    ///
    /// # Errors
    ///
    /// [`ValidationIssue::ImproperOffsetOrder`] or [`ValidationIssue::NegativeOffset`].
    pub fn into_key(self, raw: &str) -> std::result::Result<MentionKey, ValidationIssue> {
        if self.begin > self.end {
            return Err(ValidationIssue::ImproperOffsetOrder { span: raw.to_string() });
        }
        let begin = u64::try_from(self.begin).map_err(|_| ValidationIssue::NegativeOffset {
            which: "begin",
            span: raw.to_string(),
        })?;
        let end = u64::try_from(self.end).map_err(|_| ValidationIssue::NegativeOffset {
            which: "end",
            span: raw.to_string(),
        })?;
        Ok(MentionKey::new(self.document_id, begin, end))
    }
}

/// Parse `DOCID:BEGIN-END`.
#[must_use]
pub fn parse_span(raw: &str) -> Option<RawSpan> {
    let caps = SPAN.captures(raw.trim())?;
    Some(RawSpan {
        document_id: caps[1].to_string(),
        begin: caps[2].parse().ok()?,
        end: caps[3].parse().ok()?,
    })
}

/// Reads annotation files into [`Mention`]s.
#[derive(Debug)]
pub struct AnnotationLoader<'a> {
    events: &'a EventLog,
    type_separator: char,
    mention_types: BTreeSet<String>,
}

impl<'a> AnnotationLoader<'a> {
    /// Loader with `;` between types and no mention-type filter.
    #[must_use]
    pub fn new(events: &'a EventLog) -> Self {
        Self {
            events,
            type_separator: ';',
            mention_types: BTreeSet::new(),
        }
    }

    /// Separator between entity types in the types column.
    #[must_use]
    pub fn with_type_separator(mut self, separator: char) -> Self {
        self.type_separator = separator;
        self
    }

    /// Keep only lines whose mention type is listed. Empty keeps everything.
    #[must_use]
    pub fn with_mention_types<I, S>(mut self, mention_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mention_types = mention_types.into_iter().map(Into::into).collect();
        self
    }

    /// Load an annotation file.
    ///
    /// # Errors
    ///
    /// IO errors, and the fatal span errors of [`Self::parse_content`].
    pub fn load(&self, path: impl AsRef<Path>) -> Result<Vec<Mention>> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            Error::invalid_input(format!("cannot read annotations {}: {}", path.display(), e))
        })?;
        let mentions = self.parse_content(&path.display().to_string(), &content)?;
        log::info!("loaded {} mention(s) from {}", mentions.len(), path.display());
        Ok(mentions)
    }

    /// Parse annotation lines; `source` names the input in event locations.
    ///
    /// Lines with the wrong column count are logged and skipped. An invalid
    /// confidence is logged and replaced by `1.0`.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] for a malformed, inverted or negative span.
    pub fn parse_content(&self, source: &str, content: &str) -> Result<Vec<Mention>> {
        let mut mentions = Vec::new();
        for (idx, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let location = format!("{}:{}", source, idx + 1);
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() != COLUMNS {
                self.events.record(&Event::UnexpectedColumns {
                    expected: COLUMNS,
                    found: fields.len(),
                    location,
                });
                continue;
            }
            if let Some(mention) = self.parse_fields(&fields, &location)? {
                mentions.push(mention);
            }
        }
        Ok(mentions)
    }

    fn parse_fields(&self, fields: &[&str], location: &str) -> Result<Option<Mention>> {
        let [run_id, mention_id, text, span, entity_id, types, mention_type, confidence] = fields
        else {
            return Ok(None);
        };
        let mention_type = mention_type.trim();
        if !self.mention_types.is_empty() && !self.mention_types.contains(mention_type) {
            return Ok(None);
        }

        let key = parse_span(span)
            .ok_or_else(|| ValidationIssue::MalformedSpan {
                span: span.to_string(),
            })
            .and_then(|raw| raw.into_key(span))
            .map_err(|issue| Error::validation(location, issue))?;

        let confidence = match parse_confidence(confidence) {
            Ok(Some(value)) => value,
            _ => {
                self.events.record(&Event::Validation {
                    issue: ValidationIssue::InvalidConfidence {
                        value: confidence.trim().to_string(),
                    },
                    location: location.to_string(),
                });
                DEFAULT_CONFIDENCE
            }
        };

        let mention = Mention::new(mention_id.trim(), entity_id.trim(), key)
            .with_run_id(run_id.trim())
            .with_text(*text)
            .with_types(types.split(self.type_separator).map(str::trim))
            .with_mention_type(mention_type)
            .with_confidence(confidence);
        Ok(Some(mention))
    }
}
