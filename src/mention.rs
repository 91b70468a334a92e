//! Mentions and their identity keys.
//!
//! Gold and system mention IDs live in independent namespaces, so mention
//! identity across the two sides is decided by [`MentionKey`]: the document
//! plus the exact character span.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Confidence assumed when a mention carries none, or an invalid one.
pub const DEFAULT_CONFIDENCE: f64 = 1.0;

/// Which annotation an entity or mention comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Side {
    /// Human-curated reference
    Gold,
    /// System output under evaluation
    System,
}

impl Side {
    /// Upper-case label used in audit events.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Gold => "GOLD",
            Self::System => "SYSTEM",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Canonical identity of a mention: `(document, begin, end)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MentionKey {
    /// Document the span belongs to
    pub document_id: String,
    /// Start character offset
    pub begin: u64,
    /// End character offset
    pub end: u64,
}

impl MentionKey {
    /// Create a key. Callers guarantee `begin <= end`.
    #[must_use]
    pub fn new(document_id: impl Into<String>, begin: u64, end: u64) -> Self {
        debug_assert!(begin <= end, "mention span must not be inverted");
        Self {
            document_id: document_id.into(),
            begin,
            end,
        }
    }

    /// Span length in characters.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.end - self.begin
    }

    /// Whether the span is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.begin == self.end
    }
}

impl fmt::Display for MentionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}", self.document_id, self.begin, self.end)
    }
}

/// A single validated annotation line.
///
/// Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mention {
    run_id: String,
    mention_id: String,
    text: String,
    key: MentionKey,
    cluster_id: String,
    types: Vec<String>,
    mention_type: String,
    confidence: f64,
}

impl Mention {
    /// Create a mention with no types and default confidence.
    #[must_use]
    pub fn new(mention_id: impl Into<String>, cluster_id: impl Into<String>, key: MentionKey) -> Self {
        Self {
            run_id: String::new(),
            mention_id: mention_id.into(),
            text: String::new(),
            key,
            cluster_id: cluster_id.into(),
            types: Vec::new(),
            mention_type: String::new(),
            confidence: DEFAULT_CONFIDENCE,
        }
    }

    /// Set asserted raw type labels.
    #[must_use]
    pub fn with_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.types = types
            .into_iter()
            .map(Into::into)
            .filter(|t: &String| !t.trim().is_empty())
            .collect();
        self
    }

    /// Set confidence, falling back to the default outside `(0, 1]`.
    #[must_use]
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = normalize_confidence(confidence).unwrap_or(DEFAULT_CONFIDENCE);
        self
    }

    /// Set the run ID column.
    #[must_use]
    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = run_id.into();
        self
    }

    /// Set the surface text.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set the mention type (`NAM`, `NOM`, `PRO`).
    #[must_use]
    pub fn with_mention_type(mut self, mention_type: impl Into<String>) -> Self {
        self.mention_type = mention_type.into();
        self
    }

    /// Run ID column as read.
    #[must_use]
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Mention ID (side-local namespace).
    #[must_use]
    pub fn mention_id(&self) -> &str {
        &self.mention_id
    }

    /// Surface text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Identity key.
    #[must_use]
    pub fn key(&self) -> &MentionKey {
        &self.key
    }

    /// Document ID.
    #[must_use]
    pub fn document_id(&self) -> &str {
        &self.key.document_id
    }

    /// Entity cluster ID (side-local namespace).
    #[must_use]
    pub fn cluster_id(&self) -> &str {
        &self.cluster_id
    }

    /// Raw asserted type labels.
    #[must_use]
    pub fn types(&self) -> &[String] {
        &self.types
    }

    /// Mention type.
    #[must_use]
    pub fn mention_type(&self) -> &str {
        &self.mention_type
    }

    /// Confidence in `(0, 1]`.
    #[must_use]
    pub fn confidence(&self) -> f64 {
        self.confidence
    }
}

/// Accept a confidence only if it lies in `(0, 1]`.
#[must_use]
pub fn normalize_confidence(value: f64) -> Option<f64> {
    (value > 0.0 && value <= 1.0).then_some(value)
}

/// Parse a confidence column.
///
/// `Ok(Some(c))` for a valid value, `Ok(None)` for a number outside `(0, 1]`
/// (recoverable).
///
/// # Errors
///
/// Parse error when the text is not a number at all.
pub fn parse_confidence(raw: &str) -> Result<Option<f64>> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| Error::parse(format!("confidence '{}' is not a number", raw.trim())))?;
    Ok(normalize_confidence(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_display_and_order() {
        let a = MentionKey::new("D1", 0, 4);
        let b = MentionKey::new("D1", 5, 9);
        assert_eq!(a.to_string(), "D1:0-4");
        assert!(a < b);
        assert_eq!(b.len(), 4);
    }

    #[test]
    fn test_identity_ignores_ids() {
        let gold = Mention::new("g-7", "G1", MentionKey::new("D1", 3, 9));
        let system = Mention::new("s-1", "S4", MentionKey::new("D1", 3, 9));
        assert_eq!(gold.key(), system.key());
    }

    #[test]
    fn test_confidence_defaults() {
        let key = MentionKey::new("D1", 0, 1);
        assert_eq!(Mention::new("m", "e", key.clone()).confidence(), 1.0);
        assert_eq!(Mention::new("m", "e", key.clone()).with_confidence(0.0).confidence(), 1.0);
        assert_eq!(Mention::new("m", "e", key.clone()).with_confidence(1.5).confidence(), 1.0);
        assert_eq!(Mention::new("m", "e", key).with_confidence(0.25).confidence(), 0.25);
    }

    #[test]
    fn test_parse_confidence() {
        assert_eq!(parse_confidence("0.5").unwrap(), Some(0.5));
        assert_eq!(parse_confidence(" 1.0 ").unwrap(), Some(1.0));
        assert_eq!(parse_confidence("0").unwrap(), None);
        assert_eq!(parse_confidence("-2").unwrap(), None);
        let err = parse_confidence("high").unwrap_err();
        assert!(matches!(err, Error::Parse(_)), "{:?}", err);
        assert!(err.to_string().contains("high"));
        assert!(parse_confidence("").is_err());
    }

    #[test]
    fn test_blank_types_dropped() {
        let m = Mention::new("m", "e", MentionKey::new("D", 0, 1)).with_types(["PER", " ", ""]);
        assert_eq!(m.types(), &["PER".to_string()]);
    }
}
