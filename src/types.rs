//! Hierarchical entity types: expansion, ontology, and weighted type profiles.
//!
//! Type labels are period-delimited paths (`PER.Politician.Head`). Gold and
//! system type assertions are always compared in *expanded* space: a label
//! stands for itself plus every ancestor on its path, so a system that says
//! `PER.Politician` gets partial credit against a gold `PER.Politician.Head`.
//!
//! ```rust
//! use typealign::types::TypeExpander;
//!
//! let expander = TypeExpander::default();
//! let expanded = expander.expand("PER.Politician.Head");
//! assert!(expanded.contains("PER"));
//! assert!(expanded.contains("PER.Politician"));
//! assert!(expanded.contains("PER.Politician.Head"));
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::mention::Mention;
use crate::{Error, Result};

/// Default separator between levels of a hierarchical type label.
pub const DEFAULT_HIERARCHY_SEPARATOR: char = '.';

// =============================================================================
// TypeExpander
// =============================================================================

/// Expands a raw hierarchical type label into its ancestor closure.
///
/// Pure and idempotent. Labels with empty levels (`A..B`, `.A`, `A.`) are
/// treated as a single opaque level rather than rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeExpander {
    separator: char,
}

impl Default for TypeExpander {
    fn default() -> Self {
        Self::new(DEFAULT_HIERARCHY_SEPARATOR)
    }
}

impl TypeExpander {
    /// Create an expander splitting on `separator`.
    #[must_use]
    pub fn new(separator: char) -> Self {
        Self { separator }
    }

    /// The hierarchy separator.
    #[must_use]
    pub fn separator(&self) -> char {
        self.separator
    }

    /// Ordered ancestor chain of `raw`, root first, ending with the label itself.
    #[must_use]
    pub fn ancestors(&self, raw: &str) -> Vec<String> {
        let label = raw.trim();
        if label.is_empty() {
            return Vec::new();
        }

        let levels: Vec<&str> = label.split(self.separator).collect();
        if levels.iter().any(|level| level.is_empty()) {
            return vec![label.to_string()];
        }

        let mut chain = Vec::with_capacity(levels.len());
        let mut prefix = String::with_capacity(label.len());
        for (depth, level) in levels.iter().enumerate() {
            if depth > 0 {
                prefix.push(self.separator);
            }
            prefix.push_str(level);
            chain.push(prefix.clone());
        }
        chain
    }

    /// Set of all non-empty prefixes of `raw`, inclusive of the full label.
    #[must_use]
    pub fn expand(&self, raw: &str) -> BTreeSet<String> {
        self.ancestors(raw).into_iter().collect()
    }

    /// Union of the expansions of every label in `raws`.
    #[must_use]
    pub fn expand_all<'a, I>(&self, raws: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        raws.into_iter().flat_map(|raw| self.ancestors(raw)).collect()
    }
}

// =============================================================================
// Ontology
// =============================================================================

/// The read-only type inventory for a run.
///
/// An *open* ontology accepts any label and expands it lexically. A *closed*
/// ontology is loaded from a type list and refuses labels it does not know;
/// scoring against a closed ontology turns an unknown label into a
/// configuration error instead of a silently wrong expansion.
#[derive(Debug, Clone)]
pub struct Ontology {
    expander: TypeExpander,
    known: Option<BTreeSet<String>>,
}

impl Default for Ontology {
    fn default() -> Self {
        Self::open(TypeExpander::default())
    }
}

impl Ontology {
    /// An ontology that accepts every label.
    #[must_use]
    pub fn open(expander: TypeExpander) -> Self {
        Self {
            expander,
            known: None,
        }
    }

    /// A closed ontology over the given labels.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the list is empty or contains a blank label.
    pub fn from_types<I, S>(expander: TypeExpander, types: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut known = BTreeSet::new();
        for (idx, label) in types.into_iter().enumerate() {
            let label = label.as_ref().trim();
            if label.is_empty() {
                return Err(Error::config(format!(
                    "ontology entry {} is an empty type label",
                    idx + 1
                )));
            }
            known.insert(label.to_string());
        }
        if known.is_empty() {
            return Err(Error::config("ontology contains no types"));
        }
        Ok(Self {
            expander,
            known: Some(known),
        })
    }

    /// Parse a type list: one label per line, blank lines ignored.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if no label is present.
    pub fn parse(expander: TypeExpander, content: &str) -> Result<Self> {
        Self::from_types(
            expander,
            content.lines().map(str::trim).filter(|line| !line.is_empty()),
        )
    }

    /// Load a type list from disk.
    ///
    /// # Errors
    ///
    /// A missing or unreadable file is a configuration error, as is an empty one.
    pub fn load(expander: TypeExpander, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            Error::config(format!("cannot read ontology {}: {}", path.display(), e))
        })?;
        Self::parse(expander, &content)
            .map_err(|e| Error::config(format!("{}: {}", path.display(), e)))
    }

    /// The expander used by this ontology.
    #[must_use]
    pub fn expander(&self) -> &TypeExpander {
        &self.expander
    }

    /// Whether the ontology restricts labels to a known list.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.known.is_some()
    }

    /// Number of known labels (0 for an open ontology).
    #[must_use]
    pub fn len(&self) -> usize {
        self.known.as_ref().map_or(0, BTreeSet::len)
    }

    /// Whether a closed ontology has no labels (never true once constructed).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `label` is acceptable.
    #[must_use]
    pub fn contains(&self, label: &str) -> bool {
        match &self.known {
            Some(known) => known.contains(label.trim()),
            None => true,
        }
    }

    /// Expand `label`, refusing labels a closed ontology does not know.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an unknown label.
    pub fn expand(&self, label: &str) -> Result<BTreeSet<String>> {
        if !self.contains(label) {
            return Err(Error::config(format!(
                "type '{}' is not defined in the ontology",
                label.trim()
            )));
        }
        Ok(self.expander.expand(label))
    }
}

// =============================================================================
// TypeProfile
// =============================================================================

/// How types are weighted when ranking them for Average Precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeWeighting {
    /// Number of member mentions asserting the type
    Count,
    /// Sum of the confidences of member mentions asserting the type
    Confidence,
}

/// The type assertions of a group of mentions, in raw and expanded form.
///
/// Computed once when the group is built; immutable afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeProfile {
    raw: BTreeSet<String>,
    expanded: BTreeSet<String>,
    by_count: BTreeMap<String, usize>,
    by_confidence: BTreeMap<String, f64>,
}

impl TypeProfile {
    /// Build the profile of `mentions` under `ontology`.
    ///
    /// Each mention contributes once to every type in the expansion of its own
    /// asserted labels, whatever the number of labels implying that type.
    ///
    /// # Errors
    ///
    /// Propagates unknown-label errors from a closed ontology.
    pub fn from_mentions<'a, I>(mentions: I, ontology: &Ontology) -> Result<Self>
    where
        I: IntoIterator<Item = &'a Mention>,
    {
        let mut profile = Self::default();
        for mention in mentions {
            let mut mention_types = BTreeSet::new();
            for label in mention.types() {
                profile.raw.insert(label.clone());
                mention_types.extend(ontology.expand(label)?);
            }
            for expanded in mention_types {
                *profile.by_count.entry(expanded.clone()).or_insert(0) += 1;
                *profile.by_confidence.entry(expanded.clone()).or_insert(0.0) +=
                    mention.confidence();
                profile.expanded.insert(expanded);
            }
        }
        Ok(profile)
    }

    /// Raw asserted labels.
    #[must_use]
    pub fn raw(&self) -> &BTreeSet<String> {
        &self.raw
    }

    /// Expanded type set.
    #[must_use]
    pub fn expanded(&self) -> &BTreeSet<String> {
        &self.expanded
    }

    /// Mention count per expanded type.
    #[must_use]
    pub fn weight_by_count(&self) -> &BTreeMap<String, usize> {
        &self.by_count
    }

    /// Confidence mass per expanded type.
    #[must_use]
    pub fn weight_by_confidence(&self) -> &BTreeMap<String, f64> {
        &self.by_confidence
    }

    /// `(type, weight)` pairs under the given weighting, in label order.
    #[must_use]
    pub fn weights(&self, weighting: TypeWeighting) -> Vec<(&str, f64)> {
        match weighting {
            TypeWeighting::Count => self
                .by_count
                .iter()
                .map(|(label, &count)| (label.as_str(), count as f64))
                .collect(),
            TypeWeighting::Confidence => self
                .by_confidence
                .iter()
                .map(|(label, &mass)| (label.as_str(), mass))
                .collect(),
        }
    }

    /// Whether no type was asserted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.expanded.is_empty()
    }
}
