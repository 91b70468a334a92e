//! Entity clusters and per-document grouping.
//!
//! A cluster is the set of mentions one side assigns to the same entity within
//! a document. Everything the scorer needs from it (identity keys, weighted
//! type profile, per-key mention units) is derived once at construction.

use std::collections::{BTreeMap, BTreeSet};

use crate::mention::{Mention, MentionKey, Side};
use crate::types::{Ontology, TypeProfile};
use crate::Result;

// =============================================================================
// MentionUnit
// =============================================================================

/// All entries of one cluster sharing a mention key.
///
/// This is the unit scored by the mention-level metrics. Normally it holds a
/// single annotation line; repeated lines for the same span are merged.
#[derive(Debug, Clone)]
pub struct MentionUnit {
    id: String,
    key: MentionKey,
    profile: TypeProfile,
}

impl MentionUnit {
    /// Smallest mention ID among the merged entries.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Shared identity key.
    #[must_use]
    pub fn key(&self) -> &MentionKey {
        &self.key
    }

    /// Type assertions of the merged entries.
    #[must_use]
    pub fn profile(&self) -> &TypeProfile {
        &self.profile
    }
}

// =============================================================================
// EntityCluster
// =============================================================================

/// An entity cluster on one side of one document.
#[derive(Debug, Clone)]
pub struct EntityCluster {
    id: String,
    side: Side,
    document_id: String,
    mentions: Vec<Mention>,
    keys: BTreeSet<MentionKey>,
    profile: TypeProfile,
    units: BTreeMap<MentionKey, MentionUnit>,
}

impl EntityCluster {
    /// Build a cluster and its derived attributes.
    ///
    /// # Errors
    ///
    /// Propagates unknown-type errors from a closed ontology.
    pub fn new(
        id: impl Into<String>,
        side: Side,
        document_id: impl Into<String>,
        mentions: Vec<Mention>,
        ontology: &Ontology,
    ) -> Result<Self> {
        let keys: BTreeSet<MentionKey> = mentions.iter().map(|m| m.key().clone()).collect();
        let profile = TypeProfile::from_mentions(&mentions, ontology)?;

        let mut by_key: BTreeMap<&MentionKey, Vec<&Mention>> = BTreeMap::new();
        for mention in &mentions {
            by_key.entry(mention.key()).or_default().push(mention);
        }
        let mut units = BTreeMap::new();
        for (key, entries) in by_key {
            let id = entries
                .iter()
                .map(|m| m.mention_id())
                .min()
                .unwrap_or_default()
                .to_string();
            let unit = MentionUnit {
                id,
                key: key.clone(),
                profile: TypeProfile::from_mentions(entries.iter().copied(), ontology)?,
            };
            units.insert(key.clone(), unit);
        }

        Ok(Self {
            id: id.into(),
            side,
            document_id: document_id.into(),
            mentions,
            keys,
            profile,
            units,
        })
    }

    /// Cluster ID (side-local namespace).
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Which side the cluster comes from.
    #[must_use]
    pub fn side(&self) -> Side {
        self.side
    }

    /// Document the cluster belongs to.
    #[must_use]
    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    /// Member mentions in load order.
    #[must_use]
    pub fn mentions(&self) -> &[Mention] {
        &self.mentions
    }

    /// Identity keys of member mentions.
    #[must_use]
    pub fn mention_keys(&self) -> &BTreeSet<MentionKey> {
        &self.keys
    }

    /// Cluster-level type profile.
    #[must_use]
    pub fn profile(&self) -> &TypeProfile {
        &self.profile
    }

    /// Mention units, one per distinct key, in key order.
    pub fn units(&self) -> impl Iterator<Item = &MentionUnit> {
        self.units.values()
    }

    /// The mention unit at `key`, if any.
    #[must_use]
    pub fn unit(&self, key: &MentionKey) -> Option<&MentionUnit> {
        self.units.get(key)
    }

    /// Keys present in both clusters, in key order.
    #[must_use]
    pub fn common_keys(&self, other: &EntityCluster) -> Vec<MentionKey> {
        self.keys.intersection(&other.keys).cloned().collect()
    }

    /// Number of shared mention keys. Symmetric.
    #[must_use]
    pub fn similarity(&self, other: &EntityCluster) -> usize {
        self.keys.intersection(&other.keys).count()
    }

    /// Number of distinct mention keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the cluster has no mentions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

// =============================================================================
// DocumentClusters
// =============================================================================

/// Gold and system clusters of one document, each side sorted by cluster ID.
#[derive(Debug, Clone)]
pub struct DocumentClusters {
    /// Document ID
    pub document_id: String,
    /// Gold clusters
    pub gold: Vec<EntityCluster>,
    /// System clusters
    pub system: Vec<EntityCluster>,
}

impl DocumentClusters {
    /// Clusters on the given side.
    #[must_use]
    pub fn side(&self, side: Side) -> &[EntityCluster] {
        match side {
            Side::Gold => &self.gold,
            Side::System => &self.system,
        }
    }
}

type Grouped = BTreeMap<String, BTreeMap<String, Vec<Mention>>>;

fn group(mentions: Vec<Mention>) -> Grouped {
    let mut grouped: Grouped = BTreeMap::new();
    for mention in mentions {
        grouped
            .entry(mention.document_id().to_string())
            .or_default()
            .entry(mention.cluster_id().to_string())
            .or_default()
            .push(mention);
    }
    grouped
}

fn build_side(
    side: Side,
    document_id: &str,
    clusters: BTreeMap<String, Vec<Mention>>,
    ontology: &Ontology,
) -> Result<Vec<EntityCluster>> {
    clusters
        .into_iter()
        .map(|(cluster_id, mentions)| {
            EntityCluster::new(cluster_id, side, document_id, mentions, ontology)
        })
        .collect()
}

/// Group gold and system mentions into per-document clusters.
///
/// Covers the union of documents on either side, sorted by document ID, so a
/// document the gold standard lacks still surfaces its system clusters.
///
/// # Errors
///
/// Propagates unknown-type errors from a closed ontology.
pub fn group_documents(
    gold: Vec<Mention>,
    system: Vec<Mention>,
    ontology: &Ontology,
) -> Result<Vec<DocumentClusters>> {
    let mut gold = group(gold);
    let mut system = group(system);

    let document_ids: BTreeSet<String> = gold.keys().chain(system.keys()).cloned().collect();

    document_ids
        .into_iter()
        .map(|document_id| {
            let gold_clusters = gold.remove(&document_id).unwrap_or_default();
            let system_clusters = system.remove(&document_id).unwrap_or_default();
            Ok(DocumentClusters {
                gold: build_side(Side::Gold, &document_id, gold_clusters, ontology)?,
                system: build_side(Side::System, &document_id, system_clusters, ontology)?,
                document_id,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(id: &str, cluster: &str, doc: &str, begin: u64, types: &[&str]) -> Mention {
        Mention::new(id, cluster, MentionKey::new(doc, begin, begin + 2))
            .with_types(types.iter().copied())
    }

    #[test]
    fn test_grouping_by_document_and_cluster() {
        let gold = vec![
            m("g1", "E2", "D1", 0, &["PER"]),
            m("g2", "E1", "D1", 5, &["ORG"]),
            m("g3", "E1", "D2", 0, &["LOC"]),
        ];
        let system = vec![m("s1", "S1", "D3", 0, &["PER"])];
        let docs = group_documents(gold, system, &Ontology::default()).unwrap();

        let ids: Vec<&str> = docs.iter().map(|d| d.document_id.as_str()).collect();
        assert_eq!(ids, vec!["D1", "D2", "D3"]);
        let d1_gold: Vec<&str> = docs[0].gold.iter().map(EntityCluster::id).collect();
        assert_eq!(d1_gold, vec!["E1", "E2"]);
        assert!(docs[0].system.is_empty());
        assert!(docs[2].gold.is_empty());
        assert_eq!(docs[2].system.len(), 1);
    }

    #[test]
    fn test_similarity_is_symmetric_key_overlap() {
        let ontology = Ontology::default();
        let a = EntityCluster::new(
            "E1",
            Side::Gold,
            "D1",
            vec![m("m1", "E1", "D1", 0, &[]), m("m2", "E1", "D1", 4, &[])],
            &ontology,
        )
        .unwrap();
        let b = EntityCluster::new(
            "S1",
            Side::System,
            "D1",
            vec![m("x", "S1", "D1", 0, &[]), m("y", "S1", "D1", 8, &[])],
            &ontology,
        )
        .unwrap();
        assert_eq!(a.similarity(&b), 1);
        assert_eq!(b.similarity(&a), 1);
        assert_eq!(a.common_keys(&b), vec![MentionKey::new("D1", 0, 2)]);
    }

    #[test]
    fn test_duplicate_spans_merge_into_one_unit() {
        let cluster = EntityCluster::new(
            "E1",
            Side::Gold,
            "D1",
            vec![
                m("m9", "E1", "D1", 0, &["PER.Politician"]),
                m("m3", "E1", "D1", 0, &["PER.Athlete"]),
            ],
            &Ontology::default(),
        )
        .unwrap();
        assert_eq!(cluster.len(), 1);
        let unit = cluster.unit(&MentionKey::new("D1", 0, 2)).unwrap();
        assert_eq!(unit.id(), "m3");
        assert_eq!(unit.profile().expanded().len(), 3);
        assert_eq!(unit.profile().weight_by_count()["PER"], 2);
    }
}
