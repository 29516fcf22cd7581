use serde::de::{Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;

/// Field name -> field value combination that distinguishes a group from its siblings.
pub type Identity = BTreeMap<String, String>;

/// Contents of `stats.json`: groupings keyed by the fields they were grouped on.
///
/// Some groupings may have been filtered by the producer. Nothing in the file
/// says so, so every total here should be treated as possibly partial.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorpusStats {
    #[serde(deserialize_with = "unique_keys")]
    pub groupings: BTreeMap<String, CorpusStatsGrouping>,
}

impl CorpusStats {
    pub fn new() -> Self { Self::default() }

    pub fn insert(&mut self, name: impl Into<String>, grouping: CorpusStatsGrouping) -> Option<CorpusStatsGrouping> {
        self.groupings.insert(name.into(), grouping)
    }

    pub fn get(&self, name: &str) -> Option<&CorpusStatsGrouping> { self.groupings.get(name) }

    pub fn iter(&self) -> btree_map::Iter<'_, String, CorpusStatsGrouping> { self.groupings.iter() }

    pub fn len(&self) -> usize { self.groupings.len() }

    pub fn is_empty(&self) -> bool { self.groupings.is_empty() }
}

impl<'a> IntoIterator for &'a CorpusStats {
    type Item = (&'a String, &'a CorpusStatsGrouping);
    type IntoIter = btree_map::Iter<'a, String, CorpusStatsGrouping>;

    fn into_iter(self) -> Self::IntoIter { self.groupings.iter() }
}

/// One way of partitioning the corpus: totals plus the groups in producer order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusStatsGrouping {
    pub docs: u64,
    pub tokens: u64,
    pub groups: Vec<CorpusStatsGroup>,
}

impl CorpusStatsGrouping {
    /// Sum of `(docs, tokens)` over the top-level groups.
    pub fn child_totals(&self) -> (u64, u64) { sum_totals(&self.groups) }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusStatsGroup {
    #[serde(deserialize_with = "unique_keys")]
    pub identity: Identity,
    pub docs: u64,
    pub tokens: u64,
    /// Present only when this group is itself subdivided.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<CorpusStatsGroup>>,
}

impl CorpusStatsGroup {
    pub fn new(identity: Identity, docs: u64, tokens: u64) -> Self {
        Self { identity, docs, tokens, groups: None }
    }

    pub fn with_groups(mut self, groups: Vec<CorpusStatsGroup>) -> Self {
        self.groups = Some(groups);
        self
    }

    pub fn is_leaf(&self) -> bool { self.groups.is_none() }

    /// Children of this group, empty when it is not subdivided.
    pub fn children(&self) -> &[CorpusStatsGroup] { self.groups.as_deref().unwrap_or(&[]) }

    /// `None` when the group is not subdivided.
    pub fn child_totals(&self) -> Option<(u64, u64)> { self.groups.as_deref().map(sum_totals) }

    /// Levels of nesting below this group; a leaf has depth 0.
    pub fn depth(&self) -> usize {
        match &self.groups {
            None => 0,
            Some(children) => 1 + children.iter().map(|c| c.depth()).max().unwrap_or(0),
        }
    }

    pub fn label(&self) -> String { identity_label(&self.identity) }
}

/// Alternate representation where each group carries a plain string identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusStatsNestedGrouping {
    pub docs: u64,
    pub tokens: u64,
    pub groups: Vec<CorpusStatsNestedGroup>,
}

/// Inner groups terminate here: they never carry `groups` of their own.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusStatsNestedGroup {
    pub identity: String,
    pub groups: Vec<CorpusStatsGroup>,
}

impl CorpusStatsNestedGroup {
    pub fn docs(&self) -> u64 { sum_totals(&self.groups).0 }
    pub fn tokens(&self) -> u64 { sum_totals(&self.groups).1 }
}

/// Renders an identity as `field=value, field=value` in field order.
pub fn identity_label(identity: &Identity) -> String {
    identity
        .iter()
        .map(|(field, value)| format!("{field}={value}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Deserialize a string-keyed map, failing on a repeated key instead of keeping the last value.
fn unique_keys<'de, D, V>(deserializer: D) -> Result<BTreeMap<String, V>, D::Error>
where
    D: Deserializer<'de>,
    V: Deserialize<'de>,
{
    struct UniqueKeys<V>(PhantomData<V>);

    impl<'de, V: Deserialize<'de>> Visitor<'de> for UniqueKeys<V> {
        type Value = BTreeMap<String, V>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map with unique string keys")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
            let mut map = BTreeMap::new();
            while let Some((key, value)) = access.next_entry::<String, V>()? {
                match map.entry(key) {
                    btree_map::Entry::Occupied(e) => {
                        return Err(serde::de::Error::custom(format!("duplicate key {:?}", e.key())));
                    }
                    btree_map::Entry::Vacant(e) => {
                        e.insert(value);
                    }
                }
            }
            Ok(map)
        }
    }

    deserializer.deserialize_map(UniqueKeys(PhantomData))
}

pub(crate) fn sum_totals(groups: &[CorpusStatsGroup]) -> (u64, u64) {
    groups.iter().fold((0u64, 0u64), |(docs, tokens), g| {
        (docs.saturating_add(g.docs), tokens.saturating_add(g.tokens))
    })
}
