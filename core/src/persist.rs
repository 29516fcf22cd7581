use crate::error::{Result, StatsError};
use crate::{CorpusStats, CorpusStatsNestedGrouping};
use std::fs::{create_dir_all, File};
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};

pub const STATS_FILE: &str = "stats.json";

pub struct StatsPaths {
    pub root: PathBuf,
}

impl StatsPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    pub fn stats(&self) -> PathBuf { self.root.join(STATS_FILE) }
}

pub fn decode(json: &str) -> Result<CorpusStats> {
    serde_json::from_str(json).map_err(StatsError::from_decode)
}

pub fn decode_reader<R: Read>(reader: R) -> Result<CorpusStats> {
    serde_json::from_reader(reader).map_err(StatsError::from_decode)
}

/// Decode the nested representation, rejecting inner groups that are subdivided further.
pub fn decode_nested(json: &str) -> Result<CorpusStatsNestedGrouping> {
    let nested: CorpusStatsNestedGrouping = serde_json::from_str(json).map_err(StatsError::from_decode)?;
    for (i, group) in nested.groups.iter().enumerate() {
        if let Some(j) = group.groups.iter().position(|g| g.groups.is_some()) {
            return Err(StatsError::malformed(format!(
                "groups[{i}].groups[{j}] is subdivided; nested groupings terminate one level deep"
            )));
        }
    }
    Ok(nested)
}

pub fn encode(stats: &CorpusStats) -> Result<String> {
    serde_json::to_string_pretty(stats).map_err(StatsError::Encode)
}

pub fn encode_nested(nested: &CorpusStatsNestedGrouping) -> Result<String> {
    serde_json::to_string_pretty(nested).map_err(StatsError::Encode)
}

pub fn save_stats(paths: &StatsPaths, stats: &CorpusStats) -> Result<()> {
    create_dir_all(&paths.root)?;
    save_stats_file(paths.stats(), stats)
}

pub fn save_stats_file<P: AsRef<Path>>(path: P, stats: &CorpusStats) -> Result<()> {
    let mut f = File::create(path.as_ref())?;
    let json = encode(stats)?;
    f.write_all(json.as_bytes())?;
    tracing::debug!(path = %path.as_ref().display(), groupings = stats.len(), "saved stats");
    Ok(())
}

pub fn load_stats(paths: &StatsPaths) -> Result<CorpusStats> {
    load_stats_file(paths.stats())
}

pub fn load_stats_file<P: AsRef<Path>>(path: P) -> Result<CorpusStats> {
    let f = File::open(path.as_ref())?;
    let stats = decode_reader(BufReader::new(f))?;
    tracing::debug!(path = %path.as_ref().display(), groupings = stats.len(), "loaded stats");
    Ok(stats)
}

pub fn load_nested_file<P: AsRef<Path>>(path: P) -> Result<CorpusStatsNestedGrouping> {
    let mut f = File::open(path.as_ref())?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    decode_nested(&buf)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::{CorpusStatsGroup, CorpusStatsGrouping, CorpusStatsNestedGroup, Identity};
    use proptest::prelude::*;
    use serde_json::Value;

    fn identity() -> impl Strategy<Value = Identity> {
        prop::collection::btree_map("[a-z_]{1,8}", "[a-zA-Z0-9 _\\-\"é]{0,12}", 0..4)
    }

    fn leaf_group() -> impl Strategy<Value = CorpusStatsGroup> {
        (identity(), any::<u64>(), any::<u64>()).prop_map(|(id, docs, tokens)| CorpusStatsGroup::new(id, docs, tokens))
    }

    /// Groups nested up to three levels; an empty child list is kept distinct from none.
    fn group() -> impl Strategy<Value = CorpusStatsGroup> {
        leaf_group().prop_recursive(3, 32, 4, |inner| {
            (leaf_group(), prop::collection::vec(inner, 0..4)).prop_map(|(g, children)| g.with_groups(children))
        })
    }

    fn grouping() -> impl Strategy<Value = CorpusStatsGrouping> {
        (any::<u64>(), any::<u64>(), prop::collection::vec(group(), 0..5))
            .prop_map(|(docs, tokens, groups)| CorpusStatsGrouping { docs, tokens, groups })
    }

    fn stats() -> impl Strategy<Value = CorpusStats> {
        prop::collection::btree_map("[a-z_]{1,12}", grouping(), 0..4).prop_map(|groupings| CorpusStats { groupings })
    }

    fn nested() -> impl Strategy<Value = CorpusStatsNestedGrouping> {
        let bucket = ("[a-z]{0,6}", prop::collection::vec(leaf_group(), 0..4))
            .prop_map(|(identity, groups)| CorpusStatsNestedGroup { identity, groups });
        (any::<u64>(), any::<u64>(), prop::collection::vec(bucket, 0..4))
            .prop_map(|(docs, tokens, groups)| CorpusStatsNestedGrouping { docs, tokens, groups })
    }

    proptest! {
        /// Encoding then decoding gives back the same value.
        #[test]
        fn stats_roundtrip(value in stats()) {
            let json = encode(&value).unwrap();
            prop_assert_eq!(decode(&json).unwrap(), value);
        }

        /// Re-encoding a decoded document is structurally equal to the document.
        #[test]
        fn stats_document_roundtrip(value in stats()) {
            let document = serde_json::to_value(&value).unwrap();
            let reencoded: Value = serde_json::from_str(&encode(&decode(&document.to_string()).unwrap()).unwrap()).unwrap();
            prop_assert_eq!(reencoded, document);
        }

        #[test]
        fn nested_roundtrip(value in nested()) {
            let json = encode_nested(&value).unwrap();
            prop_assert_eq!(decode_nested(&json).unwrap(), value);
        }
    }
}
