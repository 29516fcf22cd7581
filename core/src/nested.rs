use crate::error::{Result, StatsError};
use crate::{CorpusStatsGroup, CorpusStatsGrouping, CorpusStatsNestedGroup, CorpusStatsNestedGrouping};

impl CorpusStatsGrouping {
    /// Bucket the top-level groups by their value for `field`.
    ///
    /// Buckets appear in order of first occurrence and keep the relative order
    /// of their groups. `field` is moved out of each child identity into the
    /// bucket's identity. Only flat groupings can be nested.
    pub fn nest_by(&self, field: &str) -> Result<CorpusStatsNestedGrouping> {
        let mut buckets: Vec<CorpusStatsNestedGroup> = Vec::new();
        for group in &self.groups {
            if group.groups.is_some() {
                return Err(StatsError::Nesting(format!("group {{{}}} is already subdivided", group.label())));
            }
            let mut child = group.clone();
            let value = child
                .identity
                .remove(field)
                .ok_or_else(|| StatsError::Nesting(format!("group {{{}}} has no field {field:?}", group.label())))?;
            match buckets.iter_mut().find(|b| b.identity == value) {
                Some(bucket) => bucket.groups.push(child),
                None => buckets.push(CorpusStatsNestedGroup { identity: value, groups: vec![child] }),
            }
        }
        tracing::debug!(field, buckets = buckets.len(), "nested grouping");
        Ok(CorpusStatsNestedGrouping { docs: self.docs, tokens: self.tokens, groups: buckets })
    }
}

impl CorpusStatsNestedGrouping {
    /// Inverse of [`CorpusStatsGrouping::nest_by`]: each bucket identity is written
    /// back into its children under `field`.
    pub fn flatten(&self, field: &str) -> Result<CorpusStatsGrouping> {
        let mut groups: Vec<CorpusStatsGroup> = Vec::new();
        for bucket in &self.groups {
            for child in &bucket.groups {
                if child.identity.contains_key(field) {
                    return Err(StatsError::Nesting(format!(
                        "group {{{}}} under {:?} already has field {field:?}",
                        child.label(),
                        bucket.identity
                    )));
                }
                let mut child = child.clone();
                child.identity.insert(field.to_string(), bucket.identity.clone());
                groups.push(child);
            }
        }
        Ok(CorpusStatsGrouping { docs: self.docs, tokens: self.tokens, groups })
    }
}
