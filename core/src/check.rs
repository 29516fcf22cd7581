//! Consistency checks over decoded stats.
//!
//! Producers may filter groups out of a grouping without recording it, so a
//! parent total that disagrees with its children is reported as a [`Warning`]
//! rather than an error. Callers decide whether warnings matter.

use crate::stats::sum_totals;
use crate::{CorpusStats, CorpusStatsGroup, CorpusStatsGrouping, CorpusStatsNestedGrouping, Identity};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Measure {
    Docs,
    Tokens,
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Measure::Docs => f.write_str("docs"),
            Measure::Tokens => f.write_str("tokens"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// Children of `path` add up to `actual` while the parent records `expected`.
    InconsistentTotals { path: String, measure: Measure, expected: u64, actual: u64 },
    /// Two siblings under `path` share the same identity, rendered as a label.
    DuplicateIdentity { path: String, identity: String },
}

impl Warning {
    pub fn path(&self) -> &str {
        match self {
            Warning::InconsistentTotals { path, .. } | Warning::DuplicateIdentity { path, .. } => path,
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::InconsistentTotals { path, measure, expected, actual } => {
                write!(f, "{path}: {measure} total is {expected} but groups sum to {actual}")
            }
            Warning::DuplicateIdentity { path, identity } => {
                write!(f, "{path}: duplicate group identity {{{identity}}}")
            }
        }
    }
}

/// Check every grouping in `stats`, in grouping-name order.
pub fn check_stats(stats: &CorpusStats) -> Vec<Warning> {
    let mut warnings = Vec::new();
    for (name, grouping) in stats {
        warnings.extend(check_grouping(name, grouping));
    }
    warnings
}

pub fn check_grouping(name: &str, grouping: &CorpusStatsGrouping) -> Vec<Warning> {
    let mut warnings = Vec::new();
    compare_totals(name, (grouping.docs, grouping.tokens), grouping.child_totals(), &mut warnings);
    check_siblings(name, &grouping.groups, &mut warnings);
    warnings
}

/// Grouping totals are compared against the sum over every inner group.
pub fn check_nested(name: &str, nested: &CorpusStatsNestedGrouping) -> Vec<Warning> {
    let mut warnings = Vec::new();
    let actual = nested.groups.iter().fold((0u64, 0u64), |(docs, tokens), g| {
        let (d, t) = sum_totals(&g.groups);
        (docs.saturating_add(d), tokens.saturating_add(t))
    });
    compare_totals(name, (nested.docs, nested.tokens), actual, &mut warnings);

    let mut seen = HashSet::new();
    for group in &nested.groups {
        if !seen.insert(group.identity.as_str()) {
            warnings.push(Warning::DuplicateIdentity { path: name.to_string(), identity: group.identity.clone() });
        }
        let path = format!("{name}/{}", group.identity);
        check_siblings(&path, &group.groups, &mut warnings);
    }
    warnings
}

fn check_siblings(path: &str, groups: &[CorpusStatsGroup], warnings: &mut Vec<Warning>) {
    let mut seen: HashSet<&Identity> = HashSet::new();
    for group in groups {
        if !seen.insert(&group.identity) {
            warnings.push(Warning::DuplicateIdentity { path: path.to_string(), identity: group.label() });
        }
        if let Some(children) = &group.groups {
            let child_path = format!("{path}/{}", group.label());
            compare_totals(&child_path, (group.docs, group.tokens), sum_totals(children), warnings);
            check_siblings(&child_path, children, warnings);
        }
    }
}

fn compare_totals(path: &str, expected: (u64, u64), actual: (u64, u64), warnings: &mut Vec<Warning>) {
    if expected.0 != actual.0 {
        warnings.push(Warning::InconsistentTotals { path: path.to_string(), measure: Measure::Docs, expected: expected.0, actual: actual.0 });
    }
    if expected.1 != actual.1 {
        warnings.push(Warning::InconsistentTotals { path: path.to_string(), measure: Measure::Tokens, expected: expected.1, actual: actual.1 });
    }
}
