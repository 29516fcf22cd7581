//! Typed schema for corpus `stats.json` files: document and token counts
//! grouped by categorical fields, plus decoding, encoding and consistency checks.

pub mod check;
pub mod error;
pub mod nested;
pub mod persist;
mod stats;

pub use check::{check_grouping, check_nested, check_stats, Measure, Warning};
pub use error::{Location, Result, StatsError};
pub use stats::*;
