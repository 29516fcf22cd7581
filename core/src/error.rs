use std::fmt;
use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StatsError>;

#[derive(Error, Debug)]
pub enum StatsError {
    /// Required field absent, wrong type, negative or fractional count, repeated key, or invalid JSON.
    #[error("malformed stats document{location}: {message}")]
    MalformedDocument { location: Location, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("failed to encode stats: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("cannot convert grouping: {0}")]
    Nesting(String),

    #[error("unknown grouping: {0}")]
    UnknownGrouping(String),
}

/// Source position of a decode failure; absent for structural checks run after parsing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Location {
    pub line: Option<usize>,
    pub column: Option<usize>,
}

impl Location {
    pub fn at(line: usize, column: usize) -> Self {
        Self { line: Some(line), column: Some(column) }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.line, self.column) {
            (Some(line), Some(column)) => write!(f, " at line {line}, column {column}"),
            (Some(line), None) => write!(f, " at line {line}"),
            _ => Ok(()),
        }
    }
}

impl StatsError {
    pub fn malformed(message: impl Into<String>) -> Self {
        StatsError::MalformedDocument { location: Location::default(), message: message.into() }
    }

    pub(crate) fn from_decode(err: serde_json::Error) -> Self {
        if err.is_io() {
            return StatsError::Io(err.into());
        }
        let location = Location::at(err.line(), err.column());
        StatsError::MalformedDocument { location, message: err.to_string() }
    }
}
