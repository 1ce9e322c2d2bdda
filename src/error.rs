//! Structural table errors.
//!
//! These are the failures a caller may downgrade to a warning: the source
//! could be read as something, but not as the table we were asked for.
//! Row-level problems never surface here (bad rows are dropped), and fatal
//! reference-data failures are plain `anyhow` errors with context.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TableError {
    /// Source missing, unreadable or not valid delimited text
    #[error("cannot read {source_name}: {reason}")]
    Unreadable {
        source_name: String,
        reason: String,
    },

    /// Workbook has no sheet matching the requested label
    #[error("sheet '{label}' not found (available: {available})")]
    SheetNotFound {
        label: String,
        available: String,
    },

    /// Required columns absent after header normalization
    #[error("missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    /// Source holds nothing but whitespace
    #[error("table is empty")]
    Empty,
}

impl TableError {
    pub fn unreadable(source_name: &str, reason: impl std::fmt::Display) -> Self {
        TableError::Unreadable {
            source_name: source_name.to_string(),
            reason: reason.to_string(),
        }
    }
}
