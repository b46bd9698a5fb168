//! Fatal conditions of a run.
//!
//! Everything else (registry misses, stats failures, unmatched fields) is
//! recovered at the call site and never reaches these types.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractError {
    /// The resolved package name contains characters the registry never allows.
    #[error("Invalid package name {0:?}: expected only letters, digits, '.', '_' or '-'")]
    InvalidPackageName(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("Duplicate template section: {name}")]
    DuplicateSection { name: String },

    #[error("Template line {line} appears before any section heading")]
    BodyBeforeHeading { line: usize },

    #[error("Invalid placeholder pattern: {0}")]
    Pattern(String),
}
