//! Error types for rowmap-core

use thiserror::Error;

/// Result type alias for rowmap-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in rowmap-core
///
/// Missing source keys are never an error; they resolve to field defaults.
#[derive(Error, Debug)]
pub enum Error {
    /// Mapping file could not be found
    #[error("mapping file not found: {path}")]
    ConfigNotFound {
        /// Path that was searched
        path: String,
    },

    /// Failed to parse YAML configuration
    #[error("failed to parse mapping: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    /// Invalid configuration value
    #[error("invalid configuration: {message}")]
    ConfigInvalid {
        /// Description of what's invalid
        message: String,
    },

    /// Transformer definition rejected at construction
    #[error("invalid transformer '{transformer}': {message}")]
    InvalidDefinition {
        /// Name of the transformer definition
        transformer: String,
        /// Description of the problem
        message: String,
    },

    /// `extends` names a transformer that is not declared
    #[error("transformer '{transformer}' extends unknown transformer '{parent}'")]
    ParentNotFound {
        /// Declaring transformer
        transformer: String,
        /// Missing parent name
        parent: String,
    },

    /// `extends` chain loops back on itself
    #[error("circular inheritance involving transformer '{transformer}'")]
    CircularInheritance {
        /// Transformer where the cycle was detected
        transformer: String,
    },

    /// Compound rule returned a sequence of the wrong length
    #[error("compound field '{field}' expects {expected} values, rule returned {found}")]
    ArityMismatch {
        /// Declared compound name
        field: String,
        /// Number of sub-names
        expected: usize,
        /// Length actually returned
        found: usize,
    },

    /// Compound rule returned something other than an array
    #[error("compound field '{field}' did not return a sequence")]
    NotASequence {
        /// Declared compound name
        field: String,
    },

    /// Compound sub-value read before any row was transformed
    #[error("compound field '{field}' has no computed value; transform a row first")]
    StaleCache {
        /// Declared compound name
        field: String,
    },

    /// Accessor called with a name the transformer does not emit
    #[error("unknown field '{name}'")]
    UnknownField {
        /// Requested name
        name: String,
    },

    /// Named filter is not built in
    #[error("unknown filter '{name}'")]
    UnknownFilter {
        /// Requested filter name
        name: String,
    },

    /// A computed field failed
    #[error("computed field '{field}' failed: {message}")]
    Computed {
        /// Field name
        field: String,
        /// Description of the failure
        message: String,
    },

    /// Input value is not a JSON object
    #[error("input is not a JSON object")]
    NotAnObject,

    /// Invalid regex pattern
    #[error("invalid regex pattern '{pattern}': {message}")]
    InvalidRegex {
        /// The pattern that failed
        pattern: String,
        /// Error message
        message: String,
    },

    /// Template compilation or rendering error
    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
