//! Error types for ymlint-core.

use std::fmt;

use thiserror::Error;

/// Errors that can occur when loading or resolving configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to deserialize configuration.
    #[error("invalid configuration: {0}")]
    Deserialize(#[from] Box<figment::Error>),

    /// Configuration file not found after searching all locations.
    #[error("no configuration file found")]
    NotFound,

    /// A rule id that no catalog entry declares.
    #[error("unknown rule: {rule}")]
    UnknownRule {
        /// The rule id that was configured.
        rule: String,
    },

    /// An option the rule does not declare.
    #[error("unknown option '{option}' for rule {rule}")]
    UnknownOption {
        /// The rule being configured.
        rule: String,
        /// The undeclared option name.
        option: String,
    },

    /// An option value of the wrong type or outside its allowed set.
    #[error("invalid value for option '{option}' of rule {rule}: expected {expected}")]
    InvalidOption {
        /// The rule being configured.
        rule: String,
        /// The offending option.
        option: String,
        /// Description of the accepted values.
        expected: String,
    },

    /// An `ignore` glob pattern that does not compile.
    #[error("invalid ignore pattern '{pattern}': {source}")]
    InvalidIgnore {
        /// The pattern as written.
        pattern: String,
        /// Underlying glob error.
        source: globset::Error,
    },
}

/// Result type alias using [`ConfigError`].
pub type ConfigResult<T> = Result<T, ConfigError>;

/// A document the tokenizer could not segment.
///
/// Never escapes the engine: it is reported as a `syntax` finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// 1-based line of the failure.
    pub line: usize,
    /// 1-based column of the failure.
    pub column: usize,
    /// What the tokenizer reported.
    pub message: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.line, self.column, self.message)
    }
}

impl std::error::Error for ParseError {}
