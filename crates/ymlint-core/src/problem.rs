//! Findings reported by the lint engine.

use std::cmp::Ordering;
use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Rule id attached to findings produced for unparsable documents.
pub const SYNTAX_ERROR_ID: &str = "syntax";

/// Rule id attached to findings produced when a rule faults.
pub const INTERNAL_ERROR_ID: &str = "internal-error";

/// Severity of a finding.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize,
    JsonSchema,
)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum Level {
    /// Reported, but does not fail the lint.
    Warning,
    /// Fails the lint (default).
    #[default]
    Error,
}

impl Level {
    /// Returns the level as a lowercase string slice.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }

    /// Parse a level name as written in configuration.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "warning" => Some(Self::Warning),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a rule reports before the engine attaches its id and level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// 1-based line number.
    pub line: usize,
    /// 1-based column, or 0 for the whole line.
    pub column: usize,
    /// Human-readable description.
    pub message: String,
}

impl Violation {
    /// Create a violation at `line`/`column`.
    pub fn new(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            column,
            message: message.into(),
        }
    }
}

/// One reported problem in a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Problem {
    /// 1-based line number.
    pub line: usize,
    /// 1-based column; 0 means the finding covers the whole line.
    pub column: usize,
    /// Human-readable description.
    pub message: String,
    /// Id of the rule that produced the finding.
    pub rule: String,
    /// Severity.
    pub level: Level,
}

impl Problem {
    /// Attach a rule id and level to a violation.
    pub fn from_violation(violation: Violation, rule: &str, level: Level) -> Self {
        Self {
            line: violation.line,
            column: violation.column,
            message: violation.message,
            rule: rule.to_string(),
            level,
        }
    }

    /// Final report ordering: line, then column (whole-line first), then rule id.
    pub fn report_order(&self, other: &Self) -> Ordering {
        self.line
            .cmp(&other.line)
            .then(self.column.cmp(&other.column))
            .then_with(|| self.rule.cmp(&other.rule))
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} [{}] {} ({})",
            self.line, self.column, self.level, self.message, self.rule
        )
    }
}
