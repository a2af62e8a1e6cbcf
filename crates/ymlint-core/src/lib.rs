//! Core library for ymlint.
//!
//! A rule engine for style-linting YAML documents. A document is split into
//! lines and, when a rule needs it, a positioned token stream; every enabled
//! rule runs over the whole document, inline `# ymlint` directives filter the
//! findings, and the survivors come back in a stable order.
//!
//! # Modules
//!
//! - [`lines`] - Line segmentation and offset indexing
//! - [`tokens`] - Tokenizer contract and token positioning
//! - [`scanner`] - Built-in lightweight YAML tokenizer
//! - [`directives`] - Inline suppression directives
//! - [`rules`] - Rule catalog, option schemas and resolved configuration
//! - [`lint`] - The lint engine
//! - [`problem`] - Reported findings
//! - [`config`] - Configuration loading and management
//! - [`error`] - Error types and result aliases
//!
//! # Quick Start
//!
//! ```
//! use ymlint_core::{Linter, RuleSettings};
//!
//! let settings: RuleSettings = serde_json::from_str(r#"{"empty-lines": {"max": 1}}"#).unwrap();
//! let linter = Linter::from_settings(&settings).unwrap();
//! let problems: Vec<_> = linter.lint("a: 1\n\n\nb: 2\n").collect();
//! assert_eq!(problems.len(), 1);
//! assert_eq!(problems[0].message, "too many blank lines (2 >= 1)");
//! ```
#![deny(unsafe_code)]

pub mod config;
pub mod directives;
pub mod error;
pub mod lines;
pub mod lint;
pub mod problem;
pub mod rules;
pub mod scanner;
pub mod tokens;

pub use config::{Config, ConfigLoader, ConfigSources, IgnoreMatcher, LogLevel};
pub use error::{ConfigError, ConfigResult, ParseError};
pub use lint::{BatchDocument, BatchOutcome, Linter, Problems, lint_batch};
pub use problem::{Level, Problem};
pub use rules::{ResolvedConfig, RuleSettings, registry};

/// Default maximum input size in bytes (5 MiB).
pub const DEFAULT_MAX_INPUT_BYTES: usize = 5 * 1024 * 1024;
