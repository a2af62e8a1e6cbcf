//! Rule option schemas and their resolved values.

use std::collections::BTreeMap;
use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::problem::Level;

/// Name of the option every rule accepts to set its severity.
pub const LEVEL_OPTION: &str = "level";

/// A configured option value.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(untagged)]
pub enum OptionValue {
    /// `true` / `false`.
    Bool(bool),
    /// Integer.
    Int(i64),
    /// String.
    Str(String),
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Str(s) => write!(f, "{s:?}"),
        }
    }
}

/// Type an option accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    /// A boolean.
    Bool,
    /// An integer.
    Int,
    /// Any string.
    Str,
    /// One string out of a fixed set.
    OneOf(&'static [&'static str]),
}

impl OptionKind {
    /// Returns `true` if `value` has this kind.
    pub fn accepts(&self, value: &OptionValue) -> bool {
        match (self, value) {
            (Self::Bool, OptionValue::Bool(_))
            | (Self::Int, OptionValue::Int(_))
            | (Self::Str, OptionValue::Str(_)) => true,
            (Self::OneOf(allowed), OptionValue::Str(s)) => allowed.contains(&s.as_str()),
            _ => false,
        }
    }

    /// Human-readable description of accepted values.
    pub fn describe(&self) -> String {
        match self {
            Self::Bool => "a boolean".to_string(),
            Self::Int => "an integer".to_string(),
            Self::Str => "a string".to_string(),
            Self::OneOf(allowed) => format!("one of {}", allowed.join(", ")),
        }
    }
}

/// Compile-time default for an option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultValue {
    /// Boolean default.
    Bool(bool),
    /// Integer default.
    Int(i64),
    /// String default.
    Str(&'static str),
}

impl DefaultValue {
    /// Owned option value for this default.
    pub fn to_value(self) -> OptionValue {
        match self {
            Self::Bool(b) => OptionValue::Bool(b),
            Self::Int(i) => OptionValue::Int(i),
            Self::Str(s) => OptionValue::Str(s.to_string()),
        }
    }
}

/// One declared option of a rule.
#[derive(Debug, Clone, Copy)]
pub struct OptionSpec {
    /// Option name as written in configuration.
    pub name: &'static str,
    /// Accepted type.
    pub kind: OptionKind,
    /// Value used when the option is not configured.
    pub default: DefaultValue,
    /// One-line description.
    pub description: &'static str,
}

/// Validated options for one enabled rule.
///
/// Holds a value for every declared option, so rules can read them without
/// re-checking types.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleOptions {
    level: Level,
    values: BTreeMap<&'static str, OptionValue>,
}

impl RuleOptions {
    /// Options with every declared default filled in.
    pub fn defaults(declared: &[OptionSpec]) -> Self {
        Self {
            level: Level::default(),
            values: declared
                .iter()
                .map(|option| (option.name, option.default.to_value()))
                .collect(),
        }
    }

    pub(crate) fn set(&mut self, name: &'static str, value: OptionValue) {
        self.values.insert(name, value);
    }

    pub(crate) const fn set_level(&mut self, level: Level) {
        self.level = level;
    }

    /// Severity of findings from this rule.
    pub const fn level(&self) -> Level {
        self.level
    }

    /// Raw value of an option.
    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.values.get(name)
    }

    /// Integer value of an option.
    pub fn int(&self, name: &str) -> Option<i64> {
        match self.get(name)? {
            OptionValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Boolean value of an option.
    pub fn bool(&self, name: &str) -> Option<bool> {
        match self.get(name)? {
            OptionValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// String value of an option.
    pub fn str(&self, name: &str) -> Option<&str> {
        match self.get(name)? {
            OptionValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// All option values, by name.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &OptionValue)> {
        self.values.iter().map(|(name, value)| (*name, value))
    }
}

/// Shorthand for switching a rule on or off without options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Toggle {
    /// Enable with default options.
    Enable,
    /// Disable the rule.
    Disable,
}

/// How one rule is configured.
///
/// ```yaml
/// rules:
///   trailing-spaces: disable
///   empty-lines: {max: 1, level: warning}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RuleSetting {
    /// `enable` / `disable`.
    Toggle(Toggle),
    /// Option overrides; enables the rule.
    Options(BTreeMap<String, OptionValue>),
}

/// Rule settings keyed by rule id, as read from configuration.
pub type RuleSettings = BTreeMap<String, RuleSetting>;
