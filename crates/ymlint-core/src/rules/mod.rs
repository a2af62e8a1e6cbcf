//! Rule catalog and configuration resolution.
//!
//! Every rule is a static [`RuleDescriptor`]: an id, the granularity it
//! works at, its option schema and a constructor. The engine builds a fresh
//! [`Checker`] per document from the resolved options, so rules may keep
//! state across lines or tokens of one document without it leaking into the
//! next.
//!
//! Settings from configuration are validated against the schemas once, by
//! [`ResolvedConfig::resolve`], before any document is linted.

pub mod document_start;
pub mod empty_lines;
pub mod options;
pub mod trailing_spaces;

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::LazyLock;

use crate::error::{ConfigError, ConfigResult};
use crate::lines::Line;
use crate::problem::{Level, Violation};
use crate::tokens::TokenWindow;

pub use options::{
    DefaultValue, LEVEL_OPTION, OptionKind, OptionSpec, OptionValue, RuleOptions, RuleSetting,
    RuleSettings, Toggle,
};

/// Unit of input a rule inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Granularity {
    /// One physical line at a time.
    Line,
    /// The positioned token stream.
    Token,
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Line => "line",
            Self::Token => "token",
        })
    }
}

/// Per-document state of a line rule.
pub trait LineCheck {
    /// Inspect the next line of the document.
    fn check(&mut self, line: &Line<'_>) -> Vec<Violation>;
}

/// Per-document state of a token rule.
pub trait TokenCheck {
    /// Inspect the next token of the document.
    fn check(&mut self, window: &TokenWindow<'_, '_>) -> Vec<Violation>;
}

/// A rule instance ready to run over one document.
pub enum Checker {
    /// Fed every line.
    Line(Box<dyn LineCheck>),
    /// Fed every token.
    Token(Box<dyn TokenCheck>),
}

impl Checker {
    /// Granularity of this checker.
    pub const fn granularity(&self) -> Granularity {
        match self {
            Self::Line(_) => Granularity::Line,
            Self::Token(_) => Granularity::Token,
        }
    }
}

impl fmt::Debug for Checker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Checker").field(&self.granularity()).finish()
    }
}

/// Static description of a rule.
pub struct RuleDescriptor {
    /// Rule id used in configuration, directives and findings.
    pub id: &'static str,
    /// One-line description.
    pub description: &'static str,
    /// What the rule's checker consumes.
    pub granularity: Granularity,
    /// Whether the rule runs when configuration does not mention it.
    pub enabled_by_default: bool,
    /// Declared options (besides `level`, which every rule accepts).
    pub options: &'static [OptionSpec],
    /// Create a fresh checker for one document.
    pub build: fn(&RuleOptions) -> Checker,
}

impl fmt::Debug for RuleDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleDescriptor")
            .field("id", &self.id)
            .field("granularity", &self.granularity)
            .field("enabled_by_default", &self.enabled_by_default)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl RuleDescriptor {
    /// Look up a declared option.
    pub fn option(&self, name: &str) -> Option<&'static OptionSpec> {
        self.options.iter().find(|option| option.name == name)
    }

    /// Options with every default filled in.
    pub fn default_options(&self) -> RuleOptions {
        RuleOptions::defaults(self.options)
    }

    /// Validate configured overrides and merge them over the defaults.
    pub fn resolve_options(
        &self,
        overrides: &BTreeMap<String, OptionValue>,
    ) -> ConfigResult<RuleOptions> {
        let mut options = self.default_options();
        for (name, value) in overrides {
            if name == LEVEL_OPTION {
                let level = match value {
                    OptionValue::Str(s) => Level::from_name(s),
                    _ => None,
                };
                let level = level.ok_or_else(|| ConfigError::InvalidOption {
                    rule: self.id.to_string(),
                    option: name.clone(),
                    expected: "one of error, warning".to_string(),
                })?;
                options.set_level(level);
                continue;
            }

            let option = self.option(name).ok_or_else(|| ConfigError::UnknownOption {
                rule: self.id.to_string(),
                option: name.clone(),
            })?;
            if !option.kind.accepts(value) {
                return Err(ConfigError::InvalidOption {
                    rule: self.id.to_string(),
                    option: name.clone(),
                    expected: option.kind.describe(),
                });
            }
            options.set(option.name, value.clone());
        }
        Ok(options)
    }
}

/// Every built-in rule, in id order.
pub static CATALOG: &[RuleDescriptor] = &[
    document_start::RULE,
    empty_lines::RULE,
    trailing_spaces::RULE,
];

static REGISTRY: LazyLock<Registry> = LazyLock::new(|| Registry::new(CATALOG));

/// The registry of built-in rules.
pub fn registry() -> &'static Registry {
    &REGISTRY
}

/// Indexed view over a rule catalog.
#[derive(Debug)]
pub struct Registry {
    catalog: &'static [RuleDescriptor],
    by_id: HashMap<&'static str, &'static RuleDescriptor>,
}

impl Registry {
    /// Index a catalog.
    pub fn new(catalog: &'static [RuleDescriptor]) -> Self {
        let by_id = catalog.iter().map(|rule| (rule.id, rule)).collect();
        Self { catalog, by_id }
    }

    /// Look up a rule by id.
    pub fn get(&self, id: &str) -> Option<&'static RuleDescriptor> {
        self.by_id.get(id).copied()
    }

    /// All rules, in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &'static RuleDescriptor> + use<> {
        self.catalog.iter()
    }

    /// All rule ids, in catalog order.
    pub fn ids(&self) -> Vec<&'static str> {
        self.catalog.iter().map(|rule| rule.id).collect()
    }
}

/// Enabled rules and their validated options.
#[derive(Debug, Clone, Default)]
pub struct ResolvedConfig {
    rules: Vec<(&'static RuleDescriptor, RuleOptions)>,
    known: Vec<&'static str>,
}

impl ResolvedConfig {
    /// Rules enabled by default, with default options.
    pub fn defaults(registry: &Registry) -> Self {
        Self {
            rules: registry
                .iter()
                .filter(|rule| rule.enabled_by_default)
                .map(|rule| (rule, rule.default_options()))
                .collect(),
            known: registry.ids(),
        }
    }

    /// Validate `settings` against `registry` and merge them over the defaults.
    ///
    /// Fails on the first unknown rule id, unknown option or mistyped value.
    #[tracing::instrument(skip_all, fields(configured = settings.len()))]
    pub fn resolve(settings: &RuleSettings, registry: &Registry) -> ConfigResult<Self> {
        let mut enabled: HashMap<&'static str, RuleOptions> = registry
            .iter()
            .filter(|rule| rule.enabled_by_default)
            .map(|rule| (rule.id, rule.default_options()))
            .collect();

        for (id, setting) in settings {
            let rule = registry
                .get(id)
                .ok_or_else(|| ConfigError::UnknownRule { rule: id.clone() })?;
            match setting {
                RuleSetting::Toggle(Toggle::Disable) => {
                    enabled.remove(rule.id);
                }
                RuleSetting::Toggle(Toggle::Enable) => {
                    enabled
                        .entry(rule.id)
                        .or_insert_with(|| rule.default_options());
                }
                RuleSetting::Options(overrides) => {
                    enabled.insert(rule.id, rule.resolve_options(overrides)?);
                }
            }
        }

        let rules: Vec<_> = registry
            .iter()
            .filter_map(|rule| enabled.remove(rule.id).map(|options| (rule, options)))
            .collect();
        tracing::debug!(
            enabled = ?rules.iter().map(|(rule, _)| rule.id).collect::<Vec<_>>(),
            "rules resolved"
        );
        Ok(Self {
            rules,
            known: registry.ids(),
        })
    }

    /// Enabled rules with their options, in catalog order.
    pub fn enabled(&self) -> impl Iterator<Item = (&'static RuleDescriptor, &RuleOptions)> {
        self.rules.iter().map(|(rule, options)| (*rule, options))
    }

    /// Returns `true` if the rule is enabled.
    pub fn is_enabled(&self, id: &str) -> bool {
        self.rules.iter().any(|(rule, _)| rule.id == id)
    }

    /// Configured (or default) value of an enabled rule's option.
    pub fn get_option(&self, id: &str, option: &str) -> Option<&OptionValue> {
        self.rules
            .iter()
            .find(|(rule, _)| rule.id == id)
            .and_then(|(_, options)| options.get(option))
    }

    /// Returns `true` if any enabled rule consumes tokens.
    pub fn needs_tokens(&self) -> bool {
        self.rules
            .iter()
            .any(|(rule, _)| rule.granularity == Granularity::Token)
    }

    /// Ids of every rule in the registry this config was resolved against.
    pub fn known_rules(&self) -> &[&'static str] {
        &self.known
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(yaml: &str) -> RuleSettings {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn catalog_ids_are_unique_and_sorted() {
        let ids: Vec<_> = CATALOG.iter().map(|rule| rule.id).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn builders_match_declared_granularity() {
        for rule in CATALOG {
            let checker = (rule.build)(&rule.default_options());
            assert_eq!(checker.granularity(), rule.granularity, "{}", rule.id);
        }
    }

    #[test]
    fn lookup_by_id() {
        assert_eq!(registry().get("empty-lines").map(|r| r.id), Some("empty-lines"));
        assert!(registry().get("no-such-rule").is_none());
    }

    #[test]
    fn defaults_enable_default_rules_only() {
        let config = ResolvedConfig::defaults(registry());
        assert!(config.is_enabled("empty-lines"));
        assert!(config.is_enabled("trailing-spaces"));
        assert!(!config.is_enabled("document-start"));
        assert!(!config.needs_tokens());
        assert_eq!(
            config.get_option("empty-lines", "max"),
            Some(&OptionValue::Int(2))
        );
    }

    #[test]
    fn resolve_applies_overrides_and_toggles() {
        let config = ResolvedConfig::resolve(
            &settings("empty-lines: {max: 1, level: warning}\ntrailing-spaces: disable\ndocument-start: enable\n"),
            registry(),
        )
        .unwrap();
        assert_eq!(config.get_option("empty-lines", "max"), Some(&OptionValue::Int(1)));
        assert_eq!(
            config.get_option("empty-lines", "max-start"),
            Some(&OptionValue::Int(0))
        );
        assert!(!config.is_enabled("trailing-spaces"));
        assert!(config.needs_tokens());
        let (_, options) = config
            .enabled()
            .find(|(rule, _)| rule.id == "empty-lines")
            .unwrap();
        assert_eq!(options.level(), Level::Warning);
    }

    #[test]
    fn unknown_rule_is_rejected() {
        let err = ResolvedConfig::resolve(&settings("line-length: enable\n"), registry()).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownRule { ref rule } if rule == "line-length"));
    }

    #[test]
    fn unknown_option_is_rejected() {
        let err =
            ResolvedConfig::resolve(&settings("empty-lines: {maximum: 3}\n"), registry()).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownOption { ref option, .. } if option == "maximum"));
    }

    #[test]
    fn mistyped_option_is_rejected() {
        let err =
            ResolvedConfig::resolve(&settings("empty-lines: {max: \"two\"}\n"), registry()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidOption { ref expected, .. } if expected == "an integer"));

        let err =
            ResolvedConfig::resolve(&settings("empty-lines: {level: fatal}\n"), registry()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidOption { ref option, .. } if option == "level"));
    }

    #[test]
    fn enabled_rules_follow_catalog_order() {
        let config = ResolvedConfig::resolve(&settings("document-start: enable\n"), registry()).unwrap();
        let ids: Vec<_> = config.enabled().map(|(rule, _)| rule.id).collect();
        assert_eq!(ids, ["document-start", "empty-lines", "trailing-spaces"]);
    }
}
