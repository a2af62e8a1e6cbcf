//! Rules command: list the rule catalog.

use anyhow::Context;
use clap::Args;
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::{debug, instrument};

use ymlint_core::config::Config;
use ymlint_core::registry;
use ymlint_core::rules::{OptionValue, ResolvedConfig, RuleDescriptor};

/// Arguments for the `rules` subcommand.
#[derive(Args, Debug, Default)]
pub struct RulesArgs {
    /// Only list rules enabled by the loaded configuration
    #[arg(long)]
    pub enabled: bool,
}

#[derive(Debug, Serialize)]
struct OptionInfo {
    name: &'static str,
    accepts: String,
    default: OptionValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    configured: Option<OptionValue>,
    description: &'static str,
}

#[derive(Debug, Serialize)]
struct RuleInfo {
    id: &'static str,
    description: &'static str,
    granularity: String,
    enabled_by_default: bool,
    enabled: bool,
    options: Vec<OptionInfo>,
}

impl RuleInfo {
    fn new(rule: &'static RuleDescriptor, resolved: &ResolvedConfig) -> Self {
        let enabled = resolved.is_enabled(rule.id);
        let options = rule
            .options
            .iter()
            .map(|declared| {
                let default = declared.default.to_value();
                let configured = resolved
                    .get_option(rule.id, declared.name)
                    .filter(|value| **value != default)
                    .cloned();
                OptionInfo {
                    name: declared.name,
                    accepts: declared.kind.describe(),
                    default,
                    configured,
                    description: declared.description,
                }
            })
            .collect();
        Self {
            id: rule.id,
            description: rule.description,
            granularity: rule.granularity.to_string(),
            enabled_by_default: rule.enabled_by_default,
            enabled,
            options,
        }
    }
}

/// List every registered rule with its options and whether it is enabled.
#[instrument(name = "cmd_rules", skip_all, fields(enabled_only = args.enabled))]
pub fn cmd_rules(args: RulesArgs, global_json: bool, config: &Config) -> anyhow::Result<()> {
    let linter = config.linter().context("invalid rule configuration")?;
    let resolved = linter.config();
    let rules: Vec<RuleInfo> = registry()
        .iter()
        .map(|rule| RuleInfo::new(rule, resolved))
        .filter(|info| !args.enabled || info.enabled)
        .collect();
    debug!(count = rules.len(), "listing rules");

    if global_json {
        println!("{}", serde_json::to_string_pretty(&rules)?);
        return Ok(());
    }

    for (i, rule) in rules.iter().enumerate() {
        if i > 0 {
            println!();
        }
        let state = if rule.enabled {
            "enabled".green().to_string()
        } else {
            "disabled".dimmed().to_string()
        };
        println!(
            "{} {} {}",
            rule.id.bold(),
            format!("[{}]", rule.granularity).cyan(),
            state
        );
        println!("  {}", rule.description);
        for option in &rule.options {
            let value = match option.configured {
                Some(ref v) => format!("{v} (default {})", option.default),
                None => option.default.to_string(),
            };
            println!(
                "  {} = {}  {}",
                option.name.yellow(),
                value,
                option.description.dimmed()
            );
        }
    }
    Ok(())
}
