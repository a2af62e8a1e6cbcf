//! Lint command: check YAML files against the configured rules.

use std::process::ExitCode;

use anyhow::Context;
use camino::Utf8PathBuf;
use clap::Args;
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::{debug, info, instrument};

use ymlint_core::config::Config;
use ymlint_core::{Level, Linter, Problem};

use super::read_input_file;

/// Arguments for the `lint` subcommand.
#[derive(Args, Debug)]
pub struct LintArgs {
    /// Files to lint.
    #[arg(required = true, value_name = "FILE")]
    pub files: Vec<Utf8PathBuf>,

    /// Hide problems below this level
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub min_level: Option<Level>,

    /// Exit non-zero on warnings too
    #[arg(long)]
    pub strict: bool,
}

#[derive(Debug, Serialize)]
struct FileReport {
    file: Utf8PathBuf,
    problems: Vec<Problem>,
}

#[derive(Debug, Default, Serialize)]
struct LintReport {
    files: Vec<FileReport>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    ignored: Vec<Utf8PathBuf>,
    errors: usize,
    warnings: usize,
}

impl LintReport {
    fn push(&mut self, file: Utf8PathBuf, problems: Vec<Problem>) {
        for problem in &problems {
            match problem.level {
                Level::Error => self.errors += 1,
                Level::Warning => self.warnings += 1,
            }
        }
        self.files.push(FileReport { file, problems });
    }

    /// 1 when an error was found, 2 when only warnings were found under `--strict`.
    const fn status(&self, strict: bool) -> u8 {
        if self.errors > 0 {
            1
        } else if strict && self.warnings > 0 {
            2
        } else {
            0
        }
    }
}

/// Lint every file named on the command line.
#[instrument(name = "cmd_lint", skip_all, fields(files = args.files.len()))]
pub fn cmd_lint(args: LintArgs, global_json: bool, config: &Config) -> anyhow::Result<ExitCode> {
    let linter = config.linter().context("invalid rule configuration")?;
    let ignore = config
        .ignore_matcher()
        .context("invalid ignore configuration")?;
    let limit = config.input_limit();

    let mut report = LintReport::default();
    for file in args.files {
        if ignore.is_ignored(&file) {
            debug!(%file, "skipping ignored file");
            report.ignored.push(file);
            continue;
        }
        let problems = lint_file(&linter, &file, limit, args.min_level)?;
        report.push(file, problems);
    }

    info!(
        files = report.files.len(),
        errors = report.errors,
        warnings = report.warnings,
        "lint finished"
    );

    if global_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_text(&report);
    }

    Ok(ExitCode::from(report.status(args.strict)))
}

fn lint_file(
    linter: &Linter,
    file: &Utf8PathBuf,
    limit: Option<usize>,
    min_level: Option<Level>,
) -> anyhow::Result<Vec<Problem>> {
    let text = read_input_file(file, limit)?;
    let problems = linter
        .lint(&text)
        .filter(|p| min_level.is_none_or(|min| p.level >= min))
        .collect();
    Ok(problems)
}

fn print_text(report: &LintReport) {
    let mut first = true;
    for entry in report.files.iter().filter(|f| !f.problems.is_empty()) {
        if !first {
            println!();
        }
        first = false;
        println!("{}", entry.file.bold().underline());
        for problem in &entry.problems {
            let position = format!("{}:{}", problem.line, problem.column);
            let level = match problem.level {
                Level::Error => problem.level.red().to_string(),
                Level::Warning => problem.level.yellow().to_string(),
            };
            println!(
                "  {:<8} {:<7}  {}  {}",
                position.dimmed(),
                level,
                problem.message,
                format!("({})", problem.rule).dimmed()
            );
        }
    }
}
