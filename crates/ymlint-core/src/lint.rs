//! Lint execution engine.
//!
//! One pass over a document walks a fixed sequence of [`Stage`]s: segment
//! lines, segment tokens when something needs them, run every enabled rule
//! to completion, scan directives, drop suppressed findings, sort. Rules
//! always run in full; suppression only filters their output afterwards.

use std::any::Any;
use std::collections::HashSet;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};

use crate::directives::{self, SuppressionMap};
use crate::error::ConfigResult;
use crate::lines::{LineIndex, lines};
use crate::problem::{INTERNAL_ERROR_ID, Level, Problem, SYNTAX_ERROR_ID, Violation};
use crate::rules::{Checker, ResolvedConfig, RuleDescriptor, RuleOptions, RuleSettings, registry};
use crate::scanner::YamlScanner;
use crate::tokens::{self, TokenStream, TokenWindow, Tokenizer};

/// Steps of one document pass, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    /// Pass created.
    Init,
    /// Splitting the buffer into lines.
    SegmentLines,
    /// Running the tokenizer.
    SegmentTokens,
    /// Running every enabled rule.
    RunRules,
    /// Collecting suppression directives.
    ScanDirectives,
    /// Dropping suppressed findings.
    FilterSuppressed,
    /// Ordering findings.
    Sort,
    /// Pass complete.
    Done,
}

/// Lints documents against a resolved rule configuration.
///
/// A `Linter` holds no per-document state, so one instance can lint any
/// number of documents, from any number of threads.
pub struct Linter {
    config: ResolvedConfig,
    tokenizer: Box<dyn Tokenizer>,
}

impl fmt::Debug for Linter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Linter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for Linter {
    fn default() -> Self {
        Self::new(ResolvedConfig::defaults(registry()))
    }
}

impl Linter {
    /// Linter using the built-in scanner.
    pub fn new(config: ResolvedConfig) -> Self {
        Self {
            config,
            tokenizer: Box::new(YamlScanner),
        }
    }

    /// Resolve `settings` against the built-in rules.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::ConfigError`] for unknown rules, unknown options
    /// or mistyped option values.
    pub fn from_settings(settings: &RuleSettings) -> ConfigResult<Self> {
        ResolvedConfig::resolve(settings, registry()).map(Self::new)
    }

    /// Replace the tokenizer.
    #[must_use]
    pub fn with_tokenizer(mut self, tokenizer: impl Tokenizer + 'static) -> Self {
        self.tokenizer = Box::new(tokenizer);
        self
    }

    /// The configuration this linter applies.
    pub const fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    /// Lint one document.
    #[tracing::instrument(skip_all, fields(len = text.len()))]
    pub fn lint(&self, text: &str) -> Problems {
        let mut pass = Pass::new();

        pass.enter(Stage::SegmentLines);
        let index = LineIndex::new(text);

        let wants_tokens = self.config.needs_tokens();
        let stream = if wants_tokens || text.contains(directives::MARKER) {
            pass.enter(Stage::SegmentTokens);
            Some(tokens::segment(&index, self.tokenizer.as_ref()))
        } else {
            None
        };

        pass.enter(Stage::RunRules);
        for (rule, options) in self.config.enabled() {
            pass.run_rule(rule, options, text, stream.as_ref());
        }
        if let Some(error) = stream.as_ref().and_then(|s| s.error.as_ref()) {
            pass.problems.push(Problem {
                line: error.line,
                column: error.column,
                message: format!("syntax error: {}", error.message),
                rule: SYNTAX_ERROR_ID.to_string(),
                level: Level::Error,
            });
        }

        pass.enter(Stage::ScanDirectives);
        let suppressions = stream.as_ref().map_or_else(SuppressionMap::default, |s| {
            directives::parse_suppressions(&s.tokens, self.config.known_rules())
        });

        pass.enter(Stage::FilterSuppressed);
        let raw = pass.problems.len();
        pass.problems
            .retain(|p| !suppressions.is_suppressed(&p.rule, p.line));

        pass.enter(Stage::Sort);
        pass.problems.sort_by(Problem::report_order);

        pass.enter(Stage::Done);
        tracing::debug!(
            raw,
            reported = pass.problems.len(),
            "lint pass complete"
        );
        Problems {
            inner: pass.problems.into_iter(),
        }
    }
}

/// State of one document pass.
struct Pass {
    stage: Stage,
    problems: Vec<Problem>,
}

impl Pass {
    fn new() -> Self {
        tracing::trace!(stage = ?Stage::Init, "lint stage");
        Self {
            stage: Stage::Init,
            problems: Vec::new(),
        }
    }

    fn enter(&mut self, stage: Stage) {
        debug_assert!(stage > self.stage, "stages run in order");
        self.stage = stage;
        tracing::trace!(stage = ?stage, "lint stage");
    }

    fn run_rule(
        &mut self,
        rule: &'static RuleDescriptor,
        options: &RuleOptions,
        text: &str,
        stream: Option<&TokenStream<'_>>,
    ) {
        let level = options.level();
        let checker = match catch_unwind(AssertUnwindSafe(|| (rule.build)(options))) {
            Ok(checker) => checker,
            Err(payload) => {
                self.fault(rule, 1, 1, payload.as_ref());
                return;
            }
        };

        match checker {
            Checker::Line(mut check) => {
                for line in lines(text) {
                    match catch_unwind(AssertUnwindSafe(|| check.check(&line))) {
                        Ok(found) => self.collect(rule, level, found),
                        Err(payload) => {
                            self.fault(rule, line.line_no, 1, payload.as_ref());
                            break;
                        }
                    }
                }
            }
            Checker::Token(mut check) => {
                let Some(stream) = stream else {
                    tracing::warn!(rule = rule.id, "token rule enabled without a token stream");
                    return;
                };
                for index in 0..stream.tokens.len() {
                    let window = TokenWindow::new(&stream.tokens, index);
                    match catch_unwind(AssertUnwindSafe(|| check.check(&window))) {
                        Ok(found) => self.collect(rule, level, found),
                        Err(payload) => {
                            let token = window.current();
                            self.fault(rule, token.start_line, token.start_col, payload.as_ref());
                            break;
                        }
                    }
                }
            }
        }
    }

    fn collect(&mut self, rule: &RuleDescriptor, level: Level, found: Vec<Violation>) {
        self.problems.extend(
            found
                .into_iter()
                .map(|v| Problem::from_violation(v, rule.id, level)),
        );
    }

    fn fault(&mut self, rule: &RuleDescriptor, line: usize, column: usize, payload: &(dyn Any + Send)) {
        let reason = panic_message(payload);
        tracing::error!(rule = rule.id, line, column, %reason, "rule faulted");
        self.problems.push(Problem {
            line,
            column,
            message: format!("rule {} failed: {reason}", rule.id),
            rule: INTERNAL_ERROR_ID.to_string(),
            level: Level::Error,
        });
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

/// Sorted findings of one document.
#[derive(Debug, Clone)]
pub struct Problems {
    inner: std::vec::IntoIter<Problem>,
}

impl Problems {
    /// The remaining findings, without consuming them.
    pub fn as_slice(&self) -> &[Problem] {
        self.inner.as_slice()
    }

    /// Returns `true` if any remaining finding is at [`Level::Error`].
    pub fn has_errors(&self) -> bool {
        self.as_slice().iter().any(|p| p.level == Level::Error)
    }
}

impl Iterator for Problems {
    type Item = Problem;

    fn next(&mut self) -> Option<Problem> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Problems {}

impl std::iter::FusedIterator for Problems {}

/// One document of a batch.
#[derive(Debug, Clone, Copy)]
pub struct BatchDocument<'a> {
    /// Name used in reports (usually a path).
    pub name: &'a str,
    /// Document text.
    pub text: &'a str,
    /// Rule settings layered over the batch settings for this document only.
    pub overrides: Option<&'a RuleSettings>,
}

impl<'a> BatchDocument<'a> {
    /// Document without per-document overrides.
    pub const fn new(name: &'a str, text: &'a str) -> Self {
        Self {
            name,
            text,
            overrides: None,
        }
    }
}

/// Result of linting one document of a batch.
#[derive(Debug)]
pub struct BatchOutcome {
    /// The document's name.
    pub name: String,
    /// Findings, or the configuration error that stopped this document.
    pub result: ConfigResult<Vec<Problem>>,
}

/// Lint several documents, resolving configuration per document.
///
/// A configuration error fails only the documents it applies to; the rest of
/// the batch is still linted. Each distinct error is logged once.
#[tracing::instrument(skip_all, fields(documents = documents.len()))]
pub fn lint_batch(settings: &RuleSettings, documents: &[BatchDocument<'_>]) -> Vec<BatchOutcome> {
    let base = ResolvedConfig::resolve(settings, registry()).map(Linter::new);
    let mut logged = HashSet::new();

    documents
        .iter()
        .map(|doc| {
            let result = match (doc.overrides, &base) {
                (None, Ok(linter)) => Ok(linter.lint(doc.text).collect()),
                _ => {
                    let mut merged = settings.clone();
                    merged.extend(
                        doc.overrides
                            .into_iter()
                            .flatten()
                            .map(|(id, setting)| (id.clone(), setting.clone())),
                    );
                    Linter::from_settings(&merged).map(|linter| linter.lint(doc.text).collect())
                }
            };
            if let Err(e) = &result
                && logged.insert(e.to_string())
            {
                tracing::error!(document = doc.name, error = %e, "configuration error");
            }
            BatchOutcome {
                name: doc.name.to_string(),
                result,
            }
        })
        .collect()
}
