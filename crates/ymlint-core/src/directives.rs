//! Inline suppression directives.
//!
//! Directives are comments of the form:
//! - `# ymlint disable [rule:ID ...]`: suppress from this line until a
//!   matching `enable`, or to the end of the document
//! - `# ymlint enable [rule:ID ...]`: close matching open disables
//! - `# ymlint disable-line [rule:ID ...]`: suppress the comment's own line
//!   when it trails content, otherwise the next line
//! - `# ymlint disable-file`: suppress everything (line 1 only)
//!
//! Without `rule:` a directive applies to every rule. Directives are read
//! from comment tokens, so a `# ymlint` inside a quoted scalar is inert.
//! Anything that does not match the grammar exactly is ignored, as is an
//! `enable` with nothing open.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use regex::Regex;

use crate::problem::{INTERNAL_ERROR_ID, SYNTAX_ERROR_ID};
use crate::tokens::{Token, TokenKind, TokenWindow};

/// Word every directive comment starts with.
pub const MARKER: &str = "ymlint";

static DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#\s*ymlint\s+(disable-file|disable-line|disable|enable)((?:\s+rule:\S+)*)\s*$")
        .expect("directive regex should compile")
});

/// Rules a suppression covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleScope {
    /// Every rule.
    All,
    /// Only the named rules.
    Rules(BTreeSet<String>),
}

impl RuleScope {
    /// Returns `true` if `rule` is covered.
    pub fn covers(&self, rule: &str) -> bool {
        match self {
            Self::All => true,
            Self::Rules(rules) => rules.contains(rule),
        }
    }
}

/// Lines a suppression covers (1-based, inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSpan {
    /// A single line.
    Line(usize),
    /// `start..=end`.
    Range(usize, usize),
    /// From a line to the end of the document.
    From(usize),
}

impl LineSpan {
    /// Returns `true` if `line` falls inside the span.
    pub const fn contains(&self, line: usize) -> bool {
        match *self {
            Self::Line(n) => line == n,
            Self::Range(start, end) => line >= start && line <= end,
            Self::From(start) => line >= start,
        }
    }
}

/// One suppression interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suppression {
    /// Rules covered.
    pub scope: RuleScope,
    /// Lines covered.
    pub span: LineSpan,
}

/// Every suppression found in one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuppressionMap {
    intervals: Vec<Suppression>,
    file_disabled: bool,
}

impl SuppressionMap {
    /// Returns `true` if findings of `rule` on `line` are suppressed.
    ///
    /// Syntax and internal-error findings are only suppressed by
    /// `disable-file`.
    pub fn is_suppressed(&self, rule: &str, line: usize) -> bool {
        if self.file_disabled {
            return true;
        }
        if rule == SYNTAX_ERROR_ID || rule == INTERNAL_ERROR_ID {
            return false;
        }
        self.intervals
            .iter()
            .any(|s| s.span.contains(line) && s.scope.covers(rule))
    }

    /// Returns `true` if a `disable-file` directive was found.
    pub const fn is_file_disabled(&self) -> bool {
        self.file_disabled
    }

    /// Returns `true` if nothing is suppressed.
    pub fn is_empty(&self) -> bool {
        !self.file_disabled && self.intervals.is_empty()
    }

    /// The collected intervals, in the order they were closed.
    pub fn intervals(&self) -> &[Suppression] {
        &self.intervals
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Verb {
    Disable,
    Enable,
    DisableLine,
    DisableFile,
}

#[derive(Debug)]
struct Directive {
    verb: Verb,
    rules: BTreeSet<String>,
}

fn parse_directive(comment: &str) -> Option<Directive> {
    let caps = DIRECTIVE.captures(comment)?;
    let verb = match &caps[1] {
        "disable" => Verb::Disable,
        "enable" => Verb::Enable,
        "disable-line" => Verb::DisableLine,
        "disable-file" => Verb::DisableFile,
        _ => return None,
    };
    let rules: BTreeSet<String> = caps
        .get(2)
        .map(|m| m.as_str())
        .unwrap_or_default()
        .split_whitespace()
        .filter_map(|word| word.strip_prefix("rule:"))
        .map(str::to_string)
        .collect();
    if verb == Verb::DisableFile && !rules.is_empty() {
        return None;
    }
    Some(Directive { verb, rules })
}

/// Open `disable` directives while walking the document.
#[derive(Debug, Default)]
struct OpenDisables {
    all: Option<usize>,
    rules: BTreeMap<String, usize>,
}

/// Collect suppressions from the comment tokens of a document.
///
/// `known_rules` is needed to keep the other rules disabled when a single
/// rule is re-enabled inside a blanket `disable`.
#[tracing::instrument(skip_all, fields(tokens = tokens.len()))]
pub fn parse_suppressions(tokens: &[Token<'_>], known_rules: &[&str]) -> SuppressionMap {
    let mut map = SuppressionMap::default();
    let mut open = OpenDisables::default();

    for index in 0..tokens.len() {
        let window = TokenWindow::new(tokens, index);
        let comment = window.current();
        if comment.kind != TokenKind::Comment {
            continue;
        }
        let Some(directive) = parse_directive(comment.value) else {
            continue;
        };
        let line = comment.start_line;
        tracing::trace!(line, verb = ?directive.verb, rules = ?directive.rules, "directive");

        match directive.verb {
            Verb::DisableFile => {
                if line == 1 {
                    map.file_disabled = true;
                }
            }
            Verb::DisableLine => {
                let inline = window
                    .prev_significant()
                    .is_some_and(|prev| !prev.kind.is_pseudo() && prev.end_line == line);
                let target = if inline { line } else { line + 1 };
                map.intervals.push(Suppression {
                    scope: scope_of(directive.rules),
                    span: LineSpan::Line(target),
                });
            }
            Verb::Disable if directive.rules.is_empty() => {
                open.all.get_or_insert(line);
            }
            Verb::Disable => {
                for rule in directive.rules {
                    open.rules.entry(rule).or_insert(line);
                }
            }
            Verb::Enable if directive.rules.is_empty() => {
                if let Some(start) = open.all.take() {
                    close(&mut map, RuleScope::All, start, line);
                }
                for (rule, start) in std::mem::take(&mut open.rules) {
                    close(&mut map, single(rule), start, line);
                }
            }
            Verb::Enable => {
                for rule in &directive.rules {
                    if let Some(start) = open.rules.remove(rule) {
                        close(&mut map, single(rule.clone()), start, line);
                    }
                }
                if let Some(start) = open.all.take() {
                    close(&mut map, RuleScope::All, start, line);
                    for rule in known_rules {
                        if !directive.rules.contains(*rule) {
                            open.rules.entry((*rule).to_string()).or_insert(line);
                        }
                    }
                }
            }
        }
    }

    if let Some(start) = open.all {
        map.intervals.push(Suppression {
            scope: RuleScope::All,
            span: LineSpan::From(start),
        });
    }
    for (rule, start) in open.rules {
        map.intervals.push(Suppression {
            scope: single(rule),
            span: LineSpan::From(start),
        });
    }

    tracing::debug!(
        intervals = map.intervals.len(),
        file_disabled = map.file_disabled,
        "directives scanned"
    );
    map
}

fn scope_of(rules: BTreeSet<String>) -> RuleScope {
    if rules.is_empty() {
        RuleScope::All
    } else {
        RuleScope::Rules(rules)
    }
}

fn single(rule: String) -> RuleScope {
    RuleScope::Rules(BTreeSet::from([rule]))
}

fn close(map: &mut SuppressionMap, scope: RuleScope, start: usize, enable_line: usize) {
    if enable_line > start {
        map.intervals.push(Suppression {
            scope,
            span: LineSpan::Range(start, enable_line - 1),
        });
    }
}
