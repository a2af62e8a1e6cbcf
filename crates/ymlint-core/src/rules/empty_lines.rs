//! `empty-lines`: limit runs of consecutive blank lines.
//!
//! Options:
//! - `max` (default 2): longest run allowed inside the document.
//! - `max-start` (default 0): longest run allowed at the start of the file.
//! - `max-end` (default 0): longest run allowed at the end of the file.
//!
//! `max-start` and `max-end` take precedence over `max`. A run is reported
//! once, on its last blank line.

use crate::lines::Line;
use crate::problem::Violation;
use crate::rules::{
    Checker, DefaultValue, Granularity, LineCheck, OptionKind, OptionSpec, RuleDescriptor,
    RuleOptions,
};

/// Rule id.
pub const ID: &str = "empty-lines";

const DEFAULT_MAX: i64 = 2;
const DEFAULT_MAX_START: i64 = 0;
const DEFAULT_MAX_END: i64 = 0;

/// Catalog entry.
pub const RULE: RuleDescriptor = RuleDescriptor {
    id: ID,
    description: "limit consecutive blank lines",
    granularity: Granularity::Line,
    enabled_by_default: true,
    options: &[
        OptionSpec {
            name: "max",
            kind: OptionKind::Int,
            default: DefaultValue::Int(DEFAULT_MAX),
            description: "maximum consecutive blank lines",
        },
        OptionSpec {
            name: "max-start",
            kind: OptionKind::Int,
            default: DefaultValue::Int(DEFAULT_MAX_START),
            description: "maximum blank lines at the start of the file",
        },
        OptionSpec {
            name: "max-end",
            kind: OptionKind::Int,
            default: DefaultValue::Int(DEFAULT_MAX_END),
            description: "maximum blank lines at the end of the file",
        },
    ],
    build,
};

fn build(options: &RuleOptions) -> Checker {
    Checker::Line(Box::new(EmptyLines {
        max: options.int("max").unwrap_or(DEFAULT_MAX),
        max_start: options.int("max-start").unwrap_or(DEFAULT_MAX_START),
        max_end: options.int("max-end").unwrap_or(DEFAULT_MAX_END),
    }))
}

/// Checker state: the configured thresholds.
///
/// A run is reported only when it is longer than its limit; the `>=` in the
/// message is the established wording and does not describe the comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmptyLines {
    max: i64,
    max_start: i64,
    max_end: i64,
}

impl EmptyLines {
    fn evaluate(&self, line: &Line<'_>) -> Option<Violation> {
        let buffer = line.buffer.as_bytes();
        if !line.is_empty() || line.end >= buffer.len() {
            return None;
        }

        // Only the last blank line of a run reports.
        let after = &buffer[line.end..];
        if after.starts_with(b"\n\n") || after.starts_with(b"\r\n\r\n") {
            return None;
        }

        let mut blank_lines: i64 = 0;
        let mut start = line.start;
        loop {
            let step = if start >= 2 && &buffer[start - 2..start] == b"\r\n" {
                2
            } else if start >= 1 && matches!(buffer[start - 1], b'\n' | b'\r') {
                1
            } else {
                break;
            };
            blank_lines += 1;
            start -= step;
        }

        let mut max = self.max;
        if start == 0 {
            blank_lines += 1;
            max = self.max_start;
        }

        if line.next_start == buffer.len() {
            if line.end == 0 {
                return None;
            }
            max = self.max_end;
        }

        (blank_lines > max).then(|| {
            Violation::new(
                line.line_no,
                1,
                format!("too many blank lines ({blank_lines} >= {max})"),
            )
        })
    }
}

impl LineCheck for EmptyLines {
    fn check(&mut self, line: &Line<'_>) -> Vec<Violation> {
        self.evaluate(line).into_iter().collect()
    }
}
