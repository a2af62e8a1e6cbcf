//! `trailing-spaces`: forbid spaces and tabs at the end of a line.

use crate::lines::Line;
use crate::problem::Violation;
use crate::rules::{Checker, Granularity, LineCheck, RuleDescriptor, RuleOptions};

/// Rule id.
pub const ID: &str = "trailing-spaces";

/// Catalog entry.
pub const RULE: RuleDescriptor = RuleDescriptor {
    id: ID,
    description: "forbid trailing whitespace",
    granularity: Granularity::Line,
    enabled_by_default: true,
    options: &[],
    build,
};

fn build(_options: &RuleOptions) -> Checker {
    Checker::Line(Box::new(TrailingSpaces))
}

/// Stateless checker.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrailingSpaces;

impl LineCheck for TrailingSpaces {
    fn check(&mut self, line: &Line<'_>) -> Vec<Violation> {
        let content = line.content();
        let trimmed = content.trim_end_matches([' ', '\t']);
        if trimmed.len() == content.len() {
            return Vec::new();
        }
        let offset = line.start + trimmed.len();
        vec![Violation::new(
            line.line_no,
            line.column_of(offset),
            "trailing spaces",
        )]
    }
}
