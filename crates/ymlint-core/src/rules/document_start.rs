//! `document-start`: require or forbid the `---` document start marker.
//!
//! With `present: true` every document must open with `---` (a `%`
//! directive may come first). With `present: false` any `---` is reported.

use crate::problem::Violation;
use crate::rules::{
    Checker, DefaultValue, Granularity, OptionKind, OptionSpec, RuleDescriptor, RuleOptions,
    TokenCheck,
};
use crate::tokens::{TokenKind, TokenWindow};

/// Rule id.
pub const ID: &str = "document-start";

/// Catalog entry.
pub const RULE: RuleDescriptor = RuleDescriptor {
    id: ID,
    description: "require or forbid the document start marker",
    granularity: Granularity::Token,
    enabled_by_default: false,
    options: &[OptionSpec {
        name: "present",
        kind: OptionKind::Bool,
        default: DefaultValue::Bool(true),
        description: "whether documents must start with \"---\"",
    }],
    build,
};

fn build(options: &RuleOptions) -> Checker {
    Checker::Token(Box::new(DocumentStart {
        present: options.bool("present").unwrap_or(true),
    }))
}

/// Checker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentStart {
    present: bool,
}

impl TokenCheck for DocumentStart {
    fn check(&mut self, window: &TokenWindow<'_, '_>) -> Vec<Violation> {
        let token = window.current();
        if !self.present {
            return if token.kind == TokenKind::DocumentStart {
                vec![Violation::new(
                    token.start_line,
                    token.start_col,
                    "found forbidden document start \"---\"",
                )]
            } else {
                Vec::new()
            };
        }

        if matches!(
            token.kind,
            TokenKind::Comment
                | TokenKind::LineBreak
                | TokenKind::DocumentStart
                | TokenKind::Directive
                | TokenKind::StreamStart
                | TokenKind::StreamEnd
        ) {
            return Vec::new();
        }

        let opens_document = window.prev_significant().is_some_and(|prev| {
            matches!(
                prev.kind,
                TokenKind::StreamStart | TokenKind::DocumentEnd | TokenKind::Directive
            )
        });
        if opens_document {
            vec![Violation::new(
                token.start_line,
                1,
                "missing document start \"---\"",
            )]
        } else {
            Vec::new()
        }
    }
}
