//! Token segmentation.
//!
//! A [`Tokenizer`] reports tokens as byte spans in its own coordinates.
//! [`segment`] re-maps them onto the line/column space of [`crate::lines`],
//! adds pseudo-tokens for the stream boundaries and for every line break, and
//! cuts the stream short at the first structural error.

use std::fmt;

use crate::error::ParseError;
use crate::lines::{LineIndex, lines};

/// Kind of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Zero-width marker at the start of the document.
    StreamStart,
    /// Zero-width marker at the end of the scanned region.
    StreamEnd,
    /// Line terminator of a physical line.
    LineBreak,
    /// `%YAML` / `%TAG` directive line.
    Directive,
    /// `---`
    DocumentStart,
    /// `...`
    DocumentEnd,
    /// `# ...` up to the end of the line.
    Comment,
    /// `-` starting a block sequence entry.
    BlockEntry,
    /// `?` explicit key indicator.
    Key,
    /// `:` value indicator.
    Value,
    /// `,` inside a flow collection.
    FlowEntry,
    /// `[`
    FlowSequenceStart,
    /// `]`
    FlowSequenceEnd,
    /// `{`
    FlowMappingStart,
    /// `}`
    FlowMappingEnd,
    /// `&name`
    Anchor,
    /// `*name`
    Alias,
    /// `!tag`
    Tag,
    /// Plain or quoted scalar.
    Scalar,
    /// `|` or `>` header together with its indented body.
    BlockScalar,
}

impl TokenKind {
    /// Returns `true` for the synthesized kinds that carry no document content.
    pub const fn is_pseudo(&self) -> bool {
        matches!(self, Self::StreamStart | Self::StreamEnd | Self::LineBreak)
    }
}

/// A token as reported by a [`Tokenizer`]: a kind and a byte span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawToken {
    /// Token kind.
    pub kind: TokenKind,
    /// Byte offset of the first byte.
    pub start: usize,
    /// Byte offset just past the last byte.
    pub end: usize,
}

/// Structural error reported by a [`Tokenizer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanError {
    /// Byte offset where scanning failed.
    pub offset: usize,
    /// What went wrong.
    pub message: String,
}

/// Output of one tokenizer run.
///
/// `tokens` holds everything scanned before `error`, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scan {
    /// Tokens in document order.
    pub tokens: Vec<RawToken>,
    /// Structural error that stopped the scan, if any.
    pub error: Option<ScanError>,
}

/// A tokenizer for the markup language.
///
/// Implementations must not panic on malformed input; they report the
/// problem through [`Scan::error`] instead.
pub trait Tokenizer: Send + Sync {
    /// Scan `text` into tokens.
    fn scan(&self, text: &str) -> Scan;
}

/// A token positioned in document coordinates.
///
/// Lines and columns are 1-based; columns count characters. The end
/// position is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    /// Token kind.
    pub kind: TokenKind,
    /// Source text of the token (empty for zero-width markers).
    pub value: &'a str,
    /// Line of the first character.
    pub start_line: usize,
    /// Column of the first character.
    pub start_col: usize,
    /// Line of the end position.
    pub end_line: usize,
    /// Column of the end position.
    pub end_col: usize,
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} {}:{}-{}:{} {:?}",
            self.kind, self.start_line, self.start_col, self.end_line, self.end_col, self.value
        )
    }
}

/// Positioned token stream for one document.
#[derive(Debug, Clone, Default)]
pub struct TokenStream<'a> {
    /// Tokens, starting with `StreamStart` and ending with `StreamEnd`.
    pub tokens: Vec<Token<'a>>,
    /// Structural error that truncated the stream, if any.
    pub error: Option<ParseError>,
}

/// A token plus its neighbours, as handed to token rules.
#[derive(Debug, Clone, Copy)]
pub struct TokenWindow<'s, 'a> {
    tokens: &'s [Token<'a>],
    index: usize,
}

impl<'s, 'a> TokenWindow<'s, 'a> {
    /// Window over `tokens` centred on `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn new(tokens: &'s [Token<'a>], index: usize) -> Self {
        assert!(index < tokens.len(), "token window index out of bounds");
        Self { tokens, index }
    }

    /// The token under inspection.
    pub fn current(&self) -> &'s Token<'a> {
        &self.tokens[self.index]
    }

    /// The token before the current one.
    pub fn prev(&self) -> Option<&'s Token<'a>> {
        self.index.checked_sub(1).map(|i| &self.tokens[i])
    }

    /// The token after the current one.
    pub fn next(&self) -> Option<&'s Token<'a>> {
        self.tokens.get(self.index + 1)
    }

    /// The closest earlier token that is not a comment or line break.
    pub fn prev_significant(&self) -> Option<&'s Token<'a>> {
        self.tokens[..self.index]
            .iter()
            .rev()
            .find(|t| !matches!(t.kind, TokenKind::Comment | TokenKind::LineBreak))
    }

    /// Position of the current token in the stream.
    pub const fn index(&self) -> usize {
        self.index
    }

    /// The whole stream.
    pub const fn tokens(&self) -> &'s [Token<'a>] {
        self.tokens
    }
}

/// Run `tokenizer` over the indexed buffer and position its output.
#[tracing::instrument(skip_all, fields(len = index.buffer().len()))]
pub fn segment<'a>(index: &LineIndex<'a>, tokenizer: &dyn Tokenizer) -> TokenStream<'a> {
    let text = index.buffer();
    let scan = tokenizer.scan(text);
    let mut cutoff = scan.error.as_ref().map_or(text.len(), |e| e.offset.min(text.len()));
    while !text.is_char_boundary(cutoff) {
        cutoff -= 1;
    }

    let position = |kind: TokenKind, start: usize, end: usize| {
        let (start_line, start_col) = index.locate(start);
        let (end_line, end_col) = index.locate(end);
        Token {
            kind,
            value: &text[start..end],
            start_line,
            start_col,
            end_line,
            end_col,
        }
    };

    let mut raw: Vec<RawToken> = scan
        .tokens
        .into_iter()
        .filter(|t| {
            let valid = t.start <= t.end
                && t.end <= text.len()
                && text.is_char_boundary(t.start)
                && text.is_char_boundary(t.end);
            if !valid {
                tracing::warn!(kind = ?t.kind, start = t.start, end = t.end, "dropping token with invalid span");
            }
            valid && t.start < cutoff
        })
        .collect();
    raw.extend(
        lines(text)
            .filter(|line| line.next_start > line.end && line.end < cutoff)
            .map(|line| RawToken {
                kind: TokenKind::LineBreak,
                start: line.end,
                end: line.next_start,
            }),
    );
    raw.sort_by_key(|t| t.start);

    let mut tokens = Vec::with_capacity(raw.len() + 2);
    tokens.push(position(TokenKind::StreamStart, 0, 0));
    tokens.extend(raw.into_iter().map(|t| position(t.kind, t.start, t.end)));
    tokens.push(position(TokenKind::StreamEnd, cutoff, cutoff));

    let error = scan.error.map(|e| {
        let (line, column) = index.locate(cutoff);
        tracing::debug!(line, column, message = %e.message, "tokenizer reported a syntax error");
        ParseError {
            line,
            column,
            message: e.message,
        }
    });

    TokenStream { tokens, error }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reports one scalar per non-empty line and fails on a `!` byte.
    struct LineScalars;

    impl Tokenizer for LineScalars {
        fn scan(&self, text: &str) -> Scan {
            let mut scan = Scan::default();
            for line in lines(text) {
                if let Some(bang) = line.content().find('!') {
                    scan.error = Some(ScanError {
                        offset: line.start + bang,
                        message: "bang".to_string(),
                    });
                    break;
                }
                if !line.is_empty() {
                    scan.tokens.push(RawToken {
                        kind: TokenKind::Scalar,
                        start: line.start,
                        end: line.end,
                    });
                }
            }
            scan
        }
    }

    fn kinds(stream: &TokenStream<'_>) -> Vec<TokenKind> {
        stream.tokens.iter().map(|t| t.kind).collect()
    }

    #[test]
    fn wraps_stream_markers_and_line_breaks() {
        let text = "a\r\nb\rc";
        let index = LineIndex::new(text);
        let stream = segment(&index, &LineScalars);
        assert_eq!(
            kinds(&stream),
            [
                TokenKind::StreamStart,
                TokenKind::Scalar,
                TokenKind::LineBreak,
                TokenKind::Scalar,
                TokenKind::LineBreak,
                TokenKind::Scalar,
                TokenKind::StreamEnd,
            ]
        );
        assert!(stream.error.is_none());
    }

    #[test]
    fn remaps_offsets_to_lines_and_columns() {
        let text = "ab\r\ncd\n";
        let index = LineIndex::new(text);
        let stream = segment(&index, &LineScalars);
        let cd = stream.tokens[3];
        assert_eq!(cd.value, "cd");
        assert_eq!((cd.start_line, cd.start_col, cd.end_line, cd.end_col), (2, 1, 2, 3));
        let line_break = stream.tokens[2];
        assert_eq!(line_break.value, "\r\n");
        assert_eq!((line_break.start_line, line_break.start_col), (1, 3));
        let end = stream.tokens.last().unwrap();
        assert_eq!((end.start_line, end.start_col), (3, 1));
    }

    #[test]
    fn error_truncates_stream() {
        let text = "a\nb!\nc\n";
        let index = LineIndex::new(text);
        let stream = segment(&index, &LineScalars);
        assert_eq!(
            kinds(&stream),
            [
                TokenKind::StreamStart,
                TokenKind::Scalar,
                TokenKind::LineBreak,
                TokenKind::StreamEnd,
            ]
        );
        let error = stream.error.unwrap();
        assert_eq!((error.line, error.column), (2, 2));
        assert_eq!(error.message, "bang");
    }

    struct MidChar;

    impl Tokenizer for MidChar {
        fn scan(&self, _text: &str) -> Scan {
            Scan {
                tokens: Vec::new(),
                error: Some(ScanError {
                    offset: 4,
                    message: "inside a character".to_string(),
                }),
            }
        }
    }

    #[test]
    fn error_offset_inside_a_character_snaps_back() {
        let text = "a: é\n";
        let index = LineIndex::new(text);
        let stream = segment(&index, &MidChar);
        let end = stream.tokens.last().unwrap();
        assert_eq!(end.kind, TokenKind::StreamEnd);
        assert_eq!((end.start_line, end.start_col), (1, 4));
        let error = stream.error.unwrap();
        assert_eq!((error.line, error.column), (1, 4));
    }

    #[test]
    fn empty_document_has_only_markers() {
        let index = LineIndex::new("");
        let stream = segment(&index, &LineScalars);
        assert_eq!(kinds(&stream), [TokenKind::StreamStart, TokenKind::StreamEnd]);
    }

    #[test]
    fn window_neighbours() {
        let text = "a\n# c\nb";
        let index = LineIndex::new(text);
        let mut stream = segment(&index, &LineScalars);
        stream.tokens[3].kind = TokenKind::Comment;
        let window = TokenWindow::new(&stream.tokens, 5);
        assert_eq!(window.current().value, "b");
        assert_eq!(window.prev().map(|t| t.kind), Some(TokenKind::LineBreak));
        assert_eq!(window.prev_significant().map(|t| t.value), Some("a"));
        assert_eq!(window.next().map(|t| t.kind), Some(TokenKind::StreamEnd));
    }
}
