//! Built-in lightweight YAML tokenizer.
//!
//! This is not a YAML parser. It recognises the surface syntax rules need
//! (indicators, comments, document markers, scalars, flow brackets) and
//! reports the structural errors that make further token inspection
//! meaningless: unterminated quoted scalars and unbalanced flow brackets.

use crate::lines::terminator_len;
use crate::tokens::{RawToken, Scan, ScanError, TokenKind, Tokenizer};

/// The default [`Tokenizer`].
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlScanner;

impl Tokenizer for YamlScanner {
    fn scan(&self, text: &str) -> Scan {
        let mut cursor = Cursor::new(text);
        let error = cursor.run().err();
        Scan {
            tokens: cursor.tokens,
            error,
        }
    }
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
    /// Offset of the first byte of the current line.
    line_begin: usize,
    /// Open flow collections, by opening byte.
    flow: Vec<(u8, usize)>,
    tokens: Vec<RawToken>,
}

const fn is_blank(b: u8) -> bool {
    matches!(b, b' ' | b'\t')
}

const fn is_break(b: u8) -> bool {
    matches!(b, b'\n' | b'\r')
}

const fn is_flow_indicator(b: u8) -> bool {
    matches!(b, b',' | b'[' | b']' | b'{' | b'}')
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            bytes: text.as_bytes(),
            pos: 0,
            line_begin: 0,
            flow: Vec::new(),
            tokens: Vec::new(),
        }
    }

    fn peek(&self, ahead: usize) -> Option<u8> {
        self.bytes.get(self.pos + ahead).copied()
    }

    /// `true` if the byte `ahead` positions away is whitespace, a break or EOF.
    fn separated(&self, ahead: usize) -> bool {
        self.peek(ahead).is_none_or(|b| is_blank(b) || is_break(b))
    }

    fn in_flow(&self) -> bool {
        !self.flow.is_empty()
    }

    fn emit(&mut self, kind: TokenKind, start: usize, end: usize) {
        self.tokens.push(RawToken { kind, start, end });
        self.pos = end;
    }

    fn line_end(&self, from: usize) -> usize {
        self.bytes[from..]
            .iter()
            .position(|&b| is_break(b))
            .map_or(self.bytes.len(), |rel| from + rel)
    }

    fn error(&self, offset: usize, message: impl Into<String>) -> ScanError {
        ScanError {
            offset,
            message: message.into(),
        }
    }

    fn run(&mut self) -> Result<(), ScanError> {
        loop {
            while self.peek(0).is_some_and(is_blank) {
                self.pos += 1;
            }
            let Some(b) = self.peek(0) else {
                break;
            };
            let start = self.pos;
            let at_column_zero = start == self.line_begin;

            match b {
                b'\n' | b'\r' => {
                    self.pos += terminator_len(self.bytes, start);
                    self.line_begin = self.pos;
                }
                b'#' => {
                    let end = self.line_end(start);
                    self.emit(TokenKind::Comment, start, end);
                }
                b'-' if at_column_zero && self.bytes[start..].starts_with(b"---") && self.separated(3) => {
                    self.emit(TokenKind::DocumentStart, start, start + 3);
                }
                b'.' if at_column_zero && self.bytes[start..].starts_with(b"...") && self.separated(3) => {
                    self.emit(TokenKind::DocumentEnd, start, start + 3);
                }
                b'%' if at_column_zero => {
                    let end = self.line_end(start);
                    self.emit(TokenKind::Directive, start, end);
                }
                b'-' if !self.in_flow() && self.separated(1) => {
                    self.emit(TokenKind::BlockEntry, start, start + 1);
                }
                b'?' if self.separated(1) => {
                    self.emit(TokenKind::Key, start, start + 1);
                }
                b':' if self.separated(1)
                    || (self.in_flow() && self.peek(1).is_some_and(is_flow_indicator)) =>
                {
                    self.emit(TokenKind::Value, start, start + 1);
                }
                b'[' | b'{' => {
                    self.flow.push((b, start));
                    let kind = if b == b'[' {
                        TokenKind::FlowSequenceStart
                    } else {
                        TokenKind::FlowMappingStart
                    };
                    self.emit(kind, start, start + 1);
                }
                b']' | b'}' => self.close_flow(b)?,
                b',' if self.in_flow() => {
                    self.emit(TokenKind::FlowEntry, start, start + 1);
                }
                b'&' | b'*' | b'!' => {
                    let end = self.word_end(start + 1);
                    let kind = match b {
                        b'&' => TokenKind::Anchor,
                        b'*' => TokenKind::Alias,
                        _ => TokenKind::Tag,
                    };
                    self.emit(kind, start, end);
                }
                b'\'' | b'"' => self.quoted(b)?,
                b'|' | b'>' if !self.in_flow() => self.block_scalar(),
                _ => self.plain(),
            }
        }

        match self.flow.last() {
            Some(&(open, offset)) => Err(self.error(
                offset,
                format!("unclosed flow collection starting with '{}'", char::from(open)),
            )),
            None => Ok(()),
        }
    }

    fn close_flow(&mut self, close: u8) -> Result<(), ScanError> {
        let start = self.pos;
        let expected = if close == b']' { b'[' } else { b'{' };
        match self.flow.pop() {
            Some((open, _)) if open == expected => {
                let kind = if close == b']' {
                    TokenKind::FlowSequenceEnd
                } else {
                    TokenKind::FlowMappingEnd
                };
                self.emit(kind, start, start + 1);
                Ok(())
            }
            Some((open, _)) => Err(self.error(
                start,
                format!(
                    "expected a closing '{}' but found '{}'",
                    char::from(if open == b'[' { b']' } else { b'}' }),
                    char::from(close)
                ),
            )),
            None => Err(self.error(
                start,
                format!("unexpected '{}' outside a flow collection", char::from(close)),
            )),
        }
    }

    /// End of an anchor, alias or tag name.
    fn word_end(&self, from: usize) -> usize {
        self.bytes[from..]
            .iter()
            .position(|&b| is_blank(b) || is_break(b) || is_flow_indicator(b))
            .map_or(self.bytes.len(), |rel| from + rel)
    }

    fn quoted(&mut self, quote: u8) -> Result<(), ScanError> {
        let start = self.pos;
        let mut i = start + 1;
        while i < self.bytes.len() {
            match self.bytes[i] {
                b'\\' if quote == b'"' => i += 2,
                b'\'' if quote == b'\'' && self.bytes.get(i + 1) == Some(&b'\'') => i += 2,
                b if b == quote => {
                    self.emit(TokenKind::Scalar, start, i + 1);
                    self.skip_breaks_inside(start, i + 1);
                    return Ok(());
                }
                _ => i += 1,
            }
        }
        let style = if quote == b'"' { "double" } else { "single" };
        Err(self.error(start, format!("unterminated {style}-quoted scalar")))
    }

    /// Keep `line_begin` accurate after a token that spans several lines.
    fn skip_breaks_inside(&mut self, start: usize, end: usize) {
        if let Some(rel) = self.bytes[start..end].iter().rposition(|&b| is_break(b)) {
            self.line_begin = start + rel + 1;
        }
    }

    fn block_scalar(&mut self) {
        let start = self.pos;
        let parent_indent = self.bytes[self.line_begin..start]
            .iter()
            .take_while(|&&b| b == b' ')
            .count();
        let header_end = self.line_end(start);

        let mut end = header_end;
        let mut cursor = header_end + terminator_len(self.bytes, header_end);
        while cursor < self.bytes.len() {
            let content_end = self.line_end(cursor);
            let line = &self.bytes[cursor..content_end];
            let indent = line.iter().take_while(|&&b| b == b' ').count();
            if indent == line.len() {
                // Blank lines belong to the body only if more content follows.
            } else if indent > parent_indent {
                end = content_end;
            } else {
                break;
            }
            cursor = content_end + terminator_len(self.bytes, content_end);
        }

        self.emit(TokenKind::BlockScalar, start, end);
        self.skip_breaks_inside(start, end);
    }

    fn plain(&mut self) {
        let start = self.pos;
        let flow = self.in_flow();
        let mut i = start;
        let mut end = start;
        while i < self.bytes.len() {
            let b = self.bytes[i];
            if is_break(b) {
                break;
            }
            if b == b':' {
                let next = self.bytes.get(i + 1).copied();
                if next.is_none_or(|n| is_blank(n) || is_break(n) || (flow && is_flow_indicator(n))) {
                    break;
                }
            }
            if flow && is_flow_indicator(b) {
                break;
            }
            if b == b'#' && i > start && is_blank(self.bytes[i - 1]) {
                break;
            }
            i += 1;
            if !is_blank(b) {
                end = i;
            }
        }
        // A lone flow indicator outside its context still has to move forward.
        let end = end.max(start + 1);
        self.emit(TokenKind::Scalar, start, end);
    }
}
