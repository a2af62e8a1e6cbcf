//! Line segmentation.
//!
//! Splits a document buffer into [`Line`] records without copying it. `\r\n`,
//! `\n` and a bare `\r` each end exactly one line; `\r\n` is matched first.
//! A final line without a terminator is still emitted, and an empty buffer
//! yields no lines at all.
//!
//! ```
//! use ymlint_core::lines::lines;
//!
//! let text = "a: 1\r\n\nb: 2";
//! let contents: Vec<&str> = lines(text).map(|l| l.content()).collect();
//! assert_eq!(contents, ["a: 1", "", "b: 2"]);
//! ```

/// One physical line of a document.
///
/// Offsets are byte offsets into `buffer`. `end` sits before the line
/// terminator and `next_start` after it, so `end..next_start` spans the
/// terminator bytes (zero bytes on an unterminated final line).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line<'a> {
    /// 1-based line number.
    pub line_no: usize,
    /// Offset of the first content byte.
    pub start: usize,
    /// Offset just past the last content byte.
    pub end: usize,
    /// Offset just past the line terminator.
    pub next_start: usize,
    /// The whole document.
    pub buffer: &'a str,
}

impl<'a> Line<'a> {
    /// The line's content, without its terminator.
    pub fn content(&self) -> &'a str {
        &self.buffer[self.start..self.end]
    }

    /// The raw terminator bytes (`"\n"`, `"\r\n"`, `"\r"` or `""`).
    pub fn terminator(&self) -> &'a str {
        &self.buffer[self.end..self.next_start]
    }

    /// Returns `true` if the line has no content.
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// 1-based character column of a byte offset within this line.
    pub fn column_of(&self, offset: usize) -> usize {
        self.buffer
            .get(self.start..offset)
            .map_or(0, |s| s.chars().count())
            + 1
    }
}

/// Iterator over the lines of a buffer.
///
/// Each call to [`lines`] starts a fresh cursor; cloning an in-flight
/// iterator forks it.
#[derive(Debug, Clone)]
pub struct Lines<'a> {
    buffer: &'a str,
    cursor: usize,
    line_no: usize,
}

/// Segment `buffer` into lines.
pub fn lines(buffer: &str) -> Lines<'_> {
    Lines {
        buffer,
        cursor: 0,
        line_no: 0,
    }
}

impl<'a> Iterator for Lines<'a> {
    type Item = Line<'a>;

    fn next(&mut self) -> Option<Line<'a>> {
        let bytes = self.buffer.as_bytes();
        if self.cursor >= bytes.len() {
            return None;
        }

        let start = self.cursor;
        let (end, next_start) = match bytes[start..]
            .iter()
            .position(|&b| b == b'\n' || b == b'\r')
        {
            Some(rel) => {
                let end = start + rel;
                (end, end + terminator_len(bytes, end))
            }
            None => (bytes.len(), bytes.len()),
        };

        self.cursor = next_start;
        self.line_no += 1;
        Some(Line {
            line_no: self.line_no,
            start,
            end,
            next_start,
            buffer: self.buffer,
        })
    }
}

impl std::iter::FusedIterator for Lines<'_> {}

/// Length of the line terminator starting at `at`, or 0 if there is none.
pub(crate) fn terminator_len(bytes: &[u8], at: usize) -> usize {
    match bytes.get(at) {
        Some(b'\r') if bytes.get(at + 1) == Some(&b'\n') => 2,
        Some(b'\r' | b'\n') => 1,
        _ => 0,
    }
}

/// Maps byte offsets to 1-based `(line, column)` positions.
///
/// Uses the same line boundaries as [`lines`]. An offset at the very end of
/// a buffer that finishes with a terminator maps to column 1 of the line
/// after the last one.
#[derive(Debug, Clone)]
pub struct LineIndex<'a> {
    buffer: &'a str,
    starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    /// Build an index for `buffer`.
    pub fn new(buffer: &'a str) -> Self {
        let mut starts = vec![0];
        starts.extend(
            lines(buffer)
                .filter(|line| line.next_start > line.end)
                .map(|line| line.next_start),
        );
        Self { buffer, starts }
    }

    /// The indexed buffer.
    pub const fn buffer(&self) -> &'a str {
        self.buffer
    }

    /// Position of `offset` as `(line, column)`, both 1-based.
    ///
    /// Columns count characters, not bytes.
    pub fn locate(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.buffer.len());
        let line = self.starts.partition_point(|&s| s <= offset);
        let start = self.starts[line - 1];
        let column = self
            .buffer
            .get(start..offset)
            .map_or(offset - start, |s| s.chars().count());
        (line, column + 1)
    }
}
