//! Markup tokenizer: documentation body → [`Element`] sequence.
//!
//! The body is standard block markup (CommonMark with GFM tables) interleaved
//! with directive blocks of the form
//!
//! ```text
//! [block:parameters]
//! {"data": {"h-0": "Property", "h-1": "Type", "0-0": "`id`", "0-1": "`string`"}, "cols": 2, "rows": 1}
//! [/block]
//! ```
//!
//! The [`Tokenizer`] walks the body once, alternating between markdown runs
//! (handled by [`markdown`]) and directive blocks (handled by [`directive`]).
//! It stops at the first grammar fault: unknown markup is never skipped, since
//! that would hide a real change of the upstream documentation.
//!
//! ## Examples
//!
//! ```
//! use docdrift_lib::element::{Block, Element, Parameter};
//! use docdrift_lib::tokenize::tokenize;
//!
//! let body = "Intro text.\n\n| Property | Type |\n|---|---|\n| `id` | `string` |\n";
//! let elements = tokenize(body).unwrap();
//!
//! assert_eq!(
//!     elements,
//!     vec![
//!         Element::from(Block::paragraph("Intro text.")),
//!         Element::from(Parameter::new("`id`", "`string`", "", "")),
//!     ]
//! );
//! ```

mod directive;
mod header;
mod markdown;

use std::collections::VecDeque;

use tracing::{debug, trace};

use crate::element::Element;
use crate::errors::TokenizeError;

const DIRECTIVE_OPEN: &str = "[block:";
const DIRECTIVE_CLOSE: &str = "[/block]";

/// Single-pass tokenizer over a documentation body.
///
/// Yields `Ok(element)` in document order. After the first `Err` the iterator
/// is exhausted; elements already buffered from the failing segment are
/// discarded.
#[derive(Debug)]
pub struct Tokenizer<'a> {
    source: &'a str,
    offset: usize,
    line: usize,
    pending: VecDeque<Element>,
    failed: bool,
}

impl<'a> Tokenizer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            offset: 0,
            line: 1,
            pending: VecDeque::new(),
            failed: false,
        }
    }

    /// Consumes the next segment (a markdown run or one directive) into
    /// `pending`.
    fn advance(&mut self) -> Result<(), TokenizeError> {
        let source = self.source;
        let rest = &source[self.offset..];
        let first = rest.split_inclusive('\n').next().unwrap_or(rest);

        match directive_kind(first) {
            Some(kind) => self.read_directive(kind),
            None => self.read_markdown(),
        }
    }

    fn read_directive(&mut self, kind: &'a str) -> Result<(), TokenizeError> {
        let source = self.source;
        let rest = &source[self.offset..];
        let open_line = self.line;
        let mut lines = rest.split_inclusive('\n');
        let opener = lines.next().unwrap_or(rest);

        let mut consumed = opener.len();
        let mut line_count = 1;
        let content_start = consumed;
        let mut content_end = None;

        for line in lines {
            if line.trim() == DIRECTIVE_CLOSE {
                content_end = Some(consumed);
                consumed += line.len();
                line_count += 1;
                break;
            }
            consumed += line.len();
            line_count += 1;
        }

        let content_end = content_end.ok_or_else(|| TokenizeError::UnterminatedDirective {
            kind: kind.to_string(),
            line: open_line,
        })?;

        trace!(kind, line = open_line, "directive block");
        let content = &rest[content_start..content_end];
        directive::tokenize_directive(kind, content, open_line, &mut self.pending)?;

        self.offset += consumed;
        self.line += line_count;
        Ok(())
    }

    fn read_markdown(&mut self) -> Result<(), TokenizeError> {
        let source = self.source;
        let rest = &source[self.offset..];
        let mut consumed = 0;
        let mut line_count = 0;
        let mut fence: Option<Fence> = None;
        let mut blank_before = true;
        let mut indented_code = false;

        for line in rest.split_inclusive('\n') {
            let blank = line.trim().is_empty();
            match fence {
                Some(open) => {
                    if open.closes(line) {
                        fence = None;
                    }
                }
                None => {
                    // An indented line after a blank one starts (or continues)
                    // an indented code block; markers inside it are code.
                    if !blank {
                        indented_code =
                            indentation(line) >= 4 && (blank_before || indented_code);
                    }
                    if !indented_code {
                        if consumed > 0 && directive_kind(line).is_some() {
                            break;
                        }
                        fence = Fence::open(line);
                    }
                }
            }
            blank_before = blank;
            consumed += line.len();
            line_count += 1;
        }

        markdown::tokenize_markdown(&rest[..consumed], self.line, &mut self.pending)?;

        self.offset += consumed;
        self.line += line_count;
        Ok(())
    }
}

impl Iterator for Tokenizer<'_> {
    type Item = Result<Element, TokenizeError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.failed {
                return None;
            }
            if let Some(element) = self.pending.pop_front() {
                debug!(%element, "token");
                return Some(Ok(element));
            }
            if self.offset >= self.source.len() {
                return None;
            }
            if let Err(err) = self.advance() {
                self.failed = true;
                self.pending.clear();
                return Some(Err(err));
            }
        }
    }
}

impl std::iter::FusedIterator for Tokenizer<'_> {}

/// Tokenizes a whole documentation body.
///
/// ## Errors
///
/// Returns the first [`TokenizeError`] encountered; no elements are returned
/// in that case.
pub fn tokenize(body: &str) -> Result<Vec<Element>, TokenizeError> {
    Tokenizer::new(body).collect()
}

/// Returns the directive kind if `line` opens a directive block.
///
/// Lines indented four columns or more are never directives.
fn directive_kind(line: &str) -> Option<&str> {
    if indentation(line) >= 4 {
        return None;
    }
    let rest = line.trim().strip_prefix(DIRECTIVE_OPEN)?;
    let (kind, _) = rest.split_once(']')?;
    Some(kind.trim())
}

/// Leading indentation in columns, tabs advancing to the next multiple of four.
fn indentation(line: &str) -> usize {
    let mut width = 0;
    for c in line.chars() {
        match c {
            ' ' => width += 1,
            '\t' => width += 4 - width % 4,
            _ => break,
        }
    }
    width
}

/// An open code fence: its marker character and run length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Fence {
    marker: char,
    len: usize,
}

impl Fence {
    /// Parses `line` as an opening fence: at most three columns of indent,
    /// three or more backticks or tildes, and for backticks an info string
    /// without backticks.
    fn open(line: &str) -> Option<Self> {
        if indentation(line) > 3 {
            return None;
        }
        let trimmed = line.trim_start();
        let marker = trimmed.chars().next().filter(|c| matches!(c, '`' | '~'))?;
        let len = trimmed.chars().take_while(|&c| c == marker).count();
        if len < 3 {
            return None;
        }
        let info = &trimmed[len..];
        if marker == '`' && info.contains('`') {
            return None;
        }
        Some(Self { marker, len })
    }

    /// Whether `line` closes this fence: same marker, at least as long, and
    /// nothing but whitespace after it.
    fn closes(&self, line: &str) -> bool {
        if indentation(line) > 3 {
            return false;
        }
        let trimmed = line.trim_start();
        let len = trimmed.chars().take_while(|&c| c == self.marker).count();
        len >= self.len && trimmed[len..].trim().is_empty()
    }
}
