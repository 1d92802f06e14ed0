//! Standard block markup via pulldown-cmark.
//!
//! Only top-level blocks become elements. Nested structure (list items, inline
//! formatting) stays inside the source text of its top-level block.

use std::collections::VecDeque;
use std::ops::Range;

use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};

use super::header::{Column, row_to_parameter};
use crate::element::{Block, BlockKind, Element};
use crate::errors::TokenizeError;

/// A top-level block that has started but not yet ended.
enum Open {
    Text { kind: BlockKind, range: Range<usize> },
    Code { text: String },
    Table(Table),
}

#[derive(Default)]
struct Table {
    columns: Option<Vec<Column>>,
    cells: Vec<String>,
}

fn create_parser(content: &str) -> Parser<'_> {
    let opts = Options::ENABLE_GFM | Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH;
    Parser::new_ext(content, opts)
}

/// Tokenizes a markdown run. `first_line` is the line number of `content`'s
/// first line within the whole body.
pub(super) fn tokenize_markdown(
    content: &str,
    first_line: usize,
    out: &mut VecDeque<Element>,
) -> Result<(), TokenizeError> {
    let mut depth: usize = 0;
    let mut open: Option<Open> = None;

    for (event, range) in create_parser(content).into_offset_iter() {
        match event {
            Event::Start(tag) => {
                if depth == 0 {
                    open = Some(open_block(&tag, range, content, first_line)?);
                }
                depth += 1;
            }
            Event::End(end) => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    if let Some(block) = open.take() {
                        close_block(block, content, out);
                    }
                } else if let Some(Open::Table(table)) = open.as_mut() {
                    match end {
                        TagEnd::TableCell => table.cells.push(cell_text(&content[range]).into()),
                        TagEnd::TableHead => {
                            let columns = table
                                .cells
                                .drain(..)
                                .map(|header| Column::from_header(&header))
                                .collect::<Result<Vec<_>, _>>()?;
                            table.columns = Some(columns);
                        }
                        TagEnd::TableRow => {
                            let columns = table.columns.as_deref().unwrap_or_default();
                            out.push_back(row_to_parameter(columns, &table.cells).into());
                            table.cells.clear();
                        }
                        _ => {}
                    }
                }
            }
            Event::Text(text) => {
                if let Some(Open::Code { text: code }) = open.as_mut() {
                    code.push_str(&text);
                }
            }
            // Thematic breaks carry no content.
            Event::Rule => {}
            _ => {}
        }
    }

    Ok(())
}

fn open_block(
    tag: &Tag<'_>,
    range: Range<usize>,
    content: &str,
    first_line: usize,
) -> Result<Open, TokenizeError> {
    let kind = match tag {
        Tag::Paragraph => BlockKind::Paragraph,
        Tag::Heading { .. } => BlockKind::Heading,
        Tag::BlockQuote(_) => BlockKind::Blockquote,
        Tag::List(_) => BlockKind::List,
        Tag::CodeBlock(_) => {
            return Ok(Open::Code {
                text: String::new(),
            });
        }
        Tag::Table(_) => return Ok(Open::Table(Table::default())),
        _ => {
            let line = first_line + content[..range.start].matches('\n').count();
            let snippet = content[range].lines().next().unwrap_or_default().to_string();
            return Err(TokenizeError::UnsupportedMarkup { line, snippet });
        }
    };
    Ok(Open::Text { kind, range })
}

fn close_block(block: Open, content: &str, out: &mut VecDeque<Element>) {
    match block {
        Open::Text { kind, range } => {
            let raw = &content[range];
            let text = match kind {
                BlockKind::Heading => heading_text(raw),
                BlockKind::Blockquote => blockquote_text(raw),
                _ => raw.trim().to_string(),
            };
            out.push_back(Block::new(kind, text).into());
        }
        Open::Code { text } => {
            out.push_back(Block::code(text.trim_end_matches('\n')).into());
        }
        // Rows were emitted as they closed.
        Open::Table(_) => {}
    }
}

/// Heading text without ATX markers or the setext underline.
fn heading_text(raw: &str) -> String {
    let raw = raw.trim();
    if raw.starts_with('#') {
        let text = raw.trim_start_matches('#').trim();
        let without_closing = text.trim_end_matches('#');
        if without_closing.is_empty() || without_closing.ends_with(' ') {
            without_closing.trim().to_string()
        } else {
            text.to_string()
        }
    } else {
        match raw.rsplit_once('\n') {
            Some((text, underline))
                if underline.trim().chars().all(|c| c == '=' || c == '-') =>
            {
                text.trim().to_string()
            }
            _ => raw.to_string(),
        }
    }
}

/// Block quote text without `>` markers.
fn blockquote_text(raw: &str) -> String {
    raw.lines()
        .map(|line| {
            let line = line.trim_start();
            match line.strip_prefix('>') {
                Some(rest) => rest.strip_prefix(' ').unwrap_or(rest),
                None => line,
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Cell text without the surrounding pipes.
fn cell_text(raw: &str) -> &str {
    let cell = raw.trim();
    let cell = cell.strip_prefix('|').unwrap_or(cell);
    let cell = match cell.strip_suffix('|') {
        Some(stripped) if !stripped.ends_with('\\') => stripped,
        _ => cell,
    };
    cell.trim()
}
