//! Element model produced by the tokenizer.
//!
//! A documentation page is reduced to a flat, ordered sequence of [`Element`]s.
//! Elements are plain values: they are compared structurally by the
//! [`Comparator`](crate::compare::Comparator) and handed to build actions, but
//! never mutated after the tokenizer produced them.
//!
//! ## Examples
//!
//! ```
//! use docdrift_lib::element::{Block, BlockKind, Element, Parameter};
//!
//! let heading = Element::from(Block::heading("User object"));
//! let id = Element::from(Parameter::new("`id`", "`string`", "Unique identifier.", ""));
//!
//! assert_eq!(heading, Element::Block(Block::new(BlockKind::Heading, "User object")));
//! assert!(matches!(id, Element::Parameter(_)));
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Kind tag of a [`Block`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum BlockKind {
    /// A paragraph of prose.
    Paragraph,
    /// A section heading (any level).
    Heading,
    /// A quotation or a callout directive.
    Blockquote,
    /// A code sample, fenced or from a code directive.
    FencedCode,
    /// A bulleted or numbered list.
    List,
}

/// A text block with a kind tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Block {
    pub kind: BlockKind,
    pub text: String,
}

impl Block {
    pub fn new(kind: BlockKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::new(BlockKind::Paragraph, text)
    }

    pub fn heading(text: impl Into<String>) -> Self {
        Self::new(BlockKind::Heading, text)
    }

    pub fn blockquote(text: impl Into<String>) -> Self {
        Self::new(BlockKind::Blockquote, text)
    }

    pub fn code(text: impl Into<String>) -> Self {
        Self::new(BlockKind::FencedCode, text)
    }

    pub fn list(text: impl Into<String>) -> Self {
        Self::new(BlockKind::List, text)
    }
}

/// One row of a parameter table.
///
/// Cell text is kept verbatim (inline markup such as backticks included), so
/// expectations describe exactly what the upstream page shows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Parameter {
    pub property: String,
    #[serde(rename = "type")]
    pub ty: String,
    pub description: String,
    pub example_value: String,
}

impl Parameter {
    pub fn new(
        property: impl Into<String>,
        ty: impl Into<String>,
        description: impl Into<String>,
        example_value: impl Into<String>,
    ) -> Self {
        Self {
            property: property.into(),
            ty: ty.into(),
            description: description.into(),
            example_value: example_value.into(),
        }
    }

    /// The property name with surrounding backticks and whitespace removed.
    ///
    /// ```
    /// use docdrift_lib::element::Parameter;
    ///
    /// let p = Parameter::new(" `rich_text` ", "", "", "");
    /// assert_eq!(p.field_name(), "rich_text");
    /// ```
    pub fn field_name(&self) -> &str {
        strip_code_span(&self.property)
    }
}

/// Removes one level of inline-code backticks and surrounding whitespace.
pub(crate) fn strip_code_span(text: &str) -> &str {
    text.trim().trim_matches('`').trim()
}

/// A token produced from a documentation page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "element", rename_all = "snake_case")]
pub enum Element {
    Block(Block),
    Parameter(Parameter),
}

impl Element {
    pub fn as_block(&self) -> Option<&Block> {
        match self {
            Element::Block(block) => Some(block),
            Element::Parameter(_) => None,
        }
    }

    pub fn as_parameter(&self) -> Option<&Parameter> {
        match self {
            Element::Parameter(parameter) => Some(parameter),
            Element::Block(_) => None,
        }
    }
}

impl From<Block> for Element {
    fn from(block: Block) -> Self {
        Element::Block(block)
    }
}

impl From<Parameter> for Element {
    fn from(parameter: Parameter) -> Self {
        Element::Parameter(parameter)
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Element::Block(block) => write!(f, "{} {:?}", block.kind, block.text),
            Element::Parameter(p) => write!(
                f,
                "parameter {{ property: {:?}, type: {:?}, description: {:?}, example: {:?} }}",
                p.property, p.ty, p.description, p.example_value
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn block_kind_display_is_kebab_case() {
        assert_eq!(BlockKind::FencedCode.to_string(), "fenced-code");
        assert_eq!(BlockKind::Paragraph.to_string(), "paragraph");
    }

    #[test]
    fn block_kind_from_str_round_trips_every_variant() {
        for kind in BlockKind::iter() {
            assert_eq!(BlockKind::from_str(&kind.to_string()).unwrap(), kind);
        }
    }

    #[test]
    fn equality_is_structural() {
        assert_eq!(Block::paragraph("a"), Block::paragraph("a"));
        assert_ne!(Block::paragraph("a"), Block::heading("a"));
        assert_ne!(
            Element::from(Parameter::new("id", "string", "", "")),
            Element::from(Parameter::new("id", "string", "", "\"x\""))
        );
    }

    #[test]
    fn field_name_strips_code_span() {
        assert_eq!(Parameter::new("`object`", "", "", "").field_name(), "object");
        assert_eq!(Parameter::new("plain", "", "", "").field_name(), "plain");
    }

    #[test]
    fn accessors_select_the_matching_variant() {
        let element = Element::from(Block::list("- a"));
        assert!(element.as_block().is_some());
        assert!(element.as_parameter().is_none());
    }

    #[test]
    fn serializes_with_element_tag() {
        let json = serde_json::to_value(Element::from(Block::heading("Title"))).unwrap();
        assert_eq!(json["element"], "block");
        assert_eq!(json["kind"], "heading");
        assert_eq!(json["text"], "Title");
    }
}
