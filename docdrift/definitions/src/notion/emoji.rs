//! The emoji object.

use docdrift_lib::compare::Comparator;
use docdrift_lib::element::{Block, Parameter};
use docdrift_lib::errors::DriftError;
use docdrift_lib::page::Page;
use docdrift_lib::pipeline::Conversion;
use docdrift_lib::schema::{DocumentBuilder, SymbolRef, TypeRef};

use super::icon;

pub const URL: &str = "/reference/emoji-object";

const BODY: &str = include_str!("../../fixtures/emoji.md");

pub fn recorded_page() -> Page {
    Page::new("Emoji", BODY)
}

fn emoji() -> SymbolRef {
    SymbolRef::global("Emoji")
}

pub struct Emoji;

impl Conversion for Emoji {
    fn name(&self) -> &str {
        "emoji"
    }

    fn url(&self) -> &str {
        URL
    }

    fn expect(&self, c: &mut Comparator<'_, DocumentBuilder>) -> Result<(), DriftError> {
        c.expect_block(Block::paragraph(
            "An emoji object contains information about an emoji character. It is most often used to represent an emoji that is rendered as a page icon in the Notion UI.",
        ))?
        .output(|block, b| {
            let emoji = b.add_global_record("Emoji", &block.text)?;
            let icon = icon(b)?;
            b.register_member(&icon, &emoji, None);
            Ok(())
        });

        c.expect_parameter(Parameter::new(
            "`type`",
            "`\"emoji\"`",
            "The constant string `\"emoji\"` that represents the object type.",
            "`\"emoji\"`",
        ))?
        .output(|p, b| b.add_literal_field(&emoji(), p).map(drop));
        c.expect_parameter(Parameter::new(
            "`emoji`",
            "`string`",
            "The emoji character.",
            "`\"😻\"`",
        ))?
        .output(|p, b| b.add_field(&emoji(), p, TypeRef::String, &[]).map(drop));

        c.expect_block(Block::code(r#"{"type": "emoji", "emoji": "😻"}"#))?
            .output(|block, b| {
                let icon = icon(b)?;
                b.add_unmarshal_check(&emoji(), &block.text, None);
                b.add_unmarshal_check(&icon, &block.text, None);
                Ok(())
            });

        Ok(())
    }
}
