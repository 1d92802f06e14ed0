//! The file object.
//!
//! A closed union on `type`: `file` for Notion-hosted files, `external` for
//! linked ones. The payload tables carry no property row for the variant
//! field itself, so the headings introduce it.

use docdrift_lib::compare::Comparator;
use docdrift_lib::element::{Block, Parameter};
use docdrift_lib::errors::{DriftError, SchemaError};
use docdrift_lib::page::Page;
use docdrift_lib::pipeline::Conversion;
use docdrift_lib::schema::{DocumentBuilder, FieldOption, SymbolRef, TypeRef};

use super::icon;

pub const URL: &str = "/reference/file-object";

const BODY: &str = include_str!("../../fixtures/file.md");

pub fn recorded_page() -> Page {
    Page::new("File", BODY)
}

fn file() -> SymbolRef {
    SymbolRef::global("File")
}

fn hosted() -> SymbolRef {
    SymbolRef::local("NotionFile")
}

fn external() -> SymbolRef {
    SymbolRef::local("ExternalFile")
}

/// Adds the variant field `name` holding `payload` to `File`.
fn variant(
    b: &mut DocumentBuilder,
    name: &str,
    payload: &str,
    comment: &str,
) -> Result<(), SchemaError> {
    b.add_record(payload, comment)?;
    b.add_field(
        &file(),
        &Parameter::new(name, "object", comment, ""),
        TypeRef::named(payload),
        &[
            FieldOption::TypeSpecific,
            FieldOption::DiscriminatorValue(name.to_string()),
        ],
    )
    .map(drop)
}

pub struct File;

impl Conversion for File {
    fn name(&self) -> &str {
        "file"
    }

    fn url(&self) -> &str {
        URL
    }

    fn expect(&self, c: &mut Comparator<'_, DocumentBuilder>) -> Result<(), DriftError> {
        c.expect_block(Block::paragraph(
            "File objects contain data about a file that is uploaded to Notion, or data about an external file that is linked to in Notion.",
        ))?
        .output(|block, b| b.add_global_closed_union("File", "type", &block.text).map(drop));

        c.expect_parameter(Parameter::new(
            "`type`",
            "`string` (enum)",
            "The type of the file object. Possible type values are: `\"external\"`, `\"file\"`.",
            "`\"external\"`",
        ))?
        .output(|p, b| b.add_field(&file(), p, TypeRef::String, &[]).map(drop));
        // Rich text objects are not modelled yet; captions stay raw JSON.
        c.expect_parameter(Parameter::new(
            "`caption`",
            "array of rich text objects",
            "The caption for the file.",
            "`[]`",
        ))?
        .output(|p, b| {
            b.add_field(
                &file(),
                p,
                TypeRef::list(TypeRef::Any),
                &[FieldOption::OmitEmpty],
            )
            .map(drop)
        });

        c.expect_block(Block::heading("Notion-hosted files"))?
            .output(|_, b| variant(b, "file", "NotionFile", "A file uploaded to Notion."));
        c.expect_parameter(Parameter::new(
            "`url`",
            "`string`",
            "An authenticated S3 URL to the file. The URL is valid for one hour.",
            "`\"https://s3.us-west-2.amazonaws.com/secure.notion-static.com/9bc6c6e0.png\"`",
        ))?
        .output(|p, b| b.add_field(&hosted(), p, TypeRef::String, &[]).map(drop));
        c.expect_parameter(Parameter::new(
            "`expiry_time`",
            "`string` (ISO 8601 date time)",
            "The date and time when the link expires.",
            "`\"2020-03-17T19:10:04.968Z\"`",
        ))?
        .output(|p, b| b.add_field(&hosted(), p, TypeRef::Timestamp, &[]).map(drop));

        c.expect_block(Block::heading("External files"))?
            .output(|_, b| variant(b, "external", "ExternalFile", "A file linked from elsewhere."));
        c.expect_parameter(Parameter::new(
            "`url`",
            "`string`",
            "A link to the externally hosted content.",
            "`\"https://website.domain/files/doc.txt\"`",
        ))?
        .output(|p, b| b.add_field(&external(), p, TypeRef::String, &[]).map(drop));

        c.expect_block(Block::blockquote(
            "Icons\nPage and database icons can be files as well as emoji.",
        ))?
        .output(|_, b| {
            let icon = icon(b)?;
            b.register_member(&icon, &file(), None);
            Ok(())
        });

        c.expect_block(Block::code(
            r#"{"type": "external", "external": {"url": "https://website.domain/files/doc.txt"}}"#,
        ))?
        .output(|block, b| {
            b.add_unmarshal_check(&file(), &block.text, None);
            Ok(())
        });

        Ok(())
    }
}
