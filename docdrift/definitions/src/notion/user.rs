//! The user object.

use docdrift_lib::compare::Comparator;
use docdrift_lib::element::{Block, Parameter};
use docdrift_lib::errors::DriftError;
use docdrift_lib::page::Page;
use docdrift_lib::pipeline::Conversion;
use docdrift_lib::schema::{DocumentBuilder, FieldOption, SymbolRef, TypeRef};

pub const URL: &str = "/reference/user";

const BODY: &str = include_str!("../../fixtures/user.md");

pub fn recorded_page() -> Page {
    Page::new("User", BODY)
}

fn user() -> SymbolRef {
    SymbolRef::global("User")
}

fn person() -> SymbolRef {
    SymbolRef::local("Person")
}

fn bot() -> SymbolRef {
    SymbolRef::local("Bot")
}

/// Renames a dotted sub-property (`person.email`) to its own field name.
fn nested(parameter: &Parameter) -> Parameter {
    let name = parameter
        .field_name()
        .rsplit_once('.')
        .map(|(_, name)| name)
        .unwrap_or_else(|| parameter.field_name());
    Parameter {
        property: name.to_string(),
        ..parameter.clone()
    }
}

pub struct User;

impl Conversion for User {
    fn name(&self) -> &str {
        "user"
    }

    fn url(&self) -> &str {
        URL
    }

    fn expect(&self, c: &mut Comparator<'_, DocumentBuilder>) -> Result<(), DriftError> {
        c.expect_block(Block::paragraph(
            "The User object represents a user in a Notion workspace. Users include full workspace members, guests, and integrations.",
        ))?
        .output(|block, b| b.add_global_closed_union("User", "type", &block.text).map(drop));

        c.expect_block(Block::heading("All users"))?;
        c.expect_parameter(Parameter::new(
            "`object`",
            "`\"user\"`",
            "Always `\"user\"`",
            "`\"user\"`",
        ))?
        .output(|p, b| b.add_literal_field(&user(), p).map(drop));
        c.expect_parameter(Parameter::new(
            "`id`",
            "`string` (UUID)",
            "Unique identifier for this user.",
            "`\"e79a0b74-3aba-4149-9f74-0bb5791a6ee6\"`",
        ))?
        .output(|p, b| b.add_field(&user(), p, TypeRef::String, &[]).map(drop));
        // Documented as optional, but only partial users omit it and those
        // are never decoded as `User`.
        c.expect_parameter(Parameter::new(
            "`type`",
            "`string` (optional, enum)",
            "Type of the user. Possible values are `\"person\"` and `\"bot\"`.",
            "`\"person\"`",
        ))?
        .output(|p, b| b.add_field(&user(), p, TypeRef::String, &[]).map(drop));
        c.expect_parameter(Parameter::new(
            "`name`",
            "`string` (optional)",
            "User's name, as displayed in Notion.",
            "`\"Avocado Lovelace\"`",
        ))?
        .output(|p, b| {
            b.add_field(&user(), p, TypeRef::String, &[FieldOption::Optional])
                .map(drop)
        });
        c.expect_parameter(Parameter::new(
            "`avatar_url`",
            "`string` (optional)",
            "Chosen avatar image.",
            "`\"https://secure.notion-static.com/e6a352a8.jpg\"`",
        ))?
        .output(|p, b| {
            b.add_field(&user(), p, TypeRef::String, &[FieldOption::Optional])
                .map(drop)
        });

        c.expect_block(Block::heading("People"))?;
        c.expect_block(Block::paragraph(
            "User objects that represent people have the `type` property set to `\"person\"`. These objects also have the following properties:",
        ))?;
        c.expect_parameter(Parameter::new(
            "`person`",
            "`object`",
            "Properties only present for non-bot users.",
            "`{\"email\": \"avo@example.org\"}`",
        ))?
        .output(|p, b| {
            b.add_record("Person", p.description.trim())?;
            b.add_field(
                &user(),
                p,
                TypeRef::named("Person"),
                &[
                    FieldOption::TypeSpecific,
                    FieldOption::DiscriminatorValue("person".into()),
                ],
            )
            .map(drop)
        });
        c.expect_parameter(Parameter::new(
            "`person.email`",
            "`string`",
            "Email address of person.",
            "`\"avo@example.org\"`",
        ))?
        .output(|p, b| {
            b.add_field(&person(), &nested(p), TypeRef::String, &[])
                .map(drop)
        });

        c.expect_block(Block::heading("Bots"))?;
        c.expect_block(Block::paragraph(
            "A user object's `type` property is `\"bot\"` when the user object represents a bot. A bot user object has the following properties:",
        ))?;
        c.expect_parameter(Parameter::new(
            "`bot`",
            "`object`",
            "Data about the bot, including its owner and workspace name.",
            "`{}`",
        ))?
        .output(|p, b| {
            b.add_record("Bot", p.description.trim())?;
            b.add_field(
                &user(),
                p,
                TypeRef::named("Bot"),
                &[
                    FieldOption::TypeSpecific,
                    FieldOption::DiscriminatorValue("bot".into()),
                ],
            )
            .map(drop)
        });
        c.expect_parameter(Parameter::new(
            "`bot.workspace_name`",
            "`string` (optional)",
            "If the bot's owner is a workspace, the workspace name.",
            "`\"Ada's Notion Workspace\"`",
        ))?
        .output(|p, b| {
            b.add_field(&bot(), &nested(p), TypeRef::String, &[FieldOption::Optional])
                .map(drop)
        });
        // Bots report their workspace id since the 2022-06-28 version; the
        // table still lists only the name.
        c.undocumented(|b| {
            let workspace_id = Parameter::new("workspace_id", "string", "Workspace the bot belongs to.", "");
            b.add_field(&bot(), &workspace_id, TypeRef::String, &[FieldOption::Optional])
                .map(drop)
        });

        c.expect_block(Block::code(
            r#"{"object": "user", "id": "e79a0b74-3aba-4149-9f74-0bb5791a6ee6", "type": "person", "name": "Avocado Lovelace", "avatar_url": null, "person": {"email": "avo@example.org"}}"#,
        ))?
        .output(|block, b| {
            b.add_unmarshal_check(&user(), &block.text, None);
            Ok(())
        });

        Ok(())
    }
}
