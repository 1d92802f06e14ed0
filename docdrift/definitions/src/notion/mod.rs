//! Notion API reference.
//!
//! Object pages (`user`, `emoji`, `file`) define the data model; endpoint
//! pages (`retrieve_user`) additionally carry an endpoint description.
//!
//! ## Shared symbols
//!
//! | Symbol | Kind | Contributed by |
//! |--------|------|----------------|
//! | `User` | closed union on `type` | [`user`] |
//! | `Icon` | open union on `type` | [`emoji`], [`file`] |
//! | `File` | closed union on `type` | [`file`] |
//! | `Emoji` | record | [`emoji`] |
//!
//! ## Resources
//!
//! - [API reference](https://developers.notion.com/reference/intro)

pub mod emoji;
pub mod file;
pub mod retrieve_user;
pub mod user;

use docdrift_lib::errors::SchemaError;
use docdrift_lib::page::Page;
use docdrift_lib::pipeline::Conversion;
use docdrift_lib::schema::{DocumentBuilder, SymbolRef};

/// Base URL the conversion URLs are relative to.
pub const BASE_URL: &str = "https://developers.notion.com";

/// Page and database icons: an emoji or a file.
const ICON: &str = "Icon";

fn icon(b: &mut DocumentBuilder) -> Result<SymbolRef, SchemaError> {
    b.add_open_union_if_absent(ICON, "type")
}

pub fn conversions() -> Vec<Box<dyn Conversion>> {
    vec![
        Box::new(user::User),
        Box::new(emoji::Emoji),
        Box::new(file::File),
        Box::new(retrieve_user::RetrieveUser),
    ]
}

/// The pages as they looked when the expectations were recorded, keyed by
/// conversion URL.
pub fn recorded_pages() -> Vec<(&'static str, Page)> {
    vec![
        (user::URL, user::recorded_page()),
        (emoji::URL, emoji::recorded_page()),
        (file::URL, file::recorded_page()),
        (retrieve_user::URL, retrieve_user::recorded_page()),
    ]
}
