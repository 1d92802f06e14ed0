//! Symbol registry and schema builder.
//!
//! Build actions attached to matched documentation elements assemble the
//! object model through two scopes:
//!
//! - a [`DocumentBuilder`] per document, holding that document's symbols
//! - one [`Registry`] per run, shared by all documents, holding global
//!   symbols, the union membership registry and unmarshal checks
//!
//! Registration is idempotent by name. Nothing is resolved until
//! [`Registry::finalize`], which validates unions and references and produces
//! a [`SymbolGraph`] whose order does not depend on how document tasks were
//! scheduled.
//!
//! ## Examples
//!
//! ```
//! use std::sync::Arc;
//! use docdrift_lib::element::Parameter;
//! use docdrift_lib::schema::{DocumentBuilder, Registry, TypeRef};
//!
//! let registry = Arc::new(Registry::new());
//!
//! let mut emoji = DocumentBuilder::new("emoji", registry.clone());
//! let union = emoji.add_open_union_if_absent("FileOrEmoji", "type").unwrap();
//! let record = emoji.add_record("Emoji", "An emoji icon.").unwrap();
//! emoji
//!     .add_literal_field(&record, &Parameter::new("`type`", "`\"emoji\"`", "", ""))
//!     .unwrap();
//! emoji
//!     .add_field(&record, &Parameter::new("`emoji`", "`string`", "", ""), TypeRef::String, &[])
//!     .unwrap();
//! emoji.register_member(&union, &record, None);
//!
//! let graph = registry.finalize(vec![emoji.into_symbols()]).unwrap();
//! assert_eq!(graph.documents[0].symbols.len(), 1);
//! assert_eq!(graph.members_of("FileOrEmoji").count(), 1);
//! ```

mod builder;
mod registry;
mod symbol;

pub use builder::DocumentBuilder;
pub use registry::{DocumentSymbols, Membership, Registry, SymbolGraph};
pub use symbol::{
    ClosedUnion, Discriminator, Field, FieldOption, Literal, OpenUnion, Record, Scope, Symbol,
    SymbolKind, SymbolRef, TypeRef, UnmarshalCheck,
};
