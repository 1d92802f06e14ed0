//! Keeps a generated API client's data model in step with the upstream API
//! documentation.
//!
//! A run fetches each documentation page, reduces its body to a flat
//! sequence of [`Element`](element::Element)s, and compares that sequence
//! against an expectation recorded when the page was last reviewed. Only
//! pages that match exactly contribute to the schema: build actions attached
//! to matched elements register records, closed unions and open unions in a
//! run-scoped [`Registry`](schema::Registry). Once every page matched, the
//! registry is finalized into a [`SymbolGraph`](schema::SymbolGraph) and
//! handed to an [`Emitter`](emit::Emitter).
//!
//! ```text
//! Fetcher -> Page::from_html -> tokenize -> Comparator -> finish()
//!                                                           |
//!                                      DocumentBuilder <-- build actions
//!                                             |
//!                        Registry::finalize -> Emitter (per document, then global)
//! ```
//!
//! ## Modules
//!
//! - [`element`] - tokens a page produces
//! - [`tokenize`] - markup body to elements
//! - [`compare`] - drift detection and deferred build actions
//! - [`schema`] - symbols, scopes and finalization
//! - [`page`] - page payload and endpoint descriptions
//! - [`fetch`] - page retrieval
//! - [`emit`] - declaration output
//! - [`pipeline`] - one run over many documents
//! - [`errors`] - fault taxonomy

pub mod compare;
pub mod element;
pub mod emit;
pub mod errors;
pub mod fetch;
pub mod page;
pub mod pipeline;
pub mod schema;
pub mod tokenize;

pub use compare::{Comparator, EndpointMatch, Match};
pub use element::{Block, BlockKind, Element, Parameter};
pub use errors::{
    DocumentError, DocumentFailure, DriftError, DriftKind, EmitError, FetchError, RunError,
    SchemaError, TokenizeError,
};
pub use pipeline::{Conversion, Pipeline, select_conversions};
