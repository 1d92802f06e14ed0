//! Error types for the synchronization pipeline.
//!
//! Faults are grouped by where they originate:
//!
//! - [`FetchError`] - retrieval of a documentation page failed
//! - [`TokenizeError`] - the page contains markup or a payload we do not understand
//! - [`DriftError`] - the page no longer matches its recorded expectation
//! - [`SchemaError`] - a build action configured the schema inconsistently
//! - [`EmitError`] - generated declarations could not be produced or written
//!
//! A single document collects its fault as a [`DocumentError`]; the run
//! reports every failed document together through [`RunError::Documents`].
//! Registering a symbol name twice is not an error anywhere in this crate.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::element::Element;
use crate::page::Endpoint;
use crate::schema::SymbolKind;

/// Retrieval failures. These come from the network collaborator and are
/// passed through unchanged.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("GET {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// No page registered under the URL (static fetcher)
    #[error("no page available for {0}")]
    NotFound(String),
}

/// Grammar faults: unrecognized markup or a malformed embedded payload.
#[derive(Debug, Error)]
pub enum TokenizeError {
    /// A `[block:...]` directive of a kind we do not handle.
    #[error("unsupported directive `[block:{kind}]` at line {line}")]
    UnsupportedDirective { kind: String, line: usize },

    /// A directive whose JSON content does not parse into the expected shape.
    #[error("malformed `[block:{kind}]` directive at line {line}: {source}")]
    MalformedDirective {
        kind: String,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    /// A directive opened but never closed with `[/block]`.
    #[error("directive `[block:{kind}]` opened at line {line} is never closed")]
    UnterminatedDirective { kind: String, line: usize },

    /// A parameter directive declaring rows or columns its data has no cells for.
    #[error("parameter table at line {line} declares {rows} row(s) and {cols} column(s) beyond its data")]
    TableShape { line: usize, rows: usize, cols: usize },

    /// A parameter table column header outside the alias table.
    #[error("unknown table header {header:?}")]
    UnknownHeader { header: String },

    /// A standard markup block the tokenizer has no element for.
    #[error("unsupported markup at line {line}: {snippet:?}")]
    UnsupportedMarkup { line: usize, snippet: String },

    /// The page HTML has no element carrying the payload attribute.
    #[error("page has no element carrying the `{attribute}` payload")]
    MissingPayload { attribute: String },

    /// The payload attribute is present but is not the expected JSON.
    #[error("page payload is not valid: {0}")]
    MalformedPayload(#[source] serde_json::Error),
}

/// What exactly differed between the live page and its expectation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "drift", rename_all = "snake_case")]
pub enum DriftKind {
    /// The next live element differs from the expected one.
    Mismatch { expected: Element, actual: Element },
    /// An expectation was declared after the live elements ran out.
    Missing { expected: Element },
    /// Live elements remain after every expectation was declared.
    Leftover { actual: Element, remaining: usize },
    /// The endpoint description differs from the expected one.
    Endpoint {
        expected: Box<Endpoint>,
        actual: Box<Endpoint>,
    },
    /// An endpoint was expected but the page does not describe one.
    MissingEndpoint { expected: Box<Endpoint> },
    /// The page describes an endpoint that no expectation covered.
    UnexpectedEndpoint { actual: Box<Endpoint> },
    /// The URL template uses a placeholder that no path parameter declares.
    UndeclaredPathParameter { url: String, parameter: String },
}

impl fmt::Display for DriftKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriftKind::Mismatch { expected, actual } => {
                write!(f, "expected {expected}, found {actual}")
            }
            DriftKind::Missing { expected } => {
                write!(f, "expected {expected}, found end of page")
            }
            DriftKind::Leftover { actual, remaining } => write!(
                f,
                "{remaining} element(s) left unexpected, starting with {actual}"
            ),
            DriftKind::Endpoint { expected, actual } => write!(
                f,
                "expected endpoint {} {} ({} parameters), found {} {} ({} parameters)",
                expected.method,
                expected.url,
                expected.parameters.len(),
                actual.method,
                actual.url,
                actual.parameters.len()
            ),
            DriftKind::MissingEndpoint { expected } => write!(
                f,
                "expected endpoint {} {}, page describes none",
                expected.method, expected.url
            ),
            DriftKind::UnexpectedEndpoint { actual } => write!(
                f,
                "page describes endpoint {} {} but none was expected",
                actual.method, actual.url
            ),
            DriftKind::UndeclaredPathParameter { url, parameter } => write!(
                f,
                "URL template {url} uses {{{parameter}}} but no path parameter declares it"
            ),
        }
    }
}

/// The live documentation no longer matches its recorded expectation.
///
/// Carries the document, the element position (zero-based) and both sides of
/// the comparison so a human can decide whether to update the fixture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("documentation drift in `{document}` at element {position}: {kind}")]
pub struct DriftError {
    pub document: String,
    pub position: usize,
    pub kind: DriftKind,
}

/// Schema-configuration faults raised by build actions or by finalization.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// A name is already taken by a symbol of an incompatible kind.
    #[error("symbol `{name}` is already a {existing}, cannot register it as a {requested}")]
    KindConflict {
        name: String,
        existing: SymbolKind,
        requested: SymbolKind,
    },

    /// A symbol reference that resolves to nothing.
    #[error("unknown symbol `{name}`")]
    UnknownSymbol { name: String },

    /// Fields were added to a symbol kind that has none.
    #[error("symbol `{name}` is a {kind} and cannot hold fields")]
    NotAFieldContainer { name: String, kind: SymbolKind },

    /// A field with the same name but a different shape already exists.
    #[error("field `{field}` of `{symbol}` is already declared with a different shape")]
    FieldConflict { symbol: String, field: String },

    /// Literal inference on a parameter that does not describe a constant.
    #[error("field `{field}` is not a constant: {text:?} is not a quoted literal")]
    NotALiteral { field: String, text: String },

    /// A union member (or variant field) resolves no discriminator value.
    #[error("`{member}` resolves no discriminator value for union `{union}`")]
    UnresolvedDiscriminator { union: String, member: String },
}

/// Failures of the emission stage.
#[derive(Debug, Error)]
pub enum EmitError {
    /// Generated tokens do not form valid Rust.
    #[error("generated code for `{scope}` is invalid: {source}")]
    InvalidCode {
        scope: String,
        #[source]
        source: syn::Error,
    },

    /// An identifier could not be derived from a symbol or field name.
    #[error("cannot derive a Rust identifier from {0:?}")]
    InvalidIdentifier(String),

    /// Failed to write an output file.
    #[error("failed to write output file '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Everything that can abort a single document's task.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("retrieval fault: {0}")]
    Fetch(#[from] FetchError),

    #[error("grammar fault: {0}")]
    Grammar(#[from] TokenizeError),

    #[error(transparent)]
    Drift(#[from] DriftError),

    #[error("schema fault: {0}")]
    Schema(#[from] SchemaError),
}

/// A failed document together with its fault.
#[derive(Debug)]
pub struct DocumentFailure {
    pub document: String,
    pub error: DocumentError,
}

impl fmt::Display for DocumentFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.document, self.error)
    }
}

/// Failure of a whole synchronization run.
#[derive(Debug, Error)]
pub enum RunError {
    /// One or more documents failed; emission did not run.
    #[error("{} document(s) failed:\n{}", .0.len(), render_failures(.0))]
    Documents(Vec<DocumentFailure>),

    /// The symbol graph is inconsistent; emission did not run.
    #[error("schema finalization failed: {0}")]
    Finalize(#[source] SchemaError),

    /// The emitter failed.
    #[error("emission failed: {0}")]
    Emit(#[from] EmitError),
}

fn render_failures(failures: &[DocumentFailure]) -> String {
    failures
        .iter()
        .map(|failure| format!("  {failure}"))
        .collect::<Vec<_>>()
        .join("\n")
}
