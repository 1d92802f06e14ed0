//! Emission of declarations from a finished [`SymbolGraph`].
//!
//! The [`Emitter`] trait is the seam between the pipeline and whatever turns
//! symbols into source text. The pipeline calls it once per document and then
//! once for the global scope, and only after [`Registry::finalize`] accepted
//! the graph.
//!
//! [`RustEmitter`] is the bundled backend. It renders every scope to one Rust
//! module:
//!
//! ```text
//! <output_dir>/
//! ├── mod.rs        # module declarations and glob re-exports
//! ├── global.rs     # global symbols, literals, unmarshal checks
//! └── <document>.rs # one per document
//! ```
//!
//! ## Safety Guarantees
//!
//! - **Validation**: generated code is parsed with `syn` before it is kept
//! - **Formatting**: output is formatted with `prettyplease`
//! - **Atomic writes**: files are written to a temp file and renamed
//!
//! [`Registry::finalize`]: crate::schema::Registry::finalize

pub mod naming;
mod rust;

use std::fs;
use std::path::{Path, PathBuf};

use proc_macro2::TokenStream;

pub use rust::RustEmitter;

use crate::errors::EmitError;
use crate::schema::{DocumentSymbols, SymbolGraph};

/// Backend that turns a finished symbol graph into output.
pub trait Emitter {
    /// Emits the symbols of one document.
    ///
    /// `graph` is the whole finished graph, for resolving references into
    /// other scopes.
    fn emit_document(
        &mut self,
        document: &DocumentSymbols,
        graph: &SymbolGraph,
    ) -> Result<(), EmitError>;

    /// Emits the global scope. Called once, after every document.
    fn emit_global(&mut self, graph: &SymbolGraph) -> Result<(), EmitError>;
}

/// One rendered output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    /// Path relative to the output directory.
    pub path: PathBuf,
    pub contents: String,
}

/// Validates generated code by parsing it as a complete Rust file.
///
/// ## Errors
///
/// Returns [`EmitError::InvalidCode`] naming `scope` if the tokens do not parse.
pub fn validate_code(scope: &str, tokens: &TokenStream) -> Result<syn::File, EmitError> {
    syn::parse2(tokens.clone()).map_err(|source| EmitError::InvalidCode {
        scope: scope.to_string(),
        source,
    })
}

/// Formats a parsed file with prettyplease, behind a generated-code notice.
pub fn format_code(file: &syn::File) -> String {
    let formatted = prettyplease::unparse(file);
    format!(
        "// This code was automatically generated by docdrift. Do not edit manually.\n\n{}",
        formatted
    )
}

/// Writes content to a file atomically using temp file + rename.
///
/// ## Errors
///
/// Returns [`EmitError::Write`] if the parent directory cannot be created, the
/// temp file cannot be written or the rename fails.
pub fn write_atomic(path: &Path, content: &str) -> Result<(), EmitError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| EmitError::Write {
            path: parent.display().to_string(),
            source: e,
        })?;
    }

    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, content).map_err(|e| EmitError::Write {
        path: temp_path.display().to_string(),
        source: e,
    })?;

    fs::rename(&temp_path, path).map_err(|e| EmitError::Write {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(())
}
