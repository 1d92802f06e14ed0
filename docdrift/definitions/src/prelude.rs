//! Convenient re-exports for working with documentation definitions.
//!
//! ## Examples
//!
//! ```
//! use docdrift_definitions::prelude::*;
//!
//! assert_eq!(conversions().len(), notion::conversions().len());
//! ```

pub use crate::notion;
pub use crate::{conversions, recorded_pages};

pub use docdrift_lib::compare::Comparator;
pub use docdrift_lib::element::{Block, Parameter};
pub use docdrift_lib::errors::DriftError;
pub use docdrift_lib::page::{Endpoint, EndpointParameter, ParameterLocation, RestMethod};
pub use docdrift_lib::pipeline::Conversion;
pub use docdrift_lib::schema::{DocumentBuilder, FieldOption, SymbolRef, TypeRef};
