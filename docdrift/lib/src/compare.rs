//! Expectation comparator: the drift detector.
//!
//! A [`Comparator`] walks a page's live elements against a hand-written
//! expectation, one call per element. Every call must match the next live
//! element exactly; the first difference is a [`DriftError`] carrying both
//! values and the position. There is no soft diff: a drifted page has to be
//! looked at by a human before the schema may change.
//!
//! Build actions attached through [`Match::output`] are queued, not run.
//! [`Comparator::finish`] runs them in declaration order, and only once the
//! whole page matched, so a page with drift never touches the schema.
//!
//! ## Examples
//!
//! ```
//! use std::sync::Arc;
//! use docdrift_lib::compare::Comparator;
//! use docdrift_lib::element::{Block, Element, Parameter};
//! use docdrift_lib::schema::{DocumentBuilder, Registry, SymbolRef, TypeRef};
//!
//! let elements = vec![
//!     Element::from(Block::paragraph("The user object.")),
//!     Element::from(Parameter::new("`id`", "`string`", "Identifier.", "")),
//! ];
//! let mut compare = Comparator::new("user", elements);
//! compare
//!     .expect_block(Block::paragraph("The user object."))?
//!     .output(|block, b: &mut DocumentBuilder| b.add_record("User", &block.text).map(drop));
//! compare
//!     .expect_parameter(Parameter::new("`id`", "`string`", "Identifier.", ""))?
//!     .output(|p, b| b.add_field(&SymbolRef::local("User"), p, TypeRef::String, &[]).map(drop));
//!
//! let mut builder = DocumentBuilder::new("user", Arc::new(Registry::new()));
//! compare.finish(&mut builder).unwrap();
//! assert_eq!(builder.into_symbols().symbols[0].fields().len(), 1);
//! # Ok::<(), docdrift_lib::errors::DriftError>(())
//! ```

use tracing::{debug, warn};

use crate::element::{Block, Element, Parameter};
use crate::errors::{DocumentError, DriftError, DriftKind, SchemaError};
use crate::page::Endpoint;

/// A queued build action.
type Action<'a, S> = Box<dyn FnOnce(&mut S) -> Result<(), SchemaError> + 'a>;

/// Positional comparison of live elements against an expectation.
///
/// `S` is the build session the queued actions receive at
/// [`finish`](Comparator::finish); in the pipeline it is a
/// [`DocumentBuilder`](crate::schema::DocumentBuilder).
pub struct Comparator<'a, S> {
    document: String,
    elements: Vec<Element>,
    cursor: usize,
    endpoint: Option<Endpoint>,
    endpoint_expected: bool,
    actions: Vec<Action<'a, S>>,
}

/// A successful expectation. Attach at most one build action with
/// [`output`](Match::output); dropping the handle attaches none.
pub struct Match<'c, 'a, S, T> {
    matched: T,
    actions: &'c mut Vec<Action<'a, S>>,
}

/// The handle returned by [`Comparator::expect_endpoint`].
pub type EndpointMatch<'c, 'a, S> = Match<'c, 'a, S, Endpoint>;

impl<'a, S, T: 'a> Match<'_, 'a, S, T> {
    /// Queues `action` to run with the matched value once the page finished.
    pub fn output(self, action: impl FnOnce(&T, &mut S) -> Result<(), SchemaError> + 'a) {
        let matched = self.matched;
        self.actions
            .push(Box::new(move |session| action(&matched, session)));
    }

    pub fn matched(&self) -> &T {
        &self.matched
    }
}

impl<'a, S> Comparator<'a, S> {
    pub fn new(document: impl Into<String>, elements: Vec<Element>) -> Self {
        Self {
            document: document.into(),
            elements,
            cursor: 0,
            endpoint: None,
            endpoint_expected: false,
            actions: Vec::new(),
        }
    }

    /// Sets the endpoint description the page carries, if any.
    pub fn with_endpoint(mut self, endpoint: Option<Endpoint>) -> Self {
        self.endpoint = endpoint;
        self
    }

    pub fn document(&self) -> &str {
        &self.document
    }

    /// Zero-based position of the next live element.
    pub fn position(&self) -> usize {
        self.cursor
    }

    /// Live elements not yet consumed.
    pub fn remaining(&self) -> usize {
        self.elements.len() - self.cursor
    }

    /// Expects the next live element to be exactly `expected`.
    pub fn expect_block(&mut self, expected: Block) -> Result<Match<'_, 'a, S, Block>, DriftError> {
        let matched = self.consume(expected)?;
        Ok(Match {
            matched,
            actions: &mut self.actions,
        })
    }

    /// Expects the next live element to be exactly the parameter row `expected`.
    pub fn expect_parameter(
        &mut self,
        expected: Parameter,
    ) -> Result<Match<'_, 'a, S, Parameter>, DriftError> {
        let matched = self.consume(expected)?;
        Ok(Match {
            matched,
            actions: &mut self.actions,
        })
    }

    /// Advances past the next live element if it equals `expected`. On
    /// success the live element and `expected` are equal, so `expected` is
    /// handed back as the matched value.
    fn consume<T: Clone + Into<Element>>(&mut self, expected: T) -> Result<T, DriftError> {
        let position = self.cursor;
        let element: Element = expected.clone().into();
        match self.elements.get(position) {
            Some(actual) if *actual == element => {
                debug!(document = %self.document, position, element = %actual, "matched");
                self.cursor += 1;
                Ok(expected)
            }
            Some(actual) => Err(self.drift(DriftKind::Mismatch {
                expected: element,
                actual: actual.clone(),
            })),
            None => Err(self.drift(DriftKind::Missing { expected: element })),
        }
    }

    /// Expects the page to describe exactly `expected` as its endpoint.
    ///
    /// Endpoint descriptions live beside the element stream, so the cursor
    /// does not move. The page's URL template must also declare every
    /// placeholder as a path parameter.
    pub fn expect_endpoint(
        &mut self,
        expected: Endpoint,
    ) -> Result<EndpointMatch<'_, 'a, S>, DriftError> {
        self.endpoint_expected = true;
        let actual = match &self.endpoint {
            None => {
                return Err(self.drift(DriftKind::MissingEndpoint {
                    expected: Box::new(expected),
                }));
            }
            Some(actual) if *actual != expected => {
                return Err(self.drift(DriftKind::Endpoint {
                    expected: Box::new(expected),
                    actual: Box::new(actual.clone()),
                }));
            }
            Some(actual) => actual,
        };

        if let Some(parameter) = actual.undeclared_path_parameter() {
            return Err(self.drift(DriftKind::UndeclaredPathParameter {
                url: actual.url.clone(),
                parameter: parameter.to_string(),
            }));
        }

        debug!(document = %self.document, method = %expected.method, url = %expected.url, "endpoint matched");
        Ok(Match {
            matched: expected,
            actions: &mut self.actions,
        })
    }

    /// Queues an action without comparing anything.
    ///
    /// For API behaviour the upstream documentation is known to leave out.
    pub fn undocumented(&mut self, action: impl FnOnce(&mut S) -> Result<(), SchemaError> + 'a) {
        self.actions.push(Box::new(action));
    }

    /// Checks that every live element (and the endpoint description, if the
    /// page has one) was expected, then runs the queued actions against
    /// `session` in declaration order.
    ///
    /// ## Errors
    ///
    /// - [`DocumentError::Drift`] with [`DriftKind::Leftover`] if live elements remain
    /// - [`DocumentError::Drift`] with [`DriftKind::UnexpectedEndpoint`] if the
    ///   page's endpoint was never expected
    /// - [`DocumentError::Schema`] with the first failing action's error
    pub fn finish(self, session: &mut S) -> Result<(), DocumentError> {
        if let Some(actual) = self.elements.get(self.cursor) {
            let remaining = self.remaining();
            warn!(document = %self.document, remaining, "unexpected trailing elements");
            return Err(self
                .drift(DriftKind::Leftover {
                    actual: actual.clone(),
                    remaining,
                })
                .into());
        }
        if let Some(actual) = &self.endpoint
            && !self.endpoint_expected
        {
            return Err(self
                .drift(DriftKind::UnexpectedEndpoint {
                    actual: Box::new(actual.clone()),
                })
                .into());
        }

        debug!(document = %self.document, actions = self.actions.len(), "running build actions");
        for action in self.actions {
            action(session)?;
        }
        Ok(())
    }

    fn drift(&self, kind: DriftKind) -> DriftError {
        DriftError {
            document: self.document.clone(),
            position: self.cursor,
            kind,
        }
    }
}
