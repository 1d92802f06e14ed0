//! Per-document build session.

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::debug;

use super::registry::{DocumentSymbols, Membership, Registry, attach_field, closed_union, intern, record};
use super::symbol::{Field, FieldOption, Scope, Symbol, SymbolRef, TypeRef};
use crate::element::{Parameter, strip_code_span};
use crate::errors::SchemaError;

/// The build session one document's actions run against.
///
/// Holds the document's own symbol table and a handle to the run's
/// [`Registry`]. [`SymbolRef`]s with [`Scope::Local`] resolve against this
/// document; [`Scope::Global`] references go to the registry.
///
/// ## Examples
///
/// ```
/// use std::sync::Arc;
/// use docdrift_lib::element::Parameter;
/// use docdrift_lib::schema::{DocumentBuilder, Registry, TypeRef};
///
/// let mut user = DocumentBuilder::new("user", Arc::new(Registry::new()));
/// let record = user.add_record("User", "A Notion user.").unwrap();
/// let id = Parameter::new("`id`", "`string` (UUIDv4)", "Unique identifier.", "");
/// user.add_field(&record, &id, TypeRef::String, &[]).unwrap();
///
/// let symbols = user.into_symbols();
/// assert_eq!(symbols.symbols[0].fields()[0].name, "id");
/// ```
#[derive(Debug)]
pub struct DocumentBuilder {
    document: String,
    symbols: IndexMap<String, Symbol>,
    registry: Arc<Registry>,
}

impl DocumentBuilder {
    pub fn new(document: impl Into<String>, registry: Arc<Registry>) -> Self {
        Self {
            document: document.into(),
            symbols: IndexMap::new(),
            registry,
        }
    }

    pub fn document(&self) -> &str {
        &self.document
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Creates (or returns) a record in this document's scope.
    pub fn add_record(&mut self, name: &str, comment: &str) -> Result<SymbolRef, SchemaError> {
        intern(&mut self.symbols, record(name, comment, None))?;
        Ok(SymbolRef::local(name))
    }

    /// Creates (or returns) a record generic over `type_parameter`.
    pub fn add_generic_record(
        &mut self,
        name: &str,
        type_parameter: &str,
        comment: &str,
    ) -> Result<SymbolRef, SchemaError> {
        intern(&mut self.symbols, record(name, comment, Some(type_parameter)))?;
        Ok(SymbolRef::local(name))
    }

    pub fn add_global_record(&mut self, name: &str, comment: &str) -> Result<SymbolRef, SchemaError> {
        self.registry.add_global_record(name, comment)
    }

    /// Creates (or returns) a closed union in this document's scope. A
    /// non-empty `discriminator_key` is seeded as a string field.
    pub fn add_closed_union(
        &mut self,
        name: &str,
        discriminator_key: &str,
        comment: &str,
    ) -> Result<SymbolRef, SchemaError> {
        intern(
            &mut self.symbols,
            closed_union(name, discriminator_key, comment),
        )?;
        Ok(SymbolRef::local(name))
    }

    pub fn add_global_closed_union(
        &mut self,
        name: &str,
        discriminator_key: &str,
        comment: &str,
    ) -> Result<SymbolRef, SchemaError> {
        self.registry
            .add_global_closed_union(name, discriminator_key, comment)
    }

    /// Open unions always live in the global scope.
    pub fn add_open_union_if_absent(
        &mut self,
        name: &str,
        discriminator_key: &str,
    ) -> Result<SymbolRef, SchemaError> {
        self.registry.add_open_union_if_absent(name, discriminator_key)
    }

    /// Registers `member` with the open union `union`.
    pub fn register_member(&mut self, union: &SymbolRef, member: &SymbolRef, type_argument: Option<&str>) {
        self.registry.register_member(Membership {
            union: union.name.clone(),
            member: member.name.clone(),
            document: match member.scope {
                Scope::Local => Some(self.document.clone()),
                Scope::Global => None,
            },
            type_argument: type_argument.map(String::from),
        });
    }

    /// Adds a field described by a documentation parameter.
    ///
    /// The field name is the parameter's property without backticks; the
    /// description becomes the field comment.
    ///
    /// ## Errors
    ///
    /// - [`SchemaError::UnknownSymbol`] if `target` does not resolve
    /// - [`SchemaError::NotAFieldContainer`] if `target` is not a record or closed union
    /// - [`SchemaError::FieldConflict`] if the field exists with another shape
    pub fn add_field(
        &mut self,
        target: &SymbolRef,
        parameter: &Parameter,
        ty: TypeRef,
        options: &[FieldOption],
    ) -> Result<Field, SchemaError> {
        let field = Field::new(parameter.field_name(), ty, parameter.description.trim())
            .with_options(options);
        debug!(target = %target.name, field = %field.name, "add field");
        self.attach(target, field)
    }

    /// Adds a field whose value is always one constant.
    ///
    /// The constant is read from the example value, or from the type text when
    /// there is no example, and must be a quoted literal (optionally wrapped in
    /// backticks). The matching `Always<Value>` literal symbol is interned in
    /// the global scope.
    ///
    /// ## Errors
    ///
    /// [`SchemaError::NotALiteral`] if the text is not a quoted literal, plus
    /// the errors of [`DocumentBuilder::add_field`].
    pub fn add_literal_field(
        &mut self,
        target: &SymbolRef,
        parameter: &Parameter,
    ) -> Result<Field, SchemaError> {
        let text = if parameter.example_value.trim().is_empty() {
            &parameter.ty
        } else {
            &parameter.example_value
        };
        let value = literal_value(text).ok_or_else(|| SchemaError::NotALiteral {
            field: parameter.field_name().to_string(),
            text: text.clone(),
        })?;

        let literal = self.registry.intern_literal(value)?;
        let mut field = Field::new(
            parameter.field_name(),
            TypeRef::Named(literal.name),
            parameter.description.trim(),
        );
        field.literal = Some(value.to_string());
        self.attach(target, field)
    }

    pub fn add_unmarshal_check(&mut self, target: &SymbolRef, payload: &str, type_argument: Option<&str>) {
        self.registry
            .add_unmarshal_check(&target.name, payload.trim(), type_argument);
    }

    /// Ends the session, returning this document's symbols in declaration order.
    pub fn into_symbols(self) -> DocumentSymbols {
        DocumentSymbols {
            document: self.document,
            symbols: self.symbols.into_values().collect(),
        }
    }

    fn attach(&mut self, target: &SymbolRef, field: Field) -> Result<Field, SchemaError> {
        match target.scope {
            Scope::Local => attach_field(&mut self.symbols, &target.name, field),
            Scope::Global => self.registry.add_global_field(&target.name, field),
        }
    }
}

/// The contents of a quoted literal such as `"user"` or `` `"user"` ``.
fn literal_value(text: &str) -> Option<&str> {
    let text = strip_code_span(text);
    let inner = text.strip_prefix('"')?.strip_suffix('"')?;
    (!inner.is_empty() && !inner.contains('"')).then_some(inner)
}
