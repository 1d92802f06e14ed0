//! Symbol model: the top-level items of generated output and their fields.

use std::collections::BTreeSet;

use serde::Serialize;
use strum::{Display, EnumIter};

/// Kind tag of a [`Symbol`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumIter)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    #[strum(to_string = "record")]
    Record,
    #[strum(to_string = "closed union")]
    ClosedUnion,
    #[strum(to_string = "open union")]
    OpenUnion,
    #[strum(to_string = "literal")]
    Literal,
    #[strum(to_string = "unmarshal check")]
    UnmarshalCheck,
}

/// Which symbol table a [`SymbolRef`] points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// The table of the document whose build session resolves the reference.
    Local,
    /// The single cross-document table.
    Global,
}

/// A handle to a named symbol.
///
/// References are plain names plus a scope; they stay valid across build
/// actions and are resolved against the tables only when used.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SymbolRef {
    pub name: String,
    pub scope: Scope,
}

impl SymbolRef {
    pub fn local(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scope: Scope::Local,
        }
    }

    pub fn global(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scope: Scope::Global,
        }
    }
}

/// Reference from a field to the type of its value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", content = "of", rename_all = "snake_case")]
pub enum TypeRef {
    String,
    Boolean,
    Integer,
    Number,
    /// An ISO 8601 timestamp carried as text.
    Timestamp,
    /// Arbitrary JSON.
    Any,
    /// Another symbol, by name.
    Named(String),
    /// A generic symbol applied to one type argument.
    Generic(String, Box<TypeRef>),
    List(Box<TypeRef>),
    /// A map keyed by strings.
    Map(Box<TypeRef>),
    /// The type parameter of the enclosing generic record.
    Parameter(String),
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        TypeRef::Named(name.into())
    }

    pub fn generic(name: impl Into<String>, argument: TypeRef) -> Self {
        TypeRef::Generic(name.into(), Box::new(argument))
    }

    pub fn list(item: TypeRef) -> Self {
        TypeRef::List(Box::new(item))
    }

    pub fn map(value: TypeRef) -> Self {
        TypeRef::Map(Box::new(value))
    }

    /// Names of the symbols this type refers to, outermost first.
    pub fn referenced_names(&self) -> Vec<&str> {
        match self {
            TypeRef::Named(name) => vec![name.as_str()],
            TypeRef::Generic(name, argument) => {
                let mut names = vec![name.as_str()];
                names.extend(argument.referenced_names());
                names
            }
            TypeRef::List(inner) | TypeRef::Map(inner) => inner.referenced_names(),
            _ => Vec::new(),
        }
    }
}

/// Configuration flags for [`DocumentBuilder::add_field`](super::DocumentBuilder::add_field).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldOption {
    /// Suppress the field when it is empty.
    OmitEmpty,
    /// The field may be absent.
    Optional,
    /// The field is present only for this discriminator value.
    DiscriminatorValue(String),
    /// The field is present whenever the discriminator is not empty.
    DiscriminatorNotEmpty,
    /// The field carries the per-variant payload of a closed union.
    TypeSpecific,
}

/// Ties a field's presence to the discriminator of its union.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Discriminator {
    Values(BTreeSet<String>),
    NotEmpty,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    pub name: String,
    pub ty: TypeRef,
    pub comment: String,
    pub optional: bool,
    pub omit_empty: bool,
    pub type_specific: bool,
    pub discriminator: Option<Discriminator>,
    /// The constant this field always holds.
    pub literal: Option<String>,
}

impl Field {
    pub fn new(name: impl Into<String>, ty: TypeRef, comment: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty,
            comment: comment.into(),
            optional: false,
            omit_empty: false,
            type_specific: false,
            discriminator: None,
            literal: None,
        }
    }

    pub(crate) fn with_options(mut self, options: &[FieldOption]) -> Self {
        for option in options {
            match option {
                FieldOption::OmitEmpty => self.omit_empty = true,
                FieldOption::Optional => self.optional = true,
                FieldOption::TypeSpecific => self.type_specific = true,
                FieldOption::DiscriminatorNotEmpty => {
                    self.discriminator = Some(Discriminator::NotEmpty)
                }
                FieldOption::DiscriminatorValue(value) => match &mut self.discriminator {
                    Some(Discriminator::Values(values)) => {
                        values.insert(value.clone());
                    }
                    _ => {
                        self.discriminator =
                            Some(Discriminator::Values(BTreeSet::from([value.clone()])))
                    }
                },
            }
        }
        self
    }

    /// Discriminator values tied to this field, if any.
    pub fn discriminator_values(&self) -> impl Iterator<Item = &str> {
        let values = match &self.discriminator {
            Some(Discriminator::Values(values)) => Some(values),
            _ => None,
        };
        values.into_iter().flatten().map(String::as_str)
    }

    /// Whether `other` has the same shape apart from its discriminator values.
    fn same_shape(&self, other: &Field) -> bool {
        self.ty == other.ty
            && self.optional == other.optional
            && self.omit_empty == other.omit_empty
            && self.type_specific == other.type_specific
            && self.literal == other.literal
    }
}

/// A plain struct-like symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    pub name: String,
    pub comment: String,
    pub type_parameter: Option<String>,
    pub fields: Vec<Field>,
}

/// A record whose variant payloads live on the union itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClosedUnion {
    pub name: String,
    pub comment: String,
    pub discriminator_key: String,
    pub fields: Vec<Field>,
}

impl ClosedUnion {
    /// Sorted discriminator values over all type-specific fields.
    pub fn dispatch_values(&self) -> Vec<String> {
        let values: BTreeSet<&str> = self
            .fields
            .iter()
            .filter(|field| field.type_specific)
            .flat_map(Field::discriminator_values)
            .collect();
        values.into_iter().map(String::from).collect()
    }
}

/// A polymorphic symbol whose members are registered from outside.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpenUnion {
    pub name: String,
    pub comment: String,
    pub discriminator_key: String,
}

/// A type whose only value is one constant string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Literal {
    pub name: String,
    pub value: String,
}

/// Example payloads that must decode into `target`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnmarshalCheck {
    pub target: String,
    pub type_argument: Option<String>,
    pub payloads: BTreeSet<String>,
}

/// Anything that appears at the top level of generated output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "symbol", rename_all = "snake_case")]
pub enum Symbol {
    Record(Record),
    ClosedUnion(ClosedUnion),
    OpenUnion(OpenUnion),
    Literal(Literal),
    UnmarshalCheck(UnmarshalCheck),
}

impl Symbol {
    pub fn name(&self) -> &str {
        match self {
            Symbol::Record(record) => &record.name,
            Symbol::ClosedUnion(union) => &union.name,
            Symbol::OpenUnion(union) => &union.name,
            Symbol::Literal(literal) => &literal.name,
            Symbol::UnmarshalCheck(check) => &check.target,
        }
    }

    pub fn kind(&self) -> SymbolKind {
        match self {
            Symbol::Record(_) => SymbolKind::Record,
            Symbol::ClosedUnion(_) => SymbolKind::ClosedUnion,
            Symbol::OpenUnion(_) => SymbolKind::OpenUnion,
            Symbol::Literal(_) => SymbolKind::Literal,
            Symbol::UnmarshalCheck(_) => SymbolKind::UnmarshalCheck,
        }
    }

    pub fn fields(&self) -> &[Field] {
        match self {
            Symbol::Record(record) => &record.fields,
            Symbol::ClosedUnion(union) => &union.fields,
            _ => &[],
        }
    }

    pub(crate) fn fields_mut(&mut self) -> Option<&mut Vec<Field>> {
        match self {
            Symbol::Record(record) => Some(&mut record.fields),
            Symbol::ClosedUnion(union) => Some(&mut union.fields),
            _ => None,
        }
    }

    /// Sorted, de-duplicated values this symbol presents under the
    /// discriminator `key`.
    ///
    /// Records and closed unions report the literal and discriminator values
    /// of their fields named `key`; a closed union asked for its own key
    /// reports its dispatch table. Other symbols present none.
    ///
    /// ## Examples
    ///
    /// ```
    /// use docdrift_lib::schema::{Field, Record, Symbol, TypeRef};
    ///
    /// let mut object = Field::new("object", TypeRef::named("AlwaysUser"), "");
    /// object.literal = Some("user".into());
    /// let user = Symbol::Record(Record {
    ///     name: "User".into(),
    ///     comment: String::new(),
    ///     type_parameter: None,
    ///     fields: vec![object],
    /// });
    ///
    /// assert_eq!(user.discriminator_values("object"), vec!["user".to_string()]);
    /// assert!(user.discriminator_values("type").is_empty());
    /// ```
    pub fn discriminator_values(&self, key: &str) -> Vec<String> {
        if let Symbol::ClosedUnion(union) = self
            && union.discriminator_key == key
        {
            return union.dispatch_values();
        }

        let values: BTreeSet<&str> = self
            .fields()
            .iter()
            .filter(|field| field.name == key)
            .flat_map(|field| field.literal.as_deref().into_iter().chain(field.discriminator_values()))
            .collect();
        values.into_iter().map(String::from).collect()
    }

    /// Whether a symbol of kind `requested` may reuse this one.
    pub(crate) fn accepts(&self, requested: SymbolKind) -> bool {
        self.kind() == requested
    }
}

/// Merges `field` into `fields`.
///
/// A field with a new name is appended. Re-adding a field with the same shape
/// is a no-op, except that new discriminator values extend the existing set.
/// Returns the field as stored, or `None` when the shapes conflict.
pub(crate) fn merge_field(fields: &mut Vec<Field>, field: Field) -> Option<Field> {
    let Some(existing) = fields.iter_mut().find(|f| f.name == field.name) else {
        fields.push(field.clone());
        return Some(field);
    };

    if !existing.same_shape(&field) {
        return None;
    }

    match (&mut existing.discriminator, field.discriminator) {
        (Some(Discriminator::Values(values)), Some(Discriminator::Values(added))) => {
            values.extend(added);
        }
        (current, added) if *current == added => {}
        _ => return None,
    }

    if existing.comment.is_empty() {
        existing.comment = field.comment;
    }
    Some(existing.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variant(name: &str, value: &str) -> Field {
        Field::new(name, TypeRef::named("Payload"), "").with_options(&[
            FieldOption::TypeSpecific,
            FieldOption::Optional,
            FieldOption::DiscriminatorValue(value.into()),
        ])
    }

    #[test]
    fn kind_display_reads_as_prose() {
        assert_eq!(SymbolKind::ClosedUnion.to_string(), "closed union");
        assert_eq!(SymbolKind::UnmarshalCheck.to_string(), "unmarshal check");
    }

    #[test]
    fn options_set_flags() {
        let field = Field::new("icon", TypeRef::Any, "").with_options(&[
            FieldOption::OmitEmpty,
            FieldOption::DiscriminatorNotEmpty,
        ]);
        assert!(field.omit_empty);
        assert!(!field.optional);
        assert_eq!(field.discriminator, Some(Discriminator::NotEmpty));
    }

    #[test]
    fn merge_same_value_is_a_noop() {
        let mut fields = vec![variant("external", "external")];
        let stored = merge_field(&mut fields, variant("external", "external")).unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(stored.discriminator_values().collect::<Vec<_>>(), vec!["external"]);
    }

    #[test]
    fn merge_new_value_extends_the_set() {
        let mut fields = vec![variant("file", "file")];
        merge_field(&mut fields, variant("file", "file_upload")).unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(
            fields[0].discriminator_values().collect::<Vec<_>>(),
            vec!["file", "file_upload"]
        );
    }

    #[test]
    fn merge_different_shape_conflicts() {
        let mut fields = vec![Field::new("id", TypeRef::String, "")];
        assert!(merge_field(&mut fields, Field::new("id", TypeRef::Integer, "")).is_none());
    }

    #[test]
    fn closed_union_dispatch_values_are_sorted() {
        let union = ClosedUnion {
            name: "Block".into(),
            comment: String::new(),
            discriminator_key: "type".into(),
            fields: vec![
                Field::new("type", TypeRef::String, ""),
                variant("c", "c"),
                variant("a", "a"),
                variant("b", "b"),
            ],
        };
        assert_eq!(union.dispatch_values(), vec!["a", "b", "c"]);
        let symbol = Symbol::ClosedUnion(union);
        assert_eq!(symbol.discriminator_values("type"), vec!["a", "b", "c"]);
    }

    #[test]
    fn open_unions_and_literals_present_no_values() {
        let open = Symbol::OpenUnion(OpenUnion {
            name: "Parent".into(),
            comment: String::new(),
            discriminator_key: "type".into(),
        });
        assert!(open.discriminator_values("type").is_empty());
    }

    #[test]
    fn referenced_names_walk_nested_types() {
        let ty = TypeRef::list(TypeRef::generic("Page", TypeRef::named("Properties")));
        assert_eq!(ty.referenced_names(), vec!["Page", "Properties"]);
        assert!(TypeRef::map(TypeRef::String).referenced_names().is_empty());
    }
}
