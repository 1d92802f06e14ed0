//! The run-scoped global scope: cross-document symbols, union memberships and
//! unmarshal checks.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, info, instrument};

use super::symbol::{
    ClosedUnion, Field, Literal, OpenUnion, Record, Symbol, SymbolKind, SymbolRef, TypeRef,
    UnmarshalCheck, merge_field,
};
use crate::emit::naming::to_pascal_case;
use crate::errors::SchemaError;

/// One entry of the union membership registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Membership {
    pub union: String,
    pub member: String,
    /// Document whose table holds the member; `None` for global members.
    pub document: Option<String>,
    pub type_argument: Option<String>,
}

/// The symbols one document contributed, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentSymbols {
    pub document: String,
    pub symbols: Vec<Symbol>,
}

/// The finished, validated symbol graph handed to an emitter.
///
/// Every collection is in a deterministic order: documents and global symbols
/// by name, memberships by member then union, checks by target then type
/// argument (checks follow the named global symbols).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SymbolGraph {
    pub documents: Vec<DocumentSymbols>,
    pub global: Vec<Symbol>,
    pub memberships: Vec<Membership>,
}

impl SymbolGraph {
    /// Finds a named symbol in any scope. Checks are not named symbols.
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.global
            .iter()
            .chain(self.documents.iter().flat_map(|doc| doc.symbols.iter()))
            .find(|symbol| symbol.kind() != SymbolKind::UnmarshalCheck && symbol.name() == name)
    }

    /// Registered members of `union`, sorted by member name.
    pub fn members_of<'a>(&'a self, union: &'a str) -> impl Iterator<Item = &'a Membership> + 'a {
        self.memberships.iter().filter(move |m| m.union == union)
    }

    /// The member symbol of `membership`, looked up in its own scope.
    pub fn member(&self, membership: &Membership) -> Option<&Symbol> {
        let scope = match &membership.document {
            Some(document) => {
                &self
                    .documents
                    .iter()
                    .find(|doc| &doc.document == document)?
                    .symbols
            }
            None => &self.global,
        };
        scope.iter().find(|symbol| {
            symbol.kind() != SymbolKind::UnmarshalCheck && symbol.name() == membership.member
        })
    }

    pub fn checks(&self) -> impl Iterator<Item = &UnmarshalCheck> {
        self.global.iter().filter_map(|symbol| match symbol {
            Symbol::UnmarshalCheck(check) => Some(check),
            _ => None,
        })
    }
}

/// Shared state of one synchronization run.
///
/// Created once per run and handed to every document task as an
/// `Arc<Registry>`. All maps sit behind mutexes; a poisoned lock is recovered
/// because every mutation leaves the maps consistent.
#[derive(Debug, Default)]
pub struct Registry {
    global: Mutex<IndexMap<String, Symbol>>,
    memberships: Mutex<Vec<Membership>>,
    checks: Mutex<BTreeMap<(String, Option<String>), BTreeSet<String>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Inserts `symbol` unless its name is taken.
///
/// A same-named symbol of the same kind is kept as is (its comment is filled
/// in when it had none); any other kind is a conflict.
pub(crate) fn intern(
    table: &mut IndexMap<String, Symbol>,
    symbol: Symbol,
) -> Result<(), SchemaError> {
    match table.get_mut(symbol.name()) {
        Some(existing) if existing.accepts(symbol.kind()) => {
            adopt_comment(existing, symbol);
            Ok(())
        }
        Some(existing) => Err(SchemaError::KindConflict {
            name: symbol.name().to_string(),
            existing: existing.kind(),
            requested: symbol.kind(),
        }),
        None => {
            table.insert(symbol.name().to_string(), symbol);
            Ok(())
        }
    }
}

fn adopt_comment(existing: &mut Symbol, symbol: Symbol) {
    let (current, offered) = match (existing, symbol) {
        (Symbol::Record(current), Symbol::Record(offered)) => (&mut current.comment, offered.comment),
        (Symbol::ClosedUnion(current), Symbol::ClosedUnion(offered)) => {
            (&mut current.comment, offered.comment)
        }
        (Symbol::OpenUnion(current), Symbol::OpenUnion(offered)) => {
            (&mut current.comment, offered.comment)
        }
        _ => return,
    };
    if current.is_empty() {
        *current = offered;
    }
}

/// Adds `field` to the record or closed union `target` in `table`.
pub(crate) fn attach_field(
    table: &mut IndexMap<String, Symbol>,
    target: &str,
    field: Field,
) -> Result<Field, SchemaError> {
    let symbol = table
        .get_mut(target)
        .ok_or_else(|| SchemaError::UnknownSymbol {
            name: target.to_string(),
        })?;
    let kind = symbol.kind();
    let fields = symbol
        .fields_mut()
        .ok_or_else(|| SchemaError::NotAFieldContainer {
            name: target.to_string(),
            kind,
        })?;

    let field_name = field.name.clone();
    merge_field(fields, field).ok_or_else(|| SchemaError::FieldConflict {
        symbol: target.to_string(),
        field: field_name,
    })
}

pub(crate) fn record(name: &str, comment: &str, type_parameter: Option<&str>) -> Symbol {
    Symbol::Record(Record {
        name: name.to_string(),
        comment: comment.to_string(),
        type_parameter: type_parameter.map(String::from),
        fields: Vec::new(),
    })
}

/// A closed union, seeded with a string field named after a non-empty key.
pub(crate) fn closed_union(name: &str, discriminator_key: &str, comment: &str) -> Symbol {
    let fields = if discriminator_key.is_empty() {
        Vec::new()
    } else {
        vec![Field::new(discriminator_key, TypeRef::String, "")]
    };
    Symbol::ClosedUnion(ClosedUnion {
        name: name.to_string(),
        comment: comment.to_string(),
        discriminator_key: discriminator_key.to_string(),
        fields,
    })
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates (or returns) a record in the global scope.
    pub fn add_global_record(&self, name: &str, comment: &str) -> Result<SymbolRef, SchemaError> {
        intern(&mut lock(&self.global), record(name, comment, None))?;
        Ok(SymbolRef::global(name))
    }

    /// Creates (or returns) a closed union in the global scope.
    pub fn add_global_closed_union(
        &self,
        name: &str,
        discriminator_key: &str,
        comment: &str,
    ) -> Result<SymbolRef, SchemaError> {
        intern(
            &mut lock(&self.global),
            closed_union(name, discriminator_key, comment),
        )?;
        Ok(SymbolRef::global(name))
    }

    /// Declares an open union. The first declaration wins: later calls with
    /// the same name return the same reference and change nothing, whatever
    /// key they pass.
    ///
    /// ## Examples
    ///
    /// ```
    /// use docdrift_lib::schema::{Registry, Symbol};
    ///
    /// let registry = Registry::new();
    /// let first = registry.add_open_union_if_absent("FileOrEmoji", "type").unwrap();
    /// let second = registry.add_open_union_if_absent("FileOrEmoji", "object").unwrap();
    /// assert_eq!(first, second);
    ///
    /// let Some(Symbol::OpenUnion(union)) = registry.global_symbol("FileOrEmoji") else {
    ///     panic!("expected an open union");
    /// };
    /// assert_eq!(union.discriminator_key, "type");
    /// ```
    pub fn add_open_union_if_absent(
        &self,
        name: &str,
        discriminator_key: &str,
    ) -> Result<SymbolRef, SchemaError> {
        let union = Symbol::OpenUnion(OpenUnion {
            name: name.to_string(),
            comment: String::new(),
            discriminator_key: discriminator_key.to_string(),
        });
        intern(&mut lock(&self.global), union)?;
        Ok(SymbolRef::global(name))
    }

    /// Interns the literal symbol for `value`, named `Always<Value>`.
    pub fn intern_literal(&self, value: &str) -> Result<SymbolRef, SchemaError> {
        let name = format!("Always{}", to_pascal_case(value));
        let mut global = lock(&self.global);
        if let Some(Symbol::Literal(existing)) = global.get(&name)
            && existing.value != value
        {
            // "file-upload" and "file_upload" would share a name.
            return Err(SchemaError::NotALiteral {
                field: name,
                text: value.to_string(),
            });
        }
        intern(
            &mut global,
            Symbol::Literal(Literal {
                name: name.clone(),
                value: value.to_string(),
            }),
        )?;
        Ok(SymbolRef::global(name))
    }

    /// Adds a field to a global record or closed union.
    pub fn add_global_field(&self, target: &str, field: Field) -> Result<Field, SchemaError> {
        attach_field(&mut lock(&self.global), target, field)
    }

    /// Appends an entry to the membership registry. The member is untouched.
    pub fn register_member(&self, membership: Membership) {
        debug!(union = %membership.union, member = %membership.member, "register member");
        lock(&self.memberships).push(membership);
    }

    /// Records an example payload that must decode into `target`.
    ///
    /// Payloads for the same `(target, type_argument)` merge into one check.
    pub fn add_unmarshal_check(&self, target: &str, payload: &str, type_argument: Option<&str>) {
        lock(&self.checks)
            .entry((target.to_string(), type_argument.map(String::from)))
            .or_default()
            .insert(payload.to_string());
    }

    /// A copy of a global symbol, if present.
    pub fn global_symbol(&self, name: &str) -> Option<Symbol> {
        lock(&self.global).get(name).cloned()
    }

    /// Validates every union and reference and returns the sorted graph.
    ///
    /// ## Errors
    ///
    /// - [`SchemaError::UnresolvedDiscriminator`] if a type-specific field of a
    ///   closed union has no discriminator value, or a registered member of an
    ///   open union presents no value under the union's key
    /// - [`SchemaError::UnknownSymbol`] if a membership, a field type or a check
    ///   names a symbol that exists in no scope
    /// - [`SchemaError::KindConflict`] if a membership names something other
    ///   than an open union as its union
    #[instrument(skip_all, fields(documents = documents.len()))]
    pub fn finalize(&self, mut documents: Vec<DocumentSymbols>) -> Result<SymbolGraph, SchemaError> {
        documents.sort_by(|a, b| a.document.cmp(&b.document));

        let mut global: Vec<Symbol> = lock(&self.global).values().cloned().collect();
        global.sort_by(|a, b| a.name().cmp(b.name()));

        let mut memberships = lock(&self.memberships).clone();
        memberships.sort_by(|a, b| {
            (&a.member, &a.union, &a.document, &a.type_argument).cmp(&(
                &b.member,
                &b.union,
                &b.document,
                &b.type_argument,
            ))
        });
        memberships.dedup();

        let checks: Vec<Symbol> = lock(&self.checks)
            .iter()
            .map(|((target, type_argument), payloads)| {
                Symbol::UnmarshalCheck(UnmarshalCheck {
                    target: target.clone(),
                    type_argument: type_argument.clone(),
                    payloads: payloads.clone(),
                })
            })
            .collect();

        let known: HashSet<&str> = global
            .iter()
            .chain(documents.iter().flat_map(|doc| doc.symbols.iter()))
            .map(Symbol::name)
            .collect();
        let all_symbols = || {
            global
                .iter()
                .chain(documents.iter().flat_map(|doc| doc.symbols.iter()))
        };

        for symbol in all_symbols() {
            if let Symbol::ClosedUnion(union) = symbol {
                check_closed_union(union)?;
            }
            for field in symbol.fields() {
                if let Some(missing) = field
                    .ty
                    .referenced_names()
                    .into_iter()
                    .find(|name| !known.contains(name))
                {
                    return Err(SchemaError::UnknownSymbol {
                        name: missing.to_string(),
                    });
                }
            }
        }

        for membership in &memberships {
            let union = match global.iter().find(|s| s.name() == membership.union) {
                Some(Symbol::OpenUnion(union)) => union,
                Some(other) => {
                    return Err(SchemaError::KindConflict {
                        name: membership.union.clone(),
                        existing: other.kind(),
                        requested: SymbolKind::OpenUnion,
                    });
                }
                None => {
                    return Err(SchemaError::UnknownSymbol {
                        name: membership.union.clone(),
                    });
                }
            };

            let scope: &[Symbol] = match &membership.document {
                Some(document) => documents
                    .iter()
                    .find(|doc| &doc.document == document)
                    .map(|doc| doc.symbols.as_slice())
                    .unwrap_or_default(),
                None => &global,
            };
            let member = scope
                .iter()
                .find(|s| s.name() == membership.member)
                .ok_or_else(|| SchemaError::UnknownSymbol {
                    name: membership.member.clone(),
                })?;

            if member.discriminator_values(&union.discriminator_key).is_empty() {
                return Err(SchemaError::UnresolvedDiscriminator {
                    union: union.name.clone(),
                    member: membership.member.clone(),
                });
            }
        }

        for check in &checks {
            if !known.contains(check.name()) {
                return Err(SchemaError::UnknownSymbol {
                    name: check.name().to_string(),
                });
            }
        }

        global.extend(checks);
        info!(
            global = global.len(),
            memberships = memberships.len(),
            "symbol graph finalized"
        );

        Ok(SymbolGraph {
            documents,
            global,
            memberships,
        })
    }
}

fn check_closed_union(union: &ClosedUnion) -> Result<(), SchemaError> {
    match union
        .fields
        .iter()
        .find(|field| field.type_specific && field.discriminator_values().next().is_none())
    {
        Some(field) => Err(SchemaError::UnresolvedDiscriminator {
            union: union.name.clone(),
            member: field.name.clone(),
        }),
        None => Ok(()),
    }
}
