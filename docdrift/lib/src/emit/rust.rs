//! Rust backend: serde-ready declarations rendered with `quote`.

use std::path::{Path, PathBuf};

use proc_macro2::{Ident, Span, TokenStream};
use quote::quote;
use tracing::{debug, info};

use super::naming::{is_keyword, is_reserved, to_pascal_case, to_snake_case};
use super::{Emitter, GeneratedFile, format_code, validate_code, write_atomic};
use crate::errors::EmitError;
use crate::schema::{
    ClosedUnion, DocumentSymbols, Field, Literal, OpenUnion, Record, Symbol, SymbolGraph, TypeRef,
    UnmarshalCheck,
};

const GLOBAL_MODULE: &str = "global";

/// Renders each scope to a Rust module and writes it to `output_dir`.
///
/// Without an output directory the emitter only keeps the rendered files in
/// memory (see [`RustEmitter::files`]).
///
/// ## Examples
///
/// ```
/// use std::sync::Arc;
/// use docdrift_lib::emit::{Emitter, RustEmitter};
/// use docdrift_lib::schema::Registry;
///
/// let registry = Arc::new(Registry::new());
/// registry.add_global_record("User", "A Notion user.").unwrap();
/// let graph = registry.finalize(Vec::new()).unwrap();
///
/// let mut emitter = RustEmitter::in_memory();
/// emitter.emit_global(&graph).unwrap();
/// let global = &emitter.files()[0];
/// assert!(global.contents.contains("pub struct User {}"));
/// ```
#[derive(Debug, Default)]
pub struct RustEmitter {
    output_dir: Option<PathBuf>,
    files: Vec<GeneratedFile>,
}

impl RustEmitter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: Some(output_dir.into()),
            files: Vec::new(),
        }
    }

    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Every file rendered so far, in emission order.
    pub fn files(&self) -> &[GeneratedFile] {
        &self.files
    }

    pub fn output_dir(&self) -> Option<&Path> {
        self.output_dir.as_deref()
    }

    fn keep(&mut self, scope: &str, file_name: String, tokens: TokenStream) -> Result<(), EmitError> {
        let file = validate_code(scope, &tokens)?;
        let contents = format_code(&file);
        let path = PathBuf::from(file_name);

        if let Some(dir) = &self.output_dir {
            let target = dir.join(&path);
            write_atomic(&target, &contents)?;
            info!(path = %target.display(), "wrote generated module");
        } else {
            debug!(path = %path.display(), "rendered generated module");
        }

        self.files.push(GeneratedFile { path, contents });
        Ok(())
    }
}

impl Emitter for RustEmitter {
    fn emit_document(
        &mut self,
        document: &DocumentSymbols,
        graph: &SymbolGraph,
    ) -> Result<(), EmitError> {
        let module = module_name(&document.document)?;
        let items = document
            .symbols
            .iter()
            .map(|symbol| render_symbol(symbol, graph))
            .collect::<Result<Vec<_>, _>>()?;

        let tokens = module_file(&items);
        self.keep(&document.document, format!("{module}.rs"), tokens)
    }

    fn emit_global(&mut self, graph: &SymbolGraph) -> Result<(), EmitError> {
        let mut items = Vec::new();
        let mut checks = Vec::new();
        for symbol in &graph.global {
            match symbol {
                Symbol::UnmarshalCheck(check) => checks.push(render_check(check)?),
                other => items.push(render_symbol(other, graph)?),
            }
        }
        if !checks.is_empty() {
            items.push(quote! {
                #[cfg(test)]
                mod unmarshal_checks {
                    use super::*;

                    #(#checks)*
                }
            });
        }
        self.keep(GLOBAL_MODULE, format!("{GLOBAL_MODULE}.rs"), module_file(&items))?;

        let mut modules = vec![field_ident(GLOBAL_MODULE)?];
        for document in &graph.documents {
            modules.push(module_name(&document.document)?);
        }
        let tokens = quote! {
            #(pub mod #modules;)*

            #(pub use #modules::*;)*
        };
        self.keep("mod", "mod.rs".to_string(), tokens)
    }
}

fn module_file(items: &[TokenStream]) -> TokenStream {
    quote! {
        #![allow(unused_imports)]

        use serde::{Deserialize, Serialize};

        use super::*;

        #(#items)*
    }
}

fn render_symbol(symbol: &Symbol, graph: &SymbolGraph) -> Result<TokenStream, EmitError> {
    match symbol {
        Symbol::Record(record) => render_record(record),
        Symbol::ClosedUnion(union) => render_closed_union(union),
        Symbol::OpenUnion(union) => render_open_union(union, graph),
        Symbol::Literal(literal) => render_literal(literal),
        Symbol::UnmarshalCheck(check) => render_check(check),
    }
}

fn render_record(record: &Record) -> Result<TokenStream, EmitError> {
    let name = type_ident(&record.name)?;
    let doc = doc_attrs(&record.comment);
    let generics = match &record.type_parameter {
        Some(parameter) => {
            let parameter = type_ident(parameter)?;
            quote! { <#parameter> }
        }
        None => quote! {},
    };
    let fields = record
        .fields
        .iter()
        .map(render_field)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(quote! {
        #doc
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        pub struct #name #generics {
            #(#fields)*
        }
    })
}

/// A closed union is one struct: the discriminator field plus one optional
/// payload field per variant, and a lookup from discriminator value to the
/// payload field that carries it.
fn render_closed_union(union: &ClosedUnion) -> Result<TokenStream, EmitError> {
    let name = type_ident(&union.name)?;
    let mut comment = union.comment.clone();
    let dispatch: Vec<(&str, &Field)> = union
        .fields
        .iter()
        .filter(|field| field.type_specific)
        .flat_map(|field| field.discriminator_values().map(move |value| (value, field)))
        .collect();

    if !union.discriminator_key.is_empty() && !dispatch.is_empty() {
        if !comment.is_empty() {
            comment.push_str("\n\n");
        }
        comment.push_str(&format!("Dispatches on `{}`:", union.discriminator_key));
        for (value, field) in &dispatch {
            comment.push_str(&format!("\n- `{value}`: `{}`", field.name));
        }
    }
    let doc = doc_attrs(&comment);
    let fields = union
        .fields
        .iter()
        .map(render_field)
        .collect::<Result<Vec<_>, _>>()?;

    let lookup = if union.discriminator_key.is_empty() {
        quote! {}
    } else {
        let key = field_ident(&union.discriminator_key)?;
        let mut pairs: Vec<(&str, &str)> = dispatch
            .iter()
            .map(|(value, field)| (*value, field.name.as_str()))
            .collect();
        pairs.sort();
        let values = pairs.iter().map(|(value, _)| value);
        let payloads = pairs.iter().map(|(_, field)| field);
        quote! {
            impl #name {
                /// Name of the payload field for the current discriminator value.
                pub fn variant_field(&self) -> Option<&'static str> {
                    match self.#key.as_str() {
                        #(#values => Some(#payloads),)*
                        _ => None,
                    }
                }
            }
        }
    };

    Ok(quote! {
        #doc
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        pub struct #name {
            #(#fields)*
        }

        #lookup
    })
}

/// Open unions become untagged enums. Members identify themselves through
/// their literal discriminator fields, which only accept their own value.
fn render_open_union(union: &OpenUnion, graph: &SymbolGraph) -> Result<TokenStream, EmitError> {
    let name = type_ident(&union.name)?;
    let members: Vec<_> = graph.members_of(&union.name).collect();

    let mut comment = union.comment.clone();
    if !comment.is_empty() {
        comment.push_str("\n\n");
    }
    comment.push_str(&format!("Dispatches on `{}`:", union.discriminator_key));

    let mut variants = Vec::new();
    for membership in &members {
        let values = graph
            .member(membership)
            .map(|member| member.discriminator_values(&union.discriminator_key))
            .unwrap_or_default();
        let listed = values
            .iter()
            .map(|value| format!("`{value}`"))
            .collect::<Vec<_>>()
            .join(", ");
        comment.push_str(&format!("\n- {listed}: `{}`", membership.member));

        let member = type_ident(&membership.member)?;
        let (variant, ty) = match &membership.type_argument {
            Some(argument) => {
                let variant = type_ident(&format!("{}{}", membership.member, to_pascal_case(argument)))?;
                let argument = type_ident(argument)?;
                (variant, quote! { #member<#argument> })
            }
            None => (member.clone(), quote! { #member }),
        };
        variants.push(quote! { #variant(#ty), });
    }

    let doc = doc_attrs(&comment);
    if variants.is_empty() {
        return Ok(quote! {
            #doc
            #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
            #[serde(transparent)]
            pub struct #name(pub serde_json::Value);
        });
    }

    Ok(quote! {
        #doc
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        #[serde(untagged)]
        pub enum #name {
            #(#variants)*
        }
    })
}

fn render_literal(literal: &Literal) -> Result<TokenStream, EmitError> {
    let name = type_ident(&literal.name)?;
    let value = &literal.value;
    let doc = doc_attrs(&format!("Always the string `\"{value}\"`."));

    Ok(quote! {
        #doc
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
        pub struct #name;

        impl #name {
            pub const VALUE: &'static str = #value;
        }

        impl Serialize for #name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(Self::VALUE)
            }
        }

        impl<'de> Deserialize<'de> for #name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let value = String::deserialize(deserializer)?;
                if value == Self::VALUE {
                    Ok(Self)
                } else {
                    Err(serde::de::Error::custom(format!(
                        "expected {:?}, found {:?}",
                        Self::VALUE,
                        value
                    )))
                }
            }
        }
    })
}

fn render_check(check: &UnmarshalCheck) -> Result<TokenStream, EmitError> {
    let target = type_ident(&check.target)?;
    let (ty, test_name) = match &check.type_argument {
        Some(argument) => {
            let argument_ident = type_ident(argument)?;
            (
                quote! { #target<#argument_ident> },
                format!("{}_{}", to_snake_case(&check.target), to_snake_case(argument)),
            )
        }
        None => (quote! { #target }, to_snake_case(&check.target)),
    };
    let test_name = field_ident(&format!("{test_name}_decodes_documented_examples"))?;
    let payloads = check.payloads.iter();

    Ok(quote! {
        #[test]
        fn #test_name() {
            let payloads: &[&str] = &[#(#payloads),*];
            for payload in payloads {
                if let Err(err) = serde_json::from_str::<#ty>(payload) {
                    panic!("{}: {}", payload, err);
                }
            }
        }
    })
}

fn render_field(field: &Field) -> Result<TokenStream, EmitError> {
    let ident = field_ident(&field.name)?;
    let ty = render_type(&field.ty)?;
    let doc = doc_attrs(&field.comment);
    let name = &field.name;
    let rename = if ident.to_string().trim_start_matches("r#") == name {
        quote! {}
    } else {
        quote! { #[serde(rename = #name)] }
    };

    let optional =
        field.optional || field.omit_empty || (field.discriminator.is_some() && field.literal.is_none());
    if optional {
        Ok(quote! {
            #doc
            #rename
            #[serde(default, skip_serializing_if = "Option::is_none")]
            pub #ident: Option<#ty>,
        })
    } else {
        Ok(quote! {
            #doc
            #rename
            pub #ident: #ty,
        })
    }
}

fn render_type(ty: &TypeRef) -> Result<TokenStream, EmitError> {
    Ok(match ty {
        TypeRef::String | TypeRef::Timestamp => quote! { String },
        TypeRef::Boolean => quote! { bool },
        TypeRef::Integer => quote! { i64 },
        TypeRef::Number => quote! { f64 },
        TypeRef::Any => quote! { serde_json::Value },
        TypeRef::Named(name) => {
            let name = type_ident(name)?;
            quote! { #name }
        }
        TypeRef::Generic(name, argument) => {
            let name = type_ident(name)?;
            let argument = render_type(argument)?;
            quote! { #name<#argument> }
        }
        TypeRef::List(item) => {
            let item = render_type(item)?;
            quote! { Vec<#item> }
        }
        TypeRef::Map(value) => {
            let value = render_type(value)?;
            quote! { std::collections::BTreeMap<String, #value> }
        }
        TypeRef::Parameter(name) => {
            let name = type_ident(name)?;
            quote! { #name }
        }
    })
}

fn doc_attrs(comment: &str) -> TokenStream {
    let lines = comment.trim().lines().map(|line| {
        let line = format!(" {}", line.trim_end());
        quote! { #[doc = #line] }
    });
    quote! { #(#lines)* }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn type_ident(name: &str) -> Result<Ident, EmitError> {
    let pascal = to_pascal_case(name);
    if !is_identifier(&pascal) || is_keyword(&pascal) || is_reserved(&pascal) {
        return Err(EmitError::InvalidIdentifier(name.to_string()));
    }
    Ok(Ident::new(&pascal, Span::call_site()))
}

fn field_ident(name: &str) -> Result<Ident, EmitError> {
    let snake = to_snake_case(name);
    if !is_identifier(&snake) || is_reserved(&snake) {
        return Err(EmitError::InvalidIdentifier(name.to_string()));
    }
    if is_keyword(&snake) {
        Ok(Ident::new_raw(&snake, Span::call_site()))
    } else {
        Ok(Ident::new(&snake, Span::call_site()))
    }
}

fn module_name(document: &str) -> Result<Ident, EmitError> {
    field_ident(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Parameter;
    use crate::schema::{DocumentBuilder, FieldOption, Registry};
    use std::sync::Arc;

    fn notion_graph() -> SymbolGraph {
        let registry = Arc::new(Registry::new());

        let mut emoji = DocumentBuilder::new("emoji", registry.clone());
        let union = emoji.add_open_union_if_absent("FileOrEmoji", "type").unwrap();
        let record = emoji.add_record("Emoji", "An emoji character.").unwrap();
        emoji
            .add_literal_field(&record, &Parameter::new("`type`", "`\"emoji\"`", "", ""))
            .unwrap();
        emoji
            .add_field(
                &record,
                &Parameter::new("`emoji`", "`string`", "The emoji character.", ""),
                TypeRef::String,
                &[],
            )
            .unwrap();
        emoji.register_member(&union, &record, None);

        let mut file = DocumentBuilder::new("file", registry.clone());
        let file_union = file.add_closed_union("File", "type", "A file object.").unwrap();
        for value in ["file", "external"] {
            file.add_field(
                &file_union,
                &Parameter::new(format!("`{value}`"), "`object`", "", ""),
                TypeRef::Any,
                &[FieldOption::TypeSpecific, FieldOption::DiscriminatorValue(value.into())],
            )
            .unwrap();
        }
        file.register_member(&union, &file_union, None);
        file.add_unmarshal_check(&file_union, r#"{"type": "external", "external": {}}"#, None);

        registry
            .finalize(vec![emoji.into_symbols(), file.into_symbols()])
            .unwrap()
    }

    fn emit_all(graph: &SymbolGraph) -> RustEmitter {
        let mut emitter = RustEmitter::in_memory();
        for document in &graph.documents {
            emitter.emit_document(document, graph).unwrap();
        }
        emitter.emit_global(graph).unwrap();
        emitter
    }

    fn file<'a>(emitter: &'a RustEmitter, name: &str) -> &'a str {
        &emitter
            .files()
            .iter()
            .find(|f| f.path == Path::new(name))
            .unwrap()
            .contents
    }

    #[test]
    fn open_union_lists_values_of_the_registered_member_only() {
        let registry = Arc::new(Registry::new());
        let mut documents = Vec::new();
        for (document, value, register) in [("alpha", "alpha_value", false), ("beta", "beta_value", true)] {
            let mut builder = DocumentBuilder::new(document, registry.clone());
            let item = builder.add_record("Item", "").unwrap();
            builder
                .add_literal_field(&item, &Parameter::new("`type`", format!("`\"{value}\"`"), "", ""))
                .unwrap();
            if register {
                let union = builder.add_open_union_if_absent("Either", "type").unwrap();
                builder.register_member(&union, &item, None);
            }
            documents.push(builder.into_symbols());
        }
        let graph = registry.finalize(documents).unwrap();

        let emitter = emit_all(&graph);
        let global = file(&emitter, "global.rs");
        assert!(global.contains("- `beta_value`: `Item`"));
        assert!(!global.contains("alpha_value`: `Item`"));
    }

    #[test]
    fn emits_one_file_per_scope_plus_mod() {
        let emitter = emit_all(&notion_graph());
        let paths: Vec<_> = emitter.files().iter().map(|f| f.path.clone()).collect();
        assert_eq!(
            paths,
            vec![
                PathBuf::from("emoji.rs"),
                PathBuf::from("file.rs"),
                PathBuf::from("global.rs"),
                PathBuf::from("mod.rs"),
            ]
        );
        let module = file(&emitter, "mod.rs");
        assert!(module.contains("pub mod emoji;"));
        assert!(module.contains("pub use global::*;"));
    }

    #[test]
    fn record_fields_use_literal_types_and_raw_keywords() {
        let emitter = emit_all(&notion_graph());
        let emoji = file(&emitter, "emoji.rs");
        assert!(emoji.contains("/// An emoji character."));
        assert!(emoji.contains("pub struct Emoji {"));
        assert!(emoji.contains("pub r#type: AlwaysEmoji,"));
        assert!(emoji.contains("pub emoji: String,"));
    }

    #[test]
    fn closed_union_payloads_are_optional_with_lookup() {
        let emitter = emit_all(&notion_graph());
        let union = file(&emitter, "file.rs");
        assert!(union.contains("pub external: Option<serde_json::Value>,"));
        assert!(union.contains("pub fn variant_field(&self) -> Option<&'static str>"));
        assert!(union.contains("\"external\" => Some(\"external\")"));
        assert!(union.contains("/// - `file`: `file`"));
    }

    #[test]
    fn open_union_is_untagged_enum_in_member_order() {
        let emitter = emit_all(&notion_graph());
        let global = file(&emitter, "global.rs");
        assert!(global.contains("#[serde(untagged)]"));
        let emoji = global.find("Emoji(Emoji)").unwrap();
        let file_variant = global.find("File(File)").unwrap();
        assert!(emoji < file_variant);
        assert!(global.contains("/// - `emoji`: `Emoji`"));
        assert!(global.contains("/// - `external`, `file`: `File`"));
    }

    #[test]
    fn literals_and_checks_live_in_global() {
        let emitter = emit_all(&notion_graph());
        let global = file(&emitter, "global.rs");
        assert!(global.contains("pub struct AlwaysEmoji;"));
        assert!(global.contains("pub const VALUE: &'static str = \"emoji\";"));
        assert!(global.contains("mod unmarshal_checks"));
        assert!(global.contains("fn file_decodes_documented_examples()"));
    }

    #[test]
    fn output_is_identical_across_runs() {
        let first = emit_all(&notion_graph());
        let second = emit_all(&notion_graph());
        assert_eq!(first.files(), second.files());
    }

    #[test]
    fn writes_files_when_output_dir_is_set() {
        let dir = tempfile::tempdir().unwrap();
        let graph = notion_graph();
        let mut emitter = RustEmitter::new(dir.path());
        emitter.emit_global(&graph).unwrap();
        assert!(dir.path().join("global.rs").exists());
        assert!(dir.path().join("mod.rs").exists());
    }

    #[test]
    fn invalid_names_are_reported() {
        assert!(matches!(
            type_ident("???"),
            Err(EmitError::InvalidIdentifier(_))
        ));
        assert!(matches!(
            field_ident("self"),
            Err(EmitError::InvalidIdentifier(_))
        ));
        assert_eq!(field_ident("createdTime").unwrap().to_string(), "created_time");
    }

    #[test]
    fn renamed_fields_keep_their_wire_name() {
        let field = Field::new("createdTime", TypeRef::Timestamp, "");
        let tokens = render_field(&field).unwrap().to_string();
        assert!(tokens.contains("rename = \"createdTime\""));
        assert!(tokens.contains("created_time"));
    }
}
