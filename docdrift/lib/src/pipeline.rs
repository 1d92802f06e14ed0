//! Run orchestration: fetch, tokenize, compare, build, finalize, emit.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use futures::future::join_all;
use tracing::{Instrument, error, info, info_span, instrument};

use crate::compare::Comparator;
use crate::emit::Emitter;
use crate::errors::{DocumentError, DocumentFailure, DriftError, RunError};
use crate::fetch::Fetcher;
use crate::page::{DEFAULT_PAYLOAD_ATTRIBUTE, Page};
use crate::schema::{DocumentBuilder, DocumentSymbols, Registry, SymbolGraph};
use crate::tokenize::tokenize;

/// One documentation page and its recorded expectation.
///
/// `expect` declares, in page order, every element the page is known to
/// contain and attaches the build actions that turn them into symbols.
pub trait Conversion: Send + Sync {
    /// Document name; names the emitted module too.
    fn name(&self) -> &str;

    /// Where the page lives, absolute or relative to the fetcher's base URL.
    fn url(&self) -> &str;

    /// ## Errors
    ///
    /// Returns the first [`DriftError`] raised by `compare`.
    fn expect(&self, compare: &mut Comparator<'_, DocumentBuilder>) -> Result<(), DriftError>;

    /// Documents whose symbols this one's build actions refer to.
    fn requires(&self) -> &[&str] {
        &[]
    }
}

/// Keeps the conversions named in `names` and, transitively, the documents
/// they require, in their original order.
///
/// ## Errors
///
/// Returns the first name, requested or required, that no conversion has.
pub fn select_conversions(
    conversions: Vec<Box<dyn Conversion>>,
    names: &[String],
) -> Result<Vec<Box<dyn Conversion>>, String> {
    let mut pending: VecDeque<String> = names.iter().cloned().collect();
    let mut selected = HashSet::new();

    while let Some(name) = pending.pop_front() {
        if selected.contains(&name) {
            continue;
        }
        let conversion = conversions
            .iter()
            .find(|c| c.name() == name)
            .ok_or_else(|| name.clone())?;
        pending.extend(conversion.requires().iter().map(|r| r.to_string()));
        selected.insert(name);
    }

    Ok(conversions
        .into_iter()
        .filter(|c| selected.contains(c.name()))
        .collect())
}

/// Drives a set of conversions through one run.
///
/// ## Examples
///
/// ```
/// use docdrift_lib::compare::Comparator;
/// use docdrift_lib::element::Block;
/// use docdrift_lib::emit::RustEmitter;
/// use docdrift_lib::errors::DriftError;
/// use docdrift_lib::fetch::StaticFetcher;
/// use docdrift_lib::page::{Page, DEFAULT_PAYLOAD_ATTRIBUTE};
/// use docdrift_lib::pipeline::{Conversion, Pipeline};
/// use docdrift_lib::schema::DocumentBuilder;
///
/// struct Intro;
///
/// impl Conversion for Intro {
///     fn name(&self) -> &str { "intro" }
///     fn url(&self) -> &str { "/intro" }
///     fn expect(&self, c: &mut Comparator<'_, DocumentBuilder>) -> Result<(), DriftError> {
///         c.expect_block(Block::paragraph("Hello."))?
///             .output(|block, b| b.add_record("Intro", &block.text).map(drop));
///         Ok(())
///     }
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let fetcher = StaticFetcher::new()
///     .with_page("/intro", &Page::new("Intro", "Hello.\n"), DEFAULT_PAYLOAD_ATTRIBUTE);
/// let conversions: Vec<Box<dyn Conversion>> = vec![Box::new(Intro)];
/// let mut emitter = RustEmitter::in_memory();
///
/// let graph = Pipeline::new(fetcher).run(&conversions, &mut emitter).await.unwrap();
/// assert_eq!(graph.documents[0].document, "intro");
/// # }
/// ```
pub struct Pipeline<F> {
    fetcher: F,
    payload_attribute: String,
}

impl<F: Fetcher> Pipeline<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            payload_attribute: DEFAULT_PAYLOAD_ATTRIBUTE.to_string(),
        }
    }

    /// Overrides the HTML attribute that carries the page payload.
    pub fn with_payload_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.payload_attribute = attribute.into();
        self
    }

    /// Runs every conversion, then finalizes the registry and emits.
    ///
    /// Documents are processed concurrently and independently: a failure stops
    /// only its own document. Emission runs only when every document succeeded
    /// and the graph finalized. Each run builds into a fresh [`Registry`] that
    /// is dropped once emission is done, so runs never share symbols.
    ///
    /// ## Errors
    ///
    /// - [`RunError::Documents`] listing every failed document
    /// - [`RunError::Finalize`] if the symbol graph is inconsistent
    /// - [`RunError::Emit`] if the emitter fails
    #[instrument(skip_all, fields(documents = conversions.len()))]
    pub async fn run<E: Emitter>(
        &self,
        conversions: &[Box<dyn Conversion>],
        emitter: &mut E,
    ) -> Result<SymbolGraph, RunError> {
        let registry = Arc::new(Registry::new());
        let results = join_all(conversions.iter().map(|conversion| {
            let span = info_span!("document", name = conversion.name());
            self.run_document(conversion.as_ref(), registry.clone())
                .instrument(span)
        }))
        .await;

        let mut documents = Vec::new();
        let mut failures = Vec::new();
        for (conversion, result) in conversions.iter().zip(results) {
            match result {
                Ok(symbols) => documents.push(symbols),
                Err(error) => {
                    error!(document = conversion.name(), %error, "document failed");
                    failures.push(DocumentFailure {
                        document: conversion.name().to_string(),
                        error,
                    });
                }
            }
        }
        if !failures.is_empty() {
            return Err(RunError::Documents(failures));
        }

        let graph = registry.finalize(documents).map_err(RunError::Finalize)?;

        for document in &graph.documents {
            emitter.emit_document(document, &graph)?;
        }
        emitter.emit_global(&graph)?;
        info!(documents = graph.documents.len(), "emission complete");

        Ok(graph)
    }

    /// Fetch, tokenize and compare one page, then run its build actions.
    async fn run_document(
        &self,
        conversion: &dyn Conversion,
        registry: Arc<Registry>,
    ) -> Result<DocumentSymbols, DocumentError> {
        let html = self.fetcher.fetch(conversion.url()).await?;
        let page = Page::from_html(&html, &self.payload_attribute)?;
        let elements = tokenize(&page.body)?;
        info!(elements = elements.len(), "page tokenized");

        let mut builder = DocumentBuilder::new(conversion.name(), registry);
        let mut compare = Comparator::new(conversion.name(), elements).with_endpoint(page.endpoint);
        conversion.expect(&mut compare)?;
        compare.finish(&mut builder)?;

        Ok(builder.into_symbols())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Block;
    use crate::emit::RustEmitter;
    use crate::errors::{DriftKind, FetchError, SchemaError};
    use crate::fetch::StaticFetcher;

    struct Paragraph {
        name: &'static str,
        text: &'static str,
    }

    impl Conversion for Paragraph {
        fn name(&self) -> &str {
            self.name
        }

        fn url(&self) -> &str {
            self.name
        }

        fn expect(&self, compare: &mut Comparator<'_, DocumentBuilder>) -> Result<(), DriftError> {
            let record = crate::emit::naming::to_pascal_case(self.name);
            compare
                .expect_block(Block::paragraph(self.text))?
                .output(move |block, b| b.add_record(&record, &block.text).map(drop));
            Ok(())
        }
    }

    fn fetcher() -> StaticFetcher {
        StaticFetcher::new()
            .with_page("user", &Page::new("User", "A user.\n"), DEFAULT_PAYLOAD_ATTRIBUTE)
            .with_page("emoji", &Page::new("Emoji", "An emoji!\n"), DEFAULT_PAYLOAD_ATTRIBUTE)
    }

    fn conversions(items: &[(&'static str, &'static str)]) -> Vec<Box<dyn Conversion>> {
        items
            .iter()
            .map(|&(name, text)| Box::new(Paragraph { name, text }) as Box<dyn Conversion>)
            .collect()
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn collects_every_failed_document() {
        let conversions = conversions(&[
            ("user", "A user."),
            ("emoji", "An emoji."),
            ("comment", "A comment."),
        ]);
        let mut emitter = RustEmitter::in_memory();
        let err = Pipeline::new(fetcher())
            .run(&conversions, &mut emitter)
            .await
            .unwrap_err();

        let RunError::Documents(failures) = err else {
            panic!("expected document failures");
        };
        assert_eq!(failures.len(), 2);
        assert!(matches!(
            &failures[0].error,
            DocumentError::Drift(DriftError {
                kind: DriftKind::Mismatch { .. },
                ..
            })
        ));
        assert!(matches!(
            &failures[1].error,
            DocumentError::Fetch(FetchError::NotFound(_))
        ));
        assert!(emitter.files().is_empty());
        assert!(logs_contain("document failed"));
    }

    struct Undiscriminated;

    impl Conversion for Undiscriminated {
        fn name(&self) -> &str {
            "user"
        }

        fn url(&self) -> &str {
            "user"
        }

        fn expect(&self, compare: &mut Comparator<'_, DocumentBuilder>) -> Result<(), DriftError> {
            compare
                .expect_block(Block::paragraph("A user."))?
                .output(|block, b| {
                    let user = b.add_record("User", &block.text)?;
                    let parent = b.add_open_union_if_absent("Parent", "type")?;
                    b.register_member(&parent, &user, None);
                    Ok(())
                });
            Ok(())
        }
    }

    #[tokio::test]
    async fn finalize_failure_skips_emission() {
        let conversions: Vec<Box<dyn Conversion>> = vec![Box::new(Undiscriminated)];
        let mut emitter = RustEmitter::in_memory();
        let err = Pipeline::new(fetcher())
            .run(&conversions, &mut emitter)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            RunError::Finalize(SchemaError::UnresolvedDiscriminator { ref union, ref member })
                if union == "Parent" && member == "User"
        ));
        assert!(emitter.files().is_empty());
    }

    #[tokio::test]
    async fn successful_run_emits_documents_then_global() {
        let conversions = conversions(&[("user", "A user.")]);
        let mut emitter = RustEmitter::in_memory();
        Pipeline::new(fetcher())
            .run(&conversions, &mut emitter)
            .await
            .unwrap();

        let paths: Vec<_> = emitter
            .files()
            .iter()
            .map(|file| file.path.display().to_string())
            .collect();
        assert_eq!(paths, ["user.rs", "global.rs", "mod.rs"]);
    }

    struct GlobalRecord {
        name: &'static str,
        record: &'static str,
    }

    impl Conversion for GlobalRecord {
        fn name(&self) -> &str {
            self.name
        }

        fn url(&self) -> &str {
            "user"
        }

        fn expect(&self, compare: &mut Comparator<'_, DocumentBuilder>) -> Result<(), DriftError> {
            let record = self.record;
            compare
                .expect_block(Block::paragraph("A user."))?
                .output(move |block, b| {
                    let target = b.add_global_record(record, &block.text)?;
                    b.add_unmarshal_check(&target, "{}", None);
                    Ok(())
                });
            Ok(())
        }
    }

    #[tokio::test]
    async fn each_run_starts_from_an_empty_registry() {
        let pipeline = Pipeline::new(fetcher());
        let mut emitter = RustEmitter::in_memory();

        let first: Vec<Box<dyn Conversion>> = vec![Box::new(GlobalRecord {
            name: "a",
            record: "Alpha",
        })];
        let graph = pipeline.run(&first, &mut emitter).await.unwrap();
        assert!(graph.lookup("Alpha").is_some());

        let second: Vec<Box<dyn Conversion>> = vec![Box::new(GlobalRecord {
            name: "b",
            record: "Beta",
        })];
        let mut emitter = RustEmitter::in_memory();
        let graph = pipeline.run(&second, &mut emitter).await.unwrap();
        assert!(graph.lookup("Alpha").is_none());
        assert!(graph.lookup("Beta").is_some());
        let targets: Vec<_> = graph.checks().map(|check| check.target.as_str()).collect();
        assert_eq!(targets, ["Beta"]);
        assert!(!emitter.files().iter().any(|file| file.contents.contains("Alpha")));
    }

    struct Dependent;

    impl Conversion for Dependent {
        fn name(&self) -> &str {
            "comment"
        }

        fn url(&self) -> &str {
            "comment"
        }

        fn expect(&self, _: &mut Comparator<'_, DocumentBuilder>) -> Result<(), DriftError> {
            Ok(())
        }

        fn requires(&self) -> &[&str] {
            &["user"]
        }
    }

    fn names(selected: &[Box<dyn Conversion>]) -> Vec<&str> {
        selected.iter().map(|c| c.name()).collect()
    }

    #[test]
    fn selection_pulls_in_required_documents() {
        let mut all = conversions(&[("user", "A user."), ("emoji", "An emoji.")]);
        all.push(Box::new(Dependent));

        let selected = select_conversions(all, &["comment".to_string()]).unwrap();
        assert_eq!(names(&selected), ["user", "comment"]);
    }

    #[test]
    fn selection_keeps_order_and_reports_unknown_names() {
        let all = conversions(&[("user", "A user."), ("emoji", "An emoji.")]);
        let selected = select_conversions(all, &["emoji".into(), "user".into(), "emoji".into()]).unwrap();
        assert_eq!(names(&selected), ["user", "emoji"]);

        let all = conversions(&[("user", "A user.")]);
        assert_eq!(
            select_conversions(all, &["database".into()]).err(),
            Some("database".to_string())
        );

        let missing_requirement: Vec<Box<dyn Conversion>> = vec![Box::new(Dependent)];
        assert_eq!(
            select_conversions(missing_requirement, &["comment".into()]).err(),
            Some("user".to_string())
        );
    }

    #[tokio::test]
    async fn custom_payload_attribute_is_honoured() {
        let fetcher = StaticFetcher::new().with_page("user", &Page::new("User", "A user.\n"), "data-props");
        let conversions = conversions(&[("user", "A user.")]);
        let mut emitter = RustEmitter::in_memory();

        let missing = Pipeline::new(fetcher.clone())
            .run(&conversions, &mut emitter)
            .await
            .unwrap_err();
        assert!(missing.to_string().contains("grammar fault"));

        let graph = Pipeline::new(fetcher)
            .with_payload_attribute("data-props")
            .run(&conversions, &mut emitter)
            .await
            .unwrap();
        assert_eq!(graph.documents[0].symbols[0].name(), "User");
    }
}
