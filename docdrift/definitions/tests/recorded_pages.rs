//! Runs every Notion conversion against its recorded page.

use docdrift_definitions::notion;
use docdrift_definitions::{conversions, recorded_pages};
use docdrift_lib::emit::RustEmitter;
use docdrift_lib::errors::{DocumentError, DriftKind, RunError};
use docdrift_lib::fetch::StaticFetcher;
use docdrift_lib::page::{DEFAULT_PAYLOAD_ATTRIBUTE, Page};
use docdrift_lib::pipeline::{Pipeline, select_conversions};
use docdrift_lib::schema::{Symbol, SymbolGraph};

async fn run(fetcher: StaticFetcher, emitter: &mut RustEmitter) -> Result<SymbolGraph, RunError> {
    Pipeline::new(fetcher).run(&conversions(), emitter).await
}

fn document_error(err: RunError, document: &str) -> DocumentError {
    let RunError::Documents(failures) = err else {
        panic!("expected document failures, got {err}");
    };
    assert_eq!(failures.len(), 1, "{failures:?}");
    let failure = failures.into_iter().next().unwrap();
    assert_eq!(failure.document, document);
    failure.error
}

#[tokio::test]
async fn recorded_pages_match_their_expectations() {
    let mut emitter = RustEmitter::in_memory();
    let graph = run(recorded_pages(DEFAULT_PAYLOAD_ATTRIBUTE), &mut emitter)
        .await
        .unwrap();

    let documents: Vec<_> = graph.documents.iter().map(|d| d.document.as_str()).collect();
    assert_eq!(documents, ["emoji", "file", "retrieve_user", "user"]);

    let Some(Symbol::ClosedUnion(user)) = graph.lookup("User") else {
        panic!("User should be a closed union");
    };
    assert_eq!(user.dispatch_values(), ["bot", "person"]);
    let fields: Vec<_> = user.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(fields, ["type", "object", "id", "name", "avatar_url", "person", "bot"]);

    let Some(Symbol::Record(bot)) = graph.lookup("Bot") else {
        panic!("Bot should be a record");
    };
    let fields: Vec<_> = bot.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(fields, ["workspace_name", "workspace_id"]);

    let members: Vec<_> = graph.members_of("Icon").map(|m| m.member.as_str()).collect();
    assert_eq!(members, ["Emoji", "File"]);

    let targets: Vec<_> = graph.checks().map(|c| c.target.as_str()).collect();
    assert_eq!(targets, ["Emoji", "File", "Icon", "User"]);
    let user_check = graph.checks().find(|c| c.target == "User").unwrap();
    assert_eq!(user_check.payloads.len(), 2);
}

#[tokio::test]
async fn every_document_runs_on_its_own() {
    for conversion in conversions() {
        let name = conversion.name().to_string();
        let selected = select_conversions(conversions(), &[name.clone()])
            .unwrap_or_else(|missing| panic!("unknown document {missing}"));
        let mut emitter = RustEmitter::in_memory();

        let result = Pipeline::new(recorded_pages(DEFAULT_PAYLOAD_ATTRIBUTE))
            .run(&selected, &mut emitter)
            .await;
        assert!(result.is_ok(), "{name}: {:?}", result.err());
        assert!(emitter.files().iter().any(|f| f.path.display().to_string() == format!("{name}.rs")));
    }
}

#[tokio::test]
async fn retrieve_user_alone_fails_without_its_requirement() {
    let selected: Vec<_> = conversions()
        .into_iter()
        .filter(|c| c.name() == "retrieve_user")
        .collect();
    let mut emitter = RustEmitter::in_memory();
    let err = Pipeline::new(recorded_pages(DEFAULT_PAYLOAD_ATTRIBUTE))
        .run(&selected, &mut emitter)
        .await
        .err()
        .unwrap();
    assert_eq!(err.to_string(), "schema finalization failed: unknown symbol `User`");
}

#[tokio::test]
async fn generated_modules_are_written_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let mut emitter = RustEmitter::new(dir.path());
    run(recorded_pages(DEFAULT_PAYLOAD_ATTRIBUTE), &mut emitter)
        .await
        .unwrap();

    for file in ["emoji.rs", "file.rs", "retrieve_user.rs", "user.rs", "global.rs", "mod.rs"] {
        assert!(dir.path().join(file).exists(), "{file} missing");
    }
    let global = std::fs::read_to_string(dir.path().join("global.rs")).unwrap();
    assert!(global.contains("pub enum Icon"));
    assert!(global.contains("pub struct AlwaysUser;"));
    let user = std::fs::read_to_string(dir.path().join("user.rs")).unwrap();
    assert!(user.contains("pub struct Person"));
}

#[tokio::test]
async fn edited_page_is_reported_as_drift() {
    let mut fetcher = StaticFetcher::new();
    for (url, mut page) in notion::recorded_pages() {
        if url == notion::emoji::URL {
            page.body = page.body.replace("The emoji character.", "The emoji character, as a string.");
        }
        fetcher = fetcher.with_page(url, &page, DEFAULT_PAYLOAD_ATTRIBUTE);
    }

    let mut emitter = RustEmitter::in_memory();
    let err = run(fetcher, &mut emitter).await.unwrap_err();
    match document_error(err, "emoji") {
        DocumentError::Drift(drift) => {
            assert_eq!(drift.position, 2);
            assert!(matches!(drift.kind, DriftKind::Mismatch { .. }));
        }
        other => panic!("expected drift, got {other}"),
    }
    assert!(emitter.files().is_empty());
}

#[tokio::test]
async fn endpoint_page_without_endpoint_is_drift() {
    let mut fetcher = StaticFetcher::new();
    for (url, page) in notion::recorded_pages() {
        let page = if url == notion::retrieve_user::URL {
            Page::new(page.title, page.body)
        } else {
            page
        };
        fetcher = fetcher.with_page(url, &page, DEFAULT_PAYLOAD_ATTRIBUTE);
    }

    let mut emitter = RustEmitter::in_memory();
    let err = run(fetcher, &mut emitter).await.unwrap_err();
    match document_error(err, "retrieve_user") {
        DocumentError::Drift(drift) => {
            assert!(matches!(drift.kind, DriftKind::MissingEndpoint { .. }));
        }
        other => panic!("expected drift, got {other}"),
    }
}

#[tokio::test]
async fn new_upstream_section_is_leftover_drift() {
    let mut fetcher = StaticFetcher::new();
    for (url, mut page) in notion::recorded_pages() {
        if url == notion::file::URL {
            page.body.push_str("\n## File uploads\n");
        }
        fetcher = fetcher.with_page(url, &page, DEFAULT_PAYLOAD_ATTRIBUTE);
    }

    let mut emitter = RustEmitter::in_memory();
    let err = run(fetcher, &mut emitter).await.unwrap_err();
    match document_error(err, "file") {
        DocumentError::Drift(drift) => assert!(matches!(
            drift.kind,
            DriftKind::Leftover { remaining: 1, .. }
        )),
        other => panic!("expected drift, got {other}"),
    }
}
