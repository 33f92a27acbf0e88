//! Edit submitter behaviour against the in-memory document service

use async_trait::async_trait;
use scantag_core::{DocumentOutcome, EditSubmitter, Error, SubmitterOptions};
use scantag_rules::{BannerRecognizer, DocumentEvaluator, EvaluationOptions, RuleLoader};
use scantag_wiki::{
    Document, DocumentService, EditOutcome, EditRequest, MemoryWiki, PageRef, RejectionCode,
    RevisionMeta,
};
use std::sync::Arc;
use std::time::Duration;

const RULES: &str = r#"{
    "\\bstub\\b": {
        "detected": "a stub",
        "prefix": "{{stub-notice}}\n",
        "noTagIf": "\\{\\{stub-notice"
    }
}"#;

fn evaluator() -> DocumentEvaluator {
    let rules = RuleLoader::new().load_str(RULES).unwrap();
    DocumentEvaluator::new(
        Arc::new(rules),
        BannerRecognizer::default(),
        EvaluationOptions {
            bot_username: "Yapperbot".to_string(),
            guard_suffix: false,
        },
    )
}

fn options() -> SubmitterOptions {
    SubmitterOptions {
        cooldown: Duration::ZERO,
        ..SubmitterOptions::default()
    }
}

fn submitter(wiki: &MemoryWiki, options: SubmitterOptions) -> EditSubmitter {
    EditSubmitter::new(Arc::new(wiki.clone()), options)
}

async fn fetch(wiki: &MemoryWiki, title: &str) -> Document {
    wiki.fetch(&PageRef::title(title)).await.unwrap().unwrap()
}

#[tokio::test]
async fn test_tags_matching_document() {
    let wiki = MemoryWiki::with_pages([("Foo", "This is a stub.")]);
    let doc = fetch(&wiki, "Foo").await;

    let outcome = submitter(&wiki, options())
        .process(&evaluator(), doc)
        .await
        .unwrap();

    assert_eq!(
        outcome,
        DocumentOutcome::Edited {
            detected: vec!["a stub".to_string()]
        }
    );
    assert_eq!(
        wiki.text("Foo").as_deref(),
        Some("{{stub-notice}}\nThis is a stub.")
    );

    let saved = wiki.saved_edits();
    assert_eq!(saved.len(), 1);
    assert_eq!(
        saved[0].summary,
        "[[User:Yapperbot/Scantag|Scantag]] detected a stub. Tagging article."
    );
    assert!(saved[0].bot);
}

#[tokio::test]
async fn test_untouched_document_is_not_submitted() {
    let wiki = MemoryWiki::with_pages([("Foo", "A long article.")]);
    let doc = fetch(&wiki, "Foo").await;

    let outcome = submitter(&wiki, options())
        .process(&evaluator(), doc)
        .await
        .unwrap();

    assert_eq!(outcome, DocumentOutcome::Untouched);
    assert_eq!(wiki.submission_count(), 0);
}

#[tokio::test]
async fn test_three_conflicts_then_success() {
    let wiki = MemoryWiki::with_pages([("Foo", "This is a stub.")]);
    wiki.reject_next_edits("Foo", "editconflict", 3);
    let doc = fetch(&wiki, "Foo").await;

    let outcome = submitter(&wiki, options())
        .process(&evaluator(), doc)
        .await
        .unwrap();

    assert!(matches!(outcome, DocumentOutcome::Edited { .. }));
    assert_eq!(wiki.saved_edits().len(), 1);
    assert_eq!(wiki.submission_count(), 4);
    // One initial fetch plus one per conflict
    assert_eq!(wiki.fetch_count("Foo"), 4);
}

#[tokio::test]
async fn test_four_conflicts_abandon_document() {
    let wiki = MemoryWiki::with_pages([("Foo", "This is a stub.")]);
    wiki.reject_next_edits("Foo", "editconflict", 4);
    let doc = fetch(&wiki, "Foo").await;

    let outcome = submitter(&wiki, options())
        .process(&evaluator(), doc)
        .await
        .unwrap();

    assert_eq!(outcome, DocumentOutcome::ConflictAbandoned { attempts: 4 });
    assert!(wiki.saved_edits().is_empty());
    assert_eq!(wiki.fetch_count("Foo"), 4);
    assert_eq!(wiki.text("Foo").as_deref(), Some("This is a stub."));
}

#[tokio::test]
async fn test_conflict_re_evaluates_fresh_text() {
    let wiki = MemoryWiki::with_pages([("Foo", "This is a stub.")]);
    let doc = fetch(&wiki, "Foo").await;
    wiki.concurrent_edit("Foo", "{{stub-notice|date=May 2024}}\nThis is a stub.");

    let outcome = submitter(&wiki, options())
        .process(&evaluator(), doc)
        .await
        .unwrap();

    assert_eq!(outcome, DocumentOutcome::Untouched);
    assert_eq!(wiki.submission_count(), 1);
    assert!(wiki.saved_edits().is_empty());
}

#[tokio::test]
async fn test_blocked_is_fatal() {
    let wiki = MemoryWiki::with_pages([("Foo", "This is a stub.")]);
    wiki.reject_next_edits("Foo", "blocked", 1);
    let doc = fetch(&wiki, "Foo").await;

    let err = submitter(&wiki, options())
        .process(&evaluator(), doc)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::PermissionLost {
            code: RejectionCode::Blocked,
            ..
        }
    ));
}

#[tokio::test]
async fn test_write_denied_is_fatal() {
    let wiki = MemoryWiki::with_pages([("Foo", "This is a stub.")]);
    wiki.reject_next_edits("Foo", "writeapidenied", 1);
    let doc = fetch(&wiki, "Foo").await;

    let err = submitter(&wiki, options())
        .process(&evaluator(), doc)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::PermissionLost {
            code: RejectionCode::PermissionDenied,
            ..
        }
    ));
}

#[tokio::test]
async fn test_protected_is_ignored() {
    let wiki = MemoryWiki::with_pages([("Foo", "This is a stub.")]);
    wiki.reject_next_edits("Foo", "protectedpage", 1);
    let doc = fetch(&wiki, "Foo").await;

    let outcome = submitter(&wiki, options())
        .process(&evaluator(), doc)
        .await
        .unwrap();

    assert_eq!(outcome, DocumentOutcome::Ignored(RejectionCode::Protected));
    assert_eq!(wiki.submission_count(), 1);
}

#[tokio::test]
async fn test_deleted_is_ignored() {
    let wiki = MemoryWiki::with_pages([("Foo", "This is a stub.")]);
    let doc = fetch(&wiki, "Foo").await;
    wiki.delete_page("Foo");

    let outcome = submitter(&wiki, options())
        .process(&evaluator(), doc)
        .await
        .unwrap();

    assert_eq!(outcome, DocumentOutcome::Ignored(RejectionCode::Deleted));
}

#[tokio::test]
async fn test_other_rejection_is_skipped() {
    let wiki = MemoryWiki::with_pages([("Foo", "This is a stub.")]);
    wiki.reject_next_edits("Foo", "abusefilter-disallowed", 1);
    let doc = fetch(&wiki, "Foo").await;

    let outcome = submitter(&wiki, options())
        .process(&evaluator(), doc)
        .await
        .unwrap();

    assert_eq!(
        outcome,
        DocumentOutcome::Rejected(RejectionCode::Other("abusefilter-disallowed".to_string()))
    );
}

#[tokio::test]
async fn test_test_mode_summary_marker() {
    let wiki = MemoryWiki::with_pages([("Foo", "This is a stub.")]);
    let doc = fetch(&wiki, "Foo").await;

    submitter(&wiki, options().in_test_mode())
        .process(&evaluator(), doc)
        .await
        .unwrap();

    assert!(wiki.saved_edits()[0].summary.starts_with("SANDBOX: [[User:Yapperbot"));
}

#[tokio::test(start_paused = true)]
async fn test_cooldown_after_saved_edit() {
    let wiki = MemoryWiki::with_pages([("Foo", "This is a stub."), ("Bar", "No match.")]);
    let submitter = submitter(
        &wiki,
        SubmitterOptions {
            cooldown: Duration::from_secs(10),
            ..SubmitterOptions::default()
        },
    );
    let evaluator = evaluator();

    let start = tokio::time::Instant::now();
    submitter
        .process(&evaluator, fetch(&wiki, "Bar").await)
        .await
        .unwrap();
    assert!(start.elapsed() < Duration::from_secs(1));

    submitter
        .process(&evaluator, fetch(&wiki, "Foo").await)
        .await
        .unwrap();
    assert!(start.elapsed() >= Duration::from_secs(10));
}

/// Service whose edits fail outside the rejection vocabulary
struct BrokenService;

#[async_trait]
impl DocumentService for BrokenService {
    async fn fetch_batch(&self, _titles: &[String]) -> scantag_wiki::Result<Vec<Document>> {
        Ok(Vec::new())
    }

    async fn fetch(&self, _page: &PageRef) -> scantag_wiki::Result<Option<Document>> {
        Ok(None)
    }

    async fn revision_meta(&self, page: &PageRef) -> scantag_wiki::Result<RevisionMeta> {
        Err(scantag_wiki::Error::MissingPage(page.to_string()))
    }

    async fn edit(&self, _request: &EditRequest) -> scantag_wiki::Result<EditOutcome> {
        Err(scantag_wiki::Error::malformed("edit response without a result"))
    }
}

#[tokio::test]
async fn test_protocol_failure_is_fatal() {
    let doc = Document {
        title: "Foo".to_string(),
        page_id: 1,
        text: "This is a stub.".to_string(),
        base_timestamp: "2024-01-01T00:00:00Z".to_string(),
        start_timestamp: "2024-01-01T00:00:01Z".to_string(),
    };

    let err = EditSubmitter::new(Arc::new(BrokenService), options())
        .process(&evaluator(), doc)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Service { .. }));
}
