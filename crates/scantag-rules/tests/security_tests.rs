//! Security tests for rule loading and evaluation
//!
//! Rule sources are edited by people other than the operator, so these tests
//! cover:
//! - ReDoS (Regular Expression Denial of Service) through rule patterns
//! - Regex size limit enforcement
//! - Memory exhaustion via oversized rule sources

use scantag_rules::{
    BannerRecognizer, DocumentEvaluator, EvaluationOptions, RuleError, RuleLoader,
    MAX_PATTERN_LENGTH, MAX_RULE_SOURCE_SIZE,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;

fn rule_source(pattern: &str) -> String {
    serde_json::json!({
        pattern: {
            "detected": "a test pattern",
            "prefix": "{{Tag}}\n",
            "noTagIf": false
        }
    })
    .to_string()
}

fn evaluator_for(pattern: &str) -> DocumentEvaluator {
    let rules = RuleLoader::new().load_str(&rule_source(pattern)).unwrap();
    DocumentEvaluator::new(
        Arc::new(rules),
        BannerRecognizer::default(),
        EvaluationOptions {
            bot_username: "Yapperbot".to_string(),
            guard_suffix: false,
        },
    )
}

// ============================================================================
// ReDoS pattern testing
// ============================================================================

#[test]
fn test_redos_catastrophic_backtracking_nested_quantifiers() {
    // (a+)+b on a long run of 'a' with no 'b'
    let evaluator = evaluator_for("(a+)+b");
    let body = "a".repeat(50_000);

    let start = Instant::now();
    let evaluation = evaluator.evaluate(&body);
    let duration = start.elapsed();

    assert!(!evaluation.needs_edit());
    assert!(
        duration < Duration::from_secs(2),
        "Evaluation took too long: {:?}",
        duration
    );
}

#[test]
fn test_redos_alternation_with_overlap() {
    let evaluator = evaluator_for("(a|a)*b");
    let body = "a".repeat(50_000);

    let start = Instant::now();
    let evaluation = evaluator.evaluate(&body);
    let duration = start.elapsed();

    assert!(!evaluation.needs_edit());
    assert!(
        duration < Duration::from_secs(2),
        "Evaluation took too long: {:?}",
        duration
    );
}

#[test]
fn test_regex_size_limit_enforcement() {
    // Expands far past the compiled size limit
    let err = RuleLoader::new()
        .load_str(&rule_source(r"(\w{1000}){1000}"))
        .unwrap_err();
    assert!(matches!(err, RuleError::InvalidPattern { .. }));
}

#[test]
fn test_overlong_pattern_rejected() {
    let pattern = "a".repeat(MAX_PATTERN_LENGTH + 1);
    let err = RuleLoader::new().load_str(&rule_source(&pattern)).unwrap_err();
    assert!(matches!(err, RuleError::InvalidPattern { .. }));
}

#[test]
fn test_banner_recognition_is_bounded_on_unclosed_templates() {
    let banners = BannerRecognizer::default();
    let body = "{{about|".repeat(10_000);

    let start = Instant::now();
    let _ = banners.insert_prefix(&body, "{{Tag}}\n");
    let duration = start.elapsed();

    assert!(
        duration < Duration::from_secs(2),
        "Placement took too long: {:?}",
        duration
    );
}

// ============================================================================
// Rule source size limits
// ============================================================================

#[tokio::test]
async fn test_loader_rejects_oversized_files() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("rules.json");
    std::fs::write(&path, " ".repeat(MAX_RULE_SOURCE_SIZE as usize + 1)).unwrap();

    let err = RuleLoader::new().load_file(&path).await.unwrap_err();
    assert!(matches!(err, RuleError::SourceTooLarge { .. }));
}

#[tokio::test]
async fn test_loader_accepts_file_at_limit() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("rules.json");

    let mut source = rule_source("stub");
    let padding = MAX_RULE_SOURCE_SIZE as usize - source.len();
    source.push_str(&" ".repeat(padding));
    std::fs::write(&path, &source).unwrap();

    let rules = RuleLoader::new().load_file(&path).await.unwrap();
    assert_eq!(rules.len(), 1);
}

#[tokio::test]
async fn test_loader_reports_missing_file() {
    let temp_dir = TempDir::new().unwrap();
    let err = RuleLoader::new()
        .load_file(&temp_dir.path().join("missing.json"))
        .await
        .unwrap_err();
    assert!(matches!(err, RuleError::LoadError { .. }));
}
