//! End-to-end evaluation tests: rule source in, tagged body out

use proptest::prelude::*;
use scantag_rules::{BannerRecognizer, DocumentEvaluator, EvaluationOptions, RuleLoader};
use std::sync::Arc;

const RULES: &str = r#"{
    "\\bstub\\b": {
        "task": "Tag stubs",
        "example": "This is a stub.",
        "noTagIf": "\\{\\{stub-notice",
        "prefix": "{{stub-notice}}\n",
        "detected": "a stub"
    },
    "born (\\d{4})": {
        "noTagIf": false,
        "suffix": "\n[[Category:$1 births]]",
        "detected": "a birth year"
    }
}"#;

/// Same tags, but nothing excludes a document once it is tagged
const UNEXCLUDED_RULES: &str = r#"{
    "\\bstub\\b": {
        "noTagIf": false,
        "prefix": "{{stub-notice}}\n",
        "detected": "a stub"
    },
    "born (\\d{4})": {
        "noTagIf": false,
        "suffix": "\n[[Category:$1 births]]",
        "detected": "a birth year"
    }
}"#;

fn evaluator(source: &str) -> DocumentEvaluator {
    let rules = RuleLoader::new().load_str(source).unwrap();
    DocumentEvaluator::new(
        Arc::new(rules),
        BannerRecognizer::default(),
        EvaluationOptions {
            bot_username: "Yapperbot".to_string(),
            guard_suffix: true,
        },
    )
}

#[test]
fn test_stub_is_tagged_once() {
    let evaluator = evaluator(RULES);

    let (tagged, evaluation) = evaluator.tag("This is a stub.").unwrap();
    assert_eq!(tagged, "{{stub-notice}}\nThis is a stub.");
    assert_eq!(evaluation.detected(), ["a stub"]);

    // The prefix now satisfies noTagIf
    assert!(evaluator.tag(&tagged).is_none());
}

#[test]
fn test_multiple_rules_combine() {
    let evaluator = evaluator(RULES);
    let body = "{{Short description|Painter}}\nA stub about a painter born 1901.";

    let (tagged, evaluation) = evaluator.tag(body).unwrap();
    assert_eq!(
        tagged,
        "{{Short description|Painter}}\n{{stub-notice}}\nA stub about a painter born 1901.\n[[Category:1901 births]]"
    );
    // Rules run in pattern source order
    assert_eq!(evaluation.detected(), ["a stub", "a birth year"]);
    assert!(evaluator.tag(&tagged).is_none());
}

#[test]
fn test_present_text_guards_a_second_pass() {
    let evaluator = evaluator(UNEXCLUDED_RULES);

    let (tagged, _) = evaluator.tag("A stub about a painter born 1901.").unwrap();
    assert_eq!(
        tagged,
        "{{stub-notice}}\nA stub about a painter born 1901.\n[[Category:1901 births]]"
    );

    let evaluation = evaluator.evaluate(&tagged);
    assert!(!evaluation.needs_edit());
    assert!(evaluation.detected().is_empty());
}

#[test]
fn test_matching_is_case_insensitive() {
    let evaluator = evaluator(RULES);
    let evaluation = evaluator.evaluate("THIS IS A STUB.");
    assert_eq!(evaluation.detected(), ["a stub"]);
}

#[test]
fn test_denied_bot_is_not_tagged() {
    let evaluator = evaluator(RULES);
    assert!(evaluator
        .tag("{{bots|deny=Yapperbot}}\nThis is a stub.")
        .is_none());
    assert!(evaluator
        .tag("{{bots|deny=OtherBot}}\nThis is a stub.")
        .is_some());
}

fn body_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            Just("stub".to_string()),
            Just("born 1950".to_string()),
            Just("{{About|x}}\n".to_string()),
            Just("{{stub-notice}}".to_string()),
            "[a-z ]{0,12}",
            Just("\n".to_string()),
        ],
        0..8,
    )
    .prop_map(|parts| parts.concat())
}

proptest! {
    #[test]
    fn prop_no_match_means_no_edit(body in "[ac-rt-z .,\n]{0,200}") {
        // Bodies without 'b' or 's' can match neither rule
        let evaluator = evaluator(RULES);
        prop_assert!(evaluator.tag(&body).is_none());
    }

    #[test]
    fn prop_opted_out_documents_are_never_edited(body in body_strategy()) {
        let evaluator = evaluator(RULES);
        let body = format!("{{{{nobots}}}}\n{}", body);
        prop_assert!(evaluator.tag(&body).is_none());
    }

    #[test]
    fn prop_tagging_is_idempotent(body in body_strategy()) {
        let evaluator = evaluator(RULES);
        if let Some((tagged, _)) = evaluator.tag(&body) {
            prop_assert!(evaluator.tag(&tagged).is_none());
        }
    }

    #[test]
    fn prop_tagging_is_idempotent_without_exclusions(body in body_strategy()) {
        let evaluator = evaluator(UNEXCLUDED_RULES);
        if let Some((tagged, _)) = evaluator.tag(&body) {
            prop_assert!(evaluator.tag(&tagged).is_none());
        }
    }

    #[test]
    fn prop_tagging_keeps_staged_text(body in body_strategy()) {
        let evaluator = evaluator(RULES);
        if let Some((tagged, evaluation)) = evaluator.tag(&body) {
            if evaluation.prefix().is_empty() {
                prop_assert_eq!(&tagged, &format!("{}{}", body, evaluation.suffix()));
            }
            prop_assert!(tagged.ends_with(evaluation.suffix()));
            prop_assert!(tagged.contains(evaluation.prefix()));
        }
    }
}
