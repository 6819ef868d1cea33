//! Classifier rule table and tie-breaking.

use trendscope::classifier::{evaluate, CategoryRule, PatternClassifier};
use trendscope::types::{QueryKind, DEFAULT_CONFIDENCE};

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn versus_query_is_a_comparison() {
    let result = PatternClassifier::new().classify("warframe vs crusader kings");
    assert_eq!(result.kind, QueryKind::Comparison);
    assert_close(result.confidence, 0.9);
    assert_eq!(result.matched_rule.as_deref(), Some("comparison/3"));
}

#[test]
fn how_big_is_a_sizing_query() {
    let result = PatternClassifier::new().classify("how big is clair obscur's fandom?");
    assert_eq!(result.kind, QueryKind::Sizing);
    assert_close(result.confidence, 0.9);
    assert_eq!(result.matched_rule.as_deref(), Some("sizing/0"));
}

#[test]
fn opinion_phrase_is_recognised() {
    let result = PatternClassifier::new().classify("what do you think about hades 2");
    assert_eq!(result.kind, QueryKind::Opinion);
    assert_close(result.confidence, 0.85);
    assert_eq!(result.matched_rule.as_deref(), Some("opinion/0"));
}

#[test]
fn empty_text_falls_back_to_deep_dive() {
    let result = PatternClassifier::new().classify("");
    assert_eq!(result.kind, QueryKind::DeepDive);
    assert_close(result.confidence, DEFAULT_CONFIDENCE);
    assert!(result.matched_rule.is_none());
}

#[test]
fn unmatched_text_falls_back_to_deep_dive() {
    let result = PatternClassifier::new().classify("hades");
    assert_eq!(result.kind, QueryKind::DeepDive);
    assert_close(result.confidence, DEFAULT_CONFIDENCE);
    assert!(result.matched_rule.is_none());
}

#[test]
fn equal_confidence_keeps_the_earlier_rule() {
    // Calendar and Regional both match at 0.85; Calendar is declared first.
    let result = PatternClassifier::new().classify("what's upcoming in germany");
    assert_eq!(result.kind, QueryKind::Calendar);
    assert_eq!(result.matched_rule.as_deref(), Some("calendar/0"));
}

#[test]
fn higher_confidence_wins_over_earlier_rule() {
    let result = PatternClassifier::new().classify("any mention of free games");
    assert_eq!(result.kind, QueryKind::Search);
    assert_close(result.confidence, 0.9);
}

#[test]
fn later_rule_needs_strictly_greater_confidence() {
    let rules = vec![
        CategoryRule::new(QueryKind::News, 0.7, &["hades"]),
        CategoryRule::new(QueryKind::Search, 0.7, &["hades"]),
        CategoryRule::new(QueryKind::Opinion, 0.71, &["nothing here"]),
    ];
    let result = evaluate(&rules, "hades");
    assert_eq!(result.kind, QueryKind::News);

    let rules = vec![
        CategoryRule::new(QueryKind::News, 0.7, &["hades"]),
        CategoryRule::new(QueryKind::Search, 0.75, &["hades"]),
    ];
    let result = evaluate(&rules, "hades");
    assert_eq!(result.kind, QueryKind::Search);
    assert_eq!(result.matched_rule.as_deref(), Some("search/0"));
}

#[test]
fn patterns_are_case_insensitive() {
    let classifier =
        PatternClassifier::with_rules(vec![CategoryRule::new(QueryKind::News, 0.8, &["steam sale"])]);
    let result = classifier.classify("STEAM SALE this week");
    assert_eq!(result.kind, QueryKind::News);
}

#[test]
fn empty_table_always_falls_back() {
    let classifier = PatternClassifier::with_rules(Vec::new());
    assert!(classifier.rules().is_empty());
    let result = classifier.classify("warframe vs crusader kings");
    assert_eq!(result.kind, QueryKind::DeepDive);
    assert!(result.matched_rule.is_none());
}
