#![allow(clippy::unwrap_used)]

use chrono::NaiveDate;
use rust_decimal_macros::dec;

use super::*;
use crate::models::{Category, CategoryRule, Subscription};

fn make_rule(pattern: &str, category: Category) -> CategoryRule {
    CategoryRule::new_contains(pattern.to_string(), category)
}

fn make_regex_rule(pattern: &str, category: Category) -> CategoryRule {
    CategoryRule::new_regex(pattern.to_string(), category)
}

fn make_sub(name: &str) -> Subscription {
    let today = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
    Subscription::new("u1".into(), name.into(), dec!(9.99), today)
}

// ── Categorizer ───────────────────────────────────────────────

#[test]
fn test_categorize_contains_match() {
    let rules = vec![
        make_rule("netflix", Category::Entertainment),
        make_rule("notion", Category::Productivity),
    ];
    let (cat, bad) = Categorizer::new(&rules);
    assert!(bad.is_empty());
    assert_eq!(cat.categorize("Netflix Premium"), Some(Category::Entertainment));
    assert_eq!(cat.categorize("NOTION PLUS"), Some(Category::Productivity));
}

#[test]
fn test_categorize_no_match() {
    let rules = vec![make_rule("netflix", Category::Entertainment)];
    let (cat, _) = Categorizer::new(&rules);
    assert_eq!(cat.categorize("Headspace"), None);
}

#[test]
fn test_categorize_first_match_wins() {
    let rules = vec![
        make_rule("plus", Category::Other),
        make_rule("disney plus", Category::Entertainment),
    ];
    let (cat, _) = Categorizer::new(&rules);
    assert_eq!(cat.categorize("Disney Plus"), Some(Category::Other));
}

#[test]
fn test_categorize_priority_orders_rules() {
    let mut specific = make_rule("disney plus", Category::Entertainment);
    specific.priority = 10;
    let rules = vec![make_rule("plus", Category::Other), specific];
    let (cat, _) = Categorizer::new(&rules);
    assert_eq!(cat.categorize("Disney Plus"), Some(Category::Entertainment));
}

#[test]
fn test_categorize_regex_case_insensitive() {
    let rules = vec![make_regex_rule(r"^(udemy|coursera)\b", Category::Education)];
    let (cat, _) = Categorizer::new(&rules);
    assert_eq!(cat.categorize("Coursera Plus"), Some(Category::Education));
    assert_eq!(cat.categorize("UDEMY business"), Some(Category::Education));
    assert_eq!(cat.categorize("Learn on Udemy"), None);
}

#[test]
fn test_invalid_regex_reported_and_skipped() {
    let rules = vec![
        make_regex_rule(r"([unclosed", Category::Other),
        make_rule("gym", Category::Health),
    ];
    let (cat, bad) = Categorizer::new(&rules);
    assert_eq!(bad, vec!["([unclosed".to_string()]);
    assert_eq!(cat.categorize("Gym membership"), Some(Category::Health));
}

#[test]
fn test_empty_rules() {
    let (cat, _) = Categorizer::new(&[]);
    assert_eq!(cat.categorize("Anything"), None);
}

#[test]
fn test_categorize_batch_only_fills_missing() {
    let rules = vec![make_rule("spotify", Category::Entertainment)];
    let (cat, _) = Categorizer::new(&rules);

    let mut already = make_sub("Spotify Family");
    already.category = Some(Category::Other);
    let mut subs = vec![make_sub("Spotify"), already, make_sub("Gym")];

    let count = cat.categorize_batch(&mut subs);
    assert_eq!(count, 1);
    assert_eq!(subs[0].category, Some(Category::Entertainment));
    assert_eq!(subs[1].category, Some(Category::Other));
    assert_eq!(subs[2].category, None);
}

// ── suggest_rule ──────────────────────────────────────────────

#[test]
fn test_suggest_rule_first_word() {
    assert_eq!(suggest_rule("Netflix Premium").as_deref(), Some("netflix"));
    assert_eq!(suggest_rule("  ChatGPT Plus ").as_deref(), Some("chatgpt"));
}

#[test]
fn test_suggest_rule_strips_punctuation() {
    assert_eq!(suggest_rule("Disney+").as_deref(), Some("disney"));
    assert_eq!(suggest_rule("*** ").as_deref(), None);
    assert_eq!(suggest_rule("").as_deref(), None);
}
