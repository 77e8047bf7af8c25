#![allow(clippy::unwrap_used)]

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::*;
use crate::models::{Category, Frequency, Status, Subscription};

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn make_sub(
    name: &str,
    price: Decimal,
    frequency: Option<Frequency>,
    category: Option<Category>,
    status: Status,
    renewal: Option<&str>,
) -> Subscription {
    let mut sub = Subscription::new("u1".into(), name.into(), price, date("2024-01-01"));
    sub.frequency = frequency;
    sub.category = category;
    sub.status = Some(status);
    sub.renewal_date = renewal.map(date);
    sub
}

fn active(name: &str, price: Decimal, frequency: Frequency) -> Subscription {
    make_sub(name, price, Some(frequency), None, Status::Active, None)
}

fn renewing(name: &str, status: Status, renewal: &str) -> Subscription {
    make_sub(
        name,
        dec!(5),
        Some(Frequency::Monthly),
        None,
        status,
        Some(renewal),
    )
}

const TODAY: &str = "2024-06-10";

// ── Normalization ─────────────────────────────────────────────

#[test]
fn test_yearly_normalizes_to_twelfth() {
    let subs = vec![active("Prime", dec!(120), Frequency::Yearly)];
    let result = summarize(&subs, date(TODAY), 30, 5);
    assert_eq!(result.normalized_monthly_cost, dec!(10));
}

#[test]
fn test_weekly_normalizes_by_433() {
    let subs = vec![active("Meal kit", dec!(10), Frequency::Weekly)];
    let result = summarize(&subs, date(TODAY), 30, 5);
    assert_eq!(result.normalized_monthly_cost, dec!(43.3));
}

#[test]
fn test_monthly_passes_through() {
    let subs = vec![active("Netflix", dec!(15.49), Frequency::Monthly)];
    let result = summarize(&subs, date(TODAY), 30, 5);
    assert_eq!(result.normalized_monthly_cost, dec!(15.49));
}

#[test]
fn test_daily_is_not_normalized() {
    // Daily prices are summed as-is, matching existing dashboard behaviour.
    let subs = vec![active("News", dec!(2), Frequency::Daily)];
    let result = summarize(&subs, date(TODAY), 30, 5);
    assert_eq!(result.normalized_monthly_cost, dec!(2));
}

#[test]
fn test_unknown_frequency_falls_back_to_price() {
    let subs = vec![
        make_sub("Mystery", dec!(7), None, None, Status::Active, None),
        active("Prime", dec!(120), Frequency::Yearly),
    ];
    let result = summarize(&subs, date(TODAY), 30, 5);
    assert_eq!(result.normalized_monthly_cost, dec!(17));
}

#[test]
fn test_monthly_cost_helper() {
    assert_eq!(monthly_cost(&active("a", dec!(24), Frequency::Yearly)), dec!(2));
    assert_eq!(monthly_cost(&active("b", dec!(1), Frequency::Weekly)), dec!(4.33));
    assert_eq!(monthly_cost(&active("c", dec!(8), Frequency::Monthly)), dec!(8));
}

// ── Counts ────────────────────────────────────────────────────

#[test]
fn test_counts_and_inactive_excluded_from_cost() {
    let subs = vec![
        active("Netflix", dec!(15), Frequency::Monthly),
        make_sub("Gym", dec!(40), Some(Frequency::Monthly), None, Status::Paused, None),
        make_sub("Old", dec!(99), Some(Frequency::Monthly), None, Status::Canceled, None),
        make_sub("Trial", dec!(5), Some(Frequency::Monthly), None, Status::Expired, None),
    ];
    let result = summarize(&subs, date(TODAY), 30, 5);
    assert_eq!(result.total_count, 4);
    assert_eq!(result.active_count, 1);
    assert!(result.active_count <= result.total_count);
    assert_eq!(result.normalized_monthly_cost, dec!(15));
    assert_eq!(result.active_share_percent(), 25);
}

#[test]
fn test_unknown_status_is_not_active() {
    let mut sub = active("Netflix", dec!(15), Frequency::Monthly);
    sub.status = None;
    let result = summarize(&[sub], date(TODAY), 30, 5);
    assert_eq!(result.total_count, 1);
    assert_eq!(result.active_count, 0);
}

#[test]
fn test_empty_input() {
    let result = summarize(&[], date(TODAY), 30, 5);
    assert_eq!(result.total_count, 0);
    assert_eq!(result.active_count, 0);
    assert_eq!(result.normalized_monthly_cost, Decimal::ZERO);
    assert!(result.category_breakdown.is_empty());
    assert!(result.upcoming_renewals.is_empty());
    assert_eq!(result.active_share_percent(), 0);
    assert_eq!(result.category_share_percent(dec!(10)), 0);
}

#[test]
fn test_no_active_reports_zero() {
    let subs = vec![
        make_sub("Gym", dec!(40), Some(Frequency::Monthly), None, Status::Paused, None),
        make_sub("Old", dec!(12), Some(Frequency::Yearly), None, Status::Canceled, None),
    ];
    let result = summarize(&subs, date(TODAY), 30, 5);
    assert_eq!(result.active_count, 0);
    assert_eq!(result.normalized_monthly_cost, Decimal::ZERO);
    assert_eq!(result.active_share_percent(), 0);
    assert_eq!(result.category_share_percent(Decimal::ZERO), 0);
}

#[test]
fn test_active_share_rounds_half_up() {
    // 1 of 8 = 12.5% → 13
    let mut subs = vec![active("a", dec!(1), Frequency::Monthly)];
    for i in 0..7 {
        subs.push(make_sub(
            &format!("p{i}"),
            dec!(1),
            Some(Frequency::Monthly),
            None,
            Status::Paused,
            None,
        ));
    }
    let result = summarize(&subs, date(TODAY), 30, 5);
    assert_eq!(result.active_share_percent(), 13);
}

// ── Category breakdown ────────────────────────────────────────

#[test]
fn test_category_breakdown_first_seen_order() {
    let subs = vec![
        make_sub("Coursera", dec!(30), Some(Frequency::Monthly), Some(Category::Education), Status::Active, None),
        make_sub("Netflix", dec!(15), Some(Frequency::Monthly), Some(Category::Entertainment), Status::Active, None),
        make_sub("Udemy", dec!(120), Some(Frequency::Yearly), Some(Category::Education), Status::Active, None),
        make_sub("Misc", dec!(3), Some(Frequency::Monthly), None, Status::Active, None),
    ];
    let result = summarize(&subs, date(TODAY), 30, 5);
    assert_eq!(
        result.category_breakdown,
        vec![
            ("education".to_string(), dec!(40)),
            ("entertainment".to_string(), dec!(15)),
            ("Uncategorized".to_string(), dec!(3)),
        ]
    );
}

#[test]
fn test_category_breakdown_skips_inactive() {
    let subs = vec![
        make_sub("Gym", dec!(40), Some(Frequency::Monthly), Some(Category::Health), Status::Paused, None),
        make_sub("Notion", dec!(8), Some(Frequency::Monthly), Some(Category::Productivity), Status::Active, None),
    ];
    let result = summarize(&subs, date(TODAY), 30, 5);
    assert_eq!(result.category_breakdown.len(), 1);
    assert_eq!(result.category_breakdown[0].0, "productivity");
}

#[test]
fn test_category_breakdown_sums_to_total() {
    let subs = vec![
        make_sub("A", dec!(10), Some(Frequency::Weekly), Some(Category::Health), Status::Active, None),
        make_sub("B", dec!(100), Some(Frequency::Yearly), Some(Category::Health), Status::Active, None),
        make_sub("C", dec!(7.5), Some(Frequency::Monthly), Some(Category::Other), Status::Active, None),
        make_sub("D", dec!(1), Some(Frequency::Daily), None, Status::Active, None),
        make_sub("E", dec!(50), Some(Frequency::Monthly), Some(Category::Other), Status::Canceled, None),
    ];
    let result = summarize(&subs, date(TODAY), 30, 5);
    let sum: Decimal = result.category_breakdown.iter().map(|(_, v)| *v).sum();
    assert!((sum - result.normalized_monthly_cost).abs() < dec!(0.000001));
}

#[test]
fn test_category_share_percent() {
    let subs = vec![
        make_sub("A", dec!(75), Some(Frequency::Monthly), Some(Category::Health), Status::Active, None),
        make_sub("B", dec!(25), Some(Frequency::Monthly), Some(Category::Other), Status::Active, None),
    ];
    let result = summarize(&subs, date(TODAY), 30, 5);
    assert_eq!(result.category_share_percent(dec!(75)), 75);
    assert_eq!(result.category_share_percent(dec!(25)), 25);
    assert_eq!(result.category_share_percent(dec!(500)), 100);
}

// ── Upcoming renewals ─────────────────────────────────────────

#[test]
fn test_upcoming_sorted_and_windowed() {
    let subs = vec![
        renewing("Late", Status::Active, "2024-07-01"),
        renewing("Today", Status::Active, "2024-06-10"),
        renewing("Past", Status::Active, "2024-06-09"),
        renewing("Edge", Status::Active, "2024-07-10"),
        renewing("Beyond", Status::Active, "2024-07-11"),
        renewing("Soon", Status::Active, "2024-06-12"),
    ];
    let result = summarize(&subs, date(TODAY), 30, 5);
    let names: Vec<&str> = result
        .upcoming_renewals
        .iter()
        .map(|s| s.name.as_str())
        .collect();
    assert_eq!(names, vec!["Today", "Soon", "Late", "Edge"]);
}

#[test]
fn test_upcoming_excludes_inactive_and_undated() {
    let mut undated = renewing("Undated", Status::Active, "2024-06-15");
    undated.renewal_date = None;
    let subs = vec![
        renewing("Paused", Status::Paused, "2024-06-11"),
        renewing("Canceled", Status::Canceled, "2024-06-12"),
        undated,
        renewing("Active", Status::Active, "2024-06-20"),
    ];
    let result = summarize(&subs, date(TODAY), 30, 5);
    assert_eq!(result.upcoming_renewals.len(), 1);
    assert_eq!(result.upcoming_renewals[0].name, "Active");
}

#[test]
fn test_upcoming_capped() {
    let subs: Vec<Subscription> = (11..=20)
        .map(|d| renewing(&format!("S{d}"), Status::Active, &format!("2024-06-{d}")))
        .rev()
        .collect();
    let result = summarize(&subs, date(TODAY), 30, 5);
    assert_eq!(result.upcoming_renewals.len(), 5);
    assert_eq!(result.upcoming_renewals[0].name, "S11");
    assert_eq!(result.upcoming_renewals[4].name, "S15");
}

#[test]
fn test_upcoming_properties_hold() {
    let today = date(TODAY);
    let subs: Vec<Subscription> = (0..40)
        .map(|i| {
            let status = if i % 3 == 0 { Status::Paused } else { Status::Active };
            let day = today + chrono::Days::new(i * 2);
            renewing(&format!("S{i}"), status, &day.format("%Y-%m-%d").to_string())
        })
        .collect();
    let result = summarize(&subs, today, 30, 7);
    assert!(result.upcoming_renewals.len() <= 7);
    let window_end = today + chrono::Days::new(30);
    for pair in result.upcoming_renewals.windows(2) {
        assert!(pair[0].renewal_date <= pair[1].renewal_date);
    }
    for sub in &result.upcoming_renewals {
        let d = sub.renewal_date.unwrap();
        assert!(d >= today && d <= window_end);
        assert!(sub.is_active());
    }
}

#[test]
fn test_upcoming_ties_keep_input_order() {
    let subs = vec![
        renewing("First", Status::Active, "2024-06-15"),
        renewing("Second", Status::Active, "2024-06-15"),
    ];
    let result = summarize(&subs, date(TODAY), 30, 5);
    assert_eq!(result.upcoming_renewals[0].name, "First");
    assert_eq!(result.upcoming_renewals[1].name, "Second");
}

#[test]
fn test_zero_window_only_today() {
    let subs = vec![
        renewing("Today", Status::Active, "2024-06-10"),
        renewing("Tomorrow", Status::Active, "2024-06-11"),
    ];
    let result = summarize(&subs, date(TODAY), 0, 5);
    assert_eq!(result.upcoming_renewals.len(), 1);
    assert_eq!(result.upcoming_renewals[0].name, "Today");
}

#[test]
fn test_defaults() {
    assert_eq!(DEFAULT_WINDOW_DAYS, 30);
    assert_eq!(DEFAULT_MAX_UPCOMING, 5);
}

// ── Overflow ──────────────────────────────────────────────────

#[test]
fn test_huge_weekly_price_from_api_saturates() {
    let body = r#"{"data":[{"name":"Big","price":"79228162514264337593543950335","frequency":"weekly","status":"active"}]}"#;
    let imported =
        crate::import::parse_api_response(body, &crate::session::UserContext::new("u1")).unwrap();
    assert_eq!(imported.records.len(), 1);

    let result = summarize(&imported.records, date(TODAY), 30, 5);
    assert_eq!(result.normalized_monthly_cost, Decimal::MAX);
    assert_eq!(result.yearly_cost(), Decimal::MAX);
    assert_eq!(result.category_share_percent(Decimal::MAX), 100);
}

#[test]
fn test_two_huge_monthly_prices_saturate() {
    let near_max = Decimal::MAX - Decimal::ONE;
    let subs = vec![
        make_sub("A", near_max, Some(Frequency::Monthly), Some(Category::Health), Status::Active, None),
        make_sub("B", near_max, Some(Frequency::Monthly), Some(Category::Health), Status::Active, None),
    ];
    let result = summarize(&subs, date(TODAY), 30, 5);
    assert_eq!(result.active_count, 2);
    assert_eq!(result.normalized_monthly_cost, Decimal::MAX);
    assert_eq!(result.category_breakdown, vec![("health".to_string(), Decimal::MAX)]);
    assert_eq!(result.category_share_percent(near_max), 100);
    assert_eq!(result.active_share_percent(), 100);
}

#[test]
fn test_yearly_cost() {
    let subs = vec![active("Gym", dec!(30), Frequency::Monthly)];
    let result = summarize(&subs, date(TODAY), 30, 5);
    assert_eq!(result.yearly_cost(), dec!(360));
}
