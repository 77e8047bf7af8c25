#![allow(clippy::unwrap_used)]

use super::*;
use chrono::NaiveDate;
use rust_decimal_macros::dec;

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn make_sub(user: &str, name: &str, price: Decimal) -> Subscription {
    let mut sub = Subscription::new(user.into(), name.into(), price, date("2024-01-15"));
    sub.frequency = Some(Frequency::Monthly);
    sub.category = Some(Category::Entertainment);
    sub.payment_method = "Credit Card".into();
    sub.renewal_date = Some(date("2024-02-15"));
    sub
}

// ── Default data ──────────────────────────────────────────────

#[test]
fn test_default_rules_seeded() {
    let db = Database::open_in_memory().unwrap();
    let rules = db.get_category_rules().unwrap();
    assert!(!rules.is_empty());
    assert!(rules
        .iter()
        .any(|r| r.pattern == "netflix" && r.category == Category::Entertainment));
}

#[test]
fn test_open_file_database_twice() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("subtrack.db");
    let count = {
        let db = Database::open(&path).unwrap();
        db.insert_subscription(&make_sub("u1", "Netflix", dec!(15.49)))
            .unwrap();
        db.get_category_rules().unwrap().len()
    };
    // Reopening migrates nothing and does not reseed rules
    let db = Database::open(&path).unwrap();
    assert_eq!(db.get_category_rules().unwrap().len(), count);
    assert_eq!(db.get_subscription_count("u1").unwrap(), 1);
}

// ── Subscription CRUD ─────────────────────────────────────────

#[test]
fn test_subscription_roundtrip() {
    let db = Database::open_in_memory().unwrap();
    let mut sub = make_sub("u1", "Netflix", dec!(15.49));
    sub.currency = Some(Currency::Eur);
    db.insert_subscription(&sub).unwrap();

    let fetched = db.get_subscription_by_id(&sub.id).unwrap().unwrap();
    assert_eq!(fetched, sub);
    assert_eq!(fetched.price, dec!(15.49));
    assert_eq!(fetched.renewal_date, Some(date("2024-02-15")));
}

#[test]
fn test_subscription_roundtrip_with_missing_fields() {
    let db = Database::open_in_memory().unwrap();
    let mut sub = make_sub("u1", "Mystery", dec!(3));
    sub.currency = None;
    sub.frequency = None;
    sub.category = None;
    sub.status = None;
    sub.start_date = None;
    sub.renewal_date = None;
    db.insert_subscription(&sub).unwrap();

    let fetched = db.get_subscription_by_id(&sub.id).unwrap().unwrap();
    assert_eq!(fetched, sub);
}

#[test]
fn test_subscription_not_found() {
    let db = Database::open_in_memory().unwrap();
    assert!(db.get_subscription_by_id("missing").unwrap().is_none());
}

#[test]
fn test_insert_rejects_invalid() {
    let db = Database::open_in_memory().unwrap();
    let sub = make_sub("u1", "Bad", dec!(-1));
    assert!(db.insert_subscription(&sub).is_err());
    assert_eq!(db.get_subscription_count("u1").unwrap(), 0);
}

#[test]
fn test_subscriptions_scoped_by_user() {
    let db = Database::open_in_memory().unwrap();
    db.insert_subscription(&make_sub("u1", "Netflix", dec!(15)))
        .unwrap();
    db.insert_subscription(&make_sub("u1", "Spotify", dec!(10)))
        .unwrap();
    db.insert_subscription(&make_sub("u2", "Gym", dec!(40)))
        .unwrap();

    assert_eq!(db.get_subscriptions("u1").unwrap().len(), 2);
    assert_eq!(db.get_subscriptions("u2").unwrap().len(), 1);
    assert!(db.get_subscriptions("u3").unwrap().is_empty());
    assert_eq!(db.get_subscription_count("u1").unwrap(), 2);
}

#[test]
fn test_subscriptions_ordered_by_renewal() {
    let db = Database::open_in_memory().unwrap();
    let mut late = make_sub("u1", "Late", dec!(1));
    late.renewal_date = Some(date("2024-05-01"));
    let mut early = make_sub("u1", "Early", dec!(1));
    early.renewal_date = Some(date("2024-03-01"));
    let mut undated = make_sub("u1", "Undated", dec!(1));
    undated.renewal_date = None;
    for sub in [&undated, &late, &early] {
        db.insert_subscription(sub).unwrap();
    }

    let names: Vec<String> = db
        .get_subscriptions("u1")
        .unwrap()
        .into_iter()
        .map(|s| s.name)
        .collect();
    assert_eq!(names, vec!["Early", "Late", "Undated"]);
}

#[test]
fn test_update_subscription() {
    let db = Database::open_in_memory().unwrap();
    let mut sub = make_sub("u1", "Netflix", dec!(15.49));
    db.insert_subscription(&sub).unwrap();

    sub.name = "Netflix Premium".into();
    sub.price = dec!(22.99);
    sub.frequency = Some(Frequency::Yearly);
    sub.status = Some(Status::Paused);
    assert!(db.update_subscription(&sub).unwrap());

    let fetched = db.get_subscription_by_id(&sub.id).unwrap().unwrap();
    assert_eq!(fetched.name, "Netflix Premium");
    assert_eq!(fetched.price, dec!(22.99));
    assert_eq!(fetched.frequency, Some(Frequency::Yearly));
    assert_eq!(fetched.status, Some(Status::Paused));
    // Ownership and creation time are not editable
    assert_eq!(fetched.user_id, "u1");
    assert_eq!(fetched.created_at, sub.created_at);
}

#[test]
fn test_update_missing_subscription() {
    let db = Database::open_in_memory().unwrap();
    let sub = make_sub("u1", "Ghost", dec!(1));
    assert!(!db.update_subscription(&sub).unwrap());
}

#[test]
fn test_set_status_and_delete() {
    let db = Database::open_in_memory().unwrap();
    let sub = make_sub("u1", "Netflix", dec!(15.49));
    db.insert_subscription(&sub).unwrap();

    assert!(db.set_subscription_status(&sub.id, Status::Canceled).unwrap());
    let fetched = db.get_subscription_by_id(&sub.id).unwrap().unwrap();
    assert_eq!(fetched.status, Some(Status::Canceled));

    assert!(db.delete_subscription(&sub.id).unwrap());
    assert!(!db.delete_subscription(&sub.id).unwrap());
    assert!(db.get_subscription_by_id(&sub.id).unwrap().is_none());
}

#[test]
fn test_batch_insert_skips_existing_ids() {
    let mut db = Database::open_in_memory().unwrap();
    let a = make_sub("u1", "A", dec!(1));
    let b = make_sub("u1", "B", dec!(2));
    db.insert_subscription(&a).unwrap();

    let inserted = db
        .insert_subscriptions_batch(&[a.clone(), b.clone()])
        .unwrap();
    assert_eq!(inserted, 1);
    assert_eq!(db.get_subscription_count("u1").unwrap(), 2);

    let again = db.insert_subscriptions_batch(&[a, b]).unwrap();
    assert_eq!(again, 0);
}

#[test]
fn test_batch_insert_is_atomic_on_invalid() {
    let mut db = Database::open_in_memory().unwrap();
    let good = make_sub("u1", "Good", dec!(1));
    let bad = make_sub("u1", "", dec!(1));
    assert!(db.insert_subscriptions_batch(&[good, bad]).is_err());
    assert_eq!(db.get_subscription_count("u1").unwrap(), 0);
}

#[test]
fn test_find_subscription() {
    let db = Database::open_in_memory().unwrap();
    let netflix = make_sub("u1", "Netflix", dec!(15));
    let spotify = make_sub("u1", "Spotify", dec!(10));
    db.insert_subscription(&netflix).unwrap();
    db.insert_subscription(&spotify).unwrap();

    let by_id = db.find_subscription("u1", &netflix.id).unwrap().unwrap();
    assert_eq!(by_id.name, "Netflix");

    let by_name = db.find_subscription("u1", "spotify").unwrap().unwrap();
    assert_eq!(by_name.id, spotify.id);

    assert!(db.find_subscription("u1", "Hulu").unwrap().is_none());
    assert!(db.find_subscription("u1", "").unwrap().is_none());
    // Other users' records are invisible
    assert!(db.find_subscription("u2", &netflix.id).unwrap().is_none());
}

#[test]
fn test_find_subscription_ambiguous_name() {
    let db = Database::open_in_memory().unwrap();
    db.insert_subscription(&make_sub("u1", "Gym", dec!(30)))
        .unwrap();
    db.insert_subscription(&make_sub("u1", "gym", dec!(35)))
        .unwrap();
    assert!(db.find_subscription("u1", "GYM").is_err());
}

// ── Category rules ────────────────────────────────────────────

#[test]
fn test_category_rule_crud() {
    let db = Database::open_in_memory().unwrap();
    let before = db.get_category_rules().unwrap().len();

    let mut rule = CategoryRule::new_regex(r"^apple (tv|music)".into(), Category::Entertainment);
    rule.priority = 5;
    let id = db.insert_category_rule(&rule).unwrap();

    let rules = db.get_category_rules().unwrap();
    assert_eq!(rules.len(), before + 1);
    // Highest priority first
    assert_eq!(rules[0].id, Some(id));
    assert!(rules[0].is_regex);

    db.delete_category_rule(id).unwrap();
    assert_eq!(db.get_category_rules().unwrap().len(), before);
}

#[test]
fn test_rule_with_unknown_category_ignored() {
    let db = Database::open_in_memory().unwrap();
    let before = db.get_category_rules().unwrap().len();
    db.conn
        .execute(
            "INSERT INTO category_rules (pattern, category, is_regex, priority) VALUES ('x', 'gaming', 0, 0)",
            [],
        )
        .unwrap();
    assert_eq!(db.get_category_rules().unwrap().len(), before);
}

// ── Export ────────────────────────────────────────────────────

#[test]
fn test_export_to_csv() {
    let db = Database::open_in_memory().unwrap();
    db.insert_subscription(&make_sub("u1", "Netflix", dec!(15.49)))
        .unwrap();
    db.insert_subscription(&make_sub("u1", "Spotify", dec!(9.99)))
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("subs.csv");
    let path_str = path.to_str().unwrap();
    let count = db.export_to_csv(path_str, "u1").unwrap();
    assert_eq!(count, 2);

    let content = std::fs::read_to_string(&path).unwrap();
    let mut lines = content.lines();
    assert_eq!(
        lines.next().unwrap(),
        "id,name,price,currency,frequency,category,payment_method,status,start_date,renewal_date"
    );
    assert!(content.contains(",Netflix,15.49,USD,monthly,entertainment,Credit Card,active,2024-01-15,2024-02-15"));
}

#[test]
fn test_export_empty_writes_nothing() {
    let db = Database::open_in_memory().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("subs.csv");
    let count = db.export_to_csv(path.to_str().unwrap(), "u1").unwrap();
    assert_eq!(count, 0);
    assert!(!path.exists());
}
