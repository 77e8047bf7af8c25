use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use std::path::Path;

use crate::categorize::Categorizer;
use crate::config::Config;
use crate::db::Database;
use crate::models::{Category, CategoryRule, Status, Subscription, EDITABLE_FIELDS, PAYMENT_METHODS};
use crate::session::UserContext;
use crate::summary;
use crate::ui::util::{format_amount, format_money, truncate};

pub(crate) fn as_cli(
    args: &[String],
    db: &mut Database,
    user: &UserContext,
    config: &Config,
) -> Result<()> {
    let today = Local::now().date_naive();
    let rest = &args[1..];
    match args[0].as_str() {
        "add" | "a" => cli_add(rest, db, user, today),
        "edit" => cli_edit(rest, db, user),
        "delete" | "rm" => cli_delete(rest, db, user),
        "status" => cli_status(rest, db, user),
        "list" | "ls" => cli_list(rest, db, user),
        "summary" | "s" => cli_summary(rest, db, user, config, today),
        "renew" => cli_renew(rest, db, user),
        "import" => cli_import(rest, db, user),
        "export" => cli_export(rest, db, user, today),
        "rule" => cli_rule(rest, db),
        "rules" => cli_rules(db),
        "--help" | "-h" | "help" => {
            print_usage();
            Ok(())
        }
        "--version" | "-V" | "version" => {
            println!("subtrack {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => {
            print_usage();
            anyhow::bail!("Unknown command: {other}");
        }
    }
}

pub(crate) fn print_usage() {
    println!("SubTrack - track recurring subscriptions and upcoming renewals");
    println!();
    println!("Usage: subtrack [--user <id> | --token <jwt>] [command]");
    println!();
    println!("Commands:");
    println!("  (none)                          Launch interactive TUI");
    println!("  add <name> <price> [freq] [cat] Add a subscription");
    println!("    --currency --payment --start --status --renewal   Set extra fields");
    println!("  edit <id|name> --<field> <value>...");
    println!("                                  Edit fields: {}", EDITABLE_FIELDS.join(", "));
    println!("  delete <id|name>                Delete a subscription");
    println!("  status <id|name> <status>       Set status (active, paused, canceled, expired)");
    println!("  list [--status <status>]        List subscriptions");
    println!("  summary [--window <days>]       Print monthly cost, breakdown and upcoming renewals");
    println!("  renew [id|name]                 Recompute renewal dates (all when omitted)");
    println!("  import <file.json|file.csv>     Import an API JSON dump or a CSV file");
    println!("  export [path]                   Export subscriptions to CSV");
    println!("  rule <pattern> <category> [--regex]  Add a categorization rule");
    println!("  rules                           List categorization rules");
    println!("  --help, -h                      Show this help");
    println!("  --version, -V                   Show version");
    println!();
    println!("Environment: SUBTRACK_TOKEN (bearer token), SUBTRACK_LOG (log filter)");
}

/// Split `args` into positionals and `--name value` pairs.
fn split_flags(args: &[String]) -> Result<(Vec<&str>, Vec<(&str, &str)>)> {
    let mut positional = Vec::new();
    let mut flags = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if let Some(name) = arg.strip_prefix("--") {
            let value = iter
                .next()
                .with_context(|| format!("Missing value for --{name}"))?;
            flags.push((name, value.as_str()));
        } else {
            positional.push(arg.as_str());
        }
    }
    Ok((positional, flags))
}

fn flag<'a>(flags: &[(&str, &'a str)], name: &str) -> Option<&'a str> {
    flags.iter().find(|(n, _)| *n == name).map(|(_, v)| *v)
}

/// Look a subscription up by id, id prefix or name.
fn find(db: &Database, user: &UserContext, reference: &str) -> Result<Subscription> {
    db.find_subscription(&user.user_id, reference)?
        .with_context(|| format!("No subscription matches '{reference}'"))
}

fn apply_flags(sub: &mut Subscription, flags: &[(&str, &str)]) -> Result<()> {
    let mut renewal_inputs_changed = false;
    let mut renewal_set = false;
    for (name, value) in flags {
        renewal_inputs_changed |= sub.set_field(name, value)?;
        renewal_set |= matches!(*name, "renewal" | "renewal_date");
    }
    if renewal_inputs_changed && !renewal_set {
        crate::renewal::apply_renewal(sub);
    }
    Ok(())
}

fn cli_add(args: &[String], db: &mut Database, user: &UserContext, today: NaiveDate) -> Result<()> {
    let (positional, flags) = split_flags(args)?;
    if positional.is_empty() {
        anyhow::bail!("Usage: subtrack add <name> <price> [frequency] [category] [--start YYYY-MM-DD]");
    }

    let mut sub = Subscription::from_quick_add(&user.user_id, &positional, today)?;
    crate::renewal::apply_renewal(&mut sub);
    apply_flags(&mut sub, &flags)?;

    if let Some(method) = flag(&flags, "payment") {
        if !PAYMENT_METHODS.iter().any(|m| m.eq_ignore_ascii_case(method)) {
            eprintln!(
                "Note: '{method}' is not a standard payment method ({})",
                PAYMENT_METHODS.join(", ")
            );
        }
    }

    if sub.category.is_none() {
        let (categorizer, _) = Categorizer::new(&db.get_category_rules()?);
        sub.category = categorizer.categorize(&sub.name);
    }

    db.insert_subscription(&sub)?;
    println!(
        "Added {} ({}) {} {}, category {}",
        sub.name,
        short_id(&sub.id),
        format_money(sub.price, sub.currency),
        sub.frequency.map(|f| f.as_str()).unwrap_or("(no frequency)"),
        sub.category_label(),
    );
    if let Some(date) = sub.renewal_date {
        println!("Next renewal: {date}");
    }
    Ok(())
}

fn cli_edit(args: &[String], db: &mut Database, user: &UserContext) -> Result<()> {
    let (positional, flags) = split_flags(args)?;
    if positional.is_empty() || flags.is_empty() {
        anyhow::bail!(
            "Usage: subtrack edit <id|name> --<field> <value>. Fields: {}",
            EDITABLE_FIELDS.join(", ")
        );
    }

    let mut sub = find(db, user, &positional.join(" "))?;
    apply_flags(&mut sub, &flags)?;
    db.update_subscription(&sub)?;
    println!("Updated {} ({})", sub.name, short_id(&sub.id));
    Ok(())
}

fn cli_delete(args: &[String], db: &mut Database, user: &UserContext) -> Result<()> {
    if args.is_empty() {
        anyhow::bail!("Usage: subtrack delete <id|name>");
    }
    let sub = find(db, user, &args.join(" "))?;
    db.delete_subscription(&sub.id)?;
    println!("Deleted {} ({})", sub.name, short_id(&sub.id));
    Ok(())
}

fn cli_status(args: &[String], db: &mut Database, user: &UserContext) -> Result<()> {
    let Some((status_arg, reference)) = args.split_last() else {
        anyhow::bail!("Usage: subtrack status <id|name> <active|paused|canceled|expired>");
    };
    if reference.is_empty() {
        anyhow::bail!("Usage: subtrack status <id|name> <active|paused|canceled|expired>");
    }
    let status = Status::parse(status_arg)
        .with_context(|| format!("Unknown status '{status_arg}'"))?;

    let sub = find(db, user, &reference.join(" "))?;
    db.set_subscription_status(&sub.id, status)?;
    println!("{} is now {status}", sub.name);
    Ok(())
}

fn cli_list(args: &[String], db: &mut Database, user: &UserContext) -> Result<()> {
    let (_, flags) = split_flags(args)?;
    let status_filter = flag(&flags, "status")
        .map(|s| Status::parse(s).with_context(|| format!("Unknown status '{s}'")))
        .transpose()?;

    let subs: Vec<Subscription> = db
        .get_subscriptions(&user.user_id)?
        .into_iter()
        .filter(|s| status_filter.is_none() || s.status == status_filter)
        .collect();
    if subs.is_empty() {
        println!("No subscriptions");
        return Ok(());
    }

    println!(
        "{:<8} {:<24} {:>12} {:<9} {:<14} {:<9} Renews",
        "ID", "Name", "Price", "Frequency", "Category", "Status"
    );
    println!("{}", "─".repeat(90));
    for sub in &subs {
        println!(
            "{:<8} {:<24} {:>12} {:<9} {:<14} {:<9} {}",
            short_id(&sub.id),
            truncate(&sub.name, 24),
            format_money(sub.price, sub.currency),
            sub.frequency.map(|f| f.as_str()).unwrap_or("-"),
            sub.category_label(),
            sub.status.map(|s| s.as_str()).unwrap_or("-"),
            sub.renewal_date.map(|d| d.to_string()).unwrap_or_else(|| "-".into()),
        );
    }
    if status_filter.is_some() {
        let total = db.get_subscription_count(&user.user_id)?;
        println!("{} of {total} subscriptions", subs.len());
    }
    Ok(())
}

fn cli_summary(
    args: &[String],
    db: &mut Database,
    user: &UserContext,
    config: &Config,
    today: NaiveDate,
) -> Result<()> {
    let (_, flags) = split_flags(args)?;
    let window_days = match flag(&flags, "window") {
        Some(w) => w
            .parse::<u32>()
            .with_context(|| format!("Invalid window '{w}', expected a number of days"))?,
        None => config.upcoming_window_days,
    };

    let records = db.get_subscriptions(&user.user_id)?;
    let result = summary::summarize(&records, today, window_days, config.max_upcoming);

    println!("SubTrack: {} on {today}", user.user_id);
    println!("{}", "─".repeat(40));
    println!("  Subscriptions:  {}", result.total_count);
    println!(
        "  Active:         {} ({}%)",
        result.active_count,
        result.active_share_percent()
    );
    println!(
        "  Monthly cost:   {}",
        format_amount(result.normalized_monthly_cost)
    );
    println!(
        "  Yearly cost:    {}",
        format_amount(result.yearly_cost())
    );

    if !result.category_breakdown.is_empty() {
        println!();
        println!("By Category:");
        for (name, amount) in &result.category_breakdown {
            println!(
                "  {name:<16} {:>12} {:>4}%",
                format_amount(*amount),
                result.category_share_percent(*amount)
            );
        }
    }

    println!();
    if result.upcoming_renewals.is_empty() {
        println!("No renewals in the next {window_days} days");
    } else {
        println!("Upcoming renewals (next {window_days} days):");
        for sub in &result.upcoming_renewals {
            println!(
                "  {}  {:<24} {:>12}",
                sub.renewal_date.map(|d| d.to_string()).unwrap_or_default(),
                truncate(&sub.name, 24),
                format_money(sub.price, sub.currency)
            );
        }
    }
    Ok(())
}

fn cli_renew(args: &[String], db: &mut Database, user: &UserContext) -> Result<()> {
    if args.is_empty() {
        let changed = super::renew_all(db, user)?;
        println!("Updated {changed} renewal dates");
        return Ok(());
    }

    let mut sub = find(db, user, &args.join(" "))?;
    if crate::renewal::apply_renewal(&mut sub) {
        db.update_subscription(&sub)?;
    }
    match sub.renewal_date {
        Some(date) => println!("{} renews on {date}", sub.name),
        None => println!(
            "{} has no renewal date: set a start date and frequency first",
            sub.name
        ),
    }
    Ok(())
}

fn cli_import(args: &[String], db: &mut Database, user: &UserContext) -> Result<()> {
    let Some(file_path) = args.first() else {
        anyhow::bail!("Usage: subtrack import <file.json|file.csv>");
    };
    let path = Path::new(file_path);
    if !path.exists() {
        anyhow::bail!("File not found: {file_path}");
    }

    let outcome = super::import_file(db, path, user)?;
    for skipped in &outcome.skipped {
        eprintln!("Skipped record {}: {}", skipped.index + 1, skipped.reason);
    }
    if !outcome.bad_patterns.is_empty() {
        eprintln!(
            "Warning: invalid regex rule(s): {}",
            outcome.bad_patterns.join(", ")
        );
    }

    println!("Parsed {} subscriptions", outcome.parsed);
    println!(
        "Auto-categorized {}/{}",
        outcome.categorized, outcome.parsed
    );
    println!(
        "Imported {} new subscriptions ({} duplicates skipped)",
        outcome.inserted,
        outcome.parsed - outcome.inserted
    );
    for suggestion in &outcome.suggestions {
        println!("Suggested rule: subtrack rule {suggestion} <category>");
    }
    Ok(())
}

fn cli_export(args: &[String], db: &mut Database, user: &UserContext, today: NaiveDate) -> Result<()> {
    let output_path = args
        .first()
        .filter(|a| !a.starts_with('-'))
        .map(|a| super::shellexpand(a))
        .unwrap_or_else(|| super::default_export_path(today));

    let count = db.export_to_csv(&output_path, &user.user_id)?;
    if count == 0 {
        println!("No subscriptions to export");
    } else {
        println!("Exported {count} subscriptions to {output_path}");
    }
    Ok(())
}

fn cli_rule(args: &[String], db: &mut Database) -> Result<()> {
    let is_regex = args.iter().any(|a| a == "--regex");
    let words: Vec<&str> = args
        .iter()
        .filter(|a| *a != "--regex")
        .map(String::as_str)
        .collect();
    let Some((category_name, pattern)) = words.split_last() else {
        anyhow::bail!("Usage: subtrack rule <pattern> <category> [--regex]");
    };
    if pattern.is_empty() {
        anyhow::bail!("Usage: subtrack rule <pattern> <category> [--regex]");
    }

    let category = Category::parse(category_name).with_context(|| {
        let names: Vec<&str> = Category::all().iter().map(|c| c.as_str()).collect();
        format!("Unknown category '{category_name}'. Use {}", names.join(", "))
    })?;
    let pattern = pattern.join(" ");

    let rule = if is_regex {
        regex::Regex::new(&pattern).with_context(|| format!("Invalid regex: {pattern}"))?;
        CategoryRule::new_regex(pattern.clone(), category)
    } else {
        CategoryRule::new_contains(pattern.to_lowercase(), category)
    };
    db.insert_category_rule(&rule)?;
    println!("Added rule: '{}' -> {category}", rule.pattern);
    Ok(())
}

fn cli_rules(db: &mut Database) -> Result<()> {
    let rules = db.get_category_rules()?;
    if rules.is_empty() {
        println!("No rules");
        return Ok(());
    }

    println!("{:<4} {:<28} {:<14} {:<9} Priority", "ID", "Pattern", "Category", "Type");
    println!("{}", "─".repeat(65));
    for rule in &rules {
        println!(
            "{:<4} {:<28} {:<14} {:<9} {}",
            rule.id.unwrap_or(0),
            truncate(&rule.pattern, 28),
            rule.category.as_str(),
            if rule.is_regex { "regex" } else { "contains" },
            rule.priority,
        );
    }
    Ok(())
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_split_flags() {
        let args = strings(&["Disney", "Plus", "7.99", "--start", "2024-01-31", "--currency", "eur"]);
        let (positional, flags) = split_flags(&args).unwrap();
        assert_eq!(positional, vec!["Disney", "Plus", "7.99"]);
        assert_eq!(flags, vec![("start", "2024-01-31"), ("currency", "eur")]);
        assert!(split_flags(&strings(&["Gym", "--start"])).is_err());
    }

    #[test]
    fn test_apply_flags_recomputes_renewal() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let mut sub = Subscription::from_quick_add("u1", &["Gym", "30", "monthly"], today).unwrap();
        apply_flags(&mut sub, &[("start", "2024-01-31")]).unwrap();
        assert_eq!(sub.renewal_date, NaiveDate::from_ymd_opt(2024, 2, 29));

        apply_flags(&mut sub, &[("frequency", "yearly"), ("renewal", "2024-12-25")]).unwrap();
        assert_eq!(sub.renewal_date, NaiveDate::from_ymd_opt(2024, 12, 25));
    }

    #[test]
    fn test_add_then_edit_and_status() {
        let mut db = Database::open_in_memory().unwrap();
        let user = UserContext::new("u1");
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();

        cli_add(&strings(&["Spotify", "9.99", "monthly"]), &mut db, &user, today).unwrap();
        let sub = &db.get_subscriptions("u1").unwrap()[0];
        assert_eq!(sub.category, Some(Category::Entertainment));
        assert_eq!(sub.renewal_date, NaiveDate::from_ymd_opt(2024, 4, 1));

        cli_edit(&strings(&["spotify", "--price", "11.99"]), &mut db, &user).unwrap();
        cli_status(&strings(&["Spotify", "paused"]), &mut db, &user).unwrap();
        let sub = &db.get_subscriptions("u1").unwrap()[0];
        assert_eq!(sub.price, rust_decimal::Decimal::new(1199, 2));
        assert_eq!(sub.status, Some(Status::Paused));

        cli_delete(&strings(&["Spotify"]), &mut db, &user).unwrap();
        assert_eq!(db.get_subscription_count("u1").unwrap(), 0);
    }

    #[test]
    fn test_commands_reject_unknown_references() {
        let mut db = Database::open_in_memory().unwrap();
        let user = UserContext::new("u1");
        assert!(cli_delete(&strings(&["nothing"]), &mut db, &user).is_err());
        assert!(cli_status(&strings(&["paused"]), &mut db, &user).is_err());
        assert!(cli_edit(&strings(&["nothing"]), &mut db, &user).is_err());
    }

    #[test]
    fn test_rule_command() {
        let mut db = Database::open_in_memory().unwrap();
        let before = db.get_category_rules().unwrap().len();
        cli_rule(&strings(&["Apple", "TV", "entertainment"]), &mut db).unwrap();
        cli_rule(&strings(&["^zoom", "productivity", "--regex"]), &mut db).unwrap();
        assert!(cli_rule(&strings(&["(", "health", "--regex"]), &mut db).is_err());
        assert!(cli_rule(&strings(&["zumba", "fitness"]), &mut db).is_err());

        let rules = db.get_category_rules().unwrap();
        assert_eq!(rules.len(), before + 2);
        assert!(rules.iter().any(|r| r.pattern == "apple tv" && !r.is_regex));
        assert!(rules.iter().any(|r| r.pattern == "^zoom" && r.is_regex));
    }

    #[test]
    fn test_short_id() {
        assert_eq!(short_id("0123456789abcdef"), "01234567");
        assert_eq!(short_id("abc"), "abc");
    }
}
