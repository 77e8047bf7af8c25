use std::collections::HashMap;
use std::sync::LazyLock;

use super::app::{App, InputMode, PendingAction, Screen};
use crate::categorize::Categorizer;
use crate::db::Database;
use crate::models::{Category, CategoryRule, Status, Subscription};

pub(crate) struct Command {
    pub(crate) description: &'static str,
    pub(crate) run: fn(&str, &mut App, &mut Database) -> anyhow::Result<()>,
}

macro_rules! register_command {
    ($name:expr, $desc:expr, $func:expr, $registry:expr) => {{
        $registry.insert(
            $name,
            Command {
                description: $desc,
                run: $func,
            },
        );
    }};
}

pub(crate) static COMMANDS: LazyLock<HashMap<&str, Command>> = LazyLock::new(|| {
    let mut r: HashMap<&str, Command> = HashMap::new();

    register_command!("q", "Quit SubTrack", cmd_quit, r);
    register_command!("quit", "Quit SubTrack", cmd_quit, r);
    register_command!("d", "Go to Dashboard", cmd_dashboard, r);
    register_command!("dashboard", "Go to Dashboard", cmd_dashboard, r);
    register_command!("s", "Go to Subscriptions", cmd_subscriptions, r);
    register_command!("subs", "Go to Subscriptions", cmd_subscriptions, r);
    register_command!("rules", "Go to Rules", cmd_rules, r);
    register_command!("help", "Show available commands", cmd_help, r);
    register_command!("h", "Show available commands", cmd_help, r);
    register_command!(
        "add",
        "Add subscription (e.g. :add Netflix 15.49 monthly entertainment)",
        cmd_add,
        r
    );
    register_command!("a", "Add subscription (e.g. :a Gym 30 monthly)", cmd_add, r);
    register_command!(
        "edit",
        "Edit selected subscription (e.g. :edit price 17.99)",
        cmd_edit,
        r
    );
    register_command!("rename", "Rename selected subscription", cmd_rename, r);
    register_command!("delete", "Delete selected subscription", cmd_delete, r);
    register_command!("pause", "Pause selected subscription", cmd_pause, r);
    register_command!("resume", "Resume selected subscription", cmd_resume, r);
    register_command!("cancel", "Cancel selected subscription", cmd_cancel, r);
    register_command!(
        "renew",
        "Recompute renewal date (selected, or :renew all)",
        cmd_renew,
        r
    );
    register_command!(
        "rule",
        "Add categorization rule (e.g. :rule spotify entertainment)",
        cmd_rule,
        r
    );
    register_command!(
        "regex-rule",
        "Add regex rule (e.g. :regex-rule ^apple\\s entertainment)",
        cmd_regex_rule,
        r
    );
    register_command!("delete-rule", "Delete selected rule", cmd_delete_rule, r);
    register_command!(
        "categorize",
        "Apply rules to uncategorized subscriptions",
        cmd_categorize,
        r
    );
    register_command!(
        "window",
        "Set upcoming renewal window in days (e.g. :window 14)",
        cmd_window,
        r
    );
    register_command!(
        "search",
        "Filter subscriptions (e.g. :search music)",
        cmd_search,
        r
    );
    register_command!(
        "import",
        "Import a JSON API dump or CSV file (e.g. :import ~/subs.json)",
        cmd_import,
        r
    );
    register_command!(
        "export",
        "Export subscriptions to CSV (e.g. :export ~/subs.csv)",
        cmd_export,
        r
    );

    r
});

pub(crate) fn handle_command(input: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    let trimmed = input.trim();
    let mut parts = trimmed.splitn(2, ' ');
    let cmd_name = parts.next().unwrap_or("");
    let args = parts.next().unwrap_or("").trim();

    if let Some(cmd) = COMMANDS.get(cmd_name) {
        if let Err(e) = (cmd.run)(args, app, db) {
            tracing::warn!(command = cmd_name, error = %e, "command failed");
            app.set_status(format!("Error: {e:#}"));
        }
    } else {
        let suggestion = find_closest(cmd_name);
        app.set_status(format!(
            "Unknown command: :{cmd_name}. Did you mean :{suggestion}?"
        ));
    }

    Ok(())
}

fn find_closest(input: &str) -> String {
    COMMANDS
        .keys()
        .filter(|k| k.len() > 1) // skip single-letter aliases for suggestions
        .min_by_key(|k| levenshtein(input, k))
        .unwrap_or(&"help")
        .to_string()
}

fn levenshtein(a: &str, b: &str) -> usize {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=b.len() {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Re-read everything that can change after a write.
fn refresh_after_write(app: &mut App, db: &Database) -> anyhow::Result<()> {
    app.refresh_dashboard(db)?;
    app.refresh_subscriptions(db)?;
    Ok(())
}

/// The subscription under the cursor, or a status hint when there is none.
fn selected_or_hint(app: &mut App) -> Option<Subscription> {
    if app.screen != Screen::Subscriptions {
        app.set_status("Navigate to Subscriptions and select one first");
        return None;
    }
    let selected = app.selected_subscription().cloned();
    if selected.is_none() {
        app.set_status("No subscription selected");
    }
    selected
}

// ── Command implementations ──────────────────────────────────

fn cmd_quit(_args: &str, app: &mut App, _db: &mut Database) -> anyhow::Result<()> {
    app.running = false;
    Ok(())
}

fn cmd_dashboard(_args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    app.screen = Screen::Dashboard;
    app.refresh_dashboard(db)?;
    Ok(())
}

fn cmd_subscriptions(_args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    app.screen = Screen::Subscriptions;
    app.refresh_subscriptions(db)?;
    Ok(())
}

fn cmd_rules(_args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    app.screen = Screen::Rules;
    app.refresh_rules(db)?;
    Ok(())
}

fn cmd_help(_args: &str, app: &mut App, _db: &mut Database) -> anyhow::Result<()> {
    app.show_help = true;
    Ok(())
}

fn cmd_add(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    if args.is_empty() {
        app.set_status("Usage: :add <name> <price> [frequency] [category]");
        return Ok(());
    }

    let tokens: Vec<&str> = args.split_whitespace().collect();
    let mut sub = Subscription::from_quick_add(&app.user.user_id, &tokens, app.today)?;
    crate::renewal::apply_renewal(&mut sub);
    if sub.category.is_none() {
        let (categorizer, _) = Categorizer::new(&db.get_category_rules()?);
        sub.category = categorizer.categorize(&sub.name);
    }

    db.insert_subscription(&sub)?;
    refresh_after_write(app, db)?;
    app.set_status(format!(
        "Added: {} {} ({})",
        sub.name,
        crate::ui::util::format_money(sub.price, sub.currency),
        sub.category_label()
    ));
    Ok(())
}

fn cmd_edit(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    let Some(mut sub) = selected_or_hint(app) else {
        return Ok(());
    };

    let mut parts = args.splitn(2, ' ');
    let field = parts.next().unwrap_or("");
    if field.is_empty() {
        app.set_status(format!(
            "Usage: :edit <field> <value>. Fields: {}",
            crate::models::EDITABLE_FIELDS.join(", ")
        ));
        return Ok(());
    }
    let value = parts.next().unwrap_or("");

    if sub.set_field(field, value)? {
        crate::renewal::apply_renewal(&mut sub);
    }
    db.update_subscription(&sub)?;
    refresh_after_write(app, db)?;
    app.set_status(format!("Updated {field} of {}", sub.name));
    Ok(())
}

fn cmd_rename(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    let Some(mut sub) = selected_or_hint(app) else {
        return Ok(());
    };

    if args.is_empty() {
        // Enter editing mode for inline rename
        app.command_input = sub.name.clone();
        app.input_mode = InputMode::Editing;
        app.set_status("Type new name, press Enter to confirm");
        return Ok(());
    }

    sub.set_field("name", args)?;
    db.update_subscription(&sub)?;
    refresh_after_write(app, db)?;
    app.set_status(format!("Renamed to: {args}"));
    Ok(())
}

fn cmd_delete(_args: &str, app: &mut App, _db: &mut Database) -> anyhow::Result<()> {
    let Some(sub) = selected_or_hint(app) else {
        return Ok(());
    };

    app.confirm_message = format!("Delete '{}'?", sub.name);
    app.pending_action = Some(PendingAction::DeleteSubscription {
        id: sub.id,
        name: sub.name,
    });
    app.input_mode = InputMode::Confirm;
    Ok(())
}

fn set_selected_status(app: &mut App, db: &mut Database, status: Status) -> anyhow::Result<()> {
    let Some(sub) = selected_or_hint(app) else {
        return Ok(());
    };
    if sub.status == Some(status) {
        app.set_status(format!("{} is already {status}", sub.name));
        return Ok(());
    }

    db.set_subscription_status(&sub.id, status)?;
    refresh_after_write(app, db)?;
    app.set_status(format!("{}: {status}", sub.name));
    Ok(())
}

fn cmd_pause(_args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    set_selected_status(app, db, Status::Paused)
}

fn cmd_resume(_args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    set_selected_status(app, db, Status::Active)
}

fn cmd_cancel(_args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    set_selected_status(app, db, Status::Canceled)
}

fn cmd_renew(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    if args == "all" {
        let changed = crate::run::renew_all(db, &app.user)?;
        refresh_after_write(app, db)?;
        app.set_status(format!("Updated {changed} renewal dates"));
        return Ok(());
    }

    let Some(mut sub) = selected_or_hint(app) else {
        return Ok(());
    };
    if crate::renewal::apply_renewal(&mut sub) {
        db.update_subscription(&sub)?;
        refresh_after_write(app, db)?;
        let date = sub.renewal_date.map(|d| d.to_string()).unwrap_or_default();
        app.set_status(format!("{} renews on {date}", sub.name));
    } else if sub.start_date.is_none() || sub.frequency.is_none() {
        app.set_status(format!(
            "{} needs a start date and frequency to compute renewal",
            sub.name
        ));
    } else {
        app.set_status(format!("{} renewal date is already current", sub.name));
    }
    Ok(())
}

/// Split `<pattern...> <category>`, resolving the category name.
fn parse_rule_args<'a>(args: &'a str, app: &mut App, usage: &str) -> Option<(&'a str, Category)> {
    let parts: Vec<&str> = args.rsplitn(2, ' ').collect();
    if parts.len() < 2 || parts[1].trim().is_empty() {
        app.set_status(usage.to_string());
        return None;
    }
    match Category::parse(parts[0]) {
        Some(category) => Some((parts[1].trim(), category)),
        None => {
            let names: Vec<&str> = Category::all().iter().map(|c| c.as_str()).collect();
            app.set_status(format!(
                "Category '{}' not found. Use {}",
                parts[0],
                names.join(", ")
            ));
            None
        }
    }
}

fn cmd_rule(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    let Some((pattern, category)) =
        parse_rule_args(args, app, "Usage: :rule <pattern> <category>")
    else {
        return Ok(());
    };

    let pattern = pattern.to_lowercase();
    db.insert_category_rule(&CategoryRule::new_contains(pattern.clone(), category))?;
    app.refresh_rules(db)?;
    app.set_status(format!("Added rule: '{pattern}' -> {category}"));
    Ok(())
}

fn cmd_regex_rule(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    let Some((pattern, category)) =
        parse_rule_args(args, app, "Usage: :regex-rule <pattern> <category>")
    else {
        return Ok(());
    };

    if regex::Regex::new(pattern).is_err() {
        app.set_status(format!("Invalid regex: {pattern}"));
        return Ok(());
    }

    db.insert_category_rule(&CategoryRule::new_regex(pattern.to_string(), category))?;
    app.refresh_rules(db)?;
    app.set_status(format!("Added regex rule: /{pattern}/ -> {category}"));
    Ok(())
}

fn cmd_delete_rule(_args: &str, app: &mut App, _db: &mut Database) -> anyhow::Result<()> {
    if app.screen != Screen::Rules {
        app.set_status("Navigate to Rules and select one first");
        return Ok(());
    }

    if let Some(rule) = app.selected_rule() {
        if let Some(id) = rule.id {
            let pattern = rule.pattern.clone();
            app.confirm_message = format!("Delete rule '{pattern}'?");
            app.pending_action = Some(PendingAction::DeleteRule { id, pattern });
            app.input_mode = InputMode::Confirm;
        }
    } else {
        app.set_status("No rules to delete");
    }

    Ok(())
}

fn cmd_categorize(_args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    let (categorizer, bad_patterns) = Categorizer::new(&db.get_category_rules()?);
    let mut subs = db.get_subscriptions(&app.user.user_id)?;
    let mut updated = 0;
    for sub in subs.iter_mut().filter(|s| s.category.is_none()) {
        if let Some(category) = categorizer.categorize(&sub.name) {
            sub.category = Some(category);
            db.update_subscription(sub)?;
            updated += 1;
        }
    }

    refresh_after_write(app, db)?;
    let mut msg = format!("Categorized {updated} subscriptions");
    if !bad_patterns.is_empty() {
        msg.push_str(&format!(" (invalid rules skipped: {})", bad_patterns.join(", ")));
    }
    app.set_status(msg);
    Ok(())
}

fn cmd_window(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    if args.is_empty() {
        app.set_status(format!(
            "Upcoming window: {} days. Usage: :window <days>",
            app.window_days
        ));
        return Ok(());
    }

    match args.parse::<u32>() {
        Ok(days) => {
            app.window_days = days;
            app.refresh_dashboard(db)?;
            app.set_status(format!("Showing renewals in the next {days} days"));
        }
        Err(_) => app.set_status(format!("Invalid number of days: {args}")),
    }
    Ok(())
}

fn cmd_search(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    app.search_input = args.to_string();
    app.screen = Screen::Subscriptions;
    app.subscription_index = 0;
    app.subscription_scroll = 0;
    app.refresh_subscriptions(db)?;

    if args.is_empty() {
        app.set_status("Search cleared");
    } else {
        app.set_status(format!("Searching: {args}"));
    }
    Ok(())
}

fn cmd_import(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    if args.is_empty() {
        app.set_status("Usage: :import <file.json|file.csv>");
        return Ok(());
    }

    let path = crate::run::shellexpand(args);
    let outcome = crate::run::import_file(db, std::path::Path::new(&path), &app.user)?;
    refresh_after_write(app, db)?;

    let mut msg = format!(
        "Imported {} new subscriptions ({} duplicates, {} skipped)",
        outcome.inserted,
        outcome.parsed - outcome.inserted,
        outcome.skipped.len()
    );
    if !outcome.suggestions.is_empty() {
        msg.push_str(&format!(
            ". Suggested rules: {}",
            outcome
                .suggestions
                .iter()
                .map(|s| format!(":rule {s} <category>"))
                .collect::<Vec<_>>()
                .join(", ")
        ));
    }
    app.set_status(msg);
    Ok(())
}

fn cmd_export(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    let path = if args.is_empty() {
        crate::run::default_export_path(app.today)
    } else {
        crate::run::shellexpand(args)
    };

    let count = db.export_to_csv(&path, &app.user.user_id)?;
    if count == 0 {
        app.set_status("No subscriptions to export");
    } else {
        app.set_status(format!("Exported {count} subscriptions to {path}"));
    }
    Ok(())
}

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;
