mod cli;
mod tui;

use anyhow::{Context, Result};
use std::path::Path;

use crate::categorize::Categorizer;
use crate::db::Database;
use crate::import::{CsvImporter, ImportError, Imported, SkippedRecord};
use crate::session::UserContext;

pub(crate) use cli::as_cli;
pub(crate) use tui::as_tui;

/// What an import did, for reporting back to the user.
#[derive(Debug, Default)]
pub(crate) struct ImportOutcome {
    pub(crate) parsed: usize,
    pub(crate) inserted: usize,
    pub(crate) categorized: usize,
    pub(crate) skipped: Vec<SkippedRecord>,
    pub(crate) bad_patterns: Vec<String>,
    pub(crate) suggestions: Vec<String>,
}

/// Read a JSON API dump or a CSV file into subscriptions owned by `user`.
/// Files ending in `.json` are treated as API responses, everything else as CSV.
pub(crate) fn read_import_file(path: &Path, user: &UserContext) -> Result<Imported, ImportError> {
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    if is_json {
        let body = std::fs::read_to_string(path)?;
        crate::import::parse_api_response(&body, user)
    } else {
        let (headers, rows) = CsvImporter::preview(path)?;
        CsvImporter::parse(&headers, &rows, user)
    }
}

/// Parse `path`, fill in missing categories from the stored rules and insert
/// everything not already present.
pub(crate) fn import_file(db: &mut Database, path: &Path, user: &UserContext) -> Result<ImportOutcome> {
    let imported = read_import_file(path, user)
        .with_context(|| format!("Failed to import {}", path.display()))?;
    let mut records = imported.records;

    let (categorizer, bad_patterns) = Categorizer::new(&db.get_category_rules()?);
    let categorized = categorizer.categorize_batch(&mut records);

    let mut suggestions: Vec<String> = records
        .iter()
        .filter(|s| s.category.is_none())
        .filter_map(|s| crate::categorize::suggest_rule(&s.name))
        .collect();
    suggestions.sort();
    suggestions.dedup();
    suggestions.truncate(3);

    let inserted = db.insert_subscriptions_batch(&records)?;
    tracing::info!(
        path = %path.display(),
        parsed = records.len(),
        inserted,
        skipped = imported.skipped.len(),
        "import finished"
    );

    Ok(ImportOutcome {
        parsed: records.len(),
        inserted,
        categorized,
        skipped: imported.skipped,
        bad_patterns,
        suggestions,
    })
}

/// Recompute renewal dates for every subscription of `user`. Returns how many changed.
pub(crate) fn renew_all(db: &Database, user: &UserContext) -> Result<usize> {
    let mut changed = 0;
    for mut sub in db.get_subscriptions(&user.user_id)? {
        if crate::renewal::apply_renewal(&mut sub) {
            db.update_subscription(&sub)?;
            changed += 1;
        }
    }
    Ok(changed)
}

/// Default export location: `~/subtrack-export-<date>.csv`.
pub(crate) fn default_export_path(today: chrono::NaiveDate) -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
    format!("{home}/subtrack-export-{}.csv", today.format("%Y-%m-%d"))
}

pub(crate) fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
        format!("{home}/{rest}")
    } else {
        path.to_string()
    }
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
