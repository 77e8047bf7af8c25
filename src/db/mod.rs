mod schema;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;

use crate::models::*;

const SUBSCRIPTION_COLUMNS: &str = "id, user_id, name, price, currency, frequency, category, \
     payment_method, status, start_date, renewal_date, created_at";

pub(crate) struct Database {
    conn: Connection,
}

impl Database {
    pub(crate) fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .context("Failed to set database pragmas")?;
        let mut db = Self { conn };
        db.migrate().context("Database migration failed")?;
        db.seed_default_rules()?;
        tracing::info!(path = %path.display(), "opened database");
        Ok(db)
    }

    #[cfg(test)]
    pub(crate) fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        let mut db = Self { conn };
        db.migrate()?;
        db.seed_default_rules()?;
        Ok(db)
    }

    fn migrate(&mut self) -> Result<()> {
        let has_version_table: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            [],
            |row| row.get(0),
        )?;

        if !has_version_table {
            self.conn.execute_batch(schema::SCHEMA_V1)?;
            self.conn.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                params![schema::CURRENT_VERSION],
            )?;
            return Ok(());
        }

        let current: i32 = self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .optional()?
            .unwrap_or(0);

        for &(from_version, sql) in schema::MIGRATIONS {
            if current <= from_version {
                self.conn.execute_batch(sql)?;
            }
        }

        if current < schema::CURRENT_VERSION {
            self.conn.execute(
                "UPDATE schema_version SET version = ?1",
                params![schema::CURRENT_VERSION],
            )?;
        }

        Ok(())
    }

    fn seed_default_rules(&mut self) -> Result<()> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM category_rules", [], |row| row.get(0))?;
        if count > 0 {
            return Ok(());
        }

        let tx = self.conn.transaction()?;
        for (pattern, category) in schema::DEFAULT_RULES {
            tx.execute(
                "INSERT INTO category_rules (pattern, category, is_regex, priority) VALUES (?1, ?2, 0, 0)",
                params![pattern, category],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    // ── Subscriptions ─────────────────────────────────────────

    pub(crate) fn insert_subscription(&self, sub: &Subscription) -> Result<()> {
        sub.validate()?;
        self.conn.execute(
            &format!(
                "INSERT INTO subscriptions ({SUBSCRIPTION_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
            ),
            rusqlite::params_from_iter(subscription_params(sub).iter()),
        )?;
        tracing::info!(id = %sub.id, name = %sub.name, "inserted subscription");
        Ok(())
    }

    /// Insert many subscriptions in one transaction, skipping ids already stored.
    /// Returns the number inserted.
    pub(crate) fn insert_subscriptions_batch(&mut self, subs: &[Subscription]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        let mut count = 0;
        for sub in subs {
            sub.validate()
                .with_context(|| format!("Invalid subscription '{}'", sub.name))?;
            let exists: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM subscriptions WHERE id = ?1)",
                params![sub.id],
                |row| row.get(0),
            )?;
            if exists {
                tracing::debug!(id = %sub.id, "skipping duplicate subscription");
                continue;
            }
            tx.execute(
                &format!(
                    "INSERT INTO subscriptions ({SUBSCRIPTION_COLUMNS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
                ),
                rusqlite::params_from_iter(subscription_params(sub).iter()),
            )?;
            count += 1;
        }
        tx.commit()?;
        tracing::info!(inserted = count, skipped = subs.len() - count, "batch insert");
        Ok(count)
    }

    /// Overwrite every editable field of an existing subscription.
    /// Returns false when no subscription has that id.
    pub(crate) fn update_subscription(&self, sub: &Subscription) -> Result<bool> {
        sub.validate()?;
        let changed = self.conn.execute(
            "UPDATE subscriptions SET name = ?2, price = ?3, currency = ?4, frequency = ?5,
                 category = ?6, payment_method = ?7, status = ?8, start_date = ?9, renewal_date = ?10
             WHERE id = ?1",
            params![
                sub.id,
                sub.name,
                sub.price.to_string(),
                sub.currency.map(|c| c.as_str()).unwrap_or_default(),
                sub.frequency.map(|f| f.as_str()).unwrap_or_default(),
                sub.category.map(|c| c.as_str()).unwrap_or_default(),
                sub.payment_method,
                sub.status.map(|s| s.as_str()).unwrap_or_default(),
                sub.start_date.map(format_date),
                sub.renewal_date.map(format_date),
            ],
        )?;
        if changed > 0 {
            tracing::info!(id = %sub.id, "updated subscription");
        }
        Ok(changed > 0)
    }

    pub(crate) fn set_subscription_status(&self, id: &str, status: Status) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE subscriptions SET status = ?1 WHERE id = ?2",
            params![status.as_str(), id],
        )?;
        Ok(changed > 0)
    }

    pub(crate) fn delete_subscription(&self, id: &str) -> Result<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM subscriptions WHERE id = ?1", params![id])?;
        if changed > 0 {
            tracing::info!(id, "deleted subscription");
        }
        Ok(changed > 0)
    }

    pub(crate) fn get_subscription_by_id(&self, id: &str) -> Result<Option<Subscription>> {
        Ok(self
            .conn
            .query_row(
                &format!("SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE id = ?1"),
                params![id],
                subscription_from_row,
            )
            .optional()?)
    }

    /// All of a user's subscriptions, soonest renewal first, undated last.
    pub(crate) fn get_subscriptions(&self, user_id: &str) -> Result<Vec<Subscription>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE user_id = ?1
             ORDER BY renewal_date IS NULL, renewal_date, name"
        ))?;
        let rows = stmt.query_map(params![user_id], subscription_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    /// Resolve a user-supplied reference: an exact id, a unique id prefix, or a
    /// case-insensitive name.
    pub(crate) fn find_subscription(&self, user_id: &str, reference: &str) -> Result<Option<Subscription>> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Ok(None);
        }
        if let Some(sub) = self.get_subscription_by_id(reference)? {
            if sub.user_id == user_id {
                return Ok(Some(sub));
            }
        }
        let subs = self.get_subscriptions(user_id)?;
        let by_prefix: Vec<&Subscription> =
            subs.iter().filter(|s| s.id.starts_with(reference)).collect();
        if by_prefix.len() == 1 {
            return Ok(Some(by_prefix[0].clone()));
        }
        let lower = reference.to_lowercase();
        let by_name: Vec<&Subscription> = subs
            .iter()
            .filter(|s| s.name.to_lowercase() == lower)
            .collect();
        match by_name.len() {
            0 => Ok(None),
            1 => Ok(Some(by_name[0].clone())),
            n => anyhow::bail!("'{reference}' matches {n} subscriptions; use the id instead"),
        }
    }

    pub(crate) fn get_subscription_count(&self, user_id: &str) -> Result<i64> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM subscriptions WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?)
    }

    // ── Category rules ────────────────────────────────────────

    pub(crate) fn get_category_rules(&self) -> Result<Vec<CategoryRule>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, pattern, category, is_regex, priority FROM category_rules
             ORDER BY priority DESC, id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, bool>(3)?,
                row.get::<_, i32>(4)?,
            ))
        })?;

        let mut rules = Vec::new();
        for row in rows {
            let (id, pattern, category, is_regex, priority) = row?;
            // Rules naming a category that no longer exists are ignored
            let Some(category) = Category::parse(&category) else {
                tracing::warn!(id, category = %category, "ignoring rule with unknown category");
                continue;
            };
            rules.push(CategoryRule {
                id: Some(id),
                pattern,
                category,
                is_regex,
                priority,
            });
        }
        Ok(rules)
    }

    pub(crate) fn insert_category_rule(&self, rule: &CategoryRule) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO category_rules (pattern, category, is_regex, priority) VALUES (?1, ?2, ?3, ?4)",
            params![rule.pattern, rule.category.as_str(), rule.is_regex, rule.priority],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub(crate) fn delete_category_rule(&self, id: i64) -> Result<()> {
        self.conn
            .execute("DELETE FROM category_rules WHERE id = ?1", params![id])?;
        Ok(())
    }

    // ── Export ────────────────────────────────────────────────

    /// Write a user's subscriptions to CSV in the same layout the CSV importer reads.
    pub(crate) fn export_to_csv(&self, path: &str, user_id: &str) -> Result<usize> {
        let subs = self.get_subscriptions(user_id)?;
        if subs.is_empty() {
            return Ok(0);
        }

        let mut wtr = csv::Writer::from_path(path)
            .with_context(|| format!("Failed to create export file: {path}"))?;
        wtr.write_record(crate::import::CSV_COLUMNS)?;
        for sub in &subs {
            wtr.write_record([
                sub.id.as_str(),
                sub.name.as_str(),
                sub.price.to_string().as_str(),
                sub.currency.map(|c| c.as_str()).unwrap_or_default(),
                sub.frequency.map(|f| f.as_str()).unwrap_or_default(),
                sub.category.map(|c| c.as_str()).unwrap_or_default(),
                sub.payment_method.as_str(),
                sub.status.map(|s| s.as_str()).unwrap_or_default(),
                sub.start_date.map(format_date).unwrap_or_default().as_str(),
                sub.renewal_date.map(format_date).unwrap_or_default().as_str(),
            ])?;
        }
        wtr.flush()?;
        Ok(subs.len())
    }
}

fn format_date(d: NaiveDate) -> String {
    d.format("%Y-%m-%d").to_string()
}

fn subscription_params(sub: &Subscription) -> Vec<Box<dyn rusqlite::types::ToSql>> {
    vec![
        Box::new(sub.id.clone()),
        Box::new(sub.user_id.clone()),
        Box::new(sub.name.clone()),
        Box::new(sub.price.to_string()),
        Box::new(sub.currency.map(|c| c.as_str()).unwrap_or_default()),
        Box::new(sub.frequency.map(|f| f.as_str()).unwrap_or_default()),
        Box::new(sub.category.map(|c| c.as_str()).unwrap_or_default()),
        Box::new(sub.payment_method.clone()),
        Box::new(sub.status.map(|s| s.as_str()).unwrap_or_default()),
        Box::new(sub.start_date.map(format_date)),
        Box::new(sub.renewal_date.map(format_date)),
        Box::new(sub.created_at.clone()),
    ]
}

fn subscription_from_row(row: &Row<'_>) -> rusqlite::Result<Subscription> {
    let price_str: String = row.get(3)?;
    let parse_date = |s: Option<String>| {
        s.and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok())
    };
    Ok(Subscription {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        price: Decimal::from_str(&price_str).unwrap_or_default(),
        currency: Currency::parse(&row.get::<_, String>(4)?),
        frequency: Frequency::parse(&row.get::<_, String>(5)?),
        category: Category::parse(&row.get::<_, String>(6)?),
        payment_method: row.get(7)?,
        status: Status::parse(&row.get::<_, String>(8)?),
        start_date: parse_date(row.get(9)?),
        renewal_date: parse_date(row.get(10)?),
        created_at: row.get(11)?,
    })
}

#[cfg(test)]
mod tests;
