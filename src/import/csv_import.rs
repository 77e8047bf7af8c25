use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;

use super::{ImportError, Imported, SkippedRecord};
use crate::models::{Category, Currency, Frequency, Status, Subscription};
use crate::session::UserContext;

/// Column positions resolved from a header row.
#[derive(Debug, Clone, Default, PartialEq)]
struct ColumnMap {
    id: Option<usize>,
    name: usize,
    price: usize,
    currency: Option<usize>,
    frequency: Option<usize>,
    category: Option<usize>,
    payment_method: Option<usize>,
    status: Option<usize>,
    start_date: Option<usize>,
    renewal_date: Option<usize>,
}

impl ColumnMap {
    fn from_headers(headers: &[String]) -> Result<Self, ImportError> {
        let normalized: Vec<String> = headers
            .iter()
            .map(|h| {
                h.trim()
                    .to_lowercase()
                    .chars()
                    .filter(|c| c.is_ascii_alphanumeric())
                    .collect()
            })
            .collect();
        let find = |names: &[&str]| normalized.iter().position(|h| names.contains(&h.as_str()));

        let name = find(&["name", "subscription", "service"])
            .ok_or_else(|| ImportError::InvalidInput("CSV has no 'name' column".into()))?;
        let price = find(&["price", "amount", "cost"])
            .ok_or_else(|| ImportError::InvalidInput("CSV has no 'price' column".into()))?;

        Ok(Self {
            id: find(&["id"]),
            name,
            price,
            currency: find(&["currency"]),
            frequency: find(&["frequency", "billing", "cycle"]),
            category: find(&["category"]),
            payment_method: find(&["paymentmethod", "payment"]),
            status: find(&["status"]),
            start_date: find(&["startdate", "start"]),
            renewal_date: find(&["renewaldate", "renewal", "nextrenewal"]),
        })
    }
}

pub(crate) struct CsvImporter;

impl CsvImporter {
    /// Read the CSV and return its header row and all data rows as strings.
    pub(crate) fn preview(path: &Path) -> Result<(Vec<String>, Vec<Vec<String>>), ImportError> {
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .has_headers(true)
            .from_path(path)?;

        let headers: Vec<String> = rdr.headers()?.iter().map(|s| s.to_string()).collect();
        let mut rows: Vec<Vec<String>> = Vec::new();
        for result in rdr.records() {
            let record = result?;
            rows.push(record.iter().map(|s| s.to_string()).collect());
        }

        if headers.iter().all(|h| h.trim().is_empty()) {
            return Err(ImportError::InvalidInput("CSV file is empty".into()));
        }
        Ok((headers, rows))
    }

    /// Turn rows into subscriptions owned by `user`.
    ///
    /// Blank rows are ignored; rows with a missing name or an unusable price are
    /// reported as skipped. Missing renewal dates are computed from start date and
    /// frequency, and an empty status means active.
    pub(crate) fn parse(
        headers: &[String],
        rows: &[Vec<String>],
        user: &UserContext,
    ) -> Result<Imported, ImportError> {
        let columns = ColumnMap::from_headers(headers)?;
        let now = chrono::Utc::now().to_rfc3339();
        let mut import = Imported::default();

        for (index, row) in rows.iter().enumerate() {
            if row.iter().all(|f| f.trim().is_empty()) {
                continue;
            }
            match parse_row(row, &columns, user, &now) {
                Ok(sub) => import.records.push(sub),
                Err(reason) => {
                    tracing::warn!(row = index + 1, %reason, "skipping CSV row");
                    import.skipped.push(SkippedRecord { index, reason });
                }
            }
        }

        Ok(import)
    }
}

fn parse_row(
    row: &[String],
    columns: &ColumnMap,
    user: &UserContext,
    now: &str,
) -> Result<Subscription, String> {
    let field = |col: Option<usize>| {
        col.and_then(|c| row.get(c))
            .map(|s| s.trim())
            .unwrap_or_default()
    };

    let name = field(Some(columns.name));
    if name.is_empty() {
        return Err("missing name".into());
    }
    let price = parse_decimal(field(Some(columns.price)))?;
    let status = match field(columns.status) {
        "" => Some(Status::Active),
        s => Status::parse(s),
    };
    let id = match field(columns.id) {
        "" => uuid::Uuid::new_v4().to_string(),
        s => s.to_string(),
    };

    let mut sub = Subscription {
        id,
        user_id: user.user_id.clone(),
        name: name.to_string(),
        price,
        currency: Currency::parse(field(columns.currency)),
        frequency: Frequency::parse(field(columns.frequency)),
        category: Category::parse(field(columns.category)),
        payment_method: field(columns.payment_method).to_string(),
        status,
        start_date: parse_date(field(columns.start_date))?,
        renewal_date: parse_date(field(columns.renewal_date))?,
        created_at: now.to_string(),
    };

    if sub.renewal_date.is_none() {
        crate::renewal::apply_renewal(&mut sub);
    }
    sub.validate().map_err(|e| e.to_string())?;
    Ok(sub)
}

fn parse_date(s: &str) -> Result<Option<NaiveDate>, String> {
    if s.is_empty() {
        return Ok(None);
    }
    for fmt in &["%Y-%m-%d", "%m/%d/%Y", "%m-%d-%Y", "%m/%d/%y"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(Some(d));
        }
    }
    Err(format!("could not parse date '{s}'"))
}

fn parse_decimal(s: &str) -> Result<Decimal, String> {
    let cleaned = s
        .replace(['$', '€', '£', '₹', ',', '"'], "")
        .replace('(', "-")
        .replace(')', "")
        .trim()
        .trim_start_matches("Br")
        .trim()
        .to_string();
    if cleaned.is_empty() {
        return Err("missing price".into());
    }
    Decimal::from_str(&cleaned).map_err(|_| format!("failed to parse '{s}' as a price"))
}

#[cfg(test)]
#[path = "csv_import_tests.rs"]
mod tests;
