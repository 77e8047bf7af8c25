use chrono::{DateTime, NaiveDate};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use std::str::FromStr;

use super::{ImportError, Imported, SkippedRecord};
use crate::models::{Category, Currency, Frequency, Status, Subscription};
use crate::session::UserContext;

/// Subscription as the remote API serves it. Every field is optional here;
/// validation happens when converting to [`Subscription`].
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiSubscription {
    #[serde(rename = "_id", alias = "id")]
    id: Option<String>,
    name: Option<String>,
    price: Option<Value>,
    currency: Option<String>,
    frequency: Option<String>,
    category: Option<String>,
    payment_method: Option<String>,
    status: Option<String>,
    start_date: Option<String>,
    renewal_date: Option<String>,
    created_at: Option<String>,
}

/// Parse a `{"data": [...]}` subscription listing from the API.
///
/// Fails only when the body is not JSON or `data` is not an array. Individual
/// records that cannot be used are reported in [`Imported::skipped`].
pub(crate) fn parse_api_response(body: &str, user: &UserContext) -> Result<Imported, ImportError> {
    let payload: Value = serde_json::from_str(body)?;
    let Some(Value::Array(items)) = payload.get("data") else {
        return Err(ImportError::InvalidInput(
            "expected an object with a \"data\" array".into(),
        ));
    };

    let mut import = Imported::default();
    for (index, item) in items.iter().enumerate() {
        let converted = serde_json::from_value::<ApiSubscription>(item.clone())
            .map_err(|e| e.to_string())
            .and_then(|raw| to_subscription(raw, user));
        match converted {
            Ok(sub) => import.records.push(sub),
            Err(reason) => {
                tracing::warn!(index, %reason, "skipping API record");
                import.skipped.push(SkippedRecord { index, reason });
            }
        }
    }

    tracing::info!(
        imported = import.records.len(),
        skipped = import.skipped.len(),
        "parsed API response"
    );
    Ok(import)
}

fn to_subscription(raw: ApiSubscription, user: &UserContext) -> Result<Subscription, String> {
    let name = raw
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or("missing name")?;
    let price = parse_price(raw.price.as_ref())?;

    let mut sub = Subscription {
        id: raw
            .id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
        user_id: user.user_id.clone(),
        name,
        price,
        currency: raw.currency.as_deref().and_then(Currency::parse),
        frequency: raw.frequency.as_deref().and_then(Frequency::parse),
        category: raw.category.as_deref().and_then(Category::parse),
        payment_method: raw.payment_method.unwrap_or_default(),
        status: raw.status.as_deref().and_then(Status::parse),
        start_date: raw.start_date.as_deref().and_then(parse_api_date),
        renewal_date: raw.renewal_date.as_deref().and_then(parse_api_date),
        created_at: raw
            .created_at
            .unwrap_or_else(|| chrono::Utc::now().to_rfc3339()),
    };

    if sub.renewal_date.is_none() {
        crate::renewal::apply_renewal(&mut sub);
    }
    sub.validate().map_err(|e| e.to_string())?;
    Ok(sub)
}

fn parse_price(value: Option<&Value>) -> Result<Decimal, String> {
    let text = match value {
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(other) => return Err(format!("price is not a number: {other}")),
        None => return Err("missing price".into()),
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|_| format!("price is not a number: {text}"))
}

/// Accepts plain dates and ISO 8601 timestamps such as `2024-05-01T00:00:00.000Z`.
fn parse_api_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    let parsed = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()));
    if parsed.is_none() {
        tracing::warn!(value = s, "ignoring unparseable date");
    }
    parsed
}

#[cfg(test)]
#[path = "json_import_tests.rs"]
mod tests;
