use anyhow::{Context, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;

use super::{Category, Currency, Frequency, Status};

pub const PAYMENT_METHODS: &[&str] = &[
    "Credit Card",
    "Debit Card",
    "PayPal",
    "Bank Transfer",
    "Crypto",
    "Other",
];

/// Field names accepted by [`Subscription::set_field`].
pub const EDITABLE_FIELDS: &[&str] = &[
    "name",
    "price",
    "currency",
    "frequency",
    "category",
    "payment",
    "status",
    "start",
    "renewal",
];

#[derive(Debug, Clone, PartialEq)]
pub struct Subscription {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub price: Decimal,
    pub currency: Option<Currency>,
    pub frequency: Option<Frequency>,
    pub category: Option<Category>,
    pub payment_method: String,
    pub status: Option<Status>,
    pub start_date: Option<NaiveDate>,
    pub renewal_date: Option<NaiveDate>,
    pub created_at: String,
}

impl Subscription {
    /// A fresh, active subscription with a generated id. Start date defaults to `today`.
    pub fn new(user_id: String, name: String, price: Decimal, today: NaiveDate) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id,
            name,
            price,
            currency: Some(Currency::Usd),
            frequency: None,
            category: None,
            payment_method: String::new(),
            status: Some(Status::Active),
            start_date: Some(today),
            renewal_date: None,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == Some(Status::Active)
    }

    pub fn category_label(&self) -> &'static str {
        Category::label(self.category)
    }

    /// Check the record-level invariants: a non-empty name and a non-negative price.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            anyhow::bail!("Subscription name must not be empty");
        }
        if self.price < Decimal::ZERO {
            anyhow::bail!("Price must not be negative: {}", self.price);
        }
        Ok(())
    }

    /// Build a subscription from `<name...> <price> [frequency] [category]`.
    /// The first token that parses as a price ends the name, so names may contain spaces.
    pub fn from_quick_add(user_id: &str, args: &[&str], today: NaiveDate) -> Result<Self> {
        let price_at = args
            .iter()
            .skip(1)
            .position(|a| parse_price(a).is_ok())
            .map(|i| i + 1)
            .context("Expected <name> <price> [frequency] [category]")?;
        let name = args[..price_at].join(" ");
        let price = parse_price(args[price_at])?;

        let mut sub = Self::new(user_id.to_string(), name, price, today);
        let mut rest = args[price_at + 1..].iter();
        if let Some(freq) = rest.next() {
            sub.set_field("frequency", freq)?;
        }
        if let Some(cat) = rest.next() {
            sub.set_field("category", cat)?;
        }
        if let Some(extra) = rest.next() {
            anyhow::bail!("Unexpected argument: {extra}");
        }
        sub.validate()?;
        Ok(sub)
    }

    /// Set one field from user input. Unknown values are rejected rather than
    /// stored as missing; `none` clears the optional ones.
    ///
    /// Returns `true` when the change affects the renewal date calculation.
    pub fn set_field(&mut self, field: &str, value: &str) -> Result<bool> {
        let value = value.trim();
        let clear = value.is_empty() || value.eq_ignore_ascii_case("none");
        match field.trim().to_lowercase().as_str() {
            "name" => {
                if value.is_empty() {
                    anyhow::bail!("Subscription name must not be empty");
                }
                self.name = value.to_string();
            }
            "price" => self.price = parse_price(value)?,
            "currency" => {
                self.currency = Some(
                    Currency::parse(value)
                        .with_context(|| format!("Unknown currency '{value}'. Use {}", names(Currency::all())))?,
                );
            }
            "frequency" | "freq" => {
                self.frequency = if clear {
                    None
                } else {
                    Some(Frequency::parse(value).with_context(|| {
                        format!("Unknown frequency '{value}'. Use {}", names(Frequency::all()))
                    })?)
                };
                return Ok(true);
            }
            "category" | "cat" => {
                self.category = if clear {
                    None
                } else {
                    Some(Category::parse(value).with_context(|| {
                        format!("Unknown category '{value}'. Use {}", names(Category::all()))
                    })?)
                };
            }
            "payment" | "payment_method" => self.payment_method = value.to_string(),
            "status" => {
                self.status = Some(
                    Status::parse(value)
                        .with_context(|| format!("Unknown status '{value}'. Use {}", names(Status::all())))?,
                );
            }
            "start" | "start_date" => {
                self.start_date = if clear { None } else { Some(parse_input_date(value)?) };
                return Ok(true);
            }
            "renewal" | "renewal_date" => {
                self.renewal_date = if clear { None } else { Some(parse_input_date(value)?) };
            }
            other => anyhow::bail!(
                "Unknown field '{other}'. Editable fields: {}",
                EDITABLE_FIELDS.join(", ")
            ),
        }
        Ok(false)
    }
}

/// Parse a user-entered price, allowing a leading `$`. Negative prices are rejected.
pub fn parse_price(s: &str) -> Result<Decimal> {
    let cleaned = s.trim().trim_start_matches('$').replace(',', "");
    let price = Decimal::from_str(&cleaned).with_context(|| format!("Invalid price: {s}"))?;
    if price < Decimal::ZERO {
        anyhow::bail!("Price must not be negative: {s}");
    }
    Ok(price)
}

fn parse_input_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("Invalid date '{s}', expected YYYY-MM-DD"))
}

fn names<T: std::fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
