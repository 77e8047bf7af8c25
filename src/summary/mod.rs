use chrono::{Days, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::{Frequency, Subscription, WEEKS_PER_MONTH};

pub(crate) const DEFAULT_WINDOW_DAYS: u32 = 30;
pub(crate) const DEFAULT_MAX_UPCOMING: usize = 5;

/// Dashboard statistics over one user's subscriptions. Recomputed on every load.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct AggregateResult {
    pub(crate) total_count: usize,
    pub(crate) active_count: usize,
    /// Sum of monthly-normalized prices over active subscriptions. Currencies are
    /// not converted: prices are summed as raw numbers.
    pub(crate) normalized_monthly_cost: Decimal,
    /// Category label to monthly spend, in order of first appearance.
    pub(crate) category_breakdown: Vec<(String, Decimal)>,
    /// Active subscriptions renewing within the window, soonest first.
    pub(crate) upcoming_renewals: Vec<Subscription>,
}

impl AggregateResult {
    /// Active subscriptions as a whole percentage of all subscriptions, 0 when there are none.
    pub(crate) fn active_share_percent(&self) -> u32 {
        if self.total_count == 0 {
            return 0;
        }
        percent(
            Decimal::from(self.active_count as u64),
            Decimal::from(self.total_count as u64),
        )
    }

    /// The normalized monthly cost over twelve months.
    pub(crate) fn yearly_cost(&self) -> Decimal {
        self.normalized_monthly_cost.saturating_mul(Decimal::from(12))
    }

    /// Share of the normalized monthly cost taken by `amount`, capped at 100.
    pub(crate) fn category_share_percent(&self, amount: Decimal) -> u32 {
        if self.normalized_monthly_cost <= Decimal::ZERO {
            return 0;
        }
        percent(amount, self.normalized_monthly_cost).min(100)
    }
}

fn percent(part: Decimal, whole: Decimal) -> u32 {
    // Divide first: `part * 100` overflows for prices near `Decimal::MAX`
    part.checked_div(whole)
        .unwrap_or(Decimal::ZERO)
        .saturating_mul(Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u32()
        .unwrap_or(0)
}

/// Monthly equivalent of a subscription's price.
///
/// Daily and unrecognised frequencies pass the price through unchanged.
/// Saturates at `Decimal::MAX` instead of overflowing.
pub(crate) fn monthly_cost(sub: &Subscription) -> Decimal {
    match sub.frequency {
        Some(Frequency::Yearly) => sub.price / Decimal::from(12),
        Some(Frequency::Weekly) => sub.price.saturating_mul(WEEKS_PER_MONTH),
        Some(Frequency::Monthly) | Some(Frequency::Daily) | None => sub.price,
    }
}

pub(crate) fn summarize(
    records: &[Subscription],
    today: NaiveDate,
    window_days: u32,
    max_upcoming: usize,
) -> AggregateResult {
    let mut result = AggregateResult {
        total_count: records.len(),
        ..AggregateResult::default()
    };

    for sub in records.iter().filter(|s| s.is_active()) {
        result.active_count += 1;
        let monthly = monthly_cost(sub);
        result.normalized_monthly_cost = result.normalized_monthly_cost.saturating_add(monthly);

        let label = sub.category_label();
        match result
            .category_breakdown
            .iter_mut()
            .find(|(name, _)| name == label)
        {
            Some((_, total)) => *total = total.saturating_add(monthly),
            None => result.category_breakdown.push((label.to_string(), monthly)),
        }
    }

    result.upcoming_renewals = upcoming_renewals(records, today, window_days, max_upcoming);

    tracing::debug!(
        total = result.total_count,
        active = result.active_count,
        monthly = %result.normalized_monthly_cost,
        upcoming = result.upcoming_renewals.len(),
        "summarized subscriptions"
    );

    result
}

/// Active subscriptions with `today <= renewal_date <= today + window_days`, soonest first.
pub(crate) fn upcoming_renewals(
    records: &[Subscription],
    today: NaiveDate,
    window_days: u32,
    max_upcoming: usize,
) -> Vec<Subscription> {
    let window_end = today
        .checked_add_days(Days::new(u64::from(window_days)))
        .unwrap_or(NaiveDate::MAX);

    let mut upcoming: Vec<&Subscription> = records
        .iter()
        .filter(|s| s.is_active())
        .filter(|s| {
            s.renewal_date
                .is_some_and(|d| d >= today && d <= window_end)
        })
        .collect();

    // Stable: ties keep input order
    upcoming.sort_by_key(|s| s.renewal_date);
    upcoming.into_iter().take(max_upcoming).cloned().collect()
}

#[cfg(test)]
mod tests;
