use chrono::{Days, Months, NaiveDate};

use crate::models::{Frequency, Subscription};

/// The date one billing cycle after `start_date`.
///
/// Month and year steps clamp to the last valid day of the target month, so
/// Jan 31 + 1 month is Feb 28 (or 29) and Feb 29 + 1 year is Feb 28.
///
/// Returns `None` when either input is missing, meaning "nothing to update yet".
pub(crate) fn next_renewal(
    start_date: Option<NaiveDate>,
    frequency: Option<Frequency>,
) -> Option<NaiveDate> {
    let start = start_date?;
    match frequency? {
        Frequency::Daily => start.checked_add_days(Days::new(1)),
        Frequency::Weekly => start.checked_add_days(Days::new(7)),
        Frequency::Monthly => start.checked_add_months(Months::new(1)),
        Frequency::Yearly => start.checked_add_months(Months::new(12)),
    }
}

/// Recompute a subscription's renewal date from its start date and frequency.
///
/// The existing renewal date is kept when the calculator has nothing to offer.
/// Returns whether the renewal date changed.
pub(crate) fn apply_renewal(sub: &mut Subscription) -> bool {
    match next_renewal(sub.start_date, sub.frequency) {
        Some(date) if sub.renewal_date != Some(date) => {
            sub.renewal_date = Some(date);
            true
        }
        _ => false,
    }
}
