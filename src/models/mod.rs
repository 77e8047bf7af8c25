mod category;
mod category_rule;
mod currency;
mod frequency;
mod status;
mod subscription;

pub use category::{Category, UNCATEGORIZED};
pub use category_rule::CategoryRule;
pub use currency::Currency;
pub use frequency::{Frequency, WEEKS_PER_MONTH};
pub use status::Status;
pub use subscription::{parse_price, Subscription, EDITABLE_FIELDS, PAYMENT_METHODS};
