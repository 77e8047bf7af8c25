pub(crate) mod dashboard;
pub(crate) mod rules;
pub(crate) mod subscriptions;
