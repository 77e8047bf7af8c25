use anyhow::Result;
use chrono::{Local, NaiveDate};

use crate::config::Config;
use crate::db::Database;
use crate::models::{CategoryRule, Subscription};
use crate::session::UserContext;
use crate::summary::{self, AggregateResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Screen {
    Dashboard,
    Subscriptions,
    Rules,
}

impl Screen {
    pub(crate) fn all() -> &'static [Screen] {
        &[Self::Dashboard, Self::Subscriptions, Self::Rules]
    }
}

impl std::fmt::Display for Screen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dashboard => write!(f, "Dashboard"),
            Self::Subscriptions => write!(f, "Subscriptions"),
            Self::Rules => write!(f, "Rules"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InputMode {
    Normal,
    Command,
    Search,
    Editing,
    Confirm,
}

impl std::fmt::Display for InputMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normal => write!(f, "NORMAL"),
            Self::Command => write!(f, "COMMAND"),
            Self::Search => write!(f, "SEARCH"),
            Self::Editing => write!(f, "EDIT"),
            Self::Confirm => write!(f, "CONFIRM"),
        }
    }
}

/// Pending action that requires user confirmation.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum PendingAction {
    DeleteSubscription { id: String, name: String },
    DeleteRule { id: i64, pattern: String },
}

pub(crate) struct App {
    pub(crate) running: bool,
    pub(crate) screen: Screen,
    pub(crate) input_mode: InputMode,
    pub(crate) command_input: String,
    pub(crate) search_input: String,
    pub(crate) status_message: String,
    pub(crate) show_help: bool,

    pub(crate) user: UserContext,
    pub(crate) today: NaiveDate,
    pub(crate) window_days: u32,
    pub(crate) max_upcoming: usize,

    // Dashboard
    pub(crate) summary: AggregateResult,

    // Subscriptions (filtered by `search_input`)
    pub(crate) subscriptions: Vec<Subscription>,
    pub(crate) subscription_index: usize,
    pub(crate) subscription_scroll: usize,

    // Rules
    pub(crate) rules: Vec<CategoryRule>,
    pub(crate) rule_index: usize,
    pub(crate) rule_scroll: usize,

    // Confirmation
    pub(crate) pending_action: Option<PendingAction>,
    pub(crate) confirm_message: String,

    // Layout (updated each render frame)
    pub(crate) visible_rows: usize,
}

impl App {
    pub(crate) fn new(user: UserContext, config: &Config) -> Self {
        Self {
            running: true,
            screen: Screen::Dashboard,
            input_mode: InputMode::Normal,
            command_input: String::new(),
            search_input: String::new(),
            status_message: String::new(),
            show_help: false,

            user,
            today: Local::now().date_naive(),
            window_days: config.upcoming_window_days,
            max_upcoming: config.max_upcoming,

            summary: AggregateResult::default(),

            subscriptions: Vec::new(),
            subscription_index: 0,
            subscription_scroll: 0,

            rules: Vec::new(),
            rule_index: 0,
            rule_scroll: 0,

            pending_action: None,
            confirm_message: String::new(),

            visible_rows: 20,
        }
    }

    pub(crate) fn refresh_dashboard(&mut self, db: &Database) -> Result<()> {
        let records = db.get_subscriptions(&self.user.user_id)?;
        self.summary = summary::summarize(&records, self.today, self.window_days, self.max_upcoming);
        Ok(())
    }

    pub(crate) fn refresh_subscriptions(&mut self, db: &Database) -> Result<()> {
        let mut subs = db.get_subscriptions(&self.user.user_id)?;
        if !self.search_input.is_empty() {
            let needle = self.search_input.to_lowercase();
            subs.retain(|s| {
                s.name.to_lowercase().contains(&needle)
                    || s.category_label().to_lowercase().contains(&needle)
            });
        }
        self.subscriptions = subs;
        crate::ui::util::clamp_cursor(
            &mut self.subscription_index,
            &mut self.subscription_scroll,
            self.subscriptions.len(),
        );
        Ok(())
    }

    pub(crate) fn refresh_rules(&mut self, db: &Database) -> Result<()> {
        self.rules = db.get_category_rules()?;
        crate::ui::util::clamp_cursor(&mut self.rule_index, &mut self.rule_scroll, self.rules.len());
        Ok(())
    }

    pub(crate) fn refresh_all(&mut self, db: &Database) -> Result<()> {
        self.refresh_dashboard(db)?;
        self.refresh_subscriptions(db)?;
        self.refresh_rules(db)?;
        Ok(())
    }

    /// Rows that fit in a table on the current screen (borders and header excluded).
    pub(crate) fn page(&self) -> usize {
        self.visible_rows.saturating_sub(3).max(1)
    }

    pub(crate) fn selected_subscription(&self) -> Option<&Subscription> {
        self.subscriptions.get(self.subscription_index)
    }

    pub(crate) fn selected_rule(&self) -> Option<&CategoryRule> {
        self.rules.get(self.rule_index)
    }

    pub(crate) fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = msg.into();
    }
}
