pub(crate) const SCHEMA_V1: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS subscriptions (
    id              TEXT PRIMARY KEY,
    user_id         TEXT NOT NULL,
    name            TEXT NOT NULL,
    price           TEXT NOT NULL,
    currency        TEXT NOT NULL DEFAULT '',
    frequency       TEXT NOT NULL DEFAULT '',
    category        TEXT NOT NULL DEFAULT '',
    payment_method  TEXT NOT NULL DEFAULT '',
    status          TEXT NOT NULL DEFAULT 'active',
    start_date      TEXT,
    renewal_date    TEXT,
    created_at      TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_subscriptions_user ON subscriptions(user_id);
CREATE INDEX IF NOT EXISTS idx_subscriptions_renewal ON subscriptions(renewal_date);

CREATE TABLE IF NOT EXISTS category_rules (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    pattern     TEXT NOT NULL,
    category    TEXT NOT NULL,
    is_regex    BOOLEAN NOT NULL DEFAULT 0,
    priority    INTEGER NOT NULL DEFAULT 0
);
"#;

pub(crate) const CURRENT_VERSION: i32 = 1;

/// Migrations from version N to N+1.
/// Each entry is (from_version, sql).
pub(crate) const MIGRATIONS: &[(i32, &str)] = &[];

/// Rules seeded into an empty `category_rules` table: (pattern, category).
pub(crate) const DEFAULT_RULES: &[(&str, &str)] = &[
    ("netflix", "entertainment"),
    ("spotify", "entertainment"),
    ("disney", "entertainment"),
    ("hulu", "entertainment"),
    ("youtube", "entertainment"),
    ("prime video", "entertainment"),
    ("coursera", "education"),
    ("udemy", "education"),
    ("duolingo", "education"),
    ("masterclass", "education"),
    ("notion", "productivity"),
    ("github", "productivity"),
    ("dropbox", "productivity"),
    ("chatgpt", "productivity"),
    ("microsoft 365", "productivity"),
    ("gym", "health"),
    ("headspace", "health"),
    ("calm", "health"),
    ("peloton", "health"),
];
