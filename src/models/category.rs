/// Label used for subscriptions without a recognised category.
pub const UNCATEGORIZED: &str = "Uncategorized";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Entertainment,
    Education,
    Productivity,
    Health,
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Entertainment => "entertainment",
            Self::Education => "education",
            Self::Productivity => "productivity",
            Self::Health => "health",
            Self::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "entertainment" => Some(Self::Entertainment),
            "education" => Some(Self::Education),
            "productivity" => Some(Self::Productivity),
            "health" => Some(Self::Health),
            "other" => Some(Self::Other),
            _ => None,
        }
    }

    pub fn all() -> &'static [Category] {
        &[
            Self::Entertainment,
            Self::Education,
            Self::Productivity,
            Self::Health,
            Self::Other,
        ]
    }

    /// Display label for an optional category, falling back to "Uncategorized".
    pub fn label(category: Option<Category>) -> &'static str {
        category.map(|c| c.as_str()).unwrap_or(UNCATEGORIZED)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
