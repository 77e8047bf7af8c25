use super::Category;

/// Suggests a category for subscriptions whose name matches `pattern`.
#[derive(Debug, Clone)]
pub struct CategoryRule {
    pub id: Option<i64>,
    pub pattern: String,
    pub category: Category,
    pub is_regex: bool,
    pub priority: i32,
}

impl CategoryRule {
    pub fn new_contains(pattern: String, category: Category) -> Self {
        Self {
            id: None,
            pattern,
            category,
            is_regex: false,
            priority: 0,
        }
    }

    pub fn new_regex(pattern: String, category: Category) -> Self {
        Self {
            id: None,
            pattern,
            category,
            is_regex: true,
            priority: 0,
        }
    }
}
