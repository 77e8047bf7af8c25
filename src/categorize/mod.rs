use regex::RegexBuilder;

use crate::models::{Category, CategoryRule, Subscription};

pub(crate) struct Categorizer {
    rules: Vec<CompiledRule>,
}

struct CompiledRule {
    pattern: String,
    regex: Option<regex::Regex>,
    category: Category,
    is_regex: bool,
}

impl Categorizer {
    /// Compile rules in priority order (highest first). Regex rules that fail to
    /// compile are skipped and their patterns returned alongside the categorizer.
    pub(crate) fn new(rules: &[CategoryRule]) -> (Self, Vec<String>) {
        let mut ordered: Vec<&CategoryRule> = rules.iter().collect();
        ordered.sort_by(|a, b| b.priority.cmp(&a.priority));

        let mut bad_patterns = Vec::new();
        let mut compiled = Vec::with_capacity(ordered.len());
        for r in ordered {
            let regex = if r.is_regex {
                match RegexBuilder::new(&r.pattern).case_insensitive(true).build() {
                    Ok(re) => Some(re),
                    Err(e) => {
                        tracing::warn!(pattern = %r.pattern, error = %e, "skipping invalid regex rule");
                        bad_patterns.push(r.pattern.clone());
                        continue;
                    }
                }
            } else {
                None
            };
            compiled.push(CompiledRule {
                pattern: r.pattern.to_lowercase(),
                regex,
                category: r.category,
                is_regex: r.is_regex,
            });
        }

        (Self { rules: compiled }, bad_patterns)
    }

    /// First matching rule wins.
    pub(crate) fn categorize(&self, name: &str) -> Option<Category> {
        let name_lower = name.to_lowercase();

        self.rules.iter().find_map(|rule| {
            let matched = if rule.is_regex {
                rule.regex.as_ref().is_some_and(|re| re.is_match(name))
            } else {
                name_lower.contains(&rule.pattern)
            };
            matched.then_some(rule.category)
        })
    }

    /// Fill in missing categories. Subscriptions that already have one are left alone.
    /// Returns the number of subscriptions categorized.
    pub(crate) fn categorize_batch(&self, subscriptions: &mut [Subscription]) -> usize {
        let mut count = 0;
        for sub in subscriptions.iter_mut().filter(|s| s.category.is_none()) {
            if let Some(category) = self.categorize(&sub.name) {
                sub.category = Some(category);
                count += 1;
            }
        }
        count
    }
}

/// Suggest a contains-pattern for a subscription name: its first word, lowercased.
pub(crate) fn suggest_rule(name: &str) -> Option<String> {
    let cleaned: String = name
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    cleaned
        .split_whitespace()
        .next()
        .map(|w| w.to_lowercase())
}

#[cfg(test)]
mod tests;
