//! Ordered rule table.

use super::Matcher;
use crate::transform::Chain;

/// A matcher bound to a transform chain.
#[derive(Debug, Clone)]
pub struct Rule {
    pub matcher: Matcher,
    pub exclude: Option<Matcher>,
    pub chain: Chain,
    /// On transform failure, copy the source through and warn.
    pub best_effort: bool,
}

impl Rule {
    pub fn new(matcher: Matcher, chain: Chain) -> Self {
        Self {
            matcher,
            exclude: None,
            chain,
            best_effort: false,
        }
    }

    pub fn exclude(mut self, matcher: Matcher) -> Self {
        self.exclude = Some(matcher);
        self
    }

    pub fn best_effort(mut self, best_effort: bool) -> Self {
        self.best_effort = best_effort;
        self
    }

    pub fn matches(&self, id: &str) -> bool {
        self.matcher.matches(id) && !self.exclude.as_ref().is_some_and(|ex| ex.matches(id))
    }
}

/// Rules in declaration order. Read-only once the pipeline is built.
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    rules: Vec<Rule>,
}

impl RuleTable {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// First rule matching `id`, with its index.
    pub fn find(&self, id: &str) -> Option<(usize, &Rule)> {
        self.rules.iter().enumerate().find(|(_, rule)| rule.matches(id))
    }

    /// Indices of every rule matching `id`, in order.
    pub fn find_all(&self, id: &str) -> Vec<usize> {
        self.rules
            .iter()
            .enumerate()
            .filter(|(_, rule)| rule.matches(id))
            .map(|(i, _)| i)
            .collect()
    }

    /// Whether an identity rule names `id` (lets a missing seed resolve virtually).
    pub fn has_identity(&self, id: &str) -> bool {
        self.rules
            .iter()
            .any(|rule| rule.matcher.is_identity() && rule.matches(id))
    }

    pub fn get(&self, index: usize) -> Option<&Rule> {
        self.rules.get(index)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(matcher: Matcher) -> Rule {
        Rule::new(matcher, Chain::empty())
    }

    #[test]
    fn test_first_match_wins() {
        let table = RuleTable::new(vec![
            rule(Matcher::regex(r"\.js$").unwrap()),
            rule(Matcher::prefix("src")),
        ]);
        assert_eq!(table.find("src/site.js").map(|(i, _)| i), Some(0));
        assert_eq!(table.find_all("src/site.js"), vec![0, 1]);
        assert_eq!(table.find("src/site.css").map(|(i, _)| i), Some(1));
        assert!(table.find("lib/x.css").is_none());
    }

    #[test]
    fn test_exclusion_falls_through() {
        let table = RuleTable::new(vec![
            rule(Matcher::regex(r"\.js$").unwrap())
                .exclude(Matcher::regex("node_modules").unwrap()),
            rule(Matcher::identity("node_modules/jquery/dist/jquery.js")),
        ]);
        assert_eq!(
            table
                .find("node_modules/jquery/dist/jquery.js")
                .map(|(i, _)| i),
            Some(1)
        );
        assert_eq!(table.find("node_modules/other.js").map(|(i, _)| i), None);
    }

    #[test]
    fn test_identity_follows_declaration_order() {
        let table = RuleTable::new(vec![
            rule(Matcher::prefix("src")),
            rule(Matcher::identity("src/data")),
        ]);
        assert_eq!(table.find("src/data").map(|(i, _)| i), Some(0));
        assert!(table.has_identity("src/data"));
        assert!(!table.has_identity("src/other"));
    }
}
