use crate::expander::UrlExpander;
use crate::types::{PublishedRuleItem, Rule};

/// Builds the full payload for the rules list API from validated rules.
#[derive(Clone, Debug)]
pub struct BulkListBuilder {
    expander: UrlExpander,
}

impl BulkListBuilder {
    pub fn new(expander: UrlExpander) -> Self {
        Self { expander }
    }

    pub fn expander(&self) -> &UrlExpander {
        &self.expander
    }

    /// Expands every rule in order. The API takes a list of
    /// `{ "redirect": { ... } }` objects rather than bare redirects.
    pub fn make_bulk_list(&self, rules: &[Rule]) -> Vec<PublishedRuleItem> {
        rules
            .iter()
            .flat_map(|rule| self.expander.expand_rule(rule))
            .map(PublishedRuleItem::from)
            .collect()
    }
}
