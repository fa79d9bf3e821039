use crate::types::PublishedRuleItem;

/// Two items are the same redirect when they send the same source to the same
/// target with the same status. Store metadata (`id`, timestamps) is ignored.
pub fn redirect_compare(a: &PublishedRuleItem, b: &PublishedRuleItem) -> bool {
    a.redirect.source_url == b.redirect.source_url
        && a.redirect.target_url == b.redirect.target_url
        && a.redirect.status_code == b.redirect.status_code
}

pub fn rule_in_list(item: &PublishedRuleItem, list: &[PublishedRuleItem]) -> bool {
    list.iter().any(|other| redirect_compare(item, other))
}

/// What a publish would change on the store.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RuleDiff {
    /// Candidates that are not published yet, in candidate order.
    pub added: Vec<PublishedRuleItem>,
    /// Published items the candidates no longer contain, in published order.
    pub removed: Vec<PublishedRuleItem>,
}

// Pairwise scan. Both sides are bounded by the spreadsheet size times the
// locale count, so this stays small.
pub fn diff(published: &[PublishedRuleItem], candidate: &[PublishedRuleItem]) -> RuleDiff {
    let removed = published
        .iter()
        .filter(|item| !rule_in_list(item, candidate))
        .cloned()
        .collect();
    let added = candidate
        .iter()
        .filter(|item| !rule_in_list(item, published))
        .cloned()
        .collect();

    RuleDiff { added, removed }
}
