use std::collections::HashSet;
use std::hash::Hash;

use crate::models::EnrichedItem;

/// Keep the first element for each key, preserving input order.
///
/// Later elements with an already-seen key are dropped even when their other
/// fields differ.
pub fn dedupe_by<T, K, F>(items: impl IntoIterator<Item = T>, mut key: F) -> Vec<T>
where
    K: Eq + Hash,
    F: FnMut(&T) -> K,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(key(item)))
        .collect()
}

/// Collapse records sharing a title to the first occurrence.
pub fn dedupe_by_title(items: Vec<EnrichedItem>) -> Vec<EnrichedItem> {
    dedupe_by(items, |e| e.item.title.clone())
}
