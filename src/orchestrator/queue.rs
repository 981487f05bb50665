//! Action ordering: round-robin merge and neighborhood sort

use ahash::AHashMap;
use std::collections::BTreeMap;

/// Merge per-party lists in blocks of `chunk`, cycling parties in `order`
///
/// Parties present in `map` but missing from `order` follow in key order.
/// Exhausted lists simply stop contributing.
pub fn merge_lists<T: Clone>(
    map: &BTreeMap<String, Vec<T>>,
    order: &[String],
    chunk: usize,
) -> Vec<T> {
    let chunk = chunk.max(1);
    let mut keys: Vec<&str> = order.iter().map(String::as_str).collect();
    for key in map.keys() {
        if !keys.contains(&key.as_str()) {
            keys.push(key);
        }
    }

    let lists: Vec<&[T]> = keys
        .iter()
        .filter_map(|key| map.get(*key).map(Vec::as_slice))
        .collect();
    let longest = lists.iter().map(|list| list.len()).max().unwrap_or(0);

    let mut merged = Vec::with_capacity(lists.iter().map(|list| list.len()).sum());
    let mut start = 0;
    while start < longest {
        for list in &lists {
            if start < list.len() {
                let end = (start + chunk).min(list.len());
                merged.extend_from_slice(&list[start..end]);
            }
        }
        start += chunk;
    }
    merged
}

/// Order `list` the way `reference` ordered the same entities
///
/// Entities seen in `reference` sort by their last position there;
/// newcomers go to the front. The sort is stable.
pub fn neighborhood_sort<T, R, K>(list: Vec<T>, reference: &[R], key: K) -> Vec<T>
where
    K: Fn(&T) -> &str,
    R: AsRef<str>,
{
    let mut last_seen: AHashMap<&str, usize> = AHashMap::new();
    for (index, entity) in reference.iter().enumerate() {
        last_seen.insert(entity.as_ref(), index);
    }

    let mut list = list;
    // unseen entities rank ahead of every seen position
    list.sort_by_key(|item| match last_seen.get(key(item)) {
        None => (0, 0),
        Some(&index) => (1, index),
    });
    list
}

#[cfg(test)]
mod tests {
    use super::*;

    fn party_map(entries: &[(&str, &[&str])]) -> BTreeMap<String, Vec<String>> {
        entries
            .iter()
            .map(|(party, items)| {
                (party.to_string(), items.iter().map(|s| s.to_string()).collect())
            })
            .collect()
    }

    #[test]
    fn test_merge_in_blocks() {
        let map = party_map(&[("A", &["a0", "a1", "a2", "a3"]), ("B", &["b0", "b1"])]);
        let order = vec!["A".to_string(), "B".to_string()];
        assert_eq!(
            merge_lists(&map, &order, 3),
            vec!["a0", "a1", "a2", "b0", "b1", "a3"]
        );
    }

    #[test]
    fn test_merge_respects_configured_order() {
        let map = party_map(&[("A", &["a0"]), ("B", &["b0"])]);
        let order = vec!["B".to_string(), "A".to_string()];
        assert_eq!(merge_lists(&map, &order, 1), vec!["b0", "a0"]);
    }

    #[test]
    fn test_merge_keeps_unlisted_parties() {
        let map = party_map(&[("A", &["a0"]), ("Z", &["z0"])]);
        let order = vec!["A".to_string()];
        assert_eq!(merge_lists(&map, &order, 2), vec!["a0", "z0"]);
    }

    #[test]
    fn test_neighborhood_sort_follows_last_round() {
        let list = vec!["x", "c", "a", "b", "a"];
        let reference = ["a", "b", "c"];
        let sorted = neighborhood_sort(list, &reference, |item| *item);
        assert_eq!(sorted, vec!["x", "a", "a", "b", "c"]);
    }
}
