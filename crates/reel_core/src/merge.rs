use std::collections::HashSet;

/// An item with a stable identity and two descending sort keys.
pub trait Ranked {
    fn key(&self) -> &str;
    fn primary_rank(&self) -> u64;
    fn secondary_rank(&self) -> u64;
}

/// Folds `incoming` into `existing` and re-sorts.
///
/// Existing items come first; an incoming item is appended only when its key
/// has not been seen yet, so the first occurrence of a key always wins (this
/// also drops repeats inside `incoming`). The result is then sorted with
/// [`sort_by_rank`].
pub fn merge_ranked<T: Ranked>(existing: Vec<T>, incoming: Vec<T>) -> Vec<T> {
    let mut seen: HashSet<String> = existing.iter().map(|item| item.key().to_owned()).collect();
    let mut merged = existing;
    merged.reserve(incoming.len());
    for item in incoming {
        if seen.insert(item.key().to_owned()) {
            merged.push(item);
        }
    }
    sort_by_rank(&mut merged);
    merged
}

/// Descending by primary rank, then by secondary rank. Ties keep their order.
pub fn sort_by_rank<T: Ranked>(items: &mut [T]) {
    // `sort_by` is stable.
    items.sort_by(|a, b| {
        b.primary_rank()
            .cmp(&a.primary_rank())
            .then_with(|| b.secondary_rank().cmp(&a.secondary_rank()))
    });
}
