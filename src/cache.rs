use std::collections::HashMap;

use crate::dismiss;
use crate::models::{CacheEntry, PageResult};

/// Session-scoped map from search term to the hits fetched for it so far.
///
/// Every update returns a new cache and leaves `self` untouched, so callers
/// can keep the previous value around and compare. Entries are never evicted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryCache {
    entries: HashMap<String, CacheEntry>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Appends the page's hits to the entry for its key (creating it on first
    /// sight) and records the page number. Duplicate ids are kept.
    pub fn merge(&self, result: PageResult) -> Self {
        let mut entries = self.entries.clone();
        let PageResult { key, hits, page } = result;

        let merged = match entries.remove(&key) {
            Some(existing) => {
                let mut all = existing.hits;
                all.extend(hits);
                CacheEntry { hits: all, page }
            }
            None => CacheEntry { hits, page },
        };
        entries.insert(key, merged);

        Self { entries }
    }

    /// Removes the first hit with `hit_id` from the entry for `key`.
    /// An absent key yields an unchanged copy.
    pub fn with_dismissed(&self, key: &str, hit_id: &str) -> Self {
        let Some(entry) = self.entries.get(key) else {
            return self.clone();
        };

        let mut entries = self.entries.clone();
        entries.insert(
            key.to_string(),
            CacheEntry {
                hits: dismiss::without_first(&entry.hits, hit_id),
                page: entry.page,
            },
        );

        Self { entries }
    }

    /// Page to request when loading more for `key`: one past the last merged
    /// page, or 0 if nothing has been merged yet.
    pub fn next_page(&self, key: &str) -> u32 {
        self.entries.get(key).map_or(0, |entry| entry.page + 1)
    }
}
