//! Session state and the transitions between states.
//!
//! Each transition takes `&self` and returns a fresh [`SessionState`]; when a
//! transition wants the network it hands back a [`FetchRequest`] for the
//! controller to run. Nothing here performs I/O.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::cache::QueryCache;
use crate::error::FetchError;
use crate::models::{Hit, PageResult, QueryKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchOrigin {
    /// First page for a term nobody has fetched yet.
    Initial,
    /// "More" for a term that already has an entry.
    More,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub key: QueryKey,
    pub page: u32,
    pub origin: FetchOrigin,
}

/// A failed fetch, remembered together with the term it was for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyedError {
    pub key: QueryKey,
    pub error: FetchError,
}

/// What the view renders for the active term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Projection<'a> {
    pub hits: &'a [Hit],
    pub page: u32,
}

/// True iff nothing has been merged for `key` yet. An entry with no hits
/// still counts as fetched.
pub fn needs_fetch(cache: &QueryCache, key: &str) -> bool {
    cache.get(key).is_none()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    active_key: QueryKey,
    pending_term: String,
    cache: QueryCache,
    last_error: Option<KeyedError>,
    initial_in_flight: HashSet<QueryKey>,
    more_in_flight: Option<QueryKey>,
}

impl SessionState {
    pub fn new(default_term: &str) -> Self {
        Self {
            active_key: default_term.to_string(),
            pending_term: default_term.to_string(),
            cache: QueryCache::new(),
            last_error: None,
            initial_in_flight: HashSet::new(),
            more_in_flight: None,
        }
    }

    pub fn active_key(&self) -> &str {
        &self.active_key
    }

    pub fn pending_term(&self) -> &str {
        &self.pending_term
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn last_error(&self) -> Option<&KeyedError> {
        self.last_error.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        !self.initial_in_flight.is_empty() || self.more_in_flight.is_some()
    }

    /// Requests handed out by a transition and not yet settled.
    pub fn pending_fetches(&self) -> usize {
        self.initial_in_flight.len() + usize::from(self.more_in_flight.is_some())
    }

    pub fn is_loading_more(&self) -> bool {
        self.more_in_flight.is_some()
    }

    pub fn with_pending_term(&self, text: &str) -> Self {
        Self {
            pending_term: text.to_string(),
            ..self.clone()
        }
    }

    /// Requests page 0 for `key` unless it is cached or already on its way.
    pub fn load_initial(&self, key: &str) -> (Self, Option<FetchRequest>) {
        if !needs_fetch(&self.cache, key) {
            return (self.clone(), None);
        }
        if self.initial_in_flight.contains(key) {
            debug!(key, "Initial fetch already in flight");
            return (self.clone(), None);
        }

        let mut next = self.clone();
        next.initial_in_flight.insert(key.to_string());
        let request = FetchRequest {
            key: key.to_string(),
            page: 0,
            origin: FetchOrigin::Initial,
        };
        (next, Some(request))
    }

    /// Makes `term` the active key. Terms seen before are served from the
    /// cache as they are, however old.
    pub fn submit(&self, term: &str) -> (Self, Option<FetchRequest>) {
        let switched = Self {
            active_key: term.to_string(),
            ..self.clone()
        };
        switched.load_initial(term)
    }

    /// Requests the page after the last merged one for the active key.
    pub fn load_more(&self) -> (Self, Option<FetchRequest>) {
        let key = self.active_key.as_str();
        if self.cache.get(key).is_none() {
            warn!(key, "Load more requested for a term with no cached results");
            return (self.clone(), None);
        }
        if let Some(busy) = &self.more_in_flight {
            debug!(key, in_flight = %busy, "Load more already in flight");
            return (self.clone(), None);
        }

        let request = FetchRequest {
            key: key.to_string(),
            page: self.cache.next_page(key),
            origin: FetchOrigin::More,
        };
        let next = Self {
            more_in_flight: Some(key.to_string()),
            ..self.clone()
        };
        (next, Some(request))
    }

    /// Drops the first hit with `hit_id` from the active key's results.
    pub fn dismiss(&self, hit_id: &str) -> Self {
        let key = self.active_key.as_str();
        if self.cache.get(key).is_none() {
            warn!(key, hit_id, "Dismiss requested for a term with no cached results");
            return self.clone();
        }

        Self {
            cache: self.cache.with_dismissed(key, hit_id),
            ..self.clone()
        }
    }

    /// Applies the outcome of `request`. Failures leave the cache alone.
    pub fn settle(&self, request: &FetchRequest, outcome: Result<PageResult, FetchError>) -> Self {
        let mut next = self.clone();
        match request.origin {
            FetchOrigin::Initial => {
                next.initial_in_flight.remove(&request.key);
            }
            FetchOrigin::More => next.more_in_flight = None,
        }

        match outcome {
            Ok(result) => {
                if next
                    .last_error
                    .as_ref()
                    .is_some_and(|failed| failed.key == result.key)
                {
                    next.last_error = None;
                }
                debug!(key = %result.key, page = result.page, hits = result.hits.len(), "Merging page");
                next.cache = next.cache.merge(result);
            }
            Err(error) => {
                warn!(key = %request.key, page = request.page, %error, "Search fetch failed");
                next.last_error = Some(KeyedError {
                    key: request.key.clone(),
                    error,
                });
            }
        }
        next
    }

    pub fn project(&self) -> Projection<'_> {
        match self.cache.get(&self.active_key) {
            Some(entry) => Projection {
                hits: &entry.hits,
                page: entry.page,
            },
            None => Projection { hits: &[], page: 0 },
        }
    }

    /// The last failure, but only while the term it failed for is active.
    pub fn visible_error(&self) -> Option<&FetchError> {
        self.last_error
            .as_ref()
            .filter(|failed| failed.key == self.active_key)
            .map(|failed| &failed.error)
    }
}
