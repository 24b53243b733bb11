//! Bounded memo caches owned by one loaded mirror state.

use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;

use crate::types::{
    AuthorEntity, AuthorId, CacheCapacities, PublicationId, PublicationRecord, SearchParams,
};

/// Search results are cached per normalized query and parameter set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct SearchKey {
    name: String,
    limit: usize,
    cutoff: u64,
    slack: u64,
}

impl SearchKey {
    pub(crate) fn new(name: &str, params: &SearchParams) -> Self {
        Self {
            name: crate::text::normalize_name(name),
            limit: params.limit,
            cutoff: params.cutoff.to_bits(),
            slack: params.slack.to_bits(),
        }
    }
}

/// A capacity of zero disables the cache.
pub(crate) struct Memo<K: Hash + Eq, V: Clone> {
    inner: Option<Mutex<LruCache<K, V>>>,
}

impl<K: Hash + Eq, V: Clone> Memo<K, V> {
    fn new(capacity: usize) -> Self {
        Self {
            inner: NonZeroUsize::new(capacity).map(|cap| Mutex::new(LruCache::new(cap))),
        }
    }

    pub(crate) fn get(&self, key: &K) -> Option<V> {
        self.inner.as_ref()?.lock().get(key).cloned()
    }

    pub(crate) fn put(&self, key: K, value: V) {
        if let Some(inner) = &self.inner {
            inner.lock().put(key, value);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.inner.as_ref().map_or(0, |inner| inner.lock().len())
    }

    fn clear(&self) {
        if let Some(inner) = &self.inner {
            inner.lock().clear();
        }
    }
}

pub(crate) struct QueryCaches {
    pub(crate) authors: Memo<AuthorId, Arc<AuthorEntity>>,
    pub(crate) publications: Memo<PublicationId, Arc<PublicationRecord>>,
    pub(crate) searches: Memo<SearchKey, Arc<[AuthorId]>>,
}

impl QueryCaches {
    pub(crate) fn new(capacities: CacheCapacities) -> Self {
        Self {
            authors: Memo::new(capacities.authors),
            publications: Memo::new(capacities.publications),
            searches: Memo::new(capacities.searches),
        }
    }

    pub(crate) fn clear(&self) {
        self.authors.clear();
        self.publications.clear();
        self.searches.clear();
    }
}
