//! The `Mirror` store: one loaded bundle of tables, its name index and the
//! memo caches that sit in front of them.
//!
//! State is held behind a lock as an `Arc<Loaded>`. Builds and loads construct
//! a complete new state and swap it in, so a reader either sees the previous
//! tables with their caches or the new tables with empty ones.

mod cache;
pub mod lifecycle;
pub mod query;
pub mod retrieve;

pub use retrieve::{DbInfo, UpdateNotice};

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::error::{MirrorError, Result};
use crate::ingest::MirrorTables;
use crate::search::NameIndex;
use crate::types::MirrorOptions;
use cache::QueryCaches;

/// Tables, optional name index and caches of one build or load.
pub(crate) struct Loaded {
    pub(crate) tables: MirrorTables,
    pub(crate) search: Option<NameIndex>,
    pub(crate) caches: QueryCaches,
}

/// Handle on a local mirror.
///
/// Queries load the persisted artifact on first use, retrieving a prebuilt one
/// or building from the dump when none is available.
pub struct Mirror {
    pub(crate) options: MirrorOptions,
    state: RwLock<Option<Arc<Loaded>>>,
    /// Serializes first-use initialization so concurrent callers load once.
    init: Mutex<()>,
}

impl Mirror {
    pub fn new(options: MirrorOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            options,
            state: RwLock::new(None),
            init: Mutex::new(()),
        })
    }

    #[must_use]
    pub fn options(&self) -> &MirrorOptions {
        &self.options
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.state.read().is_some()
    }

    /// Whether the loaded state carries a name index.
    #[must_use]
    pub fn has_search(&self) -> bool {
        self.current().is_some_and(|state| state.search.is_some())
    }

    /// Drop every memoized lookup of the current state.
    pub fn invalidate(&self) {
        if let Some(state) = self.current() {
            tracing::debug!(
                authors = state.caches.authors.len(),
                publications = state.caches.publications.len(),
                searches = state.caches.searches.len(),
                "clearing mirror caches"
            );
            state.caches.clear();
        }
    }

    /// Forget the loaded state; the next query loads again.
    pub fn unload(&self) {
        self.state.write().take();
    }

    pub(crate) fn current(&self) -> Option<Arc<Loaded>> {
        self.state.read().clone()
    }

    pub(crate) fn install(&self, tables: MirrorTables, search: Option<NameIndex>) -> Arc<Loaded> {
        let loaded = Arc::new(Loaded {
            tables,
            search,
            caches: QueryCaches::new(self.options.cache),
        });
        *self.state.write() = Some(Arc::clone(&loaded));
        loaded
    }

    /// Current state, initializing it on first use.
    ///
    /// A missing artifact is first fetched from the release channel. Failing
    /// that only logs a warning; the store then builds from the dump.
    pub(crate) fn ensure_loaded(&self) -> Result<Arc<Loaded>> {
        if let Some(state) = self.current() {
            return Ok(state);
        }
        let _guard = self.init.lock();
        if let Some(state) = self.current() {
            return Ok(state);
        }
        if self.options.io.auto_retrieve && !self.options.io.destination.exists() {
            if let Err(err) = self.retrieve(None, false, &mut |_, _| {}) {
                tracing::warn!(
                    error = %err,
                    "automatic retrieval failed; falling back to a local build"
                );
            }
            if let Some(state) = self.current() {
                return Ok(state);
            }
        }
        self.load_or_build()?;
        self.current().ok_or_else(|| MirrorError::ArtifactMissing {
            path: self.options.io.destination.clone(),
        })
    }
}

impl std::fmt::Debug for Mirror {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mirror")
            .field("destination", &self.options.io.destination)
            .field("loaded", &self.is_loaded())
            .finish_non_exhaustive()
    }
}
