//! Read-side API: key and index lookups, hydrated publication lists, name search.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use crate::dedup::{AuthorSpec, SourcedAuthor};
use crate::error::{MirrorError, Result};
use crate::io::frames::FrameCursor;
use crate::types::{
    AuthorEntity, AuthorId, Publication, PublicationId, PublicationRecord, SearchParams,
    SourceAuthor, SourcePublication,
};

use super::cache::SearchKey;
use super::{Loaded, Mirror};

impl Loaded {
    fn author(
        &self,
        id: AuthorId,
        cursor: &mut FrameCursor<'_, AuthorEntity>,
    ) -> Result<Arc<AuthorEntity>> {
        if let Some(author) = self.caches.authors.get(&id) {
            return Ok(author);
        }
        let author = Arc::new(cursor.get(id as usize)?.clone());
        self.caches.authors.put(id, Arc::clone(&author));
        Ok(author)
    }

    fn publication(
        &self,
        id: PublicationId,
        cursor: &mut FrameCursor<'_, PublicationRecord>,
    ) -> Result<Arc<PublicationRecord>> {
        if let Some(publication) = self.caches.publications.get(&id) {
            return Ok(publication);
        }
        let publication = Arc::new(cursor.get(id as usize)?.clone());
        self.caches.publications.put(id, Arc::clone(&publication));
        Ok(publication)
    }

    fn author_id(&self, key: &str) -> Result<AuthorId> {
        self.tables
            .keys
            .get(key)
            .copied()
            .ok_or_else(|| MirrorError::AuthorNotFound { key: key.to_string() })
    }

    /// Authors for `ids`, in order, reading each frame at most once per run of ids.
    fn authors(&self, ids: &[AuthorId]) -> Result<Vec<Arc<AuthorEntity>>> {
        let mut cursor = self.tables.authors.cursor();
        ids.iter().map(|&id| self.author(id, &mut cursor)).collect()
    }
}

impl Mirror {
    pub fn author_count(&self) -> Result<usize> {
        Ok(self.ensure_loaded()?.tables.authors.len())
    }

    pub fn publication_count(&self) -> Result<usize> {
        Ok(self.ensure_loaded()?.tables.publications.len())
    }

    pub fn author_by_index(&self, index: AuthorId) -> Result<Arc<AuthorEntity>> {
        let state = self.ensure_loaded()?;
        state.author(index, &mut state.tables.authors.cursor())
    }

    pub fn author_by_key(&self, key: &str) -> Result<Arc<AuthorEntity>> {
        let state = self.ensure_loaded()?;
        let id = state.author_id(key)?;
        state.author(id, &mut state.tables.authors.cursor())
    }

    pub fn publication_by_index(&self, index: PublicationId) -> Result<Arc<PublicationRecord>> {
        let state = self.ensure_loaded()?;
        state.publication(index, &mut state.tables.publications.cursor())
    }

    /// Every publication of the author registered under `key`, co-authors inlined.
    ///
    /// Co-author ids are deduplicated and resolved in ascending order so each
    /// author frame is decompressed at most once per call.
    pub fn author_publications(&self, key: &str) -> Result<Vec<Publication>> {
        let state = self.ensure_loaded()?;
        let id = state.author_id(key)?;
        let author = state.author(id, &mut state.tables.authors.cursor())?;

        let mut cursor = state.tables.publications.cursor();
        let records = author
            .publications
            .iter()
            .map(|&index| state.publication(index, &mut cursor))
            .collect::<Result<Vec<_>>>()?;

        let wanted: Vec<AuthorId> = records
            .iter()
            .flat_map(|record| record.authors.iter().copied())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let resolved: HashMap<AuthorId, Arc<AuthorEntity>> =
            wanted.iter().copied().zip(state.authors(&wanted)?).collect();

        let publications = records
            .iter()
            .map(|record| {
                let authors = record
                    .authors
                    .iter()
                    .filter_map(|id| resolved.get(id).cloned())
                    .collect();
                Publication::hydrate(record, authors)
            })
            .collect::<Vec<_>>();
        tracing::debug!(
            key,
            publications = publications.len(),
            coauthors = wanted.len(),
            "publications hydrated"
        );
        Ok(publications)
    }

    /// Publications of `key` wrapped for linkage against live sources.
    pub fn source_publications(&self, key: &str) -> Result<Vec<SourcePublication>> {
        Ok(self
            .author_publications(key)?
            .into_iter()
            .map(SourcePublication::Mirror)
            .collect())
    }

    /// Authors matching `name` under the configured search parameters.
    pub fn search_author(&self, name: &str) -> Result<Vec<Arc<AuthorEntity>>> {
        let params = self.options.search;
        self.search_author_with(name, &params)
    }

    pub fn search_author_with(
        &self,
        name: &str,
        params: &SearchParams,
    ) -> Result<Vec<Arc<AuthorEntity>>> {
        let state = self.ensure_loaded()?;
        let index = state.search.as_ref().ok_or(MirrorError::SearchDisabled)?;
        let key = SearchKey::new(name, params);
        let ids = match state.caches.searches.get(&key) {
            Some(ids) => ids,
            None => {
                let ids: Arc<[AuthorId]> = index.query(name, params).into();
                state.caches.searches.put(key, Arc::clone(&ids));
                ids
            }
        };
        tracing::debug!(name, matches = ids.len(), "author search");
        state.authors(&ids)
    }

    /// Identity for a declared author: its pinned HAL and dblp keys plus any
    /// mirror keys found in the store. `None` when nothing is pinned.
    pub fn sourced_author(&self, spec: &AuthorSpec) -> Result<Option<SourcedAuthor>> {
        let mut sources = spec.pinned_sources();
        for key in spec.mirror_keys() {
            match self.author_by_key(key) {
                Ok(author) => sources.push(SourceAuthor::Mirror(author)),
                Err(err) if err.is_not_found() => {
                    tracing::warn!(key, author = %spec.name, "pinned mirror key not found");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(SourcedAuthor::from_sources(sources))
    }
}
