//! Building, persisting and loading the mirror.
//!
//! Responsibilities:
//! - Build tables and name index from the configured dump and swap them in.
//! - Save the loaded state as one artifact, with or without its name index.
//! - Load an artifact, rebuilding the name index on request.
//! - Fall back to a fresh build when the artifact is missing or unreadable.
//! - Restore a missing name index when loading lazily.

use std::io::Read;
use std::path::Path;

use crate::error::{MirrorError, Result};
use crate::ingest::{IngestStats, Ingested, Ingestor};
use crate::io::artifact::{Snapshot, read_artifact, write_artifact};
use crate::io::dump::DumpSource;
use crate::search::NameIndex;

use super::Mirror;

impl Mirror {
    /// Stream the configured dump and install the result. `limit` caps stored publications.
    pub fn build(&self, limit: Option<usize>) -> Result<IngestStats> {
        let source = DumpSource::parse(&self.options.io.source);
        tracing::info!(source = %source, "building mirror");
        let ingested = Ingestor::new(&self.options)?
            .with_limit(limit)
            .ingest_source(&source)?;
        Ok(self.install_ingested(ingested))
    }

    /// Build from an already decompressed Turtle stream.
    pub fn build_from_reader<R: Read>(
        &self,
        reader: R,
        limit: Option<usize>,
    ) -> Result<IngestStats> {
        let ingested = Ingestor::new(&self.options)?
            .with_limit(limit)
            .ingest_reader(reader)?;
        Ok(self.install_ingested(ingested))
    }

    fn install_ingested(&self, ingested: Ingested) -> IngestStats {
        let stats = ingested.stats;
        self.install(ingested.tables, Some(ingested.search));
        tracing::info!(
            records = stats.records,
            skipped = stats.skipped,
            authors = stats.authors,
            bytes = stats.bytes_read,
            "mirror built"
        );
        stats
    }

    /// Write the loaded state to the configured destination.
    pub fn save(&self, include_search: bool) -> Result<u64> {
        self.save_to(&self.options.io.destination, include_search)
    }

    pub fn save_to(&self, path: &Path, include_search: bool) -> Result<u64> {
        let state = self.current().ok_or_else(|| MirrorError::InvalidOptions {
            reason: "nothing to save: mirror is not loaded".into(),
        })?;
        let search = if include_search { state.search.as_ref() } else { None };
        write_artifact(path, &state.tables, search)
    }

    /// Load the configured artifact.
    pub fn load(&self, restore_search: bool) -> Result<()> {
        self.load_from(&self.options.io.destination, restore_search)
    }

    /// Load `path`. With `restore_search`, the name index is rebuilt from the
    /// author table and the artifact rewritten to include it.
    pub fn load_from(&self, path: &Path, restore_search: bool) -> Result<()> {
        let snapshot = read_artifact(path)?;
        self.install_snapshot(path, snapshot, restore_search)
    }

    fn install_snapshot(
        &self,
        path: &Path,
        snapshot: Snapshot,
        restore_search: bool,
    ) -> Result<()> {
        if !restore_search {
            self.install(snapshot.tables, snapshot.search);
            return Ok(());
        }
        let search = NameIndex::build(&snapshot.tables.authors, self.options.similarity.into())?;
        write_artifact(path, &snapshot.tables, Some(&search))?;
        self.install(snapshot.tables, Some(search));
        Ok(())
    }

    /// Load the configured artifact, building and saving a fresh one when it is
    /// missing or cannot be read by this version. An artifact saved without its
    /// name index gets the index rebuilt and written back.
    pub fn load_or_build(&self) -> Result<()> {
        let path = &self.options.io.destination;
        match read_artifact(path) {
            Ok(snapshot) => {
                let restore_search = snapshot.search.is_none();
                if restore_search {
                    tracing::info!(
                        path = %path.display(),
                        "artifact has no name index; restoring it"
                    );
                }
                return self.install_snapshot(path, snapshot, restore_search);
            }
            Err(MirrorError::ArtifactMissing { path }) => {
                tracing::info!(path = %path.display(), "no artifact found; building from source");
            }
            Err(err) if err.is_incompatible() => {
                tracing::warn!(error = %err, "artifact is incompatible; rebuilding from source");
            }
            Err(err) => return Err(err),
        }
        self.build(None)?;
        self.save(true)?;
        Ok(())
    }

    /// Remove the artifact and its metadata file. Returns whether an artifact existed.
    pub fn delete(&self) -> Result<bool> {
        let io = &self.options.io;
        let existed = io.destination.exists();
        if existed {
            fs_err::remove_file(&io.destination)?;
            tracing::info!(path = %io.destination.display(), "artifact deleted");
        }
        if io.metadata.exists() {
            fs_err::remove_file(&io.metadata)?;
        }
        Ok(existed)
    }
}
