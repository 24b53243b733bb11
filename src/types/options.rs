//! Tunable options for building, persisting and querying a mirror.
//!
//! Every field carries a serde default so a partial JSON config only needs to
//! name what it overrides.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{
    ARTIFACT_FILE_NAME, DATA_DIR_NAME, DEFAULT_AUTHOR_CACHE, DEFAULT_AUTHOR_FRAME_SIZE,
    DEFAULT_CHUNK_SIZE, DEFAULT_DUMP_SOURCE, DEFAULT_NAME_LENGTH_IMPACT, DEFAULT_NAME_N_RANGE,
    DEFAULT_PUBLICATION_CACHE, DEFAULT_PUBLICATION_FRAME_SIZE, DEFAULT_RELEASE_API,
    DEFAULT_SEARCH_CACHE, DEFAULT_SEARCH_CUTOFF, DEFAULT_SEARCH_LIMIT, DEFAULT_SEARCH_SLACK,
    METADATA_FILE_NAME,
};
use crate::error::{MirrorError, Result};

/// Author search parameters: how many candidates, absolute floor, relative slack.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchParams {
    pub limit: usize,
    pub cutoff: f64,
    pub slack: f64,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            limit: DEFAULT_SEARCH_LIMIT,
            cutoff: DEFAULT_SEARCH_CUTOFF,
            slack: DEFAULT_SEARCH_SLACK,
        }
    }
}

/// Factor-based similarity parameters.
///
/// `n_range` is the longest factor (substring) considered; `length_impact`
/// in `[0, 1]` moves the score from pure inclusion (0) to a Jaccard-like
/// comparison against the longer string (1).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimilarityParams {
    pub n_range: usize,
    pub length_impact: f64,
}

impl Default for SimilarityParams {
    fn default() -> Self {
        Self {
            n_range: DEFAULT_NAME_N_RANGE,
            length_impact: DEFAULT_NAME_LENGTH_IMPACT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameSizes {
    pub authors: usize,
    pub publications: usize,
}

impl Default for FrameSizes {
    fn default() -> Self {
        Self {
            authors: DEFAULT_AUTHOR_FRAME_SIZE,
            publications: DEFAULT_PUBLICATION_FRAME_SIZE,
        }
    }
}

/// Where the raw dump comes from and where the built mirror lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IoOptions {
    /// Local path or `http(s)://` URL of the compressed dump.
    pub source: String,
    pub destination: PathBuf,
    pub metadata: PathBuf,
    /// Release listing endpoint (`/latest` and `/tags/<tag>` are appended).
    pub release_api: String,
    /// Try the release channel before building when no artifact exists.
    pub auto_retrieve: bool,
    pub chunk_size: usize,
}

impl Default for IoOptions {
    fn default() -> Self {
        let dir = default_data_dir();
        Self {
            source: DEFAULT_DUMP_SOURCE.to_string(),
            destination: dir.join(ARTIFACT_FILE_NAME),
            metadata: dir.join(METADATA_FILE_NAME),
            release_api: DEFAULT_RELEASE_API.to_string(),
            auto_retrieve: true,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheCapacities {
    pub authors: usize,
    pub publications: usize,
    pub searches: usize,
}

impl Default for CacheCapacities {
    fn default() -> Self {
        Self {
            authors: DEFAULT_AUTHOR_CACHE,
            publications: DEFAULT_PUBLICATION_CACHE,
            searches: DEFAULT_SEARCH_CACHE,
        }
    }
}

/// Full configuration of a [`Mirror`](crate::Mirror).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MirrorOptions {
    pub search: SearchParams,
    pub similarity: SimilarityParams,
    pub frame_size: FrameSizes,
    pub io: IoOptions,
    pub cache: CacheCapacities,
}

impl MirrorOptions {
    /// Read a (possibly partial) JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = fs_err::read(path.as_ref())?;
        let options: Self = serde_json::from_slice(&bytes)?;
        options.validate()?;
        Ok(options)
    }

    /// Relocate the artifact and its metadata file under `dir`.
    #[must_use]
    pub fn with_data_dir(mut self, dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        self.io.destination = dir.join(ARTIFACT_FILE_NAME);
        self.io.metadata = dir.join(METADATA_FILE_NAME);
        self
    }

    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.io.source = source.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        let reject = |reason: &str| {
            Err(MirrorError::InvalidOptions {
                reason: reason.to_string(),
            })
        };
        if self.frame_size.authors == 0 || self.frame_size.publications == 0 {
            return reject("frame sizes must be at least 1");
        }
        if self.similarity.n_range == 0 {
            return reject("similarity n_range must be at least 1");
        }
        if !(0.0..=1.0).contains(&self.similarity.length_impact) {
            return reject("similarity length_impact must lie in [0, 1]");
        }
        if self.search.limit == 0 {
            return reject("search limit must be at least 1");
        }
        if self.search.slack < 0.0 {
            return reject("search slack must be non-negative");
        }
        if self.io.chunk_size == 0 {
            return reject("chunk size must be at least 1");
        }
        Ok(())
    }
}

/// Per-user data directory, falling back to `./.bibmirror` when the platform has none.
#[must_use]
pub fn default_data_dir() -> PathBuf {
    dirs_next::data_dir().map_or_else(
        || PathBuf::from(format!(".{DATA_DIR_NAME}")),
        |dir| dir.join(DATA_DIR_NAME),
    )
}
