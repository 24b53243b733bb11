//! Format constants and tunable defaults.

/// Magic bytes at the start of every persisted mirror artifact.
pub const ARTIFACT_MAGIC: [u8; 4] = *b"BMIR";
/// Bumped whenever the serialized snapshot layout changes.
pub const ARTIFACT_FORMAT_VERSION: u32 = 2;
/// magic (4) + format version (4) + flags (4) + payload length (8) + blake3 (32)
pub const ARTIFACT_HEADER_SIZE: usize = 52;
pub const ARTIFACT_FLAG_HAS_SEARCH: u32 = 1;

/// File stem shared by the artifact, its metadata file and the release asset.
pub const MIRROR_STEM: &str = "ldb";
pub const ARTIFACT_FILE_NAME: &str = "ldb.bmir.zst";
pub const METADATA_FILE_NAME: &str = "ldb.json";
pub const DATA_DIR_NAME: &str = "bibmirror";

pub const DEFAULT_DUMP_SOURCE: &str = "https://dblp.org/rdf/dblp.ttl.gz";
pub const DEFAULT_RELEASE_API: &str = "https://api.github.com/repos/balouf/gismap/releases";

pub const DEFAULT_AUTHOR_FRAME_SIZE: usize = 512;
pub const DEFAULT_PUBLICATION_FRAME_SIZE: usize = 256;
pub const FRAME_COMPRESSION_LEVEL: i32 = 3;
pub const ARTIFACT_COMPRESSION_LEVEL: i32 = 3;

pub const DEFAULT_SEARCH_LIMIT: usize = 3;
pub const DEFAULT_SEARCH_CUTOFF: f64 = 87.0;
pub const DEFAULT_SEARCH_SLACK: f64 = 1.0;
pub const DEFAULT_NAME_N_RANGE: usize = 2;
pub const DEFAULT_NAME_LENGTH_IMPACT: f64 = 0.1;

pub const DEFAULT_TITLE_N_RANGE: usize = 5;
pub const DEFAULT_TITLE_LENGTH_IMPACT: f64 = 0.05;
pub const DEFAULT_TITLE_THRESHOLD: f64 = 85.0;

/// Read size for dump streams; a multiple of 32 KiB keeps gzip blocks aligned.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;
/// Emit an ingest progress line every this many stored publications.
pub const INGEST_LOG_EVERY: usize = 1_000_000;

pub const DEFAULT_AUTHOR_CACHE: usize = 50_000;
pub const DEFAULT_PUBLICATION_CACHE: usize = 50_000;
pub const DEFAULT_SEARCH_CACHE: usize = 1_000;

/// Venue substituted when a publication has none.
pub const UNPUBLISHED_VENUE: &str = "unpublished";
pub const HTTP_TIMEOUT_SECS: u64 = 30;
