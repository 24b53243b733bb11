#![deny(clippy::all, clippy::pedantic)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![cfg_attr(
    test,
    allow(
        clippy::useless_vec,
        clippy::uninlined_format_args,
        clippy::cast_possible_truncation,
        clippy::float_cmp,
        clippy::cast_precision_loss
    )
)]
#![allow(clippy::module_name_repetitions)]
//
// Documentation lints: public APIs carry docs, internal helpers mostly do not.
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
//
// Dense ids are u32 and frame/entry counts fit comfortably; scores are f64.
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
//
#![allow(clippy::too_many_lines)]
#![allow(clippy::similar_names)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::manual_let_else)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::default_trait_access)]
#![allow(clippy::field_reassign_with_default)]
#![allow(clippy::implicit_hasher)]
#![allow(clippy::unnecessary_wraps)]

//! Compact local mirror of the dblp bibliography.
//!
//! A build streams the compressed Turtle dump once, assigns dense ids to
//! authors, stores authors and publications in zstd-compressed frame stores
//! and indexes every author spelling for fuzzy search. The result persists as
//! a single artifact. Records from live sources can be clustered against the
//! mirror with [`deduplicate`].

/// The bibmirror-core crate version (matches `Cargo.toml`).
pub const BIBMIRROR_CORE_VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod constants;
pub mod dedup;
pub mod error;
pub mod ingest;
pub mod io;
pub mod mirror;
pub mod search;
pub mod similarity;
pub mod text;
pub mod types;

pub use dedup::{
    AuthorMetadata, AuthorRedirect, AuthorRules, AuthorSpec, CanonicalPublication,
    CanonicalRecord, Linkable, LinkageParams, LinkedAuthor, LinkedPublication, PublicationRules,
    ScoringRules, SourcePin, SourcedAuthor, deduplicate, merge_author_sources, redirect_authors,
};
pub use error::{MirrorError, Result};
pub use ingest::{IngestStats, Ingested, Ingestor, MirrorTables, RecordParser};
pub use io::artifact::{ArtifactHeader, Snapshot, read_artifact, read_header, write_artifact};
pub use io::dump::{BlockReader, DumpCompression, DumpSource, DumpStream, open_dump};
pub use io::frames::{FrameCursor, FrameIter, FrameStore, FrameStoreBuilder};
pub use io::release::{InstalledMetadata, ReleaseAsset, ReleaseInfo};
pub use mirror::{DbInfo, Mirror, UpdateNotice};
pub use search::{NameHit, NameIndex, select_matches};
pub use similarity::{FactorIndex, FactorSimilarity, Similarity, SimilarityMatrix};
pub use text::normalize_name;
pub use types::{
    AuthorEntity, AuthorId, CacheCapacities, DblpAuthor, DblpPublication, FrameSizes, HalAuthor,
    HalKey, HalPublication, IoOptions, MirrorOptions, Origin, PubType, Publication, PublicationId,
    PublicationMetadata, PublicationRecord, RawRecord, SearchParams, SimilarityParams,
    SourceAuthor, SourcePublication,
};
