//! Public types exposed by the `bibmirror-core` crate.

pub mod entity;
pub mod options;
pub mod record;
pub mod source;

pub use entity::{
    AuthorEntity, AuthorId, Publication, PublicationId, PublicationMetadata, PublicationRecord,
};
pub use options::{
    CacheCapacities, FrameSizes, IoOptions, MirrorOptions, SearchParams, SimilarityParams,
    default_data_dir,
};
pub use record::{PubType, RawRecord};
pub use source::{
    DblpAuthor, DblpPublication, HalAuthor, HalKey, HalPublication, Origin, SourceAuthor,
    SourcePublication,
};
