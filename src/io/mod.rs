//! Storage and transport: frame stores, dump streams, the persisted artifact
//! and release downloads.

pub mod artifact;
pub mod dump;
pub mod frames;
pub mod release;
