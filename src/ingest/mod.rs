//! Streaming build of the mirror tables from a dump.
//!
//! One sequential pass: blocks are parsed as they are decoded, authors are
//! assigned dense ids on first sighting, publications go straight into their
//! frame store. The author dictionary is compacted into its own store once the
//! stream ends (or the record limit is hit), then the name index is built.

mod dictionary;
mod parser;

pub use dictionary::AuthorDictionary;
pub use parser::RecordParser;

use std::collections::HashMap;
use std::io::Read;

use serde::{Deserialize, Serialize};

use crate::constants::INGEST_LOG_EVERY;
use crate::error::Result;
use crate::io::dump::{BlockReader, DumpSource, open_dump};
use crate::io::frames::{FrameStore, FrameStoreBuilder};
use crate::search::NameIndex;
use crate::similarity::FactorSimilarity;
use crate::types::{
    AuthorEntity, AuthorId, FrameSizes, MirrorOptions, PublicationId, PublicationRecord, RawRecord,
};

/// Dense tables produced by one build.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorTables {
    pub authors: FrameStore<AuthorEntity>,
    pub publications: FrameStore<PublicationRecord>,
    /// External author identifier to dense id.
    pub keys: HashMap<String, AuthorId>,
}

/// Counters reported at the end of an ingest run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    /// Compressed bytes pulled from the source; zero for in-memory input.
    pub bytes_read: u64,
    pub records: usize,
    pub skipped: usize,
    pub authors: usize,
    /// Whether the record limit stopped the run early.
    pub truncated: bool,
}

impl IngestStats {
    #[must_use]
    pub fn blocks(&self) -> usize {
        self.records + self.skipped
    }
}

/// Everything a build produces.
#[derive(Debug)]
pub struct Ingested {
    pub tables: MirrorTables,
    pub search: NameIndex,
    pub stats: IngestStats,
}

pub struct Ingestor {
    parser: RecordParser,
    frame_sizes: FrameSizes,
    similarity: FactorSimilarity,
    chunk_size: usize,
    limit: Option<usize>,
}

impl Ingestor {
    pub fn new(options: &MirrorOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            parser: RecordParser::new()?,
            frame_sizes: options.frame_size,
            similarity: options.similarity.into(),
            chunk_size: options.io.chunk_size,
            limit: None,
        })
    }

    /// Store at most `limit` publications; the run still compacts and indexes what it kept.
    #[must_use]
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    /// Open, decode and ingest `source`. Failing to open it is fatal.
    pub fn ingest_source(&self, source: &DumpSource) -> Result<Ingested> {
        let stream = open_dump(source, self.chunk_size)?;
        let counter = stream.bytes_read.clone();
        let mut ingested = self.ingest_reader(stream.reader)?;
        ingested.stats.bytes_read = counter.get();
        Ok(ingested)
    }

    /// Ingest an already decompressed Turtle stream.
    pub fn ingest_reader<R: Read>(&self, reader: R) -> Result<Ingested> {
        let blocks = BlockReader::new(reader, self.chunk_size);
        self.ingest(blocks.map(|block| block.map(|text| self.parser.parse(&text))))
    }

    /// Ingest records that were parsed elsewhere.
    pub fn ingest_records<I>(&self, records: I) -> Result<Ingested>
    where
        I: IntoIterator<Item = RawRecord>,
    {
        self.ingest(records.into_iter().map(|record| Ok(Some(record))))
    }

    /// `None` items are blocks the grammar rejected. Records without any
    /// author are skipped too.
    fn ingest<I>(&self, records: I) -> Result<Ingested>
    where
        I: Iterator<Item = Result<Option<RawRecord>>>,
    {
        let mut stats = IngestStats::default();
        let mut dictionary = AuthorDictionary::default();
        tracing::info!(limit = ?self.limit, "retrieving publications");
        let publications = FrameStore::build(self.frame_sizes.publications, |store| {
            for record in records {
                if self.limit.is_some_and(|limit| store.len() >= limit) {
                    stats.truncated = true;
                    break;
                }
                let Some(record) = record?.filter(|record| !record.authors.is_empty()) else {
                    stats.skipped += 1;
                    continue;
                };
                append_record(&mut dictionary, store, record)?;
                stats.records += 1;
                if stats.records % INGEST_LOG_EVERY == 0 {
                    tracing::info!(
                        records = stats.records,
                        skipped = stats.skipped,
                        authors = dictionary.len(),
                        "ingest progress"
                    );
                }
            }
            Ok(())
        })?;
        tracing::info!(
            publications = publications.len(),
            skipped = stats.skipped,
            truncated = stats.truncated,
            "publications retrieved"
        );

        stats.authors = dictionary.len();
        let (authors, keys) = dictionary.into_store(self.frame_sizes.authors)?;
        tracing::info!(
            authors = authors.len(),
            compressed_bytes = authors.compressed_size(),
            "authors compacted"
        );
        let search = NameIndex::build(&authors, self.similarity)?;
        Ok(Ingested {
            tables: MirrorTables {
                authors,
                publications,
                keys,
            },
            search,
            stats,
        })
    }
}

fn append_record(
    dictionary: &mut AuthorDictionary,
    store: &mut FrameStoreBuilder<PublicationRecord>,
    record: RawRecord,
) -> Result<()> {
    let index = store.len() as PublicationId;
    let mut authors: Vec<AuthorId> = Vec::with_capacity(record.authors.len());
    for (position, (key, name)) in record.authors.iter().enumerate() {
        // First signature of a repeated identifier wins.
        if record.authors[..position].iter().any(|(known, _)| known == key) {
            continue;
        }
        authors.push(dictionary.observe(key, name, index));
    }
    store.append(PublicationRecord {
        key: record.key,
        title: record.title,
        kind: record.kind,
        authors,
        url: record.url,
        streams: record.streams,
        pages: record.pages,
        venue: record.venue,
        year: record.year,
    })
}
