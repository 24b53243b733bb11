//! Streaming access to a compressed, blank-line delimited dump.
//!
//! The source is read chunk by chunk, decompressed incrementally and split on
//! `\n\n`; the unterminated tail is kept for the next read so memory stays
//! bounded by one chunk plus one partial record.

use std::collections::VecDeque;
use std::fmt;
use std::io::{BufRead, BufReader, ErrorKind, Read};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use flate2::read::MultiGzDecoder;
use memchr::memmem;

use crate::error::{MirrorError, Result};

const RECORD_DELIMITER: &[u8] = b"\n\n";
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const ZSTD_MAGIC: [u8; 4] = [0x28, 0xb5, 0x2f, 0xfd];

/// A local file or a remote URL holding the dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DumpSource {
    Local(PathBuf),
    Remote(String),
}

impl DumpSource {
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        if raw.starts_with("https://") || raw.starts_with("http://") {
            Self::Remote(raw.to_string())
        } else {
            Self::Local(PathBuf::from(raw))
        }
    }
}

impl fmt::Display for DumpSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(path) => write!(f, "{}", path.display()),
            Self::Remote(url) => f.write_str(url),
        }
    }
}

/// Compression detected from the first bytes of the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpCompression {
    Gzip,
    Zstd,
    Plain,
}

impl DumpCompression {
    #[must_use]
    pub fn sniff(head: &[u8]) -> Self {
        if head.starts_with(&GZIP_MAGIC) {
            Self::Gzip
        } else if head.starts_with(&ZSTD_MAGIC) {
            Self::Zstd
        } else {
            Self::Plain
        }
    }
}

/// Shared count of compressed bytes pulled from the source.
#[derive(Debug, Clone, Default)]
pub struct ByteCounter(Arc<AtomicU64>);

impl ByteCounter {
    #[must_use]
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

struct CountingReader<R> {
    inner: R,
    counter: ByteCounter,
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let read = self.inner.read(buf)?;
        self.counter.0.fetch_add(read as u64, Ordering::Relaxed);
        Ok(read)
    }
}

/// An opened, decompressing dump stream.
pub struct DumpStream {
    pub reader: Box<dyn Read + Send>,
    /// Compressed size when the source advertises it.
    pub total_bytes: Option<u64>,
    pub compression: DumpCompression,
    pub bytes_read: ByteCounter,
}

/// Open `source` and wrap it in the decoder matching its magic bytes.
///
/// Failing to open the source is fatal and reported with the path or URL.
pub fn open_dump(source: &DumpSource, chunk_size: usize) -> Result<DumpStream> {
    let (raw, total_bytes) = open_raw(source)?;
    let bytes_read = ByteCounter::default();
    let counting = CountingReader {
        inner: raw,
        counter: bytes_read.clone(),
    };
    let mut buffered = BufReader::with_capacity(chunk_size.max(16), counting);
    let compression = DumpCompression::sniff(buffered.fill_buf()?);
    tracing::info!(source = %source, ?compression, total_bytes, "dump opened");
    let reader: Box<dyn Read + Send> = match compression {
        DumpCompression::Gzip => Box::new(MultiGzDecoder::new(buffered)),
        DumpCompression::Zstd => Box::new(zstd::stream::read::Decoder::with_buffer(buffered)?),
        DumpCompression::Plain => Box::new(buffered),
    };
    Ok(DumpStream {
        reader,
        total_bytes,
        compression,
        bytes_read,
    })
}

fn open_raw(source: &DumpSource) -> Result<(Box<dyn Read + Send>, Option<u64>)> {
    match source {
        DumpSource::Local(path) => {
            let file = fs_err::File::open(path)?;
            let total = file.metadata().ok().map(|meta| meta.len());
            Ok((Box::new(file), total))
        }
        DumpSource::Remote(url) => open_remote(url),
    }
}

#[cfg(feature = "remote")]
fn open_remote(url: &str) -> Result<(Box<dyn Read + Send>, Option<u64>)> {
    let client = crate::io::release::http_client(None)?;
    let response = client
        .get(url)
        .send()
        .and_then(reqwest::blocking::Response::error_for_status)
        .map_err(|err| MirrorError::http(url, err))?;
    let total = response.content_length();
    Ok((Box::new(response), total))
}

#[cfg(not(feature = "remote"))]
fn open_remote(_url: &str) -> Result<(Box<dyn Read + Send>, Option<u64>)> {
    Err(MirrorError::RemoteDisabled)
}

/// Splits a decoded byte stream into `\n\n`-delimited text blocks.
pub struct BlockReader<R> {
    reader: R,
    chunk: Vec<u8>,
    buffer: Vec<u8>,
    ready: VecDeque<String>,
    eof: bool,
}

impl<R: Read> BlockReader<R> {
    pub fn new(reader: R, chunk_size: usize) -> Self {
        Self {
            reader,
            chunk: vec![0; chunk_size.max(1)],
            buffer: Vec::new(),
            ready: VecDeque::new(),
            eof: false,
        }
    }

    fn push_block(&mut self, bytes: &[u8]) {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return;
        }
        self.ready
            .push_back(String::from_utf8_lossy(bytes).into_owned());
    }

    /// Move every complete block out of the buffer; `scan_from` skips bytes already scanned.
    fn split_complete(&mut self, scan_from: usize) {
        let mut consumed = 0;
        let mut cuts = Vec::new();
        for pos in memmem::find_iter(&self.buffer[scan_from..], RECORD_DELIMITER) {
            let pos = scan_from + pos;
            if pos < consumed {
                continue;
            }
            cuts.push((consumed, pos));
            consumed = pos + RECORD_DELIMITER.len();
        }
        if consumed == 0 {
            return;
        }
        let buffer = std::mem::take(&mut self.buffer);
        for (start, end) in cuts {
            self.push_block(&buffer[start..end]);
        }
        self.buffer = buffer[consumed..].to_vec();
    }

    fn flush_tail(&mut self) {
        let tail = std::mem::take(&mut self.buffer);
        self.push_block(&tail);
    }
}

impl<R: Read> Iterator for BlockReader<R> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(block) = self.ready.pop_front() {
                return Some(Ok(block));
            }
            if self.eof {
                return None;
            }
            match self.reader.read(&mut self.chunk) {
                Ok(0) => {
                    self.eof = true;
                    self.flush_tail();
                }
                Ok(read) => {
                    let scan_from = self.buffer.len().saturating_sub(RECORD_DELIMITER.len() - 1);
                    self.buffer.extend_from_slice(&self.chunk[..read]);
                    self.split_complete(scan_from);
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => {}
                Err(err) => {
                    self.eof = true;
                    return Some(Err(MirrorError::Io(err)));
                }
            }
        }
    }
}
