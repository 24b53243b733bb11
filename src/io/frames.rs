//! Frame-compressed, append-only sequence with random access.
//!
//! Elements are batched into fixed-size frames; each frame is bincode-encoded
//! and zstd-compressed on its own, and the compressed frames are concatenated
//! into one blob indexed by cumulative byte offsets (`frame_count + 1` entries).
//! Reading element `i` decompresses only frame `i / frame_size`.

use std::fmt;
use std::io::Cursor;
use std::marker::PhantomData;

use bincode::config::{self, Config};
use bincode::serde::{decode_from_slice, encode_to_vec};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::constants::FRAME_COMPRESSION_LEVEL;
use crate::error::{MirrorError, Result};

fn frame_config() -> impl Config {
    config::standard()
}

/// Immutable frame store. Built only through [`FrameStoreBuilder`].
///
/// The store itself holds no decode cache, so it can be shared read-only
/// across threads; each reader keeps its own frame in a [`FrameCursor`].
#[derive(Clone, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct FrameStore<T> {
    frame_size: usize,
    len: usize,
    blob: Vec<u8>,
    offsets: Vec<u64>,
    #[serde(skip)]
    _marker: PhantomData<fn() -> T>,
}

impl<T> fmt::Debug for FrameStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameStore")
            .field("frame_size", &self.frame_size)
            .field("len", &self.len)
            .field("frames", &self.frame_count())
            .field("compressed_bytes", &self.blob.len())
            .finish()
    }
}

impl<T> FrameStore<T> {
    /// Number of elements appended during build, trailing partial frame included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    /// Size of the concatenated compressed frames in bytes.
    #[must_use]
    pub fn compressed_size(&self) -> usize {
        self.blob.len()
    }

    fn locate(&self, index: usize) -> Result<(usize, usize)> {
        if index >= self.len {
            return Err(MirrorError::IndexOutOfRange {
                index,
                len: self.len,
            });
        }
        Ok((index / self.frame_size, index % self.frame_size))
    }

    fn frame_bytes(&self, frame: usize) -> Result<&[u8]> {
        let bounds = self.offsets.get(frame).zip(self.offsets.get(frame + 1));
        let (start, end) = bounds.ok_or_else(|| MirrorError::CorruptFrame {
            frame,
            reason: "missing offsets".into(),
        })?;
        self.blob
            .get(*start as usize..*end as usize)
            .ok_or_else(|| MirrorError::CorruptFrame {
                frame,
                reason: format!("byte range {start}..{end} exceeds blob"),
            })
    }
}

impl<T: DeserializeOwned> FrameStore<T> {
    /// Scoped construction: the partial trailing frame is flushed when `fill` returns `Ok`.
    pub fn build<F>(frame_size: usize, fill: F) -> Result<Self>
    where
        T: Serialize,
        F: FnOnce(&mut FrameStoreBuilder<T>) -> Result<()>,
    {
        let mut builder = FrameStoreBuilder::new(frame_size)?;
        fill(&mut builder)?;
        builder.finish()
    }

    fn decode_frame(&self, frame: usize) -> Result<Vec<T>> {
        let compressed = self.frame_bytes(frame)?;
        let raw = zstd::decode_all(Cursor::new(compressed)).map_err(|err| {
            MirrorError::CorruptFrame {
                frame,
                reason: format!("zstd: {err}"),
            }
        })?;
        let (entries, _) = decode_from_slice::<Vec<T>, _>(&raw, frame_config()).map_err(|err| {
            MirrorError::CorruptFrame {
                frame,
                reason: format!("bincode: {err}"),
            }
        })?;
        tracing::trace!(frame, entries = entries.len(), "frame decoded");
        Ok(entries)
    }

    /// One-shot read of element `index`; decompresses its frame without caching it.
    pub fn get(&self, index: usize) -> Result<T> {
        let (frame, offset) = self.locate(index)?;
        self.decode_frame(frame)?
            .into_iter()
            .nth(offset)
            .ok_or_else(|| MirrorError::CorruptFrame {
                frame,
                reason: format!("frame shorter than offset {offset}"),
            })
    }

    /// A reader holding a single decoded frame.
    #[must_use]
    pub fn cursor(&self) -> FrameCursor<'_, T> {
        FrameCursor {
            store: self,
            frame_index: None,
            frame: Vec::new(),
        }
    }

    /// Every element in order, decoding each frame once.
    #[must_use]
    pub fn iter(&self) -> FrameIter<'_, T> {
        FrameIter {
            store: self,
            next_frame: 0,
            current: Vec::new().into_iter(),
            failed: false,
        }
    }
}

/// Accumulates elements and compresses them frame by frame.
pub struct FrameStoreBuilder<T> {
    frame_size: usize,
    len: usize,
    blob: Vec<u8>,
    offsets: Vec<u64>,
    batch: Vec<T>,
}

impl<T: Serialize> FrameStoreBuilder<T> {
    pub fn new(frame_size: usize) -> Result<Self> {
        if frame_size == 0 {
            return Err(MirrorError::InvalidFrameSize);
        }
        Ok(Self {
            frame_size,
            len: 0,
            blob: Vec::new(),
            offsets: vec![0],
            batch: Vec::with_capacity(frame_size),
        })
    }

    /// Append the next element; compresses the batch once it reaches `frame_size`.
    pub fn append(&mut self, entry: T) -> Result<()> {
        self.batch.push(entry);
        self.len += 1;
        if self.batch.len() == self.frame_size {
            self.flush_batch()?;
        }
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    fn flush_batch(&mut self) -> Result<()> {
        if self.batch.is_empty() {
            return Ok(());
        }
        let raw = encode_to_vec(&self.batch, frame_config())?;
        let compressed = zstd::encode_all(Cursor::new(raw), FRAME_COMPRESSION_LEVEL)?;
        self.blob.extend_from_slice(&compressed);
        self.offsets.push(self.blob.len() as u64);
        tracing::trace!(
            frame = self.offsets.len() - 2,
            entries = self.batch.len(),
            bytes = compressed.len(),
            "frame flushed"
        );
        self.batch.clear();
        Ok(())
    }

    /// Flush the trailing partial frame and seal the store.
    pub fn finish(mut self) -> Result<FrameStore<T>> {
        self.flush_batch()?;
        self.blob.shrink_to_fit();
        Ok(FrameStore {
            frame_size: self.frame_size,
            len: self.len,
            blob: self.blob,
            offsets: self.offsets,
            _marker: PhantomData,
        })
    }
}

/// Per-reader random access with a one-frame cache.
pub struct FrameCursor<'a, T> {
    store: &'a FrameStore<T>,
    frame_index: Option<usize>,
    frame: Vec<T>,
}

impl<T: DeserializeOwned> FrameCursor<'_, T> {
    /// Element `index`; decompresses only when `index` lies outside the cached frame.
    pub fn get(&mut self, index: usize) -> Result<&T> {
        let (frame, offset) = self.store.locate(index)?;
        if self.frame_index != Some(frame) {
            self.frame = self.store.decode_frame(frame)?;
            self.frame_index = Some(frame);
        }
        self.frame
            .get(offset)
            .ok_or_else(|| MirrorError::CorruptFrame {
                frame,
                reason: format!("frame shorter than offset {offset}"),
            })
    }

    /// Index of the frame currently held, if any.
    #[must_use]
    pub fn cached_frame(&self) -> Option<usize> {
        self.frame_index
    }
}

pub struct FrameIter<'a, T> {
    store: &'a FrameStore<T>,
    next_frame: usize,
    current: std::vec::IntoIter<T>,
    failed: bool,
}

impl<T: DeserializeOwned> Iterator for FrameIter<'_, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entry) = self.current.next() {
                return Some(Ok(entry));
            }
            if self.failed || self.next_frame >= self.store.frame_count() {
                return None;
            }
            match self.store.decode_frame(self.next_frame) {
                Ok(entries) => {
                    self.current = entries.into_iter();
                    self.next_frame += 1;
                }
                Err(err) => {
                    self.failed = true;
                    return Some(Err(err));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_strings(count: usize, frame_size: usize) -> FrameStore<String> {
        FrameStore::build(frame_size, |builder| {
            for i in 0..count {
                builder.append(format!("entry-{i}"))?;
            }
            Ok(())
        })
        .expect("build")
    }

    #[test]
    fn round_trip_is_independent_of_frame_size() {
        for frame_size in [1, 2, 3, 7, 10, 64] {
            let store = build_strings(23, frame_size);
            assert_eq!(store.len(), 23);
            assert_eq!(store.frame_count(), 23_usize.div_ceil(frame_size));
            for i in 0..23 {
                assert_eq!(store.get(i).expect("get"), format!("entry-{i}"));
            }
        }
    }

    #[test]
    fn trailing_partial_frame_is_flushed() {
        let store = build_strings(10, 4);
        assert_eq!(store.len(), 10);
        assert_eq!(store.frame_count(), 3);
        assert_eq!(store.get(9).expect("last"), "entry-9");
    }

    #[test]
    fn out_of_range_is_reported() {
        let store = build_strings(5, 2);
        let err = store.get(5).expect_err("out of range");
        assert!(matches!(
            err,
            MirrorError::IndexOutOfRange { index: 5, len: 5 }
        ));
        let empty = build_strings(0, 8);
        assert!(empty.is_empty());
        assert_eq!(empty.frame_count(), 0);
        assert!(empty.get(0).is_err());
    }

    #[test]
    fn zero_frame_size_is_rejected() {
        assert!(matches!(
            FrameStoreBuilder::<u32>::new(0),
            Err(MirrorError::InvalidFrameSize)
        ));
    }

    #[test]
    fn cursor_switches_frames_on_demand() {
        let store = build_strings(12, 4);
        let mut cursor = store.cursor();
        assert_eq!(cursor.cached_frame(), None);
        assert_eq!(cursor.get(5).expect("get"), "entry-5");
        assert_eq!(cursor.cached_frame(), Some(1));
        assert_eq!(cursor.get(6).expect("get"), "entry-6");
        assert_eq!(cursor.cached_frame(), Some(1));
        assert_eq!(cursor.get(0).expect("get"), "entry-0");
        assert_eq!(cursor.cached_frame(), Some(0));
    }

    #[test]
    fn iter_yields_everything_in_order() {
        let store = build_strings(9, 4);
        let all: Vec<String> = store.iter().collect::<Result<_>>().expect("iter");
        assert_eq!(all.len(), 9);
        assert_eq!(all[8], "entry-8");
    }

    #[test]
    fn store_survives_serialization() {
        let store = build_strings(17, 5);
        let bytes = encode_to_vec(&store, frame_config()).expect("encode");
        let (restored, _): (FrameStore<String>, usize) =
            decode_from_slice(&bytes, frame_config()).expect("decode");
        assert_eq!(restored.len(), 17);
        assert_eq!(restored.get(16).expect("get"), "entry-16");
    }
}
