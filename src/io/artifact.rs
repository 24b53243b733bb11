//! Single-file persisted mirror.
//!
//! Layout: a fixed 52-byte header followed by the zstd-compressed bincode
//! snapshot.
//!
//! ```text
//! magic "BMIR" | format version u32 | flags u32 | payload length u64 | blake3(payload) [32]
//! ```
//!
//! All integers are little-endian. Any header mismatch, checksum failure or
//! undecodable payload is reported as [`MirrorError::IncompatibleArtifact`].

use std::io::{Cursor, ErrorKind, Read, Write};
use std::path::Path;

use atomic_write_file::AtomicWriteFile;
use bincode::config;
use bincode::serde::{decode_from_std_read, encode_to_vec};
use serde::{Deserialize, Serialize};

use crate::constants::{
    ARTIFACT_COMPRESSION_LEVEL, ARTIFACT_FLAG_HAS_SEARCH, ARTIFACT_FORMAT_VERSION,
    ARTIFACT_HEADER_SIZE, ARTIFACT_MAGIC,
};
use crate::error::{MirrorError, Result};
use crate::ingest::MirrorTables;
use crate::search::NameIndex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArtifactHeader {
    pub version: u32,
    pub flags: u32,
    pub payload_len: u64,
    pub checksum: [u8; 32],
}

impl ArtifactHeader {
    #[must_use]
    pub fn has_search(&self) -> bool {
        self.flags & ARTIFACT_FLAG_HAS_SEARCH != 0
    }

    fn encode(&self) -> [u8; ARTIFACT_HEADER_SIZE] {
        let mut out = [0u8; ARTIFACT_HEADER_SIZE];
        out[0..4].copy_from_slice(&ARTIFACT_MAGIC);
        out[4..8].copy_from_slice(&self.version.to_le_bytes());
        out[8..12].copy_from_slice(&self.flags.to_le_bytes());
        out[12..20].copy_from_slice(&self.payload_len.to_le_bytes());
        out[20..52].copy_from_slice(&self.checksum);
        out
    }

    fn decode(bytes: &[u8], path: &Path) -> Result<Self> {
        let incompatible = |reason: String| MirrorError::IncompatibleArtifact {
            path: path.to_path_buf(),
            reason,
        };
        if bytes.len() < ARTIFACT_HEADER_SIZE {
            return Err(incompatible(format!("truncated header ({} bytes)", bytes.len())));
        }
        if bytes[0..4] != ARTIFACT_MAGIC {
            return Err(incompatible("bad magic".into()));
        }
        let u32_at = |at: usize| {
            u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
        };
        let version = u32_at(4);
        if version != ARTIFACT_FORMAT_VERSION {
            return Err(incompatible(format!(
                "format version {version}, expected {ARTIFACT_FORMAT_VERSION}"
            )));
        }
        let mut payload_len = [0u8; 8];
        payload_len.copy_from_slice(&bytes[12..20]);
        let mut checksum = [0u8; 32];
        checksum.copy_from_slice(&bytes[20..52]);
        Ok(Self {
            version,
            flags: u32_at(8),
            payload_len: u64::from_le_bytes(payload_len),
            checksum,
        })
    }
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    tables: &'a MirrorTables,
    search: Option<&'a NameIndex>,
}

/// Everything read back from an artifact.
#[derive(Debug, Deserialize)]
pub struct Snapshot {
    pub tables: MirrorTables,
    /// Absent when the artifact was saved without its search index.
    pub search: Option<NameIndex>,
}

/// Atomically write `tables` (and `search`, if given) to `path`; returns the file size.
pub fn write_artifact(
    path: &Path,
    tables: &MirrorTables,
    search: Option<&NameIndex>,
) -> Result<u64> {
    let raw = encode_to_vec(SnapshotRef { tables, search }, config::standard())?;
    let payload = zstd::encode_all(Cursor::new(raw), ARTIFACT_COMPRESSION_LEVEL)?;
    let header = ArtifactHeader {
        version: ARTIFACT_FORMAT_VERSION,
        flags: if search.is_some() { ARTIFACT_FLAG_HAS_SEARCH } else { 0 },
        payload_len: payload.len() as u64,
        checksum: blake3::hash(&payload).into(),
    };

    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs_err::create_dir_all(parent)?;
    }
    let mut file = AtomicWriteFile::options().open(path)?;
    file.write_all(&header.encode())?;
    file.write_all(&payload)?;
    file.flush()?;
    file.commit()?;

    let size = (ARTIFACT_HEADER_SIZE + payload.len()) as u64;
    tracing::info!(
        path = %path.display(),
        bytes = size,
        has_search = search.is_some(),
        "artifact saved"
    );
    Ok(size)
}

fn missing_as_artifact(path: &Path, err: std::io::Error) -> MirrorError {
    if err.kind() == ErrorKind::NotFound {
        MirrorError::ArtifactMissing {
            path: path.to_path_buf(),
        }
    } else {
        err.into()
    }
}

/// Header only, validated for magic and format version.
pub fn read_header(path: &Path) -> Result<ArtifactHeader> {
    let file = fs_err::File::open(path).map_err(|err| missing_as_artifact(path, err))?;
    let mut bytes = Vec::with_capacity(ARTIFACT_HEADER_SIZE);
    file.take(ARTIFACT_HEADER_SIZE as u64).read_to_end(&mut bytes)?;
    ArtifactHeader::decode(&bytes, path)
}

/// Read and verify the artifact at `path`. The payload is decompressed and
/// decoded as one stream once its checksum matches.
pub fn read_artifact(path: &Path) -> Result<Snapshot> {
    let bytes = fs_err::read(path).map_err(|err| missing_as_artifact(path, err))?;
    let header = ArtifactHeader::decode(&bytes, path)?;
    let incompatible = |reason: String| MirrorError::IncompatibleArtifact {
        path: path.to_path_buf(),
        reason,
    };

    let payload = &bytes[ARTIFACT_HEADER_SIZE..];
    if payload.len() as u64 != header.payload_len {
        return Err(incompatible(format!(
            "payload is {} bytes, header says {}",
            payload.len(),
            header.payload_len
        )));
    }
    let checksum: [u8; 32] = blake3::hash(payload).into();
    if checksum != header.checksum {
        return Err(incompatible("checksum mismatch".into()));
    }
    let mut decoder = zstd::stream::read::Decoder::with_buffer(payload)
        .map_err(|err| incompatible(format!("zstd: {err}")))?;
    let snapshot: Snapshot = decode_from_std_read(&mut decoder, config::standard())
        .map_err(|err| incompatible(format!("payload: {err}")))?;
    drop(decoder);
    drop(bytes);
    tracing::info!(
        path = %path.display(),
        authors = snapshot.tables.authors.len(),
        publications = snapshot.tables.publications.len(),
        has_search = snapshot.search.is_some(),
        "artifact loaded"
    );
    Ok(snapshot)
}
