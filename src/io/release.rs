//! Prebuilt artifacts published on a release channel, and the local record of
//! which one is installed.

use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::Result;

#[cfg(feature = "remote")]
use crate::constants::HTTP_TIMEOUT_SECS;
#[cfg(feature = "remote")]
use crate::error::MirrorError;

/// What was installed, from where, and when. Used for update checks only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledMetadata {
    pub tag: String,
    pub url: String,
    pub size: u64,
    /// RFC 3339 UTC timestamp.
    pub downloaded_at: String,
}

impl InstalledMetadata {
    #[must_use]
    pub fn now(tag: impl Into<String>, url: impl Into<String>, size: u64) -> Self {
        Self {
            tag: tag.into(),
            url: url.into(),
            size,
            downloaded_at: Utc::now().to_rfc3339(),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs_err::create_dir_all(parent)?;
        }
        fs_err::write(path, serde_json::to_vec_pretty(self)?)?;
        Ok(())
    }

    /// `None` when the file is missing or unreadable.
    #[must_use]
    pub fn load(path: &Path) -> Option<Self> {
        let bytes = fs_err::read(path).ok()?;
        match serde_json::from_slice(&bytes) {
            Ok(meta) => Some(meta),
            Err(err) => {
                tracing::debug!(
                    path = %path.display(),
                    error = %err,
                    "ignoring unreadable metadata"
                );
                None
            }
        }
    }
}

/// `0.5.0` and `v0.5.0` both name release `v0.5.0`.
#[must_use]
pub fn normalize_tag(version: &str) -> String {
    let version = version.trim();
    if version.starts_with('v') {
        version.to_string()
    } else {
        format!("v{version}")
    }
}

/// Same `major.minor` as `version`.
#[must_use]
pub fn compatible_tag(tag: &str, version: &str) -> bool {
    fn major_minor(raw: &str) -> Vec<&str> {
        raw.trim_start_matches('v').split('.').take(2).collect()
    }
    major_minor(tag) == major_minor(version)
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReleaseAsset {
    pub name: String,
    pub browser_download_url: String,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReleaseInfo {
    pub tag_name: String,
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

impl ReleaseInfo {
    #[must_use]
    pub fn asset(&self, name: &str) -> Option<&ReleaseAsset> {
        self.assets.iter().find(|asset| asset.name == name)
    }

    /// First few asset names, for error messages.
    #[must_use]
    pub fn asset_names(&self) -> Vec<&str> {
        self.assets.iter().take(3).map(|asset| asset.name.as_str()).collect()
    }
}

#[cfg(feature = "remote")]
pub(crate) fn http_client(
    timeout: Option<std::time::Duration>,
) -> Result<reqwest::blocking::Client> {
    reqwest::blocking::Client::builder()
        .connect_timeout(std::time::Duration::from_secs(HTTP_TIMEOUT_SECS))
        .timeout(timeout)
        .user_agent(concat!("bibmirror-core/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(Into::into)
}

/// Release `tag`, or the latest one, from a GitHub-style listing endpoint.
#[cfg(feature = "remote")]
pub fn fetch_release(api: &str, tag: Option<&str>) -> Result<ReleaseInfo> {
    let url = match tag {
        Some(tag) => format!("{api}/tags/{tag}"),
        None => format!("{api}/latest"),
    };
    let client = http_client(Some(std::time::Duration::from_secs(HTTP_TIMEOUT_SECS)))?;
    let response = client
        .get(&url)
        .header(reqwest::header::ACCEPT, "application/vnd.github+json")
        .send()
        .map_err(|err| MirrorError::http(&url, err))?;
    if response.status() == reqwest::StatusCode::NOT_FOUND {
        return Err(MirrorError::Release {
            reason: format!("release not found: {}", tag.unwrap_or("latest")),
        });
    }
    response
        .error_for_status()
        .and_then(reqwest::blocking::Response::json::<ReleaseInfo>)
        .map_err(|err| MirrorError::http(&url, err))
}

#[cfg(not(feature = "remote"))]
pub fn fetch_release(_api: &str, _tag: Option<&str>) -> Result<ReleaseInfo> {
    Err(crate::error::MirrorError::RemoteDisabled)
}

/// Stream `url` into `dest` atomically, reporting `(downloaded, total)` after each chunk.
#[cfg(feature = "remote")]
pub fn download(url: &str, dest: &Path, progress: &mut dyn FnMut(u64, Option<u64>)) -> Result<u64> {
    use std::io::{Read, Write};

    let client = http_client(None)?;
    let mut response = client
        .get(url)
        .send()
        .and_then(reqwest::blocking::Response::error_for_status)
        .map_err(|err| MirrorError::http(url, err))?;
    let total = response.content_length();

    if let Some(parent) = dest.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs_err::create_dir_all(parent)?;
    }
    let mut file = atomic_write_file::AtomicWriteFile::options().open(dest)?;
    let mut buffer = vec![0u8; 64 * 1024];
    let mut downloaded = 0u64;
    loop {
        let read = match response.read(&mut buffer) {
            Ok(0) => break,
            Ok(read) => read,
            Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(MirrorError::http(url, err)),
        };
        file.write_all(&buffer[..read])?;
        downloaded += read as u64;
        progress(downloaded, total);
    }
    file.flush()?;
    file.commit()?;
    tracing::debug!(url, bytes = downloaded, dest = %dest.display(), "download complete");
    Ok(downloaded)
}

#[cfg(not(feature = "remote"))]
pub fn download(
    _url: &str,
    _dest: &Path,
    _progress: &mut dyn FnMut(u64, Option<u64>),
) -> Result<u64> {
    Err(crate::error::MirrorError::RemoteDisabled)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_normalized() {
        assert_eq!(normalize_tag("0.5.0"), "v0.5.0");
        assert_eq!(normalize_tag("v0.5.0"), "v0.5.0");
    }

    #[test]
    fn compatibility_is_major_minor() {
        assert!(compatible_tag("v0.5.3", "0.5.0"));
        assert!(compatible_tag("0.5", "0.5.2"));
        assert!(!compatible_tag("v0.4.9", "0.5.0"));
        assert!(!compatible_tag("v1.5.0", "0.5.0"));
    }

    #[test]
    fn release_listing_parses() {
        let body = r#"{
            "tag_name": "v0.5.1",
            "name": "ignored",
            "assets": [
                {"name": "notes.txt", "browser_download_url": "https://x/notes.txt", "size": 10},
                {
                    "name": "ldb.bmir.zst",
                    "browser_download_url": "https://x/ldb.bmir.zst",
                    "size": 2048
                }
            ]
        }"#;
        let release: ReleaseInfo = serde_json::from_str(body).unwrap();
        assert_eq!(release.asset("ldb.bmir.zst").unwrap().size, 2048);
        assert!(release.asset("ldb.pkl.zst").is_none());
        assert_eq!(release.asset_names(), vec!["notes.txt", "ldb.bmir.zst"]);

        let bare: ReleaseInfo = serde_json::from_str(r#"{"tag_name": "v0.3.0"}"#).unwrap();
        assert!(bare.assets.is_empty());
    }

    #[test]
    fn metadata_round_trips_and_tolerates_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meta/ldb.json");
        let meta = InstalledMetadata::now("v0.5.1", "https://x/ldb.bmir.zst", 2048);
        meta.save(&path).unwrap();
        assert_eq!(InstalledMetadata::load(&path), Some(meta.clone()));
        assert!(chrono::DateTime::parse_from_rfc3339(&meta.downloaded_at).is_ok());

        fs_err::write(&path, "{not json").unwrap();
        assert!(InstalledMetadata::load(&path).is_none());
        assert!(InstalledMetadata::load(&dir.path().join("absent.json")).is_none());
    }
}
