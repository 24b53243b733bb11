//! Prebuilt artifacts from the release channel.

use std::fmt;
use std::path::PathBuf;

use crate::error::{MirrorError, Result};
use crate::io::release::{InstalledMetadata, compatible_tag, download, fetch_release, normalize_tag};

use super::Mirror;

/// The installed release, as recorded next to the artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbInfo {
    pub tag: String,
    pub downloaded_at: String,
    pub size: u64,
    pub path: PathBuf,
}

/// A newer compatible release than the installed one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateNotice {
    /// `None` when nothing was ever retrieved.
    pub current: Option<String>,
    pub latest: String,
}

impl fmt::Display for UpdateNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Update available: {} -> {}",
            self.current.as_deref().unwrap_or("not installed"),
            self.latest
        )
    }
}

impl Mirror {
    /// Download a prebuilt artifact and load it with a freshly built name index.
    ///
    /// Without `version`, the latest release is used and must share
    /// `major.minor` with this crate. Returns the installed tag, or `None` when
    /// that tag was already installed and `force` is off.
    pub fn retrieve(
        &self,
        version: Option<&str>,
        force: bool,
        progress: &mut dyn FnMut(u64, Option<u64>),
    ) -> Result<Option<String>> {
        let io = &self.options.io;
        let tag = version.map(normalize_tag);
        tracing::info!(tag = tag.as_deref().unwrap_or("latest"), "fetching release info");
        let release = fetch_release(&io.release_api, tag.as_deref())?;

        if tag.is_none() && !compatible_tag(&release.tag_name, crate::BIBMIRROR_CORE_VERSION) {
            return Err(MirrorError::Release {
                reason: format!(
                    "release {} is incompatible with bibmirror-core {}; pass a version",
                    release.tag_name,
                    crate::BIBMIRROR_CORE_VERSION
                ),
            });
        }

        if !force
            && io.destination.exists()
            && InstalledMetadata::load(&io.metadata)
                .is_some_and(|meta| meta.tag == release.tag_name)
        {
            tracing::info!(tag = %release.tag_name, "release already installed");
            return Ok(None);
        }

        let asset_name = io
            .destination
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let asset = release.asset(&asset_name).ok_or_else(|| MirrorError::Release {
            reason: format!(
                "asset {asset_name:?} not found in release {}; available: {:?}",
                release.tag_name,
                release.asset_names()
            ),
        })?;

        tracing::info!(
            tag = %release.tag_name,
            bytes = asset.size,
            url = %asset.browser_download_url,
            "downloading release"
        );
        download(&asset.browser_download_url, &io.destination, progress)?;
        InstalledMetadata::now(&release.tag_name, &asset.browser_download_url, asset.size)
            .save(&io.metadata)?;

        self.load(true)?;
        tracing::info!(
            tag = %release.tag_name,
            path = %io.destination.display(),
            "release installed"
        );
        Ok(Some(release.tag_name))
    }

    /// `None` when no retrieved release is installed.
    #[must_use]
    pub fn db_info(&self) -> Option<DbInfo> {
        let io = &self.options.io;
        let meta = InstalledMetadata::load(&io.metadata)?;
        if !io.destination.exists() {
            return None;
        }
        Some(DbInfo {
            tag: meta.tag,
            downloaded_at: meta.downloaded_at,
            size: meta.size,
            path: io.destination.clone(),
        })
    }

    /// Newer compatible release, if any. Failures are logged, never raised.
    #[must_use]
    pub fn check_update(&self) -> Option<UpdateNotice> {
        let release = match fetch_release(&self.options.io.release_api, None) {
            Ok(release) => release,
            Err(err) => {
                tracing::warn!(error = %err, "could not check for updates");
                return None;
            }
        };
        if !compatible_tag(&release.tag_name, crate::BIBMIRROR_CORE_VERSION) {
            tracing::info!(
                latest = %release.tag_name,
                "latest release is not compatible with this version"
            );
            return None;
        }
        let current = InstalledMetadata::load(&self.options.io.metadata).map(|meta| meta.tag);
        if current.as_deref() == Some(release.tag_name.as_str()) {
            tracing::info!(tag = %release.tag_name, "mirror is up to date");
            return None;
        }
        Some(UpdateNotice {
            current,
            latest: release.tag_name,
        })
    }
}
