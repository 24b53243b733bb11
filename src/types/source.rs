//! Records pulled from independent sources, one variant per origin.
//!
//! The deduplicator only needs a linkage text and a rank key from each
//! record; everything else is carried as-is for provenance.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::entity::{AuthorEntity, Publication};
use super::record::PubType;
use crate::constants::UNPUBLISHED_VENUE;

/// Where a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    Hal,
    Dblp,
    /// The local mirror built from the dump.
    Mirror,
}

impl Origin {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hal => "hal",
            Self::Dblp => "dblp",
            Self::Mirror => "ldb",
        }
    }

    /// Accepts the short tags used in author declarations (`hal`, `dblp`, `ldb`).
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "hal" => Some(Self::Hal),
            "dblp" => Some(Self::Dblp),
            "ldb" | "mirror" => Some(Self::Mirror),
            _ => None,
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The three kinds of HAL author identifiers, from most to least stable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HalKey {
    /// Curated `idHal` slug, e.g. `fabien-mathieu`.
    IdHal(String),
    /// Numeric person id.
    Person(u64),
    /// Bare full-name search key.
    FullName(String),
}

impl HalKey {
    /// Digits are a person id, anything with whitespace a full name, the rest an idHal.
    #[must_use]
    pub fn detect(raw: &str) -> Self {
        let raw = raw.trim();
        if let Ok(pid) = raw.parse::<u64>() {
            return Self::Person(pid);
        }
        if raw.contains(char::is_whitespace) {
            Self::FullName(raw.to_string())
        } else {
            Self::IdHal(raw.to_string())
        }
    }
}

impl fmt::Display for HalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IdHal(key) | Self::FullName(key) => f.write_str(key),
            Self::Person(pid) => write!(f, "{pid}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HalAuthor {
    pub name: String,
    pub key: Option<HalKey>,
    #[serde(default)]
    pub aliases: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DblpAuthor {
    pub name: String,
    pub pid: Option<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// An author identity as one source knows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceAuthor {
    Hal(HalAuthor),
    Dblp(DblpAuthor),
    Mirror(Arc<AuthorEntity>),
}

impl SourceAuthor {
    #[must_use]
    pub fn origin(&self) -> Origin {
        match self {
            Self::Hal(_) => Origin::Hal,
            Self::Dblp(_) => Origin::Dblp,
            Self::Mirror(_) => Origin::Mirror,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Hal(author) => &author.name,
            Self::Dblp(author) => &author.name,
            Self::Mirror(author) => author.name(),
        }
    }

    /// Source-specific identifier, if the source assigned one.
    #[must_use]
    pub fn key(&self) -> Option<String> {
        match self {
            Self::Hal(author) => author.key.as_ref().map(ToString::to_string),
            Self::Dblp(author) => author.pid.clone(),
            Self::Mirror(author) => Some(author.key.clone()),
        }
    }

    #[must_use]
    pub fn aliases(&self) -> &[String] {
        match self {
            Self::Hal(author) => &author.aliases,
            Self::Dblp(author) => &author.aliases,
            Self::Mirror(author) => author.other_names(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HalPublication {
    pub key: String,
    pub title: String,
    pub authors: Vec<HalAuthor>,
    pub venue: Option<String>,
    pub kind: PubType,
    pub year: i32,
    pub abstract_text: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DblpPublication {
    pub key: String,
    pub title: String,
    pub authors: Vec<DblpAuthor>,
    pub venue: Option<String>,
    pub kind: PubType,
    pub year: i32,
    pub url: Option<String>,
    pub pages: Option<String>,
}

/// A publication as one source knows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourcePublication {
    Hal(HalPublication),
    Dblp(DblpPublication),
    Mirror(Publication),
}

impl SourcePublication {
    #[must_use]
    pub fn origin(&self) -> Origin {
        match self {
            Self::Hal(_) => Origin::Hal,
            Self::Dblp(_) => Origin::Dblp,
            Self::Mirror(_) => Origin::Mirror,
        }
    }

    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::Hal(p) => &p.key,
            Self::Dblp(p) => &p.key,
            Self::Mirror(p) => &p.key,
        }
    }

    #[must_use]
    pub fn title(&self) -> &str {
        match self {
            Self::Hal(p) => &p.title,
            Self::Dblp(p) => &p.title,
            Self::Mirror(p) => &p.title,
        }
    }

    /// Venue, with missing venues reported as `unpublished`.
    #[must_use]
    pub fn venue(&self) -> &str {
        match self {
            Self::Hal(p) => p.venue.as_deref().unwrap_or(UNPUBLISHED_VENUE),
            Self::Dblp(p) => p.venue.as_deref().unwrap_or(UNPUBLISHED_VENUE),
            Self::Mirror(p) => &p.venue,
        }
    }

    #[must_use]
    pub fn kind(&self) -> PubType {
        match self {
            Self::Hal(p) => p.kind,
            Self::Dblp(p) => p.kind,
            Self::Mirror(p) => p.kind,
        }
    }

    #[must_use]
    pub fn year(&self) -> i32 {
        match self {
            Self::Hal(p) => p.year,
            Self::Dblp(p) => p.year,
            Self::Mirror(p) => p.year,
        }
    }

    #[must_use]
    pub fn abstract_text(&self) -> Option<&str> {
        match self {
            Self::Hal(p) => p.abstract_text.as_deref().filter(|text| !text.is_empty()),
            Self::Dblp(_) | Self::Mirror(_) => None,
        }
    }

    #[must_use]
    pub fn authors(&self) -> Vec<SourceAuthor> {
        match self {
            Self::Hal(p) => p.authors.iter().cloned().map(SourceAuthor::Hal).collect(),
            Self::Dblp(p) => p.authors.iter().cloned().map(SourceAuthor::Dblp).collect(),
            Self::Mirror(p) => p.authors.iter().cloned().map(SourceAuthor::Mirror).collect(),
        }
    }
}
