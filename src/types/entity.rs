//! Dense author/publication entities held by the mirror.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::record::PubType;
use crate::constants::UNPUBLISHED_VENUE;

/// Dense author identifier, contiguous from 0 in first-sighting order.
pub type AuthorId = u32;
/// Position of a publication in the publication store.
pub type PublicationId = u32;

/// An author as stored in the author frame store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorEntity {
    pub id: AuthorId,
    /// External identifier first seen for this id (a dblp pid).
    pub key: String,
    /// Every observed spelling, first-seen first. Never empty.
    pub aliases: Vec<String>,
    /// Ascending publication indices.
    pub publications: Vec<PublicationId>,
}

impl AuthorEntity {
    /// Main (first-seen) display name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.aliases.first().map_or("", String::as_str)
    }

    /// Spellings other than the main name.
    #[must_use]
    pub fn other_names(&self) -> &[String] {
        self.aliases.get(1..).unwrap_or(&[])
    }

    #[must_use]
    pub fn url(&self) -> String {
        format!("https://dblp.org/pid/{}.html", self.key)
    }
}

/// A publication as stored in the publication frame store: authors by dense id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicationRecord {
    pub key: String,
    pub title: String,
    pub kind: PubType,
    pub authors: Vec<AuthorId>,
    pub url: Option<String>,
    pub streams: Option<Vec<String>>,
    pub pages: Option<String>,
    pub venue: Option<String>,
    pub year: i32,
}

/// Optional bibliographic extras carried by a hydrated publication.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicationMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub streams: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<String>,
}

/// A publication with its authors inlined, as returned by the query surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Publication {
    pub key: String,
    pub title: String,
    pub kind: PubType,
    pub authors: Vec<Arc<AuthorEntity>>,
    pub venue: String,
    pub year: i32,
    pub metadata: PublicationMetadata,
}

impl Publication {
    pub(crate) fn hydrate(record: &PublicationRecord, authors: Vec<Arc<AuthorEntity>>) -> Self {
        Self {
            key: record.key.clone(),
            title: record.title.clone(),
            kind: record.kind,
            authors,
            venue: record
                .venue
                .clone()
                .unwrap_or_else(|| UNPUBLISHED_VENUE.to_string()),
            year: record.year,
            metadata: PublicationMetadata {
                url: record.url.clone(),
                streams: record.streams.clone(),
                pages: record.pages.clone(),
            },
        }
    }

    /// Primary document page, or the dblp record page when none was given.
    #[must_use]
    pub fn record_url(&self) -> String {
        self.metadata
            .url
            .clone()
            .unwrap_or_else(|| format!("https://dblp.org/rec/{}.html", self.key))
    }

    #[must_use]
    pub fn stream_url(&self) -> Option<String> {
        self.metadata
            .streams
            .as_ref()
            .and_then(|streams| streams.first())
            .map(|stream| format!("https://dblp.org/streams/{stream}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(venue: Option<&str>) -> PublicationRecord {
        PublicationRecord {
            key: "conf/sss/Mathieu07".into(),
            title: "Upper Bounds for Stabilization in Acyclic Preference-Based Systems.".into(),
            kind: PubType::Conference,
            authors: vec![0],
            url: None,
            streams: Some(vec!["conf/sss".into()]),
            pages: Some("372-382".into()),
            venue: venue.map(str::to_string),
            year: 2007,
        }
    }

    #[test]
    fn hydration_fills_missing_venue_and_links() {
        let author = Arc::new(AuthorEntity {
            id: 0,
            key: "66/2077".into(),
            aliases: vec!["Fabien Mathieu".into()],
            publications: vec![0],
        });
        let publication = Publication::hydrate(&record(None), vec![author.clone()]);
        assert_eq!(publication.venue, UNPUBLISHED_VENUE);
        assert_eq!(publication.authors[0].name(), "Fabien Mathieu");
        assert!(author.other_names().is_empty());
        assert_eq!(
            publication.record_url(),
            "https://dblp.org/rec/conf/sss/Mathieu07.html"
        );
        assert_eq!(
            publication.stream_url().as_deref(),
            Some("https://dblp.org/streams/conf/sss")
        );

        let named = Publication::hydrate(&record(Some("SSS")), vec![author]);
        assert_eq!(named.venue, "SSS");
    }
}
