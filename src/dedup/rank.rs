//! What the linker needs from a record, and how records of one cluster are ranked.

use crate::constants::UNPUBLISHED_VENUE;
use crate::text::normalize_name;
use crate::types::{HalKey, Origin, PubType, SourceAuthor, SourcePublication};

/// Preprint-only venue, ranked just above unpublished.
const PREPRINT_VENUE: &str = "CoRR";

/// A record the deduplicator can compare and order.
pub trait Linkable {
    /// Text compared across records (a title or a display name).
    fn link_text(&self) -> String;

    fn origin(&self) -> Origin;

    /// Last-resort tie-break making representative choice independent of input order.
    fn stable_key(&self) -> String;
}

impl Linkable for SourcePublication {
    fn link_text(&self) -> String {
        normalize_name(self.title())
    }

    fn origin(&self) -> Origin {
        SourcePublication::origin(self)
    }

    fn stable_key(&self) -> String {
        format!("{}:{}", self.origin(), self.key())
    }
}

impl Linkable for SourceAuthor {
    fn link_text(&self) -> String {
        normalize_name(self.name())
    }

    fn origin(&self) -> Origin {
        SourceAuthor::origin(self)
    }

    fn stable_key(&self) -> String {
        let key = self.key().unwrap_or_else(|| self.name().to_string());
        format!("{}:{key}", self.origin())
    }
}

/// Orders the records of one cluster; the highest rank becomes the representative.
pub trait ScoringRules<R> {
    type Rank: Ord;

    fn rank(&self, record: &R) -> Self::Rank;
}

/// Origin trust, then venue quality, then type, then year.
#[derive(Debug, Clone, Copy, Default)]
pub struct PublicationRules;

impl PublicationRules {
    #[must_use]
    pub fn origin_score(origin: Origin) -> i32 {
        match origin {
            Origin::Hal => 2,
            Origin::Dblp | Origin::Mirror => 1,
        }
    }

    #[must_use]
    pub fn venue_score(venue: &str) -> i32 {
        match venue {
            PREPRINT_VENUE => -1,
            UNPUBLISHED_VENUE => -2,
            _ => 0,
        }
    }

    #[must_use]
    pub fn kind_score(kind: PubType) -> i32 {
        match kind {
            PubType::Journal => 2,
            PubType::Conference => 1,
            _ => 0,
        }
    }
}

impl ScoringRules<SourcePublication> for PublicationRules {
    type Rank = (i32, i32, i32, i32);

    fn rank(&self, record: &SourcePublication) -> Self::Rank {
        (
            Self::origin_score(record.origin()),
            Self::venue_score(record.venue()),
            Self::kind_score(record.kind()),
            record.year(),
        )
    }
}

/// Curated idHal, then numeric HAL person id, then dblp/mirror pids, then bare HAL full names.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthorRules;

impl ScoringRules<SourceAuthor> for AuthorRules {
    type Rank = i32;

    fn rank(&self, record: &SourceAuthor) -> i32 {
        match record {
            SourceAuthor::Hal(author) => match author.key {
                Some(HalKey::IdHal(_)) => 3,
                Some(HalKey::Person(_)) => 2,
                Some(HalKey::FullName(_)) => -1,
                None => 0,
            },
            SourceAuthor::Dblp(_) | SourceAuthor::Mirror(_) => 1,
        }
    }
}
