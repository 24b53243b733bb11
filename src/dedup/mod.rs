//! Near-duplicate clustering and canonical record selection.
//!
//! Records are swept in input order. The first record not yet clustered opens a
//! cluster made of every remaining record scoring above the threshold against
//! it; this repeats until every record is placed. The result is a partition
//! that depends on input order: a chain A~B~C with A, C dissimilar is grouped
//! differently depending on which of them comes first.

mod identity;
mod rank;

pub use identity::{
    AuthorMetadata, AuthorRedirect, AuthorSpec, LinkedAuthor, LinkedPublication, SourcePin,
    SourcedAuthor, merge_author_sources, redirect_authors,
};
pub use rank::{AuthorRules, Linkable, PublicationRules, ScoringRules};

use std::cmp::Reverse;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_NAME_LENGTH_IMPACT, DEFAULT_NAME_N_RANGE, DEFAULT_SEARCH_CUTOFF,
    DEFAULT_TITLE_LENGTH_IMPACT, DEFAULT_TITLE_N_RANGE, DEFAULT_TITLE_THRESHOLD,
};
use crate::similarity::FactorSimilarity;
use crate::types::{Origin, PubType, SourceAuthor, SourcePublication};

/// Similarity settings and merge threshold for one kind of record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinkageParams {
    pub n_range: usize,
    pub length_impact: f64,
    /// Pairs must score strictly above this to be merged.
    pub threshold: f64,
}

impl LinkageParams {
    #[must_use]
    pub fn publications() -> Self {
        Self {
            n_range: DEFAULT_TITLE_N_RANGE,
            length_impact: DEFAULT_TITLE_LENGTH_IMPACT,
            threshold: DEFAULT_TITLE_THRESHOLD,
        }
    }

    #[must_use]
    pub fn authors() -> Self {
        Self {
            n_range: DEFAULT_NAME_N_RANGE,
            length_impact: DEFAULT_NAME_LENGTH_IMPACT,
            threshold: DEFAULT_SEARCH_CUTOFF,
        }
    }

    #[must_use]
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    fn similarity(&self) -> FactorSimilarity {
        FactorSimilarity::new(self.n_range, self.length_impact)
    }
}

/// One cluster: its records ordered best first.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalRecord<R> {
    members: Vec<R>,
}

impl<R: Linkable> CanonicalRecord<R> {
    /// The best-ranked record, whose fields the cluster reports.
    #[must_use]
    pub fn representative(&self) -> &R {
        &self.members[0]
    }

    /// Every record of the cluster, best first.
    #[must_use]
    pub fn members(&self) -> &[R] {
        &self.members
    }

    #[must_use]
    pub fn into_members(self) -> Vec<R> {
        self.members
    }

    /// Records grouped by the origin that contributed them.
    #[must_use]
    pub fn provenance(&self) -> BTreeMap<Origin, Vec<&R>> {
        let mut provenance: BTreeMap<Origin, Vec<&R>> = BTreeMap::new();
        for member in &self.members {
            provenance.entry(member.origin()).or_default().push(member);
        }
        provenance
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Always false: clusters hold at least their representative.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Publications merged across sources.
pub type CanonicalPublication = CanonicalRecord<SourcePublication>;

impl CanonicalRecord<SourcePublication> {
    #[must_use]
    pub fn key(&self) -> &str {
        self.representative().key()
    }

    #[must_use]
    pub fn title(&self) -> &str {
        self.representative().title()
    }

    #[must_use]
    pub fn venue(&self) -> &str {
        self.representative().venue()
    }

    #[must_use]
    pub fn kind(&self) -> PubType {
        self.representative().kind()
    }

    #[must_use]
    pub fn year(&self) -> i32 {
        self.representative().year()
    }

    #[must_use]
    pub fn authors(&self) -> Vec<SourceAuthor> {
        self.representative().authors()
    }

    /// First non-empty abstract in rank order.
    #[must_use]
    pub fn abstract_text(&self) -> Option<&str> {
        self.members.iter().find_map(SourcePublication::abstract_text)
    }
}

/// Partition `records` into near-duplicate clusters and rank each cluster.
///
/// Clusters come out in the order of their first record. Empty input gives an
/// empty result.
pub fn deduplicate<R, S>(
    records: Vec<R>,
    rules: &S,
    params: &LinkageParams,
) -> Vec<CanonicalRecord<R>>
where
    R: Linkable,
    S: ScoringRules<R>,
{
    if records.is_empty() {
        return Vec::new();
    }
    let texts: Vec<String> = records.iter().map(Linkable::link_text).collect();
    let matrix = params.similarity().pairwise(&texts);
    let mut slots: Vec<Option<R>> = records.into_iter().map(Some).collect();
    let mut clusters = Vec::new();
    for seed in 0..slots.len() {
        if slots[seed].is_none() {
            continue;
        }
        let row = matrix.row(seed);
        let mut members: Vec<R> = Vec::new();
        for (other, slot) in slots.iter_mut().enumerate().skip(seed) {
            if other == seed || row[other] > params.threshold {
                if let Some(record) = slot.take() {
                    members.push(record);
                }
            }
        }
        members.sort_by_cached_key(|record| (Reverse(rules.rank(record)), record.stable_key()));
        clusters.push(CanonicalRecord { members });
    }
    tracing::debug!(clusters = clusters.len(), records = texts.len(), "records deduplicated");
    clusters
}
