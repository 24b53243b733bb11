//! Fuzzy author-name search.
//!
//! Matches are kept when they beat both an absolute floor (`cutoff`) and the
//! best score minus `slack`: a rare name whose best match scores low still
//! resolves, and a weak best match does not drag in worse ones.

mod name_index;

pub use name_index::NameIndex;

use crate::types::AuthorId;

/// A corpus hit resolved to its owning author.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NameHit {
    pub author: AuthorId,
    pub score: f64,
}

/// Keep hits scoring strictly above `max(cutoff, top - slack)`, one per author.
///
/// `hits` must already be sorted by descending score; order is preserved.
#[must_use]
pub fn select_matches(hits: &[NameHit], cutoff: f64, slack: f64) -> Vec<AuthorId> {
    let Some(top) = hits.first() else {
        return Vec::new();
    };
    let target = cutoff.max(top.score - slack);
    let mut selected: Vec<AuthorId> = Vec::new();
    for hit in hits.iter().filter(|hit| hit.score > target) {
        if !selected.contains(&hit.author) {
            selected.push(hit.author);
        }
    }
    selected
}
