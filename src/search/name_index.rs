use serde::{Deserialize, Serialize};

use super::{NameHit, select_matches};
use crate::error::Result;
use crate::io::frames::FrameStore;
use crate::similarity::{FactorIndex, FactorSimilarity};
use crate::text::normalize_name;
use crate::types::{AuthorEntity, AuthorId, SearchParams};

/// Fuzzy index over every author's main name and aliases.
///
/// The corpus holds all main names (entry `i` is author `i`) followed by all
/// aliases; `owners` maps every corpus entry back to its author.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NameIndex {
    index: FactorIndex,
    owners: Vec<AuthorId>,
}

impl NameIndex {
    pub fn build(authors: &FrameStore<AuthorEntity>, similarity: FactorSimilarity) -> Result<Self> {
        let mut main_names = Vec::with_capacity(authors.len());
        let mut aliases = Vec::new();
        let mut alias_owners = Vec::new();
        for author in authors.iter() {
            let author = author?;
            main_names.push(normalize_name(author.name()));
            for alias in author.other_names() {
                aliases.push(normalize_name(alias));
                alias_owners.push(author.id);
            }
        }
        let mut owners: Vec<AuthorId> = (0..main_names.len() as AuthorId).collect();
        owners.extend(alias_owners);
        let index = FactorIndex::fit(similarity, main_names.iter().chain(aliases.iter()));
        tracing::info!(
            authors = main_names.len(),
            aliases = aliases.len(),
            factors = index.vocabulary_size(),
            "authors indexed"
        );
        Ok(Self { index, owners })
    }

    /// Number of indexed names, aliases included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    #[must_use]
    pub fn similarity(&self) -> FactorSimilarity {
        self.index.similarity()
    }

    /// Raw top-`limit` corpus hits for `name`, each resolved to its author.
    #[must_use]
    pub fn hits(&self, name: &str, limit: usize) -> Vec<NameHit> {
        self.index
            .top_k(&normalize_name(name), limit)
            .into_iter()
            .map(|hit| NameHit {
                author: self.owners[hit.entry],
                score: hit.score,
            })
            .collect()
    }

    /// Distinct authors plausibly named `name`, best first.
    #[must_use]
    pub fn query(&self, name: &str, params: &SearchParams) -> Vec<AuthorId> {
        let hits = self.hits(name, params.limit);
        select_matches(&hits, params.cutoff, params.slack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(authors: &[(&str, &[&str])]) -> FrameStore<AuthorEntity> {
        FrameStore::build(2, |builder| {
            for (id, (key, aliases)) in authors.iter().enumerate() {
                builder.append(AuthorEntity {
                    id: id as AuthorId,
                    key: (*key).to_string(),
                    aliases: aliases.iter().map(|a| (*a).to_string()).collect(),
                    publications: vec![],
                })?;
            }
            Ok(())
        })
        .unwrap()
    }

    fn params(limit: usize, cutoff: f64, slack: f64) -> SearchParams {
        SearchParams {
            limit,
            cutoff,
            slack,
        }
    }

    #[test]
    fn aliases_resolve_to_their_owner() {
        let authors = store(&[
            ("10/8725", &["Christelle Caillouet", "Christelle Molle"]),
            ("66/2077", &["Fabien Mathieu"]),
            ("m/FdMontgolfier", &["Fabien de Montgolfier"]),
        ]);
        let index = NameIndex::build(&authors, FactorSimilarity::new(2, 0.1)).unwrap();
        assert_eq!(index.len(), 4);
        assert_eq!(index.query("Christelle Molle", &SearchParams::default()), vec![0]);
        assert_eq!(index.query("christelle caillouet", &SearchParams::default()), vec![0]);
        assert_eq!(index.query("Fabien MATHIEU", &SearchParams::default()), vec![1]);
        assert!(index.query("Zyx Wvu", &SearchParams::default()).is_empty());
    }

    #[test]
    fn alias_and_main_name_hits_collapse() {
        let authors = store(&[("a", &["John Smith", "Jon Smith"]), ("b", &["Jane Doe"])]);
        let index = NameIndex::build(&authors, FactorSimilarity::new(2, 0.1)).unwrap();
        let hits = index.hits("John Smith", 3);
        assert_eq!(hits[0].author, 0);
        assert_eq!(hits[1].author, 0);
        assert_eq!(index.query("John Smith", &params(3, 80.0, 10.0)), vec![0]);
    }

    #[test]
    fn slack_admits_close_runners_up() {
        let authors = store(&[("a", &["Fabien Mathieu"]), ("b", &["Fabian Mathieu"])]);
        let index = NameIndex::build(&authors, FactorSimilarity::new(2, 0.1)).unwrap();
        assert_eq!(index.query("Fabien Mathieu", &params(5, 85.0, 1.0)), vec![0]);
        assert_eq!(index.query("Fabien Mathieu", &params(5, 85.0, 5.0)), vec![0, 1]);
        assert_eq!(
            index.query("Fabien Mathieu", &params(5, 85.0, 5.0)),
            index.query("Fabien Mathieu", &params(5, 85.0, 5.0))
        );
    }
}
