//! Bag-of-factors string similarity.
//!
//! A string is reduced to the set of its distinct substrings ("factors") of
//! 1 to `n_range` characters. Two sets `A` and `B` score
//!
//! ```text
//! 100 * |A ∩ B| / (min + length_impact * (max - min))
//! ```
//!
//! where `min`/`max` are the smaller and larger set sizes. A string compared
//! with itself always scores 100; `length_impact = 0` measures inclusion of the
//! shorter string, `length_impact = 1` compares against the longer one.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::types::SimilarityParams;

/// Score of identical inputs.
pub const MAX_SCORE: f64 = 100.0;

/// Anything that scores two normalized strings on `[0, MAX_SCORE]`.
pub trait Similarity {
    fn score(&self, left: &str, right: &str) -> f64;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactorSimilarity {
    n_range: usize,
    length_impact: f64,
}

impl FactorSimilarity {
    #[must_use]
    pub fn new(n_range: usize, length_impact: f64) -> Self {
        Self {
            n_range: n_range.max(1),
            length_impact: length_impact.clamp(0.0, 1.0),
        }
    }

    #[must_use]
    pub fn n_range(&self) -> usize {
        self.n_range
    }

    #[must_use]
    pub fn length_impact(&self) -> f64 {
        self.length_impact
    }

    /// Distinct factors of `text`, sorted.
    #[must_use]
    pub fn factors<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let mut bounds: Vec<usize> = text.char_indices().map(|(pos, _)| pos).collect();
        bounds.push(text.len());
        let chars = bounds.len() - 1;
        let mut factors = BTreeSet::new();
        for start in 0..chars {
            for width in 1..=self.n_range.min(chars - start) {
                factors.insert(&text[bounds[start]..bounds[start + width]]);
            }
        }
        factors.into_iter().collect()
    }

    /// Score from two factor-set sizes and the size of their intersection.
    #[must_use]
    pub fn combine(&self, left: usize, right: usize, common: usize) -> f64 {
        let (small, large) = if left <= right {
            (left, right)
        } else {
            (right, left)
        };
        if large == 0 {
            return MAX_SCORE;
        }
        if small == 0 {
            return 0.0;
        }
        let denominator = small as f64 + self.length_impact * (large - small) as f64;
        MAX_SCORE * common as f64 / denominator
    }

    /// All-pairs scores over `texts`, computed through a shared factor vocabulary.
    pub fn pairwise<S: AsRef<str>>(&self, texts: &[S]) -> SimilarityMatrix {
        let size = texts.len();
        let mut vocabulary: HashMap<&str, usize> = HashMap::new();
        let mut postings: Vec<Vec<usize>> = Vec::new();
        let mut sizes = Vec::with_capacity(size);
        let mut documents = Vec::with_capacity(size);
        for (doc, text) in texts.iter().enumerate() {
            let factors = self.factors(text.as_ref());
            sizes.push(factors.len());
            let ids: Vec<usize> = factors
                .into_iter()
                .map(|factor| {
                    let next = vocabulary.len();
                    let id = *vocabulary.entry(factor).or_insert(next);
                    if id == postings.len() {
                        postings.push(Vec::new());
                    }
                    postings[id].push(doc);
                    id
                })
                .collect();
            documents.push(ids);
        }

        let mut scores = vec![0.0; size * size];
        let mut common = vec![0_usize; size];
        for (row, ids) in documents.iter().enumerate() {
            common.iter_mut().for_each(|count| *count = 0);
            for &id in ids {
                for &other in &postings[id] {
                    common[other] += 1;
                }
            }
            for col in 0..size {
                scores[row * size + col] = self.combine(sizes[row], sizes[col], common[col]);
            }
        }
        SimilarityMatrix { size, scores }
    }
}

impl From<SimilarityParams> for FactorSimilarity {
    fn from(params: SimilarityParams) -> Self {
        Self::new(params.n_range, params.length_impact)
    }
}

impl Similarity for FactorSimilarity {
    fn score(&self, left: &str, right: &str) -> f64 {
        let left = self.factors(left);
        let right = self.factors(right);
        let (mut i, mut j, mut common) = (0, 0, 0);
        while i < left.len() && j < right.len() {
            match left[i].cmp(right[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    common += 1;
                    i += 1;
                    j += 1;
                }
            }
        }
        self.combine(left.len(), right.len(), common)
    }
}

/// Dense square matrix of pairwise scores.
#[derive(Debug, Clone)]
pub struct SimilarityMatrix {
    size: usize,
    scores: Vec<f64>,
}

impl SimilarityMatrix {
    #[must_use]
    pub fn len(&self) -> usize {
        self.size
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.scores[row * self.size + col]
    }

    #[must_use]
    pub fn row(&self, row: usize) -> &[f64] {
        &self.scores[row * self.size..(row + 1) * self.size]
    }
}

/// A scored corpus entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub entry: usize,
    pub score: f64,
}

/// Inverted factor index over a fixed corpus, queried for its best matches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactorIndex {
    similarity: FactorSimilarity,
    vocabulary: HashMap<String, u32>,
    postings: Vec<Vec<u32>>,
    sizes: Vec<u32>,
}

impl FactorIndex {
    pub fn fit<I, S>(similarity: FactorSimilarity, corpus: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut vocabulary: HashMap<String, u32> = HashMap::new();
        let mut postings: Vec<Vec<u32>> = Vec::new();
        let mut sizes = Vec::new();
        for (entry, text) in corpus.into_iter().enumerate() {
            let entry = entry as u32;
            let factors = similarity.factors(text.as_ref());
            sizes.push(factors.len() as u32);
            for factor in factors {
                let id = match vocabulary.get(factor) {
                    Some(&id) => id,
                    None => {
                        let id = postings.len() as u32;
                        vocabulary.insert(factor.to_string(), id);
                        postings.push(Vec::new());
                        id
                    }
                };
                postings[id as usize].push(entry);
            }
        }
        postings.iter_mut().for_each(Vec::shrink_to_fit);
        Self {
            similarity,
            vocabulary,
            postings,
            sizes,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    #[must_use]
    pub fn similarity(&self) -> FactorSimilarity {
        self.similarity
    }

    /// Number of distinct factors across the corpus.
    #[must_use]
    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    /// The `limit` best entries for `query`, by descending score then ascending entry.
    ///
    /// Entries sharing no factor with the query are never returned.
    #[must_use]
    pub fn top_k(&self, query: &str, limit: usize) -> Vec<Hit> {
        let factors = self.similarity.factors(query);
        if factors.is_empty() || limit == 0 {
            return Vec::new();
        }
        let mut common: HashMap<u32, usize> = HashMap::new();
        for factor in &factors {
            if let Some(&id) = self.vocabulary.get(*factor) {
                for &entry in &self.postings[id as usize] {
                    *common.entry(entry).or_insert(0) += 1;
                }
            }
        }
        let mut hits: Vec<Hit> = common
            .into_iter()
            .map(|(entry, shared)| Hit {
                entry: entry as usize,
                score: self.similarity.combine(
                    factors.len(),
                    self.sizes[entry as usize] as usize,
                    shared,
                ),
            })
            .collect();
        let order = |a: &Hit, b: &Hit| b.score.total_cmp(&a.score).then(a.entry.cmp(&b.entry));
        if hits.len() > limit {
            hits.select_nth_unstable_by(limit - 1, order);
            hits.truncate(limit);
        }
        hits.sort_by(order);
        hits
    }
}
