use std::collections::{HashMap, HashSet};
use std::hash::{BuildHasher, Hash};

use indexmap::IndexMap;
use num::Num;

#[inline]
fn as_f64<N: Into<f64>>(v: N) -> f64 {
    v.into()
}

/// コサイン類似度
/// cos(θ) = Σ(a_i * b_i) / (||a|| * ||b||)
///
/// Terms missing from one side count as 0. Returns exactly 0 when either norm
/// is 0. The result does not depend on argument order: the dot product is
/// summed in key order.
pub fn cosine_similarity<N, S>(a: &IndexMap<String, N, S>, b: &IndexMap<String, N, S>) -> f64
where
    N: Num + Copy + Into<f64>,
    S: BuildHasher,
{
    let norm_a = a.values().map(|&v| as_f64(v).powi(2)).sum::<f64>().sqrt();
    let norm_b = b.values().map(|&v| as_f64(v).powi(2)).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    // iterate the smaller side, then fix the summation order
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let mut products: Vec<(&str, f64)> = small
        .iter()
        .filter_map(|(term, &v)| large.get(term).map(|&w| (term.as_str(), as_f64(v) * as_f64(w))))
        .collect();
    products.sort_unstable_by(|x, y| x.0.cmp(y.0));
    let dot = products.iter().map(|(_, p)| p).sum::<f64>();
    (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
}

/// Jaccard 係数
/// |A ∩ B| / |A ∪ B|
///
/// Two empty sets give 0.
pub fn jaccard_similarity<T, S>(a: &HashSet<T, S>, b: &HashSet<T, S>) -> f64
where
    T: Eq + Hash,
    S: BuildHasher,
{
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let intersection = small.iter().filter(|x| large.contains(*x)).count();
    let union = a.len() + b.len() - intersection;
    if union == 0 {
        return 0.0;
    }
    intersection as f64 / union as f64
}

/// A per-document representation the clustering engine can compare.
pub trait Similarity {
    /// pairwise similarity, symmetric
    fn similarity(&self, other: &Self) -> f64;

    /// Ordering key for greedy clustering: richer documents seed first.
    fn richness(&self) -> f64;
}

impl<N, S> Similarity for IndexMap<String, N, S>
where
    N: Num + Copy + Into<f64>,
    S: BuildHasher,
{
    fn similarity(&self, other: &Self) -> f64 {
        cosine_similarity(self, other)
    }

    /// sum of weights
    fn richness(&self) -> f64 {
        self.values().map(|&v| as_f64(v)).sum()
    }
}

impl<S> Similarity for HashSet<String, S>
where
    S: BuildHasher,
{
    fn similarity(&self, other: &Self) -> f64 {
        jaccard_similarity(self, other)
    }

    /// number of phrases
    fn richness(&self) -> f64 {
        self.len() as f64
    }
}

/// Unordered pair of document ids.
/// `PairKey::new(a, b) == PairKey::new(b, a)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PairKey(Box<str>, Box<str>);

impl PairKey {
    pub fn new(a: &str, b: &str) -> Self {
        if a <= b {
            PairKey(a.into(), b.into())
        } else {
            PairKey(b.into(), a.into())
        }
    }
}

/// Memo of pairwise similarities keyed by unordered document-id pairs.
///
/// Entries are only valid for the corpus state they were computed from:
/// the owner must call [`SimilarityCache::clear`] on every store mutation.
#[derive(Debug, Default)]
pub struct SimilarityCache {
    entries: HashMap<PairKey, f64>,
    hits: u64,
    misses: u64,
}

impl SimilarityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached value for `(a, b)` or `(b, a)`, computing it with `compute` on a miss.
    pub fn get_or_insert_with<F>(&mut self, a: &str, b: &str, compute: F) -> f64
    where
        F: FnOnce() -> f64,
    {
        if let Some(value) = self.lookup(a, b) {
            return value;
        }
        let value = compute();
        self.insert(a, b, value);
        value
    }

    /// Like [`SimilarityCache::get`], but counts the hit or miss.
    pub fn lookup(&mut self, a: &str, b: &str) -> Option<f64> {
        let value = self.get(a, b);
        match value {
            Some(_) => self.hits += 1,
            None => self.misses += 1,
        }
        value
    }

    pub fn insert(&mut self, a: &str, b: &str, value: f64) {
        self.entries.insert(PairKey::new(a, b), value);
    }

    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        self.entries.get(&PairKey::new(a, b)).copied()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// (hits, misses) since creation
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vector(pairs: &[(&str, f64)]) -> IndexMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn set(items: &[&str]) -> HashSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn cosine_matches_reference_value() {
        let a = vector(&[("a", 1.0), ("b", 2.0), ("c", 3.0)]);
        let b = vector(&[("b", 2.0), ("c", 4.0), ("d", 5.0)]);
        // 16 / (sqrt(14) * sqrt(45))
        assert!((cosine_similarity(&a, &b) - 0.6375).abs() < 1e-4);
        assert_eq!(cosine_similarity(&a, &b), cosine_similarity(&b, &a));
    }

    #[test]
    fn cosine_of_orthogonal_and_identical_vectors() {
        let a = vector(&[("a", 1.0), ("b", 0.0)]);
        let b = vector(&[("a", 0.0), ("b", 1.0)]);
        assert_eq!(cosine_similarity(&a, &b), 0.0);

        let v = vector(&[("a", 1.0), ("b", 2.0), ("c", 3.0)]);
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn cosine_with_zero_vector_is_zero() {
        let zero = vector(&[("a", 0.0)]);
        let empty = vector(&[]);
        let v = vector(&[("a", 1.0)]);
        assert_eq!(cosine_similarity(&zero, &v), 0.0);
        assert_eq!(cosine_similarity(&empty, &v), 0.0);
        assert_eq!(cosine_similarity(&empty, &empty), 0.0);
    }

    #[test]
    fn cosine_accepts_integer_weights() {
        let a: IndexMap<String, u32> = [("x".to_string(), 3u32)].into_iter().collect();
        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn jaccard_reference_values() {
        let a = set(&["a", "b", "c"]);
        let b = set(&["b", "c", "d"]);
        assert_eq!(jaccard_similarity(&a, &b), 0.5);
        assert_eq!(jaccard_similarity(&a, &a), 1.0);
        assert_eq!(jaccard_similarity(&a, &set(&["d", "e", "f"])), 0.0);
        assert_eq!(jaccard_similarity(&set(&[]), &set(&[])), 0.0);
    }

    #[test]
    fn richness_is_weight_sum_or_phrase_count() {
        assert_eq!(vector(&[("a", 1.5), ("b", 2.0)]).richness(), 3.5);
        assert_eq!(set(&["x y", "z"]).richness(), 2.0);
    }

    #[test]
    fn cache_normalizes_pair_order() {
        let mut cache = SimilarityCache::new();
        let first = cache.get_or_insert_with("b", "a", || 0.25);
        let second = cache.get_or_insert_with("a", "b", || panic!("should be cached"));
        assert_eq!(first, second);
        assert_eq!(cache.get("a", "b"), Some(0.25));
        assert_eq!(cache.stats(), (1, 1));
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.get("b", "a"), None);
    }
}
