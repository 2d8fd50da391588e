use indexmap::{IndexMap, IndexSet};
use rayon::prelude::*;
use tracing::debug;

use crate::error::{ClusterError, Result};
use crate::vectorizer::snapshot::CorpusSnapshot;
use crate::vectorizer::term::TermFrequency;
use crate::vectorizer::TermVector;

/// Corpus Statistics Store for TF-IDF weighting.
///
/// Holds, per document, the length-normalized term frequencies, the global
/// vocabulary and the smoothed IDF table, plus the TF-IDF weight vector of
/// every document derived from them.
///
/// Every mutation rebuilds IDF for the whole vocabulary and re-weights every
/// document, so reads always see vectors consistent with the current
/// document set.
///
/// # Vocabulary
/// The vocabulary only grows. Removing a document leaves its terms in the
/// vocabulary and in the IDF table (with a document count of zero) until
/// [`CorpusStore::clear`] is called.
#[derive(Debug, Clone, Default)]
pub struct CorpusStore {
    /// doc_id -> term -> count / doc length
    documents: IndexMap<String, TermVector>,
    vocabulary: IndexSet<String>,
    idf: IndexMap<String, f64>,
    /// doc_id -> term -> tf * idf
    weights: IndexMap<String, TermVector>,
}

impl CorpusStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ---------------------------------------------------------------------------------------------
    // 更新
    // ---------------------------------------------------------------------------------------------

    /// Insert or overwrite a document, then refresh IDF and all weights.
    pub fn upsert(&mut self, doc_id: &str, freq: &TermFrequency) -> Result<()> {
        self.stage(doc_id, freq)?;
        self.refresh();
        Ok(())
    }

    /// Remove a document and refresh. Returns `false` for an unknown id.
    /// The vocabulary is left untouched.
    pub fn remove(&mut self, doc_id: &str) -> bool {
        if self.documents.shift_remove(doc_id).is_none() {
            return false;
        }
        self.refresh();
        true
    }

    /// Drop every document and the vocabulary.
    pub fn clear(&mut self) {
        self.documents.clear();
        self.vocabulary.clear();
        self.idf.clear();
        self.weights.clear();
    }

    /// Store a document's term frequencies without refreshing.
    /// Callers must call [`CorpusStore::refresh`] before reading weights.
    pub(crate) fn stage(&mut self, doc_id: &str, freq: &TermFrequency) -> Result<()> {
        if freq.is_empty() {
            return Err(ClusterError::invalid(format!("document {doc_id} has no terms")));
        }
        for (term, _) in freq.iter() {
            if !self.vocabulary.contains(term) {
                self.vocabulary.insert(term.to_string());
            }
        }
        self.documents.insert(doc_id.to_string(), freq.tf_map());
        Ok(())
    }

    /// Rebuild the IDF table over the whole vocabulary, then re-weight every document.
    ///
    /// idf(t) = ln((N + 1) / (df(t) + 1)) + 1
    pub(crate) fn refresh(&mut self) {
        let doc_num = self.documents.len() as f64;
        let mut doc_counts: IndexMap<&str, u64> =
            self.vocabulary.iter().map(|t| (t.as_str(), 0)).collect();
        for tf in self.documents.values() {
            for term in tf.keys() {
                if let Some(count) = doc_counts.get_mut(term.as_str()) {
                    *count += 1;
                }
            }
        }
        let idf: IndexMap<String, f64> = doc_counts
            .into_iter()
            .map(|(term, df)| (term.to_string(), ((doc_num + 1.0) / (df as f64 + 1.0)).ln() + 1.0))
            .collect();
        self.idf = idf;
        self.reweight();
        debug!(
            documents = self.documents.len(),
            vocabulary = self.vocabulary.len(),
            "tf-idf corpus refreshed"
        );
    }

    /// tf * idf for every document, from the current IDF table
    fn reweight(&mut self) {
        let idf = &self.idf;
        let weights: Vec<(String, TermVector)> = self
            .documents
            .par_iter()
            .map(|(doc_id, tf)| {
                let vec = tf
                    .iter()
                    .map(|(term, &f)| (term.clone(), f * idf.get(term).copied().unwrap_or(0.0)))
                    .collect();
                (doc_id.clone(), vec)
            })
            .collect();
        self.weights = weights.into_iter().collect();
    }

    // ---------------------------------------------------------------------------------------------
    // 参照
    // ---------------------------------------------------------------------------------------------

    /// TF-IDF weight vector of a document
    pub fn weights(&self, doc_id: &str) -> Option<&TermVector> {
        self.weights.get(doc_id)
    }

    /// Length-normalized term frequencies of a document
    pub fn term_frequencies(&self, doc_id: &str) -> Option<&TermVector> {
        self.documents.get(doc_id)
    }

    pub fn idf(&self, term: &str) -> Option<f64> {
        self.idf.get(term).copied()
    }

    pub fn idf_table(&self) -> &IndexMap<String, f64> {
        &self.idf
    }

    pub fn vocabulary(&self) -> &IndexSet<String> {
        &self.vocabulary
    }

    /// Number of documents containing `term`
    pub fn doc_count(&self, term: &str) -> usize {
        self.documents.values().filter(|tf| tf.contains_key(term)).count()
    }

    pub fn contains_doc(&self, doc_id: &str) -> bool {
        self.documents.contains_key(doc_id)
    }

    pub fn doc_num(&self) -> usize {
        self.documents.len()
    }

    pub fn doc_ids(&self) -> impl Iterator<Item = &str> {
        self.documents.keys().map(String::as_str)
    }

    // ---------------------------------------------------------------------------------------------
    // snapshot
    // ---------------------------------------------------------------------------------------------

    pub fn dump(&self) -> CorpusSnapshot {
        CorpusSnapshot {
            documents: self.documents.clone(),
            vocabulary: self.vocabulary.clone(),
            idf: self.idf.clone(),
        }
    }

    /// Rebuild a store from a snapshot.
    /// The stored IDF table is used as-is; weights are derived from it.
    pub fn load(snapshot: CorpusSnapshot) -> Result<Self> {
        for (doc_id, tf) in &snapshot.documents {
            if let Some(term) = tf.keys().find(|t| !snapshot.idf.contains_key(*t)) {
                return Err(ClusterError::Snapshot(format!(
                    "document {doc_id} uses term {term:?} missing from the idf table"
                )));
            }
        }
        let mut store = Self {
            documents: snapshot.documents,
            vocabulary: snapshot.vocabulary,
            idf: snapshot.idf,
            weights: IndexMap::new(),
        };
        for term in store.idf.keys() {
            if !store.vocabulary.contains(term) {
                store.vocabulary.insert(term.clone());
            }
        }
        store.reweight();
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vectorizer::term::Normalizer;

    fn freq(text: &str) -> TermFrequency {
        Normalizer::default().term_frequency(text)
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn upsert_builds_smoothed_idf() {
        let mut store = CorpusStore::new();
        store.upsert("1", &freq("rust book rust")).unwrap();
        store.upsert("2", &freq("rust tabs")).unwrap();

        // rust: in both documents
        assert!(close(store.idf("rust").unwrap(), (3.0_f64 / 3.0).ln() + 1.0));
        // tabs: in one
        assert!(close(store.idf("tabs").unwrap(), (3.0_f64 / 2.0).ln() + 1.0));
        assert_eq!(store.doc_num(), 2);
        assert_eq!(store.doc_count("rust"), 2);
    }

    #[test]
    fn weights_are_tf_times_current_idf_for_every_document() {
        let mut store = CorpusStore::new();
        store.upsert("1", &freq("rust book rust")).unwrap();
        let before = store.weights("1").unwrap()["book"];
        store.upsert("2", &freq("news club")).unwrap();
        let after = store.weights("1").unwrap()["book"];

        // document 1 was re-weighted against the new idf, not compounded
        let expected = (1.0 / 3.0) * store.idf("book").unwrap();
        assert!(close(before, 1.0 / 3.0));
        assert!(close(after, expected));
        assert!(after > before);
        assert!(close(store.weights("1").unwrap()["rust"], (2.0 / 3.0) * store.idf("rust").unwrap()));
    }

    #[test]
    fn reindexing_overwrites_document() {
        let mut store = CorpusStore::new();
        store.upsert("1", &freq("rust book")).unwrap();
        store.upsert("1", &freq("news today")).unwrap();
        assert_eq!(store.doc_num(), 1);
        let weights = store.weights("1").unwrap();
        assert!(weights.contains_key("news"));
        assert!(!weights.contains_key("rust"));
    }

    #[test]
    fn empty_document_is_rejected() {
        let mut store = CorpusStore::new();
        let err = store.upsert("1", &TermFrequency::new()).unwrap_err();
        assert!(matches!(err, ClusterError::InvalidInput(_)));
        assert_eq!(store.doc_num(), 0);
    }

    #[test]
    fn remove_keeps_stale_vocabulary() {
        let mut store = CorpusStore::new();
        store.upsert("1", &freq("rust book")).unwrap();
        store.upsert("2", &freq("news today")).unwrap();
        assert!(store.remove("1"));
        assert!(!store.remove("1"));

        // stale terms stay and get the zero-document idf
        assert!(store.vocabulary().contains("rust"));
        assert!(close(store.idf("rust").unwrap(), 2.0_f64.ln() + 1.0));
        assert!(store.weights("1").is_none());
    }

    #[test]
    fn idf_is_positive() {
        let mut store = CorpusStore::new();
        for (i, text) in ["rust book", "rust tabs", "rust news", "rust"].iter().enumerate() {
            store.upsert(&i.to_string(), &freq(text)).unwrap();
        }
        assert!(store.idf_table().values().all(|&v| v > 0.0));
    }

    #[test]
    fn snapshot_round_trip_reproduces_weights() {
        let mut store = CorpusStore::new();
        store.upsert("1", &freq("rust book rust")).unwrap();
        store.upsert("2", &freq("rust tabs")).unwrap();
        store.remove("2");

        let json = serde_json::to_string(&store.dump()).unwrap();
        let loaded = CorpusStore::load(serde_json::from_str(&json).unwrap()).unwrap();
        assert_eq!(loaded.weights("1"), store.weights("1"));
        assert_eq!(loaded.idf_table(), store.idf_table());
        assert_eq!(loaded.vocabulary(), store.vocabulary());
    }

    #[test]
    fn inconsistent_snapshot_is_rejected() {
        let mut store = CorpusStore::new();
        store.upsert("1", &freq("rust book")).unwrap();
        let mut snapshot = store.dump();
        snapshot.idf.shift_remove("book");
        assert!(matches!(CorpusStore::load(snapshot), Err(ClusterError::Snapshot(_))));
    }
}
