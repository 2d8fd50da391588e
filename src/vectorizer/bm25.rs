use std::borrow::Cow;

use indexmap::{IndexMap, IndexSet};
use rayon::prelude::*;
use tracing::debug;

use crate::config::Bm25Params;
use crate::error::{ClusterError, Result};
use crate::vectorizer::snapshot::Bm25Snapshot;
use crate::vectorizer::term::TermFrequency;
use crate::vectorizer::TermVector;

/// BM25 Weighting Engine
///
/// Keeps its own state next to the TF-IDF store: raw term counts and length
/// per document, a vocabulary and a BM25 IDF table.
///
/// idf(t) = ln((N - df(t) + 0.5) / (df(t) + 0.5) + 1)
///
/// score(t, d) = idf(t) * tf * (k1 + 1) / (tf + k1 * (1 - b + b * |d| / avgdl))
///
/// Like the TF-IDF store, any mutation re-weights every document.
/// An empty corpus has no weights.
#[derive(Debug, Clone, Default)]
pub struct Bm25Store {
    params: Bm25Params,
    documents: IndexMap<String, TermFrequency>,
    vocabulary: IndexSet<String>,
    idf: IndexMap<String, f64>,
    weights: IndexMap<String, TermVector>,
}

impl Bm25Store {
    pub fn new(params: Bm25Params) -> Result<Self> {
        params.validate()?;
        Ok(Self { params, ..Self::default() })
    }

    pub fn params(&self) -> Bm25Params {
        self.params
    }

    /// Change k1 / b and re-weight every document.
    pub fn set_params(&mut self, params: Bm25Params) -> Result<()> {
        params.validate()?;
        if params != self.params {
            self.params = params;
            self.rescore();
        }
        Ok(())
    }

    pub fn upsert(&mut self, doc_id: &str, freq: &TermFrequency) -> Result<()> {
        self.stage(doc_id, freq)?;
        self.refresh();
        Ok(())
    }

    /// Returns `false` for an unknown id. Vocabulary is kept.
    pub fn remove(&mut self, doc_id: &str) -> bool {
        if self.documents.shift_remove(doc_id).is_none() {
            return false;
        }
        self.refresh();
        true
    }

    pub fn clear(&mut self) {
        self.documents.clear();
        self.vocabulary.clear();
        self.idf.clear();
        self.weights.clear();
    }

    pub(crate) fn stage(&mut self, doc_id: &str, freq: &TermFrequency) -> Result<()> {
        if freq.is_empty() {
            return Err(ClusterError::invalid(format!("document {doc_id} has no terms")));
        }
        for (term, _) in freq.iter() {
            if !self.vocabulary.contains(term) {
                self.vocabulary.insert(term.to_string());
            }
        }
        self.documents.insert(doc_id.to_string(), freq.clone());
        Ok(())
    }

    pub(crate) fn refresh(&mut self) {
        let doc_num = self.documents.len() as f64;
        let idf: IndexMap<String, f64> = self
            .vocabulary
            .iter()
            .map(|term| {
                let df = self.documents.values().filter(|d| d.contains_term(term)).count() as f64;
                // no clamping
                (term.clone(), ((doc_num - df + 0.5) / (df + 0.5) + 1.0).ln())
            })
            .collect();
        self.idf = idf;
        self.rescore();
        debug!(
            documents = self.documents.len(),
            vocabulary = self.vocabulary.len(),
            "bm25 corpus refreshed"
        );
    }

    fn rescore(&mut self) {
        self.weights = match self.avg_doc_len() {
            Ok(avg_len) => {
                let scored: Vec<(String, TermVector)> = self
                    .documents
                    .par_iter()
                    .map(|(doc_id, freq)| (doc_id.clone(), self.score(freq, self.params, avg_len)))
                    .collect();
                scored.into_iter().collect()
            }
            Err(_) => IndexMap::new(),
        };
    }

    /// BM25 weight of every term in one document
    fn score(&self, freq: &TermFrequency, params: Bm25Params, avg_len: f64) -> TermVector {
        let Bm25Params { k1, b } = params;
        let len_p = freq.term_sum() as f64 / avg_len;
        let norm = 1.0 - b + b * len_p;
        freq.iter()
            .map(|(term, count)| {
                let tf = count as f64;
                let idf = self.idf.get(term).copied().unwrap_or(0.0);
                (term.to_string(), idf * (tf * (k1 + 1.0)) / (tf + k1 * norm))
            })
            .collect()
    }

    /// Mean document length over indexed documents.
    pub fn avg_doc_len(&self) -> Result<f64> {
        if self.documents.is_empty() {
            return Err(ClusterError::EmptyCorpus);
        }
        let total: u64 = self.documents.values().map(TermFrequency::term_sum).sum();
        Ok(total as f64 / self.documents.len() as f64)
    }

    /// Weight vector computed with the store's own parameters
    pub fn weights(&self, doc_id: &str) -> Option<&TermVector> {
        self.weights.get(doc_id)
    }

    /// Weight vector for arbitrary parameters.
    /// Borrows the cached vector when `params` match the store's; never mutates.
    pub fn weights_with(&self, doc_id: &str, params: Bm25Params) -> Option<Cow<'_, TermVector>> {
        if params == self.params {
            return self.weights(doc_id).map(Cow::Borrowed);
        }
        let freq = self.documents.get(doc_id)?;
        let avg_len = self.avg_doc_len().ok()?;
        Some(Cow::Owned(self.score(freq, params, avg_len)))
    }

    pub fn idf(&self, term: &str) -> Option<f64> {
        self.idf.get(term).copied()
    }

    pub fn vocabulary(&self) -> &IndexSet<String> {
        &self.vocabulary
    }

    pub fn contains_doc(&self, doc_id: &str) -> bool {
        self.documents.contains_key(doc_id)
    }

    pub fn doc_num(&self) -> usize {
        self.documents.len()
    }

    pub fn dump(&self) -> Bm25Snapshot {
        Bm25Snapshot {
            params: self.params,
            documents: self.documents.clone(),
            vocabulary: self.vocabulary.clone(),
            idf: self.idf.clone(),
        }
    }

    pub fn load(snapshot: Bm25Snapshot) -> Result<Self> {
        snapshot.params.validate()?;
        for (doc_id, freq) in &snapshot.documents {
            if let Some((term, _)) = freq.iter().find(|(t, _)| !snapshot.idf.contains_key(*t)) {
                return Err(ClusterError::Snapshot(format!(
                    "document {doc_id} uses term {term:?} missing from the bm25 idf table"
                )));
            }
        }
        let mut store = Self {
            params: snapshot.params,
            documents: snapshot.documents,
            vocabulary: snapshot.vocabulary,
            idf: snapshot.idf,
            weights: IndexMap::new(),
        };
        store.rescore();
        Ok(store)
    }
}
