use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::config::Bm25Params;
use crate::error::Result;
use crate::vectorizer::term::{Normalizer, TermFrequency};
use crate::vectorizer::TermVector;

/// TF-IDF store state: per-document term frequencies, vocabulary, IDF
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusSnapshot {
    pub documents: IndexMap<String, TermVector>,
    pub vocabulary: IndexSet<String>,
    pub idf: IndexMap<String, f64>,
}

/// BM25 store state: per-document raw counts, vocabulary, IDF and shape parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bm25Snapshot {
    pub params: Bm25Params,
    pub documents: IndexMap<String, TermFrequency>,
    pub vocabulary: IndexSet<String>,
    pub idf: IndexMap<String, f64>,
}

/// Everything a `GroupingEngine` needs to resume after a restart.
///
/// The layout is private to this crate; hosts should treat it as an opaque
/// blob and store it with [`EngineSnapshot::to_cbor`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub normalizer: Normalizer,
    pub tfidf: CorpusSnapshot,
    pub bm25: Bm25Snapshot,
    pub num_phrases: usize,
    pub keyphrases: IndexMap<String, Vec<String>>,
}

impl EngineSnapshot {
    pub fn to_cbor(&self) -> Result<Vec<u8>> {
        Ok(serde_cbor::to_vec(self)?)
    }

    pub fn from_cbor(bytes: &[u8]) -> Result<Self> {
        Ok(serde_cbor::from_slice(bytes)?)
    }
}
