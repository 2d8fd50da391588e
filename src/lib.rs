/// This crate is an online tab clustering engine.
/// It keeps incremental corpus statistics over short documents (one per browser
/// tab) and partitions them into named groups of related tabs.
pub mod cluster;
pub mod config;
pub mod engine;
pub mod error;
pub mod features;
pub mod namer;
pub mod vectorizer;

/// Grouping Engine
/// The top-level struct of this crate, providing the host-facing API.
///
/// Internally, it holds:
/// - The term normalizer
/// - The TF-IDF corpus statistics store
/// - The BM25 store
/// - The per-document keyphrase table
/// - A pairwise similarity memo per algorithm
///
/// Documents are indexed into every store at once, so the grouping algorithm
/// can be switched per run.
///
/// # Serialization
/// Via `EngineSnapshot` (`dump` / `load`), encoded as CBOR.
pub use engine::{BatchReport, GroupingEngine, GroupingOutcome, TabGroup};

/// Engine snapshot
/// Serializable state of a `GroupingEngine`: normalizer settings, TF-IDF and
/// BM25 statistics, keyphrases.
/// The similarity memo is not part of it.
pub use vectorizer::snapshot::EngineSnapshot;

/// User settings
/// Similarity threshold, algorithm, BM25 shape parameters, label length and
/// the host's grouping interval.
pub use config::{Bm25Params, Configuration, GroupingAlgorithm};

/// Errors
/// Every fallible operation of this crate returns `Result<T, ClusterError>`.
pub use error::{ClusterError, Result};

/// Term Normalizer and Term Frequency
/// `Normalizer` turns raw text into lower-cased terms, `TermFrequency` counts
/// them within one document.
pub use vectorizer::term::{Normalizer, TermFrequency};

/// Corpus Statistics Store
/// Per-document term frequencies, smoothed IDF and TF-IDF weights, kept
/// consistent after every mutation.
pub use vectorizer::corpus::CorpusStore;

/// BM25 Store
/// Saturated term weights with document length normalization.
pub use vectorizer::bm25::Bm25Store;

/// Keyphrase extraction (RAKE) and the per-document phrase table
pub use vectorizer::keyphrase::{extract_keyphrases, KeyphraseStore};

/// Similarity functions and the pairwise memo
/// - cosine similarity over sparse weight maps
/// - Jaccard similarity over sets
pub use vectorizer::compare::{cosine_similarity, jaccard_similarity, Similarity, SimilarityCache};

/// Clustering algorithms over index-based similarity callbacks
pub use cluster::{greedy_cluster, hac_cluster};

/// Group labels
pub use namer::name_cluster;

/// Browser tab input
pub use features::{extract_features, is_groupable, Tab};
