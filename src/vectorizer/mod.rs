pub mod bm25;
pub mod compare;
pub mod corpus;
pub mod keyphrase;
pub mod snapshot;
pub mod stopwords;
pub mod term;

use indexmap::IndexMap;

/// Sparse weight vector: term -> weight.
/// Terms absent from the map have weight 0.
pub type TermVector = IndexMap<String, f64>;
