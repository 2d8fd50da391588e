use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use indexmap::IndexSet;
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::cluster::{greedy_cluster, hac_cluster, resolve_ids, Cluster};
use crate::config::{Bm25Params, Configuration, GroupingAlgorithm};
use crate::error::{ClusterError, Result};
use crate::features::{extract_features, is_groupable, Tab};
use crate::namer::name_cluster;
use crate::vectorizer::bm25::Bm25Store;
use crate::vectorizer::compare::{Similarity, SimilarityCache};
use crate::vectorizer::corpus::CorpusStore;
use crate::vectorizer::keyphrase::{extract_keyphrases, KeyphraseStore, DEFAULT_NUM_PHRASES};
use crate::vectorizer::snapshot::EngineSnapshot;
use crate::vectorizer::term::{Normalizer, TermFrequency};
use crate::vectorizer::TermVector;

/// Outcome of a batch of `index` calls.
/// A failing document never stops the rest of the batch.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct BatchReport {
    pub indexed: Vec<String>,
    pub failures: Vec<(String, ClusterError)>,
}

/// One group ready to be applied by the host
#[derive(Debug, Clone, PartialEq)]
pub struct TabGroup {
    pub doc_ids: Vec<String>,
    pub name: String,
}

/// Result of [`GroupingEngine::group_tabs`]
#[derive(Debug, Default, Clone, PartialEq)]
pub struct GroupingOutcome {
    pub groups: Vec<TabGroup>,
    /// tabs that could not be turned into documents
    pub failures: Vec<(String, ClusterError)>,
}

/// normalized + extracted representation of one document, built off the store
struct Prepared {
    freq: TermFrequency,
    phrases: Vec<String>,
}

/// Grouping Engine
/// The host-facing facade over the corpus statistics, the weighting engines,
/// the keyphrase table and the clustering algorithms.
///
/// Every indexed document is kept in all three representations (TF-IDF,
/// BM25, keyphrases), so the algorithm can change between runs without
/// re-indexing.
///
/// Mutations (`index_*`, `remove_document`, `apply_settings`, `load`) take
/// `&mut self`; clustering takes `&self` and never changes the stores.
/// The pairwise similarity memo is cleared on every mutation.
#[derive(Debug)]
pub struct GroupingEngine {
    normalizer: Normalizer,
    corpus: CorpusStore,
    bm25: Bm25Store,
    keyphrases: KeyphraseStore,
    cache: Mutex<HashMap<GroupingAlgorithm, SimilarityCache>>,
}

impl Default for GroupingEngine {
    fn default() -> Self {
        Self {
            normalizer: Normalizer::default(),
            corpus: CorpusStore::new(),
            bm25: Bm25Store::default(),
            keyphrases: KeyphraseStore::new(DEFAULT_NUM_PHRASES),
            cache: Mutex::new(HashMap::new()),
        }
    }
}

impl GroupingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine with a custom term normalizer and BM25 parameters.
    pub fn with_settings(normalizer: Normalizer, bm25: Bm25Params) -> Result<Self> {
        Ok(Self {
            normalizer,
            bm25: Bm25Store::new(bm25)?,
            ..Self::default()
        })
    }

    pub fn from_config(config: &Configuration) -> Result<Self> {
        config.validate()?;
        Self::with_settings(Normalizer::default(), config.bm25_params())
    }

    pub fn normalizer(&self) -> Normalizer {
        self.normalizer
    }

    pub fn corpus(&self) -> &CorpusStore {
        &self.corpus
    }

    pub fn bm25(&self) -> &Bm25Store {
        &self.bm25
    }

    pub fn keyphrases(&self) -> &KeyphraseStore {
        &self.keyphrases
    }

    pub fn doc_num(&self) -> usize {
        self.corpus.doc_num()
    }

    // ---------------------------------------------------------------------------------------------
    // 更新
    // ---------------------------------------------------------------------------------------------

    fn prepare(&self, doc_id: &str, raw_text: &str) -> Result<Prepared> {
        let freq = self.normalizer.term_frequency(raw_text);
        if freq.is_empty() {
            return Err(ClusterError::invalid(format!("document {doc_id} has no terms after normalization")));
        }
        let phrases = extract_keyphrases(raw_text, self.keyphrases.num_phrases());
        Ok(Prepared { freq, phrases })
    }

    fn stage(&mut self, doc_id: &str, prepared: Prepared) -> Result<()> {
        self.corpus.stage(doc_id, &prepared.freq)?;
        self.bm25.stage(doc_id, &prepared.freq)?;
        self.keyphrases.insert(doc_id, prepared.phrases);
        Ok(())
    }

    fn refresh(&mut self) {
        self.corpus.refresh();
        self.bm25.refresh();
        self.cache_mut().clear();
    }

    /// Index (or re-index) one document.
    ///
    /// Fails with `InvalidInput` when the text has no terms after
    /// normalization; the store is left unchanged in that case.
    pub fn index_document(&mut self, doc_id: &str, raw_text: &str) -> Result<()> {
        let prepared = self.prepare(doc_id, raw_text)?;
        self.stage(doc_id, prepared)?;
        self.refresh();
        debug!(doc_id, documents = self.doc_num(), "document indexed");
        Ok(())
    }

    /// Index a batch of documents.
    ///
    /// Tokenization and keyphrase extraction run in parallel; store updates
    /// are applied one by one, followed by a single refresh.
    pub fn index_batch<I, K, T>(&mut self, documents: I) -> BatchReport
    where
        I: IntoIterator<Item = (K, T)>,
        K: AsRef<str>,
        T: AsRef<str>,
    {
        let documents: Vec<(K, T)> = documents.into_iter().collect();
        let prepared: Vec<Result<Prepared>> = {
            let this = &*self;
            documents
                .iter()
                .map(|(id, text)| (id.as_ref(), text.as_ref()))
                .collect::<Vec<_>>()
                .into_par_iter()
                .map(|(id, text)| this.prepare(id, text))
                .collect()
        };

        let mut report = BatchReport::default();
        for ((doc_id, _), prepared) in documents.iter().zip(prepared) {
            let doc_id = doc_id.as_ref();
            match prepared.and_then(|p| self.stage(doc_id, p)) {
                Ok(()) => report.indexed.push(doc_id.to_string()),
                Err(err) => {
                    warn!(doc_id, error = %err, "skipping document");
                    report.failures.push((doc_id.to_string(), err));
                }
            }
        }
        if !report.indexed.is_empty() {
            self.refresh();
        }
        debug!(
            indexed = report.indexed.len(),
            failed = report.failures.len(),
            documents = self.doc_num(),
            "batch indexed"
        );
        report
    }

    /// Forget a document. Unknown ids are a no-op (returns `false`).
    pub fn remove_document(&mut self, doc_id: &str) -> bool {
        let removed_tfidf = self.corpus.remove(doc_id);
        let removed_bm25 = self.bm25.remove(doc_id);
        let removed_phrases = self.keyphrases.remove(doc_id);
        let removed = removed_tfidf || removed_bm25 || removed_phrases;
        if removed {
            self.cache_mut().clear();
            debug!(doc_id, documents = self.doc_num(), "document removed");
        }
        removed
    }

    /// Drop all documents and vocabulary.
    pub fn clear(&mut self) {
        self.corpus.clear();
        self.bm25.clear();
        self.keyphrases.clear();
        self.cache_mut().clear();
    }

    /// React to a settings change: validate and push BM25 parameters.
    pub fn apply_settings(&mut self, config: &Configuration) -> Result<()> {
        config.validate()?;
        if self.bm25.params() != config.bm25_params() {
            self.bm25.set_params(config.bm25_params())?;
            self.cache_mut().remove(&GroupingAlgorithm::Bm25);
            debug!(k1 = config.bm25_k1, b = config.bm25_b, "bm25 parameters updated");
        }
        Ok(())
    }

    fn cache_mut(&mut self) -> &mut HashMap<GroupingAlgorithm, SimilarityCache> {
        self.cache.get_mut().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_cache(&self) -> MutexGuard<'_, HashMap<GroupingAlgorithm, SimilarityCache>> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // ---------------------------------------------------------------------------------------------
    // clustering
    // ---------------------------------------------------------------------------------------------

    /// Partition `active_doc_ids` into groups of similar documents.
    ///
    /// Ids that are not indexed are ignored, duplicates count once. Fewer
    /// than two usable documents give an empty partition. The stores are not
    /// modified.
    pub fn compute_clusters<I, S>(&self, active_doc_ids: I, config: &Configuration) -> Result<Vec<Vec<String>>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        config.validate()?;
        let requested: IndexSet<String> =
            active_doc_ids.into_iter().map(|id| id.as_ref().to_string()).collect();
        let algorithm = config.grouping_algorithm;
        let threshold = config.similarity_threshold;

        let clusters = match algorithm {
            GroupingAlgorithm::TfIdf | GroupingAlgorithm::Hac => {
                let (ids, vectors): (Vec<&str>, Vec<&TermVector>) = requested
                    .iter()
                    .filter_map(|id| self.corpus.weights(id).map(|v| (id.as_str(), v)))
                    .unzip();
                self.run(algorithm, &ids, &vectors, threshold, true)
            }
            GroupingAlgorithm::Bm25 => {
                let params = config.bm25_params();
                let (ids, vectors): (Vec<&str>, Vec<Cow<'_, TermVector>>) = requested
                    .iter()
                    .filter_map(|id| self.bm25.weights_with(id, params).map(|v| (id.as_str(), v)))
                    .unzip();
                let vectors: Vec<&TermVector> = vectors.iter().map(|v| &**v).collect();
                // cached values are only valid for the store's own parameters
                let cacheable = params == self.bm25.params();
                self.run(algorithm, &ids, &vectors, threshold, cacheable)
            }
            GroupingAlgorithm::Keyphrase => {
                let (ids, sets): (Vec<&str>, Vec<HashSet<String>>) = requested
                    .iter()
                    .filter_map(|id| {
                        self.keyphrases
                            .phrases(id)
                            .map(|p| (id.as_str(), p.iter().cloned().collect::<HashSet<String>>()))
                    })
                    .unzip();
                let sets: Vec<&HashSet<String>> = sets.iter().collect();
                self.run(algorithm, &ids, &sets, threshold, true)
            }
        };

        debug!(
            %algorithm,
            requested = requested.len(),
            groups = clusters.len(),
            "clusters computed"
        );
        Ok(clusters)
    }

    fn run<R>(
        &self,
        algorithm: GroupingAlgorithm,
        ids: &[&str],
        reprs: &[&R],
        threshold: f64,
        cacheable: bool,
    ) -> Vec<Vec<String>>
    where
        R: Similarity + ?Sized,
    {
        if ids.len() < 2 {
            return Vec::new();
        }
        // the memo lock is only held around single lookups
        let similarity = |i: usize, j: usize| {
            if !cacheable {
                return reprs[i].similarity(reprs[j]);
            }
            let cached = self.lock_cache().entry(algorithm).or_default().lookup(ids[i], ids[j]);
            cached.unwrap_or_else(|| {
                let value = reprs[i].similarity(reprs[j]);
                self.lock_cache().entry(algorithm).or_default().insert(ids[i], ids[j], value);
                value
            })
        };

        let clusters: Vec<Cluster> = match algorithm {
            GroupingAlgorithm::Hac => hac_cluster(ids.len(), threshold, similarity),
            _ => {
                let richness: Vec<f64> = reprs.iter().map(|r| r.richness()).collect();
                greedy_cluster(&richness, threshold, similarity)
            }
        };
        resolve_ids(clusters, ids)
    }

    /// Label for a finished cluster, from its tabs' `(url, title)` pairs.
    pub fn name_cluster<U, T>(documents: &[(U, T)], max_len: usize) -> String
    where
        U: AsRef<str>,
        T: AsRef<str>,
    {
        name_cluster(documents, max_len)
    }

    // ---------------------------------------------------------------------------------------------
    // full run
    // ---------------------------------------------------------------------------------------------

    /// One complete grouping run over the tabs of a window.
    ///
    /// Skips pinned and browser-internal tabs, (re)indexes the rest, clusters
    /// the tabs of this run and names every group. Tabs whose features cannot
    /// be extracted or indexed are reported in `failures`.
    pub fn group_tabs(&mut self, tabs: &[Tab], config: &Configuration) -> Result<GroupingOutcome> {
        self.apply_settings(config)?;

        let mut outcome = GroupingOutcome::default();
        let mut documents = Vec::new();
        for tab in tabs.iter().filter(|t| is_groupable(t)) {
            match extract_features(&tab.url, &tab.title) {
                Ok(text) => documents.push((tab.id.as_str(), text)),
                Err(err) => {
                    warn!(tab = %tab.id, error = %err, "cannot extract tab features");
                    outcome.failures.push((tab.id.clone(), err));
                }
            }
        }

        let report = self.index_batch(documents);
        outcome.failures.extend(report.failures);

        let clusters = self.compute_clusters(&report.indexed, config)?;
        let by_id: HashMap<&str, &Tab> = tabs.iter().map(|t| (t.id.as_str(), t)).collect();
        for doc_ids in clusters {
            let members: Vec<(&str, &str)> = doc_ids
                .iter()
                .filter_map(|id| by_id.get(id.as_str()))
                .map(|t| (t.url.as_str(), t.title.as_str()))
                .collect();
            let name = name_cluster(&members, config.max_group_name_length);
            outcome.groups.push(TabGroup { doc_ids, name });
        }
        debug!(groups = outcome.groups.len(), failures = outcome.failures.len(), "tabs grouped");
        Ok(outcome)
    }

    // ---------------------------------------------------------------------------------------------
    // snapshot
    // ---------------------------------------------------------------------------------------------

    pub fn dump(&self) -> EngineSnapshot {
        EngineSnapshot {
            normalizer: self.normalizer,
            tfidf: self.corpus.dump(),
            bm25: self.bm25.dump(),
            num_phrases: self.keyphrases.num_phrases(),
            keyphrases: self.keyphrases.entries().clone(),
        }
    }

    pub fn load(snapshot: EngineSnapshot) -> Result<Self> {
        Ok(Self {
            normalizer: snapshot.normalizer,
            corpus: CorpusStore::load(snapshot.tfidf)?,
            bm25: Bm25Store::load(snapshot.bm25)?,
            keyphrases: KeyphraseStore::from_entries(snapshot.num_phrases, snapshot.keyphrases),
            cache: Mutex::new(HashMap::new()),
        })
    }
}
