use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::vectorizer::stopwords::is_stop_word;
use crate::vectorizer::term::is_word_char;

/// Number of phrases kept per document unless configured otherwise
pub const DEFAULT_NUM_PHRASES: usize = 5;

/// RAKE-style keyphrase extraction.
///
/// 1. lower-case and split into sentences on `.`, `!`, `?`
/// 2. split sentences on whitespace and strip non-word characters from each word
/// 3. stopwords (and words left empty) end the current phrase and are dropped
/// 4. every word of a phrase of length L gets frequency +1 and degree +(L - 1)
/// 5. word score = (frequency + degree) / frequency, phrase score = sum of word scores
///
/// Phrases are returned best first and equal scores keep discovery order.
/// A phrase that occurs more than once is ranked once per occurrence.
///
/// # Arguments
/// * `text` - raw document text
/// * `num_phrases` - maximum number of phrases to return
pub fn extract_keyphrases(text: &str, num_phrases: usize) -> Vec<String> {
    let lowered = text.to_lowercase();
    let mut phrases: Vec<Vec<String>> = Vec::new();

    for sentence in lowered.split(['.', '!', '?']) {
        let mut phrase: Vec<String> = Vec::new();
        for raw in sentence.split_whitespace() {
            let word: String = raw.chars().filter(|&c| is_word_char(c)).collect();
            if !word.is_empty() && !is_stop_word(&word) {
                phrase.push(word);
            } else if !phrase.is_empty() {
                phrases.push(std::mem::take(&mut phrase));
            }
        }
        if !phrase.is_empty() {
            phrases.push(phrase);
        }
    }

    // word -> (frequency, degree)
    let mut stats: IndexMap<&str, (u32, u32)> = IndexMap::new();
    for phrase in &phrases {
        let degree = phrase.len() as u32 - 1;
        for word in phrase {
            let entry = stats.entry(word.as_str()).or_insert((0, 0));
            entry.0 += 1;
            entry.1 += degree;
        }
    }
    let word_score = |word: &str| -> f64 {
        stats
            .get(word)
            .map(|&(freq, degree)| (freq + degree) as f64 / freq as f64)
            .unwrap_or(0.0)
    };

    // every occurrence is ranked, repeats included
    let mut ranked: Vec<(String, f64)> = phrases
        .iter()
        .map(|phrase| {
            let score = phrase.iter().map(|w| word_score(w.as_str())).sum::<f64>();
            (phrase.join(" "), score)
        })
        .collect();
    // stable: ties keep discovery order
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.truncate(num_phrases);
    ranked.into_iter().map(|(phrase, _)| phrase).collect()
}

/// Per-document keyphrase lists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyphraseStore {
    num_phrases: usize,
    phrases: IndexMap<String, Vec<String>>,
}

impl Default for KeyphraseStore {
    fn default() -> Self {
        Self::new(DEFAULT_NUM_PHRASES)
    }
}

impl KeyphraseStore {
    pub fn new(num_phrases: usize) -> Self {
        Self {
            num_phrases,
            phrases: IndexMap::new(),
        }
    }

    pub fn num_phrases(&self) -> usize {
        self.num_phrases
    }

    /// Extract and store the phrases of `text`, replacing any previous entry.
    pub fn upsert(&mut self, doc_id: &str, text: &str) -> &[String] {
        let phrases = extract_keyphrases(text, self.num_phrases);
        self.insert(doc_id, phrases)
    }

    /// Store already-extracted phrases.
    pub(crate) fn insert(&mut self, doc_id: &str, phrases: Vec<String>) -> &[String] {
        let (idx, _) = self.phrases.insert_full(doc_id.to_string(), phrases);
        &self.phrases[idx]
    }

    pub fn remove(&mut self, doc_id: &str) -> bool {
        self.phrases.shift_remove(doc_id).is_some()
    }

    pub fn clear(&mut self) {
        self.phrases.clear();
    }

    pub fn phrases(&self, doc_id: &str) -> Option<&[String]> {
        self.phrases.get(doc_id).map(Vec::as_slice)
    }

    pub fn contains_doc(&self, doc_id: &str) -> bool {
        self.phrases.contains_key(doc_id)
    }

    pub fn doc_num(&self) -> usize {
        self.phrases.len()
    }

    pub(crate) fn entries(&self) -> &IndexMap<String, Vec<String>> {
        &self.phrases
    }

    pub(crate) fn from_entries(num_phrases: usize, phrases: IndexMap<String, Vec<String>>) -> Self {
        Self { num_phrases, phrases }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: &str = "This is an example text about keyword extraction. \
        Keyword extraction is an important task in natural language processing.";

    #[test]
    fn finds_contiguous_non_stopword_runs() {
        let phrases = extract_keyphrases(TEXT, 5);
        assert!(phrases.contains(&"keyword extraction".to_string()));
        assert!(phrases.contains(&"natural language processing".to_string()));
        // highest co-occurrence degree first
        assert_eq!(phrases[0], "natural language processing");
    }

    #[test]
    fn ties_keep_discovery_order_and_repeats_are_ranked() {
        let phrases = extract_keyphrases(TEXT, 5);
        assert_eq!(
            phrases,
            vec![
                "natural language processing",
                "example text",
                "keyword extraction",
                "keyword extraction",
                "important task",
            ]
        );
    }

    #[test]
    fn repeated_phrases_take_one_slot_each() {
        let phrases = extract_keyphrases("rust book. rust book. alpha. beta. gamma. delta", 5);
        assert_eq!(phrases, vec!["rust book", "rust book", "alpha", "beta", "gamma"]);
    }

    #[test]
    fn respects_phrase_limit() {
        assert_eq!(extract_keyphrases(TEXT, 3).len(), 3);
        assert!(extract_keyphrases(TEXT, 0).is_empty());
    }

    #[test]
    fn punctuation_inside_words_is_stripped() {
        let phrases = extract_keyphrases("GitHub: rust-lang/rust, the issues!", 5);
        assert_eq!(phrases, vec!["github rustlangrust", "issues"]);
    }

    #[test]
    fn stopword_only_text_has_no_phrases() {
        assert!(extract_keyphrases("the and of a", 5).is_empty());
        assert!(extract_keyphrases("", 5).is_empty());
    }

    #[test]
    fn store_replaces_and_removes() {
        let mut store = KeyphraseStore::default();
        store.upsert("1", "rust book");
        store.upsert("1", "daily news");
        assert_eq!(store.phrases("1").unwrap(), ["daily news".to_string()]);
        assert_eq!(store.doc_num(), 1);
        assert!(store.remove("1"));
        assert!(!store.remove("1"));
        assert!(store.phrases("1").is_none());
    }
}
