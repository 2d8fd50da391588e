use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Word characters: Unicode letters/digits and `_`.
/// Everything else separates terms.
#[inline]
pub fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Split `text` on runs of non-word characters.
/// Empty pieces are skipped; case is preserved.
pub fn split_words(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !is_word_char(c)).filter(|w| !w.is_empty())
}

/// Term Normalizer
/// Turns raw text into an ordered sequence of lower-cased terms.
///
/// The minimum length is fixed for the lifetime of a store; terms shorter
/// than `min_term_len` characters are discarded. No stemming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Normalizer {
    pub min_term_len: usize,
}

impl Default for Normalizer {
    /// keep terms longer than 2 characters
    fn default() -> Self {
        Self { min_term_len: 3 }
    }
}

impl Normalizer {
    pub fn new(min_term_len: usize) -> Self {
        Self { min_term_len }
    }

    /// Keep every non-empty token.
    pub fn keep_all() -> Self {
        Self { min_term_len: 1 }
    }

    /// Tokenize `text` into terms, in document order.
    ///
    /// # Arguments
    /// * `text` - raw document text
    ///
    /// # Returns
    /// * `Vec<String>` - lower-cased terms
    pub fn terms(&self, text: &str) -> Vec<String> {
        split_words(text)
            .map(|w| w.to_lowercase())
            .filter(|w| w.chars().count() >= self.min_term_len)
            .collect()
    }

    /// Tokenize and count in one pass.
    pub fn term_frequency(&self, text: &str) -> TermFrequency {
        let mut freq = TermFrequency::new();
        freq.add_terms(&self.terms(text));
        freq
    }
}

/// TermFrequency
/// Raw occurrence counts of each term within one document.
///
/// Terms keep first-seen order.
///
/// # Examples
/// ```
/// use tab_cluster::TermFrequency;
/// let mut freq = TermFrequency::new();
/// freq.add_term("rust").add_term("tabs").add_term("rust");
/// assert_eq!(freq.term_count("rust"), 2);
/// assert_eq!(freq.term_sum(), 3);
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct TermFrequency {
    #[serde(with = "indexmap::map::serde_seq")]
    term_count: IndexMap<String, u32>,
    total_term_count: u64,
}

impl TermFrequency {
    pub fn new() -> Self {
        Self::default()
    }

    /// termを追加する
    #[inline]
    pub fn add_term(&mut self, term: &str) -> &mut Self {
        if let Some(count) = self.term_count.get_mut(term) {
            *count += 1;
        } else {
            self.term_count.insert(term.to_string(), 1);
        }
        self.total_term_count += 1;
        self
    }

    /// 複数のtermを追加する
    #[inline]
    pub fn add_terms<T>(&mut self, terms: &[T]) -> &mut Self
    where
        T: AsRef<str>,
    {
        for term in terms {
            self.add_term(term.as_ref());
        }
        self
    }

    #[inline]
    pub fn term_count(&self, term: &str) -> u32 {
        self.term_count.get(term).copied().unwrap_or(0)
    }

    /// document length (all occurrences)
    #[inline]
    pub fn term_sum(&self) -> u64 {
        self.total_term_count
    }

    /// number of distinct terms
    #[inline]
    pub fn term_num(&self) -> usize {
        self.term_count.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.total_term_count == 0
    }

    #[inline]
    pub fn contains_term(&self, term: &str) -> bool {
        self.term_count.contains_key(term)
    }

    /// (term, count) in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.term_count.iter().map(|(t, &c)| (t.as_str(), c))
    }

    /// Length-normalized term frequency: count / document length.
    pub fn tf_map(&self) -> IndexMap<String, f64> {
        if self.total_term_count == 0 {
            return IndexMap::new();
        }
        let len = self.total_term_count as f64;
        self.term_count
            .iter()
            .map(|(term, &count)| (term.clone(), count as f64 / len))
            .collect()
    }
}
