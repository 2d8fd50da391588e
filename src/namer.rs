//! Short human-readable labels for finished clusters.

use indexmap::IndexMap;

use crate::vectorizer::stopwords::is_name_stop_word;
use crate::vectorizer::term::split_words;

/// Number of terms joined into a label
const LABEL_TERMS: usize = 3;
/// Terms must be longer than this (in characters)
const MIN_LABEL_TERM_LEN: usize = 4;

/// Label a cluster from its `(url, title)` pairs.
///
/// See [`name_from_texts`] for the rules.
pub fn name_cluster<U, T>(documents: &[(U, T)], max_len: usize) -> String
where
    U: AsRef<str>,
    T: AsRef<str>,
{
    let texts: Vec<String> = documents
        .iter()
        .map(|(url, title)| format!("{} {}", url.as_ref(), title.as_ref()))
        .collect();
    name_from_texts(&texts, max_len)
}

/// Label a cluster from free text.
///
/// Lower-cases and tokenizes all texts together, drops stopwords, terms of
/// three characters or fewer and purely numeric terms, then joins the three
/// most frequent terms (first-seen order on ties) with `-` and truncates the
/// result to `max_len` characters.
pub fn name_from_texts<T: AsRef<str>>(texts: &[T], max_len: usize) -> String {
    let combined = texts
        .iter()
        .map(|t| t.as_ref())
        .collect::<Vec<&str>>()
        .join(" ")
        .to_lowercase();

    let mut counts: IndexMap<&str, u32> = IndexMap::new();
    for term in split_words(&combined) {
        if term.chars().count() < MIN_LABEL_TERM_LEN
            || is_name_stop_word(term)
            || term.chars().all(|c| c.is_ascii_digit())
        {
            continue;
        }
        *counts.entry(term).or_insert(0) += 1;
    }

    let mut ranked: Vec<(&str, u32)> = counts.into_iter().collect();
    // stable sort keeps first-seen order on ties
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    let label = ranked
        .iter()
        .take(LABEL_TERMS)
        .map(|(term, _)| *term)
        .collect::<Vec<_>>()
        .join("-");

    label.chars().take(max_len).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_from_common_terms() {
        let docs = [
            "example website home page",
            "example website about us",
            "example website contact",
        ];
        assert_eq!(name_from_texts(&docs, 15), "example-website");
        assert_eq!(name_from_texts(&docs, 100), "example-website-home");
    }

    #[test]
    fn respects_max_length() {
        let docs = [
            "very long example website name home page",
            "very long example website name about us",
            "very long example website name contact",
        ];
        let name = name_from_texts(&docs, 15);
        assert!(name.chars().count() <= 15);
        assert_eq!(name, "very-long-examp");
    }

    #[test]
    fn drops_numbers_short_terms_and_stopwords() {
        let docs = ["2024 2024 2024 news with the news", "with news abc"];
        assert_eq!(name_from_texts(&docs, 50), "news");
    }

    #[test]
    fn general_stopwords_can_name_a_group() {
        let docs = ["about this page", "about that page"];
        assert_eq!(name_from_texts(&docs, 50), "about-page-this");
    }

    #[test]
    fn names_from_url_title_pairs() {
        let docs = [
            ("https://docs.rs/serde", "serde docs"),
            ("https://docs.rs/tokio", "tokio docs"),
        ];
        assert_eq!(name_cluster(&docs, 30), "docs-https-serde");
    }

    #[test]
    fn truncation_is_character_based() {
        assert_eq!(name_from_texts(&["überall überall"], 3), "übe");
        assert_eq!(name_from_texts::<&str>(&[], 10), "");
    }
}
