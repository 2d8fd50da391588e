use std::collections::HashSet;
use std::sync::OnceLock;

/// Fixed English stopword list.
/// Used as phrase delimiters by the keyphrase extractor.
pub const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "in", "on", "at", "to", "for", "of", "with", "by",
    "is", "this", "about", "that", "and", "or", "but", "from", "as", "it",
    "are", "was", "be", "being", "been", "has", "have", "had", "do", "does", "did",
];

fn stop_word_set() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| STOP_WORDS.iter().copied().collect())
}

/// `word` は小文字化済みであること
#[inline]
pub fn is_stop_word(word: &str) -> bool {
    stop_word_set().contains(word)
}

/// Shorter list dropped from group labels.
/// Words like "about" or "from" stay usable as label terms.
pub const NAME_STOP_WORDS: &[&str] = &[
    "the", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
];

#[inline]
pub fn is_name_stop_word(word: &str) -> bool {
    NAME_STOP_WORDS.contains(&word)
}
