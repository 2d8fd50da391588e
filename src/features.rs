//! Turning browser tabs into document text.

use serde::{Deserialize, Serialize};
use url::{form_urlencoded, Url};

use crate::error::{ClusterError, Result};
use crate::vectorizer::term::is_word_char;

/// Internal browser pages never take part in grouping.
const IGNORED_SCHEMES: &[&str] = &["chrome://", "chrome-extension://"];

/// A tab as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tab {
    /// stable key, used as the document id
    pub id: String,
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub pinned: bool,
}

impl Tab {
    pub fn new(id: impl Into<String>, url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            title: title.into(),
            pinned: false,
        }
    }

    pub fn pinned(mut self) -> Self {
        self.pinned = true;
        self
    }
}

/// Pinned tabs and browser-internal pages are left alone.
pub fn is_groupable(tab: &Tab) -> bool {
    !tab.pinned && !IGNORED_SCHEMES.iter().any(|scheme| tab.url.starts_with(scheme))
}

/// Build the document text of a tab: `"{host} {path} {query} {title}"`, lower-cased.
///
/// Any absolute URL is accepted (`about:blank` has an empty host and the path
/// `blank`). The query is re-serialized as form-urlencoded pairs and the title
/// keeps only word characters, whitespace and `-`.
pub fn extract_features(url: &str, title: &str) -> Result<String> {
    let parsed = Url::parse(url).map_err(|e| ClusterError::invalid(format!("{url:?}: {e}")))?;
    let host = parsed.host_str().unwrap_or("");
    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(parsed.query_pairs())
        .finish();
    let clean_title: String = title
        .chars()
        .filter(|&c| is_word_char(c) || c.is_whitespace() || c == '-')
        .collect();
    Ok(format!("{} {} {} {}", host, parsed.path(), query, clean_title).to_lowercase())
}
