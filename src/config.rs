use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::{ClusterError, Result};

/// Term-weighting / clustering scheme selected for a grouping run.
///
/// Selected once per run and carried through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GroupingAlgorithm {
    /// Greedy single-link over TF-IDF vectors (cosine)
    #[default]
    TfIdf,
    /// Greedy single-link over BM25 vectors (cosine)
    Bm25,
    /// Greedy single-link over RAKE keyphrase sets (jaccard)
    Keyphrase,
    /// Average-link agglomerative clustering over TF-IDF vectors (cosine)
    Hac,
}

impl GroupingAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupingAlgorithm::TfIdf => "tfidf",
            GroupingAlgorithm::Bm25 => "bm25",
            GroupingAlgorithm::Keyphrase => "keyphrase",
            GroupingAlgorithm::Hac => "hac",
        }
    }
}

impl fmt::Display for GroupingAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupingAlgorithm {
    type Err = ClusterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tfidf" | "tf-idf" => Ok(GroupingAlgorithm::TfIdf),
            "bm25" => Ok(GroupingAlgorithm::Bm25),
            "keyphrase" => Ok(GroupingAlgorithm::Keyphrase),
            "hac" => Ok(GroupingAlgorithm::Hac),
            _ => Err(ClusterError::UnknownAlgorithm(s.to_string())),
        }
    }
}

/// BM25 shape parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bm25Params {
    /// term frequency saturation
    pub k1: f64,
    /// document length normalization strength
    pub b: f64,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: 1.5, b: 0.75 }
    }
}

impl Bm25Params {
    pub fn validate(&self) -> Result<()> {
        if !self.k1.is_finite() || self.k1 < 0.0 {
            return Err(ClusterError::invalid(format!("bm25 k1 must be >= 0, got {}", self.k1)));
        }
        if !(0.0..=1.0).contains(&self.b) {
            return Err(ClusterError::invalid(format!("bm25 b must be in [0, 1], got {}", self.b)));
        }
        Ok(())
    }
}

/// Immutable settings snapshot for one grouping run.
///
/// Field defaults match the values a fresh settings store hands out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub similarity_threshold: f64,
    pub grouping_algorithm: GroupingAlgorithm,
    pub bm25_k1: f64,
    pub bm25_b: f64,
    pub max_group_name_length: usize,
    /// Only read by the host scheduler.
    pub grouping_interval_minutes: u32,
}

impl Default for Configuration {
    fn default() -> Self {
        let bm25 = Bm25Params::default();
        Self {
            similarity_threshold: 0.3,
            grouping_algorithm: GroupingAlgorithm::TfIdf,
            bm25_k1: bm25.k1,
            bm25_b: bm25.b,
            max_group_name_length: 15,
            grouping_interval_minutes: 5,
        }
    }
}

impl Configuration {
    pub fn with_algorithm(mut self, algorithm: GroupingAlgorithm) -> Self {
        self.grouping_algorithm = algorithm;
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    pub fn bm25_params(&self) -> Bm25Params {
        Bm25Params { k1: self.bm25_k1, b: self.bm25_b }
    }

    /// Check every scalar against its allowed range.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(ClusterError::invalid(format!(
                "similarity threshold must be in [0, 1], got {}",
                self.similarity_threshold
            )));
        }
        self.bm25_params().validate()?;
        if self.max_group_name_length == 0 {
            return Err(ClusterError::invalid("max group name length must be positive"));
        }
        if self.grouping_interval_minutes == 0 {
            return Err(ClusterError::invalid("grouping interval must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Configuration::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.grouping_algorithm, GroupingAlgorithm::TfIdf);
        assert_eq!(config.max_group_name_length, 15);
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let config = Configuration::default().with_threshold(1.5);
        assert!(matches!(config.validate(), Err(ClusterError::InvalidInput(_))));

        let config = Configuration { bm25_b: -0.1, ..Configuration::default() };
        assert!(matches!(config.validate(), Err(ClusterError::InvalidInput(_))));

        let config = Configuration { bm25_k1: -1.0, ..Configuration::default() };
        assert!(matches!(config.validate(), Err(ClusterError::InvalidInput(_))));

        let config = Configuration { max_group_name_length: 0, ..Configuration::default() };
        assert!(matches!(config.validate(), Err(ClusterError::InvalidInput(_))));

        let config = Configuration::default().with_threshold(f64::NAN);
        assert!(config.validate().is_err());
    }

    #[test]
    fn algorithm_names_parse() {
        assert_eq!("tfidf".parse::<GroupingAlgorithm>().unwrap(), GroupingAlgorithm::TfIdf);
        assert_eq!("BM25".parse::<GroupingAlgorithm>().unwrap(), GroupingAlgorithm::Bm25);
        assert_eq!(" hac ".parse::<GroupingAlgorithm>().unwrap(), GroupingAlgorithm::Hac);
        assert_eq!(
            "lda".parse::<GroupingAlgorithm>(),
            Err(ClusterError::UnknownAlgorithm("lda".to_string()))
        );
    }

    #[test]
    fn partial_settings_fill_defaults() {
        let config: Configuration =
            serde_json::from_str(r#"{"grouping_algorithm":"keyphrase","similarity_threshold":0.5}"#).unwrap();
        assert_eq!(config.grouping_algorithm, GroupingAlgorithm::Keyphrase);
        assert_eq!(config.similarity_threshold, 0.5);
        assert_eq!(config.bm25_k1, 1.5);

        let unknown = serde_json::from_str::<Configuration>(r#"{"grouping_algorithm":"lda"}"#);
        assert!(unknown.is_err());
    }
}
