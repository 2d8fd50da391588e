//! Clustering over pairwise document similarity.
//!
//! Both algorithms take documents by index and a pairwise similarity function,
//! and return a partition of the grouped documents: every returned cluster has
//! at least two members and no index appears twice. Documents left alone are
//! simply not returned.

pub mod greedy;
pub mod hac;

pub use greedy::greedy_cluster;
pub use hac::hac_cluster;

/// Member indices of one cluster
pub type Cluster = Vec<usize>;

/// Map index clusters back to document ids.
pub fn resolve_ids<S: AsRef<str>>(clusters: Vec<Cluster>, ids: &[S]) -> Vec<Vec<String>> {
    clusters
        .into_iter()
        .map(|c| c.into_iter().map(|i| ids[i].as_ref().to_string()).collect())
        .collect()
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashSet;

    use super::Cluster;

    /// panics unless `clusters` is a partition with every cluster of size >= 2
    pub fn assert_partition(clusters: &[Cluster], n: usize) {
        let mut seen = HashSet::new();
        for cluster in clusters {
            assert!(cluster.len() >= 2, "cluster too small: {cluster:?}");
            for &i in cluster {
                assert!(i < n, "index {i} out of range");
                assert!(seen.insert(i), "index {i} appears twice");
            }
        }
    }

    /// symmetric similarity lookup from an upper-triangle table
    pub fn table(n: usize, pairs: &[(usize, usize, f64)]) -> impl FnMut(usize, usize) -> f64 {
        let mut m = vec![vec![0.0; n]; n];
        for &(i, j, s) in pairs {
            m[i][j] = s;
            m[j][i] = s;
        }
        move |i, j| m[i][j]
    }
}
