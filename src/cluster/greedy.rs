use super::Cluster;

/// Greedy single-link clustering.
///
/// Documents are scanned by descending `richness` (stable, so equal keys keep
/// input order). Each unassigned document seeds a cluster and absorbs every
/// other unassigned document whose similarity *to the seed* is strictly
/// greater than `threshold`. Clusters of one are dropped.
///
/// # Arguments
/// * `richness` - ordering key per document; its length is the document count
/// * `threshold` - minimum (exclusive) similarity to the seed
/// * `similarity` - pairwise similarity by index
pub fn greedy_cluster<F>(richness: &[f64], threshold: f64, mut similarity: F) -> Vec<Cluster>
where
    F: FnMut(usize, usize) -> f64,
{
    let n = richness.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| richness[b].total_cmp(&richness[a]));

    let mut assigned = vec![false; n];
    let mut clusters = Vec::new();
    for (pos, &seed) in order.iter().enumerate() {
        if assigned[seed] {
            continue;
        }
        assigned[seed] = true;
        let mut cluster = vec![seed];
        // everything before `pos` is already assigned
        for &other in &order[pos + 1..] {
            if assigned[other] {
                continue;
            }
            if similarity(seed, other) > threshold {
                assigned[other] = true;
                cluster.push(other);
            }
        }
        if cluster.len() > 1 {
            clusters.push(cluster);
        }
    }
    clusters
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::testing::{assert_partition, table};

    #[test]
    fn seeds_absorb_similar_documents() {
        let sim = table(4, &[(0, 1, 0.9), (2, 3, 0.8), (0, 2, 0.1)]);
        let clusters = greedy_cluster(&[4.0, 3.0, 2.0, 1.0], 0.3, sim);
        assert_eq!(clusters, vec![vec![0, 1], vec![2, 3]]);
        assert_partition(&clusters, 4);
    }

    #[test]
    fn membership_is_tested_against_the_seed_only() {
        // 1 ~ 0 and 2 ~ 1, but 2 is not similar to seed 0
        let sim = table(3, &[(0, 1, 0.9), (1, 2, 0.9), (0, 2, 0.0)]);
        let clusters = greedy_cluster(&[3.0, 2.0, 1.0], 0.5, sim);
        assert_eq!(clusters, vec![vec![0, 1]]);
    }

    #[test]
    fn richest_document_seeds_first() {
        let sim = table(3, &[(0, 1, 0.9), (1, 2, 0.9), (0, 2, 0.0)]);
        // document 1 is richest, so it seeds and takes both neighbours
        let clusters = greedy_cluster(&[1.0, 5.0, 1.0], 0.5, sim);
        assert_eq!(clusters, vec![vec![1, 0, 2]]);
    }

    #[test]
    fn ties_keep_input_order() {
        let sim = table(3, &[(0, 1, 0.9), (1, 2, 0.9), (0, 2, 0.0)]);
        let clusters = greedy_cluster(&[1.0, 1.0, 1.0], 0.5, sim);
        assert_eq!(clusters, vec![vec![0, 1]]);
    }

    #[test]
    fn threshold_is_exclusive_and_singletons_are_dropped() {
        let sim = table(2, &[(0, 1, 0.5)]);
        assert!(greedy_cluster(&[1.0, 1.0], 0.5, sim).is_empty());
        assert!(greedy_cluster(&[], 0.0, |_, _| 1.0).is_empty());
        assert!(greedy_cluster(&[1.0], 0.0, |_, _| 1.0).is_empty());
    }
}
