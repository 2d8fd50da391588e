use super::Cluster;

/// Hierarchical agglomerative clustering, average linkage.
///
/// Starts from singletons and repeatedly merges the pair of clusters with the
/// highest mean pairwise similarity, until one cluster is left or the best
/// merge falls below `threshold` (a merge at exactly `threshold` is allowed).
/// Equal scores resolve to the first pair in ascending `(i, j)` scan order.
/// Singletons left at the end are dropped.
///
/// O(k³) pair evaluations overall; meant for tens of documents.
pub fn hac_cluster<F>(n: usize, threshold: f64, mut similarity: F) -> Vec<Cluster>
where
    F: FnMut(usize, usize) -> f64,
{
    let mut clusters: Vec<Cluster> = (0..n).map(|i| vec![i]).collect();

    while clusters.len() > 1 {
        let mut best: Option<(usize, usize, f64)> = None;
        for i in 0..clusters.len() {
            for j in (i + 1)..clusters.len() {
                let score = average_linkage(&clusters[i], &clusters[j], &mut similarity);
                // NaN never wins
                if best.map_or(!score.is_nan(), |(_, _, s)| score > s) {
                    best = Some((i, j, score));
                }
            }
        }

        match best {
            Some((i, j, score)) if score >= threshold => {
                let merged = clusters.remove(j);
                clusters[i].extend(merged);
            }
            _ => break,
        }
    }

    clusters.retain(|c| c.len() > 1);
    clusters
}

/// mean similarity over all cross-cluster member pairs
fn average_linkage<F>(a: &[usize], b: &[usize], similarity: &mut F) -> f64
where
    F: FnMut(usize, usize) -> f64,
{
    let mut total = 0.0;
    for &x in a {
        for &y in b {
            total += similarity(x, y);
        }
    }
    total / (a.len() * b.len()) as f64
}
