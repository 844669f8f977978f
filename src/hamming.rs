use crate::dhash::Fingerprint;

/// Number of differing bits between two fingerprints
#[inline(always)]
pub fn hamming(va: u128, vb: u128) -> u32 {
    (va ^ vb).count_ones()
}

/// Brute-force k nearest neighbours of `query` among `candidates`
///
/// Returns `(position, distance)` pairs ordered by distance, ties by position.
/// This is the linear scan that the VP-tree has to agree with, it is also used
/// as the baseline in benchmarks.
pub fn knn_hamming(query: &Fingerprint, candidates: &[Fingerprint], k: usize) -> Vec<(usize, u32)> {
    if k == 0 {
        return vec![];
    }
    // keep a sorted window of at most k entries, the worst one at the end
    let mut best: Vec<(u32, usize)> = Vec::with_capacity(k + 1);
    for (i, candidate) in candidates.iter().enumerate() {
        let d = query.distance(candidate);
        if best.len() == k && d >= best[k - 1].0 {
            continue;
        }
        let pos = best.partition_point(|&(bd, _)| bd <= d);
        best.insert(pos, (d, i));
        best.truncate(k);
    }
    best.into_iter().map(|(d, i)| (i, d)).collect()
}

/// Brute-force range query, every candidate within `radius` bits of `query`
pub fn range_hamming(query: &Fingerprint, candidates: &[Fingerprint], radius: u32) -> Vec<(usize, u32)> {
    candidates
        .iter()
        .enumerate()
        .map(|(i, candidate)| (i, query.distance(candidate)))
        .filter(|&(_, d)| d <= radius)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hamming_identical() {
        assert_eq!(hamming(0, 0), 0);
        assert_eq!(hamming(u64::MAX as u128, u64::MAX as u128), 0);
    }

    #[test]
    fn test_hamming_all_different() {
        assert_eq!(hamming(0, u64::MAX as u128), 64);
        assert_eq!(hamming(0, u128::MAX), 128);
    }

    #[test]
    fn test_hamming_single_bit() {
        assert_eq!(hamming(0, 1), 1);
        assert_eq!(hamming(0b1010, 0b1000), 1);
    }

    #[test]
    fn test_knn_hamming_multiple_vectors() {
        let query = Fingerprint::new(0);
        // distances 0, 2, 1
        let candidates = [Fingerprint::new(0), Fingerprint::new(0b11), Fingerprint::new(0b100)];
        let result = knn_hamming(&query, &candidates, 3);
        assert_eq!(result, vec![(0, 0), (2, 1), (1, 2)]);
    }

    #[test]
    fn test_knn_hamming_ties_keep_position_order() {
        let query = Fingerprint::new(0);
        let candidates = [Fingerprint::new(0b10), Fingerprint::new(0b01), Fingerprint::new(0b11)];
        let result = knn_hamming(&query, &candidates, 2);
        assert_eq!(result, vec![(0, 1), (1, 1)]);
    }

    #[test]
    fn test_knn_hamming_k_limit() {
        let query = Fingerprint::new(0);
        let candidates = [Fingerprint::new(u64::MAX as u128), Fingerprint::new(1)];
        let result = knn_hamming(&query, &candidates, 5);
        assert_eq!(result, vec![(1, 1), (0, 64)]);
        assert!(knn_hamming(&query, &candidates, 0).is_empty());
    }

    #[test]
    fn test_range_hamming() {
        let query = Fingerprint::new(0);
        let candidates = [Fingerprint::new(0b111), Fingerprint::new(0b1), Fingerprint::new(0)];
        assert_eq!(range_hamming(&query, &candidates, 1), vec![(1, 1), (2, 0)]);
    }
}
