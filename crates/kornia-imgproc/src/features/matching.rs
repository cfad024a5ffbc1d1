/// A correspondence between a query and a train descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorMatch {
    /// Index into the query descriptors.
    pub query_idx: usize,
    /// Index into the train descriptors.
    pub train_idx: usize,
    /// Hamming distance between the two descriptors.
    pub distance: u32,
}

/// Hamming distance between two fixed-size byte descriptors.
#[inline]
pub fn hamming_distance<const N: usize>(a: &[u8; N], b: &[u8; N]) -> u32 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| (x ^ y).count_ones())
        .sum()
}

/// Match binary descriptors using brute-force Hamming distance.
///
/// For each query descriptor, finds the nearest train descriptor; the first one wins
/// on ties. Optionally filters matches by maximum distance, cross-check, and Lowe's
/// ratio test.
///
/// # Arguments
///
/// * `query` - First set of N-byte binary descriptors.
/// * `train` - Second set of N-byte binary descriptors.
/// * `max_distance` - If set, discard matches with Hamming distance above this threshold.
/// * `cross_check` - If true, keep only mutual nearest neighbors.
/// * `max_ratio` - If set, apply Lowe's ratio test (best / second-best < ratio).
///
/// # Returns
///
/// The matches in query order.
///
/// # Example
///
/// ```
/// use kornia_imgproc::features::match_descriptors;
///
/// let query = [[0b1111_0000u8; 4], [0xffu8; 4]];
/// let train = [[0xffu8; 4], [0b1111_0001u8; 4]];
///
/// let matches = match_descriptors(&query, &train, None, true, None);
/// assert_eq!(matches.len(), 2);
/// assert_eq!((matches[0].train_idx, matches[0].distance), (1, 4));
/// assert_eq!((matches[1].train_idx, matches[1].distance), (0, 0));
/// ```
pub fn match_descriptors<const N: usize>(
    query: &[[u8; N]],
    train: &[[u8; N]],
    max_distance: Option<u32>,
    cross_check: bool,
    max_ratio: Option<f32>,
) -> Vec<DescriptorMatch> {
    let m = query.len();
    let n = train.len();
    if m == 0 || n == 0 {
        return vec![];
    }

    // forward pass: best and second-best train descriptor of each query
    let mut fwd_best_j = vec![0usize; m];
    let mut fwd_best_dist = vec![u32::MAX; m];
    let mut fwd_second_dist = vec![u32::MAX; m];

    // reverse pass is fused: best query of each train descriptor
    let mut rev_best_i = vec![0usize; n];
    let mut rev_best_dist = vec![u32::MAX; n];

    for (i, d1) in query.iter().enumerate() {
        for (j, d2) in train.iter().enumerate() {
            let dist = hamming_distance(d1, d2);
            if dist < fwd_best_dist[i] {
                fwd_second_dist[i] = fwd_best_dist[i];
                fwd_best_dist[i] = dist;
                fwd_best_j[i] = j;
            } else if dist < fwd_second_dist[i] {
                fwd_second_dist[i] = dist;
            }

            if dist < rev_best_dist[j] {
                rev_best_dist[j] = dist;
                rev_best_i[j] = i;
            }
        }
    }

    let mut matches = Vec::new();
    for i in 0..m {
        let j = fwd_best_j[i];
        let best_dist = fwd_best_dist[i];

        if let Some(max_dist) = max_distance {
            if best_dist > max_dist {
                continue;
            }
        }

        if cross_check && rev_best_i[j] != i {
            continue;
        }

        if let Some(ratio) = max_ratio {
            if ratio < 1.0 {
                let second = fwd_second_dist[i];
                let denom = if second == 0 {
                    f32::EPSILON
                } else {
                    second as f32
                };
                if best_dist as f32 / denom >= ratio {
                    continue;
                }
            }
        }

        matches.push(DescriptorMatch {
            query_idx: i,
            train_idx: j,
            distance: best_dist,
        });
    }

    matches
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hamming_distance() {
        assert_eq!(hamming_distance(&[0u8; 32], &[0u8; 32]), 0);
        assert_eq!(hamming_distance(&[0u8; 32], &[0xffu8; 32]), 256);
        assert_eq!(hamming_distance(&[0b1010u8], &[0b0110u8]), 2);
    }

    #[test]
    fn test_match_identical_sets() {
        let descriptors: Vec<[u8; 2]> = (0..10u8).map(|i| [i, i.wrapping_mul(37)]).collect();
        let matches = match_descriptors(&descriptors, &descriptors, None, true, None);
        assert_eq!(matches.len(), 10);
        for (i, m) in matches.iter().enumerate() {
            assert_eq!(m.query_idx, i);
            assert_eq!(m.train_idx, i);
            assert_eq!(m.distance, 0);
        }
    }

    #[test]
    fn test_match_cross_check() {
        // both queries are closest to train 0, only the closer one survives
        let query = [[0b0000_0001u8], [0b0000_0111u8]];
        let train = [[0b0000_0000u8], [0b1111_0000u8]];

        let one_way = match_descriptors(&query, &train, None, false, None);
        assert_eq!(one_way.len(), 2);
        assert!(one_way.iter().all(|m| m.train_idx == 0));

        let mutual = match_descriptors(&query, &train, None, true, None);
        assert_eq!(
            mutual,
            vec![DescriptorMatch {
                query_idx: 0,
                train_idx: 0,
                distance: 1
            }]
        );
    }

    #[test]
    fn test_match_filters() {
        let query = [[0b0000_0011u8]];
        let train = [[0b0000_0000u8], [0b0000_0111u8]];

        assert!(match_descriptors(&query, &train, Some(0), false, None).is_empty());
        assert_eq!(match_descriptors(&query, &train, Some(1), false, None).len(), 1);

        // best 1, second best 2
        assert!(match_descriptors(&query, &train, None, false, Some(0.5)).is_empty());
        assert_eq!(match_descriptors(&query, &train, None, false, Some(0.8)).len(), 1);

        assert!(match_descriptors::<1>(&[], &train, None, true, None).is_empty());
    }
}
