//! Brute-force Hamming matching between two feature sets.

use rayon::prelude::*;

use crate::config::FeatureConfig;

use super::brief::{hamming_distance, Descriptor};
use super::FeatureSet;

/// Minimal sample size of a homography; kept even when `keep_fraction` would cut below it.
pub const MIN_CORRESPONDENCES: usize = 4;

/// Matched point pairs, best-scoring first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Correspondences {
    /// Points in revision-A pixel space.
    pub points_a: Vec<[f64; 2]>,
    /// Points in revision-B pixel space, aligned with `points_a`.
    pub points_b: Vec<[f64; 2]>,
    /// Hamming distance of each pair.
    pub distances: Vec<u32>,
}

impl Correspondences {
    pub fn len(&self) -> usize {
        self.points_a.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points_a.is_empty()
    }

    pub fn push(&mut self, a: [f64; 2], b: [f64; 2], distance: u32) {
        self.points_a.push(a);
        self.points_b.push(b);
        self.distances.push(distance);
    }
}

/// Nearest descriptor in `pool` (lowest index wins ties).
fn nearest(query: &Descriptor, pool: &[Descriptor]) -> Option<(usize, u32)> {
    let mut best: Option<(usize, u32)> = None;
    for (i, d) in pool.iter().enumerate() {
        let dist = hamming_distance(query, d);
        if best.map_or(true, |(_, bd)| dist < bd) {
            best = Some((i, dist));
            if dist == 0 {
                break;
            }
        }
    }
    best
}

/// Match every B descriptor to its nearest A descriptor and keep the best
/// `config.keep_fraction` of the pairs (at least [`MIN_CORRESPONDENCES`]
/// when available).
pub fn match_features(a: &FeatureSet, b: &FeatureSet, config: &FeatureConfig) -> Correspondences {
    if a.is_empty() || b.is_empty() {
        return Correspondences::default();
    }

    let b_to_a: Vec<Option<(usize, u32)>> = b
        .descriptors
        .par_iter()
        .map(|d| nearest(d, &a.descriptors))
        .collect();

    let a_to_b: Option<Vec<Option<(usize, u32)>>> = config.cross_check.then(|| {
        a.descriptors
            .par_iter()
            .map(|d| nearest(d, &b.descriptors))
            .collect()
    });

    // (distance, b index, a index)
    let mut pairs: Vec<(u32, usize, usize)> = b_to_a
        .iter()
        .enumerate()
        .filter_map(|(ib, best)| {
            let (ia, dist) = (*best)?;
            if dist > config.max_hamming_distance {
                return None;
            }
            if let Some(back) = &a_to_b {
                if back[ia].map(|(j, _)| j) != Some(ib) {
                    return None;
                }
            }
            Some((dist, ib, ia))
        })
        .collect();
    pairs.sort_unstable();

    let keep = ((pairs.len() as f64 * config.keep_fraction).ceil() as usize)
        .max(MIN_CORRESPONDENCES)
        .min(pairs.len());

    let mut out = Correspondences::default();
    for &(dist, ib, ia) in &pairs[..keep] {
        out.push(a.point(ia), b.point(ib), dist);
    }

    tracing::debug!(
        "Descriptor matching: {} candidate pairs, kept {} (fraction {:.2})",
        pairs.len(),
        out.len(),
        config.keep_fraction
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::Keypoint;

    fn set(points: &[(f32, f32, u8)]) -> FeatureSet {
        let mut s = FeatureSet::default();
        for &(x, y, fill) in points {
            s.keypoints.push(Keypoint {
                x,
                y,
                score: 1.0,
                angle: 0.0,
                octave: 0,
            });
            let mut d = [0u8; 32];
            d[0] = fill;
            d[1] = fill.rotate_left(3);
            s.descriptors.push(d);
        }
        s
    }

    #[test]
    fn empty_sets_give_no_pairs() {
        let a = set(&[(1.0, 2.0, 7)]);
        assert!(match_features(&a, &FeatureSet::default(), &FeatureConfig::default()).is_empty());
        assert!(match_features(&FeatureSet::default(), &a, &FeatureConfig::default()).is_empty());
    }

    #[test]
    fn keeps_best_fraction_sorted_by_distance() {
        let fills: Vec<u8> = (0..16).map(|i| (i * 17) as u8).collect();
        let a_pts: Vec<(f32, f32, u8)> = fills
            .iter()
            .enumerate()
            .map(|(i, &f)| (i as f32, 0.0, f))
            .collect();
        let b_pts: Vec<(f32, f32, u8)> = fills
            .iter()
            .enumerate()
            .map(|(i, &f)| (i as f32, 5.0, if i < 8 { f } else { f ^ 0b1 }))
            .collect();
        let cfg = FeatureConfig {
            keep_fraction: 0.25,
            ..FeatureConfig::default()
        };
        let c = match_features(&set(&a_pts), &set(&b_pts), &cfg);
        assert_eq!(c.len(), 4);
        assert!(c.distances.iter().all(|&d| d == 0));
        for (pa, pb) in c.points_a.iter().zip(&c.points_b) {
            assert_eq!(pa[0], pb[0]);
            assert_eq!(pb[1], 5.0);
        }
    }

    #[test]
    fn cross_check_drops_one_sided_matches() {
        // Both B descriptors are nearest to A[0]; only one can be mutual.
        let a = set(&[(0.0, 0.0, 0b1111_0000), (9.0, 9.0, 0b0000_1111)]);
        let b = set(&[(1.0, 1.0, 0b1111_0000), (2.0, 2.0, 0b1111_0001)]);
        let strict = FeatureConfig {
            keep_fraction: 1.0,
            ..FeatureConfig::default()
        };
        let c = match_features(&a, &b, &strict);
        assert_eq!(c.len(), 1);
        assert_eq!(c.points_b[0], [1.0, 1.0]);

        let loose = FeatureConfig {
            cross_check: false,
            ..strict
        };
        assert_eq!(match_features(&a, &b, &loose).len(), 2);
    }

    #[test]
    fn distant_descriptors_are_rejected() {
        let mut a = set(&[(0.0, 0.0, 0)]);
        let mut b = set(&[(0.0, 0.0, 0)]);
        a.descriptors[0] = [0x00; 32];
        b.descriptors[0] = [0xFF; 32];
        assert!(match_features(&a, &b, &FeatureConfig::default()).is_empty());
    }
}
