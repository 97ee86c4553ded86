//! Global greedy nearest-neighbour pairing of annotation centers.

use crate::annotation::DimensionAnnotation;

/// An A/B annotation pair claimed by the matcher (indices into the inputs).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchedPair {
    pub index_a: usize,
    pub index_b: usize,
    /// Center distance in A-frame pixels.
    pub distance: f64,
}

/// Outcome of [`match_annotations`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotationMatches {
    pub pairs: Vec<MatchedPair>,
    pub unmatched_a: Vec<usize>,
    pub unmatched_b: Vec<usize>,
}

/// Pair A annotations with B annotations whose projected centers lie within
/// `tolerance` (inclusive).
///
/// Candidates are claimed by ascending distance; equal distances go to the
/// lower A id, then the lower B id. `projected_b[i]` is the A-frame center of
/// `b[i]`, or `None` when it could not be projected (never matched).
pub fn match_annotations(
    a: &[DimensionAnnotation],
    b: &[DimensionAnnotation],
    projected_b: &[Option<[f64; 2]>],
    tolerance: f64,
) -> AnnotationMatches {
    debug_assert_eq!(b.len(), projected_b.len());

    let centers_a: Vec<[f64; 2]> = a.iter().map(DimensionAnnotation::center).collect();

    // (distance, a index, b index)
    let mut candidates: Vec<(f64, usize, usize)> = Vec::new();
    for (ib, pb) in projected_b.iter().enumerate() {
        let Some(pb) = pb else { continue };
        for (ia, ca) in centers_a.iter().enumerate() {
            let dist = (ca[0] - pb[0]).hypot(ca[1] - pb[1]);
            if dist.is_finite() && dist <= tolerance {
                candidates.push((dist, ia, ib));
            }
        }
    }

    candidates.sort_by(|x, y| {
        x.0.total_cmp(&y.0)
            .then(a[x.1].id.cmp(&a[y.1].id))
            .then(b[x.2].id.cmp(&b[y.2].id))
    });

    let mut used_a = vec![false; a.len()];
    let mut used_b = vec![false; b.len()];
    let mut pairs = Vec::new();

    for (distance, ia, ib) in candidates {
        if used_a[ia] || used_b[ib] {
            continue;
        }
        used_a[ia] = true;
        used_b[ib] = true;
        pairs.push(MatchedPair {
            index_a: ia,
            index_b: ib,
            distance,
        });
    }

    AnnotationMatches {
        pairs,
        unmatched_a: unused(&used_a),
        unmatched_b: unused(&used_b),
    }
}

fn unused(used: &[bool]) -> Vec<usize> {
    (0..used.len()).filter(|&i| !used[i]).collect()
}
