//! Homography fitting via normalized DLT and RANSAC.
//!
//! Points are `src` (revision B) → `dst` (revision A) pixel coordinates.

use nalgebra::{DMatrix, Matrix3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::RansacHomographyConfig;
use crate::error::AlignmentFailure;
use crate::transform::project;

/// Points of a minimal sample whose triangle area is below this (in
/// normalized units) are treated as collinear.
const COLLINEAR_EPS: f64 = 1e-6;

/// Numerical failure inside the DLT solve.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DltError {
    #[error("too few points: need {needed}, got {got}")]
    TooFewPoints { needed: usize, got: usize },
    #[error("src and dst lengths differ ({src} vs {dst})")]
    LengthMismatch { src: usize, dst: usize },
    #[error("degenerate point configuration")]
    Degenerate,
}

/// Result of RANSAC homography fitting.
#[derive(Debug, Clone)]
pub struct RansacHomographyResult {
    /// Refitted homography (`h[(2, 2)] == 1` when representable).
    pub h: Matrix3<f64>,
    /// `true` for correspondences within the inlier threshold of `h`.
    pub inlier_mask: Vec<bool>,
    pub n_inliers: usize,
    /// Reprojection error of every correspondence under `h`.
    pub errors: Vec<f64>,
}

impl RansacHomographyResult {
    pub fn inlier_ratio(&self) -> f64 {
        if self.errors.is_empty() {
            0.0
        } else {
            self.n_inliers as f64 / self.errors.len() as f64
        }
    }
}

/// ||project(H, src) - dst||, infinite when `src` maps to infinity.
pub fn reprojection_error(h: &Matrix3<f64>, src: &[f64; 2], dst: &[f64; 2]) -> f64 {
    match project(h, *src) {
        Some(p) => (p[0] - dst[0]).hypot(p[1] - dst[1]),
        None => f64::INFINITY,
    }
}

/// Translate the centroid to the origin and scale the mean distance to √2.
fn normalize_points(pts: &[[f64; 2]]) -> (Matrix3<f64>, Vec<[f64; 2]>) {
    let n = pts.len() as f64;
    let cx = pts.iter().map(|p| p[0]).sum::<f64>() / n;
    let cy = pts.iter().map(|p| p[1]).sum::<f64>() / n;
    let mean_dist = pts
        .iter()
        .map(|p| (p[0] - cx).hypot(p[1] - cy))
        .sum::<f64>()
        / n;

    let s = if mean_dist > 1e-15 {
        std::f64::consts::SQRT_2 / mean_dist
    } else {
        1.0
    };
    let t = Matrix3::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0);
    let normalized = pts.iter().map(|p| [s * (p[0] - cx), s * (p[1] - cy)]).collect();
    (t, normalized)
}

/// Least-squares homography from ≥4 correspondences (DLT).
///
/// With exactly four points this is the exact minimal solution; with more it
/// minimizes the algebraic error over all of them.
pub fn estimate_homography_dlt(
    src: &[[f64; 2]],
    dst: &[[f64; 2]],
) -> Result<Matrix3<f64>, DltError> {
    if src.len() != dst.len() {
        return Err(DltError::LengthMismatch {
            src: src.len(),
            dst: dst.len(),
        });
    }
    let n = src.len();
    if n < 4 {
        return Err(DltError::TooFewPoints { needed: 4, got: n });
    }

    let (t_src, src_n) = normalize_points(src);
    let (t_dst, dst_n) = normalize_points(dst);

    let mut a = DMatrix::zeros(2 * n, 9);
    for i in 0..n {
        let [sx, sy] = src_n[i];
        let [dx, dy] = dst_n[i];

        a[(2 * i, 3)] = -sx;
        a[(2 * i, 4)] = -sy;
        a[(2 * i, 5)] = -1.0;
        a[(2 * i, 6)] = dy * sx;
        a[(2 * i, 7)] = dy * sy;
        a[(2 * i, 8)] = dy;

        a[(2 * i + 1, 0)] = sx;
        a[(2 * i + 1, 1)] = sy;
        a[(2 * i + 1, 2)] = 1.0;
        a[(2 * i + 1, 6)] = -dx * sx;
        a[(2 * i + 1, 7)] = -dx * sy;
        a[(2 * i + 1, 8)] = -dx;
    }

    // Null vector of A = eigenvector of AᵀA with the smallest eigenvalue.
    let ata = a.transpose() * &a;
    let eig = nalgebra::SymmetricEigen::new(ata);
    let min_idx = eig
        .eigenvalues
        .iter()
        .enumerate()
        .min_by(|(_, x), (_, y)| x.abs().total_cmp(&y.abs()))
        .map(|(i, _)| i)
        .ok_or(DltError::Degenerate)?;
    let v = eig.eigenvectors.column(min_idx);
    let h_norm = Matrix3::new(v[0], v[1], v[2], v[3], v[4], v[5], v[6], v[7], v[8]);

    let t_dst_inv = t_dst.try_inverse().ok_or(DltError::Degenerate)?;
    let h = t_dst_inv * h_norm * t_src;
    if h.iter().any(|x| !x.is_finite()) {
        return Err(DltError::Degenerate);
    }

    let scale = h[(2, 2)];
    if scale.abs() < 1e-15 {
        Ok(h)
    } else {
        Ok(h / scale)
    }
}

/// `true` when any three of the four sample points are (nearly) collinear.
fn sample_is_degenerate(pts: &[[f64; 2]; 4]) -> bool {
    let (_, norm) = normalize_points(pts);
    let area = |a: [f64; 2], b: [f64; 2], c: [f64; 2]| {
        ((b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0])).abs()
    };
    (0..4).any(|skip| {
        let tri: Vec<[f64; 2]> = (0..4).filter(|&i| i != skip).map(|i| norm[i]).collect();
        area(tri[0], tri[1], tri[2]) < COLLINEAR_EPS
    })
}

/// Sample `k` distinct indices from `0..n` using a Fisher–Yates partial shuffle.
fn sample_indices(rng: &mut impl Rng, n: usize, k: usize) -> Vec<usize> {
    debug_assert!(k <= n);
    let mut indices: Vec<usize> = (0..n).collect();
    for i in 0..k {
        let j = rng.gen_range(i..n);
        indices.swap(i, j);
    }
    indices.truncate(k);
    indices
}

fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    }
}

fn inlier_mask(
    h: &Matrix3<f64>,
    src: &[[f64; 2]],
    dst: &[[f64; 2]],
    thresh: f64,
) -> (Vec<bool>, usize) {
    let mask: Vec<bool> = src
        .iter()
        .zip(dst)
        .map(|(s, d)| reprojection_error(h, s, d) < thresh)
        .collect();
    let count = mask.iter().filter(|&&m| m).count();
    (mask, count)
}

/// Fit a homography with RANSAC over the full iteration budget, then refit
/// on the best consensus set.
///
/// Acceptance thresholds (inlier ratio, scale) are applied by the caller.
pub fn fit_homography_ransac(
    src: &[[f64; 2]],
    dst: &[[f64; 2]],
    config: &RansacHomographyConfig,
) -> Result<RansacHomographyResult, AlignmentFailure> {
    if src.len() != dst.len() {
        return Err(AlignmentFailure::LengthMismatch {
            src: src.len(),
            dst: dst.len(),
        });
    }
    let n = src.len();
    if n < 4 {
        return Err(AlignmentFailure::TooFewCorrespondences { needed: 4, got: n });
    }

    let mut rng = make_rng(config.seed);
    let mut best: Option<(Matrix3<f64>, Vec<bool>, usize)> = None;

    for _ in 0..config.max_iters {
        let idx = sample_indices(&mut rng, n, 4);
        let s4 = [src[idx[0]], src[idx[1]], src[idx[2]], src[idx[3]]];
        let d4 = [dst[idx[0]], dst[idx[1]], dst[idx[2]], dst[idx[3]]];
        if sample_is_degenerate(&s4) || sample_is_degenerate(&d4) {
            continue;
        }

        let Ok(h) = estimate_homography_dlt(&s4, &d4) else {
            continue;
        };

        let (mask, count) = inlier_mask(&h, src, dst, config.inlier_threshold_px);
        if best.as_ref().map_or(true, |(_, _, c)| count > *c) {
            best = Some((h, mask, count));
        }
    }

    let Some((best_h, best_mask, best_count)) = best else {
        return Err(AlignmentFailure::NoModel);
    };
    if best_count < 4 {
        return Err(AlignmentFailure::InsufficientInliers {
            ratio: best_count as f64 / n as f64,
            required: config.min_inlier_ratio,
        });
    }

    let inlier_src: Vec<[f64; 2]> = (0..n).filter(|&i| best_mask[i]).map(|i| src[i]).collect();
    let inlier_dst: Vec<[f64; 2]> = (0..n).filter(|&i| best_mask[i]).map(|i| dst[i]).collect();
    let h = match estimate_homography_dlt(&inlier_src, &inlier_dst) {
        Ok(refit) => {
            // Keep the sample model if the refit lost consensus.
            let (_, refit_count) = inlier_mask(&refit, src, dst, config.inlier_threshold_px);
            if refit_count >= best_count {
                refit
            } else {
                best_h
            }
        }
        Err(_) => best_h,
    };

    let errors: Vec<f64> = src
        .iter()
        .zip(dst)
        .map(|(s, d)| reprojection_error(&h, s, d))
        .collect();
    let inlier_mask: Vec<bool> = errors.iter().map(|&e| e < config.inlier_threshold_px).collect();
    let n_inliers = inlier_mask.iter().filter(|&&m| m).count();

    Ok(RansacHomographyResult {
        h,
        inlier_mask,
        n_inliers,
        errors,
    })
}
