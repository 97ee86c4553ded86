//! Acceptance of an automatic alignment from matched features.

use crate::config::RansacHomographyConfig;
use crate::error::AlignmentFailure;
use crate::features::Correspondences;
use crate::transform::{linear_scale, AlignmentTransform};

use super::core::fit_homography_ransac;
use super::residuals::InlierResiduals;

/// Diagnostics of an accepted RANSAC fit.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RansacStats {
    pub n_candidates: usize,
    pub n_inliers: usize,
    pub inlier_ratio: f64,
    pub threshold_px: f64,
    pub mean_err_px: f64,
    pub p95_err_px: f64,
    /// `sqrt(|det|)` of the linear part.
    pub scale: f64,
}

/// An accepted automatic alignment.
#[derive(Debug, Clone, PartialEq)]
pub struct HomographyEstimate {
    /// B → A transform. Snapped to identity when `images_identical`.
    pub transform: AlignmentTransform,
    pub stats: RansacStats,
    /// Every B page corner moves by less than the identical tolerance.
    pub images_identical: bool,
}

/// Corners of a `width × height` page, clockwise from the origin.
fn page_corners(width: u32, height: u32) -> [[f64; 2]; 4] {
    let (w, h) = (f64::from(width), f64::from(height));
    [[0.0, 0.0], [w, 0.0], [w, h], [0.0, h]]
}

/// Fit a B → A homography and apply the acceptance checks (inlier ratio,
/// scale bounds).
///
/// `page_size_b` is `(width, height)` of the B image; its corners decide
/// whether the two images are identical.
pub fn estimate_alignment(
    correspondences: &Correspondences,
    config: &RansacHomographyConfig,
    page_size_b: (u32, u32),
) -> Result<HomographyEstimate, AlignmentFailure> {
    let n = correspondences.len();
    let result =
        fit_homography_ransac(&correspondences.points_b, &correspondences.points_a, config)?;

    let ratio = result.inlier_ratio();
    if ratio < config.min_inlier_ratio {
        tracing::debug!(
            "Homography rejected: {}/{} inliers (ratio {:.3} < {:.3})",
            result.n_inliers,
            n,
            ratio,
            config.min_inlier_ratio
        );
        return Err(AlignmentFailure::InsufficientInliers {
            ratio,
            required: config.min_inlier_ratio,
        });
    }

    let scale = linear_scale(&result.h);
    if !config.scale_bounds.contains(scale) {
        tracing::debug!("Homography rejected: implied scale {:.4}", scale);
        return Err(AlignmentFailure::ScaleOutOfBounds {
            scale,
            min: config.scale_bounds.min,
            max: config.scale_bounds.max,
        });
    }

    let residuals = InlierResiduals::of(&result);
    let stats = RansacStats {
        n_candidates: n,
        n_inliers: result.n_inliers,
        inlier_ratio: ratio,
        threshold_px: config.inlier_threshold_px,
        mean_err_px: residuals.mean_px,
        p95_err_px: residuals.p95_px,
        scale,
    };

    let fitted = AlignmentTransform::homography(result.h, ratio);
    let corners = page_corners(page_size_b.0, page_size_b.1);
    let displacement = fitted.max_displacement(&corners);
    let images_identical = displacement < config.identical_tolerance_px;

    tracing::debug!(
        "Homography accepted: {}/{} inliers, mean err {:.2}px, p95 {:.2}px, \
         scale {:.4}, corner shift {:.2}px",
        stats.n_inliers,
        n,
        stats.mean_err_px,
        stats.p95_err_px,
        scale,
        displacement
    );

    let transform = if images_identical {
        AlignmentTransform::identity()
    } else {
        fitted
    };

    Ok(HomographyEstimate {
        transform,
        stats,
        images_identical,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::{project, TransformKind};
    use approx::assert_relative_eq;
    use nalgebra::Matrix3;

    fn corr_from(h: &Matrix3<f64>, n: usize) -> Correspondences {
        let mut c = Correspondences::default();
        for i in 0..n {
            let b = [30.0 + (i % 7) as f64 * 80.0, 20.0 + (i / 7) as f64 * 65.0];
            let a = project(h, b).unwrap();
            c.push(a, b, 0);
        }
        c
    }

    fn seeded() -> RansacHomographyConfig {
        RansacHomographyConfig {
            seed: Some(17),
            max_iters: 200,
            ..RansacHomographyConfig::default()
        }
    }

    #[test]
    fn accepts_translation() {
        let h = Matrix3::new(1.0, 0.0, 12.0, 0.0, 1.0, -7.0, 0.0, 0.0, 1.0);
        let est = estimate_alignment(&corr_from(&h, 35), &seeded(), (600, 400)).unwrap();
        assert!(!est.images_identical);
        assert_eq!(est.transform.kind, TransformKind::Homography);
        assert_eq!(est.stats.n_inliers, 35);
        assert_relative_eq!(est.stats.scale, 1.0, epsilon = 1e-9);
        let q = est.transform.apply([100.0, 100.0]).unwrap();
        assert_relative_eq!(q[0], 112.0, epsilon = 1e-6);
        assert_relative_eq!(q[1], 93.0, epsilon = 1e-6);
    }

    #[test]
    fn identity_fit_snaps_to_identity() {
        let corr = corr_from(&Matrix3::identity(), 28);
        let est = estimate_alignment(&corr, &seeded(), (600, 400)).unwrap();
        assert!(est.images_identical);
        assert_eq!(est.transform, AlignmentTransform::identity());
        assert_relative_eq!(est.stats.inlier_ratio, 1.0);
    }

    #[test]
    fn rejects_low_inlier_ratio() {
        let h = Matrix3::new(1.0, 0.0, 5.0, 0.0, 1.0, 5.0, 0.0, 0.0, 1.0);
        let mut c = corr_from(&h, 35);
        // Scramble most pairs so no model explains more than a handful.
        for i in 0..30 {
            c.points_a[i] = [((i * 97) % 613) as f64, ((i * 53) % 401) as f64 + 0.5 * i as f64];
        }
        let config = RansacHomographyConfig {
            min_inlier_ratio: 0.5,
            ..seeded()
        };
        let err = estimate_alignment(&c, &config, (600, 400)).unwrap_err();
        assert!(matches!(
            err,
            AlignmentFailure::InsufficientInliers { required, .. } if required == 0.5
        ));
    }

    #[test]
    fn rejects_extreme_scale() {
        let h = Matrix3::new(20.0, 0.0, 0.0, 0.0, 20.0, 0.0, 0.0, 0.0, 1.0);
        let err = estimate_alignment(&corr_from(&h, 21), &seeded(), (600, 400)).unwrap_err();
        assert!(matches!(
            err,
            AlignmentFailure::ScaleOutOfBounds { scale, .. } if (scale - 20.0).abs() < 1e-6
        ));
    }

    #[test]
    fn too_few_pairs() {
        let c = corr_from(&Matrix3::identity(), 3);
        assert_eq!(
            estimate_alignment(&c, &seeded(), (600, 400)),
            Err(AlignmentFailure::TooFewCorrespondences { needed: 4, got: 3 })
        );
    }
}
