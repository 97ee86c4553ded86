//! Residual summary of an accepted RANSAC fit.

use super::core::RansacHomographyResult;

/// Reprojection error over the inliers of a fit, in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(super) struct InlierResiduals {
    pub mean_px: f64,
    /// Nearest-rank 95th percentile.
    pub p95_px: f64,
}

impl InlierResiduals {
    /// Zero when the fit has no inliers.
    pub fn of(fit: &RansacHomographyResult) -> Self {
        let mut residuals: Vec<f64> = fit
            .errors
            .iter()
            .zip(&fit.inlier_mask)
            .filter(|(_, &inlier)| inlier)
            .map(|(&err, _)| err)
            .collect();
        if residuals.is_empty() {
            return Self::default();
        }

        residuals.sort_by(f64::total_cmp);
        let n = residuals.len();
        let rank = ((0.95 * n as f64).ceil() as usize).clamp(1, n);
        Self {
            mean_px: residuals.iter().sum::<f64>() / n as f64,
            p95_px: residuals[rank - 1],
        }
    }
}
