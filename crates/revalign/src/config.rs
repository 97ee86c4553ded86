//! Tunable thresholds for a comparison request.
//!
//! All defaults are heuristics taken from manual tuning on scanned drawings;
//! they are meant to be overridden per deployment (JSON file or CLI flags).

use std::path::Path;

use crate::error::ConfigError;

/// Accepted range for the uniform scale implied by a transform.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScaleBounds {
    pub min: f64,
    pub max: f64,
}

impl Default for ScaleBounds {
    fn default() -> Self {
        Self {
            min: 0.1,
            max: 10.0,
        }
    }
}

impl ScaleBounds {
    pub fn contains(&self, scale: f64) -> bool {
        scale.is_finite() && scale >= self.min && scale <= self.max
    }
}

/// Keypoint detection, description and matching.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Maximum keypoints kept per image, across all pyramid levels
    /// (strongest FAST responses).
    pub max_keypoints: usize,
    /// Number of pyramid levels, level 0 being the page itself.
    pub pyramid_levels: usize,
    /// Downscale factor between consecutive pyramid levels.
    pub pyramid_scale: f32,
    /// FAST-9 intensity threshold.
    pub fast_threshold: u8,
    /// Radius (px) of the grid non-maximum suppression applied to corners.
    pub nms_radius_px: f32,
    /// Fewer keypoints than this in either image means low feature density.
    pub min_keypoints: usize,
    /// Gaussian sigma of the smoothing applied before descriptor tests.
    pub blur_sigma: f32,
    /// Fraction of the best-scoring matches retained as correspondences.
    pub keep_fraction: f64,
    /// Keep only mutual nearest neighbours.
    pub cross_check: bool,
    /// Matches with a larger Hamming distance (out of 256) are discarded.
    pub max_hamming_distance: u32,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            max_keypoints: 5000,
            pyramid_levels: 8,
            pyramid_scale: 1.2,
            fast_threshold: 20,
            nms_radius_px: 3.0,
            min_keypoints: 10,
            blur_sigma: 2.0,
            keep_fraction: 0.25,
            cross_check: true,
            max_hamming_distance: 80,
        }
    }
}

/// RANSAC homography estimation.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RansacHomographyConfig {
    /// Number of RANSAC iterations (fixed budget, no early exit).
    pub max_iters: usize,
    /// Inlier threshold (reprojection error in pixels).
    pub inlier_threshold_px: f64,
    /// Minimum accepted inlier ratio in [0, 1].
    pub min_inlier_ratio: f64,
    /// Accepted range for the implied scale factor.
    pub scale_bounds: ScaleBounds,
    /// Page-corner displacement (px) below which two images count as identical.
    pub identical_tolerance_px: f64,
    /// Random seed. `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl Default for RansacHomographyConfig {
    fn default() -> Self {
        Self {
            max_iters: 1000,
            inlier_threshold_px: 5.0,
            min_inlier_ratio: 0.2,
            scale_bounds: ScaleBounds::default(),
            identical_tolerance_px: 0.5,
            seed: None,
        }
    }
}

/// Manual anchor validation.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AnchorConfig {
    /// Minimum distance (px) between the two anchors of one revision.
    pub min_separation_px: f64,
    pub scale_bounds: ScaleBounds,
}

impl Default for AnchorConfig {
    fn default() -> Self {
        Self {
            min_separation_px: 1.0,
            scale_bounds: ScaleBounds::default(),
        }
    }
}

/// Dimension matching.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Match radius at native resolution (px); scaled by the transform scale.
    pub tolerance_px: f64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self { tolerance_px: 50.0 }
    }
}

/// Multi-page orchestration.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Worker threads for page-level parallelism; `0` uses the rayon default.
    pub max_workers: usize,
    /// Skip nearest-neighbour matching when the images are identical and
    /// both annotation lists are equal.
    pub short_circuit_identical: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_workers: 0,
            short_circuit_identical: true,
        }
    }
}

/// Full comparison configuration.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CompareConfig {
    pub features: FeatureConfig,
    pub ransac: RansacHomographyConfig,
    pub anchors: AnchorConfig,
    pub matching: MatchConfig,
    pub orchestrator: OrchestratorConfig,
}

impl CompareConfig {
    /// Load and validate a JSON config; missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json_str(&data)
    }

    pub fn from_json_str(data: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(data)?;
        config.validate().map_err(ConfigError::Invalid)?;
        Ok(config)
    }

    /// Same config with a fixed RANSAC seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.ransac.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        let f = &self.features;
        if f.max_keypoints == 0 {
            return Err("features.max_keypoints must be >= 1".to_string());
        }
        if f.min_keypoints > f.max_keypoints {
            return Err(
                "features.min_keypoints must not exceed features.max_keypoints".to_string(),
            );
        }
        if f.pyramid_levels == 0 || f.pyramid_levels > usize::from(u8::MAX) {
            return Err("features.pyramid_levels must be in [1, 255]".to_string());
        }
        if !f.pyramid_scale.is_finite() || f.pyramid_scale <= 1.0 {
            return Err("features.pyramid_scale must be finite and > 1".to_string());
        }
        if !f.nms_radius_px.is_finite() || f.nms_radius_px < 0.0 {
            return Err("features.nms_radius_px must be finite and >= 0".to_string());
        }
        if !f.blur_sigma.is_finite() || f.blur_sigma <= 0.0 {
            return Err("features.blur_sigma must be finite and > 0".to_string());
        }
        if !(f.keep_fraction > 0.0 && f.keep_fraction <= 1.0) {
            return Err("features.keep_fraction must be in (0, 1]".to_string());
        }

        let r = &self.ransac;
        if r.max_iters == 0 {
            return Err("ransac.max_iters must be >= 1".to_string());
        }
        if !r.inlier_threshold_px.is_finite() || r.inlier_threshold_px <= 0.0 {
            return Err("ransac.inlier_threshold_px must be finite and > 0".to_string());
        }
        if !(0.0..=1.0).contains(&r.min_inlier_ratio) {
            return Err("ransac.min_inlier_ratio must be in [0, 1]".to_string());
        }
        if !r.identical_tolerance_px.is_finite() || r.identical_tolerance_px < 0.0 {
            return Err("ransac.identical_tolerance_px must be finite and >= 0".to_string());
        }
        validate_scale_bounds("ransac.scale_bounds", &r.scale_bounds)?;

        if !self.anchors.min_separation_px.is_finite() || self.anchors.min_separation_px <= 0.0 {
            return Err("anchors.min_separation_px must be finite and > 0".to_string());
        }
        validate_scale_bounds("anchors.scale_bounds", &self.anchors.scale_bounds)?;

        if !self.matching.tolerance_px.is_finite() || self.matching.tolerance_px < 0.0 {
            return Err("matching.tolerance_px must be finite and >= 0".to_string());
        }
        Ok(())
    }
}

fn validate_scale_bounds(name: &str, b: &ScaleBounds) -> Result<(), String> {
    if !b.min.is_finite() || !b.max.is_finite() || b.min <= 0.0 || b.min > b.max {
        return Err(format!("{name} must satisfy 0 < min <= max"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let c = CompareConfig::default();
        assert!(c.validate().is_ok());
        assert_eq!(c.features.max_keypoints, 5000);
        assert_eq!(c.features.keep_fraction, 0.25);
        assert_eq!(c.features.min_keypoints, 10);
        assert_eq!(c.features.pyramid_levels, 8);
        assert_eq!(c.features.pyramid_scale, 1.2);
        assert_eq!(c.ransac.max_iters, 1000);
        assert_eq!(c.ransac.inlier_threshold_px, 5.0);
        assert_eq!(c.ransac.min_inlier_ratio, 0.2);
        assert_eq!(c.ransac.scale_bounds, ScaleBounds { min: 0.1, max: 10.0 });
        assert_eq!(c.matching.tolerance_px, 50.0);
        assert!(c.ransac.seed.is_none());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let c = CompareConfig::from_json_str(
            r#"{
                "ransac": { "max_iters": 250, "seed": 7 },
                "matching": { "tolerance_px": 30.0 }
            }"#,
        )
        .expect("valid config");
        assert_eq!(c.ransac.max_iters, 250);
        assert_eq!(c.ransac.seed, Some(7));
        assert_eq!(c.ransac.inlier_threshold_px, 5.0);
        assert_eq!(c.matching.tolerance_px, 30.0);
        assert_eq!(c.features, FeatureConfig::default());
    }

    #[test]
    fn rejects_inverted_scale_bounds() {
        let err = CompareConfig::from_json_str(
            r#"{ "anchors": { "scale_bounds": { "min": 5.0, "max": 2.0 } } }"#,
        )
        .expect_err("must reject");
        assert!(matches!(err, ConfigError::Invalid(ref m) if m.contains("anchors.scale_bounds")));
    }

    #[test]
    fn rejects_zero_keep_fraction() {
        let mut c = CompareConfig::default();
        c.features.keep_fraction = 0.0;
        assert!(c.validate().is_err());
    }

    #[test]
    fn rejects_flat_pyramid() {
        let mut c = CompareConfig::default();
        c.features.pyramid_scale = 1.0;
        assert!(c.validate().is_err());

        let mut c = CompareConfig::default();
        c.features.pyramid_levels = 0;
        assert!(c.validate().is_err());

        c.features.pyramid_levels = 1;
        assert!(c.validate().is_ok());
    }

    #[test]
    fn scale_bounds_are_inclusive() {
        let b = ScaleBounds::default();
        assert!(b.contains(0.1));
        assert!(b.contains(10.0));
        assert!(!b.contains(10.0001));
        assert!(!b.contains(f64::NAN));
    }
}
