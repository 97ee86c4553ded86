//! Keypoint detection, binary description and descriptor matching.
//!
//! Keypoints are FAST-9 corners with an intensity-centroid orientation, found
//! on every level of a scale pyramid. The keypoint budget is shared between
//! levels in proportion to their area. Each keypoint is described by a
//! 256-bit steered BRIEF fingerprint computed on a Gaussian-smoothed copy of
//! its level and reported in level-0 coordinates. Correspondences between two
//! pages are brute-force Hamming nearest neighbours, of which only the
//! best-scoring fraction is kept for robust estimation.

mod brief;
mod fast;
mod matching;
mod pyramid;

use image::GrayImage;
use rayon::prelude::*;

use crate::config::FeatureConfig;

use pyramid::{build_pyramid, PyramidLevel};

pub use brief::{hamming_distance, Descriptor, DESCRIPTOR_BYTES};
pub use matching::{match_features, Correspondences, MIN_CORRESPONDENCES};

/// An oriented keypoint in page-pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    /// FAST corner score (higher is stronger).
    pub score: f32,
    /// Orientation in radians, image axes (y down).
    pub angle: f32,
    /// Pyramid level the keypoint was detected on.
    pub octave: u8,
}

/// Keypoints of one page with their descriptors (same order).
#[derive(Debug, Clone, Default)]
pub struct FeatureSet {
    pub keypoints: Vec<Keypoint>,
    pub descriptors: Vec<Descriptor>,
}

impl FeatureSet {
    pub fn len(&self) -> usize {
        self.keypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }

    /// Keypoint position as `[x, y]` in f64.
    pub fn point(&self, index: usize) -> [f64; 2] {
        let kp = &self.keypoints[index];
        [f64::from(kp.x), f64::from(kp.y)]
    }
}

/// Detect and orient up to `config.max_keypoints` keypoints, without descriptors.
pub fn extract_keypoints(gray: &GrayImage, config: &FeatureConfig) -> Vec<Keypoint> {
    extract_features(gray, config).keypoints
}

/// Detect, orient and describe up to `config.max_keypoints` keypoints over
/// all pyramid levels, strongest first.
pub fn extract_features(gray: &GrayImage, config: &FeatureConfig) -> FeatureSet {
    let pyramid = build_pyramid(gray, config.pyramid_levels, config.pyramid_scale);
    let quotas = level_quotas(&pyramid, config.max_keypoints);
    let mut described: Vec<(Keypoint, Descriptor)> = pyramid
        .par_iter()
        .zip(quotas.par_iter())
        .enumerate()
        .flat_map_iter(|(octave, (level, &cap))| describe_level(level, octave as u8, cap, config))
        .collect();

    described.sort_by(|(a, _), (b, _)| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.octave.cmp(&b.octave))
            .then_with(|| a.y.total_cmp(&b.y))
            .then_with(|| a.x.total_cmp(&b.x))
    });
    tracing::debug!(
        "Extracted {} keypoints over {} pyramid levels",
        described.len(),
        pyramid.len()
    );

    let (keypoints, descriptors) = described.into_iter().unzip();
    FeatureSet {
        keypoints,
        descriptors,
    }
}

/// Split `total` keypoints between levels in proportion to their area; the
/// rounding remainder goes to level 0.
fn level_quotas(pyramid: &[PyramidLevel<'_>], total: usize) -> Vec<usize> {
    let areas: Vec<f64> = pyramid
        .iter()
        .map(|level| {
            let (w, h) = level.image.dimensions();
            f64::from(w) * f64::from(h)
        })
        .collect();
    let sum: f64 = areas.iter().sum();
    if sum <= 0.0 {
        return vec![0; pyramid.len()];
    }

    let mut quotas: Vec<usize> = areas
        .iter()
        .map(|area| (total as f64 * area / sum).floor() as usize)
        .collect();
    let assigned: usize = quotas.iter().sum();
    if let Some(first) = quotas.first_mut() {
        *first += total.saturating_sub(assigned);
    }
    quotas
}

/// Up to `cap` keypoints of one level, described on that level and mapped to level 0.
fn describe_level(
    level: &PyramidLevel<'_>,
    octave: u8,
    cap: usize,
    config: &FeatureConfig,
) -> Vec<(Keypoint, Descriptor)> {
    let corners = fast::detect_corners(&*level.image, config, cap);
    if corners.is_empty() {
        return Vec::new();
    }

    let smoothed = imageproc::filter::gaussian_blur_f32(&*level.image, config.blur_sigma);
    corners
        .par_iter()
        .map(|corner| {
            let mut kp = *corner;
            kp.angle = fast::orientation(&smoothed, kp.x as u32, kp.y as u32);
            let descriptor = brief::describe(&smoothed, &kp);
            let [x, y] = level.to_base([kp.x, kp.y]);
            kp.x = x;
            kp.y = y;
            kp.octave = octave;
            (kp, descriptor)
        })
        .collect()
}
