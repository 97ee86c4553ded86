//! Manual alignment from two user-supplied anchor pairs.
//!
//! Used when a page has too little distinguishable geometry for automatic
//! matching (largely blank sheets). The result is a 4-DOF similarity: uniform
//! scale, rotation and translation, no shear or perspective.

use crate::config::AnchorConfig;
use crate::error::AnchorError;
use crate::transform::AlignmentTransform;

/// The same two physical locations marked on both revisions.
///
/// On the wire the fields are `p1A`, `p2A`, `p1B` and `p2B`.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchorPairs {
    pub p1_a: [f64; 2],
    pub p2_a: [f64; 2],
    pub p1_b: [f64; 2],
    pub p2_b: [f64; 2],
}

impl AnchorPairs {
    pub fn new(p1_a: [f64; 2], p2_a: [f64; 2], p1_b: [f64; 2], p2_b: [f64; 2]) -> Self {
        Self {
            p1_a,
            p2_a,
            p1_b,
            p2_b,
        }
    }

    fn is_finite(&self) -> bool {
        [self.p1_a, self.p2_a, self.p1_b, self.p2_b]
            .iter()
            .flatten()
            .all(|v| v.is_finite())
    }
}

/// Build the B → A similarity that sends `p1_b` onto `p1_a` and the B
/// baseline onto the A baseline.
pub fn similarity_from_anchors(
    anchors: &AnchorPairs,
    config: &AnchorConfig,
) -> Result<AlignmentTransform, AnchorError> {
    if !anchors.is_finite() {
        return Err(AnchorError::NonFinite);
    }

    let vec_a = sub(anchors.p2_a, anchors.p1_a);
    let vec_b = sub(anchors.p2_b, anchors.p1_b);
    let len_a = vec_a[0].hypot(vec_a[1]);
    let len_b = vec_b[0].hypot(vec_b[1]);

    if len_b < config.min_separation_px {
        return Err(AnchorError::DegenerateBaseline {
            length: len_b,
            min: config.min_separation_px,
        });
    }
    if len_a < config.min_separation_px {
        return Err(AnchorError::DegenerateBaseline {
            length: len_a,
            min: config.min_separation_px,
        });
    }

    let scale = len_a / len_b;
    if !config.scale_bounds.contains(scale) {
        return Err(AnchorError::ScaleOutOfBounds {
            scale,
            min: config.scale_bounds.min,
            max: config.scale_bounds.max,
        });
    }

    let theta = vec_a[1].atan2(vec_a[0]) - vec_b[1].atan2(vec_b[0]);
    let (sin, cos) = theta.sin_cos();
    let [x, y] = anchors.p1_b;
    let tx = anchors.p1_a[0] - scale * (cos * x - sin * y);
    let ty = anchors.p1_a[1] - scale * (sin * x + cos * y);

    tracing::debug!(
        "Anchor similarity: scale={:.4}, theta={:.3}deg, t=({:.2}, {:.2})",
        scale,
        theta.to_degrees(),
        tx,
        ty
    );

    Ok(AlignmentTransform::similarity(scale, theta, tx, ty))
}

#[inline]
fn sub(a: [f64; 2], b: [f64; 2]) -> [f64; 2] {
    [a[0] - b[0], a[1] - b[1]]
}
