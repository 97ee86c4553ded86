//! FAST-9 corner detection with grid non-maximum suppression and
//! intensity-centroid orientation.

use std::collections::HashMap;

use image::GrayImage;
use imageproc::corners::{corners_fast9, Corner};

use crate::config::FeatureConfig;

use super::brief::PATCH_MARGIN;
use super::Keypoint;

/// Radius of the circular patch used for the orientation moment.
const ORIENTATION_RADIUS: i32 = 15;

/// Detect up to `cap` corners, strongest first.
///
/// Corners closer than [`PATCH_MARGIN`] to the border are dropped so that
/// every returned keypoint can be oriented and described.
pub(super) fn detect_corners(
    gray: &GrayImage,
    config: &FeatureConfig,
    cap: usize,
) -> Vec<Keypoint> {
    let (w, h) = gray.dimensions();
    if w <= 2 * PATCH_MARGIN || h <= 2 * PATCH_MARGIN {
        return Vec::new();
    }

    let mut corners: Vec<Corner> = corners_fast9(gray, config.fast_threshold)
        .into_iter()
        .filter(|c| {
            c.x >= PATCH_MARGIN
                && c.y >= PATCH_MARGIN
                && c.x < w - PATCH_MARGIN
                && c.y < h - PATCH_MARGIN
        })
        .collect();

    corners.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.y.cmp(&b.y))
            .then_with(|| a.x.cmp(&b.x))
    });

    let selected = suppress_non_maxima(&corners, config.nms_radius_px, cap);
    tracing::trace!(
        "FAST: {} raw corners, {} after suppression (cap {})",
        corners.len(),
        selected.len(),
        cap
    );
    selected
}

/// Greedy suppression over score-sorted corners using a hash grid.
fn suppress_non_maxima(sorted: &[Corner], radius: f32, cap: usize) -> Vec<Keypoint> {
    let mut selected = Vec::with_capacity(cap.min(sorted.len()));
    if radius <= 0.0 {
        selected.extend(sorted.iter().take(cap).map(to_keypoint));
        return selected;
    }

    let cell = radius.max(1.0);
    let r2 = radius * radius;
    let mut grid: HashMap<(i32, i32), Vec<[f32; 2]>> = HashMap::new();

    for corner in sorted {
        if selected.len() >= cap {
            break;
        }
        let p = [corner.x as f32, corner.y as f32];
        let gx = (p[0] / cell) as i32;
        let gy = (p[1] / cell) as i32;

        let suppressed = (-1..=1).any(|dy| {
            (-1..=1).any(|dx| {
                grid.get(&(gx + dx, gy + dy)).is_some_and(|pts| {
                    pts.iter().any(|q| {
                        let ddx = q[0] - p[0];
                        let ddy = q[1] - p[1];
                        ddx * ddx + ddy * ddy <= r2
                    })
                })
            })
        });
        if suppressed {
            continue;
        }

        grid.entry((gx, gy)).or_default().push(p);
        selected.push(to_keypoint(corner));
    }
    selected
}

fn to_keypoint(c: &Corner) -> Keypoint {
    Keypoint {
        x: c.x as f32,
        y: c.y as f32,
        score: c.score,
        angle: 0.0,
        octave: 0,
    }
}

/// Orientation of the intensity centroid of a disc around `(x, y)`.
///
/// The caller guarantees the disc lies inside the image.
pub(super) fn orientation(img: &GrayImage, x: u32, y: u32) -> f32 {
    let w = img.width() as i32;
    let raw = img.as_raw();
    let (cx, cy) = (x as i32, y as i32);
    let r2 = ORIENTATION_RADIUS * ORIENTATION_RADIUS;

    let mut m01 = 0i64;
    let mut m10 = 0i64;
    for dy in -ORIENTATION_RADIUS..=ORIENTATION_RADIUS {
        let row = (cy + dy) * w;
        for dx in -ORIENTATION_RADIUS..=ORIENTATION_RADIUS {
            if dx * dx + dy * dy > r2 {
                continue;
            }
            let v = i64::from(raw[(row + cx + dx) as usize]);
            m10 += v * i64::from(dx);
            m01 += v * i64::from(dy);
        }
    }
    (m01 as f32).atan2(m10 as f32)
}
