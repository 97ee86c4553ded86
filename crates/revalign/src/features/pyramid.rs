//! Scale pyramid for multi-resolution keypoint detection.

use std::borrow::Cow;

use image::imageops::{self, FilterType};
use image::GrayImage;

use super::brief::PATCH_MARGIN;

/// One pyramid level and its size ratio to level 0.
#[derive(Debug, Clone)]
pub(super) struct PyramidLevel<'a> {
    pub image: Cow<'a, GrayImage>,
    /// Level-0 pixels per level pixel, per axis.
    pub scale: [f32; 2],
}

impl PyramidLevel<'_> {
    /// Map a level pixel position to level-0 pixel coordinates.
    ///
    /// Pixel centers line up the way `imageops::resize` samples them.
    pub fn to_base(&self, p: [f32; 2]) -> [f32; 2] {
        [
            (p[0] + 0.5) * self.scale[0] - 0.5,
            (p[1] + 0.5) * self.scale[1] - 0.5,
        ]
    }
}

/// Build up to `levels` levels, each `factor` times smaller than the last.
///
/// Level 0 borrows `gray`. Levels too small to hold a described keypoint
/// are not built.
pub(super) fn build_pyramid(gray: &GrayImage, levels: usize, factor: f32) -> Vec<PyramidLevel<'_>> {
    let (w0, h0) = gray.dimensions();
    let mut pyramid = Vec::with_capacity(levels.max(1));
    pyramid.push(PyramidLevel {
        image: Cow::Borrowed(gray),
        scale: [1.0, 1.0],
    });

    let mut level_scale = 1.0f32;
    for _ in 1..levels {
        level_scale *= factor;
        let w = (w0 as f32 / level_scale).round() as u32;
        let h = (h0 as f32 / level_scale).round() as u32;
        if w <= 2 * PATCH_MARGIN || h <= 2 * PATCH_MARGIN {
            break;
        }

        let Some(prev) = pyramid.last() else { break };
        let image = imageops::resize(&*prev.image, w, h, FilterType::Gaussian);
        pyramid.push(PyramidLevel {
            image: Cow::Owned(image),
            scale: [w0 as f32 / w as f32, h0 as f32 / h as f32],
        });
    }
    pyramid
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::block_texture;

    #[test]
    fn levels_shrink_by_factor() {
        let img = block_texture(640, 480, 8, 2);
        let pyramid = build_pyramid(&img, 4, 1.2);
        let sizes: Vec<(u32, u32)> = pyramid.iter().map(|l| l.image.dimensions()).collect();
        assert_eq!(sizes, vec![(640, 480), (533, 400), (444, 333), (370, 278)]);
        assert!(matches!(pyramid[0].image, Cow::Borrowed(_)));
        assert!((pyramid[3].scale[0] - 640.0 / 370.0).abs() < 1e-6);
    }

    #[test]
    fn stops_before_levels_become_too_small() {
        let img = block_texture(120, 100, 6, 4);
        let pyramid = build_pyramid(&img, 8, 1.5);
        // 120x100 -> 80x67 -> 53x44, which cannot hold a described keypoint.
        assert_eq!(pyramid.len(), 2);
    }

    #[test]
    fn level_zero_maps_to_itself() {
        let img = block_texture(64, 64, 8, 1);
        let pyramid = build_pyramid(&img, 1, 1.2);
        assert_eq!(pyramid.len(), 1);
        assert_eq!(pyramid[0].to_base([17.0, 40.0]), [17.0, 40.0]);

        let half = PyramidLevel {
            image: Cow::Borrowed(&img),
            scale: [2.0, 2.0],
        };
        assert_eq!(half.to_base([0.0, 10.0]), [0.5, 20.5]);
    }
}
