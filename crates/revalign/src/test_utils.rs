//! Synthetic page images for unit tests.

use image::{GrayImage, Luma};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Grey level of pixels shifted in from outside the source page.
pub(crate) const FILL: u8 = 128;

/// Random block texture: `cell × cell` squares of one of eight grey levels.
///
/// Every block junction with enough contrast is a FAST corner, and no two
/// 31×31 neighbourhoods look alike, so descriptors are distinctive.
pub(crate) fn block_texture(w: u32, h: u32, cell: u32, seed: u64) -> GrayImage {
    let mut rng = StdRng::seed_from_u64(seed);
    let cols = w.div_ceil(cell);
    let rows = h.div_ceil(cell);
    let levels: Vec<u8> = (0..cols * rows)
        .map(|_| 16 + 32 * rng.gen_range(0u8..7))
        .collect();

    let mut img = GrayImage::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let v = levels[((y / cell) * cols + x / cell) as usize];
            img.put_pixel(x, y, Luma([v]));
        }
    }
    img
}

/// Move the page content by `(dx, dy)` pixels; uncovered pixels get [`FILL`].
pub(crate) fn shift_image(img: &GrayImage, dx: i32, dy: i32) -> GrayImage {
    let (w, h) = img.dimensions();
    let mut out = GrayImage::from_pixel(w, h, Luma([FILL]));
    for y in 0..h as i32 {
        for x in 0..w as i32 {
            let (sx, sy) = (x - dx, y - dy);
            if sx >= 0 && sy >= 0 && (sx as u32) < w && (sy as u32) < h {
                out.put_pixel(x as u32, y as u32, *img.get_pixel(sx as u32, sy as u32));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn texture_is_seeded() {
        assert_eq!(block_texture(64, 48, 8, 1), block_texture(64, 48, 8, 1));
        assert_ne!(block_texture(64, 48, 8, 1), block_texture(64, 48, 8, 2));
    }

    #[test]
    fn shift_moves_content() {
        let img = block_texture(40, 40, 4, 3);
        let moved = shift_image(&img, 5, -3);
        assert_eq!(moved.get_pixel(15, 10), img.get_pixel(10, 13));
        assert_eq!(moved.get_pixel(2, 2)[0], FILL);
        assert_eq!(moved.get_pixel(20, 38)[0], FILL);
    }
}
