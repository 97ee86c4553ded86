//! Steered BRIEF: 256 pairwise intensity tests rotated by the keypoint angle.

use std::sync::OnceLock;

use image::GrayImage;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::Keypoint;

/// Descriptor length in bytes (256 bits).
pub const DESCRIPTOR_BYTES: usize = 32;

/// Binary fingerprint of a keypoint neighbourhood.
pub type Descriptor = [u8; DESCRIPTOR_BYTES];

/// Test coordinates lie in `[-PATTERN_RADIUS, PATTERN_RADIUS]²` (31×31 patch).
const PATTERN_RADIUS: i32 = 15;

/// Border a keypoint must keep so every steered test (|r| ≤ 15·√2 ≈ 21.2)
/// and the orientation disc stay inside the image.
pub(super) const PATCH_MARGIN: u32 = 23;

/// Fixed seed: both revisions must be described with the same test pairs.
const PATTERN_SEED: u64 = 0x6272_6965_665f_3235;

type TestPair = [i8; 4];

fn test_pattern() -> &'static [TestPair; DESCRIPTOR_BYTES * 8] {
    static PATTERN: OnceLock<[TestPair; DESCRIPTOR_BYTES * 8]> = OnceLock::new();
    PATTERN.get_or_init(|| {
        let mut rng = StdRng::seed_from_u64(PATTERN_SEED);
        let mut pattern = [[0i8; 4]; DESCRIPTOR_BYTES * 8];
        for pair in pattern.iter_mut() {
            loop {
                let mut sample = || rng.gen_range(-PATTERN_RADIUS..=PATTERN_RADIUS) as i8;
                let candidate = [sample(), sample(), sample(), sample()];
                if candidate[0..2] != candidate[2..4] {
                    *pair = candidate;
                    break;
                }
            }
        }
        pattern
    })
}

/// Describe `kp` on the (smoothed) image. The keypoint must respect [`PATCH_MARGIN`].
pub(super) fn describe(img: &GrayImage, kp: &Keypoint) -> Descriptor {
    let w = img.width() as i32;
    let raw = img.as_raw();
    let (cx, cy) = (kp.x as i32, kp.y as i32);
    let (sin, cos) = kp.angle.sin_cos();

    let sample = |dx: i8, dy: i8| -> u8 {
        let (dx, dy) = (f32::from(dx), f32::from(dy));
        let rx = (dx * cos - dy * sin).round() as i32;
        let ry = (dx * sin + dy * cos).round() as i32;
        raw[((cy + ry) * w + cx + rx) as usize]
    };

    let mut descriptor = [0u8; DESCRIPTOR_BYTES];
    for (byte_idx, tests) in test_pattern().chunks(8).enumerate() {
        let mut byte = 0u8;
        for (bit, &[x1, y1, x2, y2]) in tests.iter().enumerate() {
            if sample(x1, y1) < sample(x2, y2) {
                byte |= 1 << bit;
            }
        }
        descriptor[byte_idx] = byte;
    }
    descriptor
}

/// Number of differing bits.
#[inline]
pub fn hamming_distance(a: &Descriptor, b: &Descriptor) -> u32 {
    a.iter().zip(b).map(|(x, y)| (x ^ y).count_ones()).sum()
}
