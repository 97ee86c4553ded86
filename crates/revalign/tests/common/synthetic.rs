use image::{GrayImage, Luma};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use revalign::{BoundingBox, DimensionAnnotation};

/// Random block texture standing in for a dense drawing.
pub fn block_texture(w: u32, h: u32, cell: u32, seed: u64) -> GrayImage {
    let mut rng = StdRng::seed_from_u64(seed);
    let cols = w.div_ceil(cell);
    let rows = h.div_ceil(cell);
    let levels: Vec<u8> = (0..cols * rows)
        .map(|_| 16 + 32 * rng.gen_range(0u8..7))
        .collect();
    GrayImage::from_fn(w, h, |x, y| Luma([levels[((y / cell) * cols + x / cell) as usize]]))
}

/// Similarity `p' = s·R(θ)·(p - c) + c + t` about the image center `c`.
#[derive(Debug, Clone, Copy)]
pub struct Similarity {
    pub scale: f64,
    pub theta_deg: f64,
    pub t: [f64; 2],
    pub center: [f64; 2],
}

impl Similarity {
    pub fn forward(&self, p: [f64; 2]) -> [f64; 2] {
        let (s, c) = self.theta_deg.to_radians().sin_cos();
        let (x, y) = (p[0] - self.center[0], p[1] - self.center[1]);
        [
            self.scale * (c * x - s * y) + self.center[0] + self.t[0],
            self.scale * (s * x + c * y) + self.center[1] + self.t[1],
        ]
    }

    pub fn backward(&self, q: [f64; 2]) -> [f64; 2] {
        let (s, c) = self.theta_deg.to_radians().sin_cos();
        let x = (q[0] - self.center[0] - self.t[0]) / self.scale;
        let y = (q[1] - self.center[1] - self.t[1]) / self.scale;
        [c * x + s * y + self.center[0], -s * x + c * y + self.center[1]]
    }
}

fn sample_bilinear(img: &GrayImage, x: f64, y: f64, fill: f64) -> f64 {
    let (w, h) = img.dimensions();
    if x < 0.0 || y < 0.0 || x > (w - 1) as f64 || y > (h - 1) as f64 {
        return fill;
    }
    let (x0, y0) = (x.floor() as u32, y.floor() as u32);
    let (x1, y1) = ((x0 + 1).min(w - 1), (y0 + 1).min(h - 1));
    let (fx, fy) = (x - x0 as f64, y - y0 as f64);
    let p = |xx: u32, yy: u32| img.get_pixel(xx, yy)[0] as f64;
    let top = p(x0, y0) * (1.0 - fx) + p(x1, y0) * fx;
    let bottom = p(x0, y1) * (1.0 - fx) + p(x1, y1) * fx;
    top * (1.0 - fy) + bottom * fy
}

/// Render `img` as seen through `warp` (content at `p` moves to `warp.forward(p)`).
pub fn warp_image(img: &GrayImage, warp: &Similarity) -> GrayImage {
    GrayImage::from_fn(img.width(), img.height(), |x, y| {
        let src = warp.backward([x as f64, y as f64]);
        let v = sample_bilinear(img, src[0], src[1], 128.0);
        Luma([v.round().clamp(0.0, 255.0) as u8])
    })
}

/// 40×16 annotation box centered on `center`.
pub fn annotation(id: u64, page: u32, center: [f64; 2], value: &str) -> DimensionAnnotation {
    DimensionAnnotation::new(
        id,
        BoundingBox::new(center[0] - 20.0, center[1] - 8.0, center[0] + 20.0, center[1] + 8.0),
        value,
        page,
    )
}
