use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{GrayImage, Luma};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use revalign::{
    extract_features, fit_homography_ransac, match_features, project, FeatureConfig,
    RansacHomographyConfig,
};

/// Drawing-like page: white sheet, random rectangles and crossing lines.
fn make_page_fixture(width: u32, height: u32, seed: u64) -> GrayImage {
    let mut img = GrayImage::from_pixel(width, height, Luma([245u8]));
    let mut rng = StdRng::seed_from_u64(seed);

    for _ in 0..220 {
        let x0 = rng.gen_range(0..width - 40);
        let y0 = rng.gen_range(0..height - 40);
        let w = rng.gen_range(8..40);
        let h = rng.gen_range(8..40);
        let v = rng.gen_range(10u8..160);
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                img.put_pixel(x, y, Luma([v]));
            }
        }
    }
    for _ in 0..60 {
        let horizontal = rng.gen_bool(0.5);
        let at = rng.gen_range(0..if horizontal { height } else { width });
        let len = if horizontal { width } else { height };
        for i in 0..len {
            let (x, y) = if horizontal { (i, at) } else { (at, i) };
            img.put_pixel(x, y, Luma([20]));
        }
    }
    img
}

fn shifted(img: &GrayImage, dx: u32, dy: u32) -> GrayImage {
    let (w, h) = img.dimensions();
    GrayImage::from_fn(w, h, |x, y| {
        if x >= dx && y >= dy {
            *img.get_pixel(x - dx, y - dy)
        } else {
            Luma([245])
        }
    })
}

fn bench_extract(c: &mut Criterion) {
    let config = FeatureConfig::default();
    let page = make_page_fixture(1700, 1100, 1);
    c.bench_function("extract_features_1700x1100", |b| {
        b.iter(|| extract_features(black_box(&page), &config))
    });
}

fn bench_match(c: &mut Criterion) {
    let config = FeatureConfig {
        max_keypoints: 2000,
        ..FeatureConfig::default()
    };
    let page_a = make_page_fixture(1200, 900, 2);
    let page_b = shifted(&page_a, 17, 11);
    let fa = extract_features(&page_a, &config);
    let fb = extract_features(&page_b, &config);
    c.bench_function("match_features_2000", |b| {
        b.iter(|| match_features(black_box(&fa), black_box(&fb), &config))
    });
}

fn bench_ransac(c: &mut Criterion) {
    let h = nalgebra::Matrix3::new(0.99, -0.03, 25.0, 0.03, 0.99, -12.0, 1e-5, 0.0, 1.0);
    let mut rng = StdRng::seed_from_u64(3);
    let src: Vec<[f64; 2]> = (0..400)
        .map(|_| [rng.gen_range(0.0..1600.0), rng.gen_range(0.0..1000.0)])
        .collect();
    let dst: Vec<[f64; 2]> = src
        .iter()
        .enumerate()
        .map(|(i, &p)| {
            if i % 3 == 0 {
                [rng.gen_range(0.0..1600.0), rng.gen_range(0.0..1000.0)]
            } else {
                project(&h, p).unwrap_or(p)
            }
        })
        .collect();
    let config = RansacHomographyConfig {
        seed: Some(9),
        ..RansacHomographyConfig::default()
    };
    c.bench_function("ransac_homography_400pts_1000it", |b| {
        b.iter(|| fit_homography_ransac(black_box(&src), black_box(&dst), &config))
    });
}

criterion_group!(hotpaths, bench_extract, bench_match, bench_ransac);
criterion_main!(hotpaths);
