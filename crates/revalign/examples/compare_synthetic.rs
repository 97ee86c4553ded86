use image::{GrayImage, Luma};
use revalign::{
    AnchorPairs, BoundingBox, Comparator, CompareConfig, CompareRequest, DimensionAnnotation,
    PageAlignment, PageInput,
};
use std::error::Error;

/// Two-page synthetic document: page 1 is a textured sheet shifted between
/// revisions, page 2 is a blank sheet that needs manual anchors.
fn main() -> Result<(), Box<dyn Error>> {
    let sheet = GrayImage::from_fn(800, 600, |x, y| {
        let cell = (x / 10).wrapping_mul(73_856_093) ^ (y / 10).wrapping_mul(19_349_663);
        Luma([(30 + (cell % 7) * 30) as u8])
    });
    let moved = GrayImage::from_fn(800, 600, |x, y| {
        if x >= 12 && y >= 8 {
            *sheet.get_pixel(x - 12, y - 8)
        } else {
            Luma([128])
        }
    });
    let blank = GrayImage::from_pixel(800, 600, Luma([255]));

    let dim = |id: u64, page: u32, cx: f64, cy: f64, value: &str| {
        let bbox = BoundingBox::new(cx - 20.0, cy - 8.0, cx + 20.0, cy + 8.0);
        DimensionAnnotation::new(id, bbox, value, page)
    };

    let request = CompareRequest::new(
        vec![
            PageInput::new(
                1,
                sheet,
                vec![dim(1, 1, 200.0, 150.0, "2.500"), dim(2, 1, 600.0, 400.0, "R5")],
            ),
            PageInput::new(2, blank.clone(), vec![dim(1, 2, 300.0, 300.0, "Ø12")]),
        ],
        vec![
            PageInput::new(
                1,
                moved,
                vec![
                    dim(1, 1, 212.0, 158.0, "2.505"),
                    dim(2, 1, 612.0, 408.0, "R5"),
                    dim(3, 1, 100.0, 500.0, "45°"),
                ],
            ),
            PageInput::new(2, blank, vec![dim(1, 2, 305.0, 302.0, "Ø 12")]),
        ],
    )
    .with_page_mode(
        2,
        PageAlignment::manual(AnchorPairs::new(
            [0.0, 0.0],
            [800.0, 600.0],
            [5.0, 2.0],
            [805.0, 602.0],
        )),
    );

    let comparator = Comparator::with_config(CompareConfig::default().with_seed(1));
    let result = comparator.compare_document(&request)?;

    println!(
        "{} pages: {} added, {} modified, {} removed, {} unchanged",
        result.total_pages,
        result.summary.added,
        result.summary.modified,
        result.summary.removed,
        result.summary.unchanged
    );
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
