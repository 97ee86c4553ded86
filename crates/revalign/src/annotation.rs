//! Dimension annotations supplied by the upstream extraction step.

/// Axis-aligned box in page-pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl BoundingBox {
    pub fn new(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    /// Box center `[x, y]`.
    pub fn center(&self) -> [f64; 2] {
        [0.5 * (self.xmin + self.xmax), 0.5 * (self.ymin + self.ymax)]
    }

    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }

    /// Finite edges with `min <= max` on both axes.
    pub fn is_valid(&self) -> bool {
        let finite = [self.xmin, self.ymin, self.xmax, self.ymax]
            .iter()
            .all(|v| v.is_finite());
        finite && self.xmin <= self.xmax && self.ymin <= self.ymax
    }
}

/// A dimension annotation on one page of one revision.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionAnnotation {
    /// Unique within its (revision, page).
    pub id: u64,
    pub bounding_box: BoundingBox,
    /// Dimension text as extracted, e.g. `"2.500"` or `"Ø 12 H7"`.
    pub value: String,
    pub page: u32,
}

impl DimensionAnnotation {
    pub fn new(id: u64, bounding_box: BoundingBox, value: impl Into<String>, page: u32) -> Self {
        Self {
            id,
            bounding_box,
            value: value.into(),
            page,
        }
    }

    pub fn center(&self) -> [f64; 2] {
        self.bounding_box.center()
    }

    /// Value used for equality: whitespace removed, lowercased.
    pub fn normalized_value(&self) -> String {
        normalize_value(&self.value)
    }
}

/// Strip all whitespace and lowercase, so `"Ø 12 h7"` equals `"Ø12H7"`.
pub fn normalize_value(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Largest id in a slice, or `None` when empty.
pub fn max_id(annotations: &[DimensionAnnotation]) -> Option<u64> {
    annotations.iter().map(|a| a.id).max()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_is_box_midpoint() {
        let b = BoundingBox::new(100.0, 100.0, 150.0, 120.0);
        assert_eq!(b.center(), [125.0, 110.0]);
        assert_eq!(b.width(), 50.0);
        assert_eq!(b.height(), 20.0);
    }

    #[test]
    fn inverted_or_nan_boxes_are_invalid() {
        assert!(BoundingBox::new(0.0, 0.0, 0.0, 0.0).is_valid());
        assert!(!BoundingBox::new(10.0, 0.0, 5.0, 3.0).is_valid());
        assert!(!BoundingBox::new(0.0, f64::NAN, 5.0, 3.0).is_valid());
    }

    #[test]
    fn normalization_ignores_whitespace_and_case() {
        assert_eq!(normalize_value(" Ø 12 h7\t"), normalize_value("Ø12H7"));
        assert_ne!(normalize_value("2.500"), normalize_value("2.505"));
    }

    #[test]
    fn camel_case_wire_format() {
        let a = DimensionAnnotation::new(7, BoundingBox::new(1.0, 2.0, 3.0, 4.0), "R5", 1);
        let json = serde_json::to_value(&a).unwrap();
        assert_eq!(json["boundingBox"]["xmax"], 3.0);
        assert_eq!(json["value"], "R5");
        let back: DimensionAnnotation = serde_json::from_value(json).unwrap();
        assert_eq!(back, a);
    }
}
