//! Change classification of one page pair.

use crate::annotation::{max_id, BoundingBox, DimensionAnnotation};
use crate::config::MatchConfig;
use crate::transform::AlignmentTransform;

use super::matcher::match_annotations;

/// Classification of one annotation across revisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ChangeType {
    Added,
    Removed,
    Modified,
    Unchanged,
}

/// One line of a page diff.
///
/// `old_*` fields describe the revision-A annotation, `new_*` the revision-B
/// one; each is present only when that side exists.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRecord {
    pub change_type: ChangeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_id: Option<u64>,
    /// Fresh id for an Added annotation on the B page; absent only when no
    /// `u64` above the page's largest id is left.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_box: Option<BoundingBox>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_box: Option<BoundingBox>,
    /// Center distance of a matched pair, A-frame pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_px: Option<f64>,
}

impl ChangeRecord {
    fn paired(old: &DimensionAnnotation, new: &DimensionAnnotation, distance: f64) -> Self {
        let change_type = if old.normalized_value() == new.normalized_value() {
            ChangeType::Unchanged
        } else {
            ChangeType::Modified
        };
        Self {
            change_type,
            old_value: Some(old.value.clone()),
            new_value: Some(new.value.clone()),
            old_id: Some(old.id),
            new_id: Some(new.id),
            assigned_id: None,
            old_box: Some(old.bounding_box),
            new_box: Some(new.bounding_box),
            distance_px: Some(distance),
        }
    }

    fn added(new: &DimensionAnnotation, assigned_id: Option<u64>) -> Self {
        Self {
            change_type: ChangeType::Added,
            old_value: None,
            new_value: Some(new.value.clone()),
            old_id: None,
            new_id: Some(new.id),
            assigned_id,
            old_box: None,
            new_box: Some(new.bounding_box),
            distance_px: None,
        }
    }

    fn removed(old: &DimensionAnnotation) -> Self {
        Self {
            change_type: ChangeType::Removed,
            old_value: Some(old.value.clone()),
            new_value: None,
            old_id: Some(old.id),
            new_id: None,
            assigned_id: None,
            old_box: Some(old.bounding_box),
            new_box: None,
            distance_px: None,
        }
    }
}

/// Per-type record counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ChangeSummary {
    pub added: usize,
    pub modified: usize,
    pub removed: usize,
    pub unchanged: usize,
}

impl ChangeSummary {
    pub fn from_records(records: &[ChangeRecord]) -> Self {
        let mut s = Self::default();
        for r in records {
            match r.change_type {
                ChangeType::Added => s.added += 1,
                ChangeType::Removed => s.removed += 1,
                ChangeType::Modified => s.modified += 1,
                ChangeType::Unchanged => s.unchanged += 1,
            }
        }
        s
    }

    pub fn accumulate(&mut self, other: &ChangeSummary) {
        self.added += other.added;
        self.modified += other.modified;
        self.removed += other.removed;
        self.unchanged += other.unchanged;
    }

    /// Number of records counted.
    pub fn total(&self) -> usize {
        self.added + self.modified + self.removed + self.unchanged
    }
}

/// Ids above the largest id of `b`, ascending; `None` once `u64` runs out.
fn fresh_ids(b: &[DimensionAnnotation]) -> impl Iterator<Item = Option<u64>> {
    let mut next = max_id(b).map_or(Some(1), |m| m.checked_add(1));
    std::iter::from_fn(move || {
        let id = next;
        next = id.and_then(|v| v.checked_add(1));
        Some(id)
    })
}

/// Indices of `annotations` in ascending id order.
fn by_id(annotations: &[DimensionAnnotation]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..annotations.len()).collect();
    order.sort_by_key(|&i| annotations[i].id);
    order
}

/// Match one page pair and classify every annotation.
///
/// Each B center is projected into the A frame with `transform`; the match
/// radius is `config.tolerance_px` times the transform scale. Records are
/// ordered B-derived first (ascending B id), then Removed (ascending A id).
pub fn classify_changes(
    a: &[DimensionAnnotation],
    b: &[DimensionAnnotation],
    transform: &AlignmentTransform,
    config: &MatchConfig,
) -> Vec<ChangeRecord> {
    let tolerance = config.tolerance_px * transform.scale_factor();
    let projected: Vec<Option<[f64; 2]>> = b.iter().map(|x| transform.apply(x.center())).collect();
    let matches = match_annotations(a, b, &projected, tolerance);

    let mut partner_of_b: Vec<Option<(usize, f64)>> = vec![None; b.len()];
    for p in &matches.pairs {
        partner_of_b[p.index_b] = Some((p.index_a, p.distance));
    }

    let mut ids = fresh_ids(b);
    let mut records = Vec::with_capacity(a.len() + b.len() - matches.pairs.len());
    for ib in by_id(b) {
        let record = match partner_of_b[ib] {
            Some((ia, distance)) => ChangeRecord::paired(&a[ia], &b[ib], distance),
            None => ChangeRecord::added(&b[ib], ids.next().flatten()),
        };
        records.push(record);
    }

    let mut removed = matches.unmatched_a;
    removed.sort_by_key(|&i| a[i].id);
    records.extend(removed.into_iter().map(|ia| ChangeRecord::removed(&a[ia])));

    tracing::trace!(
        "Classified {} A / {} B annotations: {} pairs, tolerance {:.2}px",
        a.len(),
        b.len(),
        matches.pairs.len(),
        tolerance
    );
    records
}

/// Every annotation Unchanged, paired by position; used when both images and
/// both annotation lists are identical.
pub fn unchanged_records(annotations: &[DimensionAnnotation]) -> Vec<ChangeRecord> {
    by_id(annotations)
        .into_iter()
        .map(|i| ChangeRecord::paired(&annotations[i], &annotations[i], 0.0))
        .collect()
}

/// Every annotation of a page that exists only in revision B, renumbered.
pub fn added_page_records(b: &[DimensionAnnotation]) -> Vec<ChangeRecord> {
    by_id(b)
        .into_iter()
        .zip(fresh_ids(b))
        .map(|(i, id)| ChangeRecord::added(&b[i], id))
        .collect()
}

/// Every annotation of a page that exists only in revision A.
pub fn removed_page_records(a: &[DimensionAnnotation]) -> Vec<ChangeRecord> {
    by_id(a)
        .into_iter()
        .map(|i| ChangeRecord::removed(&a[i]))
        .collect()
}
