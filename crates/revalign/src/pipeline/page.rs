//! Per-page state machine: align, then match and classify.

use crate::anchors::{similarity_from_anchors, AnchorPairs};
use crate::config::CompareConfig;
use crate::diff::{
    added_page_records, classify_changes, removed_page_records, unchanged_records, ChangeRecord,
    ChangeSummary,
};
use crate::error::AlignError;
use crate::features::{extract_features, match_features};
use crate::homography::estimate_alignment;
use crate::transform::AlignmentTransform;

use super::request::{AlignmentMode, PageAlignment, PageInput};
use super::result::{
    AlignmentDiagnostics, AlignmentSource, PageComparison, PageError, PageKind, PageStage,
    PageStats, PageStatus,
};

/// How the alignment phase of a page ended.
enum Alignment {
    Aligned(AlignmentTransform),
    /// Automatic alignment rejected, nothing to fall back to.
    AwaitingInput(AlignError),
    Failed(AlignError),
}

/// Compare one page present in both revisions.
///
/// Never substitutes identity for a failed alignment: a page that cannot be
/// aligned is reported without dimension records.
pub fn compare_page(
    a: &PageInput,
    b: &PageInput,
    alignment: &PageAlignment,
    config: &CompareConfig,
) -> PageComparison {
    let page_number = a.page_number;
    let mut diag = AlignmentDiagnostics {
        stages: vec![PageStage::Start],
        ..AlignmentDiagnostics::default()
    };

    let outcome = match alignment.mode {
        AlignmentMode::Identity => {
            diag.source = Some(AlignmentSource::Identity);
            Alignment::Aligned(AlignmentTransform::identity())
        }
        AlignmentMode::Manual(anchors) => match similarity_from_anchors(&anchors, &config.anchors) {
            Ok(t) => {
                diag.source = Some(AlignmentSource::Manual);
                diag.stages.push(PageStage::ManualAlignmentApplied);
                Alignment::Aligned(t)
            }
            Err(e) => Alignment::Failed(e.into()),
        },
        AlignmentMode::Automatic => match align_automatic(a, b, config, &mut diag) {
            Ok(t) => {
                diag.source = Some(AlignmentSource::Automatic);
                Alignment::Aligned(t)
            }
            Err(e) => fall_back(e, alignment.fallback_anchors.as_ref(), config, &mut diag),
        },
    };

    let transform = match outcome {
        Alignment::Aligned(t) => t,
        Alignment::AwaitingInput(e) => {
            tracing::info!("Page {}: awaiting manual anchors ({})", page_number, e);
            return unaligned(page_number, PageStatus::AwaitingManualInput, &e, diag);
        }
        Alignment::Failed(e) => {
            tracing::warn!("Page {}: alignment failed ({})", page_number, e);
            return unaligned(page_number, PageStatus::Failed, &e, diag);
        }
    };

    diag.stages.push(PageStage::DimensionMatching);
    let dimensions = if diag.images_identical
        && config.orchestrator.short_circuit_identical
        && a.annotations == b.annotations
    {
        tracing::debug!("Page {}: identical images and annotations", page_number);
        unchanged_records(&b.annotations)
    } else {
        classify_changes(&a.annotations, &b.annotations, &transform, &config.matching)
    };
    diag.stages.push(PageStage::Complete);
    diag.scale_factor = Some(transform.scale_factor());
    diag.transform = Some(transform);

    let summary = ChangeSummary::from_records(&dimensions);
    tracing::info!(
        "Page {}: {} added, {} modified, {} removed, {} unchanged",
        page_number,
        summary.added,
        summary.modified,
        summary.removed,
        summary.unchanged
    );

    PageComparison {
        page_number,
        page_kind: PageKind::Paired,
        status: PageStatus::Complete,
        error: None,
        dimensions,
        stats: PageStats {
            summary,
            alignment: Some(diag),
        },
    }
}

fn align_automatic(
    a: &PageInput,
    b: &PageInput,
    config: &CompareConfig,
    diag: &mut AlignmentDiagnostics,
) -> Result<AlignmentTransform, AlignError> {
    diag.stages.push(PageStage::FeatureExtraction);
    let (features_a, features_b) = rayon::join(
        || extract_features(&a.image, &config.features),
        || extract_features(&b.image, &config.features),
    );
    diag.keypoints_a = features_a.len();
    diag.keypoints_b = features_b.len();
    tracing::debug!(
        "Page {}: {} keypoints in A, {} in B",
        a.page_number,
        features_a.len(),
        features_b.len()
    );

    let required = config.features.min_keypoints;
    if features_a.len() < required || features_b.len() < required {
        diag.stages.push(PageStage::HomographyRejected);
        return Err(AlignError::LowFeatureDensity {
            keypoints_a: features_a.len(),
            keypoints_b: features_b.len(),
            required,
        });
    }

    let correspondences = match_features(&features_a, &features_b, &config.features);
    diag.correspondences = correspondences.len();

    let mut ransac = config.ransac.clone();
    ransac.seed = ransac.seed.map(|s| s.wrapping_add(u64::from(a.page_number)));

    match estimate_alignment(&correspondences, &ransac, b.image.dimensions()) {
        Ok(estimate) => {
            diag.stages.push(PageStage::HomographyAccepted);
            diag.images_identical = estimate.images_identical;
            diag.ransac = Some(estimate.stats);
            Ok(estimate.transform)
        }
        Err(e) => {
            diag.stages.push(PageStage::HomographyRejected);
            Err(e.into())
        }
    }
}

fn fall_back(
    automatic: AlignError,
    anchors: Option<&AnchorPairs>,
    config: &CompareConfig,
    diag: &mut AlignmentDiagnostics,
) -> Alignment {
    if !automatic.recoverable_with_anchors() {
        diag.stages.push(PageStage::Unrecoverable);
        return Alignment::Failed(automatic);
    }
    diag.stages.push(PageStage::AwaitingManualInput);
    let Some(anchors) = anchors else {
        return Alignment::AwaitingInput(automatic);
    };

    match similarity_from_anchors(anchors, &config.anchors) {
        Ok(t) => {
            diag.stages.push(PageStage::ManualAlignmentApplied);
            diag.source = Some(AlignmentSource::FallbackAnchors);
            Alignment::Aligned(t)
        }
        Err(e) => {
            diag.stages.push(PageStage::Unrecoverable);
            Alignment::Failed(AlignError::Unrecoverable {
                automatic: Box::new(automatic),
                manual: Box::new(e.into()),
            })
        }
    }
}

fn unaligned(
    page_number: u32,
    status: PageStatus,
    error: &AlignError,
    diag: AlignmentDiagnostics,
) -> PageComparison {
    PageComparison {
        page_number,
        page_kind: PageKind::Paired,
        status,
        error: Some(PageError::from(error)),
        dimensions: Vec::new(),
        stats: PageStats {
            summary: ChangeSummary::default(),
            alignment: Some(diag),
        },
    }
}

fn one_sided(
    page_number: u32,
    page_kind: PageKind,
    dimensions: Vec<ChangeRecord>,
) -> PageComparison {
    let summary = ChangeSummary::from_records(&dimensions);
    PageComparison {
        page_number,
        page_kind,
        status: PageStatus::Complete,
        error: None,
        dimensions,
        stats: PageStats {
            summary,
            alignment: None,
        },
    }
}

/// A page that exists only in revision B: every annotation is Added.
pub fn added_page(b: &PageInput) -> PageComparison {
    one_sided(b.page_number, PageKind::AddedPage, added_page_records(&b.annotations))
}

/// A page that exists only in revision A: every annotation is Removed.
pub fn removed_page(a: &PageInput) -> PageComparison {
    one_sided(
        a.page_number,
        PageKind::RemovedPage,
        removed_page_records(&a.annotations),
    )
}
