//! revalign — revision alignment and dimension change detection for
//! engineering drawings.
//!
//! Two revisions of a drawing are rendered to page images, each with its
//! dimension annotations. Per page the pipeline stages are:
//!
//! 1. **Features** – FAST corners, intensity-centroid orientation, steered
//!    BRIEF descriptors, Hamming nearest-neighbour matching.
//! 2. **Homography** – normalized DLT inside RANSAC with a fixed iteration
//!    budget, inlier refit, inlier-ratio and scale checks.
//! 3. **Anchors** – similarity transform from two manual point pairs, used
//!    when automatic alignment is rejected or requested explicitly.
//! 4. **Diff** – revision-B annotation centers projected into revision A,
//!    greedy nearest matching, Added / Removed / Modified / Unchanged.
//!
//! All transforms map revision-B pixels into revision-A pixels.
//!
//! # Public API
//! - [`Comparator`] with [`CompareRequest`] / [`DocumentComparison`]
//! - [`CompareConfig`] for tuning
//! - free functions for each stage

mod anchors;
mod annotation;
mod api;
mod config;
mod diff;
mod error;
mod features;
mod homography;
mod pipeline;
mod transform;

#[cfg(test)]
pub(crate) mod test_utils;

pub use anchors::{similarity_from_anchors, AnchorPairs};
pub use annotation::{normalize_value, BoundingBox, DimensionAnnotation};
pub use api::Comparator;
pub use config::{
    AnchorConfig, CompareConfig, FeatureConfig, MatchConfig, OrchestratorConfig,
    RansacHomographyConfig, ScaleBounds,
};
pub use diff::{
    classify_changes, match_annotations, AnnotationMatches, ChangeRecord, ChangeSummary,
    ChangeType, MatchedPair,
};
pub use error::{
    AlignError, AlignErrorKind, AlignmentFailure, AnchorError, ConfigError, RequestError, Revision,
};
pub use features::{
    extract_features, extract_keypoints, hamming_distance, match_features, Correspondences,
    Descriptor, FeatureSet, Keypoint, DESCRIPTOR_BYTES, MIN_CORRESPONDENCES,
};
pub use homography::{
    estimate_alignment, estimate_homography_dlt, fit_homography_ransac, reprojection_error,
    DltError, HomographyEstimate, RansacHomographyResult, RansacStats,
};
pub use pipeline::{
    AlignmentDiagnostics, AlignmentMode, AlignmentSource, CancellationToken, CompareRequest,
    DocumentComparison, PageAlignment, PageComparison, PageError, PageInput, PageKind, PageStage,
    PageStats, PageStatus,
};
pub use transform::{project, AlignmentTransform, TransformKind};
