use crate::diff::{ChangeRecord, ChangeSummary};
use crate::error::{AlignError, AlignErrorKind};
use crate::homography::RansacStats;
use crate::transform::AlignmentTransform;

/// Whether a page number exists in both revisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum PageKind {
    Paired,
    /// Only in revision B.
    AddedPage,
    /// Only in revision A.
    RemovedPage,
}

/// Final status of one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum PageStatus {
    Complete,
    /// Automatic alignment was rejected and no fallback anchors were given.
    AwaitingManualInput,
    Failed,
}

/// States visited by the per-page state machine, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum PageStage {
    Start,
    FeatureExtraction,
    HomographyAccepted,
    HomographyRejected,
    AwaitingManualInput,
    ManualAlignmentApplied,
    DimensionMatching,
    Complete,
    Unrecoverable,
}

/// Where the page transform came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum AlignmentSource {
    Automatic,
    Manual,
    /// Fallback anchors after an automatic rejection.
    FallbackAnchors,
    Identity,
}

/// Error reported on a page.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PageError {
    pub kind: AlignErrorKind,
    pub message: String,
}

impl From<&AlignError> for PageError {
    fn from(e: &AlignError) -> Self {
        Self {
            kind: e.kind(),
            message: e.to_string(),
        }
    }
}

/// Alignment diagnostics of a paired page.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlignmentDiagnostics {
    /// Present once a transform was accepted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<AlignmentSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transform: Option<AlignmentTransform>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale_factor: Option<f64>,
    pub keypoints_a: usize,
    pub keypoints_b: usize,
    pub correspondences: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ransac: Option<RansacStats>,
    pub images_identical: bool,
    pub stages: Vec<PageStage>,
}

/// Counts and diagnostics of one page.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PageStats {
    pub summary: ChangeSummary,
    /// Absent for pages present in only one revision.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alignment: Option<AlignmentDiagnostics>,
}

/// Comparison result of one page number.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageComparison {
    pub page_number: u32,
    pub page_kind: PageKind,
    pub status: PageStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<PageError>,
    /// Empty unless `status` is `Complete`.
    pub dimensions: Vec<ChangeRecord>,
    pub stats: PageStats,
}

impl PageComparison {
    pub fn is_complete(&self) -> bool {
        self.status == PageStatus::Complete
    }
}

/// Full document comparison.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentComparison {
    pub total_pages: usize,
    /// Sum of all page summaries.
    pub summary: ChangeSummary,
    /// Ascending page number.
    pub pages: Vec<PageComparison>,
}

impl DocumentComparison {
    pub fn from_pages(pages: Vec<PageComparison>) -> Self {
        let mut summary = ChangeSummary::default();
        for p in &pages {
            summary.accumulate(&p.stats.summary);
        }
        Self {
            total_pages: pages.len(),
            summary,
            pages,
        }
    }

    pub fn page(&self, page_number: u32) -> Option<&PageComparison> {
        self.pages.iter().find(|p| p.page_number == page_number)
    }
}
