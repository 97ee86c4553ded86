//! Comparison request types and boundary validation.

use std::collections::{BTreeMap, HashSet};

use image::GrayImage;

use crate::anchors::AnchorPairs;
use crate::annotation::{max_id, DimensionAnnotation};
use crate::error::{RequestError, Revision};

/// How a page pair is brought into a common frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind")]
pub enum AlignmentMode {
    /// Feature matching + RANSAC homography.
    #[default]
    Automatic,
    /// Similarity from user-supplied anchors.
    Manual(AnchorPairs),
    /// Pages are already registered.
    Identity,
}

/// Per-page alignment choice.
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageAlignment {
    #[serde(default)]
    pub mode: AlignmentMode,
    /// Anchors tried when automatic alignment is rejected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_anchors: Option<AnchorPairs>,
}

impl PageAlignment {
    pub fn automatic() -> Self {
        Self::default()
    }

    pub fn manual(anchors: AnchorPairs) -> Self {
        Self {
            mode: AlignmentMode::Manual(anchors),
            fallback_anchors: None,
        }
    }

    pub fn identity() -> Self {
        Self {
            mode: AlignmentMode::Identity,
            fallback_anchors: None,
        }
    }

    /// Automatic alignment, falling back to `anchors` on rejection.
    pub fn automatic_with_fallback(anchors: AnchorPairs) -> Self {
        Self {
            mode: AlignmentMode::Automatic,
            fallback_anchors: Some(anchors),
        }
    }
}

/// One rendered page of one revision with its annotations.
#[derive(Debug, Clone)]
pub struct PageInput {
    pub page_number: u32,
    pub image: GrayImage,
    pub annotations: Vec<DimensionAnnotation>,
}

impl PageInput {
    pub fn new(page_number: u32, image: GrayImage, annotations: Vec<DimensionAnnotation>) -> Self {
        Self {
            page_number,
            image,
            annotations,
        }
    }
}

/// A two-revision document comparison.
#[derive(Debug, Clone, Default)]
pub struct CompareRequest {
    pub revision_a: Vec<PageInput>,
    pub revision_b: Vec<PageInput>,
    /// Per-page alignment; pages without an entry use [`AlignmentMode::Automatic`].
    pub page_modes: BTreeMap<u32, PageAlignment>,
}

impl CompareRequest {
    pub fn new(revision_a: Vec<PageInput>, revision_b: Vec<PageInput>) -> Self {
        Self {
            revision_a,
            revision_b,
            page_modes: BTreeMap::new(),
        }
    }

    /// Set the alignment of one page (builder style).
    pub fn with_page_mode(mut self, page_number: u32, alignment: PageAlignment) -> Self {
        self.page_modes.insert(page_number, alignment);
        self
    }

    pub fn page_alignment(&self, page_number: u32) -> PageAlignment {
        self.page_modes.get(&page_number).copied().unwrap_or_default()
    }

    /// Reject duplicate pages, duplicate annotation ids within a page,
    /// annotations filed under the wrong page, malformed boxes, and B pages
    /// whose ids leave no room above them to number added annotations.
    pub fn validate(&self) -> Result<(), RequestError> {
        validate_revision(Revision::A, &self.revision_a)?;
        validate_revision(Revision::B, &self.revision_b)
    }
}

fn validate_revision(revision: Revision, pages: &[PageInput]) -> Result<(), RequestError> {
    let mut seen_pages = HashSet::new();
    for page in pages {
        if !seen_pages.insert(page.page_number) {
            return Err(RequestError::DuplicatePage {
                revision,
                page: page.page_number,
            });
        }

        let mut seen_ids = HashSet::new();
        for ann in &page.annotations {
            if ann.page != page.page_number {
                return Err(RequestError::AnnotationPageMismatch {
                    revision,
                    page: page.page_number,
                    id: ann.id,
                    claimed: ann.page,
                });
            }
            if !seen_ids.insert(ann.id) {
                return Err(RequestError::DuplicateAnnotationId {
                    revision,
                    page: page.page_number,
                    id: ann.id,
                });
            }
            if !ann.bounding_box.is_valid() {
                return Err(RequestError::InvalidBoundingBox {
                    revision,
                    page: page.page_number,
                    id: ann.id,
                });
            }
        }

        if revision == Revision::B {
            if let Some(max) = max_id(&page.annotations) {
                if max.checked_add(page.annotations.len() as u64).is_none() {
                    return Err(RequestError::AnnotationIdOverflow {
                        revision,
                        page: page.page_number,
                        id: max,
                    });
                }
            }
        }
    }
    Ok(())
}
