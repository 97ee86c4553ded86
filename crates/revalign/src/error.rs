//! Error taxonomy.
//!
//! Per-page alignment outcomes ([`AlignError`]) are expected results that the
//! orchestrator branches on; they never abort a document comparison.
//! [`RequestError`] covers problems with the request as a whole.

/// Why automatic homography estimation rejected a page.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AlignmentFailure {
    /// Source and destination point lists differ in length.
    #[error("correspondence length mismatch: {src} source vs {dst} destination points")]
    LengthMismatch {
        /// Number of source points.
        src: usize,
        /// Number of destination points.
        dst: usize,
    },
    /// Not enough correspondences to draw a minimal RANSAC sample.
    #[error("too few correspondences: need {needed}, got {got}")]
    TooFewCorrespondences {
        /// Required minimum number of correspondences.
        needed: usize,
        /// Provided number of correspondences.
        got: usize,
    },
    /// Every sampled subset was degenerate or numerically unsolvable.
    #[error("no homography could be fitted from the sampled correspondences")]
    NoModel,
    /// The best model explains too small a share of the correspondences.
    #[error("inlier ratio {ratio:.3} below required {required:.3}")]
    InsufficientInliers {
        /// Achieved inlier ratio in [0, 1].
        ratio: f64,
        /// Configured minimum ratio.
        required: f64,
    },
    /// The fitted transform implies an implausible scale change.
    #[error("implied scale {scale:.4} outside [{min:.3}, {max:.3}]")]
    ScaleOutOfBounds {
        /// Scale factor implied by the transform.
        scale: f64,
        /// Lower accepted bound.
        min: f64,
        /// Upper accepted bound.
        max: f64,
    },
}

/// Why a pair of manual anchors could not produce a transform.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnchorError {
    /// At least one anchor coordinate is NaN or infinite.
    #[error("anchor coordinates must be finite")]
    NonFinite,
    /// The two anchors on one revision (nearly) coincide.
    #[error("anchor baseline length {length:.4}px is below {min:.4}px")]
    DegenerateBaseline {
        /// Distance between the two anchors.
        length: f64,
        /// Configured minimum separation.
        min: f64,
    },
    /// The anchors imply an implausible scale change.
    #[error("anchor scale {scale:.4} outside [{min:.3}, {max:.3}]")]
    ScaleOutOfBounds {
        /// Scale factor implied by the anchors.
        scale: f64,
        /// Lower accepted bound.
        min: f64,
        /// Upper accepted bound.
        max: f64,
    },
}

/// Per-page alignment error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AlignError {
    /// Too few keypoints in one of the images; recoverable via manual anchors.
    #[error(
        "low feature density: {keypoints_a} keypoints in revision A, \
         {keypoints_b} in revision B (need {required})"
    )]
    LowFeatureDensity {
        /// Keypoints found in revision A.
        keypoints_a: usize,
        /// Keypoints found in revision B.
        keypoints_b: usize,
        /// Configured minimum per image.
        required: usize,
    },
    /// Automatic alignment was rejected; recoverable via manual anchors or relaxed thresholds.
    #[error("alignment failed: {0}")]
    AlignmentFailed(#[from] AlignmentFailure),
    /// Manual anchors are degenerate; the caller must resupply them.
    #[error("invalid anchor points: {0}")]
    InvalidAnchorPoints(#[from] AnchorError),
    /// Automatic alignment and the fallback anchors both failed.
    #[error(
        "unrecoverable: automatic alignment failed ({automatic}); \
         fallback anchors invalid ({manual})"
    )]
    Unrecoverable {
        /// Error from automatic alignment.
        automatic: Box<AlignError>,
        /// Error from the fallback anchors.
        manual: Box<AlignError>,
    },
}

/// Serializable discriminant of [`AlignError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum AlignErrorKind {
    LowFeatureDensity,
    AlignmentFailed,
    InvalidAnchorPoints,
    Unrecoverable,
}

impl AlignError {
    /// Error kind without payload.
    pub fn kind(&self) -> AlignErrorKind {
        match self {
            Self::LowFeatureDensity { .. } => AlignErrorKind::LowFeatureDensity,
            Self::AlignmentFailed(_) => AlignErrorKind::AlignmentFailed,
            Self::InvalidAnchorPoints(_) => AlignErrorKind::InvalidAnchorPoints,
            Self::Unrecoverable { .. } => AlignErrorKind::Unrecoverable,
        }
    }

    /// `true` when supplying manual anchors may still align the page.
    pub fn recoverable_with_anchors(&self) -> bool {
        matches!(
            self,
            Self::LowFeatureDensity { .. } | Self::AlignmentFailed(_)
        )
    }
}

/// Which side of a comparison a page or annotation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Revision {
    A,
    B,
}

impl std::fmt::Display for Revision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::A => write!(f, "A"),
            Self::B => write!(f, "B"),
        }
    }
}

/// Request-level error: the comparison as a whole cannot proceed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RequestError {
    #[error("revision {revision} lists page {page} more than once")]
    DuplicatePage { revision: Revision, page: u32 },
    #[error("revision {revision} page {page} has duplicate annotation id {id}")]
    DuplicateAnnotationId { revision: Revision, page: u32, id: u64 },
    #[error(
        "revision {revision}: annotation {id} claims page {claimed} but is filed under page {page}"
    )]
    AnnotationPageMismatch {
        revision: Revision,
        page: u32,
        id: u64,
        claimed: u32,
    },
    #[error("revision {revision} page {page}: annotation {id} has an invalid bounding box")]
    InvalidBoundingBox { revision: Revision, page: u32, id: u64 },
    #[error(
        "revision {revision} page {page}: annotation id {id} leaves no room \
         to number added annotations"
    )]
    AnnotationIdOverflow { revision: Revision, page: u32, id: u64 },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("comparison cancelled")]
    Cancelled,
}

/// Error loading or validating a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
