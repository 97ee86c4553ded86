//! Homography estimation between revision images.

mod core;
mod estimate;
mod residuals;

pub use core::{
    estimate_homography_dlt, fit_homography_ransac, reprojection_error, DltError,
    RansacHomographyResult,
};
pub use estimate::{estimate_alignment, HomographyEstimate, RansacStats};
