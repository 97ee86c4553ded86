//! Multi-page comparison pipeline.
//!
//! Pages are paired by number. Each paired page runs its own state machine
//! (feature extraction, homography or manual anchors, dimension matching);
//! pages present in one revision only are reported wholesale. Page work is
//! independent and runs on a bounded rayon pool.

mod page;
mod request;
mod result;
mod run;

pub use page::compare_page;
pub use request::{AlignmentMode, CompareRequest, PageAlignment, PageInput};
pub use result::{
    AlignmentDiagnostics, AlignmentSource, DocumentComparison, PageComparison, PageError,
    PageKind, PageStage, PageStats, PageStatus,
};
pub use run::{compare_document, CancellationToken};
