//! Dimension matching and change classification.

mod classify;
mod matcher;

pub use classify::{
    added_page_records, classify_changes, removed_page_records, unchanged_records, ChangeRecord,
    ChangeSummary, ChangeType,
};
pub use matcher::{match_annotations, AnnotationMatches, MatchedPair};
