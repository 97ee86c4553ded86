//! Document orchestrator: pair pages, run them on a bounded pool, aggregate.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;

use crate::config::CompareConfig;
use crate::error::RequestError;

use super::page::{added_page, compare_page, removed_page};
use super::request::{CompareRequest, PageInput};
use super::result::{DocumentComparison, PageComparison};

/// Shared cancellation flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// The two sides of one page number.
struct PagePair<'a> {
    page_number: u32,
    a: Option<&'a PageInput>,
    b: Option<&'a PageInput>,
}

fn pair_pages(request: &CompareRequest) -> Vec<PagePair<'_>> {
    let by_number_a: BTreeMap<u32, &PageInput> =
        request.revision_a.iter().map(|p| (p.page_number, p)).collect();
    let by_number_b: BTreeMap<u32, &PageInput> =
        request.revision_b.iter().map(|p| (p.page_number, p)).collect();

    let numbers: BTreeSet<u32> = by_number_a.keys().chain(by_number_b.keys()).copied().collect();
    numbers
        .into_iter()
        .map(|n| PagePair {
            page_number: n,
            a: by_number_a.get(&n).copied(),
            b: by_number_b.get(&n).copied(),
        })
        .collect()
}

fn run_pair(
    pair: &PagePair<'_>,
    request: &CompareRequest,
    config: &CompareConfig,
) -> Option<PageComparison> {
    match (pair.a, pair.b) {
        (Some(a), Some(b)) => {
            let alignment = request.page_alignment(pair.page_number);
            Some(compare_page(a, b, &alignment, config))
        }
        (None, Some(b)) => Some(added_page(b)),
        (Some(a), None) => Some(removed_page(a)),
        (None, None) => None,
    }
}

/// Compare every page of a validated request.
///
/// Pages run in parallel on a pool of `config.orchestrator.max_workers`
/// threads; the result keeps ascending page order. The token is checked
/// before each page starts.
pub fn compare_document(
    request: &CompareRequest,
    config: &CompareConfig,
    cancel: &CancellationToken,
) -> Result<DocumentComparison, RequestError> {
    config.validate().map_err(RequestError::InvalidConfig)?;
    request.validate()?;

    let pairs = pair_pages(request);
    tracing::info!(
        "Comparing {} page(s): {} in revision A, {} in revision B",
        pairs.len(),
        request.revision_a.len(),
        request.revision_b.len()
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.orchestrator.max_workers)
        .build()
        .map_err(|e| RequestError::InvalidConfig(format!("worker pool: {e}")))?;

    let pages: Vec<PageComparison> = pool.install(|| {
        pairs
            .par_iter()
            .map(|pair| {
                if cancel.is_cancelled() {
                    return Err(RequestError::Cancelled);
                }
                Ok(run_pair(pair, request, config))
            })
            .collect::<Result<Vec<_>, _>>()
    })?
    .into_iter()
    .flatten()
    .collect();

    if cancel.is_cancelled() {
        return Err(RequestError::Cancelled);
    }

    let doc = DocumentComparison::from_pages(pages);
    tracing::info!(
        "Document: {} added, {} modified, {} removed, {} unchanged over {} page(s)",
        doc.summary.added,
        doc.summary.modified,
        doc.summary.removed,
        doc.summary.unchanged,
        doc.total_pages
    );
    Ok(doc)
}
