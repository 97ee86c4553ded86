//! High-level comparison API.
//!
//! [`Comparator`] is the primary entry point. It wraps a [`CompareConfig`]
//! and runs page or document comparisons with it.

use std::path::Path;

use crate::config::CompareConfig;
use crate::error::{ConfigError, RequestError};
use crate::pipeline::{
    self, CancellationToken, CompareRequest, DocumentComparison, PageAlignment, PageComparison,
    PageInput,
};

/// Primary comparison interface.
///
/// Create once, compare many documents.
///
/// # Examples
///
/// ```no_run
/// use revalign::{Comparator, CompareRequest, PageInput};
/// use image::GrayImage;
///
/// let comparator = Comparator::new();
/// let request = CompareRequest::new(
///     vec![PageInput::new(1, GrayImage::new(800, 600), vec![])],
///     vec![PageInput::new(1, GrayImage::new(800, 600), vec![])],
/// );
/// let result = comparator.compare_document(&request).unwrap();
/// println!("{} pages, {} modified", result.total_pages, result.summary.modified);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Comparator {
    config: CompareConfig,
}

impl Comparator {
    /// Comparator with default thresholds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with full config control.
    pub fn with_config(config: CompareConfig) -> Self {
        Self { config }
    }

    /// Load and validate a JSON config file.
    pub fn from_config_file(path: &Path) -> Result<Self, ConfigError> {
        Ok(Self::with_config(CompareConfig::from_json_file(path)?))
    }

    /// Access the current configuration.
    pub fn config(&self) -> &CompareConfig {
        &self.config
    }

    /// Mutable access to configuration for post-construction tuning.
    pub fn config_mut(&mut self) -> &mut CompareConfig {
        &mut self.config
    }

    /// Compare all pages of two revisions.
    pub fn compare_document(
        &self,
        request: &CompareRequest,
    ) -> Result<DocumentComparison, RequestError> {
        pipeline::compare_document(request, &self.config, &CancellationToken::new())
    }

    /// Like [`Comparator::compare_document`], stopping once `cancel` is set.
    pub fn compare_document_with_cancel(
        &self,
        request: &CompareRequest,
        cancel: &CancellationToken,
    ) -> Result<DocumentComparison, RequestError> {
        pipeline::compare_document(request, &self.config, cancel)
    }

    /// Compare a single page pair. Inputs are not validated.
    pub fn compare_page(
        &self,
        a: &PageInput,
        b: &PageInput,
        alignment: &PageAlignment,
    ) -> PageComparison {
        pipeline::compare_page(a, b, alignment, &self.config)
    }
}
