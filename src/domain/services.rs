//! Service interfaces for the pipeline's two external collaborators.
//!
//! Both calls suspend on the network, so both take a cancellation token:
//! when the caller abandons a request mid-flight, the outbound connection is
//! released instead of running to completion.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::domain::errors::{AnalysisError, ExtractionError};
use crate::domain::product::{AnalysisResult, RawExtraction};
use crate::domain::value_objects::ProductUrl;

/// Turns a product page into structured fields.
///
/// Implementations are polymorphic over page-format variants: the generic
/// extractor handles arbitrary storefront markup, and vendor-specific
/// extractors can sit behind this same interface.
#[async_trait]
pub trait ContentExtractor: Send + Sync {
    /// Fetches `url` and extracts product fields from it.
    ///
    /// Missing optional fields degrade to neutral defaults; only a page
    /// exposing neither a title nor a price fails.
    async fn extract(
        &self,
        url: &ProductUrl,
        cancel: &CancellationToken,
    ) -> Result<RawExtraction, ExtractionError>;
}

/// Produces a structured critique of an extracted product.
#[async_trait]
pub trait AnalysisEngine: Send + Sync {
    /// Sends the extraction to the inference capability and parses the
    /// critique. Never mutates or discards extraction fields.
    async fn analyze(
        &self,
        extraction: &RawExtraction,
        cancel: &CancellationToken,
    ) -> Result<AnalysisResult, AnalysisError>;
}
