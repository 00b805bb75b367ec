//! Pipeline orchestration for one analysis request.
//!
//! Stages run strictly in order: validating, extracting, analyzing,
//! composing. Any stage failure ends the run with the stage and error kind
//! attached; no stage is retried here and nothing is persisted. The save
//! path is a separate entry point ([`crate::application::saved_products`]).

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::composer;
use crate::domain::errors::{ErrorKind, PipelineError, PipelineStage};
use crate::domain::product::Product;
use crate::domain::services::{AnalysisEngine, ContentExtractor};
use crate::domain::value_objects::ProductUrl;

/// Sequences the analysis stages and maps the first failure to a typed
/// outcome. Collaborators are injected; the pipeline holds no other state,
/// so invocations are independent and safe to run concurrently.
pub struct ProductPipeline {
    extractor: Arc<dyn ContentExtractor>,
    engine: Arc<dyn AnalysisEngine>,
}

impl ProductPipeline {
    pub fn new(extractor: Arc<dyn ContentExtractor>, engine: Arc<dyn AnalysisEngine>) -> Self {
        Self { extractor, engine }
    }

    /// Runs one full pipeline invocation for `raw_url`.
    ///
    /// # Errors
    /// Returns the first failing stage's error; downstream stages are never
    /// entered after a failure.
    pub async fn analyze(&self, raw_url: &str) -> Result<Product, PipelineError> {
        self.analyze_with_cancellation(raw_url, CancellationToken::new())
            .await
    }

    /// Like [`Self::analyze`], with caller-controlled cancellation.
    ///
    /// Cancelling the token aborts the in-flight fetch or inference call;
    /// results of already-completed stages are simply discarded.
    pub async fn analyze_with_cancellation(
        &self,
        raw_url: &str,
        cancel: CancellationToken,
    ) -> Result<Product, PipelineError> {
        let mut stage = PipelineStage::Validating;
        debug!(stage = %stage, url = raw_url, "pipeline invocation started");

        let url = ProductUrl::parse(raw_url).map_err(|e| {
            warn!(url = raw_url, error = %e, "rejected candidate URL");
            PipelineError::new(stage, ErrorKind::InvalidUrl, e.to_string())
        })?;

        stage = PipelineStage::Extracting;
        debug!(stage = %stage, url = %url, "fetching product page");
        let extraction = self
            .extractor
            .extract(&url, &cancel)
            .await
            .map_err(|e| PipelineError::new(stage, e.kind(), e.to_string()))?;

        stage = PipelineStage::Analyzing;
        debug!(stage = %stage, url = %url, "requesting analysis");
        let analysis = self
            .engine
            .analyze(&extraction, &cancel)
            .await
            .map_err(|e| PipelineError::new(stage, e.kind(), e.to_string()))?;

        stage = PipelineStage::Composing;
        debug!(stage = %stage, url = %url, "composing product");
        let product = composer::compose(extraction, analysis);

        stage = PipelineStage::Done;
        info!(
            stage = %stage,
            product_id = %product.id,
            url = %url,
            "pipeline invocation finished"
        );
        Ok(product)
    }
}
