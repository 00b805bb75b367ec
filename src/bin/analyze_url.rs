//! Sanity run of the full pipeline against a live product URL.
//!
//! Usage: `analyze_url <product-url>`
//! Requires `SHOPSCOUT_API_KEY` for the inference endpoint.

use std::sync::Arc;

use anyhow::{bail, Context, Result};

use shopscout::application::pipeline::ProductPipeline;
use shopscout::infrastructure::analysis_client::InferenceClient;
use shopscout::infrastructure::config::ConfigManager;
use shopscout::infrastructure::http_client::HttpClient;
use shopscout::infrastructure::logging;
use shopscout::infrastructure::page_extractor::PageExtractor;

#[tokio::main]
async fn main() -> Result<()> {
    let Some(url) = std::env::args().nth(1) else {
        bail!("usage: analyze_url <product-url>");
    };

    let config = ConfigManager::new()?.load_or_default().await?;
    logging::init_logging(&config.logging)?;

    let api_key = std::env::var("SHOPSCOUT_API_KEY")
        .context("SHOPSCOUT_API_KEY must be set for the inference endpoint")?;

    let http = Arc::new(HttpClient::new(config.fetch.clone())?);
    let extractor = Arc::new(PageExtractor::new(http));
    let engine = Arc::new(InferenceClient::new(config.analysis.clone(), api_key)?);

    let pipeline = ProductPipeline::new(extractor, engine);
    match pipeline.analyze(&url).await {
        Ok(product) => {
            println!("{}", serde_json::to_string_pretty(&product)?);
            Ok(())
        }
        Err(err) => bail!(
            "analysis failed while {} ({:?}): {}",
            err.stage,
            err.kind,
            err.message
        ),
    }
}
