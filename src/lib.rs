//! ShopScout - product page intelligence
//!
//! Takes an arbitrary e-commerce product URL through validation, content
//! extraction, and AI analysis into one canonical product record, and
//! manages each user's saved products with ownership enforcement.

// Module declarations
pub mod application;
pub mod domain;
pub mod infrastructure;

// Re-export the boundary-facing surface
pub use application::pipeline::ProductPipeline;
pub use application::saved_products::SavedProducts;
pub use domain::errors::{ErrorKind, PipelineError, PipelineStage, StoreError};
pub use domain::product::{
    AnalysisResult, Price, Product, Rating, RawExtraction, SavedProduct, UserIdentity,
};
pub use domain::value_objects::ProductUrl;
