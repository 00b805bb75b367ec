//! Infrastructure layer: configuration, logging, the HTTP fetch layer, the
//! generic page extractor, the inference client, and SQLite persistence.

pub mod analysis_client;
pub mod config;
pub mod database_connection;
pub mod http_client;
pub mod logging;
pub mod page_extractor;
pub mod saved_product_repository;
