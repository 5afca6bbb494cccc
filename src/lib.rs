pub mod analytics;
pub mod config;
pub mod error;
pub mod export;
pub mod ingest;
pub mod model;
pub mod store;
