//! catalog-search
//!
//! Semantic, hybrid and explain search over a product index. `ProductSearch`
//! builds the queries, `Explainer` joins them with the query's
//! sparse-embedding tokens.

pub mod explain;
pub mod ingest;
pub mod orchestrator;
pub mod seed;

pub use explain::Explainer;
pub use orchestrator::ProductSearch;

/// Explainer backed by the engine's inference API.
pub type InferenceExplainer<E> = Explainer<E, catalog_inference::InferenceClient>;
