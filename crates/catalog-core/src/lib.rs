//! catalog-core
//!
//! Shared vocabulary of the catalog search workspace: products and
//! explanation types, the engine-neutral query model, the collaborator traits,
//! cancellation, errors and configuration.

pub mod cancel;
pub mod config;
pub mod error;
pub mod query;
pub mod traits;
pub mod types;

pub use cancel::{Cancel, CancelHandle};
pub use error::{Error, Result};
pub use types::{Product, ScoredResult, SearchExplanation, WeightedTokens, MAX_QUERY_TOKENS};
