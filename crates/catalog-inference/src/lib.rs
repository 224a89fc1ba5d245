//! catalog-inference
//!
//! Query-time sparse-embedding inference: [`InferenceClient`] walks a fixed
//! list of well-known endpoints and falls back to endpoint discovery, and
//! [`normalize`] turns whatever shape the service answers with into ranked
//! [`catalog_core::WeightedTokens`].

pub mod client;
pub mod normalize;

pub use client::{Attempt, InferenceClient};
pub use normalize::parse_tokens;
