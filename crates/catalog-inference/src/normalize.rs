//! Turns sparse-embedding inference responses into ranked query tokens.
//!
//! The inference service has answered in several shapes over time. Each known
//! location of the token → weight object is a probe; probes run in priority
//! order and the first one that finds an object wins. A body no probe
//! understands yields no tokens rather than an error.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use catalog_core::WeightedTokens;

type Probe = fn(&Value) -> Option<&Map<String, Value>>;

/// `{"sparse_embedding":[{"is_truncated":false,"embedding":{...}}]}`
fn embeddings_object(root: &Value) -> Option<&Map<String, Value>> {
    root.pointer("/sparse_embedding/0/embedding")?.as_object()
}

/// `{"sparse_embedding":[{token: weight, ...}]}`
fn plain_map(root: &Value) -> Option<&Map<String, Value>> {
    root.pointer("/sparse_embedding/0")?.as_object()
}

/// `{"results":[{"sparse_embedding":{...}}]}`
fn legacy_results(root: &Value) -> Option<&Map<String, Value>> {
    root.pointer("/results/0/sparse_embedding")?.as_object()
}

const PROBES: [(&str, Probe); 3] = [
    ("sparse_embedding.embedding", embeddings_object),
    ("sparse_embedding", plain_map),
    ("results.sparse_embedding", legacy_results),
];

/// Parse a raw inference response body.
pub fn parse_tokens(raw: &[u8]) -> WeightedTokens {
    match serde_json::from_slice::<Value>(raw) {
        Ok(root) => tokens_from_value(&root),
        Err(e) => {
            warn!(error = %e, "inference response is not valid JSON");
            WeightedTokens::empty()
        }
    }
}

/// Numbers, or strings holding a number.
fn weight_of(value: &Value) -> Option<f64> {
    value.as_f64().or_else(|| value.as_str()?.trim().parse().ok())
}

/// Locate the embedding in an already-decoded response and rank its tokens.
///
/// Members that are not numeric (e.g. `is_truncated` when the plain-map probe
/// lands on an embeddings object) are not tokens and are skipped.
pub fn tokens_from_value(root: &Value) -> WeightedTokens {
    let located = PROBES
        .iter()
        .find_map(|(shape, probe)| probe(root).map(|embedding| (*shape, embedding)));
    let Some((shape, embedding)) = located else {
        warn!("could not parse sparse-embedding tokens from inference response");
        return WeightedTokens::empty();
    };
    debug!(shape, entries = embedding.len(), "located sparse embedding");
    WeightedTokens::from_entries(
        embedding
            .iter()
            .filter_map(|(token, weight)| weight_of(weight).map(|w| (token.clone(), w))),
    )
}
