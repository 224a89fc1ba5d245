//! Domain types shared by the engines, the inference client and the search layer.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashSet;

use crate::error::{Error, Result};

pub type ProductId = String;

/// Upper bound on the number of query tokens kept for an explanation.
pub const MAX_QUERY_TOKENS: usize = 20;

/// A catalog entry as stored in the index.
///
/// - `id`: caller-assigned, stable; re-indexing the same id replaces the document
/// - `description`: long text, the field that carries the semantic embedding
/// - `category`: low-cardinality label, matched exactly
/// - `image_url`: opaque reference, never interpreted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub category: String,
    pub price: f64,
    pub image_url: String,
}

impl Product {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        category: impl Into<String>,
        price: f64,
        image_url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            category: category.into(),
            price,
            image_url: image_url.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::Operation(format!("product '{}' has an empty id", self.name)));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(Error::Operation(format!(
                "product '{}' has invalid price {}",
                self.id, self.price
            )));
        }
        Ok(())
    }
}

/// Token → weight map ranked by weight, highest first.
///
/// Ties keep the order in which the tokens were encountered. Serializes as a
/// JSON object whose key order is the ranking order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeightedTokens(Vec<(String, f64)>);

impl WeightedTokens {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Rank raw `(token, weight)` entries and keep the top [`MAX_QUERY_TOKENS`].
    ///
    /// Negative or non-finite weights are dropped, and a repeated token keeps
    /// its first weight.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, f64)>,
    {
        let mut seen = HashSet::new();
        let mut ranked: Vec<(String, f64)> = entries
            .into_iter()
            .filter(|(_, w)| w.is_finite() && *w >= 0.0)
            .filter(|(t, _)| seen.insert(t.clone()))
            .collect();
        // stable: equal weights stay in encounter order
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(MAX_QUERY_TOKENS);
        Self(ranked)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, token: &str) -> Option<f64> {
        self.0.iter().find(|(t, _)| t == token).map(|(_, w)| *w)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(t, w)| (t.as_str(), *w))
    }

    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(t, _)| t.as_str())
    }
}

impl Serialize for WeightedTokens {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (token, weight) in &self.0 {
            map.serialize_entry(token, weight)?;
        }
        map.end()
    }
}

/// A product hit together with the engine's raw relevance score.
///
/// `max_score` is the highest score of the response the hit came from, so
/// `score / max_score` normalizes into `[0, 1]` on the client.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredResult {
    pub product: Product,
    pub score: f64,
    pub max_score: f64,
}

impl ScoredResult {
    pub fn normalized(&self) -> f64 {
        if self.max_score > 0.0 { self.score / self.max_score } else { 0.0 }
    }
}

/// Query tokens and scored hits for one explain request. Built per request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchExplanation {
    pub query: String,
    pub query_tokens: WeightedTokens,
    pub results: Vec<ScoredResult>,
}

impl SearchExplanation {
    /// Maximum score of the response; 0 when there are no results.
    pub fn max_score(&self) -> f64 {
        self.results.first().map_or(0.0, |r| r.max_score)
    }
}
