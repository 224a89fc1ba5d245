//! Engine-neutral query, mapping and response shapes.
//!
//! Engines translate [`Query`] into their own wire format; the search layer
//! only ever builds these values and reads [`SearchResponse`] back.

use serde::{Deserialize, Serialize};

use crate::types::Product;

#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    /// Embedding-space match against a `semantic_text` field.
    Semantic { field: String, query: String },
    /// Logical OR; matching clause scores add up.
    Bool { should: Vec<Query> },
    /// Lexical match over several fields, each with its own boost.
    MultiMatch { query: String, fields: Vec<FieldBoost> },
}

impl Query {
    pub fn semantic(field: &str, query: &str) -> Self {
        Query::Semantic { field: field.to_string(), query: query.to_string() }
    }

    pub fn should(clauses: Vec<Query>) -> Self {
        Query::Bool { should: clauses }
    }

    pub fn multi_match(query: &str, fields: Vec<FieldBoost>) -> Self {
        Query::MultiMatch { query: query.to_string(), fields }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldBoost {
    pub field: String,
    pub boost: f64,
}

impl FieldBoost {
    pub fn new(field: &str, boost: f64) -> Self {
        Self { field: field.to_string(), boost }
    }

    pub fn unboosted(field: &str) -> Self {
        Self::new(field, 1.0)
    }

    /// `name^2` style field reference; unboosted fields render bare.
    pub fn to_param(&self) -> String {
        if (self.boost - 1.0).abs() < f64::EPSILON {
            self.field.clone()
        } else {
            format!("{}^{}", self.field, self.boost)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Exact-match, not analyzed.
    Keyword,
    /// Tokenized full text.
    Text,
    Double,
    /// Text embedded by the engine's inference service; the only kind a
    /// semantic query can target.
    SemanticText,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct IndexMapping {
    pub properties: Vec<(String, FieldKind)>,
}

impl IndexMapping {
    pub fn field(mut self, name: &str, kind: FieldKind) -> Self {
        self.properties.push((name.to_string(), kind));
        self
    }

    pub fn kind_of(&self, name: &str) -> Option<FieldKind> {
        self.properties.iter().find(|(n, _)| n == name).map(|(_, k)| *k)
    }

    /// Field contract of the product index.
    pub fn products() -> Self {
        IndexMapping::default()
            .field("id", FieldKind::Keyword)
            .field("name", FieldKind::Text)
            .field("description", FieldKind::SemanticText)
            .field("category", FieldKind::Keyword)
            .field("price", FieldKind::Double)
            .field("image_url", FieldKind::Keyword)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteResult {
    Created,
    Updated,
    Noop,
    #[serde(other)]
    Unknown,
}

/// One hit. `source` is `None` for tombstoned or partial documents.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Hit {
    pub source: Option<Product>,
    pub score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchResponse {
    pub hits: Vec<Hit>,
    pub max_score: Option<f64>,
}
