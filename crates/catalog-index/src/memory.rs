//! In-process engine for offline development and tests.
//!
//! Mirrors the engine contract closely enough for the search layer: mappings
//! are enforced, semantic queries only run against `semantic_text` fields,
//! `multi_match` honours per-field boosts and `bool.should` adds up clause
//! scores. Relevance itself is a term-overlap approximation.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tantivy::tokenizer::TextAnalyzer;

use catalog_core::query::{FieldBoost, FieldKind, Hit, IndexMapping, Query, SearchResponse, WriteResult};
use catalog_core::traits::IndexEngine;
use catalog_core::{Error, Product, Result};

use crate::analysis::{analyze, build_analyzer, distinct_terms};

/// Minimum shared prefix for two terms to count as related.
const RELATED_PREFIX: usize = 4;

struct StoredIndex {
    mapping: IndexMapping,
    docs: Vec<Product>,
}

pub struct MemoryIndex {
    indices: RwLock<HashMap<String, StoredIndex>>,
    analyzer: TextAnalyzer,
}

impl Default for MemoryIndex {
    fn default() -> Self {
        Self { indices: RwLock::new(HashMap::new()), analyzer: build_analyzer() }
    }
}

fn field_value(product: &Product, field: &str) -> Option<String> {
    match field {
        "id" => Some(product.id.clone()),
        "name" => Some(product.name.clone()),
        "description" => Some(product.description.clone()),
        "category" => Some(product.category.clone()),
        "price" => Some(product.price.to_string()),
        "image_url" => Some(product.image_url.clone()),
        _ => None,
    }
}

fn related(a: &str, b: &str) -> bool {
    let shared = a.chars().zip(b.chars()).take_while(|(x, y)| x == y).count();
    shared >= RELATED_PREFIX
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in `index`, if it exists.
    pub fn doc_count(&self, index: &str) -> Result<Option<usize>> {
        Ok(self.read()?.get(index).map(|i| i.docs.len()))
    }

    pub fn mapping(&self, index: &str) -> Result<Option<IndexMapping>> {
        Ok(self.read()?.get(index).map(|i| i.mapping.clone()))
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<String, StoredIndex>>> {
        self.indices.read().map_err(|_| Error::Operation("memory index lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<String, StoredIndex>>> {
        self.indices.write().map_err(|_| Error::Operation("memory index lock poisoned".to_string()))
    }

    /// Exact terms count fully, related terms (shared stem) count half,
    /// normalized by the number of query terms.
    fn semantic_score(&self, query_terms: &[String], text: &str) -> f64 {
        if query_terms.is_empty() {
            return 0.0;
        }
        let doc_terms = analyze(&self.analyzer, text);
        let total: f64 = query_terms
            .iter()
            .map(|q| {
                if doc_terms.iter().any(|d| d == q) {
                    1.0
                } else if doc_terms.iter().any(|d| related(d, q)) {
                    0.5
                } else {
                    0.0
                }
            })
            .sum();
        total / query_terms.len() as f64
    }

    fn lexical_score(&self, kind: FieldKind, query: &str, query_terms: &[String], text: &str) -> f64 {
        match kind {
            FieldKind::Keyword => {
                if text.eq_ignore_ascii_case(query.trim()) { 1.0 } else { 0.0 }
            }
            FieldKind::Text | FieldKind::SemanticText => {
                let doc_terms = analyze(&self.analyzer, text);
                query_terms.iter().filter(|q| doc_terms.contains(*q)).count() as f64
            }
            FieldKind::Double => 0.0,
        }
    }

    fn score(&self, mapping: &IndexMapping, query: &Query, product: &Product) -> Result<f64> {
        match query {
            Query::Semantic { field, query } => {
                if mapping.kind_of(field) != Some(FieldKind::SemanticText) {
                    return Err(Error::Operation(format!("field [{field}] is not a semantic_text field")));
                }
                let terms = distinct_terms(&self.analyzer, query);
                Ok(field_value(product, field).map_or(0.0, |text| self.semantic_score(&terms, &text)))
            }
            Query::Bool { should } => {
                let mut total = 0.0;
                for clause in should {
                    total += self.score(mapping, clause, product)?;
                }
                Ok(total)
            }
            Query::MultiMatch { query, fields } => {
                let terms = distinct_terms(&self.analyzer, query);
                let best = fields
                    .iter()
                    .filter_map(|FieldBoost { field, boost }| {
                        let kind = mapping.kind_of(field)?;
                        let text = field_value(product, field)?;
                        Some(self.lexical_score(kind, query, &terms, &text) * boost)
                    })
                    .fold(0.0, f64::max);
                Ok(best)
            }
        }
    }
}

impl IndexEngine for MemoryIndex {
    async fn index_exists(&self, index: &str) -> Result<bool> {
        Ok(self.read()?.contains_key(index))
    }

    /// Creating an existing index keeps the first mapping.
    async fn create_index(&self, index: &str, mapping: &IndexMapping) -> Result<()> {
        self.write()?
            .entry(index.to_string())
            .or_insert_with(|| StoredIndex { mapping: mapping.clone(), docs: Vec::new() });
        Ok(())
    }

    async fn upsert_document(&self, index: &str, id: &str, product: &Product) -> Result<WriteResult> {
        let mut indices = self.write()?;
        let stored = indices
            .get_mut(index)
            .ok_or_else(|| Error::NotFound(format!("index [{index}]")))?;
        let mut doc = product.clone();
        doc.id = id.to_string();
        match stored.docs.iter_mut().find(|d| d.id == id) {
            Some(existing) => {
                *existing = doc;
                Ok(WriteResult::Updated)
            }
            None => {
                stored.docs.push(doc);
                Ok(WriteResult::Created)
            }
        }
    }

    async fn search(&self, index: &str, query: &Query) -> Result<SearchResponse> {
        let indices = self.read()?;
        let stored = indices.get(index).ok_or_else(|| Error::NotFound(format!("index [{index}]")))?;
        let mut scored = Vec::new();
        for doc in &stored.docs {
            let score = self.score(&stored.mapping, query, doc)?;
            if score > 0.0 {
                scored.push((score, doc));
            }
        }
        // stable: equal scores keep insertion order
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        let max_score = scored.first().map(|(s, _)| *s);
        let hits = scored
            .into_iter()
            .map(|(score, doc)| Hit { source: Some(doc.clone()), score: Some(score) })
            .collect();
        Ok(SearchResponse { hits, max_score })
    }
}
