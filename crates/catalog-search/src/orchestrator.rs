use tracing::{debug, info, trace};

use catalog_core::query::{FieldBoost, Hit, IndexMapping, Query, SearchResponse};
use catalog_core::traits::IndexEngine;
use catalog_core::{Cancel, Product, Result, ScoredResult};

/// Field carrying the semantic embedding.
pub const SEMANTIC_FIELD: &str = "description";

/// Lexical branch of a hybrid query: title matches count double.
pub fn lexical_fields() -> Vec<FieldBoost> {
    vec![FieldBoost::new("name", 2.0), FieldBoost::unboosted("category")]
}

pub fn semantic_query(query: &str) -> Query {
    Query::semantic(SEMANTIC_FIELD, query)
}

pub fn hybrid_query(query: &str) -> Query {
    Query::should(vec![semantic_query(query), Query::multi_match(query, lexical_fields())])
}

/// Runs the three query modes against one product index.
#[derive(Debug, Clone)]
pub struct ProductSearch<E> where E: IndexEngine {
    engine: E,
    index: String,
}

impl<E> ProductSearch<E> where E: IndexEngine {
    pub fn new(engine: E, index: impl Into<String>) -> Self { Self { engine, index: index.into() } }

    pub fn engine(&self) -> &E { &self.engine }

    pub fn index(&self) -> &str { &self.index }

    /// Create the index with the product mapping unless it already exists.
    pub async fn create_index_if_not_exists(&self, cancel: &Cancel) -> Result<()> {
        let exists = cancel.guard("index exists", self.engine.index_exists(&self.index)).await?;
        if exists {
            debug!(index = %self.index, "index already exists");
            return Ok(());
        }
        let mapping = IndexMapping::products();
        cancel.guard("create index", self.engine.create_index(&self.index, &mapping)).await?;
        info!(index = %self.index, "created index");
        Ok(())
    }

    pub async fn index_product(&self, product: &Product, cancel: &Cancel) -> Result<()> {
        product.validate()?;
        let result = cancel
            .guard("index product", self.engine.upsert_document(&self.index, &product.id, product))
            .await?;
        info!(id = %product.id, ?result, "indexed product");
        Ok(())
    }

    pub async fn semantic_search(&self, query: &str, cancel: &Cancel) -> Result<Vec<Product>> {
        let resp = self.run("semantic search", &semantic_query(query), cancel).await?;
        let products = sources(resp.hits);
        info!(query, count = products.len(), "semantic search");
        Ok(products)
    }

    pub async fn hybrid_search(&self, query: &str, cancel: &Cancel) -> Result<Vec<Product>> {
        let resp = self.run("hybrid search", &hybrid_query(query), cancel).await?;
        let products = sources(resp.hits);
        info!(query, count = products.len(), "hybrid search");
        Ok(products)
    }

    /// The semantic query again, keeping each hit's score and the response max.
    pub async fn explain_search(&self, query: &str, cancel: &Cancel) -> Result<Vec<ScoredResult>> {
        let resp = self.run("explain search", &semantic_query(query), cancel).await?;
        let results = scored(resp);
        info!(query, count = results.len(), "explain search");
        Ok(results)
    }

    async fn run(&self, what: &str, query: &Query, cancel: &Cancel) -> Result<SearchResponse> {
        cancel.guard(what, self.engine.search(&self.index, query)).await
    }
}

fn sources(hits: Vec<Hit>) -> Vec<Product> {
    hits.into_iter().filter_map(|hit| keep(hit).map(|(p, _)| p)).collect()
}

fn keep(hit: Hit) -> Option<(Product, Option<f64>)> {
    match hit.source {
        Some(product) => Some((product, hit.score)),
        None => {
            trace!("skipping hit without source");
            None
        }
    }
}

/// Missing hit scores count as 0. The reported max is never below a kept
/// score, and is 0 when nothing is kept or every kept score is 0.
fn scored(resp: SearchResponse) -> Vec<ScoredResult> {
    let kept: Vec<(Product, f64)> = resp
        .hits
        .into_iter()
        .filter_map(keep)
        .map(|(p, score)| (p, score.unwrap_or(0.0)))
        .collect();
    let max_score = kept.iter().map(|(_, s)| *s).fold(resp.max_score.unwrap_or(0.0), f64::max);
    kept.into_iter().map(|(product, score)| ScoredResult { product, score, max_score }).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: &str) -> Product {
        Product::new(id, "n", "d", "c", 1.0, "u")
    }

    #[test]
    fn hybrid_is_semantic_or_boosted_lexical() {
        let Query::Bool { should } = hybrid_query("tea") else { panic!("expected bool") };
        assert_eq!(should[0], semantic_query("tea"));
        assert_eq!(
            should[1],
            Query::multi_match("tea", vec![FieldBoost::new("name", 2.0), FieldBoost::new("category", 1.0)])
        );
    }

    #[test]
    fn scores_are_capped_by_max() {
        let resp = SearchResponse {
            hits: vec![
                Hit { source: Some(product("a")), score: Some(4.0) },
                Hit { source: None, score: Some(9.0) },
                Hit { source: Some(product("b")), score: None },
            ],
            max_score: Some(3.0),
        };
        let results = scored(resp);
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.score <= r.max_score));
        assert_eq!(results[0].max_score, 4.0);
        assert_eq!(results[1].score, 0.0);
    }

    #[test]
    fn zero_scored_hits_are_kept_with_zero_max() {
        let resp = SearchResponse {
            hits: vec![Hit { source: Some(product("a")), score: Some(0.0) }, Hit { source: Some(product("b")), score: None }],
            max_score: None,
        };
        let results = scored(resp);
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.max_score == 0.0 && r.normalized() == 0.0));
    }

    #[test]
    fn empty_response_scores_nothing() {
        assert!(scored(SearchResponse::default()).is_empty());
    }
}
