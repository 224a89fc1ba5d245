use std::future::Future;
use std::sync::Arc;

use crate::cancel::Cancel;
use crate::error::Result;
use crate::query::{IndexMapping, Query, SearchResponse, WriteResult};
use crate::types::{Product, WeightedTokens};

/// Document store the search layer runs against.
///
/// Handles are shared across concurrent queries, so implementations must be
/// usable through `&self` without external locking.
pub trait IndexEngine: Send + Sync {
    fn index_exists(&self, index: &str) -> impl Future<Output = Result<bool>> + Send;

    fn create_index(
        &self,
        index: &str,
        mapping: &IndexMapping,
    ) -> impl Future<Output = Result<()>> + Send;

    fn upsert_document(
        &self,
        index: &str,
        id: &str,
        product: &Product,
    ) -> impl Future<Output = Result<WriteResult>> + Send;

    fn search(&self, index: &str, query: &Query) -> impl Future<Output = Result<SearchResponse>> + Send;
}

impl<E: IndexEngine> IndexEngine for Arc<E> {
    fn index_exists(&self, index: &str) -> impl Future<Output = Result<bool>> + Send {
        (**self).index_exists(index)
    }

    fn create_index(
        &self,
        index: &str,
        mapping: &IndexMapping,
    ) -> impl Future<Output = Result<()>> + Send {
        (**self).create_index(index, mapping)
    }

    fn upsert_document(
        &self,
        index: &str,
        id: &str,
        product: &Product,
    ) -> impl Future<Output = Result<WriteResult>> + Send {
        (**self).upsert_document(index, id, product)
    }

    fn search(&self, index: &str, query: &Query) -> impl Future<Output = Result<SearchResponse>> + Send {
        (**self).search(index, query)
    }
}

/// Produces the sparse-embedding tokens of a query.
///
/// Only cancellation and unrecoverable client failures are errors; an
/// unavailable inference service yields an empty map.
pub trait TokenSource: Send + Sync {
    fn fetch_tokens(
        &self,
        query: &str,
        cancel: &Cancel,
    ) -> impl Future<Output = Result<WeightedTokens>> + Send;
}
