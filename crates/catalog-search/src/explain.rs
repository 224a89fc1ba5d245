use tracing::{info, warn};

use catalog_core::traits::{IndexEngine, TokenSource};
use catalog_core::{Cancel, Result, SearchExplanation, WeightedTokens};

use crate::orchestrator::ProductSearch;

/// Pairs a query's sparse-embedding tokens with its scored hits.
pub struct Explainer<E, T> where E: IndexEngine, T: TokenSource {
    search: ProductSearch<E>,
    tokens: T,
}

impl<E, T> Explainer<E, T> where E: IndexEngine, T: TokenSource {
    pub fn new(search: ProductSearch<E>, tokens: T) -> Self { Self { search, tokens } }

    pub fn search(&self) -> &ProductSearch<E> { &self.search }

    /// Token fetch and scored search run concurrently. A failed search fails
    /// the explanation; a failed token fetch only empties `query_tokens`,
    /// unless it was cancelled.
    pub async fn explain(&self, query: &str, cancel: &Cancel) -> Result<SearchExplanation> {
        let (tokens, results) = futures::join!(
            self.tokens.fetch_tokens(query, cancel),
            self.search.explain_search(query, cancel)
        );
        let results = results?;
        let query_tokens = match tokens {
            Ok(tokens) => tokens,
            Err(e) if e.is_cancelled() => return Err(e),
            Err(e) => {
                warn!(query, error = %e, "query tokens unavailable");
                WeightedTokens::empty()
            }
        };
        info!(query, tokens = query_tokens.len(), results = results.len(), "explained query");
        Ok(SearchExplanation { query: query.to_string(), query_tokens, results })
    }
}
