//! Elasticsearch REST engine.
//!
//! Talks to the engine over plain HTTP with `reqwest`; the query model from
//! `catalog_core::query` is rendered to the engine's query DSL here.

use std::time::Duration;

use reqwest::{Response, StatusCode, Url};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, trace};

use catalog_core::config::EngineSettings;
use catalog_core::query::{FieldBoost, Hit, IndexMapping, Query, SearchResponse, WriteResult};
use catalog_core::traits::IndexEngine;
use catalog_core::{Error, Product, Result};

#[derive(Debug, Clone)]
pub struct ElasticIndex {
    http: reqwest::Client,
    base: Url,
}

#[derive(Deserialize)]
struct RawSearchResponse {
    hits: RawHits,
}

#[derive(Deserialize)]
struct RawHits {
    #[serde(default)]
    max_score: Option<f64>,
    #[serde(default)]
    hits: Vec<RawHit>,
}

#[derive(Deserialize)]
struct RawHit {
    #[serde(rename = "_id", default)]
    id: Option<String>,
    #[serde(rename = "_score", default)]
    score: Option<f64>,
    #[serde(rename = "_source", default)]
    source: Option<Value>,
}

#[derive(Deserialize)]
struct RawWriteResponse {
    result: WriteResult,
}

fn transport(e: reqwest::Error) -> Error {
    Error::Transport(e.to_string())
}

async fn check(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(Error::Engine { status: status.as_u16(), body })
}

/// Query DSL rendering of a [`Query`].
pub fn query_dsl(query: &Query) -> Value {
    match query {
        Query::Semantic { field, query } => json!({ "semantic": { "field": field, "query": query } }),
        Query::Bool { should } => {
            json!({ "bool": { "should": should.iter().map(query_dsl).collect::<Vec<_>>() } })
        }
        Query::MultiMatch { query, fields } => json!({
            "multi_match": {
                "query": query,
                "fields": fields.iter().map(FieldBoost::to_param).collect::<Vec<_>>(),
            }
        }),
    }
}

/// Create-index body for a mapping.
pub fn mapping_dsl(mapping: &IndexMapping) -> Value {
    let properties: Map<String, Value> = mapping
        .properties
        .iter()
        .map(|(name, kind)| (name.clone(), json!({ "type": kind })))
        .collect();
    json!({ "mappings": { "properties": properties } })
}

impl ElasticIndex {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        let base = Url::parse(base_url)
            .map_err(|e| Error::InvalidConfig(format!("engine url '{base_url}': {e}")))?;
        if base.cannot_be_a_base() {
            return Err(Error::InvalidConfig(format!("engine url '{base_url}' cannot be a base")));
        }
        Ok(Self { http, base })
    }

    pub fn from_settings(settings: &EngineSettings) -> Result<Self> {
        Self::new(&settings.url, Duration::from_secs(settings.timeout_secs))
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

impl IndexEngine for ElasticIndex {
    async fn index_exists(&self, index: &str) -> Result<bool> {
        let resp = self.http.head(self.url(&[index])).send().await.map_err(transport)?;
        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        check(resp).await.map(|_| status == StatusCode::OK)
    }

    async fn create_index(&self, index: &str, mapping: &IndexMapping) -> Result<()> {
        let resp = self
            .http
            .put(self.url(&[index]))
            .json(&mapping_dsl(mapping))
            .send()
            .await
            .map_err(transport)?;
        match check(resp).await {
            Ok(_) => Ok(()),
            // lost a race with another bootstrap
            Err(Error::Engine { status: 400, body }) if body.contains("resource_already_exists_exception") => {
                debug!(index, "index was created concurrently");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn upsert_document(&self, index: &str, id: &str, product: &Product) -> Result<WriteResult> {
        let resp = self
            .http
            .put(self.url(&[index, "_doc", id]))
            .json(product)
            .send()
            .await
            .map_err(transport)?;
        let written: RawWriteResponse = check(resp).await?.json().await.map_err(transport)?;
        Ok(written.result)
    }

    async fn search(&self, index: &str, query: &Query) -> Result<SearchResponse> {
        let body = json!({ "query": query_dsl(query) });
        let resp = self
            .http
            .post(self.url(&[index, "_search"]))
            .json(&body)
            .send()
            .await
            .map_err(transport)?;
        let raw: RawSearchResponse = check(resp).await?.json().await.map_err(transport)?;
        let hits = raw
            .hits
            .hits
            .into_iter()
            .map(|hit| {
                let source = hit.source.and_then(|v| match serde_json::from_value::<Product>(v) {
                    Ok(p) => Some(p),
                    Err(e) => {
                        trace!(id = ?hit.id, error = %e, "hit source is not a complete product");
                        None
                    }
                });
                Hit { source, score: hit.score }
            })
            .collect();
        Ok(SearchResponse { hits, max_score: raw.hits.max_score })
    }
}
