use std::time::Duration;

use reqwest::{StatusCode, Url};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use catalog_core::config::Settings;
use catalog_core::traits::TokenSource;
use catalog_core::{Cancel, Error, Result, WeightedTokens};

use crate::normalize::parse_tokens;

/// One step of the endpoint plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attempt {
    /// A well-known inference id, tried as is.
    Fixed(String),
    /// List the registered sparse-embedding endpoints and try the first one.
    Discover,
}

/// Client for the engine's sparse-embedding inference API.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct InferenceClient {
    http: reqwest::Client,
    base: Url,
    endpoints: Vec<String>,
}

fn transport(e: reqwest::Error) -> Error {
    Error::Transport(e.to_string())
}

impl InferenceClient {
    pub fn new(base_url: &str, endpoints: Vec<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        Self::with_http(http, base_url, endpoints)
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(
            settings.inference_url(),
            settings.inference.endpoints.clone(),
            Duration::from_secs(settings.inference.timeout_secs),
        )
    }

    pub fn with_http(http: reqwest::Client, base_url: &str, endpoints: Vec<String>) -> Result<Self> {
        let base = Url::parse(base_url)
            .map_err(|e| Error::InvalidConfig(format!("inference url '{base_url}': {e}")))?;
        if base.cannot_be_a_base() {
            return Err(Error::InvalidConfig(format!("inference url '{base_url}' cannot be a base")));
        }
        Ok(Self { http, base, endpoints })
    }

    /// Fixed candidates in configured order, then a single discovery step.
    pub fn plan(&self) -> Vec<Attempt> {
        self.endpoints
            .iter()
            .cloned()
            .map(Attempt::Fixed)
            .chain(std::iter::once(Attempt::Discover))
            .collect()
    }

    /// `{base}/_inference/sparse_embedding[/{id}]`
    pub fn endpoint_url(&self, id: Option<&str>) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["_inference", "sparse_embedding"]);
            if let Some(id) = id {
                segments.push(id);
            }
        }
        url
    }

    /// Sparse-embedding tokens of `query`, or an empty map when no endpoint
    /// answers. Only cancellation is reported as an error.
    pub async fn fetch_tokens(&self, query: &str, cancel: &Cancel) -> Result<WeightedTokens> {
        let body = json!({ "input": [query] });
        for attempt in self.plan() {
            let id = match attempt {
                Attempt::Fixed(id) => id,
                Attempt::Discover => match self.discover(cancel).await? {
                    Some(id) => id,
                    None => break,
                },
            };
            if let Some(tokens) = self.attempt(&id, &body, cancel).await? {
                debug!(endpoint = %id, tokens = tokens.len(), "fetched query tokens");
                return Ok(tokens);
            }
        }
        warn!("No sparse-embedding inference endpoint found, returning empty tokens");
        Ok(WeightedTokens::empty())
    }

    /// One inference call; `None` means "try the next step".
    async fn attempt(&self, id: &str, body: &Value, cancel: &Cancel) -> Result<Option<WeightedTokens>> {
        let url = self.endpoint_url(Some(id));
        let sent = cancel
            .guard("inference call", async {
                let resp = self.http.post(url).json(body).send().await.map_err(transport)?;
                let status = resp.status();
                let bytes = resp.bytes().await.map_err(transport)?;
                Ok((status, bytes))
            })
            .await;
        match sent {
            Ok((status, bytes)) if status == StatusCode::OK => Ok(Some(parse_tokens(&bytes))),
            Ok((status, _)) => {
                debug!(endpoint = id, %status, "inference endpoint not available");
                Ok(None)
            }
            Err(e) if e.is_cancelled() => Err(e),
            Err(e) => {
                debug!(endpoint = id, error = %e, "inference endpoint not available");
                Ok(None)
            }
        }
    }

    async fn discover(&self, cancel: &Cancel) -> Result<Option<String>> {
        let url = self.endpoint_url(None);
        let listed = cancel
            .guard("inference discovery", async {
                let resp = self.http.get(url).send().await.map_err(transport)?;
                let status = resp.status();
                if status != StatusCode::OK {
                    let body = resp.text().await.unwrap_or_default();
                    return Err(Error::Engine { status: status.as_u16(), body });
                }
                let listing: Value = resp.json().await.map_err(transport)?;
                Ok(first_inference_id(&listing))
            })
            .await;
        match listed {
            Ok(Some(id)) => {
                info!(inference_id = %id, "discovered sparse-embedding inference endpoint");
                Ok(Some(id))
            }
            Ok(None) => {
                warn!("no sparse-embedding inference endpoints are registered");
                Ok(None)
            }
            Err(e) if e.is_cancelled() => Err(e),
            Err(e) => {
                warn!(error = %e, "could not discover inference endpoints");
                Ok(None)
            }
        }
    }
}

/// The listing is `{"endpoints":[...]}`; a bare array is accepted as well.
fn first_inference_id(listing: &Value) -> Option<String> {
    let endpoints = listing.get("endpoints").unwrap_or(listing).as_array()?;
    endpoints.first()?.get("inference_id")?.as_str().map(str::to_string)
}

impl TokenSource for InferenceClient {
    async fn fetch_tokens(&self, query: &str, cancel: &Cancel) -> Result<WeightedTokens> {
        InferenceClient::fetch_tokens(self, query, cancel).await
    }
}
