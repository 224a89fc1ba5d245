use std::time::Duration;

use httpmock::prelude::*;
use httpmock::Method::HEAD;
use serde_json::json;

use catalog_core::query::{FieldBoost, IndexMapping, Query, WriteResult};
use catalog_core::traits::IndexEngine;
use catalog_core::{Error, Product};
use catalog_index::elastic::{mapping_dsl, query_dsl};
use catalog_index::ElasticIndex;

fn engine(server: &MockServer) -> ElasticIndex {
    ElasticIndex::new(&server.base_url(), Duration::from_secs(2)).expect("engine")
}

fn shoes() -> Product {
    Product::new("1", "Running Shoes Pro", "Lightweight breathable running shoes", "Footwear", 129.99, "https://img/1")
}

#[tokio::test]
async fn index_exists_maps_head_status() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(HEAD).path("/products");
            then.status(200);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(HEAD).path("/missing");
            then.status(404);
        })
        .await;

    let es = engine(&server);
    assert!(es.index_exists("products").await.expect("exists"));
    assert!(!es.index_exists("missing").await.expect("missing"));
}

#[tokio::test]
async fn create_index_sends_the_product_mapping() {
    let server = MockServer::start_async().await;
    let create = server
        .mock_async(|when, then| {
            when.method(PUT).path("/products").json_body(json!({
                "mappings": { "properties": {
                    "id": { "type": "keyword" },
                    "name": { "type": "text" },
                    "description": { "type": "semantic_text" },
                    "category": { "type": "keyword" },
                    "price": { "type": "double" },
                    "image_url": { "type": "keyword" }
                }}
            }));
            then.status(200).json_body(json!({"acknowledged": true, "index": "products"}));
        })
        .await;

    engine(&server).create_index("products", &IndexMapping::products()).await.expect("create");
    create.assert_async().await;
}

#[tokio::test]
async fn concurrent_creation_is_not_an_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(PUT).path("/products");
            then.status(400).json_body(json!({
                "error": { "type": "resource_already_exists_exception", "reason": "index [products] already exists" },
                "status": 400
            }));
        })
        .await;

    engine(&server).create_index("products", &IndexMapping::products()).await.expect("already exists is fine");
}

#[tokio::test]
async fn other_engine_failures_propagate() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(PUT).path("/products");
            then.status(400).json_body(json!({"error": {"type": "mapper_parsing_exception"}}));
        })
        .await;

    let err = engine(&server).create_index("products", &IndexMapping::products()).await.unwrap_err();
    assert!(matches!(err, Error::Engine { status: 400, .. }), "{err:?}");
}

#[tokio::test]
async fn upsert_reports_the_write_result() {
    let server = MockServer::start_async().await;
    let put = server
        .mock_async(|when, then| {
            when.method(PUT).path("/products/_doc/1").json_body(json!({
                "id": "1",
                "name": "Running Shoes Pro",
                "description": "Lightweight breathable running shoes",
                "category": "Footwear",
                "price": 129.99,
                "image_url": "https://img/1"
            }));
            then.status(201).json_body(json!({"_index": "products", "_id": "1", "result": "created"}));
        })
        .await;

    let result = engine(&server).upsert_document("products", "1", &shoes()).await.expect("upsert");
    assert_eq!(result, WriteResult::Created);
    put.assert_async().await;
}

#[tokio::test]
async fn search_parses_hits_and_keeps_partial_sources_empty() {
    let server = MockServer::start_async().await;
    let search = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/products/_search")
                .json_body(json!({"query": {"semantic": {"field": "description", "query": "running"}}}));
            then.status(200).json_body(json!({
                "took": 3,
                "hits": {
                    "total": { "value": 3, "relation": "eq" },
                    "max_score": 7.5,
                    "hits": [
                        { "_id": "1", "_score": 7.5, "_source": {
                            "id": "1", "name": "Running Shoes Pro",
                            "description": "Lightweight breathable running shoes",
                            "category": "Footwear", "price": 129.99, "image_url": "https://img/1"
                        }},
                        { "_id": "2", "_score": 3.0, "_source": { "id": "2", "name": "partial" } },
                        { "_id": "3", "_score": 1.0 }
                    ]
                }
            }));
        })
        .await;

    let resp = engine(&server).search("products", &Query::semantic("description", "running")).await.expect("search");

    assert_eq!(resp.max_score, Some(7.5));
    assert_eq!(resp.hits.len(), 3);
    assert_eq!(resp.hits[0].source.as_ref().map(|p| p.id.as_str()), Some("1"));
    assert_eq!(resp.hits[0].score, Some(7.5));
    assert!(resp.hits[1].source.is_none());
    assert!(resp.hits[2].source.is_none());
    search.assert_async().await;
}

#[tokio::test]
async fn search_failure_is_an_engine_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/products/_search");
            then.status(503).body("unavailable");
        })
        .await;

    let err = engine(&server).search("products", &Query::semantic("description", "x")).await.unwrap_err();
    match err {
        Error::Engine { status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body, "unavailable");
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn hybrid_query_dsl() {
    let query = Query::should(vec![
        Query::semantic("description", "green tea"),
        Query::multi_match("green tea", vec![FieldBoost::new("name", 2.0), FieldBoost::unboosted("category")]),
    ]);
    assert_eq!(
        query_dsl(&query),
        json!({"bool": {"should": [
            {"semantic": {"field": "description", "query": "green tea"}},
            {"multi_match": {"query": "green tea", "fields": ["name^2", "category"]}}
        ]}})
    );
}

#[test]
fn mapping_dsl_keeps_declared_kinds() {
    let body = mapping_dsl(&IndexMapping::products());
    assert_eq!(body["mappings"]["properties"]["description"]["type"], "semantic_text");
    assert_eq!(body["mappings"]["properties"]["price"]["type"], "double");
}

#[test]
fn rejects_bad_engine_urls() {
    assert!(matches!(ElasticIndex::new("not a url", Duration::from_secs(1)), Err(Error::InvalidConfig(_))));
}
