use std::time::Duration;

use catalog_core::config::{resolve_with_base, Backend, Config, Settings};
use catalog_core::query::{FieldBoost, FieldKind, IndexMapping};
use catalog_core::{Cancel, Error, Product, ScoredResult, SearchExplanation, WeightedTokens, MAX_QUERY_TOKENS};

fn shoe() -> Product {
    Product::new("1", "Running Shoes Pro", "Lightweight breathable running shoes", "Footwear", 129.99, "img://1")
}

#[test]
fn weighted_tokens_sorted_and_truncated() {
    let entries: Vec<(String, f64)> = (0..50u32).map(|i| (format!("t{i}"), f64::from(i % 7))).collect();
    let tokens = WeightedTokens::from_entries(entries);

    assert_eq!(tokens.len(), MAX_QUERY_TOKENS);
    let weights: Vec<f64> = tokens.iter().map(|(_, w)| w).collect();
    assert!(weights.windows(2).all(|w| w[0] >= w[1]), "non-increasing: {weights:?}");
    assert_eq!(weights[0], 6.0);
}

#[test]
fn weighted_tokens_ties_keep_encounter_order() {
    let tokens = WeightedTokens::from_entries(vec![
        ("low".to_string(), 0.5),
        ("b".to_string(), 2.0),
        ("a".to_string(), 2.0),
        ("top".to_string(), 3.0),
    ]);
    let order: Vec<&str> = tokens.tokens().collect();
    assert_eq!(order, vec!["top", "b", "a", "low"]);
}

#[test]
fn weighted_tokens_drop_invalid_and_duplicate_entries() {
    let tokens = WeightedTokens::from_entries(vec![
        ("neg".to_string(), -1.0),
        ("nan".to_string(), f64::NAN),
        ("shoe".to_string(), 1.0),
        ("shoe".to_string(), 9.0),
    ]);
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens.get("shoe"), Some(1.0));
}

#[test]
fn explanation_serializes_with_camel_case_and_ranked_tokens() {
    let explanation = SearchExplanation {
        query: "running".to_string(),
        query_tokens: WeightedTokens::from_entries(vec![("run".to_string(), 5.3), ("shoe".to_string(), 9.1)]),
        results: vec![ScoredResult { product: shoe(), score: 4.0, max_score: 8.0 }],
    };
    let json = serde_json::to_string(&explanation).expect("serialize");
    assert!(json.contains(r#""queryTokens":{"shoe":9.1,"run":5.3}"#), "{json}");
    assert!(json.contains(r#""maxScore":8.0"#), "{json}");
    assert!(json.contains(r#""image_url":"img://1""#), "{json}");
    assert_eq!(explanation.max_score(), 8.0);
    assert!((explanation.results[0].normalized() - 0.5).abs() < 1e-9);
}

#[test]
fn empty_explanation_has_zero_max_score() {
    let explanation = SearchExplanation { query: "x".into(), query_tokens: WeightedTokens::empty(), results: vec![] };
    assert_eq!(explanation.max_score(), 0.0);
}

#[test]
fn product_validation() {
    assert!(shoe().validate().is_ok());
    let mut bad = shoe();
    bad.price = -1.0;
    assert!(matches!(bad.validate(), Err(Error::Operation(_))));
    let mut blank = shoe();
    blank.id = "  ".into();
    assert!(blank.validate().is_err());
}

#[test]
fn product_mapping_contract() {
    let mapping = IndexMapping::products();
    assert_eq!(mapping.kind_of("description"), Some(FieldKind::SemanticText));
    assert_eq!(mapping.kind_of("name"), Some(FieldKind::Text));
    for keyword in ["id", "category", "image_url"] {
        assert_eq!(mapping.kind_of(keyword), Some(FieldKind::Keyword), "{keyword}");
    }
    assert_eq!(mapping.kind_of("price"), Some(FieldKind::Double));
    assert_eq!(mapping.kind_of("missing"), None);
}

#[test]
fn field_boost_params() {
    assert_eq!(FieldBoost::new("name", 2.0).to_param(), "name^2");
    assert_eq!(FieldBoost::unboosted("category").to_param(), "category");
}

#[tokio::test]
async fn cancel_guard_passes_through_when_idle() {
    let out = Cancel::never().guard("noop", async { Ok::<_, Error>(7) }).await.expect("ok");
    assert_eq!(out, 7);
}

#[tokio::test]
async fn cancel_guard_reports_caller_cancellation() {
    let (handle, cancel) = Cancel::pair();
    let waiter = tokio::spawn(async move {
        cancel
            .guard("slow call", async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok::<_, Error>(())
            })
            .await
    });
    tokio::time::sleep(Duration::from_millis(20)).await;
    handle.cancel();
    let res = waiter.await.expect("join");
    assert!(matches!(res, Err(Error::Cancelled(_))), "{res:?}");
}

#[tokio::test(start_paused = true)]
async fn cancel_guard_reports_deadline() {
    let cancel = Cancel::never().with_timeout(Duration::from_millis(50));
    let res = cancel
        .guard("slow call", async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, Error>(())
        })
        .await;
    match res {
        Err(e) => assert!(e.is_cancelled() && e.to_string().contains("deadline")),
        Ok(()) => panic!("deadline should fire first"),
    }
}

#[test]
fn already_cancelled_token_short_circuits() {
    let (handle, cancel) = Cancel::pair();
    handle.cancel();
    assert!(cancel.is_cancelled());
}

#[test]
fn settings_defaults() {
    let settings = Settings::default();
    assert_eq!(settings.engine.url, "http://localhost:9200");
    assert_eq!(settings.engine.index, "products");
    assert_eq!(settings.engine.backend, Backend::Elasticsearch);
    assert_eq!(settings.inference.endpoints, vec![".elser-2-elasticsearch", ".elser_model_2_linux-x86_64"]);
    assert_eq!(settings.inference_url(), "http://localhost:9200");
    assert!(settings.validate().is_ok());
}

#[test]
fn config_merges_toml_env_file_and_app_env() {
    figment::Jail::expect_with(|jail| {
        jail.set_env("RUST_ENV", "test");
        jail.create_file(
            "config.toml",
            r#"
            [engine]
            url = "http://search.internal:9200"
            index = "catalog"

            [inference]
            endpoints = ["my-elser"]
            "#,
        )?;
        jail.create_file("config.test.toml", "[engine]\nbackend = \"memory\"\n")?;
        jail.set_env("APP_INFERENCE__URL", "http://ml.internal:9200");

        let config = Config::load().map_err(|e| e.to_string())?;
        let settings = config.settings().map_err(|e| e.to_string())?;
        assert_eq!(settings.engine.url, "http://search.internal:9200");
        assert_eq!(settings.engine.index, "catalog");
        assert_eq!(settings.engine.backend, Backend::Memory);
        assert_eq!(settings.inference.endpoints, vec!["my-elser"]);
        assert_eq!(settings.inference_url(), "http://ml.internal:9200");
        assert_eq!(settings.inference.timeout_secs, 10);

        let index: String = config.get("engine.index").map_err(|e| e.to_string())?;
        assert_eq!(index, "catalog");
        Ok(())
    });
}

#[test]
fn config_rejects_invalid_settings() {
    figment::Jail::expect_with(|jail| {
        jail.create_file("config.toml", "[engine]\nurl = \"localhost:9200\"\n")?;
        assert!(Config::load().is_err());
        Ok(())
    });
}

#[test]
fn relative_paths_resolve_against_base() {
    let base = std::path::Path::new("/srv/catalog");
    assert_eq!(resolve_with_base(base, "products"), base.join("products"));
    assert_eq!(resolve_with_base(base, "/data/products"), std::path::PathBuf::from("/data/products"));
}
