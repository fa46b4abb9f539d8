///! End-to-end tests over the HTTP router with an in-memory store.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::Value;
use tower::ServiceExt;

use country_exchange_backend::module::country::{
    CountryFetcher, CountryStore, MultiplierSource, NewCountry, RefreshService,
};
use country_exchange_backend::module::renderer::SummaryRenderer;
use country_exchange_backend::service::{AppState, build_router};

struct FixedMultiplier(f64);

impl MultiplierSource for FixedMultiplier {
    fn draw(&mut self) -> f64 {
        self.0
    }
}

fn test_dir(tag: &str) -> PathBuf {
    std::env::temp_dir().join(format!("country-exchange-http-{}-{}", tag, std::process::id()))
}

/// Router wired to an in-memory store. Upstream URLs point at an
/// unroutable port so refresh exercises the failure path without
/// touching the network.
async fn app(tag: &str) -> (Router, CountryStore, PathBuf) {
    let store = CountryStore::connect("sqlite::memory:").await.unwrap();
    let renderer = SummaryRenderer::new(test_dir(tag));
    let image_path = renderer.output_path();
    let refresh = RefreshService::new(
        CountryFetcher::new("http://127.0.0.1:9/countries", "http://127.0.0.1:9/rates"),
        store.clone(),
        renderer,
        Box::new(FixedMultiplier(1500.0)),
    );
    let state = Arc::new(AppState {
        store: store.clone(),
        refresh,
        image_path: image_path.clone(),
    });
    (build_router(state), store, image_path)
}

fn new_country(name: &str, currency: Option<&str>, gdp: Option<f64>) -> NewCountry {
    NewCountry {
        name: name.to_string(),
        capital: Some("Capital".to_string()),
        region: Some("Europe".to_string()),
        population: 100,
        currency_code: currency.map(String::from),
        exchange_rate: currency.map(|_| 0.8),
        estimated_gdp: gdp,
        flag_url: Some("https://example.org/flag.svg".to_string()),
    }
}

async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
    send(router, "GET", uri).await
}

async fn send(router: &Router, method: &str, uri: &str) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn test_home_banner() {
    let (router, _, _) = app("banner").await;
    let (status, body) = get(&router, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Welcome to the Country Currency & Exchange API");
}

#[tokio::test]
async fn test_list_countries_empty_and_seeded() {
    let (router, store, _) = app("list").await;

    let (status, body) = get(&router, "/countries").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!([]));

    store
        .save(&new_country("Wales", Some("GBP"), Some(187_500.0)))
        .await
        .unwrap();
    store
        .save(&new_country("Japan", Some("JPY"), Some(900_000.0)))
        .await
        .unwrap();
    store.save(&new_country("Nulland", None, None)).await.unwrap();

    let (status, body) = get(&router, "/countries").await;
    assert_eq!(status, StatusCode::OK);
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["name"], "Wales");
    assert_eq!(rows[0]["exchange_rate"], 0.8);
    assert!(rows[0]["last_refreshed_at"].as_str().unwrap().ends_with('Z'));
    assert_eq!(rows[2]["estimated_gdp"], Value::Null);
}

#[tokio::test]
async fn test_list_countries_sorting_and_filtering() {
    let (router, store, _) = app("filters").await;
    store
        .save(&new_country("Wales", Some("GBP"), Some(187_500.0)))
        .await
        .unwrap();
    store
        .save(&new_country("Japan", Some("JPY"), Some(900_000.0)))
        .await
        .unwrap();
    store.save(&new_country("Nulland", None, None)).await.unwrap();

    let (status, body) = get(&router, "/countries?sort=gdp_desc").await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Japan", "Wales", "Nulland"]);

    let (status, body) = get(&router, "/countries?currency=gbp").await;
    assert_eq!(status, StatusCode::OK);
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["name"], "Wales");

    let (status, body) = get(&router, "/countries?continent=Europe").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("continent"));

    let (status, _) = get(&router, "/countries?sort=alphabetical").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_country_by_name_case_insensitive() {
    let (router, store, _) = app("single").await;
    store
        .save(&new_country("Wales", Some("GBP"), Some(187_500.0)))
        .await
        .unwrap();

    let (status, body) = get(&router, "/countries/wALES").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Wales");
    assert_eq!(body["capital"], "Capital");
    assert_eq!(body["population"], 100);

    let (status, body) = get(&router, "/countries/Atlantis").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Country not found");
}

#[tokio::test]
async fn test_delete_country() {
    let (router, store, _) = app("delete").await;
    store
        .save(&new_country("Wales", Some("GBP"), None))
        .await
        .unwrap();

    let (status, body) = send(&router, "DELETE", "/countries/wales").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].as_str().unwrap().contains("deleted"));
    assert!(!store.exists("Wales").await.unwrap());

    // Deleting a country that was never created changes nothing
    let (status, body) = send(&router, "DELETE", "/countries/wales").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Country not found");
}

#[tokio::test]
async fn test_status_routes() {
    let (router, store, _) = app("status").await;

    for uri in ["/status", "/countries/status"] {
        let (status, body) = get(&router, uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_countries"], 0);
        assert_eq!(body["last_refreshed_at"], Value::Null);
    }

    store
        .save(&new_country("Wales", Some("GBP"), None))
        .await
        .unwrap();
    let (status, body) = get(&router, "/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_countries"], 1);
    assert!(body["last_refreshed_at"].as_str().unwrap().ends_with('Z'));
}

#[tokio::test]
async fn test_summary_image_missing_then_present() {
    let (router, _, image_path) = app("image").await;

    let (status, body) = get(&router, "/countries/image").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Summary image not found");

    tokio::fs::create_dir_all(image_path.parent().unwrap())
        .await
        .unwrap();
    tokio::fs::write(&image_path, b"\x89PNG\r\n\x1a\nstub")
        .await
        .unwrap();

    for uri in ["/countries/image", "/countries/images"] {
        let response = router
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "image/png"
        );
    }

    tokio::fs::remove_file(&image_path).await.ok();
}

#[tokio::test]
async fn test_refresh_with_unreachable_upstream_returns_503() {
    let (router, store, _) = app("refresh").await;

    let (status, body) = send(&router, "POST", "/countries/refresh").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "External data source unavailable");
    assert!(body["details"].as_str().unwrap().contains("Countries API"));

    // A failed fetch writes nothing
    assert_eq!(store.status().await.unwrap().total_countries, 0);
}
