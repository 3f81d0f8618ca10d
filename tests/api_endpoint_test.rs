use adledger::api::{self, AppState};
use adledger::config::{Config, EngineConfig};
use adledger::db::init_db;
use adledger::ingest::InMemoryTableCache;
use adledger::{Analyzer, Repository};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;

const AD_EXPORT: &str = "Campaign,Clicks,Cost,Avg. CPC\n007-LB1-Acme-US-0125-240088,100,50,0.5\n";
const AFFILIATE_EXPORT: &str = "Merchant ID,Orders,Commission\n240088,3,100\n";

struct TestApp {
    app: axum::Router,
    _temp: TempDir,
}

fn test_config(database_path: String) -> Config {
    Config {
        port: 0,
        database_path,
        table_cache_capacity: 8,
        engine: EngineConfig::default(),
    }
}

async fn setup_test_app() -> TestApp {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir
        .path()
        .join("test.db")
        .to_string_lossy()
        .to_string();
    let pool = init_db(&db_path).await.expect("init_db failed");

    let repo = Arc::new(Repository::new(pool));
    let config = test_config(db_path);
    let cache = Arc::new(InMemoryTableCache::new(config.table_cache_capacity));
    let analyzer = Arc::new(Analyzer::new(
        repo.clone(),
        repo.clone(),
        cache,
        config.engine.clone(),
    ));
    let app = api::create_router(AppState::new(repo, analyzer));

    TestApp {
        app,
        _temp: temp_dir,
    }
}

async fn send(app: &axum::Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn analysis_body(date: &str, ad_export: &str, persist: bool) -> Value {
    json!({
        "userId": "u1",
        "platformId": "lh",
        "date": date,
        "persist": persist,
        "adExport": ad_export,
        "affiliateExport": AFFILIATE_EXPORT,
    })
}

#[tokio::test]
async fn health_and_ready() {
    let test_app = setup_test_app().await;

    let (status, body) = send(&test_app.app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, _) = send(&test_app.app, get("/ready")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn analysis_returns_campaign_metrics() {
    let test_app = setup_test_app().await;

    let (status, body) = send(
        &test_app.app,
        post_json("/v1/analysis", analysis_body("2025-01-14", AD_EXPORT, false)),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["runId"].is_string());
    assert!(body["diagnosis"].is_null());
    assert_eq!(body["persistedRows"], 0);

    let campaigns = body["campaigns"].as_array().unwrap();
    assert_eq!(campaigns.len(), 1);
    let c = &campaigns[0];
    assert_eq!(c["merchantId"], "240088");
    assert_eq!(c["campaignName"], "007-LB1-Acme-US-0125-240088");
    assert_eq!(c["country"], "US");
    assert!((c["conservativeCommission"].as_f64().unwrap() - 72.0).abs() < 1e-9);
    assert!((c["conservativeEpc"].as_f64().unwrap() - 0.72).abs() < 1e-9);
    assert!((c["conservativeRoi"].as_f64().unwrap() - 0.44).abs() < 1e-9);
    assert_eq!(c["decision"], "INSUFFICIENT DATA — observe");
    assert_eq!(c["decisionCode"], "insufficient_data");
    assert_eq!(c["anomaly"], "no_baseline");

    assert_eq!(body["diagnostics"]["matchMode"], "key");
    assert_eq!(body["diagnostics"]["matchedRows"], 1);
}

#[tokio::test]
async fn zero_match_is_a_diagnosed_success() {
    let test_app = setup_test_app().await;
    let ad = "Campaign,Clicks,Cost,Avg. CPC\nBrand search,100,50,0.5\n";

    let (status, body) = send(
        &test_app.app,
        post_json("/v1/analysis", analysis_body("2025-01-14", ad, false)),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["campaigns"].as_array().unwrap().len(), 0);
    let diagnosis = &body["diagnosis"];
    assert_eq!(diagnosis["adValidIds"], 0);
    assert_eq!(diagnosis["affiliateValidIds"], 1);
    assert_eq!(diagnosis["sampleAffiliateIds"], json!(["240088"]));
    assert!(!diagnosis["hints"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn empty_export_is_rejected() {
    let test_app = setup_test_app().await;

    let (status, body) = send(
        &test_app.app,
        post_json("/v1/analysis", analysis_body("2025-01-14", "  \n", false)),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn malformed_date_is_rejected() {
    let test_app = setup_test_app().await;

    let (status, body) = send(
        &test_app.app,
        post_json("/v1/analysis", analysis_body("14/01/2025", AD_EXPORT, false)),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "date must be YYYY-MM-DD");
}

#[tokio::test]
async fn persisted_run_is_queryable_and_feeds_next_day() {
    let test_app = setup_test_app().await;

    let (status, body) = send(
        &test_app.app,
        post_json("/v1/analysis", analysis_body("2025-01-14", AD_EXPORT, true)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["persistedRows"], 1);
    assert_eq!(body["baselineRows"], 0);

    let (status, body) = send(&test_app.app, get("/v1/metrics?userId=u1&date=2025-01-14")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    let row = &body["metrics"][0];
    assert_eq!(row["userId"], "u1");
    assert_eq!(row["platformId"], "lh");
    assert_eq!(row["merchantId"], "240088");
    assert_eq!(row["date"], "2025-01-14");
    assert_eq!(row["decision"], "INSUFFICIENT DATA — observe");
    assert_eq!(row["anomalyTag"], "no_baseline");

    // Clicks fall from 100 to 40 on the following day.
    let day_two = "Campaign,Clicks,Cost,Avg. CPC\n007-LB1-Acme-US-0125-240088,40,20,0.5\n";
    let (status, body) = send(
        &test_app.app,
        post_json("/v1/analysis", analysis_body("2025-01-15", day_two, true)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["baselineRows"], 1);
    assert_eq!(body["campaigns"][0]["anomaly"], "clicks_drop");

    let (status, body) = send(
        &test_app.app,
        get("/v1/metrics?userId=u1&fromDate=2025-01-14&toDate=2025-01-15"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    assert_eq!(body["metrics"][0]["date"], "2025-01-14");
    assert_eq!(body["metrics"][1]["date"], "2025-01-15");
}

#[tokio::test]
async fn rerun_overwrites_the_same_day() {
    let test_app = setup_test_app().await;

    for _ in 0..2 {
        let (status, _) = send(
            &test_app.app,
            post_json("/v1/analysis", analysis_body("2025-01-14", AD_EXPORT, true)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, body) = send(&test_app.app, get("/v1/metrics?userId=u1")).await;
    assert_eq!(body["count"], 1);
}

#[tokio::test]
async fn metrics_query_validation() {
    let test_app = setup_test_app().await;

    let (status, body) = send(
        &test_app.app,
        get("/v1/metrics?userId=u1&fromDate=2025-01-15&toDate=2025-01-14"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "fromDate must be <= toDate");

    let (status, _) = send(&test_app.app, get("/v1/metrics?userId=%20")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&test_app.app, get("/v1/metrics?userId=nobody")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn ledger_summarizes_transactions() {
    let test_app = setup_test_app().await;

    let body = json!({
        "platformId": "linkhaitao",
        "transactions": [
            {"id": "A1", "status": "effective", "commission": "10.50", "merchant_id": "240088", "order_time": "2025-01-14 10:00:00"},
            {"id": "A1", "status": "effective", "commission": "12.00", "merchant_id": "240088", "order_time": "2025-01-14 10:00:00"},
            {"id": "A2", "status": "expired", "commission": "5", "merchant_id": "240088", "order_time": "2025-01-14 11:00:00"},
            {"id": "A3", "status": "untreated", "commission": "3", "merchant_id": "240088"},
            {"status": "effective", "commission": "99"}
        ]
    });
    let (status, body) = send(&test_app.app, post_json("/v1/ledger", body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["received"], 5);
    assert_eq!(body["uniqueTransactions"], 3);

    let overall = &body["overall"];
    assert_eq!(overall["totalOrders"], 3);
    assert_eq!(overall["approvedOrders"], 1);
    assert_eq!(overall["pendingOrders"], 1);
    assert_eq!(overall["rejectedOrders"], 1);
    assert!((overall["totalCommission"].as_f64().unwrap() - 20.0).abs() < 1e-9);
    assert!((overall["netCommission"].as_f64().unwrap() - 15.0).abs() < 1e-9);

    let daily = body["daily"].as_array().unwrap();
    assert_eq!(daily.len(), 1);
    assert_eq!(daily[0]["date"], "2025-01-14");
    assert_eq!(daily[0]["totalOrders"], 2);
    assert_eq!(body["undated"]["totalOrders"], 1);

    let merchants = body["merchants"].as_array().unwrap();
    let dated = merchants
        .iter()
        .find(|m| m["date"] == "2025-01-14")
        .unwrap();
    assert_eq!(dated["merchantId"], "240088");
    assert!((dated["orders"].as_f64().unwrap() - 1.0).abs() < 1e-9);
    assert!((dated["commission"].as_f64().unwrap() - 12.0).abs() < 1e-9);
}

#[tokio::test]
async fn ledger_requires_platform() {
    let test_app = setup_test_app().await;

    let (status, body) = send(
        &test_app.app,
        post_json("/v1/ledger", json!({"platformId": "", "transactions": []})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "platformId is required");
}
