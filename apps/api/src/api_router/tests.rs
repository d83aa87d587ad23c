use axum::Router;
use axum::body::Body;
use axum::http::header::{ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, AUTHORIZATION};
use axum::http::{HeaderMap, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::build_router;
use crate::api_config::ApiConfig;
use crate::api_services::{build_app_state, run_migrations};

const API_KEY: &str = "ci-key-1";
const TRIGGER_PATH: &str = "/api/v1/trigger/jenkins";

struct TestApp {
    router: Router,
    pool: SqlitePool,
}

struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Value,
}

async fn test_pool() -> SqlitePool {
    let pool = match SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to open in-memory sqlite database: {error}"),
    };

    if let Err(error) = run_migrations(&pool).await {
        panic!("failed to run migrations for router tests: {error}");
    }

    pool
}

async fn test_app(jenkins_url: &str, server_yaml: &str) -> TestApp {
    let yaml = format!(
        "{server_yaml}\njenkins:\n  url: \"{jenkins_url}\"\n  token: jenkins-token\napi:\n  keys:\n    - \"{API_KEY}\"\n"
    );
    let config = ApiConfig::from_yaml_str(yaml.as_str(), |_| None)
        .unwrap_or_else(|error| panic!("invalid test config: {error}"));

    let pool = test_pool().await;
    let app_state = build_app_state(pool.clone(), &config)
        .unwrap_or_else(|error| panic!("failed to build app state: {error}"));

    TestApp {
        router: build_router(app_state),
        pool,
    }
}

async fn send(app: &TestApp, request: Request<Body>) -> TestResponse {
    let response = app
        .router
        .clone()
        .oneshot(request)
        .await
        .unwrap_or_else(|error| panic!("router failed: {error}"));

    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response
        .into_body()
        .collect()
        .await
        .map(|collected| collected.to_bytes())
        .unwrap_or_default();

    TestResponse {
        status,
        headers,
        body: serde_json::from_slice(&bytes).unwrap_or(Value::Null),
    }
}

fn trigger_request(body: &str, authorization: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(TRIGGER_PATH)
        .header("Content-Type", "application/json");
    if let Some(authorization) = authorization {
        builder = builder.header(AUTHORIZATION, authorization);
    }

    builder
        .body(Body::from(body.to_owned()))
        .unwrap_or_else(|error| panic!("failed to build request: {error}"))
}

fn get_request(uri: &str, headers: &[(&str, &str)]) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }

    builder
        .body(Body::empty())
        .unwrap_or_else(|error| panic!("failed to build request: {error}"))
}

fn header_value<'a>(response: &'a TestResponse, name: &str) -> Option<&'a str> {
    response
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
}

#[tokio::test]
async fn trigger_succeeds_and_records_one_audit_entry() {
    let jenkins = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/job/demo/build"))
        .respond_with(
            ResponseTemplate::new(201).insert_header("Location", "http://jenkins/job/demo/7/"),
        )
        .expect(1)
        .mount(&jenkins)
        .await;

    let app = test_app(&jenkins.uri(), "").await;

    let response = send(
        &app,
        trigger_request(r#"{"job":"demo"}"#, Some(format!("Bearer {API_KEY}").as_str())),
    )
    .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["success"], true);
    assert_eq!(response.body["build_id"], "demo/7");
    assert_eq!(
        response.body["message"],
        "Successfully triggered build for job demo"
    );

    let audit = send(
        &app,
        get_request("/api/v1/audit", &[("Authorization", API_KEY)]),
    )
    .await;
    assert_eq!(audit.status, StatusCode::OK);

    let entries = audit.body.as_array().cloned().unwrap_or_default();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["result"], "success");
    assert_eq!(entries[0]["job_name"], "demo");
    assert_eq!(entries[0]["api_key"], API_KEY);
    assert_eq!(entries[0]["method"], "POST");
    assert_eq!(entries[0]["path"], TRIGGER_PATH);
    assert_eq!(entries[0]["status"], 200);
    assert_eq!(entries[0]["params"], "{}");
    assert!(entries[0].get("error").is_none());
}

#[tokio::test]
async fn upstream_failure_returns_failed_result_and_audits_detail() {
    let jenkins = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/job/demo/buildWithParameters"))
        .respond_with(ResponseTemplate::new(503).set_body_string("java.lang.IllegalStateException"))
        .mount(&jenkins)
        .await;

    let app = test_app(&jenkins.uri(), "").await;
    let body = json!({"job": "demo", "parameters": {"BRANCH": "main"}}).to_string();

    let response = send(&app, trigger_request(body.as_str(), Some(API_KEY))).await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.body["success"], false);
    assert_eq!(
        response.body["message"],
        "Failed to trigger build: jenkins server error: please try again later"
    );
    assert!(!response.body.to_string().contains("IllegalStateException"));

    let audit = send(
        &app,
        get_request("/api/v1/audit", &[("Authorization", API_KEY)]),
    )
    .await;
    let entries = audit.body.as_array().cloned().unwrap_or_default();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["result"], "failed");
    assert_eq!(entries[0]["status"], 500);
    assert_eq!(entries[0]["params"], r#"{"BRANCH":"main"}"#);
    assert!(
        entries[0]["error"]
            .as_str()
            .unwrap_or_default()
            .contains("status 503")
    );
}

#[tokio::test]
async fn missing_or_unknown_api_key_is_rejected() {
    let jenkins = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&jenkins)
        .await;

    let app = test_app(&jenkins.uri(), "").await;

    let missing = send(&app, trigger_request(r#"{"job":"demo"}"#, None)).await;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);
    assert_eq!(missing.body["error"], "Unauthorized");
    assert_eq!(missing.body["status"], "Unauthorized");

    let unknown = send(
        &app,
        trigger_request(r#"{"job":"demo"}"#, Some("Bearer not-a-key")),
    )
    .await;
    assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);

    let audit = send(&app, get_request("/api/v1/audit", &[])).await;
    assert_eq!(audit.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn invalid_payloads_never_reach_jenkins() {
    let jenkins = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&jenkins)
        .await;

    let app = test_app(&jenkins.uri(), "").await;

    let malformed = send(&app, trigger_request("{not json", Some(API_KEY))).await;
    assert_eq!(malformed.status, StatusCode::BAD_REQUEST);
    assert_eq!(malformed.body["error"], "Invalid request body");

    let missing_job = send(&app, trigger_request("{}", Some(API_KEY))).await;
    assert_eq!(missing_job.status, StatusCode::BAD_REQUEST);
    assert_eq!(missing_job.body["error"], "Job name is required");

    let bad_key = json!({"job": "demo", "parameters": {".hidden": "x"}}).to_string();
    let bad_parameters = send(&app, trigger_request(bad_key.as_str(), Some(API_KEY))).await;
    assert_eq!(bad_parameters.status, StatusCode::BAD_REQUEST);
    assert!(bad_parameters.body["request_id"].is_string());

    let audit = send(
        &app,
        get_request("/api/v1/audit", &[("Authorization", API_KEY)]),
    )
    .await;
    assert_eq!(audit.body, json!([]));
}

#[tokio::test]
async fn oversized_body_is_rejected_with_413() {
    let jenkins = MockServer::start().await;
    let app = test_app(&jenkins.uri(), "server:\n  max_body_size: 64").await;

    let body = json!({"job": "demo", "parameters": {"PAYLOAD": "x".repeat(256)}}).to_string();
    let response = send(&app, trigger_request(body.as_str(), Some(API_KEY))).await;

    assert_eq!(response.status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(response.body["error"], "Request body too large");
}

#[tokio::test]
async fn request_id_is_reused_or_generated_and_echoed() {
    let jenkins = MockServer::start().await;
    let app = test_app(&jenkins.uri(), "").await;

    let supplied = send(
        &app,
        get_request("/api/v1/audit", &[("X-Request-ID", "  trace-123  ")]),
    )
    .await;
    assert_eq!(header_value(&supplied, "x-request-id"), Some("trace-123"));
    assert_eq!(supplied.body["request_id"], "trace-123");

    let generated = send(&app, get_request("/health", &[])).await;
    let request_id = header_value(&generated, "x-request-id").unwrap_or_default();
    assert_eq!(request_id.len(), 32);
    assert!(request_id.chars().all(|character| character.is_ascii_hexdigit()));
}

#[tokio::test]
async fn cors_allows_everything_without_allow_list() {
    let jenkins = MockServer::start().await;
    let app = test_app(&jenkins.uri(), "").await;

    let response = send(
        &app,
        get_request("/health", &[("Origin", "https://anywhere.example")]),
    )
    .await;

    assert_eq!(
        header_value(&response, ACCESS_CONTROL_ALLOW_ORIGIN.as_str()),
        Some("*")
    );
    assert_eq!(
        header_value(&response, ACCESS_CONTROL_ALLOW_METHODS.as_str()),
        Some("GET, POST, OPTIONS")
    );
}

#[tokio::test]
async fn cors_allow_list_echoes_matches_and_withholds_others() {
    let jenkins = MockServer::start().await;
    let app = test_app(
        &jenkins.uri(),
        "server:\n  allowed_origins:\n    - \"https://ci.example.com\"",
    )
    .await;

    let allowed = send(
        &app,
        get_request("/health", &[("Origin", "https://CI.example.com")]),
    )
    .await;
    assert_eq!(
        header_value(&allowed, ACCESS_CONTROL_ALLOW_ORIGIN.as_str()),
        Some("https://CI.example.com")
    );

    for origin in ["file://", "https://evil.example.com"] {
        let rejected = send(&app, get_request("/health", &[("Origin", origin)])).await;
        assert_eq!(rejected.status, StatusCode::OK);
        assert!(
            header_value(&rejected, ACCESS_CONTROL_ALLOW_ORIGIN.as_str()).is_none(),
            "origin {origin} should not receive a CORS header"
        );
        assert!(header_value(&rejected, ACCESS_CONTROL_ALLOW_METHODS.as_str()).is_some());
    }

    let same_origin = send(&app, get_request("/health", &[])).await;
    assert!(header_value(&same_origin, ACCESS_CONTROL_ALLOW_ORIGIN.as_str()).is_none());
}

#[tokio::test]
async fn preflight_is_answered_before_authentication() {
    let jenkins = MockServer::start().await;
    let app = test_app(&jenkins.uri(), "").await;

    let request = Request::builder()
        .method("OPTIONS")
        .uri(TRIGGER_PATH)
        .header("Origin", "https://ci.example.com")
        .body(Body::empty())
        .unwrap_or_else(|error| panic!("failed to build request: {error}"));
    let response = send(&app, request).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, Value::Null);
    assert!(header_value(&response, "x-request-id").is_some());
    assert_eq!(
        header_value(&response, ACCESS_CONTROL_ALLOW_ORIGIN.as_str()),
        Some("*")
    );
}

#[tokio::test]
async fn build_status_resolves_and_validates_build_ids() {
    let jenkins = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/job/demo/7/api/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "number": 7,
            "url": "http://jenkins/job/demo/7/"
        })))
        .mount(&jenkins)
        .await;

    let app = test_app(&jenkins.uri(), "").await;

    let found = send(
        &app,
        get_request(
            "/api/v1/status/jenkins?build_id=demo/7",
            &[("Authorization", API_KEY)],
        ),
    )
    .await;
    assert_eq!(found.status, StatusCode::OK);
    assert_eq!(found.body["build_id"], "demo/7");
    assert_eq!(found.body["build_url"], "http://jenkins/job/demo/7/");

    let malformed = send(
        &app,
        get_request(
            "/api/v1/status/jenkins?build_id=demo",
            &[("Authorization", API_KEY)],
        ),
    )
    .await;
    assert_eq!(malformed.status, StatusCode::BAD_REQUEST);

    let audit = send(
        &app,
        get_request("/api/v1/audit", &[("Authorization", API_KEY)]),
    )
    .await;
    assert_eq!(audit.body, json!([]));
}

#[tokio::test]
async fn public_endpoints_report_service_and_store_health() {
    let jenkins = MockServer::start().await;
    let app = test_app(&jenkins.uri(), "").await;

    let root = send(&app, get_request("/", &[])).await;
    assert_eq!(root.status, StatusCode::OK);
    assert_eq!(root.body["message"], "TriggerMesh API");
    assert!(root.body["endpoints"].is_array());

    let healthy = send(&app, get_request("/health", &[])).await;
    assert_eq!(healthy.status, StatusCode::OK);
    assert_eq!(healthy.body, json!({"status": "healthy"}));

    let missing = send(&app, get_request("/does-not-exist", &[])).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);

    app.pool.close().await;
    let unhealthy = send(&app, get_request("/health", &[])).await;
    assert_eq!(unhealthy.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(unhealthy.body["status"], "unhealthy");
    assert_eq!(unhealthy.body["error"], "database connection failed");
}
