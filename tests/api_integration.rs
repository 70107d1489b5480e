//! HTTP integration tests.
//!
//! These drive the full router (rate limiting, CORS, session routing, MCP
//! dispatch) with axum's test utilities and in-memory providers.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use cineconcerts_mcp::api::{create_router, create_router_at, AppState};
use cineconcerts_mcp::providers::{
    EventHit, EventSearch, GeoPoint, Geocoder, ProviderResult,
};
use cineconcerts_mcp::security::{RateLimitConfig, RateLimiter};
use cineconcerts_mcp::session::{ManualClock, RegistryConfig, SessionRegistry};
use cineconcerts_mcp::{event_tools, SessionId};

const SESSION: &str = "mcp-session-id";

struct StaticSearch {
    hits: Vec<EventHit>,
}

impl StaticSearch {
    fn new() -> Self {
        let hits = vec![
            json!({
                "objectID": "1",
                "Title": "Harry Potter and the Goblet of Fire in Concert",
                "Event Date": "2026-05-02",
                "Show Code": "HP4-NYC-2026",
                "Venue": "Radio City Music Hall",
                "City": "New York",
                "Country": "USA"
            }),
            json!({
                "objectID": "2",
                "Title": "Gladiator Live",
                "Show Code": "GLAD-LDN-2026",
                "City": "London"
            }),
        ];
        Self {
            hits: hits
                .into_iter()
                .map(|v| serde_json::from_value(v).unwrap())
                .collect(),
        }
    }
}

#[async_trait]
impl EventSearch for StaticSearch {
    async fn search(&self, _query: &str) -> ProviderResult<Vec<EventHit>> {
        Ok(self.hits.clone())
    }

    async fn geo_search(&self, _lat: f64, _lng: f64, _radius_m: u64) -> ProviderResult<Vec<EventHit>> {
        Ok(self.hits[..1].to_vec())
    }

    async fn browse(&self, limit: u32) -> ProviderResult<Vec<EventHit>> {
        Ok(self.hits.iter().take(limit as usize).cloned().collect())
    }

    async fn find_by_show_code(&self, show_code: &str) -> ProviderResult<Option<EventHit>> {
        Ok(self
            .hits
            .iter()
            .find(|h| h.show_code().is_some_and(|c| c.eq_ignore_ascii_case(show_code)))
            .cloned())
    }
}

struct StaticGeocoder;

#[async_trait]
impl Geocoder for StaticGeocoder {
    async fn geocode(&self, location: &str) -> ProviderResult<Option<GeoPoint>> {
        Ok((location == "New York").then(|| GeoPoint {
            lat: 40.71,
            lng: -74.0,
            display_name: "New York, United States".to_string(),
        }))
    }
}

fn state_with(registry: SessionRegistry, limiter: RateLimiter) -> AppState {
    let tools = event_tools(Arc::new(StaticSearch::new()), Arc::new(StaticGeocoder));
    AppState::new(Arc::new(registry), Arc::new(tools)).with_rate_limiter(limiter)
}

fn app_with(max_sessions: usize) -> (Router, AppState) {
    let registry = SessionRegistry::new(RegistryConfig {
        max_sessions,
        ..RegistryConfig::default()
    });
    let state = state_with(registry, RateLimiter::disabled());
    (create_router(state.clone()), state)
}

fn app() -> (Router, AppState) {
    app_with(100)
}

fn rpc(uri: &str, session: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::ACCEPT, "application/json, text/event-stream");
    if let Some(id) = session {
        builder = builder.header(SESSION, id);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn bare(method: Method, uri: &str, session: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(id) = session {
        builder = builder.header(SESSION, id);
    }
    builder.body(Body::empty()).unwrap()
}

fn initialize_body() -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": 0,
        "method": "initialize",
        "params": {
            "protocolVersion": "2025-06-18",
            "capabilities": {},
            "clientInfo": {"name": "test-client", "version": "0.0.1"}
        }
    })
}

async fn response_text(response: axum::response::Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8_lossy(&body).to_string()
}

async fn response_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap_or(Value::Null)
}

/// Open a session and return its id.
async fn open_session(app: &Router) -> String {
    let response = app
        .clone()
        .oneshot(rpc("/", None, initialize_body()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    response
        .headers()
        .get(SESSION)
        .expect("session header")
        .to_str()
        .unwrap()
        .to_string()
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _) = app();

    let response = app.oneshot(bare(Method::GET, "/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = response_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["server"], "cineconcerts-mcp");
    assert_eq!(json["activeSessions"], 0);
    assert_eq!(
        json["tools"],
        json!([
            "search_shows",
            "find_nearby_shows",
            "list_upcoming_shows",
            "get_show_details"
        ])
    );
}

#[tokio::test]
async fn test_health_counts_sessions() {
    let (app, _) = app();
    open_session(&app).await;
    open_session(&app).await;

    let response = app.oneshot(bare(Method::GET, "/health", None)).await.unwrap();
    assert_eq!(response_json(response).await["activeSessions"], 2);
}

// ============================================================================
// Session lifecycle
// ============================================================================

#[tokio::test]
async fn test_initialize_round_trip() {
    let (app, state) = app();

    let response = app
        .clone()
        .oneshot(rpc("/", None, initialize_body()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let sid = response.headers()[SESSION].to_str().unwrap().to_string();
    assert!(sid.parse::<SessionId>().is_ok());

    let json = response_json(response).await;
    assert_eq!(json["id"], 0);
    assert_eq!(json["result"]["protocolVersion"], "2025-06-18");
    assert_eq!(json["result"]["serverInfo"]["name"], "cineconcerts");
    assert_eq!(state.registry.len(), 1);

    let response = app
        .oneshot(rpc(
            "/",
            Some(&sid),
            json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[SESSION], sid.as_str());

    let json = response_json(response).await;
    assert_eq!(json["id"], 1);
    assert_eq!(json["result"]["tools"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_tools_call_over_http() {
    let (app, _) = app();
    let sid = open_session(&app).await;

    let response = app
        .clone()
        .oneshot(rpc(
            "/",
            Some(&sid),
            json!({
                "jsonrpc": "2.0",
                "id": 2,
                "method": "tools/call",
                "params": {"name": "search_shows", "arguments": {"query": "harry potter"}}
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = response_json(response).await;
    let text = json["result"]["content"][0]["text"].as_str().unwrap();
    assert!(text.starts_with("Found 2 show(s) matching \"harry potter\":"));
    assert!(text.contains("**Harry Potter and the Goblet of Fire in Concert**"));
    assert!(json["result"].get("isError").is_none());

    let response = app
        .oneshot(rpc(
            "/",
            Some(&sid),
            json!({
                "jsonrpc": "2.0",
                "id": 3,
                "method": "tools/call",
                "params": {"name": "get_show_details", "arguments": {"show_code": "hp4-nyc-2026"}}
            }),
        ))
        .await
        .unwrap();
    let json = response_json(response).await;
    let text = json["result"]["content"][0]["text"].as_str().unwrap();
    assert!(text.contains("**Venue**: Radio City Music Hall"));
}

#[tokio::test]
async fn test_unknown_tool_is_invalid_params() {
    let (app, _) = app();
    let sid = open_session(&app).await;

    let response = app
        .oneshot(rpc(
            "/",
            Some(&sid),
            json!({
                "jsonrpc": "2.0",
                "id": 4,
                "method": "tools/call",
                "params": {"name": "book_tickets", "arguments": {}}
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_json(response).await["error"]["code"], -32602);
}

#[tokio::test]
async fn test_notification_accepted() {
    let (app, _) = app();
    let sid = open_session(&app).await;

    let response = app
        .oneshot(rpc(
            "/",
            Some(&sid),
            json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert!(response_text(response).await.is_empty());
}

#[tokio::test]
async fn test_request_without_session_rejected() {
    let (app, state) = app();

    let response = app
        .oneshot(rpc(
            "/",
            None,
            json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = response_json(response).await;
    assert_eq!(json["error"]["code"], -32000);
    assert_eq!(json["error"]["message"], "Bad Request: No valid session");
    assert_eq!(json["id"], Value::Null);
    assert_eq!(state.registry.len(), 0);
}

#[tokio::test]
async fn test_unknown_session_rejected() {
    let (app, state) = app();
    let stranger = SessionId::new().to_string();

    for body in [
        json!({"jsonrpc": "2.0", "id": 1, "method": "ping"}),
        initialize_body(),
    ] {
        let response = app
            .clone()
            .oneshot(rpc("/", Some(&stranger), body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response_json(response).await["error"]["code"], -32000);
    }

    let response = app
        .oneshot(rpc(
            "/",
            Some("definitely-not-a-uuid"),
            json!({"jsonrpc": "2.0", "id": 1, "method": "ping"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(state.registry.len(), 0);
}

#[tokio::test]
async fn test_deleted_session_rejected() {
    let (app, state) = app();
    let sid = open_session(&app).await;

    let response = app
        .clone()
        .oneshot(bare(Method::DELETE, "/", Some(&sid)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(state.registry.len(), 0);

    let response = app
        .clone()
        .oneshot(rpc(
            "/",
            Some(&sid),
            json!({"jsonrpc": "2.0", "id": 1, "method": "ping"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // A second DELETE finds nothing.
    let response = app
        .oneshot(bare(Method::DELETE, "/", Some(&sid)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_capacity_scenario() {
    let (app, state) = app_with(2);

    let a = open_session(&app).await;
    let _b = open_session(&app).await;

    let response = app
        .clone()
        .oneshot(rpc("/", None, initialize_body()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(response.headers().get(SESSION).is_none());
    let json = response_json(response).await;
    assert_eq!(json["error"]["code"], -32000);
    assert_eq!(
        json["error"]["message"],
        "Server at capacity. Try again later."
    );
    assert_eq!(state.registry.len(), 2);

    let response = app
        .clone()
        .oneshot(bare(Method::DELETE, "/", Some(&a)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let d = open_session(&app).await;
    assert_ne!(d, a);
    assert_eq!(state.registry.len(), 2);
}

#[tokio::test]
async fn test_failed_initialize_leaves_no_session() {
    let (app, state) = app();

    for body in [
        json!({"jsonrpc": "2.0", "id": 0, "method": "initialize"}),
        json!({"jsonrpc": "2.0", "id": 0, "method": "initialize", "params": {}}),
    ] {
        let response = app.clone().oneshot(rpc("/", None, body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response.headers().get(SESSION).is_none());
        assert_eq!(response_json(response).await["error"]["code"], -32000);
    }

    assert_eq!(state.registry.len(), 0);
}

#[tokio::test]
async fn test_idle_session_swept() {
    let clock = Arc::new(ManualClock::new());
    let registry = SessionRegistry::with_clock(RegistryConfig::default(), clock.clone());
    let state = state_with(registry, RateLimiter::disabled());
    let app = create_router(state.clone());

    let sid = open_session(&app).await;

    clock.advance(Duration::from_secs(29 * 60));
    assert_eq!(state.registry.sweep_expired().unwrap(), 0);

    clock.advance(Duration::from_secs(2 * 60));
    assert_eq!(state.registry.sweep_expired().unwrap(), 1);

    let response = app
        .oneshot(rpc(
            "/",
            Some(&sid),
            json!({"jsonrpc": "2.0", "id": 1, "method": "ping"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ============================================================================
// Event stream and termination
// ============================================================================

#[tokio::test]
async fn test_get_and_delete_require_session() {
    let (app, _) = app();
    let stranger = SessionId::new().to_string();

    for (method, session) in [
        (Method::GET, None),
        (Method::GET, Some(stranger.as_str())),
        (Method::DELETE, None),
        (Method::DELETE, Some(stranger.as_str())),
    ] {
        let response = app
            .clone()
            .oneshot(bare(method, "/", session))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response_text(response).await, "Invalid or missing session ID");
    }
}

#[tokio::test]
async fn test_event_stream_single_per_session() {
    let (app, _) = app();
    let sid = open_session(&app).await;

    let first = app
        .clone()
        .oneshot(bare(Method::GET, "/", Some(&sid)))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    assert!(first.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/event-stream"));

    let second = app
        .clone()
        .oneshot(bare(Method::GET, "/", Some(&sid)))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);
    assert_eq!(response_json(second).await["error"]["code"], -32000);

    // Terminating the session ends the open stream.
    let response = app
        .oneshot(bare(Method::DELETE, "/", Some(&sid)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let drained = tokio::time::timeout(
        Duration::from_secs(5),
        axum::body::to_bytes(first.into_body(), usize::MAX),
    )
    .await;
    assert!(drained.is_ok(), "stream still open after DELETE");
}

// ============================================================================
// Malformed input
// ============================================================================

#[tokio::test]
async fn test_malformed_json() {
    let (app, _) = app();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response_json(response).await["error"]["code"], -32700);
}

#[tokio::test]
async fn test_batch_rejected() {
    let (app, _) = app();
    let sid = open_session(&app).await;

    let response = app
        .oneshot(rpc(
            "/",
            Some(&sid),
            json!([{"jsonrpc": "2.0", "id": 1, "method": "ping"}]),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response_json(response).await["error"]["code"], -32600);
}

// ============================================================================
// Rate limiting, routing and CORS
// ============================================================================

#[tokio::test]
async fn test_rate_limit() {
    let registry = SessionRegistry::new(RegistryConfig::default());
    let state = state_with(registry, RateLimiter::new(RateLimitConfig::custom(2, 60)));
    let app = create_router(state);

    let ping = || {
        let mut request = rpc(
            "/",
            None,
            json!({"jsonrpc": "2.0", "id": 1, "method": "ping"}),
        );
        request
            .headers_mut()
            .insert("x-forwarded-for", "203.0.113.9".parse().unwrap());
        request
    };

    let response = app.clone().oneshot(ping()).await.unwrap();
    assert_eq!(response.headers()["x-ratelimit-limit"], "2");
    assert_eq!(response.headers()["x-ratelimit-remaining"], "1");

    app.clone().oneshot(ping()).await.unwrap();

    let response = app.clone().oneshot(ping()).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key(header::RETRY_AFTER));
    let json = response_json(response).await;
    assert_eq!(json["error"]["code"], -32000);
    assert_eq!(
        json["error"]["message"],
        "Rate limit exceeded. Try again shortly."
    );

    // Another client is unaffected, and health is never limited.
    let mut other = ping();
    other
        .headers_mut()
        .insert("x-forwarded-for", "198.51.100.1".parse().unwrap());
    let response = app.clone().oneshot(other).await.unwrap();
    assert_ne!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    let response = app.oneshot(bare(Method::GET, "/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_custom_endpoint_path() {
    let registry = SessionRegistry::new(RegistryConfig::default());
    let state = state_with(registry, RateLimiter::disabled());
    let app = create_router_at(state, "/mcp");

    let response = app
        .clone()
        .oneshot(rpc("/mcp", None, initialize_body()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key(SESSION));

    let response = app
        .oneshot(rpc("/", None, initialize_body()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cors_exposes_session_header() {
    let (app, _) = app();

    let mut request = rpc("/", None, initialize_body());
    request
        .headers_mut()
        .insert(header::ORIGIN, "https://agent.example".parse().unwrap());

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    let exposed = response.headers()[header::ACCESS_CONTROL_EXPOSE_HEADERS]
        .to_str()
        .unwrap()
        .to_ascii_lowercase();
    assert!(exposed.contains(SESSION));
}
