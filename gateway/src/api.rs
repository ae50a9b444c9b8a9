//! # Tool-Calling HTTP API
//!
//! Builds the axum router that exposes the toolkit dispatcher over HTTP.
//! All endpoints share application state through axum's `State` extractor.
//!
//! ## Endpoints
//!
//! | Method | Path           | Description                       |
//! |--------|----------------|-----------------------------------|
//! | GET    | `/health`      | Liveness probe                    |
//! | GET    | `/tools`       | The tool vocabulary, as JSON      |
//! | POST   | `/tools/:name` | Invoke one tool with JSON args    |
//!
//! Routing is the only place HTTP status codes carry meaning: a name
//! outside the tool vocabulary is a 404. Everything else, including
//! argument problems and pipeline failures, comes back as a 200 whose
//! payload carries the `isError` flag.

use axum::{
    extract::{Path, State},
    http::{Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use helio_toolkit::tools::{Dispatcher, ToolCall, ToolResponse, TOOL_NAMES};

use crate::metrics::SharedMetrics;

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// Shared application state available to all request handlers.
///
/// Cheap to clone — the dispatcher holds at most an endpoint string and
/// the metrics sit behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// The gateway's reported version string.
    pub version: String,
    /// Routes tool calls through the toolkit pipeline.
    pub dispatcher: Dispatcher,
    /// Reference to Prometheus metrics for in-handler recording.
    pub metrics: SharedMetrics,
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

/// Builds the full axum [`Router`] with all API routes, CORS, and tracing.
///
/// The returned router is ready to be served on the configured HTTP port.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/tools", get(tools_index_handler))
        .route("/tools/:name", post(call_tool_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Response Types
// ---------------------------------------------------------------------------

/// Response payload for `GET /health`.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always "ok" when the process is serving.
    pub status: String,
    /// Gateway software version.
    pub version: String,
    /// ISO-8601 timestamp of the response.
    pub timestamp: String,
}

/// Error body for routing-level failures (unknown tool names).
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /health` — returns 200 if the gateway is alive.
///
/// This is the liveness probe for orchestrators (k8s, systemd, etc.).
/// It intentionally does not probe upstream clusters — a cluster outage
/// is a per-call failure, not a reason to restart the gateway.
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".into(),
        version: state.version.clone(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// `GET /tools` — returns the tool vocabulary as a JSON array of names.
async fn tools_index_handler() -> impl IntoResponse {
    Json(TOOL_NAMES)
}

/// `POST /tools/:name` — invokes one tool with the JSON body as arguments.
///
/// Unknown tool names are a routing failure and return 404. Every other
/// outcome, success and failure alike, is a 200 whose body is the uniform
/// `{ text, isError }` envelope.
async fn call_tool_handler(
    Path(name): Path<String>,
    State(state): State<AppState>,
    Json(args): Json<serde_json::Value>,
) -> impl IntoResponse {
    if !TOOL_NAMES.contains(&name.as_str()) {
        let err = ErrorResponse {
            error: format!("unknown tool \"{name}\""),
        };
        return (StatusCode::NOT_FOUND, Json(serde_json::to_value(err).unwrap()))
            .into_response();
    }

    state.metrics.tool_calls_total.with_label_values(&[&name]).inc();

    let call = match ToolCall::parse(&name, args) {
        Ok(call) => call,
        Err(message) => {
            state.metrics.tool_errors_total.with_label_values(&[&name]).inc();
            let response = ToolResponse {
                text: message,
                is_error: true,
            };
            return (StatusCode::OK, Json(serde_json::to_value(response).unwrap()))
                .into_response();
        }
    };

    let started = Instant::now();
    let response = state.dispatcher.dispatch(call).await;
    state
        .metrics
        .tool_latency_seconds
        .with_label_values(&[&name])
        .observe(started.elapsed().as_secs_f64());

    if response.is_error {
        state.metrics.tool_errors_total.with_label_values(&[&name]).inc();
    }

    (StatusCode::OK, Json(serde_json::to_value(response).unwrap())).into_response()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use tower::ServiceExt;

    /// Creates a test AppState whose dispatcher points at an endpoint
    /// nothing listens on, so calls that reach the network fail fast.
    fn test_app_state() -> AppState {
        AppState {
            version: "0.1.0-test".into(),
            dispatcher: Dispatcher::with_endpoint("http://127.0.0.1:9"),
            metrics: Arc::new(crate::metrics::GatewayMetrics::new()),
        }
    }

    /// Sends a GET request and returns the (status, body_bytes).
    async fn get(router: &Router, path: &str) -> (StatusCode, Vec<u8>) {
        let req = Request::builder().uri(path).body(Body::empty()).unwrap();
        let resp = router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let body = resp
            .into_body()
            .collect()
            .await
            .unwrap()
            .to_bytes()
            .to_vec();
        (status, body)
    }

    /// Sends a POST request with JSON body and returns (status, body_bytes).
    async fn post_json(
        router: &Router,
        path: &str,
        body: serde_json::Value,
    ) -> (StatusCode, Vec<u8>) {
        let req = Request::builder()
            .method("POST")
            .uri(path)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap();
        let resp = router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let body = resp
            .into_body()
            .collect()
            .await
            .unwrap()
            .to_bytes()
            .to_vec();
        (status, body)
    }

    // -- 1. Health endpoint reports liveness and version ---------------------

    #[tokio::test]
    async fn health_endpoint_returns_ok() {
        let router = create_router(test_app_state());
        let (status, body) = get(&router, "/health").await;

        assert_eq!(status, StatusCode::OK);
        let resp: HealthResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(resp.status, "ok");
        assert_eq!(resp.version, "0.1.0-test");
    }

    // -- 2. Tool index lists the whole vocabulary ----------------------------

    #[tokio::test]
    async fn tools_index_lists_the_vocabulary() {
        let router = create_router(test_app_state());
        let (status, body) = get(&router, "/tools").await;

        assert_eq!(status, StatusCode::OK);
        let names: Vec<String> = serde_json::from_slice(&body).unwrap();
        assert_eq!(names.len(), TOOL_NAMES.len());
        assert!(names.iter().any(|n| n == "getBalance"));
        assert!(names.iter().any(|n| n == "buildTransaction"));
    }

    // -- 3. Unknown tool names are a routing 404 -----------------------------

    #[tokio::test]
    async fn unknown_tool_name_is_a_routing_404() {
        let router = create_router(test_app_state());
        let (status, body) = post_json(&router, "/tools/mintNft", serde_json::json!({})).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        let err: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert!(err.error.contains("unknown tool"), "error: {}", err.error);
    }

    // -- 4. Argument problems are payload errors, not transport errors -------

    #[tokio::test]
    async fn bad_arguments_come_back_as_a_payload_error() {
        let router = create_router(test_app_state());
        let (status, body) = post_json(
            &router,
            "/tools/getBalance",
            serde_json::json!({ "cluster": "devnet" }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let resp: ToolResponse = serde_json::from_slice(&body).unwrap();
        assert!(resp.is_error);
        assert!(resp.text.contains("publicKey"), "text: {}", resp.text);
    }

    // -- 5. Pipeline failures stay HTTP 200 ----------------------------------

    #[tokio::test]
    async fn tool_failure_stays_http_200() {
        let router = create_router(test_app_state());
        let (status, body) = post_json(
            &router,
            "/tools/getBalance",
            serde_json::json!({ "publicKey": "not-an-address", "cluster": "devnet" }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let resp: ToolResponse = serde_json::from_slice(&body).unwrap();
        assert!(resp.is_error);
        assert!(resp.text.contains("invalid address"), "text: {}", resp.text);
    }

    // -- 6. The envelope keeps its camelCase shape over the wire --------------

    #[tokio::test]
    async fn response_envelope_uses_camel_case_on_the_wire() {
        let router = create_router(test_app_state());
        let (_, body) = post_json(
            &router,
            "/tools/getBalance",
            serde_json::json!({ "publicKey": "not-an-address", "cluster": "devnet" }),
        )
        .await;

        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(value.get("isError").is_some(), "body: {value}");
        assert!(value.get("is_error").is_none(), "body: {value}");
    }

    // -- 7. Metrics record dispatches and failures ---------------------------

    #[tokio::test]
    async fn metrics_count_calls_and_errors() {
        let state = test_app_state();
        let metrics = state.metrics.clone();
        let router = create_router(state);

        post_json(
            &router,
            "/tools/getBalance",
            serde_json::json!({ "publicKey": "not-an-address", "cluster": "devnet" }),
        )
        .await;

        assert_eq!(
            metrics
                .tool_calls_total
                .with_label_values(&["getBalance"])
                .get(),
            1
        );
        assert_eq!(
            metrics
                .tool_errors_total
                .with_label_values(&["getBalance"])
                .get(),
            1
        );
    }

    // -- 8. Unknown tools never touch the metrics ----------------------------

    #[tokio::test]
    async fn unknown_tools_are_not_counted() {
        let state = test_app_state();
        let metrics = state.metrics.clone();
        let router = create_router(state);

        post_json(&router, "/tools/mintNft", serde_json::json!({})).await;

        assert_eq!(
            metrics.tool_calls_total.with_label_values(&["mintNft"]).get(),
            0
        );
    }
}
