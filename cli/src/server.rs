//! # HTTP API
//!
//! Builds the axum router that exposes the three library operations over
//! HTTP. Every handler runs the same synchronous core as the CLI; the
//! server holds no state beyond its configuration.
//!
//! ## Endpoints
//!
//! | Method | Path       | Body                                  | Response                      |
//! |--------|------------|---------------------------------------|-------------------------------|
//! | GET    | `/health`  |                                       | `{"status": "ok"}`            |
//! | POST   | `/address` | `{"raw_private_key": hex}`            | `{xpub, address}`             |
//! | POST   | `/build`   | build request                         | template                      |
//! | POST   | `/sign`    | `{"raw_private_key": hex, "template"}`| `{transaction, sign_complete}` |

use axum::{
    extract::State,
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use zeroize::Zeroizing;

use bm_txkit::api::{self, BuildRequest, SignRequest};
use bm_txkit::config::Config;
use bm_txkit::Error;

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// Shared application state available to all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

/// Builds the full [`Router`] with all routes, CORS and tracing.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/address", post(address_handler))
        .route("/build", post(build_handler))
        .route("/sign", post(sign_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Request / Response Types
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct AddressRequest {
    raw_private_key: String,
}

/// Body of every non-2xx response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Stable, machine-readable error kind.
    pub code: String,
    /// Human-readable message.
    pub error: String,
}

/// Maps library errors onto HTTP responses.
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError(e)
    }
}

impl ApiError {
    fn code(&self) -> &'static str {
        match &self.0 {
            Error::InvalidKeyLength { .. } | Error::InvalidKeyEncoding => "invalid_key",
            Error::MissingActionType { .. } => "missing_action_type",
            Error::UnknownActionType { .. } => "unknown_action_type",
            Error::MalformedAction { .. } => "malformed_action",
            Error::ActionBuildFailure(_) => "action_build_failure",
            Error::TtlOutOfRange(_) => "bad_ttl",
            Error::Serialization(_) | Error::Encoding(_) => "bad_request",
            Error::Address(_) | Error::Signer(_) => "bad_request",
            Error::Sign(_) => "bad_template",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            code: self.code().to_string(),
            error: self.0.to_string(),
        };
        tracing::warn!(code = %body.code, error = %body.error, "request failed");
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /health` — liveness probe.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

/// `POST /address` — xpub and receive address of a raw key.
async fn address_handler(
    State(state): State<AppState>,
    Json(req): Json<AddressRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let key = Zeroizing::new(req.raw_private_key);
    Ok(Json(api::get_address(&key, &state.config)?))
}

/// `POST /build` — unsigned template from a build request.
async fn build_handler(
    State(state): State<AppState>,
    Json(req): Json<BuildRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let built = api::create_raw_transaction(&req, &state.config)?;
    Ok(Json(built.template))
}

/// `POST /sign` — attach every signature the key can contribute.
async fn sign_handler(Json(req): Json<SignRequest>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(api::sign_raw_transaction(
        &req.raw_private_key,
        req.template,
    )?))
}
