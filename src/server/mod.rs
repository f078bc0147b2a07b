//! HTTP surface of the fit-sync server.
//!
//! # Endpoints
//!
//! - `GET /health`: Health check endpoint (no auth required)
//! - `GET /v1/accounts/{account_id}/state`: Fetch the account's document (404 if none)
//! - `PUT /v1/accounts/{account_id}/state`: Replace the account's document

pub mod storage;

pub use storage::{DocumentStore, ServerStorageError};

use axum::{
    extract::{Path, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use fit_sync_core::AppState;

use crate::config::ApiKeyStore;

/// Authenticated account, added to request extensions after auth
#[derive(Debug, Clone)]
pub struct AuthAccount {
    pub account_id: String,
}

/// State shared across handlers
#[derive(Clone)]
pub struct ServerState {
    pub api_keys: Arc<ApiKeyStore>,
    pub documents: DocumentStore,
}

/// Error response body
#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

fn error_response(status: StatusCode, error: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            error,
            message: message.into(),
        }),
    )
        .into_response()
}

/// Authentication middleware
async fn auth_middleware(
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let api_key = match auth_header {
        Some(h) => match h.strip_prefix("Bearer ") {
            Some(key) => key,
            None => {
                return error_response(
                    StatusCode::UNAUTHORIZED,
                    "invalid_auth",
                    "Authorization header must use Bearer scheme",
                )
            }
        },
        None => {
            return error_response(
                StatusCode::UNAUTHORIZED,
                "missing_auth",
                "Authorization header required",
            )
        }
    };

    match state.api_keys.validate(api_key) {
        Some(account) => {
            request.extensions_mut().insert(account);
            next.run(request).await
        }
        None => error_response(StatusCode::UNAUTHORIZED, "invalid_key", "Invalid API key"),
    }
}

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// A key may only touch the account it was issued for.
fn authorize(auth: &AuthAccount, account_id: &str) -> Result<(), Response> {
    if auth.account_id == account_id {
        Ok(())
    } else {
        Err(error_response(
            StatusCode::FORBIDDEN,
            "forbidden",
            "API key is not valid for this account",
        ))
    }
}

fn storage_error(e: ServerStorageError) -> Response {
    match e {
        ServerStorageError::InvalidAccountId(_) => {
            error_response(StatusCode::BAD_REQUEST, "invalid_account", e.to_string())
        }
        _ => {
            tracing::error!("Storage error: {}", e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "storage_error",
                "Failed to access document",
            )
        }
    }
}

async fn get_state(
    State(state): State<ServerState>,
    Extension(auth): Extension<AuthAccount>,
    Path(account_id): Path<String>,
) -> Response {
    if let Err(response) = authorize(&auth, &account_id) {
        return response;
    }

    match state.documents.load(&account_id) {
        Ok(Some(doc)) => Json(doc).into_response(),
        Ok(None) => error_response(
            StatusCode::NOT_FOUND,
            "not_found",
            "No document stored for this account",
        ),
        Err(e) => storage_error(e),
    }
}

async fn put_state(
    State(state): State<ServerState>,
    Extension(auth): Extension<AuthAccount>,
    Path(account_id): Path<String>,
    Json(doc): Json<AppState>,
) -> Response {
    if let Err(response) = authorize(&auth, &account_id) {
        return response;
    }

    match state.documents.save(&account_id, &doc) {
        Ok(()) => {
            tracing::debug!(account = %account_id, updated_at = doc.updated_at, "Stored document");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => storage_error(e),
    }
}

/// Builds the full router with auth and request tracing.
pub fn router(state: ServerState) -> Router {
    let public_routes = Router::new().route("/health", get(health));

    let protected_routes = Router::new()
        .route(
            "/v1/accounts/{account_id}/state",
            get(get_state).put(put_state),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
