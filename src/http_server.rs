//! HTTP server implementation using Axum.

use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    body::{Body, Bytes},
    extract::{rejection::PathRejection, Path, RawQuery, Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get},
    Json, Router,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io;
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnResponse, TraceLayer};
use tracing::{info, Level};

/// Shortest password accepted for deletion.
pub const MIN_PASSWORD_LEN: usize = 4;

// Request/Response types
#[derive(Debug, Default, Deserialize)]
struct CreateUserRequest {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct DeleteUserRequest {
    #[serde(default)]
    password: Option<String>,
}

#[derive(Serialize)]
struct UsersResponse {
    users: Vec<String>,
}

#[derive(Serialize)]
struct OutcomeResponse {
    success: bool,
    message: String,
}

impl OutcomeResponse {
    fn ok(message: String) -> Json<Self> {
        Json(Self {
            success: true,
            message,
        })
    }
}

/// Build the API router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    // One INFO line per request: the span carries method and URI, the
    // response event carries status and latency. 5xx stays on that line.
    let request_log = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO))
        .on_failure(DefaultOnFailure::new().level(Level::DEBUG));

    Router::new()
        .route(
            "/api/users",
            get(list_users).post(create_user).fallback(not_found),
        )
        .route("/api/users/:id", delete(delete_user).fallback(not_found))
        .fallback(not_found)
        .with_state(state)
        .layer(middleware::from_fn(reject_head))
        .layer(cors)
        .layer(middleware::from_fn(answer_options))
        .layer(request_log)
}

/// Run the HTTP server on the given address until ctrl-c.
pub async fn run_server(addr: SocketAddr, state: AppState) -> io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Starting HTTP server on {}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutting down HTTP server");
    }
}

/// Length-only password check. Nothing is stored or compared.
pub fn password_accepted(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LEN
}

/// Decode a JSON body; an empty body means every field is absent.
fn parse_body<T: DeserializeOwned + Default>(body: &[u8]) -> Result<T, ApiError> {
    if body.is_empty() {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {}", e)))
}

/// The list and create routes only match the bare path; a query string is
/// an unknown route.
fn reject_query(query: &Option<String>) -> Result<(), ApiError> {
    match query {
        Some(_) => Err(ApiError::NotFound),
        None => Ok(()),
    }
}

async fn list_users(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Json<UsersResponse>, ApiError> {
    reject_query(&query)?;
    let users = state.runtime.list_users().await;
    Ok(Json(UsersResponse { users }))
}

async fn create_user(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> Result<Json<OutcomeResponse>, ApiError> {
    reject_query(&query)?;
    let req: CreateUserRequest = parse_body(&body)?;
    let id = req
        .id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing user id".to_string()))?;
    let password = req.password.unwrap_or_else(|| state.default_password.clone());

    state.runtime.create_user(&id, &password).await?;
    Ok(OutcomeResponse::ok(format!("User {} created", id)))
}

async fn delete_user(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
    body: Bytes,
) -> Result<Json<OutcomeResponse>, ApiError> {
    let req: DeleteUserRequest = parse_body(&body)?;
    if !password_accepted(req.password.as_deref().unwrap_or_default()) {
        return Err(ApiError::Forbidden);
    }
    let Path(id) = id?;

    state.runtime.delete_user(&id).await?;
    Ok(OutcomeResponse::ok(format!("User {} deleted", id)))
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}

/// HEAD is not part of the API, even on routes that answer GET.
async fn reject_head(request: Request, next: Next) -> Response {
    if request.method() == Method::HEAD {
        return ApiError::NotFound.into_response();
    }
    next.run(request).await
}

/// Every OPTIONS request is answered with 200 and an empty JSON object,
/// keeping whatever CORS headers the inner layers attached.
async fn answer_options(request: Request, next: Next) -> Response {
    if request.method() != Method::OPTIONS {
        return next.run(request).await;
    }

    let (mut parts, _) = next.run(request).await.into_parts();
    parts.status = StatusCode::OK;
    parts.headers.remove(header::CONTENT_LENGTH);
    parts
        .headers
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Response::from_parts(parts, Body::from("{}"))
}
