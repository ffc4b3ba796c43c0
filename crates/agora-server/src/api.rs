use std::sync::Arc;

use agora_shared::session::{Credentials, SessionSigner, SignInResponse};
use agora_shared::Session;
use agora_store::{Document, DocumentStore, FieldOp, LocalStore, StoreError, WriteBatch};
use axum::{
    extract::{DefaultBodyLimit, Path, State},
    http::{Method, StatusCode},
    middleware,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::Duration;
use serde::Serialize;
use serde_json::Value;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::rate_limit::{rate_limit_middleware, RateLimiter};
use crate::sessions::{require_session, SessionVerifier};

#[derive(Clone)]
pub struct AppState {
    pub store: LocalStore,
    pub signer: Arc<SessionSigner>,
    pub verifier: SessionVerifier,
    pub rate_limiter: RateLimiter,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(store: LocalStore, signer: SessionSigner, config: ServerConfig) -> Self {
        Self {
            verifier: SessionVerifier::new(signer.public_key_bytes()),
            rate_limiter: RateLimiter::from_config(&config),
            signer: Arc::new(signer),
            store,
            config: Arc::new(config),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    let documents = Router::new()
        .route("/v1/batch", post(commit_batch))
        .route("/v1/:collection", get(list_documents).post(create_document))
        .route(
            "/v1/:collection/:id",
            get(get_document).patch(update_document).put(set_document),
        )
        .route("/v1/:collection/:id/ops", post(apply_op))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_session));

    Router::new()
        .route("/health", get(health_check))
        .route("/info", get(server_info))
        .route("/auth/sign-in", post(sign_in))
        .merge(documents)
        .layer(DefaultBodyLimit::max(state.config.max_body_bytes))
        .layer(middleware::from_fn_with_state(
            state.rate_limiter.clone(),
            rate_limit_middleware,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ServerInfoResponse {
    name: String,
    version: &'static str,
    max_body_bytes: usize,
    max_image_bytes: usize,
    session_ttl_hours: i64,
}

#[derive(Serialize)]
struct CreatedResponse {
    id: String,
}

#[derive(Serialize)]
struct CommittedResponse {
    ids: Vec<String>,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn server_info(State(state): State<AppState>) -> Json<ServerInfoResponse> {
    Json(ServerInfoResponse {
        name: state.config.instance_name.clone(),
        version: env!("CARGO_PKG_VERSION"),
        max_body_bytes: state.config.max_body_bytes,
        max_image_bytes: agora_shared::constants::MAX_IMAGE_SIZE,
        session_ttl_hours: state.config.session_ttl_hours,
    })
}

async fn sign_in(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<Json<SignInResponse>, ServerError> {
    let session = credentials.into_session()?;
    let token = state
        .signer
        .issue(session, Duration::hours(state.config.session_ttl_hours))?;

    info!(user = %token.session.id, until = %token.expires_at, "Session issued");
    Ok(Json(SignInResponse::from_token(&token)?))
}

async fn list_documents(
    State(state): State<AppState>,
    Path(collection): Path<String>,
) -> Result<Json<Vec<Document>>, ServerError> {
    Ok(Json(state.store.get_all(&collection).await?))
}

async fn get_document(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
) -> Result<Json<Document>, ServerError> {
    state
        .store
        .get(&collection, &id)
        .await?
        .map(Json)
        .ok_or_else(|| StoreError::not_found(&collection, &id).into())
}

async fn create_document(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Extension(session): Extension<Session>,
    Json(data): Json<Value>,
) -> Result<(StatusCode, Json<CreatedResponse>), ServerError> {
    let id = state.store.create(&collection, data).await?;
    info!(user = %session.id, %collection, %id, "Document created");
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

async fn update_document(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
    Extension(session): Extension<Session>,
    Json(fields): Json<Value>,
) -> Result<StatusCode, ServerError> {
    state.store.update(&collection, &id, fields).await?;
    info!(user = %session.id, %collection, %id, "Document updated");
    Ok(StatusCode::NO_CONTENT)
}

async fn set_document(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
    Extension(session): Extension<Session>,
    Json(data): Json<Value>,
) -> Result<StatusCode, ServerError> {
    state.store.set(&collection, &id, data).await?;
    info!(user = %session.id, %collection, %id, "Document set");
    Ok(StatusCode::NO_CONTENT)
}

async fn apply_op(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
    Extension(session): Extension<Session>,
    Json(op): Json<FieldOp>,
) -> Result<StatusCode, ServerError> {
    let field = op.field().to_string();
    state.store.apply(&collection, &id, op).await?;
    info!(user = %session.id, %collection, %id, %field, "Field operation applied");
    Ok(StatusCode::NO_CONTENT)
}

async fn commit_batch(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(batch): Json<WriteBatch>,
) -> Result<Json<CommittedResponse>, ServerError> {
    if batch.is_empty() {
        return Err(ServerError::BadRequest("Batch has no writes".into()));
    }
    let ids = state.store.commit(batch).await?;
    info!(user = %session.id, writes = ids.len(), "Batch committed");
    Ok(Json(CommittedResponse { ids }))
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await?;

    Ok(())
}
