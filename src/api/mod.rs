//! Local HTTP bridge between the browser extension shim and the engine.
//!
//! The shim forwards browser events here and polls `/api/commands` for the
//! tab and badge updates the engine wants carried out.

mod error;

pub use self::error::ApiError;

use crate::config::Config;
use crate::counters::{badge_text, total};
use crate::engine::{CommandQueue, NavigationEngine, NavigationEvent, TabId};
use crate::interstitial::pick_prompt;
use crate::logger::memory_sink::recent;
use crate::logger::LogBuffer;
use crate::messages::MessageEnvelope;
use crate::settings::SettingsService;
use anyhow::{Context, Result};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

pub struct ApiState {
    pub engine: Arc<NavigationEngine>,
    pub settings: Arc<SettingsService>,
    pub commands: CommandQueue,
    pub logs: Option<LogBuffer>,
    pub config: Config,
}

pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/api/navigation", post(handle_navigation))
        .route("/api/messages", post(handle_message))
        .route("/api/tabs/{id}", get(get_tab).delete(close_tab))
        .route("/api/lifecycle/{event}", post(lifecycle))
        .route("/api/commands", get(drain_commands))
        .route("/api/counters", get(get_counters))
        .route("/api/badge", get(get_badge))
        .route("/api/domains", get(list_domains).post(add_domain))
        .route("/api/domains/{domain}", delete(remove_domain))
        .route(
            "/api/prompts",
            get(list_prompts).post(add_prompt).delete(remove_prompt),
        )
        .route("/api/prompts/random", get(random_prompt))
        .route("/api/logs", get(get_logs))
        .route("/api/config", get(get_config))
        .with_state(state)
}

pub async fn start_api_server(state: Arc<ApiState>, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind API server to {}", addr))?;
    info!("API Server listening on http://{}", addr);

    axum::serve(listener, router(state))
        .await
        .context("API server stopped")
}

async fn handle_navigation(
    State(state): State<Arc<ApiState>>,
    Json(event): Json<NavigationEvent>,
) -> impl IntoResponse {
    let disposition = state.engine.handle_navigation(event).await;
    Json(serde_json::json!({ "disposition": disposition }))
}

async fn handle_message(
    State(state): State<Arc<ApiState>>,
    Json(envelope): Json<MessageEnvelope>,
) -> impl IntoResponse {
    state
        .engine
        .handle_message(envelope.tab_id, envelope.message)
        .await;
    Json(serde_json::json!({ "status": "ok" }))
}

async fn get_tab(State(state): State<Arc<ApiState>>, Path(id): Path<TabId>) -> impl IntoResponse {
    Json(state.engine.session(id))
}

async fn close_tab(State(state): State<Arc<ApiState>>, Path(id): Path<TabId>) -> impl IntoResponse {
    state.engine.handle_tab_removed(id);
    StatusCode::NO_CONTENT
}

async fn lifecycle(
    State(state): State<Arc<ApiState>>,
    Path(event): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    match event.as_str() {
        "startup" => state.engine.on_startup().await,
        "installed" => state.engine.on_installed().await,
        other => return Err(ApiError::not_found(format!("Unknown lifecycle event '{}'", other))),
    }
    Ok(Json(serde_json::json!({ "status": "ok", "event": event })))
}

async fn drain_commands(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    Json(state.commands.drain())
}

async fn get_counters(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let counters = state.engine.counters().get_all().await?;
    Ok(Json(serde_json::json!({
        "total": total(&counters),
        "counters": counters,
    })))
}

async fn get_badge(State(state): State<Arc<ApiState>>) -> Result<Json<serde_json::Value>, ApiError> {
    let total = state.engine.counters().get_total().await?;
    Ok(Json(serde_json::json!({
        "text": badge_text(total),
        "total": total,
    })))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DomainView {
    domain: String,
    visits_today: u64,
}

async fn list_domains(State(state): State<Arc<ApiState>>) -> Result<Json<Vec<DomainView>>, ApiError> {
    let domains = state.settings.blocked_domains().await?;
    let counters = state.engine.counters().get_all().await?;
    let views = domains
        .into_iter()
        .map(|domain| DomainView {
            visits_today: counters.get(&domain).map(|c| c.count).unwrap_or(0),
            domain,
        })
        .collect();
    Ok(Json(views))
}

#[derive(Deserialize)]
struct DomainRequest {
    domain: String,
}

async fn add_domain(
    State(state): State<Arc<ApiState>>,
    Json(payload): Json<DomainRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let domain = state.settings.add_domain(&payload.domain).await?;
    state.engine.update_badge().await;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "domain": domain })),
    ))
}

async fn remove_domain(
    State(state): State<Arc<ApiState>>,
    Path(domain): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.settings.remove_domain(&domain).await?;
    state.engine.update_badge().await;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_prompts(State(state): State<Arc<ApiState>>) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(state.settings.prompts().await?))
}

#[derive(Deserialize)]
struct PromptRequest {
    prompt: String,
}

async fn add_prompt(
    State(state): State<Arc<ApiState>>,
    Json(payload): Json<PromptRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let prompt = state.settings.add_prompt(&payload.prompt).await?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "prompt": prompt })),
    ))
}

async fn remove_prompt(
    State(state): State<Arc<ApiState>>,
    Json(payload): Json<PromptRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state.settings.remove_prompt(&payload.prompt).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn random_prompt(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let prompts = state.settings.prompts().await?;
    let prompt = pick_prompt(&prompts, &mut rand::thread_rng()).to_string();
    Ok(Json(serde_json::json!({ "prompt": prompt })))
}

#[derive(Deserialize)]
struct LogsQuery {
    limit: Option<usize>,
}

async fn get_logs(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<LogsQuery>,
) -> impl IntoResponse {
    let limit = query.limit.unwrap_or(100);
    let logs = state
        .logs
        .as_ref()
        .map(|buffer| recent(buffer, limit))
        .unwrap_or_default();
    Json(logs)
}

async fn get_config(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    Json(state.config.clone())
}
