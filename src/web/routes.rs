//! Webhook routes

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use teloxide::prelude::*;
use teloxide::types::Update;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::config::{webhook_url_for, PortSource};
use crate::scheduler::TIMEZONE_NAME;

use super::WebState;

pub fn router(state: WebState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/setwebhook", get(set_webhook))
        .route("/removewebhook", get(remove_webhook))
        .route("/webhookinfo", get(webhook_info))
        .route("/{token}", post(receive_update))
        .with_state(state)
}

async fn index() -> &'static str {
    "Adhkar bot is running"
}

/// Accept one update envelope from the platform
async fn receive_update(
    State(state): State<WebState>,
    Path(token): Path<String>,
    body: String,
) -> StatusCode {
    if token != state.ctx.settings.bot.token {
        warn!("Webhook called with a wrong token");
        return StatusCode::FORBIDDEN;
    }

    let update: Update = match serde_json::from_str(&body) {
        Ok(update) => update,
        Err(e) => {
            // The platform retries non-2xx answers, so malformed bodies are acknowledged
            warn!(error = %e, "Could not parse update");
            return StatusCode::OK;
        }
    };
    debug!("Webhook update received");

    let deps = dptree::deps![update, state.bot.clone(), state.me.clone(), state.ctx.clone()];
    let handler = state.handler.clone();
    tokio::spawn(async move {
        if let std::ops::ControlFlow::Break(Err(e)) = handler.dispatch(deps).await {
            error!(error = %e, "Webhook update handling failed");
        }
    });

    StatusCode::OK
}

/// Point the platform at `<base>/<token>`; `url` defaults to the configured base
async fn set_webhook(
    State(state): State<WebState>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let settings = &state.ctx.settings;
    let Some(base) = params
        .get("url")
        .filter(|url| !url.trim().is_empty())
        .or(settings.bot.webhook_url.as_ref())
    else {
        return (StatusCode::BAD_REQUEST, "No webhook base URL given or configured".to_string());
    };

    let target = webhook_url_for(base, &settings.bot.token);
    let url = match Url::parse(&target) {
        Ok(url) => url,
        Err(e) => return (StatusCode::BAD_REQUEST, format!("Invalid webhook URL: {}", e)),
    };

    match state.bot.set_webhook(url).await {
        Ok(_) => {
            info!("Webhook set");
            (StatusCode::OK, "Webhook set".to_string())
        }
        Err(e) => {
            error!(error = %e, "Setting webhook failed");
            (StatusCode::BAD_GATEWAY, format!("Setting webhook failed: {}", e))
        }
    }
}

async fn remove_webhook(State(state): State<WebState>) -> impl IntoResponse {
    match state.bot.delete_webhook().await {
        Ok(_) => {
            info!("Webhook removed");
            (StatusCode::OK, "Webhook removed".to_string())
        }
        Err(e) => {
            error!(error = %e, "Removing webhook failed");
            (StatusCode::BAD_GATEWAY, format!("Removing webhook failed: {}", e))
        }
    }
}

#[derive(Serialize)]
struct WebhookInfoResponse {
    url: Option<String>,
    pending_update_count: u32,
    last_error: Option<String>,
}

async fn webhook_info(State(state): State<WebState>) -> Result<Json<WebhookInfoResponse>, (StatusCode, String)> {
    let info = state
        .bot
        .get_webhook_info()
        .await
        .map_err(|e| (StatusCode::BAD_GATEWAY, format!("Fetching webhook info failed: {}", e)))?;

    Ok(Json(WebhookInfoResponse {
        url: info.url.map(|url| url.to_string()),
        pending_update_count: info.pending_update_count,
        last_error: info.last_error_message,
    }))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    bot: String,
    port: u16,
    port_source: PortSource,
    /// URL the platform currently delivers to
    webhook_url: Option<String>,
    configured_webhook_url: Option<String>,
    expected_webhook_url: Option<String>,
    pending_update_count: Option<u32>,
    last_error: Option<String>,
    timezone: &'static str,
    scheduler_running: bool,
    jobs: usize,
    groups: Option<i64>,
    enabled_groups: Option<i64>,
}

async fn health(State(state): State<WebState>) -> Json<HealthResponse> {
    let ctx = &state.ctx;
    let settings = &ctx.settings;

    let (webhook_url, pending_update_count, last_error) = match state.bot.get_webhook_info().await {
        Ok(info) => (
            info.url.map(|url| url.to_string()),
            Some(info.pending_update_count),
            info.last_error_message,
        ),
        Err(e) => (None, None, Some(e.to_string())),
    };
    let store_ok = ctx.store.health_check().await.is_ok();

    Json(HealthResponse {
        status: if store_ok { "ok" } else { "degraded" },
        bot: format!("@{}", ctx.bot_username),
        port: settings.port(),
        port_source: settings.server.port_source,
        webhook_url,
        configured_webhook_url: settings.bot.webhook_url.clone(),
        expected_webhook_url: settings.expected_webhook_url(),
        pending_update_count,
        last_error,
        timezone: TIMEZONE_NAME,
        scheduler_running: ctx.scheduler.is_running(),
        jobs: ctx.scheduler.job_count(),
        groups: ctx.store.count_groups().await.ok(),
        enabled_groups: ctx.store.count_enabled_groups().await.ok(),
    })
}
