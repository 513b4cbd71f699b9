//! Webhook HTTP surface
//!
//! In webhook mode the platform POSTs updates to `/<token>`; they are fed
//! to the same handler tree the polling dispatcher uses.

pub mod routes;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::Me;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::handlers::dispatch::{create_handler, HandlerError};
use crate::services::AppContext;
use crate::utils::errors::Result;

/// State shared by every route
#[derive(Clone)]
pub struct WebState {
    pub bot: Bot,
    pub me: Me,
    pub ctx: Arc<AppContext>,
    pub handler: Arc<teloxide::dispatching::UpdateHandler<HandlerError>>,
}

impl WebState {
    pub fn new(bot: Bot, me: Me, ctx: Arc<AppContext>) -> Self {
        Self { bot, me, ctx, handler: Arc::new(create_handler()) }
    }
}

/// Full router with request tracing
pub fn app(state: WebState) -> axum::Router {
    routes::router(state).layer(TraceLayer::new_for_http())
}

/// Serve until `shutdown` resolves
pub async fn serve<F>(state: WebState, addr: SocketAddr, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Starting webhook server on {addr}");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Webhook server stopped");
    Ok(())
}
