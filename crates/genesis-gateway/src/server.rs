//! Gateway HTTP server, Axum-based

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use genesis_core::{AgentResult, Dispatcher};
use tower_http::cors::CorsLayer;
use tracing::{Instrument, info, info_span};

use crate::protocol::ChatRequest;

/// Shared state for all requests
#[derive(Clone)]
pub struct GatewayState {
    pub dispatcher: Arc<Dispatcher>,
}

/// The gateway server
pub struct GatewayServer {
    state: GatewayState,
    bind: SocketAddr,
}

impl GatewayServer {
    pub fn new(bind: SocketAddr, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            state: GatewayState { dispatcher },
            bind,
        }
    }

    /// Build the Axum router
    pub fn router(&self) -> Router {
        Router::new()
            .route("/chat", post(chat_handler))
            .layer(CorsLayer::permissive())
            .with_state(self.state.clone())
    }

    /// Start the server and stop accepting connections once `shutdown` resolves
    pub async fn run_until<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let router = self.router();
        let listener = tokio::net::TcpListener::bind(self.bind).await?;
        info!("Gateway listening on {}", self.bind);

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Gateway stopped");
        Ok(())
    }
}

// ── HTTP Handlers ──

async fn chat_handler(
    State(state): State<GatewayState>,
    Json(request): Json<ChatRequest>,
) -> Json<AgentResult> {
    let request_id = uuid::Uuid::new_v4();
    let span = info_span!("chat", %request_id, agent = %request.agent_type);

    async move {
        info!(
            "Chat request: {} chars, profile={}",
            request.message.chars().count(),
            request.user_profile.is_some()
        );
        let result = state
            .dispatcher
            .generate_response(
                &request.agent_type,
                &request.message,
                request.user_profile.as_ref(),
            )
            .await;
        Json(result)
    }
    .instrument(span)
    .await
}
