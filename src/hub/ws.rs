//! WebSocket push transport and the dashboard routes.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
    routing::get,
};
use tower_http::services::ServeDir;
use tracing::{debug, info, warn};

use super::PushHub;

/// Application state shared across handlers.
#[derive(Clone)]
struct AppState {
    hub: Arc<PushHub>,
}

/// Build the Axum router: `/ws` push upgrades, `/health`, and the static
/// dashboard at the root.
pub fn push_routes(hub: Arc<PushHub>, dashboard_dir: &str) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health))
        .fallback_service(ServeDir::new(dashboard_dir))
        .with_state(AppState { hub })
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "mail-digest",
        "subscribers": state.hub.subscriber_count().await,
    }))
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    info!("WebSocket client connecting");
    ws.on_upgrade(|socket| handle_socket(socket, state.hub))
}

/// Forward mailbox updates to one socket until either side goes away.
///
/// A write failure removes only this subscriber; liveness is detected
/// lazily on the failed write rather than by heartbeat.
async fn handle_socket(mut socket: WebSocket, hub: Arc<PushHub>) {
    let mut sub = hub.subscribe().await;
    info!(subscriber = %sub.id, "WebSocket client connected");

    loop {
        tokio::select! {
            update = sub.recv() => {
                let Some(update) = update else {
                    debug!(subscriber = %sub.id, "Mailbox closed");
                    break;
                };
                let json = match serde_json::to_string(&update) {
                    Ok(json) => json,
                    Err(e) => {
                        warn!(error = %e, "Failed to encode update");
                        continue;
                    }
                };
                if socket.send(Message::Text(json.into())).await.is_err() {
                    debug!(subscriber = %sub.id, "Client disconnected during send");
                    break;
                }
            }

            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        info!(subscriber = %sub.id, "WebSocket client disconnected");
                        break;
                    }
                    Some(Err(e)) => {
                        warn!(subscriber = %sub.id, error = %e, "WebSocket error");
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    hub.unsubscribe(sub.id).await;
    info!(subscriber = %sub.id, "WebSocket connection closed");
}
