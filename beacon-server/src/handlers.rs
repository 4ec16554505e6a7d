//! HTTP and WebSocket handlers

use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{
        ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use futures::{SinkExt, StreamExt};

use serde_json::Value;

use beacon_core::{UpdateRequest, UpdateResponse};

use crate::gateway::{self, Challenge};
use crate::state::SharedState;

/// Dashboard page, embedded at build time
pub const DASHBOARD_HTML: &str = include_str!("../assets/dashboard.html");

/// How long a closing channel may take to finish its close handshake
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Dashboard entry point
///
/// A valid session cookie is enough. Otherwise basic-auth credentials are
/// required, and on success the session cookie is set for later visits
/// and for the live channel.
pub async fn dashboard_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<Response, Challenge> {
    let s = state.read().await;

    if gateway::session_token(&headers).is_some_and(|token| s.auth.verify(token)) {
        return Ok(Html(DASHBOARD_HTML).into_response());
    }

    let (username, password) = gateway::basic_credentials(&headers).ok_or(Challenge)?;
    if let Err(e) = s.auth.challenge(&username, &password) {
        tracing::warn!("Dashboard login failed for {}", username);
        return Err(e.into());
    }

    tracing::info!("Dashboard login for {}", username);
    Ok((
        [(header::SET_COOKIE, gateway::session_cookie(s.auth.token()))],
        Html(DASHBOARD_HTML),
    )
        .into_response())
}

/// Device update endpoint
///
/// Any JSON body is answered with 200 and an ingest result, whatever its
/// content type or envelope shape. Only bytes that are not JSON get a 400.
pub async fn update_handler(
    State(state): State<SharedState>,
    body: Bytes,
) -> Result<Json<UpdateResponse>, (StatusCode, String)> {
    let value: Value = serde_json::from_slice(&body).map_err(|e| {
        tracing::debug!("Rejected update body: {}", e);
        (StatusCode::BAD_REQUEST, format!("Invalid JSON body: {}", e))
    })?;
    let req = UpdateRequest::from_value(value);

    let mut s = state.write().await;
    Ok(Json(s.ingest(req.data)))
}

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    headers: HeaderMap,
    State(state): State<SharedState>,
) -> impl IntoResponse {
    let authorized = {
        let s = state.read().await;
        gateway::session_token(&headers).is_some_and(|token| s.auth.verify(token))
    };

    ws.on_upgrade(move |socket| async move {
        if authorized {
            handle_live_channel(socket, state).await;
        } else {
            reject_live_channel(socket).await;
        }
    })
}

/// Close an unauthenticated channel before anything is sent on it
async fn reject_live_channel(mut socket: WebSocket) {
    tracing::warn!("Live channel refused: invalid session token");
    let _ = socket
        .send(Message::Close(Some(CloseFrame {
            code: close_code::POLICY,
            reason: "Invalid session token".into(),
        })))
        .await;
}

/// Handle an authenticated live channel until the remote end closes it
async fn handle_live_channel(socket: WebSocket, state: SharedState) {
    let (mut sender, mut receiver) = socket.split();

    // Registration and the initial snapshot happen under one lock
    let (channel_id, mut outbound) = state.write().await.subscribe();
    tracing::info!("Live channel {} opened", channel_id);

    let mut forward_handle = tokio::spawn(async move {
        while let Some(text) = outbound.recv().await {
            if sender.send(Message::Text(text.into())).await.is_err() {
                return;
            }
        }
        // Queue closed: flush the close reply to the peer
        let _ = sender.close().await;
    });

    // Inbound frames carry nothing for us
    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Close(_)) | Err(_) => break,
            Ok(_) => {}
        }
    }

    // Dropping the registration closes the queue and ends the forward task
    state.write().await.unsubscribe(&channel_id);
    if tokio::time::timeout(CLOSE_TIMEOUT, &mut forward_handle).await.is_err() {
        forward_handle.abort();
    }
    tracing::info!("Live channel {} closed", channel_id);
}
