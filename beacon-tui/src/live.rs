//! Live channel client
//!
//! Logs in on `/` to obtain the session cookie, opens `/ws` with it and
//! forwards every snapshot to the UI. There is no reconnect: once the
//! channel ends the UI shows it as disconnected.

use anyhow::{anyhow, bail};
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{header, HeaderValue};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::Message;

use beacon_core::config::ClientConfig;
use beacon_core::{RelayClient, Snapshot, SESSION_COOKIE};

/// Events from the live channel task to the UI
#[derive(Debug)]
pub enum LiveEvent {
    Connected,
    Snapshot(Snapshot),
    Disconnected(String),
}

/// Run the live channel until it ends, reporting to `events`
pub async fn run(config: ClientConfig, events: mpsc::UnboundedSender<LiveEvent>) {
    if let Err(e) = stream_snapshots(&config, &events).await {
        tracing::warn!("Live channel ended: {}", e);
        let _ = events.send(LiveEvent::Disconnected(e.to_string()));
    }
}

async fn stream_snapshots(
    config: &ClientConfig,
    events: &mpsc::UnboundedSender<LiveEvent>,
) -> anyhow::Result<()> {
    let client = RelayClient::new(&config.server_url);
    let token = client.login(&config.username, &config.password).await?;

    let mut request = client.live_url().into_client_request()?;
    request.headers_mut().insert(
        header::COOKIE,
        HeaderValue::from_str(&format!("{}={}", SESSION_COOKIE, token))?,
    );

    let (mut ws, _) = connect_async(request).await?;
    tracing::info!("Live channel open: {}", client.live_url());
    let _ = events.send(LiveEvent::Connected);

    while let Some(msg) = ws.next().await {
        match msg? {
            Message::Text(text) => match serde_json::from_str::<Snapshot>(text.as_str()) {
                Ok(snapshot) => {
                    tracing::debug!("Snapshot with {} device(s)", snapshot.len());
                    if events.send(LiveEvent::Snapshot(snapshot)).is_err() {
                        // UI is gone
                        return Ok(());
                    }
                }
                Err(e) => tracing::warn!("Ignoring malformed snapshot: {}", e),
            },
            Message::Close(Some(frame)) if frame.code == CloseCode::Policy => {
                return Err(anyhow!("session rejected by server"));
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    bail!("connection closed")
}
