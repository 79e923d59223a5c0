//! # WebSocket endpoints
//!
//! `/ws` joins the broadcast group, `/pair` the paired group. Each upgraded
//! socket is split: the write half becomes a [`FrameSink`] shared with the
//! broadcast worker, the read half a [`FrameStream`] owned by the
//! connection's ingestion loop.

use async_trait::async_trait;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use wb_core::{ConnectionMode, FrameSink, FrameStream, TransportError};
use wb_hub::Hub;

use crate::AppState;

pub async fn threads_ws(
    ws: WebSocketUpgrade,
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Response {
    upgrade(ws, &headers, state, ConnectionMode::Broadcast)
}

pub async fn pair_ws(
    ws: WebSocketUpgrade,
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Response {
    upgrade(ws, &headers, state, ConnectionMode::Paired)
}

fn upgrade(ws: WebSocketUpgrade, headers: &HeaderMap, state: AppState, mode: ConnectionMode) -> Response {
    if let Some(origin) = headers.get(header::ORIGIN) {
        let allowed = origin
            .to_str()
            .map(|origin| state.origin_allowed(origin))
            .unwrap_or(false);
        if !allowed {
            warn!(?origin, %mode, "refused websocket connection");
            return StatusCode::FORBIDDEN.into_response();
        }
    }

    ws.on_upgrade(move |socket| attach(socket, state.hub, mode))
}

async fn attach(socket: WebSocket, hub: Hub, mode: ConnectionMode) {
    let (sink, stream) = socket.split();
    let sink = Arc::new(WsSink {
        inner: Mutex::new(sink),
    });
    let stream = Box::new(WsStream { inner: stream });

    if let Err(e) = hub.register_connection(sink, stream, mode).await {
        warn!(%mode, error = %e, "websocket not registered");
    }
}

/// Write half of an upgraded socket.
pub struct WsSink {
    inner: Mutex<SplitSink<WebSocket, Message>>,
}

#[async_trait]
impl FrameSink for WsSink {
    async fn send_frame(&self, frame: Bytes) -> Result<(), TransportError> {
        // Text frames for anything that is valid UTF-8, which covers JSON.
        let message = match String::from_utf8(frame.to_vec()) {
            Ok(text) => Message::Text(text.into()),
            Err(_) => Message::Binary(frame),
        };
        self.inner
            .lock()
            .await
            .send(message)
            .await
            .map_err(|e| TransportError::Io(e.to_string()))
    }

    async fn close(&self) {
        if let Err(e) = self.inner.lock().await.send(Message::Close(None)).await {
            debug!(error = %e, "close frame not sent");
        }
    }
}

/// Read half of an upgraded socket.
pub struct WsStream {
    inner: SplitStream<WebSocket>,
}

#[async_trait]
impl FrameStream for WsStream {
    async fn next_frame(&mut self) -> Result<Bytes, TransportError> {
        loop {
            match self.inner.next().await {
                Some(Ok(Message::Text(text))) => {
                    return Ok(Bytes::copy_from_slice(text.as_str().as_bytes()))
                }
                Some(Ok(Message::Binary(data))) => return Ok(data),
                Some(Ok(Message::Close(_))) | None => return Err(TransportError::Closed),
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(TransportError::Io(e.to_string())),
            }
        }
    }
}
