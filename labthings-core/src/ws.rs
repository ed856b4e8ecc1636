//! Ergonomic wrapper around Axum's `WebSocket`, in the style of the
//! teacher's `r2e_core::ws::WsStream`. The affordance observation protocol
//! (spec section 4.4 / 6) is built on top of this in `labthings-runtime`.

use axum::extract::ws::{Message, WebSocket};
use serde::{de::DeserializeOwned, Serialize};

#[derive(Debug)]
pub enum WsError {
    Send(axum::Error),
    Recv(axum::Error),
    Json(serde_json::Error),
    Closed,
}

impl std::fmt::Display for WsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WsError::Send(e) => write!(f, "ws send: {e}"),
            WsError::Recv(e) => write!(f, "ws recv: {e}"),
            WsError::Json(e) => write!(f, "ws json: {e}"),
            WsError::Closed => write!(f, "ws closed"),
        }
    }
}

impl std::error::Error for WsError {}

/// A typed wrapper around Axum's raw `WebSocket`.
pub struct WsStream {
    inner: WebSocket,
}

impl WsStream {
    pub fn new(socket: WebSocket) -> Self {
        Self { inner: socket }
    }

    pub async fn send(&mut self, msg: Message) -> Result<(), WsError> {
        self.inner.send(msg).await.map_err(WsError::Send)
    }

    pub async fn send_text(&mut self, text: impl Into<String>) -> Result<(), WsError> {
        self.send(Message::Text(text.into().into())).await
    }

    pub async fn send_json<T: Serialize>(&mut self, data: &T) -> Result<(), WsError> {
        let json = serde_json::to_string(data).map_err(WsError::Json)?;
        self.send_text(json).await
    }

    /// Receive the next message, or `None` once the connection is closed.
    pub async fn next(&mut self) -> Option<Result<Message, WsError>> {
        use futures_core::Stream;
        use std::pin::Pin;
        use std::task::Poll;

        std::future::poll_fn(|cx| match Pin::new(&mut self.inner).poll_next(cx) {
            Poll::Ready(Some(Ok(msg))) => Poll::Ready(Some(Ok(msg))),
            Poll::Ready(Some(Err(e))) => Poll::Ready(Some(Err(WsError::Recv(e)))),
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        })
        .await
    }

    pub async fn next_text(&mut self) -> Option<Result<String, WsError>> {
        loop {
            match self.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text.to_string())),
                Ok(Message::Close(_)) => return None,
                Err(e) => return Some(Err(e)),
                _ => continue,
            }
        }
    }

    pub async fn next_json<T: DeserializeOwned>(&mut self) -> Option<Result<T, WsError>> {
        let text = match self.next_text().await? {
            Ok(t) => t,
            Err(e) => return Some(Err(e)),
        };
        Some(serde_json::from_str(&text).map_err(WsError::Json))
    }

    pub fn into_inner(self) -> WebSocket {
        self.inner
    }
}
