use crate::error::AppError;
use futures_util::StreamExt;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;

const RECONNECT_DELAY: Duration = Duration::from_secs(3);

/// Background connection to a FireFly node's event websocket.
/// Dropping it stops the reader task.
pub struct EventStream {
    abort: tokio::task::AbortHandle,
}

impl Drop for EventStream {
    fn drop(&mut self) {
        self.abort.abort();
    }
}

enum StreamEnd {
    Disconnected,
    ReceiverGone,
}

/// Forward every text frame from `ws_url` into `events`, reconnecting until
/// the receiver is dropped or the returned handle is.
pub fn spawn_event_stream(
    ws_url: String,
    credentials: Option<(String, String)>,
    events: mpsc::Sender<String>,
) -> EventStream {
    let task = tokio::spawn(async move {
        loop {
            match read_events(&ws_url, credentials.as_ref(), &events).await {
                Ok(StreamEnd::ReceiverGone) => break,
                Ok(StreamEnd::Disconnected) => {
                    tracing::warn!("Event stream {ws_url} closed, reconnecting");
                }
                Err(e) => {
                    tracing::error!("Event stream {ws_url} failed: {e}");
                }
            }
            tokio::time::sleep(RECONNECT_DELAY).await;
        }
    });

    EventStream {
        abort: task.abort_handle(),
    }
}

async fn read_events(
    ws_url: &str,
    credentials: Option<&(String, String)>,
    events: &mpsc::Sender<String>,
) -> Result<StreamEnd, AppError> {
    let mut request = ws_url.into_client_request()?;
    if let Some((user, pass)) = credentials {
        let encoded = base64::Engine::encode(
            &base64::engine::general_purpose::STANDARD,
            format!("{user}:{pass}"),
        );
        let value = format!("Basic {encoded}")
            .parse()
            .map_err(|e| AppError::Internal(format!("Bad auth header: {e}")))?;
        request.headers_mut().insert("Authorization", value);
    }

    let (ws_stream, _response) = tokio_tungstenite::connect_async(request).await?;
    tracing::info!("Connected to event stream {ws_url}");
    let (_write, mut read) = ws_stream.split();

    while let Some(msg) = read.next().await {
        match msg? {
            tungstenite::Message::Text(text) => {
                if events.send(text).await.is_err() {
                    return Ok(StreamEnd::ReceiverGone);
                }
            }
            tungstenite::Message::Close(_) => break,
            _ => {} // Ping/Pong handled automatically
        }
    }

    Ok(StreamEnd::Disconnected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::ws::{Message, WebSocketUpgrade};
    use axum::http::HeaderMap;
    use axum::response::IntoResponse;
    use axum::routing::get;
    use axum::Router;
    use tokio::net::TcpListener;

    async fn spawn_ws_node() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().route(
            "/ws",
            get(|ws: WebSocketUpgrade, headers: HeaderMap| async move {
                let auth = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("none")
                    .to_string();
                ws.on_upgrade(move |mut socket| async move {
                    let _ = socket
                        .send(Message::Text(format!(r#"{{"type":"hello","auth":"{auth}"}}"#)))
                        .await;
                    let _ = socket
                        .send(Message::Text(r#"{"type":"token_pool_confirmed"}"#.into()))
                        .await;
                    let _ = socket.send(Message::Binary(vec![1, 2, 3])).await;
                    let _ = socket.send(Message::Close(None)).await;
                })
                .into_response()
            }),
        );
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        format!("ws://{addr}/ws?namespace=default&ephemeral&autoack")
    }

    #[tokio::test]
    async fn forwards_text_frames() {
        let url = spawn_ws_node().await;
        let (tx, mut rx) = mpsc::channel(8);
        let _stream = spawn_event_stream(url, None, tx);

        let first = rx.recv().await.unwrap();
        assert_eq!(first, r#"{"type":"hello","auth":"none"}"#);
        let second = rx.recv().await.unwrap();
        assert_eq!(second, r#"{"type":"token_pool_confirmed"}"#);
    }

    #[tokio::test]
    async fn sends_basic_auth() {
        let url = spawn_ws_node().await;
        let (tx, mut rx) = mpsc::channel(8);
        let _stream = spawn_event_stream(url, Some(("user".into(), "pass".into())), tx);

        let first = rx.recv().await.unwrap();
        // base64("user:pass")
        assert!(first.contains("Basic dXNlcjpwYXNz"), "{first}");
    }

    #[tokio::test]
    async fn dropping_handle_stops_task() {
        let url = spawn_ws_node().await;
        let (tx, mut rx) = mpsc::channel(8);
        let stream = spawn_event_stream(url, None, tx);
        rx.recv().await.unwrap();
        drop(stream);
        // sender is owned by the aborted task, so the channel drains and closes
        let mut remaining = 0;
        while rx.recv().await.is_some() {
            remaining += 1;
        }
        assert!(remaining <= 1);
    }
}
