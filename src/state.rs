use crate::config::AppConfig;
use crate::error::AppError;
use crate::firefly_api::FireflyClient;
use crate::firefly_ws::{spawn_event_stream, EventStream};
use crate::pools::{
    run_event_listener, ClientSlot, LocationQuery, PoolsController, SnapshotSink, TokenPoolsView,
    ViewSnapshot,
};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Location the view is mounted at before the frontend reports its own.
pub const DEFAULT_LOCATION: &str = "tauri://localhost/tokens/tokenPools";

const EVENT_BUFFER: usize = 64;

/// Event stream subscription for one namespace
struct Subscription {
    namespace: String,
    _stream: EventStream,
}

/// Shared application state, generic over where snapshots are published
pub struct AppState<P: SnapshotSink> {
    config: Mutex<AppConfig>,
    pub pools: Arc<PoolsController<ClientSlot, P>>,
    subscription: Mutex<Option<Subscription>>,
}

impl<P: SnapshotSink> AppState<P> {
    pub fn new(config: AppConfig, sink: P) -> Result<Self, AppError> {
        let client = FireflyClient::from_config(&config);
        let view = TokenPoolsView::mount(
            config.namespace.clone(),
            LocationQuery::parse(DEFAULT_LOCATION)?,
        );
        Ok(Self {
            config: Mutex::new(config),
            pools: Arc::new(PoolsController::new(
                view,
                ClientSlot::new(Some(client)),
                sink,
            )),
            subscription: Mutex::new(None),
        })
    }

    pub fn config(&self) -> Result<AppConfig, AppError> {
        self.config
            .lock()
            .map(|c| c.clone())
            .map_err(|_| AppError::Internal("config lock poisoned".into()))
    }

    pub fn client(&self) -> Result<Arc<FireflyClient>, AppError> {
        self.pools.source().get()
    }

    /// Mount the pool list for `namespace` at `location` and make sure the
    /// event stream follows that namespace. Must run inside a Tokio runtime.
    pub async fn open_pools(
        &self,
        namespace: String,
        location: &str,
    ) -> Result<ViewSnapshot, AppError> {
        self.subscribe(&namespace, false)?;
        self.pools.open(namespace, location).await
    }

    /// Swap the live client, restart the event stream and refetch.
    pub async fn configure(&self, config: AppConfig) -> Result<ViewSnapshot, AppError> {
        tracing::info!("Configuring FireFly connection to {}", config.base_url);
        self.pools.source().set(FireflyClient::from_config(&config))?;
        let namespace = config.namespace.clone();
        *self
            .config
            .lock()
            .map_err(|_| AppError::Internal("config lock poisoned".into()))? = config;
        self.subscribe(&namespace, true)?;
        Ok(self.pools.reload(namespace).await)
    }

    fn subscribe(&self, namespace: &str, force: bool) -> Result<(), AppError> {
        let mut subscription = self
            .subscription
            .lock()
            .map_err(|_| AppError::Internal("subscription lock poisoned".into()))?;
        if !force
            && subscription
                .as_ref()
                .is_some_and(|s| s.namespace == namespace)
        {
            return Ok(());
        }
        // drop the old stream before opening a new one
        subscription.take();

        let client = self.client()?;
        let credentials = client
            .credentials()
            .map(|(u, p)| (u.to_string(), p.to_string()));
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let stream = spawn_event_stream(client.ws_events_url(namespace), credentials, tx);
        tokio::spawn(run_event_listener(self.pools.clone(), rx));

        *subscription = Some(Subscription {
            namespace: namespace.to_string(),
            _stream: stream,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::ws::{Message, WebSocketUpgrade};
    use axum::extract::{Path, RawQuery};
    use axum::response::IntoResponse;
    use axum::routing::get;
    use axum::{Json, Router};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::net::TcpListener;
    use tokio::sync::Notify;

    #[derive(Default)]
    struct CountingSink {
        published: AtomicUsize,
    }

    impl SnapshotSink for Arc<CountingSink> {
        fn publish(&self, _snapshot: &ViewSnapshot) {
            self.published.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct Node {
        url: String,
        fetches: Arc<Mutex<Vec<String>>>,
        fetched: Arc<Notify>,
    }

    /// Serves 12 pools and pushes one `token_pool_confirmed` per websocket connection.
    async fn spawn_node() -> Node {
        std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let fetches = Arc::new(Mutex::new(Vec::new()));
        let fetched = Arc::new(Notify::new());
        let (log, notify) = (fetches.clone(), fetched.clone());
        let app = Router::new()
            .route(
                "/api/v1/namespaces/:ns/tokens/pools",
                get(move |Path(ns): Path<String>, RawQuery(q): RawQuery| {
                    let (log, notify) = (log.clone(), notify.clone());
                    async move {
                        log.lock()
                            .unwrap()
                            .push(format!("{ns}?{}", q.unwrap_or_default()));
                        notify.notify_one();
                        let items: Vec<_> = (0..10)
                            .map(|i| {
                                serde_json::json!({
                                    "id": format!("{ns}-{i}"),
                                    "name": format!("pool{i}"),
                                    "type": "fungible",
                                    "standard": "ERC1155",
                                    "protocolId": "F1",
                                    "created": "2022-01-01T00:00:00Z"
                                })
                            })
                            .collect();
                        Json(serde_json::json!({ "total": 12, "items": items }))
                    }
                }),
            )
            .route(
                "/ws",
                get(|ws: WebSocketUpgrade| async move {
                    ws.on_upgrade(|mut socket| async move {
                        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
                        let _ = socket
                            .send(Message::Text(r#"{"type":"token_pool_confirmed"}"#.into()))
                            .await;
                        // keep the connection open
                        while let Some(Ok(_)) = socket.recv().await {}
                    })
                    .into_response()
                }),
            );
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Node {
            url: format!("http://{addr}"),
            fetches,
            fetched,
        }
    }

    fn config(url: &str) -> AppConfig {
        AppConfig {
            base_url: url.to_string(),
            namespace: "default".into(),
            username: None,
            password: None,
        }
    }

    #[tokio::test]
    async fn open_fetches_and_event_triggers_refetch() {
        let node = spawn_node().await;
        let sink = Arc::new(CountingSink::default());
        let state = AppState::new(config(&node.url), sink.clone()).unwrap();

        let snap = state
            .open_pools("default".into(), "tauri://localhost/pools?filters=name%3Dpool1")
            .await
            .unwrap();
        assert_eq!(snap.total, 12);
        assert_eq!(snap.rows.len(), 10);
        assert_eq!(snap.rows[0].key, "default-0");

        // the pushed confirmation refetches with the same parameters
        tokio::time::timeout(std::time::Duration::from_secs(5), async {
            while node.fetches.lock().unwrap().len() < 2 {
                node.fetched.notified().await;
            }
        })
        .await
        .unwrap();

        let fetches = node.fetches.lock().unwrap().clone();
        assert_eq!(fetches[0], "default?limit=10&skip=0&name=pool1&count");
        assert_eq!(fetches[0], fetches[1]);
        assert!(sink.published.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn configure_switches_namespace() {
        let node = spawn_node().await;
        let state = AppState::new(config(&node.url), Arc::new(CountingSink::default())).unwrap();

        let mut next = config(&node.url);
        next.namespace = "ns2".into();
        let snap = state.configure(next.clone()).await.unwrap();
        assert_eq!(snap.namespace, "ns2");
        assert_eq!(snap.rows[0].key, "ns2-0");
        assert_eq!(state.config().unwrap(), next);
        assert_eq!(state.client().unwrap().base_url(), node.url);
    }

    #[tokio::test]
    async fn configure_same_namespace_queries_new_node() {
        let old = spawn_node().await;
        let new = spawn_node().await;
        let state = AppState::new(config(&old.url), Arc::new(CountingSink::default())).unwrap();
        state
            .open_pools("default".into(), "tauri://localhost/pools")
            .await
            .unwrap();
        assert!(!old.fetches.lock().unwrap().is_empty());

        let snap = state.configure(config(&new.url)).await.unwrap();
        assert_eq!(snap.namespace, "default");
        assert_eq!(snap.total, 12);
        assert!(!snap.loading);

        let fetches = new.fetches.lock().unwrap().clone();
        assert!(!fetches.is_empty());
        assert_eq!(fetches[0], "default?limit=10&skip=0&count");
        assert_eq!(state.client().unwrap().base_url(), new.url);
    }
}
