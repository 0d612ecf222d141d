use super::events::{EventAction, PoolEventListener};
use super::filters::LocationQuery;
use super::view::{detail_path, TokenPoolsView, ViewSnapshot};
use crate::error::AppError;
use crate::firefly_api::{FireflyClient, PoolPage, PoolQuery};
use std::future::Future;
use std::sync::{Arc, RwLock};
use tokio::sync::{mpsc, Mutex};

/// Where pages of token pools come from.
pub trait PoolSource: Send + Sync + 'static {
    fn list_pools(
        &self,
        query: &PoolQuery,
    ) -> impl Future<Output = Result<PoolPage, AppError>> + Send;
}

/// Receives every render state the controller produces.
pub trait SnapshotSink: Send + Sync + 'static {
    fn publish(&self, snapshot: &ViewSnapshot);
}

/// The live FireFly client, swappable at runtime by `firefly_configure`.
#[derive(Default)]
pub struct ClientSlot {
    client: RwLock<Option<Arc<FireflyClient>>>,
}

impl ClientSlot {
    pub fn new(client: Option<FireflyClient>) -> Self {
        Self {
            client: RwLock::new(client.map(Arc::new)),
        }
    }

    pub fn set(&self, client: FireflyClient) -> Result<(), AppError> {
        let mut slot = self
            .client
            .write()
            .map_err(|_| AppError::Internal("client lock poisoned".into()))?;
        *slot = Some(Arc::new(client));
        Ok(())
    }

    pub fn get(&self) -> Result<Arc<FireflyClient>, AppError> {
        self.client
            .read()
            .map_err(|_| AppError::Internal("client lock poisoned".into()))?
            .clone()
            .ok_or(AppError::NotConfigured)
    }
}

impl PoolSource for ClientSlot {
    fn list_pools(
        &self,
        query: &PoolQuery,
    ) -> impl Future<Output = Result<PoolPage, AppError>> + Send {
        let client = self.get();
        let query = query.clone();
        async move { client?.list_token_pools(&query).await }
    }
}

/// Drives a `TokenPoolsView`: every mutation is followed by `sync`, which
/// fetches when the view's dependencies changed and publishes snapshots.
pub struct PoolsController<S: PoolSource, P: SnapshotSink> {
    view: Mutex<TokenPoolsView>,
    listener: PoolEventListener,
    source: S,
    sink: P,
}

impl<S: PoolSource, P: SnapshotSink> PoolsController<S, P> {
    pub fn new(view: TokenPoolsView, source: S, sink: P) -> Self {
        Self {
            view: Mutex::new(view),
            listener: PoolEventListener,
            source,
            sink,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Fetch if needed. The view lock is released while the request is in flight.
    pub async fn sync(&self) -> ViewSnapshot {
        let ticket = {
            let mut view = self.view.lock().await;
            match view.begin_fetch() {
                Some(ticket) => {
                    self.sink.publish(&view.snapshot());
                    ticket
                }
                None => return view.snapshot(),
            }
        };

        let result = self.source.list_pools(&ticket.query).await;

        let mut view = self.view.lock().await;
        if view.finish_fetch(ticket.seq, result) {
            self.sink.publish(&view.snapshot());
        }
        view.snapshot()
    }

    pub async fn snapshot(&self) -> ViewSnapshot {
        self.view.lock().await.snapshot()
    }

    pub async fn open(&self, namespace: String, location: &str) -> Result<ViewSnapshot, AppError> {
        let location = LocationQuery::parse(location)?;
        self.view.lock().await.remount(namespace, location);
        Ok(self.sync().await)
    }

    pub async fn change_page(&self, page: u32) -> ViewSnapshot {
        self.view.lock().await.change_page(page);
        self.sync().await
    }

    pub async fn change_page_size(&self, size: u32) -> Result<ViewSnapshot, AppError> {
        self.view.lock().await.change_page_size(size)?;
        Ok(self.sync().await)
    }

    pub async fn add_filter(&self, clause: String) -> ViewSnapshot {
        self.view.lock().await.add_filter(clause);
        self.sync().await
    }

    pub async fn set_filters(&self, filters: Vec<String>) -> ViewSnapshot {
        self.view.lock().await.set_filters(filters);
        self.sync().await
    }

    pub async fn set_namespace(&self, namespace: String) -> ViewSnapshot {
        self.view.lock().await.set_namespace(namespace);
        self.sync().await
    }

    /// Refetch the current page even if nothing in the view changed, e.g.
    /// after the source was pointed at another node.
    pub async fn reload(&self, namespace: String) -> ViewSnapshot {
        {
            let mut view = self.view.lock().await;
            view.set_namespace(namespace);
            view.mark_pools_updated(chrono::Utc::now().timestamp_millis());
        }
        self.sync().await
    }

    /// Detail page path for a row, for the frontend router.
    pub async fn select(&self, pool_name: &str) -> String {
        detail_path(self.view.lock().await.namespace(), pool_name)
    }

    /// Handle one pushed event payload. A refresh bumps the view's signal and syncs.
    pub async fn on_event(&self, raw: &str) -> Result<EventAction, AppError> {
        let action = self.listener.on_event(raw)?;
        if action == EventAction::Refresh {
            self.view
                .lock()
                .await
                .mark_pools_updated(chrono::Utc::now().timestamp_millis());
            self.sync().await;
        }
        Ok(action)
    }
}

/// Consume raw event payloads until every sender is dropped.
pub async fn run_event_listener<S, P>(
    controller: Arc<PoolsController<S, P>>,
    mut events: mpsc::Receiver<String>,
) where
    S: PoolSource,
    P: SnapshotSink,
{
    while let Some(raw) = events.recv().await {
        match controller.on_event(&raw).await {
            Ok(EventAction::Refresh) => tracing::info!("Token pools updated, refetched"),
            Ok(EventAction::Ignore) => {}
            Err(e) => tracing::error!("Malformed event payload: {e}"),
        }
    }
}
