pub mod connection;
pub mod pools;

use crate::pools::{SnapshotSink, ViewSnapshot};
use crate::state::AppState;
use tauri::{AppHandle, Emitter};

/// Frontend event carrying every new `ViewSnapshot`.
pub const SNAPSHOT_EVENT: &str = "token-pools:updated";

pub type DesktopState = AppState<EmitterSink>;

/// Publishes snapshots to the webview as `token-pools:updated` events.
pub struct EmitterSink {
    app: AppHandle,
}

impl EmitterSink {
    pub fn new(app: AppHandle) -> Self {
        Self { app }
    }
}

impl SnapshotSink for EmitterSink {
    fn publish(&self, snapshot: &ViewSnapshot) {
        if let Err(e) = self.app.emit(SNAPSHOT_EVENT, snapshot) {
            tracing::warn!("Failed to emit {SNAPSHOT_EVENT}: {e}");
        }
    }
}
