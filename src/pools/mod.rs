//! Token pool list view: pagination, URL-synced filters, live refresh and
//! sequenced fetching. Rendering stays in the frontend.

pub mod events;
pub mod fetcher;
pub mod filters;
pub mod pagination;
pub mod view;

pub use events::EventAction;
pub use fetcher::{run_event_listener, ClientSlot, PoolSource, PoolsController, SnapshotSink};
pub use filters::LocationQuery;
pub use view::{TokenPoolsView, ViewSnapshot};
