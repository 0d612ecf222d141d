mod config;
mod error;
mod firefly_api;
mod firefly_ws;
mod pools;
mod state;

pub use config::AppConfig;
pub use error::AppError;
pub use firefly_api::{FireflyClient, PoolPage, PoolQuery, TokenPool};
pub use pools::{
    ClientSlot, EventAction, LocationQuery, PoolSource, PoolsController, SnapshotSink,
    TokenPoolsView, ViewSnapshot,
};
pub use state::AppState;

#[cfg(feature = "desktop")]
mod commands;

#[cfg(feature = "desktop")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    use tauri::Manager;

    tracing_subscriber::fmt::init();

    tauri::Builder::default()
        .setup(|app| {
            let config = config::AppConfig::load()?;
            tracing::info!(
                "Using FireFly node {} (namespace {})",
                config.base_url,
                config.namespace
            );
            let sink = commands::EmitterSink::new(app.handle().clone());
            app.manage(state::AppState::new(config, sink)?);
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            // Token pool list
            commands::pools::token_pools_open,
            commands::pools::token_pools_snapshot,
            commands::pools::token_pools_change_page,
            commands::pools::token_pools_change_page_size,
            commands::pools::token_pools_add_filter,
            commands::pools::token_pools_set_filters,
            commands::pools::token_pools_select,
            // Connection
            commands::connection::firefly_configure,
            commands::connection::firefly_test_connection,
        ])
        .run(tauri::generate_context!())
        .expect("error while running token-pools-ui");
}
