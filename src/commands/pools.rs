use super::DesktopState;
use crate::error::AppError;
use crate::pools::ViewSnapshot;
use tauri::State;

/// Mount the token pool list. `location` is the view's current URL, whose
/// `filters` parameter seeds the active filters.
#[tauri::command]
pub async fn token_pools_open(
    namespace: String,
    location: String,
    state: State<'_, DesktopState>,
) -> Result<ViewSnapshot, AppError> {
    state.open_pools(namespace, &location).await
}

#[tauri::command]
pub async fn token_pools_snapshot(state: State<'_, DesktopState>) -> Result<ViewSnapshot, AppError> {
    Ok(state.pools.snapshot().await)
}

#[tauri::command]
pub async fn token_pools_change_page(
    page: u32,
    state: State<'_, DesktopState>,
) -> Result<ViewSnapshot, AppError> {
    Ok(state.pools.change_page(page).await)
}

#[tauri::command]
pub async fn token_pools_change_page_size(
    size: u32,
    state: State<'_, DesktopState>,
) -> Result<ViewSnapshot, AppError> {
    state.pools.change_page_size(size).await
}

#[tauri::command]
pub async fn token_pools_add_filter(
    filter: String,
    state: State<'_, DesktopState>,
) -> Result<ViewSnapshot, AppError> {
    Ok(state.pools.add_filter(filter).await)
}

/// Called by the filter chips with the list left after a removal
#[tauri::command]
pub async fn token_pools_set_filters(
    filters: Vec<String>,
    state: State<'_, DesktopState>,
) -> Result<ViewSnapshot, AppError> {
    Ok(state.pools.set_filters(filters).await)
}

/// Route for a clicked row
#[tauri::command]
pub async fn token_pools_select(
    pool_name: String,
    state: State<'_, DesktopState>,
) -> Result<String, AppError> {
    Ok(state.pools.select(&pool_name).await)
}
