use super::DesktopState;
use crate::config::AppConfig;
use crate::error::AppError;
use tauri::State;

/// Point the app at a FireFly node, persist the settings and test them
#[tauri::command]
pub async fn firefly_configure(
    base_url: String,
    namespace: String,
    username: Option<String>,
    password: Option<String>,
    state: State<'_, DesktopState>,
) -> Result<String, AppError> {
    let config = AppConfig {
        base_url,
        namespace,
        username,
        password,
    };
    config.save_to(&AppConfig::default_path()?)?;
    state.configure(config).await?;

    state.client()?.test_connection().await
}

#[tauri::command]
pub async fn firefly_test_connection(state: State<'_, DesktopState>) -> Result<String, AppError> {
    state.client()?.test_connection().await
}
