use crate::error::AppError;
use serde::Deserialize;

pub const TOKEN_POOL_CONFIRMED: &str = "token_pool_confirmed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventAction {
    Refresh,
    Ignore,
}

#[derive(Deserialize)]
struct EventEnvelope {
    #[serde(rename = "type", default)]
    event_type: Option<String>,
}

/// Decides which pushed FireFly events invalidate the pool list.
#[derive(Debug, Default, Clone, Copy)]
pub struct PoolEventListener;

impl PoolEventListener {
    /// Malformed payloads are reported as `AppError::Json`, not skipped.
    pub fn on_event(&self, raw: &str) -> Result<EventAction, AppError> {
        let envelope: EventEnvelope = serde_json::from_str(raw)?;
        match envelope.event_type.as_deref() {
            Some(TOKEN_POOL_CONFIRMED) => Ok(EventAction::Refresh),
            _ => Ok(EventAction::Ignore),
        }
    }
}
