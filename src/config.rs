use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";
pub const DEFAULT_NAMESPACE: &str = "default";

/// FireFly connection settings, persisted as JSON in the user's config dir.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            namespace: default_namespace(),
            username: None,
            password: None,
        }
    }
}

impl AppConfig {
    /// `~/.config/token-pools-ui/config.json` (platform equivalent)
    pub fn default_path() -> Result<PathBuf, AppError> {
        let dir = dirs::config_dir().ok_or_else(|| AppError::Internal("No config dir".into()))?;
        Ok(dir.join("token-pools-ui").join("config.json"))
    }

    /// Load from the default path, then apply `FIREFLY_*` environment overrides.
    pub fn load() -> Result<Self, AppError> {
        let mut config = Self::load_from(&Self::default_path()?)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, AppError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), AppError> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("FIREFLY_URL") {
            self.base_url = url;
        }
        if let Some(ns) = lookup("FIREFLY_NAMESPACE") {
            self.namespace = ns;
        }
        if let Some(user) = lookup("FIREFLY_USERNAME") {
            self.username = Some(user);
        }
        if let Some(pass) = lookup("FIREFLY_PASSWORD") {
            self.password = Some(pass);
        }
    }

    /// Basic auth pair, only when both halves are set.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.username, &self.password) {
            (Some(u), Some(p)) => Some((u.as_str(), p.as_str())),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = AppConfig::load_from(&tmp.path().join("nope.json")).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.base_url, "http://localhost:5000");
        assert_eq!(config.namespace, "default");
    }

    #[test]
    fn partial_file_fills_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        fs::write(&path, r#"{"namespace": "ns1"}"#).unwrap();
        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.namespace, "ns1");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert!(config.credentials().is_none());
    }

    #[test]
    fn save_then_load_preserves_settings() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("config.json");
        let config = AppConfig {
            base_url: "http://firefly:5000".into(),
            namespace: "ns2".into(),
            username: Some("alice".into()),
            password: Some("secret".into()),
        };
        config.save_to(&path).unwrap();
        assert_eq!(AppConfig::load_from(&path).unwrap(), config);
    }

    #[test]
    fn env_overrides_take_precedence() {
        let vars: HashMap<&str, &str> = [
            ("FIREFLY_URL", "http://override:5000"),
            ("FIREFLY_USERNAME", "bob"),
        ]
        .into_iter()
        .collect();
        let mut config = AppConfig::default();
        config.apply_overrides(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.base_url, "http://override:5000");
        assert_eq!(config.namespace, "default");
        assert_eq!(config.username.as_deref(), Some("bob"));
        // password missing, so no basic auth
        assert!(config.credentials().is_none());
    }

    #[test]
    fn malformed_file_is_json_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(
            AppConfig::load_from(&path),
            Err(AppError::Json(_))
        ));
    }
}
