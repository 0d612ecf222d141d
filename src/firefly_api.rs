use crate::config::AppConfig;
use crate::error::AppError;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};

/// REST API client for a FireFly node
pub struct FireflyClient {
    base_url: String,
    credentials: Option<(String, String)>,
    http: Client,
}

/// Token pool as returned by `/tokens/pools`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPool {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub pool_type: String,
    #[serde(default)]
    pub standard: String,
    #[serde(default)]
    pub protocol_id: String,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub connector: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub tx: Option<TransactionRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRef {
    #[serde(rename = "type", default)]
    pub tx_type: String,
    #[serde(default)]
    pub id: Option<String>,
}

/// Paged list response (requested with `&count`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolPage {
    #[serde(default, deserialize_with = "null_as_zero")]
    pub total: u64,
    #[serde(default)]
    pub items: Vec<TokenPool>,
}

fn null_as_zero<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<u64>::deserialize(deserializer)?.unwrap_or(0))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Namespace {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// One offset-paginated list request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolQuery {
    pub namespace: String,
    pub limit: u32,
    pub skip: u64,
    /// `""` or `&clause1&clause2`, already query-string encoded
    pub filter_fragment: String,
}

impl PoolQuery {
    /// Path and query relative to the node's base URL.
    pub fn path(&self) -> String {
        format!(
            "/api/v1/namespaces/{}/tokens/pools?limit={}&skip={}{}&count",
            urlencoding::encode(&self.namespace),
            self.limit,
            self.skip,
            self.filter_fragment
        )
    }
}

impl FireflyClient {
    pub fn new(base_url: String, credentials: Option<(String, String)>) -> Self {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
            http,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let credentials = config
            .credentials()
            .map(|(u, p)| (u.to_string(), p.to_string()));
        Self::new(config.base_url.clone(), credentials)
    }

    fn get(&self, path: &str) -> RequestBuilder {
        let req = self.http.get(format!("{}{}", self.base_url, path));
        match &self.credentials {
            Some((user, pass)) => req.basic_auth(user, Some(pass)),
            None => req,
        }
    }

    async fn ensure_success(resp: Response) -> Result<Response, AppError> {
        if resp.status().is_success() {
            return Ok(resp);
        }
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        Err(AppError::Api { status, body })
    }

    /// List one page of token pools together with the total count
    pub async fn list_token_pools(&self, query: &PoolQuery) -> Result<PoolPage, AppError> {
        let resp = self.get(&query.path()).send().await?;
        let resp = Self::ensure_success(resp).await?;
        Ok(resp.json::<PoolPage>().await?)
    }

    /// List namespaces known to the node
    pub async fn list_namespaces(&self) -> Result<Vec<Namespace>, AppError> {
        let resp = self.get("/api/v1/namespaces").send().await?;
        let resp = Self::ensure_success(resp).await?;
        Ok(resp.json::<Vec<Namespace>>().await?)
    }

    /// Websocket endpoint for ephemeral, auto-acked event delivery
    pub fn ws_events_url(&self, namespace: &str) -> String {
        let base = self
            .base_url
            .replace("https://", "wss://")
            .replace("http://", "ws://");
        format!(
            "{}/ws?namespace={}&ephemeral&autoack",
            base,
            urlencoding::encode(namespace)
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn credentials(&self) -> Option<(&str, &str)> {
        self.credentials
            .as_ref()
            .map(|(u, p)| (u.as_str(), p.as_str()))
    }

    /// Test connection by listing namespaces
    pub async fn test_connection(&self) -> Result<String, AppError> {
        let namespaces = self.list_namespaces().await?;
        Ok(format!("Connected. Found {} namespaces.", namespaces.len()))
    }
}
