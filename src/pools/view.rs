use super::filters::{FilterSync, LocationQuery, FILTER_FIELDS};
use super::pagination::{Pagination, PAGE_LIMITS};
use crate::error::AppError;
use crate::firefly_api::{PoolPage, PoolQuery, TokenPool};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Column keys, in display order, for the frontend's table widget.
pub const COLUMN_KEYS: [&str; 5] = ["name", "type", "standard", "protocolID", "created"];

/// Everything whose change must trigger a fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchKey {
    pub page_size: u32,
    pub current_page: u32,
    pub namespace: String,
    pub refresh_signal: i64,
    pub filter_fragment: String,
}

/// A fetch the view has issued and is waiting on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub seq: u64,
    pub query: PoolQuery,
}

/// Table row derived from a `TokenPool`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolRow {
    pub key: String,
    pub name: String,
    #[serde(rename = "type")]
    pub pool_type: String,
    pub standard: String,
    pub protocol_id: String,
    pub created: String,
    pub detail_path: String,
}

/// Render state published to the frontend.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewSnapshot {
    pub namespace: String,
    pub current_page: u32,
    pub page_size: u32,
    pub page_limits: Vec<u32>,
    pub total: u64,
    pub loading: bool,
    pub is_empty: bool,
    pub rows: Vec<PoolRow>,
    pub active_filters: Vec<String>,
    pub filter_fragment: String,
    pub location: String,
    pub column_keys: Vec<&'static str>,
    pub filter_fields: Vec<&'static str>,
}

pub fn detail_path(namespace: &str, pool_name: &str) -> String {
    format!("/namespace/{namespace}/tokens/tokenPools/{pool_name}")
}

/// `MM/DD/YYYY h:mm AM`, in UTC. Unparseable timestamps pass through.
pub fn format_created(created: Option<&str>) -> String {
    let Some(raw) = created else {
        return String::new();
    };
    match DateTime::parse_from_rfc3339(raw) {
        Ok(ts) => ts
            .with_timezone(&Utc)
            .format("%m/%d/%Y %-I:%M %p")
            .to_string(),
        Err(_) => raw.to_string(),
    }
}

/// State of the token pool list for one mounted view.
pub struct TokenPoolsView {
    namespace: String,
    pagination: Pagination,
    filters: FilterSync<LocationQuery>,
    refresh_signal: i64,
    pools: Vec<TokenPool>,
    total: u64,
    loading: bool,
    issued_seq: u64,
    last_fetched: Option<FetchKey>,
}

impl TokenPoolsView {
    /// Mount with defaults; filters are hydrated from `location` if present.
    pub fn mount(namespace: String, location: LocationQuery) -> Self {
        Self {
            namespace,
            pagination: Pagination::default(),
            filters: FilterSync::mount(location),
            refresh_signal: 0,
            pools: Vec::new(),
            total: 0,
            loading: false,
            issued_seq: 0,
            last_fetched: None,
        }
    }

    /// Mount again (namespace or location changed). Sequence numbers carry
    /// over so responses to the previous mount are still recognised as stale.
    pub fn remount(&mut self, namespace: String, location: LocationQuery) {
        let issued_seq = self.issued_seq;
        *self = Self::mount(namespace, location);
        self.issued_seq = issued_seq;
    }

    pub fn fetch_key(&self) -> FetchKey {
        FetchKey {
            page_size: self.pagination.page_size,
            current_page: self.pagination.current_page,
            namespace: self.namespace.clone(),
            refresh_signal: self.refresh_signal,
            filter_fragment: self.filters.fragment().to_string(),
        }
    }

    pub fn needs_fetch(&self) -> bool {
        self.last_fetched.as_ref() != Some(&self.fetch_key())
    }

    /// Issue a fetch if any dependency changed since the last one.
    pub fn begin_fetch(&mut self) -> Option<FetchTicket> {
        if !self.needs_fetch() {
            return None;
        }
        let key = self.fetch_key();
        self.issued_seq += 1;
        self.loading = true;
        let query = PoolQuery {
            namespace: key.namespace.clone(),
            limit: key.page_size,
            skip: self.pagination.offset(),
            filter_fragment: key.filter_fragment.clone(),
        };
        self.last_fetched = Some(key);
        Some(FetchTicket {
            seq: self.issued_seq,
            query,
        })
    }

    /// Apply a settled fetch. Responses for superseded requests are dropped.
    /// Returns whether the view state changed.
    pub fn finish_fetch(&mut self, seq: u64, result: Result<PoolPage, AppError>) -> bool {
        if seq != self.issued_seq {
            tracing::warn!(
                "Dropping stale token pool response (seq {seq}, latest {})",
                self.issued_seq
            );
            return false;
        }
        match result {
            Ok(page) => {
                self.total = page.total;
                self.pools = page.items;
            }
            Err(e) => {
                tracing::error!("Error fetching token pools: {e}");
            }
        }
        self.loading = false;
        true
    }

    pub fn change_page(&mut self, requested_page: u32) -> bool {
        self.pagination.advance(requested_page, self.total)
    }

    pub fn change_page_size(&mut self, size: u32) -> Result<(), AppError> {
        if !Pagination::is_allowed_size(size) {
            return Err(AppError::InvalidInput(format!(
                "page size {size} not in {PAGE_LIMITS:?}"
            )));
        }
        self.pagination.change_page_size(size);
        Ok(())
    }

    pub fn add_filter(&mut self, clause: String) {
        self.filters.add_filter(clause);
    }

    pub fn set_filters(&mut self, filters: Vec<String>) {
        self.filters.set_filters(filters);
    }

    pub fn set_namespace(&mut self, namespace: String) {
        self.namespace = namespace;
    }

    /// Bump the refresh signal. Strictly increasing even if the clock is not.
    pub fn mark_pools_updated(&mut self, now_millis: i64) {
        self.refresh_signal = now_millis.max(self.refresh_signal + 1);
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn pagination(&self) -> Pagination {
        self.pagination
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn pools(&self) -> &[TokenPool] {
        &self.pools
    }

    pub fn refresh_signal(&self) -> i64 {
        self.refresh_signal
    }

    pub fn rows(&self) -> Vec<PoolRow> {
        self.pools
            .iter()
            .map(|pool| PoolRow {
                key: pool.id.clone(),
                name: pool.name.clone(),
                pool_type: pool.pool_type.clone(),
                standard: pool.standard.clone(),
                protocol_id: pool.protocol_id.clone(),
                created: format_created(pool.created.as_deref()),
                detail_path: detail_path(&self.namespace, &pool.name),
            })
            .collect()
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        ViewSnapshot {
            namespace: self.namespace.clone(),
            current_page: self.pagination.current_page,
            page_size: self.pagination.page_size,
            page_limits: PAGE_LIMITS.to_vec(),
            total: self.total,
            loading: self.loading,
            is_empty: self.pools.is_empty(),
            rows: self.rows(),
            active_filters: self.filters.active().to_vec(),
            filter_fragment: self.filters.fragment().to_string(),
            location: self.filters.store().url().to_string(),
            column_keys: COLUMN_KEYS.to_vec(),
            filter_fields: FILTER_FIELDS.to_vec(),
        }
    }
}
