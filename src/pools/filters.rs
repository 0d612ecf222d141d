use url::Url;

/// Name of the array-valued query parameter mirroring the active filters.
pub const FILTERS_PARAM: &str = "filters";

/// Fields offered by the filter modal.
pub const FILTER_FIELDS: [&str; 12] = [
    "connector",
    "created",
    "id",
    "message",
    "name",
    "protocolid",
    "standard",
    "state",
    "symbol",
    "tx.id",
    "tx.type",
    "type",
];

/// Where the `filters` parameter lives. Writes replace in place.
pub trait QueryParamStore {
    fn read_filters(&self) -> Vec<String>;
    fn replace_filters(&mut self, filters: &[String]);
}

/// `QueryParamStore` over the view's location URL. The array parameter is
/// encoded as repeated `filters=` pairs; other pairs are kept in order.
#[derive(Debug, Clone)]
pub struct LocationQuery {
    url: Url,
}

impl LocationQuery {
    pub fn new(url: Url) -> Self {
        Self { url }
    }

    pub fn parse(location: &str) -> Result<Self, url::ParseError> {
        Ok(Self::new(Url::parse(location)?))
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl QueryParamStore for LocationQuery {
    fn read_filters(&self) -> Vec<String> {
        self.url
            .query_pairs()
            .filter(|(k, _)| k == FILTERS_PARAM)
            .map(|(_, v)| v.into_owned())
            .collect()
    }

    fn replace_filters(&mut self, filters: &[String]) {
        let others: Vec<(String, String)> = self
            .url
            .query_pairs()
            .filter(|(k, _)| k != FILTERS_PARAM)
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        if others.is_empty() && filters.is_empty() {
            self.url.set_query(None);
            return;
        }

        let mut pairs = self.url.query_pairs_mut();
        pairs.clear();
        pairs.extend_pairs(others.iter());
        for filter in filters {
            pairs.append_pair(FILTERS_PARAM, filter);
        }
    }
}

/// `""` for no filters, otherwise `&clause1&clause2...`.
pub fn filter_fragment(filters: &[String]) -> String {
    if filters.is_empty() {
        return String::new();
    }
    format!("&{}", filters.join("&"))
}

/// Keeps the in-memory filter list, the URL parameter and the derived
/// query fragment consistent. The URL seeds the list once, at mount.
#[derive(Debug, Clone)]
pub struct FilterSync<Q: QueryParamStore> {
    store: Q,
    active: Vec<String>,
    fragment: String,
}

impl<Q: QueryParamStore> FilterSync<Q> {
    pub fn mount(store: Q) -> Self {
        let mut sync = Self {
            active: store.read_filters(),
            store,
            fragment: String::new(),
        };
        sync.publish();
        sync
    }

    pub fn add_filter(&mut self, clause: String) {
        self.active.push(clause);
        self.publish();
    }

    /// Replace the whole list, e.g. after a filter chip was removed.
    pub fn set_filters(&mut self, filters: Vec<String>) {
        self.active = filters;
        self.publish();
    }

    pub fn active(&self) -> &[String] {
        &self.active
    }

    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    pub fn store(&self) -> &Q {
        &self.store
    }

    fn publish(&mut self) {
        self.store.replace_filters(&self.active);
        self.fragment = filter_fragment(&self.active);
    }
}
