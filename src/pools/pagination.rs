use serde::Serialize;

/// Page sizes offered by the table footer. The first entry is the default.
pub const PAGE_LIMITS: [u32; 2] = [10, 25];

/// Offset pagination over a list whose total is only known after a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u32,
    pub page_size: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            current_page: 0,
            page_size: PAGE_LIMITS[0],
        }
    }
}

impl Pagination {
    /// Move to `requested_page`. Forward moves are ignored once the current page
    /// already reaches `total`. Returns whether the page changed.
    pub fn advance(&mut self, requested_page: u32, total: u64) -> bool {
        if requested_page > self.current_page
            && u64::from(self.page_size) * (u64::from(self.current_page) + 1) >= total
        {
            return false;
        }
        let changed = self.current_page != requested_page;
        self.current_page = requested_page;
        changed
    }

    pub fn change_page_size(&mut self, new_size: u32) {
        self.current_page = 0;
        self.page_size = new_size;
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page_size) * u64::from(self.current_page)
    }

    pub fn is_allowed_size(size: u32) -> bool {
        PAGE_LIMITS.contains(&size)
    }
}
