//! Page/page-size normalization for list endpoints.

use serde::Deserialize;

use super::types::Window;
use crate::config::PaginationConfig;

/// Raw `?page=&pageSize=` query values. Kept as strings so non-numeric
/// input falls back to defaults instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
    #[serde(rename = "pageSize")]
    pub page_size: Option<String>,
}

/// Normalized pagination parameters
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pagination {
    /// 1-based page index
    pub page: u64,
    /// items per page, capped at the configured maximum
    pub page_size: u64,
}

impl Pagination {
    pub fn from_query(query: &PageQuery, config: &PaginationConfig) -> Self {
        let default_size = u64::from(config.default_page_size.max(1));
        let max_size = u64::from(config.max_page_size.max(1));

        let page = parse_positive(query.page.as_deref()).unwrap_or(1);
        let page_size = parse_positive(query.page_size.as_deref())
            .unwrap_or(default_size)
            .min(max_size);
        Self { page, page_size }
    }

    pub fn window(&self) -> Window {
        Window {
            skip: self.page.saturating_sub(1).saturating_mul(self.page_size),
            limit: self.page_size,
        }
    }
}

fn parse_positive(raw: Option<&str>) -> Option<u64> {
    raw.and_then(|s| s.trim().parse::<u64>().ok()).filter(|n| *n >= 1)
}
