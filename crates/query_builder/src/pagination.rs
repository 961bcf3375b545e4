//! Page/limit normalisation

use serde::{Deserialize, Serialize};

/// Normalised page window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
}

impl Pagination {
    pub const DEFAULT_PAGE: u64 = 1;
    pub const DEFAULT_LIMIT: u64 = 10;
    pub const MAX_LIMIT: u64 = 100;

    /// Page is at least 1, limit is clamped to `1..=MAX_LIMIT`
    pub fn from_request(page: Option<i64>, limit: Option<i64>) -> Self {
        let page = page.map_or(Self::DEFAULT_PAGE, |p| p.max(1) as u64);
        let limit = limit.map_or(Self::DEFAULT_LIMIT, |l| {
            l.clamp(1, Self::MAX_LIMIT as i64) as u64
        });
        Self { page, limit }
    }

    /// Same as `from_request` for query-string values; unparsable values use the defaults
    pub fn from_query(page: Option<&str>, limit: Option<&str>) -> Self {
        let parse = |raw: Option<&str>| raw.and_then(|s| s.trim().parse::<i64>().ok());
        Self::from_request(parse(page), parse(limit))
    }

    /// Rows to skip
    pub fn skip(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    /// Rows to take
    pub fn take(&self) -> u64 {
        self.limit
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: Self::DEFAULT_PAGE,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}

/// Pagination block of a list response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub page: u64,
    pub limit: u64,
    pub total_count: u64,
    pub total_pages: u64,
}

impl PageInfo {
    pub fn new(pagination: Pagination, total_count: u64) -> Self {
        Self {
            page: pagination.page,
            limit: pagination.limit,
            total_count,
            total_pages: total_count.div_ceil(pagination.limit),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let p = Pagination::from_request(None, None);
        assert_eq!(p, Pagination::default());
        assert_eq!(p.skip(), 0);
        assert_eq!(p.take(), 10);
    }

    #[test]
    fn test_clamping() {
        assert_eq!(Pagination::from_request(Some(0), Some(0)).limit, 1);
        assert_eq!(Pagination::from_request(Some(-4), None).page, 1);
        assert_eq!(Pagination::from_request(None, Some(500)).limit, 100);
    }

    #[test]
    fn test_skip() {
        let p = Pagination::from_request(Some(3), Some(20));
        assert_eq!(p.skip(), 40);
        assert_eq!(p.take(), 20);
    }

    #[test]
    fn test_from_query_strings() {
        let p = Pagination::from_query(Some("2"), Some("abc"));
        assert_eq!(p.page, 2);
        assert_eq!(p.limit, 10);
    }

    #[test]
    fn test_page_info() {
        let info = PageInfo::new(Pagination::from_request(Some(1), Some(10)), 25);
        assert_eq!(info.total_pages, 3);
        assert_eq!(
            serde_json::to_value(info).unwrap(),
            json!({"page": 1, "limit": 10, "totalCount": 25, "totalPages": 3})
        );
        assert_eq!(PageInfo::new(Pagination::default(), 0).total_pages, 0);
    }
}
