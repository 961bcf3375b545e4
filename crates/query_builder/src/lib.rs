//! # Query Builder
//!
//! Turns an untrusted list request (filters, sort, page/limit) into a query
//! document for the data store.
//!
//! # Example
//!
//! ```
//! use query_builder::ListRequest;
//!
//! let request = ListRequest::from_json(
//!     r#"{"filters": {"age": [{"operation": "gte", "value": 18, "dataType": "number"}]}}"#,
//! ).unwrap();
//! let query = request.to_query();
//! assert_eq!(query.where_clause["age"]["gte"], 18);
//! assert_eq!(query.take, 10);
//! ```

mod error;
mod filter;
mod pagination;
mod request;
mod sort;

pub use error::QueryError;
pub use filter::{build_where, coerce_value};
pub use pagination::{PageInfo, Pagination};
pub use request::{
    DataType, FilterItem, FilterOperation, FilterValue, Filters, ListQuery, ListRequest, SortItem,
};
pub use sort::build_order_by;

use serde::Serialize;
use serde_json::Value;

/// Everything a list query needs
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryDocument {
    #[serde(rename = "where")]
    pub where_clause: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_by: Option<Value>,
    pub skip: u64,
    pub take: u64,
}

impl ListRequest {
    /// Normalised page window for this request
    pub fn pagination(&self) -> Pagination {
        Pagination::from_request(self.page, self.limit)
    }

    /// Build the full query document
    pub fn to_query(&self) -> QueryDocument {
        let pagination = self.pagination();
        QueryDocument {
            where_clause: build_where(self.filters.as_ref()),
            order_by: build_order_by(self.sort.as_deref()),
            skip: pagination.skip(),
            take: pagination.take(),
        }
    }
}

impl ListQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination::from_query(self.page.as_deref(), self.limit.as_deref())
    }
}
