//! List request shapes
//!
//! Filter items are strict: unknown keys, operations or data types are
//! rejected at decode time.

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::collections::BTreeMap;

use crate::error::QueryError;

/// Filter operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOperation {
    Eq,
    Ne,
    Gte,
    Lte,
    Gt,
    Lt,
    In,
    Nin,
}

impl FilterOperation {
    /// Operator key in the generated where document
    pub fn operator(&self) -> &'static str {
        match self {
            Self::Eq => "equals",
            Self::Ne => "not",
            Self::Gte => "gte",
            Self::Lte => "lte",
            Self::Gt => "gt",
            Self::Lt => "lt",
            Self::In => "in",
            Self::Nin => "notIn",
        }
    }

    /// Takes a single string/number value
    pub fn is_scalar(&self) -> bool {
        !self.is_array()
    }

    /// Takes an array value
    pub fn is_array(&self) -> bool {
        matches!(self, Self::In | Self::Nin)
    }
}

/// Declared type of a filter value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Date,
    String,
    Number,
    Array,
}

/// Raw filter value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Text(String),
    Number(Number),
    List(Vec<Value>),
}

/// One condition on a field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterItem {
    pub operation: FilterOperation,
    pub value: FilterValue,
    #[serde(rename = "dataType")]
    pub data_type: DataType,
}

/// Field name -> conditions
pub type Filters = BTreeMap<String, Vec<FilterItem>>;

/// One sort key; `order >= 0` sorts ascending
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortItem {
    pub order: f64,
    #[serde(rename = "orderBy")]
    pub order_by: String,
}

/// Body of a list endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<Filters>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<Vec<SortItem>>,
}

impl ListRequest {
    /// Decode from JSON text
    pub fn from_json(input: &str) -> Result<Self, QueryError> {
        Ok(serde_json::from_str(input)?)
    }

    /// Decode from an already parsed JSON value
    pub fn from_value(value: Value) -> Result<Self, QueryError> {
        Ok(serde_json::from_value(value)?)
    }
}

/// Query-string variant of a list request (all values are strings)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub page: Option<String>,
    #[serde(default)]
    pub limit: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_full_request() {
        let request = ListRequest::from_json(
            r#"{
                "search": "ann",
                "filters": {
                    "age": [{"operation": "gte", "value": 18, "dataType": "number"}],
                    "role": [{"operation": "in", "value": ["ADMIN"], "dataType": "array"}]
                },
                "page": 2,
                "limit": 20,
                "sort": [{"order": -1, "orderBy": "createdAt"}]
            }"#,
        )
        .unwrap();

        let filters = request.filters.unwrap();
        assert_eq!(filters["age"][0].operation, FilterOperation::Gte);
        assert_eq!(filters["age"][0].value, FilterValue::Number(18.into()));
        assert_eq!(
            filters["role"][0].value,
            FilterValue::List(vec![json!("ADMIN")])
        );
        assert_eq!(request.sort.unwrap()[0].order_by, "createdAt");
        assert_eq!(request.page, Some(2));
    }

    #[test]
    fn test_unknown_filter_key_rejected() {
        let err = ListRequest::from_json(
            r#"{"filters": {"age": [{"operation": "eq", "value": 1, "dataType": "number", "extra": 1}]}}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("extra"), "got: {err}");
    }

    #[test]
    fn test_unknown_operation_rejected() {
        let result = ListRequest::from_json(
            r#"{"filters": {"age": [{"operation": "like", "value": "a", "dataType": "string"}]}}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_object_value_rejected() {
        let result = ListRequest::from_value(json!({
            "filters": {"age": [{"operation": "eq", "value": {"x": 1}, "dataType": "number"}]}
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_top_level_keys_allowed() {
        let request = ListRequest::from_json(r#"{"cursor": "abc"}"#).unwrap();
        assert_eq!(request, ListRequest::default());
    }

    #[test]
    fn test_operator_mapping() {
        assert_eq!(FilterOperation::Eq.operator(), "equals");
        assert_eq!(FilterOperation::Ne.operator(), "not");
        assert_eq!(FilterOperation::Nin.operator(), "notIn");
        assert!(FilterOperation::In.is_array());
        assert!(FilterOperation::Lt.is_scalar());
    }
}
