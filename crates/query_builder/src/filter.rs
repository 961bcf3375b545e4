//! Filter -> where document
//!
//! Invalid items are skipped rather than rejected. A field that mixes `ne`
//! with other operators is split into two `AND` conditions, and once any
//! `AND` condition exists every plain field condition moves into `AND` too.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};
use tracing::debug;

use crate::request::{DataType, FilterItem, FilterOperation, FilterValue, Filters};

/// Build the where document for `filters`
///
/// Returns `{}` when there is nothing to filter on.
pub fn build_where(filters: Option<&Filters>) -> Value {
    let Some(filters) = filters.filter(|f| !f.is_empty()) else {
        debug!("No filters provided");
        return Value::Object(Map::new());
    };

    let mut plain = Map::new();
    let mut and_conditions = Vec::new();

    for (field, items) in filters {
        let (conditions, not_value) = field_conditions(items);

        match (conditions.is_empty(), not_value) {
            (false, Some(not_value)) => {
                and_conditions.push(single(field, Value::Object(conditions)));
                and_conditions.push(single(field, not_condition(not_value)));
            }
            (true, Some(not_value)) => {
                plain.insert(field.clone(), not_condition(not_value));
            }
            (false, None) => {
                plain.insert(field.clone(), Value::Object(conditions));
            }
            (true, None) => {}
        }
    }

    let where_clause = if and_conditions.is_empty() {
        Value::Object(plain)
    } else {
        let mut all: Vec<Value> = plain
            .into_iter()
            .map(|(field, condition)| single(&field, condition))
            .collect();
        all.extend(and_conditions);
        single("AND", Value::Array(all))
    };

    debug!(clause = %where_clause, "Generated where clause");
    where_clause
}

/// Conditions for one field plus the last valid `ne` value
fn field_conditions(items: &[FilterItem]) -> (Map<String, Value>, Option<Value>) {
    let mut conditions = Map::new();
    let mut not_value = None;

    for item in items {
        let Some(value) = coerce_value(&item.value, item.data_type, item.operation) else {
            continue;
        };

        if item.operation == FilterOperation::Ne {
            not_value = Some(value);
        } else {
            conditions.insert(item.operation.operator().to_string(), value);
        }
    }

    (conditions, not_value)
}

/// Coerce a raw value by its declared data type
///
/// `None` means the item is invalid for its operation or type.
pub fn coerce_value(
    value: &FilterValue,
    data_type: DataType,
    operation: FilterOperation,
) -> Option<Value> {
    let shape_ok = match value {
        FilterValue::Text(_) | FilterValue::Number(_) => operation.is_scalar(),
        FilterValue::List(_) => operation.is_array(),
    };
    if !shape_ok {
        return None;
    }

    match (data_type, value) {
        (DataType::Date, FilterValue::Text(text)) => parse_date(text).map(date_value),
        (DataType::Date, FilterValue::Number(n)) => {
            let millis = n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?;
            DateTime::from_timestamp_millis(millis).map(date_value)
        }
        (DataType::String, FilterValue::Text(text)) => Some(Value::String(text.clone())),
        (DataType::Number, FilterValue::Number(n)) => Some(Value::Number(n.clone())),
        (DataType::Array, FilterValue::List(items)) if !items.is_empty() => {
            Some(Value::Array(items.clone()))
        }
        _ => None,
    }
}

fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn date_value(date: DateTime<Utc>) -> Value {
    Value::String(date.to_rfc3339_opts(SecondsFormat::Millis, true))
}

fn not_condition(value: Value) -> Value {
    let mut map = Map::new();
    map.insert("not".to_string(), value);
    Value::Object(map)
}

fn single(field: &str, condition: Value) -> Value {
    let mut map = Map::new();
    map.insert(field.to_string(), condition);
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn filters(value: Value) -> Filters {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_no_filters() {
        assert_eq!(build_where(None), json!({}));
        assert_eq!(build_where(Some(&Filters::new())), json!({}));
    }

    #[test]
    fn test_plain_conditions_combined() {
        let f = filters(json!({
            "age": [
                {"operation": "gte", "value": 18, "dataType": "number"},
                {"operation": "lt", "value": 65, "dataType": "number"}
            ],
            "name": [{"operation": "eq", "value": "ann", "dataType": "string"}]
        }));

        assert_eq!(
            build_where(Some(&f)),
            json!({
                "age": {"gte": 18, "lt": 65},
                "name": {"equals": "ann"}
            })
        );
    }

    #[test]
    fn test_only_ne() {
        let f = filters(json!({
            "status": [{"operation": "ne", "value": "DELETED", "dataType": "string"}]
        }));
        assert_eq!(build_where(Some(&f)), json!({"status": {"not": "DELETED"}}));
    }

    #[test]
    fn test_ne_mixed_moves_everything_into_and() {
        let f = filters(json!({
            "age": [{"operation": "gt", "value": 1, "dataType": "number"}],
            "status": [
                {"operation": "in", "value": ["A", "B"], "dataType": "array"},
                {"operation": "ne", "value": "C", "dataType": "string"}
            ]
        }));

        assert_eq!(
            build_where(Some(&f)),
            json!({
                "AND": [
                    {"age": {"gt": 1}},
                    {"status": {"in": ["A", "B"]}},
                    {"status": {"not": "C"}}
                ]
            })
        );
    }

    #[test]
    fn test_invalid_items_skipped() {
        let f = filters(json!({
            "age": [
                {"operation": "eq", "value": "18", "dataType": "number"},
                {"operation": "in", "value": 3, "dataType": "number"}
            ],
            "tags": [
                {"operation": "in", "value": [], "dataType": "array"},
                {"operation": "eq", "value": ["x"], "dataType": "array"}
            ],
            "name": [{"operation": "eq", "value": "bo", "dataType": "string"}]
        }));

        assert_eq!(build_where(Some(&f)), json!({"name": {"equals": "bo"}}));
    }

    #[test]
    fn test_later_item_overwrites() {
        let f = filters(json!({
            "age": [
                {"operation": "gte", "value": 10, "dataType": "number"},
                {"operation": "gte", "value": 20, "dataType": "number"}
            ]
        }));
        assert_eq!(build_where(Some(&f)), json!({"age": {"gte": 20}}));
    }

    #[test]
    fn test_nin_maps_to_not_in() {
        let f = filters(json!({
            "role": [{"operation": "nin", "value": ["GUEST"], "dataType": "array"}]
        }));
        assert_eq!(build_where(Some(&f)), json!({"role": {"notIn": ["GUEST"]}}));
    }

    #[test]
    fn test_date_coercion() {
        let coerce = |value: FilterValue| {
            coerce_value(&value, DataType::Date, FilterOperation::Gte)
        };

        assert_eq!(
            coerce(FilterValue::Text("2024-03-01".into())),
            Some(json!("2024-03-01T00:00:00.000Z"))
        );
        assert_eq!(
            coerce(FilterValue::Text("2024-03-01T10:30:00+02:00".into())),
            Some(json!("2024-03-01T08:30:00.000Z"))
        );
        assert_eq!(
            coerce(FilterValue::Number(0.into())),
            Some(json!("1970-01-01T00:00:00.000Z"))
        );
        assert_eq!(coerce(FilterValue::Text("yesterday".into())), None);
    }
}
