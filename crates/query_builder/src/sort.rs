//! Sort -> orderBy document

use serde_json::{Map, Value};
use tracing::debug;

use crate::request::SortItem;

/// Build the orderBy document
///
/// `None` for no sort keys, an object for one, an array for several.
pub fn build_order_by(sort: Option<&[SortItem]>) -> Option<Value> {
    let sort = sort.filter(|s| !s.is_empty())?;

    let mut keys: Vec<Value> = sort
        .iter()
        .map(|item| {
            let direction = if item.order >= 0.0 { "asc" } else { "desc" };
            let mut map = Map::new();
            map.insert(item.order_by.clone(), Value::from(direction));
            Value::Object(map)
        })
        .collect();

    let order_by = if keys.len() == 1 {
        keys.remove(0)
    } else {
        Value::Array(keys)
    };

    debug!(order_by = %order_by, "Generated sort object");
    Some(order_by)
}
