//! Request body matching for backend expectations.

use serde_json::{Map, Value};

/// Check that every expected key/value pair appears somewhere in `body`.
///
/// Each pair is looked up at the top level first, then searched for
/// recursively through nested object values. Pairs are matched independently,
/// so they may be found at different depths.
pub fn body_contains(body: &Value, expected: &Map<String, Value>) -> bool {
    expected
        .iter()
        .all(|(key, value)| find_pair(body, key, value))
}

fn find_pair(body: &Value, key: &str, expected: &Value) -> bool {
    let Value::Object(map) = body else {
        return false;
    };
    if map
        .get(key)
        .is_some_and(|actual| value_intersects(actual, expected))
    {
        return true;
    }
    map.values().any(|nested| find_pair(nested, key, expected))
}

/// Deep partial comparison: objects match when `subset`'s keys are all present
/// with intersecting values, arrays when each `subset` element intersects some
/// `target` element, anything else on equality.
pub fn value_intersects(target: &Value, subset: &Value) -> bool {
    match (target, subset) {
        (Value::Object(t), Value::Object(s)) => s
            .iter()
            .all(|(k, sv)| t.get(k).is_some_and(|tv| value_intersects(tv, sv))),
        (Value::Array(t), Value::Array(s)) => s
            .iter()
            .all(|sv| t.iter().any(|tv| value_intersects(tv, sv))),
        _ => target == subset,
    }
}

/// Match a raw request body against expected pairs.
///
/// Missing or non-JSON bodies never match a non-empty expectation.
pub fn raw_body_contains(raw: Option<&str>, expected: &Map<String, Value>) -> bool {
    if expected.is_empty() {
        return true;
    }
    raw.and_then(|raw| serde_json::from_str::<Value>(raw).ok())
        .is_some_and(|body| body_contains(&body, expected))
}
