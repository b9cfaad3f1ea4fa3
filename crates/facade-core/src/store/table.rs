//! Per-resource keyed record store.

use crate::error::FacadeError;
use indexmap::IndexMap;
use serde_json::Value;
use tracing::trace;

/// Returns the record's `id` if it is present and truthy.
///
/// `null`, `false`, `0` and `""` do not count as ids.
pub fn record_id(record: &Value) -> Option<&Value> {
    record.get("id").filter(|id| is_truthy(id))
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Canonical storage key for an id.
///
/// Object keys serialize in sorted order, so structurally equal ids share a key.
pub fn id_key(id: &Value) -> String {
    id.to_string()
}

/// Id as it appears in an item URL: strings verbatim, anything else as JSON.
pub fn id_segment(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Record table for one resource.
///
/// Deleted records leave a tombstone behind so the key keeps its position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    name: String,
    storage: IndexMap<String, Option<Value>>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            storage: IndexMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Store a record under its id, replacing any record with the same id.
    ///
    /// Re-creating a deleted id revives the tombstoned slot in place.
    pub fn create(&mut self, record: Value) -> Result<(), FacadeError> {
        let id = record_id(&record).ok_or_else(missing_record_id)?;
        let key = id_key(id);
        trace!(table = %self.name, id = %key, "storing record");
        self.storage.insert(key, Some(record));
        Ok(())
    }

    pub fn find(&self, id: &Value) -> Result<&Value, FacadeError> {
        check_lookup_id(id)?;
        self.storage
            .get(&id_key(id))
            .and_then(Option::as_ref)
            .ok_or_else(|| self.not_found(id, ""))
    }

    /// Whether a live record is stored under `id`.
    pub fn contains(&self, id: &Value) -> bool {
        self.storage
            .get(&id_key(id))
            .is_some_and(Option::is_some)
    }

    pub fn find_mut(&mut self, id: &Value) -> Result<&mut Value, FacadeError> {
        check_lookup_id(id)?;
        let missing = self.not_found(id, "");
        self.storage
            .get_mut(&id_key(id))
            .and_then(Option::as_mut)
            .ok_or(missing)
    }

    /// Remove a record, returning it. The slot stays behind as a tombstone.
    pub fn delete(&mut self, id: &Value) -> Result<Value, FacadeError> {
        check_lookup_id(id)?;
        let missing = self.not_found(id, " So can't delete it.");
        let record = self
            .storage
            .get_mut(&id_key(id))
            .and_then(Option::take)
            .ok_or(missing)?;
        trace!(table = %self.name, id = %id_key(id), "deleted record");
        Ok(record)
    }

    /// All live records in insertion order.
    pub fn get_all(&self) -> Vec<Value> {
        self.storage.values().flatten().cloned().collect()
    }

    /// Number of live records.
    pub fn len(&self) -> usize {
        self.storage.values().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn not_found(&self, id: &Value, suffix: &str) -> FacadeError {
        FacadeError::not_found(format!(
            "No item found in {} table with id of {}.{suffix}",
            self.name,
            id_segment(id)
        ))
    }
}

pub(crate) fn missing_record_id() -> FacadeError {
    FacadeError::validation("The resource must have an id property.")
}

fn check_lookup_id(id: &Value) -> Result<(), FacadeError> {
    if is_truthy(id) {
        Ok(())
    } else {
        Err(FacadeError::validation(
            "You must pass in an id to find a record",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use rstest::rstest;
    use serde_json::json;

    fn patients() -> Table {
        let mut table = Table::new("patient");
        table.create(json!({"id": 1, "name": "Joe"})).unwrap();
        table.create(json!({"id": 2, "name": "Jane"})).unwrap();
        table
    }

    #[rstest]
    #[case(json!({"id": 1}), true)]
    #[case(json!({"id": "abc"}), true)]
    #[case(json!({"id": {"org": 1, "n": 2}}), true)]
    #[case(json!({"id": 0}), false)]
    #[case(json!({"id": ""}), false)]
    #[case(json!({"id": null}), false)]
    #[case(json!({"id": false}), false)]
    #[case(json!({"name": "no id"}), false)]
    #[case(json!([1, 2]), false)]
    fn test_record_id(#[case] record: Value, #[case] has_id: bool) {
        assert_eq!(record_id(&record).is_some(), has_id);
    }

    #[rstest]
    #[case(json!(1), "1")]
    #[case(json!("abc"), "abc")]
    #[case(json!({"a": 1}), r#"{"a":1}"#)]
    fn test_id_segment(#[case] id: Value, #[case] expected: &str) {
        assert_eq!(id_segment(&id), expected);
    }

    #[rstest]
    fn test_structural_ids_share_a_key() {
        let a: Value = serde_json::from_str(r#"{"org": 1, "n": 2}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"n": 2, "org": 1}"#).unwrap();
        assert_eq!(id_key(&a), id_key(&b));

        let mut table = Table::new("composite");
        table.create(json!({"id": a, "v": 1})).unwrap();
        assert_eq!(table.find(&b).unwrap()["v"], 1);
    }

    #[rstest]
    fn test_create_and_find() {
        let table = patients();
        assert_eq!(table.find(&json!(1)).unwrap(), &json!({"id": 1, "name": "Joe"}));
        assert_eq!(table.len(), 2);
    }

    #[rstest]
    fn test_create_requires_id() {
        let mut table = Table::new("patient");
        let err = table.create(json!({"name": "nobody"})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().contains("must have an id"));
    }

    #[rstest]
    fn test_create_overwrites_live_id() {
        let mut table = patients();
        table.create(json!({"id": 1, "name": "Joseph"})).unwrap();
        assert_eq!(table.find(&json!(1)).unwrap()["name"], "Joseph");
        assert_eq!(table.len(), 2);
    }

    #[rstest]
    #[case(json!(3))]
    #[case(json!("1"))]
    fn test_find_unknown_id(#[case] id: Value) {
        let err = patients().find(&id).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.to_string().contains("No item found in patient table"));
    }

    #[rstest]
    fn test_find_falsy_id() {
        let err = patients().find(&Value::Null).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[rstest]
    fn test_delete_leaves_others_untouched() {
        let mut table = patients();
        let removed = table.delete(&json!(1)).unwrap();
        assert_eq!(removed["name"], "Joe");

        assert_eq!(table.find(&json!(1)).unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(table.find(&json!(2)).unwrap()["name"], "Jane");
        assert_eq!(table.get_all(), vec![json!({"id": 2, "name": "Jane"})]);
    }

    #[rstest]
    fn test_contains_skips_tombstones() {
        let mut table = patients();
        assert!(table.contains(&json!(1)));
        table.delete(&json!(1)).unwrap();
        assert!(!table.contains(&json!(1)));
        assert!(!table.contains(&json!(3)));
    }

    #[rstest]
    fn test_delete_twice_fails() {
        let mut table = patients();
        table.delete(&json!(2)).unwrap();
        let err = table.delete(&json!(2)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.to_string().contains("can't delete"));
    }

    #[rstest]
    fn test_recreate_after_delete_keeps_position() {
        let mut table = patients();
        table.delete(&json!(1)).unwrap();
        table.create(json!({"id": 1, "name": "Joe again"})).unwrap();
        let names: Vec<Value> = table.get_all().iter().map(|r| r["name"].clone()).collect();
        assert_eq!(names, vec![json!("Joe again"), json!("Jane")]);
    }

    #[rstest]
    fn test_get_all_insertion_order() {
        let mut table = Table::new("ordered");
        for id in [5, 3, 9, 1] {
            table.create(json!({ "id": id })).unwrap();
        }
        let ids: Vec<Value> = table.get_all().iter().map(|r| r["id"].clone()).collect();
        assert_eq!(ids, vec![json!(5), json!(3), json!(9), json!(1)]);
    }

    #[rstest]
    fn test_find_mut_updates_in_place() {
        let mut table = patients();
        table.find_mut(&json!(2)).unwrap()["name"] = json!("New Name");
        assert_eq!(table.find(&json!(2)).unwrap()["name"], "New Name");
    }
}
