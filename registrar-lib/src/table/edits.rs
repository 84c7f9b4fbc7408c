//! Pending per-cell edits diffed against the pristine rows

use indexmap::IndexMap;

use super::RowStore;
use crate::error::FieldError;
use crate::error::FieldValidationError;
use crate::error::ValidationError;
use crate::model::FieldSchema;
use crate::model::Fields;
use crate::model::ID_FIELD;
use crate::model::Patch;
use crate::model::RowId;
use crate::model::Schema;
use crate::model::Value;

/// Unsent edits, keyed by row id then field key.
///
/// Follows the true-diff policy: a field is only buffered while its value
/// differs from the pristine row after both are coerced by the field's
/// schema. Setting a field back to its original value removes it, and a row
/// whose last edit is removed leaves the buffer entirely.
#[derive(Debug, Clone, Default)]
pub struct EditBuffer {
    rows: IndexMap<RowId, Fields>,
}

impl EditBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an edit. Returns `true` if the field is now pending.
    ///
    /// Values are stored coerced when possible. A value that does not coerce
    /// is kept as entered and reported when the batch is built.
    pub fn set_field(
        &mut self,
        store: &RowStore,
        schema: &Schema,
        id: &RowId,
        key: &str,
        value: Value,
    ) -> Result<bool, FieldError> {
        let row = store.get(id).ok_or_else(|| FieldError::UnknownRow { id: id.to_string() })?;
        if key == ID_FIELD {
            return Err(FieldError::read_only(key));
        }
        let field = schema.require(key)?;
        if !field.editable {
            return Err(FieldError::read_only(key));
        }

        let value = field.coerce(&value).unwrap_or(value);

        if same_value(field, &value, row.value(key)) {
            if let Some(fields) = self.rows.get_mut(id) {
                fields.shift_remove(key);
                if fields.is_empty() {
                    self.rows.shift_remove(id);
                }
            }
            return Ok(false);
        }

        self.rows
            .entry(id.clone())
            .or_default()
            .insert(key.to_string(), value);
        Ok(true)
    }

    /// Changed fields of one row, or `None` if nothing differs.
    pub fn diff(&self, id: &RowId) -> Option<Patch> {
        self.rows
            .get(id)
            .filter(|fields| !fields.is_empty())
            .map(|fields| Patch::new(id.clone(), fields.clone()))
    }

    /// One patch per edited row, in store order.
    ///
    /// Every value is coerced by its field schema. Values that do not coerce,
    /// and required fields edited to blank, fail the whole batch.
    pub fn build_batch(&self, store: &RowStore, schema: &Schema) -> Result<Vec<Patch>, ValidationError> {
        let mut errors = Vec::new();
        let mut batch = Vec::new();

        for id in store.ids() {
            let Some(fields) = self.rows.get(id) else {
                continue;
            };

            let mut changes = Fields::new();
            for (key, value) in fields {
                let coerced = schema.require(key).and_then(|field| {
                    let coerced = field.coerce(value)?;
                    if field.required && coerced.is_null() {
                        return Err(FieldError::missing(key.as_str()));
                    }
                    Ok(coerced)
                });
                match coerced {
                    Ok(v) => {
                        changes.insert(key.clone(), v);
                    }
                    Err(FieldError::Missing { field }) if schema.field(&field).is_some() => {
                        errors.push(FieldValidationError::required(field));
                    }
                    Err(e) => errors.push(e.into()),
                }
            }

            if !changes.is_empty() {
                batch.push(Patch::new(id.clone(), changes));
            }
        }

        ValidationError::check(errors)?;
        Ok(batch)
    }

    /// Buffered value for a cell, if edited.
    pub fn pending_value(&self, id: &RowId, key: &str) -> Option<&Value> {
        self.rows.get(id).and_then(|fields| fields.get(key))
    }

    /// Number of edited fields across all rows.
    pub fn pending_count(&self) -> usize {
        self.rows.values().map(|fields| fields.len()).sum()
    }

    /// Number of rows with at least one edit.
    pub fn pending_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Ids of edited rows, in the order they were first edited.
    pub fn edited_ids(&self) -> impl Iterator<Item = &RowId> {
        self.rows.keys()
    }

    /// Drops the edits of rows that were saved.
    pub fn clear_rows(&mut self, ids: &[RowId]) {
        for id in ids {
            self.rows.shift_remove(id);
        }
    }

    /// Drops all edits of one row.
    pub fn discard(&mut self, id: &RowId) {
        self.rows.shift_remove(id);
    }

    /// Re-checks every edit against a fresh snapshot.
    ///
    /// Edits of rows that vanished are dropped, as are fields whose buffered
    /// value now equals the fetched one.
    pub fn rebase(&mut self, store: &RowStore, schema: &Schema) {
        self.rows.retain(|id, fields| {
            let Some(row) = store.get(id) else {
                return false;
            };
            fields.retain(|key, value| match schema.field(key) {
                Some(field) => !same_value(field, value, row.value(key)),
                None => *value != *row.value(key),
            });
            !fields.is_empty()
        });
    }

    /// Drops the edits a successful update sent.
    ///
    /// A field edited again while the request was in flight keeps its newer
    /// value.
    pub fn clear_sent(&mut self, batch: &[Patch], schema: &Schema) {
        for patch in batch {
            let Some(fields) = self.rows.get_mut(&patch.id) else {
                continue;
            };
            for (key, sent) in &patch.changes {
                let unchanged = match (fields.get(key), schema.field(key)) {
                    (Some(buffered), Some(field)) => same_value(field, buffered, sent),
                    (Some(buffered), None) => buffered == sent,
                    (None, _) => false,
                };
                if unchanged {
                    fields.shift_remove(key);
                }
            }
            if fields.is_empty() {
                self.rows.shift_remove(&patch.id);
            }
        }
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }
}

/// Equality after coercion; values that fail to coerce compare as entered.
fn same_value(field: &FieldSchema, a: &Value, b: &Value) -> bool {
    let a = field.coerce(a).unwrap_or_else(|_| a.clone());
    let b = field.coerce(b).unwrap_or_else(|_| b.clone());
    a == b
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Row;
    use crate::model::SelectOption;

    fn schema() -> Schema {
        Schema::new(vec![
            FieldSchema::number("id", "ID").read_only(),
            FieldSchema::text("name", "Name").required(),
            FieldSchema::number("privilege", "Privilege"),
            FieldSchema::boolean("entrance", "Entrance"),
            FieldSchema::select(
                "level",
                "Level",
                vec![SelectOption::new("Guest", 0), SelectOption::new("Admin", 2)],
            ),
            FieldSchema::text("diploma", "Diploma").read_only(),
        ])
        .unwrap()
    }

    fn store() -> RowStore {
        let mut store = RowStore::new();
        store.replace(vec![
            Row::new(1).set("name", "Anna").set("privilege", 1).set("entrance", false),
            Row::new(5).set("name", "Boris").set("privilege", 2).set("entrance", false),
        ]);
        store
    }

    #[test]
    fn test_setting_back_to_pristine_clears_entry() {
        let (store, schema) = (store(), schema());
        let mut edits = EditBuffer::new();
        let id = RowId::Int(1);

        assert!(edits.set_field(&store, &schema, &id, "name", "Anya".into()).unwrap());
        assert!(edits.diff(&id).is_some());

        assert!(!edits.set_field(&store, &schema, &id, "name", "Anna".into()).unwrap());
        assert!(edits.diff(&id).is_none());
        assert!(edits.is_empty());
    }

    #[test]
    fn test_string_number_equal_to_pristine_is_not_a_change() {
        let (store, schema) = (store(), schema());
        let mut edits = EditBuffer::new();

        let changed = edits
            .set_field(&store, &schema, &RowId::Int(1), "privilege", "1".into())
            .unwrap();
        assert!(!changed);
        assert_eq!(edits.pending_count(), 0);
    }

    #[test]
    fn test_boolean_select_value_is_coerced() {
        let (store, schema) = (store(), schema());
        let mut edits = EditBuffer::new();
        let id = RowId::Int(5);

        edits.set_field(&store, &schema, &id, "entrance", "true".into()).unwrap();

        let patch = edits.diff(&id).unwrap();
        assert_eq!(patch.changes.get("entrance"), Some(&Value::Bool(true)));

        let batch = edits.build_batch(&store, &schema).unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(
            serde_json::to_value(&batch).unwrap(),
            serde_json::json!([{"id": 5, "entrance": true}])
        );
    }

    #[test]
    fn test_batch_skips_unchanged_rows_and_follows_store_order() {
        let (store, schema) = (store(), schema());
        let mut edits = EditBuffer::new();

        edits.set_field(&store, &schema, &RowId::Int(5), "privilege", "0".into()).unwrap();
        edits.set_field(&store, &schema, &RowId::Int(1), "name", "Anya".into()).unwrap();
        edits.set_field(&store, &schema, &RowId::Int(1), "name", "Anna".into()).unwrap();
        edits.set_field(&store, &schema, &RowId::Int(1), "level", "Admin".into()).unwrap();

        let batch = edits.build_batch(&store, &schema).unwrap();
        let ids: Vec<_> = batch.iter().map(|p| p.id.clone()).collect();
        assert_eq!(ids, vec![RowId::Int(1), RowId::Int(5)]);
        assert_eq!(batch[0].changes.len(), 1);
        assert_eq!(batch[0].changes.get("level"), Some(&Value::Int(2)));
        assert_eq!(batch[1].changes.get("privilege"), Some(&Value::Int(0)));
        assert!(batch.iter().all(|p| !p.is_empty()));
    }

    #[test]
    fn test_invalid_values_fail_the_batch() {
        let (store, schema) = (store(), schema());
        let mut edits = EditBuffer::new();

        edits.set_field(&store, &schema, &RowId::Int(1), "privilege", "high".into()).unwrap();
        edits.set_field(&store, &schema, &RowId::Int(5), "name", "".into()).unwrap();

        let err = edits.build_batch(&store, &schema).unwrap_err();
        assert_eq!(err.errors.len(), 2);
        assert_eq!(err.fields(), vec!["privilege", "name"]);
        assert_eq!(edits.pending_count(), 2);
    }

    #[test]
    fn test_read_only_and_unknown_rejected() {
        let (store, schema) = (store(), schema());
        let mut edits = EditBuffer::new();

        let err = edits
            .set_field(&store, &schema, &RowId::Int(1), "diploma", "X".into())
            .unwrap_err();
        assert_eq!(err, FieldError::read_only("diploma"));

        let err = edits
            .set_field(&store, &schema, &RowId::Int(1), "id", 9.into())
            .unwrap_err();
        assert_eq!(err, FieldError::read_only("id"));

        let err = edits
            .set_field(&store, &schema, &RowId::Int(42), "name", "X".into())
            .unwrap_err();
        assert!(matches!(err, FieldError::UnknownRow { .. }));
    }

    #[test]
    fn test_rebase_drops_edits_matching_fresh_rows() {
        let schema = schema();
        let mut store = store();
        let mut edits = EditBuffer::new();
        edits.set_field(&store, &schema, &RowId::Int(1), "name", "Anya".into()).unwrap();
        edits.set_field(&store, &schema, &RowId::Int(1), "privilege", "3".into()).unwrap();
        edits.set_field(&store, &schema, &RowId::Int(5), "name", "Bob".into()).unwrap();

        store.replace(vec![Row::new(1).set("name", "Anya").set("privilege", 1)]);
        edits.rebase(&store, &schema);

        let patch = edits.diff(&RowId::Int(1)).unwrap();
        assert_eq!(patch.changes.len(), 1);
        assert_eq!(patch.changes.get("privilege"), Some(&Value::Int(3)));
        assert!(edits.diff(&RowId::Int(5)).is_none());

        store.replace(vec![Row::new(1).set("name", "Anya").set("privilege", "3")]);
        edits.rebase(&store, &schema);
        assert!(edits.is_empty());
        assert!(edits.build_batch(&store, &schema).unwrap().is_empty());
    }

    #[test]
    fn test_clear_sent_keeps_newer_edits() {
        let (store, schema) = (store(), schema());
        let mut edits = EditBuffer::new();
        let id = RowId::Int(1);
        edits.set_field(&store, &schema, &id, "name", "Anya".into()).unwrap();
        edits.set_field(&store, &schema, &id, "privilege", "3".into()).unwrap();
        let batch = edits.build_batch(&store, &schema).unwrap();

        // Edited again while the update was in flight.
        edits.set_field(&store, &schema, &id, "privilege", "4".into()).unwrap();
        edits.set_field(&store, &schema, &RowId::Int(5), "name", "Bob".into()).unwrap();

        edits.clear_sent(&batch, &schema);

        assert!(edits.pending_value(&id, "name").is_none());
        assert_eq!(edits.pending_value(&id, "privilege"), Some(&Value::Int(4)));
        assert!(edits.pending_value(&RowId::Int(5), "name").is_some());

        let batch = edits.build_batch(&store, &schema).unwrap();
        edits.clear_sent(&batch, &schema);
        assert!(edits.is_empty());
    }

    #[test]
    fn test_clear_and_discard() {
        let (store, schema) = (store(), schema());
        let mut edits = EditBuffer::new();
        edits.set_field(&store, &schema, &RowId::Int(1), "name", "A".into()).unwrap();
        edits.set_field(&store, &schema, &RowId::Int(5), "name", "B".into()).unwrap();
        edits.set_field(&store, &schema, &RowId::Int(5), "privilege", 7.into()).unwrap();
        assert_eq!(edits.pending_count(), 3);
        assert_eq!(edits.pending_rows(), 2);

        edits.discard(&RowId::Int(1));
        assert!(edits.pending_value(&RowId::Int(1), "name").is_none());

        edits.clear_rows(&[RowId::Int(5)]);
        assert!(edits.is_empty());
    }
}
