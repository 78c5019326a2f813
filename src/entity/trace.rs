//! Dirty-change bookkeeping shared by every trackable aggregate.
//!
//! A `Trace` records which top-level fields of an aggregate were touched since
//! the last snapshot, plus per-collection change records for CDC-like
//! consumers. Taking a snapshot drains and clears the trace atomically with
//! respect to the owning actor's mailbox (the only mutation site).

use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Incremental change record for one collection field.
///
/// `full_replace` supersedes everything else; a map key may be present in
/// `map_set` or `map_delete` but never both; slice operations are appended in
/// the order they happened.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectionChange {
    pub full_replace: bool,
    pub map_set: BTreeMap<String, Value>,
    pub map_delete: BTreeSet<String>,
    pub slice_append: Vec<Value>,
    pub slice_set: BTreeMap<usize, Value>,
    pub slice_remove_at: Vec<usize>,
    pub slice_swap_remove_at: Vec<usize>,
}

impl CollectionChange {
    fn set_key(&mut self, key: String, value: Value) {
        self.map_delete.remove(&key);
        self.map_set.insert(key, value);
    }

    fn delete_key(&mut self, key: String) {
        self.map_set.remove(&key);
        self.map_delete.insert(key);
    }

    fn replace_all(&mut self) {
        *self = Self {
            full_replace: true,
            ..Self::default()
        };
    }
}

/// Per-aggregate change trace, generic over the aggregate's field-tag enum.
#[derive(Debug, Clone)]
pub struct Trace<F: Ord + Copy> {
    dirty: bool,
    touched: BTreeSet<F>,
    changes: BTreeMap<F, CollectionChange>,
    dirty_keys: BTreeMap<F, BTreeSet<String>>,
}

impl<F: Ord + Copy> Default for Trace<F> {
    fn default() -> Self {
        Self {
            dirty: false,
            touched: BTreeSet::new(),
            changes: BTreeMap::new(),
            dirty_keys: BTreeMap::new(),
        }
    }
}

impl<F: Ord + Copy> Trace<F> {
    pub fn dirty(&self) -> bool {
        self.dirty
    }

    /// Records a plain field mutation.
    pub fn touch(&mut self, field: F) {
        self.dirty = true;
        self.touched.insert(field);
    }

    pub fn record_map_set(&mut self, field: F, key: String, value: Value) {
        self.change_mut(field).set_key(key, value);
    }

    pub fn record_map_delete(&mut self, field: F, key: String) {
        self.change_mut(field).delete_key(key);
    }

    /// Collapses every prior record for the field into a single full replace.
    pub fn record_full_replace(&mut self, field: F) {
        self.change_mut(field).replace_all();
        self.dirty_keys.remove(&field);
    }

    pub fn record_slice_append(&mut self, field: F, value: Value) {
        self.change_mut(field).slice_append.push(value);
    }

    pub fn record_slice_set(&mut self, field: F, index: usize, value: Value) {
        self.change_mut(field).slice_set.insert(index, value);
    }

    pub fn record_slice_remove_at(&mut self, field: F, index: usize) {
        self.change_mut(field).slice_remove_at.push(index);
    }

    pub fn record_slice_swap_remove_at(&mut self, field: F, index: usize) {
        self.change_mut(field).slice_swap_remove_at.push(index);
    }

    /// Marks one key of a nested-entity map dirty.
    pub fn mark_key_dirty(&mut self, field: F, key: String) {
        self.dirty = true;
        self.touched.insert(field);
        self.dirty_keys.entry(field).or_default().insert(key);
    }

    /// Deleting a nested entity clears its dirty-key mark.
    pub fn clear_key_dirty(&mut self, field: F, key: &str) {
        if let Some(keys) = self.dirty_keys.get_mut(&field) {
            keys.remove(key);
        }
    }

    pub fn touched_fields(&self) -> Vec<F> {
        self.touched.iter().copied().collect()
    }

    pub fn changes(&self) -> &BTreeMap<F, CollectionChange> {
        &self.changes
    }

    pub fn dirty_keys(&self, field: F) -> BTreeSet<String> {
        self.dirty_keys.get(&field).cloned().unwrap_or_default()
    }

    /// Drains the trace for snapshot capture, leaving it clean.
    pub fn drain(&mut self) -> (Vec<F>, BTreeMap<F, CollectionChange>) {
        let touched = self.touched.iter().copied().collect();
        let changes = std::mem::take(&mut self.changes);
        self.touched.clear();
        self.dirty_keys.clear();
        self.dirty = false;
        (touched, changes)
    }

    pub fn clear(&mut self) {
        self.dirty = false;
        self.touched.clear();
        self.changes.clear();
        self.dirty_keys.clear();
    }

    fn change_mut(&mut self, field: F) -> &mut CollectionChange {
        self.dirty = true;
        self.touched.insert(field);
        self.changes.entry(field).or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
    enum Field {
        Items,
        Slots,
    }

    #[test]
    fn map_set_and_delete_are_mutually_exclusive_per_key() {
        let mut trace = Trace::default();
        trace.record_map_set(Field::Items, "7".into(), json!({"lv": 1}));
        trace.record_map_delete(Field::Items, "7".into());
        let change = &trace.changes()[&Field::Items];
        assert!(change.map_set.is_empty());
        assert!(change.map_delete.contains("7"));

        trace.record_map_set(Field::Items, "7".into(), json!({"lv": 2}));
        let change = &trace.changes()[&Field::Items];
        assert!(!change.map_delete.contains("7"));
        assert_eq!(change.map_set["7"], json!({"lv": 2}));
    }

    #[test]
    fn full_replace_collapses_prior_records() {
        let mut trace = Trace::default();
        trace.record_slice_append(Field::Slots, json!(1));
        trace.record_slice_remove_at(Field::Slots, 0);
        trace.record_full_replace(Field::Slots);
        let change = &trace.changes()[&Field::Slots];
        assert!(change.full_replace);
        assert!(change.slice_append.is_empty());
        assert!(change.slice_remove_at.is_empty());
    }

    #[test]
    fn drain_leaves_trace_clean() {
        let mut trace = Trace::default();
        trace.touch(Field::Items);
        trace.mark_key_dirty(Field::Slots, "9".into());
        assert!(trace.dirty());

        let (touched, _) = trace.drain();
        assert_eq!(touched, vec![Field::Items, Field::Slots]);
        assert!(!trace.dirty());
        assert!(trace.dirty_keys(Field::Slots).is_empty());
    }
}
