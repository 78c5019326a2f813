//! Entity value model: trackable aggregates, change traces, and versioned
//! snapshots.

pub mod aggregates;
mod player;
mod states;
pub mod trace;
mod world;

pub use aggregates::{ResourceEntity, RoleAttributeEntity, RoleEntity};
pub use player::{PlayerEntity, PlayerField, PlayerSnap, PlayerState};
pub use states::*;
pub use world::{WorldEntity, WorldField, WorldSnap, WorldState};

use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Immutable, versioned, deep-copied view of an entity, suitable for a
/// whole-document upsert.
pub trait EntitySnap: Clone + Send + Sync + 'static {
    fn version(&self) -> u64;
}

/// The contract the durability coordinator needs from an entity: identity,
/// dirtiness, and snapshot capture (which clears the trace).
pub trait PersistEntity: Send + 'static {
    type Id: Copy + Send + Sync + fmt::Display + 'static;
    type Snap: EntitySnap;

    fn entity_id(&self) -> Self::Id;
    fn dirty(&self) -> bool;
    /// Returns a snapshot only when dirty; capture atomically clears every
    /// trace in the aggregate tree.
    fn build_snapshot(&mut self, version: u64) -> Option<Self::Snap>;
}

/// Change records carry values as loose JSON, the same way command payloads
/// travel through the persistence journal.
pub(crate) fn to_change_value<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

/// Generates the full accessor/mutator family for one tracked slice field.
macro_rules! slice_field {
    ($field:ident, $tag:expr, $elem:ty,
     len = $len:ident, at = $at:ident, for_each = $for_each:ident,
     append = $append:ident, set_at = $set_at:ident, update_at = $update_at:ident,
     remove_at = $remove_at:ident, swap_remove_at = $swap_remove_at:ident,
     replace = $replace:ident, clear = $clear:ident) => {
        pub fn $len(&self) -> usize {
            self.$field.len()
        }

        pub fn $at(&self, index: usize) -> Option<&$elem> {
            self.$field.get(index)
        }

        /// Stops early when the callback returns false.
        pub fn $for_each(&self, mut f: impl FnMut(usize, &$elem) -> bool) {
            for (i, v) in self.$field.iter().enumerate() {
                if !f(i, v) {
                    break;
                }
            }
        }

        pub fn $append(&mut self, value: $elem) {
            self.trace
                .record_slice_append($tag, crate::entity::to_change_value(&value));
            self.$field.push(value);
        }

        pub fn $set_at(&mut self, index: usize, value: $elem) -> bool {
            let Some(slot) = self.$field.get_mut(index) else {
                return false;
            };
            if *slot == value {
                return false;
            }
            let encoded = crate::entity::to_change_value(&value);
            *slot = value;
            self.trace.record_slice_set($tag, index, encoded);
            true
        }

        /// No-op when the index is absent; dirty only when the value actually
        /// changed (deep equality).
        pub fn $update_at(&mut self, index: usize, f: impl FnOnce(&mut $elem)) -> bool {
            let Some(slot) = self.$field.get_mut(index) else {
                return false;
            };
            let before = slot.clone();
            f(slot);
            if *slot == before {
                return false;
            }
            let encoded = crate::entity::to_change_value(&*slot);
            self.trace.record_slice_set($tag, index, encoded);
            true
        }

        pub fn $remove_at(&mut self, index: usize) -> Option<$elem> {
            if index >= self.$field.len() {
                return None;
            }
            self.trace.record_slice_remove_at($tag, index);
            Some(self.$field.remove(index))
        }

        pub fn $swap_remove_at(&mut self, index: usize) -> Option<$elem> {
            if index >= self.$field.len() {
                return None;
            }
            self.trace.record_slice_swap_remove_at($tag, index);
            Some(self.$field.swap_remove(index))
        }

        pub fn $replace(&mut self, values: Vec<$elem>) -> bool {
            self.trace.record_full_replace($tag);
            self.$field = values;
            true
        }

        pub fn $clear(&mut self) {
            self.trace.record_full_replace($tag);
            self.$field.clear();
        }
    };
}

pub(crate) use slice_field;
