use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! entity_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Accepts only positive raw ids; everything else is rejected at
            /// the boundary before a manager ever routes on it.
            pub fn from_raw(raw: i64) -> Option<Self> {
                (raw > 0).then_some(Self(raw))
            }

            pub fn value(self) -> i64 {
                self.0
            }

            /// Internal constructor for ids produced by trusted allocators;
            /// clamps to the first valid id instead of failing.
            pub(crate) fn from_positive(raw: i64) -> Self {
                Self(raw.max(1))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

entity_id!(
    /// Stable identity of a player entity.
    PlayerId
);
entity_id!(
    /// Stable identity of a world entity.
    WorldId
);
entity_id!(
    /// Identity of a city owned by a player inside a world.
    CityId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_raw_ids() {
        assert!(PlayerId::from_raw(0).is_none());
        assert!(PlayerId::from_raw(-7).is_none());
        assert_eq!(PlayerId::from_raw(42).map(PlayerId::value), Some(42));
    }

    #[test]
    fn ids_order_by_raw_value() {
        let mut ids = vec![CityId::from_raw(9), CityId::from_raw(3), CityId::from_raw(5)];
        ids.sort();
        let raw: Vec<i64> = ids.into_iter().flatten().map(CityId::value).collect();
        assert_eq!(raw, vec![3, 5, 9]);
    }
}
