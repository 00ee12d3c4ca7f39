//! Typed ids for graph nodes and the three dispatch registries.
//!
//! Registries are `BTreeMap`s keyed by id, so ids order and hash.  `NodeId`
//! also indexes the navigation graph's node arrays.

use std::fmt;

/// Declare a `Copy` newtype id over an unsigned integer.
///
/// Each id gets a `MAX`-valued `INVALID` sentinel, `index()` for slice
/// access, and a `Name(n)` display form used in logs.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub $inner);

        impl $name {
            /// Placeholder for "not assigned yet".
            pub const INVALID: $name = $name(<$inner>::MAX);

            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

typed_id! {
    /// Index of a navigation-graph node.
    pub struct NodeId(u32);
}

typed_id! {
    /// Identity of an ambulance in the fleet registry.
    pub struct VehicleId(u32);
}

typed_id! {
    /// Identity of a reported emergency.
    pub struct IncidentId(u32);
}

typed_id! {
    /// Identity of a receiving hospital.
    pub struct HospitalId(u32);
}
