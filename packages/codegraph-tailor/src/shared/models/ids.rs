//! Dense integer ids
//!
//! Ids index directly into the program tables, so lookups are O(1) and
//! ids are cheap to copy into facts, tags and worklists.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! dense_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl $name {
            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }

            #[inline]
            pub fn from_index(index: usize) -> Self {
                Self(index as u32)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

dense_id!(
    /// A statement (unit) in some method body
    PointId,
    "p"
);
dense_id!(MethodId, "m");
dense_id!(ClassId, "c");
dense_id!(
    /// An abstract heap object as reported by the points-to provider
    AllocSiteId,
    "h"
);
