//! Strongly typed identifiers.
//!
//! Dense ids (`AgentId`, `BlockId`, `RouteId`) index directly into arena
//! `Vec`s via `.index()`.  `BlockKey` is the stable, map-derived identity of a
//! block (way id plus ordered node pair) and survives graph simplification,
//! which re-numbers dense `BlockId`s.

use std::fmt;
use std::str::FromStr;

use crate::CoreError;

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub $inner);

        impl $name {
            /// Sentinel meaning "no valid ID".
            pub const INVALID: $name = $name(<$inner>::MAX);

            /// Cast to `usize` for direct use as a `Vec` index.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl Default for $name {
            /// Returns the `INVALID` sentinel so uninitialized IDs are visibly invalid.
            #[inline(always)]
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl From<$name> for usize {
            #[inline(always)]
            fn from(id: $name) -> usize {
                id.0 as usize
            }
        }

        impl TryFrom<usize> for $name {
            type Error = std::num::TryFromIntError;
            fn try_from(n: usize) -> Result<$name, Self::Error> {
                <$inner>::try_from(n).map($name)
            }
        }
    };
}

typed_id! {
    /// Handle of an agent (driver or passenger) in the orchestrator's arenas.
    pub struct AgentId(u32);
}

typed_id! {
    /// Dense index of a block inside one `Graph`.
    pub struct BlockId(u32);
}

typed_id! {
    /// Index of a named bus or gazelle route in a graph's route registry.
    pub struct RouteId(u16);
}

// ── BlockKey ──────────────────────────────────────────────────────────────────

/// Map-level identity of a block: the way it belongs to and the ordered pair
/// of junction nodes it runs between.
///
/// A physically bidirectional road is two blocks whose keys differ only in
/// node order; [`BlockKey::reversed`] yields the counterpart.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlockKey {
    pub way:  i64,
    pub from: i64,
    pub to:   i64,
}

impl BlockKey {
    #[inline]
    pub fn new(way: i64, from: i64, to: i64) -> Self {
        Self { way, from, to }
    }

    /// Key of the same way segment travelled in the opposite direction.
    #[inline]
    pub fn reversed(self) -> Self {
        Self { way: self.way, from: self.to, to: self.from }
    }
}

impl fmt::Display for BlockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.way, self.from, self.to)
    }
}

impl FromStr for BlockKey {
    type Err = CoreError;

    /// Parse the `way:from:to` form produced by `Display`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(':').map(|p| p.trim().parse::<i64>());
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(Ok(way)), Some(Ok(from)), Some(Ok(to)), None) => Ok(BlockKey { way, from, to }),
            _ => Err(CoreError::Parse(format!(
                "invalid block key {s:?}: expected \"way:from:to\""
            ))),
        }
    }
}
