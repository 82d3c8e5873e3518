//! How a passenger travels along one hop of a route.

use std::fmt;

use crate::RouteId;

/// The means by which a passenger can reach a block.
///
/// A hop annotated with only `Walk` is covered on foot; any `Transit` entry
/// means some bus or gazelle line serves the hop.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TransportMode {
    /// On foot.
    Walk,
    /// Riding the given bus or gazelle line.
    Transit(RouteId),
}

impl TransportMode {
    #[inline]
    pub fn is_walk(self) -> bool {
        matches!(self, TransportMode::Walk)
    }

    /// The transit line, if any.
    #[inline]
    pub fn route(self) -> Option<RouteId> {
        match self {
            TransportMode::Walk       => None,
            TransportMode::Transit(r) => Some(r),
        }
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportMode::Walk       => f.write_str("walk"),
            TransportMode::Transit(r) => write!(f, "transit:{}", r.0),
        }
    }
}
