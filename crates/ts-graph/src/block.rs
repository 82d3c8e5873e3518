//! The graph's node type.

use ts_core::{BlockKey, GeoPoint, RouteId};

use crate::element::Element;

/// A directed road segment between two junctions.
///
/// `elements` is kept sorted by `position_km`; construct through
/// [`Block::new`] + [`Block::with_elements`] to preserve that.
#[derive(Clone, Debug)]
pub struct Block {
    pub key:           BlockKey,
    pub name:          String,
    pub max_speed_kmh: f64,
    pub length_km:     f64,
    /// Geographic anchor (the block's first node).
    pub anchor:        GeoPoint,
    pub municipality:  Option<String>,
    pub elements:      Vec<Element>,
}

impl Block {
    pub fn new(key: BlockKey, length_km: f64, max_speed_kmh: f64, anchor: GeoPoint) -> Self {
        Self {
            key,
            name: String::new(),
            max_speed_kmh,
            length_km: length_km.max(0.0),
            anchor,
            municipality: None,
            elements: Vec::new(),
        }
    }

    /// Attach elements, sorting them by position and clamping positions into
    /// `[0, length_km]`.
    pub fn with_elements(mut self, mut elements: Vec<Element>) -> Self {
        for e in &mut elements {
            e.position_km = e.position_km.clamp(0.0, self.length_km);
        }
        elements.sort_by(|a, b| a.position_km.total_cmp(&b.position_km));
        self.elements = elements;
        self
    }

    pub fn with_municipality(mut self, municipality: impl Into<String>) -> Self {
        self.municipality = Some(municipality.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// `true` if at least one bus stop or gazelle marker lies on the block.
    #[inline]
    pub fn has_stop(&self) -> bool {
        self.elements.iter().any(|e| e.kind.is_stop())
    }

    /// Number of signs and signals along the block.
    #[inline]
    pub fn traffic_control_count(&self) -> usize {
        self.elements.iter().filter(|e| e.kind.is_traffic_control()).count()
    }

    /// Every line listed on any stop of this block, deduplicated.
    pub fn served_routes(&self) -> Vec<RouteId> {
        let mut out: Vec<RouteId> = self
            .elements
            .iter()
            .filter(|e| e.kind.is_stop())
            .flat_map(|e| e.routes.iter().copied())
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Minutes to traverse the block at `speed_kmh`.
    #[inline]
    pub fn travel_minutes(&self, speed_kmh: f64) -> f64 {
        if speed_kmh <= 0.0 {
            return f64::INFINITY;
        }
        self.length_km / speed_kmh * 60.0
    }
}
