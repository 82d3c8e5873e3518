//! The block graph.
//!
//! # Data layout
//!
//! Blocks live in a dense `Vec` indexed by `BlockId`; the map-level
//! `BlockKey` resolves to a `BlockId` through an `FxHashMap`.  Outgoing edges
//! of each block are a `BTreeSet<Edge>`, so inserting the same
//! `(destination, walk_only)` pair twice is a no-op and iteration order is
//! deterministic.
//!
//! # Spatial index
//!
//! An R-tree (via `rstar`) maps `(lat, lon)` to the nearest block anchor.
//! Used at load time to snap places of interest (fuel stations) to blocks.

use std::collections::{BTreeMap, BTreeSet};

use rstar::{PointDistance, RTree, RTreeObject, AABB};
use rustc_hash::FxHashMap;

use ts_core::{BlockId, BlockKey, GeoPoint, RouteId};

use crate::block::Block;
use crate::{GraphError, GraphResult};

// ── R-tree block entry ────────────────────────────────────────────────────────

/// Entry stored in the R-tree: a `[lat, lon]` anchor with its `BlockId`.
#[derive(Clone)]
struct BlockEntry {
    point: [f64; 2],
    id:    BlockId,
}

impl RTreeObject for BlockEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for BlockEntry {
    /// Squared Euclidean distance in lat/lon space; adequate for nearest-block
    /// queries within one city.
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dlat = self.point[0] - point[0];
        let dlon = self.point[1] - point[1];
        dlat * dlat + dlon * dlon
    }
}

// ── Edge / TransitRoute / Place ───────────────────────────────────────────────

/// A directed connection to `to`.  `walk_only` edges exist for pedestrians
/// (e.g. against a one-way street) and are skipped by vehicles.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct Edge {
    pub to:        BlockId,
    pub walk_only: bool,
}

/// A named bus or gazelle line: the ordered blocks of both legs.
#[derive(Clone, Debug)]
pub struct TransitRoute {
    pub name:     String,
    pub outbound: Vec<BlockId>,
    pub inbound:  Vec<BlockId>,
}

impl TransitRoute {
    /// Leg for trip parity `0` (outbound) or `1` (return).
    #[inline]
    pub fn leg(&self, parity: u8) -> &[BlockId] {
        if parity == 0 { &self.outbound } else { &self.inbound }
    }

    /// `true` if some leg visits `from` and later `to`.
    pub fn serves_in_order(&self, from: BlockId, to: BlockId) -> bool {
        [&self.outbound, &self.inbound].into_iter().any(|leg| {
            leg.iter()
                .position(|&b| b == from)
                .is_some_and(|i| leg[i + 1..].contains(&to))
        })
    }
}

/// A point of interest snapped to a block.
#[derive(Clone, Debug, PartialEq)]
pub struct Place {
    pub kind:  String,
    pub block: BlockId,
}

/// Place kind marking a fuel station.
pub const FUEL_PLACE: &str = "fuel";

// ── Graph ─────────────────────────────────────────────────────────────────────

/// Directed graph of road blocks plus the line registry and places of
/// interest.
///
/// Read-only once a scenario starts; agents borrow it through their context.
pub struct Graph {
    blocks:          Vec<Block>,
    index:           FxHashMap<BlockKey, BlockId>,
    edges:           Vec<BTreeSet<Edge>>,
    by_municipality: BTreeMap<String, Vec<BlockId>>,
    routes:          Vec<TransitRoute>,
    route_index:     FxHashMap<String, RouteId>,
    places:          Vec<Place>,
    total_length_km: f64,
    /// Step-size proxy used to bound multi-goal searches.
    pub(crate) average_block_length_km: f64,
    pub(crate) is_simplified: bool,
    spatial_idx:     RTree<BlockEntry>,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph {
    pub fn new() -> Self {
        Self {
            blocks:                  Vec::new(),
            index:                   FxHashMap::default(),
            edges:                   Vec::new(),
            by_municipality:         BTreeMap::new(),
            routes:                  Vec::new(),
            route_index:             FxHashMap::default(),
            places:                  Vec::new(),
            total_length_km:         0.0,
            average_block_length_km: 0.0,
            is_simplified:           false,
            spatial_idx:             RTree::new(),
        }
    }

    // ── Construction ──────────────────────────────────────────────────────

    /// Insert a block.  Fails if its key is already present.
    pub fn add_block(&mut self, block: Block) -> GraphResult<BlockId> {
        if self.index.contains_key(&block.key) {
            return Err(GraphError::DuplicateBlock(block.key));
        }
        let id = BlockId::try_from(self.blocks.len())
            .map_err(|_| GraphError::MapFile("too many blocks".into()))?;

        self.index.insert(block.key, id);
        if let Some(m) = &block.municipality {
            self.by_municipality.entry(m.clone()).or_default().push(id);
        }
        self.spatial_idx.insert(BlockEntry { point: [block.anchor.lat, block.anchor.lon], id });

        self.total_length_km += block.length_km;
        self.blocks.push(block);
        self.edges.push(BTreeSet::new());
        if !self.is_simplified {
            self.average_block_length_km = self.total_length_km / self.blocks.len() as f64;
        }
        Ok(id)
    }

    /// Union-insert a directed edge.  Inserting an existing edge is a no-op.
    pub fn add_edge(&mut self, src: BlockId, dst: BlockId, walk_only: bool) {
        if let Some(set) = self.edges.get_mut(src.index()) {
            set.insert(Edge { to: dst, walk_only });
        }
    }

    /// Key-based variant of [`add_edge`](Self::add_edge).
    pub fn add_edge_by_key(&mut self, src: BlockKey, dst: BlockKey, walk_only: bool) -> GraphResult<()> {
        let s = self.id_of(src).ok_or(GraphError::UnknownBlock(src))?;
        let d = self.id_of(dst).ok_or(GraphError::UnknownBlock(dst))?;
        self.add_edge(s, d, walk_only);
        Ok(())
    }

    /// Register a line; returns its id.
    pub fn add_route(&mut self, route: TransitRoute) -> GraphResult<RouteId> {
        let id = RouteId::try_from(self.routes.len()).map_err(|_| GraphError::TooManyRoutes)?;
        self.route_index.insert(route.name.clone(), id);
        self.routes.push(route);
        Ok(id)
    }

    pub fn add_place(&mut self, kind: impl Into<String>, block: BlockId) {
        let place = Place { kind: kind.into(), block };
        if !self.places.contains(&place) {
            self.places.push(place);
        }
    }

    // ── Lookup ────────────────────────────────────────────────────────────

    #[inline]
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    #[inline]
    pub fn block(&self, id: BlockId) -> &Block {
        &self.blocks[id.index()]
    }

    #[inline]
    pub fn get(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(id.index())
    }

    #[inline]
    pub fn contains(&self, id: BlockId) -> bool {
        id.index() < self.blocks.len()
    }

    #[inline]
    pub fn id_of(&self, key: BlockKey) -> Option<BlockId> {
        self.index.get(&key).copied()
    }

    #[inline]
    pub fn key_of(&self, id: BlockId) -> BlockKey {
        self.blocks[id.index()].key
    }

    pub fn blocks(&self) -> impl Iterator<Item = (BlockId, &Block)> + '_ {
        self.blocks.iter().enumerate().map(|(i, b)| (BlockId(i as u32), b))
    }

    /// Outgoing edges of `id` in deterministic order.
    #[inline]
    pub fn edges(&self, id: BlockId) -> impl Iterator<Item = Edge> + '_ {
        self.edges[id.index()].iter().copied()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.iter().map(BTreeSet::len).sum()
    }

    /// `true` if `src → dst` exists with the given `walk_only` flag, either
    /// directly or from `src`'s reverse-oriented counterpart.
    ///
    /// A physically two-way street is two blocks with swapped node order; a
    /// turn recorded on one orientation counts for the other.
    pub fn is_connected(&self, src: BlockKey, dst: BlockKey, walk_only: bool) -> bool {
        let Some(d) = self.id_of(dst) else {
            return false;
        };
        let wanted = Edge { to: d, walk_only };
        [src, src.reversed()]
            .into_iter()
            .filter_map(|k| self.id_of(k))
            .any(|s| self.edges[s.index()].contains(&wanted))
    }

    pub fn municipality_blocks(&self, municipality: &str) -> &[BlockId] {
        self.by_municipality.get(municipality).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn municipalities(&self) -> impl Iterator<Item = &str> + '_ {
        self.by_municipality.keys().map(String::as_str)
    }

    // ── Lines ─────────────────────────────────────────────────────────────

    pub fn routes(&self) -> &[TransitRoute] {
        &self.routes
    }

    #[inline]
    pub fn route(&self, id: RouteId) -> Option<&TransitRoute> {
        self.routes.get(id.index())
    }

    pub fn route_id(&self, name: &str) -> Option<RouteId> {
        self.route_index.get(name).copied()
    }

    // ── Places ────────────────────────────────────────────────────────────

    pub fn places(&self) -> &[Place] {
        &self.places
    }

    /// Blocks snapped to a fuel station.
    pub fn gas_stations(&self) -> Vec<BlockId> {
        self.places
            .iter()
            .filter(|p| p.kind == FUEL_PLACE)
            .map(|p| p.block)
            .collect()
    }

    // ── Metrics / flags ───────────────────────────────────────────────────

    #[inline]
    pub fn average_block_length_km(&self) -> f64 {
        self.average_block_length_km
    }

    #[inline]
    pub fn is_simplified(&self) -> bool {
        self.is_simplified
    }

    // ── Spatial queries ───────────────────────────────────────────────────

    /// The block whose anchor is nearest to `pos`; `None` on an empty graph.
    pub fn nearest_block(&self, pos: GeoPoint) -> Option<BlockId> {
        self.spatial_idx.nearest_neighbor(&[pos.lat, pos.lon]).map(|e| e.id)
    }

    /// Straight-line distance between two block anchors, in km.
    #[inline]
    pub fn straight_line_km(&self, a: BlockId, b: BlockId) -> f64 {
        self.blocks[a.index()].anchor.distance_km(self.blocks[b.index()].anchor)
    }
}
