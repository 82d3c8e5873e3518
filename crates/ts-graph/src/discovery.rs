//! Passenger route discovery on the simplified graph.
//!
//! [`get_routes`] searches from every stop within walking distance of the
//! origin to every stop within walking distance of the destination, then
//! annotates each hop with the modes that can carry the passenger onto it:
//!
//! - the first hop is always reached on foot;
//! - hop `i` gets every line that visits hop `i − 1` and later hop `i`,
//!   narrowed to the lines of hop `i − 1` when any of those continue;
//! - a hop no line covers is walked.
//!
//! A hop whose only mode is `Walk` is a walk hop; anything else means riding.

use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap};

use rustc_hash::FxHashMap;

use ts_core::{AgentRng, BlockId, RouteId, TransportMode};

use crate::graph::Graph;
use crate::pathfinder::{Cost, Path, Pathfinder, SearchQuery};
use crate::{SearchError, SearchResult};

/// One step of a passenger route.
#[derive(Clone, Debug, PartialEq)]
pub struct Hop {
    pub block: BlockId,
    /// Sorted, deduplicated.
    pub modes: Vec<TransportMode>,
}

impl Hop {
    pub fn walk(block: BlockId) -> Self {
        Self { block, modes: vec![TransportMode::Walk] }
    }

    /// `true` when the hop is covered on foot.
    #[inline]
    pub fn is_walk(&self) -> bool {
        self.modes == [TransportMode::Walk]
    }

    #[inline]
    pub fn allows(&self, route: RouteId) -> bool {
        self.modes.contains(&TransportMode::Transit(route))
    }

    pub fn lines(&self) -> impl Iterator<Item = RouteId> + '_ {
        self.modes.iter().filter_map(|m| m.route())
    }
}

/// A candidate route with the pathfinder's estimate (minutes).
#[derive(Clone, Debug, PartialEq)]
pub struct RouteOption {
    pub estimated_minutes: f64,
    pub hops:              Vec<Hop>,
}

/// Stop-bearing blocks reachable from `start` within `radius_km` of
/// accumulated block length, nearest first.  `start` itself counts at
/// distance 0.  Walk-only edges are followed only when `allow_walk`.
pub fn blocks_in_radius(graph: &Graph, start: BlockId, radius_km: f64, allow_walk: bool) -> Vec<BlockId> {
    if !graph.contains(start) {
        return Vec::new();
    }
    let mut dist: FxHashMap<BlockId, f64> = FxHashMap::default();
    let mut heap: BinaryHeap<Reverse<(Cost, BlockId)>> = BinaryHeap::new();
    let mut out = Vec::new();

    dist.insert(start, 0.0);
    heap.push(Reverse((Cost(0.0), start)));

    while let Some(Reverse((Cost(d), block))) = heap.pop() {
        if d > dist.get(&block).copied().unwrap_or(f64::INFINITY) {
            continue;
        }
        if graph.block(block).has_stop() {
            out.push(block);
        }
        let next = d + graph.block(block).length_km;
        if next > radius_km {
            continue;
        }
        for edge in graph.edges(block) {
            if edge.walk_only && !allow_walk {
                continue;
            }
            if next < dist.get(&edge.to).copied().unwrap_or(f64::INFINITY) {
                dist.insert(edge.to, next);
                heap.push(Reverse((Cost(next), edge.to)));
            }
        }
    }
    out
}

/// Candidate routes from `src` to any of `destinations`, cheapest first.
///
/// Requires a simplified graph.  Fails with [`SearchError::NoRoute`] when no
/// candidate start reaches any candidate end.
pub fn get_routes<P: Pathfinder + ?Sized>(
    graph:        &Graph,
    pathfinder:   &P,
    src:          BlockId,
    destinations: &[BlockId],
    radius_km:    f64,
    ability:      f64,
    rng:          &mut AgentRng,
) -> SearchResult<Vec<RouteOption>> {
    if !graph.is_simplified() {
        return Err(SearchError::NotSimplified);
    }
    if !graph.contains(src) {
        return Err(SearchError::UnknownBlock(src));
    }

    let mut starts: BTreeSet<BlockId> = blocks_in_radius(graph, src, radius_km, true).into_iter().collect();
    starts.insert(src);

    let mut ends: BTreeSet<BlockId> = BTreeSet::new();
    for &d in destinations.iter().filter(|&&d| graph.contains(d)) {
        ends.insert(d);
        ends.extend(blocks_in_radius(graph, d, radius_km, true));
    }
    let ends: Vec<BlockId> = ends.into_iter().collect();

    let walk_speed = pathfinder.params().walk_speed_kmh;
    let mut options = Vec::new();
    for &s in &starts {
        let query = SearchQuery::new(s, &ends).allow_walk().ability(ability);
        let Ok(path) = pathfinder.path_search(graph, &query, rng) else {
            continue;
        };
        let mut hops = annotate(graph, &path);
        let mut estimate = path.cost;
        if s != src {
            hops.insert(0, Hop::walk(src));
            estimate += graph.straight_line_km(src, s) / walk_speed * 60.0;
        }
        options.push(RouteOption { estimated_minutes: estimate, hops });
    }

    if options.is_empty() {
        return Err(SearchError::NoRoute { from: src });
    }
    options.sort_by(|a, b| a.estimated_minutes.total_cmp(&b.estimated_minutes));
    Ok(options)
}

/// Tag every hop of `path` with the modes that reach it.
fn annotate(graph: &Graph, path: &Path) -> Vec<Hop> {
    let mut hops: Vec<Hop> = Vec::with_capacity(path.len());
    for (i, &block) in path.blocks.iter().enumerate() {
        if i == 0 {
            hops.push(Hop::walk(block));
            continue;
        }
        let prev_block = path.blocks[i - 1];
        let candidates: Vec<RouteId> = graph
            .routes()
            .iter()
            .enumerate()
            .filter(|(_, r)| r.serves_in_order(prev_block, block))
            .filter_map(|(idx, _)| RouteId::try_from(idx).ok())
            .collect();

        if candidates.is_empty() {
            hops.push(Hop::walk(block));
            continue;
        }
        let prev = &hops[i - 1];
        let continuing: Vec<RouteId> = candidates.iter().copied().filter(|&r| prev.allows(r)).collect();
        let lines = if continuing.is_empty() { candidates } else { continuing };
        hops.push(Hop { block, modes: lines.into_iter().map(TransportMode::Transit).collect() });
    }
    hops
}
