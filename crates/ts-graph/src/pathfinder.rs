//! Pathfinding trait and the default A* implementation.
//!
//! # Pluggability
//!
//! Agents call routing through the [`Pathfinder`] trait, so a scenario can
//! swap in another search without touching the agents.
//!
//! # Cost units
//!
//! Costs are minutes (`f64`).  Entering a block costs its length over the
//! effective speed, plus `traffic_control_penalty` per sign or signal when
//! travelling by vehicle.
//!
//! # Imperfect knowledge
//!
//! The heuristic is the straight-line distance to the nearest goal over the
//! mode's reference speed.  With probability `1 − ability` each evaluation
//! is scaled by `1 + e`, `e ~ U(−(1 − ability), 1 − ability)`, floored at 0.
//! An ability of 1 consumes no randomness.
//!
//! # Bounds
//!
//! | Goals    | Bound                                                          |
//! |----------|----------------------------------------------------------------|
//! | one      | corridor: skip neighbours farther from the goal than the start is, plus `corridor_tolerance_km` |
//! | several  | iteration cap `max(1, iteration_factor × max_goal_km / avg_block_km)` |

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use rustc_hash::{FxHashMap, FxHashSet};

use ts_core::{AgentRng, BlockId};

use crate::graph::{Edge, Graph};
use crate::{SearchError, SearchResult};

// ── Cost ──────────────────────────────────────────────────────────────────────

/// Totally ordered `f64` for heap keys.
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) struct Cost(pub f64);

impl Eq for Cost {}

impl PartialOrd for Cost {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Cost {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

// ── SearchParams ──────────────────────────────────────────────────────────────

/// Tunables shared by every search.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SearchParams {
    /// Multiplier in the multi-goal iteration cap.
    pub iteration_factor:        f64,
    /// Slack (km) of the single-goal corridor.
    pub corridor_tolerance_km:   f64,
    /// Reference vehicle speed for the heuristic.
    pub drive_speed_kmh:         f64,
    /// Pedestrian speed for walk edges and walking searches.
    pub walk_speed_kmh:          f64,
    /// Minutes added per traffic-control element on a driven block.
    pub traffic_control_penalty: f64,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            iteration_factor:        10.0,
            corridor_tolerance_km:   10.0,
            drive_speed_kmh:         50.0,
            walk_speed_kmh:          5.0,
            traffic_control_penalty: 1.0,
        }
    }
}

// ── SearchQuery / Path ────────────────────────────────────────────────────────

/// One search request.  Build with [`SearchQuery::new`] and the chained
/// setters.
#[derive(Clone, Debug)]
pub struct SearchQuery<'a> {
    pub start:      BlockId,
    pub goals:      &'a [BlockId],
    /// Blocks the search must not enter.
    pub blocked:    &'a [BlockId],
    /// In `[0, 1]`; 1 means perfect knowledge.
    pub ability:    f64,
    /// Permit walk-only edges.
    pub allow_walk: bool,
    /// Travel entirely on foot (implies `allow_walk`).
    pub walk_only:  bool,
}

impl<'a> SearchQuery<'a> {
    pub fn new(start: BlockId, goals: &'a [BlockId]) -> Self {
        Self {
            start,
            goals,
            blocked: &[],
            ability: 1.0,
            allow_walk: false,
            walk_only: false,
        }
    }

    pub fn blocked(mut self, blocked: &'a [BlockId]) -> Self {
        self.blocked = blocked;
        self
    }

    pub fn ability(mut self, ability: f64) -> Self {
        self.ability = ability;
        self
    }

    pub fn allow_walk(mut self) -> Self {
        self.allow_walk = true;
        self
    }

    pub fn walking(mut self) -> Self {
        self.allow_walk = true;
        self.walk_only = true;
        self
    }
}

/// A found path: blocks from start to the reached goal, inclusive.
#[derive(Clone, Debug, PartialEq)]
pub struct Path {
    /// Estimated minutes (the start block itself costs nothing).
    pub cost:   f64,
    pub blocks: Vec<BlockId>,
}

impl Path {
    pub fn goal(&self) -> Option<BlockId> {
        self.blocks.last().copied()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

// ── Pathfinder trait ──────────────────────────────────────────────────────────

/// Pluggable search engine.
///
/// `rng` is the calling agent's own stream, so heuristic noise stays
/// reproducible per agent.
pub trait Pathfinder: Send + Sync {
    fn path_search(
        &self,
        graph: &Graph,
        query: &SearchQuery<'_>,
        rng:   &mut AgentRng,
    ) -> SearchResult<Path>;

    fn params(&self) -> &SearchParams;
}

// ── AStarPathfinder ───────────────────────────────────────────────────────────

/// A* over the block graph; see the module docs for cost and bounds.
#[derive(Clone, Debug, Default)]
pub struct AStarPathfinder {
    pub params: SearchParams,
}

impl AStarPathfinder {
    pub fn new(params: SearchParams) -> Self {
        Self { params }
    }
}

impl Pathfinder for AStarPathfinder {
    fn path_search(
        &self,
        graph: &Graph,
        query: &SearchQuery<'_>,
        rng:   &mut AgentRng,
    ) -> SearchResult<Path> {
        a_star(&self.params, graph, query, rng)
    }

    fn params(&self) -> &SearchParams {
        &self.params
    }
}

// ── A* internals ──────────────────────────────────────────────────────────────

/// Minutes to enter `to` over `edge`.
fn step_cost(params: &SearchParams, graph: &Graph, edge: Edge, walk_only: bool) -> f64 {
    let block = graph.block(edge.to);
    if walk_only || edge.walk_only {
        return block.travel_minutes(params.walk_speed_kmh);
    }
    let speed = if block.max_speed_kmh > 0.0 { block.max_speed_kmh } else { params.drive_speed_kmh };
    block.travel_minutes(speed) + params.traffic_control_penalty * block.traffic_control_count() as f64
}

fn iteration_cap(params: &SearchParams, graph: &Graph, start: BlockId, goals: &[BlockId]) -> usize {
    let max_goal_km = goals
        .iter()
        .map(|&g| graph.straight_line_km(start, g))
        .fold(0.0_f64, f64::max);
    let avg = graph.average_block_length_km();
    let cap = if avg > 0.0 {
        (params.iteration_factor * max_goal_km / avg).ceil()
    } else {
        params.iteration_factor * graph.block_count() as f64
    };
    (cap as usize).max(1)
}

fn a_star(
    params: &SearchParams,
    graph:  &Graph,
    q:      &SearchQuery<'_>,
    rng:    &mut AgentRng,
) -> SearchResult<Path> {
    if !graph.contains(q.start) {
        return Err(SearchError::UnknownBlock(q.start));
    }
    let goals: Vec<BlockId> = q.goals.iter().copied().filter(|&g| graph.contains(g)).collect();
    if goals.is_empty() {
        return Err(SearchError::NoRoute { from: q.start });
    }
    if goals.contains(&q.start) {
        return Ok(Path { cost: 0.0, blocks: vec![q.start] });
    }

    let goal_set:    FxHashSet<BlockId> = goals.iter().copied().collect();
    let blocked_set: FxHashSet<BlockId> = q.blocked.iter().copied().collect();

    let ref_speed = if q.walk_only { params.walk_speed_kmh } else { params.drive_speed_kmh };
    let error_scale = (1.0 - q.ability).clamp(0.0, 1.0);

    let heuristic = |b: BlockId, rng: &mut AgentRng| -> f64 {
        let km = goals
            .iter()
            .map(|&g| graph.straight_line_km(b, g))
            .fold(f64::INFINITY, f64::min);
        let mut h = km / ref_speed * 60.0;
        if error_scale > 0.0 && rng.gen_bool(error_scale) {
            h *= 1.0 + rng.uniform(-error_scale, error_scale);
        }
        h.max(0.0)
    };

    // Single goal: corridor.  Several goals: iteration cap.
    let single = goals.len() == 1;
    let corridor_km = graph.straight_line_km(q.start, goals[0]) + params.corridor_tolerance_km;
    let cap = (!single).then(|| iteration_cap(params, graph, q.start, &goals));

    let mut g_score:   FxHashMap<BlockId, f64>     = FxHashMap::default();
    let mut came_from: FxHashMap<BlockId, BlockId> = FxHashMap::default();
    let mut closed:    FxHashSet<BlockId>          = FxHashSet::default();

    // Secondary key BlockId gives deterministic tie-breaking.
    let mut open: BinaryHeap<Reverse<(Cost, BlockId)>> = BinaryHeap::new();
    g_score.insert(q.start, 0.0);
    open.push(Reverse((Cost(heuristic(q.start, rng)), q.start)));

    let mut iterations = 0usize;
    while let Some(Reverse((_, current))) = open.pop() {
        if !closed.insert(current) {
            continue;
        }
        let g_cur = g_score.get(&current).copied().unwrap_or(f64::INFINITY);

        if goal_set.contains(&current) {
            return Ok(Path { cost: g_cur, blocks: reconstruct(&came_from, current) });
        }

        iterations += 1;
        if let Some(cap) = cap {
            if iterations > cap {
                return Err(SearchError::IterationCapReached { cap });
            }
        }

        for edge in graph.edges(current) {
            if edge.walk_only && !q.allow_walk && !q.walk_only {
                continue;
            }
            let nb = edge.to;
            if closed.contains(&nb) || blocked_set.contains(&nb) {
                continue;
            }
            if single && graph.straight_line_km(nb, goals[0]) > corridor_km {
                continue;
            }
            let tentative = g_cur + step_cost(params, graph, edge, q.walk_only);
            if tentative < g_score.get(&nb).copied().unwrap_or(f64::INFINITY) {
                g_score.insert(nb, tentative);
                came_from.insert(nb, current);
                let f = tentative + heuristic(nb, rng);
                open.push(Reverse((Cost(f), nb)));
            }
        }
    }

    Err(SearchError::NoRoute { from: q.start })
}

fn reconstruct(came_from: &FxHashMap<BlockId, BlockId>, goal: BlockId) -> Vec<BlockId> {
    let mut blocks = vec![goal];
    let mut cur = goal;
    while let Some(&prev) = came_from.get(&cur) {
        blocks.push(prev);
        cur = prev;
    }
    blocks.reverse();
    blocks
}
