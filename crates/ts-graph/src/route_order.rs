//! Assembling a line's blocks into one directed sequence.
//!
//! A route relation lists its ways in travel order, but each way's blocks
//! are stored in the way's own node order, which may run against the
//! direction of travel.  [`order_route`] picks an orientation per group by
//! testing connectivity against the tail built so far, and walks
//! roundabouts from the entry block around to the block that leads into the
//! next group.

use ts_core::{BlockId, BlockKey};

use crate::graph::Graph;
use crate::{GraphError, GraphResult};

/// Blocks of one way belonging to a route, in the way's node order.
#[derive(Clone, Debug, PartialEq)]
pub struct WayGroup {
    pub way:        i64,
    pub blocks:     Vec<BlockKey>,
    pub roundabout: bool,
}

impl WayGroup {
    pub fn new(way: i64, blocks: Vec<BlockKey>) -> Self {
        Self { way, blocks, roundabout: false }
    }

    pub fn roundabout(way: i64, blocks: Vec<BlockKey>) -> Self {
        Self { way, blocks, roundabout: true }
    }

    /// The group travelled backwards: reversed order, reversed keys.
    fn reversed(&self) -> Vec<BlockKey> {
        self.blocks.iter().rev().map(|k| k.reversed()).collect()
    }
}

/// Order the way groups of line `name` into a connected block sequence.
///
/// `via_replacements` lists ways whose connection is known to be broken by
/// a via-restriction in the source data; a gap in front of such a way is
/// accepted with a warning instead of failing.
pub fn order_route(
    graph:            &Graph,
    name:             &str,
    groups:           &[WayGroup],
    via_replacements: &[i64],
) -> GraphResult<Vec<BlockId>> {
    let mut seq: Vec<BlockKey> = Vec::new();

    for (gi, group) in groups.iter().enumerate() {
        if group.blocks.is_empty() {
            continue;
        }
        let next = groups[gi + 1..].iter().find(|g| !g.blocks.is_empty());

        if group.roundabout {
            let exit = next.and_then(|n| roundabout_exit(graph, group, n));
            let entry = match seq.last() {
                None => Some(0),
                Some(&tail) => group.blocks.iter().position(|&b| graph.is_connected(tail, b, false)),
            };
            let Some(entry) = entry else {
                gap(name, group, seq.last().copied(), via_replacements)?;
                seq.extend(group.blocks.iter().copied());
                continue;
            };
            let n = group.blocks.len();
            let stop = exit.unwrap_or((entry + n - 1) % n);
            let mut i = entry;
            loop {
                seq.push(group.blocks[i]);
                if i == stop {
                    break;
                }
                i = (i + 1) % n;
            }
            continue;
        }

        let forward = group.blocks.clone();
        let backward = group.reversed();
        let backward_ok = backward.iter().all(|&k| graph.id_of(k).is_some());

        let chosen = match seq.last() {
            Some(&tail) => {
                if graph.is_connected(tail, forward[0], false) {
                    forward
                } else if backward_ok && graph.is_connected(tail, backward[0], false) {
                    backward
                } else {
                    gap(name, group, Some(tail), via_replacements)?;
                    forward
                }
            }
            // First group: orient towards the next group.
            None => match next {
                Some(n) if backward_ok && !leads_into(graph, &forward, n) && leads_into(graph, &backward, n) => backward,
                _ => forward,
            },
        };
        seq.extend(chosen);
    }

    if seq.is_empty() {
        return Err(GraphError::EmptyRoute(name.to_string()));
    }
    seq.into_iter()
        .map(|k| graph.id_of(k).ok_or(GraphError::UnknownBlock(k)))
        .collect()
}

/// Does the sequence's last block connect to either end of `next`?
fn leads_into(graph: &Graph, seq: &[BlockKey], next: &WayGroup) -> bool {
    let Some(&tail) = seq.last() else { return false };
    let heads = [next.blocks.first().copied(), next.reversed().first().copied()];
    heads.into_iter().flatten().any(|h| graph.is_connected(tail, h, false))
}

/// Index of the roundabout block that leads into `next`.
fn roundabout_exit(graph: &Graph, roundabout: &WayGroup, next: &WayGroup) -> Option<usize> {
    roundabout
        .blocks
        .iter()
        .position(|&b| leads_into(graph, &[b], next))
}

fn gap(name: &str, group: &WayGroup, tail: Option<BlockKey>, via_replacements: &[i64]) -> GraphResult<()> {
    let at = tail.unwrap_or(group.blocks[0]);
    if via_replacements.contains(&group.way) {
        log::warn!("route {name:?}: accepting known gap after {at} (way {})", group.way);
        return Ok(());
    }
    Err(GraphError::RouteNotConnected { route: name.to_string(), at })
}
