//! Graph simplification: keep only stop-bearing blocks.
//!
//! From every stop block a bounded Dijkstra expansion (priority = length
//! accumulated so far) runs over the full graph.  Reaching another stop
//! block within the radius adds a synthetic edge and stops that branch:
//! the expansion never passes through a stop.  The synthetic edge is
//! `walk_only` when the shortest branch used a walk-only edge.
//!
//! Expansions are independent, so with the `parallel` feature they run on
//! Rayon's pool; results are merged in stop order, keeping output
//! deterministic.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use rustc_hash::FxHashMap;

use ts_core::BlockId;

use crate::graph::{Graph, TransitRoute};
use crate::pathfinder::Cost;

/// Stop blocks reached from one source, and the length walked to find them.
struct Expansion {
    source:      BlockId,
    reached:     Vec<(BlockId, bool)>,
    expanded_km: f64,
}

impl Graph {
    /// Build the coarse graph used for passenger route discovery.
    ///
    /// The result holds clones of every stop-bearing block (same keys), the
    /// synthetic edges described in the module docs, every line restricted
    /// to its stop blocks (route ids unchanged) and the places that sit on
    /// stop blocks.  `average_block_length_km` becomes the total expanded
    /// length divided by the block count.
    pub fn simplify(&self, radius_km: f64) -> Graph {
        let stops: Vec<BlockId> = self
            .blocks()
            .filter(|(_, b)| b.has_stop())
            .map(|(id, _)| id)
            .collect();

        #[cfg(not(feature = "parallel"))]
        let expansions: Vec<Expansion> =
            stops.iter().map(|&s| expand_from(self, s, radius_km)).collect();

        #[cfg(feature = "parallel")]
        let expansions: Vec<Expansion> = {
            use rayon::prelude::*;
            stops.par_iter().map(|&s| expand_from(self, s, radius_km)).collect()
        };

        let mut out = Graph::new();
        out.is_simplified = true;

        let mut remap: Vec<Option<BlockId>> = vec![None; self.block_count()];
        for &s in &stops {
            match out.add_block(self.block(s).clone()) {
                Ok(id) => remap[s.index()] = Some(id),
                Err(e) => log::warn!("simplify: skipping block: {e}"),
            }
        }

        let mut total_expanded = 0.0;
        for exp in &expansions {
            total_expanded += exp.expanded_km;
            let Some(src) = remap[exp.source.index()] else { continue };
            for &(target, walk_only) in &exp.reached {
                if let Some(dst) = remap[target.index()] {
                    out.add_edge(src, dst, walk_only);
                }
            }
        }
        out.average_block_length_km = if out.block_count() > 0 {
            total_expanded / out.block_count() as f64
        } else {
            0.0
        };

        let keep = |leg: &[BlockId]| -> Vec<BlockId> {
            leg.iter().filter_map(|b| remap[b.index()]).collect()
        };
        for r in self.routes() {
            let route = TransitRoute {
                name:     r.name.clone(),
                outbound: keep(&r.outbound),
                inbound:  keep(&r.inbound),
            };
            if let Err(e) = out.add_route(route) {
                log::warn!("simplify: dropping line {:?}: {e}", r.name);
            }
        }

        for p in self.places() {
            if let Some(b) = remap[p.block.index()] {
                out.add_place(p.kind.clone(), b);
            }
        }

        log::debug!(
            "simplified {} blocks to {} (radius {radius_km} km, {} edges)",
            self.block_count(),
            out.block_count(),
            out.edge_count()
        );
        out
    }
}

fn expand_from(graph: &Graph, source: BlockId, radius_km: f64) -> Expansion {
    let mut dist: FxHashMap<BlockId, f64> = FxHashMap::default();
    let mut reached = Vec::new();
    let mut expanded_km = 0.0;

    let mut heap: BinaryHeap<Reverse<(Cost, BlockId, bool)>> = BinaryHeap::new();
    dist.insert(source, 0.0);
    heap.push(Reverse((Cost(0.0), source, false)));

    while let Some(Reverse((Cost(d), block, walked))) = heap.pop() {
        if d > dist.get(&block).copied().unwrap_or(f64::INFINITY) {
            continue;
        }
        if block != source && graph.block(block).has_stop() {
            reached.push((block, walked));
            continue;
        }

        let length = graph.block(block).length_km;
        expanded_km += length;
        let next = d + length;
        if next > radius_km {
            continue;
        }
        for edge in graph.edges(block) {
            if next < dist.get(&edge.to).copied().unwrap_or(f64::INFINITY) {
                dist.insert(edge.to, next);
                heap.push(Reverse((Cost(next), edge.to, walked || edge.walk_only)));
            }
        }
    }

    Expansion { source, reached, expanded_km }
}
