//! Unit tests for ts-graph.
//!
//! All tests use hand-crafted graphs.  Blocks sit along a meridian about
//! 1 km apart so straight-line heuristics match block lengths.

#[cfg(test)]
mod helpers {
    use ts_core::{BlockId, BlockKey, GeoPoint};

    use crate::{Block, Element, ElementKind, Graph};

    /// ~1 km of latitude.
    pub const KM_DEG: f64 = 1.0 / 111.19;

    pub fn anchor(i: usize) -> GeoPoint {
        GeoPoint::new(23.0 + i as f64 * KM_DEG, -82.4)
    }

    pub fn block(way: i64, from: i64, to: i64, at: usize) -> Block {
        Block::new(BlockKey::new(way, from, to), 1.0, 60.0, anchor(at))
    }

    pub fn stop_block(way: i64, from: i64, to: i64, at: usize) -> Block {
        block(way, from, to, at).with_elements(vec![Element::new(ElementKind::BusStop, 0.5)])
    }

    /// `n` 1-km blocks of way 1 chained `0 → 1 → … → n-1`; blocks listed in
    /// `stops` carry a bus stop.
    pub fn line_graph(n: usize, stops: &[usize]) -> (Graph, Vec<BlockId>) {
        let mut g = Graph::new();
        let ids: Vec<BlockId> = (0..n)
            .map(|i| {
                let b = if stops.contains(&i) {
                    stop_block(1, i as i64, i as i64 + 1, i)
                } else {
                    block(1, i as i64, i as i64 + 1, i)
                };
                g.add_block(b).unwrap()
            })
            .collect();
        for w in ids.windows(2) {
            g.add_edge(w[0], w[1], false);
        }
        (g, ids)
    }
}

// ── Graph structure ───────────────────────────────────────────────────────────

#[cfg(test)]
mod graph {
    use ts_core::{BlockKey, GeoPoint};

    use super::helpers::*;
    use crate::{Graph, GraphError};

    #[test]
    fn duplicate_block_is_rejected() {
        let mut g = Graph::new();
        g.add_block(block(1, 1, 2, 0)).unwrap();
        let err = g.add_block(block(1, 1, 2, 1)).unwrap_err();
        assert!(matches!(err, GraphError::DuplicateBlock(k) if k == BlockKey::new(1, 1, 2)));
        assert_eq!(g.block_count(), 1);
    }

    #[test]
    fn add_edge_is_idempotent() {
        let (mut g, ids) = line_graph(2, &[]);
        assert_eq!(g.edge_count(), 1);
        g.add_edge(ids[0], ids[1], false);
        assert_eq!(g.edge_count(), 1);
        g.add_edge(ids[0], ids[1], true);
        assert_eq!(g.edge_count(), 2);
    }

    #[test]
    fn connected_through_reverse_counterpart() {
        let mut g = Graph::new();
        let _a = g.add_block(block(1, 1, 2, 0)).unwrap();
        let a_rev = g.add_block(block(1, 2, 1, 0)).unwrap();
        let b = g.add_block(block(2, 2, 3, 1)).unwrap();
        g.add_edge(a_rev, b, false);

        assert!(g.is_connected(BlockKey::new(1, 2, 1), BlockKey::new(2, 2, 3), false));
        assert!(g.is_connected(BlockKey::new(1, 1, 2), BlockKey::new(2, 2, 3), false));
        assert!(!g.is_connected(BlockKey::new(1, 1, 2), BlockKey::new(2, 2, 3), true));
        assert!(!g.is_connected(BlockKey::new(2, 2, 3), BlockKey::new(1, 1, 2), false));
    }

    #[test]
    fn average_length_tracks_blocks() {
        let mut g = Graph::new();
        g.add_block(block(1, 1, 2, 0)).unwrap();
        let mut long = block(1, 2, 3, 1);
        long.length_km = 3.0;
        g.add_block(long).unwrap();
        assert!((g.average_block_length_km() - 2.0).abs() < 1e-12);
        assert!(!g.is_simplified());
    }

    #[test]
    fn municipality_index_and_snapping() {
        let mut g = Graph::new();
        let a = g.add_block(block(1, 1, 2, 0).with_municipality("playa")).unwrap();
        let b = g.add_block(block(1, 2, 3, 5).with_municipality("cerro")).unwrap();
        assert_eq!(g.municipality_blocks("playa"), &[a]);
        assert!(g.municipality_blocks("nowhere").is_empty());
        assert_eq!(g.nearest_block(anchor(4)), Some(b));
        assert_eq!(Graph::new().nearest_block(GeoPoint::default()), None);
    }

    #[test]
    fn elements_sorted_and_clamped() {
        use crate::{Element, ElementKind};
        let b = block(1, 1, 2, 0).with_elements(vec![
            Element::new(ElementKind::TrafficLight, 0.9),
            Element::new(ElementKind::BusStop, 0.1),
            Element::new(ElementKind::Stop, 7.0),
        ]);
        let pos: Vec<f64> = b.elements.iter().map(|e| e.position_km).collect();
        assert_eq!(pos, vec![0.1, 0.9, 1.0]);
        assert!(b.has_stop());
        assert_eq!(b.traffic_control_count(), 2);
    }
}

// ── Path search ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod search {
    use ts_core::{AgentId, AgentRng, BlockId};

    use super::helpers::*;
    use crate::{AStarPathfinder, Element, ElementKind, Graph, Pathfinder, SearchError, SearchQuery};

    fn rng() -> AgentRng {
        AgentRng::new(7, AgentId(0))
    }

    #[test]
    fn finds_line_path() {
        let (g, ids) = line_graph(5, &[]);
        let pf = AStarPathfinder::default();
        let path = pf.path_search(&g, &SearchQuery::new(ids[0], &[ids[4]]), &mut rng()).unwrap();
        assert_eq!(path.blocks, ids);
        // 4 blocks of 1 km at 60 km/h.
        assert!((path.cost - 4.0).abs() < 1e-9, "cost {}", path.cost);
    }

    #[test]
    fn start_in_goals_is_trivial() {
        let (g, ids) = line_graph(3, &[]);
        let path = AStarPathfinder::default()
            .path_search(&g, &SearchQuery::new(ids[1], &[ids[0], ids[1]]), &mut rng())
            .unwrap();
        assert_eq!(path.blocks, vec![ids[1]]);
        assert_eq!(path.cost, 0.0);
    }

    #[test]
    fn no_path_returns_no_route() {
        let (g, ids) = line_graph(5, &[]);
        let res = AStarPathfinder::default().path_search(&g, &SearchQuery::new(ids[4], &[ids[0]]), &mut rng());
        assert_eq!(res, Err(SearchError::NoRoute { from: ids[4] }));
    }

    /// A 40-block ring plus two isolated goal blocks next to the start.
    fn ring_with_unreachable_goals() -> (Graph, Vec<BlockId>, Vec<BlockId>) {
        let (mut g, ids) = line_graph(40, &[]);
        g.add_edge(ids[39], ids[0], false);
        let goals = vec![
            g.add_block(block(9, 1, 2, 1)).unwrap(),
            g.add_block(block(9, 2, 3, 1)).unwrap(),
        ];
        (g, ids, goals)
    }

    #[test]
    fn multi_goal_search_is_capped() {
        let (g, ids, goals) = ring_with_unreachable_goals();
        let res = AStarPathfinder::default().path_search(&g, &SearchQuery::new(ids[0], &goals), &mut rng());
        assert!(matches!(res, Err(SearchError::IterationCapReached { .. })), "{res:?}");
    }

    #[test]
    fn single_goal_search_terminates_without_route() {
        let (g, ids, goals) = ring_with_unreachable_goals();
        let res = AStarPathfinder::default().path_search(&g, &SearchQuery::new(ids[0], &goals[..1]), &mut rng());
        assert_eq!(res, Err(SearchError::NoRoute { from: ids[0] }));
    }

    /// 0 → {1, 2} → 3, with block 2 three times as long as block 1.
    fn diamond() -> (Graph, [BlockId; 4]) {
        let mut g = Graph::new();
        let b0 = g.add_block(block(1, 0, 1, 0)).unwrap();
        let b1 = g.add_block(block(2, 1, 2, 1)).unwrap();
        let mut slow = block(3, 1, 3, 1);
        slow.length_km = 3.0;
        let b2 = g.add_block(slow).unwrap();
        let b3 = g.add_block(block(4, 2, 4, 2)).unwrap();
        g.add_edge(b0, b1, false);
        g.add_edge(b0, b2, false);
        g.add_edge(b1, b3, false);
        g.add_edge(b2, b3, false);
        (g, [b0, b1, b2, b3])
    }

    #[test]
    fn blocked_blocks_are_avoided() {
        let (g, [b0, b1, b2, b3]) = diamond();
        let pf = AStarPathfinder::default();
        let free = pf.path_search(&g, &SearchQuery::new(b0, &[b3]), &mut rng()).unwrap();
        assert_eq!(free.blocks, vec![b0, b1, b3]);
        let blocked = [b1];
        let detour = pf
            .path_search(&g, &SearchQuery::new(b0, &[b3]).blocked(&blocked), &mut rng())
            .unwrap();
        assert_eq!(detour.blocks, vec![b0, b2, b3]);
    }

    #[test]
    fn traffic_control_adds_penalty() {
        let mut g = Graph::new();
        let a = g.add_block(block(1, 0, 1, 0)).unwrap();
        let b = g.add_block(
            block(1, 1, 2, 1).with_elements(vec![Element::new(ElementKind::TrafficLight, 0.5)]),
        ).unwrap();
        g.add_edge(a, b, false);
        let path = AStarPathfinder::default().path_search(&g, &SearchQuery::new(a, &[b]), &mut rng()).unwrap();
        assert!((path.cost - 2.0).abs() < 1e-9, "1 min driving + 1 min signal, got {}", path.cost);
    }

    #[test]
    fn walk_only_edges_need_permission() {
        let mut g = Graph::new();
        let a = g.add_block(block(1, 0, 1, 0)).unwrap();
        let b = g.add_block(block(1, 1, 2, 1)).unwrap();
        g.add_edge(a, b, true);
        let pf = AStarPathfinder::default();
        assert!(pf.path_search(&g, &SearchQuery::new(a, &[b]), &mut rng()).is_err());
        let walked = pf.path_search(&g, &SearchQuery::new(a, &[b]).allow_walk(), &mut rng()).unwrap();
        // 1 km at 5 km/h.
        assert!((walked.cost - 12.0).abs() < 1e-9);
        let on_foot = pf.path_search(&g, &SearchQuery::new(a, &[b]).walking(), &mut rng()).unwrap();
        assert_eq!(on_foot.blocks, vec![a, b]);
    }

    #[test]
    fn imperfect_ability_still_finds_a_path() {
        let (g, ids) = diamond();
        let pf = AStarPathfinder::default();
        for seed in 0..20 {
            let mut r = AgentRng::new(seed, AgentId(1));
            let path = pf
                .path_search(&g, &SearchQuery::new(ids[0], &[ids[3]]).ability(0.5), &mut r)
                .unwrap();
            assert_eq!(path.goal(), Some(ids[3]));
        }
    }
}

// ── Simplification ────────────────────────────────────────────────────────────

#[cfg(test)]
mod simplify {
    use ts_core::BlockKey;

    use super::helpers::*;
    use crate::TransitRoute;

    #[test]
    fn five_block_line_collapses_to_one_edge() {
        let (g, _) = line_graph(5, &[0, 4]);
        let s = g.simplify(10.0);
        assert!(s.is_simplified());
        assert_eq!(s.block_count(), 2);
        assert_eq!(s.edge_count(), 1);

        let first = s.id_of(BlockKey::new(1, 0, 1)).unwrap();
        let last = s.id_of(BlockKey::new(1, 4, 5)).unwrap();
        assert!(s.is_connected(BlockKey::new(1, 0, 1), BlockKey::new(1, 4, 5), false));
        assert_eq!(s.edges(first).map(|e| e.to).collect::<Vec<_>>(), vec![last]);
        // Expanded 4 km from the first stop, 1 km from the last.
        assert!((s.average_block_length_km() - 2.5).abs() < 1e-9);
        assert!(s.blocks().all(|(_, b)| b.has_stop()));
    }

    #[test]
    fn radius_bounds_expansion() {
        let (g, _) = line_graph(5, &[0, 4]);
        let s = g.simplify(2.0);
        assert_eq!(s.block_count(), 2);
        assert_eq!(s.edge_count(), 0);
    }

    #[test]
    fn expansion_stops_at_intermediate_stop() {
        let (g, _) = line_graph(5, &[0, 2, 4]);
        let s = g.simplify(10.0);
        assert_eq!(s.edge_count(), 2);
        assert!(s.is_connected(BlockKey::new(1, 0, 1), BlockKey::new(1, 2, 3), false));
        assert!(s.is_connected(BlockKey::new(1, 2, 3), BlockKey::new(1, 4, 5), false));
        assert!(!s.is_connected(BlockKey::new(1, 0, 1), BlockKey::new(1, 4, 5), false));
    }

    #[test]
    fn walk_only_branch_marks_edge() {
        let (mut g, ids) = line_graph(2, &[0]);
        let end = g.add_block(stop_block(1, 2, 3, 2)).unwrap();
        g.add_edge(ids[1], end, true);
        let s = g.simplify(10.0);
        assert!(s.is_connected(BlockKey::new(1, 0, 1), BlockKey::new(1, 2, 3), true));
        assert!(!s.is_connected(BlockKey::new(1, 0, 1), BlockKey::new(1, 2, 3), false));
    }

    #[test]
    fn lines_keep_ids_and_only_stop_blocks() {
        let (mut g, ids) = line_graph(5, &[0, 2, 4]);
        g.add_route(TransitRoute { name: "A".into(), outbound: ids.clone(), inbound: vec![] }).unwrap();
        let s = g.simplify(10.0);
        let line = s.route(s.route_id("A").unwrap()).unwrap();
        assert_eq!(s.route_id("A"), g.route_id("A"));
        let keys: Vec<BlockKey> = line.outbound.iter().map(|&b| s.key_of(b)).collect();
        assert_eq!(keys, vec![BlockKey::new(1, 0, 1), BlockKey::new(1, 2, 3), BlockKey::new(1, 4, 5)]);
    }
}

// ── Route discovery ───────────────────────────────────────────────────────────

#[cfg(test)]
mod discovery {
    use ts_core::{AgentId, AgentRng, RouteId, TransportMode};

    use super::helpers::*;
    use crate::{blocks_in_radius, get_routes, AStarPathfinder, SearchError, TransitRoute};

    #[test]
    fn radius_collects_stop_blocks() {
        let (g, ids) = line_graph(5, &[0, 2, 4]);
        assert_eq!(blocks_in_radius(&g, ids[0], 2.0, false), vec![ids[0], ids[2]]);
        assert_eq!(blocks_in_radius(&g, ids[0], 0.5, false), vec![ids[0]]);
        assert_eq!(blocks_in_radius(&g, ids[1], 10.0, false), vec![ids[2], ids[4]]);
    }

    #[test]
    fn get_routes_requires_simplified_graph() {
        let (g, ids) = line_graph(3, &[0, 2]);
        let mut rng = AgentRng::new(1, AgentId(0));
        let res = get_routes(&g, &AStarPathfinder::default(), ids[0], &[ids[2]], 0.5, 1.0, &mut rng);
        assert_eq!(res, Err(SearchError::NotSimplified));
    }

    #[test]
    fn hops_are_annotated_with_lines() {
        let (mut g, ids) = line_graph(5, &[0, 1, 2, 3, 4]);
        g.add_route(TransitRoute { name: "L1".into(), outbound: ids[..3].to_vec(), inbound: vec![] }).unwrap();
        let s = g.simplify(10.0);
        let src = s.id_of(g.key_of(ids[0])).unwrap();
        let dst = s.id_of(g.key_of(ids[4])).unwrap();

        let mut rng = AgentRng::new(1, AgentId(0));
        let options = get_routes(&s, &AStarPathfinder::default(), src, &[dst], 0.0, 1.0, &mut rng).unwrap();
        let best = &options[0];
        assert_eq!(best.hops.len(), 5);
        assert!(best.hops[0].is_walk());
        let l1 = TransportMode::Transit(RouteId(0));
        assert_eq!(best.hops[1].modes, vec![l1]);
        assert_eq!(best.hops[2].modes, vec![l1]);
        assert!(best.hops[3].is_walk());
        assert!(best.hops[4].is_walk());
    }

    #[test]
    fn unreachable_destination_is_no_route() {
        let (g, ids) = line_graph(5, &[0, 4]);
        let s = g.simplify(10.0);
        let src = s.id_of(g.key_of(ids[4])).unwrap();
        let dst = s.id_of(g.key_of(ids[0])).unwrap();
        let mut rng = AgentRng::new(1, AgentId(0));
        let res = get_routes(&s, &AStarPathfinder::default(), src, &[dst], 0.0, 1.0, &mut rng);
        assert_eq!(res, Err(SearchError::NoRoute { from: src }));
    }
}

// ── Route ordering ────────────────────────────────────────────────────────────

#[cfg(test)]
mod route_order {
    use ts_core::BlockKey;

    use super::helpers::*;
    use crate::{order_route, Graph, GraphError, WayGroup};

    fn k(w: i64, a: i64, b: i64) -> BlockKey {
        BlockKey::new(w, a, b)
    }

    fn add(g: &mut Graph, key: BlockKey, at: usize) {
        g.add_block(block(key.way, key.from, key.to, at)).unwrap();
    }

    fn edge(g: &mut Graph, a: BlockKey, b: BlockKey) {
        g.add_edge_by_key(a, b, false).unwrap();
    }

    /// Way 1 runs 1→2→3; way 2 is stored 5→4→3 but driven 3→4→5.
    fn two_way_graph() -> Graph {
        let mut g = Graph::new();
        for (i, key) in [k(1, 1, 2), k(1, 2, 3), k(2, 5, 4), k(2, 4, 3), k(2, 3, 4), k(2, 4, 5)]
            .into_iter()
            .enumerate()
        {
            add(&mut g, key, i);
        }
        edge(&mut g, k(1, 1, 2), k(1, 2, 3));
        edge(&mut g, k(1, 2, 3), k(2, 3, 4));
        edge(&mut g, k(2, 3, 4), k(2, 4, 5));
        g
    }

    #[test]
    fn reverses_groups_against_travel_direction() {
        let g = two_way_graph();
        let groups = [
            WayGroup::new(1, vec![k(1, 1, 2), k(1, 2, 3)]),
            WayGroup::new(2, vec![k(2, 5, 4), k(2, 4, 3)]),
        ];
        let ids = order_route(&g, "7", &groups, &[]).unwrap();
        let keys: Vec<BlockKey> = ids.iter().map(|&b| g.key_of(b)).collect();
        assert_eq!(keys, vec![k(1, 1, 2), k(1, 2, 3), k(2, 3, 4), k(2, 4, 5)]);
    }

    #[test]
    fn disconnected_route_fails_unless_known_gap() {
        let mut g = two_way_graph();
        add(&mut g, k(3, 8, 9), 7);
        let groups = [WayGroup::new(1, vec![k(1, 1, 2), k(1, 2, 3)]), WayGroup::new(3, vec![k(3, 8, 9)])];
        let err = order_route(&g, "7", &groups, &[]).unwrap_err();
        assert!(matches!(err, GraphError::RouteNotConnected { at, .. } if at == k(1, 2, 3)));
        assert_eq!(order_route(&g, "7", &groups, &[3]).unwrap().len(), 3);
    }

    #[test]
    fn roundabout_walks_from_entry_to_exit() {
        let mut g = Graph::new();
        for (i, key) in [k(1, 1, 2), k(9, 2, 3), k(9, 3, 4), k(9, 4, 2), k(3, 2, 7)].into_iter().enumerate() {
            add(&mut g, key, i);
        }
        edge(&mut g, k(9, 2, 3), k(9, 3, 4));
        edge(&mut g, k(9, 3, 4), k(9, 4, 2));
        edge(&mut g, k(9, 4, 2), k(9, 2, 3));
        // Enter on the second roundabout block, leave from the first.
        edge(&mut g, k(1, 1, 2), k(9, 3, 4));
        edge(&mut g, k(9, 2, 3), k(3, 2, 7));

        let groups = [
            WayGroup::new(1, vec![k(1, 1, 2)]),
            WayGroup::roundabout(9, vec![k(9, 2, 3), k(9, 3, 4), k(9, 4, 2)]),
            WayGroup::new(3, vec![k(3, 2, 7)]),
        ];
        let keys: Vec<BlockKey> = order_route(&g, "R", &groups, &[])
            .unwrap()
            .iter()
            .map(|&b| g.key_of(b))
            .collect();
        assert_eq!(keys, vec![k(1, 1, 2), k(9, 3, 4), k(9, 4, 2), k(9, 2, 3), k(3, 2, 7)]);
    }

    #[test]
    fn empty_route_is_an_error() {
        let g = two_way_graph();
        assert!(matches!(order_route(&g, "x", &[], &[]), Err(GraphError::EmptyRoute(_))));
    }
}

// ── JSON loader ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod loader {
    use std::io::Cursor;

    use ts_core::{BlockKey, RouteId};

    use crate::{load_map_reader, ElementKind, GraphError};

    const MAP: &str = r#"{
      "blocks": [
        { "key": "1:1:2", "length_km": 0.5, "lat": 23.000, "lon": -82.4, "municipality": "playa",
          "elements": [ { "kind": "bus_stop", "position_km": 0.2, "routes": ["P4", "ghost"] },
                        { "kind": "traffic_light", "position_km": 0.1 } ] },
        { "key": "1:2:3", "length_km": 0.5, "lat": 23.005, "lon": -82.4, "municipality": "playa" },
        { "key": "2:3:4", "length_km": 1.0, "lat": 23.010, "lon": -82.4, "municipality": "cerro" }
      ],
      "edges": [
        { "from": "1:1:2", "to": "1:2:3" },
        { "from": "1:2:3", "to": "2:3:4", "walk_only": false }
      ],
      "routes": [
        { "name": "P4", "outbound": [ { "way": 1, "blocks": ["1:1:2", "1:2:3"] },
                                      { "way": 2, "blocks": ["2:3:4"] } ] }
      ],
      "places": [ { "kind": "fuel", "lat": 23.0101, "lon": -82.4 } ]
    }"#;

    #[test]
    fn loads_blocks_edges_routes_and_places() {
        let g = load_map_reader(Cursor::new(MAP)).unwrap();
        assert_eq!(g.block_count(), 3);
        assert_eq!(g.edge_count(), 2);
        assert_eq!(g.municipality_blocks("playa").len(), 2);

        let p4 = g.route_id("P4").unwrap();
        assert_eq!(p4, RouteId(0));
        let line = g.route(p4).unwrap();
        assert_eq!(line.outbound.len(), 3);
        // No reverse blocks exist: the return leg reuses the outbound one.
        assert_eq!(line.inbound, line.outbound);

        let first = g.block(g.id_of(BlockKey::new(1, 1, 2)).unwrap());
        assert_eq!(first.elements[0].kind, ElementKind::TrafficLight);
        assert_eq!(first.elements[1].routes, vec![p4]);

        assert_eq!(g.gas_stations(), vec![g.id_of(BlockKey::new(2, 3, 4)).unwrap()]);
    }

    #[test]
    fn malformed_key_is_a_map_error() {
        let bad = r#"{ "blocks": [ { "key": "1-2-3", "length_km": 1, "lat": 0, "lon": 0 } ] }"#;
        assert!(matches!(load_map_reader(Cursor::new(bad)), Err(GraphError::MapFile(_))));
    }

    #[test]
    fn edge_to_unknown_block_fails() {
        let bad = r#"{ "blocks": [ { "key": "1:2:3", "length_km": 1, "lat": 0, "lon": 0 } ],
                       "edges": [ { "from": "1:2:3", "to": "9:9:9" } ] }"#;
        assert!(matches!(load_map_reader(Cursor::new(bad)), Err(GraphError::UnknownBlock(_))));
    }
}
