//! JSON map loader.
//!
//! # File format
//!
//! ```json
//! {
//!   "blocks": [
//!     { "key": "100:1:2", "length_km": 0.4, "max_speed_kmh": 50,
//!       "lat": 23.13, "lon": -82.38, "municipality": "playa", "name": "Calle 42",
//!       "elements": [ { "kind": "bus_stop", "position_km": 0.2, "routes": ["P4"] } ] }
//!   ],
//!   "edges":  [ { "from": "100:1:2", "to": "101:2:3", "walk_only": false } ],
//!   "routes": [
//!     { "name": "P4",
//!       "outbound": [ { "way": 100, "blocks": ["100:1:2"], "roundabout": false } ],
//!       "return": null,
//!       "via_replacements": [] }
//!   ],
//!   "places": [ { "kind": "fuel", "lat": 23.12, "lon": -82.39 } ]
//! }
//! ```
//!
//! Route ids follow the order of `routes`.  A missing `return` relation
//! means the line runs the outbound ways in reverse.  Each place is snapped
//! to the block with the nearest anchor.

use std::io::Read;
use std::path::Path as FsPath;

use serde::Deserialize;

use ts_core::{BlockKey, GeoPoint, RouteId};

use crate::block::Block;
use crate::element::{Element, ElementKind};
use crate::graph::{Graph, TransitRoute};
use crate::route_order::{order_route, WayGroup};
use crate::{GraphError, GraphResult};

// ── File records ──────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct MapFile {
    blocks: Vec<BlockRecord>,
    #[serde(default)]
    edges:  Vec<EdgeRecord>,
    #[serde(default)]
    routes: Vec<RouteRecord>,
    #[serde(default)]
    places: Vec<PlaceRecord>,
}

#[derive(Deserialize)]
struct BlockRecord {
    key:           String,
    length_km:     f64,
    #[serde(default = "default_speed")]
    max_speed_kmh: f64,
    lat:           f64,
    lon:           f64,
    #[serde(default)]
    municipality:  Option<String>,
    #[serde(default)]
    name:          String,
    #[serde(default)]
    elements:      Vec<ElementRecord>,
}

fn default_speed() -> f64 {
    50.0
}

#[derive(Deserialize)]
struct ElementRecord {
    kind:        ElementKind,
    position_km: f64,
    #[serde(default)]
    routes:      Vec<String>,
}

#[derive(Deserialize)]
struct EdgeRecord {
    from:      String,
    to:        String,
    #[serde(default)]
    walk_only: bool,
}

#[derive(Deserialize)]
struct GroupRecord {
    way:        i64,
    blocks:     Vec<String>,
    #[serde(default)]
    roundabout: bool,
}

#[derive(Deserialize)]
struct RouteRecord {
    name:             String,
    outbound:         Vec<GroupRecord>,
    #[serde(rename = "return", default)]
    inbound:          Option<Vec<GroupRecord>>,
    #[serde(default)]
    via_replacements: Vec<i64>,
}

#[derive(Deserialize)]
struct PlaceRecord {
    kind: String,
    lat:  f64,
    lon:  f64,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load a full-resolution graph from a JSON map file.
pub fn load_map_json(path: &FsPath) -> GraphResult<Graph> {
    let file = std::fs::File::open(path)?;
    load_map_reader(std::io::BufReader::new(file))
}

/// Like [`load_map_json`] but accepts any `Read` source.
pub fn load_map_reader<R: Read>(reader: R) -> GraphResult<Graph> {
    let map: MapFile = serde_json::from_reader(reader).map_err(|e| GraphError::MapFile(e.to_string()))?;

    let route_ids = map
        .routes
        .iter()
        .enumerate()
        .map(|(i, r)| RouteId::try_from(i).map(|id| (r.name.as_str(), id)))
        .collect::<Result<rustc_hash::FxHashMap<&str, RouteId>, _>>()
        .map_err(|_| GraphError::TooManyRoutes)?;

    let mut graph = Graph::new();

    // ── Blocks ────────────────────────────────────────────────────────────
    for rec in &map.blocks {
        let key = parse_key(&rec.key)?;
        let elements = rec
            .elements
            .iter()
            .map(|e| {
                let routes = e
                    .routes
                    .iter()
                    .filter_map(|name| {
                        let id = route_ids.get(name.as_str()).copied();
                        if id.is_none() {
                            log::debug!("block {key}: stop lists unknown line {name:?}");
                        }
                        id
                    })
                    .collect();
                Element::new(e.kind, e.position_km).with_routes(routes)
            })
            .collect();
        let mut block = Block::new(key, rec.length_km, rec.max_speed_kmh, GeoPoint::new(rec.lat, rec.lon))
            .with_name(rec.name.clone())
            .with_elements(elements);
        block.municipality = rec.municipality.clone();
        graph.add_block(block)?;
    }

    // ── Edges ─────────────────────────────────────────────────────────────
    for rec in &map.edges {
        graph.add_edge_by_key(parse_key(&rec.from)?, parse_key(&rec.to)?, rec.walk_only)?;
    }

    // ── Lines ─────────────────────────────────────────────────────────────
    for rec in &map.routes {
        let outbound_groups = parse_groups(&rec.outbound)?;
        let outbound = order_route(&graph, &rec.name, &outbound_groups, &rec.via_replacements)?;

        let inbound = match &rec.inbound {
            Some(groups) => order_route(&graph, &rec.name, &parse_groups(groups)?, &rec.via_replacements)?,
            None => {
                let reversed: Vec<WayGroup> = outbound_groups.iter().rev().cloned().collect();
                match order_route(&graph, &rec.name, &reversed, &rec.via_replacements) {
                    Ok(blocks) => blocks,
                    // One-way streets: the bus repeats the outbound leg and
                    // drives back to its start between trips.
                    Err(e) => {
                        log::warn!("line {:?} has no drivable reverse ({e}); reusing outbound", rec.name);
                        outbound.clone()
                    }
                }
            }
        };

        graph.add_route(TransitRoute { name: rec.name.clone(), outbound, inbound })?;
    }

    // ── Places ────────────────────────────────────────────────────────────
    for rec in &map.places {
        match graph.nearest_block(GeoPoint::new(rec.lat, rec.lon)) {
            Some(block) => graph.add_place(rec.kind.clone(), block),
            None => log::warn!("place {:?} at ({}, {}) could not be snapped", rec.kind, rec.lat, rec.lon),
        }
    }

    log::info!(
        "loaded map: {} blocks, {} edges, {} lines, {} places",
        graph.block_count(),
        graph.edge_count(),
        graph.routes().len(),
        graph.places().len()
    );
    Ok(graph)
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn parse_key(s: &str) -> GraphResult<BlockKey> {
    s.parse::<BlockKey>().map_err(|e| GraphError::MapFile(e.to_string()))
}

fn parse_groups(records: &[GroupRecord]) -> GraphResult<Vec<WayGroup>> {
    records
        .iter()
        .map(|g| {
            let blocks = g.blocks.iter().map(|k| parse_key(k)).collect::<GraphResult<Vec<_>>>()?;
            Ok(WayGroup { way: g.way, blocks, roundabout: g.roundabout })
        })
        .collect()
}
