//! Point features placed along a block.

use ts_core::RouteId;

/// What kind of feature an [`Element`] is.
///
/// | Kind            | Class           | Driver reaction                       |
/// |-----------------|-----------------|---------------------------------------|
/// | `BusStop`       | stop            | emits `BUS_STOP`                      |
/// | `GazelleRoute`  | stop            | emits `BUS_STOP`                      |
/// | `Stop`          | traffic control | dwell U(2, 5) min                     |
/// | `GiveWay`       | traffic control | dwell U(0, 3) min                     |
/// | `TrafficLight`  | traffic control | dwell U(1, 3) min                     |
/// | `Crossing`      | traffic control | dwell U(0, 7) min                     |
/// | `TrainRail`     | traffic control | dwell U(0, 7) min                     |
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    BusStop,
    Stop,
    TrafficLight,
    GiveWay,
    Crossing,
    TrainRail,
    GazelleRoute,
}

impl ElementKind {
    /// Bus stops and gazelle markers: places where passengers board.
    #[inline]
    pub fn is_stop(self) -> bool {
        matches!(self, ElementKind::BusStop | ElementKind::GazelleRoute)
    }

    /// Signs and signals that hold a vehicle for a while.
    #[inline]
    pub fn is_traffic_control(self) -> bool {
        !self.is_stop()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ElementKind::BusStop      => "bus_stop",
            ElementKind::Stop         => "stop",
            ElementKind::TrafficLight => "traffic_light",
            ElementKind::GiveWay      => "give_way",
            ElementKind::Crossing     => "crossing",
            ElementKind::TrainRail    => "train_rail",
            ElementKind::GazelleRoute => "gazelle_route",
        }
    }
}

impl std::fmt::Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A feature at `position_km` from the start of its block.
#[derive(Clone, Debug, PartialEq)]
pub struct Element {
    pub kind:        ElementKind,
    pub position_km: f64,
    /// Lines that serve this stop on this directed block.  Empty for
    /// traffic-control elements.
    pub routes:      Vec<RouteId>,
}

impl Element {
    pub fn new(kind: ElementKind, position_km: f64) -> Self {
        Self { kind, position_km, routes: Vec::new() }
    }

    pub fn with_routes(mut self, routes: Vec<RouteId>) -> Self {
        self.routes = routes;
        self
    }
}
