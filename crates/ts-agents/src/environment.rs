//! Per-agent environment records.
//!
//! The orchestrator owns one environment per agent (indexed by `AgentId`)
//! and refreshes the derived fields before every `think`.  Agents only
//! ever see their own record.

use std::collections::VecDeque;

use ts_core::{AgentId, BlockId, RouteId, SimTime};

use crate::bus::Bus;

/// What a driver knows about its surroundings.
#[derive(Clone, Debug)]
pub struct DriverEnvironment {
    pub time:           SimTime,
    pub bus:            Bus,
    /// Index into the driver's current route of the block being driven.
    pub position:       usize,
    /// Index of the next element to handle on the current block.
    pub last_element:   usize,
    /// Distance (km) already covered on the current block.
    pub offset_km:      f64,
    /// Segment lengths driven but not yet charged; drained by `FUEL_SPENT`.
    pub pending_fuel:   VecDeque<f64>,
    /// A passenger is boarding this bus.
    pub onboarding:     bool,
    /// The next block of the route is closed.
    pub obstacle_ahead: bool,
    pub obstacles:      Vec<BlockId>,
    pub gas_stations:   Vec<BlockId>,
}

impl DriverEnvironment {
    pub fn new(time: SimTime, bus: Bus, gas_stations: Vec<BlockId>) -> Self {
        Self {
            time,
            bus,
            position: 0,
            last_element: 0,
            offset_km: 0.0,
            pending_fuel: VecDeque::new(),
            onboarding: false,
            obstacle_ahead: false,
            obstacles: Vec::new(),
            gas_stations,
        }
    }

    /// Jump to the start of block `position`.
    pub fn reset_position(&mut self, position: usize) {
        self.position = position;
        self.last_element = 0;
        self.offset_km = 0.0;
    }
}

/// What a passenger knows about its surroundings.
#[derive(Clone, Debug, Default)]
pub struct PassengerEnvironment {
    pub time:           SimTime,
    /// Index into the passenger's current route.
    pub position:       usize,
    /// Driver offering a ride at the passenger's stop.
    pub bus_at_stop:    Option<AgentId>,
    pub current_line:   Option<RouteId>,
    /// Driver of the bus the passenger is riding.
    pub current_driver: Option<AgentId>,
    /// Simplified-graph block where the passenger's bus currently is.
    pub stop_block:     Option<BlockId>,
}

impl PassengerEnvironment {
    pub fn new(time: SimTime) -> Self {
        Self { time, ..Self::default() }
    }

    pub fn clear_vehicle(&mut self) {
        self.bus_at_stop = None;
        self.current_line = None;
        self.current_driver = None;
        self.stop_block = None;
    }
}
