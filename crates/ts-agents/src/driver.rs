//! Bus driver state machine.
//!
//! # Transitions
//!
//! | Event                  | Condition                                     | Next status        |
//! |------------------------|-----------------------------------------------|--------------------|
//! | `BUS_STOP`             | a passenger is boarding                       | `WaitingAtStop`    |
//! | `ROUTE_ENDED`          | fuel at or below the threshold                | `SearchForFuel`    |
//! | `ROUTE_ENDED`          | otherwise                                     | `Idle`             |
//! | `CONTINUE`             | driving for fuel and at a gas station         | `Refuel`           |
//! | `CONTINUE`             | driving, or the next block is closed          | `Detour`           |
//! | `ROUTE_ENDED_ABRUPTLY` |                                               | `Idle`             |
//! | `DEPARTURE`            | after a fuel search                           | `DrivingForFuel`   |
//! | anything else          |                                               | `Driving`          |
//!
//! # Driving
//!
//! A drive step covers the current block from the last handled element.
//! Traffic-control elements add a dwell drawn from [`dwell_range`] and emit
//! `OBEY_SIGNAL`.  The step ends at the next stop element served by the
//! line (`BUS_STOP`, suppressed while driving for fuel) or at the end of the
//! block (`CONTINUE`, or the end-of-route event on the last block).  Each
//! step queues its length in `pending_fuel` and emits `FUEL_SPENT` at its
//! end time.
//!
//! `Detour` is a look-ahead: when the next block is open the driver simply
//! carries on; otherwise it splices in a path around the closed blocks to
//! the first reachable later block of the route, or ends the leg with
//! `ROUTE_ENDED_ABRUPTLY`.

use std::slice;

use ts_core::{AgentId, AgentRng, BlockId, RouteId, SimTime};
use ts_events::{Event, EventType};
use ts_graph::{Element, ElementKind, Graph, SearchQuery};

use crate::environment::DriverEnvironment;
use crate::passenger::ONBOARDING_MINUTES;
use crate::state::StateMachine;
use crate::{AgentContext, AgentError, AgentResult};

/// Range from which a driver's ability is drawn.
pub const ABILITY_RANGE: (f64, f64) = (0.5, 1.0);

/// Uniform dwell range (minutes) at an element of `kind`.
pub fn dwell_range(kind: ElementKind) -> (f64, f64) {
    match kind {
        ElementKind::Stop                                => (2.0, 5.0),
        ElementKind::GiveWay                             => (0.0, 3.0),
        ElementKind::TrafficLight                        => (1.0, 3.0),
        ElementKind::Crossing | ElementKind::TrainRail   => (0.0, 7.0),
        ElementKind::BusStop | ElementKind::GazelleRoute => (0.0, 0.0),
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum DriverStatus {
    Idle,
    WaitingAtStop,
    Driving,
    SearchForFuel,
    DrivingForFuel,
    Refuel,
    Detour,
}

impl DriverStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DriverStatus::Idle           => "IDLE",
            DriverStatus::WaitingAtStop  => "WAITING_AT_STOP",
            DriverStatus::Driving        => "DRIVING",
            DriverStatus::SearchForFuel  => "SEARCH_FOR_FUEL",
            DriverStatus::DrivingForFuel => "DRIVING_FOR_FUEL",
            DriverStatus::Refuel         => "REFUEL",
            DriverStatus::Detour         => "DETOUR",
        }
    }
}

/// A driver assigned to one line, shuttling between its two legs.
pub struct DriverAgent {
    id:            AgentId,
    route:         RouteId,
    route_name:    String,
    /// Outbound and return legs on the full graph.
    legs:          [Vec<BlockId>; 2],
    parity:        u8,
    /// What the driver is following now: a leg, a fuel trip or a detoured
    /// copy.  Replaced wholesale on replanning.
    current_route: Vec<BlockId>,
    wait_time:     f64,
    ability:       f64,
    status:        DriverStatus,
}

impl DriverAgent {
    /// A driver for line `route` of `graph`, starting idle on the outbound
    /// leg.  Ability is drawn from [`ABILITY_RANGE`].
    ///
    /// A line without a distinct return leg runs its outbound leg both ways.
    pub fn new(
        id:        AgentId,
        route:     RouteId,
        graph:     &Graph,
        wait_time: f64,
        rng:       &mut AgentRng,
    ) -> AgentResult<Self> {
        let line = graph.route(route).ok_or(AgentError::UnknownRoute(route))?;
        if line.outbound.is_empty() {
            return Err(AgentError::EmptyRoute(line.name.clone()));
        }
        let inbound = if line.inbound.is_empty() { line.outbound.clone() } else { line.inbound.clone() };
        Ok(Self {
            id,
            route,
            route_name: line.name.clone(),
            current_route: line.outbound.clone(),
            legs: [line.outbound.clone(), inbound],
            parity: 0,
            wait_time,
            ability: rng.uniform(ABILITY_RANGE.0, ABILITY_RANGE.1),
            status: DriverStatus::Idle,
        })
    }

    pub fn with_ability(mut self, ability: f64) -> Self {
        self.ability = ability.clamp(0.0, 1.0);
        self
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn id(&self) -> AgentId {
        self.id
    }

    pub fn route(&self) -> RouteId {
        self.route
    }

    pub fn route_name(&self) -> &str {
        &self.route_name
    }

    /// `0` on the outbound leg, `1` on the return leg.
    pub fn parity(&self) -> u8 {
        self.parity
    }

    pub fn ability(&self) -> f64 {
        self.ability
    }

    pub fn current_route(&self) -> &[BlockId] {
        &self.current_route
    }

    /// The block being driven (or about to be entered).
    pub fn block_at(&self, env: &DriverEnvironment) -> Option<BlockId> {
        self.current_route.get(env.position).copied()
    }

    /// The last block the bus has reached.
    pub fn current_block(&self, env: &DriverEnvironment) -> Option<BlockId> {
        let last = self.current_route.len().checked_sub(1)?;
        self.current_route.get(env.position.saturating_sub(1).min(last)).copied()
    }

    /// `true` if `block` lies ahead of the bus on its current route.
    pub fn visits_ahead(&self, block: BlockId, env: &DriverEnvironment) -> bool {
        self.current_route
            .get(env.position + 1..)
            .is_some_and(|ahead| ahead.contains(&block))
    }

    fn serves(&self, element: &Element) -> bool {
        element.routes.is_empty() || element.routes.contains(&self.route)
    }

    /// Reached a fuel station, or the end of the trip towards one.
    fn at_gas_station(&self, env: &DriverEnvironment) -> bool {
        env.position >= self.current_route.len()
            || self.current_block(env).is_some_and(|b| env.gas_stations.contains(&b))
    }

    fn route_end_event(&self, time: SimTime) -> Event {
        let kind = if self.status == DriverStatus::DrivingForFuel {
            EventType::Continue
        } else {
            EventType::RouteEnded
        };
        Event::new(time, kind, self.id)
    }

    // ── Actions ───────────────────────────────────────────────────────────

    fn drive(&mut self, env: &mut DriverEnvironment, ctx: &mut AgentContext<'_>) -> Vec<Event> {
        let mut events = Vec::new();
        let Some(block_id) = self.block_at(env) else {
            events.push(self.route_end_event(env.time));
            return events;
        };
        let block = ctx.full.block(block_id);
        let speed = if block.max_speed_kmh > 0.0 {
            block.max_speed_kmh
        } else {
            ctx.pathfinder.params().drive_speed_kmh
        };
        let minutes_per_km = 60.0 / speed;

        let mut t = env.time;
        let mut segment_km = 0.0;

        while let Some(element) = block.elements.get(env.last_element) {
            env.last_element += 1;
            let step = (element.position_km - env.offset_km).max(0.0);
            env.offset_km += step;
            segment_km += step;
            t += step * minutes_per_km;

            if element.kind.is_traffic_control() {
                let (lo, hi) = dwell_range(element.kind);
                t += ctx.rng.uniform(lo, hi);
                events.push(Event::new(t, EventType::ObeySignal, self.id));
            } else if self.status != DriverStatus::DrivingForFuel && self.serves(element) {
                env.pending_fuel.push_back(segment_km);
                events.push(Event::new(t, EventType::FuelSpent, self.id));
                events.push(Event::new(t, EventType::BusStop, self.id));
                return events;
            }
        }

        let rest = (block.length_km - env.offset_km).max(0.0);
        segment_km += rest;
        t += rest * minutes_per_km;
        env.pending_fuel.push_back(segment_km);
        events.push(Event::new(t, EventType::FuelSpent, self.id));

        env.reset_position(env.position + 1);
        if env.position < self.current_route.len() {
            events.push(Event::new(t, EventType::Continue, self.id));
        } else {
            events.push(self.route_end_event(t));
        }
        events
    }

    fn search_gas_station(&mut self, env: &mut DriverEnvironment, ctx: &mut AgentContext<'_>) -> Vec<Event> {
        let departure = vec![Event::new(env.time, EventType::Departure, self.id)];
        let Some(here) = self.current_block(env) else {
            return departure;
        };
        let query = SearchQuery::new(here, &env.gas_stations).ability(self.ability);
        match ctx.pathfinder.path_search(ctx.full, &query, ctx.rng) {
            Ok(path) => {
                log::debug!("driver {}: heading to gas station {:?} ({} blocks)", self.id, path.goal(), path.len());
                self.current_route = path.blocks;
            }
            Err(e) => {
                log::warn!("driver {}: no reachable gas station ({e}); refuelling in place", self.id);
                env.bus.refuel();
                self.current_route = vec![here];
            }
        }
        env.reset_position(1);
        departure
    }

    fn refuel(&mut self, env: &mut DriverEnvironment, ctx: &mut AgentContext<'_>) -> Vec<Event> {
        env.bus.refuel();
        let departure = vec![Event::new(env.time, EventType::Departure, self.id)];
        let leg = &self.legs[self.parity as usize];
        let (Some(here), Some(&target)) = (self.current_block(env), leg.last()) else {
            return departure;
        };
        let query = SearchQuery::new(here, slice::from_ref(&target)).ability(self.ability);
        match ctx.pathfinder.path_search(ctx.full, &query, ctx.rng) {
            Ok(path) => self.current_route = path.blocks,
            Err(e) => {
                log::warn!("driver {}: cannot return from gas station ({e}); teleporting to {target}", self.id);
                self.current_route = vec![target];
            }
        }
        env.reset_position(1);
        departure
    }

    fn take_detour(
        &mut self,
        previous: DriverStatus,
        env:      &mut DriverEnvironment,
        ctx:      &mut AgentContext<'_>,
    ) -> Vec<Event> {
        let resume = if previous == DriverStatus::DrivingForFuel {
            DriverStatus::DrivingForFuel
        } else {
            DriverStatus::Driving
        };
        let pos = env.position;
        let blocked = match self.current_route.get(pos) {
            Some(next) => env.obstacles.contains(next),
            None => false,
        };
        if !blocked {
            self.status = resume;
            return self.drive(env, ctx);
        }

        let abrupt = vec![Event::new(env.time, EventType::RouteEndedAbruptly, self.id)];
        let Some(&here) = pos.checked_sub(1).and_then(|p| self.current_route.get(p)) else {
            return abrupt;
        };
        for k in pos + 1..self.current_route.len() {
            let target = self.current_route[k];
            if env.obstacles.contains(&target) {
                continue;
            }
            let query = SearchQuery::new(here, slice::from_ref(&target))
                .blocked(&env.obstacles)
                .ability(self.ability);
            let Ok(path) = ctx.pathfinder.path_search(ctx.full, &query, ctx.rng) else {
                continue;
            };
            let mut spliced = self.current_route[..pos].to_vec();
            spliced.extend_from_slice(&path.blocks[1..]);
            spliced.extend_from_slice(&self.current_route[k + 1..]);
            log::debug!("driver {}: detour of {} blocks rejoins route at {target}", self.id, path.len());
            self.current_route = spliced;
            self.status = resume;
            return self.drive(env, ctx);
        }

        log::warn!("driver {}: no detour around closed block ahead; ending leg", self.id);
        abrupt
    }

    /// Flip to the other leg and head for its first block.
    fn restart(&mut self, env: &mut DriverEnvironment, ctx: &mut AgentContext<'_>) -> Vec<Event> {
        let here = self.current_block(env);
        self.parity ^= 1;
        let leg = self.legs[self.parity as usize].clone();
        let departure = vec![Event::new(env.time, EventType::Departure, self.id)];
        let Some(&first) = leg.first() else {
            return departure;
        };

        match here {
            Some(h) if h != first => {
                let query = SearchQuery::new(h, slice::from_ref(&first)).ability(self.ability);
                match ctx.pathfinder.path_search(ctx.full, &query, ctx.rng) {
                    Ok(path) => {
                        let mut route = path.blocks;
                        route.pop();
                        route.extend(leg);
                        self.current_route = route;
                        env.reset_position(1);
                    }
                    Err(e) => {
                        log::warn!("driver {}: no path to the start of leg {} ({e}); teleporting", self.id, self.parity);
                        self.current_route = leg;
                        env.reset_position(0);
                    }
                }
            }
            _ => {
                self.current_route = leg;
                env.reset_position(0);
            }
        }
        departure
    }
}

impl StateMachine for DriverAgent {
    type Status = DriverStatus;
    type Env = DriverEnvironment;

    fn status(&self) -> DriverStatus {
        self.status
    }

    fn think(&self, event: &Event, env: &DriverEnvironment) -> DriverStatus {
        use DriverStatus::*;
        match event.kind {
            EventType::BusStop if env.onboarding => WaitingAtStop,
            EventType::RouteEnded if env.bus.is_fuel_low() => SearchForFuel,
            EventType::RouteEnded => Idle,
            EventType::Continue if self.status == DrivingForFuel => {
                if self.at_gas_station(env) {
                    Refuel
                } else if env.obstacle_ahead {
                    Detour
                } else {
                    DrivingForFuel
                }
            }
            EventType::Continue if self.status == Driving || env.obstacle_ahead => Detour,
            EventType::RouteEndedAbruptly => Idle,
            EventType::Departure if self.status == SearchForFuel => DrivingForFuel,
            _ => Driving,
        }
    }

    fn take_action(
        &mut self,
        status: DriverStatus,
        _event: &Event,
        env:    &mut DriverEnvironment,
        ctx:    &mut AgentContext<'_>,
    ) -> Vec<Event> {
        let previous = self.status;
        self.status = status;
        match status {
            DriverStatus::WaitingAtStop => {
                // Re-check no sooner than a boarding can complete.
                let wait = self.wait_time.max(ONBOARDING_MINUTES);
                vec![Event::new(env.time + wait, EventType::BusStop, self.id)]
            }
            DriverStatus::Driving | DriverStatus::DrivingForFuel => self.drive(env, ctx),
            DriverStatus::SearchForFuel => self.search_gas_station(env, ctx),
            DriverStatus::Refuel => self.refuel(env, ctx),
            DriverStatus::Detour => self.take_detour(previous, env, ctx),
            DriverStatus::Idle => self.restart(env, ctx),
        }
    }
}
