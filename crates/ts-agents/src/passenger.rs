//! Passenger state machine.
//!
//! # Transitions
//!
//! | Event                  | Condition                                        | Next status          |
//! |------------------------|--------------------------------------------------|----------------------|
//! | `DEPARTURE`            |                                                  | `WalkToStop`         |
//! | `AT_GOAL`, `IMPOSSIBLE_PLAN` |                                            | `Idle`               |
//! | `AT_STOP`              | no patience at all                               | `Idle`               |
//! | `AT_STOP`              |                                                  | `Waiting`            |
//! | `BUS_STOP`             | waiting, and the offered line covers the next hop | `BoardVehicle`      |
//! | `BUS_STOP`             | riding, and the next hop still uses this line    | `OnVehicle`          |
//! | `BUS_STOP`             | riding otherwise                                 | `ArrivalAtStop`      |
//! | `BOARD_VEHICLE`        |                                                  | `OnVehicle`          |
//! | `GET_OFF_VEHICLE`      |                                                  | `OffVehicle`         |
//! | `ROUTE_ENDED_ABRUPTLY` |                                                  | `SearchAlternative`  |
//! | `WAIT_EXPIRED`         | still waiting and patience used up               | `SearchAlternative`  |
//!
//! Any other event leaves the status unchanged and triggers no action.
//!
//! # Routes
//!
//! A route is a list of [`Hop`]s on the simplified graph.  `env.position`
//! indexes the hop the passenger is at.  When hop `position + 1` is a
//! transit hop the passenger waits at hop `position` for a bus whose line
//! that hop allows.  While riding, each stop of the bus that matches the
//! next hop advances `position`; the passenger gets off when the hop after
//! that no longer allows the line.

use std::slice;

use ts_core::{AgentId, BlockId, RouteId, SimTime};
use ts_events::{Event, EventType, PassengerProfile, Plan, PlanQueue, PlanType, TimeWindow};
use ts_graph::{get_routes, Graph, Hop, RouteOption, SearchQuery};

use crate::environment::PassengerEnvironment;
use crate::state::StateMachine;
use crate::AgentContext;

/// Minutes of expected waiting charged per change of vehicle.
pub const TRANSITION_PENALTY: f64 = 15.0;
pub const ONBOARDING_MINUTES: f64 = 0.3;
pub const ALIGHTING_MINUTES: f64 = 0.3;

/// Slack on the patience check so a wait of exactly the maximum counts.
const WAIT_TOLERANCE: f64 = 1e-9;

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum PassengerStatus {
    Idle,
    WalkToStop,
    Waiting,
    OnVehicle,
    OffVehicle,
    BoardVehicle,
    ArrivalAtStop,
    SearchAlternative,
}

impl PassengerStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PassengerStatus::Idle              => "IDLE",
            PassengerStatus::WalkToStop        => "WALK_TO_STOP",
            PassengerStatus::Waiting           => "WAITING",
            PassengerStatus::OnVehicle         => "ON_VEHICLE",
            PassengerStatus::OffVehicle        => "OFF_VEHICLE",
            PassengerStatus::BoardVehicle      => "BOARD_VEHICLE",
            PassengerStatus::ArrivalAtStop     => "ARRIVAL_AT_STOP",
            PassengerStatus::SearchAlternative => "SEARCH_ALTERNATIVE",
        }
    }
}

/// Number of times a route makes the passenger step onto a new vehicle.
pub fn transitions(hops: &[Hop]) -> usize {
    hops.windows(2)
        .filter(|w| {
            let (prev, next) = (&w[0], &w[1]);
            !next.is_walk() && (prev.is_walk() || !next.lines().any(|l| prev.allows(l)))
        })
        .count()
}

/// Total expected minutes of a candidate route.
pub fn route_score(option: &RouteOption) -> f64 {
    option.estimated_minutes + TRANSITION_PENALTY * transitions(&option.hops) as f64
}

pub struct PassengerAgent {
    id:               AgentId,
    max_waiting_time: f64,
    /// km/h.
    walk_speed:       f64,
    plans:            PlanQueue,
    home:             BlockId,
    workplace:        Option<BlockId>,
    current:          BlockId,
    status:           PassengerStatus,
    route:            Option<Vec<Hop>>,
    arrival_at_stop:  SimTime,
}

impl PassengerAgent {
    /// A passenger at `home` with the given plans.  Blocks refer to the
    /// simplified graph.
    pub fn new(
        id:        AgentId,
        profile:   &PassengerProfile,
        plans:     PlanQueue,
        home:      BlockId,
        workplace: Option<BlockId>,
    ) -> Self {
        Self {
            id,
            max_waiting_time: profile.max_waiting_time.max(0.0),
            walk_speed: profile.walk_speed,
            plans,
            home,
            workplace,
            current: home,
            status: PassengerStatus::Idle,
            route: None,
            arrival_at_stop: SimTime::ZERO,
        }
    }

    /// The day's two plans: the outbound trip at `window.start`, home at
    /// `window.end`.
    pub fn plans_for(outbound: PlanType, window: TimeWindow, home: BlockId, goal: BlockId) -> PlanQueue {
        [Plan::new(window.start, goal, outbound), Plan::new(window.end, home, PlanType::ReturnHome)]
            .into_iter()
            .collect()
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn id(&self) -> AgentId {
        self.id
    }

    pub fn home(&self) -> BlockId {
        self.home
    }

    pub fn workplace(&self) -> Option<BlockId> {
        self.workplace
    }

    pub fn current_block(&self) -> BlockId {
        self.current
    }

    pub fn plans(&self) -> &PlanQueue {
        &self.plans
    }

    pub fn route(&self) -> Option<&[Hop]> {
        self.route.as_deref()
    }

    pub fn max_waiting_time(&self) -> f64 {
        self.max_waiting_time
    }

    pub fn arrival_at_stop(&self) -> SimTime {
        self.arrival_at_stop
    }

    /// The stop the passenger waits at, when waiting.
    pub fn waiting_block(&self, env: &PassengerEnvironment) -> Option<BlockId> {
        self.route.as_ref()?.get(env.position).map(|h| h.block)
    }

    /// The stop the passenger wants a bus to take it to next.
    pub fn next_stop(&self, env: &PassengerEnvironment) -> Option<BlockId> {
        self.route.as_ref()?.get(env.position + 1).map(|h| h.block)
    }

    /// `true` if a bus of `line` carries the passenger towards its next hop.
    pub fn wants_line(&self, line: RouteId, env: &PassengerEnvironment) -> bool {
        self.route
            .as_ref()
            .and_then(|r| r.get(env.position + 1))
            .is_some_and(|h| h.allows(line))
    }

    fn wait_elapsed(&self, env: &PassengerEnvironment) -> bool {
        env.time.since(self.arrival_at_stop) >= self.max_waiting_time - WAIT_TOLERANCE
    }

    /// Position after the bus reaches `env.stop_block`, and whether the
    /// passenger stays aboard.
    fn ride_progress(&self, env: &PassengerEnvironment) -> (usize, bool) {
        let Some(route) = self.route.as_ref() else {
            return (env.position, false);
        };
        let mut pos = env.position;
        if env.stop_block.is_some() && route.get(pos + 1).map(|h| h.block) == env.stop_block {
            pos += 1;
        }
        let stays = env
            .current_line
            .is_some_and(|line| route.get(pos + 1).is_some_and(|h| h.allows(line)));
        (pos, stays)
    }

    // ── Planning ──────────────────────────────────────────────────────────

    /// The best route from the current block to `goal` and its score.
    fn explore_routes(&self, goal: BlockId, ctx: &mut AgentContext<'_>) -> Option<(Vec<Hop>, f64)> {
        let options = get_routes(
            ctx.simplified,
            ctx.pathfinder,
            self.current,
            slice::from_ref(&goal),
            ctx.config.walk_radius_km,
            1.0,
            ctx.rng,
        )
        .map_err(|e| log::debug!("passenger {}: no route to {goal}: {e}", self.id))
        .ok()?;
        options
            .into_iter()
            .map(|o| {
                let score = route_score(&o);
                (o.hops, score)
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }

    /// When to leave for the most urgent plan.  Plans the chosen route as a
    /// side effect.  `None` when no route exists.
    ///
    /// A work trip leaves early enough to arrive on time (never before
    /// `now`); other trips leave when due.
    pub fn decide_departure_time(&mut self, now: SimTime, ctx: &mut AgentContext<'_>) -> Option<SimTime> {
        let plan = *self.plans.peek()?;
        let (hops, minutes) = self.explore_routes(plan.goal, ctx)?;
        self.route = Some(hops);
        let leave = match plan.kind {
            PlanType::GoToWork => plan.time - minutes,
            _ => plan.time,
        };
        Some(now.max(leave))
    }

    fn walk_minutes(&self, graph: &Graph, from: BlockId, to: BlockId) -> f64 {
        if self.walk_speed <= 0.0 {
            return 0.0;
        }
        graph.straight_line_km(from, to) / self.walk_speed * 60.0
    }

    fn abandon_plan(&mut self, time: SimTime) -> Vec<Event> {
        if let Some(plan) = self.plans.pop() {
            log::info!("passenger {}: discarding {} plan to {}", self.id, plan.kind.as_str(), plan.goal);
        }
        self.route = None;
        vec![Event::new(time, EventType::ImpossiblePlan, self.id)]
    }

    // ── Actions ───────────────────────────────────────────────────────────

    fn start_next_plan(&mut self, env: &mut PassengerEnvironment, ctx: &mut AgentContext<'_>) -> Vec<Event> {
        if self.plans.is_empty() {
            log::debug!("passenger {}: no plans left", self.id);
            return Vec::new();
        }
        env.position = 0;
        match self.decide_departure_time(env.time, ctx) {
            Some(t) => vec![Event::new(t, EventType::Departure, self.id)],
            None => self.abandon_plan(env.time),
        }
    }

    fn walk_to_stop(&mut self, env: &mut PassengerEnvironment, ctx: &mut AgentContext<'_>) -> Vec<Event> {
        if self.route.is_none() {
            let Some(plan) = self.plans.peek().copied() else {
                return Vec::new();
            };
            match self.explore_routes(plan.goal, ctx) {
                Some((hops, _)) => {
                    self.route = Some(hops);
                    env.position = 0;
                }
                None => return self.abandon_plan(env.time),
            }
        }
        self.walk_on(env.time, env, ctx)
    }

    /// Walk through consecutive walk hops; stop at the next transit hop or
    /// finish the plan.
    fn walk_on(&mut self, start: SimTime, env: &mut PassengerEnvironment, ctx: &mut AgentContext<'_>) -> Vec<Event> {
        let Some(route) = self.route.as_ref() else {
            return Vec::new();
        };
        let mut t = start;
        let mut pos = env.position.min(route.len().saturating_sub(1));
        while pos + 1 < route.len() && route[pos + 1].is_walk() {
            t += self.walk_minutes(ctx.simplified, route[pos].block, route[pos + 1].block);
            pos += 1;
        }
        let at_end = pos + 1 >= route.len();
        if let Some(hop) = route.get(pos) {
            self.current = hop.block;
        }
        env.position = pos;

        if at_end {
            self.finish_plan(t, ctx)
        } else {
            vec![Event::new(t, EventType::AtStop, self.id)]
        }
    }

    /// At the end of the route: walk the rest of the way to the goal.  A
    /// goal that cannot be reached on foot drops the plan.
    fn finish_plan(&mut self, mut t: SimTime, ctx: &mut AgentContext<'_>) -> Vec<Event> {
        let Some(plan) = self.plans.peek().copied() else {
            self.route = None;
            return Vec::new();
        };
        if self.current != plan.goal {
            let query = SearchQuery::new(self.current, slice::from_ref(&plan.goal)).walking();
            match ctx.pathfinder.path_search(ctx.simplified, &query, ctx.rng) {
                Ok(path) if self.walk_speed > 0.0 => {
                    t += path.cost * ctx.pathfinder.params().walk_speed_kmh / self.walk_speed;
                }
                Ok(_) => {}
                Err(e) => {
                    log::debug!("passenger {}: no walk from {} to {}: {e}", self.id, self.current, plan.goal);
                    return self.abandon_plan(t);
                }
            }
        }
        self.plans.pop();
        self.route = None;
        self.current = plan.goal;
        vec![Event::new(t, EventType::AtGoal, self.id)]
    }

    fn search_alternative(
        &mut self,
        event: &Event,
        env:   &mut PassengerEnvironment,
        ctx:   &mut AgentContext<'_>,
    ) -> Vec<Event> {
        let stranded_at = env.stop_block.filter(|_| event.kind == EventType::RouteEndedAbruptly);
        if let Some(block) = stranded_at.or_else(|| self.waiting_block(env)) {
            self.current = block;
        }
        env.clear_vehicle();
        env.position = 0;
        self.route = None;
        self.walk_to_stop(env, ctx)
    }
}

impl StateMachine for PassengerAgent {
    type Status = PassengerStatus;
    type Env = PassengerEnvironment;

    fn status(&self) -> PassengerStatus {
        self.status
    }

    fn think(&self, event: &Event, env: &PassengerEnvironment) -> PassengerStatus {
        use PassengerStatus::*;
        match event.kind {
            EventType::Departure => WalkToStop,
            EventType::AtGoal | EventType::ImpossiblePlan => Idle,
            EventType::AtStop if self.max_waiting_time <= 0.0 => Idle,
            EventType::AtStop => Waiting,
            EventType::BusStop if self.status == Waiting => {
                let offered = env.bus_at_stop.is_some()
                    && env.current_line.is_some_and(|line| self.wants_line(line, env));
                if offered { BoardVehicle } else { Waiting }
            }
            EventType::BusStop if self.status == OnVehicle => {
                if self.ride_progress(env).1 { OnVehicle } else { ArrivalAtStop }
            }
            EventType::BoardVehicle => OnVehicle,
            EventType::GetOffVehicle => OffVehicle,
            EventType::RouteEndedAbruptly => SearchAlternative,
            EventType::WaitExpired if self.status == Waiting && self.wait_elapsed(env) => SearchAlternative,
            _ => self.status,
        }
    }

    fn take_action(
        &mut self,
        status: PassengerStatus,
        event:  &Event,
        env:    &mut PassengerEnvironment,
        ctx:    &mut AgentContext<'_>,
    ) -> Vec<Event> {
        use PassengerStatus::*;
        self.status = status;
        match (status, event.kind) {
            (Idle, EventType::AtGoal | EventType::ImpossiblePlan) => self.start_next_plan(env, ctx),
            // No patience for any bus at all.
            (Idle, EventType::AtStop) => self.abandon_plan(env.time),
            (WalkToStop, EventType::Departure) => self.walk_to_stop(env, ctx),
            (Waiting, EventType::AtStop) => {
                self.arrival_at_stop = env.time;
                vec![Event::new(env.time + self.max_waiting_time, EventType::WaitExpired, self.id)]
            }
            (BoardVehicle, EventType::BusStop) => {
                env.current_driver = env.bus_at_stop;
                vec![Event::new(env.time + ONBOARDING_MINUTES, EventType::BoardVehicle, self.id)]
            }
            (OnVehicle, EventType::BoardVehicle) => {
                env.bus_at_stop = None;
                Vec::new()
            }
            (OnVehicle, EventType::BusStop) => {
                env.position = self.ride_progress(env).0;
                Vec::new()
            }
            (ArrivalAtStop, EventType::BusStop) => {
                env.position = self.ride_progress(env).0;
                if let Some(hop) = self.route.as_ref().and_then(|r| r.get(env.position)) {
                    self.current = hop.block;
                }
                vec![Event::new(env.time + ALIGHTING_MINUTES, EventType::GetOffVehicle, self.id)]
            }
            (OffVehicle, EventType::GetOffVehicle) => {
                env.clear_vehicle();
                self.walk_on(env.time, env, ctx)
            }
            (SearchAlternative, EventType::WaitExpired | EventType::RouteEndedAbruptly) => {
                self.search_alternative(event, env, ctx)
            }
            _ => Vec::new(),
        }
    }
}
