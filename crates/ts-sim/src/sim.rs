//! The `Simulation` struct and its event loop.

use std::collections::VecDeque;

use rustc_hash::FxHashMap;

use ts_agents::{
    AgentContext, Bus, BusModel, DriverAgent, DriverEnvironment, DriverStatus, PassengerAgent,
    PassengerEnvironment, PassengerStatus, StateMachine,
};
use ts_core::{AgentId, AgentRng, BlockId, BlockKey, RouteId, SimClock, SimConfig, SimTime};
use ts_events::{Event, EventQueue, EventType, PassengerProfile, PlanQueue};
use ts_graph::{Graph, Pathfinder};

use crate::agent::{Agent, Environment};
use crate::{EventRecord, RunSummary, SimError, SimObserver, SimResult, StopHandle};

// ── Simulation ────────────────────────────────────────────────────────────────

/// The discrete-event runner.
///
/// `Simulation<P>` owns the graphs, the global [`EventQueue`], one arena of
/// agents and one of environments (both indexed by [`AgentId`]), and the
/// shared bookkeeping drivers and passengers coordinate through:
///
/// - **stop queues**: passengers waiting at each stop, FIFO by arrival,
///   keyed by [`BlockKey`] so full-graph and simplified-graph blocks meet;
/// - **riders**: passengers aboard each driver's bus;
/// - **boarding**: the one passenger currently stepping onto each bus.
///
/// Each popped event is handled completely before the next pop:
///
/// ```text
/// pop (time, rank, seq)-smallest event
///   FUEL_SPENT / OBEY_SIGNAL   → bookkeeping only
///   driver BUS_STOP            → notify riders, offer a seat to the first
///                                suitable waiting passenger, set onboarding
///   driver ROUTE_ENDED*        → riders still aboard get ROUTE_ENDED_ABRUPTLY
///   refresh env (time, obstacle ahead) → think → take_action → push events
///   passenger follow-up        → join/leave stop queue, ride, alight
/// ```
///
/// Create via [`SimBuilder`][crate::SimBuilder].
pub struct Simulation<P: Pathfinder> {
    config:      SimConfig,
    clock:       SimClock,
    full:        Graph,
    simplified:  Graph,
    pathfinder:  P,
    queue:       EventQueue,

    agents:      Vec<Agent>,
    envs:        Vec<Environment>,
    rngs:        Vec<AgentRng>,

    stop_queues: FxHashMap<BlockKey, VecDeque<AgentId>>,
    waiting_at:  FxHashMap<AgentId, BlockKey>,
    riders:      Vec<Vec<AgentId>>,
    boarding:    Vec<Option<AgentId>>,

    obstacles:    Vec<BlockId>,
    gas_stations: Vec<BlockId>,
    stop:         StopHandle,
    summary:      RunSummary,
}

impl<P: Pathfinder> Simulation<P> {
    pub(crate) fn new(
        config:     SimConfig,
        full:       Graph,
        simplified: Graph,
        pathfinder: P,
        obstacles:  Vec<BlockId>,
        stop:       StopHandle,
    ) -> Self {
        let gas_stations = full.gas_stations();
        if gas_stations.is_empty() {
            log::warn!("road graph has no gas stations; drivers will refuel in place");
        }
        let clock = config.make_clock();
        let summary = RunSummary { final_time: clock.now, ..RunSummary::default() };
        Self {
            config,
            clock,
            full,
            simplified,
            pathfinder,
            queue: EventQueue::new(),
            agents: Vec::new(),
            envs: Vec::new(),
            rngs: Vec::new(),
            stop_queues: FxHashMap::default(),
            waiting_at: FxHashMap::default(),
            riders: Vec::new(),
            boarding: Vec::new(),
            obstacles,
            gas_stations,
            stop,
            summary,
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    pub fn full(&self) -> &Graph {
        &self.full
    }

    pub fn simplified(&self) -> &Graph {
        &self.simplified
    }

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    pub fn pending_events(&self) -> usize {
        self.queue.len()
    }

    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(id.index())
    }

    pub fn driver(&self, id: AgentId) -> Option<&DriverAgent> {
        self.agent(id)?.as_driver()
    }

    pub fn passenger(&self, id: AgentId) -> Option<&PassengerAgent> {
        self.agent(id)?.as_passenger()
    }

    pub fn driver_env(&self, id: AgentId) -> Option<&DriverEnvironment> {
        self.envs.get(id.index())?.as_driver()
    }

    pub fn passenger_env(&self, id: AgentId) -> Option<&PassengerEnvironment> {
        self.envs.get(id.index())?.as_passenger()
    }

    /// Ids of every registered driver, in registration order.
    pub fn drivers(&self) -> impl Iterator<Item = AgentId> + '_ {
        self.agents.iter().filter(|a| a.is_driver()).map(Agent::id)
    }

    /// Passengers queued at the stop with map key `key`, first in line first.
    pub fn waiting_at(&self, key: BlockKey) -> impl Iterator<Item = AgentId> + '_ {
        self.stop_queues.get(&key).into_iter().flatten().copied()
    }

    /// Passengers aboard `driver`'s bus.
    pub fn riders(&self, driver: AgentId) -> &[AgentId] {
        self.riders.get(driver.index()).map_or(&[], Vec::as_slice)
    }

    pub fn obstacles(&self) -> &[BlockId] {
        &self.obstacles
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    /// A handle that halts [`run`][Self::run] from another thread.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Ask the loop to halt after the event in progress.
    pub fn stop(&self) {
        self.stop.stop();
    }

    /// The id the next registered agent will receive.
    pub fn next_agent_id(&self) -> AgentId {
        AgentId::try_from(self.agents.len()).unwrap_or(AgentId::INVALID)
    }

    // ── Registration ──────────────────────────────────────────────────────

    /// Put a bus on `route`, leaving its first stop at `departure`.
    pub fn add_driver(&mut self, route: RouteId, departure: SimTime) -> SimResult<AgentId> {
        let id = self.next_agent_id();
        let mut rng = AgentRng::new(self.config.seed, id);
        let driver = DriverAgent::new(id, route, &self.full, self.config.driver_wait_time, &mut rng)?;
        self.insert_driver(driver, departure, rng)
    }

    /// Register a driver built by the caller.  Its id must equal
    /// [`next_agent_id`][Self::next_agent_id].
    pub fn add_driver_agent(&mut self, driver: DriverAgent, departure: SimTime) -> SimResult<AgentId> {
        let rng = AgentRng::new(self.config.seed, driver.id());
        self.insert_driver(driver, departure, rng)
    }

    fn insert_driver(&mut self, driver: DriverAgent, departure: SimTime, rng: AgentRng) -> SimResult<AgentId> {
        let expected = self.next_agent_id();
        if driver.id() != expected {
            return Err(SimError::Config(format!("driver id {} out of sequence, expected {expected}", driver.id())));
        }
        let bus = Bus::new(BusModel::for_route(driver.route_name()), self.config.min_fuel_level);
        log::debug!(
            "driver {expected}: line {} on a {}, ability {:.2}, departs at {departure}",
            driver.route_name(),
            bus.model,
            driver.ability()
        );
        let mut env = DriverEnvironment::new(departure, bus, self.gas_stations.clone());
        env.obstacles = self.obstacles.clone();

        self.queue.push(Event::new(departure, EventType::Departure, expected));
        self.summary.drivers += 1;
        Ok(self.register(Agent::Driver(driver), Environment::Driver(env), rng))
    }

    /// Register a passenger living at `home` (a simplified-graph block).
    ///
    /// Returns `Ok(None)` without registering when the first plan has no
    /// route: such a passenger would never leave home.
    pub fn add_passenger(
        &mut self,
        profile:   &PassengerProfile,
        plans:     PlanQueue,
        home:      BlockId,
        workplace: Option<BlockId>,
    ) -> SimResult<Option<AgentId>> {
        if !self.simplified.contains(home) {
            return Err(SimError::Config(format!("home {home} is not a stop block")));
        }
        let id = self.next_agent_id();
        let mut rng = AgentRng::new(self.config.seed, id);
        let mut passenger = PassengerAgent::new(id, profile, plans, home, workplace);
        let now = self.clock.now;
        let departure = {
            let mut ctx = AgentContext {
                full:       &self.full,
                simplified: &self.simplified,
                pathfinder: &self.pathfinder,
                config:     &self.config,
                rng:        &mut rng,
            };
            passenger.decide_departure_time(now, &mut ctx)
        };
        let Some(departure) = departure else {
            log::debug!("passenger {id}: first trip has no route; not registered");
            return Ok(None);
        };

        self.queue.push(Event::new(departure, EventType::Departure, id));
        self.summary.passengers += 1;
        let env = Environment::Passenger(PassengerEnvironment::new(now));
        Ok(Some(self.register(Agent::Passenger(passenger), env, rng)))
    }

    /// Close a road block.  Drivers detour around it from their next block.
    pub fn add_obstacle(&mut self, block: BlockId) -> SimResult<()> {
        if !self.full.contains(block) {
            return Err(SimError::Config(format!("obstacle {block} is not a block of the road graph")));
        }
        if self.obstacles.contains(&block) {
            return Ok(());
        }
        self.obstacles.push(block);
        for env in self.envs.iter_mut().filter_map(Environment::as_driver_mut) {
            env.obstacles.push(block);
        }
        Ok(())
    }

    fn register(&mut self, agent: Agent, env: Environment, rng: AgentRng) -> AgentId {
        let id = agent.id();
        self.agents.push(agent);
        self.envs.push(env);
        self.rngs.push(rng);
        self.riders.push(Vec::new());
        self.boarding.push(None);
        id
    }

    // ── Event loop ────────────────────────────────────────────────────────

    /// Run until the queue empties, the horizon is passed or a stop is
    /// requested.  Every processed event is reported to `observer`.
    pub fn run<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<RunSummary> {
        log::info!(
            "simulation starting at {}: {} drivers, {} passengers, {} queued events",
            self.clock,
            self.summary.drivers,
            self.summary.passengers,
            self.queue.len()
        );
        self.summary.stopped = false;
        loop {
            if self.stop.is_stopped() {
                log::info!("stop requested at {}", self.clock);
                self.summary.stopped = true;
                break;
            }
            match self.step()? {
                Some(record) => observer.on_event(&record),
                None => break,
            }
        }
        self.summary.final_time = self.clock.now;
        log::info!(
            "simulation ended at {}: {} events, {} boardings, {} plans completed, {} impossible",
            self.clock,
            self.summary.events,
            self.summary.boardings,
            self.summary.completed_plans,
            self.summary.impossible_plans
        );
        observer.on_sim_end(&self.summary);
        Ok(self.summary.clone())
    }

    /// Process exactly one event.  `None` once the queue is empty or the
    /// next event lies beyond the horizon (it stays queued).
    pub fn step(&mut self) -> SimResult<Option<EventRecord>> {
        match self.queue.next_time() {
            Some(t) if !self.clock.is_past_horizon(t) => {}
            _ => return Ok(None),
        }
        let Some(event) = self.queue.pop() else {
            return Ok(None);
        };
        self.clock.advance_to(event.time);

        let record = EventRecord {
            time:   event.time,
            kind:   event.kind,
            agent:  event.agent,
            driver: self.riding_with(event.agent),
        };
        match self.agents.get(event.agent.index()) {
            Some(Agent::Driver(_)) => self.handle_driver_event(&event)?,
            Some(Agent::Passenger(_)) => self.handle_passenger_event(&event)?,
            None => return Err(SimError::UnknownAgent(event.agent)),
        }
        self.tally(&record);
        Ok(Some(record))
    }

    fn riding_with(&self, id: AgentId) -> Option<AgentId> {
        let env = self.passenger_env(id)?;
        env.current_driver.or(env.bus_at_stop)
    }

    fn tally(&mut self, record: &EventRecord) {
        self.summary.events += 1;
        self.summary.final_time = record.time;
        match record.kind {
            EventType::AtGoal => self.summary.completed_plans += 1,
            EventType::ImpossiblePlan => self.summary.impossible_plans += 1,
            EventType::RouteEndedAbruptly if self.driver(record.agent).is_some() => {
                self.summary.abrupt_endings += 1;
            }
            _ => {}
        }
    }

    /// Refresh the agent's clock, let it think, act and queue the result.
    fn act(&mut self, event: &Event) -> SimResult<()> {
        let i = event.agent.index();
        let (Some(agent), Some(env), Some(rng)) =
            (self.agents.get_mut(i), self.envs.get_mut(i), self.rngs.get_mut(i))
        else {
            return Err(SimError::UnknownAgent(event.agent));
        };
        let mut ctx = AgentContext {
            full:       &self.full,
            simplified: &self.simplified,
            pathfinder: &self.pathfinder,
            config:     &self.config,
            rng,
        };
        let follow_up = match (agent, env) {
            (Agent::Driver(d), Environment::Driver(env)) => {
                env.time = event.time;
                let next = d.think(event, env);
                d.take_action(next, event, env, &mut ctx)
            }
            (Agent::Passenger(p), Environment::Passenger(env)) => {
                env.time = event.time;
                let next = p.think(event, env);
                p.take_action(next, event, env, &mut ctx)
            }
            (agent, _) => {
                let expected = if agent.is_driver() { "driver" } else { "passenger" };
                return Err(SimError::EnvironmentMismatch { agent: event.agent, expected });
            }
        };
        self.queue.extend(follow_up);
        Ok(())
    }

    // ── Drivers ───────────────────────────────────────────────────────────

    fn handle_driver_event(&mut self, event: &Event) -> SimResult<()> {
        let id = event.agent;
        match event.kind {
            EventType::FuelSpent => {
                let env = self.driver_env_mut(id)?;
                let km = env.pending_fuel.pop_front().unwrap_or(0.0);
                let burnt = env.bus.spend(km);
                log::trace!("driver {id}: {km:.3} km, {burnt:.3} fuel burnt, {:.2} left", env.bus.fuel);
                return Ok(());
            }
            EventType::ObeySignal => return Ok(()),
            EventType::BusStop => self.driver_at_stop(event)?,
            EventType::RouteEnded | EventType::RouteEndedAbruptly => self.strand_riders(event)?,
            _ => {}
        }

        let ahead = {
            let (driver, env) = self.driver_parts(id)?;
            driver.block_at(env).is_some_and(|b| env.obstacles.contains(&b))
        };
        self.driver_env_mut(id)?.obstacle_ahead = ahead;
        self.act(event)
    }

    /// The bus reached a stop element: tell riders where they are and offer
    /// a seat to the first suitable passenger in line.
    fn driver_at_stop(&mut self, event: &Event) -> SimResult<()> {
        let id = event.agent;
        let i = id.index();
        let (block, fresh) = {
            let (driver, env) = self.driver_parts(id)?;
            let Some(block) = driver.block_at(env) else {
                return Ok(());
            };
            (block, driver.status() != DriverStatus::WaitingAtStop)
        };

        if fresh {
            let stop = self.simplified.id_of(self.full.key_of(block));
            let riders = self.riders[i].clone();
            for rider in riders {
                self.passenger_env_mut(rider)?.stop_block = stop;
                self.queue.push(Event::new(event.time, EventType::BusStop, rider));
            }
        }
        if self.boarding[i].is_none() {
            self.offer_seat(id, block, event.time)?;
        }
        let onboarding = self.boarding[i].is_some();
        self.driver_env_mut(id)?.onboarding = onboarding;
        Ok(())
    }

    /// Reserve a seat for the first passenger queued at `block` who wants
    /// this line towards a stop still ahead of the bus.
    fn offer_seat(&mut self, driver_id: AgentId, block: BlockId, t: SimTime) -> SimResult<()> {
        let key = self.full.key_of(block);
        let (line, idx) = {
            let (driver, env) = self.driver_parts(driver_id)?;
            if !env.bus.has_seat() {
                return Ok(());
            }
            let Some(queue) = self.stop_queues.get(&key) else {
                return Ok(());
            };
            let line = driver.route();
            let Some(idx) = queue.iter().position(|&p| self.accepts(p, line, driver, env)) else {
                return Ok(());
            };
            (line, idx)
        };

        if !self.driver_env_mut(driver_id)?.bus.board() {
            return Ok(());
        }
        let Some(passenger) = self.stop_queues.get_mut(&key).and_then(|q| q.remove(idx)) else {
            self.driver_env_mut(driver_id)?.bus.alight();
            return Ok(());
        };
        self.waiting_at.remove(&passenger);
        let penv = self.passenger_env_mut(passenger)?;
        penv.bus_at_stop = Some(driver_id);
        penv.current_line = Some(line);
        self.boarding[driver_id.index()] = Some(passenger);
        self.queue.push(Event::new(t, EventType::BusStop, passenger));
        log::trace!("driver {driver_id}: seat offered to passenger {passenger} at {key}");
        Ok(())
    }

    fn accepts(&self, passenger: AgentId, line: RouteId, driver: &DriverAgent, denv: &DriverEnvironment) -> bool {
        let Ok((p, penv)) = self.passenger_parts(passenger) else {
            return false;
        };
        if p.status() != PassengerStatus::Waiting || !p.wants_line(line, penv) {
            return false;
        }
        p.next_stop(penv)
            .and_then(|s| self.full.id_of(self.simplified.key_of(s)))
            .is_some_and(|b| driver.visits_ahead(b, denv))
    }

    /// The leg is over: whoever is still aboard has to find another way.
    fn strand_riders(&mut self, event: &Event) -> SimResult<()> {
        let id = event.agent;
        let riders = std::mem::take(&mut self.riders[id.index()]);
        if riders.is_empty() {
            return Ok(());
        }
        let stop = {
            let (driver, env) = self.driver_parts(id)?;
            driver.current_block(env).and_then(|b| self.simplified.id_of(self.full.key_of(b)))
        };
        log::info!("driver {id}: leg ended with {} passengers aboard", riders.len());
        for rider in riders {
            self.driver_env_mut(id)?.bus.alight();
            self.passenger_env_mut(rider)?.stop_block = stop;
            self.queue.push(Event::new(event.time, EventType::RouteEndedAbruptly, rider));
        }
        Ok(())
    }

    // ── Passengers ────────────────────────────────────────────────────────

    fn handle_passenger_event(&mut self, event: &Event) -> SimResult<()> {
        use PassengerStatus::*;

        let id = event.agent;
        let before = self.passenger_parts(id)?.0.status();
        self.act(event)?;
        let after = self.passenger_parts(id)?.0.status();

        if before == Waiting && !matches!(after, Waiting | BoardVehicle) {
            self.leave_stop(id);
        }
        if after == Waiting && before != Waiting {
            self.join_stop(id, false)?;
        }

        match (event.kind, after) {
            (EventType::BusStop, ArrivalAtStop) => self.alight(id)?,
            (EventType::BoardVehicle, OnVehicle) => self.finish_boarding(id, event.time)?,
            (EventType::BusStop, BoardVehicle) => {}
            (EventType::BusStop, _) => {
                if let Some(driver) = self.passenger_parts(id)?.1.bus_at_stop {
                    self.decline_seat(id, driver, event.time)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn join_stop(&mut self, id: AgentId, front: bool) -> SimResult<()> {
        let (p, penv) = self.passenger_parts(id)?;
        let Some(block) = p.waiting_block(penv) else {
            return Ok(());
        };
        let key = self.simplified.key_of(block);
        let queue = self.stop_queues.entry(key).or_default();
        if front {
            queue.push_front(id);
        } else {
            queue.push_back(id);
        }
        self.waiting_at.insert(id, key);
        Ok(())
    }

    fn leave_stop(&mut self, id: AgentId) {
        if let Some(key) = self.waiting_at.remove(&id) {
            if let Some(queue) = self.stop_queues.get_mut(&key) {
                queue.retain(|&p| p != id);
            }
        }
    }

    /// The passenger is aboard: record it and let the next one in line try.
    fn finish_boarding(&mut self, id: AgentId, t: SimTime) -> SimResult<()> {
        let Some(driver) = self.passenger_parts(id)?.1.current_driver else {
            return Ok(());
        };
        let d = driver.index();
        self.riders[d].push(id);
        if self.boarding[d] == Some(id) {
            self.boarding[d] = None;
        }
        self.summary.boardings += 1;
        self.retry_boarding(driver, t)
    }

    /// An offered seat was not taken: give it back and offer it again.
    fn decline_seat(&mut self, id: AgentId, driver: AgentId, t: SimTime) -> SimResult<()> {
        let penv = self.passenger_env_mut(id)?;
        penv.bus_at_stop = None;
        penv.current_line = None;
        self.driver_env_mut(driver)?.bus.alight();
        if self.boarding[driver.index()] == Some(id) {
            self.boarding[driver.index()] = None;
        }
        if self.passenger_parts(id)?.0.status() == PassengerStatus::Waiting {
            self.join_stop(id, true)?;
        }
        self.retry_boarding(driver, t)
    }

    fn retry_boarding(&mut self, driver: AgentId, t: SimTime) -> SimResult<()> {
        let at_stop = {
            let (d, env) = self.driver_parts(driver)?;
            if d.status() == DriverStatus::WaitingAtStop { d.block_at(env) } else { None }
        };
        if let Some(block) = at_stop {
            if self.boarding[driver.index()].is_none() {
                self.offer_seat(driver, block, t)?;
            }
        }
        let onboarding = self.boarding[driver.index()].is_some();
        self.driver_env_mut(driver)?.onboarding = onboarding;
        Ok(())
    }

    fn alight(&mut self, id: AgentId) -> SimResult<()> {
        let Some(driver) = self.passenger_parts(id)?.1.current_driver else {
            return Ok(());
        };
        let riders = &mut self.riders[driver.index()];
        if let Some(pos) = riders.iter().position(|&r| r == id) {
            riders.remove(pos);
            self.driver_env_mut(driver)?.bus.alight();
        }
        Ok(())
    }

    // ── Arena access ──────────────────────────────────────────────────────

    fn driver_parts(&self, id: AgentId) -> SimResult<(&DriverAgent, &DriverEnvironment)> {
        match (self.agents.get(id.index()), self.envs.get(id.index())) {
            (Some(Agent::Driver(d)), Some(Environment::Driver(e))) => Ok((d, e)),
            (Some(_), _) => Err(SimError::EnvironmentMismatch { agent: id, expected: "driver" }),
            _ => Err(SimError::UnknownAgent(id)),
        }
    }

    fn passenger_parts(&self, id: AgentId) -> SimResult<(&PassengerAgent, &PassengerEnvironment)> {
        match (self.agents.get(id.index()), self.envs.get(id.index())) {
            (Some(Agent::Passenger(p)), Some(Environment::Passenger(e))) => Ok((p, e)),
            (Some(_), _) => Err(SimError::EnvironmentMismatch { agent: id, expected: "passenger" }),
            _ => Err(SimError::UnknownAgent(id)),
        }
    }

    fn driver_env_mut(&mut self, id: AgentId) -> SimResult<&mut DriverEnvironment> {
        self.envs
            .get_mut(id.index())
            .ok_or(SimError::UnknownAgent(id))?
            .as_driver_mut()
            .ok_or(SimError::EnvironmentMismatch { agent: id, expected: "driver" })
    }

    fn passenger_env_mut(&mut self, id: AgentId) -> SimResult<&mut PassengerEnvironment> {
        self.envs
            .get_mut(id.index())
            .ok_or(SimError::UnknownAgent(id))?
            .as_passenger_mut()
            .ok_or(SimError::EnvironmentMismatch { agent: id, expected: "passenger" })
    }
}
