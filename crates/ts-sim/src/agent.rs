//! Tagged unions over the two agent kinds.
//!
//! The orchestrator keeps one arena of [`Agent`]s and one of
//! [`Environment`]s, both indexed by `AgentId`; an agent never holds its own
//! environment.

use ts_agents::{DriverAgent, DriverEnvironment, PassengerAgent, PassengerEnvironment};
use ts_core::AgentId;

pub enum Agent {
    Driver(DriverAgent),
    Passenger(PassengerAgent),
}

impl Agent {
    pub fn id(&self) -> AgentId {
        match self {
            Agent::Driver(d) => d.id(),
            Agent::Passenger(p) => p.id(),
        }
    }

    pub fn is_driver(&self) -> bool {
        matches!(self, Agent::Driver(_))
    }

    pub fn as_driver(&self) -> Option<&DriverAgent> {
        match self {
            Agent::Driver(d) => Some(d),
            Agent::Passenger(_) => None,
        }
    }

    pub fn as_passenger(&self) -> Option<&PassengerAgent> {
        match self {
            Agent::Passenger(p) => Some(p),
            Agent::Driver(_) => None,
        }
    }
}

pub enum Environment {
    Driver(DriverEnvironment),
    Passenger(PassengerEnvironment),
}

impl Environment {
    pub fn as_driver(&self) -> Option<&DriverEnvironment> {
        match self {
            Environment::Driver(e) => Some(e),
            Environment::Passenger(_) => None,
        }
    }

    pub fn as_driver_mut(&mut self) -> Option<&mut DriverEnvironment> {
        match self {
            Environment::Driver(e) => Some(e),
            Environment::Passenger(_) => None,
        }
    }

    pub fn as_passenger(&self) -> Option<&PassengerEnvironment> {
        match self {
            Environment::Passenger(e) => Some(e),
            Environment::Driver(_) => None,
        }
    }

    pub fn as_passenger_mut(&mut self) -> Option<&mut PassengerEnvironment> {
        match self {
            Environment::Passenger(e) => Some(e),
            Environment::Driver(_) => None,
        }
    }
}
