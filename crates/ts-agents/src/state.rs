//! The `StateMachine` trait shared by drivers and passengers.

use ts_events::Event;

use crate::AgentContext;

/// Event-driven agent behaviour, split in two phases.
///
/// The orchestrator calls [`think`][Self::think] with the popped event and
/// the agent's refreshed environment to pick the next status, then
/// [`take_action`][Self::take_action] to apply it.  Every event returned by
/// `take_action` is pushed onto the global queue.
///
/// ```rust,ignore
/// let next = agent.think(&event, &env);
/// let follow_up = agent.take_action(next, &event, &mut env, &mut ctx);
/// queue.extend(follow_up);
/// ```
pub trait StateMachine {
    type Status: Copy + Eq + std::fmt::Debug;
    type Env;

    fn status(&self) -> Self::Status;

    /// Pure decision: no agent or environment state changes.
    fn think(&self, event: &Event, env: &Self::Env) -> Self::Status;

    /// Enter `status` and perform its side effects.
    fn take_action(
        &mut self,
        status: Self::Status,
        event:  &Event,
        env:    &mut Self::Env,
        ctx:    &mut AgentContext<'_>,
    ) -> Vec<Event>;
}
