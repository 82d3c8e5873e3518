//! Cooperative halt flag shared with the caller.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cloneable handle that asks a running [`Simulation`][crate::Simulation]
/// to stop.  The flag is checked once per loop iteration, so the event
/// being processed always completes.
#[derive(Clone, Debug, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Clear the flag so the same simulation can be resumed.
    pub fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}
