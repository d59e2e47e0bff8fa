//! Lifecycle hooks at the host boundary
//!
//! Hooks are advisory: the engine's own state stays consistent whether
//! or not a hook is installed, and nothing in the simulation depends on
//! what a hook does.

use crate::config::SimulationSpace;

/// Synchronous callbacks invoked at playback state transitions.
///
/// All methods default to no-ops; implement only what the host needs.
pub trait EmitterHooks {
    /// Playback started fresh (accumulators were reset)
    fn on_start(&mut self) {}

    /// Playback stopped and the pool was cleared
    fn on_stop(&mut self) {}

    fn on_pause(&mut self) {}

    fn on_resume(&mut self) {}

    /// A non-looping emission window ran out; fired exactly once per start
    fn on_emission_complete(&mut self) {}

    /// A looping emission window wrapped; `count` starts at 1
    fn on_loop(&mut self, count: u32) {
        let _ = count;
    }

    /// The simulation space was switched at runtime
    fn on_simulation_space_changed(&mut self, from: SimulationSpace, to: SimulationSpace) {
        let _ = (from, to);
    }
}
