//! Trait for components that can be advanced by clock ticks.

use crate::Ticks;

/// A component that can be advanced by clock ticks.
///
/// This is the core abstraction for cycle-accurate emulation. Components
/// that own everything they touch (timers, peripherals with internal
/// state) implement this; CPUs use the bus-taking [`crate::Cpu::tick`]
/// instead because they need memory on specific cycles.
pub trait Tickable {
    /// Advance the component by one master clock tick.
    ///
    /// Components track their own phase relative to the master clock and
    /// perform work when appropriate (e.g., a peripheral running at half
    /// the master clock rate would only do work on every other tick).
    fn tick(&mut self);

    /// Advance the component by multiple ticks.
    ///
    /// Default implementation calls `tick()` in a loop. Components may
    /// override for efficiency, but must produce identical results.
    fn tick_n(&mut self, count: Ticks) {
        for _ in 0..count.get() {
            self.tick();
        }
    }
}
