//! CPU core trait.

use crate::Bus;

/// A CPU core.
///
/// CPUs execute instructions and access memory through a bus. Unlike other
/// `Tickable` components, CPUs take a bus reference in their tick method
/// because they need to access memory on specific cycles.
///
/// CPUs expose their internal state for observation and debugging.
pub trait Cpu {
    /// The type used for register inspection.
    type Registers;

    /// Advance the CPU by one clock cycle.
    ///
    /// The bus is passed in, not owned, so it can be shared with other
    /// components (e.g., video chip). The bus may return wait states for
    /// peripheral accesses; the CPU stalls for that many ticks before its
    /// next bus cycle.
    fn tick<B: Bus>(&mut self, bus: &mut B);

    /// Returns the current program counter.
    ///
    /// Returns `u32` to support all CPU address widths. CPUs with narrower
    /// program counters zero-extend.
    fn pc(&self) -> u32;

    /// Returns a snapshot of all registers for inspection.
    fn registers(&self) -> Self::Registers;

    /// Returns true if the CPU is halted (stopped or waiting for an
    /// interrupt).
    fn is_halted(&self) -> bool;

    /// Request a maskable interrupt. Returns true if the CPU will take it.
    fn interrupt(&mut self) -> bool;

    /// Request a non-maskable interrupt (edge-triggered).
    fn nmi(&mut self);

    /// Force the CPU into its reset sequence, discarding any in-flight
    /// work.
    fn reset(&mut self);
}
