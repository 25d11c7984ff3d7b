//! Bus arbiter: serialises CPU memory traffic and carries wait states.
//!
//! Every access goes through the arbiter, one at a time. Plain memory
//! answers in the same tick. A device may instead report a wait count
//! when the access is issued; the arbiter then holds the transfer open
//! and burns one wait per tick, handing the data (or the store
//! completion) back when the count reaches zero. The sequencer stalls
//! on `None`/`false` without advancing its instruction cycle, so a
//! zero-wait access costs exactly one tick and an N-wait access costs
//! N extra.
//!
//! Devices are expected to live in the peripheral window, the top 512
//! bytes of the 16-bit address space; see [`is_peripheral`]. The
//! arbiter itself honours a wait count from any address.

use emu_core::Bus;

/// Base address of the memory-mapped peripheral window.
pub const PERIPHERAL_BASE: u32 = 0x0000_FE00;

/// Address-bit mask that isolates the peripheral window.
pub const PERIPHERAL_MASK: u32 = 0xFFFF_FE00;

/// True if the address falls in the peripheral window ($FE00-$FFFF).
///
/// The window sits in the legacy address space so the same devices are
/// reachable from both operating modes.
#[must_use]
pub const fn is_peripheral(address: u32) -> bool {
    address & PERIPHERAL_MASK == PERIPHERAL_BASE
}

/// Where the arbiter is in the current transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusPhase {
    /// No transfer in flight.
    Idle,
    /// A read was issued and is waiting for the device.
    LoadPending,
    /// A write was issued and is waiting for the device.
    StorePending,
    /// Waits are being burned down; completes when the count hits zero.
    TransferInProgress,
}

impl BusPhase {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            BusPhase::Idle => "idle",
            BusPhase::LoadPending => "load-pending",
            BusPhase::StorePending => "store-pending",
            BusPhase::TransferInProgress => "transfer-in-progress",
        }
    }
}

/// Single-transfer bus arbiter.
///
/// At most one load or store is in flight at any time; the sequencer
/// never issues a new access until the previous one completed.
#[derive(Debug, Clone)]
pub struct BusArbiter {
    phase: BusPhase,
    wait: u8,
    latched: u8,
}

impl BusArbiter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            phase: BusPhase::Idle,
            wait: 0,
            latched: 0,
        }
    }

    /// Read one byte. Issues the access on the first call and returns
    /// the data once the device has answered; `None` means the caller
    /// must retry next tick.
    pub fn load<B: Bus>(&mut self, bus: &mut B, address: u32) -> Option<u8> {
        match self.phase {
            BusPhase::Idle => {
                let result = bus.read(address);
                if result.wait == 0 {
                    return Some(result.data);
                }
                self.latched = result.data;
                self.wait = result.wait;
                self.phase = BusPhase::LoadPending;
                None
            }
            BusPhase::LoadPending | BusPhase::TransferInProgress => {
                self.wait -= 1;
                if self.wait == 0 {
                    self.phase = BusPhase::Idle;
                    Some(self.latched)
                } else {
                    self.phase = BusPhase::TransferInProgress;
                    None
                }
            }
            BusPhase::StorePending => unreachable!("load issued while a store is in flight"),
        }
    }

    /// Write one byte. Returns true once the store has completed;
    /// `false` means the caller must retry next tick.
    pub fn store<B: Bus>(&mut self, bus: &mut B, address: u32, value: u8) -> bool {
        match self.phase {
            BusPhase::Idle => {
                let wait = bus.write(address, value);
                if wait == 0 {
                    return true;
                }
                self.wait = wait;
                self.phase = BusPhase::StorePending;
                false
            }
            BusPhase::StorePending | BusPhase::TransferInProgress => {
                self.wait -= 1;
                if self.wait == 0 {
                    self.phase = BusPhase::Idle;
                    true
                } else {
                    self.phase = BusPhase::TransferInProgress;
                    false
                }
            }
            BusPhase::LoadPending => unreachable!("store issued while a load is in flight"),
        }
    }

    #[must_use]
    pub fn phase(&self) -> BusPhase {
        self.phase
    }

    /// True while a transfer is still waiting on the device.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.phase != BusPhase::Idle
    }

    /// Abandon any in-flight transfer. Used on CPU reset; the device
    /// side is not notified.
    pub fn reset(&mut self) {
        self.phase = BusPhase::Idle;
        self.wait = 0;
    }
}

impl Default for BusArbiter {
    fn default() -> Self {
        Self::new()
    }
}
