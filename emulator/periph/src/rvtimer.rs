// Licensed under the Apache-2.0 license

//! RISC-V machine-mode timer.
//!
//! A 64-bit monotonic counter with a compare register and a prescaler that
//! divides the 200 MHz input down to the counting rate. The timer drives the
//! MTIP wire of every shire selected by its delivery mask.

use erbium_emu_bus::Agent;
use erbium_emu_types::NUM_SHIRES;

// Generate 10MHz from the 200MHz prescaler input.
const PRESCALER_THRESHOLD_RESET: u32 = 20;

pub struct RVTimer {
    mtime: u64,
    mtimecmp: u64,
    prescaler: u32,
    prescaler_threshold: u32,
    ref_clock_mux: u32,
    interrupt: bool,
    target_mask: u64,
    default_target_mask: u64,
}

impl RVTimer {
    /// A timer whose MTIP is delivered to the shires selected by `target_mask`
    /// until the mask is reprogrammed.
    pub fn new(target_mask: u64) -> Self {
        let mut timer = Self {
            mtime: 0,
            mtimecmp: u64::MAX,
            prescaler: 0,
            prescaler_threshold: PRESCALER_THRESHOLD_RESET,
            ref_clock_mux: 0,
            interrupt: false,
            target_mask,
            default_target_mask: target_mask,
        };
        timer.reset();
        timer
    }

    pub fn reset(&mut self) {
        self.mtime = 0;
        self.prescaler = 0;
        self.prescaler_threshold = PRESCALER_THRESHOLD_RESET;
        self.ref_clock_mux = 0; // unused, only stores value
        self.mtimecmp = u64::MAX;
        self.interrupt = false;
        self.target_mask = self.default_target_mask;
    }

    pub fn is_active(&self) -> bool {
        self.mtimecmp != u64::MAX
    }

    pub fn interrupt_asserted(&self) -> bool {
        self.interrupt
    }

    pub fn read_mtime(&self) -> u64 {
        self.mtime
    }

    pub fn write_mtime(&mut self, _agent: &Agent, val: u64) {
        self.mtime = val;
    }

    pub fn read_mtimecmp(&self) -> u64 {
        self.mtimecmp
    }

    /// Store a new compare value and recompute the interrupt state. A 1->0
    /// transition deasserts MTIP on the delivery mask. A 0->1 transition
    /// (compare value at or below the current count) asserts MTIP before the
    /// write returns, so the guest observes it on the very next `mip` read.
    pub fn write_mtimecmp(&mut self, agent: &Agent, val: u64) {
        let had_interrupt = self.interrupt;
        self.mtimecmp = val;
        self.interrupt = val != u64::MAX && self.mtime >= val;
        if had_interrupt && !self.interrupt {
            self.clear_targets(agent);
        } else if !had_interrupt && self.interrupt {
            self.raise_targets(agent);
        }
    }

    pub fn read_time_config(&self) -> u32 {
        (self.prescaler_threshold & 0x7f) | (self.ref_clock_mux << 7)
    }

    pub fn write_time_config(&mut self, _agent: &Agent, val: u32) {
        self.prescaler_threshold = val & 0x7f;
        self.ref_clock_mux = (val >> 7) & 0x1;
    }

    pub fn read_target_mask(&self) -> u64 {
        self.target_mask
    }

    pub fn write_target_mask(&mut self, _agent: &Agent, val: u64) {
        self.target_mask = val;
    }

    /// Advance the counter one step and assert MTIP on reaching the compare
    /// value.
    pub fn clock_tick(&mut self, agent: &Agent) {
        self.mtime = self.mtime.wrapping_add(1);
        if self.is_active() && self.mtime >= self.mtimecmp && !self.interrupt {
            self.raise_targets(agent);
            self.interrupt = true;
        }
    }

    /// Divide the prescaler input; every `prescaler_threshold`-th call counts.
    pub fn prescaler_tick(&mut self, agent: &Agent) {
        self.prescaler += 1;
        if self.prescaler >= self.prescaler_threshold {
            self.prescaler = 0;
            self.clock_tick(agent);
        }
    }

    fn raise_targets(&self, agent: &Agent) {
        for shire in 0..NUM_SHIRES {
            if (self.target_mask >> shire) & 1 != 0 {
                agent.chip.raise_machine_timer_interrupt(shire);
            }
        }
    }

    fn clear_targets(&self, agent: &Agent) {
        for shire in 0..NUM_SHIRES {
            if (self.target_mask >> shire) & 1 != 0 {
                agent.chip.clear_machine_timer_interrupt(shire);
            }
        }
    }
}
