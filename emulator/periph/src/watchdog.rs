// Licensed under the Apache-2.0 license

//! Watchdog down-counter.
//!
//! A divide-by-D tick source drives a 32-bit countdown from a configured
//! reload value. A latched kick reloads the countdown on the next divided
//! tick; reaching zero invokes the timeout handler, which in Erbium requests
//! a cold reset of the chip.

use erbium_emu_bus::Agent;

/// Timeout callback. Runs synchronously from inside `clock_tick`.
pub type TimeoutHandler = fn(&Agent);

pub struct Watchdog {
    divider: u32,
    divider_count: u32,
    count: u32,
    reload: u32,
    enabled: bool,
    kicked: bool,
    on_timeout: TimeoutHandler,
}

impl Watchdog {
    pub fn new(divider: u32, reload: u32, on_timeout: TimeoutHandler) -> Self {
        assert!(divider > 0);
        Self {
            divider,
            divider_count: 0,
            count: reload,
            reload,
            enabled: true,
            kicked: false,
            on_timeout,
        }
    }

    pub fn reset(&mut self) {
        self.divider_count = 0;
        self.count = self.reload;
        self.kicked = false;
        self.enabled = true;
    }

    /// Latch a kick; the countdown reloads on the next divided tick.
    pub fn kick(&mut self) {
        self.kicked = true;
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Current countdown snapshot.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Advance one system-clock cycle. Every `divider`-th call the countdown
    /// moves: a latched kick reloads it, otherwise it decrements and fires
    /// the timeout handler on reaching zero.
    pub fn clock_tick(&mut self, agent: &Agent) {
        self.divider_count += 1;
        if self.divider_count < self.divider {
            return;
        }
        self.divider_count = 0;

        if !self.enabled {
            return;
        }
        if self.kicked {
            self.count = self.reload;
            self.kicked = false;
            return;
        }
        if self.count > 0 {
            self.count -= 1;
            if self.count == 0 {
                log::warn!("watchdog: countdown expired");
                (self.on_timeout)(agent);
            }
        }
    }
}
