// Licensed under the Apache-2.0 license

//! External tick source.
//!
//! The simulator loop advances the driver once per 200MHz input cycle,
//! typically before executing an instruction. Each tick fans out to the
//! watchdog and the machine timer through `MainMemory`.

use erbium_emu_bus::{Agent, Clock};

use crate::root_bus::MainMemory;

#[derive(Default)]
pub struct ClockDriver {
    clock: Clock,
}

impl ClockDriver {
    pub fn new() -> Self {
        Self {
            clock: Clock::new(),
        }
    }

    /// Cycles driven so far.
    pub fn cycle(&self) -> u64 {
        self.clock.now()
    }

    /// Advance one cycle and deliver it to the clocked devices.
    pub fn tick(&self, agent: &Agent, mem: &mut MainMemory) {
        let cycle = self.clock.increment(1);
        mem.wdt_clock_tick(agent, cycle);
        mem.rvtimer_clock_tick(agent, cycle);
    }

    /// Advance `cycles` cycles.
    pub fn run(&self, agent: &Agent, mem: &mut MainMemory, cycles: u64) {
        for _ in 0..cycles {
            self.tick(agent, mem);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::TestChip;
    use erbium_emu_types::{RvAddr, RvSize};

    const ESR_BASE: RvAddr = 0x08_0000_0000;
    const ESR_MTIMECMP: RvAddr = ESR_BASE + 0x00f4_0208;
    const ESR_MTIME_LOCAL_TARGET: RvAddr = ESR_BASE + 0x00f4_0218;

    #[test]
    fn test_ticks_advance_timer_and_watchdog() {
        let chip = TestChip::new();
        let agent = Agent::new(&chip, 0, 0);
        let mut mem = MainMemory::new();
        let driver = ClockDriver::new();

        // 100 input cycles = one mtime count (divide by 5, prescale by 20).
        driver.run(&agent, &mut mem, 100);
        assert_eq!(driver.cycle(), 100);
        assert_eq!(mem.rvtimer_read_mtime(), 1);

        // The watchdog counts down too: 100 cycles / divider 4 = 25 steps.
        let count = mem
            .read(&agent, 0x02_0000_0010, RvSize::Word)
            .unwrap();
        assert_eq!(count, (1u64 << 24) - 25);
    }

    #[test]
    fn test_timer_fires_on_tick_boundary() {
        let chip = TestChip::new();
        let agent = Agent::new(&chip, 0, 0);
        let mut mem = MainMemory::new();
        let driver = ClockDriver::new();

        mem.write(&agent, ESR_MTIME_LOCAL_TARGET, RvSize::DWord, 0x1).unwrap();
        mem.write(&agent, ESR_MTIMECMP, RvSize::DWord, 2).unwrap();

        driver.run(&agent, &mut mem, 100);
        assert!(!chip.mtip(0));
        driver.run(&agent, &mut mem, 100);
        assert!(chip.mtip(0));
        assert_eq!(chip.raise_count(), 1);
    }
}
