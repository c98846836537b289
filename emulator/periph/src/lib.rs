/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    File contains exports for the Erbium Emulator Peripheral library.

--*/

mod clock_driver;
mod esr;
mod plic;
mod root_bus;
mod rvtimer;
mod sysregs;
mod timer_region;
mod uart;
mod watchdog;

#[cfg(test)]
pub(crate) mod test_util;

pub use clock_driver::ClockDriver;
pub use esr::EsrRegion;
pub use plic::{ErPlic, NUM_CONTEXTS, NUM_SOURCES};
pub use root_bus::MainMemory;
pub use rvtimer::RVTimer;
pub use sysregs::{PowerDomainReq, ResetCause, SoftReset, SpinLock, SysregsEr, SystemConfig, WatchdogCtl};
pub use timer_region::SpioRVTimerRegion;
pub use uart::{ShaktiUart, UartLayout};
pub use watchdog::{TimeoutHandler, Watchdog};
