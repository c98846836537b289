// Licensed under the Apache-2.0 license

//! Standalone timer block of the SPIO SoC variant.
//!
//! A thin address decoder over [`RVTimer`]: MTIME at 0x0 and MTIMECMP at 0x8,
//! reachable with 8-byte accesses or 4-byte half accesses. Partial writes
//! preserve the untouched half. Any other offset or width is an access fault.

use erbium_emu_bus::{Agent, MemoryError, MemoryRegion};
use erbium_emu_types::{RvAddr, RvData, RvSize, IO_SHIRE};

use crate::rvtimer::RVTimer;

const REG_MTIME: RvAddr = 0x0;
const REG_MTIME_HI: RvAddr = REG_MTIME + 4;
const REG_MTIMECMP: RvAddr = 0x8;
const REG_MTIMECMP_HI: RvAddr = REG_MTIMECMP + 4;

pub struct SpioRVTimerRegion {
    base: RvAddr,
    size: RvAddr,
    pub rvtimer: RVTimer,
}

impl SpioRVTimerRegion {
    pub fn new(base: RvAddr, size: RvAddr) -> Self {
        Self {
            base,
            size,
            rvtimer: RVTimer::new(1 << IO_SHIRE),
        }
    }

    fn fault(&self, pos: RvAddr) -> MemoryError {
        MemoryError::AccessFault {
            addr: self.base + pos,
        }
    }
}

impl MemoryRegion for SpioRVTimerRegion {
    fn mmap_addr(&self) -> RvAddr {
        self.base
    }

    fn mmap_size(&self) -> RvAddr {
        self.size
    }

    fn read(&mut self, _agent: &Agent, pos: RvAddr, size: RvSize) -> Result<RvData, MemoryError> {
        match size {
            RvSize::DWord => match pos {
                REG_MTIME => Ok(self.rvtimer.read_mtime()),
                REG_MTIMECMP => Ok(self.rvtimer.read_mtimecmp()),
                _ => Err(self.fault(pos)),
            },
            RvSize::Word => match pos {
                REG_MTIME => Ok(self.rvtimer.read_mtime() as u32 as RvData),
                REG_MTIME_HI => Ok(self.rvtimer.read_mtime() >> 32),
                REG_MTIMECMP => Ok(self.rvtimer.read_mtimecmp() as u32 as RvData),
                REG_MTIMECMP_HI => Ok(self.rvtimer.read_mtimecmp() >> 32),
                _ => Err(self.fault(pos)),
            },
            _ => Err(self.fault(pos)),
        }
    }

    fn write(
        &mut self,
        agent: &Agent,
        pos: RvAddr,
        size: RvSize,
        val: RvData,
    ) -> Result<(), MemoryError> {
        match size {
            RvSize::DWord => match pos {
                REG_MTIME => self.rvtimer.write_mtime(agent, val),
                REG_MTIMECMP => self.rvtimer.write_mtimecmp(agent, val),
                _ => return Err(self.fault(pos)),
            },
            RvSize::Word => {
                let low = val & 0xffff_ffff;
                match pos {
                    REG_MTIME => {
                        let next = (self.rvtimer.read_mtime() & !0xffff_ffff) | low;
                        self.rvtimer.write_mtime(agent, next);
                    }
                    REG_MTIME_HI => {
                        let next = (self.rvtimer.read_mtime() & 0xffff_ffff) | (low << 32);
                        self.rvtimer.write_mtime(agent, next);
                    }
                    REG_MTIMECMP => {
                        let next = (self.rvtimer.read_mtimecmp() & !0xffff_ffff) | low;
                        self.rvtimer.write_mtimecmp(agent, next);
                    }
                    REG_MTIMECMP_HI => {
                        let next = (self.rvtimer.read_mtimecmp() & 0xffff_ffff) | (low << 32);
                        self.rvtimer.write_mtimecmp(agent, next);
                    }
                    _ => return Err(self.fault(pos)),
                }
            }
            _ => return Err(self.fault(pos)),
        }
        Ok(())
    }
}
