// Licensed under the Apache-2.0 license

//! External System Register block.
//!
//! The 16 MiB ESR window hosts the Erbium machine timer. MTIME and MTIMECMP
//! take 8-byte accesses or 4-byte half accesses with the untouched half
//! preserved; MTIME_LOCAL_TARGET is the interrupt-delivery mask. The rest of
//! the block (IPI triggers, per-thread control) is modeled elsewhere in the
//! emulator: those offsets read zero and swallow writes.

use erbium_emu_bus::{Agent, MemoryError, MemoryRegion};
use erbium_emu_types::{RvAddr, RvData, RvSize};

use crate::rvtimer::RVTimer;

const REG_MTIME: RvAddr = 0x00f4_0200;
const REG_MTIME_HI: RvAddr = REG_MTIME + 4;
const REG_MTIMECMP: RvAddr = 0x00f4_0208;
const REG_MTIMECMP_HI: RvAddr = REG_MTIMECMP + 4;
const REG_MTIME_LOCAL_TARGET: RvAddr = 0x00f4_0218;
const REG_MTIME_LOCAL_TARGET_HI: RvAddr = REG_MTIME_LOCAL_TARGET + 4;

pub struct EsrRegion {
    base: RvAddr,
    size: RvAddr,
    pub rvtimer: RVTimer,
}

impl EsrRegion {
    pub fn new(base: RvAddr, size: RvAddr) -> Self {
        Self {
            base,
            size,
            // No delivery until the guest programs MTIME_LOCAL_TARGET.
            rvtimer: RVTimer::new(0),
        }
    }

    fn fault(&self, pos: RvAddr) -> MemoryError {
        MemoryError::AccessFault {
            addr: self.base + pos,
        }
    }
}

impl MemoryRegion for EsrRegion {
    fn mmap_addr(&self) -> RvAddr {
        self.base
    }

    fn mmap_size(&self) -> RvAddr {
        self.size
    }

    fn read(&mut self, _agent: &Agent, pos: RvAddr, size: RvSize) -> Result<RvData, MemoryError> {
        match size {
            RvSize::DWord => Ok(match pos {
                REG_MTIME => self.rvtimer.read_mtime(),
                REG_MTIMECMP => self.rvtimer.read_mtimecmp(),
                REG_MTIME_LOCAL_TARGET => self.rvtimer.read_target_mask(),
                _ => 0,
            }),
            RvSize::Word => Ok(match pos {
                REG_MTIME => self.rvtimer.read_mtime() & 0xffff_ffff,
                REG_MTIME_HI => self.rvtimer.read_mtime() >> 32,
                REG_MTIMECMP => self.rvtimer.read_mtimecmp() & 0xffff_ffff,
                REG_MTIMECMP_HI => self.rvtimer.read_mtimecmp() >> 32,
                REG_MTIME_LOCAL_TARGET => self.rvtimer.read_target_mask() & 0xffff_ffff,
                REG_MTIME_LOCAL_TARGET_HI => self.rvtimer.read_target_mask() >> 32,
                _ => 0,
            }),
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
                REG_MTIME_LOCAL_TARGET => self.rvtimer.write_target_mask(agent, val),
                _ => (),
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
                    REG_MTIME_LOCAL_TARGET => {
                        let next = (self.rvtimer.read_target_mask() & !0xffff_ffff) | low;
                        self.rvtimer.write_target_mask(agent, next);
                    }
                    REG_MTIME_LOCAL_TARGET_HI => {
                        let next = (self.rvtimer.read_target_mask() & 0xffff_ffff) | (low << 32);
                        self.rvtimer.write_target_mask(agent, next);
                    }
                    _ => (),
                }
            }
            _ => return Err(self.fault(pos)),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::TestChip;

    fn region() -> EsrRegion {
        EsrRegion::new(0x08_0000_0000, 16 * 1024 * 1024)
    }

    #[test]
    fn test_timer_registers() {
        let chip = TestChip::new();
        let agent = Agent::new(&chip, 0, 0);
        let mut esr = region();

        esr.write(&agent, REG_MTIME_LOCAL_TARGET, RvSize::DWord, 0x1).unwrap();
        assert_eq!(
            esr.read(&agent, REG_MTIME_LOCAL_TARGET, RvSize::DWord).unwrap(),
            0x1
        );

        esr.write(&agent, REG_MTIME, RvSize::DWord, 1000).unwrap();
        esr.write(&agent, REG_MTIMECMP, RvSize::DWord, 1_000_000).unwrap();
        assert!(!chip.mtip(0));

        // Compare value in the past asserts MTIP before the write returns.
        esr.write(&agent, REG_MTIMECMP, RvSize::DWord, 500).unwrap();
        assert!(chip.mtip(0));
    }

    #[test]
    fn test_no_delivery_until_target_programmed() {
        let chip = TestChip::new();
        let agent = Agent::new(&chip, 0, 0);
        let mut esr = region();

        esr.write(&agent, REG_MTIME, RvSize::DWord, 1000).unwrap();
        esr.write(&agent, REG_MTIMECMP, RvSize::DWord, 500).unwrap();
        assert_eq!(chip.raise_count(), 0);
    }

    #[test]
    fn test_word_halves() {
        let chip = TestChip::new();
        let agent = Agent::new(&chip, 0, 0);
        let mut esr = region();

        esr.write(&agent, REG_MTIME, RvSize::Word, 0xdead_beef).unwrap();
        esr.write(&agent, REG_MTIME_HI, RvSize::Word, 0x1).unwrap();
        assert_eq!(
            esr.read(&agent, REG_MTIME, RvSize::DWord).unwrap(),
            0x1_dead_beef
        );
        assert_eq!(esr.read(&agent, REG_MTIME_HI, RvSize::Word).unwrap(), 0x1);
    }

    #[test]
    fn test_unimplemented_offsets_read_zero() {
        let chip = TestChip::new();
        let agent = Agent::new(&chip, 0, 0);
        let mut esr = region();

        assert_eq!(esr.read(&agent, 0x0, RvSize::DWord).unwrap(), 0);
        assert_eq!(esr.read(&agent, 0x00f4_0100, RvSize::Word).unwrap(), 0);
        esr.write(&agent, 0x00f4_0100, RvSize::Word, 0xffff_ffff).unwrap();
        assert_eq!(esr.read(&agent, 0x00f4_0100, RvSize::Word).unwrap(), 0);

        assert_eq!(
            esr.read(&agent, REG_MTIME, RvSize::Byte),
            Err(MemoryError::AccessFault { addr: 0x08_00f4_0200 })
        );
    }
}
