/*++

Licensed under the Apache-2.0 license.

File Name:

    sysregs.rs

Abstract:

    File contains the Erbium system register block.

--*/

use erbium_emu_bus::{Agent, MemoryError, MemoryRegion, ReadWriteRegister};
use erbium_emu_types::{RvAddr, RvData, RvSize};
use tock_registers::interfaces::{Readable, Writeable};
use tock_registers::register_bitfields;

use crate::watchdog::Watchdog;

register_bitfields![u32,
    pub SystemConfig [
        SYS_INTR_EN OFFSET(0) NUMBITS(1) [],
        MRAM_STARTUP_BYPASS OFFSET(1) NUMBITS(1) [],
        WDOG_DISABLE OFFSET(2) NUMBITS(1) [],
        UART_ENABLE OFFSET(6) NUMBITS(1) [],
    ],
    pub WatchdogCtl [
        KICK OFFSET(7) NUMBITS(1) [],
    ],
    pub SoftReset [
        MRAM_RST_B OFFSET(2) NUMBITS(1) [],
    ],
    pub SpinLock [
        LOCK OFFSET(0) NUMBITS(1) [],
    ],
    pub PowerDomainReq [
        MRAM_DSLEEP_EN OFFSET(16) NUMBITS(1) [],
    ],
];

/// Reason recorded in RESET_CAUSE when the block comes out of reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetCause {
    None,
    PowerOn,
    Watchdog,
    SysReset,
    Brownout,
}

impl ResetCause {
    pub fn bits(self) -> u32 {
        match self {
            ResetCause::None => 0,
            ResetCause::PowerOn => 1 << 0,
            ResetCause::Watchdog => 1 << 1,
            ResetCause::SysReset => 1 << 2,
            ResetCause::Brownout => 1 << 3,
        }
    }
}

// 32-bit registers at 8-byte strides.
const VERSION: RvAddr = 0x00;
const SYSTEM_CONFIG: RvAddr = 0x08;
const WATCHDOG_COUNT: RvAddr = 0x10;
const WATCHDOG: RvAddr = 0x18;
const SYS_INTERRUPT: RvAddr = 0x20;
const SOFT_RESET: RvAddr = 0x28;
const RESET_CAUSE: RvAddr = 0x30;
const POWER_DOMAIN_REQ: RvAddr = 0x38;
const POWER_DOMAIN_ACK: RvAddr = 0x40;
const POWER_GOOD: RvAddr = 0x48;
const SPIN_LOCK: RvAddr = 0x50;
const CHIP_MODE: RvAddr = 0x58;
const MAILBOX0: RvAddr = 0x60;
const MAILBOX1: RvAddr = 0x68;

const VERSION_VALUE: u32 = 0x0001_0000;

// Watchdog with a 4-cycle divider (250MHz from the 1GHz system clock).
const WATCHDOG_DIVIDER: u32 = 4;
const WATCHDOG_RELOAD: u32 = 1 << 24;

fn watchdog_timeout_handler(agent: &Agent) {
    agent.chip.cold_reset();
}

/// Erbium system register block: reset cause, system configuration, spinlock,
/// mailboxes, power domains and the watchdog kick interface. Registers are
/// 32 bits wide at 8-byte strides; only 32-bit accesses are decoded, and
/// undocumented offsets inside the region read zero.
pub struct SysregsEr {
    base: RvAddr,
    size: RvAddr,
    version: u32,
    system_config: ReadWriteRegister<u32, SystemConfig::Register>,
    watchdog_ctl: u32,
    sys_interrupt: u32,
    soft_reset: u32,
    reset_cause: u32,
    power_domain_req: u32,
    power_domain_ack: u32,
    power_good: u32,
    spin_lock: u32,
    chip_mode: u32,
    mailbox0: u32,
    mailbox1: u32,
    mram_ready: bool,
    watchdog: Watchdog,
}

impl SysregsEr {
    pub fn new(base: RvAddr, size: RvAddr) -> Self {
        let mut sysregs = Self {
            base,
            size,
            version: VERSION_VALUE,
            system_config: ReadWriteRegister::new(0),
            watchdog_ctl: 0,
            sys_interrupt: 0,
            soft_reset: 0,
            reset_cause: 0,
            power_domain_req: 0,
            power_domain_ack: 0,
            power_good: 0,
            spin_lock: 0,
            chip_mode: 0,
            mailbox0: 0,
            mailbox1: 0,
            mram_ready: true,
            watchdog: Watchdog::new(WATCHDOG_DIVIDER, WATCHDOG_RELOAD, watchdog_timeout_handler),
        };
        sysregs.reset(ResetCause::PowerOn);
        sysregs
    }

    /// Come out of reset with RESET_CAUSE recording `cause`. Transient state
    /// clears and the watchdog re-arms.
    pub fn reset(&mut self, cause: ResetCause) {
        self.version = VERSION_VALUE;
        self.system_config.reg.set(0);
        self.watchdog_ctl = 0;
        self.sys_interrupt = 0;
        self.soft_reset = 0;
        self.reset_cause = cause.bits();
        self.power_domain_req = 0;
        self.power_domain_ack = 0;
        self.power_good = 0;
        self.spin_lock = 0;
        self.chip_mode = 0;
        self.mailbox0 = 0;
        self.mailbox1 = 0;
        self.mram_ready = true;
        self.watchdog.reset();
    }

    pub fn is_uart_enabled(&self) -> bool {
        self.system_config.reg.is_set(SystemConfig::UART_ENABLE)
    }

    pub fn is_mram_ready(&self) -> bool {
        self.mram_ready
    }

    /// One system-clock cycle for the watchdog. The WDOG_DISABLE config bit
    /// suspends counting.
    pub fn wdt_clock_tick(&mut self, agent: &Agent, _cycle: u64) {
        self.watchdog.clock_tick(agent);
    }

    fn read_register(&mut self, pos: RvAddr) -> u32 {
        match pos {
            VERSION => self.version,
            SYSTEM_CONFIG => self.system_config.reg.get(),
            WATCHDOG_COUNT => self.watchdog.count(),
            WATCHDOG => self.watchdog_ctl,
            SYS_INTERRUPT => self.sys_interrupt,
            SOFT_RESET => self.soft_reset,
            RESET_CAUSE => self.reset_cause,
            POWER_DOMAIN_REQ => self.power_domain_req,
            POWER_DOMAIN_ACK => self.power_domain_ack,
            POWER_GOOD => self.power_good,
            SPIN_LOCK => {
                // Read-exchange: report the lock bit and take the lock.
                let val = self.spin_lock;
                self.spin_lock |= 1;
                val
            }
            CHIP_MODE => self.chip_mode,
            MAILBOX0 => self.mailbox0,
            MAILBOX1 => self.mailbox1,
            _ => 0,
        }
    }

    fn write_register(&mut self, pos: RvAddr, value: u32) {
        match pos {
            // Read-only.
            VERSION | WATCHDOG_COUNT => (),
            SYSTEM_CONFIG => {
                self.system_config.reg.set(value);
                self.watchdog
                    .set_enabled(!self.system_config.reg.is_set(SystemConfig::WDOG_DISABLE));
            }
            WATCHDOG => {
                let ctl: ReadWriteRegister<u32, WatchdogCtl::Register> = value.into();
                if ctl.reg.is_set(WatchdogCtl::KICK) {
                    self.watchdog.kick();
                }
                // The kick bit reads back as zero.
                self.watchdog_ctl = value & !(1 << 7);
            }
            SYS_INTERRUPT => self.sys_interrupt = value,
            SOFT_RESET => {
                self.soft_reset = value;
                let rst: ReadWriteRegister<u32, SoftReset::Register> = value.into();
                if rst.reg.is_set(SoftReset::MRAM_RST_B) {
                    self.mram_ready = false;
                }
            }
            // Write-1-to-clear.
            RESET_CAUSE => self.reset_cause &= !value,
            POWER_DOMAIN_REQ => self.power_domain_req = value,
            POWER_DOMAIN_ACK => self.power_domain_ack = value,
            POWER_GOOD => self.power_good = value,
            SPIN_LOCK => self.spin_lock = value & 1,
            CHIP_MODE => self.chip_mode = value,
            MAILBOX0 => self.mailbox0 = value,
            MAILBOX1 => self.mailbox1 = value,
            _ => (),
        }
    }

    fn check_access(&self, pos: RvAddr, size: RvSize) -> Result<(), MemoryError> {
        if size != RvSize::Word || pos % 4 != 0 {
            return Err(MemoryError::AccessFault {
                addr: self.base + pos,
            });
        }
        Ok(())
    }
}

impl MemoryRegion for SysregsEr {
    fn mmap_addr(&self) -> RvAddr {
        self.base
    }

    fn mmap_size(&self) -> RvAddr {
        self.size
    }

    fn read(&mut self, _agent: &Agent, pos: RvAddr, size: RvSize) -> Result<RvData, MemoryError> {
        self.check_access(pos, size)?;
        Ok(self.read_register(pos) as RvData)
    }

    fn write(
        &mut self,
        _agent: &Agent,
        pos: RvAddr,
        size: RvSize,
        val: RvData,
    ) -> Result<(), MemoryError> {
        self.check_access(pos, size)?;
        self.write_register(pos, val as u32);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::TestChip;

    fn sysregs() -> SysregsEr {
        SysregsEr::new(0x02_0000_0000, 4096)
    }

    #[test]
    fn test_version_read_only() {
        let chip = TestChip::new();
        let agent = Agent::new(&chip, 0, 0);
        let mut regs = sysregs();

        assert_eq!(regs.read(&agent, VERSION, RvSize::Word).unwrap(), VERSION_VALUE as u64);
        regs.write(&agent, VERSION, RvSize::Word, 0xdead_beef).unwrap();
        assert_eq!(regs.read(&agent, VERSION, RvSize::Word).unwrap(), VERSION_VALUE as u64);
    }

    #[test]
    fn test_only_word_accesses_decode() {
        let chip = TestChip::new();
        let agent = Agent::new(&chip, 0, 0);
        let mut regs = sysregs();

        assert_eq!(
            regs.read(&agent, VERSION, RvSize::Byte),
            Err(MemoryError::AccessFault { addr: 0x02_0000_0000 })
        );
        assert_eq!(
            regs.read(&agent, 0x02, RvSize::Word),
            Err(MemoryError::AccessFault { addr: 0x02_0000_0002 })
        );
        // Undocumented aligned offsets read zero and swallow writes.
        assert_eq!(regs.read(&agent, 0x04, RvSize::Word).unwrap(), 0);
        regs.write(&agent, 0x70, RvSize::Word, 0xffff_ffff).unwrap();
        assert_eq!(regs.read(&agent, 0x70, RvSize::Word).unwrap(), 0);
    }

    #[test]
    fn test_reset_cause_write_one_to_clear() {
        let chip = TestChip::new();
        let agent = Agent::new(&chip, 0, 0);
        let mut regs = sysregs();
        regs.reset(ResetCause::Watchdog);

        assert_eq!(
            regs.read(&agent, RESET_CAUSE, RvSize::Word).unwrap(),
            ResetCause::Watchdog.bits() as u64
        );
        regs.write(&agent, RESET_CAUSE, RvSize::Word, ResetCause::Watchdog.bits() as u64)
            .unwrap();
        assert_eq!(regs.read(&agent, RESET_CAUSE, RvSize::Word).unwrap(), 0);
    }

    #[test]
    fn test_spin_lock_exchange() {
        let chip = TestChip::new();
        let agent = Agent::new(&chip, 0, 0);
        let mut regs = sysregs();

        // First reader wins the lock; later readers see it taken.
        assert_eq!(regs.read(&agent, SPIN_LOCK, RvSize::Word).unwrap(), 0);
        assert_eq!(regs.read(&agent, SPIN_LOCK, RvSize::Word).unwrap(), 1);
        assert_eq!(regs.read(&agent, SPIN_LOCK, RvSize::Word).unwrap(), 1);

        regs.write(&agent, SPIN_LOCK, RvSize::Word, 0).unwrap();
        assert_eq!(regs.read(&agent, SPIN_LOCK, RvSize::Word).unwrap(), 0);
    }

    #[test]
    fn test_uart_enable_bit() {
        let chip = TestChip::new();
        let agent = Agent::new(&chip, 0, 0);
        let mut regs = sysregs();

        assert!(!regs.is_uart_enabled());
        regs.write(&agent, SYSTEM_CONFIG, RvSize::Word, 1 << 6).unwrap();
        assert!(regs.is_uart_enabled());
    }

    #[test]
    fn test_watchdog_kick_and_disable() {
        let chip = TestChip::new();
        let agent = Agent::new(&chip, 0, 0);
        let mut regs = sysregs();

        let reload = regs.read(&agent, WATCHDOG_COUNT, RvSize::Word).unwrap();
        for cycle in 1..=WATCHDOG_DIVIDER as u64 {
            regs.wdt_clock_tick(&agent, cycle);
        }
        assert_eq!(regs.read(&agent, WATCHDOG_COUNT, RvSize::Word).unwrap(), reload - 1);

        // Kick reloads on the next divided tick; the kick bit reads as zero.
        regs.write(&agent, WATCHDOG, RvSize::Word, 1 << 7).unwrap();
        assert_eq!(regs.read(&agent, WATCHDOG, RvSize::Word).unwrap(), 0);
        for cycle in 1..=WATCHDOG_DIVIDER as u64 {
            regs.wdt_clock_tick(&agent, cycle);
        }
        assert_eq!(regs.read(&agent, WATCHDOG_COUNT, RvSize::Word).unwrap(), reload);

        // WDOG_DISABLE suspends counting.
        regs.write(&agent, SYSTEM_CONFIG, RvSize::Word, 1 << 2).unwrap();
        for cycle in 1..=(4 * WATCHDOG_DIVIDER as u64) {
            regs.wdt_clock_tick(&agent, cycle);
        }
        assert_eq!(regs.read(&agent, WATCHDOG_COUNT, RvSize::Word).unwrap(), reload);
    }

    #[test]
    fn test_soft_reset_clears_mram_ready() {
        let chip = TestChip::new();
        let agent = Agent::new(&chip, 0, 0);
        let mut regs = sysregs();

        assert!(regs.is_mram_ready());
        regs.write(&agent, SOFT_RESET, RvSize::Word, 1 << 2).unwrap();
        assert!(!regs.is_mram_ready());
        regs.reset(ResetCause::SysReset);
        assert!(regs.is_mram_ready());
    }

    #[test]
    fn test_plain_registers_round_trip() {
        let chip = TestChip::new();
        let agent = Agent::new(&chip, 0, 0);
        let mut regs = sysregs();

        for pos in [
            SYS_INTERRUPT,
            POWER_DOMAIN_REQ,
            POWER_DOMAIN_ACK,
            POWER_GOOD,
            CHIP_MODE,
            MAILBOX0,
            MAILBOX1,
        ] {
            regs.write(&agent, pos, RvSize::Word, 0xa5a5_5a5a).unwrap();
            assert_eq!(regs.read(&agent, pos, RvSize::Word).unwrap(), 0xa5a5_5a5a);
        }
    }
}
