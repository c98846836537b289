/*++

Licensed under the Apache-2.0 license.

File Name:

    root_bus.rs

Abstract:

    File contains the MainMemory root address space of the Erbium SoC.

--*/

use std::io::Write;

use erbium_emu_bus::{Agent, DenseRegion, MemoryError, MemoryRegion};
use erbium_emu_types::{RvAddr, RvData, RvSize};

use crate::esr::EsrRegion;
use crate::plic::ErPlic;
use crate::sysregs::{ResetCause, SysregsEr};
use crate::uart::{ShaktiUart, UartLayout};

// Erbium Memory Map
//
// +-----------------------------------+----------+-------------------+
// |       Address range (hex)         |          |                   |
// |      From       |      To         |   Size   | Maps to           |
// +-----------------+-----------------+----------+-------------------+
// | 0x02_0000_0000  | 0x02_0000_0FFF  |  4KiB    | SystemRegisters   |
// | 0x02_0000_4000  | 0x02_0000_4FFF  |  4KiB    | UART              |
// | 0x02_0000_A000  | 0x02_0000_BFFF  |  8KiB    | Boot ROM          |
// | 0x02_0000_E000  | 0x02_0000_EFFF  |  4KiB    | Scratch SRAM      |
// | 0x04_0000_0000  | 0x04_00FF_FFFF  | 16MiB    | MRAM              |
// | 0x08_0000_0000  | 0x08_00FF_FFFF  | 16MiB    | ESR Registers     |
// | 0x0C_0000_0000  | 0x0C_03FF_FFFF  | 64MiB    | PLIC              |
// +-----------------+-----------------+----------+-------------------+

const SYSREGS_IDX: usize = 0;
const UART_IDX: usize = 1;
const BOOTROM_IDX: usize = 2;
const SRAM_IDX: usize = 3;
const MRAM_IDX: usize = 4;
const ESR_IDX: usize = 5;
const PLIC_IDX: usize = 6;

const REGION_COUNT: usize = 7;

// Sorted by base address; `search` relies on the order.
const REGION_BASES: [RvAddr; REGION_COUNT] = [
    /* sysregs */ 0x02_0000_0000,
    /* uart    */ 0x02_0000_4000,
    /* bootrom */ 0x02_0000_A000,
    /* sram    */ 0x02_0000_E000,
    /* mram    */ 0x04_0000_0000,
    /* esr     */ 0x08_0000_0000,
    /* plic    */ 0x0C_0000_0000,
];

const REGION_SIZES: [RvAddr; REGION_COUNT] = [
    /* sysregs */ 4 << 10,
    /* uart    */ 4 << 10,
    /* bootrom */ 8 << 10,
    /* sram    */ 4 << 10,
    /* mram    */ 16 << 20,
    /* esr     */ 16 << 20,
    /* plic    */ 64 << 20,
];

const REGION_LASTS: [RvAddr; REGION_COUNT] = {
    let mut lasts = [0; REGION_COUNT];
    let mut i = 0;
    while i < REGION_COUNT {
        lasts[i] = REGION_BASES[i] + REGION_SIZES[i] - 1;
        i += 1;
    }
    lasts
};

// RVTimer prescaler input is 40MHz, derived from the 200MHz input clock.
const RVTIMER_CLOCK_DIVIDER: u64 = 5;

/// The Erbium guest physical address space: an ordered set of device and
/// storage regions with binary-search dispatch. Accesses must not straddle a
/// region boundary.
pub struct MainMemory {
    sysregs: SysregsEr,
    uart: ShaktiUart,
    bootrom: DenseRegion,
    sram: DenseRegion,
    mram: DenseRegion,
    esr: EsrRegion,
    plic: ErPlic,
}

impl Default for MainMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl MainMemory {
    pub fn new() -> Self {
        Self {
            sysregs: SysregsEr::new(REGION_BASES[SYSREGS_IDX], REGION_SIZES[SYSREGS_IDX]),
            uart: ShaktiUart::new(
                REGION_BASES[UART_IDX],
                REGION_SIZES[UART_IDX],
                UartLayout::Compact,
            ),
            bootrom: DenseRegion::new_const(
                REGION_BASES[BOOTROM_IDX],
                REGION_SIZES[BOOTROM_IDX] as usize,
            ),
            sram: DenseRegion::new(REGION_BASES[SRAM_IDX], REGION_SIZES[SRAM_IDX] as usize),
            mram: DenseRegion::new(REGION_BASES[MRAM_IDX], REGION_SIZES[MRAM_IDX] as usize),
            esr: EsrRegion::new(REGION_BASES[ESR_IDX], REGION_SIZES[ESR_IDX]),
            plic: ErPlic::new(REGION_BASES[PLIC_IDX], REGION_SIZES[PLIC_IDX]),
        }
    }

    /// Reset all devices, recording `cause` in the system registers. The
    /// boot ROM and the MRAM keep their contents (mask ROM and non-volatile
    /// storage); the scratch SRAM clears.
    pub fn reset(&mut self, cause: ResetCause) {
        self.sysregs.reset(cause);
        self.uart.reset();
        self.sram.fill(0);
        self.esr.rvtimer.reset();
        self.plic.reset();
    }

    pub fn first(&self) -> RvAddr {
        REGION_BASES[0]
    }

    pub fn last(&self) -> RvAddr {
        REGION_BASES[REGION_COUNT - 1] + REGION_SIZES[REGION_COUNT - 1] - 1
    }

    fn region_mut(&mut self, idx: usize) -> &mut dyn MemoryRegion {
        match idx {
            SYSREGS_IDX => &mut self.sysregs,
            UART_IDX => &mut self.uart,
            BOOTROM_IDX => &mut self.bootrom,
            SRAM_IDX => &mut self.sram,
            MRAM_IDX => &mut self.mram,
            ESR_IDX => &mut self.esr,
            _ => &mut self.plic,
        }
    }

    fn region(&self, idx: usize) -> &dyn MemoryRegion {
        match idx {
            SYSREGS_IDX => &self.sysregs,
            UART_IDX => &self.uart,
            BOOTROM_IDX => &self.bootrom,
            SRAM_IDX => &self.sram,
            MRAM_IDX => &self.mram,
            ESR_IDX => &self.esr,
            _ => &self.plic,
        }
    }

    /// Find the region covering `[addr, addr + n)`.
    fn search(addr: RvAddr, n: RvAddr) -> Result<usize, MemoryError> {
        let idx = REGION_LASTS.partition_point(|&last| last < addr);
        if idx == REGION_COUNT || REGION_BASES[idx] > addr {
            return Err(MemoryError::AccessFault { addr });
        }
        if addr + n - 1 > REGION_LASTS[idx] {
            return Err(MemoryError::OutOfRange { addr });
        }
        Ok(idx)
    }

    pub fn read(&mut self, agent: &Agent, addr: RvAddr, size: RvSize) -> Result<RvData, MemoryError> {
        let idx = Self::search(addr, size.len() as RvAddr)?;
        let pos = addr - REGION_BASES[idx];
        self.region_mut(idx).read(agent, pos, size)
    }

    pub fn write(
        &mut self,
        agent: &Agent,
        addr: RvAddr,
        size: RvSize,
        val: RvData,
    ) -> Result<(), MemoryError> {
        let idx = Self::search(addr, size.len() as RvAddr)?;
        let pos = addr - REGION_BASES[idx];
        self.region_mut(idx).write(agent, pos, size, val)
    }

    /// Privileged bulk load; primes backing storage (boot ROM images, test
    /// payloads). Device regions reject it.
    pub fn init(&mut self, agent: &Agent, addr: RvAddr, data: &[u8]) -> Result<(), MemoryError> {
        let idx = Self::search(addr, data.len().max(1) as RvAddr)?;
        let pos = addr - REGION_BASES[idx];
        self.region_mut(idx).init(agent, pos, data)
    }

    /// Dump raw content for diagnostics. Unlike guest accesses, a dump may
    /// span adjacent regions.
    pub fn dump_data(&self, out: &mut dyn Write, addr: RvAddr, n: RvAddr) -> std::io::Result<()> {
        if n == 0 {
            return Ok(());
        }
        let Ok(lo) = Self::search(addr, 1) else {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "dump start address is unmapped",
            ));
        };
        let mut idx = lo;
        let mut pos = addr - REGION_BASES[lo];
        let mut remaining = n;
        loop {
            let region_len = REGION_SIZES[idx] - pos;
            let chunk = remaining.min(region_len);
            self.region(idx).dump_data(out, pos, chunk)?;
            remaining -= chunk;
            if remaining == 0 {
                return Ok(());
            }
            idx += 1;
            if idx == REGION_COUNT {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "dump range extends past the last region",
                ));
            }
            pos = 0;
        }
    }

    // ----- System register helpers -----

    pub fn is_uart_enabled(&self) -> bool {
        self.sysregs.is_uart_enabled()
    }

    pub fn is_mram_ready(&self) -> bool {
        self.sysregs.is_mram_ready()
    }

    /// One watchdog input cycle, forwarded to the system register block.
    pub fn wdt_clock_tick(&mut self, agent: &Agent, cycle: u64) {
        self.sysregs.wdt_clock_tick(agent, cycle);
    }

    // ----- UART helpers -----

    pub fn uart_set_tx_fd(&mut self, fd: i32) {
        self.uart.set_tx_fd(fd);
    }

    pub fn uart_set_rx_fd(&mut self, fd: i32) {
        self.uart.set_rx_fd(fd);
    }

    pub fn uart_get_tx_fd(&self) -> i32 {
        self.uart.tx_fd()
    }

    pub fn uart_get_rx_fd(&self) -> i32 {
        self.uart.rx_fd()
    }

    // ----- PLIC helpers -----

    pub fn plic_interrupt_pending_set(&mut self, agent: &Agent, source: u32) {
        self.plic.interrupt_pending_set(agent, source);
    }

    pub fn plic_interrupt_pending_clear(&mut self, agent: &Agent, source: u32) {
        self.plic.interrupt_pending_clear(agent, source);
    }

    // ----- RVTimer helpers -----

    pub fn rvtimer_is_active(&self) -> bool {
        self.esr.rvtimer.is_active()
    }

    pub fn rvtimer_read_mtime(&self) -> u64 {
        self.esr.rvtimer.read_mtime()
    }

    pub fn rvtimer_read_mtimecmp(&self) -> u64 {
        self.esr.rvtimer.read_mtimecmp()
    }

    pub fn rvtimer_read_time_config(&self) -> u32 {
        self.esr.rvtimer.read_time_config()
    }

    pub fn rvtimer_write_mtime(&mut self, agent: &Agent, value: u64) {
        self.esr.rvtimer.write_mtime(agent, value);
    }

    pub fn rvtimer_write_mtimecmp(&mut self, agent: &Agent, value: u64) {
        self.esr.rvtimer.write_mtimecmp(agent, value);
    }

    pub fn rvtimer_write_time_config(&mut self, agent: &Agent, value: u32) {
        self.esr.rvtimer.write_time_config(agent, value);
    }

    pub fn rvtimer_reset(&mut self) {
        self.esr.rvtimer.reset();
    }

    /// One 200MHz input cycle; every fifth cycle reaches the prescaler.
    pub fn rvtimer_clock_tick(&mut self, agent: &Agent, cycle: u64) {
        if cycle % RVTIMER_CLOCK_DIVIDER == 0 {
            self.esr.rvtimer.prescaler_tick(agent);
        }
    }
}
