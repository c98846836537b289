/*++

Licensed under the Apache-2.0 license.

File Name:

    plic.rs

Abstract:

    File contains the Erbium platform-level interrupt controller.

--*/

use erbium_emu_bus::{Agent, MemoryError, MemoryRegion};
use erbium_emu_types::{RvAddr, RvData, RvSize};

/// Interrupt sources, including the hardwired source 0.
pub const NUM_SOURCES: usize = 32;

/// Claim/complete targets: the service processor's M-mode and S-mode.
pub const NUM_CONTEXTS: usize = 2;

const PRIORITY_MASK: u32 = 0x7;

// RISC-V PLIC 1.0.0 register layout.
const PRIORITY_BASE: RvAddr = 0x00_0000;
const PENDING_BASE: RvAddr = 0x00_1000;
const ENABLE_BASE: RvAddr = 0x00_2000;
const ENABLE_CONTEXT_STRIDE: RvAddr = 0x80;
const CONTEXT_BASE: RvAddr = 0x20_0000;
const CONTEXT_STRIDE: RvAddr = 0x1000;
const CONTEXT_THRESHOLD: RvAddr = 0x0;
const CONTEXT_CLAIM: RvAddr = 0x4;

/// Platform-level interrupt controller with per-source priority and pending
/// state and per-context enables, threshold and claim/complete. Registers
/// beyond the implemented sources and contexts read zero and ignore writes.
pub struct ErPlic {
    base: RvAddr,
    size: RvAddr,
    priority: [u32; NUM_SOURCES],
    pending: u32,
    enable: [u32; NUM_CONTEXTS],
    threshold: [u32; NUM_CONTEXTS],
    in_flight: [u32; NUM_CONTEXTS],
}

impl ErPlic {
    pub fn new(base: RvAddr, size: RvAddr) -> Self {
        Self {
            base,
            size,
            priority: [0; NUM_SOURCES],
            pending: 0,
            enable: [0; NUM_CONTEXTS],
            threshold: [0; NUM_CONTEXTS],
            in_flight: [0; NUM_CONTEXTS],
        }
    }

    pub fn reset(&mut self) {
        self.priority = [0; NUM_SOURCES];
        self.pending = 0;
        self.enable = [0; NUM_CONTEXTS];
        self.threshold = [0; NUM_CONTEXTS];
        self.in_flight = [0; NUM_CONTEXTS];
    }

    /// Assert a source from outside the guest (a device or the diagnostic
    /// injection path). Source 0 and out-of-range sources are ignored.
    pub fn interrupt_pending_set(&mut self, _agent: &Agent, source: u32) {
        if (1..NUM_SOURCES as u32).contains(&source) {
            self.pending |= 1 << source;
        }
    }

    /// Deassert a source from outside the guest.
    pub fn interrupt_pending_clear(&mut self, _agent: &Agent, source: u32) {
        if (1..NUM_SOURCES as u32).contains(&source) {
            self.pending &= !(1 << source);
        }
    }

    /// Claim the highest-priority source that is pending, enabled for the
    /// context and above its threshold; equal priorities go to the lowest
    /// source ID. The claimed source's pending bit clears and the context
    /// refuses further claims until the source completes.
    fn claim(&mut self, ctx: usize) -> u32 {
        if self.in_flight[ctx] != 0 {
            return 0;
        }
        let mut best = 0u32;
        let mut best_priority = 0u32;
        for source in 1..NUM_SOURCES as u32 {
            let bit = 1u32 << source;
            if self.pending & bit != 0 && self.enable[ctx] & bit != 0 {
                let priority = self.priority[source as usize];
                if priority > self.threshold[ctx] && priority > best_priority {
                    best = source;
                    best_priority = priority;
                }
            }
        }
        if best != 0 {
            self.pending &= !(1 << best);
            self.in_flight[ctx] = best;
        }
        best
    }

    /// Retire the in-flight source of a context. IDs that do not match the
    /// in-flight source, including out-of-range IDs, are ignored.
    fn complete(&mut self, ctx: usize, source: u32) {
        if source != 0 && source == self.in_flight[ctx] {
            self.in_flight[ctx] = 0;
        }
    }

    fn read_register(&mut self, pos: RvAddr) -> u32 {
        match pos {
            pos if pos < PENDING_BASE => {
                let source = (pos - PRIORITY_BASE) / 4;
                if source < NUM_SOURCES as RvAddr {
                    self.priority[source as usize]
                } else {
                    0
                }
            }
            pos if pos < ENABLE_BASE => {
                if pos == PENDING_BASE {
                    self.pending
                } else {
                    0
                }
            }
            pos if pos < CONTEXT_BASE => {
                let rel = pos - ENABLE_BASE;
                let ctx = rel / ENABLE_CONTEXT_STRIDE;
                let word = rel % ENABLE_CONTEXT_STRIDE;
                if ctx < NUM_CONTEXTS as RvAddr && word == 0 {
                    self.enable[ctx as usize]
                } else {
                    0
                }
            }
            _ => {
                let rel = pos - CONTEXT_BASE;
                let ctx = rel / CONTEXT_STRIDE;
                if ctx >= NUM_CONTEXTS as RvAddr {
                    return 0;
                }
                match rel % CONTEXT_STRIDE {
                    CONTEXT_THRESHOLD => self.threshold[ctx as usize],
                    CONTEXT_CLAIM => self.claim(ctx as usize),
                    _ => 0,
                }
            }
        }
    }

    fn write_register(&mut self, pos: RvAddr, value: u32) {
        match pos {
            pos if pos < PENDING_BASE => {
                let source = (pos - PRIORITY_BASE) / 4;
                // Source 0 is hardwired to priority 0.
                if (1..NUM_SOURCES as RvAddr).contains(&source) {
                    self.priority[source as usize] = value & PRIORITY_MASK;
                }
            }
            // Pending is read-only to the guest.
            pos if pos < ENABLE_BASE => (),
            pos if pos < CONTEXT_BASE => {
                let rel = pos - ENABLE_BASE;
                let ctx = rel / ENABLE_CONTEXT_STRIDE;
                let word = rel % ENABLE_CONTEXT_STRIDE;
                if ctx < NUM_CONTEXTS as RvAddr && word == 0 {
                    self.enable[ctx as usize] = value;
                }
            }
            _ => {
                let rel = pos - CONTEXT_BASE;
                let ctx = rel / CONTEXT_STRIDE;
                if ctx >= NUM_CONTEXTS as RvAddr {
                    return;
                }
                match rel % CONTEXT_STRIDE {
                    CONTEXT_THRESHOLD => self.threshold[ctx as usize] = value & PRIORITY_MASK,
                    CONTEXT_CLAIM => self.complete(ctx as usize, value),
                    _ => (),
                }
            }
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

impl MemoryRegion for ErPlic {
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
