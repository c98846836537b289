/*++

Licensed under the Apache-2.0 license.

File Name:

    bus.rs

Abstract:

    File contains the MemoryRegion trait and the memory error type.

--*/

use std::io::Write;
use std::ops::RangeInclusive;

use erbium_emu_types::{RvAddr, RvData, RvSize};

use crate::Agent;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum MemoryError {
    /// No region covers the address, or a device decoder rejected the
    /// (offset, width) combination. Surfaced to the core as an access fault.
    AccessFault { addr: RvAddr },

    /// The access straddles a region boundary.
    OutOfRange { addr: RvAddr },

    /// `init` was called on a device region. Indicates a caller bug.
    InitNotSupported,

    /// A host-level I/O operation failed. Fatal to the simulator.
    Io(std::io::ErrorKind),
}

impl From<std::io::Error> for MemoryError {
    fn from(err: std::io::Error) -> Self {
        MemoryError::Io(err.kind())
    }
}

/// A device or storage region of guest physical memory. Offsets passed to the
/// access methods are region-relative; the region reports its absolute
/// placement through `mmap_addr`/`mmap_size`.
pub trait MemoryRegion {
    /// First guest physical address covered by the region.
    fn mmap_addr(&self) -> RvAddr;

    /// Memory map size.
    fn mmap_size(&self) -> RvAddr;

    /// Memory map range.
    fn mmap_range(&self) -> RangeInclusive<RvAddr> {
        RangeInclusive::new(self.mmap_addr(), self.mmap_addr() + self.mmap_size() - 1)
    }

    /// Read data of specified size from given region offset. Reads may have
    /// side effects (a UART read dequeues, a PLIC claim read claims).
    ///
    /// # Error
    ///
    /// * `MemoryError::AccessFault` - the (offset, width) combination does
    ///   not map to a legal access for this region
    fn read(&mut self, agent: &Agent, pos: RvAddr, size: RvSize) -> Result<RvData, MemoryError>;

    /// Write data of specified size to given region offset. Writes may call
    /// back into the chip through the agent.
    ///
    /// # Error
    ///
    /// * `MemoryError::AccessFault` - the (offset, width) combination does
    ///   not map to a legal access for this region
    /// * `MemoryError::Io` - a host-level side effect failed
    fn write(
        &mut self,
        agent: &Agent,
        pos: RvAddr,
        size: RvSize,
        val: RvData,
    ) -> Result<(), MemoryError>;

    /// Privileged bulk load used to prime backing storage. Device regions
    /// reject it.
    fn init(&mut self, _agent: &Agent, _pos: RvAddr, _data: &[u8]) -> Result<(), MemoryError> {
        Err(MemoryError::InitNotSupported)
    }

    /// Dump raw region content for diagnostics. Regions without backing
    /// bytes emit nothing.
    fn dump_data(&self, _out: &mut dyn Write, _pos: RvAddr, _n: RvAddr) -> std::io::Result<()> {
        Ok(())
    }
}
