/*++

Licensed under the Apache-2.0 license.

File Name:

    dense.rs

Abstract:

    File contains the DenseRegion backing-byte device used for the boot ROM,
    the scratch SRAM and the MRAM.

--*/

use std::io::Write;

use erbium_emu_types::{RvAddr, RvData, RvSize};

use crate::{Agent, MemoryError, MemoryRegion};

/// A region backed by a contiguous byte buffer. Loads and stores are
/// little-endian memcpy equivalents with bounds checks; there are no side
/// effects and no interrupts. The read-only variant (boot ROM) rejects
/// `write` but still accepts `init`.
pub struct DenseRegion {
    base: RvAddr,
    data: Vec<u8>,
    writable: bool,
}

impl DenseRegion {
    /// Create a zero-filled read/write region.
    pub fn new(base: RvAddr, size: usize) -> Self {
        Self {
            base,
            data: vec![0; size],
            writable: true,
        }
    }

    /// Create a zero-filled read-only region; content arrives via `init`.
    pub fn new_const(base: RvAddr, size: usize) -> Self {
        Self {
            base,
            data: vec![0; size],
            writable: false,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn fill(&mut self, val: u8) {
        self.data.fill(val);
    }

    fn check_bounds(&self, pos: RvAddr, n: usize) -> Result<usize, MemoryError> {
        let pos = usize::try_from(pos).map_err(|_| MemoryError::AccessFault {
            addr: self.base.wrapping_add(pos),
        })?;
        if pos.checked_add(n).map_or(true, |end| end > self.data.len()) {
            return Err(MemoryError::AccessFault {
                addr: self.base + pos as RvAddr,
            });
        }
        Ok(pos)
    }
}

impl MemoryRegion for DenseRegion {
    fn mmap_addr(&self) -> RvAddr {
        self.base
    }

    fn mmap_size(&self) -> RvAddr {
        self.data.len() as RvAddr
    }

    fn read(&mut self, _agent: &Agent, pos: RvAddr, size: RvSize) -> Result<RvData, MemoryError> {
        let n = size.len();
        let pos = self.check_bounds(pos, n)?;
        let mut bytes = [0u8; 8];
        bytes[..n].copy_from_slice(&self.data[pos..pos + n]);
        Ok(u64::from_le_bytes(bytes))
    }

    fn write(
        &mut self,
        _agent: &Agent,
        pos: RvAddr,
        size: RvSize,
        val: RvData,
    ) -> Result<(), MemoryError> {
        let n = size.len();
        let pos = self.check_bounds(pos, n)?;
        if !self.writable {
            return Err(MemoryError::AccessFault {
                addr: self.base + pos as RvAddr,
            });
        }
        self.data[pos..pos + n].copy_from_slice(&val.to_le_bytes()[..n]);
        Ok(())
    }

    fn init(&mut self, _agent: &Agent, pos: RvAddr, data: &[u8]) -> Result<(), MemoryError> {
        let pos = self.check_bounds(pos, data.len())?;
        self.data[pos..pos + data.len()].copy_from_slice(data);
        Ok(())
    }

    fn dump_data(&self, out: &mut dyn Write, pos: RvAddr, n: RvAddr) -> std::io::Result<()> {
        let pos = pos as usize;
        let end = (pos + n as usize).min(self.data.len());
        out.write_all(&self.data[pos.min(end)..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NullChip;

    #[test]
    fn test_read_write_round_trip() {
        let chip = NullChip;
        let agent = Agent::new(&chip, 0, 0);
        let mut region = DenseRegion::new(0x1000, 256);

        region.write(&agent, 0, RvSize::DWord, 0x0123_4567_89ab_cdef).unwrap();
        assert_eq!(region.read(&agent, 0, RvSize::DWord).unwrap(), 0x0123_4567_89ab_cdef);
        assert_eq!(region.read(&agent, 0, RvSize::Word).unwrap(), 0x89ab_cdef);
        assert_eq!(region.read(&agent, 4, RvSize::Word).unwrap(), 0x0123_4567);
        assert_eq!(region.read(&agent, 1, RvSize::HalfWord).unwrap(), 0xabcd);
        assert_eq!(region.read(&agent, 7, RvSize::Byte).unwrap(), 0x01);

        region.write(&agent, 250, RvSize::Byte, 0x42).unwrap();
        assert_eq!(region.read(&agent, 250, RvSize::Byte).unwrap(), 0x42);
    }

    #[test]
    fn test_out_of_bounds_access_faults() {
        let chip = NullChip;
        let agent = Agent::new(&chip, 0, 0);
        let mut region = DenseRegion::new(0x1000, 16);

        assert_eq!(
            region.read(&agent, 16, RvSize::Byte),
            Err(MemoryError::AccessFault { addr: 0x1010 })
        );
        assert_eq!(
            region.read(&agent, 12, RvSize::DWord),
            Err(MemoryError::AccessFault { addr: 0x100c })
        );
        assert_eq!(
            region.write(&agent, 15, RvSize::Word, 0),
            Err(MemoryError::AccessFault { addr: 0x100f })
        );
    }

    #[test]
    fn test_const_region_rejects_writes_accepts_init() {
        let chip = NullChip;
        let agent = Agent::new(&chip, 0, 0);
        let mut rom = DenseRegion::new_const(0x2000, 64);

        assert_eq!(
            rom.write(&agent, 0, RvSize::Word, 0xdead_beef),
            Err(MemoryError::AccessFault { addr: 0x2000 })
        );

        rom.init(&agent, 8, &[0x13, 0x00, 0x00, 0x00]).unwrap();
        assert_eq!(rom.read(&agent, 8, RvSize::Word).unwrap(), 0x0000_0013);
    }

    #[test]
    fn test_dump_data() {
        let chip = NullChip;
        let agent = Agent::new(&chip, 0, 0);
        let mut region = DenseRegion::new(0, 8);
        region.init(&agent, 0, b"erbium!!").unwrap();

        let mut out = Vec::new();
        region.dump_data(&mut out, 2, 4).unwrap();
        assert_eq!(out, b"bium");
    }
}
