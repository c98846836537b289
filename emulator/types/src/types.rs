/*++

Licensed under the Apache-2.0 license.

File Name:

    types.rs

Abstract:

    File contains the primitive types used by the memory bus.

--*/

/// Guest physical address.
pub type RvAddr = u64;

/// Payload of a single memory access, wide enough for the largest access.
pub type RvData = u64;

/// Size of a memory access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RvSize {
    Byte = 1,
    HalfWord = 2,
    Word = 4,
    DWord = 8,
}

impl RvSize {
    /// Byte count of the access.
    pub fn len(self) -> usize {
        self as usize
    }
}

impl From<RvSize> for u64 {
    fn from(size: RvSize) -> Self {
        size as u64
    }
}

impl From<RvSize> for usize {
    fn from(size: RvSize) -> Self {
        size as usize
    }
}

impl TryFrom<usize> for RvSize {
    type Error = ();

    fn try_from(len: usize) -> Result<Self, Self::Error> {
        match len {
            1 => Ok(RvSize::Byte),
            2 => Ok(RvSize::HalfWord),
            4 => Ok(RvSize::Word),
            8 => Ok(RvSize::DWord),
            _ => Err(()),
        }
    }
}
