/*++

Licensed under the Apache-2.0 license.

File Name:

    register.rs

Abstract:

    File contains the ReadWriteRegister wrapper used by peripheral register
    files.

--*/

use tock_registers::registers::InMemoryRegister;
use tock_registers::{RegisterLongName, UIntLike};

/// An in-memory register with tock-registers field accessors.
pub struct ReadWriteRegister<T: UIntLike, R: RegisterLongName = ()> {
    pub reg: InMemoryRegister<T, R>,
}

impl<T: UIntLike, R: RegisterLongName> ReadWriteRegister<T, R> {
    pub fn new(value: T) -> Self {
        Self {
            reg: InMemoryRegister::new(value),
        }
    }
}

impl<T: UIntLike, R: RegisterLongName> From<T> for ReadWriteRegister<T, R> {
    fn from(value: T) -> Self {
        ReadWriteRegister::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tock_registers::interfaces::{ReadWriteable, Readable};
    use tock_registers::register_bitfields;

    register_bitfields![u32,
        Demo [
            LOW OFFSET(0) NUMBITS(4) [],
            FLAG OFFSET(7) NUMBITS(1) [],
        ],
    ];

    #[test]
    fn test_field_access() {
        let reg: ReadWriteRegister<u32, Demo::Register> = 0x85u32.into();
        assert_eq!(reg.reg.read(Demo::LOW), 5);
        assert!(reg.reg.is_set(Demo::FLAG));
        reg.reg.modify(Demo::FLAG::CLEAR);
        assert_eq!(reg.reg.get(), 0x05);
    }
}
