/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    File contains exports for the Erbium Emulator Memory Bus library.

--*/

mod agent;
mod bus;
mod clock;
mod dense;
mod register;

pub use agent::{Agent, Chip, NullChip};
pub use bus::{MemoryError, MemoryRegion};
pub use clock::Clock;
pub use dense::DenseRegion;
pub use register::ReadWriteRegister;
