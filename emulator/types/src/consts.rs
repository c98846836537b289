/*++

Licensed under the Apache-2.0 license.

File Name:

    consts.rs

Abstract:

    File contains constants describing the Erbium shire topology.

--*/

/// Number of shires on the chip, including the I/O shire.
pub const NUM_SHIRES: usize = 8;

/// Index of the I/O shire hosting the service processor.
pub const IO_SHIRE: usize = NUM_SHIRES - 1;
