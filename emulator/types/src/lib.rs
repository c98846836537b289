/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    File contains exports for the Erbium Emulator Types library.

--*/

mod consts;
mod types;

pub use consts::{IO_SHIRE, NUM_SHIRES};
pub use types::{RvAddr, RvData, RvSize};
