/*++

Licensed under the Apache-2.0 license.

File Name:

    agent.rs

Abstract:

    File contains the Agent caller context and the Chip callback surface.

--*/

/// Interrupt-signaling and reset surface of the surrounding chip object.
/// Implementations use interior mutability; device regions call these
/// synchronously from inside guest accesses and clock ticks.
pub trait Chip {
    /// Assert the machine timer interrupt pending wire of a shire.
    fn raise_machine_timer_interrupt(&self, shire: usize);

    /// Deassert the machine timer interrupt pending wire of a shire.
    fn clear_machine_timer_interrupt(&self, shire: usize);

    /// Request a cold reset of the whole chip.
    fn cold_reset(&self);

    /// Whether the system-config pin mux connects the UART to its pins.
    fn is_uart_enabled(&self) -> bool;
}

/// Caller context passed into every region operation. Carries the chip
/// handle and the identity of the originating shire and hart. Regions must
/// not retain it past the call.
pub struct Agent<'a> {
    pub chip: &'a dyn Chip,
    pub shire: usize,
    pub hart: usize,
}

impl<'a> Agent<'a> {
    pub fn new(chip: &'a dyn Chip, shire: usize, hart: usize) -> Self {
        Self { chip, shire, hart }
    }
}

/// Chip stub for detached operation: interrupts go nowhere, resets are
/// ignored and the UART pin mux reads as enabled.
pub struct NullChip;

impl Chip for NullChip {
    fn raise_machine_timer_interrupt(&self, _shire: usize) {}

    fn clear_machine_timer_interrupt(&self, _shire: usize) {}

    fn cold_reset(&self) {}

    fn is_uart_enabled(&self) -> bool {
        true
    }
}
