/*++

Licensed under the Apache-2.0 license.

File Name:

    uart.rs

Abstract:

    File contains the Shakti UART device implementation.

--*/

use std::os::raw::c_void;

use erbium_emu_bus::{Agent, MemoryError, MemoryRegion};
use erbium_emu_types::{RvAddr, RvData, RvSize};

// STATUS register bits.
const STATUS_TX_EMPTY: u32 = 1 << 0;
#[allow(dead_code)]
const STATUS_TX_FULL: u32 = 1 << 1;
const STATUS_RX_NOT_EMPTY: u32 = 1 << 2;
#[allow(dead_code)]
const STATUS_RX_FULL: u32 = 1 << 3;

// Logical register indices; the byte offset is index * stride, except
// RX_THRESHOLD which sits one slot past IEN.
const REG_BAUD: RvAddr = 0;
const REG_TX: RvAddr = 1;
const REG_RCV: RvAddr = 2;
const REG_STATUS: RvAddr = 3;
const REG_DELAY: RvAddr = 4;
const REG_CONTROL: RvAddr = 5;
const REG_IEN: RvAddr = 6;
const REG_RX_THRESHOLD: RvAddr = 8;

/// Register stride of the SoC variant. Both variants carry the same eight
/// 32-bit registers; they differ only in placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UartLayout {
    /// 4-byte stride: BAUD 0x00 .. IEN 0x18, RX_THRESHOLD 0x20.
    Compact,
    /// 8-byte stride: BAUD 0x00 .. IEN 0x30, RX_THRESHOLD 0x40.
    Spread,
}

impl UartLayout {
    fn stride(self) -> RvAddr {
        match self {
            UartLayout::Compact => 4,
            UartLayout::Spread => 8,
        }
    }
}

/// Shakti-style UART backed by host file descriptors. The system-config
/// UART_ENABLE bit models the pin mux: while disabled the registers stay
/// addressable but the receive path reads empty and transmits are dropped.
pub struct ShaktiUart {
    base: RvAddr,
    size: RvAddr,
    layout: UartLayout,
    tx_fd: i32,
    rx_fd: i32,
    rx_byte: Option<u8>,
    reg_baud: u32,
    reg_delay: u32,
    reg_control: u32,
    reg_ien: u32,
    reg_rx_threshold: u32,
}

impl ShaktiUart {
    pub fn new(base: RvAddr, size: RvAddr, layout: UartLayout) -> Self {
        Self {
            base,
            size,
            layout,
            tx_fd: -1,
            rx_fd: -1,
            rx_byte: None,
            reg_baud: 0,
            reg_delay: 0,
            reg_control: 0,
            reg_ien: 0,
            reg_rx_threshold: 0,
        }
    }

    /// Clear the configuration registers and drop any buffered receive byte.
    /// Host descriptors are an attachment of the simulator, not guest state,
    /// and survive reset.
    pub fn reset(&mut self) {
        self.rx_byte = None;
        self.reg_baud = 0;
        self.reg_delay = 0;
        self.reg_control = 0;
        self.reg_ien = 0;
        self.reg_rx_threshold = 0;
    }

    pub fn set_tx_fd(&mut self, fd: i32) {
        self.tx_fd = fd;
    }

    pub fn set_rx_fd(&mut self, fd: i32) {
        self.rx_fd = fd;
    }

    pub fn tx_fd(&self) -> i32 {
        self.tx_fd
    }

    pub fn rx_fd(&self) -> i32 {
        self.rx_fd
    }

    /// Whether a receive byte can be delivered. A readability signal on the
    /// descriptor cannot distinguish data from end-of-file, so a readable
    /// descriptor is confirmed with a one-byte read: a byte is buffered for
    /// the next RCV access, while end-of-file detaches the descriptor.
    fn rx_data_available(&mut self) -> bool {
        if self.rx_byte.is_some() {
            return true;
        }
        if self.rx_fd < 0 {
            return false;
        }
        let mut pfd = libc::pollfd {
            fd: self.rx_fd,
            events: libc::POLLIN,
            revents: 0,
        };
        let rc = unsafe { libc::poll(&mut pfd, 1, 0) };
        if rc <= 0 || (pfd.revents & (libc::POLLIN | libc::POLLHUP | libc::POLLERR)) == 0 {
            return false;
        }
        let mut byte: u8 = 0;
        let n = unsafe { libc::read(self.rx_fd, &mut byte as *mut u8 as *mut c_void, 1) };
        match n {
            1 => {
                self.rx_byte = Some(byte);
                true
            }
            0 => {
                log::info!("uart: rx descriptor at end-of-file, detaching");
                self.rx_fd = -1;
                false
            }
            _ => false,
        }
    }

    fn transmit(&mut self, byte: u8) -> Result<(), MemoryError> {
        if self.tx_fd < 0 {
            return Ok(());
        }
        let n = unsafe { libc::write(self.tx_fd, &byte as *const u8 as *const c_void, 1) };
        if n < 0 {
            return Err(std::io::Error::last_os_error().into());
        }
        Ok(())
    }

    /// Map a byte offset onto a logical register index.
    fn decode(&self, pos: RvAddr) -> Option<RvAddr> {
        let stride = self.layout.stride();
        if pos % stride != 0 {
            return None;
        }
        match pos / stride {
            idx @ (REG_BAUD..=REG_IEN | REG_RX_THRESHOLD) => Some(idx),
            _ => None,
        }
    }

    fn check_access(&self, pos: RvAddr, size: RvSize) -> Result<(), MemoryError> {
        if size != RvSize::Word {
            return Err(MemoryError::AccessFault {
                addr: self.base + pos,
            });
        }
        Ok(())
    }
}

impl MemoryRegion for ShaktiUart {
    fn mmap_addr(&self) -> RvAddr {
        self.base
    }

    fn mmap_size(&self) -> RvAddr {
        self.size
    }

    fn read(&mut self, agent: &Agent, pos: RvAddr, size: RvSize) -> Result<RvData, MemoryError> {
        self.check_access(pos, size)?;
        let enabled = agent.chip.is_uart_enabled();
        let val = match self.decode(pos) {
            Some(REG_TX) => 0,
            Some(REG_RCV) => {
                if enabled && self.rx_data_available() {
                    self.rx_byte.take().map(u32::from).unwrap_or(0)
                } else {
                    0
                }
            }
            Some(REG_STATUS) => {
                // TX is always ready; no backpressure is modelled.
                let mut status = STATUS_TX_EMPTY;
                if enabled && self.rx_data_available() {
                    status |= STATUS_RX_NOT_EMPTY;
                }
                status
            }
            Some(REG_BAUD) => self.reg_baud,
            Some(REG_DELAY) => self.reg_delay,
            Some(REG_CONTROL) => self.reg_control,
            Some(REG_IEN) => self.reg_ien,
            Some(REG_RX_THRESHOLD) => self.reg_rx_threshold,
            _ => 0,
        };
        Ok(val as RvData)
    }

    fn write(
        &mut self,
        agent: &Agent,
        pos: RvAddr,
        size: RvSize,
        val: RvData,
    ) -> Result<(), MemoryError> {
        self.check_access(pos, size)?;
        let value = val as u32;
        match self.decode(pos) {
            Some(REG_TX) => {
                if agent.chip.is_uart_enabled() {
                    self.transmit(value as u8)?;
                }
            }
            Some(REG_BAUD) => self.reg_baud = value,
            Some(REG_DELAY) => self.reg_delay = value,
            Some(REG_CONTROL) => self.reg_control = value,
            Some(REG_IEN) => self.reg_ien = value,
            Some(REG_RX_THRESHOLD) => self.reg_rx_threshold = value,
            // STATUS is read-only; unknown offsets are ignored.
            _ => (),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{pipe, TestChip};

    const TX_OFF: RvAddr = 0x04;
    const RCV_OFF: RvAddr = 0x08;
    const STATUS_OFF: RvAddr = 0x0c;

    fn uart() -> ShaktiUart {
        ShaktiUart::new(0x02_0000_4000, 4096, UartLayout::Compact)
    }

    #[test]
    fn test_pin_mux_gated() {
        let chip = TestChip::new();
        chip.set_uart_enabled(false);
        let agent = Agent::new(&chip, 0, 0);
        let mut uart = uart();
        let (rx_read, rx_write) = pipe();
        let (tx_read, tx_write) = pipe();
        uart.set_rx_fd(rx_read);
        uart.set_tx_fd(tx_write);

        // A byte is waiting, but the pin mux keeps the UART off its pins.
        assert_eq!(unsafe { libc::write(rx_write, b"A".as_ptr() as *const _, 1) }, 1);
        let status = uart.read(&agent, STATUS_OFF, RvSize::Word).unwrap();
        assert_eq!(status, STATUS_TX_EMPTY as u64);
        assert_eq!(uart.read(&agent, RCV_OFF, RvSize::Word).unwrap(), 0);

        // Transmit is silently discarded.
        uart.write(&agent, TX_OFF, RvSize::Word, b'X' as u64).unwrap();
        let mut buf = [0u8; 4];
        let mut pfd = libc::pollfd { fd: tx_read, events: libc::POLLIN, revents: 0 };
        assert_eq!(unsafe { libc::poll(&mut pfd, 1, 0) }, 0);

        // Configuration registers stay accessible in either state.
        uart.write(&agent, 0x00, RvSize::Word, 115_200).unwrap();
        assert_eq!(uart.read(&agent, 0x00, RvSize::Word).unwrap(), 115_200);

        // Enabling the mux delivers the waiting byte.
        chip.set_uart_enabled(true);
        let status = uart.read(&agent, STATUS_OFF, RvSize::Word).unwrap();
        assert_ne!(status & STATUS_RX_NOT_EMPTY as u64, 0);
        assert_eq!(uart.read(&agent, RCV_OFF, RvSize::Word).unwrap(), b'A' as u64);
        let status = uart.read(&agent, STATUS_OFF, RvSize::Word).unwrap();
        assert_eq!(status & STATUS_RX_NOT_EMPTY as u64, 0);

        uart.write(&agent, TX_OFF, RvSize::Word, b'X' as u64).unwrap();
        assert_eq!(unsafe { libc::read(tx_read, buf.as_mut_ptr() as *mut _, 4) }, 1);
        assert_eq!(buf[0], b'X');

        for fd in [rx_read, rx_write, tx_read, tx_write] {
            unsafe { libc::close(fd) };
        }
    }

    #[test]
    fn test_rx_eof_detaches_descriptor() {
        let chip = TestChip::new();
        let agent = Agent::new(&chip, 0, 0);
        let mut uart = uart();
        let (rx_read, rx_write) = pipe();
        uart.set_rx_fd(rx_read);

        assert_eq!(unsafe { libc::write(rx_write, b"Z".as_ptr() as *const _, 1) }, 1);
        unsafe { libc::close(rx_write) };

        // The buffered byte still arrives, then end-of-file detaches.
        assert_eq!(uart.read(&agent, RCV_OFF, RvSize::Word).unwrap(), b'Z' as u64);
        let status = uart.read(&agent, STATUS_OFF, RvSize::Word).unwrap();
        assert_eq!(status & STATUS_RX_NOT_EMPTY as u64, 0);
        assert_eq!(uart.rx_fd(), -1);

        unsafe { libc::close(rx_read) };
    }

    #[test]
    fn test_detached_rx_reads_zero() {
        let chip = TestChip::new();
        let agent = Agent::new(&chip, 0, 0);
        let mut uart = uart();

        assert_eq!(uart.read(&agent, RCV_OFF, RvSize::Word).unwrap(), 0);
        let status = uart.read(&agent, STATUS_OFF, RvSize::Word).unwrap();
        assert_eq!(status, STATUS_TX_EMPTY as u64);
        // Detached TX swallows the byte without error.
        uart.write(&agent, TX_OFF, RvSize::Word, b'Q' as u64).unwrap();
    }

    #[test]
    fn test_spread_layout_offsets() {
        let chip = TestChip::new();
        let agent = Agent::new(&chip, 0, 0);
        let mut uart = ShaktiUart::new(0, 4096, UartLayout::Spread);

        uart.write(&agent, 0x30, RvSize::Word, 0x5).unwrap();
        assert_eq!(uart.read(&agent, 0x30, RvSize::Word).unwrap(), 0x5);
        uart.write(&agent, 0x40, RvSize::Word, 0x9).unwrap();
        assert_eq!(uart.read(&agent, 0x40, RvSize::Word).unwrap(), 0x9);

        // 0x18 decodes as STATUS in this variant, not IEN.
        assert_eq!(uart.read(&agent, 0x18, RvSize::Word).unwrap(), STATUS_TX_EMPTY as u64);

        // The slot between IEN and RX_THRESHOLD is not a register.
        uart.write(&agent, 0x38, RvSize::Word, 0x7).unwrap();
        assert_eq!(uart.read(&agent, 0x38, RvSize::Word).unwrap(), 0);
    }

    #[test]
    fn test_word_accesses_only() {
        let chip = TestChip::new();
        let agent = Agent::new(&chip, 0, 0);
        let mut uart = uart();

        assert_eq!(
            uart.read(&agent, 0x00, RvSize::Byte),
            Err(MemoryError::AccessFault { addr: 0x02_0000_4000 })
        );
        assert_eq!(
            uart.write(&agent, 0x04, RvSize::DWord, 0),
            Err(MemoryError::AccessFault { addr: 0x02_0000_4004 })
        );
    }
}
