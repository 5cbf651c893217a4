//! ferrite-bus: transport contract for I2C byte-addressable memories
//!
//! This crate defines the seam between the storage engine and the physical
//! device: a [`MemoryBus`] trait for reading and writing byte ranges at
//! 16-bit device-internal addresses, plus [`I2cBus`], the real-device
//! adapter built on `embedded-hal`.
//!
//! # Wire Format
//!
//! Every transaction addresses the device with a two-byte big-endian
//! pointer before the payload:
//!
//! ```text
//! write:  [dev_addr] [addr_hi] [addr_lo] [data]
//! read:   [dev_addr] [addr_hi] [addr_lo]  →  [dev_addr|R] [data ...]
//! ```
//!
//! # Device Families
//!
//! FRAM and EEPROM differ only in timing: FRAM completes writes in the bus
//! transaction itself and tolerates a 1 MHz clock, while EEPROM needs an
//! internal program cycle after every written byte (5 ms) plus a settle
//! delay after a multi-byte sequence (1 ms), and is driven at 100 kHz.
//! [`MemoryKind`] captures the policy; the adapter applies the delays.

mod i2c;

pub use i2c::I2cBus;


// ============================================================================
// Device Family
// ============================================================================

/// Supported I2C memory families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryKind {
    /// Ferroelectric RAM: zero write latency, fast clock.
    Fram,
    /// EEPROM: internal write cycle after every byte, slow clock.
    Eeprom,
}

impl MemoryKind {
    /// Bus clock this family is driven at.
    ///
    /// `embedded-hal` fixes the clock when the platform I2C peripheral is
    /// constructed; platform init code should consult this value.
    pub fn bus_clock_hz(self) -> u32 {
        match self {
            MemoryKind::Fram => 1_000_000,
            MemoryKind::Eeprom => 100_000,
        }
    }

    /// Delay after each written byte, in microseconds.
    pub fn byte_write_delay_us(self) -> u32 {
        match self {
            MemoryKind::Fram => 0,
            MemoryKind::Eeprom => 5_000,
        }
    }

    /// Delay after a multi-byte write sequence, in microseconds.
    pub fn settle_delay_us(self) -> u32 {
        match self {
            MemoryKind::Fram => 0,
            MemoryKind::Eeprom => 1_000,
        }
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Transport configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusConfig {
    /// Device family, which decides clock and write-cycle delays.
    pub kind: MemoryKind,
    /// 7-bit device address used in every transaction.
    pub address: u8,
    /// SDA pin override; `None` means "use platform defaults".
    pub sda_pin: Option<u8>,
    /// SCL pin override; `None` means "use platform defaults".
    pub scl_pin: Option<u8>,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            kind: MemoryKind::Eeprom,
            address: 0x50,
            sda_pin: None,
            scl_pin: None,
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Errors surfaced by a transport implementation.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    /// The device did not acknowledge its address.
    #[error("device at {address:#04x} did not acknowledge")]
    NoAck { address: u8 },

    /// The transaction failed for any other reason.
    #[error("i2c transaction failed")]
    Transaction,
}

// ============================================================================
// Transport Contract
// ============================================================================

/// Byte-level access to a 16-bit-addressed memory device.
///
/// Implementations must uphold two conventions the storage layers rely on:
///
/// - A read that cannot yield the requested bytes fills the remainder of
///   the buffer with `0xFF`; callers treat `0xFF`-filled regions as
///   uninitialized and detect them through checksums.
/// - A failed write is simply lost. Its effect becomes visible on the next
///   checksum-validated read, so implementations need not retry.
pub trait MemoryBus {
    /// Checks that the device acknowledges its address.
    fn probe(&mut self) -> Result<(), BusError>;

    /// Reads a single byte.
    fn read_byte(&mut self, address: u16) -> Result<u8, BusError>;

    /// Writes a single byte.
    ///
    /// This is the smallest unit the device can program and the only write
    /// the storage layers assume to be atomic under power loss.
    fn write_byte(&mut self, address: u16, value: u8) -> Result<(), BusError>;

    /// Reads `buf.len()` bytes starting at `address`.
    fn read(&mut self, address: u16, buf: &mut [u8]) -> Result<(), BusError>;

    /// Writes `data.len()` bytes starting at `address`.
    fn write(&mut self, address: u16, data: &[u8]) -> Result<(), BusError>;
}
