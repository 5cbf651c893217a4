//! Real-device adapter over `embedded-hal` I2C.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{Error as _, ErrorKind, I2c};

use crate::{BusConfig, BusError, MemoryBus};

/// [`MemoryBus`] implementation for an I2C-attached FRAM or EEPROM.
///
/// Writes are issued one byte per transaction. Page-write support varies
/// between devices and silently wraps at page boundaries, so per-byte
/// transactions are the only portable form; FRAM pays no write-cycle cost
/// and EEPROM needs the per-byte program delay anyway.
pub struct I2cBus<I2C, D> {
    i2c: I2C,
    delay: D,
    config: BusConfig,
}

impl<I2C, D> I2cBus<I2C, D> {
    /// Creates an adapter over an already-initialized I2C peripheral.
    ///
    /// The peripheral must be clocked per [`MemoryKind::bus_clock_hz`];
    /// pin routing from [`BusConfig`] is applied by platform init code.
    ///
    /// [`MemoryKind::bus_clock_hz`]: crate::MemoryKind::bus_clock_hz
    pub fn new(i2c: I2C, delay: D, config: BusConfig) -> Self {
        Self { i2c, delay, config }
    }

    /// Returns the transport configuration.
    pub fn config(&self) -> &BusConfig {
        &self.config
    }

    /// Releases the underlying peripheral and delay provider.
    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }
}

impl<I2C: I2c, D: DelayNs> I2cBus<I2C, D> {
    fn map_err(&self, err: I2C::Error) -> BusError {
        match err.kind() {
            ErrorKind::NoAcknowledge(_) => BusError::NoAck {
                address: self.config.address,
            },
            _ => BusError::Transaction,
        }
    }

    /// One address-prefixed data byte, plus the family's program delay.
    fn write_one(&mut self, address: u16, value: u8) -> Result<(), BusError> {
        let [hi, lo] = address.to_be_bytes();
        self.i2c
            .write(self.config.address, &[hi, lo, value])
            .map_err(|e| self.map_err(e))?;
        let us = self.config.kind.byte_write_delay_us();
        if us > 0 {
            self.delay.delay_us(us);
        }
        Ok(())
    }
}

impl<I2C: I2c, D: DelayNs> MemoryBus for I2cBus<I2C, D> {
    fn probe(&mut self) -> Result<(), BusError> {
        // Address-only transaction; a NoAck here means no device.
        self.i2c
            .write(self.config.address, &[])
            .map_err(|e| self.map_err(e))
    }

    fn read_byte(&mut self, address: u16) -> Result<u8, BusError> {
        let mut buf = [0u8; 1];
        self.read(address, &mut buf)?;
        Ok(buf[0])
    }

    fn write_byte(&mut self, address: u16, value: u8) -> Result<(), BusError> {
        self.write_one(address, value)
    }

    fn read(&mut self, address: u16, buf: &mut [u8]) -> Result<(), BusError> {
        if buf.is_empty() {
            return Ok(());
        }
        self.i2c
            .write_read(self.config.address, &address.to_be_bytes(), buf)
            .map_err(|e| self.map_err(e))
    }

    fn write(&mut self, address: u16, data: &[u8]) -> Result<(), BusError> {
        if data.is_empty() {
            return Ok(());
        }
        for (i, value) in data.iter().enumerate() {
            self.write_one(address.wrapping_add(i as u16), *value)?;
        }
        let us = self.config.kind.settle_delay_us();
        if us > 0 {
            self.delay.delay_us(us);
        }
        Ok(())
    }
}
