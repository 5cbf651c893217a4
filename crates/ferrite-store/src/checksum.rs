//! Checksum and key-hash primitives.
//!
//! Headers are protected by CRC-8 (polynomial 0x07, initial value 0x00, no
//! reflection, no final XOR — the SMBus PEC algorithm). Keys are pre-filtered
//! during lookup with a 16-bit DJB2 hash; a hash match is always confirmed
//! by a full byte comparison.

use crc::{Crc, CRC_8_SMBUS};

const CRC8: Crc<u8> = Crc::<u8>::new(&CRC_8_SMBUS);

/// CRC-8 over a byte range.
pub fn crc8(data: &[u8]) -> u8 {
    CRC8.checksum(data)
}

/// 16-bit DJB2 hash of a key.
pub fn key_hash(key: &str) -> u16 {
    let mut hash: u16 = 5381;
    for &byte in key.as_bytes() {
        hash = hash.wrapping_mul(33).wrapping_add(u16::from(byte));
    }
    hash
}
