//! Global and block header codecs.
//!
//! # Global Header (offset 0)
//!
//! ```text
//! ┌────────────┬──────────────┬───────────────────┬──────────────────────┬──────────┐
//! │ magic (1B) │ version (1B) │ total_blocks (2B) │ active_block (2B)    │ crc (1B) │
//! │ 0xA5       │ 0x01         │ u16 LE            │ u16 LE               │ CRC-8    │
//! └────────────┴──────────────┴───────────────────┴──────────────────────┴──────────┘
//! ```
//!
//! The CRC covers the six preceding bytes.
//!
//! # Block Header (offset `GLOBAL_HEADER_SIZE + i * block_size`)
//!
//! ```text
//! ┌─────────────┬─────────────────────┬──────────┐
//! │ status (1B) │ current_offset (2B) │ crc (1B) │
//! │             │ u16 LE              │ CRC-8    │
//! └─────────────┴─────────────────────┴──────────┘
//! ```
//!
//! The CRC covers exactly `{status, lo(current_offset), hi(current_offset)}`
//! in that order; this scope is part of the persisted format.

use crate::checksum::crc8;
use crate::error::StoreError;
use crate::types::{
    BlockStatus, BLOCK_HEADER_SIZE, GLOBAL_HEADER_SIZE, STORE_MAGIC, STORE_VERSION,
};

// ============================================================================
// Global Header
// ============================================================================

/// Store-wide metadata persisted at device offset 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobalHeader {
    /// Number of blocks the device was formatted with.
    pub total_blocks: u16,
    /// Index of the block currently receiving appends.
    pub active_block: u16,
}

impl GlobalHeader {
    /// Serializes the header, computing a fresh CRC.
    pub fn encode(&self) -> [u8; GLOBAL_HEADER_SIZE] {
        let mut buf = [0u8; GLOBAL_HEADER_SIZE];
        buf[0] = STORE_MAGIC;
        buf[1] = STORE_VERSION;
        buf[2..4].copy_from_slice(&self.total_blocks.to_le_bytes());
        buf[4..6].copy_from_slice(&self.active_block.to_le_bytes());
        buf[6] = crc8(&buf[..6]);
        buf
    }

    /// Parses and validates a header image.
    ///
    /// # Errors
    ///
    /// [`StoreError::BadMagic`], [`StoreError::UnsupportedVersion`], or
    /// [`StoreError::CorruptedHeader`]. Callers must not interpret any field
    /// of a header that failed validation.
    pub fn decode(buf: &[u8; GLOBAL_HEADER_SIZE]) -> Result<Self, StoreError> {
        if buf[0] != STORE_MAGIC {
            return Err(StoreError::BadMagic(buf[0]));
        }
        if buf[1] != STORE_VERSION {
            return Err(StoreError::UnsupportedVersion(buf[1]));
        }
        if crc8(&buf[..6]) != buf[6] {
            return Err(StoreError::CorruptedHeader);
        }
        Ok(Self {
            total_blocks: u16::from_le_bytes([buf[2], buf[3]]),
            active_block: u16::from_le_bytes([buf[4], buf[5]]),
        })
    }
}

// ============================================================================
// Block Header
// ============================================================================

/// Per-block metadata at the block's base address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    /// Lifecycle state.
    pub status: BlockStatus,
    /// Byte offset, from the block start, where the next entry would land.
    /// `BLOCK_HEADER_SIZE` for a freshly initialized block.
    pub current_offset: u16,
}

impl BlockHeader {
    /// Header for a freshly initialized block of the given status.
    pub fn new(status: BlockStatus) -> Self {
        Self {
            status,
            current_offset: BLOCK_HEADER_SIZE as u16,
        }
    }

    /// Serializes the header, computing a fresh CRC.
    pub fn encode(&self) -> [u8; BLOCK_HEADER_SIZE] {
        let mut buf = [0u8; BLOCK_HEADER_SIZE];
        buf[0] = self.status.as_byte();
        buf[1..3].copy_from_slice(&self.current_offset.to_le_bytes());
        buf[3] = crc8(&buf[..3]);
        buf
    }

    /// Parses and validates a header image.
    ///
    /// # Errors
    ///
    /// [`StoreError::CorruptedHeader`] on CRC mismatch,
    /// [`StoreError::UnknownBlockStatus`] on an unrecognized status byte.
    pub fn decode(buf: &[u8; BLOCK_HEADER_SIZE]) -> Result<Self, StoreError> {
        if crc8(&buf[..3]) != buf[3] {
            return Err(StoreError::CorruptedHeader);
        }
        let status =
            BlockStatus::from_byte(buf[0]).ok_or(StoreError::UnknownBlockStatus(buf[0]))?;
        Ok(Self {
            status,
            current_offset: u16::from_le_bytes([buf[1], buf[2]]),
        })
    }
}
