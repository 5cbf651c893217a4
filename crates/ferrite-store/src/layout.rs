//! Device layout math.
//!
//! The device is a linear byte array:
//!
//! ```text
//! [ GlobalHeader | Block 0 | Block 1 | ... | Block N-1 ]
//! ```
//!
//! with `N = (total_memory_bytes - GLOBAL_HEADER_SIZE) / block_size`. Any
//! tail bytes that do not fill a whole block are unused.

use crate::error::StoreError;
use crate::types::{StoreConfig, BLOCK_HEADER_SIZE, GLOBAL_HEADER_SIZE};

/// Derived device geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    block_size: usize,
    total_blocks: u16,
}

impl Geometry {
    /// Derives the geometry from a configuration.
    ///
    /// # Errors
    ///
    /// - [`StoreError::MemoryTooLarge`] if the capacity cannot be addressed
    ///   with 16 bits.
    /// - [`StoreError::NoBlocks`] if not even one block fits.
    pub fn new(config: &StoreConfig) -> Result<Self, StoreError> {
        let memory_bytes = config.total_memory_bytes();
        let block_size = usize::from(config.block_size);

        if memory_bytes > 1 << 16 {
            return Err(StoreError::MemoryTooLarge(memory_bytes));
        }

        let total_blocks = memory_bytes
            .saturating_sub(GLOBAL_HEADER_SIZE)
            .checked_div(block_size)
            .unwrap_or(0);
        if total_blocks == 0 {
            return Err(StoreError::NoBlocks {
                memory_bytes,
                block_size,
            });
        }

        Ok(Self {
            block_size,
            total_blocks: total_blocks as u16,
        })
    }

    /// Number of blocks on the device.
    pub fn total_blocks(&self) -> u16 {
        self.total_blocks
    }

    /// Block size in bytes.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Base address of block `index`.
    pub fn block_addr(&self, index: u16) -> u16 {
        (GLOBAL_HEADER_SIZE + usize::from(index) * self.block_size) as u16
    }

    /// Bytes available for entries in each block.
    pub fn payload_capacity(&self) -> usize {
        self.block_size - BLOCK_HEADER_SIZE
    }
}
