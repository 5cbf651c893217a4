//! Error types for store operations.

use ferrite_bus::BusError;

/// Errors that can occur during store operations.
///
/// Getters never surface these: a failed lookup, a corrupted header, or a
/// type-tag mismatch all collapse into the caller's default. Only `begin`,
/// `clear`, and the put family report errors.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// Transport failure.
    #[error("bus error: {0}")]
    Bus(#[from] BusError),

    /// The configured geometry yields zero blocks.
    #[error("geometry yields no usable blocks ({memory_bytes} bytes of memory, {block_size}-byte blocks)")]
    NoBlocks {
        memory_bytes: usize,
        block_size: usize,
    },

    /// The device capacity exceeds the 16-bit address space.
    #[error("device capacity {0} bytes exceeds the 16-bit address space")]
    MemoryTooLarge(usize),

    /// Keys must be at least one byte.
    #[error("key must not be empty")]
    EmptyKey,

    /// The key is longer than the configured maximum.
    #[error("key length {len} exceeds maximum {max}")]
    KeyTooLong { len: usize, max: usize },

    /// The value is longer than the configured maximum.
    #[error("value length {len} exceeds maximum {max}")]
    ValueTooLong { len: usize, max: usize },

    /// A header failed its CRC check.
    #[error("corrupted header: CRC mismatch")]
    CorruptedHeader,

    /// The global header's magic byte is wrong.
    #[error("bad magic byte {0:#04x}")]
    BadMagic(u8),

    /// The global header carries an unknown format version.
    #[error("unsupported format version {0}")]
    UnsupportedVersion(u8),

    /// A block header carries an unknown status byte.
    #[error("unknown block status byte {0:#04x}")]
    UnknownBlockStatus(u8),

    /// The store has not been initialized with `begin`.
    #[error("store is not initialized")]
    NotInitialized,

    /// The active block is not in a writable state; re-initialize.
    #[error("active block is not writable")]
    NotWritable,

    /// Garbage collection found no empty block to compact into.
    #[error("out of space: no empty block available for compaction")]
    NoEmptyBlock,

    /// The live entry set no longer fits in a single block.
    #[error("out of space: live entries exceed a single block's capacity")]
    CompactionOverflow,

    /// The record does not fit in the active block, even after compaction.
    #[error("out of space: {needed}-byte record does not fit in the active block")]
    OutOfSpace { needed: usize },
}
