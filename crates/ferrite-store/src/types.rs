//! Core types and on-device constants.

// ============================================================================
// Constants
// ============================================================================

/// Magic byte identifying a formatted device.
pub const STORE_MAGIC: u8 = 0xA5;

/// Current on-device format version.
pub const STORE_VERSION: u8 = 0x01;

/// Serialized size of the global header:
/// `magic(1) version(1) total_blocks(2) active_block(2) crc(1)`.
pub const GLOBAL_HEADER_SIZE: usize = 7;

/// Serialized size of a block header:
/// `status(1) current_offset(2) crc(1)`.
pub const BLOCK_HEADER_SIZE: usize = 4;

/// Serialized size of an entry header:
/// `status(1) data_type(1) key_hash(2) key_length(1) value_length(2)`.
pub const ENTRY_HEADER_SIZE: usize = 7;

/// Entry status byte for a live entry.
pub const ENTRY_LIVE: u8 = 0x01;

/// Entry status byte for a tombstoned entry.
///
/// Tombstoning rewrites exactly this one byte; a single-byte program is the
/// only write the device performs atomically under power loss.
pub const ENTRY_DEAD: u8 = 0x00;

// ============================================================================
// Block Status
// ============================================================================

/// Lifecycle state of a block.
///
/// A block progresses `Empty → Active → Valid → Empty` (erased during
/// garbage collection). `Invalid` is reserved; readers skip it and garbage
/// collection erases it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BlockStatus {
    /// Erased and available.
    Empty = 0x00,
    /// The single block currently receiving appends.
    Active = 0x01,
    /// Holds data but no longer receives appends.
    Valid = 0x02,
    /// Reserved; not usable.
    Invalid = 0x03,
}

impl BlockStatus {
    /// Parses a status byte.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(Self::Empty),
            0x01 => Some(Self::Active),
            0x02 => Some(Self::Valid),
            0x03 => Some(Self::Invalid),
            _ => None,
        }
    }

    /// Returns the on-device byte.
    pub fn as_byte(self) -> u8 {
        self as u8
    }

    /// Whether readers may walk this block's entries.
    pub fn is_readable(self) -> bool {
        matches!(self, Self::Active | Self::Valid)
    }
}

// ============================================================================
// Data Type Tags
// ============================================================================

/// On-device tag describing how a value's bytes are interpreted.
///
/// Tag 0 is reserved. Tags are part of the persisted format; `Long`/`ULong`
/// stay distinct from `Int`/`UInt` even though both are 32 bits here, for
/// compatibility with devices written by 32-bit hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DataType {
    Bool = 1,
    Char = 2,
    UChar = 3,
    Short = 4,
    UShort = 5,
    Int = 6,
    UInt = 7,
    Long = 8,
    ULong = 9,
    Long64 = 10,
    ULong64 = 11,
    Float = 12,
    Double = 13,
    String = 14,
    Bytes = 15,
}

impl DataType {
    /// Parses a tag byte.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            1 => Some(Self::Bool),
            2 => Some(Self::Char),
            3 => Some(Self::UChar),
            4 => Some(Self::Short),
            5 => Some(Self::UShort),
            6 => Some(Self::Int),
            7 => Some(Self::UInt),
            8 => Some(Self::Long),
            9 => Some(Self::ULong),
            10 => Some(Self::Long64),
            11 => Some(Self::ULong64),
            12 => Some(Self::Float),
            13 => Some(Self::Double),
            14 => Some(Self::String),
            15 => Some(Self::Bytes),
            _ => None,
        }
    }

    /// Returns the on-device byte.
    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Storage geometry configuration.
///
/// `block_size` is the wear-leveling granularity: a block is written only
/// while active, and garbage collection rotates the active block, so smaller
/// blocks spread writes faster at the cost of per-block header overhead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    /// Device capacity in bits, as memory datasheets quote it.
    pub total_memory_bits: u32,
    /// Block size in bytes.
    pub block_size: u16,
    /// Upper bound on key byte length.
    pub max_key_length: u8,
    /// Upper bound on value byte length.
    pub max_value_length: u16,
}

impl StoreConfig {
    /// Device capacity in bytes.
    pub fn total_memory_bytes(&self) -> usize {
        self.total_memory_bits as usize / 8
    }

    /// Largest record the configuration admits.
    pub fn max_record_size(&self) -> usize {
        ENTRY_HEADER_SIZE + usize::from(self.max_key_length) + usize::from(self.max_value_length)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            total_memory_bits: 32 * 1024,
            block_size: 256,
            max_key_length: 16,
            max_value_length: 240,
        }
    }
}
