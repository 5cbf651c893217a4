//! ferrite-store: wear-leveled key-value storage for I2C FRAM/EEPROM
//!
//! A persistent key-value store hosted on an external I2C byte-addressable
//! memory. Short textual keys map to typed scalar or byte-buffer values.
//! The store survives power loss, validates its own metadata with CRC-8
//! checksums, and spreads write traffic across the device through block
//! rotation with compacting garbage collection.
//!
//! # Device Layout
//!
//! ```text
//! ┌──────────────┬─────────────────┬─────────────────┬─────┬─────────────────┐
//! │ GlobalHeader │     Block 0     │     Block 1     │ ... │    Block N-1    │
//! └──────────────┴─────────────────┴─────────────────┴─────┴─────────────────┘
//!                 ┌─────────────┬──────────────────────────────────┐
//!                 │ BlockHeader │ entry │ entry │ entry │ (free)   │
//!                 └─────────────┴──────────────────────────────────┘
//! ```
//!
//! Exactly one block is ACTIVE and receives appends. An update tombstones
//! the key's previous entry (a single atomic byte write) before appending
//! the new one, so at most one live entry per key exists at any quiescent
//! point — including after a crash. When the active block fills, garbage
//! collection copies every live entry into the next empty block, erases the
//! sources, and rotates the active role there; tombstoned space is
//! reclaimed and wear spreads over the device as a side effect.
//!
//! # Example
//!
//! ```ignore
//! use ferrite_bus::{BusConfig, I2cBus};
//! use ferrite_store::{BlockStore, StoreConfig};
//!
//! let bus = I2cBus::new(i2c, delay, BusConfig::default());
//! let mut store = BlockStore::new(bus, StoreConfig::default());
//! store.begin()?;
//!
//! store.put_int("bootCount", 7)?;
//! assert_eq!(store.get_int("bootCount", -1), 7);
//! assert_eq!(store.get_string("bootCount", ""), ""); // wrong type → default
//! ```

mod checksum;
mod entry;
mod error;
mod header;
mod layout;
mod store;
mod typed;
mod types;

#[cfg(test)]
mod tests;

// Public API
pub use checksum::{crc8, key_hash};
pub use entry::{EntryHeader, EntryRef};
pub use error::StoreError;
pub use header::{BlockHeader, GlobalHeader};
pub use layout::Geometry;
pub use store::BlockStore;
pub use types::{
    BlockStatus, DataType, StoreConfig, BLOCK_HEADER_SIZE, ENTRY_DEAD, ENTRY_HEADER_SIZE,
    ENTRY_LIVE, GLOBAL_HEADER_SIZE, STORE_MAGIC, STORE_VERSION,
};
