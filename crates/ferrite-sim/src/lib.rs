//! ferrite-sim: deterministic simulated I2C memory
//!
//! An in-memory [`MemoryBus`](ferrite_bus::MemoryBus) implementation for
//! testing the storage engine without hardware:
//!
//! - The backing array starts `0xFF`-filled, like an unprogrammed device.
//! - Every applied write is journaled at byte granularity — the same
//!   granularity the real adapter puts on the wire — so a test can fork the
//!   device at any journal prefix and observe exactly what a power loss at
//!   that instant would have left behind.
//! - Faults (dropped writes, read bit flips) are driven by a seeded RNG:
//!   the same seed always produces the same failure pattern.

mod device;

pub use device::{FaultConfig, JournalWrite, SimMemory};
