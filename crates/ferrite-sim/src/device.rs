//! Simulated memory device with journaling and fault injection.

use ferrite_bus::{BusError, MemoryBus};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

// ============================================================================
// Fault Configuration
// ============================================================================

/// Configuration for injected transport faults.
///
/// All behavior is deterministic for a given device seed.
#[derive(Debug, Clone, Copy)]
pub struct FaultConfig {
    /// Probability that a written byte is silently lost (0.0 to 1.0).
    pub write_drop_probability: f64,
    /// Probability that a read comes back with one flipped bit (0.0 to 1.0).
    pub read_corruption_probability: f64,
}

impl FaultConfig {
    /// No faults.
    pub fn reliable() -> Self {
        Self {
            write_drop_probability: 0.0,
            read_corruption_probability: 0.0,
        }
    }
}

impl Default for FaultConfig {
    fn default() -> Self {
        Self::reliable()
    }
}

// ============================================================================
// Write Journal
// ============================================================================

/// One applied device write.
///
/// Journal entries are byte-granular because the real adapter programs one
/// byte per transaction; a crash can therefore fall between any two bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JournalWrite {
    pub address: u16,
    pub value: u8,
}

// ============================================================================
// Simulated Memory
// ============================================================================

/// In-memory I2C device.
#[derive(Debug, Clone)]
pub struct SimMemory {
    mem: Vec<u8>,
    /// Device contents at the last [`checkpoint`](Self::checkpoint).
    baseline: Vec<u8>,
    /// Writes applied since the baseline, in order.
    journal: Vec<JournalWrite>,
    faults: FaultConfig,
    rng: SmallRng,
    ack: bool,
}

impl SimMemory {
    /// Creates a reliable device of `capacity` bytes, `0xFF`-filled.
    pub fn new(capacity: usize) -> Self {
        Self::with_faults(capacity, FaultConfig::reliable(), 0)
    }

    /// Creates a reliable device with an explicit RNG seed.
    pub fn with_seed(capacity: usize, seed: u64) -> Self {
        Self::with_faults(capacity, FaultConfig::reliable(), seed)
    }

    /// Creates a device with fault injection.
    pub fn with_faults(capacity: usize, faults: FaultConfig, seed: u64) -> Self {
        let mem = vec![0xFF; capacity];
        Self {
            baseline: mem.clone(),
            mem,
            journal: Vec::new(),
            faults,
            rng: SmallRng::seed_from_u64(seed),
            ack: true,
        }
    }

    /// Device capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.mem.len()
    }

    /// Controls whether the device acknowledges probes.
    pub fn set_ack(&mut self, ack: bool) {
        self.ack = ack;
    }

    /// Overwrites one byte directly, bypassing journal and faults.
    ///
    /// Test hook for modeling external corruption.
    pub fn corrupt(&mut self, address: u16, value: u8) {
        if let Some(slot) = self.mem.get_mut(usize::from(address)) {
            *slot = value;
        }
    }

    /// Reads one byte without going through the bus.
    pub fn peek(&self, address: u16) -> u8 {
        self.mem.get(usize::from(address)).copied().unwrap_or(0xFF)
    }

    /// Writes applied since the last checkpoint.
    pub fn journal(&self) -> &[JournalWrite] {
        &self.journal
    }

    /// Number of journaled writes.
    pub fn journal_len(&self) -> usize {
        self.journal.len()
    }

    /// Makes the current contents the new journal baseline.
    pub fn checkpoint(&mut self) {
        self.baseline = self.mem.clone();
        self.journal.clear();
    }

    /// Device state as a power loss after `applied` journaled writes would
    /// have left it: the baseline plus the first `applied` writes.
    ///
    /// The fork is reliable, acknowledging, and starts a fresh journal.
    pub fn fork_at(&self, applied: usize) -> SimMemory {
        let mut mem = self.baseline.clone();
        for write in &self.journal[..applied.min(self.journal.len())] {
            if let Some(slot) = mem.get_mut(usize::from(write.address)) {
                *slot = write.value;
            }
        }
        Self {
            baseline: mem.clone(),
            mem,
            journal: Vec::new(),
            faults: FaultConfig::reliable(),
            rng: SmallRng::seed_from_u64(0),
            ack: true,
        }
    }

    fn apply_byte(&mut self, address: u16, value: u8) {
        // Out-of-range writes are lost, like a device that stops ACKing.
        if let Some(slot) = self.mem.get_mut(usize::from(address)) {
            *slot = value;
            self.journal.push(JournalWrite { address, value });
        }
    }

    fn store_byte(&mut self, address: u16, value: u8) {
        if self.faults.write_drop_probability > 0.0
            && self.rng.gen_bool(self.faults.write_drop_probability)
        {
            return;
        }
        self.apply_byte(address, value);
    }

    fn load_byte(&mut self, address: u16) -> u8 {
        let value = self.peek(address);
        if self.faults.read_corruption_probability > 0.0
            && self.rng.gen_bool(self.faults.read_corruption_probability)
        {
            return value ^ (1 << self.rng.gen_range(0..8));
        }
        value
    }
}

impl MemoryBus for SimMemory {
    fn probe(&mut self) -> Result<(), BusError> {
        if self.ack {
            Ok(())
        } else {
            Err(BusError::NoAck { address: 0x50 })
        }
    }

    fn read_byte(&mut self, address: u16) -> Result<u8, BusError> {
        Ok(self.load_byte(address))
    }

    fn write_byte(&mut self, address: u16, value: u8) -> Result<(), BusError> {
        self.store_byte(address, value);
        Ok(())
    }

    fn read(&mut self, address: u16, buf: &mut [u8]) -> Result<(), BusError> {
        for (i, slot) in buf.iter_mut().enumerate() {
            *slot = self.load_byte(address.wrapping_add(i as u16));
        }
        Ok(())
    }

    fn write(&mut self, address: u16, data: &[u8]) -> Result<(), BusError> {
        for (i, value) in data.iter().enumerate() {
            self.store_byte(address.wrapping_add(i as u16), *value);
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
