//! The storage engine: lookup, append-and-invalidate writes, garbage
//! collection with wear leveling, and startup recovery.

use bytes::Bytes;
use ferrite_bus::MemoryBus;
use tracing::{debug, warn};

use crate::checksum::key_hash;
use crate::entry::{EntryHeader, EntryRef};
use crate::error::StoreError;
use crate::header::{BlockHeader, GlobalHeader};
use crate::layout::Geometry;
use crate::types::{
    BlockStatus, DataType, StoreConfig, BLOCK_HEADER_SIZE, ENTRY_DEAD, ENTRY_HEADER_SIZE,
    ENTRY_LIVE, GLOBAL_HEADER_SIZE,
};

// ============================================================================
// Entry Walker
// ============================================================================

/// Cursor over the entries of one block, bounded by the block header's
/// persisted `current_offset`. Entries written but not yet covered by a
/// header update are invisible, which is what makes torn appends safe.
struct BlockWalk {
    base: u16,
    end: usize,
    offset: usize,
}

impl BlockWalk {
    fn new(base: u16, header: &BlockHeader) -> Self {
        Self {
            base,
            end: usize::from(header.current_offset),
            offset: BLOCK_HEADER_SIZE,
        }
    }

    /// Yields the next entry's address and header, live or tombstoned.
    fn next<B: MemoryBus>(
        &mut self,
        bus: &mut B,
    ) -> Result<Option<(u16, EntryHeader)>, StoreError> {
        if self.offset >= self.end {
            return Ok(None);
        }
        let addr = (usize::from(self.base) + self.offset) as u16;
        let mut buf = [0u8; ENTRY_HEADER_SIZE];
        bus.read(addr, &mut buf)?;
        let header = EntryHeader::decode(&buf);
        self.offset += header.record_size();
        Ok(Some((addr, header)))
    }
}

// ============================================================================
// Block Store
// ============================================================================

/// Persistent key-value store on an I2C byte-addressable memory.
///
/// Keys map to typed values in an append-only entry log spread over
/// fixed-size blocks. Updates tombstone the previous entry and append a new
/// one; when the active block fills, garbage collection compacts all live
/// entries into a fresh block and rotates write traffic there.
///
/// The store owns its device region exclusively and is single-threaded:
/// every operation runs to completion on the caller's thread.
pub struct BlockStore<B> {
    bus: B,
    config: StoreConfig,
    geometry: Option<Geometry>,
    active_block: u16,
    initialized: bool,
}

impl<B> BlockStore<B> {
    /// Creates a store over a transport. No device I/O happens until
    /// [`begin`](Self::begin).
    pub fn new(bus: B, config: StoreConfig) -> Self {
        let payload = usize::from(config.block_size).saturating_sub(BLOCK_HEADER_SIZE);
        if config.max_record_size() > payload {
            warn!(
                max_record = config.max_record_size(),
                payload, "max key/value lengths too large for the block size"
            );
        }
        Self {
            bus,
            config,
            geometry: None,
            active_block: 0,
            initialized: false,
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Index of the block currently receiving appends.
    pub fn active_block(&self) -> u16 {
        self.active_block
    }

    /// Whether `begin` (or `clear`) has completed successfully.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Returns the transport.
    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Returns the transport mutably.
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Releases the transport. No persistent state changes.
    pub fn end(self) -> B {
        self.bus
    }
}

impl<B: MemoryBus> BlockStore<B> {
    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Initializes the store: probes the device, validates the on-device
    /// metadata, and formats or repairs as needed.
    ///
    /// A device without a usable global header (blank, foreign, or
    /// corrupted) is formatted from scratch. A device whose global header is
    /// intact but whose active block is unusable is repaired by compacting
    /// the surviving blocks.
    ///
    /// # Errors
    ///
    /// Transport errors from the probe, configuration errors from the
    /// geometry, and capacity errors from a failed repair.
    pub fn begin(&mut self) -> Result<(), StoreError> {
        self.initialized = false;
        self.bus.probe()?;
        let geometry = Geometry::new(&self.config)?;
        self.geometry = Some(geometry);

        let healthy = match self.read_global_header() {
            Ok(header)
                if header.total_blocks == geometry.total_blocks()
                    && header.active_block < geometry.total_blocks() =>
            {
                self.active_block = header.active_block;
                matches!(
                    self.read_block_header(header.active_block),
                    Ok(block) if block.status == BlockStatus::Active
                )
            }
            _ => {
                debug!("no usable global header, formatting device");
                self.active_block = 0;
                self.collect_garbage(false)?;
                self.initialized = true;
                return Ok(());
            }
        };

        if !healthy {
            warn!(block = self.active_block, "active block unusable, repairing");
            self.collect_garbage(true)?;
        }
        self.initialized = true;
        Ok(())
    }

    /// Erases all stored data and reformats the device.
    ///
    /// The result is equivalent to `begin` on a blank device; the store
    /// stays usable afterwards.
    pub fn clear(&mut self) -> Result<(), StoreError> {
        self.initialized = false;
        self.active_block = 0;
        if self.geometry.is_none() {
            self.geometry = Some(Geometry::new(&self.config)?);
        }
        self.collect_garbage(false)?;
        self.initialized = true;
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Public key operations
    // ------------------------------------------------------------------------

    /// Whether `key` currently has a live entry.
    pub fn is_key(&mut self, key: &str) -> bool {
        matches!(self.find(key), Ok(Some(_)))
    }

    /// Tombstones the entry for `key`.
    ///
    /// Returns `false` when the key is absent; removal of an absent key is
    /// not an error.
    pub fn remove(&mut self, key: &str) -> bool {
        match self.find(key) {
            Ok(Some(entry)) => self.mark_deleted(entry.header_addr).unwrap_or(false),
            _ => false,
        }
    }

    /// Stores `value` under `key` with the given type tag.
    ///
    /// This is the byte-level entry API; the typed put family are thin
    /// adapters over it.
    pub fn put_raw(
        &mut self,
        key: &str,
        data_type: DataType,
        value: &[u8],
    ) -> Result<(), StoreError> {
        self.write_entry(key, data_type, value)
    }

    /// Reads the value stored under `key`, if present and tagged `expected`.
    ///
    /// Any failure along the way — absent key, unreadable block, tag
    /// mismatch — yields `None`; getters resolve that to the caller's
    /// default.
    pub fn get_raw(&mut self, key: &str, expected: DataType) -> Option<Bytes> {
        let entry = self.find(key).ok()??;
        if entry.data_type != Some(expected) {
            return None;
        }
        let mut buf = vec![0u8; usize::from(entry.value_length)];
        self.bus.read(entry.value_addr, &mut buf).ok()?;
        Some(Bytes::from(buf))
    }

    // ------------------------------------------------------------------------
    // Lookup
    // ------------------------------------------------------------------------

    /// Locates the live entry for `key` across all readable blocks.
    ///
    /// The key hash and length act as a pre-filter; a match is confirmed by
    /// comparing the key bytes exactly. Because updates tombstone the old
    /// entry before appending the new one, at most one live entry per key
    /// exists and scan order does not matter.
    pub(crate) fn find(&mut self, key: &str) -> Result<Option<EntryRef>, StoreError> {
        if !self.initialized {
            return Ok(None);
        }
        let geometry = self.geometry.ok_or(StoreError::NotInitialized)?;
        let target_hash = key_hash(key);
        let target_len = key.len();

        for block in 0..geometry.total_blocks() {
            let header = match self.read_block_header(block) {
                Ok(header) => header,
                Err(_) => continue,
            };
            if !header.status.is_readable() {
                continue;
            }

            let mut walk = BlockWalk::new(geometry.block_addr(block), &header);
            while let Some((addr, entry)) = walk.next(&mut self.bus)? {
                if !entry.is_live() {
                    continue;
                }
                if entry.key_hash != target_hash || usize::from(entry.key_length) != target_len {
                    continue;
                }
                let mut key_buf = vec![0u8; target_len];
                self.bus
                    .read((usize::from(addr) + ENTRY_HEADER_SIZE) as u16, &mut key_buf)?;
                if key_buf == key.as_bytes() {
                    return Ok(Some(EntryRef {
                        header_addr: addr,
                        value_addr: (usize::from(addr) + ENTRY_HEADER_SIZE + target_len) as u16,
                        value_length: entry.value_length,
                        data_type: entry.data_type(),
                    }));
                }
            }
        }
        Ok(None)
    }

    // ------------------------------------------------------------------------
    // Writer
    // ------------------------------------------------------------------------

    fn write_entry(
        &mut self,
        key: &str,
        data_type: DataType,
        value: &[u8],
    ) -> Result<(), StoreError> {
        if !self.initialized {
            return Err(StoreError::NotInitialized);
        }
        let geometry = self.geometry.ok_or(StoreError::NotInitialized)?;
        if key.is_empty() {
            return Err(StoreError::EmptyKey);
        }
        if key.len() > usize::from(self.config.max_key_length) {
            return Err(StoreError::KeyTooLong {
                len: key.len(),
                max: usize::from(self.config.max_key_length),
            });
        }
        if value.len() > usize::from(self.config.max_value_length) {
            return Err(StoreError::ValueTooLong {
                len: value.len(),
                max: usize::from(self.config.max_value_length),
            });
        }

        // Tombstone any previous entry first: a single-byte write, so a
        // power loss between it and the append leaves the key absent rather
        // than doubled.
        if let Some(old) = self.find(key)? {
            self.mark_deleted(old.header_addr)?;
        }

        let mut header = match self.read_block_header(self.active_block) {
            Ok(header) if header.status == BlockStatus::Active => header,
            Err(err @ StoreError::Bus(_)) => return Err(err),
            _ => return Err(StoreError::NotWritable),
        };

        let record = ENTRY_HEADER_SIZE + key.len() + value.len();
        if usize::from(header.current_offset) + record > geometry.block_size() {
            self.collect_garbage(true)?;
            header = match self.read_block_header(self.active_block) {
                Ok(header) if header.status == BlockStatus::Active => header,
                Err(err @ StoreError::Bus(_)) => return Err(err),
                _ => return Err(StoreError::NotWritable),
            };
            if usize::from(header.current_offset) + record > geometry.block_size() {
                return Err(StoreError::OutOfSpace { needed: record });
            }
        }

        let entry = EntryHeader {
            status: ENTRY_LIVE,
            data_type: data_type.as_byte(),
            key_hash: key_hash(key),
            key_length: key.len() as u8,
            value_length: value.len() as u16,
        };
        let base = usize::from(geometry.block_addr(self.active_block));
        let addr = base + usize::from(header.current_offset);

        // Entry bytes land before the header update; a crash in between
        // leaves them invisible beyond the persisted offset.
        self.bus.write(addr as u16, &entry.encode())?;
        self.bus
            .write((addr + ENTRY_HEADER_SIZE) as u16, key.as_bytes())?;
        self.bus
            .write((addr + ENTRY_HEADER_SIZE + key.len()) as u16, value)?;

        header.current_offset += record as u16;
        self.write_block_header(self.active_block, &header)?;
        Ok(())
    }

    fn mark_deleted(&mut self, header_addr: u16) -> Result<bool, StoreError> {
        let status = self.bus.read_byte(header_addr)?;
        if status != ENTRY_LIVE {
            return Ok(false);
        }
        self.bus.write_byte(header_addr, ENTRY_DEAD)?;
        Ok(true)
    }

    // ------------------------------------------------------------------------
    // Garbage Collection / Wear Leveling
    // ------------------------------------------------------------------------

    /// Compacts live entries into a fresh block and promotes it to active.
    ///
    /// The target is the first empty (or header-less) block at or after the
    /// active block's successor, so repeated collections rotate write
    /// traffic through every block. With `migrate` false the sources are
    /// erased without copying, which reformats the device.
    ///
    /// Write ordering is chosen for crash consistency: the outgoing active
    /// block is demoted first, copied entries stay invisible until the
    /// target header is finalized, and sources are only erased after every
    /// live entry has been copied.
    pub(crate) fn collect_garbage(&mut self, migrate: bool) -> Result<(), StoreError> {
        let geometry = self.geometry.ok_or(StoreError::NotInitialized)?;
        let total = geometry.total_blocks();

        // 1. Select the target block.
        let start = if self.initialized {
            (usize::from(self.active_block) + 1) % usize::from(total)
        } else {
            0
        };
        let mut target = None;
        for step in 0..usize::from(total) {
            let block = ((start + step) % usize::from(total)) as u16;
            match self.read_block_header(block) {
                Ok(header) if header.status == BlockStatus::Empty => {
                    target = Some(block);
                    break;
                }
                Ok(_) => {}
                // A block without a decodable header counts as empty.
                Err(_) => {
                    target = Some(block);
                    break;
                }
            }
        }
        let target = target.ok_or(StoreError::NoEmptyBlock)?;
        debug!(block = target, migrate, "selected compaction target");

        // 2. Demote the outgoing active block. One CRC-backed header write,
        // so a crash here leaves it readable as VALID.
        if self.initialized {
            if let Ok(mut active) = self.read_block_header(self.active_block) {
                active.status = BlockStatus::Valid;
                self.write_block_header(self.active_block, &active)?;
            }
        }

        // 3. Initialize the target.
        self.write_block_header(target, &BlockHeader::new(BlockStatus::Active))?;
        let target_base = usize::from(geometry.block_addr(target));
        let mut cursor = BLOCK_HEADER_SIZE;

        // 4. Copy live entries from every other usable block; queue sources
        // for erasure once the whole copy has succeeded.
        let mut stage = vec![0u8; self.config.max_record_size()];
        let mut erase_list: Vec<u16> = Vec::new();
        let mut migrated = 0usize;

        for block in 0..total {
            if block == target {
                continue;
            }
            let header = match self.read_block_header(block) {
                Ok(header) => header,
                Err(_) => {
                    erase_list.push(block);
                    continue;
                }
            };
            match header.status {
                BlockStatus::Empty => continue,
                BlockStatus::Invalid => {
                    erase_list.push(block);
                    continue;
                }
                BlockStatus::Active | BlockStatus::Valid => {}
            }

            if migrate {
                let mut walk = BlockWalk::new(geometry.block_addr(block), &header);
                loop {
                    let (addr, entry) = match walk.next(&mut self.bus) {
                        Ok(Some(item)) => item,
                        Ok(None) => break,
                        Err(_) => {
                            warn!(block, "entry walk failed, dropping block remainder");
                            break;
                        }
                    };
                    if !entry.is_live()
                        || entry.key_length > self.config.max_key_length
                        || entry.value_length > self.config.max_value_length
                    {
                        continue;
                    }
                    let record = entry.record_size();
                    if cursor + record > geometry.block_size() {
                        return Err(StoreError::CompactionOverflow);
                    }
                    self.bus.read(addr, &mut stage[..record])?;
                    self.bus
                        .write((target_base + cursor) as u16, &stage[..record])?;
                    cursor += record;
                    migrated += 1;
                }
            }
            erase_list.push(block);
        }

        // Erase sources, then publish the target's contents.
        for block in erase_list {
            self.write_block_header(block, &BlockHeader::new(BlockStatus::Empty))?;
        }
        self.write_block_header(
            target,
            &BlockHeader {
                status: BlockStatus::Active,
                current_offset: cursor as u16,
            },
        )?;

        // 5. Commit the new epoch.
        self.active_block = target;
        self.write_global_header()?;
        debug!(block = target, migrated, "garbage collection complete");
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Header I/O
    // ------------------------------------------------------------------------

    pub(crate) fn read_global_header(&mut self) -> Result<GlobalHeader, StoreError> {
        let mut buf = [0u8; GLOBAL_HEADER_SIZE];
        self.bus.read(0, &mut buf)?;
        GlobalHeader::decode(&buf)
    }

    fn write_global_header(&mut self) -> Result<(), StoreError> {
        let geometry = self.geometry.ok_or(StoreError::NotInitialized)?;
        let header = GlobalHeader {
            total_blocks: geometry.total_blocks(),
            active_block: self.active_block,
        };
        self.bus.write(0, &header.encode())?;
        Ok(())
    }

    pub(crate) fn read_block_header(&mut self, block: u16) -> Result<BlockHeader, StoreError> {
        let geometry = self.geometry.ok_or(StoreError::NotInitialized)?;
        let mut buf = [0u8; BLOCK_HEADER_SIZE];
        self.bus.read(geometry.block_addr(block), &mut buf)?;
        BlockHeader::decode(&buf)
    }

    fn write_block_header(&mut self, block: u16, header: &BlockHeader) -> Result<(), StoreError> {
        let geometry = self.geometry.ok_or(StoreError::NotInitialized)?;
        self.bus.write(geometry.block_addr(block), &header.encode())?;
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Test Support
    // ------------------------------------------------------------------------

    /// All entries of one block, live and tombstoned, in log order.
    #[cfg(test)]
    pub(crate) fn walk_entries(
        &mut self,
        block: u16,
    ) -> Result<Vec<(u16, EntryHeader)>, StoreError> {
        let geometry = self.geometry.ok_or(StoreError::NotInitialized)?;
        let header = self.read_block_header(block)?;
        let mut entries = Vec::new();
        let mut walk = BlockWalk::new(geometry.block_addr(block), &header);
        while let Some(item) = walk.next(&mut self.bus)? {
            entries.push(item);
        }
        Ok(entries)
    }
}
