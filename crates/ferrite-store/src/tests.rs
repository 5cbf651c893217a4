//! Unit tests for the storage engine.
//!
//! Engine tests run over `ferrite-sim`, whose byte-granular write journal
//! lets crash tests replay arbitrary prefixes of the device's write stream.

use std::collections::{BTreeSet, HashMap};

use ferrite_sim::SimMemory;

use crate::{
    crc8, key_hash, BlockHeader, BlockStatus, BlockStore, DataType, EntryHeader, Geometry,
    GlobalHeader, StoreConfig, StoreError, BLOCK_HEADER_SIZE, ENTRY_DEAD, ENTRY_HEADER_SIZE,
    ENTRY_LIVE,
};

// ============================================================================
// Helpers
// ============================================================================

/// 264-byte device, 64-byte blocks: 4 blocks, 60 payload bytes each.
fn tiny_config() -> StoreConfig {
    StoreConfig {
        total_memory_bits: 264 * 8,
        block_size: 64,
        max_key_length: 4,
        max_value_length: 8,
    }
}

fn open(dev: SimMemory, config: StoreConfig) -> BlockStore<SimMemory> {
    let mut store = BlockStore::new(dev, config);
    store.begin().unwrap();
    store
}

fn default_store() -> BlockStore<SimMemory> {
    open(SimMemory::new(4096), StoreConfig::default())
}

fn tiny_store() -> BlockStore<SimMemory> {
    open(SimMemory::new(264), tiny_config())
}

/// Live entries for `key`, counted across every block on the device.
fn live_count(store: &mut BlockStore<SimMemory>, key: &str) -> usize {
    let total = Geometry::new(store.config()).unwrap().total_blocks();
    let mut count = 0;
    for block in 0..total {
        if let Ok(entries) = store.walk_entries(block) {
            count += entries
                .iter()
                .filter(|(_, entry)| {
                    entry.is_live()
                        && entry.key_hash == key_hash(key)
                        && usize::from(entry.key_length) == key.len()
                })
                .count();
        }
    }
    count
}

// ============================================================================
// Checksum Tests
// ============================================================================

#[test]
fn crc8_matches_the_smbus_check_vector() {
    assert_eq!(crc8(b"123456789"), 0xF4);
}

#[test]
fn crc8_of_nothing_is_zero() {
    assert_eq!(crc8(&[]), 0x00);
}

#[test]
fn key_hash_is_djb2_mod_2_16() {
    assert_eq!(key_hash(""), 5381);
    // 5381 * 33 + 'a' = 177670 ≡ 46598 (mod 2^16)
    assert_eq!(key_hash("a"), 46598);
    assert_ne!(key_hash("ab"), key_hash("ba"));
}

// ============================================================================
// Global Header Codec
// ============================================================================

#[test]
fn global_header_encodes_to_the_wire_layout() {
    let header = GlobalHeader {
        total_blocks: 0x0102,
        active_block: 0x0304,
    };
    let buf = header.encode();

    assert_eq!(buf[0], 0xA5); // magic
    assert_eq!(buf[1], 0x01); // version
    assert_eq!(&buf[2..4], &[0x02, 0x01]); // total_blocks, little-endian
    assert_eq!(&buf[4..6], &[0x04, 0x03]); // active_block, little-endian
    assert_eq!(buf[6], crc8(&buf[..6]));
}

#[test]
fn global_header_roundtrip() {
    let header = GlobalHeader {
        total_blocks: 15,
        active_block: 7,
    };
    assert_eq!(GlobalHeader::decode(&header.encode()).unwrap(), header);
}

#[test]
fn global_header_rejects_bad_magic() {
    let mut buf = GlobalHeader {
        total_blocks: 1,
        active_block: 0,
    }
    .encode();
    buf[0] = 0x00;
    assert!(matches!(
        GlobalHeader::decode(&buf),
        Err(StoreError::BadMagic(0x00))
    ));
}

#[test]
fn global_header_rejects_unknown_version() {
    let mut buf = GlobalHeader {
        total_blocks: 1,
        active_block: 0,
    }
    .encode();
    buf[1] = 0x02;
    assert!(matches!(
        GlobalHeader::decode(&buf),
        Err(StoreError::UnsupportedVersion(0x02))
    ));
}

#[test]
fn global_header_rejects_a_corrupted_checksum() {
    let mut buf = GlobalHeader {
        total_blocks: 1,
        active_block: 0,
    }
    .encode();
    buf[6] ^= 0xFF;
    assert!(matches!(
        GlobalHeader::decode(&buf),
        Err(StoreError::CorruptedHeader)
    ));
}

#[test]
fn an_unprogrammed_global_header_does_not_decode() {
    assert!(GlobalHeader::decode(&[0xFF; 7]).is_err());
}

// ============================================================================
// Block Header Codec
// ============================================================================

#[test]
fn block_header_crc_covers_status_then_offset_bytes() {
    let header = BlockHeader {
        status: BlockStatus::Valid,
        current_offset: 0x0201,
    };
    let buf = header.encode();

    assert_eq!(buf[0], 0x02);
    assert_eq!(&buf[1..3], &[0x01, 0x02]); // offset, little-endian
    assert_eq!(buf[3], crc8(&[0x02, 0x01, 0x02]));
}

#[test]
fn block_header_roundtrip() {
    for status in [
        BlockStatus::Empty,
        BlockStatus::Active,
        BlockStatus::Valid,
        BlockStatus::Invalid,
    ] {
        let header = BlockHeader {
            status,
            current_offset: 37,
        };
        assert_eq!(BlockHeader::decode(&header.encode()).unwrap(), header);
    }
}

#[test]
fn block_header_rejects_a_corrupted_checksum() {
    let mut buf = BlockHeader::new(BlockStatus::Active).encode();
    buf[1] ^= 0x10;
    assert!(matches!(
        BlockHeader::decode(&buf),
        Err(StoreError::CorruptedHeader)
    ));
}

#[test]
fn block_header_rejects_an_unknown_status() {
    // Valid CRC over an out-of-range status byte.
    let mut buf = [0x37, 0x04, 0x00, 0x00];
    buf[3] = crc8(&buf[..3]);
    assert!(matches!(
        BlockHeader::decode(&buf),
        Err(StoreError::UnknownBlockStatus(0x37))
    ));
}

#[test]
fn fresh_block_header_points_past_itself() {
    let header = BlockHeader::new(BlockStatus::Active);
    assert_eq!(usize::from(header.current_offset), BLOCK_HEADER_SIZE);
}

// ============================================================================
// Entry Codec
// ============================================================================

#[test]
fn entry_header_roundtrip() {
    let header = EntryHeader {
        status: ENTRY_LIVE,
        data_type: DataType::Float.as_byte(),
        key_hash: key_hash("tempOff"),
        key_length: 7,
        value_length: 4,
    };
    let decoded = EntryHeader::decode(&header.encode());
    assert_eq!(decoded, header);
    assert!(decoded.is_live());
    assert_eq!(decoded.data_type(), Some(DataType::Float));
    assert_eq!(decoded.record_size(), ENTRY_HEADER_SIZE + 7 + 4);
}

#[test]
fn entry_decode_tolerates_unknown_tags() {
    let mut buf = EntryHeader {
        status: ENTRY_LIVE,
        data_type: 0xEE,
        key_hash: 0,
        key_length: 1,
        value_length: 1,
    }
    .encode();
    buf[0] = ENTRY_DEAD;
    let decoded = EntryHeader::decode(&buf);
    assert!(!decoded.is_live());
    assert_eq!(decoded.data_type(), None);
    assert_eq!(decoded.record_size(), ENTRY_HEADER_SIZE + 2);
}

// ============================================================================
// Geometry
// ============================================================================

#[test]
fn geometry_derives_block_count_and_addresses() {
    let geometry = Geometry::new(&StoreConfig::default()).unwrap();
    // (4096 - 7) / 256
    assert_eq!(geometry.total_blocks(), 15);
    assert_eq!(geometry.block_addr(0), 7);
    assert_eq!(geometry.block_addr(1), 7 + 256);
    assert_eq!(geometry.payload_capacity(), 256 - BLOCK_HEADER_SIZE);
}

#[test]
fn geometry_rejects_a_device_too_small_for_one_block() {
    let config = StoreConfig {
        total_memory_bits: 256 * 8,
        block_size: 512,
        ..StoreConfig::default()
    };
    assert!(matches!(
        Geometry::new(&config),
        Err(StoreError::NoBlocks { .. })
    ));
}

#[test]
fn geometry_rejects_capacities_past_the_address_space() {
    let config = StoreConfig {
        total_memory_bits: (1 << 17) * 8,
        ..StoreConfig::default()
    };
    assert!(matches!(
        Geometry::new(&config),
        Err(StoreError::MemoryTooLarge(_))
    ));
}

// ============================================================================
// Lifecycle
// ============================================================================

#[test]
fn begin_formats_a_blank_device() {
    let mut store = default_store();
    let total = Geometry::new(store.config()).unwrap().total_blocks();

    let mut active = 0;
    let mut empty = 0;
    for block in 0..total {
        let header = store.read_block_header(block).unwrap();
        assert_eq!(usize::from(header.current_offset), BLOCK_HEADER_SIZE);
        match header.status {
            BlockStatus::Active => active += 1,
            BlockStatus::Empty => empty += 1,
            other => panic!("unexpected status {other:?} after format"),
        }
    }
    assert_eq!(active, 1);
    assert_eq!(empty, total - 1);

    let global = store.read_global_header().unwrap();
    assert_eq!(global.total_blocks, total);
    assert_eq!(global.active_block, store.active_block());
}

#[test]
fn begin_fails_when_the_device_does_not_ack() {
    let mut dev = SimMemory::new(264);
    dev.set_ack(false);
    let mut store = BlockStore::new(dev, tiny_config());
    assert!(matches!(store.begin(), Err(StoreError::Bus(_))));
    assert!(!store.is_initialized());
}

#[test]
fn begin_fails_on_unusable_geometry() {
    let config = StoreConfig {
        total_memory_bits: 64 * 8,
        block_size: 128,
        ..StoreConfig::default()
    };
    let mut store = BlockStore::new(SimMemory::new(64), config);
    assert!(matches!(store.begin(), Err(StoreError::NoBlocks { .. })));
}

#[test]
fn operations_before_begin_do_nothing() {
    let mut store = BlockStore::new(SimMemory::new(264), tiny_config());
    assert!(matches!(
        store.put_int("a", 1),
        Err(StoreError::NotInitialized)
    ));
    assert_eq!(store.get_int("a", -7), -7);
    assert!(!store.is_key("a"));
    assert!(!store.remove("a"));
}

#[test]
fn values_survive_a_reopen() {
    let mut store = default_store();
    store.put_int("bootCount", 41).unwrap();
    store.put_string("name", "probe-7").unwrap();

    let dev = store.end();
    let mut store = open(dev, StoreConfig::default());
    assert_eq!(store.get_int("bootCount", -1), 41);
    assert_eq!(store.get_string("name", ""), "probe-7");
}

#[test]
fn clear_erases_everything_and_stays_usable() {
    let mut store = tiny_store();
    store.put_int("aa", 1).unwrap();
    store.clear().unwrap();

    assert!(store.is_initialized());
    assert_eq!(store.get_int("aa", -1), -1);
    assert!(!store.is_key("aa"));

    store.put_int("bb", 2).unwrap();
    assert_eq!(store.get_int("bb", -1), 2);
}

#[test]
fn begin_repairs_a_demoted_active_block() {
    // Model a crash between demotion and promotion: the global header
    // points at a block whose status is VALID, not ACTIVE.
    let mut store = tiny_store();
    store.put_int("aa", 5).unwrap();
    let active = store.active_block();
    let offset = store.read_block_header(active).unwrap().current_offset;
    let addr = Geometry::new(store.config()).unwrap().block_addr(active);

    let mut dev = store.end();
    let demoted = BlockHeader {
        status: BlockStatus::Valid,
        current_offset: offset,
    }
    .encode();
    for (i, byte) in demoted.iter().enumerate() {
        dev.corrupt(addr + i as u16, *byte);
    }

    let mut store = open(dev, tiny_config());
    assert_eq!(store.get_int("aa", -1), 5);
    assert_ne!(store.active_block(), active);
}

// ============================================================================
// Typed Round-Trips
// ============================================================================

#[test]
fn every_supported_type_roundtrips() {
    let mut store = default_store();

    store.put_bool("bool", true).unwrap();
    store.put_char("char", -7).unwrap();
    store.put_uchar("uchar", 200).unwrap();
    store.put_short("short", -1234).unwrap();
    store.put_ushort("ushort", 54321).unwrap();
    store.put_int("int", -100_000).unwrap();
    store.put_uint("uint", 3_000_000_000).unwrap();
    store.put_long("long", -42).unwrap();
    store.put_ulong("ulong", 42).unwrap();
    store.put_long64("long64", -5_000_000_000).unwrap();
    store.put_ulong64("ulong64", 18_000_000_000_000_000_000).unwrap();
    store.put_float("float", 1.5).unwrap();
    store.put_double("double", -2.25).unwrap();
    store.put_string("string", "hello").unwrap();
    store.put_bytes("bytes", &[1, 2, 3]).unwrap();

    assert!(store.get_bool("bool", false));
    assert_eq!(store.get_char("char", 0), -7);
    assert_eq!(store.get_uchar("uchar", 0), 200);
    assert_eq!(store.get_short("short", 0), -1234);
    assert_eq!(store.get_ushort("ushort", 0), 54321);
    assert_eq!(store.get_int("int", 0), -100_000);
    assert_eq!(store.get_uint("uint", 0), 3_000_000_000);
    assert_eq!(store.get_long("long", 0), -42);
    assert_eq!(store.get_ulong("ulong", 0), 42);
    assert_eq!(store.get_long64("long64", 0), -5_000_000_000);
    assert_eq!(store.get_ulong64("ulong64", 0), 18_000_000_000_000_000_000);
    assert_eq!(store.get_float("float", 0.0), 1.5);
    assert_eq!(store.get_double("double", 0.0), -2.25);
    assert_eq!(store.get_string("string", ""), "hello");
    let mut buf = [0u8; 8];
    assert_eq!(store.get_bytes("bytes", &mut buf), 3);
    assert_eq!(&buf[..3], &[1, 2, 3]);
}

#[test]
fn device_scenario_roundtrip() {
    // 32 KiB FRAM, 128-byte blocks, 8-byte keys, 120-byte values.
    let config = StoreConfig {
        total_memory_bits: 32 * 1024 * 8,
        block_size: 128,
        max_key_length: 8,
        max_value_length: 120,
    };
    let mut store = open(SimMemory::new(32 * 1024), config);

    store.put_int("sensorID", 42).unwrap();
    store.put_float("tempOff", 1.5).unwrap();
    store.put_string("devName", "ESP32C3").unwrap();
    store.put_bool("debug", true).unwrap();
    store.put_long64("uptime", 1_234_567_890).unwrap();

    assert_eq!(store.get_int("sensorID", -1), 42);
    assert_eq!(store.get_float("tempOff", 99.9), 1.5);
    assert_eq!(store.get_string("devName", ""), "ESP32C3");
    assert!(store.get_bool("debug", false));
    assert_eq!(store.get_long64("uptime", -1), 1_234_567_890);

    assert!(store.remove("tempOff"));
    assert_eq!(store.get_float("tempOff", 99.9), 99.9);

    store.clear().unwrap();
    assert_eq!(store.get_int("sensorID", -1), -1);
}

#[test]
fn type_tag_mismatch_yields_the_default() {
    let mut store = default_store();
    store.put_int("x", 1).unwrap();
    assert_eq!(store.get_string("x", ""), "");
    assert_eq!(store.get_short("x", -9), -9);
    let mut buf = [0u8; 4];
    assert_eq!(store.get_bytes("x", &mut buf), 0);
}

#[test]
fn empty_string_and_empty_buffer_roundtrip() {
    let mut store = default_store();
    store.put_string("s", "").unwrap();
    assert_eq!(store.get_string("s", "fallback"), "");
    store.put_bytes("b", &[]).unwrap();
    assert!(store.is_key("b"));
    let mut buf = [0u8; 4];
    assert_eq!(store.get_bytes("b", &mut buf), 0);
}

#[test]
fn get_bytes_truncates_to_the_caller_buffer() {
    let mut store = default_store();
    store.put_bytes("blob", &[10, 20, 30, 40, 50]).unwrap();
    let mut small = [0u8; 2];
    assert_eq!(store.get_bytes("blob", &mut small), 2);
    assert_eq!(small, [10, 20]);
}

#[test]
fn oversized_keys_and_values_are_rejected() {
    let mut store = tiny_store();
    assert!(matches!(
        store.put_int("toolong", 1),
        Err(StoreError::KeyTooLong { len: 7, max: 4 })
    ));
    assert!(matches!(
        store.put_bytes("k", &[0u8; 9]),
        Err(StoreError::ValueTooLong { len: 9, max: 8 })
    ));
    assert!(matches!(store.put_int("", 1), Err(StoreError::EmptyKey)));
}

// ============================================================================
// Update and Remove Semantics
// ============================================================================

#[test]
fn updates_leave_a_single_live_entry() {
    let mut store = tiny_store();
    for value in 0..10 {
        store.put_int("k1", value).unwrap();
        assert_eq!(live_count(&mut store, "k1"), 1);
        assert_eq!(store.get_int("k1", -1), value);
    }
}

#[test]
fn remove_is_idempotent() {
    let mut store = tiny_store();
    store.put_int("aa", 1).unwrap();
    assert!(store.remove("aa"));
    assert!(!store.remove("aa"));
    assert!(!store.remove("ghost"));
    assert_eq!(live_count(&mut store, "aa"), 0);
}

#[test]
fn gc_drops_tombstones_and_keeps_live_entries() {
    let mut store = tiny_store();
    store.put_int("aa", 1).unwrap();
    store.put_int("bb", 2).unwrap();
    store.put_int("aa", 3).unwrap(); // tombstones the first "aa"

    store.collect_garbage(true).unwrap();

    let total = Geometry::new(store.config()).unwrap().total_blocks();
    let mut live = 0;
    let mut dead = 0;
    for block in 0..total {
        let entries = store.walk_entries(block).unwrap();
        live += entries.iter().filter(|(_, e)| e.is_live()).count();
        dead += entries.iter().filter(|(_, e)| !e.is_live()).count();
    }
    assert_eq!(live, 2);
    assert_eq!(dead, 0);
    assert_eq!(store.get_int("aa", -1), 3);
    assert_eq!(store.get_int("bb", -1), 2);
}

// ============================================================================
// Wear Leveling and Capacity
// ============================================================================

#[test]
fn sustained_churn_rotates_through_every_block() {
    let mut store = tiny_store();
    let total = Geometry::new(store.config()).unwrap().total_blocks();

    let mut seen = BTreeSet::new();
    seen.insert(store.active_block());
    for i in 0..60 {
        let key = if i % 2 == 0 { "a" } else { "b" };
        store.put_int(key, i).unwrap();
        seen.insert(store.active_block());
    }

    assert_eq!(seen.len(), usize::from(total));
    assert_eq!(store.get_int("a", -1), 58);
    assert_eq!(store.get_int("b", -1), 59);
}

#[test]
fn distinct_key_inserts_hit_the_capacity_limit_cleanly() {
    // 60-byte payloads hold four 14-byte records; the live set of distinct
    // keys can never exceed one block, so the fifth insert compacts, rotates,
    // and then reports out-of-space.
    let mut store = tiny_store();
    let initial_active = store.active_block();

    let mut results = Vec::new();
    for i in 0..20 {
        let key = format!("k{i:02}");
        let outcome = store.put_int(&key, i);
        results.push((key, i, outcome));
    }

    let acknowledged: Vec<_> = results.iter().filter(|(_, _, r)| r.is_ok()).collect();
    assert!(!acknowledged.is_empty());
    assert!(results
        .iter()
        .any(|(_, _, r)| matches!(r, Err(StoreError::OutOfSpace { .. }))));

    // Every acknowledged write is readable; every rejected one is absent.
    for (key, value, outcome) in &results {
        if outcome.is_ok() {
            assert_eq!(store.get_int(key, -1), *value);
        } else {
            assert_eq!(store.get_int(key, -1), -1);
        }
    }
    // The failed inserts still forced compaction onto fresh blocks.
    assert_ne!(store.active_block(), initial_active);
}

#[test]
fn acknowledged_writes_survive_a_restart_after_out_of_space() {
    let mut store = tiny_store();
    let mut acknowledged = Vec::new();
    let mut rejected = false;
    for i in 0..20 {
        let key = format!("k{i:02}");
        match store.put_int(&key, i) {
            Ok(()) => acknowledged.push((key, i)),
            Err(StoreError::OutOfSpace { .. }) => {
                rejected = true;
                break;
            }
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert!(rejected);

    let dev = store.end();
    let mut store = open(dev, tiny_config());
    for (key, value) in acknowledged {
        assert_eq!(store.get_int(&key, -1), value);
    }
}

// ============================================================================
// Crash Consistency
// ============================================================================

#[test]
fn crash_after_the_tombstone_leaves_the_key_absent() {
    let mut store = tiny_store();
    store.put_int("k10", 1).unwrap();
    store.put_int("k11", 2).unwrap();

    store.bus_mut().checkpoint();
    store.put_int("k10", 7).unwrap();

    // The update's first device write is the single-byte tombstone.
    assert_eq!(store.bus().journal()[0].value, ENTRY_DEAD);

    let crashed = store.bus().fork_at(1);
    let mut store = open(crashed, tiny_config());
    assert_eq!(store.get_int("k10", -1), -1);
    assert!(!store.is_key("k10"));
    assert_eq!(store.get_int("k11", -1), 2);

    // A fresh put restores the key.
    store.put_int("k10", 7).unwrap();
    assert_eq!(store.get_int("k10", -1), 7);
}

#[test]
fn a_corrupted_global_header_reformats_on_begin() {
    let mut store = default_store();
    store.put_int("sensorID", 42).unwrap();

    let mut dev = store.end();
    let checksum = dev.peek(6);
    dev.corrupt(6, checksum ^ 0x5A);

    let mut store = open(dev, StoreConfig::default());
    assert!(store.is_initialized());
    assert_eq!(store.get_int("sensorID", -1), -1);

    store.put_int("fresh", 1).unwrap();
    assert_eq!(store.get_int("fresh", -1), 1);
}

#[test]
fn crash_at_any_write_prefix_is_never_corrupt() {
    let mut store = tiny_store();
    store.put_int("aa", 10).unwrap();
    store.put_int("bb", 20).unwrap();

    store.bus_mut().checkpoint();
    // A sequence spanning an update, an insert, a remove, and a compaction.
    store.put_int("aa", 11).unwrap();
    store.put_int("cc", 33).unwrap();
    assert!(store.remove("bb"));
    store.put_int("dd", 44).unwrap(); // this append overflows and triggers GC

    let journal_len = store.bus().journal_len();
    assert!(journal_len > 0);
    for prefix in 0..=journal_len {
        let crashed = store.bus().fork_at(prefix);
        let mut replay = open(crashed, tiny_config());

        // Every key reads as its old value, its new value, or absent —
        // never a torn byte pattern.
        let aa = replay.get_int("aa", -1);
        assert!(aa == 10 || aa == 11 || aa == -1, "aa = {aa} at prefix {prefix}");
        let bb = replay.get_int("bb", -1);
        assert!(bb == 20 || bb == -1, "bb = {bb} at prefix {prefix}");
        let cc = replay.get_int("cc", -1);
        assert!(cc == 33 || cc == -1, "cc = {cc} at prefix {prefix}");
        let dd = replay.get_int("dd", -1);
        assert!(dd == 44 || dd == -1, "dd = {dd} at prefix {prefix}");
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn byte_values_roundtrip(payload in prop::collection::vec(any::<u8>(), 0..240)) {
            let mut store = default_store();
            store.put_bytes("pp", &payload).unwrap();

            let mut out = vec![0u8; 240];
            let n = store.get_bytes("pp", &mut out);
            prop_assert_eq!(&out[..n], payload.as_slice());
        }

        #[test]
        fn entry_header_roundtrip_any_fields(
            status in any::<u8>(),
            data_type in any::<u8>(),
            key_hash in any::<u16>(),
            key_length in any::<u8>(),
            value_length in any::<u16>(),
        ) {
            let header = EntryHeader { status, data_type, key_hash, key_length, value_length };
            prop_assert_eq!(EntryHeader::decode(&header.encode()), header);
        }

        #[test]
        fn global_header_corruption_is_detected(
            total_blocks in any::<u16>(),
            active_block in any::<u16>(),
            flip in 0usize..56,
        ) {
            let mut buf = GlobalHeader { total_blocks, active_block }.encode();
            buf[flip / 8] ^= 1 << (flip % 8);
            prop_assert!(GlobalHeader::decode(&buf).is_err());
        }

        #[test]
        fn random_scripts_keep_one_live_entry_per_key(
            ops in prop::collection::vec((0usize..4, any::<i32>(), any::<bool>()), 0..40),
        ) {
            let keys = ["k0", "k1", "k2", "k3"];
            let mut store = tiny_store();
            let mut expected: HashMap<&str, Option<i32>> = HashMap::new();

            for (idx, value, is_remove) in ops {
                let key = keys[idx];
                if is_remove {
                    store.remove(key);
                    expected.insert(key, None);
                } else {
                    store.put_int(key, value).unwrap();
                    expected.insert(key, Some(value));
                }
            }

            for key in keys {
                prop_assert!(live_count(&mut store, key) <= 1);
                match expected.get(key).copied().flatten() {
                    Some(value) => prop_assert_eq!(store.get_int(key, i32::MIN), value),
                    None => prop_assert!(!store.is_key(key)),
                }
            }
        }
    }
}
