use std::ops::AddAssign;

use log::debug;
use serde::Serialize;

use crate::cache::block::{Block, BlockStore};
use crate::cache::map::{MapEntry, MapTable};

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct BankStats {
    pub lookups: u64,
    pub hits: u64,
    pub misses: u64,
    pub inserts: u64,
    pub overwrites: u64,
    pub evictions: u64,
}

impl AddAssign<&BankStats> for BankStats {
    fn add_assign(&mut self, other: &BankStats) {
        self.lookups = self.lookups.saturating_add(other.lookups);
        self.hits = self.hits.saturating_add(other.hits);
        self.misses = self.misses.saturating_add(other.misses);
        self.inserts = self.inserts.saturating_add(other.inserts);
        self.overwrites = self.overwrites.saturating_add(other.overwrites);
        self.evictions = self.evictions.saturating_add(other.evictions);
    }
}

/// One set-associative cache bank: a mapping table plus payload storage of
/// matching shape. Entries are keyed by (slot, group tag) and replaced by
/// reference count, not recency.
#[derive(Debug)]
pub struct CacheBank {
    map: MapTable,
    store: BlockStore,
    stats: BankStats,
}

impl CacheBank {
    pub fn new(num_slots: usize, ways: usize) -> Self {
        let num_slots = num_slots.max(1);
        let ways = ways.max(1);
        Self {
            map: MapTable::new(num_slots, ways),
            store: BlockStore::new(num_slots, ways),
            stats: BankStats::default(),
        }
    }

    pub fn num_slots(&self) -> usize {
        self.map.num_slots()
    }

    pub fn ways(&self) -> usize {
        self.map.ways()
    }

    /// Looks up `tag` in `slot`, scanning ways from 0. On a hit the resident
    /// block is copied into `out`, the entry's reference count goes up by
    /// one, and true is returned. On a miss nothing changes, `out` included.
    pub fn lookup(&mut self, slot: usize, tag: u16, out: &mut Block) -> bool {
        self.stats.lookups = self.stats.lookups.saturating_add(1);
        for way in 0..self.map.ways() {
            let entry = self.map.entry_mut(slot, way);
            if entry.occupied && entry.tag == tag {
                // Counts saturate rather than wrap; a wrap would turn the
                // hottest entry into the next eviction victim.
                entry.ref_count = entry.ref_count.saturating_add(1);
                *out = *self.store.read(slot, way);
                self.stats.hits = self.stats.hits.saturating_add(1);
                return true;
            }
        }
        self.stats.misses = self.stats.misses.saturating_add(1);
        false
    }

    /// Stores `data` under `(slot, tag)`: overwrite in place on a tag hit
    /// (reference count untouched), otherwise claim the lowest free way,
    /// otherwise evict the way with the lowest reference count and restart
    /// it at 1.
    pub fn update(&mut self, slot: usize, tag: u16, data: &Block) {
        for way in 0..self.map.ways() {
            if self.map.entry(slot, way).occupied && self.map.entry(slot, way).tag == tag {
                self.store.write(slot, way, data);
                self.stats.overwrites = self.stats.overwrites.saturating_add(1);
                return;
            }
        }

        for way in 0..self.map.ways() {
            if !self.map.entry(slot, way).occupied {
                *self.map.entry_mut(slot, way) = MapEntry {
                    ref_count: 1,
                    occupied: true,
                    tag,
                };
                self.store.write(slot, way, data);
                self.stats.inserts = self.stats.inserts.saturating_add(1);
                return;
            }
        }

        let victim = self.pick_victim(slot);
        debug!(
            "evict slot {} way {}: tag {:#06x} -> {:#06x}",
            slot,
            victim,
            self.map.entry(slot, victim).tag,
            tag
        );
        *self.map.entry_mut(slot, victim) = MapEntry {
            ref_count: 1,
            occupied: true,
            tag,
        };
        self.store.write(slot, victim, data);
        self.stats.evictions = self.stats.evictions.saturating_add(1);
    }

    /// Returns every mapping entry in the bank to the empty state. Payloads
    /// stay in place; they are unreachable once unmapped.
    pub fn invalidate_all(&mut self) {
        self.map.reset_all();
    }

    pub fn stats(&self) -> BankStats {
        self.stats
    }

    // First-seen minimum over the ways. Zero is the floor, so the scan stops
    // as soon as the running minimum reaches it.
    fn pick_victim(&self, slot: usize) -> usize {
        let ways = self.map.slot_entries(slot);
        let mut victim = 0;
        let mut min_ref = ways[0].ref_count;
        for (way, entry) in ways.iter().enumerate().skip(1) {
            if min_ref == 0 {
                break;
            }
            if entry.ref_count < min_ref {
                victim = way;
                min_ref = entry.ref_count;
            }
        }
        victim
    }

    pub(crate) fn ref_count(&self, slot: usize, tag: u16) -> Option<u8> {
        self.map
            .slot_entries(slot)
            .iter()
            .find(|entry| entry.occupied && entry.tag == tag)
            .map(|entry| entry.ref_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::block::BLOCK_BYTES;

    fn block_of(byte: u8) -> Block {
        [byte; BLOCK_BYTES]
    }

    #[test]
    fn lookup_misses_on_empty_bank() {
        let mut bank = CacheBank::new(16, 4);
        let mut out = block_of(0xAA);
        assert!(!bank.lookup(3, 7, &mut out));
        assert_eq!(out, block_of(0xAA), "miss must leave the scratch buffer alone");
        assert_eq!(bank.stats().misses, 1);
    }

    #[test]
    fn miss_leaves_resident_entries_untouched() {
        let mut bank = CacheBank::new(16, 4);
        bank.update(3, 5, &block_of(1));
        let mut out = block_of(0);
        assert!(!bank.lookup(3, 6, &mut out));
        assert_eq!(bank.ref_count(3, 5), Some(1));
        assert_eq!(out, block_of(0));
    }

    #[test]
    fn update_then_lookup_returns_last_written_block() {
        let mut bank = CacheBank::new(16, 4);
        bank.update(5, 9, &block_of(1));
        let mut out = block_of(0);
        assert!(bank.lookup(5, 9, &mut out));
        assert_eq!(out, block_of(1));
        assert_eq!(bank.stats().hits, 1);
    }

    #[test]
    fn lookup_hit_increments_ref_count() {
        let mut bank = CacheBank::new(16, 4);
        bank.update(2, 4, &block_of(0x11));
        assert_eq!(bank.ref_count(2, 4), Some(1));
        let mut out = block_of(0);
        for hits in 1..=3u8 {
            assert!(bank.lookup(2, 4, &mut out));
            assert_eq!(bank.ref_count(2, 4), Some(1 + hits));
        }
    }

    #[test]
    fn overwrite_keeps_ref_count_and_replaces_data() {
        let mut bank = CacheBank::new(16, 4);
        bank.update(2, 4, &block_of(0x11));
        let mut out = block_of(0);
        bank.lookup(2, 4, &mut out);
        bank.lookup(2, 4, &mut out);
        assert_eq!(bank.ref_count(2, 4), Some(3));
        bank.update(2, 4, &block_of(0x22));
        assert_eq!(bank.ref_count(2, 4), Some(3), "overwrite is not an access");
        assert!(bank.lookup(2, 4, &mut out));
        assert_eq!(out, block_of(0x22));
        assert_eq!(bank.stats().overwrites, 1);
    }

    #[test]
    fn inserts_fill_free_ways_without_evicting() {
        let mut bank = CacheBank::new(8, 4);
        for tag in 0..4u16 {
            bank.update(1, tag, &block_of(tag as u8));
        }
        let mut out = block_of(0);
        for tag in 0..4u16 {
            assert!(bank.lookup(1, tag, &mut out));
            assert_eq!(out, block_of(tag as u8));
        }
        assert_eq!(bank.stats().inserts, 4);
        assert_eq!(bank.stats().evictions, 0);
    }

    #[test]
    fn full_slot_evicts_lowest_ref_count() {
        let mut bank = CacheBank::new(8, 4);
        for tag in 0..4u16 {
            bank.update(1, tag, &block_of(tag as u8));
        }
        // Raise everyone except tag 2.
        let mut out = block_of(0);
        for tag in [0u16, 1, 3] {
            assert!(bank.lookup(1, tag, &mut out));
        }
        bank.update(1, 9, &block_of(0x99));
        assert!(!bank.lookup(1, 2, &mut out), "the cold entry must be gone");
        assert!(bank.lookup(1, 9, &mut out));
        assert_eq!(out, block_of(0x99));
        for tag in [0u16, 1, 3] {
            assert!(bank.lookup(1, tag, &mut out));
        }
        assert_eq!(bank.stats().evictions, 1);
    }

    #[test]
    fn eviction_ties_break_toward_way_zero() {
        let mut bank = CacheBank::new(8, 4);
        for tag in 0..4u16 {
            bank.update(1, tag, &block_of(tag as u8));
        }
        // All counts equal, so way 0 (tag 0) is the first-seen minimum.
        bank.update(1, 9, &block_of(0x99));
        let mut out = block_of(0);
        assert!(!bank.lookup(1, 0, &mut out));
        for tag in 1..4u16 {
            assert!(bank.lookup(1, tag, &mut out));
        }
    }

    #[test]
    fn fresh_insert_restarts_ref_count_at_one() {
        let mut bank = CacheBank::new(8, 4);
        for tag in 0..4u16 {
            bank.update(1, tag, &block_of(tag as u8));
        }
        let mut out = block_of(0);
        for tag in 0..4u16 {
            bank.lookup(1, tag, &mut out);
        }
        // Everyone sits at 2; the eviction victim restarts at 1 and is the
        // next one out.
        bank.update(1, 9, &block_of(9));
        assert_eq!(bank.ref_count(1, 9), Some(1));
        bank.update(1, 10, &block_of(10));
        assert!(!bank.lookup(1, 9, &mut out));
        assert!(bank.lookup(1, 10, &mut out));
    }

    #[test]
    fn ref_count_saturates_at_u8_max() {
        let mut bank = CacheBank::new(4, 2);
        bank.update(0, 1, &block_of(1));
        let mut out = block_of(0);
        for _ in 0..300 {
            assert!(bank.lookup(0, 1, &mut out));
        }
        assert_eq!(bank.ref_count(0, 1), Some(u8::MAX));
    }

    #[test]
    fn invalidate_all_clears_every_slot() {
        let mut bank = CacheBank::new(8, 4);
        bank.update(1, 1, &block_of(1));
        bank.update(7, 2, &block_of(2));
        bank.invalidate_all();
        let mut out = block_of(0);
        assert!(!bank.lookup(1, 1, &mut out));
        assert!(!bank.lookup(7, 2, &mut out));
        assert_eq!(bank.ref_count(1, 1), None);
    }

    #[test]
    fn distinct_slots_do_not_interfere() {
        let mut bank = CacheBank::new(8, 4);
        bank.update(1, 5, &block_of(1));
        bank.update(2, 5, &block_of(2));
        let mut out = block_of(0);
        assert!(bank.lookup(1, 5, &mut out));
        assert_eq!(out, block_of(1));
        assert!(bank.lookup(2, 5, &mut out));
        assert_eq!(out, block_of(2));
    }

    #[test]
    fn walkthrough_on_a_512_slot_bank() {
        // Four inserts, one query round, three re-queries; the fifth tag
        // then displaces the entry that was never re-queried.
        let mut bank = CacheBank::new(512, 4);
        let payloads = [block_of(0xA), block_of(0xB), block_of(0xC), block_of(0xD)];
        for (i, payload) in payloads.iter().enumerate() {
            bank.update(10, (i + 1) as u16, payload);
        }
        let mut out = block_of(0);
        for (i, payload) in payloads.iter().enumerate() {
            assert!(bank.lookup(10, (i + 1) as u16, &mut out));
            assert_eq!(out, *payload);
        }
        for tag in 1..=3u16 {
            assert!(bank.lookup(10, tag, &mut out));
        }
        bank.update(10, 5, &block_of(0xE));
        assert!(!bank.lookup(10, 4, &mut out), "tag 4 held the lowest count");
        assert!(bank.lookup(10, 5, &mut out));
        assert_eq!(out, block_of(0xE));
        for tag in 1..=3u16 {
            assert!(bank.lookup(10, tag, &mut out));
        }
    }
}
