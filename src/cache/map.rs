/// Tag state for one way of one slot. The all-zero value is the empty rest
/// state; `occupied = false` always goes with `ref_count = 0` and `tag = 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MapEntry {
    pub ref_count: u8,
    pub occupied: bool,
    pub tag: u16,
}

impl MapEntry {
    pub const EMPTY: MapEntry = MapEntry {
        ref_count: 0,
        occupied: false,
        tag: 0,
    };
}

/// Per-bank tag array, indexed by (slot, way).
#[derive(Debug)]
pub struct MapTable {
    num_slots: usize,
    ways: usize,
    entries: Vec<Vec<MapEntry>>,
}

impl MapTable {
    pub fn new(num_slots: usize, ways: usize) -> Self {
        let num_slots = num_slots.max(1);
        let ways = ways.max(1);
        let mut entries = Vec::with_capacity(num_slots);
        for _ in 0..num_slots {
            entries.push(vec![MapEntry::EMPTY; ways]);
        }
        Self {
            num_slots,
            ways,
            entries,
        }
    }

    pub fn num_slots(&self) -> usize {
        self.num_slots
    }

    pub fn ways(&self) -> usize {
        self.ways
    }

    pub fn entry(&self, slot: usize, way: usize) -> &MapEntry {
        &self.entries[slot][way]
    }

    pub fn entry_mut(&mut self, slot: usize, way: usize) -> &mut MapEntry {
        &mut self.entries[slot][way]
    }

    pub fn slot_entries(&self, slot: usize) -> &[MapEntry] {
        &self.entries[slot]
    }

    /// Returns every way of every slot to the empty rest state.
    pub fn reset_all(&mut self) {
        for slot in self.entries.iter_mut() {
            for entry in slot.iter_mut() {
                *entry = MapEntry::EMPTY;
            }
        }
    }
}
