/// Width of the block data bus in bits. Every address presented to the
/// front-end must be a multiple of this value.
pub const BLOCK_BITS: u32 = 256;

/// Size of one cached block payload in bytes.
pub const BLOCK_BYTES: usize = 32;

/// Opaque block payload. The cache never interprets its contents.
pub type Block = [u8; BLOCK_BYTES];

pub const ZERO_BLOCK: Block = [0; BLOCK_BYTES];

/// Per-bank payload storage, one block per (slot, way) coordinate.
#[derive(Debug)]
pub struct BlockStore {
    blocks: Vec<Vec<Block>>,
}

impl BlockStore {
    pub fn new(num_slots: usize, ways: usize) -> Self {
        let num_slots = num_slots.max(1);
        let ways = ways.max(1);
        let mut blocks = Vec::with_capacity(num_slots);
        for _ in 0..num_slots {
            blocks.push(vec![ZERO_BLOCK; ways]);
        }
        Self { blocks }
    }

    pub fn read(&self, slot: usize, way: usize) -> &Block {
        &self.blocks[slot][way]
    }

    pub fn write(&mut self, slot: usize, way: usize, data: &Block) {
        self.blocks[slot][way] = *data;
    }
}
