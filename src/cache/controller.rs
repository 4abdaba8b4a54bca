//! Transaction controller: one synchronous call per five-channel
//! transaction. Each call applies, in order, an optional whole-cache reset,
//! an all-or-nothing alignment gate over the five addresses, and the
//! per-channel dispatch in the fixed order 0, 1, 3, 2, 4 so the two channels
//! sharing bank 1 execute back to back.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::cache::bank::{BankStats, CacheBank};
use crate::cache::block::BLOCK_BITS;
use crate::cache::request::{AlignmentReject, CacheOp, CacheRequest, CacheResponse};
use crate::cache::route::{
    bank_for_channel, is_aligned, split_addr, BankId, CHANNELS, DISPATCH_ORDER, NUM_BANKS,
};
use crate::sim::config::Config;

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub bank_slots: [usize; NUM_BANKS],
    pub ways: usize,
}

impl Config for CacheConfig {}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            bank_slots: [1024, 512, 4096, 2048],
            ways: 4,
        }
    }
}

impl CacheConfig {
    pub fn ensure_valid(&self) {
        assert!(self.ways > 0, "ways must be > 0");
        for (bank, &slots) in self.bank_slots.iter().enumerate() {
            assert!(slots > 0, "bank {} slot count must be > 0", bank);
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct CacheStats {
    pub transactions: u64,
    pub queries: u64,
    pub updates: u64,
    pub resets: u64,
    pub alignment_rejects: u64,
}

pub struct CacheController {
    banks: Vec<CacheBank>,
    stats: CacheStats,
}

impl CacheController {
    pub fn new(config: &CacheConfig) -> Self {
        config.ensure_valid();
        let banks = config
            .bank_slots
            .iter()
            .map(|&slots| CacheBank::new(slots, config.ways))
            .collect();
        Self {
            banks,
            stats: CacheStats::default(),
        }
    }

    /// Runs one transaction. A set reset flag clears every bank before the
    /// alignment gate, so a reset paired with a bad address still clears.
    /// Misalignment on any channel aborts the whole transaction with no bank
    /// access on any channel; the controller stays usable for the next call.
    pub fn process(&mut self, request: CacheRequest) -> Result<CacheResponse, AlignmentReject> {
        self.stats.transactions = self.stats.transactions.saturating_add(1);

        if request.reset {
            self.invalidate_all();
        }

        for channel in 0..CHANNELS {
            let addr = request.addrs[channel];
            if !is_aligned(addr) {
                self.stats.alignment_rejects = self.stats.alignment_rejects.saturating_add(1);
                debug!(
                    "reject: channel {} addr {:#010x} not a multiple of {}",
                    channel, addr, BLOCK_BITS
                );
                return Err(AlignmentReject {
                    channel,
                    addr,
                    request,
                });
            }
        }

        match request.op {
            CacheOp::Query => self.stats.queries = self.stats.queries.saturating_add(1),
            CacheOp::Update => self.stats.updates = self.stats.updates.saturating_add(1),
        }

        let mut hits = [false; CHANNELS];
        let mut data = request.data;
        for &channel in DISPATCH_ORDER.iter() {
            let bank = &mut self.banks[bank_for_channel(channel)];
            let (slot, tag) = split_addr(request.addrs[channel], bank.num_slots());
            match request.op {
                CacheOp::Query => {
                    hits[channel] = bank.lookup(slot, tag, &mut data[channel]);
                }
                CacheOp::Update => {
                    bank.update(slot, tag, &data[channel]);
                }
            }
        }

        Ok(CacheResponse { hits, data })
    }

    /// Returns the mapping tables of all banks to the empty state.
    pub fn invalidate_all(&mut self) {
        debug!("resetting all banks");
        self.stats.resets = self.stats.resets.saturating_add(1);
        for bank in self.banks.iter_mut() {
            bank.invalidate_all();
        }
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn bank_stats(&self) -> Vec<BankStats> {
        self.banks.iter().map(|bank| bank.stats()).collect()
    }

    pub fn bank(&self, bank_id: BankId) -> &CacheBank {
        &self.banks[bank_id]
    }
}
