use std::collections::HashMap;

use log::warn;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::cache::{
    bank_for_channel, split_addr, BankId, Block, CacheController, CacheRequest, CacheResponse,
    CHANNELS, DISPATCH_ORDER, ZERO_BLOCK,
};
use crate::sim::config::SimConfig;
use crate::traffic::config::TrafficConfig;
use crate::traffic::logging::TrafficLogger;
use crate::traffic::patterns::{PatternEngine, PatternOp};

#[derive(Debug, Clone, Serialize)]
pub struct PatternSummary {
    pub name: String,
    pub op: String,
    pub transactions: u64,
    pub queries: u64,
    pub query_hits: u64,
    pub channel_hits: [u64; CHANNELS],
    pub hit_rate: f64,
    pub verify_failures: u64,
}

impl PatternSummary {
    fn new(name: &str, op: PatternOp) -> Self {
        Self {
            name: name.to_string(),
            op: op.label().to_string(),
            transactions: 0,
            queries: 0,
            query_hits: 0,
            channel_hits: [0; CHANNELS],
            hit_rate: 0.0,
            verify_failures: 0,
        }
    }
}

/// Feeds compiled traffic patterns through a cache controller, standing in
/// for the backing-store fetch path. With verification on, a flat reference
/// model keyed by (bank, slot, tag) cross-checks every query hit.
pub struct TrafficDriver {
    engine: PatternEngine,
    controller: CacheController,
    reqs_per_pattern: u32,
    print_lines: bool,
    payload_rng: StdRng,
    verify: Option<HashMap<(BankId, usize, u16), Block>>,
}

impl TrafficDriver {
    pub fn new(sim: &SimConfig, traffic: &TrafficConfig, controller: CacheController) -> Self {
        Self {
            engine: PatternEngine::new(traffic),
            controller,
            reqs_per_pattern: traffic.reqs_per_pattern.max(1),
            print_lines: traffic.logging.print_traffic_lines,
            payload_rng: StdRng::seed_from_u64(sim.seed),
            verify: sim.verify.then(HashMap::new),
        }
    }

    pub fn controller(&self) -> &CacheController {
        &self.controller
    }

    pub fn run(&mut self) -> Vec<PatternSummary> {
        let mut summaries = Vec::with_capacity(self.engine.len());
        for pattern_idx in 0..self.engine.len() {
            let summary = self.run_pattern(pattern_idx);
            if self.print_lines {
                TrafficLogger::log_pattern(&summary);
            }
            summaries.push(summary);
        }
        summaries
    }

    fn run_pattern(&mut self, pattern_idx: usize) -> PatternSummary {
        let (name, op) = match self.engine.pattern(pattern_idx) {
            Some(pattern) => (pattern.name.clone(), pattern.op),
            None => return PatternSummary::new("", PatternOp::Query),
        };
        let mut summary = PatternSummary::new(&name, op);

        for t in 0..self.reqs_per_pattern {
            let Some(addrs) = self.engine.transaction_addrs(pattern_idx, t) else {
                break;
            };
            match op {
                PatternOp::Query => self.run_query(addrs, &mut summary),
                PatternOp::Update => self.run_update(addrs, &mut summary),
                PatternOp::Mixed => {
                    self.run_update(addrs, &mut summary);
                    self.run_query(addrs, &mut summary);
                }
            }
        }

        let channel_lookups = summary.queries.saturating_mul(CHANNELS as u64);
        summary.hit_rate = if channel_lookups == 0 {
            0.0
        } else {
            summary.query_hits as f64 / channel_lookups as f64
        };
        summary
    }

    fn run_update(&mut self, addrs: [u32; CHANNELS], summary: &mut PatternSummary) {
        let mut data = [ZERO_BLOCK; CHANNELS];
        for block in data.iter_mut() {
            self.payload_rng.fill(&mut block[..]);
        }
        match self.controller.process(CacheRequest::update(addrs, data)) {
            Ok(_) => {
                summary.transactions = summary.transactions.saturating_add(1);
                self.record_updates(&addrs, &data);
            }
            Err(reject) => warn!(
                "generated a misaligned update: channel {} addr {:#x}",
                reject.channel, reject.addr
            ),
        }
    }

    fn run_query(&mut self, addrs: [u32; CHANNELS], summary: &mut PatternSummary) {
        match self.controller.process(CacheRequest::query(addrs)) {
            Ok(response) => {
                summary.transactions = summary.transactions.saturating_add(1);
                summary.queries = summary.queries.saturating_add(1);
                for channel in 0..CHANNELS {
                    if response.hits[channel] {
                        summary.query_hits = summary.query_hits.saturating_add(1);
                        summary.channel_hits[channel] =
                            summary.channel_hits[channel].saturating_add(1);
                    }
                }
                let failures = self.check_hits(&addrs, &response);
                summary.verify_failures = summary.verify_failures.saturating_add(failures);
            }
            Err(reject) => warn!(
                "generated a misaligned query: channel {} addr {:#x}",
                reject.channel, reject.addr
            ),
        }
    }

    // Reference-model writes happen in dispatch order so that the aliased
    // channel pair records its last writer, like the banks do.
    fn record_updates(&mut self, addrs: &[u32; CHANNELS], data: &[Block; CHANNELS]) {
        let Some(model) = self.verify.as_mut() else {
            return;
        };
        for &channel in DISPATCH_ORDER.iter() {
            let bank = bank_for_channel(channel);
            let (slot, tag) = split_addr(addrs[channel], self.controller.bank(bank).num_slots());
            model.insert((bank, slot, tag), data[channel]);
        }
    }

    fn check_hits(&self, addrs: &[u32; CHANNELS], response: &CacheResponse) -> u64 {
        let Some(model) = self.verify.as_ref() else {
            return 0;
        };
        let mut failures = 0;
        for channel in 0..CHANNELS {
            if !response.hits[channel] {
                continue;
            }
            let bank = bank_for_channel(channel);
            let (slot, tag) = split_addr(addrs[channel], self.controller.bank(bank).num_slots());
            match model.get(&(bank, slot, tag)) {
                Some(expected) if *expected == response.data[channel] => {}
                Some(_) => {
                    failures += 1;
                    warn!(
                        "channel {} returned stale data for addr {:#x}",
                        channel, addrs[channel]
                    );
                }
                None => {
                    failures += 1;
                    warn!(
                        "channel {} hit an entry that was never stored: addr {:#x}",
                        channel, addrs[channel]
                    );
                }
            }
        }
        failures
    }
}
