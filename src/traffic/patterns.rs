use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::cache::{BLOCK_BITS, CHANNELS};
use crate::traffic::config::{TrafficConfig, TrafficPatternSpec};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternOp {
    Query,
    Update,
    Mixed,
}

impl PatternOp {
    pub fn label(self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Update => "update",
            Self::Mixed => "mixed",
        }
    }

    fn short(self) -> &'static str {
        match self {
            Self::Query => "q",
            Self::Update => "u",
            Self::Mixed => "m",
        }
    }
}

#[derive(Debug, Clone)]
enum PatternKind {
    Strided { stride: u64, channel_stride: u64 },
    Random { min: u64, max: u64, seed: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct RandomStreamKey {
    min: u64,
    max: u64,
    seed: u64,
}

#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pub name: String,
    pub op: PatternOp,
    window_blocks: u64,
    kind: PatternKind,
}

impl CompiledPattern {
    fn block_index(&self, req_idx: u32, channel: usize) -> u64 {
        match self.kind {
            PatternKind::Strided {
                stride,
                channel_stride,
            } => (req_idx as u64) * stride + (channel as u64) * channel_stride,
            PatternKind::Random { min, max, seed } => {
                if max <= min {
                    return min;
                }
                // Fallback for indexes past the precomputed tables; the
                // engine serves in-range requests from those.
                let key = seed ^ ((channel as u64) << 32) ^ (req_idx as u64);
                min + (mix64(key) % (max - min))
            }
        }
    }

    fn random_stream_key(&self) -> Option<RandomStreamKey> {
        match self.kind {
            PatternKind::Random { min, max, seed } => Some(RandomStreamKey { min, max, seed }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PatternEngine {
    patterns: Vec<CompiledPattern>,
    reqs_per_pattern: usize,
    random_tables: Vec<Option<Vec<u64>>>, // flattened [channel * reqs_per_pattern + t]
}

impl PatternEngine {
    pub fn new(config: &TrafficConfig) -> Self {
        let reqs_per_pattern = config.reqs_per_pattern.max(1) as usize;
        let patterns: Vec<CompiledPattern> = config
            .patterns
            .iter()
            .enumerate()
            .map(|(idx, spec)| compile_pattern(spec, idx, config))
            .collect();
        let random_tables = precompute_random_tables(&patterns, reqs_per_pattern);
        Self {
            patterns,
            reqs_per_pattern,
            random_tables,
        }
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn pattern(&self, idx: usize) -> Option<&CompiledPattern> {
        self.patterns.get(idx)
    }

    /// Block-aligned address for one channel of one transaction, wrapped
    /// into the pattern's window.
    pub fn channel_addr(&self, pattern_idx: usize, req_idx: u32, channel: usize) -> Option<u32> {
        let pattern = self.patterns.get(pattern_idx)?;
        let block = self
            .random_block(pattern_idx, req_idx, channel)
            .unwrap_or_else(|| pattern.block_index(req_idx, channel));
        let window = pattern.window_blocks.max(1);
        Some(((block % window) as u32) * BLOCK_BITS)
    }

    pub fn transaction_addrs(&self, pattern_idx: usize, req_idx: u32) -> Option<[u32; CHANNELS]> {
        let mut addrs = [0u32; CHANNELS];
        for (channel, addr) in addrs.iter_mut().enumerate() {
            *addr = self.channel_addr(pattern_idx, req_idx, channel)?;
        }
        Some(addrs)
    }

    fn random_block(&self, pattern_idx: usize, req_idx: u32, channel: usize) -> Option<u64> {
        let table = self.random_tables.get(pattern_idx)?.as_ref()?;
        if channel >= CHANNELS {
            return None;
        }
        let idx = channel
            .checked_mul(self.reqs_per_pattern)?
            .checked_add(req_idx as usize)?;
        table.get(idx).copied()
    }
}

fn precompute_random_tables(
    patterns: &[CompiledPattern],
    reqs_per_pattern: usize,
) -> Vec<Option<Vec<u64>>> {
    let mut tables: Vec<Option<Vec<u64>>> = vec![None; patterns.len()];
    if patterns.is_empty() || reqs_per_pattern == 0 {
        return tables;
    }

    // Channel-major, then pattern-major, then t-major draws. Random specs
    // sharing (seed, min, max) draw from one generator stream.
    let mut streams: HashMap<RandomStreamKey, StdRng> = HashMap::new();
    for channel in 0..CHANNELS {
        for (pattern_idx, pattern) in patterns.iter().enumerate() {
            let Some(key) = pattern.random_stream_key() else {
                continue;
            };
            let stream = streams
                .entry(key)
                .or_insert_with(|| StdRng::seed_from_u64(key.seed));
            let table = tables[pattern_idx]
                .get_or_insert_with(|| vec![0; CHANNELS.saturating_mul(reqs_per_pattern)]);
            let row_base = channel.saturating_mul(reqs_per_pattern);
            for t in 0..reqs_per_pattern {
                let sample = if key.max <= key.min {
                    key.min
                } else {
                    stream.gen_range(key.min..key.max)
                };
                table[row_base + t] = sample;
            }
        }
    }

    tables
}

fn compile_pattern(
    spec: &TrafficPatternSpec,
    index: usize,
    config: &TrafficConfig,
) -> CompiledPattern {
    let kind_key = spec.kind.trim().to_ascii_lowercase();
    let op = parse_op(&spec.op);
    // The window cap keeps every generated address inside u32.
    let window_blocks = spec
        .window_blocks
        .unwrap_or(config.window_blocks)
        .clamp(1, 1 << 24) as u64;

    let kind = match kind_key.as_str() {
        "strided" => PatternKind::Strided {
            stride: spec.stride.max(1) as u64,
            channel_stride: spec.channel_stride as u64,
        },
        "random" | "random_access" => {
            let min = spec.random_min as u64;
            let max = if spec.random_max == 0 {
                window_blocks.max(min + 1)
            } else {
                (spec.random_max as u64).max(min + 1)
            };
            PatternKind::Random {
                min,
                max,
                seed: spec.seed,
            }
        }
        other => panic!(
            "unsupported traffic pattern kind '{}' at index {} (expected strided|random)",
            other, index
        ),
    };

    let name = if spec.name.is_empty() {
        default_pattern_name(&kind, op)
    } else {
        spec.name.clone()
    };

    CompiledPattern {
        name,
        op,
        window_blocks,
        kind,
    }
}

fn parse_op(op: &str) -> PatternOp {
    match op.trim().to_ascii_lowercase().as_str() {
        "query" | "q" | "lookup" => PatternOp::Query,
        "update" | "u" | "store" => PatternOp::Update,
        "mixed" | "m" | "update_query" => PatternOp::Mixed,
        other => panic!(
            "unsupported traffic op '{}'; expected query/update/mixed",
            other
        ),
    }
}

fn default_pattern_name(kind: &PatternKind, op: PatternOp) -> String {
    let base = match kind {
        PatternKind::Strided {
            stride,
            channel_stride,
        } => format!("strided({}, {})", stride, channel_stride),
        PatternKind::Random { seed, .. } => format!("random({})", seed),
    };
    format!("{}_{}", base, op.short())
}

fn mix64(mut x: u64) -> u64 {
    x ^= x >> 30;
    x = x.wrapping_mul(0xbf58_476d_1ce4_e5b9);
    x ^= x >> 27;
    x = x.wrapping_mul(0x94d0_49bb_1331_11eb);
    x ^ (x >> 31)
}
