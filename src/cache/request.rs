use crate::cache::block::{Block, ZERO_BLOCK};
use crate::cache::route::CHANNELS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOp {
    Query,
    Update,
}

/// One transaction across all five channels. In UPDATE mode `data` carries
/// the payloads to store; in QUERY mode it is caller scratch that hit
/// channels overwrite.
#[derive(Debug, Clone)]
pub struct CacheRequest {
    pub reset: bool,
    pub op: CacheOp,
    pub addrs: [u32; CHANNELS],
    pub data: [Block; CHANNELS],
}

impl CacheRequest {
    pub fn query(addrs: [u32; CHANNELS]) -> Self {
        Self {
            reset: false,
            op: CacheOp::Query,
            addrs,
            data: [ZERO_BLOCK; CHANNELS],
        }
    }

    pub fn update(addrs: [u32; CHANNELS], data: [Block; CHANNELS]) -> Self {
        Self {
            reset: false,
            op: CacheOp::Update,
            addrs,
            data,
        }
    }
}

/// Per-channel outcome of a processed transaction. `hits` is meaningful for
/// queries; `data[i]` holds the resident block for hit channels and passes
/// the request buffer through unchanged otherwise.
#[derive(Debug, Clone)]
pub struct CacheResponse {
    pub hits: [bool; CHANNELS],
    pub data: [Block; CHANNELS],
}

/// Rejection for a transaction carrying a misaligned address. The request
/// comes back untouched so the caller can correct it and resubmit.
#[derive(Debug, Clone)]
pub struct AlignmentReject {
    pub channel: usize,
    pub addr: u32,
    pub request: CacheRequest,
}
