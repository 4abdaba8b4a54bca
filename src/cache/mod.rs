pub mod bank;
pub mod block;
pub mod controller;
pub mod map;
mod request;
pub mod route;


pub use bank::{BankStats, CacheBank};
pub use block::{Block, BlockStore, BLOCK_BITS, BLOCK_BYTES, ZERO_BLOCK};
pub use controller::{CacheConfig, CacheController, CacheStats};
pub use map::{MapEntry, MapTable};
pub use request::{AlignmentReject, CacheOp, CacheRequest, CacheResponse};
pub use route::{
    bank_for_channel, is_aligned, split_addr, BankId, CHANNELS, CHANNEL_BANK, DISPATCH_ORDER,
    NUM_BANKS,
};
