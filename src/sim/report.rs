use std::fs;
use std::path::Path;

use log::warn;
use serde::Serialize;

use crate::cache::{BankStats, CacheStats};
use crate::traffic::driver::PatternSummary;

#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub cache: CacheStats,
    pub banks: Vec<BankStats>,
    pub total: BankStats,
    pub patterns: Vec<PatternSummary>,
}

pub fn aggregate_banks(banks: &[BankStats]) -> BankStats {
    let mut total = BankStats::default();
    for bank in banks {
        total += bank;
    }
    total
}

/// Best-effort summary dump; a failed write is logged and otherwise ignored.
pub fn write_summary(path: &Path, summary: &RunSummary) {
    match serde_json::to_string_pretty(summary) {
        Ok(payload) => {
            if let Err(err) = fs::write(path, payload) {
                warn!("failed to write summary {}: {}", path.display(), err);
            }
        }
        Err(err) => warn!("failed to serialize summary: {}", err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregate_banks_sums_counters() {
        let one = BankStats {
            lookups: 3,
            hits: 2,
            misses: 1,
            inserts: 4,
            overwrites: 0,
            evictions: 1,
        };
        let two = BankStats {
            lookups: 7,
            hits: 1,
            misses: 6,
            inserts: 2,
            overwrites: 3,
            evictions: 0,
        };
        let total = aggregate_banks(&[one, two]);
        assert_eq!(total.lookups, 10);
        assert_eq!(total.hits, 3);
        assert_eq!(total.misses, 7);
        assert_eq!(total.inserts, 6);
        assert_eq!(total.overwrites, 3);
        assert_eq!(total.evictions, 1);
    }
}
