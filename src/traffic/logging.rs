use crate::cache::{BankStats, CacheStats};
use crate::traffic::driver::PatternSummary;

pub struct TrafficLogger;

impl TrafficLogger {
    pub fn log_pattern(summary: &PatternSummary) {
        println!(
            "[traffic] {:<24} {:<6} txns {:>8} queries {:>8} hits {:>8} rate {:>6.3} bad {:>3}",
            summary.name,
            summary.op,
            summary.transactions,
            summary.queries,
            summary.query_hits,
            summary.hit_rate,
            summary.verify_failures
        );
    }

    pub fn log_run_totals(cache: &CacheStats, total: &BankStats) {
        let rate = if total.lookups == 0 {
            0.0
        } else {
            total.hits as f64 / total.lookups as f64
        };
        println!(
            "[traffic] done: {} transactions, {} lookups, {} hits ({:.3}), {} evictions",
            cache.transactions, total.lookups, total.hits, rate, total.evictions
        );
    }
}
