use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use log::info;
use toml::Table;

use blockcache::cache::{CacheConfig, CacheController};
use blockcache::sim::config::{Config, SimConfig};
use blockcache::sim::report::{aggregate_banks, write_summary, RunSummary};
use blockcache::traffic::config::{default_patterns, TrafficConfig};
use blockcache::traffic::driver::TrafficDriver;
use blockcache::traffic::logging::TrafficLogger;

#[derive(Parser)]
#[command(version, about)]
struct BlockcacheArgs {
    #[arg(help="Path to config.toml (defaults apply when omitted)")]
    config_path: Option<PathBuf>,
    #[arg(long, help="Override transactions issued per pattern")]
    reqs_per_pattern: Option<u32>,
    #[arg(long, help="Override the payload generator seed")]
    seed: Option<u64>,
    #[arg(long, help="Override reference-model verification of query hits")]
    verify: Option<bool>,
    #[arg(long, help="Write the run summary to this JSON file")]
    results_json: Option<PathBuf>,
}

pub fn main() -> anyhow::Result<()> {
    env_logger::init();

    let argv = BlockcacheArgs::parse();
    let config_table: Table = match &argv.config_path {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            toml::from_str(&raw).context("cannot parse config toml")?
        }
        None => Table::new(),
    };

    let mut sim_config = SimConfig::from_section(config_table.get("sim"));
    let cache_config = CacheConfig::from_section(config_table.get("cache"));
    let mut traffic_config = TrafficConfig::from_section(config_table.get("traffic"));

    // override toml configs with argv
    sim_config.seed = argv.seed.unwrap_or(sim_config.seed);
    sim_config.verify = argv.verify.unwrap_or(sim_config.verify);
    traffic_config.reqs_per_pattern = argv
        .reqs_per_pattern
        .unwrap_or(traffic_config.reqs_per_pattern);
    if let Some(path) = &argv.results_json {
        traffic_config.logging.results_json = Some(path.display().to_string());
    }
    if traffic_config.patterns.is_empty() {
        info!("no traffic patterns configured, using the built-in defaults");
        traffic_config.patterns = default_patterns();
    }

    let controller = CacheController::new(&cache_config);
    let mut driver = TrafficDriver::new(&sim_config, &traffic_config, controller);
    let patterns = driver.run();

    let banks = driver.controller().bank_stats();
    let summary = RunSummary {
        cache: driver.controller().stats(),
        total: aggregate_banks(&banks),
        banks,
        patterns,
    };
    TrafficLogger::log_run_totals(&summary.cache, &summary.total);
    if let Some(path) = &traffic_config.logging.results_json {
        write_summary(Path::new(path), &summary);
    }
    Ok(())
}
