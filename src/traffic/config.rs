use serde::Deserialize;

use crate::sim::config::Config;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TrafficConfig {
    pub reqs_per_pattern: u32,
    pub window_blocks: u32,
    pub logging: TrafficLoggingConfig,
    pub patterns: Vec<TrafficPatternSpec>,
}

impl Config for TrafficConfig {}

impl Default for TrafficConfig {
    fn default() -> Self {
        Self {
            reqs_per_pattern: 4096,
            window_blocks: 4096,
            logging: TrafficLoggingConfig::default(),
            patterns: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TrafficLoggingConfig {
    pub print_traffic_lines: bool,
    pub results_json: Option<String>,
}

impl Default for TrafficLoggingConfig {
    fn default() -> Self {
        Self {
            print_traffic_lines: true,
            results_json: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TrafficPatternSpec {
    pub name: String,
    pub kind: String,
    pub op: String,
    pub stride: u32,
    pub channel_stride: u32,
    pub random_min: u32,
    pub random_max: u32,
    pub seed: u64,
    pub window_blocks: Option<u32>,
}

impl Default for TrafficPatternSpec {
    fn default() -> Self {
        Self {
            name: String::new(),
            kind: String::new(),
            op: "query".to_string(),
            stride: 1,
            channel_stride: 1,
            random_min: 0,
            random_max: 0,
            seed: 0,
            window_blocks: None,
        }
    }
}

/// Fallback workload used when a run is started without any [[traffic.patterns]].
pub fn default_patterns() -> Vec<TrafficPatternSpec> {
    vec![
        TrafficPatternSpec {
            name: "strided_mix".to_string(),
            kind: "strided".to_string(),
            op: "mixed".to_string(),
            ..Default::default()
        },
        TrafficPatternSpec {
            name: "random_mix".to_string(),
            kind: "random".to_string(),
            op: "mixed".to_string(),
            seed: 1,
            ..Default::default()
        },
    ]
}
