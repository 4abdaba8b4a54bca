use log::warn;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use toml::Value;

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct SimConfig {
    pub seed: u64,
    pub verify: bool,
}

pub trait Config: DeserializeOwned + Default {
    fn from_section(section: Option<&Value>) -> Self {
        match section {
            Some(value) => value.clone().try_into().expect("cannot deserialize config"),
            None => {
                warn!("config section not found");
                Self::default()
            }
        }
    }
}

impl Config for SimConfig {}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            verify: true,
        }
    }
}
