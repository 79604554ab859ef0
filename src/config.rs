use serde::{Deserialize, Serialize};

use crate::constants;

/// How the seed loader writes into a container it found empty.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedWriteMode {
    /// One bulk write; a racing writer may overwrite with identical values.
    #[default]
    Overwrite,
    /// Per-key put-if-absent; a racing writer never overwrites an existing key.
    PutIfAbsent,
}

/// Settings for one bootstrap invocation. Everything except the source address has a
/// default matching the trade monitor deployment.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct InitConfig {
    /// Stream cluster address, e.g. `kafka-broker0:9092`.
    pub source_address: String,
    /// Containers materialized on startup.
    #[serde(default = "InitConfig::default_container_names")]
    pub container_names: Vec<String>,
    /// Container receiving the connection config.
    #[serde(default = "InitConfig::default_config_container")]
    pub config_container: String,
    /// Container receiving the symbol reference rows.
    #[serde(default = "InitConfig::default_reference_container")]
    pub reference_container: String,
    #[serde(default)]
    pub seed_write_mode: SeedWriteMode,
}

impl InitConfig {
    fn default_container_names() -> Vec<String> { constants::MAP_NAMES.iter().map(|s| s.to_string()).collect() }
    fn default_config_container() -> String { constants::MAP_NAME_KAFKA_CONFIG.to_string() }
    fn default_reference_container() -> String { constants::MAP_NAME_SYMBOLS.to_string() }

    pub fn new(source_address: impl Into<String>) -> Self {
        Self {
            source_address: source_address.into(),
            container_names: Self::default_container_names(),
            config_container: Self::default_config_container(),
            reference_container: Self::default_reference_container(),
            seed_write_mode: SeedWriteMode::default(),
        }
    }

    pub fn with_seed_write_mode(mut self, mode: SeedWriteMode) -> Self {
        self.seed_write_mode = mode;
        self
    }

    /// Parse from JSON; absent fields take their defaults.
    pub fn from_json_str(text: &str) -> anyhow::Result<Self> {
        let cfg: InitConfig = serde_json::from_str(text)?;
        if cfg.source_address.trim().is_empty() { anyhow::bail!("source_address must not be empty"); }
        Ok(cfg)
    }
}
