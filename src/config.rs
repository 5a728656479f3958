use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::trace;

use crate::probe::ProbeIndex;

/// Settings for hosting a single probe
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct ProbeConfig {
    /// Node id appended to every published topic
    #[serde(default = "crate::util::get_node_id")]
    pub node_id: String,

    #[serde(default)]
    pub index: ProbeIndex,

    /// Seconds between polls
    #[serde(default = "crate::util::get_rate")]
    pub rate: u64,

    /// Number of polls before shutting down (unbounded if absent)
    pub count: Option<usize>,

    /// Configuration file handed to the probe's initialize
    pub configuration: Option<PathBuf>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            node_id: crate::util::get_node_id(),
            index: 0,
            rate: crate::util::get_rate(),
            count: None,
            configuration: None,
        }
    }
}

/// Command line values taking precedence over the configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub node_id: Option<String>,
    pub index: Option<ProbeIndex>,
    pub rate: Option<u64>,
    pub count: Option<usize>,
    pub configuration: Option<PathBuf>,
}

impl ProbeConfig {
    /// Replace every field `overrides` sets
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(node_id) = overrides.node_id {
            self.node_id = node_id;
        }
        if let Some(index) = overrides.index {
            self.index = index;
        }
        if let Some(rate) = overrides.rate {
            self.rate = rate;
        }
        if overrides.count.is_some() {
            self.count = overrides.count;
        }
        if overrides.configuration.is_some() {
            self.configuration = overrides.configuration;
        }
        self
    }

    /// Reject settings no probe host can run with
    pub fn validate(self) -> anyhow::Result<Self> {
        anyhow::ensure!(self.rate > 0, "probe rate must be at least one second");
        anyhow::ensure!(!self.node_id.is_empty(), "node id must not be empty");
        Ok(self)
    }
}

fn parse_config_file(path: &Path) -> anyhow::Result<ProbeConfig> {
    let file_content = std::fs::read_to_string(path)
        .with_context(|| format!("unable to read {}", path.display()))?;
    serde_json::from_str::<ProbeConfig>(&file_content)
        .map_err(|err| anyhow::anyhow!("Invalid configuration file provided: {err}"))
}

pub fn read_config_file(path: &Path) -> anyhow::Result<ProbeConfig> {
    parse_config_file(path)?
        .validate()
        .inspect(|config| trace!("loaded config: {config:?}"))
}

/// Combine the optional config file with command line overrides
///
/// Precedence is override, then file, then the `OTESTPOINT_*` environment
/// defaults. Validation runs on the combined result.
pub fn resolve_config(
    path: Option<&Path>,
    overrides: ConfigOverrides,
) -> anyhow::Result<ProbeConfig> {
    let config = match path {
        Some(path) => parse_config_file(path)?,
        None => ProbeConfig::default(),
    };

    config
        .with_overrides(overrides)
        .validate()
        .inspect(|config| trace!("resolved config: {config:?}"))
}
