//! Host-provided probe logger
//!
//! Probes never configure logging themselves. The host hands each probe a
//! [`ProbeLogger`] and the probe emits level-tagged messages through it;
//! subscriber setup and transport stay with the host.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tracing::level_filters::LevelFilter;
use tracing::{debug, error, info};

use crate::probe::ProbeIndex;

/// Log levels understood by probes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    NoLog,
    Abort,
    Error,
    Info,
    Debug,
}

impl LogLevel {
    /// Equivalent filter for a `tracing` subscriber
    pub fn as_filter(&self) -> LevelFilter {
        match self {
            LogLevel::NoLog => LevelFilter::OFF,
            LogLevel::Abort | LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::NoLog => write!(f, "NOLOG"),
            LogLevel::Abort => write!(f, "ABORT"),
            LogLevel::Error => write!(f, "ERROR"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Debug => write!(f, "DEBUG"),
        }
    }
}

impl FromStr for LogLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "NOLOG" => Ok(LogLevel::NoLog),
            "ABORT" => Ok(LogLevel::Abort),
            "ERROR" => Ok(LogLevel::Error),
            "INFO" => Ok(LogLevel::Info),
            "DEBUG" => Ok(LogLevel::Debug),
            _ => Err(anyhow::anyhow!("unknown log level: {s}")),
        }
    }
}

/// Logger handle given to a probe by its host
#[derive(Debug, Clone)]
pub struct ProbeLogger {
    label: Arc<str>,
}

impl ProbeLogger {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: Arc::from(label.into()),
        }
    }

    /// Logger labelled `otestpoint-probe/<node>/<index>`
    pub fn for_probe(node_id: &str, index: ProbeIndex) -> Self {
        Self::new(format!("otestpoint-probe/{node_id}/{index}"))
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn log(&self, level: LogLevel, message: impl fmt::Display) {
        let probe = &*self.label;

        match level {
            LogLevel::NoLog => {}
            LogLevel::Abort => error!(probe, abort = true, "{message}"),
            LogLevel::Error => error!(probe, "{message}"),
            LogLevel::Info => info!(probe, "{message}"),
            LogLevel::Debug => debug!(probe, "{message}"),
        }
    }
}
