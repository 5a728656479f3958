//! Probe plugin contract
//!
//! A probe is a unit of measurement capability hosted by the OpenTestPoint
//! daemon. The host drives every probe through four lifecycle calls and
//! polls it for data while it is running:
//!
//! - [`Probe::initialize`]: acquire resources, advertise stream names
//! - [`Probe::start`]: begin producing data
//! - [`Probe::stop`]: pause
//! - [`Probe::destroy`]: release everything `initialize` acquired
//! - [`Probe::poll`]: one [`ProbeDataEntry`] per advertised stream
//!
//! Probes never transition themselves. Use [`ManagedProbe`] to have the
//! call order checked.

pub mod lifecycle;
pub mod managed;

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ProbeResult;
use crate::measurement::Measurement;

pub use lifecycle::{LifecycleOperation, ProbeState};
pub use managed::{ManagedProbe, ProbeReport};

/// Index the host assigns to a probe
pub type ProbeIndex = u16;

/// Stream names a probe advertises at initialization
pub type ProbeNames = BTreeSet<String>;

/// Interface every probe implements
///
/// ## Error Handling
///
/// Every call reports failure as a [`ProbeError`](crate::error::ProbeError).
/// There is no retry or rollback: the host decides what to do next.
pub trait Probe: Send {
    /// Initialize with an optional configuration file
    ///
    /// Whether a configuration file is required is up to the probe. Resource
    /// acquisition belongs here.
    ///
    /// Returns the names of the streams this probe will publish.
    fn initialize(&mut self, configuration: Option<&Path>) -> ProbeResult<ProbeNames>;

    fn start(&mut self) -> ProbeResult<()>;

    fn stop(&mut self) -> ProbeResult<()>;

    /// Release everything acquired in [`Probe::initialize`]
    fn destroy(&mut self) -> ProbeResult<()>;

    /// Retrieve the current data for all advertised streams
    ///
    /// Only called while running. A single poll may return zero, one or
    /// many entries, each named after an advertised stream.
    fn poll(&mut self) -> ProbeResult<Vec<ProbeDataEntry>>;
}

/// One measurement produced by a poll
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeDataEntry {
    /// Advertised stream name
    pub name: String,

    /// Serialized measurement
    pub data: Vec<u8>,

    /// Measurement type tag
    pub tag: String,

    /// Module declaring the measurement type
    pub module: String,

    /// Measurement type version
    pub version: u32,
}

impl ProbeDataEntry {
    /// Serialize `measurement` into an entry for stream `name`
    pub fn from_measurement<M: Measurement>(
        name: impl Into<String>,
        measurement: &M,
    ) -> ProbeResult<Self> {
        let description = M::DESCRIPTION;

        Ok(Self {
            name: name.into(),
            data: measurement.to_bytes()?,
            tag: description.name.to_string(),
            module: description.module.to_string(),
            version: description.version,
        })
    }
}
