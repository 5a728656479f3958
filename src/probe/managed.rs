//! Guarded probe wrapper
//!
//! [`ManagedProbe`] is what a host holds for each probe. It checks every call
//! against the lifecycle table before the probe sees it, so a probe can rely
//! on being initialized before it is started and running before it is polled.
//!
//! ## Failure Handling
//!
//! - Out of sequence calls never reach the probe.
//! - When the probe itself fails, the state does not change.
//! - Recovery is left to the caller.

use std::path::Path;

use serde::Serialize;
use tracing::{debug, instrument, trace, warn};

use super::lifecycle::{LifecycleOperation, ProbeState};
use super::{Probe, ProbeDataEntry, ProbeIndex, ProbeNames};
use crate::error::{LifecycleError, LifecycleResult, ProbeResult};

/// Report a host publishes for one probe data entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeReport {
    pub index: ProbeIndex,

    pub node_id: String,

    /// Report timestamp (seconds since the Unix epoch)
    pub timestamp: i64,

    /// Publish topic (format: "<stream>.<node id>")
    pub topic: String,

    pub tag: String,

    pub module: String,

    pub version: u32,

    pub blob: Vec<u8>,
}

/// A probe plus the lifecycle state the host has driven it to
pub struct ManagedProbe {
    probe: Box<dyn Probe>,
    state: ProbeState,
    names: ProbeNames,
    node_id: String,
    index: ProbeIndex,
}

impl ManagedProbe {
    pub fn new(probe: Box<dyn Probe>, node_id: impl Into<String>, index: ProbeIndex) -> Self {
        Self {
            probe,
            state: ProbeState::Uninitialized,
            names: ProbeNames::new(),
            node_id: node_id.into(),
            index,
        }
    }

    pub fn state(&self) -> ProbeState {
        self.state
    }

    /// Names advertised by the last successful initialize
    pub fn names(&self) -> &ProbeNames {
        &self.names
    }

    /// Advertised names suffixed with the node id
    pub fn qualified_names(&self) -> Vec<String> {
        self.names.iter().map(|name| self.topic(name)).collect()
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn index(&self) -> ProbeIndex {
        self.index
    }

    fn topic(&self, name: &str) -> String {
        format!("{}.{}", name, self.node_id)
    }

    /// Check `operation`, run `call` and commit the next state on success
    fn guarded<T>(
        &mut self,
        operation: LifecycleOperation,
        call: impl FnOnce(&mut dyn Probe) -> ProbeResult<T>,
    ) -> LifecycleResult<T> {
        let next = self.state.transition(operation).inspect_err(|err| {
            warn!("rejected call: {err}");
        })?;

        let value = call(&mut *self.probe).map_err(|err| {
            debug!("{operation} failed in state {}: {err}", self.state);
            LifecycleError::Probe(err)
        })?;

        if next != self.state {
            trace!("{} -> {next}", self.state);
        }
        self.state = next;

        Ok(value)
    }

    #[instrument(skip(self), fields(node = %self.node_id, index = self.index))]
    pub fn initialize(&mut self, configuration: Option<&Path>) -> LifecycleResult<&ProbeNames> {
        let names = self.guarded(LifecycleOperation::Initialize, |probe| {
            probe.initialize(configuration)
        })?;

        debug!("available probes: {names:?}");
        self.names = names;

        Ok(&self.names)
    }

    #[instrument(skip(self), fields(node = %self.node_id, index = self.index))]
    pub fn start(&mut self) -> LifecycleResult<()> {
        self.guarded(LifecycleOperation::Start, |probe| probe.start())
    }

    #[instrument(skip(self), fields(node = %self.node_id, index = self.index))]
    pub fn stop(&mut self) -> LifecycleResult<()> {
        self.guarded(LifecycleOperation::Stop, |probe| probe.stop())
    }

    #[instrument(skip(self), fields(node = %self.node_id, index = self.index))]
    pub fn destroy(&mut self) -> LifecycleResult<()> {
        self.guarded(LifecycleOperation::Destroy, |probe| probe.destroy())
    }

    /// Poll the probe, rejecting entries for streams it never advertised
    #[instrument(skip(self), fields(node = %self.node_id, index = self.index))]
    pub fn poll(&mut self) -> LifecycleResult<Vec<ProbeDataEntry>> {
        let entries = self.guarded(LifecycleOperation::Poll, |probe| probe.poll())?;

        if let Some(entry) = entries.iter().find(|entry| !self.names.contains(&entry.name)) {
            return Err(LifecycleError::Unadvertised {
                name: entry.name.clone(),
            });
        }

        trace!("polled {} entries", entries.len());

        Ok(entries)
    }

    /// Poll and wrap each entry into a [`ProbeReport`] stamped with `timestamp`
    pub fn report(&mut self, timestamp: i64) -> LifecycleResult<Vec<ProbeReport>> {
        let entries = self.poll()?;

        Ok(entries
            .into_iter()
            .map(|entry| ProbeReport {
                index: self.index,
                node_id: self.node_id.clone(),
                timestamp,
                topic: self.topic(&entry.name),
                tag: entry.tag,
                module: entry.module,
                version: entry.version,
                blob: entry.data,
            })
            .collect())
    }
}

impl std::fmt::Debug for ManagedProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagedProbe")
            .field("state", &self.state)
            .field("names", &self.names)
            .field("node_id", &self.node_id)
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}
