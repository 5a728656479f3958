//! Test helpers shared by the integration tests

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use otestpoint::{
    LifecycleOperation, ManagedProbe, MeasurementModule, Probe, ProbeDataEntry, ProbeError,
    ProbeNames, ProbeResult,
    operator::{ModuleLoader, ModuleRegistry},
};

pub const NODE_ID: &str = "node-1";

/// Calls observed by a [`ScriptedProbe`]
#[derive(Debug, Default, Clone)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<LifecycleOperation>>>,
    configuration: Arc<Mutex<Option<PathBuf>>>,
}

impl CallLog {
    pub fn calls(&self) -> Vec<LifecycleOperation> {
        self.calls.lock().unwrap().clone()
    }

    pub fn configuration(&self) -> Option<PathBuf> {
        self.configuration.lock().unwrap().clone()
    }

    fn record(&self, operation: LifecycleOperation) {
        self.calls.lock().unwrap().push(operation);
    }
}

/// Probe that records its calls and fails on request
#[derive(Debug)]
pub struct ScriptedProbe {
    log: CallLog,
    names: Vec<String>,
    entries: Vec<ProbeDataEntry>,
    fail_on: Option<LifecycleOperation>,
    fail_switch: Option<Arc<AtomicBool>>,
}

impl ScriptedProbe {
    pub fn new(names: &[&str]) -> (Self, CallLog) {
        let log = CallLog::default();
        let probe = Self {
            log: log.clone(),
            names: names.iter().map(|name| name.to_string()).collect(),
            entries: Vec::new(),
            fail_on: None,
            fail_switch: None,
        };
        (probe, log)
    }

    pub fn failing_on(mut self, operation: LifecycleOperation) -> Self {
        self.fail_on = Some(operation);
        self
    }

    /// Fail every call made while `switch` is set
    pub fn failing_while(mut self, switch: Arc<AtomicBool>) -> Self {
        self.fail_switch = Some(switch);
        self
    }

    pub fn returning(mut self, entries: Vec<ProbeDataEntry>) -> Self {
        self.entries = entries;
        self
    }

    fn call(&self, operation: LifecycleOperation) -> ProbeResult<()> {
        self.log.record(operation);
        let switched = self
            .fail_switch
            .as_ref()
            .is_some_and(|switch| switch.load(Ordering::SeqCst));
        if switched || self.fail_on == Some(operation) {
            return Err(ProbeError::failed(format!("scripted {operation} failure")));
        }
        Ok(())
    }
}

impl Probe for ScriptedProbe {
    fn initialize(&mut self, configuration: Option<&Path>) -> ProbeResult<ProbeNames> {
        *self.log.configuration.lock().unwrap() = configuration.map(Path::to_path_buf);
        self.call(LifecycleOperation::Initialize)?;
        Ok(self.names.iter().cloned().collect())
    }

    fn start(&mut self) -> ProbeResult<()> {
        self.call(LifecycleOperation::Start)
    }

    fn stop(&mut self) -> ProbeResult<()> {
        self.call(LifecycleOperation::Stop)
    }

    fn destroy(&mut self) -> ProbeResult<()> {
        self.call(LifecycleOperation::Destroy)
    }

    fn poll(&mut self) -> ProbeResult<Vec<ProbeDataEntry>> {
        self.call(LifecycleOperation::Poll)?;
        Ok(self.entries.clone())
    }
}

/// Raw entry for stream `name`
pub fn entry(name: &str) -> ProbeDataEntry {
    ProbeDataEntry {
        name: name.to_string(),
        data: b"{}".to_vec(),
        tag: "Measurement_test".to_string(),
        module: "tests.scripted".to_string(),
        version: 1,
    }
}

pub fn managed(probe: impl Probe + 'static) -> ManagedProbe {
    ManagedProbe::new(Box::new(probe), NODE_ID, 1)
}

/// Managed probe already driven to the running state
pub fn running(probe: impl Probe + 'static) -> ManagedProbe {
    let mut managed = managed(probe);
    managed.initialize(None).unwrap();
    managed.start().unwrap();
    managed
}

/// Loader that counts how often it is asked for a module
#[derive(Debug, Clone)]
pub struct CountingLoader {
    registry: ModuleRegistry,
    loads: Arc<AtomicUsize>,
}

impl CountingLoader {
    pub fn new(modules: Vec<MeasurementModule>) -> Self {
        let mut registry = ModuleRegistry::new();
        for module in modules {
            registry.register(module);
        }

        Self {
            registry,
            loads: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl ModuleLoader for CountingLoader {
    fn load(&self, module: &str) -> anyhow::Result<Arc<MeasurementModule>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.registry.load(module)
    }
}
