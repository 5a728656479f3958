pub mod config;
pub mod error;
pub mod logger;
pub mod measurement;
pub mod operator;
pub mod probe;
pub mod probes;
pub mod util;

pub use error::{LifecycleError, LifecycleResult, ProbeError, ProbeResult};
pub use logger::{LogLevel, ProbeLogger};
pub use measurement::{Description, Measurement, MeasurementInstance};
pub use operator::{MeasurementModule, MeasurementOperator, OperatorFactory};
pub use probe::{
    LifecycleOperation, ManagedProbe, Probe, ProbeDataEntry, ProbeIndex, ProbeNames, ProbeReport,
    ProbeState,
};
