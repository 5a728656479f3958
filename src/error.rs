//! Error types for probe operations

use std::fmt;

use crate::probe::lifecycle::{LifecycleOperation, ProbeState};

/// Result type alias for probe operations
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Result type alias for guarded lifecycle operations
pub type LifecycleResult<T> = Result<T, LifecycleError>;

/// Errors a probe reports from a lifecycle or poll call
///
/// Callers treat every variant the same way: the current operation failed.
/// Retry policy belongs to the host.
#[derive(Debug)]
pub enum ProbeError {
    /// Failure reported by the probe implementation
    Failed(String),

    /// Probe configuration could not be used
    Configuration(String),

    /// Measurement serialization/deserialization error
    Serialization(serde_json::Error),

    /// I/O error (configuration file access, etc.)
    Io(std::io::Error),
}

impl ProbeError {
    /// Convenience constructor for probe-reported failures
    pub fn failed(message: impl Into<String>) -> Self {
        ProbeError::Failed(message.into())
    }
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeError::Failed(msg) => write!(f, "probe failed: {}", msg),
            ProbeError::Configuration(msg) => write!(f, "invalid probe configuration: {}", msg),
            ProbeError::Serialization(err) => write!(f, "measurement serialization error: {}", err),
            ProbeError::Io(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for ProbeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProbeError::Serialization(err) => Some(err),
            ProbeError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ProbeError {
    fn from(err: std::io::Error) -> Self {
        ProbeError::Io(err)
    }
}

impl From<serde_json::Error> for ProbeError {
    fn from(err: serde_json::Error) -> Self {
        ProbeError::Serialization(err)
    }
}

/// Errors raised by [`ManagedProbe`](crate::probe::managed::ManagedProbe)
#[derive(Debug)]
pub enum LifecycleError {
    /// The operation is not valid in the current state; the probe was not called
    OutOfSequence {
        state: ProbeState,
        operation: LifecycleOperation,
    },

    /// A poll returned an entry for a stream the probe never advertised
    Unadvertised { name: String },

    /// The probe itself failed; the state is unchanged
    Probe(ProbeError),
}

impl fmt::Display for LifecycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleError::OutOfSequence { state, operation } => {
                write!(f, "cannot {} a probe that is {}", operation, state)
            }
            LifecycleError::Unadvertised { name } => {
                write!(f, "probe returned data for unadvertised name: {}", name)
            }
            LifecycleError::Probe(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for LifecycleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LifecycleError::Probe(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ProbeError> for LifecycleError {
    fn from(err: ProbeError) -> Self {
        LifecycleError::Probe(err)
    }
}
