//! Probe lifecycle state machine
//!
//! ```text
//! Uninitialized ──initialize──► Initialized ──start──► Running ◄──┐
//!                                   │                  │  │ poll │
//!                                   │                  │  └──────┘
//!                                destroy              stop
//!                                   │                  ▼
//!                                   │               Stopped ──start──► Running
//!                                   ▼                  │
//!                               Destroyed ◄──destroy───┘
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::LifecycleError;

/// Lifecycle state of a probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeState {
    #[default]
    Uninitialized,
    Initialized,
    Running,
    Stopped,
    Destroyed,
}

/// Calls a host can make on a probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleOperation {
    Initialize,
    Start,
    Stop,
    Destroy,
    Poll,
}

impl LifecycleOperation {
    pub const ALL: [LifecycleOperation; 5] = [
        LifecycleOperation::Initialize,
        LifecycleOperation::Start,
        LifecycleOperation::Stop,
        LifecycleOperation::Destroy,
        LifecycleOperation::Poll,
    ];
}

impl ProbeState {
    /// Compute the state reached by applying `operation`
    ///
    /// Fails with [`LifecycleError::OutOfSequence`] for any pair outside the
    /// lifecycle table. `Destroyed` accepts nothing.
    pub fn transition(self, operation: LifecycleOperation) -> Result<ProbeState, LifecycleError> {
        use LifecycleOperation as Op;
        use ProbeState as S;

        match (self, operation) {
            (S::Uninitialized, Op::Initialize) => Ok(S::Initialized),
            (S::Initialized, Op::Start) | (S::Stopped, Op::Start) => Ok(S::Running),
            (S::Running, Op::Poll) => Ok(S::Running),
            (S::Running, Op::Stop) => Ok(S::Stopped),
            (S::Initialized, Op::Destroy) | (S::Stopped, Op::Destroy) => Ok(S::Destroyed),
            (state, operation) => Err(LifecycleError::OutOfSequence { state, operation }),
        }
    }

    pub fn is_terminal(&self) -> bool {
        *self == ProbeState::Destroyed
    }
}

impl fmt::Display for ProbeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeState::Uninitialized => write!(f, "uninitialized"),
            ProbeState::Initialized => write!(f, "initialized"),
            ProbeState::Running => write!(f, "running"),
            ProbeState::Stopped => write!(f, "stopped"),
            ProbeState::Destroyed => write!(f, "destroyed"),
        }
    }
}

impl fmt::Display for LifecycleOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleOperation::Initialize => write!(f, "initialize"),
            LifecycleOperation::Start => write!(f, "start"),
            LifecycleOperation::Stop => write!(f, "stop"),
            LifecycleOperation::Destroy => write!(f, "destroy"),
            LifecycleOperation::Poll => write!(f, "poll"),
        }
    }
}
