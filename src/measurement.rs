//! Measurement messages
//!
//! Probes publish measurements as opaque serialized blobs tagged with the
//! [`Description`] of the message type. Any type implementing [`Measurement`]
//! can be published by a probe and decoded again by a
//! [`MeasurementOperator`](crate::operator::MeasurementOperator).

use std::any::Any;
use std::fmt;

use serde::{Serialize, de::DeserializeOwned};

use crate::error::ProbeResult;

/// Static identity of a measurement message type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Description {
    /// Type tag, also the key the type is registered under in its module
    pub name: &'static str,

    /// Module the type belongs to
    pub module: &'static str,

    pub version: u32,
}

/// A serializable measurement message
///
/// The wire encoding is JSON through `serde_json`. Types only need to
/// declare their [`Description`].
pub trait Measurement: Serialize + DeserializeOwned + fmt::Debug + Send + Sync + 'static {
    const DESCRIPTION: Description;

    fn to_bytes(&self) -> ProbeResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    fn from_bytes(data: &[u8]) -> ProbeResult<Self> {
        Ok(serde_json::from_slice(data)?)
    }
}

/// Type-erased measurement instance produced by an operator
pub trait MeasurementInstance: fmt::Debug + Send + Sync {
    fn description(&self) -> Description;

    fn as_any(&self) -> &dyn Any;
}

impl<M: Measurement> MeasurementInstance for M {
    fn description(&self) -> Description {
        M::DESCRIPTION
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl<'a> dyn MeasurementInstance + 'a {
    pub fn downcast_ref<M: Measurement>(&self) -> Option<&M> {
        self.as_any().downcast_ref::<M>()
    }

    pub fn is<M: Measurement>(&self) -> bool {
        self.as_any().is::<M>()
    }
}
