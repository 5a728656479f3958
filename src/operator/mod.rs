//! Measurement operators
//!
//! An operator decodes the blobs of one measurement type and optionally
//! formats and diffs the decoded values. Operators are looked up by
//! `(module, type name)` through the [`OperatorFactory`], which caches both
//! hits and misses.
//!
//! ## Message Flow
//!
//! ```text
//! ProbeReport { module, tag, blob }
//!     → OperatorFactory::operator(module, tag)
//!     → MeasurementOperator::create(blob)
//!     → render / diff
//! ```

pub mod factory;
pub mod module;

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::ProbeResult;
use crate::measurement::MeasurementInstance;

pub use factory::{ModuleLoader, ModuleRegistry, OperatorFactory};
pub use module::MeasurementModule;

pub(crate) type Parser =
    Arc<dyn Fn(&[u8]) -> ProbeResult<Box<dyn MeasurementInstance>> + Send + Sync>;

/// Renders a measurement as human readable text
///
/// Returns `None` for measurements of a type it cannot render.
pub type Formatter = Arc<dyn Fn(&dyn MeasurementInstance) -> Option<String> + Send + Sync>;

/// Samples the value a diff is computed over
///
/// Returns `None` for measurements of a type it cannot sample.
pub type Differ = Arc<dyn Fn(&dyn MeasurementInstance) -> Option<i64> + Send + Sync>;

/// Optional methods attached to a measurement type
#[derive(Clone, Default)]
pub struct OperatorMethods {
    pub format: Option<Formatter>,
    pub diff: Option<Differ>,
}

impl OperatorMethods {
    /// Methods set in `specific` take precedence over `self`
    pub fn overridden_by(&self, specific: &OperatorMethods) -> OperatorMethods {
        OperatorMethods {
            format: specific.format.clone().or_else(|| self.format.clone()),
            diff: specific.diff.clone().or_else(|| self.diff.clone()),
        }
    }
}

impl fmt::Debug for OperatorMethods {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperatorMethods")
            .field("format", &self.format.is_some())
            .field("diff", &self.diff.is_some())
            .finish()
    }
}

/// Decoder plus optional format/diff behavior for one measurement type
///
/// The diff keeps only the most recent sample. Operators handed out by the
/// factory are shared, so that sample is shared by every holder of the same
/// `(module, type name)` operator.
pub struct MeasurementOperator {
    module: String,
    type_name: String,
    parser: Parser,
    methods: OperatorMethods,
    last_sample: Mutex<Option<i64>>,
}

impl MeasurementOperator {
    pub(crate) fn new(
        module: &str,
        type_name: &str,
        parser: Parser,
        methods: OperatorMethods,
    ) -> Self {
        Self {
            module: module.to_string(),
            type_name: type_name.to_string(),
            parser,
            methods,
            last_sample: Mutex::new(None),
        }
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn has_format(&self) -> bool {
        self.methods.format.is_some()
    }

    pub fn has_diff(&self) -> bool {
        self.methods.diff.is_some()
    }

    /// Decode a serialized measurement
    pub fn create(&self, data: &[u8]) -> ProbeResult<Box<dyn MeasurementInstance>> {
        (self.parser)(data)
    }

    /// Attached formatter output
    ///
    /// `None` if no formatter is attached or it does not accept the type of
    /// `measurement`.
    pub fn format(&self, measurement: &dyn MeasurementInstance) -> Option<String> {
        (self.methods.format.as_ref()?)(measurement)
    }

    /// Human readable text for `measurement`
    ///
    /// Falls back to the `Debug` rendering when [`MeasurementOperator::format`]
    /// yields nothing.
    pub fn render(&self, measurement: &dyn MeasurementInstance) -> String {
        self.format(measurement)
            .unwrap_or_else(|| format!("{measurement:?}"))
    }

    /// Difference to the previous sample
    ///
    /// Returns `Some(0)` for the first sample. Returns `None` without touching
    /// the retained sample if no diff is attached or `measurement` is of a
    /// type the diff cannot sample. A difference outside the `i64` range also
    /// yields `None`, but its sample is still retained.
    pub fn diff(&self, measurement: &dyn MeasurementInstance) -> Option<i64> {
        let sample = (self.methods.diff.as_ref()?)(measurement)?;

        let previous = self
            .last_sample
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(sample);

        match previous {
            Some(previous) => sample.checked_sub(previous),
            None => Some(0),
        }
    }

    /// Forget the retained diff sample
    pub fn reset_diff(&self) {
        *self
            .last_sample
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl fmt::Debug for MeasurementOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MeasurementOperator")
            .field("module", &self.module)
            .field("type_name", &self.type_name)
            .field("methods", &self.methods)
            .finish_non_exhaustive()
    }
}
