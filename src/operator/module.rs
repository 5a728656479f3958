//! Measurement modules
//!
//! A module groups measurement types with the optional behavior attached to
//! them. Behavior comes in two scopes:
//!
//! - **module defaults**: applied to every type of the module
//! - **type methods**: applied to one type, overriding the default
//!
//! ```
//! use otestpoint::operator::MeasurementModule;
//! use otestpoint::probes::timeofday::TimeOfDayMeasurement;
//!
//! let module = MeasurementModule::new("otestpoint.probes.timeofday")
//!     .with_type::<TimeOfDayMeasurement>()
//!     .with_format(|m: &TimeOfDayMeasurement| format!("time = {}", m.microseconds_since_epoch));
//!
//! assert!(module.contains("Measurement_timeofday"));
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::{Differ, Formatter, MeasurementOperator, OperatorMethods, Parser};
use crate::measurement::{Measurement, MeasurementInstance};

/// Registered measurement types and their optional methods
#[derive(Clone)]
pub struct MeasurementModule {
    name: String,
    types: HashMap<String, Parser>,
    defaults: OperatorMethods,
    methods: HashMap<String, OperatorMethods>,
}

impl MeasurementModule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            types: HashMap::new(),
            defaults: OperatorMethods::default(),
            methods: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register `M` under its description name
    pub fn with_type<M: Measurement>(mut self) -> Self {
        let parser: Parser = Arc::new(|data: &[u8]| {
            M::from_bytes(data).map(|m| Box::new(m) as Box<dyn MeasurementInstance>)
        });

        self.types.insert(M::DESCRIPTION.name.to_string(), parser);
        self
    }

    /// Formatter applied to every type of this module without its own
    pub fn with_default_format<F>(mut self, format: F) -> Self
    where
        F: Fn(&dyn MeasurementInstance) -> String + Send + Sync + 'static,
    {
        self.defaults.format = Some(Arc::new(move |instance: &dyn MeasurementInstance| {
            Some(format(instance))
        }));
        self
    }

    /// Diff sample applied to every type of this module without its own
    pub fn with_default_diff<F>(mut self, sample: F) -> Self
    where
        F: Fn(&dyn MeasurementInstance) -> i64 + Send + Sync + 'static,
    {
        self.defaults.diff = Some(Arc::new(move |instance: &dyn MeasurementInstance| {
            Some(sample(instance))
        }));
        self
    }

    /// Formatter for `M` only
    ///
    /// Measurements of any other type are left unformatted.
    pub fn with_format<M, F>(mut self, format: F) -> Self
    where
        M: Measurement,
        F: Fn(&M) -> String + Send + Sync + 'static,
    {
        let format: Formatter = Arc::new(move |instance: &dyn MeasurementInstance| {
            instance.downcast_ref::<M>().map(&format)
        });

        self.type_methods::<M>().format = Some(format);
        self
    }

    /// Value sampled by the diff of `M`
    ///
    /// The operator subtracts the previous sample from the current one.
    /// Measurements of any other type are not sampled.
    pub fn with_diff<M, F>(mut self, sample: F) -> Self
    where
        M: Measurement,
        F: Fn(&M) -> i64 + Send + Sync + 'static,
    {
        let sample: Differ = Arc::new(move |instance: &dyn MeasurementInstance| {
            instance.downcast_ref::<M>().map(&sample)
        });

        self.type_methods::<M>().diff = Some(sample);
        self
    }

    fn type_methods<M: Measurement>(&mut self) -> &mut OperatorMethods {
        self.methods
            .entry(M::DESCRIPTION.name.to_string())
            .or_default()
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    /// Build an operator for `type_name`, or `None` if it is not registered
    pub fn build_operator(&self, type_name: &str) -> Option<MeasurementOperator> {
        let parser = self.types.get(type_name)?;

        let methods = match self.methods.get(type_name) {
            Some(specific) => self.defaults.overridden_by(specific),
            None => self.defaults.clone(),
        };

        Some(MeasurementOperator::new(
            &self.name,
            type_name,
            Arc::clone(parser),
            methods,
        ))
    }
}

impl fmt::Debug for MeasurementModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<_> = self.type_names().collect();
        types.sort_unstable();

        f.debug_struct("MeasurementModule")
            .field("name", &self.name)
            .field("types", &types)
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}
