//! Operator factory tests
//!
//! These tests verify that lookups are cached and idempotent:
//! - Hits return the same shared operator
//! - Missing modules and types are cached as None without reloading
//! - Diff state lives on the shared operator

use std::sync::Arc;

use otestpoint::{
    Measurement, MeasurementModule, OperatorFactory,
    probes::timeofday::{self, TIMEOFDAY_MODULE, TimeOfDayMeasurement},
};
use pretty_assertions::assert_eq;

use crate::helpers::*;

const TIMEOFDAY_TYPE: &str = "Measurement_timeofday";

fn factory() -> OperatorFactory<CountingLoader> {
    OperatorFactory::new(CountingLoader::new(vec![timeofday::measurement_module()]))
}

fn blob(microseconds_since_epoch: u64) -> Vec<u8> {
    TimeOfDayMeasurement {
        microseconds_since_epoch,
    }
    .to_bytes()
    .unwrap()
}

#[test]
fn test_same_operator_for_repeated_lookups() {
    let factory = factory();

    let first = factory.operator(TIMEOFDAY_MODULE, TIMEOFDAY_TYPE).unwrap();
    let second = factory.operator(TIMEOFDAY_MODULE, TIMEOFDAY_TYPE).unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.module(), TIMEOFDAY_MODULE);
    assert_eq!(first.type_name(), TIMEOFDAY_TYPE);
    assert_eq!(factory.loader().loads(), 1);
}

#[test]
fn test_unavailable_module_is_not_reloaded() {
    let factory = factory();

    assert!(factory.operator("otestpoint.probes.missing", TIMEOFDAY_TYPE).is_none());
    assert!(factory.operator("otestpoint.probes.missing", TIMEOFDAY_TYPE).is_none());
    assert!(factory.operator("otestpoint.probes.missing", "Measurement_other").is_none());

    assert_eq!(factory.loader().loads(), 1);
}

#[test]
fn test_missing_type_does_not_disable_module() {
    let factory = factory();

    assert!(factory.operator(TIMEOFDAY_MODULE, "Measurement_missing").is_none());
    assert!(factory.operator(TIMEOFDAY_MODULE, "Measurement_missing").is_none());
    assert!(factory.operator(TIMEOFDAY_MODULE, TIMEOFDAY_TYPE).is_some());

    assert_eq!(factory.loader().loads(), 1);
    assert_eq!(factory.cached_operators(), 2);
}

#[test]
fn test_diff_state_is_shared_between_lookups() {
    let factory = factory();

    let first = factory.operator(TIMEOFDAY_MODULE, TIMEOFDAY_TYPE).unwrap();
    let measurement = first.create(&blob(1_000)).unwrap();
    assert_eq!(first.diff(measurement.as_ref()), Some(0));

    let second = factory.operator(TIMEOFDAY_MODULE, TIMEOFDAY_TYPE).unwrap();
    let measurement = second.create(&blob(1_250)).unwrap();
    assert_eq!(second.diff(measurement.as_ref()), Some(250));
}

#[test]
fn test_module_without_methods_renders_default_conversion() {
    let factory = OperatorFactory::new(CountingLoader::new(vec![
        MeasurementModule::new(TIMEOFDAY_MODULE).with_type::<TimeOfDayMeasurement>(),
    ]));

    let operator = factory.operator(TIMEOFDAY_MODULE, TIMEOFDAY_TYPE).unwrap();
    let measurement = operator.create(&blob(42)).unwrap();

    assert_eq!(
        operator.render(measurement.as_ref()),
        format!("{:?}", TimeOfDayMeasurement { microseconds_since_epoch: 42 })
    );
    assert_eq!(operator.diff(measurement.as_ref()), None);
}

#[test]
fn test_module_default_format_applies_to_every_type() {
    let factory = OperatorFactory::new(CountingLoader::new(vec![
        MeasurementModule::new(TIMEOFDAY_MODULE)
            .with_type::<TimeOfDayMeasurement>()
            .with_default_format(|measurement| {
                format!("<{}>", measurement.description().name)
            }),
    ]));

    let operator = factory.operator(TIMEOFDAY_MODULE, TIMEOFDAY_TYPE).unwrap();
    let measurement = operator.create(&blob(42)).unwrap();

    assert_eq!(operator.render(measurement.as_ref()), "<Measurement_timeofday>");
}

#[test]
fn test_concurrent_lookups_share_one_operator() {
    let factory = Arc::new(factory());

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let factory = Arc::clone(&factory);
            std::thread::spawn(move || factory.operator(TIMEOFDAY_MODULE, TIMEOFDAY_TYPE).unwrap())
        })
        .collect();

    let operators: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();

    assert!(operators.windows(2).all(|pair| Arc::ptr_eq(&pair[0], &pair[1])));
    assert_eq!(factory.loader().loads(), 1);
}

#[test]
fn test_builtin_factory_decodes_timeofday() {
    let factory = OperatorFactory::builtin();
    let operator = factory.operator(TIMEOFDAY_MODULE, TIMEOFDAY_TYPE).unwrap();

    let measurement = operator.create(&blob(99)).unwrap();
    assert_eq!(
        measurement.downcast_ref::<TimeOfDayMeasurement>(),
        Some(&TimeOfDayMeasurement {
            microseconds_since_epoch: 99
        })
    );
    assert_eq!(measurement.description(), TimeOfDayMeasurement::DESCRIPTION);
}
