//! Probes shipped with the crate

pub mod timeofday;

pub use timeofday::TimeOfDay;
