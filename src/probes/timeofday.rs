//! Time of day reference probe
//!
//! The smallest conforming probe: it advertises a single stream, acquires
//! nothing, and publishes the current wall clock time on every poll.

use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::ProbeResult;
use crate::logger::{LogLevel, ProbeLogger};
use crate::measurement::{Description, Measurement};
use crate::operator::MeasurementModule;
use crate::probe::{Probe, ProbeDataEntry, ProbeNames};

/// Stream name advertised by [`TimeOfDay`]
pub const TIMEOFDAY_PROBE: &str = "Probes.TimeOfDay";

/// Module the time of day measurement is registered in
pub const TIMEOFDAY_MODULE: &str = "otestpoint.probes.timeofday";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeOfDayMeasurement {
    pub microseconds_since_epoch: u64,
}

impl Measurement for TimeOfDayMeasurement {
    const DESCRIPTION: Description = Description {
        name: "Measurement_timeofday",
        module: TIMEOFDAY_MODULE,
        version: 1,
    };
}

/// Module registering [`TimeOfDayMeasurement`] with its format and diff
///
/// The diff samples microseconds as `i64`. Times past `i64::MAX`
/// microseconds saturate to it.
pub fn measurement_module() -> MeasurementModule {
    MeasurementModule::new(TIMEOFDAY_MODULE)
        .with_type::<TimeOfDayMeasurement>()
        .with_format(|probe: &TimeOfDayMeasurement| {
            format!("time = {}", probe.microseconds_since_epoch)
        })
        .with_diff(|probe: &TimeOfDayMeasurement| {
            i64::try_from(probe.microseconds_since_epoch).unwrap_or(i64::MAX)
        })
}

/// Probe publishing the current time in microseconds since the Unix epoch
#[derive(Debug)]
pub struct TimeOfDay {
    logger: ProbeLogger,
    last: u64,
}

impl TimeOfDay {
    pub fn new(logger: ProbeLogger) -> Self {
        Self { logger, last: 0 }
    }

    /// Current time, never earlier than the previous reading
    fn now(&mut self) -> u64 {
        let now = u64::try_from(Utc::now().timestamp_micros()).unwrap_or_default();
        self.last = self.last.max(now);
        self.last
    }
}

impl Probe for TimeOfDay {
    fn initialize(&mut self, configuration: Option<&Path>) -> ProbeResult<ProbeNames> {
        let configuration = configuration
            .map(|path| path.display().to_string())
            .unwrap_or_default();

        self.logger.log(
            LogLevel::Debug,
            format!("/probe/timeofday initialize configuration: {configuration}"),
        );

        Ok(ProbeNames::from([TIMEOFDAY_PROBE.to_string()]))
    }

    fn start(&mut self) -> ProbeResult<()> {
        self.logger.log(LogLevel::Debug, "/probe/timeofday start");
        Ok(())
    }

    fn stop(&mut self) -> ProbeResult<()> {
        self.logger.log(LogLevel::Debug, "/probe/timeofday stop");
        Ok(())
    }

    fn destroy(&mut self) -> ProbeResult<()> {
        self.logger.log(LogLevel::Debug, "/probe/timeofday destroy");
        Ok(())
    }

    fn poll(&mut self) -> ProbeResult<Vec<ProbeDataEntry>> {
        self.logger.log(LogLevel::Debug, "/probe/timeofday probe");

        let measurement = TimeOfDayMeasurement {
            microseconds_since_epoch: self.now(),
        };

        Ok(vec![ProbeDataEntry::from_measurement(
            TIMEOFDAY_PROBE,
            &measurement,
        )?])
    }
}
