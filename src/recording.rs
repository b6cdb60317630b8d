// Copyright 2021 bmc::labs Gmbh. All rights reserved.
//
// Authors:
//   Florian Eich <florian@bmc-labs.com>
//   Jonas Reitemeyer <alumni@bmc-labs.com>

use super::{aggregator::{ActivityAggregator, ActivityStats, Scope},
            ActivitySummary,
            GeoEvent,
            HeartRateEvent,
            PressureEvent,
            SensorEvent,
            StepsEvent};
use getset::{Getters, MutGetters};


/// One recorded sport activity: the summary plus every event in arrival
/// order, one sequence per event type.
#[derive(Clone, Debug, Default, PartialEq, Getters, MutGetters)]
#[getset(get = "pub")]
pub struct Recording {
  #[getset(get = "pub", get_mut = "pub")]
  summary:           ActivitySummary,
  heart_rate_events: Vec<HeartRateEvent>,
  steps_events:      Vec<StepsEvent>,
  pressure_events:   Vec<PressureEvent>,
  geo_events:        Vec<GeoEvent>,
}

impl Recording {
  pub fn new(summary: ActivitySummary) -> Self {
    Self { summary,
           ..Self::default() }
  }

  /// Appends `event` to the sequence of its type.
  pub fn push<E: Into<SensorEvent>>(&mut self, event: E) {
    match event.into() {
      SensorEvent::HeartRate(event) => self.heart_rate_events.push(event),
      SensorEvent::Steps(event) => self.steps_events.push(event),
      SensorEvent::Pressure(event) => self.pressure_events.push(event),
      SensorEvent::Geo(event) => self.geo_events.push(event),
    }
  }

  pub fn events_count(&self) -> usize {
    self.heart_rate_events.len()
    + self.steps_events.len()
    + self.pressure_events.len()
    + self.geo_events.len()
  }

  /// Fixes the stop bounds and computes the stored summary statistics.
  pub fn finish(&mut self, stop_rtc_ms: i64, stop_ns: i64) {
    self.summary.finish(stop_rtc_ms,
                        stop_ns,
                        &self.heart_rate_events,
                        &self.steps_events,
                        &self.geo_events);
  }

  /// Recomputes the statistics from all events within the activity bounds.
  /// The stored summary is left untouched.
  pub fn computed(&self) -> ActivityStats {
    self.aggregate(self.summary.scope())
  }

  /// Replays all events per type in arrival order through a fresh
  /// aggregator bound to `scope`.
  pub fn aggregate(&self, scope: Scope) -> ActivityStats {
    let mut aggregator = ActivityAggregator::new(scope);
    self.heart_rate_events
        .iter()
        .for_each(|event| aggregator.add_heart_rate(event));
    self.steps_events
        .iter()
        .for_each(|event| aggregator.add_steps(event));
    self.pressure_events
        .iter()
        .for_each(|event| aggregator.add_pressure(event));
    self.geo_events
        .iter()
        .for_each(|event| aggregator.add_geo(event));
    aggregator.summary()
  }

  /// Storage file name derived from the start of the activity.
  pub fn file_name(&self) -> String {
    format!("{}.trk", self.summary.start_rtc_ms())
  }
}
