// Copyright 2021 bmc::labs Gmbh. All rights reserved.
//
// Authors:
//   Florian Eich <florian@bmc-labs.com>
//   Jonas Reitemeyer <alumni@bmc-labs.com>

use super::{aggregator::{ActivityAggregator, Scope},
            GeoEvent,
            HeartRateEvent,
            StepsEvent};
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use getset::{CopyGetters, Setters};
use serde::Serialize;


/// Activity bounds plus the summary statistics stored by the recording
/// device.
///
/// These are the values persisted in the file, verbatim. Statistics
/// recomputed from the events are kept apart, see `Recording::computed`.
#[derive(Clone, Copy, Debug, Default, PartialEq, CopyGetters, Setters,
         Serialize)]
#[getset(get_copy = "pub", set = "pub")]
pub struct ActivitySummary {
  start_rtc_ms:    i64, // ms since Jan, 1st 1970
  stop_rtc_ms:     i64, // ms since Jan, 1st 1970
  start_ns:        i64, // abstract clock
  stop_ns:         i64, // abstract clock
  avg_heart_rate:  f32, // bpm
  max_heart_rate:  i32, // bpm
  total_steps:     i32,
  avg_step_rate:   f32, // steps per minute
  total_ascent_m:  f32,
  total_descent_m: f32,
  avg_speed_mps:   f32,
}

impl ActivitySummary {
  /// Bounds of a freshly started activity, all statistics zeroed.
  pub fn started(start_rtc_ms: i64, start_ns: i64) -> Self {
    Self { start_rtc_ms,
           start_ns,
           ..Self::default() }
  }

  pub fn scope(&self) -> Scope {
    Scope::new(self.start_ns, self.stop_ns)
  }

  pub fn start_time(&self) -> Option<NaiveDateTime> {
    rtc_to_datetime(self.start_rtc_ms)
  }

  pub fn stop_time(&self) -> Option<NaiveDateTime> {
    rtc_to_datetime(self.stop_rtc_ms)
  }

  /// Wall clock duration of the activity.
  pub fn duration(&self) -> Duration {
    Duration::milliseconds(self.stop_rtc_ms - self.start_rtc_ms)
  }

  /// Fixes the stop bounds and derives the stored statistics from the
  /// events recorded between start and stop.
  pub fn finish(&mut self,
                stop_rtc_ms: i64,
                stop_ns: i64,
                heart_rate: &[HeartRateEvent],
                steps: &[StepsEvent],
                geo: &[GeoEvent]) {
    self.stop_rtc_ms = stop_rtc_ms;
    self.stop_ns = stop_ns;
    let scope = self.scope();

    let mut aggregator = ActivityAggregator::new(scope);
    heart_rate.iter()
              .for_each(|event| aggregator.add_heart_rate(event));
    steps.iter().for_each(|event| aggregator.add_steps(event));
    geo.iter().for_each(|event| aggregator.add_geo(event));
    let stats = aggregator.summary();

    self.avg_heart_rate = stats.heart_rate().avg_bpm();
    self.max_heart_rate = stats.heart_rate().max_bpm();
    self.avg_speed_mps = stats.geo().avg_speed_mps();

    // the stored step rate refers to the whole activity, not to the span
    // between the first and the last reading
    self.total_steps = stats.steps().total_steps();
    let minutes = (stop_ns - self.start_ns) as f64 / 60e9;
    self.avg_step_rate = if minutes > 0.0 {
      (self.total_steps as f64 / minutes) as f32
    } else {
      0.0
    };

    let (ascent, descent) = elevation_gain(geo, &scope);
    self.total_ascent_m = ascent as f32;
    self.total_descent_m = descent as f32;
  }
}

fn rtc_to_datetime(rtc_ms: i64) -> Option<NaiveDateTime> {
  DateTime::<Utc>::from_timestamp_millis(rtc_ms).map(|dt| dt.naive_utc())
}

/// Sums up positive and negative altitude changes between consecutive
/// in-scope fixes.
fn elevation_gain(geo: &[GeoEvent], scope: &Scope) -> (f64, f64) {
  let altitudes: Vec<f64> = geo.iter()
                               .filter(|event| {
                                 scope.contains(event.timestamp_ns())
                               })
                               .map(|event| event.altitude_m())
                               .collect();

  altitudes.windows(2)
           .map(|pair| pair[1] - pair[0])
           .fold((0.0, 0.0), |(ascent, descent), diff| {
             if diff > 0.0 {
               (ascent + diff, descent)
             } else {
               (ascent, descent - diff)
             }
           })
}
