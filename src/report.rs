// Copyright 2021 bmc::labs Gmbh. All rights reserved.
//
// Authors:
//   Florian Eich <florian@bmc-labs.com>
//   Jonas Reitemeyer <alumni@bmc-labs.com>

use super::Recording;
use chrono::{DateTime, Utc};
use getset::CopyGetters;
use serde::Serialize;
use std::fmt;


/// Stored summary values of a recording next to the values recomputed from
/// its events.
#[derive(Clone, Copy, Debug, PartialEq, CopyGetters, Serialize)]
#[getset(get_copy = "pub")]
pub struct Report {
  start_rtc_ms:             i64,
  stop_rtc_ms:              i64,
  duration_secs:            i64,
  events:                   usize,
  pressure_events:          usize,
  // heart rate
  stored_avg_heart_rate:    f32,
  computed_avg_heart_rate:  f32,
  stored_max_heart_rate:    i32,
  computed_max_heart_rate:  i32,
  heart_rate_accurate:      u32,
  heart_rate_inaccurate:    u32,
  heart_rate_out_of_scope:  u32,
  // steps
  stored_total_steps:       i32,
  computed_total_steps:     i32,
  stored_avg_step_rate:     f32,
  computed_avg_step_rate:   f32,
  computed_max_step_rate:   f32,
  steps_accurate:           u32,
  steps_inaccurate:         u32,
  steps_out_of_scope:       u32,
  // geo
  stored_avg_speed_mps:     f32,
  computed_avg_speed_mps:   f32,
  computed_max_speed_mps:   f32,
  total_ascent_m:           f32,
  total_descent_m:          f32,
  avg_lateral_accuracy_m:   f32,
  best_lateral_accuracy_m:  f32,
  worst_lateral_accuracy_m: f32,
  geo_valid:                u32,
  geo_out_of_scope:         u32,
}

impl Report {
  pub fn new(recording: &Recording) -> Self {
    let stored = recording.summary();
    let computed = recording.computed();
    let (heart_rate, steps, geo) =
      (computed.heart_rate(), computed.steps(), computed.geo());

    Self { start_rtc_ms:             stored.start_rtc_ms(),
           stop_rtc_ms:              stored.stop_rtc_ms(),
           duration_secs:            stored.duration().num_seconds(),
           events:                   recording.events_count(),
           pressure_events:          recording.pressure_events().len(),
           stored_avg_heart_rate:    stored.avg_heart_rate(),
           computed_avg_heart_rate:  heart_rate.avg_bpm(),
           stored_max_heart_rate:    stored.max_heart_rate(),
           computed_max_heart_rate:  heart_rate.max_bpm(),
           heart_rate_accurate:      heart_rate.accurate(),
           heart_rate_inaccurate:    heart_rate.inaccurate(),
           heart_rate_out_of_scope:  heart_rate.out_of_scope(),
           stored_total_steps:       stored.total_steps(),
           computed_total_steps:     steps.total_steps(),
           stored_avg_step_rate:     stored.avg_step_rate(),
           computed_avg_step_rate:   steps.avg_rate(),
           computed_max_step_rate:   steps.max_rate(),
           steps_accurate:           steps.accurate(),
           steps_inaccurate:         steps.inaccurate(),
           steps_out_of_scope:       steps.out_of_scope(),
           stored_avg_speed_mps:     stored.avg_speed_mps(),
           computed_avg_speed_mps:   geo.avg_speed_mps(),
           computed_max_speed_mps:   geo.max_speed_mps(),
           total_ascent_m:           stored.total_ascent_m(),
           total_descent_m:          stored.total_descent_m(),
           avg_lateral_accuracy_m:   geo.avg_lateral_accuracy_m(),
           best_lateral_accuracy_m:  geo.best_lateral_accuracy_m(),
           worst_lateral_accuracy_m: geo.worst_lateral_accuracy_m(),
           geo_valid:                geo.valid(),
           geo_out_of_scope:         geo.out_of_scope() }
  }
}

fn rtc_display(rtc_ms: i64) -> String {
  DateTime::<Utc>::from_timestamp_millis(rtc_ms)
    .map(|dt| dt.format("%Y-%m-%d %H:%M:%S%.3f").to_string())
    .unwrap_or_else(|| format!("{} ms", rtc_ms))
}

impl fmt::Display for Report {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    let secs = self.duration_secs.max(0);
    writeln!(f, "start:    {}", rtc_display(self.start_rtc_ms))?;
    writeln!(f, "stop:     {}", rtc_display(self.stop_rtc_ms))?;
    writeln!(f, "duration: {:02}:{:02}", secs / 60, secs % 60)?;
    writeln!(f, "events:   {} ({} pressure)", self.events, self.pressure_events)?;
    writeln!(f)?;

    writeln!(f, "{:<24}{:>12}{:>12}", "", "stored", "computed")?;
    writeln!(f, "heart rate")?;
    writeln!(f,
             "{:<24}{:>12.2}{:>12.2}",
             "  average [bpm]", self.stored_avg_heart_rate,
             self.computed_avg_heart_rate)?;
    writeln!(f,
             "{:<24}{:>12}{:>12}",
             "  maximum [bpm]", self.stored_max_heart_rate,
             self.computed_max_heart_rate)?;
    writeln!(f,
             "  events: {} accurate, {} inaccurate, {} out of scope",
             self.heart_rate_accurate,
             self.heart_rate_inaccurate,
             self.heart_rate_out_of_scope)?;

    writeln!(f, "steps")?;
    writeln!(f,
             "{:<24}{:>12}{:>12}",
             "  total", self.stored_total_steps, self.computed_total_steps)?;
    writeln!(f,
             "{:<24}{:>12.2}{:>12.2}",
             "  average [1/min]", self.stored_avg_step_rate,
             self.computed_avg_step_rate)?;
    writeln!(f,
             "{:<24}{:>12}{:>12.2}",
             "  maximum [1/min]", "-", self.computed_max_step_rate)?;
    writeln!(f,
             "  events: {} accurate, {} inaccurate, {} out of scope",
             self.steps_accurate,
             self.steps_inaccurate,
             self.steps_out_of_scope)?;

    writeln!(f, "geo")?;
    writeln!(f,
             "{:<24}{:>12.2}{:>12.2}",
             "  avg speed [m/s]", self.stored_avg_speed_mps,
             self.computed_avg_speed_mps)?;
    writeln!(f,
             "{:<24}{:>12}{:>12.2}",
             "  max speed [m/s]", "-", self.computed_max_speed_mps)?;
    writeln!(f,
             "{:<24}{:>12.1}{:>12}",
             "  ascent [m]", self.total_ascent_m, "-")?;
    writeln!(f,
             "{:<24}{:>12.1}{:>12}",
             "  descent [m]", self.total_descent_m, "-")?;
    writeln!(f,
             "  lateral accuracy [m]: {:.1} avg, {:.1} best, {:.1} worst",
             self.avg_lateral_accuracy_m,
             self.best_lateral_accuracy_m,
             self.worst_lateral_accuracy_m)?;
    write!(f,
           "  fixes: {} valid, {} out of scope",
           self.geo_valid, self.geo_out_of_scope)
  }
}


#[cfg(test)]
mod tests {
  use super::*;
  use crate::{ActivitySummary, GeoEvent, HeartRateEvent, PressureEvent,
              StepsEvent};
  use pretty_assertions::assert_eq;


  fn recording() -> Recording {
    let minute = 60_000_000_000i64;
    let mut recording =
      Recording::new(ActivitySummary::started(1_600_000_000_000, 0));
    recording.push(HeartRateEvent::new(0, 100, 1));
    recording.push(HeartRateEvent::new(minute, 140, 2));
    recording.push(HeartRateEvent::new(minute, 200, 0));
    recording.push(StepsEvent::new(minute, 100, 1));
    recording.push(StepsEvent::new(2 * minute, 300, 1));
    recording.push(PressureEvent::new(minute, 1013.25, 1));
    recording.push(GeoEvent::at(minute).with_position(48.0, 11.0, 5.0)
                                        .with_altitude(500.0)
                                        .with_motion(90.0, 2.5));
    recording.push(GeoEvent::at(8 * minute).with_motion(0.0, 9.0));
    recording.finish(1_600_000_240_000, 4 * minute);
    recording
  }

  #[test]
  fn report_test() {
    let report = Report::new(&recording());

    assert_eq!(240, report.duration_secs());
    assert_eq!(8, report.events());
    assert_eq!(1, report.pressure_events());
    assert_eq!(120.0, report.stored_avg_heart_rate());
    assert_eq!(report.stored_avg_heart_rate(),
               report.computed_avg_heart_rate());
    assert_eq!(1, report.heart_rate_inaccurate());
    assert_eq!(200, report.stored_total_steps());
    assert_eq!(50.0, report.stored_avg_step_rate());
    assert_eq!(200.0, report.computed_avg_step_rate());
    assert_eq!(2.5, report.computed_avg_speed_mps());
    assert_eq!(1, report.geo_out_of_scope());
  }

  #[test]
  fn display_test() {
    let text = Report::new(&recording()).to_string();
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!("start:    2020-09-13 12:26:40.000", lines[0]);
    assert_eq!("stop:     2020-09-13 12:30:40.000", lines[1]);
    assert_eq!("duration: 04:00", lines[2]);
    assert!(text.contains("heart rate"));
    assert!(text.contains("  total                          200         200"));
    assert!(text.ends_with("  fixes: 1 valid, 1 out of scope"));
  }

  #[test]
  fn json_test() {
    let json = serde_json::to_value(Report::new(&recording())).unwrap();
    assert_eq!(200, json["computed_total_steps"]);
    assert_eq!(1_600_000_000_000i64, json["start_rtc_ms"]);
  }
}
