// Copyright 2021 bmc::labs Gmbh. All rights reserved.
//
// Authors:
//   Florian Eich <florian@bmc-labs.com>
//   Jonas Reitemeyer <alumni@bmc-labs.com>

use super::{event::ACCURACY_LOW,
            GeoEvent,
            HeartRateEvent,
            PressureEvent,
            SensorEvent,
            StepsEvent};
use getset::{CopyGetters, Getters};


const NS_PER_MINUTE: f64 = 60e9;


/// Updates the running mean `mean` of `n - 1` samples with the `n`-th sample.
///
/// Results must match this exact sequence of float operations, which differs
/// from a one-shot `sum / n` in the last bits.
pub fn incremental_mean(mean: f32, n: u32, value: f32) -> f32 {
  mean * ((n - 1) as f32 / n as f32) + value / n as f32
}


/// Abstract clock bounds of an activity, both ends inclusive.
#[derive(Clone, Copy, Debug, PartialEq, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct Scope {
  start_ns: i64,
  stop_ns:  i64,
}

impl Scope {
  pub fn new(start_ns: i64, stop_ns: i64) -> Self {
    Self { start_ns, stop_ns }
  }

  /// Scope of an activity which has not been stopped yet.
  pub fn open(start_ns: i64) -> Self {
    Self::new(start_ns, i64::MAX)
  }

  pub fn contains(&self, timestamp_ns: i64) -> bool {
    self.start_ns <= timestamp_ns && timestamp_ns <= self.stop_ns
  }
}


/// Heart rate statistics over accurate in-scope events.
#[derive(Clone, Debug, Default, PartialEq, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct HeartRateStats {
  avg_bpm:      f32,
  max_bpm:      i32,
  accurate:     u32,
  inaccurate:   u32,
  out_of_scope: u32,
}

impl HeartRateStats {
  fn add(&mut self, event: &HeartRateEvent, scope: &Scope) {
    if !scope.contains(event.timestamp_ns()) {
      self.out_of_scope += 1;
    } else if event.accuracy() >= ACCURACY_LOW {
      self.accurate += 1;
      self.avg_bpm =
        incremental_mean(self.avg_bpm, self.accurate, event.rate_bpm() as f32);
      self.max_bpm = self.max_bpm.max(event.rate_bpm());
    } else {
      self.inaccurate += 1;
    }
  }
}


/// Step counter statistics over accurate in-scope events.
///
/// The first accurate in-scope event is the baseline every later counter
/// state is measured against, it does not produce a rate by itself.
#[derive(Clone, Debug, Default, PartialEq, CopyGetters)]
pub struct StepsStats {
  first:        Option<(i64, i32)>,
  last:         Option<(i64, i32)>,
  #[getset(get_copy = "pub")]
  last_rate:    f32,
  #[getset(get_copy = "pub")]
  max_rate:     f32,
  /// Accurate in-scope readings, the baseline included.
  #[getset(get_copy = "pub")]
  accurate:     u32,
  #[getset(get_copy = "pub")]
  inaccurate:   u32,
  #[getset(get_copy = "pub")]
  out_of_scope: u32,
}

impl StepsStats {
  fn add(&mut self, event: &StepsEvent, scope: &Scope) {
    let (ts, steps) = (event.timestamp_ns(), event.cumulative_steps());

    if !scope.contains(ts) {
      self.out_of_scope += 1;
      return;
    }
    if event.accuracy() < ACCURACY_LOW {
      self.inaccurate += 1;
      return;
    }

    self.accurate += 1;
    if let Some((last_ts, last_steps)) = self.last {
      // two readings at the same instant carry no rate information
      if ts != last_ts {
        self.last_rate = steps_per_minute(steps as i64 - last_steps as i64,
                                          ts - last_ts);
        if self.max_rate < self.last_rate {
          self.max_rate = self.last_rate;
        }
      }
    } else {
      self.first = Some((ts, steps));
    }
    self.last = Some((ts, steps));
  }

  /// Steps between the baseline and the latest accurate reading.
  pub fn total_steps(&self) -> i32 {
    match (self.first, self.last) {
      (Some((_, first)), Some((_, last))) => last - first,
      _ => 0,
    }
  }

  /// Overall step rate between the baseline and the latest accurate reading
  /// in steps per minute, `0.0` while no time has passed between the two.
  pub fn avg_rate(&self) -> f32 {
    match (self.first, self.last) {
      (Some((first_ts, first)), Some((last_ts, last))) if last_ts != first_ts => {
        steps_per_minute(last as i64 - first as i64, last_ts - first_ts)
      }
      _ => 0.0,
    }
  }
}

fn steps_per_minute(delta_steps: i64, delta_ns: i64) -> f32 {
  (delta_steps as f64 / (delta_ns as f64 / NS_PER_MINUTE)) as f32
}


/// Speed and position accuracy statistics over in-scope geo events. There is
/// no accuracy gate for geo events, every in-scope fix counts as valid.
#[derive(Clone, Debug, Default, PartialEq, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct GeoStats {
  avg_speed_mps:            f32,
  max_speed_mps:            f32,
  avg_lateral_accuracy_m:   f32,
  best_lateral_accuracy_m:  f32,
  worst_lateral_accuracy_m: f32,
  valid:                    u32,
  out_of_scope:             u32,
}

impl GeoStats {
  fn add(&mut self, event: &GeoEvent, scope: &Scope) {
    if !scope.contains(event.timestamp_ns()) {
      self.out_of_scope += 1;
      return;
    }

    self.valid += 1;
    let (speed, lateral) = (event.speed_mps(), event.lateral_accuracy_m());

    self.avg_speed_mps = incremental_mean(self.avg_speed_mps, self.valid, speed);
    if self.max_speed_mps < speed {
      self.max_speed_mps = speed;
    }

    self.avg_lateral_accuracy_m =
      incremental_mean(self.avg_lateral_accuracy_m, self.valid, lateral);
    if self.valid == 1 || self.best_lateral_accuracy_m > lateral {
      self.best_lateral_accuracy_m = lateral;
    }
    if self.valid == 1 || self.worst_lateral_accuracy_m < lateral {
      self.worst_lateral_accuracy_m = lateral;
    }
  }
}


/// Snapshot of everything derived by an `ActivityAggregator`.
#[derive(Clone, Debug, Default, PartialEq, Getters)]
#[getset(get = "pub")]
pub struct ActivityStats {
  heart_rate: HeartRateStats,
  steps:      StepsStats,
  geo:        GeoStats,
}


/// Incrementally maintains activity statistics from a stream of events.
///
/// Events outside of the scope only bump the respective out of scope counter.
/// Pressure events are accepted but do not feed any statistic.
#[derive(Clone, Debug, PartialEq, CopyGetters)]
pub struct ActivityAggregator {
  #[getset(get_copy = "pub")]
  scope: Scope,
  stats: ActivityStats,
}

impl ActivityAggregator {
  pub fn new(scope: Scope) -> Self {
    Self { scope,
           stats: ActivityStats::default() }
  }

  pub fn add(&mut self, event: &SensorEvent) {
    match event {
      SensorEvent::HeartRate(event) => self.add_heart_rate(event),
      SensorEvent::Steps(event) => self.add_steps(event),
      SensorEvent::Pressure(event) => self.add_pressure(event),
      SensorEvent::Geo(event) => self.add_geo(event),
    }
  }

  pub fn add_heart_rate(&mut self, event: &HeartRateEvent) {
    self.stats.heart_rate.add(event, &self.scope);
  }

  pub fn add_steps(&mut self, event: &StepsEvent) {
    self.stats.steps.add(event, &self.scope);
  }

  pub fn add_pressure(&mut self, _event: &PressureEvent) {}

  pub fn add_geo(&mut self, event: &GeoEvent) {
    self.stats.geo.add(event, &self.scope);
  }

  pub fn summary(&self) -> ActivityStats {
    self.stats.clone()
  }
}
