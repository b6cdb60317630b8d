// Copyright 2021 bmc::labs Gmbh. All rights reserved.
//
// Authors:
//   Florian Eich <florian@bmc-labs.com>
//   Jonas Reitemeyer <alumni@bmc-labs.com>

use getset::CopyGetters;


/// Sensor accuracy from which on a reading counts as accurate (the sensor
/// reports at least low confidence).
pub const ACCURACY_LOW: i32 = 1;


/// Heart rate reading.
#[derive(Clone, Copy, Debug, PartialEq, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct HeartRateEvent {
  timestamp_ns: i64,
  rate_bpm:     i32,
  accuracy:     i32,
}

impl HeartRateEvent {
  pub fn new(timestamp_ns: i64, rate_bpm: i32, accuracy: i32) -> Self {
    Self { timestamp_ns,
           rate_bpm,
           accuracy }
  }
}


/// Step counter reading. `cumulative_steps` is the counter state, not a delta.
#[derive(Clone, Copy, Debug, PartialEq, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct StepsEvent {
  timestamp_ns:     i64,
  cumulative_steps: i32,
  accuracy:         i32,
}

impl StepsEvent {
  pub fn new(timestamp_ns: i64, cumulative_steps: i32, accuracy: i32) -> Self {
    Self { timestamp_ns,
           cumulative_steps,
           accuracy }
  }
}


/// Barometric pressure reading in hPa.
#[derive(Clone, Copy, Debug, PartialEq, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct PressureEvent {
  timestamp_ns: i64,
  pressure_hpa: f32,
  accuracy:     i32,
}

impl PressureEvent {
  pub fn new(timestamp_ns: i64, pressure_hpa: f32, accuracy: i32) -> Self {
    Self { timestamp_ns,
           pressure_hpa,
           accuracy }
  }
}


/// Geographic (GNSS) fix.
///
/// `accuracy` is the sensor status accuracy shared by all events, the
/// accuracy of the position itself is `lateral_accuracy_m`.
#[derive(Clone, Copy, Debug, Default, PartialEq, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct GeoEvent {
  timestamp_ns:       i64,
  fix_ts_ns:          i64, // abstract clock of the fix itself
  fix_rtc_ms:         i64, // ms since Jan, 1st 1970
  latitude:           f64, // deg
  longitude:          f64, // deg
  lateral_accuracy_m: f32,
  altitude_m:         f64, // above the WGS 84 reference ellipsoid
  bearing_deg:        f32,
  speed_mps:          f32,
  accuracy:           i32,
}

impl GeoEvent {
  /// Starts a fix at `timestamp_ns` with everything else zeroed, see the
  /// `with_*` functions to fill in the rest.
  pub fn at(timestamp_ns: i64) -> Self {
    Self { timestamp_ns,
           ..Self::default() }
  }

  pub fn with_fix_time(mut self, fix_ts_ns: i64, fix_rtc_ms: i64) -> Self {
    self.fix_ts_ns = fix_ts_ns;
    self.fix_rtc_ms = fix_rtc_ms;
    self
  }

  pub fn with_position(mut self,
                       latitude: f64,
                       longitude: f64,
                       lateral_accuracy_m: f32)
                       -> Self {
    self.latitude = latitude;
    self.longitude = longitude;
    self.lateral_accuracy_m = lateral_accuracy_m;
    self
  }

  pub fn with_altitude(mut self, altitude_m: f64) -> Self {
    self.altitude_m = altitude_m;
    self
  }

  pub fn with_motion(mut self, bearing_deg: f32, speed_mps: f32) -> Self {
    self.bearing_deg = bearing_deg;
    self.speed_mps = speed_mps;
    self
  }

  pub fn with_accuracy(mut self, accuracy: i32) -> Self {
    self.accuracy = accuracy;
    self
  }
}


/// Any event delivered by the sensor layer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SensorEvent {
  HeartRate(HeartRateEvent),
  Steps(StepsEvent),
  Pressure(PressureEvent),
  Geo(GeoEvent),
}

impl SensorEvent {
  pub fn timestamp_ns(&self) -> i64 {
    match self {
      Self::HeartRate(event) => event.timestamp_ns(),
      Self::Steps(event) => event.timestamp_ns(),
      Self::Pressure(event) => event.timestamp_ns(),
      Self::Geo(event) => event.timestamp_ns(),
    }
  }

  pub fn accuracy(&self) -> i32 {
    match self {
      Self::HeartRate(event) => event.accuracy(),
      Self::Steps(event) => event.accuracy(),
      Self::Pressure(event) => event.accuracy(),
      Self::Geo(event) => event.accuracy(),
    }
  }
}

macro_rules! implement_from_event {
  ($($Variant:ident($Event:ty)),*) => {$(
    impl From<$Event> for SensorEvent {
      fn from(event: $Event) -> Self {
        Self::$Variant(event)
      }
    }
  )*}
}

implement_from_event!(HeartRate(HeartRateEvent),
                      Steps(StepsEvent),
                      Pressure(PressureEvent),
                      Geo(GeoEvent));
