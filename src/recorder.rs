// Copyright 2021 bmc::labs Gmbh. All rights reserved.
//
// Authors:
//   Florian Eich <florian@bmc-labs.com>
//   Jonas Reitemeyer <alumni@bmc-labs.com>

use super::{aggregator::{ActivityAggregator, ActivityStats, Scope},
            ActivitySummary,
            Recording,
            SensorEvent};
use eyre::{ensure, Result};
use log::debug;


/// Single writer of a live recording.
///
/// Every event is stored and fed into a live aggregator whose scope stays
/// open until the activity is stopped. The sensor layer is expected to
/// serialize its calls into `add_event`.
#[derive(Debug)]
pub struct Recorder {
  recording: Recording,
  live:      ActivityAggregator,
}

impl Recorder {
  pub fn start(start_rtc_ms: i64, start_ns: i64) -> Self {
    debug!("activity started at {} ms (rtc), {} ns", start_rtc_ms, start_ns);
    let summary = ActivitySummary::started(start_rtc_ms, start_ns);
    Self { recording: Recording::new(summary),
           live:      ActivityAggregator::new(Scope::open(start_ns)) }
  }

  pub fn add_event<E: Into<SensorEvent>>(&mut self, event: E) {
    let event = event.into();
    self.live.add(&event);
    self.recording.push(event);
  }

  /// Statistics over everything received since start.
  pub fn live_stats(&self) -> ActivityStats {
    self.live.summary()
  }

  pub fn events_count(&self) -> usize {
    self.recording.events_count()
  }

  /// Stops the activity and hands out the finished recording with its
  /// stored summary fixed.
  pub fn stop(self, stop_rtc_ms: i64, stop_ns: i64) -> Result<Recording> {
    let start_ns = self.recording.summary().start_ns();
    ensure!(start_ns <= stop_ns,
            "activity cannot stop ({} ns) before it started ({} ns)",
            stop_ns,
            start_ns);

    let mut recording = self.recording;
    recording.finish(stop_rtc_ms, stop_ns);
    debug!("activity stopped with {} events", recording.events_count());
    Ok(recording)
  }
}
