// Copyright 2021 bmc::labs Gmbh. All rights reserved.
//
// Authors:
//   Florian Eich <florian@bmc-labs.com>
//   Jonas Reitemeyer <alumni@bmc-labs.com>

//! Recording, encoding and transfer of sport activities.
//!
//! Sensor events are collected by a `Recorder`, which keeps live statistics
//! and, once stopped, hands out a `Recording` with its summary fixed. The
//! `codec` turns recordings into the TRK binary format and back, `transfer`
//! moves encoded files between an `Uploader` and a `Collector`.

mod fubar;

pub mod aggregator;
pub mod bytes;
pub mod codec;
pub mod config;
pub mod event;
pub mod field;
pub mod recorder;
pub mod recording;
pub mod report;
pub mod storage;
pub mod summary;
pub mod transfer;

pub use aggregator::{ActivityAggregator, ActivityStats, Scope};
pub use config::{CollectorConfig, UploadConfig};
pub use event::{GeoEvent, HeartRateEvent, PressureEvent, SensorEvent,
                StepsEvent};
pub use fubar::{Fubar, Result};
pub use recorder::Recorder;
pub use recording::Recording;
pub use report::Report;
pub use summary::ActivitySummary;
pub use transfer::{Acknowledgement, Collector, Received, TransferRequest,
                   Uploader};
