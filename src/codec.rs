// Copyright 2021 bmc::labs Gmbh. All rights reserved.
//
// Authors:
//   Florian Eich <florian@bmc-labs.com>
//   Jonas Reitemeyer <alumni@bmc-labs.com>

//! TRK file format.
//!
//! A file starts with the 20 byte ASCII `HEADER` and the big-endian `u16`
//! `VERSION`, followed by framed fields (see `field`). Every field payload
//! starts with a two byte tag. Tags below `0x2000` carry summary values and
//! come first, tags from `0x2000` on carry events. A single `tag::END` field
//! terminates the stream. Unknown tags are skipped.

use super::{bytes::{BigEndian, ByteReader},
            field,
            fubar::{Fubar, Result},
            GeoEvent,
            HeartRateEvent,
            PressureEvent,
            Recording,
            StepsEvent};
use log::debug;
use std::io::{Read, Write};


/// Identifies a TRK file.
pub const HEADER: &[u8; 20] = b"//MILTSCHEK/TRACKER/";

/// The implemented version of the file format.
pub const VERSION: u16 = 2;


/// Field tags of the TRK format.
pub mod tag {
  pub const START_RTC: u16 = 0x1001;
  pub const STOP_RTC: u16 = 0x1002;
  pub const START_NS: u16 = 0x1003;
  pub const STOP_NS: u16 = 0x1004;
  pub const AVG_HEART_RATE: u16 = 0x1011;
  pub const MAX_HEART_RATE: u16 = 0x1012;
  pub const TOTAL_STEPS: u16 = 0x1013;
  pub const AVG_STEP_RATE: u16 = 0x1014;
  pub const TOTAL_ASCENT: u16 = 0x1015;
  pub const TOTAL_DESCENT: u16 = 0x1016;
  pub const AVG_SPEED: u16 = 0x1017;

  // 2 = event, 0 = n/a, 1..4 = event type, 1 = first version of the event
  pub const HEART_RATE_EVENT: u16 = 0x2011;
  pub const STEPS_EVENT: u16 = 0x2021;
  pub const PRESSURE_EVENT: u16 = 0x2031;
  pub const GEO_EVENT: u16 = 0x2041;

  pub const END: u16 = 0xffff;

  /// Tags from here on carry events.
  pub const FIRST_EVENT: u16 = 0x2000;
}


/// Builds the payload of a single field, starting with its tag.
struct Payload(Vec<u8>);

impl Payload {
  fn tagged(id: u16) -> Self {
    let mut buf = Vec::with_capacity(72);
    id.put(&mut buf);
    Self(buf)
  }

  fn with<T: BigEndian>(mut self, value: T) -> Self {
    value.put(&mut self.0);
    self
  }

  fn write_to<W: Write>(self, out: &mut W) -> Result<()> {
    field::write_field(out, &[&self.0])
  }
}


/// Encodes `recording` into a new buffer.
pub fn encode(recording: &Recording) -> Result<Vec<u8>> {
  let mut buf = Vec::new();
  encode_to(recording, &mut buf)?;
  Ok(buf)
}

/// Encodes `recording` into `out`: header, version, all summary fields, then
/// all events per type in arrival order, then the end marker.
pub fn encode_to<W: Write>(recording: &Recording, out: &mut W) -> Result<()> {
  out.write_all(HEADER)?;
  out.write_all(&VERSION.to_be_bytes())?;

  let summary = recording.summary();
  Payload::tagged(tag::START_RTC).with(summary.start_rtc_ms())
                                 .write_to(out)?;
  Payload::tagged(tag::STOP_RTC).with(summary.stop_rtc_ms())
                                .write_to(out)?;
  Payload::tagged(tag::START_NS).with(summary.start_ns())
                                .write_to(out)?;
  Payload::tagged(tag::STOP_NS).with(summary.stop_ns())
                               .write_to(out)?;
  Payload::tagged(tag::AVG_HEART_RATE).with(summary.avg_heart_rate())
                                      .write_to(out)?;
  Payload::tagged(tag::MAX_HEART_RATE).with(summary.max_heart_rate())
                                      .write_to(out)?;
  Payload::tagged(tag::TOTAL_STEPS).with(summary.total_steps())
                                   .write_to(out)?;
  Payload::tagged(tag::AVG_STEP_RATE).with(summary.avg_step_rate())
                                     .write_to(out)?;
  Payload::tagged(tag::TOTAL_ASCENT).with(summary.total_ascent_m())
                                    .write_to(out)?;
  Payload::tagged(tag::TOTAL_DESCENT).with(summary.total_descent_m())
                                     .write_to(out)?;
  Payload::tagged(tag::AVG_SPEED).with(summary.avg_speed_mps())
                                 .write_to(out)?;

  for event in recording.heart_rate_events() {
    Payload::tagged(tag::HEART_RATE_EVENT).with(event.timestamp_ns())
                                          .with(event.rate_bpm())
                                          .with(event.accuracy())
                                          .write_to(out)?;
  }

  for event in recording.steps_events() {
    Payload::tagged(tag::STEPS_EVENT).with(event.timestamp_ns())
                                     .with(event.cumulative_steps())
                                     .with(event.accuracy())
                                     .write_to(out)?;
  }

  for event in recording.pressure_events() {
    Payload::tagged(tag::PRESSURE_EVENT).with(event.timestamp_ns())
                                        .with(event.pressure_hpa())
                                        .with(event.accuracy())
                                        .write_to(out)?;
  }

  for event in recording.geo_events() {
    Payload::tagged(tag::GEO_EVENT).with(event.timestamp_ns())
                                   .with(event.fix_ts_ns())
                                   .with(event.fix_rtc_ms())
                                   .with(event.latitude())
                                   .with(event.longitude())
                                   .with(event.lateral_accuracy_m())
                                   .with(event.altitude_m())
                                   .with(event.bearing_deg())
                                   .with(event.speed_mps())
                                   .with(event.accuracy())
                                   .write_to(out)?;
  }

  Payload::tagged(tag::END).write_to(out)?;
  out.flush()?;
  Ok(())
}


/// Decodes a complete recording from `bytes`. Bytes following the end
/// marker are ignored.
pub fn decode(bytes: &[u8]) -> Result<Recording> {
  let mut input = bytes;
  decode_from(&mut input)
}

/// Decodes a complete recording from `input`, reading up to and including
/// the end marker.
///
/// Fails without returning any partial data on a wrong header
/// (`BadMagic`), a version other than `VERSION` (`UnsupportedVersion`),
/// broken field framing (`BadFraming`) or if the input ends before the end
/// marker (`TruncatedInput`).
pub fn decode_from<R: Read>(input: &mut R) -> Result<Recording> {
  let mut header = [0u8; 20];
  input.read_exact(&mut header)?;
  if &header != HEADER {
    return Err(Fubar::BadMagic);
  }

  let mut version = [0u8; 2];
  input.read_exact(&mut version)?;
  let version = u16::get(&version)?;
  if version != VERSION {
    return Err(Fubar::UnsupportedVersion(version));
  }

  let mut recording = Recording::default();
  loop {
    let payload = field::read_field(input)?;
    let mut reader = ByteReader::new(&payload);
    let id = reader.read::<u16>()?;

    if id == tag::END {
      break;
    }
    decode_field(id, &mut reader, &mut recording)?;
  }

  debug!("decoded recording with {} events", recording.events_count());
  Ok(recording)
}

fn decode_field(id: u16,
                reader: &mut ByteReader,
                recording: &mut Recording)
                -> Result<()> {
  match id {
    tag::START_RTC => {
      recording.summary_mut().set_start_rtc_ms(reader.read()?);
    }
    tag::STOP_RTC => {
      recording.summary_mut().set_stop_rtc_ms(reader.read()?);
    }
    tag::START_NS => {
      recording.summary_mut().set_start_ns(reader.read()?);
    }
    tag::STOP_NS => {
      recording.summary_mut().set_stop_ns(reader.read()?);
    }
    tag::AVG_HEART_RATE => {
      recording.summary_mut().set_avg_heart_rate(reader.read()?);
    }
    tag::MAX_HEART_RATE => {
      recording.summary_mut().set_max_heart_rate(reader.read()?);
    }
    tag::TOTAL_STEPS => {
      recording.summary_mut().set_total_steps(reader.read()?);
    }
    tag::AVG_STEP_RATE => {
      recording.summary_mut().set_avg_step_rate(reader.read()?);
    }
    tag::TOTAL_ASCENT => {
      recording.summary_mut().set_total_ascent_m(reader.read()?);
    }
    tag::TOTAL_DESCENT => {
      recording.summary_mut().set_total_descent_m(reader.read()?);
    }
    tag::AVG_SPEED => {
      recording.summary_mut().set_avg_speed_mps(reader.read()?);
    }
    tag::HEART_RATE_EVENT => {
      recording.push(HeartRateEvent::new(reader.read()?,
                                         reader.read()?,
                                         reader.read()?));
    }
    tag::STEPS_EVENT => {
      recording.push(StepsEvent::new(reader.read()?,
                                     reader.read()?,
                                     reader.read()?));
    }
    tag::PRESSURE_EVENT => {
      recording.push(PressureEvent::new(reader.read()?,
                                        reader.read()?,
                                        reader.read()?));
    }
    tag::GEO_EVENT => {
      let geo = GeoEvent::at(reader.read()?).with_fix_time(reader.read()?,
                                                           reader.read()?)
                                            .with_position(reader.read()?,
                                                           reader.read()?,
                                                           reader.read()?)
                                            .with_altitude(reader.read()?)
                                            .with_motion(reader.read()?,
                                                         reader.read()?)
                                            .with_accuracy(reader.read()?);
      recording.push(geo);
    }
    unknown => {
      debug!("skipping unknown {} tag {:#06x} ({} bytes)",
             if unknown < tag::FIRST_EVENT { "summary" } else { "event" },
             unknown,
             reader.remaining());
    }
  }
  Ok(())
}
