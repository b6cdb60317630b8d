// Copyright 2021 bmc::labs Gmbh. All rights reserved.
//
// Authors:
//   Florian Eich <florian@bmc-labs.com>
//   Jonas Reitemeyer <alumni@bmc-labs.com>

use pretty_assertions::assert_eq;
use std::{fs, path::Path, thread};
use trk::{codec, Acknowledgement, Collector, CollectorConfig, GeoEvent,
          HeartRateEvent, PressureEvent, Recorder, Recording, Report,
          StepsEvent, TransferRequest, UploadConfig, Uploader};


const MINUTE: i64 = 60_000_000_000;


fn record(start_rtc_ms: i64) -> Recording {
  let mut recorder = Recorder::start(start_rtc_ms, MINUTE);
  for i in 0..120i64 {
    let ts = MINUTE + i * 5_000_000_000;
    recorder.add_event(HeartRateEvent::new(ts, 90 + (i % 40) as i32, 3));
    recorder.add_event(StepsEvent::new(ts, (i * 7) as i32, 1));
    recorder.add_event(PressureEvent::new(ts, 1013.0 - i as f32 * 0.01, 2));
    recorder.add_event(GeoEvent::at(ts).with_fix_time(ts - 1, start_rtc_ms)
                                       .with_position(48.0 + i as f64 * 1e-5,
                                                      11.0,
                                                      3.0 + (i % 5) as f32)
                                       .with_altitude(500.0
                                                      + (i % 10) as f64)
                                       .with_motion(180.0, 2.0 + (i % 3) as f32)
                                       .with_accuracy(1));
  }
  // late readings after the stop
  recorder.add_event(HeartRateEvent::new(20 * MINUTE, 220, 3));
  recorder.add_event(StepsEvent::new(20 * MINUTE, 5000, 3));
  recorder.stop(start_rtc_ms + 600_000, 11 * MINUTE).unwrap()
}

fn collector(dir: &Path) -> Collector {
  let mut config = CollectorConfig::default();
  config.set_bind_address("127.0.0.1".to_owned())
        .set_port(0)
        .set_output_dir(dir.to_path_buf());
  Collector::bind(config).unwrap()
}


#[test]
fn record_encode_decode_test() {
  let recording = record(1_600_000_000_000);
  assert_eq!(482, recording.events_count());

  let bytes = codec::encode(&recording).unwrap();
  let decoded = codec::decode(&bytes).unwrap();
  assert_eq!(recording, decoded);

  let mut streamed = Vec::new();
  codec::encode_to(&decoded, &mut streamed).unwrap();
  assert_eq!(bytes, streamed);

  let report = Report::new(&decoded);
  assert_eq!(report.stored_avg_heart_rate(), report.computed_avg_heart_rate());
  assert_eq!(report.stored_max_heart_rate(), report.computed_max_heart_rate());
  assert_eq!(report.stored_total_steps(), report.computed_total_steps());
  assert_eq!(833, report.computed_total_steps());
  assert_eq!(1, report.heart_rate_out_of_scope());
  assert_eq!(1, report.steps_out_of_scope());
  assert_eq!(120, report.geo_valid());
}

#[test]
fn upload_test() {
  let dir = tempfile::tempdir().unwrap();
  let (outbox, inbox) = (dir.path().join("outbox"), dir.path().join("inbox"));
  fs::create_dir(&outbox).unwrap();
  fs::create_dir(&inbox).unwrap();

  let recordings = vec![record(1_600_000_000_000), record(1_600_000_900_000)];
  let requests: Vec<TransferRequest> =
    recordings.iter()
              .map(|recording| TransferRequest::new(recording.save(&outbox)
                                                             .unwrap()))
              .collect();

  let collector = collector(&inbox);
  let uploader =
    Uploader::new(UploadConfig::targeting(collector.local_addr().unwrap()));
  let server = thread::spawn(move || {
    (0..2).map(|_| collector.accept_one().unwrap())
          .collect::<Vec<_>>()
  });

  assert_eq!(2, uploader.send_batch(&requests, |_| {}));
  let received = server.join().unwrap();

  for (recording, received) in recordings.iter().zip(received.iter()) {
    assert!(received.is_complete());
    assert_eq!(recording, &Recording::load(received.path()).unwrap());
  }
}

#[test]
fn raw_connection_test() {
  let dir = tempfile::tempdir().unwrap();
  let collector = collector(dir.path());
  let uploader =
    Uploader::new(UploadConfig::targeting(collector.local_addr().unwrap()));

  let server = thread::spawn(move || collector.accept_one().unwrap());
  let payload = codec::encode(&record(0)).unwrap();
  let mut fractions = Vec::new();
  let ack = uploader.send_with_progress(&payload, |f| fractions.push(f))
                    .unwrap();

  assert_eq!(Acknowledgement::Confirmed, ack);
  assert_eq!(Some(&1.0), fractions.last());

  let received = server.join().unwrap();
  assert_eq!(payload.len(), received.announced());
  assert_eq!(payload, fs::read(received.path()).unwrap());
}
