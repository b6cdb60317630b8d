// Copyright 2021 bmc::labs Gmbh. All rights reserved.
//
// Authors:
//   Florian Eich <florian@bmc-labs.com>
//   Jonas Reitemeyer <alumni@bmc-labs.com>

//! Bulk transfer of encoded recordings over TCP.
//!
//! One connection carries exactly one file: the client announces the payload
//! length as a big-endian `i32`, streams the payload in arbitrary chunks and
//! waits for a single acknowledgement byte (`5`) from the server. A file
//! counts as sent once all of its bytes are written, whatever the server
//! answers.

use super::{bytes::BigEndian,
            config::{CollectorConfig, UploadConfig},
            ensure,
            fubar::{Fubar, Result}};
use chrono::Utc;
use getset::{CopyGetters, Getters};
use log::{debug, error, info, warn};
use std::{fs::{self, File},
          io::{self, BufWriter, ErrorKind, Read, Write},
          net::{SocketAddr, TcpListener, TcpStream},
          path::{Path, PathBuf},
          sync::atomic::{AtomicBool, Ordering}};


/// Value of the acknowledgement byte.
pub const ACK: u8 = 5;


/// What the client observed after sending a file.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Acknowledgement {
  Confirmed,
  Unexpected(u8),
  /// Connection closed or timed out before an answer arrived.
  Missing,
}


// CLIENT SIDE ------------------------------------------------------------- //

/// Writes the length header followed by `payload` in chunks of at most
/// `chunk_size` bytes, calling `progress` with the fraction sent after each
/// chunk.
pub fn write_transfer<W, F>(out: &mut W,
                            payload: &[u8],
                            chunk_size: usize,
                            mut progress: F)
                            -> Result<()>
  where W: Write,
        F: FnMut(f32)
{
  ensure!(payload.len() <= i32::MAX as usize,
          BadFraming,
          "payload of {} bytes exceeds the length header",
          payload.len());

  let mut header = Vec::with_capacity(4);
  (payload.len() as i32).put(&mut header);
  out.write_all(&header)?;

  if payload.is_empty() {
    progress(1.0);
  }

  let mut sent = 0;
  for chunk in payload.chunks(chunk_size.max(1)) {
    out.write_all(chunk)?;
    sent += chunk.len();
    debug!("sent {} of {} bytes", sent, payload.len());
    progress(sent as f32 / payload.len() as f32);
  }

  out.flush()?;
  Ok(())
}

/// Waits for the single acknowledgement byte. Never fails, anything but
/// `ACK` is reported through the returned value.
pub fn read_ack<R: Read>(input: &mut R) -> Acknowledgement {
  let mut ack = [0u8; 1];
  match input.read_exact(&mut ack) {
    Ok(()) if ack[0] == ACK => Acknowledgement::Confirmed,
    Ok(()) => Acknowledgement::Unexpected(ack[0]),
    Err(e) => {
      debug!("no acknowledgement: {}", e);
      Acknowledgement::Missing
    }
  }
}


/// One file queued for upload.
#[derive(Clone, Debug, PartialEq, Getters)]
#[getset(get = "pub")]
pub struct TransferRequest {
  path: PathBuf,
}

impl TransferRequest {
  pub fn new<P: AsRef<Path>>(path: P) -> Self {
    Self { path: path.as_ref().to_path_buf() }
  }
}


/// Client side of the transfer protocol.
#[derive(Clone, Debug)]
pub struct Uploader {
  config: UploadConfig,
}

impl Uploader {
  pub fn new(config: UploadConfig) -> Self {
    Self { config }
  }

  /// Sends `payload` over a fresh connection.
  pub fn send(&self, payload: &[u8]) -> Result<Acknowledgement> {
    self.send_with_progress(payload, |_| {})
  }

  pub fn send_with_progress<F>(&self,
                               payload: &[u8],
                               progress: F)
                               -> Result<Acknowledgement>
    where F: FnMut(f32)
  {
    let mut stream = TcpStream::connect((self.config.host().as_str(),
                                         self.config.port()))?;
    stream.set_read_timeout(Some(self.config.ack_timeout()))?;

    write_transfer(&mut stream,
                   payload,
                   self.config.chunk_size(),
                   progress)?;
    info!("sent {} bytes to {}:{}",
          payload.len(),
          self.config.host(),
          self.config.port());

    let ack = read_ack(&mut stream);
    match ack {
      Acknowledgement::Confirmed => debug!("transfer acknowledged"),
      Acknowledgement::Unexpected(value) => {
        warn!("unexpected acknowledgement {:#04x}", value)
      }
      Acknowledgement::Missing => warn!("transfer not acknowledged"),
    }
    Ok(ack)
  }

  /// Reads the file behind `request` and sends it.
  pub fn send_file<F>(&self,
                      request: &TransferRequest,
                      progress: F)
                      -> Result<Acknowledgement>
    where F: FnMut(f32)
  {
    let payload = fs::read(request.path())?;
    self.send_with_progress(&payload, progress)
  }

  /// Sends all `requests` one after the other, one connection each. A failing
  /// file is logged and skipped. Returns how many files were sent, `progress`
  /// receives the overall fraction in `[0, 1]`.
  pub fn send_batch<F>(&self, requests: &[TransferRequest], mut progress: F)
                       -> usize
    where F: FnMut(f32)
  {
    let total = requests.len() as f32;
    let mut sent = 0;

    for (idx, request) in requests.iter().enumerate() {
      let outcome = self.send_file(request, |fraction| {
                          progress((idx as f32 + fraction) / total)
                        });
      match outcome {
        Ok(_) => sent += 1,
        Err(e) => {
          error!("skipping '{}': {}", request.path().display(), e)
        }
      }
    }

    info!("{} of {} files sent", sent, requests.len());
    sent
  }
}


// SERVER SIDE ------------------------------------------------------------- //

/// Reads the 4 byte length header. A connection that closes early or
/// announces a negative length is rejected with `BadFraming`.
pub fn read_header<R: Read>(input: &mut R) -> Result<usize> {
  let mut header = [0u8; 4];
  input.read_exact(&mut header).map_err(|e| match e.kind() {
                                  ErrorKind::UnexpectedEof => {
                                    Fubar::framing("incomplete length header")
                                  }
                                  _ => e.into(),
                                })?;

  let announced = i32::get(&header)?;
  ensure!(announced >= 0,
          BadFraming,
          "negative length {} announced",
          announced);
  Ok(announced as usize)
}

/// Copies exactly `announced` bytes, or fewer if the peer stops early, and
/// returns how many were copied.
pub fn copy_payload<R: Read, W: Write>(input: &mut R,
                                       out: &mut W,
                                       announced: usize)
                                       -> Result<u64> {
  Ok(io::copy(&mut input.by_ref().take(announced as u64), out)?)
}


/// One file received by the collector.
#[derive(Clone, Debug, PartialEq, Getters, CopyGetters)]
pub struct Received {
  #[getset(get = "pub")]
  path:      PathBuf,
  #[getset(get_copy = "pub")]
  announced: usize,
  #[getset(get_copy = "pub")]
  received:  u64,
}

impl Received {
  pub fn is_complete(&self) -> bool {
    self.received == self.announced as u64
  }
}


/// Server side of the transfer protocol, handling one connection at a time.
#[derive(Debug)]
pub struct Collector {
  listener: TcpListener,
  config:   CollectorConfig,
}

impl Collector {
  pub fn bind(config: CollectorConfig) -> Result<Self> {
    let listener = TcpListener::bind(config.socket_addr())?;
    info!("collecting into '{}' on {}",
          config.output_dir().display(),
          listener.local_addr()?);
    Ok(Self { listener, config })
  }

  pub fn local_addr(&self) -> Result<SocketAddr> {
    Ok(self.listener.local_addr()?)
  }

  /// Waits for the next connection and handles it completely.
  pub fn accept_one(&self) -> Result<Received> {
    let (mut stream, peer) = self.listener.accept()?;
    debug!("connection from {}", peer);
    self.receive(&mut stream)
  }

  /// Accepts connections one after the other while `running` is set. The
  /// flag is checked after each accept, so whoever clears it has to connect
  /// once to wake the loop up.
  pub fn serve(&self, running: &AtomicBool) {
    for stream in self.listener.incoming() {
      if !running.load(Ordering::SeqCst) {
        break;
      }

      let outcome = stream.map_err(Fubar::from)
                          .and_then(|mut stream| self.receive(&mut stream));
      if let Err(e) = outcome {
        error!("transfer failed: {}", e);
      }
    }
    info!("collector stopped");
  }

  /// Runs the server half of one transfer on `stream`. The output file is
  /// only created once the length header is complete.
  pub fn receive<S: Read + Write>(&self, stream: &mut S) -> Result<Received> {
    let announced = read_header(stream)?;
    let path = self.output_path();
    debug!("receiving {} bytes into '{}'", announced, path.display());

    let mut out = BufWriter::new(File::create(&path)?);
    let received = copy_payload(stream, &mut out, announced)?;
    out.flush()?;

    if received != announced as u64 {
      warn!("'{}': announced {} bytes, received {}",
            path.display(),
            announced,
            received);
    }

    stream.write_all(&[ACK])?;
    stream.flush()?;
    info!("received '{}' ({} bytes)", path.display(), received);

    Ok(Received { path,
                  announced,
                  received })
  }

  /// `<prefix><unix ms>.bin` in the output directory, bumped by a millisecond
  /// until the name is free.
  fn output_path(&self) -> PathBuf {
    let mut stamp = Utc::now().timestamp_millis();
    loop {
      let name = format!("{}{}.bin", self.config.file_prefix(), stamp);
      let path = self.config.output_dir().join(name);
      if !path.exists() {
        return path;
      }
      stamp += 1;
    }
  }
}


#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;
  use std::{io::Cursor, net::Shutdown, sync::Arc, thread};


  fn collector(dir: &Path) -> Collector {
    let mut config = CollectorConfig::default();
    config.set_bind_address("127.0.0.1".to_owned())
          .set_port(0)
          .set_output_dir(dir.to_path_buf());
    Collector::bind(config).unwrap()
  }

  #[test]
  fn write_transfer_test() {
    let payload = b"0123456789";
    let mut fractions = Vec::new();
    let mut out = Vec::new();
    write_transfer(&mut out, payload, 4, |f| fractions.push(f)).unwrap();

    assert_eq!(vec![0u8, 0, 0, 10], out[..4].to_vec());
    assert_eq!(payload.to_vec(), out[4..].to_vec());
    assert_eq!(vec![0.4, 0.8, 1.0], fractions);

    let mut fractions = Vec::new();
    let mut out = Vec::new();
    write_transfer(&mut out, &[], 4, |f| fractions.push(f)).unwrap();
    assert_eq!(vec![0u8, 0, 0, 0], out);
    assert_eq!(vec![1.0], fractions);
  }

  #[test]
  fn read_ack_test() {
    assert_eq!(Acknowledgement::Confirmed, read_ack(&mut Cursor::new([5u8])));
    assert_eq!(Acknowledgement::Unexpected(6),
               read_ack(&mut Cursor::new([6u8])));
    assert_eq!(Acknowledgement::Missing,
               read_ack(&mut Cursor::new(Vec::<u8>::new())));
  }

  #[test]
  fn read_header_test() {
    assert_eq!(258, read_header(&mut Cursor::new([0u8, 0, 1, 2])).unwrap());

    match read_header(&mut Cursor::new([0u8, 0, 1])) {
      Err(Fubar::BadFraming(_)) => {}
      other => panic!("expected BadFraming, got {:?}", other),
    }
    match read_header(&mut Cursor::new([0xffu8, 0xff, 0xff, 0xff])) {
      Err(Fubar::BadFraming(_)) => {}
      other => panic!("expected BadFraming, got {:?}", other),
    }
  }

  #[test]
  fn copy_payload_test() {
    let mut input = Cursor::new(b"abcdefgh".to_vec());
    let mut out = Vec::new();
    assert_eq!(5, copy_payload(&mut input, &mut out, 5).unwrap());
    assert_eq!(b"abcde".to_vec(), out);

    let mut out = Vec::new();
    assert_eq!(3, copy_payload(&mut input, &mut out, 10).unwrap());
    assert_eq!(b"fgh".to_vec(), out);
  }

  #[test]
  fn loopback_test() {
    let dir = tempfile::tempdir().unwrap();
    let collector = collector(dir.path());
    let uploader = Uploader::new(UploadConfig::targeting(collector.local_addr()
                                                                  .unwrap()));

    let server = thread::spawn(move || collector.accept_one().unwrap());
    let payload: Vec<u8> = (0..5000u32).map(|i| (i % 251) as u8).collect();
    assert_eq!(Acknowledgement::Confirmed, uploader.send(&payload).unwrap());

    let received = server.join().unwrap();
    assert!(received.is_complete());
    assert_eq!(5000, received.announced());
    assert_eq!(payload, fs::read(received.path()).unwrap());

    let name = received.path().file_name().unwrap().to_string_lossy();
    assert!(name.starts_with("data_"));
    assert!(name.ends_with(".bin"));
  }

  #[test]
  fn incomplete_header_test() {
    let dir = tempfile::tempdir().unwrap();
    let collector = collector(dir.path());

    let mut client = TcpStream::connect(collector.local_addr().unwrap())
                       .unwrap();
    client.write_all(&[0, 0]).unwrap();
    client.shutdown(Shutdown::Write).unwrap();

    match collector.accept_one() {
      Err(Fubar::BadFraming(_)) => {}
      other => panic!("expected BadFraming, got {:?}", other),
    }
    assert_eq!(Acknowledgement::Missing, read_ack(&mut client));
    assert_eq!(0, fs::read_dir(dir.path()).unwrap().count());
  }

  #[test]
  fn short_payload_test() {
    let dir = tempfile::tempdir().unwrap();
    let collector = collector(dir.path());

    let mut client = TcpStream::connect(collector.local_addr().unwrap())
                       .unwrap();
    client.write_all(&[0, 0, 0, 8, 1, 2, 3]).unwrap();
    client.shutdown(Shutdown::Write).unwrap();

    let received = collector.accept_one().unwrap();
    assert!(!received.is_complete());
    assert_eq!(3, received.received());
    assert_eq!(vec![1u8, 2, 3], fs::read(received.path()).unwrap());
    assert_eq!(Acknowledgement::Confirmed, read_ack(&mut client));
  }

  #[test]
  fn send_batch_test() {
    let dir = tempfile::tempdir().unwrap();
    let inbox = dir.path().join("inbox");
    fs::create_dir(&inbox).unwrap();
    let collector = collector(&inbox);
    let uploader = Uploader::new(UploadConfig::targeting(collector.local_addr()
                                                                  .unwrap()));

    let first = dir.path().join("first.trk");
    let second = dir.path().join("second.trk");
    fs::write(&first, vec![1u8; 300]).unwrap();
    fs::write(&second, vec![2u8; 100]).unwrap();
    let requests = vec![TransferRequest::new(&first),
                        TransferRequest::new(dir.path().join("missing.trk")),
                        TransferRequest::new(&second)];

    let server = thread::spawn(move || {
      (0..2).map(|_| collector.accept_one().unwrap())
            .collect::<Vec<_>>()
    });

    let mut fractions = Vec::new();
    assert_eq!(2, uploader.send_batch(&requests, |f| fractions.push(f)));

    let received = server.join().unwrap();
    assert_eq!(300, received[0].received());
    assert_eq!(100, received[1].received());
    assert_ne!(received[0].path(), received[1].path());
    assert_eq!(Some(&1.0), fractions.last());
    assert!(fractions.iter().all(|f| *f > 0.0 && *f <= 1.0));
  }

  #[test]
  fn serve_test() {
    let dir = tempfile::tempdir().unwrap();
    let collector = collector(dir.path());
    let addr = collector.local_addr().unwrap();
    let running = Arc::new(AtomicBool::new(true));
    let server = {
      let running = Arc::clone(&running);
      thread::spawn(move || collector.serve(&running))
    };

    // a broken connection is dropped and the loop keeps accepting
    let mut broken = TcpStream::connect(addr).unwrap();
    broken.write_all(&[0, 0]).unwrap();
    broken.shutdown(Shutdown::Write).unwrap();
    assert_eq!(Acknowledgement::Missing, read_ack(&mut broken));

    let uploader = Uploader::new(UploadConfig::targeting(addr));
    assert_eq!(Acknowledgement::Confirmed, uploader.send(&[9; 33]).unwrap());

    let files: Vec<PathBuf> = fs::read_dir(dir.path()).unwrap()
                                                      .map(|e| e.unwrap().path())
                                                      .collect();
    assert_eq!(1, files.len());
    assert_eq!(vec![9u8; 33], fs::read(&files[0]).unwrap());

    running.store(false, Ordering::SeqCst);
    TcpStream::connect(addr).unwrap();
    server.join().unwrap();
    assert_eq!(1, fs::read_dir(dir.path()).unwrap().count());
  }

  #[test]
  fn sent_without_ack_test() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let server = thread::spawn(move || {
      let mut payloads = Vec::new();
      for answer in vec![Some(7u8), None, Some(7), None] {
        let (mut stream, _) = listener.accept().unwrap();
        let announced = read_header(&mut stream).unwrap();
        let mut payload = Vec::new();
        copy_payload(&mut stream, &mut payload, announced).unwrap();
        if let Some(answer) = answer {
          stream.write_all(&[answer]).unwrap();
        }
        payloads.push(payload);
      }
      payloads
    });

    let uploader = Uploader::new(UploadConfig::targeting(addr));
    assert_eq!(Acknowledgement::Unexpected(7),
               uploader.send(b"first").unwrap());
    assert_eq!(Acknowledgement::Missing, uploader.send(b"second").unwrap());

    let dir = tempfile::tempdir().unwrap();
    let (third, fourth) = (dir.path().join("3.trk"), dir.path().join("4.trk"));
    fs::write(&third, b"third").unwrap();
    fs::write(&fourth, b"fourth").unwrap();
    let requests = vec![TransferRequest::new(&third),
                        TransferRequest::new(&fourth)];
    assert_eq!(2, uploader.send_batch(&requests, |_| {}));

    let payloads = server.join().unwrap();
    assert_eq!(b"first".to_vec(), payloads[0]);
    assert_eq!(b"fourth".to_vec(), payloads[3]);
  }
}
