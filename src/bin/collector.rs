// Copyright 2021 bmc::labs Gmbh. All rights reserved.
//
// Authors:
//   Florian Eich <florian@bmc-labs.com>
//   Jonas Reitemeyer <alumni@bmc-labs.com>

use clap::Parser;
use env_logger::Env;
use eyre::{Result, WrapErr};
use log::{info, warn};
use std::{fs,
          io::{self, BufRead},
          net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, TcpStream},
          path::{Path, PathBuf},
          sync::{atomic::{AtomicBool, Ordering},
                 Arc},
          thread};
use trk::{Collector, CollectorConfig};


/// Receives TRK recordings over TCP. Type `quit` to stop.
#[derive(Parser, Debug)]
#[command(name = "trk-collector", version, long_about = None)]
struct Args {
  /// JSON file with collector settings.
  #[arg(long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Port to listen on.
  #[arg(long, value_name = "PORT")]
  port: Option<u16>,

  /// Directory received files are written to.
  #[arg(long, value_name = "DIR")]
  out: Option<PathBuf>,
}

impl Args {
  fn collector_config(&self) -> Result<CollectorConfig> {
    let mut config = match &self.config {
      Some(path) => CollectorConfig::from_json(path)?,
      None => CollectorConfig::default(),
    };
    if let Some(port) = self.port {
      config.set_port(port);
    }
    if let Some(out) = &self.out {
      config.set_output_dir(out.clone());
    }
    config.validate()?;
    Ok(config)
  }
}


/// Address to connect to in order to reach a listener bound to `addr`.
fn wake_addr(addr: SocketAddr) -> SocketAddr {
  match addr.ip() {
    IpAddr::V4(ip) if ip.is_unspecified() => {
      SocketAddr::new(Ipv4Addr::LOCALHOST.into(), addr.port())
    }
    IpAddr::V6(ip) if ip.is_unspecified() => {
      SocketAddr::new(Ipv6Addr::LOCALHOST.into(), addr.port())
    }
    _ => addr,
  }
}

/// Clears `running` once `quit` is read from stdin and wakes up the accept
/// loop. A closed stdin leaves the collector running.
fn watch_stdin(running: Arc<AtomicBool>, addr: SocketAddr) {
  for line in io::stdin().lock().lines() {
    match line {
      Ok(line) if line.trim() == "quit" => {
        info!("stopping collector");
        running.store(false, Ordering::SeqCst);
        if let Err(e) = TcpStream::connect(wake_addr(addr)) {
          warn!("cannot wake up collector: {}", e);
        }
        return;
      }
      Ok(_) => continue,
      Err(_) => return,
    }
  }
}

fn ensure_dir(dir: &Path) -> Result<()> {
  fs::create_dir_all(dir).wrap_err_with(|| {
                           format!("cannot create output directory '{}'",
                                   dir.display())
                         })
}


fn main() -> Result<()> {
  color_eyre::install()?;
  env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

  let config = Args::parse().collector_config()?;
  ensure_dir(config.output_dir())?;

  let collector = Collector::bind(config)?;
  let addr = collector.local_addr()?;
  let running = Arc::new(AtomicBool::new(true));
  {
    let running = Arc::clone(&running);
    thread::spawn(move || watch_stdin(running, addr));
  }

  collector.serve(&running);
  Ok(())
}


#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;


  #[test]
  fn args_test() {
    let args = Args::try_parse_from(["trk-collector", "--port", "9000",
                                     "--out", "inbox"]).unwrap();
    let config = args.collector_config().unwrap();
    assert_eq!(9000, config.port());
    assert_eq!(&PathBuf::from("inbox"), config.output_dir());
    assert_eq!("data_", config.file_prefix());

    assert!(Args::try_parse_from(["trk-collector", "--port"]).is_err());
    assert!(Args::try_parse_from(["trk-collector", "stray"]).is_err());
    assert!(Args::try_parse_from(["trk-collector", "--port", "x"]).is_err());
  }

  #[test]
  fn wake_addr_test() {
    let any: SocketAddr = "0.0.0.0:8080".parse().unwrap();
    assert_eq!("127.0.0.1:8080".parse::<SocketAddr>().unwrap(),
               wake_addr(any));
    let own: SocketAddr = "10.0.0.2:8080".parse().unwrap();
    assert_eq!(own, wake_addr(own));
  }
}
