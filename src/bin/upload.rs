// Copyright 2021 bmc::labs Gmbh. All rights reserved.
//
// Authors:
//   Florian Eich <florian@bmc-labs.com>
//   Jonas Reitemeyer <alumni@bmc-labs.com>

use clap::Parser;
use env_logger::Env;
use eyre::{ensure, Result};
use std::path::PathBuf;
use trk::{storage, TransferRequest, UploadConfig, Uploader};


/// Sends TRK recordings to a collector, one connection per file.
#[derive(Parser, Debug)]
#[command(name = "trk-upload", version, long_about = None)]
struct Args {
  /// JSON file with upload settings.
  #[arg(long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Collector host.
  #[arg(long, value_name = "HOST")]
  host: Option<String>,

  /// Collector port.
  #[arg(long, value_name = "PORT")]
  port: Option<u16>,

  /// Files to send; directories expand to the .trk and .bin files in them.
  #[arg(value_name = "FILE|DIR", required = true)]
  paths: Vec<PathBuf>,
}

impl Args {
  fn upload_config(&self) -> Result<UploadConfig> {
    let mut config = match &self.config {
      Some(path) => UploadConfig::from_json(path)?,
      None => UploadConfig::default(),
    };
    if let Some(host) = &self.host {
      config.set_host(host.clone());
    }
    if let Some(port) = self.port {
      config.set_port(port);
    }
    config.validate()?;
    Ok(config)
  }
}


fn main() -> Result<()> {
  color_eyre::install()?;
  env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

  let args = Args::parse();
  let uploader = Uploader::new(args.upload_config()?);
  let requests: Vec<TransferRequest> = storage::expand(&args.paths)?
    .into_iter()
    .map(TransferRequest::new)
    .collect();

  let sent = uploader.send_batch(&requests, |fraction| {
                       eprint!("\r{:>6.1} %", fraction * 100.0)
                     });
  eprintln!();

  println!("{} of {} files sent", sent, requests.len());
  ensure!(sent == requests.len(),
          "{} files could not be sent",
          requests.len() - sent);
  Ok(())
}


#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;


  #[test]
  fn args_test() {
    let args = Args::try_parse_from(["trk-upload", "--host", "10.0.0.2",
                                     "a.trk", "inbox"]).unwrap();
    assert_eq!(vec![PathBuf::from("a.trk"), PathBuf::from("inbox")],
               args.paths);
    let config = args.upload_config().unwrap();
    assert_eq!("10.0.0.2", config.host());
    assert_eq!(8080, config.port());

    assert!(Args::try_parse_from(["trk-upload"]).is_err());
    assert!(Args::try_parse_from(["trk-upload", "--port", "0", "a.trk"])
              .unwrap()
              .upload_config()
              .is_err());
  }
}
