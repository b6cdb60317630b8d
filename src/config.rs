// Copyright 2021 bmc::labs Gmbh. All rights reserved.
//
// Authors:
//   Florian Eich <florian@bmc-labs.com>
//   Jonas Reitemeyer <alumni@bmc-labs.com>

use eyre::{ensure, Result, WrapErr};
use getset::{CopyGetters, Getters, Setters};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{fs,
          net::SocketAddr,
          path::{Path, PathBuf},
          time::Duration};


pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;
pub const DEFAULT_ACK_TIMEOUT_SECS: u64 = 180;


/// Settings of the receiving side of a transfer.
#[derive(Clone, Debug, PartialEq, Getters, CopyGetters, Setters, Serialize,
         Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
  #[getset(get = "pub", set = "pub")]
  bind_address: String,
  #[getset(get_copy = "pub", set = "pub")]
  port:         u16,
  #[getset(get = "pub", set = "pub")]
  output_dir:   PathBuf,
  #[getset(get = "pub", set = "pub")]
  file_prefix:  String,
}

impl Default for CollectorConfig {
  fn default() -> Self {
    Self { bind_address: "0.0.0.0".to_owned(),
           port:         DEFAULT_PORT,
           output_dir:   PathBuf::from("."),
           file_prefix:  "data_".to_owned() }
  }
}

impl CollectorConfig {
  pub fn from_json(path: &Path) -> Result<Self> {
    let config: Self = read_json(path)?;
    config.validate()?;
    Ok(config)
  }

  pub fn to_json(&self, path: &Path) -> Result<()> {
    write_json(self, path)
  }

  pub fn validate(&self) -> Result<()> {
    ensure!(self.port != 0, "collector port must not be 0");
    ensure!(!self.bind_address.is_empty(), "bind address must not be empty");
    Ok(())
  }

  pub fn socket_addr(&self) -> String {
    format!("{}:{}", self.bind_address, self.port)
  }
}


/// Settings of the sending side of a transfer.
#[derive(Clone, Debug, PartialEq, Getters, CopyGetters, Setters, Serialize,
         Deserialize)]
#[serde(default)]
pub struct UploadConfig {
  #[getset(get = "pub", set = "pub")]
  host:             String,
  #[getset(get_copy = "pub", set = "pub")]
  port:             u16,
  #[getset(get_copy = "pub", set = "pub")]
  chunk_size:       usize,
  #[getset(get_copy = "pub", set = "pub")]
  ack_timeout_secs: u64,
}

impl Default for UploadConfig {
  fn default() -> Self {
    Self { host:             "127.0.0.1".to_owned(),
           port:             DEFAULT_PORT,
           chunk_size:       DEFAULT_CHUNK_SIZE,
           ack_timeout_secs: DEFAULT_ACK_TIMEOUT_SECS }
  }
}

impl UploadConfig {
  /// Default settings pointed at a running collector.
  pub fn targeting(addr: SocketAddr) -> Self {
    Self { host: addr.ip().to_string(),
           port: addr.port(),
           ..Self::default() }
  }

  pub fn from_json(path: &Path) -> Result<Self> {
    let config: Self = read_json(path)?;
    config.validate()?;
    Ok(config)
  }

  pub fn to_json(&self, path: &Path) -> Result<()> {
    write_json(self, path)
  }

  pub fn validate(&self) -> Result<()> {
    ensure!(self.port != 0, "upload port must not be 0");
    ensure!(self.chunk_size > 0, "chunk size must be > 0");
    ensure!(self.ack_timeout_secs > 0, "ack timeout must be > 0");
    Ok(())
  }

  pub fn ack_timeout(&self) -> Duration {
    Duration::from_secs(self.ack_timeout_secs)
  }
}


fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
  let contents = fs::read_to_string(path)
    .wrap_err_with(|| format!("cannot read config '{}'", path.display()))?;
  serde_json::from_str(&contents)
    .wrap_err_with(|| format!("invalid config '{}'", path.display()))
}

fn write_json<T: Serialize>(config: &T, path: &Path) -> Result<()> {
  if let Some(parent) = path.parent() {
    if !parent.as_os_str().is_empty() {
      fs::create_dir_all(parent)?;
    }
  }
  fs::write(path, serde_json::to_string_pretty(config)?)
    .wrap_err_with(|| format!("cannot write config '{}'", path.display()))
}
