// Copyright 2021 bmc::labs Gmbh. All rights reserved.
//
// Authors:
//   Florian Eich <florian@bmc-labs.com>
//   Jonas Reitemeyer <alumni@bmc-labs.com>

use clap::Parser;
use env_logger::Env;
use eyre::Result;
use std::path::PathBuf;
use trk::{storage, Recording, Report};


/// Prints the summary of TRK recordings, stored next to recomputed values.
#[derive(Parser, Debug)]
#[command(name = "trk-info", version, long_about = None)]
struct Args {
  /// Print one JSON object per recording.
  #[arg(long, default_value_t = false)]
  json: bool,

  /// Files to read; directories expand to the .trk and .bin files in them.
  #[arg(value_name = "FILE|DIR", required = true)]
  paths: Vec<PathBuf>,
}


fn main() -> Result<()> {
  color_eyre::install()?;
  env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

  let args = Args::parse();
  for path in storage::expand(&args.paths)? {
    let report = Report::new(&Recording::load(&path)?);
    if args.json {
      println!("{}", serde_json::to_string(&report)?);
    } else {
      println!("{}\n{}\n", path.display(), report);
    }
  }
  Ok(())
}


#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;


  #[test]
  fn args_test() {
    let args = Args::try_parse_from(["trk-info", "--json", "a.bin"]).unwrap();
    assert!(args.json);
    assert_eq!(vec![PathBuf::from("a.bin")], args.paths);

    assert!(!Args::try_parse_from(["trk-info", "a.bin"]).unwrap().json);
    assert!(Args::try_parse_from(["trk-info", "--json"]).is_err());
  }
}
