// Copyright 2021 bmc::labs Gmbh. All rights reserved.
//
// Authors:
//   Florian Eich <florian@bmc-labs.com>
//   Jonas Reitemeyer <alumni@bmc-labs.com>

use super::{codec, Recording};
use eyre::{ensure, eyre, Result, WrapErr};
use log::debug;
use std::{fs,
          path::{Path, PathBuf}};


/// Extensions of files holding an encoded recording: `trk` as written by the
/// recorder, `bin` as written by the collector.
pub const EXTENSIONS: [&str; 2] = ["trk", "bin"];


impl Recording {
  // FILE FUNCTIONS -------------------------------------------------------- //
  /// Loads and decodes a recording file.
  pub fn load(path: &Path) -> Result<Self> {
    ensure!(path.exists() && path.is_file(),
            "path does not exist or is not a valid file ({})",
            path.display());
    ensure!(has_recording_extension(path),
            "only files with extensions .trk and .bin accepted ({})",
            path.display());

    let bytes = fs::read(path)?;
    let recording = codec::decode(&bytes).wrap_err_with(|| {
                                           format!("cannot decode '{}'",
                                                   path.display())
                                         })?;
    debug!("loaded {} events from '{}'",
           recording.events_count(),
           path.display());
    Ok(recording)
  }

  /// Encodes and writes the recording. If `path` is a directory the file is
  /// named after `file_name`. Returns the path written to.
  pub fn save(&self, path: &Path) -> Result<PathBuf> {
    let target = if path.is_dir() {
      path.join(self.file_name())
    } else {
      path.to_path_buf()
    };

    let bytes = codec::encode(self)?;
    fs::write(&target, &bytes).wrap_err_with(|| {
                                format!("cannot write '{}'", target.display())
                              })?;
    debug!("saved {} bytes to '{}'", bytes.len(), target.display());
    Ok(target)
  }
}


/// Lists all recording files in `dir`, sorted by name.
pub fn recordings_in(dir: &Path) -> Result<Vec<PathBuf>> {
  ensure!(dir.is_dir(), "not a directory ({})", dir.display());

  let mut paths = Vec::new();
  for entry in fs::read_dir(dir)? {
    let path = entry?.path();
    if path.is_file() && has_recording_extension(&path) {
      paths.push(path);
    }
  }
  paths.sort();
  Ok(paths)
}

/// Expands directories in `paths` to the recordings they contain, plain
/// files are taken as they are.
pub fn expand(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
  let mut expanded = Vec::new();
  for path in paths {
    if path.is_dir() {
      expanded.extend(recordings_in(path)?);
    } else if path.exists() {
      expanded.push(path.clone());
    } else {
      return Err(eyre!("no such file or directory ({})", path.display()));
    }
  }
  Ok(expanded)
}

fn has_recording_extension(path: &Path) -> bool {
  path.extension()
      .and_then(|ext| ext.to_str())
      .map(|ext| EXTENSIONS.contains(&ext))
      .unwrap_or(false)
}
