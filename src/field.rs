// Copyright 2021 bmc::labs Gmbh. All rights reserved.
//
// Authors:
//   Florian Eich <florian@bmc-labs.com>
//   Jonas Reitemeyer <alumni@bmc-labs.com>

//! Self-delimiting field framing.
//!
//! A field is one marker byte (`#`), the total payload length as big-endian
//! `u32`, then the payload verbatim. The payload may be handed in as several
//! byte slices which are written back to back without any separator, it is
//! up to the reader to interpret them.

use super::{bytes::BigEndian, ensure, fubar::Result};
use std::io::{Read, Write};


/// Start indicator of every field.
pub const MARKER: u8 = b'#';

/// Upper bound for the payload length accepted by `read_field`. The largest
/// field in the current tag vocabulary is well below 100 bytes.
pub const MAX_FIELD_LEN: usize = 1024 * 1024;


/// Writes one field containing all `parts` concatenated.
pub fn write_field<W: Write>(out: &mut W, parts: &[&[u8]]) -> Result<()> {
  let total: usize = parts.iter().map(|part| part.len()).sum();
  ensure!(total <= u32::MAX as usize,
          BadFraming,
          "payload of {} bytes does not fit a field",
          total);

  let mut header = Vec::with_capacity(5);
  header.push(MARKER);
  (total as u32).put(&mut header);
  out.write_all(&header)?;

  for part in parts {
    out.write_all(part)?;
  }
  Ok(())
}

/// Reads one field and returns its payload.
///
/// Fails with `BadFraming` if the marker is missing or the announced length
/// exceeds `MAX_FIELD_LEN`, and with `TruncatedInput` if the stream ends
/// before the header or the payload is complete.
pub fn read_field<R: Read>(input: &mut R) -> Result<Vec<u8>> {
  let mut marker = [0u8; 1];
  input.read_exact(&mut marker)?;
  ensure!(marker[0] == MARKER,
          BadFraming,
          "beginning of a field not found (got {:#04x})",
          marker[0]);

  let mut length = [0u8; 4];
  input.read_exact(&mut length)?;
  let length = u32::get(&length)? as usize;
  ensure!(length <= MAX_FIELD_LEN,
          BadFraming,
          "field length {} exceeds maximum of {}",
          length,
          MAX_FIELD_LEN);

  // read through `take` so a lying length never allocates more than what
  // actually arrives
  let mut payload = Vec::new();
  input.by_ref().take(length as u64).read_to_end(&mut payload)?;
  ensure!(payload.len() == length,
          TruncatedInput,
          "premature end of field, expected {} bytes, got {}",
          length,
          payload.len());

  Ok(payload)
}
