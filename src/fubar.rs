// Copyright 2021 bmc::labs Gmbh. All rights reserved.
//
// Authors:
//   Florian Eich <florian@bmc-labs.com>
//   Jonas Reitemeyer <alumni@bmc-labs.com>

use std::{error, fmt, io, result};


/// trk's result type `Result`, used by every decoding, encoding and transfer
/// operation of the library.
pub type Result<T> = result::Result<T, Fubar>;


#[derive(Clone, Debug, PartialEq)]
/// Errors bubbled up from the codec and transfer layers.
///
/// Every decoding failure is fatal to the decode operation it occurred in, no
/// partially populated `Recording` is ever returned alongside one of these.
///
/// FUBAR: Fucked Up Beyond All {Recognition, Repair, Reason}
pub enum Fubar {
  /// Fewer bytes available than a fixed-width or length-prefixed field needs.
  TruncatedInput(String),
  /// Missing field marker or malformed length prefix.
  BadFraming(String),
  /// The file does not start with the TRK header.
  BadMagic,
  /// The version tag following the header is not supported.
  UnsupportedVersion(u16),
  /// Underlying transport or storage failure.
  Io(String),
}

impl Fubar {
  pub fn truncated(msg: &str) -> Self {
    Self::TruncatedInput(msg.to_string())
  }

  pub fn framing(msg: &str) -> Self {
    Self::BadFraming(msg.to_string())
  }
}

/// The following traits - `fmt::Display` and `error::Error` - are required in
/// addition to deriving the `Debug` trait for `Fubar` to implement the
/// `error::Error` trait fully.
impl fmt::Display for Fubar {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      Self::TruncatedInput(msg) => write!(f, "truncated input: {}", msg),
      Self::BadFraming(msg) => write!(f, "bad framing: {}", msg),
      Self::BadMagic => write!(f, "unknown file format (header mismatch)"),
      Self::UnsupportedVersion(version) => {
        write!(f, "unsupported version no. {}", version)
      }
      Self::Io(msg) => write!(f, "i/o error: {}", msg),
    }
  }
}

impl error::Error for Fubar {}

/// A premature end of stream is what `read_exact` reports when a field is cut
/// short, so it is folded into `TruncatedInput`. Anything else is a genuine
/// transport or storage problem.
impl From<io::Error> for Fubar {
  fn from(error: io::Error) -> Self {
    match error.kind() {
      io::ErrorKind::UnexpectedEof => Self::TruncatedInput(error.to_string()),
      _ => Self::Io(error.to_string()),
    }
  }
}


/// The `fubar!` macro provides an easy way to return formatted errors
/// from functions returning a `Result`. It takes the `Fubar` variant to use
/// and something which can be formatted using the `format!` macro:
///
/// ```ignore
/// match something {
///   Ok(()) => Ok(()),  // the world is a happy place
///   Err(err) => fubar!(BadFraming, "length {} is too large", err),
/// }
/// ```
#[macro_export]
macro_rules! fubar {
  ($variant:ident, $($arg:tt)*) => {
    Err($crate::Fubar::$variant(format!($($arg)*)))
  }
}


/// The `ensure!` macro provides and easy way to make sure a condition is true,
/// and if not, return an `Err(Fubar)` (exactly as `fubar!` does - `ensure!` is
/// actually implemented on top of `fubar!`). Use it as follows:
///
/// ```ignore
/// fn read_tag(payload: &[u8]) -> Result<u16> {
///   ensure!(payload.len() >= 2, TruncatedInput, "only {} bytes", payload.len());
/// }
/// ```
#[macro_export]
macro_rules! ensure {
  ($cond:expr, $variant:ident, $($arg:tt)*) => {
    if !($cond) { return $crate::fubar!($variant, $($arg)*) }
  }
}
