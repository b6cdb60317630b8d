// Copyright 2021 bmc::labs Gmbh. All rights reserved.
//
// Authors:
//   Florian Eich <florian@bmc-labs.com>
//   Jonas Reitemeyer <alumni@bmc-labs.com>

use super::{ensure, fubar::Result};


/// Fixed-width numeric value with a big-endian binary representation.
///
/// Floats and doubles travel as their raw IEEE 754 bits, i.e. NaN payloads,
/// the sign of zero and infinities survive a round trip unchanged.
pub trait BigEndian: Sized + Copy {
  const WIDTH: usize;

  /// Appends the big-endian representation of `self` to `buf`.
  fn put(self, buf: &mut Vec<u8>);

  /// Reads a value from the first `WIDTH` bytes of `bytes`.
  fn get(bytes: &[u8]) -> Result<Self>;
}


/// This macro - internal use only - generates the implementation of the
/// `BigEndian` trait for a given list of primitive types.
macro_rules! implement_big_endian {
  ($($Type:ty),*) => {$(
    impl BigEndian for $Type {
      const WIDTH: usize = std::mem::size_of::<$Type>();

      fn put(self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.to_be_bytes());
      }

      fn get(bytes: &[u8]) -> Result<Self> {
        ensure!(bytes.len() >= Self::WIDTH,
                TruncatedInput,
                "{} needs {} bytes, {} available",
                stringify!($Type),
                Self::WIDTH,
                bytes.len());

        let mut raw = [0u8; std::mem::size_of::<$Type>()];
        raw.copy_from_slice(&bytes[..Self::WIDTH]);
        Ok(<$Type>::from_be_bytes(raw))
      }
    }
  )*}
}

implement_big_endian!(i16, u16, i32, u32, i64);

impl BigEndian for f32 {
  const WIDTH: usize = 4;

  fn put(self, buf: &mut Vec<u8>) {
    self.to_bits().put(buf);
  }

  fn get(bytes: &[u8]) -> Result<Self> {
    Ok(f32::from_bits(u32::get(bytes)?))
  }
}

impl BigEndian for f64 {
  const WIDTH: usize = 8;

  fn put(self, buf: &mut Vec<u8>) {
    (self.to_bits() as i64).put(buf);
  }

  fn get(bytes: &[u8]) -> Result<Self> {
    Ok(f64::from_bits(i64::get(bytes)? as u64))
  }
}


/// Sequential reader over a byte slice, handing out big-endian values.
#[derive(Debug)]
pub struct ByteReader<'a> {
  bytes: &'a [u8],
  pos:   usize,
}

impl<'a> ByteReader<'a> {
  pub fn new(bytes: &'a [u8]) -> Self {
    Self { bytes, pos: 0 }
  }

  /// Reads the next value, failing with `TruncatedInput` if the remaining
  /// bytes are too few. The position is only advanced on success.
  pub fn read<T: BigEndian>(&mut self) -> Result<T> {
    let value = T::get(&self.bytes[self.pos..])?;
    self.pos += T::WIDTH;
    Ok(value)
  }

  pub fn remaining(&self) -> usize {
    self.bytes.len() - self.pos
  }
}
