//! Bounds-checked cursor over a byte slice.
//!
//! Every read either returns exactly the requested number of bytes or fails
//! with [`TxError::MalformedInput`] without moving the cursor.

use crate::error::{Result, TxError};

#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    /// Number of bytes consumed so far.
    pub fn position(&self) -> usize {
        self.offset
    }

    /// Number of bytes left to read.
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.offset
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let byte = *self.bytes.get(self.offset).ok_or_else(|| {
            TxError::MalformedInput(format!(
                "unexpected end of input at offset {}",
                self.offset
            ))
        })?;
        self.offset += 1;
        Ok(byte)
    }

    /// Read exactly `len` bytes.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(TxError::MalformedInput(format!(
                "need {len} bytes at offset {}, only {} available",
                self.offset,
                self.remaining()
            )));
        }
        let out = &self.bytes[self.offset..self.offset + len];
        self.offset += len;
        Ok(out)
    }

    /// Read a fixed-size field such as a key, hash or signature.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let slice = self.read_bytes(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        Ok(out)
    }

    /// Consume everything that is left.
    pub fn read_remaining(&mut self) -> &'a [u8] {
        let out = &self.bytes[self.offset..];
        self.offset = self.bytes.len();
        out
    }
}
