// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Thin composable byte-level I/O. Every format parser consumes exclusively the
//! [`ByteReader`] wrapper defined here; none of them touch `std::io` directly.

use std::io::{Cursor, Read, Seek, SeekFrom};

use crate::error::{Error, Result};

/// Anything a [`ByteReader`] can be built from: a random-access, readable byte source.
pub trait MediaSource: Read + Seek {}

impl<T: Read + Seek> MediaSource for T {}

/// A seekable byte source with the handful of read primitives every container parser needs.
///
/// `ByteReader` never interprets the bytes it hands back; decoding integers, strings, and
/// sub-structures is left to the format parsers built on top of it.
pub struct ByteReader {
    inner: Box<dyn MediaSource>,
    size: u64,
}

impl ByteReader {
    /// Wraps an existing reader, determining its size by seeking to the end and back.
    pub fn new(mut inner: Box<dyn MediaSource>) -> Result<Self> {
        let size = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(0))?;
        Ok(ByteReader { inner, size })
    }

    /// Wraps an in-memory byte buffer.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        let size = bytes.len() as u64;
        ByteReader { inner: Box::new(Cursor::new(bytes)), size }
    }

    /// Total length of the source in bytes, fixed at construction time.
    pub fn len(&self) -> u64 {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Current stream position.
    pub fn pos(&mut self) -> Result<u64> {
        Ok(self.inner.stream_position()?)
    }

    pub fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        Ok(self.inner.seek(pos)?)
    }

    /// Reads up to `buf.len()` bytes, returning the number actually read (0 at EOF).
    pub fn read_buf(&mut self, buf: &mut [u8]) -> Result<usize> {
        Ok(self.inner.read(buf)?)
    }

    /// Reads exactly `buf.len()` bytes or fails with [`Error::Parse`].
    pub fn read_buf_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        self.inner.read_exact(buf).map_err(|err| match err.kind() {
            std::io::ErrorKind::UnexpectedEof => {
                Error::Parse("unexpected end of file".to_string())
            }
            _ => Error::Io(err),
        })
    }

    /// Reads exactly `len` bytes into a fresh `Vec`.
    pub fn read_vec(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.read_buf_exact(&mut buf)?;
        Ok(buf)
    }

    /// Reads up to `len` bytes without advancing the stream position.
    pub fn peek(&mut self, len: usize) -> Result<Vec<u8>> {
        let start = self.pos()?;
        let mut buf = vec![0u8; len];
        let n = {
            let mut read = 0;
            while read < buf.len() {
                let got = self.read_buf(&mut buf[read..])?;
                if got == 0 {
                    break;
                }
                read += got;
            }
            read
        };
        buf.truncate(n);
        self.seek(SeekFrom::Start(start))?;
        Ok(buf)
    }

    pub fn skip(&mut self, count: u64) -> Result<()> {
        self.seek(SeekFrom::Current(count as i64))?;
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let mut b = [0u8; 1];
        self.read_buf_exact(&mut b)?;
        Ok(b[0])
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_u16le(&mut self) -> Result<u16> {
        let mut b = [0u8; 2];
        self.read_buf_exact(&mut b)?;
        Ok(u16::from_le_bytes(b))
    }

    pub fn read_u16be(&mut self) -> Result<u16> {
        let mut b = [0u8; 2];
        self.read_buf_exact(&mut b)?;
        Ok(u16::from_be_bytes(b))
    }

    pub fn read_i16be(&mut self) -> Result<i16> {
        Ok(self.read_u16be()? as i16)
    }

    pub fn read_u24be(&mut self) -> Result<u32> {
        let mut b = [0u8; 3];
        self.read_buf_exact(&mut b)?;
        Ok(u32::from_be_bytes([0, b[0], b[1], b[2]]))
    }

    pub fn read_u32le(&mut self) -> Result<u32> {
        let mut b = [0u8; 4];
        self.read_buf_exact(&mut b)?;
        Ok(u32::from_le_bytes(b))
    }

    pub fn read_u32be(&mut self) -> Result<u32> {
        let mut b = [0u8; 4];
        self.read_buf_exact(&mut b)?;
        Ok(u32::from_be_bytes(b))
    }

    pub fn read_i32be(&mut self) -> Result<i32> {
        Ok(self.read_u32be()? as i32)
    }

    pub fn read_i32le(&mut self) -> Result<i32> {
        Ok(self.read_u32le()? as i32)
    }

    pub fn read_u64le(&mut self) -> Result<u64> {
        let mut b = [0u8; 8];
        self.read_buf_exact(&mut b)?;
        Ok(u64::from_le_bytes(b))
    }

    pub fn read_u64be(&mut self) -> Result<u64> {
        let mut b = [0u8; 8];
        self.read_buf_exact(&mut b)?;
        Ok(u64::from_be_bytes(b))
    }

    pub fn read_i64be(&mut self) -> Result<i64> {
        Ok(self.read_u64be()? as i64)
    }
}
