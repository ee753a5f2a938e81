//! # Stream Cipher Adapter
//!
//! XOR key-stream wrapper used by encrypted DTB files.
//!
//! The underlying stream starts with the 32-bit key (little-endian). Every
//! byte after it is XORed with the low byte of the next value of a
//! Park-Miller generator seeded with that key, so the logical stream begins
//! four bytes into the underlying one.
//!
//! ```rust
//! use std::io::{Cursor, Read, Write};
//! use dtx_codec::utils::crypto::CryptStream;
//!
//! let mut out = CryptStream::create(Cursor::new(Vec::new()), 0x1234_5678).unwrap();
//! out.write_all(b"hello").unwrap();
//!
//! let mut inner = out.into_inner();
//! inner.set_position(0);
//! let mut text = String::new();
//! CryptStream::open(inner).unwrap().read_to_string(&mut text).unwrap();
//! assert_eq!(text, "hello");
//! ```

use std::io::{self, Read, Seek, SeekFrom, Write};

use crate::config::{CRYPT_KEY_SIZE, DTB_MARKER};
use crate::error::{DtxError, Result};

const SCHRAGE_Q: i32 = 0x1F31D;
const SCHRAGE_A: i32 = 0x41A7;
const SCHRAGE_R: i32 = 0xB14;
const MODULUS: i32 = 0x7FFF_FFFF;

/// Advance the key stream by one step.
///
/// Park-Miller "minimal standard" generator computed with Schrage's method;
/// non-positive results wrap back into range.
pub fn roll(key: i32) -> i32 {
    let high = key / SCHRAGE_Q;
    let low = key.wrapping_sub(high.wrapping_mul(SCHRAGE_Q));
    let next = low
        .wrapping_mul(SCHRAGE_A)
        .wrapping_sub(high.wrapping_mul(SCHRAGE_R));
    if next <= 0 {
        next.wrapping_add(MODULUS)
    } else {
        next
    }
}

/// Random key whose low byte cannot be mistaken for a plain DTB marker.
pub fn generate_key() -> i32 {
    loop {
        let key: i32 = rand::random();
        if key as u8 != DTB_MARKER {
            return key;
        }
    }
}

/// Transparent XOR-stream over a seekable stream.
///
/// Positions reported and accepted by [`Seek`] are logical: offset 0 is the
/// first byte after the key.
#[derive(Debug)]
pub struct CryptStream<S> {
    inner: S,
    /// Underlying offset of the key
    base: u64,
    key: i32,
    /// Key stream value after `key_pos` rolls
    cur_key: i32,
    key_pos: u64,
    pos: u64,
}

impl<S: Read + Seek> CryptStream<S> {
    /// Read the key at the current position and start decrypting after it.
    pub fn open(mut inner: S) -> Result<Self> {
        let base = inner.stream_position()?;
        let mut bytes = [0u8; CRYPT_KEY_SIZE];
        inner.read_exact(&mut bytes).map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => DtxError::TruncatedInput {
                offset: base,
                need: CRYPT_KEY_SIZE,
            },
            _ => DtxError::Io(e),
        })?;
        Ok(Self::with_key(inner, base, i32::from_le_bytes(bytes)))
    }
}

impl<S: Write + Seek> CryptStream<S> {
    /// Write `key` at the current position and encrypt everything after it.
    pub fn create(mut inner: S, key: i32) -> Result<Self> {
        if key as u8 == DTB_MARKER {
            return Err(DtxError::InvalidKey(key));
        }
        let base = inner.stream_position()?;
        inner.write_all(&key.to_le_bytes())?;
        Ok(Self::with_key(inner, base, key))
    }
}

impl<S> CryptStream<S> {
    fn with_key(inner: S, base: u64, key: i32) -> Self {
        Self {
            inner,
            base,
            key,
            cur_key: key,
            key_pos: 0,
            pos: 0,
        }
    }

    pub fn key(&self) -> i32 {
        self.key
    }

    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }

    /// Bring the key stream in line with the logical position.
    fn sync_key(&mut self) {
        if self.key_pos > self.pos {
            self.cur_key = self.key;
            self.key_pos = 0;
        }
        while self.key_pos < self.pos {
            self.cur_key = roll(self.cur_key);
            self.key_pos += 1;
        }
    }

    fn apply(&mut self, buf: &mut [u8]) {
        self.sync_key();
        for byte in buf.iter_mut() {
            self.cur_key = roll(self.cur_key);
            *byte ^= self.cur_key as u8;
        }
        self.pos += buf.len() as u64;
        self.key_pos = self.pos;
    }
}

impl<S: Read> Read for CryptStream<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.apply(&mut buf[..n]);
        Ok(n)
    }
}

impl<S: Write> Write for CryptStream<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut encrypted = buf.to_vec();
        self.apply(&mut encrypted);
        self.inner.write_all(&encrypted)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<S: Seek> Seek for CryptStream<S> {
    fn seek(&mut self, target: SeekFrom) -> io::Result<u64> {
        let start = self.base + CRYPT_KEY_SIZE as u64;
        let logical = match target {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::Current(delta) => self.pos.checked_add_signed(delta),
            SeekFrom::End(delta) => {
                let end = self.inner.seek(SeekFrom::End(0))?;
                end.saturating_sub(start).checked_add_signed(delta)
            }
        };
        let Some(logical) = logical else {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek before the start of the encrypted stream",
            ));
        };
        self.inner.seek(SeekFrom::Start(start + logical))?;
        self.pos = logical;
        Ok(logical)
    }
}
