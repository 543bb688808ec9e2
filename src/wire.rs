//! Wire primitives (C1): big-endian conversion helpers and bounded-buffer
//! cursors for structures whose layout can't be described by a single
//! `mod field { pub const X: Field = a..b; }` block (variable-length lists:
//! OXM fields, actions, instructions, Hello elements, multipart bodies).
//!
//! Fixed-layout headers keep using `ofpkt`'s own `field::CONST` pattern
//! module-by-module; this module only covers the incremental, list-shaped
//! case that pattern doesn't fit.

use crate::error::Error;
use byteorder::{ByteOrder, NetworkEndian};

/// A read-only cursor over a byte slice that fails with
/// [`Error::TooShort`] instead of panicking when a read runs past the end.
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Reader { buf, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn need(&self, n: usize) -> Result<(), Error> {
        if self.remaining() < n {
            Err(Error::TooShort {
                needed: n,
                available: self.remaining(),
            })
        } else {
            Ok(())
        }
    }

    pub fn read_u8(&mut self) -> Result<u8, Error> {
        self.need(1)?;
        let v = self.buf[self.pos];
        self.pos += 1;
        Ok(v)
    }

    pub fn read_u16(&mut self) -> Result<u16, Error> {
        self.need(2)?;
        let v = NetworkEndian::read_u16(&self.buf[self.pos..]);
        self.pos += 2;
        Ok(v)
    }

    pub fn read_u32(&mut self) -> Result<u32, Error> {
        self.need(4)?;
        let v = NetworkEndian::read_u32(&self.buf[self.pos..]);
        self.pos += 4;
        Ok(v)
    }

    pub fn read_u64(&mut self) -> Result<u64, Error> {
        self.need(8)?;
        let v = NetworkEndian::read_u64(&self.buf[self.pos..]);
        self.pos += 8;
        Ok(v)
    }

    /// Borrow the next `n` bytes without copying, advancing the cursor.
    pub fn take(&mut self, n: usize) -> Result<&'a [u8], Error> {
        self.need(n)?;
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Skip `n` bytes (used to consume padding).
    pub fn skip(&mut self, n: usize) -> Result<(), Error> {
        self.need(n)?;
        self.pos += n;
        Ok(())
    }

    /// The rest of the buffer, without advancing.
    pub fn rest(&self) -> &'a [u8] {
        &self.buf[self.pos..]
    }
}

/// A write-only cursor over a mutable byte slice that fails with
/// [`Error::BufferFull`] instead of panicking when a write runs past the
/// end.
pub struct Writer<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> Writer<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Writer { buf, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    fn need(&self, n: usize) -> Result<(), Error> {
        if self.buf.len() - self.pos < n {
            Err(Error::BufferFull {
                needed: n,
                available: self.buf.len() - self.pos,
            })
        } else {
            Ok(())
        }
    }

    pub fn write_u8(&mut self, v: u8) -> Result<(), Error> {
        self.need(1)?;
        self.buf[self.pos] = v;
        self.pos += 1;
        Ok(())
    }

    pub fn write_u16(&mut self, v: u16) -> Result<(), Error> {
        self.need(2)?;
        NetworkEndian::write_u16(&mut self.buf[self.pos..], v);
        self.pos += 2;
        Ok(())
    }

    pub fn write_u32(&mut self, v: u32) -> Result<(), Error> {
        self.need(4)?;
        NetworkEndian::write_u32(&mut self.buf[self.pos..], v);
        self.pos += 4;
        Ok(())
    }

    pub fn write_u64(&mut self, v: u64) -> Result<(), Error> {
        self.need(8)?;
        NetworkEndian::write_u64(&mut self.buf[self.pos..], v);
        self.pos += 8;
        Ok(())
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.need(bytes.len())?;
        self.buf[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
        Ok(())
    }

    pub fn write_zeros(&mut self, n: usize) -> Result<(), Error> {
        self.need(n)?;
        for b in &mut self.buf[self.pos..self.pos + n] {
            *b = 0;
        }
        self.pos += n;
        Ok(())
    }

    /// A mutable window onto the next `n` bytes, advancing the cursor.
    pub fn window(&mut self, n: usize) -> Result<&mut [u8], Error> {
        self.need(n)?;
        let start = self.pos;
        self.pos += n;
        Ok(&mut self.buf[start..start + n])
    }
}

/// Round `len` up to the next multiple of 8, OpenFlow's universal alignment
/// for variable-length structures (matches, actions, multipart bodies).
pub fn padded_len(len: usize) -> usize {
    (len + 7) / 8 * 8
}
