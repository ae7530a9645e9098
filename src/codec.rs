//! Big-endian scalar codec (spec §4.A). No allocation beyond the backing buffer.

use crate::error::{VoltError, VoltResult};
use byteorder::{BigEndian, ByteOrder, WriteBytesExt};

/// A growable, append-only output buffer for big-endian scalars.
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    #[must_use]
    pub fn with_capacity(cap: usize) -> Self {
        Self { buf: Vec::with_capacity(cap) }
    }

    pub fn write_i8(&mut self, v: i8) -> VoltResult<()> {
        self.buf.write_i8(v)?;
        Ok(())
    }

    pub fn write_u8(&mut self, v: u8) -> VoltResult<()> {
        self.buf.write_u8(v)?;
        Ok(())
    }

    pub fn write_i16(&mut self, v: i16) -> VoltResult<()> {
        self.buf.write_i16::<BigEndian>(v)?;
        Ok(())
    }

    pub fn write_i32(&mut self, v: i32) -> VoltResult<()> {
        self.buf.write_i32::<BigEndian>(v)?;
        Ok(())
    }

    pub fn write_i64(&mut self, v: i64) -> VoltResult<()> {
        self.buf.write_i64::<BigEndian>(v)?;
        Ok(())
    }

    pub fn write_u64(&mut self, v: u64) -> VoltResult<()> {
        self.buf.write_u64::<BigEndian>(v)?;
        Ok(())
    }

    /// Writes the raw bit pattern of an f64, so null sentinels round-trip exactly.
    pub fn write_f64_bits(&mut self, bits: u64) -> VoltResult<()> {
        self.write_u64(bits)
    }

    pub fn write_bytes(&mut self, b: &[u8]) -> VoltResult<()> {
        self.buf.extend_from_slice(b);
        Ok(())
    }

    /// 4-byte big-endian length prefix followed by UTF-8 bytes. No size
    /// ceiling is enforced here; callers that must bound string length
    /// (parameters) validate before calling this.
    pub fn write_string(&mut self, s: &str) -> VoltResult<()> {
        self.write_i32(s.len() as i32)?;
        self.write_bytes(s.as_bytes())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<u8> {
        self.buf
    }
}

/// A cursor over a borrowed byte slice, advancing as scalars are read.
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }

    fn take(&mut self, n: usize) -> VoltResult<&'a [u8]> {
        if self.remaining() < n {
            return Err(VoltError::UnexpectedEof);
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn read_i8(&mut self) -> VoltResult<i8> {
        Ok(self.take(1)?[0] as i8)
    }

    pub fn read_u8(&mut self) -> VoltResult<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_i16(&mut self) -> VoltResult<i16> {
        Ok(BigEndian::read_i16(self.take(2)?))
    }

    pub fn read_i32(&mut self) -> VoltResult<i32> {
        Ok(BigEndian::read_i32(self.take(4)?))
    }

    pub fn read_i64(&mut self) -> VoltResult<i64> {
        Ok(BigEndian::read_i64(self.take(8)?))
    }

    pub fn read_u64(&mut self) -> VoltResult<u64> {
        Ok(BigEndian::read_u64(self.take(8)?))
    }

    /// Raw bit pattern of an f64, so null-sentinel comparisons stay exact.
    pub fn read_f64_bits(&mut self) -> VoltResult<u64> {
        self.read_u64()
    }

    pub fn read_slice(&mut self, n: usize) -> VoltResult<&'a [u8]> {
        self.take(n)
    }

    /// Reads a non-nullable 4-byte-length-prefixed UTF-8 string.
    pub fn read_string(&mut self) -> VoltResult<String> {
        let len = self.read_i32()?;
        if len < 0 {
            return Err(VoltError::InvalidLength { len, max: crate::value::MAX_VALUE_LENGTH });
        }
        let bytes = self.take(len as usize)?;
        String::from_utf8(bytes.to_vec()).map_err(VoltError::InvalidUtf8)
    }
}
