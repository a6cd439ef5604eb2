//! Fixed-layout record encoding

use crate::crc;

/// Largest encoded record, in bytes
pub const MAX_RECORD_SIZE: usize = 32;

/// Errors while encoding or decoding a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RecordError {
    /// Buffer shorter than the record
    BufferTooSmall,
    /// Stored ADC resolution is not a known max count
    InvalidResolution,
    /// Stored supply voltage is not a known value
    InvalidVoltage,
    /// Stored decay model is not a known model
    InvalidDecayModel,
    /// A stored value violates its invariant (NaN slope, negative offset, ...)
    InvalidField,
}

/// A value with a fixed-size, order-fixed byte encoding
pub trait Record: Sized {
    /// Encoded size in bytes
    const SIZE: usize;

    /// Encode into the start of `buf`, returning the bytes written
    fn encode(&self, buf: &mut [u8]) -> Result<usize, RecordError>;

    /// Decode from the start of `buf`
    fn decode(buf: &[u8]) -> Result<Self, RecordError>;

    /// CRC32 of the encoded record
    fn checksum(&self) -> u32 {
        let mut buf = [0u8; MAX_RECORD_SIZE];
        match self.encode(&mut buf) {
            Ok(len) => crc::checksum(&buf[..len]),
            Err(_) => 0,
        }
    }
}

/// Little-endian writer over a byte slice
pub struct ByteWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> ByteWriter<'a> {
    /// Start writing at the beginning of `buf`
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes written so far
    pub fn position(&self) -> usize {
        self.pos
    }

    fn put(&mut self, bytes: &[u8]) -> Result<(), RecordError> {
        let end = self.pos + bytes.len();
        let dst = self
            .buf
            .get_mut(self.pos..end)
            .ok_or(RecordError::BufferTooSmall)?;
        dst.copy_from_slice(bytes);
        self.pos = end;
        Ok(())
    }

    pub fn put_u16(&mut self, value: u16) -> Result<(), RecordError> {
        self.put(&value.to_le_bytes())
    }

    pub fn put_u32(&mut self, value: u32) -> Result<(), RecordError> {
        self.put(&value.to_le_bytes())
    }

    pub fn put_f32(&mut self, value: f32) -> Result<(), RecordError> {
        self.put(&value.to_le_bytes())
    }

    /// Append a nested record
    pub fn put_record<R: Record>(&mut self, record: &R) -> Result<(), RecordError> {
        let rest = self
            .buf
            .get_mut(self.pos..)
            .ok_or(RecordError::BufferTooSmall)?;
        self.pos += record.encode(rest)?;
        Ok(())
    }
}

/// Little-endian reader over a byte slice
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    /// Start reading at the beginning of `buf`
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], RecordError> {
        let end = self.pos + N;
        let src = self
            .buf
            .get(self.pos..end)
            .ok_or(RecordError::BufferTooSmall)?;
        let mut out = [0u8; N];
        out.copy_from_slice(src);
        self.pos = end;
        Ok(out)
    }

    pub fn u16(&mut self) -> Result<u16, RecordError> {
        self.take().map(u16::from_le_bytes)
    }

    pub fn u32(&mut self) -> Result<u32, RecordError> {
        self.take().map(u32::from_le_bytes)
    }

    pub fn f32(&mut self) -> Result<f32, RecordError> {
        self.take().map(f32::from_le_bytes)
    }

    /// Read a nested record
    pub fn record<R: Record>(&mut self) -> Result<R, RecordError> {
        let rest = self.buf.get(self.pos..).ok_or(RecordError::BufferTooSmall)?;
        let record = R::decode(rest)?;
        self.pos += R::SIZE;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writer_little_endian() {
        let mut buf = [0u8; 10];
        let mut w = ByteWriter::new(&mut buf);
        w.put_u16(0x1234).unwrap();
        w.put_u32(0xA1B2_C3D4).unwrap();
        w.put_f32(1.0).unwrap();
        assert_eq!(w.position(), 10);
        assert_eq!(buf, [0x34, 0x12, 0xD4, 0xC3, 0xB2, 0xA1, 0x00, 0x00, 0x80, 0x3F]);
    }

    #[test]
    fn test_writer_overflow() {
        let mut buf = [0u8; 3];
        let mut w = ByteWriter::new(&mut buf);
        w.put_u16(1).unwrap();
        assert_eq!(w.put_u16(2), Err(RecordError::BufferTooSmall));
        assert_eq!(w.position(), 2);
    }

    #[test]
    fn test_reader_truncated() {
        let buf = [1u8, 0, 2];
        let mut r = ByteReader::new(&buf);
        assert_eq!(r.u16(), Ok(1));
        assert_eq!(r.u16(), Err(RecordError::BufferTooSmall));
    }
}
