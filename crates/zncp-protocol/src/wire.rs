//! Bounds-checked little-endian payload reader.
//!
//! Response payloads are sequences of fixed-width fields with occasional
//! variable-length runs. This cursor keeps every read bounds-checked so a
//! truncated payload surfaces as [`ProtocolError::FrameTooShort`] instead of
//! a panic.

use crate::error::ProtocolError;

pub(crate) struct WireReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        WireReader { data, pos: 0 }
    }

    pub(crate) fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], ProtocolError> {
        if self.remaining() < n {
            return Err(ProtocolError::FrameTooShort {
                expected: self.pos + n,
                actual: self.data.len(),
            });
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub(crate) fn skip(&mut self, n: usize) -> Result<(), ProtocolError> {
        self.take(n).map(|_| ())
    }

    pub(crate) fn u8(&mut self) -> Result<u8, ProtocolError> {
        Ok(self.take(1)?[0])
    }

    pub(crate) fn i8(&mut self) -> Result<i8, ProtocolError> {
        Ok(self.u8()? as i8)
    }

    pub(crate) fn u16(&mut self) -> Result<u16, ProtocolError> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub(crate) fn u32(&mut self) -> Result<u32, ProtocolError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub(crate) fn u64(&mut self) -> Result<u64, ProtocolError> {
        let b = self.take(8)?;
        Ok(u64::from_le_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    pub(crate) fn bytes(&mut self, n: usize) -> Result<&'a [u8], ProtocolError> {
        self.take(n)
    }

    /// Everything not yet consumed; leaves the cursor at the end.
    pub(crate) fn rest(&mut self) -> &'a [u8] {
        let slice = &self.data[self.pos..];
        self.pos = self.data.len();
        slice
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_advance_in_order() {
        let data = [0x01, 0x34, 0x12, 0x78, 0x56, 0x34, 0x12, 0xFF];
        let mut r = WireReader::new(&data);
        assert_eq!(r.u8().unwrap(), 0x01);
        assert_eq!(r.u16().unwrap(), 0x1234);
        assert_eq!(r.u32().unwrap(), 0x12345678);
        assert_eq!(r.i8().unwrap(), -1);
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn test_short_read_reports_lengths() {
        let mut r = WireReader::new(&[0x01, 0x02]);
        r.skip(1).unwrap();
        let err = r.u32().unwrap_err();
        assert_eq!(
            err,
            ProtocolError::FrameTooShort {
                expected: 5,
                actual: 2
            }
        );
    }

    #[test]
    fn test_rest_consumes_tail() {
        let data = [1, 2, 3, 4];
        let mut r = WireReader::new(&data);
        r.skip(1).unwrap();
        assert_eq!(r.rest(), &[2, 3, 4]);
        assert_eq!(r.remaining(), 0);
        assert_eq!(r.rest(), &[] as &[u8]);
    }
}
