//! Frame encoding/decoding utilities.
//!
//! Every unit exchanged with the device is one frame:
//!
//! ```text
//! +--------+--------+--------+--------+--------+---------------+--------+--------+
//! | cmd id | seq    | status | len_lo | len_hi | payload[0..N] | crc_lo | crc_hi |
//! +--------+--------+--------+--------+--------+---------------+--------+--------+
//! ```
//!
//! The length field is `5 + N` (header plus payload, excluding the trailing
//! checksum) in little-endian. The checksum is additive: sum every preceding
//! byte into a 16-bit accumulator, complement, add one. It is not a
//! polynomial CRC even though the firmware documentation calls it one.
//!
//! On the wire each frame is additionally SLIP-delimited; that byte stuffing
//! happens in the transport layer, so this module only ever sees whole
//! frames.

use bytes::{BufMut, Bytes, BytesMut};

use crate::constants::{FRAME_CHECKSUM_LEN, FRAME_HEADER_LEN, FRAME_MIN_LEN};
use crate::error::{DeviceStatus, ProtocolError};

/// Additive 16-bit checksum over `data`: `(¬Σ bytes) + 1 mod 2^16`.
pub fn checksum(data: &[u8]) -> u16 {
    let mut sum: u16 = 0;
    for &b in data {
        sum = sum.wrapping_add(b as u16);
    }
    (sum ^ 0xFFFF).wrapping_add(1)
}

/// One protocol frame, immutable once constructed.
///
/// Accessors assume nothing about validity; a frame received from the wire
/// should pass [`Frame::verify`] before its fields are interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    bytes: Bytes,
}

impl Frame {
    /// Build an outbound frame with a zero status byte and a computed
    /// checksum.
    pub fn new(command_id: u8, sequence: u8, payload: &[u8]) -> Self {
        let total = FRAME_HEADER_LEN + payload.len();
        let mut buf = BytesMut::with_capacity(total + FRAME_CHECKSUM_LEN);
        buf.put_u8(command_id);
        buf.put_u8(sequence);
        buf.put_u8(0);
        buf.put_u16_le(total as u16);
        buf.extend_from_slice(payload);
        let crc = checksum(&buf);
        buf.put_u16_le(crc);
        Frame { bytes: buf.freeze() }
    }

    /// Wrap raw bytes received from the transport. No validation is
    /// performed here.
    pub fn from_raw(bytes: impl Into<Bytes>) -> Self {
        Frame { bytes: bytes.into() }
    }

    /// Command id (byte 0).
    pub fn command_id(&self) -> u8 {
        self.byte_at(0)
    }

    /// Sequence number (byte 1).
    pub fn sequence(&self) -> u8 {
        self.byte_at(1)
    }

    /// Raw status byte (byte 2); zero means success.
    pub fn status(&self) -> u8 {
        self.byte_at(2)
    }

    /// Map the status byte to `Err(ProtocolError::Device(..))` when nonzero.
    ///
    /// Response decoders call this before touching the payload, so an error
    /// frame with a truncated payload still reports the device status rather
    /// than a length error.
    pub fn check_status(&self) -> Result<(), ProtocolError> {
        match self.status() {
            0 => Ok(()),
            code => Err(ProtocolError::Device(DeviceStatus::from(code))),
        }
    }

    /// Payload bytes (between the header and the trailing checksum). Empty
    /// for frames too short to carry one.
    pub fn payload(&self) -> &[u8] {
        if self.bytes.len() < FRAME_HEADER_LEN + FRAME_CHECKSUM_LEN {
            return &[];
        }
        &self.bytes[FRAME_HEADER_LEN..self.bytes.len() - FRAME_CHECKSUM_LEN]
    }

    /// Recompute the checksum over everything before the trailing two bytes
    /// and compare. Frames shorter than three bytes are invalid
    /// unconditionally.
    ///
    /// The embedded length field is redundant with the outer packet length
    /// supplied by the transport and is not re-validated here.
    pub fn verify(&self) -> bool {
        if self.bytes.len() < FRAME_MIN_LEN {
            return false;
        }
        let split = self.bytes.len() - FRAME_CHECKSUM_LEN;
        let stated = u16::from_le_bytes([self.bytes[split], self.bytes[split + 1]]);
        checksum(&self.bytes[..split]) == stated
    }

    /// The complete frame, checksum included.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Total length in bytes, checksum included.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True when the frame holds no bytes at all.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    fn byte_at(&self, index: usize) -> u8 {
        self.bytes.get(index).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::CMD_APS_DATA_REQUEST;

    /// A frame captured from a ConBee II: the enqueue-confirmation for an
    /// APS data request, sequence 2.
    const CAPTURED: [u8; 31] = [
        0x12, 0x02, 0x00, 0x1D, 0x00, 0x16, 0x00, 0x24, 0x01, 0x04, 0x00, 0x02, 0x48, 0x89, 0x01,
        0x04, 0x01, 0x06, 0x00, 0x01, 0x05, 0x00, 0x10, 0x28, 0x0B, 0x0A, 0x00, 0x00, 0x00, 0x5E,
        0xFE,
    ];

    #[test]
    fn test_checksum_matches_captured_frame() {
        assert_eq!(checksum(&CAPTURED[..29]), 0xFE5E);
    }

    #[test]
    fn test_verify_captured_frame() {
        let frame = Frame::from_raw(CAPTURED.to_vec());
        assert!(frame.verify());
        assert_eq!(frame.command_id(), CMD_APS_DATA_REQUEST);
        assert_eq!(frame.sequence(), 2);
        assert_eq!(frame.status(), 0);
        assert_eq!(frame.payload().len(), 24);
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let payload = [0xDE, 0xAD, 0xBE, 0xEF, 0x00, 0x42];
        let frame = Frame::new(0x0A, 17, &payload);

        assert_eq!(frame.len(), 5 + payload.len() + 2);
        assert!(frame.verify());

        let reparsed = Frame::from_raw(frame.as_bytes().to_vec());
        assert_eq!(reparsed.command_id(), 0x0A);
        assert_eq!(reparsed.sequence(), 17);
        assert_eq!(reparsed.status(), 0);
        assert_eq!(reparsed.payload(), &payload);
    }

    #[test]
    fn test_encode_embeds_length_field() {
        let frame = Frame::new(0x07, 1, &[0, 0, 0]);
        let bytes = frame.as_bytes();
        assert_eq!(u16::from_le_bytes([bytes[3], bytes[4]]), 8);
    }

    #[test]
    fn test_empty_payload_round_trip() {
        let frame = Frame::new(0x04, 9, &[]);
        assert!(frame.verify());
        assert!(frame.payload().is_empty());
    }

    #[test]
    fn test_verify_rejects_corruption() {
        // Flip one byte at a time at several offsets; the additive checksum
        // catches any single-byte change.
        for index in [0usize, 1, 4, 10, 20, 29, 30] {
            let mut bytes = CAPTURED.to_vec();
            bytes[index] ^= 0x41;
            assert!(
                !Frame::from_raw(bytes).verify(),
                "corruption at offset {index} not detected"
            );
        }
    }

    #[test]
    fn test_verify_rejects_short_frames() {
        assert!(!Frame::from_raw(Vec::new()).verify());
        assert!(!Frame::from_raw(vec![0x07]).verify());
        assert!(!Frame::from_raw(vec![0x07, 0x01]).verify());
    }

    #[test]
    fn test_short_frame_accessors_are_total() {
        let frame = Frame::from_raw(vec![0x07, 0x01]);
        assert_eq!(frame.command_id(), 0x07);
        assert_eq!(frame.sequence(), 0x01);
        assert_eq!(frame.status(), 0);
        assert!(frame.payload().is_empty());
    }

    #[test]
    fn test_check_status_maps_nonzero() {
        let mut bytes = Frame::new(0x08, 3, &[]).as_bytes().to_vec();
        bytes[2] = 0x02;
        let split = bytes.len() - 2;
        let crc = checksum(&bytes[..split]).to_le_bytes();
        bytes[split] = crc[0];
        bytes[split + 1] = crc[1];

        let frame = Frame::from_raw(bytes);
        assert!(frame.verify());
        assert_eq!(
            frame.check_status(),
            Err(ProtocolError::Device(DeviceStatus::Busy))
        );
    }
}
