//! Unsolicited frames the firmware pushes without a matching command.

use log::{trace, warn};

use crate::constants::*;
use crate::error::ProtocolError;
use crate::frame::Frame;
use crate::types::{Address, DeviceState};
use crate::wire::WireReader;

/// A device-initiated notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// The device-state bitfield changed.
    DeviceStateChanged(DeviceState),
    /// A sleepy end device polled its parent.
    MacPoll(MacPollIndication),
    /// A beacon was overheard on the channel.
    MacBeacon(MacBeaconIndication),
    /// A Green Power frame was received.
    GreenPower(GreenPowerIndication),
    /// Anything the engine has no decoder for, payload preserved raw.
    Other {
        /// Command id of the frame.
        command_id: u8,
        /// Raw payload bytes.
        payload: Vec<u8>,
    },
}

impl Notification {
    /// Classify and decode an unclaimed frame.
    ///
    /// A payload that fails to decode is downgraded to [`Notification::Other`]
    /// with the raw bytes preserved, so a malformed notification never kills
    /// the receive loop.
    pub fn classify(frame: &Frame) -> Notification {
        let command_id = frame.command_id();
        let decoded = match command_id {
            CMD_DEVICE_STATE_CHANGED => {
                WireReader::new(frame.payload())
                    .u8()
                    .map(|b| Notification::DeviceStateChanged(DeviceState::from_byte(b)))
            }
            CMD_MAC_POLL_INDICATION => {
                MacPollIndication::decode(frame).map(Notification::MacPoll)
            }
            CMD_MAC_BEACON_INDICATION => {
                MacBeaconIndication::decode(frame).map(Notification::MacBeacon)
            }
            CMD_GREEN_POWER => GreenPowerIndication::decode(frame).map(Notification::GreenPower),
            _ => {
                return Notification::Other {
                    command_id,
                    payload: frame.payload().to_vec(),
                }
            }
        };
        match decoded {
            Ok(notification) => notification,
            Err(err) => {
                warn!(
                    "undecodable {} notification: {}",
                    command_name(command_id),
                    err
                );
                Notification::Other {
                    command_id,
                    payload: frame.payload().to_vec(),
                }
            }
        }
    }
}

/// MAC-layer data poll from a sleepy end device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacPollIndication {
    /// Polling device, short or extended addressing.
    pub source: Address,
    /// Link quality indication.
    pub lqi: u8,
    /// Received signal strength in dBm.
    pub rssi: i8,
    /// Trailing bytes the firmware appends, preserved raw.
    pub extra: Vec<u8>,
}

impl MacPollIndication {
    fn decode(frame: &Frame) -> Result<Self, ProtocolError> {
        let mut r = WireReader::new(frame.payload());
        r.skip(2)?;
        // Polls carry either a short or an extended address, never both.
        let source = match r.u8()? {
            2 => Address::nwk(r.u16()?, 0),
            3 => Address::ieee(r.u64()?, 0),
            other => return Err(ProtocolError::InvalidAddressMode(other)),
        };
        Ok(MacPollIndication {
            source,
            lqi: r.u8()?,
            rssi: r.i8()?,
            extra: r.rest().to_vec(),
        })
    }
}

/// Beacon overheard on the current channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacBeaconIndication {
    /// Short address of the beaconing device.
    pub source: u16,
    /// PAN identifier announced in the beacon.
    pub pan_id: u16,
    /// Channel the beacon was heard on.
    pub channel: u8,
    /// Beacon flags byte.
    pub flags: u8,
    /// Network update identifier.
    pub update_id: u8,
    /// Trailing bytes the firmware appends, preserved raw.
    pub extra: Vec<u8>,
}

impl MacBeaconIndication {
    fn decode(frame: &Frame) -> Result<Self, ProtocolError> {
        let mut r = WireReader::new(frame.payload());
        Ok(MacBeaconIndication {
            source: r.u16()?,
            pan_id: r.u16()?,
            channel: r.u8()?,
            flags: r.u8()?,
            update_id: r.u8()?,
            extra: r.rest().to_vec(),
        })
    }
}

/// Frame type bits of a Green Power NWK frame control field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpFrameType {
    /// Application data frame.
    Data,
    /// Commissioning or maintenance frame.
    Maintenance,
    /// Frame type bits outside the documented set.
    Unknown(u8),
}

impl From<u8> for GpFrameType {
    fn from(value: u8) -> Self {
        match value {
            0 => GpFrameType::Data,
            1 => GpFrameType::Maintenance,
            _ => GpFrameType::Unknown(value),
        }
    }
}

/// Green Power frame forwarded by the firmware.
///
/// The payload embeds a GPDF whose shape depends on the NWK frame control
/// bits; fields absent for a given shape are left zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GreenPowerIndication {
    /// IEEE address of the reporting device.
    pub ieee_address: u64,
    /// MAC sequence number.
    pub sequence: u16,
    /// GPDF frame type.
    pub frame_type: GpFrameType,
    /// Green Power NWK protocol version.
    pub protocol_version: u8,
    /// Auto-commissioning bit.
    pub auto_commissioning: bool,
    /// True when the extended NWK frame control field is present.
    pub nwk_extension: bool,
    /// Application id from the extended field.
    pub application_id: u8,
    /// Remaining extended field bits.
    pub application_specific: u8,
    /// Source id, present for application id 0 data frames.
    pub source_id: u32,
    /// Security frame counter, present for application ids 0 and 2.
    pub frame_counter: u16,
    /// GPD command and payload.
    pub data: Vec<u8>,
}

impl GreenPowerIndication {
    fn decode(frame: &Frame) -> Result<Self, ProtocolError> {
        let payload = frame.payload();
        trace!("green power payload: {:02X?}", payload);
        let mut r = WireReader::new(payload);

        let ieee_address = r.u64()?;
        let sequence = r.u16()?;

        let frame_control = r.u8()?;
        let frame_type = GpFrameType::from(frame_control & 0b0000_0011);
        let protocol_version = (frame_control >> 2) & 0b11;
        let auto_commissioning = frame_control & 0b0100_0000 > 0;
        let nwk_extension = frame_control & 0b1000_0000 > 0;

        let mut application_id = 0;
        let mut application_specific = 0;
        if nwk_extension {
            let extended = r.u8()?;
            application_id = extended & 0b0000_0111;
            application_specific = (extended & 0b1111_1000) >> 3;
        }

        let mut source_id = 0;
        match frame_type {
            GpFrameType::Data if application_id == 0 => source_id = r.u32()?,
            GpFrameType::Maintenance if nwk_extension && application_id == 0 => {
                source_id = r.u32()?
            }
            _ => {}
        }

        let mut frame_counter = 0;
        if nwk_extension && (application_id == 0 || application_id == 2) {
            frame_counter = r.u16()?;
        }

        Ok(GreenPowerIndication {
            ieee_address,
            sequence,
            frame_type,
            protocol_version,
            auto_commissioning,
            nwk_extension,
            application_id,
            application_specific,
            source_id,
            frame_counter,
            data: r.rest().to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NetworkState;

    #[test]
    fn test_classify_device_state_changed() {
        let frame = Frame::from_raw(vec![0x0E, 0x11, 0x00, 0x06, 0x00, 0x22, 0xB9, 0xFF]);
        match Notification::classify(&frame) {
            Notification::DeviceStateChanged(state) => {
                assert_eq!(state.network_state, NetworkState::Connected);
                assert!(state.free_slots);
                assert!(!state.data_indication);
            }
            other => panic!("unexpected notification: {:?}", other),
        }
    }

    #[test]
    fn test_classify_mac_poll() {
        let frame = Frame::from_raw(vec![
            0x1C, 0x30, 0x00, 0x0C, 0x00, 0x00, 0x00, 0x02, 0x21, 0x43, 0xB4, 0xD6, 0xB8, 0xFD,
        ]);
        match Notification::classify(&frame) {
            Notification::MacPoll(poll) => {
                assert_eq!(poll.source.short, 0x4321);
                assert_eq!(poll.lqi, 180);
                assert_eq!(poll.rssi, -42);
                assert!(poll.extra.is_empty());
            }
            other => panic!("unexpected notification: {:?}", other),
        }
    }

    #[test]
    fn test_classify_mac_beacon() {
        let frame = Frame::from_raw(vec![
            0x1F, 0x31, 0x00, 0x0D, 0x00, 0x22, 0x11, 0x44, 0x33, 0x0F, 0x00, 0x01, 0x09, 0xE0,
            0xFE,
        ]);
        match Notification::classify(&frame) {
            Notification::MacBeacon(beacon) => {
                assert_eq!(beacon.source, 0x1122);
                assert_eq!(beacon.pan_id, 0x3344);
                assert_eq!(beacon.channel, 15);
                assert_eq!(beacon.update_id, 1);
                assert_eq!(beacon.extra, vec![0x09]);
            }
            other => panic!("unexpected notification: {:?}", other),
        }
    }

    #[test]
    fn test_classify_green_power_with_source_id() {
        let frame = Frame::from_raw(vec![
            0x19, 0x22, 0x00, 0x19, 0x00, 0xEF, 0xCD, 0xAB, 0x89, 0x67, 0x45, 0x23, 0x01, 0x42,
            0x00, 0x8C, 0x00, 0x78, 0x56, 0x34, 0x12, 0x44, 0x33, 0x20, 0x10, 0x63, 0xF9,
        ]);
        match Notification::classify(&frame) {
            Notification::GreenPower(gp) => {
                assert_eq!(gp.ieee_address, 0x0123456789ABCDEF);
                assert_eq!(gp.sequence, 0x0042);
                assert_eq!(gp.frame_type, GpFrameType::Data);
                assert_eq!(gp.protocol_version, 3);
                assert!(gp.nwk_extension);
                assert_eq!(gp.application_id, 0);
                assert_eq!(gp.source_id, 0x12345678);
                assert_eq!(gp.frame_counter, 0x3344);
                assert_eq!(gp.data, vec![0x20, 0x10]);
            }
            other => panic!("unexpected notification: {:?}", other),
        }
    }

    #[test]
    fn test_classify_green_power_without_extension() {
        // No extended frame control: the source id is still read for a data
        // frame, and no frame counter follows.
        let frame = Frame::from_raw(vec![
            0x19, 0x23, 0x00, 0x15, 0x00, 0xEF, 0xCD, 0xAB, 0x89, 0x67, 0x45, 0x23, 0x01, 0x10,
            0x00, 0x0C, 0x78, 0x56, 0x34, 0x12, 0x21, 0x9E, 0xFA,
        ]);
        match Notification::classify(&frame) {
            Notification::GreenPower(gp) => {
                assert!(!gp.nwk_extension);
                assert_eq!(gp.source_id, 0x12345678);
                assert_eq!(gp.frame_counter, 0);
                assert_eq!(gp.data, vec![0x21]);
            }
            other => panic!("unexpected notification: {:?}", other),
        }
    }

    #[test]
    fn test_classify_unknown_command_preserves_payload() {
        let frame = Frame::new(0x99, 1, &[0xAB, 0xCD]);
        assert_eq!(
            Notification::classify(&frame),
            Notification::Other {
                command_id: 0x99,
                payload: vec![0xAB, 0xCD],
            }
        );
    }

    #[test]
    fn test_classify_truncated_poll_falls_back_to_other() {
        let frame = Frame::new(CMD_MAC_POLL_INDICATION, 2, &[0x00]);
        assert_eq!(
            Notification::classify(&frame),
            Notification::Other {
                command_id: CMD_MAC_POLL_INDICATION,
                payload: vec![0x00],
            }
        );
    }
}
