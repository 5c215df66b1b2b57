//! Incoming response codecs.
//!
//! Every decoder checks the frame status byte before reading the payload.
//! The firmware answers a failed command with a short frame that omits the
//! payload, so reading fields first would misreport the failure as a length
//! error instead of the device status.

use crate::constants::*;
use crate::contract::Response;
use crate::error::ProtocolError;
use crate::frame::Frame;
use crate::types::{Address, AddressMode, DeviceState, NetworkState, Platform};
use crate::wire::WireReader;

/// Firmware version and platform reported by the version command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VersionResponse {
    /// Major firmware version.
    pub major: u8,
    /// Minor firmware version.
    pub minor: u8,
    /// Hardware platform.
    pub platform: Platform,
}

impl Response for VersionResponse {
    fn command_id(&self) -> u8 {
        CMD_VERSION
    }

    fn decode(&mut self, frame: &Frame) -> Result<(), ProtocolError> {
        frame.check_status()?;
        let mut r = WireReader::new(frame.payload());
        r.skip(1)?;
        self.platform = Platform::from(r.u8()?);
        self.minor = r.u8()?;
        self.major = r.u8()?;
        Ok(())
    }
}

impl std::fmt::Display for VersionResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{} ({})", self.major, self.minor, self.platform)
    }
}

/// Device state bitfield returned by the device-state poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceStateResponse {
    /// Decoded state bitfield.
    pub state: DeviceState,
}

impl Response for DeviceStateResponse {
    fn command_id(&self) -> u8 {
        CMD_DEVICE_STATE
    }

    fn decode(&mut self, frame: &Frame) -> Result<(), ProtocolError> {
        frame.check_status()?;
        let mut r = WireReader::new(frame.payload());
        self.state = DeviceState::from_byte(r.u8()?);
        Ok(())
    }
}

/// Network state confirmed by a change-network-state command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChangeNetworkStateResponse {
    /// State the firmware settled on.
    pub state: NetworkState,
}

impl Response for ChangeNetworkStateResponse {
    fn command_id(&self) -> u8 {
        CMD_CHANGE_NETWORK_STATE
    }

    fn decode(&mut self, frame: &Frame) -> Result<(), ProtocolError> {
        frame.check_status()?;
        let mut r = WireReader::new(frame.payload());
        self.state = NetworkState::from_low_bits(r.u8()?);
        Ok(())
    }
}

/// Parameter value returned by a read-parameter command.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReadParameterResponse {
    /// Identifier echoed by the firmware.
    pub parameter_id: u8,
    /// Raw value bytes, little-endian for integers.
    pub value: Vec<u8>,
}

impl Response for ReadParameterResponse {
    fn command_id(&self) -> u8 {
        CMD_READ_PARAMETER
    }

    fn decode(&mut self, frame: &Frame) -> Result<(), ProtocolError> {
        frame.check_status()?;
        let mut r = WireReader::new(frame.payload());
        r.skip(2)?;
        self.parameter_id = r.u8()?;
        self.value = r.rest().to_vec();
        Ok(())
    }
}

/// Acknowledgement of a write-parameter command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WriteParameterResponse {
    /// Identifier echoed by the firmware.
    pub parameter_id: u8,
}

impl Response for WriteParameterResponse {
    fn command_id(&self) -> u8 {
        CMD_WRITE_PARAMETER
    }

    fn decode(&mut self, frame: &Frame) -> Result<(), ProtocolError> {
        frame.check_status()?;
        let mut r = WireReader::new(frame.payload());
        r.skip(2)?;
        self.parameter_id = r.u8()?;
        Ok(())
    }
}

/// Acknowledgement of an enqueued APS data request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SendDataResponse {
    /// Device state after enqueueing.
    pub state: DeviceState,
    /// Request identifier echoed back.
    pub request_id: u8,
}

impl Response for SendDataResponse {
    fn command_id(&self) -> u8 {
        CMD_APS_DATA_REQUEST
    }

    fn decode(&mut self, frame: &Frame) -> Result<(), ProtocolError> {
        frame.check_status()?;
        let mut r = WireReader::new(frame.payload());
        r.skip(2)?;
        self.state = DeviceState::from_byte(r.u8()?);
        self.request_id = r.u8()?;
        Ok(())
    }
}

/// APSDE data confirm for a previously enqueued request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QuerySendDataResponse {
    /// Device state at confirm time.
    pub state: DeviceState,
    /// Destination the request was sent to.
    pub destination: Address,
    /// Local endpoint the request originated from.
    pub source_endpoint: u8,
    /// APSDE confirm status, distinct from the frame status byte.
    pub confirm_status: u8,
}

impl Response for QuerySendDataResponse {
    fn command_id(&self) -> u8 {
        CMD_APS_DATA_CONFIRM
    }

    fn decode(&mut self, frame: &Frame) -> Result<(), ProtocolError> {
        frame.check_status()?;
        let mut r = WireReader::new(frame.payload());
        r.skip(2)?;
        self.state = DeviceState::from_byte(r.u8()?);
        self.destination = Address::decode_base(&mut r)?;
        // Group casts carry no destination endpoint in the confirm.
        if self.destination.mode != AddressMode::Group {
            self.destination.endpoint = r.u8()?;
        }
        self.source_endpoint = r.u8()?;
        self.confirm_status = r.u8()?;
        Ok(())
    }
}

/// APSDE data indication fetched with a read-received-data command.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ApsDataIndicationResponse {
    /// Device state at indication time.
    pub state: DeviceState,
    /// Destination address, endpoint always present.
    pub destination: Address,
    /// Source address, endpoint always present.
    pub source: Address,
    /// Application profile identifier.
    pub profile_id: u16,
    /// Cluster identifier.
    pub cluster_id: u16,
    /// Application payload.
    pub asdu: Vec<u8>,
    /// Short address of the last routing hop.
    pub last_hop: u16,
    /// Link quality indication.
    pub lqi: u8,
    /// Received signal strength in dBm.
    pub rssi: i8,
}

impl Response for ApsDataIndicationResponse {
    fn command_id(&self) -> u8 {
        CMD_APS_DATA_INDICATION
    }

    fn decode(&mut self, frame: &Frame) -> Result<(), ProtocolError> {
        frame.check_status()?;
        let mut r = WireReader::new(frame.payload());
        r.skip(2)?;
        self.state = DeviceState::from_byte(r.u8()?);
        // Indications carry an endpoint byte for every address mode.
        self.destination = Address::decode_base(&mut r)?;
        self.destination.endpoint = r.u8()?;
        self.source = Address::decode_base(&mut r)?;
        self.source.endpoint = r.u8()?;
        self.profile_id = r.u16()?;
        self.cluster_id = r.u16()?;
        let asdu_len = r.u16()? as usize;
        self.asdu = r.bytes(asdu_len)?.to_vec();
        self.last_hop = r.u16()?;
        self.lqi = r.u8()?;
        r.skip(4)?;
        self.rssi = r.i8()?;
        Ok(())
    }
}

/// Raw acknowledgement of an update-neighbor command.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UpdateNeighborResponse {
    /// Payload copied verbatim; the firmware echoes the request fields.
    pub raw: Vec<u8>,
}

impl Response for UpdateNeighborResponse {
    fn command_id(&self) -> u8 {
        CMD_UPDATE_NEIGHBOR
    }

    fn decode(&mut self, frame: &Frame) -> Result<(), ProtocolError> {
        frame.check_status()?;
        self.raw = frame.payload().to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DeviceStatus;
    use crate::types::NetworkState;

    #[test]
    fn test_version_response_decoding() {
        let frame =
            Frame::from_raw(vec![0x0D, 0x05, 0x00, 0x09, 0x00, 0x00, 0x07, 0x5A, 0x26, 0x5E, 0xFF]);
        let mut response = VersionResponse::default();
        response.decode(&frame).unwrap();
        assert_eq!(response.major, 0x26);
        assert_eq!(response.minor, 0x5A);
        assert_eq!(response.platform, Platform::ConBee2);
        assert_eq!(response.to_string(), "38.90 (ConBee II)");
    }

    #[test]
    fn test_device_state_response_decoding() {
        let frame =
            Frame::from_raw(vec![0x07, 0x07, 0x00, 0x06, 0x00, 0x2A, 0xC2, 0xFF]);
        let mut response = DeviceStateResponse::default();
        response.decode(&frame).unwrap();
        assert_eq!(response.state.network_state, NetworkState::Connected);
        assert!(response.state.data_indication);
        assert!(response.state.free_slots);
    }

    #[test]
    fn test_change_network_state_response_decoding() {
        let frame =
            Frame::from_raw(vec![0x08, 0x03, 0x00, 0x06, 0x00, 0x02, 0xED, 0xFF]);
        let mut response = ChangeNetworkStateResponse::default();
        response.decode(&frame).unwrap();
        assert_eq!(response.state, NetworkState::Connected);
    }

    #[test]
    fn test_read_parameter_response_decoding() {
        let frame = Frame::from_raw(vec![
            0x0A, 0x09, 0x00, 0x0A, 0x00, 0x03, 0x00, 0x05, 0xCD, 0xAB, 0x63, 0xFE,
        ]);
        let mut response = ReadParameterResponse::default();
        response.decode(&frame).unwrap();
        assert_eq!(response.parameter_id, 0x05);
        assert_eq!(response.value, vec![0xCD, 0xAB]);
    }

    #[test]
    fn test_write_parameter_response_decoding() {
        let frame =
            Frame::from_raw(vec![0x0B, 0x0B, 0x00, 0x08, 0x00, 0x01, 0x00, 0x26, 0xBB, 0xFF]);
        let mut response = WriteParameterResponse::default();
        response.decode(&frame).unwrap();
        assert_eq!(response.parameter_id, 0x26);
    }

    #[test]
    fn test_send_data_response_decoding() {
        let frame = Frame::from_raw(vec![
            0x12, 0x0A, 0x00, 0x09, 0x00, 0x02, 0x00, 0x22, 0x10, 0xA7, 0xFF,
        ]);
        let mut response = SendDataResponse::default();
        response.decode(&frame).unwrap();
        assert_eq!(response.state.network_state, NetworkState::Connected);
        assert!(response.state.free_slots);
        assert_eq!(response.request_id, 0x10);
    }

    #[test]
    fn test_query_send_data_response_decoding() {
        let frame = Frame::from_raw(vec![
            0x04, 0x0C, 0x00, 0x0E, 0x00, 0x07, 0x00, 0x26, 0x02, 0x34, 0x12, 0x01, 0x01, 0x00,
            0x6B, 0xFF,
        ]);
        let mut response = QuerySendDataResponse::default();
        response.decode(&frame).unwrap();
        assert!(response.state.data_confirm);
        assert_eq!(response.destination, Address::nwk(0x1234, 1));
        assert_eq!(response.source_endpoint, 1);
        assert_eq!(response.confirm_status, 0x00);
    }

    #[test]
    fn test_aps_data_indication_decoding() {
        let frame = Frame::from_raw(vec![
            0x17, 0x04, 0x00, 0x20, 0x00, 0x19, 0x00, 0x2A, 0x02, 0x34, 0x12, 0x01, 0x02, 0x78,
            0x56, 0x02, 0x04, 0x01, 0x06, 0x00, 0x02, 0x00, 0x01, 0x02, 0xEF, 0xBE, 0xC8, 0x00,
            0x00, 0x00, 0x00, 0xC4, 0x1E, 0xFB,
        ]);
        let mut response = ApsDataIndicationResponse::default();
        response.decode(&frame).unwrap();
        assert_eq!(response.destination, Address::nwk(0x1234, 1));
        assert_eq!(response.source, Address::nwk(0x5678, 2));
        assert_eq!(response.profile_id, 0x0104);
        assert_eq!(response.cluster_id, 0x0006);
        assert_eq!(response.asdu, vec![0x01, 0x02]);
        assert_eq!(response.last_hop, 0xBEEF);
        assert_eq!(response.lqi, 200);
        assert_eq!(response.rssi, -60);
    }

    #[test]
    fn test_aps_data_indication_mixed_address_modes() {
        // Group destination with an extended-address source. The source is
        // decoded by its own mode byte, not the destination's.
        let frame = Frame::from_raw(vec![
            0x17, 0x05, 0x00, 0x25, 0x00, 0x17, 0x00, 0x2A, 0x01, 0x10, 0x00, 0x00, 0x03, 0xEF,
            0xCD, 0xAB, 0x89, 0x67, 0x45, 0x23, 0x01, 0x05, 0x04, 0x01, 0x06, 0x00, 0x01, 0x00,
            0xAA, 0x00, 0x00, 0xB0, 0x00, 0x00, 0x00, 0x00, 0xD0, 0x6F, 0xF9,
        ]);
        let mut response = ApsDataIndicationResponse::default();
        response.decode(&frame).unwrap();
        assert_eq!(response.destination.mode, AddressMode::Group);
        assert_eq!(response.destination.short, 0x0010);
        assert_eq!(response.source.mode, AddressMode::Ieee);
        assert_eq!(response.source.extended, 0x0123456789ABCDEF);
        assert_eq!(response.source.endpoint, 0x05);
        assert_eq!(response.asdu, vec![0xAA]);
        assert_eq!(response.rssi, -48);
    }

    #[test]
    fn test_update_neighbor_response_keeps_raw_payload() {
        let frame =
            Frame::from_raw(vec![0x1D, 0x09, 0x00, 0x08, 0x00, 0x01, 0x22, 0x11, 0x9E, 0xFF]);
        let mut response = UpdateNeighborResponse::default();
        response.decode(&frame).unwrap();
        assert_eq!(response.raw, vec![0x01, 0x22, 0x11]);
    }

    #[test]
    fn test_error_status_reported_before_payload_reads() {
        // A failed command comes back as a short frame with no payload. The
        // decoder must surface the device status, not a length error.
        let frame = Frame::from_raw(vec![0x17, 0x04, 0x02, 0x05, 0x00, 0xDE, 0xFF]);
        let mut response = ApsDataIndicationResponse::default();
        assert_eq!(
            response.decode(&frame).unwrap_err(),
            ProtocolError::Device(DeviceStatus::Busy)
        );
    }

    #[test]
    fn test_truncated_payload_reports_length_error() {
        let frame = Frame::new(0x17, 4, &[0x19, 0x00, 0x2A, 0x02, 0x34]);
        let mut response = ApsDataIndicationResponse::default();
        assert!(matches!(
            response.decode(&frame).unwrap_err(),
            ProtocolError::FrameTooShort { .. }
        ));
    }
}
