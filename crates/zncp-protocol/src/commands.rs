//! Outgoing command codecs.
//!
//! Each request type knows its command identifier and how to lay out its
//! payload. Sequence numbers are supplied by the link at send time.

use crate::constants::*;
use crate::contract::Request;
use crate::frame::Frame;
use crate::types::{Address, AddressMode, MacCapabilities, NetworkState, ReceiveFlags, TxOptions};

/// Set when an APS data request carries an explicit source route.
const SEND_FLAG_SOURCE_ROUTING: u8 = 0x02;

// ============================================================================
// Firmware queries
// ============================================================================

/// Query the firmware version and platform.
#[derive(Debug, Clone, Copy, Default)]
pub struct VersionRequest;

impl Request for VersionRequest {
    fn command_id(&self) -> u8 {
        CMD_VERSION
    }

    fn encode(&self, sequence: u8) -> Frame {
        Frame::new(CMD_VERSION, sequence, &[0x00, 0x00, 0x00, 0x00])
    }
}

/// Poll the current device state bitfield.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeviceStateRequest;

impl Request for DeviceStateRequest {
    fn command_id(&self) -> u8 {
        CMD_DEVICE_STATE
    }

    fn encode(&self, sequence: u8) -> Frame {
        Frame::new(CMD_DEVICE_STATE, sequence, &[0x00, 0x00, 0x00])
    }
}

/// Ask the firmware to move to a new network state.
#[derive(Debug, Clone, Copy)]
pub struct ChangeNetworkStateRequest {
    /// Target state.
    pub state: NetworkState,
}

impl Request for ChangeNetworkStateRequest {
    fn command_id(&self) -> u8 {
        CMD_CHANGE_NETWORK_STATE
    }

    fn encode(&self, sequence: u8) -> Frame {
        Frame::new(CMD_CHANGE_NETWORK_STATE, sequence, &[self.state.into()])
    }
}

// ============================================================================
// Parameter access
// ============================================================================

/// Read a firmware parameter, optionally selected by argument bytes
/// (for indexed parameters such as ZDO descriptor slots or link keys).
#[derive(Debug, Clone)]
pub struct ReadParameterRequest {
    /// Parameter identifier.
    pub parameter_id: u8,
    /// Selector bytes appended after the identifier.
    pub arguments: Vec<u8>,
}

impl ReadParameterRequest {
    pub fn new(parameter_id: u8) -> Self {
        ReadParameterRequest {
            parameter_id,
            arguments: Vec::new(),
        }
    }
}

impl Request for ReadParameterRequest {
    fn command_id(&self) -> u8 {
        CMD_READ_PARAMETER
    }

    fn encode(&self, sequence: u8) -> Frame {
        let inner_len = 1 + self.arguments.len() as u16;
        let mut payload = Vec::with_capacity(3 + self.arguments.len());
        payload.extend_from_slice(&inner_len.to_le_bytes());
        payload.push(self.parameter_id);
        payload.extend_from_slice(&self.arguments);
        Frame::new(CMD_READ_PARAMETER, sequence, &payload)
    }
}

/// Write a firmware parameter. For indexed parameters the selector bytes
/// come first in `value`, followed by the value itself.
#[derive(Debug, Clone)]
pub struct WriteParameterRequest {
    /// Parameter identifier.
    pub parameter_id: u8,
    /// Raw value bytes, little-endian for integers.
    pub value: Vec<u8>,
}

impl Request for WriteParameterRequest {
    fn command_id(&self) -> u8 {
        CMD_WRITE_PARAMETER
    }

    fn encode(&self, sequence: u8) -> Frame {
        let inner_len = 1 + self.value.len() as u16;
        let mut payload = Vec::with_capacity(3 + self.value.len());
        payload.extend_from_slice(&inner_len.to_le_bytes());
        payload.push(self.parameter_id);
        payload.extend_from_slice(&self.value);
        Frame::new(CMD_WRITE_PARAMETER, sequence, &payload)
    }
}

// ============================================================================
// APS data path
// ============================================================================

/// Fetch a pending APSDE data indication.
///
/// With no flags the firmware picks its default source address format. The
/// flag variant asks for specific source addressing and the last-hop fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadReceivedDataRequest {
    /// Addressing and last-hop options.
    pub flags: ReceiveFlags,
}

impl Request for ReadReceivedDataRequest {
    fn command_id(&self) -> u8 {
        CMD_APS_DATA_INDICATION
    }

    fn encode(&self, sequence: u8) -> Frame {
        if self.flags.is_empty() {
            Frame::new(CMD_APS_DATA_INDICATION, sequence, &[0x00, 0x00])
        } else {
            Frame::new(
                CMD_APS_DATA_INDICATION,
                sequence,
                &[0x01, 0x00, self.flags.0],
            )
        }
    }
}

/// Enqueue an outgoing APSDE data request.
#[derive(Debug, Clone)]
pub struct ApsDataRequest {
    /// Caller-chosen identifier echoed in the matching confirm.
    pub request_id: u8,
    /// Destination address and endpoint.
    pub destination: Address,
    /// Application profile identifier.
    pub profile_id: u16,
    /// Cluster identifier.
    pub cluster_id: u16,
    /// Local source endpoint.
    pub source_endpoint: u8,
    /// Application payload.
    pub asdu: Vec<u8>,
    /// Transmit options.
    pub tx_options: TxOptions,
    /// Network radius, zero for the firmware default.
    pub radius: u8,
    /// Explicit source route, outermost relay first. Empty for none.
    pub source_route: Vec<u16>,
}

impl Request for ApsDataRequest {
    fn command_id(&self) -> u8 {
        CMD_APS_DATA_REQUEST
    }

    fn encode(&self, sequence: u8) -> Frame {
        let mut flags = 0u8;
        if !self.source_route.is_empty() {
            flags |= SEND_FLAG_SOURCE_ROUTING;
        }

        let mut inner = Vec::with_capacity(20 + self.asdu.len());
        inner.push(self.request_id);
        inner.push(flags);
        self.destination.encode_base(&mut inner);
        // Group casts carry no destination endpoint.
        if self.destination.mode != AddressMode::Group {
            inner.push(self.destination.endpoint);
        }
        inner.extend_from_slice(&self.profile_id.to_le_bytes());
        inner.extend_from_slice(&self.cluster_id.to_le_bytes());
        inner.push(self.source_endpoint);
        inner.extend_from_slice(&(self.asdu.len() as u16).to_le_bytes());
        inner.extend_from_slice(&self.asdu);
        inner.push(self.tx_options.0);
        inner.push(self.radius);
        if flags & SEND_FLAG_SOURCE_ROUTING > 0 {
            inner.push(self.source_route.len() as u8);
            for relay in &self.source_route {
                inner.extend_from_slice(&relay.to_le_bytes());
            }
        }

        let mut payload = Vec::with_capacity(2 + inner.len());
        payload.extend_from_slice(&(inner.len() as u16).to_le_bytes());
        payload.extend_from_slice(&inner);
        Frame::new(CMD_APS_DATA_REQUEST, sequence, &payload)
    }
}

/// Fetch a pending APSDE data confirm for a previously enqueued request.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuerySendDataRequest;

impl Request for QuerySendDataRequest {
    fn command_id(&self) -> u8 {
        CMD_APS_DATA_CONFIRM
    }

    fn encode(&self, sequence: u8) -> Frame {
        Frame::new(CMD_APS_DATA_CONFIRM, sequence, &[])
    }
}

// ============================================================================
// Neighbor table
// ============================================================================

/// Action carried by an update-neighbor command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NeighborAction {
    /// Remove the neighbor table entry.
    Remove,
    /// Add or refresh the neighbor table entry.
    Add,
}

impl From<NeighborAction> for u8 {
    fn from(value: NeighborAction) -> Self {
        match value {
            NeighborAction::Remove => 0x00,
            NeighborAction::Add => 0x01,
        }
    }
}

/// Add or remove an entry in the firmware neighbor table.
#[derive(Debug, Clone, Copy)]
pub struct UpdateNeighborRequest {
    /// Whether to add or remove the entry.
    pub action: NeighborAction,
    /// Short address of the neighbor.
    pub short: u16,
    /// IEEE address of the neighbor.
    pub extended: u64,
    /// Announced MAC capabilities.
    pub capabilities: MacCapabilities,
}

impl Request for UpdateNeighborRequest {
    fn command_id(&self) -> u8 {
        CMD_UPDATE_NEIGHBOR
    }

    fn encode(&self, sequence: u8) -> Frame {
        let mut payload = Vec::with_capacity(12);
        payload.push(self.action.into());
        payload.extend_from_slice(&self.short.to_le_bytes());
        payload.extend_from_slice(&self.extended.to_le_bytes());
        payload.push(self.capabilities.0);
        Frame::new(CMD_UPDATE_NEIGHBOR, sequence, &payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_request_encoding() {
        let frame = VersionRequest.encode(5);
        assert_eq!(
            frame.as_bytes(),
            &[0x0D, 0x05, 0x00, 0x09, 0x00, 0x00, 0x00, 0x00, 0x00, 0xE5, 0xFF]
        );
    }

    #[test]
    fn test_device_state_request_encoding() {
        let frame = DeviceStateRequest.encode(7);
        assert_eq!(
            frame.as_bytes(),
            &[0x07, 0x07, 0x00, 0x08, 0x00, 0x00, 0x00, 0x00, 0xEA, 0xFF]
        );
    }

    #[test]
    fn test_change_network_state_request_encoding() {
        let frame = ChangeNetworkStateRequest {
            state: NetworkState::Connected,
        }
        .encode(3);
        assert_eq!(
            frame.as_bytes(),
            &[0x08, 0x03, 0x00, 0x06, 0x00, 0x02, 0xED, 0xFF]
        );
    }

    #[test]
    fn test_read_parameter_request_encoding() {
        let frame = ReadParameterRequest::new(0x05).encode(9);
        assert_eq!(
            frame.as_bytes(),
            &[0x0A, 0x09, 0x00, 0x08, 0x00, 0x01, 0x00, 0x05, 0xDF, 0xFF]
        );
    }

    #[test]
    fn test_read_parameter_request_with_arguments() {
        let frame = ReadParameterRequest {
            parameter_id: 0x13,
            arguments: vec![0x01],
        }
        .encode(1);
        // Inner length counts the identifier plus the selector byte.
        assert_eq!(frame.payload(), &[0x02, 0x00, 0x13, 0x01]);
    }

    #[test]
    fn test_write_parameter_request_encoding() {
        let frame = WriteParameterRequest {
            parameter_id: 0x26,
            value: 600u32.to_le_bytes().to_vec(),
        }
        .encode(0x0B);
        assert_eq!(
            frame.as_bytes(),
            &[0x0B, 0x0B, 0x00, 0x0C, 0x00, 0x05, 0x00, 0x26, 0x58, 0x02, 0x00, 0x00, 0x59, 0xFF]
        );
    }

    #[test]
    fn test_read_received_data_request_without_flags() {
        let frame = ReadReceivedDataRequest::default().encode(6);
        assert_eq!(
            frame.as_bytes(),
            &[0x17, 0x06, 0x00, 0x07, 0x00, 0x00, 0x00, 0xDC, 0xFF]
        );
    }

    #[test]
    fn test_read_received_data_request_with_flags() {
        let frame = ReadReceivedDataRequest {
            flags: ReceiveFlags::SHORT_AND_EXTENDED,
        }
        .encode(7);
        assert_eq!(
            frame.as_bytes(),
            &[0x17, 0x07, 0x00, 0x08, 0x00, 0x01, 0x00, 0x04, 0xD5, 0xFF]
        );
    }

    #[test]
    fn test_query_send_data_request_encoding() {
        let frame = QuerySendDataRequest.encode(8);
        assert_eq!(frame.as_bytes(), &[0x04, 0x08, 0x00, 0x05, 0x00, 0xEF, 0xFF]);
    }

    #[test]
    fn test_update_neighbor_request_encoding() {
        let frame = UpdateNeighborRequest {
            action: NeighborAction::Add,
            short: 0x1122,
            extended: 0x0123456789ABCDEF,
            capabilities: MacCapabilities::FFD
                .with(MacCapabilities::MAINS_POWERED)
                .with(MacCapabilities::RECEIVER_ON_WHEN_IDLE)
                .with(MacCapabilities::ALLOCATE_ADDRESS),
        }
        .encode(9);
        assert_eq!(
            frame.as_bytes(),
            &[
                0x1D, 0x09, 0x00, 0x11, 0x00, 0x01, 0x22, 0x11, 0xEF, 0xCD, 0xAB, 0x89, 0x67,
                0x45, 0x23, 0x01, 0x8E, 0x47, 0xFB
            ]
        );
    }

    #[test]
    fn test_aps_data_request_unicast_encoding() {
        let frame = ApsDataRequest {
            request_id: 0x10,
            destination: Address::nwk(0x1234, 1),
            profile_id: 0x0104,
            cluster_id: 0x0006,
            source_endpoint: 1,
            asdu: vec![0x01, 0x00],
            tx_options: TxOptions::USE_APS_ACK,
            radius: 0,
            source_route: Vec::new(),
        }
        .encode(0x0A);
        assert_eq!(
            frame.as_bytes(),
            &[
                0x12, 0x0A, 0x00, 0x18, 0x00, 0x11, 0x00, 0x10, 0x00, 0x02, 0x34, 0x12, 0x01,
                0x04, 0x01, 0x06, 0x00, 0x01, 0x02, 0x00, 0x01, 0x00, 0x04, 0x00, 0x4F, 0xFF
            ]
        );
    }

    #[test]
    fn test_aps_data_request_source_route_encoding() {
        let frame = ApsDataRequest {
            request_id: 0x11,
            destination: Address::nwk(0x4455, 2),
            profile_id: 0x0104,
            cluster_id: 0x0500,
            source_endpoint: 1,
            asdu: vec![0xAA],
            tx_options: TxOptions::default(),
            radius: 5,
            source_route: vec![0x0001, 0x0002],
        }
        .encode(0x0B);
        assert_eq!(
            frame.as_bytes(),
            &[
                0x12, 0x0B, 0x00, 0x1C, 0x00, 0x15, 0x00, 0x11, 0x02, 0x02, 0x55, 0x44, 0x02,
                0x04, 0x01, 0x00, 0x05, 0x01, 0x01, 0x00, 0xAA, 0x00, 0x05, 0x02, 0x01, 0x00,
                0x02, 0x00, 0x42, 0xFE
            ]
        );
    }

    #[test]
    fn test_aps_data_request_group_omits_endpoint() {
        let frame = ApsDataRequest {
            request_id: 0x12,
            destination: Address::group(0x0010),
            profile_id: 0x0104,
            cluster_id: 0x0008,
            source_endpoint: 1,
            asdu: vec![0x00],
            tx_options: TxOptions::default(),
            radius: 0,
            source_route: Vec::new(),
        }
        .encode(0x0C);
        assert_eq!(
            frame.as_bytes(),
            &[
                0x12, 0x0C, 0x00, 0x16, 0x00, 0x0F, 0x00, 0x12, 0x00, 0x01, 0x10, 0x00, 0x04,
                0x01, 0x08, 0x00, 0x01, 0x01, 0x00, 0x00, 0x00, 0x00, 0x8B, 0xFF
            ]
        );
    }
}
