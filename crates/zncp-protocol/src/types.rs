//! Common types used in the protocol.

use crate::error::ProtocolError;
use crate::wire::WireReader;

// ============================================================================
// Platform / network state
// ============================================================================

/// Hardware platform byte reported by the version command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// Original ConBee stick.
    ConBee,
    /// ConBee II stick.
    ConBee2,
    /// Platform byte outside the documented set.
    Unknown(u8),
}

impl Default for Platform {
    fn default() -> Self {
        Platform::Unknown(0)
    }
}

impl From<u8> for Platform {
    fn from(value: u8) -> Self {
        match value {
            0x05 => Platform::ConBee,
            0x07 => Platform::ConBee2,
            _ => Platform::Unknown(value),
        }
    }
}

impl From<Platform> for u8 {
    fn from(value: Platform) -> Self {
        match value {
            Platform::ConBee => 0x05,
            Platform::ConBee2 => 0x07,
            Platform::Unknown(v) => v,
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Platform::ConBee => write!(f, "ConBee"),
            Platform::ConBee2 => write!(f, "ConBee II"),
            Platform::Unknown(v) => write!(f, "unknown (0x{:02X})", v),
        }
    }
}

/// Network participation state of the coprocessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NetworkState {
    /// Not part of a network.
    #[default]
    Offline,
    /// Joining or forming a network.
    Joining,
    /// Joined and operational.
    Connected,
    /// Leaving the network.
    Leaving,
}

impl NetworkState {
    /// Decode from the low two bits of a state byte.
    pub fn from_low_bits(byte: u8) -> Self {
        match byte & 0b11 {
            0 => NetworkState::Offline,
            1 => NetworkState::Joining,
            2 => NetworkState::Connected,
            _ => NetworkState::Leaving,
        }
    }
}

impl From<NetworkState> for u8 {
    fn from(value: NetworkState) -> Self {
        match value {
            NetworkState::Offline => 0,
            NetworkState::Joining => 1,
            NetworkState::Connected => 2,
            NetworkState::Leaving => 3,
        }
    }
}

impl std::fmt::Display for NetworkState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NetworkState::Offline => write!(f, "offline"),
            NetworkState::Joining => write!(f, "joining"),
            NetworkState::Connected => write!(f, "connected"),
            NetworkState::Leaving => write!(f, "leaving"),
        }
    }
}

/// The device-state bitfield the firmware reports in several responses and in
/// the device-state-changed notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceState {
    /// Current network state (bits 0-1).
    pub network_state: NetworkState,
    /// An APSDE data confirm is ready to be fetched (bit 2).
    pub data_confirm: bool,
    /// An APSDE data indication is ready to be fetched (bit 3).
    pub data_indication: bool,
    /// The device configuration changed (bit 4).
    pub configuration_changed: bool,
    /// The outgoing APS request queue has free slots (bit 5).
    pub free_slots: bool,
}

impl DeviceState {
    /// Unpack the bitfield byte.
    pub fn from_byte(byte: u8) -> Self {
        DeviceState {
            network_state: NetworkState::from_low_bits(byte),
            data_confirm: byte & 0b0000_0100 > 0,
            data_indication: byte & 0b0000_1000 > 0,
            configuration_changed: byte & 0b0001_0000 > 0,
            free_slots: byte & 0b0010_0000 > 0,
        }
    }
}

// ============================================================================
// Addressing
// ============================================================================

/// How an APS address field is expressed on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressMode {
    /// 16-bit group address.
    Group,
    /// 16-bit network (short) address.
    Nwk,
    /// 64-bit IEEE (extended) address.
    Ieee,
    /// Both short and extended addresses.
    NwkAndIeee,
}

impl AddressMode {
    pub(crate) fn from_byte(byte: u8) -> Result<Self, ProtocolError> {
        match byte {
            1 => Ok(AddressMode::Group),
            2 => Ok(AddressMode::Nwk),
            3 => Ok(AddressMode::Ieee),
            4 => Ok(AddressMode::NwkAndIeee),
            other => Err(ProtocolError::InvalidAddressMode(other)),
        }
    }
}

impl From<AddressMode> for u8 {
    fn from(value: AddressMode) -> Self {
        match value {
            AddressMode::Group => 1,
            AddressMode::Nwk => 2,
            AddressMode::Ieee => 3,
            AddressMode::NwkAndIeee => 4,
        }
    }
}

/// An APS-level address plus endpoint.
///
/// The endpoint is meaningful for unicast modes; group addresses have none on
/// the sending side, but indication payloads still carry an endpoint byte for
/// every mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Address {
    /// Wire form of the address.
    pub mode: AddressMode,
    /// Short (network or group) address; zero when the mode has none.
    pub short: u16,
    /// Extended IEEE address; zero when the mode has none.
    pub extended: u64,
    /// Destination/source endpoint.
    pub endpoint: u8,
}

impl Default for Address {
    fn default() -> Self {
        Address::nwk(0, 0)
    }
}

impl Address {
    /// A group address.
    pub fn group(address: u16) -> Self {
        Address {
            mode: AddressMode::Group,
            short: address,
            extended: 0,
            endpoint: 0,
        }
    }

    /// A short-address unicast.
    pub fn nwk(address: u16, endpoint: u8) -> Self {
        Address {
            mode: AddressMode::Nwk,
            short: address,
            extended: 0,
            endpoint,
        }
    }

    /// An extended-address unicast.
    pub fn ieee(address: u64, endpoint: u8) -> Self {
        Address {
            mode: AddressMode::Ieee,
            short: 0,
            extended: address,
            endpoint,
        }
    }

    /// Append the mode byte and address body (no endpoint) to `out`.
    pub(crate) fn encode_base(&self, out: &mut Vec<u8>) {
        out.push(self.mode.into());
        match self.mode {
            AddressMode::Group | AddressMode::Nwk => {
                out.extend_from_slice(&self.short.to_le_bytes());
            }
            AddressMode::Ieee => {
                out.extend_from_slice(&self.extended.to_le_bytes());
            }
            AddressMode::NwkAndIeee => {
                out.extend_from_slice(&self.short.to_le_bytes());
                out.extend_from_slice(&self.extended.to_le_bytes());
            }
        }
    }

    /// Decode mode byte and address body. The caller reads the endpoint
    /// separately where the layout carries one.
    pub(crate) fn decode_base(r: &mut WireReader<'_>) -> Result<Self, ProtocolError> {
        let mode = AddressMode::from_byte(r.u8()?)?;
        let mut addr = Address {
            mode,
            short: 0,
            extended: 0,
            endpoint: 0,
        };
        match mode {
            AddressMode::Group | AddressMode::Nwk => addr.short = r.u16()?,
            AddressMode::Ieee => addr.extended = r.u64()?,
            AddressMode::NwkAndIeee => {
                addr.short = r.u16()?;
                addr.extended = r.u64()?;
            }
        }
        Ok(addr)
    }
}

// ============================================================================
// Flag bytes
// ============================================================================

/// Transmit options for an APS data request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TxOptions(pub u8);

impl TxOptions {
    /// Request an APS-level acknowledgement.
    pub const USE_APS_ACK: TxOptions = TxOptions(0x04);

    /// Union of two option sets.
    pub fn with(self, other: TxOptions) -> TxOptions {
        TxOptions(self.0 | other.0)
    }
}

/// Flags for reading a received-data indication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReceiveFlags(pub u8);

impl ReceiveFlags {
    /// Report the source by short address.
    pub const SHORT_SOURCE: ReceiveFlags = ReceiveFlags(0x01);
    /// Include the last-hop fields.
    pub const LAST_HOP: ReceiveFlags = ReceiveFlags(0x02);
    /// Include both short and extended source addresses.
    pub const SHORT_AND_EXTENDED: ReceiveFlags = ReceiveFlags(0x04);

    /// Union of two flag sets.
    pub fn with(self, other: ReceiveFlags) -> ReceiveFlags {
        ReceiveFlags(self.0 | other.0)
    }

    /// True when no flag is set.
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

/// MAC capability bits announced when adding a neighbor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MacCapabilities(pub u8);

impl MacCapabilities {
    /// Can become a PAN coordinator.
    pub const ALTERNATE_COORDINATOR: MacCapabilities = MacCapabilities(0x01);
    /// Full-function device.
    pub const FFD: MacCapabilities = MacCapabilities(0x02);
    /// Mains powered.
    pub const MAINS_POWERED: MacCapabilities = MacCapabilities(0x04);
    /// Receiver stays on while idle.
    pub const RECEIVER_ON_WHEN_IDLE: MacCapabilities = MacCapabilities(0x08);
    /// Supports secured frames.
    pub const SECURITY: MacCapabilities = MacCapabilities(0x40);
    /// Requests address allocation from the coordinator.
    pub const ALLOCATE_ADDRESS: MacCapabilities = MacCapabilities(0x80);

    /// Union of two capability sets.
    pub fn with(self, other: MacCapabilities) -> MacCapabilities {
        MacCapabilities(self.0 | other.0)
    }

    /// True when every bit of `other` is set.
    pub fn has(&self, other: MacCapabilities) -> bool {
        self.0 & other.0 == other.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_state_unpacks_bits() {
        let state = DeviceState::from_byte(0x2A);
        assert_eq!(state.network_state, NetworkState::Connected);
        assert!(!state.data_confirm);
        assert!(state.data_indication);
        assert!(!state.configuration_changed);
        assert!(state.free_slots);
    }

    #[test]
    fn test_address_round_trip_nwk() {
        let addr = Address::nwk(0x1234, 7);
        let mut out = Vec::new();
        addr.encode_base(&mut out);
        assert_eq!(out, vec![0x02, 0x34, 0x12]);

        let mut r = WireReader::new(&out);
        let decoded = Address::decode_base(&mut r).unwrap();
        assert_eq!(decoded.mode, AddressMode::Nwk);
        assert_eq!(decoded.short, 0x1234);
    }

    #[test]
    fn test_address_round_trip_combined() {
        let addr = Address {
            mode: AddressMode::NwkAndIeee,
            short: 0xAABB,
            extended: 0x0011223344556677,
            endpoint: 1,
        };
        let mut out = Vec::new();
        addr.encode_base(&mut out);
        assert_eq!(out.len(), 1 + 2 + 8);

        let mut r = WireReader::new(&out);
        let decoded = Address::decode_base(&mut r).unwrap();
        assert_eq!(decoded.short, 0xAABB);
        assert_eq!(decoded.extended, 0x0011223344556677);
    }

    #[test]
    fn test_address_rejects_unknown_mode() {
        let mut r = WireReader::new(&[0x09, 0x00, 0x00]);
        assert_eq!(
            Address::decode_base(&mut r).unwrap_err(),
            ProtocolError::InvalidAddressMode(0x09)
        );
    }

    #[test]
    fn test_mac_capabilities_union() {
        let caps = MacCapabilities::FFD
            .with(MacCapabilities::MAINS_POWERED)
            .with(MacCapabilities::ALLOCATE_ADDRESS);
        assert_eq!(caps.0, 0x86);
        assert!(caps.has(MacCapabilities::FFD));
        assert!(!caps.has(MacCapabilities::SECURITY));
    }
}
