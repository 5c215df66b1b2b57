//! Firmware configuration parameters.
//!
//! Parameters are read and written as raw little-endian byte strings; the
//! [`ParameterValue`] trait maps them to and from typed values. Indexed
//! parameters (ZDO descriptor slots, link keys) take selector bytes in the
//! request before the value.

use crate::error::ProtocolError;
use crate::wire::WireReader;

// ============================================================================
// Parameter identifiers
// ============================================================================

/// MAC address of the stick. Read-only, u64.
pub const PARAM_MAC_ADDRESS: u8 = 0x01;
/// NWK PAN id. Read-write, u16.
pub const PARAM_NWK_PANID: u8 = 0x05;
/// Own short address. Read-only, u16.
pub const PARAM_NWK_ADDRESS: u8 = 0x07;
/// Extended PAN id of the joined network. Read-only, u64.
pub const PARAM_NWK_EXTENDED_PANID: u8 = 0x08;
/// 0 = join as router, 1 = form a network as coordinator. Read-write, u8.
pub const PARAM_APS_DESIGNED_COORDINATOR: u8 = 0x09;
/// Bitmask of channels to scan or operate on. Read-write, u32.
pub const PARAM_CHANNEL_MASK: u8 = 0x0A;
/// APS use extended PAN id. Read-write, u64.
pub const PARAM_APS_EXTENDED_PANID: u8 = 0x0B;
/// Trust center IEEE address. Read-write, u64.
pub const PARAM_TRUST_CENTER_ADDRESS: u8 = 0x0E;
/// Security mode, see [`SecurityMode`]. Read-write, u8.
pub const PARAM_SECURITY_MODE: u8 = 0x10;
/// ZDO endpoint descriptor slot, indexed by a slot byte. Read-write.
pub const PARAM_ZDO_SLOT: u8 = 0x13;
/// 0 = pick the PAN id dynamically, 1 = use the configured NWK PAN id.
/// Read-write, u8.
pub const PARAM_PREDEFINED_NWK_PANID: u8 = 0x15;
/// Network encryption key. Read-write, 16 bytes.
pub const PARAM_NETWORK_KEY: u8 = 0x18;
/// Link key, indexed by the peer MAC address. The key bytes appear only in
/// write requests and read responses. Read-write.
pub const PARAM_LINK_KEY: u8 = 0x19;
/// Operating channel, 11-26. Read-only, u8.
pub const PARAM_CURRENT_CHANNEL: u8 = 0x1C;
/// Permit-join duration in seconds; 0 closed, 0xFF open. Read-write, u8.
pub const PARAM_OPEN_NETWORK: u8 = 0x21;
/// Serial protocol version of the firmware. Read-only, u16.
pub const PARAM_PROTOCOL_VERSION: u8 = 0x22;
/// NWK update id. Read-write, u8.
pub const PARAM_NWK_UPDATE_ID: u8 = 0x24;
/// Watchdog timeout in seconds; the application must rewrite it
/// periodically or the firmware reboots. Read-write, u32.
pub const PARAM_WATCHDOG_TTL: u8 = 0x26;
/// Outgoing security frame counter. Set only when joining or forming.
/// Read-write, u32.
pub const PARAM_NWK_FRAME_COUNTER: u8 = 0x27;
/// Bitmap of ZDP responses handed to the application instead of being
/// answered by the firmware. Resets on power-up. Read-write, u16.
pub const PARAM_APP_ZDP_HANDLING: u8 = 0x28;

/// App-ZDP-handling flag: the application answers node descriptor requests.
pub const APP_ZDP_HANDLE_NODE_DESCRIPTOR: u16 = 0x0001;

/// Human-readable parameter name for logs.
pub fn parameter_name(id: u8) -> &'static str {
    match id {
        PARAM_MAC_ADDRESS => "mac_address",
        PARAM_NWK_PANID => "nwk_panid",
        PARAM_NWK_ADDRESS => "nwk_address",
        PARAM_NWK_EXTENDED_PANID => "nwk_extended_panid",
        PARAM_APS_DESIGNED_COORDINATOR => "aps_designed_coordinator",
        PARAM_CHANNEL_MASK => "channel_mask",
        PARAM_APS_EXTENDED_PANID => "aps_extended_panid",
        PARAM_TRUST_CENTER_ADDRESS => "trust_center_address",
        PARAM_SECURITY_MODE => "security_mode",
        PARAM_ZDO_SLOT => "zdo_slot",
        PARAM_PREDEFINED_NWK_PANID => "predefined_nwk_panid",
        PARAM_NETWORK_KEY => "network_key",
        PARAM_LINK_KEY => "link_key",
        PARAM_CURRENT_CHANNEL => "current_channel",
        PARAM_OPEN_NETWORK => "open_network",
        PARAM_PROTOCOL_VERSION => "protocol_version",
        PARAM_NWK_UPDATE_ID => "nwk_update_id",
        PARAM_WATCHDOG_TTL => "watchdog_ttl",
        PARAM_NWK_FRAME_COUNTER => "nwk_frame_counter",
        PARAM_APP_ZDP_HANDLING => "app_zdp_handling",
        _ => "unknown",
    }
}

// ============================================================================
// Value enums
// ============================================================================

/// Values of the security-mode parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityMode {
    /// No security.
    None,
    /// Preconfigured network key.
    PreconfiguredNetworkKey,
    /// Network key delivered by the trust center.
    NetworkKeyFromTrustCenter,
    /// No master key, trust center link key only.
    NoMasterTrustCenterLinkKey,
    /// Mode byte outside the documented set.
    Unknown(u8),
}

impl From<u8> for SecurityMode {
    fn from(value: u8) -> Self {
        match value {
            0 => SecurityMode::None,
            1 => SecurityMode::PreconfiguredNetworkKey,
            2 => SecurityMode::NetworkKeyFromTrustCenter,
            3 => SecurityMode::NoMasterTrustCenterLinkKey,
            _ => SecurityMode::Unknown(value),
        }
    }
}

impl From<SecurityMode> for u8 {
    fn from(value: SecurityMode) -> Self {
        match value {
            SecurityMode::None => 0,
            SecurityMode::PreconfiguredNetworkKey => 1,
            SecurityMode::NetworkKeyFromTrustCenter => 2,
            SecurityMode::NoMasterTrustCenterLinkKey => 3,
            SecurityMode::Unknown(v) => v,
        }
    }
}

/// Values of the predefined-PAN-id parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanidMode {
    /// The firmware selects or obtains the PAN id dynamically.
    Dynamic,
    /// The configured NWK PAN id is used to join or form.
    Predefined,
}

impl From<PanidMode> for u8 {
    fn from(value: PanidMode) -> Self {
        match value {
            PanidMode::Dynamic => 0,
            PanidMode::Predefined => 1,
        }
    }
}

// ============================================================================
// Value encoding
// ============================================================================

/// A value that travels in read/write-parameter payloads.
pub trait ParameterValue: Sized {
    /// Append the little-endian wire form to `out`.
    fn encode(&self, out: &mut Vec<u8>);

    /// Parse from the value bytes of a read response. Trailing bytes beyond
    /// the value are ignored.
    fn decode(bytes: &[u8]) -> Result<Self, ProtocolError>;
}

macro_rules! int_parameter_value {
    ($($t:ty),*) => {
        $(impl ParameterValue for $t {
            fn encode(&self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_le_bytes());
            }

            fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
                const N: usize = std::mem::size_of::<$t>();
                let raw = bytes.get(..N).ok_or(ProtocolError::InvalidParameterLength {
                    expected: N,
                    actual: bytes.len(),
                })?;
                let mut fixed = [0u8; N];
                fixed.copy_from_slice(raw);
                Ok(<$t>::from_le_bytes(fixed))
            }
        })*
    };
}

int_parameter_value!(u8, u16, u32, u64);

impl ParameterValue for [u8; 16] {
    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self);
    }

    fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        let raw = bytes.get(..16).ok_or(ProtocolError::InvalidParameterLength {
            expected: 16,
            actual: bytes.len(),
        })?;
        let mut key = [0u8; 16];
        key.copy_from_slice(raw);
        Ok(key)
    }
}

// ============================================================================
// ZDO descriptor slots
// ============================================================================

/// Simple descriptor stored in a ZDO endpoint slot.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ZdoDescriptor {
    /// Endpoint number.
    pub endpoint: u8,
    /// Application profile identifier.
    pub profile_id: u16,
    /// Device identifier within the profile.
    pub device_id: u16,
    /// Device version.
    pub device_version: u8,
    /// Server (input) clusters.
    pub in_clusters: Vec<u16>,
    /// Client (output) clusters.
    pub out_clusters: Vec<u16>,
}

impl ZdoDescriptor {
    /// Factory default for slot 0: a Home Automation endpoint.
    pub fn default_slot0() -> Self {
        ZdoDescriptor {
            endpoint: 0x01,
            profile_id: 0x0104,
            device_id: 0x0005,
            device_version: 0x01,
            in_clusters: vec![0x0000, 0x0006, 0x000A, 0x0019, 0x0501],
            out_clusters: vec![0x0001, 0x0020, 0x0500, 0x0502],
        }
    }

    /// Factory default for slot 1: the Green Power endpoint.
    pub fn default_slot1() -> Self {
        ZdoDescriptor {
            endpoint: 0xF2,
            profile_id: 0xA1E0,
            device_id: 0x0064,
            device_version: 0x01,
            in_clusters: Vec::new(),
            out_clusters: vec![0x0021],
        }
    }
}

impl ParameterValue for ZdoDescriptor {
    fn encode(&self, out: &mut Vec<u8>) {
        out.push(self.endpoint);
        out.extend_from_slice(&self.profile_id.to_le_bytes());
        out.extend_from_slice(&self.device_id.to_le_bytes());
        out.push(self.device_version);
        out.push(self.in_clusters.len() as u8);
        for cluster in &self.in_clusters {
            out.extend_from_slice(&cluster.to_le_bytes());
        }
        out.push(self.out_clusters.len() as u8);
        for cluster in &self.out_clusters {
            out.extend_from_slice(&cluster.to_le_bytes());
        }
    }

    // Read responses prefix the descriptor with the slot index byte; the
    // write form does not carry it (the slot travels as a selector instead).
    fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        let mut r = WireReader::new(bytes);
        r.skip(1)?;
        let endpoint = r.u8()?;
        let profile_id = r.u16()?;
        let device_id = r.u16()?;
        let device_version = r.u8()?;
        let n_in = r.u8()?;
        let mut in_clusters = Vec::with_capacity(n_in as usize);
        for _ in 0..n_in {
            in_clusters.push(r.u16()?);
        }
        let n_out = r.u8()?;
        let mut out_clusters = Vec::with_capacity(n_out as usize);
        for _ in 0..n_out {
            out_clusters.push(r.u16()?);
        }
        Ok(ZdoDescriptor {
            endpoint,
            profile_id,
            device_id,
            device_version,
            in_clusters,
            out_clusters,
        })
    }
}

impl std::fmt::Display for ZdoDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ep 0x{:02X} profile 0x{:04X} device 0x{:04X} v{} in {:04X?} out {:04X?}",
            self.endpoint,
            self.profile_id,
            self.device_id,
            self.device_version,
            self.in_clusters,
            self.out_clusters
        )
    }
}
