//! Protocol constants
//!
//! Command id bytes and frame geometry for the deCONZ serial protocol. The
//! same id space is used in both directions: a response frame carries the id
//! of the request it answers, and unsolicited frames carry the id of the
//! notification kind.

// ============================================================================
// Command Ids
// ============================================================================

/// Query the delivery state of a previously enqueued APS data request.
pub const CMD_APS_DATA_CONFIRM: u8 = 0x04;
/// Read the device state bitfield.
pub const CMD_DEVICE_STATE: u8 = 0x07;
/// Request a network state transition (offline/joining/connected/leaving).
pub const CMD_CHANGE_NETWORK_STATE: u8 = 0x08;
/// Read a device parameter.
pub const CMD_READ_PARAMETER: u8 = 0x0A;
/// Write a device parameter.
pub const CMD_WRITE_PARAMETER: u8 = 0x0B;
/// Read the firmware version and platform.
pub const CMD_VERSION: u8 = 0x0D;
/// Unsolicited: the device state bitfield changed.
pub const CMD_DEVICE_STATE_CHANGED: u8 = 0x0E;
/// Enqueue an APS data request (send to the network).
pub const CMD_APS_DATA_REQUEST: u8 = 0x12;
/// Unsolicited: green power frame received.
pub const CMD_GREEN_POWER: u8 = 0x19;
/// Read a received APS data indication.
pub const CMD_APS_DATA_INDICATION: u8 = 0x17;
/// Unsolicited: MAC poll from a child device.
pub const CMD_MAC_POLL_INDICATION: u8 = 0x1C;
/// Add or remove a neighbor table entry.
pub const CMD_UPDATE_NEIGHBOR: u8 = 0x1D;
/// Unsolicited: MAC beacon observed.
pub const CMD_MAC_BEACON_INDICATION: u8 = 0x1F;
/// Switch the device into the bootloader for a firmware update.
pub const CMD_UPDATE_BOOTLOADER: u8 = 0x21;

// ============================================================================
// Status Bytes (device → host, byte 2 of every response frame)
// ============================================================================

/// Command executed successfully.
pub const STATUS_SUCCESS: u8 = 0x00;
/// Command failed.
pub const STATUS_FAILURE: u8 = 0x01;
/// Device is busy; retry later.
pub const STATUS_BUSY: u8 = 0x02;
/// Device-side timeout.
pub const STATUS_TIMEOUT: u8 = 0x03;
/// Command or parameter not supported.
pub const STATUS_UNSUPPORTED: u8 = 0x04;
/// Internal device error.
pub const STATUS_ERROR: u8 = 0x05;
/// Device is not joined to a network.
pub const STATUS_NO_NETWORK: u8 = 0x06;
/// Rejected value in the request payload.
pub const STATUS_INVALID_VALUE: u8 = 0x07;

// ============================================================================
// Frame geometry
// ============================================================================

/// Bytes before the payload: command id, sequence, status, u16 length.
pub const FRAME_HEADER_LEN: usize = 5;
/// Trailing checksum bytes.
pub const FRAME_CHECKSUM_LEN: usize = 2;
/// Shortest byte sequence the checksum can be verified over.
pub const FRAME_MIN_LEN: usize = 3;

/// Human-readable name for a command id, for logs and display.
pub fn command_name(command_id: u8) -> &'static str {
    match command_id {
        CMD_APS_DATA_CONFIRM => "aps_data_confirm",
        CMD_DEVICE_STATE => "device_state",
        CMD_CHANGE_NETWORK_STATE => "change_network_state",
        CMD_READ_PARAMETER => "read_parameter",
        CMD_WRITE_PARAMETER => "write_parameter",
        CMD_VERSION => "version",
        CMD_DEVICE_STATE_CHANGED => "device_state_changed",
        CMD_APS_DATA_REQUEST => "aps_data_request",
        CMD_GREEN_POWER => "green_power",
        CMD_APS_DATA_INDICATION => "aps_data_indication",
        CMD_MAC_POLL_INDICATION => "mac_poll_indication",
        CMD_UPDATE_NEIGHBOR => "update_neighbor",
        CMD_MAC_BEACON_INDICATION => "mac_beacon_indication",
        CMD_UPDATE_BOOTLOADER => "update_bootloader",
        _ => "unknown",
    }
}
