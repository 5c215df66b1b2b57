//! Protocol error types.

use thiserror::Error;

/// Errors that can occur when working with the NCP serial protocol.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Frame payload is too short for the field being decoded.
    #[error("frame too short: expected at least {expected} bytes, got {actual}")]
    FrameTooShort {
        /// Expected minimum length.
        expected: usize,
        /// Actual length available.
        actual: usize,
    },

    /// The device reported a failure in the frame's status byte.
    #[error("device status: {0}")]
    Device(DeviceStatus),

    /// An address field carried a mode byte outside the defined set.
    #[error("invalid address mode: 0x{0:02X}")]
    InvalidAddressMode(u8),

    /// A parameter value did not have the length its type requires.
    #[error("invalid parameter length: expected {expected} bytes, got {actual}")]
    InvalidParameterLength {
        /// Length the parameter type requires.
        expected: usize,
        /// Actual value length.
        actual: usize,
    },
}

/// Failure kinds a device reports in the status byte of a response frame.
///
/// Status 0 is success and never appears here; every nonzero byte maps onto
/// one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceStatus {
    /// Generic failure.
    Failure,
    /// Device busy; the request can be retried.
    Busy,
    /// Device-side timeout.
    Timeout,
    /// Command or parameter not supported by this firmware.
    Unsupported,
    /// Internal device error.
    Error,
    /// Not joined to a network.
    NoNetwork,
    /// A value in the request was rejected.
    InvalidValue,
    /// Status byte outside the documented set.
    Unknown(u8),
}

impl std::fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceStatus::Failure => write!(f, "failure"),
            DeviceStatus::Busy => write!(f, "busy"),
            DeviceStatus::Timeout => write!(f, "timeout"),
            DeviceStatus::Unsupported => write!(f, "unsupported"),
            DeviceStatus::Error => write!(f, "error"),
            DeviceStatus::NoNetwork => write!(f, "no network"),
            DeviceStatus::InvalidValue => write!(f, "invalid value"),
            DeviceStatus::Unknown(code) => write!(f, "unknown status (0x{:02X})", code),
        }
    }
}

impl From<u8> for DeviceStatus {
    fn from(code: u8) -> Self {
        use crate::constants::*;
        match code {
            STATUS_FAILURE => DeviceStatus::Failure,
            STATUS_BUSY => DeviceStatus::Busy,
            STATUS_TIMEOUT => DeviceStatus::Timeout,
            STATUS_UNSUPPORTED => DeviceStatus::Unsupported,
            STATUS_ERROR => DeviceStatus::Error,
            STATUS_NO_NETWORK => DeviceStatus::NoNetwork,
            STATUS_INVALID_VALUE => DeviceStatus::InvalidValue,
            _ => DeviceStatus::Unknown(code),
        }
    }
}

impl From<DeviceStatus> for u8 {
    fn from(status: DeviceStatus) -> Self {
        use crate::constants::*;
        match status {
            DeviceStatus::Failure => STATUS_FAILURE,
            DeviceStatus::Busy => STATUS_BUSY,
            DeviceStatus::Timeout => STATUS_TIMEOUT,
            DeviceStatus::Unsupported => STATUS_UNSUPPORTED,
            DeviceStatus::Error => STATUS_ERROR,
            DeviceStatus::NoNetwork => STATUS_NO_NETWORK,
            DeviceStatus::InvalidValue => STATUS_INVALID_VALUE,
            DeviceStatus::Unknown(code) => code,
        }
    }
}
