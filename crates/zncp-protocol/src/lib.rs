//! deCONZ ZigBee NCP Serial Protocol
//!
//! This crate provides the wire-level types for talking to a deCONZ-family
//! ZigBee network coprocessor (ConBee, ConBee II) over its serial protocol.
//! Every exchanged unit is a checksummed frame carrying a command id, a
//! sequence number for request/response correlation, a status byte, and a
//! command-specific payload.
//!
//! # Frame layout
//!
//! ```text
//! offset  size  field
//! 0       1     command id
//! 1       1     sequence number
//! 2       1     status (0 = success, nonzero = device failure)
//! 3       2     total length, little-endian (= 5 + payload length)
//! 5       N     payload
//! 5+N     2     additive checksum, little-endian
//! ```
//!
//! Messages are either:
//!
//! - **Requests** (host → device): a [`Request`] encodes itself into a frame
//!   with a caller-supplied sequence number.
//! - **Responses** (device → host): a [`Response`] decodes the frame the
//!   device sends back under the same command id and sequence number.
//! - **Notifications** (device → host, unsolicited): frames that correlate to
//!   no outstanding request, classified into [`Notification`] shapes.
//!
//! # Example
//!
//! ```rust,ignore
//! use zncp_protocol::{Request, Response, VersionRequest, VersionResponse};
//!
//! let frame = VersionRequest.encode(seq);
//! // ... write frame, read reply frame ...
//! let mut version = VersionResponse::default();
//! version.decode(&reply)?;
//! ```

mod commands;
mod constants;
mod contract;
mod error;
mod frame;
mod notifications;
mod params;
mod responses;
mod types;
mod wire;

pub use commands::*;
pub use constants::*;
pub use contract::*;
pub use error::*;
pub use frame::*;
pub use notifications::*;
pub use params::*;
pub use responses::*;
pub use types::*;
