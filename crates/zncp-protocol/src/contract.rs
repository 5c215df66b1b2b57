//! Traits connecting command codecs to the transport layer.

use crate::error::ProtocolError;
use crate::frame::Frame;

/// An outgoing command that can be serialized into a frame.
///
/// A request only learns its sequence number at send time, when the link
/// allocates one, so encoding takes the sequence as an argument.
pub trait Request: Send {
    /// Command identifier this request is sent with.
    fn command_id(&self) -> u8;

    /// Serialize into a complete frame carrying `sequence`.
    fn encode(&self, sequence: u8) -> Frame;
}

/// An incoming response that can be populated from a frame.
///
/// Decoding mutates the receiver in place so the caller can construct the
/// response value up front and hand it to the link, which fills it in once
/// the matching frame arrives.
pub trait Response: Send {
    /// Command identifier the matching response frame carries.
    fn command_id(&self) -> u8;

    /// Populate from a verified frame.
    ///
    /// Implementations check the frame status byte first and surface firmware
    /// errors before touching the payload.
    fn decode(&mut self, frame: &Frame) -> Result<(), ProtocolError>;
}
