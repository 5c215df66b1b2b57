use thiserror::Error;
use zncp_protocol::ProtocolError;

/// Errors surfaced by [`Link`](crate::Link) operations.
///
/// Device-reported failures arrive as
/// [`ProtocolError::Device`](zncp_protocol::ProtocolError::Device) through the
/// `Protocol` variant; the remaining variants describe the engine itself.
#[derive(Debug, Error)]
pub enum LinkError {
    /// The serial port (or test transport) failed to read or write.
    #[error("transport failure: {0}")]
    Transport(#[from] std::io::Error),

    /// No matching response arrived within the command timeout.
    #[error("command timed out")]
    Timeout,

    /// The handler was told to exit while the exchange was still pending.
    #[error("exit signalled before the exchange completed")]
    Exited,

    /// The link was closed before or while the command was queued.
    #[error("link is closed")]
    Closed,

    /// The response frame arrived but could not be decoded, or carried a
    /// failure status.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl LinkError {
    /// True when the failure came from the device rather than the link.
    pub fn is_device_error(&self) -> bool {
        matches!(self, LinkError::Protocol(ProtocolError::Device(_)))
    }
}
