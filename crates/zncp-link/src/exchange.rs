//! The unit of work flowing through the engine: one request paired with the
//! completion that resolves the caller's wait.

use std::time::Instant;

use crossbeam_channel::Sender;
use zncp_protocol::{Frame, Request, Response};

use crate::error::LinkError;

/// Resolves a caller blocked in [`Link::execute`](crate::Link::execute).
///
/// Exactly one of the two methods is called, exactly once; both consume the
/// completion to make a second resolution unrepresentable.
pub(crate) trait Completion: Send {
    fn complete_frame(self: Box<Self>, frame: &Frame);
    fn complete_err(self: Box<Self>, err: LinkError);
}

/// Completion that decodes the matched frame into a concrete response type
/// and sends the result back over a rendezvous channel.
pub(crate) struct TypedCompletion<S: Response> {
    pub(crate) response: S,
    pub(crate) tx: Sender<Result<S, LinkError>>,
}

impl<S: Response> Completion for TypedCompletion<S> {
    fn complete_frame(mut self: Box<Self>, frame: &Frame) {
        // A decode failure still resolves the command; the frame was ours by
        // command id and sequence, so nobody else will claim it.
        let result = match self.response.decode(frame) {
            Ok(()) => Ok(self.response),
            Err(err) => Err(LinkError::Protocol(err)),
        };
        let _ = self.tx.send(result);
    }

    fn complete_err(self: Box<Self>, err: LinkError) {
        let _ = self.tx.send(Err(err));
    }
}

/// A request waiting in the submission queue for a free handler.
pub(crate) struct QueuedCommand {
    pub(crate) request: Box<dyn Request>,
    pub(crate) completion: Box<dyn Completion>,
}

/// A command that has been written to the wire and is waiting for its
/// response frame. Lives in the owning handler's slot until the receive
/// thread matches a frame, the timeout fires, or the handler exits.
pub(crate) struct PendingExchange {
    pub(crate) completion: Box<dyn Completion>,
    pub(crate) command_id: u8,
    pub(crate) sequence: u8,
    pub(crate) issued_at: Instant,
}

impl PendingExchange {
    pub(crate) fn matches(&self, frame: &Frame) -> bool {
        self.command_id == frame.command_id() && self.sequence == frame.sequence()
    }
}
