//! Pool of command handlers sharing one submission queue and one writer.
//!
//! The pool size bounds how many commands can be on the wire at once; each
//! handler owns at most one in-flight exchange. Responses are offered to
//! handlers in order and the first matching pending exchange claims them.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use tracing::debug;
use zncp_protocol::Frame;

use crate::error::LinkError;
use crate::exchange::QueuedCommand;
use crate::handler::{spawn_handler, HandlerHandle, SharedWriter};
use crate::link::LinkConfig;
use crate::sequence::SequenceAllocator;
use crate::transport::PacketWriter;

/// Backoff between enqueue attempts while the submission queue is full.
const SUBMIT_RETRY: std::time::Duration = std::time::Duration::from_millis(5);

pub(crate) struct HandlerPool {
    handlers: Mutex<Vec<HandlerHandle>>,
    work_tx: Sender<QueuedCommand>,
    work_rx: Receiver<QueuedCommand>,
    writer: SharedWriter,
    sequences: Arc<SequenceAllocator>,
    timeout: std::time::Duration,
    next_index: AtomicUsize,
    // Submission gate. Sends happen under this lock so shutdown can flip it
    // and then drain the queue knowing nothing more will be enqueued.
    open: Mutex<bool>,
}

impl HandlerPool {
    pub(crate) fn new(writer: Box<dyn PacketWriter>, config: &LinkConfig) -> HandlerPool {
        let (work_tx, work_rx) = bounded(config.queue_capacity);
        let pool = HandlerPool {
            handlers: Mutex::new(Vec::new()),
            work_tx,
            work_rx,
            writer: Arc::new(Mutex::new(writer)),
            sequences: Arc::clone(&config.sequences),
            timeout: config.command_timeout,
            next_index: AtomicUsize::new(0),
            open: Mutex::new(true),
        };
        pool.resize(config.handler_count);
        pool
    }

    /// Enqueue a command for the next free handler. Blocks while the queue
    /// is full; fails with [`LinkError::Closed`] once the pool has shut down.
    ///
    /// The gate check and the enqueue happen under the same lock, and the
    /// lock is never held across a full queue, so a blocked submitter still
    /// observes shutdown on its next attempt instead of waiting on a queue
    /// nothing will drain.
    pub(crate) fn submit(&self, mut command: QueuedCommand) -> Result<(), LinkError> {
        loop {
            {
                let open = self.open.lock();
                if !*open {
                    return Err(LinkError::Closed);
                }
                match self.work_tx.try_send(command) {
                    Ok(()) => return Ok(()),
                    Err(TrySendError::Full(returned)) => command = returned,
                    Err(TrySendError::Disconnected(_)) => return Err(LinkError::Closed),
                }
            }
            std::thread::sleep(SUBMIT_RETRY);
        }
    }

    /// Offer a received frame to the handlers in order; true when one of
    /// them claims it.
    pub(crate) fn offer(&self, frame: &Frame) -> bool {
        let handlers = self.handlers.lock();
        handlers.iter().any(|handler| handler.offer(frame))
    }

    /// Run the timeout check on every handler.
    pub(crate) fn ping(&self, now: Instant) {
        let handlers = self.handlers.lock();
        for handler in handlers.iter() {
            handler.ping(now);
        }
    }

    pub(crate) fn handler_count(&self) -> usize {
        self.handlers.lock().len()
    }

    /// Grow or shrink the pool. Shrinking signals the removed handlers to
    /// exit; an exchange pending on one of them fails with
    /// [`LinkError::Exited`].
    pub(crate) fn resize(&self, count: usize) {
        let mut handlers = self.handlers.lock();
        while handlers.len() > count {
            if let Some(handler) = handlers.pop() {
                handler.signal_exit();
            }
        }
        while handlers.len() < count {
            let index = self.next_index.fetch_add(1, Ordering::Relaxed);
            handlers.push(spawn_handler(
                index,
                self.work_rx.clone(),
                Arc::clone(&self.writer),
                Arc::clone(&self.sequences),
                self.timeout,
            ));
        }
        debug!(count = handlers.len(), "handler pool resized");
    }

    /// Stop all handlers and fail every command still waiting in the queue
    /// so no submitter stays blocked on a link that is gone.
    pub(crate) fn shutdown(&self) {
        {
            let mut open = self.open.lock();
            *open = false;
        }
        {
            let handlers = self.handlers.lock();
            for handler in handlers.iter() {
                handler.signal_exit();
            }
        }
        while let Ok(command) = self.work_rx.try_recv() {
            command.completion.complete_err(LinkError::Closed);
        }
    }
}
