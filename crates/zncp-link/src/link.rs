//! The link: public handle tying the transport, the receive loop and the
//! handler pool together.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::bounded;
use tracing::{info, warn};
use zncp_protocol::{Notification, Request, Response};

use crate::dispatch::Dispatcher;
use crate::error::LinkError;
use crate::exchange::{QueuedCommand, TypedCompletion};
use crate::pool::HandlerPool;
use crate::sequence::SequenceAllocator;
use crate::serial;
use crate::transport::{PacketReader, PacketWriter};

/// Tuning knobs for a [`Link`]. The defaults match the device firmware's
/// expectations and are what production deployments run with.
pub struct LinkConfig {
    /// Number of handler threads, which bounds the commands in flight.
    pub handler_count: usize,
    /// Capacity of the submission queue; submitters block when it is full.
    pub queue_capacity: usize,
    /// How long a written command may wait for its response frame.
    pub command_timeout: Duration,
    /// How often the receive loop checks pending commands against the
    /// timeout.
    pub housekeeping_interval: Duration,
    /// Sequence number source, shared so tests can pin the starting point.
    pub sequences: Arc<SequenceAllocator>,
}

impl Default for LinkConfig {
    fn default() -> Self {
        LinkConfig {
            handler_count: 1,
            queue_capacity: 100,
            command_timeout: Duration::from_secs(7),
            housekeeping_interval: Duration::from_secs(1),
            sequences: Arc::new(SequenceAllocator::new()),
        }
    }
}

/// Callbacks fired from the receive thread.
///
/// Both default to logging, so a link that only issues commands can be
/// opened with `LinkCallbacks::default()`.
pub struct LinkCallbacks {
    pub(crate) unsolicited: Box<dyn FnMut(Notification) + Send>,
    pub(crate) disconnect: Option<Box<dyn FnOnce() + Send>>,
}

impl Default for LinkCallbacks {
    fn default() -> Self {
        LinkCallbacks {
            unsolicited: Box::new(|notification| {
                info!("unhandled notification: {:?}", notification)
            }),
            disconnect: Some(Box::new(|| warn!("device disconnected"))),
        }
    }
}

impl LinkCallbacks {
    /// Called with every verified frame no pending command claims.
    pub fn on_unsolicited(mut self, handler: impl FnMut(Notification) + Send + 'static) -> Self {
        self.unsolicited = Box::new(handler);
        self
    }

    /// Called once if the transport fails. Not called on [`Link::close`].
    pub fn on_disconnect(mut self, handler: impl FnOnce() + Send + 'static) -> Self {
        self.disconnect = Some(Box::new(handler));
        self
    }
}

/// Handle to a connected coprocessor.
///
/// Cloneless by design: wrap it in an `Arc` to share across threads. All
/// methods take `&self`; commands from any number of threads are serialized
/// through the submission queue.
pub struct Link {
    pool: Arc<HandlerPool>,
    closed: Arc<AtomicBool>,
}

impl Link {
    /// Open the serial device at `path` with default configuration.
    pub fn open(path: &str, callbacks: LinkCallbacks) -> Result<Link, LinkError> {
        Link::open_with(path, LinkConfig::default(), callbacks)
    }

    /// Open the serial device at `path` with explicit configuration.
    pub fn open_with(
        path: &str,
        config: LinkConfig,
        callbacks: LinkCallbacks,
    ) -> Result<Link, LinkError> {
        let (reader, writer) = serial::open(path)?;
        Ok(Link::with_transport(
            Box::new(reader),
            Box::new(writer),
            config,
            callbacks,
        ))
    }

    /// Build a link over an arbitrary transport. This is how tests drive the
    /// engine without a serial port.
    pub fn with_transport(
        reader: Box<dyn PacketReader>,
        writer: Box<dyn PacketWriter>,
        config: LinkConfig,
        callbacks: LinkCallbacks,
    ) -> Link {
        let pool = Arc::new(HandlerPool::new(writer, &config));
        let closed = Arc::new(AtomicBool::new(false));
        let dispatcher = Dispatcher {
            reader,
            pool: Arc::clone(&pool),
            closed: Arc::clone(&closed),
            callbacks,
            housekeeping_interval: config.housekeeping_interval,
        };
        thread::Builder::new()
            .name("zncp-rx".into())
            .spawn(move || dispatcher.run())
            .expect("Failed to spawn receive thread");
        Link { pool, closed }
    }

    /// Issue `request` and block until `response` is decoded from the
    /// matching frame, the command times out, or the link goes away.
    ///
    /// Blocks while the submission queue is full. Concurrency is bounded by
    /// the handler count, not by the number of callers.
    pub fn execute<Q, S>(&self, request: Q, response: S) -> Result<S, LinkError>
    where
        Q: Request + 'static,
        S: Response + 'static,
    {
        if self.closed.load(Ordering::SeqCst) {
            return Err(LinkError::Closed);
        }
        let (tx, rx) = bounded(1);
        let command = QueuedCommand {
            request: Box::new(request),
            completion: Box::new(TypedCompletion { response, tx }),
        };
        self.pool.submit(command)?;
        match rx.recv() {
            Ok(result) => result,
            Err(_) => Err(LinkError::Closed),
        }
    }

    /// Change the number of handler threads at runtime. Shrinking fails the
    /// exchanges pending on removed handlers with [`LinkError::Exited`].
    pub fn set_handler_count(&self, count: usize) {
        self.pool.resize(count);
    }

    pub fn handler_count(&self) -> usize {
        self.pool.handler_count()
    }

    /// Tear the link down: stop the handlers, fail queued commands with
    /// [`LinkError::Closed`] and let the receive thread wind down. The
    /// disconnect callback does not fire for an operator close. Idempotent.
    ///
    /// The receive thread notices the flag within one transport read window
    /// and exits on its own.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.pool.shutdown();
        }
    }
}

impl Drop for Link {
    fn drop(&mut self) {
        self.close();
    }
}
