//! Command handler: one worker thread owning one in-flight exchange.
//!
//! A handler pulls a queued command, writes its frame, then parks until the
//! receive thread resolves the exchange (matched frame or timeout) or the
//! handler is told to exit. The pending exchange lives in a shared slot;
//! whoever takes it out of the slot owns the completion, so a command is
//! resolved exactly once no matter how the receive thread, the timeout and
//! an exit signal race.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, select, Receiver, Sender};
use parking_lot::Mutex;
use tracing::{debug, trace, warn};
use zncp_protocol::{command_name, Frame};

use crate::error::LinkError;
use crate::exchange::{PendingExchange, QueuedCommand};
use crate::sequence::SequenceAllocator;
use crate::transport::PacketWriter;

pub(crate) type SharedWriter = Arc<Mutex<Box<dyn PacketWriter>>>;

type Slot = Arc<Mutex<Option<PendingExchange>>>;

/// Control surface for one handler thread. Held by the pool; `offer` and
/// `ping` are driven by the receive thread.
pub(crate) struct HandlerHandle {
    slot: Slot,
    done_tx: Sender<()>,
    exit_tx: Sender<()>,
    timeout: Duration,
}

impl HandlerHandle {
    /// Offer a received frame. Returns true when this handler's pending
    /// exchange claims it. A frame is claimed purely by command id and
    /// sequence; decode failures resolve the command with an error but the
    /// frame is still consumed.
    pub(crate) fn offer(&self, frame: &Frame) -> bool {
        let exchange = {
            let mut slot = self.slot.lock();
            match slot.as_ref() {
                Some(pending) if pending.matches(frame) => slot.take(),
                _ => None,
            }
        };
        match exchange {
            Some(exchange) => {
                exchange.completion.complete_frame(frame);
                let _ = self.done_tx.try_send(());
                true
            }
            None => false,
        }
    }

    /// Fail the pending exchange if it has been outstanding for longer than
    /// the command timeout.
    pub(crate) fn ping(&self, now: Instant) {
        let exchange = {
            let mut slot = self.slot.lock();
            match slot.as_ref() {
                Some(pending) if now.duration_since(pending.issued_at) > self.timeout => {
                    slot.take()
                }
                _ => None,
            }
        };
        if let Some(exchange) = exchange {
            debug!(
                command = command_name(exchange.command_id),
                sequence = exchange.sequence,
                "command timed out"
            );
            exchange.completion.complete_err(LinkError::Timeout);
            let _ = self.done_tx.try_send(());
        }
    }

    /// Ask the handler thread to stop. Non-blocking; the thread exits once
    /// it observes the signal, failing any exchange still pending.
    pub(crate) fn signal_exit(&self) {
        let _ = self.exit_tx.try_send(());
    }
}

/// Spawn a handler worker feeding from the shared submission queue.
pub(crate) fn spawn_handler(
    index: usize,
    work_rx: Receiver<QueuedCommand>,
    writer: SharedWriter,
    sequences: Arc<SequenceAllocator>,
    timeout: Duration,
) -> HandlerHandle {
    let slot: Slot = Arc::new(Mutex::new(None));
    let (done_tx, done_rx) = bounded(1);
    let (exit_tx, exit_rx) = bounded(1);

    let worker = Worker {
        slot: Arc::clone(&slot),
        work_rx,
        done_rx,
        exit_rx,
        writer,
        sequences,
    };
    thread::Builder::new()
        .name(format!("zncp-handler-{}", index))
        .spawn(move || worker.run())
        .expect("Failed to spawn handler thread");

    HandlerHandle {
        slot,
        done_tx,
        exit_tx,
        timeout,
    }
}

struct Worker {
    slot: Slot,
    work_rx: Receiver<QueuedCommand>,
    done_rx: Receiver<()>,
    exit_rx: Receiver<()>,
    writer: SharedWriter,
    sequences: Arc<SequenceAllocator>,
}

impl Worker {
    fn run(self) {
        loop {
            select! {
                recv(self.exit_rx) -> _ => return,
                recv(self.work_rx) -> msg => {
                    match msg {
                        Ok(command) => {
                            if self.run_exchange(command) {
                                return;
                            }
                        }
                        // Submission queue dropped, nothing left to do.
                        Err(_) => return,
                    }
                }
            }
        }
    }

    /// Drive one command to resolution. Returns true when an exit signal was
    /// consumed and the worker must stop.
    fn run_exchange(&self, command: QueuedCommand) -> bool {
        let QueuedCommand {
            request,
            completion,
        } = command;

        let sequence = self.sequences.next();
        let command_id = request.command_id();
        let frame = request.encode(sequence);

        // Park the exchange before writing so a fast response cannot slip
        // past the receive thread unclaimed.
        *self.slot.lock() = Some(PendingExchange {
            completion,
            command_id,
            sequence,
            issued_at: Instant::now(),
        });

        let written = {
            let mut writer = self.writer.lock();
            writer.write_packet(frame.as_bytes())
        };
        match written {
            Ok(()) => {
                trace!(
                    command = command_name(command_id),
                    sequence,
                    "command written"
                );
            }
            Err(err) => {
                warn!(
                    command = command_name(command_id),
                    sequence,
                    "write failed: {err}"
                );
                match self.slot.lock().take() {
                    Some(exchange) => {
                        exchange.completion.complete_err(LinkError::Transport(err));
                    }
                    // The receive thread resolved the slot while the write
                    // was failing; consume its done signal so it does not
                    // leak into the next exchange.
                    None => {
                        let _ = self.done_rx.recv();
                    }
                }
                return false;
            }
        }

        select! {
            recv(self.exit_rx) -> _ => {
                if let Some(exchange) = self.slot.lock().take() {
                    debug!(
                        command = command_name(command_id),
                        sequence,
                        "exit signalled with exchange pending"
                    );
                    exchange.completion.complete_err(LinkError::Exited);
                }
                true
            }
            recv(self.done_rx) -> _ => false,
        }
    }
}
