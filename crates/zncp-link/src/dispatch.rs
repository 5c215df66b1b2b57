//! Receive loop: reads packets off the transport, verifies checksums, routes
//! responses to the handler pool and hands everything else to the
//! unsolicited callback. Also the clock for command timeouts.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, error};
use zncp_protocol::{command_name, Frame, Notification};

use crate::link::LinkCallbacks;
use crate::pool::HandlerPool;
use crate::transport::{PacketReader, ReadEvent};

pub(crate) struct Dispatcher {
    pub(crate) reader: Box<dyn PacketReader>,
    pub(crate) pool: Arc<HandlerPool>,
    pub(crate) closed: Arc<AtomicBool>,
    pub(crate) callbacks: LinkCallbacks,
    pub(crate) housekeeping_interval: Duration,
}

impl Dispatcher {
    pub(crate) fn run(mut self) {
        let mut last_tick = Instant::now();
        loop {
            // Operator close: stop without firing the disconnect callback.
            if self.closed.load(Ordering::SeqCst) {
                debug!("receive loop stopping");
                return;
            }

            let event = match self.reader.read_packet() {
                Ok(event) => event,
                Err(err) => {
                    // A read error with the closed flag already set is just
                    // the port being torn down under us.
                    if !self.closed.swap(true, Ordering::SeqCst) {
                        error!("transport failed: {err}");
                        if let Some(disconnect) = self.callbacks.disconnect.take() {
                            disconnect();
                        }
                        self.pool.shutdown();
                    }
                    return;
                }
            };

            // Timeout housekeeping runs before any frame handling so a
            // stalled command cannot be starved by a chatty device.
            let now = Instant::now();
            if now.duration_since(last_tick) > self.housekeeping_interval {
                self.pool.ping(now);
                last_tick = now;
            }

            let packet = match event {
                ReadEvent::Packet(packet) => packet,
                ReadEvent::TimedOut => continue,
            };

            let frame = Frame::from_raw(packet);
            if !frame.verify() {
                debug!(bytes = frame.len(), "dropping frame with invalid checksum");
                continue;
            }
            if self.pool.offer(&frame) {
                continue;
            }

            debug!(
                command = command_name(frame.command_id()),
                sequence = frame.sequence(),
                "unsolicited frame"
            );
            (self.callbacks.unsolicited)(Notification::classify(&frame));
        }
    }
}
