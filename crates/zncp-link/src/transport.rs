//! Transport abstraction between the command engine and the wire.
//!
//! The engine only ever sees whole frames. How those frames travel (SLIP over
//! a serial port in production, plain channels in tests) is hidden behind a
//! reader/writer trait pair so the threading code can be exercised without
//! hardware.

use std::io;

/// Outcome of a single blocking read on the transport.
#[derive(Debug)]
pub enum ReadEvent {
    /// One complete, de-escaped packet.
    Packet(Vec<u8>),
    /// The read window elapsed without a complete packet. The caller is
    /// expected to run housekeeping and read again.
    TimedOut,
}

/// Blocking source of framed packets.
///
/// `read_packet` must return within a bounded window so the receive loop can
/// run timeout housekeeping and observe shutdown; quiet periods surface as
/// [`ReadEvent::TimedOut`]. An `Err` is fatal and tears the link down.
pub trait PacketReader: Send {
    fn read_packet(&mut self) -> io::Result<ReadEvent>;
}

/// Blocking sink for framed packets.
///
/// An `Err` fails the in-flight command but leaves the link up.
pub trait PacketWriter: Send {
    fn write_packet(&mut self, packet: &[u8]) -> io::Result<()>;
}
