//! Serial port transport: SLIP-framed packets over 115200 8N1.

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::time::Duration;

use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use tracing::trace;

use crate::slip;
use crate::transport::{PacketReader, PacketWriter, ReadEvent};

/// Read window for the receive loop. Bounds how long housekeeping and
/// shutdown checks can be deferred while the line is quiet.
const READ_WINDOW: Duration = Duration::from_secs(1);

const BAUD_RATE: u32 = 115_200;

/// Open `path` and split it into a reader/writer pair for the link.
///
/// The device talks 115200 baud, 8 data bits, no parity, one stop bit, no
/// flow control.
pub fn open(path: &str) -> io::Result<(SerialReader, SerialWriter)> {
    let port = serialport::new(path, BAUD_RATE)
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::One)
        .flow_control(FlowControl::None)
        .timeout(READ_WINDOW)
        .open()
        .map_err(io::Error::from)?;
    let writer = port.try_clone().map_err(io::Error::from)?;
    Ok((
        SerialReader {
            port,
            decoder: slip::Decoder::new(),
            pending: VecDeque::new(),
        },
        SerialWriter { port: writer },
    ))
}

/// Reading half of the serial transport.
///
/// A single `read` may complete several SLIP frames; surplus packets are
/// queued and handed out one per `read_packet` call.
pub struct SerialReader {
    port: Box<dyn SerialPort>,
    decoder: slip::Decoder,
    pending: VecDeque<Vec<u8>>,
}

impl PacketReader for SerialReader {
    fn read_packet(&mut self) -> io::Result<ReadEvent> {
        loop {
            if let Some(packet) = self.pending.pop_front() {
                return Ok(ReadEvent::Packet(packet));
            }
            let mut chunk = [0u8; 256];
            match self.port.read(&mut chunk) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "serial port closed",
                    ));
                }
                Ok(n) => {
                    trace!(bytes = n, "serial read");
                    for &byte in &chunk[..n] {
                        if let Some(packet) = self.decoder.push(byte) {
                            self.pending.push_back(packet);
                        }
                    }
                }
                Err(err) if err.kind() == io::ErrorKind::TimedOut => {
                    return Ok(ReadEvent::TimedOut);
                }
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        }
    }
}

/// Writing half of the serial transport.
pub struct SerialWriter {
    port: Box<dyn SerialPort>,
}

impl PacketWriter for SerialWriter {
    fn write_packet(&mut self, packet: &[u8]) -> io::Result<()> {
        let encoded = slip::encode(packet);
        trace!(bytes = encoded.len(), "serial write");
        self.port.write_all(&encoded)?;
        self.port.flush()
    }
}
