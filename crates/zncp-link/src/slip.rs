//! SLIP framing (RFC 1055) for the serial transport.
//!
//! Frames are delimited by `END` bytes; `END` and `ESC` occurring inside a
//! frame are escaped. The encoder emits a leading delimiter as well as the
//! trailing one, which flushes any line noise the device may have accumulated
//! before our frame starts. The decoder consequently has to tolerate empty
//! packets (back-to-back delimiters) and silently skip them.

pub(crate) const END: u8 = 0xC0;
pub(crate) const ESC: u8 = 0xDB;
pub(crate) const ESC_END: u8 = 0xDC;
pub(crate) const ESC_ESC: u8 = 0xDD;

/// Wrap `packet` in SLIP framing, escaping `END` and `ESC` bytes.
pub(crate) fn encode(packet: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(packet.len() + 2);
    out.push(END);
    for &byte in packet {
        match byte {
            END => {
                out.push(ESC);
                out.push(ESC_END);
            }
            ESC => {
                out.push(ESC);
                out.push(ESC_ESC);
            }
            other => out.push(other),
        }
    }
    out.push(END);
    out
}

/// Incremental SLIP decoder fed one byte at a time.
///
/// Returns a packet when a non-empty frame is completed by a delimiter. Input
/// does not have to align with frame boundaries, so partial frames survive
/// across reads.
#[derive(Debug, Default)]
pub(crate) struct Decoder {
    buffer: Vec<u8>,
    escaped: bool,
}

impl Decoder {
    pub(crate) fn new() -> Self {
        Decoder::default()
    }

    pub(crate) fn push(&mut self, byte: u8) -> Option<Vec<u8>> {
        if self.escaped {
            self.escaped = false;
            let unescaped = match byte {
                ESC_END => END,
                ESC_ESC => ESC,
                // Invalid escape sequence, keep the byte and let the
                // checksum reject the frame.
                other => other,
            };
            self.buffer.push(unescaped);
            return None;
        }
        match byte {
            END => {
                if self.buffer.is_empty() {
                    None
                } else {
                    Some(std::mem::take(&mut self.buffer))
                }
            }
            ESC => {
                self.escaped = true;
                None
            }
            other => {
                self.buffer.push(other);
                None
            }
        }
    }
}
