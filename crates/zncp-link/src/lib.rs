//! Threaded command engine and serial transport for deCONZ-family ZigBee
//! network coprocessors (ConBee, ConBee II).
//!
//! [`Link`] owns a receive thread and a pool of handler threads. Callers
//! issue commands synchronously from any thread; the engine assigns sequence
//! numbers, matches response frames back to their callers and enforces the
//! command timeout. Frames the device sends on its own initiative surface
//! through the unsolicited callback as
//! [`Notification`](zncp_protocol::Notification)s.
//!
//! The wire format lives in [`zncp_protocol`]; this crate adds SLIP framing,
//! the serial port itself and the threading around both.
//!
//! ```no_run
//! use zncp_link::{Link, LinkCallbacks};
//! use zncp_protocol::{NetworkState, PARAM_NWK_PANID};
//!
//! fn main() -> Result<(), zncp_link::LinkError> {
//!     let link = Link::open("/dev/ttyACM0", LinkCallbacks::default())?;
//!     println!("firmware {}", link.read_firmware_version()?);
//!     let pan_id: u16 = link.read_parameter(PARAM_NWK_PANID)?;
//!     println!("PAN id 0x{pan_id:04X}");
//!     link.close();
//!     Ok(())
//! }
//! ```

mod api;
mod dispatch;
mod error;
mod exchange;
mod handler;
mod link;
mod pool;
mod sequence;
mod serial;
mod slip;
mod transport;

pub use error::LinkError;
pub use link::{Link, LinkCallbacks, LinkConfig};
pub use sequence::SequenceAllocator;
pub use transport::{PacketReader, PacketWriter, ReadEvent};
