//! Capabilities used by a deployment run to reach the outside world: the board
//! volume, the board serial console and the clock.

mod pacing;
mod ports;
mod volume;

pub use pacing::{Delay, ThreadSleep};
pub use ports::{available_serial_ports, ByteSink, PortOpener, SerialPortOpener, SerialSink};
pub use volume::{FsCopier, ImageCopier};
