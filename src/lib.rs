//! Bootdeploy is a utility to speed up firmware iterations on FPGA prototyping
//! boards (such as the Arm MPS3) that boot from a USB mass storage volume
//! emulating their SD card.
//!
//! A run does two things, in that order:
//!
//! 1. **deploy**: copy the freshly built firmware image(s) onto the mounted
//!    board volume, preserving file metadata and never following symbolic
//!    links,
//! 2. **reboot**: send `reboot\n` to the board management console over the
//!    serial port, so that the board reloads its images from the volume.
//!
//! The board console drops characters when a command arrives in a single
//! write. The command is therefore sent one byte at a time with a pause after
//! every byte (see [`WriteMode::Slow`]).
//!
//! There is no feedback from the board: `bootdeploy` cannot tell whether the
//! board noticed the new image or rebooted at all.
//!
//! The run is implemented as a state machine, with **states** and
//! **transitions** between them:
//!
//! * Can only be in one state at any time.
//! * Each state can have its own associated data if needed.
//! * Transitions between states are triggered via typed **events** and follow
//!   defined semantics.
//! * Only explicitly defined transitions are permitted and as many errors as
//!   possible are detected at **compile-time**.
//! * Data is transferred from one state to the next by attaching it to the
//!   transition event.
//!
//! State transitions leverage `rust`'s `From` and `Into` pattern: the `From`
//! trait is implemented to convert `event` types to `state` types following
//! the semantics of the state machine transitions. Any other transition is a
//! compile-time error.
//!
//! Everything the run touches outside of the process (the volume, the serial
//! port and the clock) goes through small traits, [`ImageCopier`],
//! [`PortOpener`] / [`ByteSink`] and [`Delay`], gathered in [`Backends`].

mod deployer;
mod error;
mod session;
mod settings;
mod signaler;
mod utils;

#[cfg(test)]
mod testing;

pub use deployer::deploy_images;
pub use error::DeployError;
pub use session::{factory, Backends, Session};
pub use settings::{
    ImageSpec, Settings, SettingsBuilder, Variant, WriteMode, DEFAULT_BYTE_DELAY,
    DEFAULT_DESTINATION, REBOOT_COMMAND,
};
pub use signaler::signal_reboot;
pub use utils::{
    available_serial_ports, ByteSink, Delay, FsCopier, ImageCopier, PortOpener,
    SerialPortOpener, SerialSink, ThreadSleep,
};
