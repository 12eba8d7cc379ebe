//! The reboot signaler: tells the board, over its serial console, to restart
//! from the images now on its volume.
//!
//! The command is fire-and-forget. Nothing is read back from the board, so
//! whether it actually rebooted is unknown to `bootdeploy`.

use console::style;
use hexplay::HexViewBuilder;
use log::{info, log_enabled, trace, Level::Debug};

use crate::{
    error::DeployError,
    settings::{Settings, WriteMode},
    utils::{ByteSink, Delay, PortOpener},
};

/// Opens the console port of `settings` and sends the reboot command with the
/// configured [`WriteMode`]. Returns the number of bytes sent.
///
/// Nothing is written when the port cannot be opened.
pub fn signal_reboot(
    settings: &Settings,
    opener: &mut dyn PortOpener,
    delay: &mut dyn Delay,
) -> Result<usize, DeployError> {
    let port = settings.path.clone().ok_or(DeployError::NoPort)?;

    let mut sink = opener
        .open(settings)
        .map_err(|source| DeployError::PortOpen {
            port: port.clone(),
            source,
        })?;
    info!("Sending reboot command to {}", sink.name());

    if log_enabled!(Debug) {
        let view = HexViewBuilder::new(&settings.command)
            .address_offset(0)
            .row_width(16)
            .finish();
        println!("{}", view);
    }

    let sent = write_command(sink.as_mut(), delay, &settings.command, settings.write_mode)
        .map_err(|(offset, source)| DeployError::PortWrite {
            port: port.clone(),
            offset,
            source,
        })?;
    println!(
        "[BD] 🔁 Reboot command sent to {}",
        style(&port).green()
    );

    Ok(sent)
}

/// Writes `command` to `sink`. On failure, returns the offset of the first
/// byte that was not written along with the error.
///
/// In [`WriteMode::Slow`] every byte is its own write and is followed by the
/// pause, including the last one. The board console drops characters when
/// they arrive back to back.
fn write_command(
    sink: &mut dyn ByteSink,
    delay: &mut dyn Delay,
    command: &[u8],
    mode: WriteMode,
) -> Result<usize, (usize, std::io::Error)> {
    match mode {
        WriteMode::Slow(inter_byte) => {
            for (offset, byte) in command.iter().enumerate() {
                sink.write_bytes(&[*byte]).map_err(|e| (offset, e))?;
                trace!("sent {:#04x} ({:?})", byte, *byte as char);
                delay.pause(inter_byte);
            }
        }
        WriteMode::Buffered => {
            sink.write_bytes(command).map_err(|e| (0, e))?;
        }
    }
    Ok(command.len())
}

// =============================================================================
// Unit Tests
// =============================================================================
