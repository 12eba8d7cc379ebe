//! Errors that abort a `bootdeploy` run.

use std::io;
use std::path::PathBuf;

/// Every failure ends the run: the session reports it and exits with status
/// `1`. Nothing is retried or rolled back.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    /// An image could not be copied to the volume. `path` is the source
    /// image being copied when the error happened and `destination` where it
    /// was being copied to. Either end may be the one at fault.
    #[error(
        "failed to copy `{}` to `{}`: {source}",
        .path.display(),
        .destination.display()
    )]
    Copy {
        path: PathBuf,
        destination: PathBuf,
        source: io::Error,
    },

    #[error("failed to open serial port `{port}`: {source}")]
    PortOpen {
        port: String,
        source: serialport::Error,
    },

    /// Writing the command stopped at byte `offset`.
    #[error("failed to write byte {offset} to serial port `{port}`: {source}")]
    PortWrite {
        port: String,
        offset: usize,
        source: io::Error,
    },

    #[error("no serial port was given")]
    NoPort,
}

impl DeployError {
    /// The generic first line of the diagnostic printed for this error.
    pub fn headline(&self) -> &'static str {
        match self {
            DeployError::Copy { .. } => "Failed to copy firmware image to the board volume!",
            DeployError::PortOpen { .. } => "Failed to open the board serial console!",
            DeployError::PortWrite { .. } => "Failed to send the reboot command!",
            DeployError::NoPort => "No serial port to reboot the board!",
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[test]
fn copy_error_names_both_ends() {
    let error = DeployError::Copy {
        path: PathBuf::from("build/app/firmware.bin"),
        destination: PathBuf::from("/media/V2M-MPS3/SOFTWARE"),
        source: io::Error::new(io::ErrorKind::NotFound, "gone"),
    };
    let message = error.to_string();
    assert!(message.contains("`build/app/firmware.bin`"));
    assert!(message.contains("`/media/V2M-MPS3/SOFTWARE`"));
}
