//! Settings for a `bootdeploy` run: the images to drop on the board volume,
//! the serial console used to reboot the board and the pacing in between.
//!
//! Use the [builder](https://doc.rust-lang.org/1.0.0/style/ownership/builders.html)
//! pattern to set the configurable values.

use std::path::PathBuf;
use std::time::Duration;

pub use serialport::{DataBits, FlowControl, Parity, StopBits};

// =============================================================================
// Public Interface
// =============================================================================

/// Command understood by the board management console to restart the board
/// and load whatever image is now on its volume.
pub const REBOOT_COMMAND: &[u8] = b"reboot\n";

/// Default mount point of the board's exposed storage volume.
pub const DEFAULT_DESTINATION: &str = "/media/V2M-MPS3/SOFTWARE";

/// Default pause between two bytes when using [`WriteMode::Slow`].
pub const DEFAULT_BYTE_DELAY: Duration = Duration::from_millis(100);

/// A firmware image to be copied and the pause to observe once it has landed
/// on the volume.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ImageSpec {
    /// Path to the image produced by the build.
    pub source: PathBuf,
    /// How long to wait after the copy before doing anything else with the
    /// volume.
    pub settle: Duration,
}
impl ImageSpec {
    pub fn new(source: impl Into<PathBuf>, settle: Duration) -> Self {
        ImageSpec {
            source: source.into(),
            settle,
        }
    }
}

/// Preset image layouts produced by the firmware build.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Variant {
    /// A single application binary.
    Single,
    /// The second stage bootloader followed by the combined secure and
    /// non-secure signed image.
    Dual,
}
impl Variant {
    /// The images of this variant, in copy order.
    pub fn images(self) -> Vec<ImageSpec> {
        match self {
            Variant::Single => vec![ImageSpec::new("build/app/firmware.bin", Duration::ZERO)],
            Variant::Dual => vec![
                ImageSpec::new("build/bin/bl2.bin", Duration::from_millis(100)),
                ImageSpec::new("build/bin/tfm_s_ns_signed.bin", Duration::from_secs(1)),
            ],
        }
    }
}

/// How the reboot command is pushed to the serial port.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum WriteMode {
    /// One byte per write, each followed by the given pause.
    ///
    /// The board console loses characters when a short command arrives in a
    /// single buffered write. Pacing every byte is the only known way to get
    /// the whole command through, so this is the default.
    Slow(Duration),
    /// The whole command in a single write. Only for consoles that do not
    /// drop input.
    Buffered,
}

/// Groups all settings used by `bootdeploy` and acts as a
/// [builder](https://doc.rust-lang.org/1.0.0/style/ownership/builders.html)
/// for the settings.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Settings {
    /// Images to copy, in order.
    pub images: Vec<ImageSpec>,
    /// Destination directory (or file) on the board volume.
    pub destination: PathBuf,

    /// The port name, usually the device path.
    pub path: Option<String>,
    /// The baud rate in symbols-per-second.
    pub baud_rate: u32,
    /// Number of bits used to represent a character sent on the line.
    pub data_bits: DataBits,
    /// The type of signalling to use for controlling data transfer.
    pub flow_control: FlowControl,
    /// The type of parity to use for error checking.
    pub parity: Parity,
    /// Number of bits to use to signal the end of a character.
    pub stop_bits: StopBits,
    /// Whether to keep an exclusive lock on the port once opened.
    pub exclusive: bool,
    /// Number of times opening the port is attempted before giving up.
    pub open_attempts: usize,

    /// The bytes sent to the console to reboot the board.
    pub command: Vec<u8>,
    pub write_mode: WriteMode,

    /// Show a progress bar while copying images.
    pub progress: bool,

    /// Restrict creation of `Settings` instances unless through the
    /// `SettingsBuilder`.
    #[doc(hidden)]
    _private_use_builder: (),
}

/// The builder for the `Settings` values.
///
/// All values are optional and have default values that will be used if not
/// explicitly set.
///
/// **Example**
///
/// ```
/// use bootdeploy::{SettingsBuilder, Variant};
///
/// let settings = SettingsBuilder::new()
///     .path("/dev/ttyUSB0")
///     .variant(Variant::Dual)
///     .finalize();
/// assert_eq!(settings.images.len(), 2);
/// ```
pub struct SettingsBuilder {
    settings: Settings,
}
impl Default for SettingsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
impl SettingsBuilder {
    /// Start building the settings using default values and no path for the
    /// port.
    pub fn new() -> Self {
        SettingsBuilder {
            settings: Settings {
                images: Variant::Single.images(),
                destination: PathBuf::from(DEFAULT_DESTINATION),
                path: None,
                baud_rate: 115_200,
                data_bits: DataBits::Eight,
                flow_control: FlowControl::None,
                parity: Parity::None,
                stop_bits: StopBits::One,
                exclusive: false,
                open_attempts: 1,
                command: REBOOT_COMMAND.to_vec(),
                write_mode: WriteMode::Slow(DEFAULT_BYTE_DELAY),
                progress: true,
                _private_use_builder: (),
            },
        }
    }

    /// Replace the images with the preset of the given variant
    pub fn variant(mut self, variant: Variant) -> Self {
        self.settings.images = variant.images();
        self
    }

    /// Replace the images with an explicit list
    pub fn images(mut self, images: Vec<ImageSpec>) -> Self {
        self.settings.images = images;
        self
    }

    /// Set the destination path on the board volume
    pub fn destination(mut self, destination: impl Into<PathBuf>) -> Self {
        self.settings.destination = destination.into();
        self
    }

    /// Set the path to the serial port
    pub fn path<'a>(mut self, path: impl Into<std::borrow::Cow<'a, str>>) -> Self {
        self.settings.path = Some(path.into().as_ref().to_owned());
        self
    }

    /// Set the baud rate in symbols-per-second
    pub fn baud_rate(mut self, baud_rate: u32) -> Self {
        self.settings.baud_rate = baud_rate;
        self
    }

    /// Set the number of bits used to represent a character sent on the line
    pub fn data_bits(mut self, data_bits: DataBits) -> Self {
        self.settings.data_bits = data_bits;
        self
    }

    /// Set the type of signalling to use for controlling data transfer
    pub fn flow_control(mut self, flow_control: FlowControl) -> Self {
        self.settings.flow_control = flow_control;
        self
    }

    /// Set the type of parity to use for error checking
    pub fn parity(mut self, parity: Parity) -> Self {
        self.settings.parity = parity;
        self
    }

    /// Set the number of bits to use to signal the end of a character
    pub fn stop_bits(mut self, stop_bits: StopBits) -> Self {
        self.settings.stop_bits = stop_bits;
        self
    }

    /// Keep (or release) the exclusive lock on the port after opening it
    pub fn exclusive(mut self, exclusive: bool) -> Self {
        self.settings.exclusive = exclusive;
        self
    }

    /// Set how many times opening the port is attempted; at least once
    pub fn open_attempts(mut self, attempts: usize) -> Self {
        self.settings.open_attempts = attempts.max(1);
        self
    }

    /// Set the bytes sent to reboot the board
    pub fn command(mut self, command: impl Into<Vec<u8>>) -> Self {
        self.settings.command = command.into();
        self
    }

    /// Set how the command is written to the port
    pub fn write_mode(mut self, write_mode: WriteMode) -> Self {
        self.settings.write_mode = write_mode;
        self
    }

    /// Show or hide the copy progress bar
    pub fn progress(mut self, progress: bool) -> Self {
        self.settings.progress = progress;
        self
    }

    pub fn finalize(self) -> Settings {
        self.settings
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[test]
fn all_default() {
    let settings = SettingsBuilder::new().finalize();
    assert_eq!(
        settings,
        Settings {
            images: vec![ImageSpec::new("build/app/firmware.bin", Duration::ZERO)],
            destination: PathBuf::from("/media/V2M-MPS3/SOFTWARE"),
            path: None,
            baud_rate: 115_200,
            data_bits: DataBits::Eight,
            flow_control: FlowControl::None,
            parity: Parity::None,
            stop_bits: StopBits::One,
            exclusive: false,
            open_attempts: 1,
            command: b"reboot\n".to_vec(),
            write_mode: WriteMode::Slow(Duration::from_millis(100)),
            progress: true,
            _private_use_builder: (),
        }
    )
}

#[test]
fn path() {
    let settings = SettingsBuilder::new().path("/dev/ttyACM0").finalize();
    assert_eq!(settings.path.unwrap(), "/dev/ttyACM0");
}

#[test]
fn baud_rate() {
    let baud_rate = 9_600;
    let settings = SettingsBuilder::new().baud_rate(baud_rate).finalize();
    assert_eq!(settings.baud_rate, baud_rate);
}

#[test]
fn dual_variant() {
    let settings = SettingsBuilder::new().variant(Variant::Dual).finalize();
    assert_eq!(
        settings.images,
        vec![
            ImageSpec::new("build/bin/bl2.bin", Duration::from_millis(100)),
            ImageSpec::new("build/bin/tfm_s_ns_signed.bin", Duration::from_secs(1)),
        ]
    );
}

#[test]
fn explicit_images() {
    let images = vec![ImageSpec::new("app.bin", Duration::ZERO)];
    let settings = SettingsBuilder::new()
        .variant(Variant::Dual)
        .images(images.clone())
        .finalize();
    assert_eq!(settings.images, images);
}

#[test]
fn destination() {
    let settings = SettingsBuilder::new().destination("/mnt/VOL").finalize();
    assert_eq!(settings.destination, PathBuf::from("/mnt/VOL"));
}

#[test]
fn open_attempts_never_zero() {
    let settings = SettingsBuilder::new().open_attempts(0).finalize();
    assert_eq!(settings.open_attempts, 1);
}

#[test]
fn write_mode() {
    let settings = SettingsBuilder::new()
        .write_mode(WriteMode::Buffered)
        .finalize();
    assert_eq!(settings.write_mode, WriteMode::Buffered);
}

#[test]
fn parity() {
    let parity = Parity::Even;
    let settings = SettingsBuilder::new().parity(parity).finalize();
    assert_eq!(settings.parity, parity);
}

#[test]
fn data_bits() {
    let data_bits = DataBits::Seven;
    let settings = SettingsBuilder::new().data_bits(data_bits).finalize();
    assert_eq!(settings.data_bits, data_bits);
}

#[test]
fn flow_control() {
    let flow_control = FlowControl::Hardware;
    let settings = SettingsBuilder::new().flow_control(flow_control).finalize();
    assert_eq!(settings.flow_control, flow_control);
}

#[test]
fn stop_bits() {
    let stop_bits = StopBits::Two;
    let settings = SettingsBuilder::new().stop_bits(stop_bits).finalize();
    assert_eq!(settings.stop_bits, stop_bits);
}

#[test]
fn exclusive() {
    let settings = SettingsBuilder::new().exclusive(true).finalize();
    assert!(settings.exclusive);
}

#[test]
fn command() {
    let settings = SettingsBuilder::new().command(&b"reset\n"[..]).finalize();
    assert_eq!(settings.command, b"reset\n".to_vec());
}
