//! Bootdeploy command line interface.

use std::process;
use std::time::Duration;

use clap::{
    crate_authors, crate_description, crate_name, crate_version, App, AppSettings::*,
    Arg, ArgMatches,
};
use console::style;
use log::{debug, trace, LevelFilter};
use simplelog::*;

use bootdeploy::{self as bd, Backends, ImageSpec, Variant, WriteMode};

fn main() {
    println!("[BD] bootdeploy v{}", crate_version!());

    ctrlc::set_handler(move || {
        eprintln!("🛑 received Ctrl+C! the board volume may hold a partial image");
        process::exit(1);
    })
    .expect("Failed to install my Ctrl-C handler!");

    let matches = App::new(crate_name!())
        .version(format!("v{}", crate_version!()).as_str())
        .author(crate_authors!())
        .about(crate_description!())
        .long_about(
            "\n\
            Bootdeploy copies freshly built firmware images to the USB volume \
            exposed by an FPGA prototyping board (its emulated SD card), then \
            asks the board to reboot by typing `reboot` on its serial \
            management console.\n\
            \n\
            The reboot command is sent one character at a time, with a pause \
            after each character, because the board console drops input that \
            arrives in a single write.\n\
            \n\
            Nothing is read back from the board: a successful run means the \
            images were copied and the command was sent, not that the board \
            rebooted.\
        ",
        )
        .max_term_width(80)
        .setting(ColoredHelp)
        .setting(NextLineHelp)
        .arg(
            Arg::with_name("DEVICE_TTY")
                .help("the serial device of the board management console")
                .required_unless("LIST_PORTS")
                .index(1),
        )
        .arg(
            Arg::with_name("VARIANT")
                .help("which images the build produces")
                .long_help(
                    "which images the build produces; `single` copies \
                     build/app/firmware.bin, `dual` copies build/bin/bl2.bin \
                     then build/bin/tfm_s_ns_signed.bin.",
                )
                .long("variant")
                .takes_value(true)
                .possible_values(&["single", "dual"])
                .default_value("single")
                .require_equals(true),
        )
        .arg(
            Arg::with_name("IMAGE")
                .help("image to copy, replaces the variant images")
                .long("image")
                .short("i")
                .takes_value(true)
                .multiple(true)
                .number_of_values(1)
                .require_equals(true),
        )
        .arg(
            Arg::with_name("SETTLE_MS")
                .help("pause after copying the --image given before it, in milliseconds")
                .long("settle-ms")
                .takes_value(true)
                .multiple(true)
                .number_of_values(1)
                .requires("IMAGE")
                .require_equals(true),
        )
        .arg(
            Arg::with_name("DESTINATION")
                .help("where to copy the images on the board volume")
                .short("d")
                .long("dest")
                .takes_value(true)
                .default_value(bd::DEFAULT_DESTINATION)
                .require_equals(true),
        )
        .arg(
            Arg::with_name("BAUD_RATE")
                .help("serial port baud rate")
                .short("b")
                .long("baud-rate")
                .takes_value(true)
                .default_value("115200")
                .require_equals(true),
        )
        .arg(
            Arg::with_name("BYTE_DELAY_MS")
                .help("pause after each command byte, in milliseconds")
                .long("byte-delay-ms")
                .takes_value(true)
                .default_value("100")
                .require_equals(true),
        )
        .arg(
            Arg::with_name("WRITE_MODE")
                .help("how the reboot command is written")
                .long_help(
                    "how the reboot command is written; `slow` sends one byte \
                     per write, which is what the board console needs. \
                     `buffered` sends the whole command at once.",
                )
                .long("write-mode")
                .takes_value(true)
                .possible_values(&["slow", "buffered"])
                .default_value("slow")
                .require_equals(true),
        )
        .arg(
            Arg::with_name("OPEN_ATTEMPTS")
                .help("how many times to try opening the serial port")
                .long("open-attempts")
                .takes_value(true)
                .default_value("1")
                .require_equals(true),
        )
        .arg(
            Arg::with_name("NO_PROGRESS")
                .help("do not display copy progress")
                .long("no-progress"),
        )
        .arg(
            Arg::with_name("LIST_PORTS")
                .help("list the detected serial ports and exit")
                .long("list-ports"),
        )
        .arg(Arg::with_name("v").short("v").multiple(true).help(
            "Sets the logging level of verbosity, repeat several times for \
                higher verbosity",
        ))
        .get_matches();

    // Vary the output based on how many times the user used the "verbose" flag
    // (i.e. 'bootdeploy -v -v -v' or 'bootdeploy -vvv' vs 'bootdeploy -v'
    let log_level = match matches.occurrences_of("v") {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    if let Err(e) = TermLogger::init(
        log_level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    ) {
        eprintln!("could not set up logging: {}", e);
    }

    trace!("{:#?}", matches);

    if matches.is_present("LIST_PORTS") {
        list_ports();
        return;
    }

    // Arguments with default values ===========================================

    // It's safe to call unwrap on all command line arguments with default
    // values, because the value with either be what the user input at runtime
    // or the default value

    let baud_rate = numeric_arg::<u32>(&matches, "BAUD_RATE", "baud-rate");
    let byte_delay = numeric_arg::<u64>(&matches, "BYTE_DELAY_MS", "byte-delay-ms");
    let open_attempts = numeric_arg::<usize>(&matches, "OPEN_ATTEMPTS", "open-attempts");

    let variant = match matches.value_of("VARIANT").unwrap() {
        "single" => Variant::Single,
        "dual" => Variant::Dual,
        _ => unreachable!(),
    };

    let write_mode = match matches.value_of("WRITE_MODE").unwrap() {
        "slow" => WriteMode::Slow(Duration::from_millis(byte_delay)),
        "buffered" => WriteMode::Buffered,
        _ => unreachable!(),
    };

    // END - Arguments with default values =====================================

    let mut builder = bd::SettingsBuilder::new()
        .variant(variant)
        .destination(matches.value_of("DESTINATION").unwrap())
        .baud_rate(baud_rate)
        .write_mode(write_mode)
        .open_attempts(open_attempts)
        .progress(!matches.is_present("NO_PROGRESS"));

    // START - Arguments with NO default values ================================

    if let Some(port) = matches.value_of("DEVICE_TTY") {
        builder = builder.path(port);
    }

    if let (Some(indices), Some(values)) = (matches.indices_of("IMAGE"), matches.values_of("IMAGE"))
    {
        let images: Vec<(usize, &str)> = indices.zip(values).collect();
        let settles: Vec<(usize, &str)> = match (
            matches.indices_of("SETTLE_MS"),
            matches.values_of("SETTLE_MS"),
        ) {
            (Some(indices), Some(values)) => indices.zip(values).collect(),
            _ => Vec::new(),
        };
        let images = image_specs(&images, &settles)
            .unwrap_or_else(|(value, reason)| invalid_value("settle-ms", value, reason));
        builder = builder.images(images);
    }

    // END - Arguments =========================================================

    let settings = builder.finalize();
    debug!("{:#?}", settings);

    // Run the state machine ===================================================

    let backends = Backends::system(&settings);
    let mut session = bd::factory(settings, backends);
    let exit_code = session.run();
    debug!("exit code: {}", exit_code);
    process::exit(exit_code.into());
}

fn numeric_arg<T: std::str::FromStr>(matches: &ArgMatches, name: &str, option: &str) -> T {
    let value = matches.value_of(name).unwrap();
    value
        .parse::<T>()
        .unwrap_or_else(|_| invalid_value(option, value, "needs to be a numeric value"))
}

/// Builds the image list from `--image` and `--settle-ms` values, given with
/// their position on the command line. Each `--settle-ms` applies to the
/// closest `--image` before it; images without one get no pause.
fn image_specs<'a>(
    images: &[(usize, &'a str)],
    settles: &[(usize, &'a str)],
) -> Result<Vec<ImageSpec>, (&'a str, &'static str)> {
    let mut pauses: Vec<Option<u64>> = vec![None; images.len()];
    for &(index, value) in settles {
        let millis = value
            .parse::<u64>()
            .map_err(|_| (value, "needs to be a numeric value"))?;
        let image = images
            .iter()
            .rposition(|&(at, _)| at < index)
            .ok_or((value, "must follow an `--image`"))?;
        if pauses[image].replace(millis).is_some() {
            return Err((value, "is given twice for the same `--image`"));
        }
    }

    Ok(images
        .iter()
        .zip(pauses)
        .map(|(&(_, source), pause)| {
            ImageSpec::new(source, Duration::from_millis(pause.unwrap_or(0)))
        })
        .collect())
}

fn invalid_value(option: &str, value: &str, reason: &str) -> ! {
    eprintln!(
        "{}: `{}` {}",
        style("error").red(),
        style(option).cyan(),
        reason
    );
    eprintln!(
        "   {} `{}` is not a valid value",
        style("-->").cyan(),
        style(value).on_red()
    );
    process::exit(1);
}

fn list_ports() {
    match bd::available_serial_ports() {
        Ok(ports) if ports.is_empty() => println!("[BD] No serial port detected"),
        Ok(ports) => {
            for port in ports {
                println!("[BD] 🔌 {}", port);
            }
        }
        Err(e) => {
            eprintln!("{}", style("[BD] 💥 Failed to enumerate serial ports!").red());
            eprintln!("     {} {}", style("-->").cyan(), e);
            process::exit(1);
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
