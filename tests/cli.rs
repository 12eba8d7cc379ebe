//! Drives the `bootdeploy` binary against a temporary volume and a serial port
//! that does not exist.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::tempdir;

const NO_SUCH_PORT: &str = "/dev/bootdeploy-no-such-port";

fn bootdeploy(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_bootdeploy"))
        .args(args)
        .output()
        .expect("failed to run bootdeploy")
}

fn arg(name: &str, path: &Path) -> String {
    format!("--{}={}", name, path.display())
}

#[test]
fn missing_image_aborts_before_the_serial_port() {
    let build = tempdir().unwrap();
    let volume = tempdir().unwrap();
    let image = build.path().join("app.bin");

    let output = bootdeploy(&[
        &arg("image", &image),
        &arg("dest", volume.path()),
        "--no-progress",
        NO_SUCH_PORT,
    ]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("app.bin"), "stderr: {}", stderr);
    assert!(!stderr.contains(NO_SUCH_PORT), "stderr: {}", stderr);
    assert_eq!(fs::read_dir(volume.path()).unwrap().count(), 0);
}

#[test]
fn unopenable_port_is_reported_after_the_copy() {
    let build = tempdir().unwrap();
    let volume = tempdir().unwrap();
    let image = build.path().join("app.bin");
    fs::write(&image, b"0123456789").unwrap();

    let output = bootdeploy(&[
        &arg("image", &image),
        &arg("dest", volume.path()),
        "--no-progress",
        NO_SUCH_PORT,
    ]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains(NO_SUCH_PORT), "stderr: {}", stderr);
    assert_eq!(
        fs::read(volume.path().join("app.bin")).unwrap(),
        b"0123456789"
    );
}

#[test]
fn second_image_failure_leaves_the_first_in_place() {
    let build = tempdir().unwrap();
    let volume = tempdir().unwrap();
    let bootloader = build.path().join("bl2.bin");
    fs::write(&bootloader, b"bl2").unwrap();
    let signed = build.path().join("tfm_s_ns_signed.bin");

    let output = bootdeploy(&[
        &arg("image", &bootloader),
        "--settle-ms=0",
        &arg("image", &signed),
        "--settle-ms=0",
        &arg("dest", volume.path()),
        "--no-progress",
        NO_SUCH_PORT,
    ]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("tfm_s_ns_signed.bin"), "stderr: {}", stderr);
    assert!(!stderr.contains(NO_SUCH_PORT), "stderr: {}", stderr);
    assert_eq!(fs::read(volume.path().join("bl2.bin")).unwrap(), b"bl2");
}

#[test]
fn invalid_baud_rate_is_rejected() {
    let output = bootdeploy(&["--baud-rate=fast", NO_SUCH_PORT]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("baud-rate"), "stderr: {}", stderr);
    assert!(stderr.contains("`fast`"), "stderr: {}", stderr);
}

#[test]
fn port_is_required() {
    let output = bootdeploy(&[]);

    assert!(!output.status.success());
}

#[test]
fn unmounted_volume_is_named_in_the_diagnostic() {
    let build = tempdir().unwrap();
    let image = build.path().join("app.bin");
    fs::write(&image, b"0123456789").unwrap();
    let destination = build.path().join("not-mounted").join("SOFTWARE");

    let output = bootdeploy(&[
        &arg("image", &image),
        &arg("dest", &destination),
        "--no-progress",
        NO_SUCH_PORT,
    ]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains(&destination.display().to_string()),
        "stderr: {}",
        stderr
    );
    assert!(!stderr.contains(NO_SUCH_PORT), "stderr: {}", stderr);
}
